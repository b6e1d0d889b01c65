use std::fmt;
use std::ops::Deref;

use indexmap::IndexMap;
use tracing::trace;

use crate::attr::{AttrError, Binding, Element, NodePath, Pointer, Result, ValueKind, VariantValue};

/// Reserved key holding an attributed node's pointer to itself.
pub const THIS_KEY: &str = "this";

/// Generational handle to a node inside an [`AttributeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
	index: u32,
	generation: u32,
}

impl NodeId {
	/// Arena slot index.
	pub fn index(self) -> u32 {
		self.index
	}

	/// Slot generation; bumped every time the slot is freed.
	pub fn generation(self) -> u32 {
		self.generation
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "node#{}.{}", self.index, self.generation)
	}
}

#[derive(Debug)]
pub(crate) enum Slot {
	Value(VariantValue<'static>),
	/// Index into the bound schema; the value lives in the host.
	Field(usize),
}

#[derive(Debug, Default)]
pub(crate) struct NodeData {
	pub(crate) entries: IndexMap<String, Slot>,
	pub(crate) parent: Option<NodeId>,
	pub(crate) binding: Option<Binding>,
}

impl NodeData {
	fn child_of(parent: NodeId) -> Self {
		Self {
			parent: Some(parent),
			..Self::default()
		}
	}

	pub(crate) fn resolve<'n>(&'n self, slot: &'n Slot) -> Option<ValueRef<'n>> {
		match slot {
			Slot::Value(value) => Some(ValueRef::Stored(value)),
			Slot::Field(index) => self.binding.as_ref()?.field(*index).map(ValueRef::Field),
		}
	}

	pub(crate) fn get(&self, key: &str) -> Option<ValueRef<'_>> {
		self.resolve(self.entries.get(key)?)
	}

	pub(crate) fn get_mut(&mut self, key: &str) -> Option<ValueMut<'_>> {
		let Self { entries, binding, .. } = self;
		match entries.get_mut(key)? {
			Slot::Value(value) => Some(ValueMut::Stored(value)),
			Slot::Field(index) => binding.as_mut()?.field_mut(*index).map(ValueMut::Field),
		}
	}

	pub(crate) fn is_prescribed(&self, key: &str) -> bool {
		self.binding.as_ref().is_some_and(|binding| binding.is_prescribed(key))
	}

	fn table(&self, key: &str) -> Option<&[NodeId]> {
		match self.entries.get(key)? {
			Slot::Value(VariantValue::Table(ids)) => Some(ids.as_slice()),
			_ => None,
		}
	}

	fn table_mut(&mut self, key: &str) -> Option<&mut Vec<NodeId>> {
		match self.entries.get_mut(key)? {
			Slot::Value(value) => value.nodes_mut().ok(),
			Slot::Field(_) => None,
		}
	}

	fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
		self.entries
			.values()
			.filter_map(|slot| match slot {
				Slot::Value(VariantValue::Table(ids)) => Some(ids.as_slice()),
				_ => None,
			})
			.flatten()
			.copied()
	}

	/// Entries that take part in structural comparison.
	fn compared(&self) -> Vec<(&str, &Slot)> {
		self.entries
			.iter()
			.filter(|(key, _)| key.as_str() != THIS_KEY)
			.map(|(key, slot)| (key.as_str(), slot))
			.collect()
	}

	/// Whether `key` already holds a table. Fails if it holds anything typed.
	fn table_slot_state(&self, key: &str) -> Result<bool> {
		let current = match self.entries.get(key) {
			None => return Ok(false),
			Some(Slot::Value(value)) => value.kind(),
			Some(Slot::Field(index)) => self.binding.as_ref().and_then(|binding| binding.schema.get(*index)).map_or(ValueKind::Unknown, |signature| signature.kind),
		};
		match current {
			ValueKind::Table => Ok(true),
			ValueKind::Unknown if matches!(self.entries.get(key), Some(Slot::Value(_))) => Ok(false),
			current => Err(AttrError::TypeConflict {
				current,
				requested: ValueKind::Table,
			}),
		}
	}
}

/// Read access to a node value.
///
/// Stored values live in the tree. Field values are views over the bound host.
#[derive(Debug)]
pub enum ValueRef<'a> {
	/// Value owned by the node.
	Stored(&'a VariantValue<'static>),
	/// Read-only view over a host field.
	Field(VariantValue<'a>),
}

impl<'a> Deref for ValueRef<'a> {
	type Target = VariantValue<'a>;

	fn deref(&self) -> &VariantValue<'a> {
		match self {
			Self::Stored(value) => *value,
			Self::Field(value) => value,
		}
	}
}

/// Write access to a node value.
///
/// Reads go through `Deref`. Writes are forwarded to the stored value or, for
/// prescribed fields, land directly in the host.
#[derive(Debug)]
pub enum ValueMut<'a> {
	/// Value owned by the node.
	Stored(&'a mut VariantValue<'static>),
	/// Mutable view over a host field.
	Field(VariantValue<'a>),
}

impl<'a> Deref for ValueMut<'a> {
	type Target = VariantValue<'a>;

	fn deref(&self) -> &VariantValue<'a> {
		match self {
			Self::Stored(value) => &**value,
			Self::Field(value) => value,
		}
	}
}

macro_rules! dispatch {
	($self:ident.$method:ident($($arg:expr),*)) => {
		match $self {
			ValueMut::Stored(inner) => inner.$method($($arg),*),
			ValueMut::Field(inner) => inner.$method($($arg),*),
		}
	};
}

impl ValueMut<'_> {
	/// See [`VariantValue::set_kind`].
	pub fn set_kind(&mut self, kind: ValueKind) -> Result<()> {
		dispatch!(self.set_kind(kind))
	}

	/// See [`VariantValue::push_back`].
	pub fn push_back<T: Element>(&mut self, value: T) -> Result<()> {
		dispatch!(self.push_back(value))
	}

	/// See [`VariantValue::set`].
	pub fn set<T: Element>(&mut self, value: T, index: usize) -> Result<()> {
		dispatch!(self.set(value, index))
	}

	/// See [`VariantValue::get_mut`].
	pub fn get_mut<T: Element>(&mut self, index: usize) -> Result<&mut T> {
		dispatch!(self.get_mut(index))
	}

	/// See [`VariantValue::assign`].
	pub fn assign<T: Element>(&mut self, value: T) -> Result<()> {
		dispatch!(self.assign(value))
	}

	/// See [`VariantValue::remove`].
	pub fn remove<T: Element>(&mut self, value: &T) -> Result<bool> {
		dispatch!(self.remove(value))
	}

	/// See [`VariantValue::pop_back`].
	pub fn pop_back(&mut self) -> Result<()> {
		dispatch!(self.pop_back())
	}

	/// See [`VariantValue::remove_at`].
	pub fn remove_at(&mut self, index: usize) -> Result<()> {
		dispatch!(self.remove_at(index))
	}

	/// See [`VariantValue::resize`].
	pub fn resize(&mut self, len: usize) -> Result<()> {
		dispatch!(self.resize(len))
	}

	/// See [`VariantValue::reserve`].
	pub fn reserve(&mut self, capacity: usize) -> Result<()> {
		dispatch!(self.reserve(capacity))
	}

	/// See [`VariantValue::shrink_to_fit`].
	pub fn shrink_to_fit(&mut self) -> Result<()> {
		dispatch!(self.shrink_to_fit())
	}

	/// See [`VariantValue::clear`].
	pub fn clear(&mut self) -> Result<()> {
		dispatch!(self.clear())
	}

	/// See [`VariantValue::set_from_str`].
	pub fn set_from_str(&mut self, input: &str, index: usize) -> Result<()> {
		dispatch!(self.set_from_str(input, index))
	}

	/// See [`VariantValue::push_back_from_str`].
	pub fn push_back_from_str(&mut self, input: &str) -> Result<()> {
		dispatch!(self.push_back_from_str(input))
	}
}

#[derive(Debug)]
struct Entry {
	generation: u32,
	node: Option<NodeData>,
}

/// Arena owning every node of one or more attribute trees.
///
/// Nodes reference each other by [`NodeId`], so moving the arena never
/// invalidates links. Parent links are observational; tables own children.
#[derive(Debug, Default)]
pub struct AttributeTree {
	slots: Vec<Entry>,
	free: Vec<u32>,
	live: usize,
}

impl AttributeTree {
	/// Empty arena.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of live nodes across all roots.
	pub fn node_count(&self) -> usize {
		self.live
	}

	/// Whether `id` refers to a live node.
	pub fn contains(&self, id: NodeId) -> bool {
		self.node(id).is_ok()
	}

	pub(crate) fn node(&self, id: NodeId) -> Result<&NodeData> {
		self.slots
			.get(id.index as usize)
			.filter(|entry| entry.generation == id.generation)
			.and_then(|entry| entry.node.as_ref())
			.ok_or(AttrError::StaleNode { node: id })
	}

	pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
		self.slots
			.get_mut(id.index as usize)
			.filter(|entry| entry.generation == id.generation)
			.and_then(|entry| entry.node.as_mut())
			.ok_or(AttrError::StaleNode { node: id })
	}

	pub(crate) fn allocate(&mut self, data: NodeData) -> NodeId {
		self.live += 1;
		if let Some(index) = self.free.pop() {
			let entry = &mut self.slots[index as usize];
			entry.node = Some(data);
			return NodeId {
				index,
				generation: entry.generation,
			};
		}

		let index = self.slots.len() as u32;
		self.slots.push(Entry { generation: 0, node: Some(data) });
		NodeId { index, generation: 0 }
	}

	fn release(&mut self, id: NodeId) -> Option<NodeData> {
		let entry = self.slots.get_mut(id.index as usize)?;
		if entry.generation != id.generation {
			return None;
		}
		let node = entry.node.take()?;
		// A slot whose generation is exhausted is retired, never reused.
		if let Some(next) = entry.generation.checked_add(1) {
			entry.generation = next;
			self.free.push(id.index);
		}
		self.live -= 1;
		Some(node)
	}

	fn free_subtree(&mut self, id: NodeId) {
		let mut pending = vec![id];
		while let Some(next) = pending.pop() {
			if let Some(node) = self.release(next) {
				pending.extend(node.child_ids());
			}
		}
	}

	/// Create a parentless, empty node.
	pub fn create_root(&mut self) -> NodeId {
		self.allocate(NodeData::default())
	}

	/// Detach `id` from its parent and free it with all descendants.
	pub fn destroy(&mut self, id: NodeId) -> Result<()> {
		self.orphan(id)?;
		self.free_subtree(id);
		trace!(node = %id, "destroyed subtree");
		Ok(())
	}

	/// Insert an Unknown value under `key` if absent and return a handle to it.
	pub fn append(&mut self, id: NodeId, key: &str) -> Result<ValueMut<'_>> {
		if key.is_empty() {
			return Err(AttrError::EmptyKey);
		}
		let node = self.node_mut(id)?;
		if !node.entries.contains_key(key) {
			node.entries.insert(key.to_owned(), Slot::Value(VariantValue::Unknown));
		}
		let type_name = node.binding.as_ref().map_or("<plain>", Binding::type_name);
		node.get_mut(key).ok_or_else(|| AttrError::UnboundField {
			type_name,
			field: key.to_owned(),
		})
	}

	/// Append a new empty child to the table under `key`.
	pub fn append_child(&mut self, id: NodeId, key: &str) -> Result<NodeId> {
		if key.is_empty() {
			return Err(AttrError::EmptyKey);
		}
		self.node(id)?.table_slot_state(key)?;

		let child = self.allocate(NodeData::child_of(id));
		self.attach(id, key, child, usize::MAX)?;
		Ok(child)
	}

	/// Move `child` under `parent`'s table at `key`.
	///
	/// Every check runs before the child is detached from its old parent.
	pub fn adopt(&mut self, parent: NodeId, child: NodeId, key: &str) -> Result<()> {
		self.adopt_at(parent, child, key, usize::MAX)
	}

	/// Like [`adopt`](Self::adopt), but the child lands at `position` in the
	/// table. Positions past the end append.
	pub fn adopt_at(&mut self, parent: NodeId, child: NodeId, key: &str, position: usize) -> Result<()> {
		if key.is_empty() {
			return Err(AttrError::EmptyKey);
		}
		let parent_node = self.node(parent)?;
		self.node(child)?;
		if parent == child {
			return Err(AttrError::SelfAdoption { node: parent });
		}
		if self.is_ancestor_of(child, parent) || self.is_ancestor_of(parent, child) {
			return Err(AttrError::CycleViolation { parent, child });
		}
		parent_node.table_slot_state(key)?;

		self.orphan(child)?;
		self.attach(parent, key, child, position)?;
		trace!(%parent, %child, key, position, "adopted node");
		Ok(())
	}

	fn attach(&mut self, parent: NodeId, key: &str, child: NodeId, position: usize) -> Result<()> {
		let node = self.node_mut(parent)?;
		if !node.table_slot_state(key)? {
			node.entries.insert(key.to_owned(), Slot::Value(VariantValue::new(ValueKind::Table)));
		}
		if let Some(ids) = node.table_mut(key) {
			ids.insert(position.min(ids.len()), child);
		}
		self.node_mut(child)?.parent = Some(parent);
		Ok(())
	}

	/// Detach `id` from its parent table. The parent keeps the key.
	pub fn orphan(&mut self, id: NodeId) -> Result<()> {
		let Some(parent) = self.node(id)?.parent else {
			return Ok(());
		};

		if let Ok(parent_node) = self.node_mut(parent) {
			for slot in parent_node.entries.values_mut() {
				if let Slot::Value(VariantValue::Table(ids)) = slot
					&& let Some(position) = ids.iter().position(|candidate| *candidate == id)
				{
					ids.remove(position);
					break;
				}
			}
		}

		self.node_mut(id)?.parent = None;
		trace!(node = %id, %parent, "orphaned node");
		Ok(())
	}

	/// Local lookup. Stale ids and missing keys yield `None`.
	pub fn find(&self, id: NodeId, key: &str) -> Option<ValueRef<'_>> {
		self.node(id).ok()?.get(key)
	}

	/// Mutable local lookup.
	pub fn find_mut(&mut self, id: NodeId, key: &str) -> Option<ValueMut<'_>> {
		self.node_mut(id).ok()?.get_mut(key)
	}

	/// Look `key` up on `id`, then on each ancestor. Returns the owning node too.
	pub fn search(&self, id: NodeId, key: &str) -> Option<(NodeId, ValueRef<'_>)> {
		let mut current = Some(id);
		while let Some(node_id) = current {
			let node = self.node(node_id).ok()?;
			if node.entries.contains_key(key) {
				return node.get(key).map(|value| (node_id, value));
			}
			current = node.parent;
		}
		None
	}

	/// Deep-copy `id` and its descendants into a new root.
	pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId> {
		let copy = self.clone_node(id, None)?;
		trace!(source = %id, %copy, "cloned subtree");
		Ok(copy)
	}

	fn clone_node(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<NodeId> {
		let source = self.node(id)?;
		let binding = source.binding.as_ref().map(Binding::duplicate);
		let mut entries = IndexMap::with_capacity(source.entries.len());
		let mut tables = Vec::new();
		for (key, slot) in &source.entries {
			let slot = match slot {
				Slot::Field(index) => Slot::Field(*index),
				Slot::Value(VariantValue::Table(ids)) => {
					tables.push((key.clone(), ids.clone()));
					Slot::Value(VariantValue::Table(Vec::with_capacity(ids.len())))
				}
				Slot::Value(value) => Slot::Value(value.clone()),
			};
			entries.insert(key.clone(), slot);
		}

		let attributed = binding.is_some();
		let copy = self.allocate(NodeData { entries, parent, binding });
		if attributed && let Some(mut this) = self.find_mut(copy, THIS_KEY) {
			this.set(Pointer::Node(copy), 0)?;
		}

		for (key, ids) in tables {
			for child in ids {
				let child_copy = self.clone_node(child, Some(copy))?;
				if let Some(table) = self.node_mut(copy)?.table_mut(&key) {
					table.push(child_copy);
				}
			}
		}
		Ok(copy)
	}

	/// Structural comparison of `a` here against `b` in `other`.
	///
	/// Keys and values are compared positionally; `"this"` is skipped and
	/// tables recurse into their children. Bound nodes must also share a host
	/// type, and a bound node never equals a plain one.
	pub fn subtree_eq(&self, a: NodeId, other: &AttributeTree, b: NodeId) -> bool {
		let (Ok(left), Ok(right)) = (self.node(a), other.node(b)) else {
			return false;
		};
		if self.host_type(a) != other.host_type(b) {
			return false;
		}
		let left_entries = left.compared();
		let right_entries = right.compared();
		if left_entries.len() != right_entries.len() {
			return false;
		}

		left_entries.iter().zip(&right_entries).all(|((left_key, left_slot), (right_key, right_slot))| {
			if left_key != right_key {
				return false;
			}
			let (Some(left_value), Some(right_value)) = (left.resolve(left_slot), right.resolve(right_slot)) else {
				return false;
			};
			match (left_value.nodes(), right_value.nodes()) {
				(Ok(left_ids), Ok(right_ids)) => {
					left_ids.len() == right_ids.len() && left_ids.iter().zip(right_ids).all(|(l, r)| self.subtree_eq(*l, other, *r))
				}
				_ => *left_value == *right_value,
			}
		})
	}

	/// Structural comparison of two nodes in this arena.
	pub fn nodes_equal(&self, a: NodeId, b: NodeId) -> bool {
		self.subtree_eq(a, self, b)
	}

	/// Parent of `id`; `None` for roots and stale ids.
	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).ok()?.parent
	}

	/// Number of entries on the node, `"this"` included.
	pub fn len(&self, id: NodeId) -> Result<usize> {
		Ok(self.node(id)?.entries.len())
	}

	/// Entry at insertion position `index`.
	pub fn entry_at(&self, id: NodeId, index: usize) -> Option<(&str, ValueRef<'_>)> {
		let node = self.node(id).ok()?;
		let (key, slot) = node.entries.get_index(index)?;
		Some((key.as_str(), node.resolve(slot)?))
	}

	/// Keys in insertion order.
	pub fn keys(&self, id: NodeId) -> Result<Vec<&str>> {
		Ok(self.node(id)?.entries.keys().map(String::as_str).collect())
	}

	/// Every entry in insertion order.
	pub fn entries(&self, id: NodeId) -> Result<Vec<(&str, ValueRef<'_>)>> {
		let node = self.node(id)?;
		Ok(node
			.entries
			.iter()
			.filter_map(|(key, slot)| Some((key.as_str(), node.resolve(slot)?)))
			.collect())
	}

	/// Children across all tables, in entry then table order.
	pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
		Ok(self.node(id)?.child_ids().collect())
	}

	/// Whether `ancestor` lies on `node`'s parent chain.
	pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
		let mut current = self.parent(node);
		while let Some(parent) = current {
			if parent == ancestor {
				return true;
			}
			current = self.parent(parent);
		}
		false
	}

	/// Whether `node` lies below `ancestor`.
	pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
		self.is_ancestor_of(ancestor, node)
	}

	/// Key and table position of `child` inside `parent`.
	pub fn find_contained_child(&self, parent: NodeId, child: NodeId) -> Option<(&str, usize)> {
		let node = self.node(parent).ok()?;
		node.entries.iter().find_map(|(key, slot)| match slot {
			Slot::Value(VariantValue::Table(ids)) => ids.iter().position(|id| *id == child).map(|position| (key.as_str(), position)),
			_ => None,
		})
	}

	/// Free every child and drop auxiliary entries.
	///
	/// Prescribed entries stay; their tables are emptied.
	pub fn clear(&mut self, id: NodeId) -> Result<()> {
		let node = self.node_mut(id)?;
		let children = node.child_ids().collect::<Vec<_>>();
		let NodeData { entries, binding, .. } = node;
		entries.retain(|key, _| binding.as_ref().is_some_and(|binding| binding.is_prescribed(key)));
		for slot in entries.values_mut() {
			if let Slot::Value(VariantValue::Table(ids)) = slot {
				ids.clear();
			}
		}

		for child in children {
			self.free_subtree(child);
		}
		Ok(())
	}

	/// Follow table keys and child indices from `root`.
	pub fn resolve_path(&self, root: NodeId, path: &NodePath) -> Result<NodeId> {
		let mut current = root;
		self.node(current)?;
		for (key, index) in path.hops() {
			current = self
				.node(current)?
				.table(key)
				.and_then(|ids| ids.get(index).copied())
				.ok_or_else(|| AttrError::PathNotFound {
					path: path.to_string(),
					step: format!("{key}[{index}]"),
				})?;
		}
		Ok(current)
	}
}
