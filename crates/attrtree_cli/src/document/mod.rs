//! JSON table documents.
//!
//! A document is an object of entries, each shaped like
//! `{ "type": <kind>, "class"?: <class>, "value"?: <value> }`. Tables take an
//! object or an array of objects and create one child per object through the
//! node factory.
//!
//! A table child, or the document itself, may carry `"class": "<name>"` next
//! to its entries. That string overrides the table's class for that one node.

use attrtree::attr::{AttributeTree, DEFAULT_CLASS, Element, NodeFactory, NodeId, Pointer, THIS_KEY, TypeRegistry, ValueKind, ValueMut};
use glam::{Mat4, Vec4};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{CliError, Result};

/// Key of the per-node class marker inside an object of entries.
pub const CLASS_KEY: &str = "class";

/// Loader settings.
#[derive(Debug, Clone)]
pub struct LoadOptions {
	/// Deepest table nesting accepted below the root.
	pub max_depth: usize,
	/// Class of the root node and of table children without a `class`.
	pub default_class: String,
}

impl Default for LoadOptions {
	fn default() -> Self {
		Self {
			max_depth: 32,
			default_class: DEFAULT_CLASS.to_owned(),
		}
	}
}

/// Builds attribute trees from JSON documents.
pub struct Loader<'a> {
	registry: &'a TypeRegistry,
	factory: &'a NodeFactory,
	options: &'a LoadOptions,
}

struct Entry<'d> {
	kind: ValueKind,
	class: Option<&'d str>,
	value: &'d Value,
}

impl<'a> Loader<'a> {
	/// Loader creating nodes through `factory`.
	pub fn new(registry: &'a TypeRegistry, factory: &'a NodeFactory, options: &'a LoadOptions) -> Self {
		Self { registry, factory, options }
	}

	/// Create a root of the document's class, or the default class, and fill
	/// it from `document`.
	pub fn load(&self, tree: &mut AttributeTree, document: &Value) -> Result<NodeId> {
		let class = class_marker(document, "")?.unwrap_or(self.options.default_class.as_str());
		let root = self.factory.create(class, tree, self.registry)?;
		if let Err(err) = self.fill(tree, root, document) {
			tree.destroy(root)?;
			return Err(err);
		}
		debug!(%root, nodes = tree.node_count(), "loaded document");
		Ok(root)
	}

	/// Fill an existing node from `document`. A class marker is skipped since
	/// the node's class is already fixed.
	pub fn fill(&self, tree: &mut AttributeTree, node: NodeId, document: &Value) -> Result<()> {
		self.fill_at(tree, node, document, "", 0)
	}

	fn fill_at(&self, tree: &mut AttributeTree, node: NodeId, document: &Value, path: &str, depth: usize) -> Result<()> {
		let Value::Object(entries) = document else {
			return Err(CliError::document(path, "expected an object of entries"));
		};

		for (key, raw) in entries {
			if key == CLASS_KEY && raw.is_string() {
				continue;
			}
			let entry_path = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
			if key == THIS_KEY {
				return Err(CliError::document(&entry_path, "\"this\" is reserved"));
			}
			let entry = parse_entry(raw, &entry_path)?;
			if entry.kind == ValueKind::Table {
				self.load_table(tree, node, key, &entry, &entry_path, depth)?;
			} else {
				if entry.class.is_some() {
					return Err(CliError::document(&entry_path, "class only applies to tables"));
				}
				load_values(tree, node, key, &entry, &entry_path)?;
			}
		}
		Ok(())
	}

	fn load_table(&self, tree: &mut AttributeTree, node: NodeId, key: &str, entry: &Entry<'_>, path: &str, depth: usize) -> Result<()> {
		if depth + 1 > self.options.max_depth {
			return Err(CliError::DepthExceeded {
				path: path.to_owned(),
				max_depth: self.options.max_depth,
			});
		}

		let children = match entry.value {
			Value::Null => Vec::new(),
			Value::Object(_) => vec![entry.value],
			Value::Array(items) => items.iter().collect(),
			_ => return Err(CliError::document(path, "table value must be an object or an array of objects")),
		};

		tree.append(node, key)?.set_kind(ValueKind::Table)?;
		let preallocated = tree.find(node, key).map(|value| value.nodes().map(<[NodeId]>::to_vec)).transpose()?.unwrap_or_default();

		for (index, child_doc) in children.into_iter().enumerate() {
			let child_path = format!("{path}[{index}]");
			let class = class_marker(child_doc, &child_path)?.or(entry.class);
			let child = self.table_child(tree, node, key, preallocated.get(index).copied(), class, index)?;
			trace!(%child, path = child_path.as_str(), "filling table child");
			self.fill_at(tree, child, child_doc, &child_path, depth + 1)?;
		}
		Ok(())
	}

	/// Node that receives the table child at `position`.
	///
	/// An empty pre-allocated child is reused when no class is asked for and
	/// replaced in place by a node of the class otherwise. Without one, the
	/// new node is appended.
	fn table_child(&self, tree: &mut AttributeTree, node: NodeId, key: &str, preallocated: Option<NodeId>, class: Option<&str>, position: usize) -> Result<NodeId> {
		let empty = preallocated.filter(|child| tree.len(*child).is_ok_and(|len| len == 0));
		if let Some(slot) = empty
			&& class.is_none()
		{
			return Ok(slot);
		}

		let class = class.unwrap_or(self.options.default_class.as_str());
		let child = self.factory.create(class, tree, self.registry)?;
		let placed = match empty {
			Some(slot) => tree.destroy(slot).and_then(|()| tree.adopt_at(node, child, key, position)),
			None => tree.adopt(node, child, key),
		};
		if let Err(err) = placed {
			tree.destroy(child)?;
			return Err(err.into());
		}
		Ok(child)
	}
}

fn parse_entry<'d>(raw: &'d Value, path: &str) -> Result<Entry<'d>> {
	let Value::Object(fields) = raw else {
		return Err(CliError::document(path, "entry must be an object with a \"type\""));
	};
	let type_name = string_field(fields, "type", path)?.ok_or_else(|| CliError::document(path, "missing \"type\""))?;
	let kind = ValueKind::from_name(type_name).ok_or_else(|| CliError::document(path, format!("unknown type {type_name:?}")))?;
	Ok(Entry {
		kind,
		class: string_field(fields, "class", path)?,
		value: fields.get("value").unwrap_or(&Value::Null),
	})
}

/// The `"class"` string of an object of entries. An object under that key is
/// an ordinary entry.
fn class_marker<'d>(document: &'d Value, path: &str) -> Result<Option<&'d str>> {
	match document.get(CLASS_KEY) {
		Some(Value::String(class)) if class.is_empty() => Err(CliError::document(path, "class must not be empty")),
		Some(Value::String(class)) => Ok(Some(class)),
		_ => Ok(None),
	}
}

fn string_field<'d>(fields: &'d Map<String, Value>, name: &str, path: &str) -> Result<Option<&'d str>> {
	match fields.get(name) {
		None => Ok(None),
		Some(Value::String(text)) => Ok(Some(text)),
		Some(_) => Err(CliError::document(path, format!("\"{name}\" must be a string"))),
	}
}

/// Elements of a non-table entry. Flat number arrays are one vector or matrix.
fn elements(kind: ValueKind, value: &Value) -> Vec<&Value> {
	match value {
		Value::Null => Vec::new(),
		Value::Array(items) if matches!(kind, ValueKind::Vector | ValueKind::Matrix) && items.first().is_some_and(Value::is_number) => vec![value],
		Value::Array(items) => items.iter().collect(),
		other => vec![other],
	}
}

fn load_values(tree: &mut AttributeTree, node: NodeId, key: &str, entry: &Entry<'_>, path: &str) -> Result<()> {
	let items = elements(entry.kind, entry.value);
	if entry.kind == ValueKind::Unknown && !items.is_empty() {
		return Err(CliError::document(path, "unknown entries carry no values"));
	}

	let mut target = tree.append(node, key)?;
	target.set_kind(entry.kind).map_err(|err| CliError::document(path, err.to_string()))?;
	// Host-backed values have a fixed length and are written by position.
	let fixed = target.is_aliased();

	for (index, item) in items.into_iter().enumerate() {
		let item_path = format!("{path}[{index}]");
		store_item(&mut target, entry.kind, item, fixed, index, &item_path)?;
	}
	Ok(())
}

fn store_item(target: &mut ValueMut<'_>, kind: ValueKind, item: &Value, fixed: bool, index: usize, path: &str) -> Result<()> {
	if let Value::String(text) = item
		&& matches!(kind, ValueKind::Vector | ValueKind::Matrix)
	{
		let stored = if fixed { target.set_from_str(text, index) } else { target.push_back_from_str(text) };
		return stored.map_err(|err| CliError::document(path, err.to_string()));
	}

	match kind {
		ValueKind::Integer => {
			let number = item
				.as_i64()
				.and_then(|number| i32::try_from(number).ok())
				.ok_or_else(|| CliError::document(path, "expected a 32-bit integer"))?;
			store(target, number, fixed, index, path)
		}
		ValueKind::Float => {
			let number = item.as_f64().ok_or_else(|| CliError::document(path, "expected a number"))?;
			store(target, number as f32, fixed, index, path)
		}
		ValueKind::String => {
			let text = item.as_str().ok_or_else(|| CliError::document(path, "expected a string"))?;
			store(target, text.to_owned(), fixed, index, path)
		}
		ValueKind::Vector => {
			let [x, y, z, w] = numbers::<4>(item, path)?;
			store(target, Vec4::new(x, y, z, w), fixed, index, path)
		}
		ValueKind::Matrix => {
			let columns = numbers::<16>(item, path)?;
			store(target, Mat4::from_cols_array(&columns), fixed, index, path)
		}
		ValueKind::Pointer if item.is_null() || item.as_str() == Some("null") => store(target, Pointer::Null, fixed, index, path),
		ValueKind::Pointer => Err(CliError::document(path, "only null pointers can be loaded")),
		ValueKind::Unknown | ValueKind::Table => Err(CliError::document(path, format!("{kind} values are not stored element-wise"))),
	}
}

fn store<T: Element>(target: &mut ValueMut<'_>, value: T, fixed: bool, index: usize, path: &str) -> Result<()> {
	let stored = if fixed { target.set(value, index) } else { target.push_back(value) };
	stored.map_err(|err| CliError::document(path, err.to_string()))
}

fn numbers<const N: usize>(item: &Value, path: &str) -> Result<[f32; N]> {
	let invalid = || CliError::document(path, format!("expected text or {N} numbers"));
	let Value::Array(items) = item else {
		return Err(invalid());
	};
	if items.len() != N {
		return Err(invalid());
	}

	let mut out = [0.0_f32; N];
	for (slot, value) in out.iter_mut().zip(items) {
		*slot = value.as_f64().ok_or_else(invalid)? as f32;
	}
	Ok(out)
}
