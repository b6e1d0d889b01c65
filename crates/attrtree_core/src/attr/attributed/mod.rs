use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::attr::signature::{resolve_host, resolve_host_mut};
use crate::attr::tree::{NodeData, Slot};
use crate::attr::{AttrError, AttributeTree, NodeId, Pointer, Result, Signature, THIS_KEY, TypeKey, TypeRegistry, ValueKind, ValueMut, ValueRef, VariantValue};

/// Native host type whose fields back a node's prescribed attributes.
///
/// Implement with [`impl_attributed!`](crate::impl_attributed).
pub trait Attributed: Any + fmt::Debug + 'static {
	/// Dynamic type key used for schema lookup.
	fn type_key(&self) -> TypeKey;

	/// Clone into a new box.
	fn clone_boxed(&self) -> Box<dyn Attributed>;

	/// Upcast for downcasting.
	fn as_any(&self) -> &dyn Any;

	/// Mutable upcast for downcasting.
	fn as_any_mut(&mut self) -> &mut dyn Any;

	/// Embedded base host, for single inheritance.
	fn base(&self) -> Option<&dyn Attributed> {
		None
	}

	/// Mutable embedded base host.
	fn base_mut(&mut self) -> Option<&mut dyn Attributed> {
		None
	}
}

/// Static schema of an attributed type.
pub trait Described: Attributed + Sized {
	/// Parent type whose schema precedes this one.
	fn parent() -> Option<TypeKey> {
		None
	}

	/// This type's own schema entries, in declaration order.
	fn schema() -> Vec<Signature>;
}

/// Implement [`Attributed`](crate::attr::Attributed) for a `Clone` type.
///
/// `impl_attributed!(Orc, base = monster)` exposes the `monster` field as the
/// base host so inherited field accessors resolve through it.
#[macro_export]
macro_rules! impl_attributed {
	($ty:ty, base = $base:ident) => {
		impl $crate::attr::Attributed for $ty {
			fn type_key(&self) -> $crate::attr::TypeKey {
				$crate::attr::TypeKey::of::<Self>()
			}

			fn clone_boxed(&self) -> ::std::boxed::Box<dyn $crate::attr::Attributed> {
				::std::boxed::Box::new(::std::clone::Clone::clone(self))
			}

			fn as_any(&self) -> &dyn ::std::any::Any {
				self
			}

			fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
				self
			}

			fn base(&self) -> ::std::option::Option<&dyn $crate::attr::Attributed> {
				::std::option::Option::Some(&self.$base)
			}

			fn base_mut(&mut self) -> ::std::option::Option<&mut dyn $crate::attr::Attributed> {
				::std::option::Option::Some(&mut self.$base)
			}
		}
	};
	($ty:ty) => {
		impl $crate::attr::Attributed for $ty {
			fn type_key(&self) -> $crate::attr::TypeKey {
				$crate::attr::TypeKey::of::<Self>()
			}

			fn clone_boxed(&self) -> ::std::boxed::Box<dyn $crate::attr::Attributed> {
				::std::boxed::Box::new(::std::clone::Clone::clone(self))
			}

			fn as_any(&self) -> &dyn ::std::any::Any {
				self
			}

			fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
				self
			}
		}
	};
}

/// Host bound to a node together with its merged schema.
#[derive(Debug)]
pub(crate) struct Binding {
	pub(crate) host: Box<dyn Attributed>,
	pub(crate) schema: Rc<[Signature]>,
}

impl Binding {
	pub(crate) fn field(&self, index: usize) -> Option<VariantValue<'_>> {
		self.schema.get(index)?.view(self.host.as_ref())
	}

	pub(crate) fn field_mut(&mut self, index: usize) -> Option<VariantValue<'_>> {
		let signature = self.schema.get(index)?;
		signature.view_mut(self.host.as_mut())
	}

	pub(crate) fn duplicate(&self) -> Self {
		Self {
			host: self.host.clone_boxed(),
			schema: Rc::clone(&self.schema),
		}
	}

	pub(crate) fn is_prescribed(&self, key: &str) -> bool {
		key == THIS_KEY || self.schema.iter().any(|signature| signature.name == key)
	}

	pub(crate) fn type_name(&self) -> &'static str {
		self.host.type_key().name()
	}
}

fn validate_schema(type_name: &'static str, schema: &[Signature], host: &dyn Attributed) -> Result<()> {
	let mut seen = HashSet::from([THIS_KEY]);
	for signature in schema {
		if signature.name.is_empty() {
			return Err(AttrError::EmptyKey);
		}
		if !seen.insert(signature.name.as_str()) {
			return Err(AttrError::DuplicateSignature {
				type_name,
				field: signature.name.clone(),
			});
		}
		if signature.is_table() {
			continue;
		}

		let view = signature.view(host).ok_or_else(|| AttrError::UnboundField {
			type_name,
			field: signature.name.clone(),
		})?;
		if view.kind() != signature.kind || view.len() != signature.count {
			return Err(AttrError::SchemaMismatch {
				type_name,
				field: signature.name.clone(),
				declared: signature.count,
				actual: view.len(),
			});
		}
	}
	Ok(())
}

impl AttributeTree {
	/// Bind `host` to a new root node.
	///
	/// The node gets `"this"`, then one prescribed entry per merged schema
	/// entry. Fields alias the host; tables get `count` empty children.
	pub fn insert_attributed<T: Attributed>(&mut self, registry: &TypeRegistry, host: T) -> Result<NodeId> {
		self.insert_attributed_boxed(registry, Box::new(host))
	}

	/// Boxed form of [`insert_attributed`](Self::insert_attributed).
	pub fn insert_attributed_boxed(&mut self, registry: &TypeRegistry, host: Box<dyn Attributed>) -> Result<NodeId> {
		let key = host.type_key();
		let schema: Rc<[Signature]> = registry.signatures(key)?.into();
		validate_schema(key.name(), &schema, host.as_ref())?;

		let id = self.allocate(NodeData::default());
		let mut entries = IndexMap::with_capacity(schema.len() + 1);
		entries.insert(THIS_KEY.to_owned(), Slot::Value(VariantValue::from_values(vec![Pointer::Node(id)])));
		for (index, signature) in schema.iter().enumerate() {
			let slot = if signature.is_table() {
				Slot::Value(VariantValue::Table(Vec::with_capacity(signature.count)))
			} else {
				Slot::Field(index)
			};
			entries.insert(signature.name.clone(), slot);
		}

		let node = self.node_mut(id)?;
		node.entries = entries;
		node.binding = Some(Binding {
			host,
			schema: Rc::clone(&schema),
		});

		for signature in schema.iter().filter(|signature| signature.is_table()) {
			for _ in 0..signature.count {
				self.append_child(id, &signature.name)?;
			}
		}

		debug!(node = %id, type_name = key.name(), attributes = schema.len(), "bound attributed host");
		Ok(id)
	}

	/// Whether `key` exists on the node.
	pub fn is_attribute(&self, id: NodeId, key: &str) -> bool {
		self.node(id).is_ok_and(|node| node.entries.contains_key(key))
	}

	/// Whether `key` is `"this"` or a schema entry of the bound host.
	pub fn is_prescribed_attribute(&self, id: NodeId, key: &str) -> bool {
		self.node(id).is_ok_and(|node| node.is_prescribed(key))
	}

	/// Whether `key` exists and is not prescribed.
	pub fn is_auxiliary_attribute(&self, id: NodeId, key: &str) -> bool {
		self.node(id).is_ok_and(|node| node.entries.contains_key(key) && !node.is_prescribed(key))
	}

	/// Append a free-form attribute. Prescribed keys are rejected.
	pub fn append_auxiliary_attribute(&mut self, id: NodeId, key: &str) -> Result<ValueMut<'_>> {
		if self.node(id)?.is_prescribed(key) {
			return Err(AttrError::PrescribedConflict { key: key.to_owned() });
		}
		self.append(id, key)
	}

	/// Every attribute in order.
	pub fn attributes(&self, id: NodeId) -> Result<Vec<(&str, ValueRef<'_>)>> {
		self.entries(id)
	}

	/// `"this"` and schema attributes, in schema order.
	pub fn prescribed_attributes(&self, id: NodeId) -> Result<Vec<(&str, ValueRef<'_>)>> {
		let node = self.node(id)?;
		Ok(self.entries(id)?.into_iter().filter(|(key, _)| node.is_prescribed(key)).collect())
	}

	/// Attributes appended after the schema.
	pub fn auxiliary_attributes(&self, id: NodeId) -> Result<Vec<(&str, ValueRef<'_>)>> {
		let node = self.node(id)?;
		Ok(self.entries(id)?.into_iter().filter(|(key, _)| !node.is_prescribed(key)).collect())
	}

	/// Bound host as `T`, searching base hosts.
	pub fn host<T: Attributed>(&self, id: NodeId) -> Option<&T> {
		let binding = self.node(id).ok()?.binding.as_ref()?;
		resolve_host::<T>(binding.host.as_ref())
	}

	/// Mutable bound host as `T`, searching base hosts.
	pub fn host_mut<T: Attributed>(&mut self, id: NodeId) -> Option<&mut T> {
		let binding = self.node_mut(id).ok()?.binding.as_mut()?;
		resolve_host_mut::<T>(binding.host.as_mut())
	}

	/// Bound host as a trait object.
	pub fn host_dyn(&self, id: NodeId) -> Option<&dyn Attributed> {
		Some(self.node(id).ok()?.binding.as_ref()?.host.as_ref())
	}

	/// Dynamic type of the bound host.
	pub fn host_type(&self, id: NodeId) -> Option<TypeKey> {
		self.host_dyn(id).map(Attributed::type_key)
	}

	/// Swap in a host of the same dynamic type and return the old one.
	///
	/// Field attributes immediately read through the new host.
	pub fn replace_host<T: Attributed>(&mut self, id: NodeId, host: T) -> Result<Box<dyn Attributed>> {
		let binding = self.node_mut(id)?.binding.as_mut().ok_or(AttrError::NotAttributed { node: id })?;
		let expected = binding.host.type_key();
		let actual = TypeKey::of::<T>();
		if expected != actual {
			return Err(AttrError::HostTypeMismatch {
				expected: expected.name(),
				actual: actual.name(),
			});
		}
		Ok(std::mem::replace(&mut binding.host, Box::new(host)))
	}

	/// Schema bound to the node; empty for plain nodes.
	pub fn schema(&self, id: NodeId) -> Result<Vec<Signature>> {
		Ok(self.node(id)?.binding.as_ref().map(|binding| binding.schema.to_vec()).unwrap_or_default())
	}

	/// Kind of the attribute at `key`, if present.
	pub fn kind_of(&self, id: NodeId, key: &str) -> Option<ValueKind> {
		self.find(id, key).map(|value| value.kind())
	}
}
