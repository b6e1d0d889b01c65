use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::debug;

use crate::attr::{AttrError, Described, Result, Signature};

/// Runtime identity of an attributed type.
///
/// Equality and hashing use the `TypeId` only; the name is for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
	id: TypeId,
	name: &'static str,
}

impl TypeKey {
	/// Key for `T`.
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	/// Underlying `TypeId`.
	pub fn id(self) -> TypeId {
		self.id
	}

	/// Full type path.
	pub fn name(self) -> &'static str {
		self.name
	}

	/// Last path segment of the type name.
	pub fn short_name(self) -> &'static str {
		self.name.rsplit("::").next().unwrap_or(self.name)
	}
}

impl PartialEq for TypeKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

#[derive(Debug, Clone)]
struct TypeInfo {
	signatures: Vec<Signature>,
	parent: Option<TypeKey>,
}

/// Schema table for attributed types.
///
/// Owned by the caller and passed to the tree when hosts are bound.
#[derive(Debug, Default)]
pub struct TypeRegistry {
	types: HashMap<TypeKey, TypeInfo>,
}

impl TypeRegistry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `key` with its own schema and optional parent.
	///
	/// Returns `false` when the key was already registered; the existing entry
	/// is kept.
	pub fn add_type(&mut self, key: TypeKey, signatures: Vec<Signature>, parent: Option<TypeKey>) -> Result<bool> {
		if parent == Some(key) {
			return Err(AttrError::SelfParenting { type_name: key.name() });
		}

		match self.types.entry(key) {
			Entry::Occupied(_) => Ok(false),
			Entry::Vacant(slot) => {
				debug!(type_name = key.name(), fields = signatures.len(), parent = parent.map(TypeKey::name), "registered type");
				slot.insert(TypeInfo { signatures, parent });
				Ok(true)
			}
		}
	}

	/// Register `T` from its [`Described`] impl.
	pub fn register<T: Described>(&mut self) -> Result<bool> {
		self.add_type(TypeKey::of::<T>(), T::schema(), T::parent())
	}

	/// Merged schema of `key`: ancestors first, then its own entries.
	///
	/// The walk stops at the first parent that is not registered.
	pub fn signatures(&self, key: TypeKey) -> Result<Vec<Signature>> {
		let info = self.types.get(&key).ok_or(AttrError::UnregisteredType { type_name: key.name() })?;

		let mut chain = vec![info];
		let mut next = info.parent;
		while let Some(parent) = next {
			let Some(parent_info) = self.types.get(&parent) else {
				break;
			};
			if chain.len() > self.types.len() {
				return Err(AttrError::InheritanceCycle { type_name: key.name() });
			}
			chain.push(parent_info);
			next = parent_info.parent;
		}

		Ok(chain.iter().rev().flat_map(|info| info.signatures.iter().cloned()).collect())
	}

	/// Entries registered for `key` itself.
	pub fn own_signatures(&self, key: TypeKey) -> Option<&[Signature]> {
		self.types.get(&key).map(|info| info.signatures.as_slice())
	}

	/// Registered parent of `key`.
	pub fn parent_of(&self, key: TypeKey) -> Option<TypeKey> {
		self.types.get(&key)?.parent
	}

	/// Whether `key` is registered.
	pub fn contains(&self, key: TypeKey) -> bool {
		self.types.contains_key(&key)
	}

	/// Drop `key`. Returns whether it was registered.
	pub fn remove_type(&mut self, key: TypeKey) -> bool {
		let removed = self.types.remove(&key).is_some();
		if removed {
			debug!(type_name = key.name(), "removed type");
		}
		removed
	}

	/// Drop every registration.
	pub fn clear(&mut self) {
		self.types.clear();
	}

	/// Number of registered types.
	pub fn len(&self) -> usize {
		self.types.len()
	}

	/// Whether nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}

	/// Registered keys sorted by name.
	pub fn type_keys(&self) -> Vec<TypeKey> {
		let mut keys = self.types.keys().copied().collect::<Vec<_>>();
		keys.sort_by_key(|key| key.name());
		keys
	}
}
