use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::attr::{AttrError, AttributeTree, Attributed, Described, NodeId, Result, TypeRegistry};

/// Class name used for plain nodes.
pub const DEFAULT_CLASS: &str = "Scope";

type Constructor = Box<dyn Fn() -> Option<Box<dyn Attributed>>>;

/// Name-to-constructor table for creating nodes by class name.
///
/// A constructor returning `None` makes a plain node; otherwise the host is
/// bound through the registry.
#[derive(Default)]
pub struct NodeFactory {
	constructors: HashMap<String, Constructor>,
}

impl NodeFactory {
	/// Factory with no classes.
	pub fn new() -> Self {
		Self::default()
	}

	/// Factory with [`DEFAULT_CLASS`] registered as a plain node.
	pub fn with_defaults() -> Self {
		let mut factory = Self::new();
		factory.register_plain(DEFAULT_CLASS);
		factory
	}

	/// Register a class that creates plain nodes.
	pub fn register_plain(&mut self, name: &str) -> bool {
		self.register_with(name, || None)
	}

	/// Register a class that binds a default `T`.
	pub fn register<T: Described + Default>(&mut self, name: &str) -> bool {
		self.register_with(name, || Some(Box::new(T::default()) as Box<dyn Attributed>))
	}

	/// Register an arbitrary constructor. An existing class is kept.
	pub fn register_with(&mut self, name: &str, constructor: impl Fn() -> Option<Box<dyn Attributed>> + 'static) -> bool {
		if self.constructors.contains_key(name) {
			return false;
		}
		self.constructors.insert(name.to_owned(), Box::new(constructor));
		debug!(class = name, "registered class");
		true
	}

	/// Drop a class. Returns whether it existed.
	pub fn remove(&mut self, name: &str) -> bool {
		self.constructors.remove(name).is_some()
	}

	/// Whether `name` is registered.
	pub fn contains(&self, name: &str) -> bool {
		self.constructors.contains_key(name)
	}

	/// Number of classes.
	pub fn len(&self) -> usize {
		self.constructors.len()
	}

	/// Whether no class is registered.
	pub fn is_empty(&self) -> bool {
		self.constructors.is_empty()
	}

	/// Registered class names, sorted.
	pub fn class_names(&self) -> Vec<&str> {
		let mut names = self.constructors.keys().map(String::as_str).collect::<Vec<_>>();
		names.sort_unstable();
		names
	}

	/// Create a root node of class `name` in `tree`.
	pub fn create(&self, name: &str, tree: &mut AttributeTree, registry: &TypeRegistry) -> Result<NodeId> {
		let constructor = self.constructors.get(name).ok_or_else(|| AttrError::ClassNotFound { name: name.to_owned() })?;
		match constructor() {
			Some(host) => tree.insert_attributed_boxed(registry, host),
			None => Ok(tree.create_root()),
		}
	}
}

impl fmt::Debug for NodeFactory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NodeFactory").field("classes", &self.class_names()).finish()
	}
}

#[cfg(test)]
mod tests;
