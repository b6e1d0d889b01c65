mod attributed;
mod codec;
mod error;
mod factory;
mod kind;
mod path;
mod registry;
mod signature;
mod tree;
mod value;

#[cfg(test)]
mod test_support;

/// Host binding traits.
pub use attributed::{Attributed, Described};
pub(crate) use attributed::Binding;
/// Error and result aliases.
pub use error::{AttrError, ErrorCategory, Result};
/// Class-name node construction.
pub use factory::{DEFAULT_CLASS, NodeFactory};
/// Value kind tags.
pub use kind::ValueKind;
/// Node path parser types.
pub use path::{NodePath, PathStep};
/// Type keys and the schema registry.
pub use registry::{TypeKey, TypeRegistry};
/// Schema entries and field accessors.
pub use signature::{BoundField, FieldAccess, Signature};
/// Node arena, handles, and value access guards.
pub use tree::{AttributeTree, NodeId, THIS_KEY, ValueMut, ValueRef};
/// Variant values and their element types.
pub use value::{Element, Object, Pointer, Storage, VariantValue};
