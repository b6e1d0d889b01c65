use thiserror::Error;

use crate::attr::{NodeId, ValueKind};

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, AttrError>;

/// Coarse error family used by callers deciding how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
	/// Caller-logic bug: conflicting types, bad schemas, unregistered types.
	Configuration,
	/// Index outside the current length.
	Bounds,
	/// Tree ownership or storage aliasing rules were violated.
	Ownership,
	/// A key, node, class, or path lookup missed.
	NotFound,
}

/// Errors produced while mutating values, trees, and registries.
#[derive(Debug, Error)]
pub enum AttrError {
	/// Value already carries a different kind.
	#[error("type conflict: value is {current}, requested {requested}")]
	TypeConflict {
		/// Kind currently fixed on the value.
		current: ValueKind,
		/// Kind the caller tried to set.
		requested: ValueKind,
	},
	/// Typed access disagrees with the value kind.
	#[error("type mismatch: value is {actual}, accessed as {requested}")]
	TypeMismatch {
		/// Kind carried by the value.
		actual: ValueKind,
		/// Kind implied by the accessor.
		requested: ValueKind,
	},
	/// Index past the current length.
	#[error("index {index} out of range (len={len})")]
	IndexOutOfRange {
		/// Requested index.
		index: usize,
		/// Current length.
		len: usize,
	},
	/// Length or capacity change requested on an aliased view.
	#[error("{op} is not allowed on aliased storage")]
	AliasedStorageViolation {
		/// Operation name.
		op: &'static str,
	},
	/// Write requested through a read-only view.
	#[error("{op} is not allowed on a read-only view")]
	ReadOnlyView {
		/// Operation name.
		op: &'static str,
	},
	/// External storage requested on a value that already owns memory.
	#[error("value already owns storage (capacity={capacity})")]
	ExternalStorageOwned {
		/// Capacity currently allocated by the value.
		capacity: usize,
	},
	/// Storage operation that table values never support.
	#[error("{op} is not supported on table values")]
	TableStorage {
		/// Operation name.
		op: &'static str,
	},
	/// Storage operation on a value with no kind yet.
	#[error("{op} requires a typed value")]
	UntypedStorage {
		/// Operation name.
		op: &'static str,
	},
	/// Attribute keys must be non-empty.
	#[error("attribute key must not be empty")]
	EmptyKey,
	/// A node was asked to adopt itself.
	#[error("node {node} cannot adopt itself")]
	SelfAdoption {
		/// Offending node.
		node: NodeId,
	},
	/// Adoption would create an ancestor/descendant cycle.
	#[error("node {child} is an ancestor or descendant of {parent}")]
	CycleViolation {
		/// Would-be parent.
		parent: NodeId,
		/// Would-be child.
		child: NodeId,
	},
	/// Auxiliary append collided with a prescribed attribute.
	#[error("{key} is a prescribed attribute")]
	PrescribedConflict {
		/// Colliding key.
		key: String,
	},
	/// Registration named the type as its own parent.
	#[error("type {type_name} cannot be its own parent")]
	SelfParenting {
		/// Registered type.
		type_name: &'static str,
	},
	/// Parent links of registered types loop back on themselves.
	#[error("inheritance cycle through {type_name}")]
	InheritanceCycle {
		/// Type where the walk started.
		type_name: &'static str,
	},
	/// Schema lookup for a type that was never registered.
	#[error("type {type_name} is not registered")]
	UnregisteredType {
		/// Requested type.
		type_name: &'static str,
	},
	/// Declared repeat count disagrees with the bound host field.
	#[error("{type_name}.{field}: declared count {declared}, host field has {actual}")]
	SchemaMismatch {
		/// Host type.
		type_name: &'static str,
		/// Field name.
		field: String,
		/// Count in the signature.
		declared: usize,
		/// Length of the host field view.
		actual: usize,
	},
	/// Same attribute name declared twice along the inheritance chain.
	#[error("{type_name} declares attribute {field} more than once")]
	DuplicateSignature {
		/// Host type.
		type_name: &'static str,
		/// Repeated name.
		field: String,
	},
	/// Field accessor could not find its host type along the base chain.
	#[error("{type_name} has no host part for field {field}")]
	UnboundField {
		/// Host type.
		type_name: &'static str,
		/// Field name.
		field: String,
	},
	/// Replacement host has a different dynamic type.
	#[error("host type mismatch: node holds {expected}, got {actual}")]
	HostTypeMismatch {
		/// Dynamic type bound to the node.
		expected: &'static str,
		/// Dynamic type of the replacement.
		actual: &'static str,
	},
	/// Operation needs an attributed node.
	#[error("node {node} has no attributed host")]
	NotAttributed {
		/// Plain node.
		node: NodeId,
	},
	/// Node id refers to a destroyed or foreign slot.
	#[error("stale node id {node}")]
	StaleNode {
		/// Offending id.
		node: NodeId,
	},
	/// Factory has no constructor for the class name.
	#[error("class not found: {name}")]
	ClassNotFound {
		/// Requested class.
		name: String,
	},
	/// Kind has no text representation.
	#[error("{kind} values have no text form")]
	TextUnsupported {
		/// Kind of the value.
		kind: ValueKind,
	},
	/// Text did not parse as the value kind.
	#[error("cannot parse {input:?} as {kind}")]
	ParseValue {
		/// Target kind.
		kind: ValueKind,
		/// Offending text.
		input: String,
	},
	/// Unknown kind name.
	#[error("unknown value kind: {name}")]
	UnknownKind {
		/// Offending name.
		name: String,
	},
	/// Node path expression syntax is invalid.
	#[error("invalid node path: {path}")]
	InvalidNodePath {
		/// Original path text.
		path: String,
	},
	/// Node path did not resolve.
	#[error("node path not found: {path} (at {step})")]
	PathNotFound {
		/// Original path text.
		path: String,
		/// Step that failed.
		step: String,
	},
}

impl AttrError {
	/// Map the error onto its taxonomy family.
	pub fn category(&self) -> ErrorCategory {
		match self {
			Self::IndexOutOfRange { .. } => ErrorCategory::Bounds,
			Self::AliasedStorageViolation { .. }
			| Self::ReadOnlyView { .. }
			| Self::ExternalStorageOwned { .. }
			| Self::TableStorage { .. }
			| Self::SelfAdoption { .. }
			| Self::CycleViolation { .. } => ErrorCategory::Ownership,
			Self::StaleNode { .. } | Self::ClassNotFound { .. } | Self::PathNotFound { .. } => ErrorCategory::NotFound,
			_ => ErrorCategory::Configuration,
		}
	}
}
