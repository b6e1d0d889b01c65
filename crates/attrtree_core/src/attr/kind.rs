use std::fmt;
use std::str::FromStr;

use crate::attr::AttrError;

/// Element kind carried by a [`VariantValue`](crate::attr::VariantValue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
	/// No kind fixed yet.
	#[default]
	Unknown,
	/// `i32` elements.
	Integer,
	/// `f32` elements.
	Float,
	/// `String` elements.
	String,
	/// `glam::Vec4` elements.
	Vector,
	/// `glam::Mat4` elements.
	Matrix,
	/// Opaque [`Pointer`](crate::attr::Pointer) elements.
	Pointer,
	/// Owned child node handles.
	Table,
}

impl ValueKind {
	/// Every kind, in declaration order.
	pub const ALL: [ValueKind; 8] = [
		Self::Unknown,
		Self::Integer,
		Self::Float,
		Self::String,
		Self::Vector,
		Self::Matrix,
		Self::Pointer,
		Self::Table,
	];

	/// Stable lowercase label, as used by documents.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Unknown => "unknown",
			Self::Integer => "integer",
			Self::Float => "float",
			Self::String => "string",
			Self::Vector => "vector",
			Self::Matrix => "matrix",
			Self::Pointer => "pointer",
			Self::Table => "table",
		}
	}

	/// Look a kind up by its lowercase label.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.as_str() == name)
	}

	/// Whether values of this kind have a text form.
	pub fn has_text_form(self) -> bool {
		!matches!(self, Self::Unknown | Self::Pointer | Self::Table)
	}
}

impl fmt::Display for ValueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ValueKind {
	type Err = AttrError;

	fn from_str(name: &str) -> Result<Self, Self::Err> {
		Self::from_name(name).ok_or_else(|| AttrError::UnknownKind { name: name.to_owned() })
	}
}
