use std::fmt;

use crate::attr::{AttrError, Result};

/// One parsed step in a node path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
	/// Select the table stored under a key.
	Key(String),
	/// Select a child within the preceding table by zero-based index.
	Index(usize),
}

/// Parsed node path such as `Kids[1].Loot`.
///
/// A key without an index selects the first child of its table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath {
	/// Ordered sequence of path steps.
	pub steps: Vec<PathStep>,
}

impl NodePath {
	/// Path that resolves to the starting node itself.
	pub fn root() -> Self {
		Self::default()
	}

	/// Parse dotted key syntax with optional `[index]` selectors.
	pub fn parse(input: &str) -> Result<Self> {
		let invalid = || AttrError::InvalidNodePath { path: input.to_owned() };
		if input.is_empty() {
			return Err(invalid());
		}

		let bytes = input.as_bytes();
		let mut idx = 0_usize;
		let mut steps = Vec::new();

		while idx < bytes.len() {
			let start = idx;
			while idx < bytes.len() && is_key_byte(bytes[idx]) {
				idx += 1;
			}
			if idx == start {
				return Err(invalid());
			}
			steps.push(PathStep::Key(input[start..idx].to_owned()));

			if idx < bytes.len() && bytes[idx] == b'[' {
				idx += 1;
				let n_start = idx;
				while idx < bytes.len() && bytes[idx].is_ascii_digit() {
					idx += 1;
				}
				if idx == n_start || idx >= bytes.len() || bytes[idx] != b']' {
					return Err(invalid());
				}
				let number = input[n_start..idx].parse::<usize>().map_err(|_| invalid())?;
				steps.push(PathStep::Index(number));
				idx += 1;
			}

			if idx < bytes.len() {
				if bytes[idx] != b'.' {
					return Err(invalid());
				}
				idx += 1;
				if idx >= bytes.len() {
					return Err(invalid());
				}
			}
		}

		Ok(Self { steps })
	}

	/// Whether the path has no steps.
	pub fn is_root(&self) -> bool {
		self.steps.is_empty()
	}

	/// `(key, index)` pairs, with a missing index defaulting to zero.
	pub fn hops(&self) -> Vec<(&str, usize)> {
		let mut hops = Vec::new();
		let mut steps = self.steps.iter().peekable();
		while let Some(step) = steps.next() {
			let PathStep::Key(key) = step else {
				continue;
			};
			let index = match steps.peek() {
				Some(PathStep::Index(index)) => {
					steps.next();
					*index
				}
				_ => 0,
			};
			hops.push((key.as_str(), index));
		}
		hops
	}
}

impl fmt::Display for NodePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (position, step) in self.steps.iter().enumerate() {
			match step {
				PathStep::Key(key) if position == 0 => f.write_str(key)?,
				PathStep::Key(key) => write!(f, ".{key}")?,
				PathStep::Index(index) => write!(f, "[{index}]")?,
			}
		}
		Ok(())
	}
}

fn is_key_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}
