use thiserror::Error;

use attrtree::attr::AttrError;

/// Result type used by the CLI.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors produced while reading documents and running commands.
#[derive(Debug, Error)]
pub enum CliError {
	/// Tree, value, or registry operation failed.
	#[error(transparent)]
	Attr(#[from] AttrError),
	/// Filesystem read failed.
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	/// Input is not valid JSON or output could not be serialized.
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),
	/// zstd stream inflated past the configured limit.
	#[error("decompressed document exceeds {limit} bytes")]
	DecompressedTooLarge {
		/// Byte limit.
		limit: usize,
	},
	/// Document does not follow the table format.
	#[error("{path}: {reason}")]
	Document {
		/// Dotted key path of the offending entry.
		path: String,
		/// What was wrong with it.
		reason: String,
	},
	/// Table nesting went past `--max-depth`.
	#[error("{path}: nesting exceeds max depth {max_depth}")]
	DepthExceeded {
		/// Dotted key path where the limit was hit.
		path: String,
		/// Configured limit.
		max_depth: usize,
	},
}

impl CliError {
	pub(crate) fn document(path: &str, reason: impl Into<String>) -> Self {
		Self::Document {
			path: if path.is_empty() { "<root>".to_owned() } else { path.to_owned() },
			reason: reason.into(),
		}
	}
}
