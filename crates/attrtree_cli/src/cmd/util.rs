use std::path::Path;

use attrtree::attr::{AttributeTree, NodeId};
use serde::Serialize;
use serde_json::Value;

use crate::compression::{Compression, decode_bytes};
use crate::error::Result;

/// Read a plain or zstd-compressed JSON document.
pub(crate) fn read_document(path: &Path) -> Result<(Compression, Value)> {
	let raw = std::fs::read(path)?;
	let (compression, bytes) = decode_bytes(raw)?;
	Ok((compression, serde_json::from_slice(&bytes)?))
}

/// Pretty-print `payload` to stdout.
pub(crate) fn emit_json<T: Serialize>(payload: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(payload)?);
	Ok(())
}

/// Path of `node` below `root`, as accepted by `--at`. The root itself is `.`.
pub(crate) fn node_path(tree: &AttributeTree, root: NodeId, node: NodeId) -> String {
	let mut steps = Vec::new();
	let mut current = node;
	while current != root {
		let Some(parent) = tree.parent(current) else {
			break;
		};
		if let Some((key, index)) = tree.find_contained_child(parent, current) {
			steps.push(format!("{key}[{index}]"));
		}
		current = parent;
	}

	if steps.is_empty() {
		return ".".to_owned();
	}
	steps.reverse();
	steps.join(".")
}
