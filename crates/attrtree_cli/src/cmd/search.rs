use std::path::PathBuf;

use attrtree::attr::{AttributeTree, NodePath, ValueKind};

use crate::cmd::util::{emit_json, node_path, read_document};
use crate::demo::{demo_factory, demo_registry};
use crate::document::{LoadOptions, Loader};
use crate::dump::{elements_json, to_document};
use crate::error::Result;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	pub key: String,
	#[arg(long, default_value = ".")]
	pub at: String,
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct SearchJson {
	key: String,
	at: String,
	found: bool,
	owner: Option<String>,
	kind: Option<String>,
	value: Option<serde_json::Value>,
}

/// Search `key` from the node at `--at`, walking up through parents.
pub fn run(args: Args) -> Result<()> {
	let Args { path, key, at, json } = args;

	let (_, document) = read_document(&path)?;
	let registry = demo_registry()?;
	let factory = demo_factory();
	let options = LoadOptions::default();

	let mut tree = AttributeTree::new();
	let root = Loader::new(&registry, &factory, &options).load(&mut tree, &document)?;
	let start = if at == "." { root } else { tree.resolve_path(root, &NodePath::parse(&at)?)? };

	let mut payload = SearchJson {
		key: key.clone(),
		at,
		found: false,
		owner: None,
		kind: None,
		value: None,
	};
	if let Some((owner, value)) = tree.search(start, &key) {
		let rendered = match value.kind() {
			ValueKind::Table => serde_json::Value::Array(value.nodes()?.iter().map(|child| to_document(&tree, *child)).collect::<Result<Vec<_>>>()?),
			_ => elements_json(&value)?,
		};
		payload.found = true;
		payload.owner = Some(node_path(&tree, root, owner));
		payload.kind = Some(value.kind().as_str().to_owned());
		payload.value = Some(rendered);
	}

	if json {
		return emit_json(&payload);
	}

	println!("key: {}", payload.key);
	println!("at: {}", payload.at);
	println!("found: {}", payload.found);
	if let (Some(owner), Some(kind), Some(value)) = (&payload.owner, &payload.kind, &payload.value) {
		println!("owner: {owner}");
		println!("kind: {kind}");
		println!("value: {value}");
	}
	Ok(())
}
