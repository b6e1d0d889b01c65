use std::path::PathBuf;

use attrtree::attr::{AttributeTree, DEFAULT_CLASS};

use crate::cmd::util::{emit_json, read_document};
use crate::demo::{demo_factory, demo_registry};
use crate::document::{LoadOptions, Loader};
use crate::dump::{class_of, text_lines, to_document};
use crate::error::Result;

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
	#[arg(long, default_value_t = 32)]
	pub max_depth: usize,
	#[arg(long = "class", default_value = DEFAULT_CLASS)]
	pub class: String,
}

#[derive(serde::Serialize)]
struct LoadJson {
	path: String,
	compression: String,
	nodes: usize,
	root_class: String,
	document: serde_json::Value,
}

/// Load a table document through the demo factory and print the tree.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		json,
		max_depth,
		class,
	} = args;

	let (compression, document) = read_document(&path)?;
	let registry = demo_registry()?;
	let factory = demo_factory();
	let options = LoadOptions {
		max_depth,
		default_class: class,
	};

	let mut tree = AttributeTree::new();
	let root = Loader::new(&registry, &factory, &options).load(&mut tree, &document)?;
	let root_class = class_of(&tree, root).unwrap_or(DEFAULT_CLASS);

	if json {
		let payload = LoadJson {
			path: path.display().to_string(),
			compression: compression.as_str().to_owned(),
			nodes: tree.node_count(),
			root_class: root_class.to_owned(),
			document: to_document(&tree, root)?,
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("compression: {}", compression.as_str());
	println!("nodes: {}", tree.node_count());
	println!("root_class: {root_class}");
	for line in text_lines(&tree, root)? {
		println!("{line}");
	}
	Ok(())
}
