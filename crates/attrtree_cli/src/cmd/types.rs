use attrtree::attr::{Signature, TypeRegistry};

use crate::cmd::util::emit_json;
use crate::demo::{demo_factory, demo_registry};
use crate::error::Result;

#[derive(clap::Args)]
pub struct Args {
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct TypesJson {
	types: Vec<TypeJson>,
	classes: Vec<String>,
}

#[derive(serde::Serialize)]
struct TypeJson {
	name: String,
	parent: Option<String>,
	signatures: Vec<SignatureJson>,
}

#[derive(serde::Serialize)]
struct SignatureJson {
	name: String,
	kind: String,
	count: usize,
	inherited: bool,
}

/// List the demo host types with their merged schemas.
pub fn run(args: Args) -> Result<()> {
	let Args { json } = args;

	let registry = demo_registry()?;
	let factory = demo_factory();
	let types = describe_types(&registry)?;
	let classes = factory.class_names().into_iter().map(str::to_owned).collect::<Vec<_>>();

	if json {
		return emit_json(&TypesJson { types, classes });
	}

	println!("classes: {}", classes.join(", "));
	for item in &types {
		match &item.parent {
			Some(parent) => println!("type: {} : {parent}", item.name),
			None => println!("type: {}", item.name),
		}
		for signature in &item.signatures {
			let marker = if signature.inherited { " (inherited)" } else { "" };
			println!("  {}: {}[{}]{marker}", signature.name, signature.kind, signature.count);
		}
	}
	Ok(())
}

fn describe_types(registry: &TypeRegistry) -> Result<Vec<TypeJson>> {
	let mut keys = registry.type_keys();
	keys.sort_by_key(|key| key.short_name());

	let mut out = Vec::with_capacity(keys.len());
	for key in keys {
		let own = registry.own_signatures(key).unwrap_or_default();
		let merged = registry.signatures(key)?;
		out.push(TypeJson {
			name: key.short_name().to_owned(),
			parent: registry.parent_of(key).map(|parent| parent.short_name().to_owned()),
			signatures: merged.iter().map(|signature| signature_json(signature, own)).collect(),
		});
	}
	Ok(out)
}

fn signature_json(signature: &Signature, own: &[Signature]) -> SignatureJson {
	SignatureJson {
		name: signature.name.clone(),
		kind: signature.kind.as_str().to_owned(),
		count: signature.count,
		inherited: !own.iter().any(|candidate| candidate.name == signature.name),
	}
}
