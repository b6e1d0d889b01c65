//! Render trees back to documents or indented text.

use attrtree::attr::{AttributeTree, DEFAULT_CLASS, NodeId, THIS_KEY, ValueKind, VariantValue};
use serde_json::{Map, Value, json};

use crate::document::CLASS_KEY;
use crate::error::{CliError, Result};

/// Render `node` in the document format the loader reads.
///
/// `"this"` is omitted. A bound `node` carries its class marker. A table gets
/// a `class` when all of its children are bound to the same host type. When
/// they differ, every child carries its own class marker instead.
pub fn to_document(tree: &AttributeTree, node: NodeId) -> Result<Value> {
	node_document(tree, node, class_of(tree, node))
}

fn node_document(tree: &AttributeTree, node: NodeId, marker: Option<&str>) -> Result<Value> {
	let mut out = Map::new();
	if let Some(class) = marker {
		if tree.is_attribute(node, CLASS_KEY) {
			return Err(CliError::document(CLASS_KEY, "entry collides with the class marker"));
		}
		out.insert(CLASS_KEY.to_owned(), json!(class));
	}

	for (key, value) in tree.entries(node)? {
		if key == THIS_KEY {
			continue;
		}
		let mut entry = Map::new();
		entry.insert("type".to_owned(), json!(value.kind().as_str()));

		if value.kind() == ValueKind::Table {
			let children = value.nodes()?;
			let shared = shared_class(tree, children);
			if let Some(class) = shared {
				entry.insert("class".to_owned(), json!(class));
			}
			let mixed = shared.is_none() && children.iter().any(|child| class_of(tree, *child).is_some());
			let rendered = children
				.iter()
				.map(|child| {
					let marker = mixed.then(|| class_of(tree, *child).unwrap_or(DEFAULT_CLASS));
					node_document(tree, *child, marker)
				})
				.collect::<Result<Vec<_>>>()?;
			entry.insert("value".to_owned(), Value::Array(rendered));
		} else if value.kind() != ValueKind::Unknown {
			entry.insert("value".to_owned(), elements_json(&value)?);
		}

		out.insert(key.to_owned(), Value::Object(entry));
	}
	Ok(Value::Object(out))
}

/// Short host type name of `node`, or `None` for plain nodes.
pub fn class_of(tree: &AttributeTree, node: NodeId) -> Option<&'static str> {
	tree.host_type(node).map(|key| key.short_name())
}

fn shared_class(tree: &AttributeTree, children: &[NodeId]) -> Option<&'static str> {
	let first = class_of(tree, *children.first()?)?;
	children.iter().all(|child| class_of(tree, *child) == Some(first)).then_some(first)
}

/// Elements of a non-table value: a scalar for one element, else an array.
pub fn elements_json(value: &VariantValue<'_>) -> Result<Value> {
	let mut elements = (0..value.len()).map(|index| element_json(value, index)).collect::<Result<Vec<_>>>()?;
	Ok(if elements.len() == 1 { elements.remove(0) } else { Value::Array(elements) })
}

fn element_json(value: &VariantValue<'_>, index: usize) -> Result<Value> {
	Ok(match value.kind() {
		ValueKind::Integer => json!(*value.get::<i32>(index)?),
		ValueKind::Float => json!(f64::from(*value.get::<f32>(index)?)),
		ValueKind::String => json!(value.get::<String>(index)?),
		_ => json!(value.to_string_at(index)?),
	})
}

/// Indented text listing of `node` and its descendants.
pub fn text_lines(tree: &AttributeTree, node: NodeId) -> Result<Vec<String>> {
	let mut lines = Vec::new();
	push_lines(tree, node, 0, &mut lines)?;
	Ok(lines)
}

fn push_lines(tree: &AttributeTree, node: NodeId, depth: usize, lines: &mut Vec<String>) -> Result<()> {
	let pad = "  ".repeat(depth);
	for (key, value) in tree.entries(node)? {
		if key == THIS_KEY {
			continue;
		}
		match value.kind() {
			ValueKind::Table => {
				let children = value.nodes()?;
				lines.push(format!("{pad}{key}: table[{}]", children.len()));
				for (index, child) in children.iter().enumerate() {
					lines.push(format!("{pad}  [{index}] {}", class_of(tree, *child).unwrap_or(DEFAULT_CLASS)));
					push_lines(tree, *child, depth + 2, lines)?;
				}
			}
			ValueKind::Unknown => lines.push(format!("{pad}{key}: unknown")),
			kind => {
				let elements = (0..value.len()).map(|index| element_text(&value, index)).collect::<Result<Vec<_>>>()?;
				let rendered = if elements.len() == 1 { elements.join("") } else { format!("[{}]", elements.join(", ")) };
				lines.push(format!("{pad}{key}: {kind} = {rendered}"));
			}
		}
	}
	Ok(())
}

fn element_text(value: &VariantValue<'_>, index: usize) -> Result<String> {
	if value.kind() == ValueKind::String {
		return Ok(format!("{:?}", value.get::<String>(index)?));
	}
	Ok(value.to_string_at(index)?)
}

#[cfg(test)]
mod tests {
	use attrtree::attr::{AttributeTree, NodePath, Pointer};
	use serde_json::json;

	use super::{text_lines, to_document};
	use crate::demo::{Action, Entity, demo_factory, demo_registry};
	use crate::document::{LoadOptions, Loader};

	#[test]
	fn documents_reload_to_an_equal_tree() {
		let document = json!({
			"Count": { "type": "integer", "value": [1, 2] },
			"Label": { "type": "string", "value": "x" },
			"Hero": { "type": "table", "class": "Entity", "value": [{ "Name": { "type": "string", "value": "hero" } }] }
		});
		let registry = demo_registry().expect("registry");
		let factory = demo_factory();
		let options = LoadOptions::default();
		let loader = Loader::new(&registry, &factory, &options);

		let mut tree = AttributeTree::new();
		let first = loader.load(&mut tree, &document).expect("load");
		let dumped = to_document(&tree, first).expect("dump");
		assert_eq!(dumped["Hero"]["class"], "Entity");
		assert_eq!(dumped["Count"]["value"], json!([1, 2]));
		assert_eq!(dumped["Hero"]["value"][0]["Name"]["value"], "hero");
		assert!(dumped["Hero"]["value"][0].get("this").is_none());

		let second = loader.load(&mut tree, &dumped).expect("reload");
		assert!(tree.nodes_equal(first, second));
	}

	#[test]
	fn mixed_class_tables_reload_with_their_hosts() {
		let document = json!({
			"Hero": { "type": "table", "class": "Entity", "value": [{
				"Animations": { "type": "table", "value": [
					{ "class": "Action", "Name": { "type": "string", "value": "walk" } },
					{ "Clip": { "type": "string", "value": "run" } }
				] }
			}] }
		});
		let registry = demo_registry().expect("registry");
		let factory = demo_factory();
		let options = LoadOptions::default();
		let loader = Loader::new(&registry, &factory, &options);

		let mut tree = AttributeTree::new();
		let first = loader.load(&mut tree, &document).expect("load");
		let dumped = to_document(&tree, first).expect("dump");
		let animations = &dumped["Hero"]["value"][0]["Animations"];
		assert!(animations.get("class").is_none());
		assert_eq!(animations["value"][0]["class"], "Action");
		assert_eq!(animations["value"][1]["class"], "Scope");

		let second = loader.load(&mut tree, &dumped).expect("reload");
		let walk = tree.resolve_path(second, &NodePath::parse("Hero.Animations[0]").expect("path")).expect("walk");
		assert_eq!(tree.host::<Action>(walk).expect("action host").name, "walk");
		let run = tree.resolve_path(second, &NodePath::parse("Hero.Animations[1]").expect("path")).expect("run");
		assert!(tree.host_dyn(run).is_none());
		assert!(tree.nodes_equal(first, second));

		let mut stripped = dumped.clone();
		stripped["Hero"]["value"][0]["Animations"]["value"][0]
			.as_object_mut()
			.expect("child object")
			.remove("class");
		let third = loader.load(&mut tree, &stripped).expect("reload without marker");
		assert!(!tree.nodes_equal(first, third));
	}

	#[test]
	fn text_lines_indent_children() {
		let registry = demo_registry().expect("registry");
		let mut tree = AttributeTree::new();
		let root = tree.create_root();
		tree.append(root, "Label").expect("label").assign(String::from("arena")).expect("assign");
		tree.append(root, "Target").expect("target").assign(Pointer::Null).expect("assign");
		let hero = tree.insert_attributed(&registry, Entity::default()).expect("entity");
		tree.adopt(root, hero, "Hero").expect("adopt");

		let lines = text_lines(&tree, root).expect("lines");
		assert_eq!(lines[0], "Label: string = \"arena\"");
		assert_eq!(lines[1], "Target: pointer = null");
		assert_eq!(lines[2], "Hero: table[1]");
		assert_eq!(lines[3], "  [0] Entity");
		assert_eq!(lines[4], "    Name: string = \"\"");
		assert!(lines.iter().any(|line| line == "      [0] Scope"));
	}
}
