#![allow(missing_docs)]

use std::any::Any;

use attrtree::attr::{AttrError, AttributeTree, Described, ErrorCategory, NodeFactory, NodePath, Object, Pointer, Signature, TypeKey, TypeRegistry, ValueKind};
use attrtree::{field, impl_attributed};
use glam::Vec4;

#[derive(Debug, Clone, Default)]
struct Turret {
	ammo: [i32; 4],
	heading: f32,
	label: String,
	aim: Vec4,
}

impl_attributed!(Turret);

impl Described for Turret {
	fn schema() -> Vec<Signature> {
		vec![
			field!(Turret, ammo[4] as "Ammo"),
			field!(Turret, heading as "Heading"),
			field!(Turret, label),
			field!(Turret, aim as "Aim"),
			Signature::table("Targets", 0),
		]
	}
}

#[derive(Debug, PartialEq)]
struct Beacon(u32);

impl Object for Beacon {
	fn equals(&self, other: &dyn Object) -> bool {
		other.as_any().downcast_ref::<Self>().is_some_and(|other| other == self)
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

fn registry() -> TypeRegistry {
	let mut registry = TypeRegistry::new();
	registry.register::<Turret>().expect("register turret");
	registry
}

#[test]
fn fields_follow_the_host_after_the_tree_moves() {
	let registry = registry();
	let mut tree = AttributeTree::new();
	let node = tree.insert_attributed(&registry, Turret::default()).expect("bind");
	tree.find_mut(node, "Ammo").expect("ammo").set(6_i32, 3).expect("write");

	let mut moved = Box::new(tree);
	moved.find_mut(node, "label").expect("label").set(String::from("north"), 0).expect("write");
	moved.find_mut(node, "Aim").expect("aim").set_from_str("vec4(0, 1, 0, 0)", 0).expect("text");

	let host = moved.host::<Turret>(node).expect("host");
	assert_eq!(host.ammo, [0, 0, 0, 6]);
	assert_eq!(host.label, "north");
	assert_eq!(host.aim, Vec4::Y);
	assert_eq!(moved.kind_of(node, "Heading"), Some(ValueKind::Float));

	let host = moved.host_mut::<Turret>(node).expect("host");
	host.heading = 45.0;
	host.ammo[1] = 9;
	host.label.push_str("-east");
	assert_eq!(*moved.find(node, "Heading").expect("heading").get::<f32>(0).expect("float"), 45.0);
	assert_eq!(*moved.find(node, "Ammo").expect("ammo").get::<i32>(1).expect("int"), 9);
	assert_eq!(moved.find(node, "label").expect("label").get::<String>(0).expect("text"), "north-east");
}

#[test]
fn pointer_objects_compare_by_content() {
	let mut tree = AttributeTree::new();
	let first = tree.create_root();
	let second = tree.create_root();
	tree.append(first, "Beacon").expect("append").assign(Pointer::object(Beacon(7))).expect("assign");
	tree.append(second, "Beacon").expect("append").assign(Pointer::object(Beacon(7))).expect("assign");
	assert!(tree.nodes_equal(first, second));

	let beacon = tree.find(first, "Beacon").expect("beacon");
	let pointer = beacon.get::<Pointer>(0).expect("pointer");
	assert_eq!(pointer.downcast_ref::<Beacon>(), Some(&Beacon(7)));
	assert_eq!(beacon.to_string_at(0).expect("text"), "Beacon(7)");
}

#[test]
fn factory_built_hosts_nest_under_plain_scopes() {
	let registry = registry();
	let mut factory = NodeFactory::with_defaults();
	factory.register::<Turret>("Turret");

	let mut tree = AttributeTree::new();
	let scope = factory.create("Scope", &mut tree, &registry).expect("scope");
	let turret = factory.create("Turret", &mut tree, &registry).expect("turret");
	tree.adopt(scope, turret, "Defences").expect("adopt");
	let target = tree.append_child(turret, "Targets").expect("target");

	let path = NodePath::parse("Defences.Targets").expect("path");
	assert_eq!(tree.resolve_path(scope, &path).expect("resolve"), target);
	assert_eq!(tree.host_type(turret), Some(TypeKey::of::<Turret>()));

	tree.destroy(scope).expect("destroy");
	assert_eq!(tree.node_count(), 0);
}

#[test]
fn errors_map_onto_categories() {
	let mut tree = AttributeTree::new();
	let root = tree.create_root();
	tree.append(root, "hp").expect("append").assign(1_i32).expect("assign");

	let err = tree.find_mut(root, "hp").expect("hp").set(2_i32, 4).expect_err("bounds");
	assert_eq!(err.category(), ErrorCategory::Bounds);

	let err = tree.adopt(root, root, "self").expect_err("ownership");
	assert_eq!(err.category(), ErrorCategory::Ownership);

	let err = tree.find_mut(root, "hp").expect("hp").set_kind(ValueKind::String).expect_err("configuration");
	assert_eq!(err.category(), ErrorCategory::Configuration);

	let registry = TypeRegistry::new();
	let err = NodeFactory::new().create("Missing", &mut tree, &registry).expect_err("not found");
	assert!(matches!(err, AttrError::ClassNotFound { .. }));
	assert_eq!(err.category(), ErrorCategory::NotFound);
}
