use crate::attr::test_support::{Monster, registry};
use crate::attr::{AttrError, AttributeTree, DEFAULT_CLASS, NodeFactory};

#[test]
fn default_class_creates_plain_nodes() {
	let factory = NodeFactory::with_defaults();
	let registry = registry();
	let mut tree = AttributeTree::new();

	let node = factory.create(DEFAULT_CLASS, &mut tree, &registry).expect("create scope");
	assert_eq!(tree.len(node).expect("len"), 0);
	assert!(tree.host_dyn(node).is_none());
}

#[test]
fn registered_classes_bind_hosts() {
	let mut factory = NodeFactory::with_defaults();
	assert!(factory.register::<Monster>("Monster"));
	assert!(!factory.register_plain("Monster"));
	assert_eq!(factory.class_names(), ["Monster", "Scope"]);

	let registry = registry();
	let mut tree = AttributeTree::new();
	let node = factory.create("Monster", &mut tree, &registry).expect("create monster");
	assert_eq!(tree.host::<Monster>(node).map(|host| host.health), Some(0));
	assert!(tree.is_prescribed_attribute(node, "Loot"));
}

#[test]
fn unknown_class_is_not_found() {
	let mut factory = NodeFactory::new();
	let registry = registry();
	let mut tree = AttributeTree::new();

	let err = factory.create("Dragon", &mut tree, &registry).expect_err("missing");
	assert!(matches!(err, AttrError::ClassNotFound { ref name } if name == "Dragon"));

	factory.register_plain("Dragon");
	assert!(factory.contains("Dragon"));
	assert!(factory.remove("Dragon"));
	assert!(factory.is_empty());
}
