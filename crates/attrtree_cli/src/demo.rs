//! Host types the CLI binds documents against.

use attrtree::attr::{Described, NodeFactory, Result, Signature, TypeKey, TypeRegistry};
use attrtree::{field, impl_attributed};
use glam::{Mat4, Vec4};

/// Scene object with a transform and nested tables.
#[derive(Debug, Clone)]
pub struct Entity {
	/// `Name`.
	pub name: String,
	/// `Tag`.
	pub tag: String,
	/// `Texture`.
	pub texture: String,
	/// `Position`.
	pub position: Vec4,
	/// `Rotation`.
	pub rotation: Vec4,
	/// `Scale`.
	pub scale: Vec4,
	/// `Transform`.
	pub transform: Mat4,
	/// `HasRelativePosition`, 0 or 1.
	pub has_relative_position: i32,
	/// `HasRelativeFacing`, 0 or 1.
	pub has_relative_facing: i32,
}

impl Default for Entity {
	fn default() -> Self {
		Self {
			name: String::new(),
			tag: String::new(),
			texture: String::new(),
			position: Vec4::W,
			rotation: Vec4::ZERO,
			scale: Vec4::ONE,
			transform: Mat4::IDENTITY,
			has_relative_position: 1,
			has_relative_facing: 1,
		}
	}
}

impl_attributed!(Entity);

impl Described for Entity {
	fn schema() -> Vec<Signature> {
		vec![
			field!(Entity, name as "Name"),
			field!(Entity, tag as "Tag"),
			field!(Entity, texture as "Texture"),
			field!(Entity, position as "Position"),
			field!(Entity, rotation as "Rotation"),
			field!(Entity, scale as "Scale"),
			field!(Entity, transform as "Transform"),
			field!(Entity, has_relative_position as "HasRelativePosition"),
			field!(Entity, has_relative_facing as "HasRelativeFacing"),
			Signature::table("Children", 0),
			Signature::table("Actions", 0),
			// One slot for the default animation.
			Signature::table("Animations", 1),
		]
	}
}

/// Named unit of behavior.
#[derive(Debug, Clone, Default)]
pub struct Action {
	/// `Name`.
	pub name: String,
}

impl_attributed!(Action);

impl Described for Action {
	fn schema() -> Vec<Signature> {
		vec![field!(Action, name as "Name")]
	}
}

/// Action holding nested actions.
#[derive(Debug, Clone, Default)]
pub struct ActionList {
	/// Inherited part.
	pub action: Action,
}

impl_attributed!(ActionList, base = action);

impl Described for ActionList {
	fn parent() -> Option<TypeKey> {
		Some(TypeKey::of::<Action>())
	}

	fn schema() -> Vec<Signature> {
		vec![Signature::table("Actions", 0)]
	}
}

/// Action that bumps an integer attribute found by upward search.
#[derive(Debug, Clone)]
pub struct ActionIncrement {
	/// Inherited part.
	pub action: Action,
	/// Key searched from the owning node.
	pub target: String,
	/// Amount added per update.
	pub step: i32,
}

impl Default for ActionIncrement {
	fn default() -> Self {
		Self {
			action: Action::default(),
			target: String::new(),
			step: 1,
		}
	}
}

impl_attributed!(ActionIncrement, base = action);

impl Described for ActionIncrement {
	fn parent() -> Option<TypeKey> {
		Some(TypeKey::of::<Action>())
	}

	fn schema() -> Vec<Signature> {
		vec![field!(ActionIncrement, target as "Target"), field!(ActionIncrement, step as "Step")]
	}
}

/// Registry with every demo type.
pub fn demo_registry() -> Result<TypeRegistry> {
	let mut registry = TypeRegistry::new();
	registry.register::<Entity>()?;
	registry.register::<Action>()?;
	registry.register::<ActionList>()?;
	registry.register::<ActionIncrement>()?;
	Ok(registry)
}

/// Factory with `Scope` plus one class per demo type.
pub fn demo_factory() -> NodeFactory {
	let mut factory = NodeFactory::with_defaults();
	factory.register::<Entity>("Entity");
	factory.register::<Action>("Action");
	factory.register::<ActionList>("ActionList");
	factory.register::<ActionIncrement>("ActionIncrement");
	factory
}
