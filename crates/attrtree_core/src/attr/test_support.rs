use glam::{Mat4, Vec4};

use crate::attr::{Described, Signature, TypeKey, TypeRegistry};

#[derive(Debug, Clone, Default)]
pub(crate) struct Monster {
	pub(crate) health: i32,
	pub(crate) speed: f32,
	pub(crate) name: String,
	pub(crate) position: Vec4,
	pub(crate) transform: Mat4,
	pub(crate) scores: [i32; 3],
}

crate::impl_attributed!(Monster);

impl Described for Monster {
	fn schema() -> Vec<Signature> {
		vec![
			crate::field!(Monster, health as "Health"),
			crate::field!(Monster, speed as "Speed"),
			crate::field!(Monster, name as "Name"),
			crate::field!(Monster, position as "Position"),
			crate::field!(Monster, transform as "Transform"),
			crate::field!(Monster, scores[3] as "Scores"),
			Signature::table("Loot", 2),
		]
	}
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Orc {
	pub(crate) monster: Monster,
	pub(crate) rage: f32,
}

crate::impl_attributed!(Orc, base = monster);

impl Described for Orc {
	fn parent() -> Option<TypeKey> {
		Some(TypeKey::of::<Monster>())
	}

	fn schema() -> Vec<Signature> {
		vec![crate::field!(Orc, rage as "Rage")]
	}
}

pub(crate) fn monster() -> Monster {
	Monster {
		health: 100,
		speed: 1.5,
		name: "grunt".to_owned(),
		position: Vec4::new(1.0, 2.0, 3.0, 1.0),
		transform: Mat4::IDENTITY,
		scores: [3, 5, 8],
	}
}

pub(crate) fn registry() -> TypeRegistry {
	let mut registry = TypeRegistry::new();
	registry.register::<Monster>().expect("register Monster");
	registry.register::<Orc>().expect("register Orc");
	registry
}
