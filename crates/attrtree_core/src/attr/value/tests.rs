use glam::{Mat4, Vec4};

use super::{Element, Object, Pointer, VariantValue};
use crate::attr::{AttrError, AttributeTree, ValueKind};

#[derive(Debug)]
struct Tag(u32);

impl Object for Tag {
	fn equals(&self, other: &dyn Object) -> bool {
		other.as_any().downcast_ref::<Tag>().is_some_and(|tag| tag.0 == self.0)
	}

	fn as_any(&self) -> &dyn std::any::Any {
		self
	}
}

#[test]
fn kind_is_write_once() {
	let mut value = VariantValue::default();
	assert_eq!(value.kind(), ValueKind::Unknown);

	value.set_kind(ValueKind::Float).expect("first kind");
	value.set_kind(ValueKind::Float).expect("same kind again");

	let err = value.set_kind(ValueKind::Integer).expect_err("kind already fixed");
	assert!(matches!(
		err,
		AttrError::TypeConflict {
			current: ValueKind::Float,
			requested: ValueKind::Integer
		}
	));
}

#[test]
fn push_adopts_kind_and_grows_by_one() {
	let mut value = VariantValue::default();
	value.push_back(10_i32).expect("push");
	value.push_back(20_i32).expect("push");
	value.push_back(30_i32).expect("push");

	assert_eq!(value.kind(), ValueKind::Integer);
	assert_eq!(value.len(), 3);
	assert_eq!(value.capacity(), 3);
	assert_eq!(*value.front::<i32>().expect("front"), 10);
	assert_eq!(*value.back::<i32>().expect("back"), 30);
}

macro_rules! pushed_values_read_back_in_order {
	($($name:ident: $ty:ty => [$($item:expr),+ $(,)?];)+) => {
		$(
			#[test]
			fn $name() {
				let items: Vec<$ty> = vec![$($item),+];
				let mut value = VariantValue::default();
				for item in items.iter().cloned() {
					value.push_back(item).expect("push");
				}

				assert_eq!(value.kind(), <$ty as Element>::KIND);
				assert_eq!(value.len(), items.len());
				assert_eq!(value.capacity(), items.len());
				for (index, item) in items.iter().enumerate() {
					assert_eq!(value.get::<$ty>(index).expect("in range"), item);
				}
				assert!(matches!(value.get::<$ty>(items.len()), Err(AttrError::IndexOutOfRange { .. })));
			}
		)+
	};
}

pushed_values_read_back_in_order! {
	integers_read_back_in_order: i32 => [-4, 0, 9, i32::MAX];
	floats_read_back_in_order: f32 => [0.5, -1.25, 3.0];
	strings_read_back_in_order: String => [String::from("a"), String::new(), String::from("gamma")];
	vectors_read_back_in_order: Vec4 => [Vec4::X, Vec4::new(1.0, 2.0, 3.0, 4.0), Vec4::ZERO];
	matrices_read_back_in_order: Mat4 => [Mat4::IDENTITY, Mat4::ZERO, Mat4::from_scale(glam::Vec3::splat(2.0))];
	pointers_read_back_in_order: Pointer => [Pointer::Null, Pointer::Node(AttributeTree::new().create_root()), Pointer::object(Tag(3))];
}

#[test]
fn typed_access_checks_kind_and_bounds() {
	let mut value = VariantValue::from_values(vec![1.0_f32, 2.0]);

	let err = value.push_back(3_i32).expect_err("wrong element kind");
	assert!(matches!(
		err,
		AttrError::TypeMismatch {
			actual: ValueKind::Float,
			requested: ValueKind::Integer
		}
	));

	let err = value.get::<f32>(2).expect_err("past end");
	assert!(matches!(err, AttrError::IndexOutOfRange { index: 2, len: 2 }));

	assert!(matches!(
		VariantValue::default().get::<i32>(0),
		Err(AttrError::TypeMismatch { actual: ValueKind::Unknown, .. })
	));
}

#[test]
fn assign_pushes_when_empty_then_overwrites_first() {
	let mut value = VariantValue::default();
	value.assign(String::from("a")).expect("assign empty");
	value.push_back(String::from("b")).expect("push");
	value.assign(String::from("z")).expect("assign again");

	assert_eq!(value.as_slice::<String>().expect("strings"), ["z", "b"]);
}

#[test]
fn find_and_remove_use_element_equality() {
	let mut value = VariantValue::from_values(vec![1_i32, 2, 3, 2]);
	assert_eq!(value.find(&2_i32), Some(1));
	assert_eq!(value.find(&9_i32), None);
	assert_eq!(value.find(&2.0_f32), None);

	assert!(value.remove(&2_i32).expect("remove"));
	assert!(!value.remove(&7_i32).expect("remove miss"));
	assert_eq!(value.as_slice::<i32>().expect("ints"), [1, 3, 2]);

	value.remove_at(0).expect("remove_at");
	value.pop_back().expect("pop");
	assert_eq!(value.as_slice::<i32>().expect("ints"), [3]);

	let err = value.remove_at(4).expect_err("past end");
	assert!(matches!(err, AttrError::IndexOutOfRange { index: 4, len: 1 }));
}

#[test]
fn resize_fills_with_zero_elements() {
	let mut matrices = VariantValue::new(ValueKind::Matrix);
	matrices.resize(2).expect("resize");
	assert_eq!(matrices.as_slice::<Mat4>().expect("matrices"), [Mat4::ZERO, Mat4::ZERO]);

	let mut pointers = VariantValue::new(ValueKind::Pointer);
	pointers.resize(1).expect("resize");
	assert!(pointers.get::<Pointer>(0).expect("pointer").is_null());

	pointers.resize(0).expect("truncate");
	assert!(pointers.is_empty());

	let mut untyped = VariantValue::default();
	untyped.resize(0).expect("empty resize is allowed");
	assert!(matches!(untyped.resize(1), Err(AttrError::UntypedStorage { op: "resize" })));
	assert!(matches!(untyped.reserve(4), Err(AttrError::UntypedStorage { op: "reserve" })));
}

#[test]
fn reserve_and_shrink_adjust_capacity() {
	let mut value = VariantValue::from_values(vec![Vec4::ONE]);
	value.reserve(8).expect("reserve");
	assert!(value.capacity() >= 8);
	assert_eq!(value.len(), 1);

	value.shrink_to_fit().expect("shrink");
	assert_eq!(value.capacity(), 1);

	value.clear().expect("clear");
	assert!(value.is_empty());
	assert_eq!(value.kind(), ValueKind::Vector);
}

#[test]
fn aliased_view_writes_through_but_never_changes_length() {
	let mut backing = [1_i32, 2, 3];
	{
		let mut view = VariantValue::alias(&mut backing[..]);
		assert!(view.is_aliased());
		assert_eq!(view.capacity(), 3);

		view.set(20_i32, 1).expect("in-place write");
		*view.get_mut::<i32>(2).expect("get_mut") = 30;
		view.assign(10_i32).expect("assign first");

		for err in [
			view.push_back(4_i32).expect_err("push"),
			view.pop_back().expect_err("pop"),
			view.remove_at(0).expect_err("remove_at"),
			view.resize(5).expect_err("resize"),
			view.reserve(9).expect_err("reserve"),
			view.clear().expect_err("clear"),
			view.shrink_to_fit().expect_err("shrink"),
		] {
			assert!(matches!(err, AttrError::AliasedStorageViolation { .. }));
		}
		view.reserve(2).expect("reserve within the view is a no-op");
	}
	assert_eq!(backing, [10, 20, 30]);
}

#[test]
fn shared_view_is_read_only() {
	let backing = [String::from("x")];
	let mut view = VariantValue::shared(&backing[..]);
	assert!(view.is_read_only());
	assert_eq!(view.get::<String>(0).expect("read"), "x");

	let err = view.set(String::from("y"), 0).expect_err("write");
	assert!(matches!(err, AttrError::ReadOnlyView { op: "set" }));
}

#[test]
fn alias_in_place_requires_unowned_storage() {
	let mut backing = [1.0_f32, 2.0];

	let mut fresh = VariantValue::new(ValueKind::Float);
	fresh.alias_in_place(&mut backing[..]).expect("no capacity yet");
	assert_eq!(fresh.len(), 2);
	assert_eq!(fresh.capacity(), 2);
	drop(fresh);

	let mut owning = VariantValue::from_values(vec![0.0_f32]);
	let err = owning.alias_in_place(&mut backing[..]).expect_err("owns memory");
	assert!(matches!(err, AttrError::ExternalStorageOwned { capacity: 1 }));

	let mut strings = VariantValue::new(ValueKind::String);
	let err = strings.alias_in_place(&mut backing[..]).expect_err("kind differs");
	assert!(matches!(err, AttrError::TypeConflict { current: ValueKind::String, .. }));
}

#[test]
fn table_values_reject_storage_operations() {
	let mut table = VariantValue::new(ValueKind::Table);
	assert!(table.nodes().expect("nodes").is_empty());
	assert!(matches!(table.reserve(2), Err(AttrError::TableStorage { op: "reserve" })));
	assert!(matches!(table.resize(2), Err(AttrError::TableStorage { op: "resize" })));
	assert!(matches!(table.clear(), Err(AttrError::TableStorage { op: "clear" })));
	assert!(matches!(table.pop_back(), Err(AttrError::TableStorage { op: "pop_back" })));
	assert!(matches!(table.to_string_at(0), Err(AttrError::TextUnsupported { kind: ValueKind::Table })));
}

#[test]
fn equality_is_bitwise_for_floats() {
	let nan = VariantValue::from_values(vec![f32::NAN]);
	assert_eq!(nan, nan.clone());

	let positive = VariantValue::from_values(vec![0.0_f32]);
	let negative = VariantValue::from_values(vec![-0.0_f32]);
	assert_ne!(positive, negative);

	let mut backing = [Vec4::X];
	let view = VariantValue::alias(&mut backing[..]);
	assert_eq!(view, VariantValue::from_values(vec![Vec4::X]));
	assert_ne!(view, VariantValue::from_values(vec![Vec4::X, Vec4::Y]));
	assert_ne!(VariantValue::from_values(vec![1_i32]), VariantValue::from_values(vec![1.0_f32]));
}

#[test]
fn pointer_equality_delegates_to_objects() {
	let left = VariantValue::from_values(vec![Pointer::object(Tag(7)), Pointer::Null]);
	let right = VariantValue::from_values(vec![Pointer::object(Tag(7)), Pointer::Null]);
	let other = VariantValue::from_values(vec![Pointer::object(Tag(8)), Pointer::Null]);
	assert_eq!(left, right);
	assert_ne!(left, other);

	let pointer = left.get::<Pointer>(0).expect("pointer");
	assert_eq!(pointer.downcast_ref::<Tag>().map(|tag| tag.0), Some(7));
	assert_eq!(left.to_string_at(1).expect("render null"), "null");
}

#[test]
fn text_forms_cover_scalar_and_vector_kinds() {
	let mut value = VariantValue::new(ValueKind::Vector);
	value.push_back_from_str("vec4(1, 2, 3, 4)").expect("push text");
	value.set_from_str("vec4(0, 0, 0, 1)", 0).expect("set text");
	assert_eq!(value.to_string_at(0).expect("render"), "vec4(0, 0, 0, 1)");

	let mut ints = VariantValue::new(ValueKind::Integer);
	ints.push_back_from_str("12").expect("push text");
	assert_eq!(ints.to_string_at(0).expect("render"), "12");
	let err = ints.set_from_str("twelve", 0).expect_err("bad integer");
	assert!(matches!(err, AttrError::ParseValue { kind: ValueKind::Integer, .. }));

	let mut pointers = VariantValue::new(ValueKind::Pointer);
	assert!(matches!(
		pointers.push_back_from_str("null"),
		Err(AttrError::TextUnsupported { kind: ValueKind::Pointer })
	));
	assert!(matches!(
		VariantValue::default().push_back_from_str("1"),
		Err(AttrError::TextUnsupported { kind: ValueKind::Unknown })
	));
}

#[test]
fn to_owned_value_detaches_from_the_view() {
	let mut backing = [5_i32];
	let owned = VariantValue::alias(&mut backing[..]).to_owned_value();
	backing[0] = 6;
	assert!(!owned.is_aliased());
	assert_eq!(owned.as_slice::<i32>().expect("ints"), [5]);
}
