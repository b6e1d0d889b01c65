use std::any::Any;
use std::fmt;
use std::rc::Rc;

use glam::{Mat4, Vec4};

use crate::attr::codec;
use crate::attr::{AttrError, NodeId, Result, ValueKind};

/// Object that a pointer value can reference.
pub trait Object: Any + fmt::Debug {
	/// Structural equality against another referenced object.
	fn equals(&self, other: &dyn Object) -> bool;

	/// Upcast for downcasting to the concrete type.
	fn as_any(&self) -> &dyn Any;

	/// Text used when a pointer value is rendered.
	fn describe(&self) -> String {
		format!("{self:?}")
	}
}

/// One element of a pointer value.
#[derive(Debug, Clone, Default)]
pub enum Pointer {
	/// Points at nothing.
	#[default]
	Null,
	/// Refers to a node by handle. Used by the reserved `"this"` slot.
	Node(NodeId),
	/// Shared reference to an arbitrary object.
	Object(Rc<dyn Object>),
}

impl Pointer {
	/// Wrap an object in a shared pointer element.
	pub fn object<T: Object>(object: T) -> Self {
		Self::Object(Rc::new(object))
	}

	/// Whether this is the null pointer.
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Node handle, when this pointer refers to a node.
	pub fn as_node(&self) -> Option<NodeId> {
		match self {
			Self::Node(node) => Some(*node),
			_ => None,
		}
	}

	/// Downcast the referenced object.
	pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
		match self {
			Self::Object(object) => object.as_any().downcast_ref::<T>(),
			_ => None,
		}
	}
}

impl PartialEq for Pointer {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Node(left), Self::Node(right)) => left == right,
			(Self::Object(left), Self::Object(right)) => Rc::ptr_eq(left, right) || left.equals(&**right),
			_ => false,
		}
	}
}

/// Backing sequence of a typed value.
#[derive(Debug)]
pub enum Storage<'a, T> {
	/// Heap buffer owned by the value.
	Owned(Vec<T>),
	/// Mutable view into memory owned elsewhere. Length is fixed.
	Aliased(&'a mut [T]),
	/// Read-only view into memory owned elsewhere.
	Shared(&'a [T]),
}

impl<T> Storage<'_, T> {
	/// Elements as a slice.
	pub fn as_slice(&self) -> &[T] {
		match self {
			Self::Owned(values) => values.as_slice(),
			Self::Aliased(values) => &**values,
			Self::Shared(values) => *values,
		}
	}

	/// Number of elements.
	pub fn len(&self) -> usize {
		self.as_slice().len()
	}

	/// Whether there are no elements.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Allocated slots; views report their fixed length.
	pub fn capacity(&self) -> usize {
		match self {
			Self::Owned(values) => values.capacity(),
			_ => self.len(),
		}
	}

	/// Whether the storage is a view into external memory.
	pub fn is_aliased(&self) -> bool {
		!matches!(self, Self::Owned(_))
	}

	fn slice_mut(&mut self, op: &'static str) -> Result<&mut [T]> {
		match self {
			Self::Owned(values) => Ok(values.as_mut_slice()),
			Self::Aliased(values) => Ok(&mut **values),
			Self::Shared(_) => Err(AttrError::ReadOnlyView { op }),
		}
	}

	fn owned_mut(&mut self, op: &'static str) -> Result<&mut Vec<T>> {
		match self {
			Self::Owned(values) => Ok(values),
			_ => Err(AttrError::AliasedStorageViolation { op }),
		}
	}
}

impl<T: Clone + 'static> Storage<'_, T> {
	/// Copy the elements into owned storage.
	pub fn to_owned_storage(&self) -> Storage<'static, T> {
		Storage::Owned(self.as_slice().to_vec())
	}
}

mod sealed {
	pub trait Sealed {}
}

/// Element type that a [`VariantValue`] can hold.
pub trait Element: Clone + fmt::Debug + sealed::Sealed + 'static {
	/// Kind tag for values of this element.
	const KIND: ValueKind;

	/// Typed storage when `value` holds this element kind.
	fn storage<'v, 'a>(value: &'v VariantValue<'a>) -> Option<&'v Storage<'a, Self>>;

	/// Mutable typed storage when `value` holds this element kind.
	fn storage_mut<'v, 'a>(value: &'v mut VariantValue<'a>) -> Option<&'v mut Storage<'a, Self>>;

	/// Build a value around typed storage.
	fn wrap(storage: Storage<'_, Self>) -> VariantValue<'_>;

	/// Default element used when growing by `resize`.
	fn zero() -> Self;

	/// Element equality. Float-based kinds compare bit patterns.
	fn same(&self, other: &Self) -> bool;
}

macro_rules! element {
	($ty:ty, $variant:ident, $zero:expr, $same:expr) => {
		impl sealed::Sealed for $ty {}

		impl Element for $ty {
			const KIND: ValueKind = ValueKind::$variant;

			fn storage<'v, 'a>(value: &'v VariantValue<'a>) -> Option<&'v Storage<'a, Self>> {
				match value {
					VariantValue::$variant(storage) => Some(storage),
					_ => None,
				}
			}

			fn storage_mut<'v, 'a>(value: &'v mut VariantValue<'a>) -> Option<&'v mut Storage<'a, Self>> {
				match value {
					VariantValue::$variant(storage) => Some(storage),
					_ => None,
				}
			}

			fn wrap(storage: Storage<'_, Self>) -> VariantValue<'_> {
				VariantValue::$variant(storage)
			}

			fn zero() -> Self {
				$zero
			}

			fn same(&self, other: &Self) -> bool {
				($same)(self, other)
			}
		}
	};
}

element!(i32, Integer, 0, |left: &i32, right: &i32| left == right);
element!(f32, Float, 0.0, |left: &f32, right: &f32| left.to_bits() == right.to_bits());
element!(String, String, String::new(), |left: &String, right: &String| left == right);
element!(Vec4, Vector, Vec4::ZERO, |left: &Vec4, right: &Vec4| bits_eq(&left.to_array(), &right.to_array()));
element!(Mat4, Matrix, Mat4::ZERO, |left: &Mat4, right: &Mat4| bits_eq(
	&left.to_cols_array(),
	&right.to_cols_array()
));
element!(Pointer, Pointer, Pointer::Null, |left: &Pointer, right: &Pointer| left == right);

/// Single-typed, length-bearing dynamic value.
///
/// Values stored in an [`AttributeTree`](crate::attr::AttributeTree) are
/// `VariantValue<'static>` and always own their elements. Views produced for
/// attributed host fields borrow the host and carry its lifetime.
#[derive(Debug, Default)]
pub enum VariantValue<'a> {
	/// No kind fixed yet.
	#[default]
	Unknown,
	/// `i32` elements.
	Integer(Storage<'a, i32>),
	/// `f32` elements.
	Float(Storage<'a, f32>),
	/// `String` elements.
	String(Storage<'a, String>),
	/// `Vec4` elements.
	Vector(Storage<'a, Vec4>),
	/// `Mat4` elements.
	Matrix(Storage<'a, Mat4>),
	/// Pointer elements.
	Pointer(Storage<'a, Pointer>),
	/// Child node handles owned by the value.
	Table(Vec<NodeId>),
}

macro_rules! each_storage {
	($value:expr, $storage:ident => $body:expr, table $ids:ident => $table:expr, unknown => $unknown:expr) => {
		match $value {
			VariantValue::Unknown => $unknown,
			VariantValue::Integer($storage) => $body,
			VariantValue::Float($storage) => $body,
			VariantValue::String($storage) => $body,
			VariantValue::Vector($storage) => $body,
			VariantValue::Matrix($storage) => $body,
			VariantValue::Pointer($storage) => $body,
			VariantValue::Table($ids) => $table,
		}
	};
}

impl<'a> VariantValue<'a> {
	/// Empty owned value of `kind`.
	pub fn new(kind: ValueKind) -> Self {
		match kind {
			ValueKind::Unknown => Self::Unknown,
			ValueKind::Integer => Self::Integer(Storage::Owned(Vec::new())),
			ValueKind::Float => Self::Float(Storage::Owned(Vec::new())),
			ValueKind::String => Self::String(Storage::Owned(Vec::new())),
			ValueKind::Vector => Self::Vector(Storage::Owned(Vec::new())),
			ValueKind::Matrix => Self::Matrix(Storage::Owned(Vec::new())),
			ValueKind::Pointer => Self::Pointer(Storage::Owned(Vec::new())),
			ValueKind::Table => Self::Table(Vec::new()),
		}
	}

	/// Owned value holding `values`.
	pub fn from_values<T: Element>(values: Vec<T>) -> Self {
		T::wrap(Storage::Owned(values))
	}

	/// Mutable view over external elements.
	pub fn alias<T: Element>(values: &'a mut [T]) -> Self {
		T::wrap(Storage::Aliased(values))
	}

	/// Read-only view over external elements.
	pub fn shared<T: Element>(values: &'a [T]) -> Self {
		T::wrap(Storage::Shared(values))
	}

	/// Turn this value into a view over `values`.
	///
	/// Fails when the value owns allocated memory or carries another kind.
	/// Afterwards length and capacity both equal `values.len()`.
	pub fn alias_in_place<T: Element>(&mut self, values: &'a mut [T]) -> Result<()> {
		let current = self.kind();
		if current != ValueKind::Unknown && current != T::KIND {
			return Err(AttrError::TypeConflict {
				current,
				requested: T::KIND,
			});
		}

		let capacity = self.owned_capacity();
		if capacity > 0 {
			return Err(AttrError::ExternalStorageOwned { capacity });
		}

		*self = Self::alias(values);
		Ok(())
	}

	/// Kind tag of the value.
	pub fn kind(&self) -> ValueKind {
		match self {
			Self::Unknown => ValueKind::Unknown,
			Self::Integer(_) => ValueKind::Integer,
			Self::Float(_) => ValueKind::Float,
			Self::String(_) => ValueKind::String,
			Self::Vector(_) => ValueKind::Vector,
			Self::Matrix(_) => ValueKind::Matrix,
			Self::Pointer(_) => ValueKind::Pointer,
			Self::Table(_) => ValueKind::Table,
		}
	}

	/// Fix the kind. Succeeds when unset or already `kind`.
	pub fn set_kind(&mut self, kind: ValueKind) -> Result<()> {
		let current = self.kind();
		if current == kind {
			return Ok(());
		}
		if current != ValueKind::Unknown {
			return Err(AttrError::TypeConflict { current, requested: kind });
		}

		*self = Self::new(kind);
		Ok(())
	}

	/// Number of elements.
	pub fn len(&self) -> usize {
		each_storage!(self, storage => storage.len(), table ids => ids.len(), unknown => 0)
	}

	/// Whether there are no elements.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Allocated slots.
	pub fn capacity(&self) -> usize {
		each_storage!(self, storage => storage.capacity(), table ids => ids.capacity(), unknown => 0)
	}

	/// Whether the value is a view into external memory.
	pub fn is_aliased(&self) -> bool {
		each_storage!(self, storage => storage.is_aliased(), table _ids => false, unknown => false)
	}

	/// Whether the value is a read-only view.
	pub fn is_read_only(&self) -> bool {
		each_storage!(self, storage => matches!(storage, Storage::Shared(_)), table _ids => false, unknown => false)
	}

	fn owned_capacity(&self) -> usize {
		each_storage!(
			self,
			storage => match storage {
				Storage::Owned(values) => values.capacity(),
				_ => 0,
			},
			table ids => ids.capacity(),
			unknown => 0
		)
	}

	fn typed<T: Element>(&self) -> Result<&Storage<'a, T>> {
		T::storage(self).ok_or(AttrError::TypeMismatch {
			actual: self.kind(),
			requested: T::KIND,
		})
	}

	fn typed_mut<T: Element>(&mut self) -> Result<&mut Storage<'a, T>> {
		let actual = self.kind();
		T::storage_mut(self).ok_or(AttrError::TypeMismatch { actual, requested: T::KIND })
	}

	fn typed_or_adopt<T: Element>(&mut self) -> Result<&mut Storage<'a, T>> {
		if matches!(self, Self::Unknown) {
			*self = T::wrap(Storage::Owned(Vec::new()));
		}
		self.typed_mut()
	}

	fn element_mut<T: Element>(&mut self, index: usize, op: &'static str) -> Result<&mut T> {
		let values = self.typed_mut::<T>()?.slice_mut(op)?;
		let len = values.len();
		values.get_mut(index).ok_or(AttrError::IndexOutOfRange { index, len })
	}

	/// Append an element. An unset value adopts the element kind.
	pub fn push_back<T: Element>(&mut self, value: T) -> Result<()> {
		let values = self.typed_or_adopt::<T>()?.owned_mut("push_back")?;
		push_exact(values, value);
		Ok(())
	}

	/// Overwrite the element at `index` in place.
	pub fn set<T: Element>(&mut self, value: T, index: usize) -> Result<()> {
		*self.element_mut::<T>(index, "set")? = value;
		Ok(())
	}

	/// Element at `index`.
	pub fn get<T: Element>(&self, index: usize) -> Result<&T> {
		let values = self.typed::<T>()?.as_slice();
		values.get(index).ok_or(AttrError::IndexOutOfRange { index, len: values.len() })
	}

	/// Mutable element at `index`.
	pub fn get_mut<T: Element>(&mut self, index: usize) -> Result<&mut T> {
		self.element_mut(index, "get_mut")
	}

	/// First element.
	pub fn front<T: Element>(&self) -> Result<&T> {
		self.get(0)
	}

	/// Last element.
	pub fn back<T: Element>(&self) -> Result<&T> {
		let len = self.typed::<T>()?.len();
		self.get(len.saturating_sub(1))
	}

	/// All elements as a typed slice.
	pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
		Ok(self.typed::<T>()?.as_slice())
	}

	/// Scalar assignment: overwrite element 0, or push when empty.
	pub fn assign<T: Element>(&mut self, value: T) -> Result<()> {
		let storage = self.typed_or_adopt::<T>()?;
		if storage.is_empty() {
			push_exact(storage.owned_mut("assign")?, value);
			return Ok(());
		}
		storage.slice_mut("assign")?[0] = value;
		Ok(())
	}

	/// Index of the first element equal to `value`.
	pub fn find<T: Element>(&self, value: &T) -> Option<usize> {
		let values = self.typed::<T>().ok()?.as_slice();
		values.iter().position(|item| item.same(value))
	}

	/// Remove the first element equal to `value`. Returns whether one was removed.
	pub fn remove<T: Element>(&mut self, value: &T) -> Result<bool> {
		let values = self.typed_mut::<T>()?.owned_mut("remove")?;
		let Some(index) = values.iter().position(|item| item.same(value)) else {
			return Ok(false);
		};
		values.remove(index);
		Ok(true)
	}

	/// Drop the last element. No-op when empty.
	pub fn pop_back(&mut self) -> Result<()> {
		each_storage!(
			self,
			storage => {
				storage.owned_mut("pop_back")?.pop();
				Ok(())
			},
			table _ids => Err(AttrError::TableStorage { op: "pop_back" }),
			unknown => Ok(())
		)
	}

	/// Remove the element at `index`, shifting later elements down.
	pub fn remove_at(&mut self, index: usize) -> Result<()> {
		each_storage!(
			self,
			storage => {
				let values = storage.owned_mut("remove_at")?;
				if index >= values.len() {
					return Err(AttrError::IndexOutOfRange { index, len: values.len() });
				}
				values.remove(index);
				Ok(())
			},
			table _ids => Err(AttrError::TableStorage { op: "remove_at" }),
			unknown => Err(AttrError::IndexOutOfRange { index, len: 0 })
		)
	}

	/// Grow with default elements or truncate to `len`.
	pub fn resize(&mut self, len: usize) -> Result<()> {
		each_storage!(
			self,
			storage => {
				storage.owned_mut("resize")?.resize(len, Element::zero());
				Ok(())
			},
			table _ids => Err(AttrError::TableStorage { op: "resize" }),
			unknown => if len == 0 { Ok(()) } else { Err(AttrError::UntypedStorage { op: "resize" }) }
		)
	}

	/// Ensure room for at least `capacity` elements.
	pub fn reserve(&mut self, capacity: usize) -> Result<()> {
		each_storage!(
			self,
			storage => {
				let len = storage.len();
				match storage {
					Storage::Owned(values) => {
						if capacity > values.capacity() {
							values.reserve_exact(capacity - len);
						}
						Ok(())
					}
					_ if capacity <= len => Ok(()),
					_ => Err(AttrError::AliasedStorageViolation { op: "reserve" }),
				}
			},
			table _ids => Err(AttrError::TableStorage { op: "reserve" }),
			unknown => Err(AttrError::UntypedStorage { op: "reserve" })
		)
	}

	/// Release unused capacity.
	pub fn shrink_to_fit(&mut self) -> Result<()> {
		each_storage!(
			self,
			storage => {
				storage.owned_mut("shrink_to_fit")?.shrink_to_fit();
				Ok(())
			},
			table _ids => Err(AttrError::TableStorage { op: "shrink_to_fit" }),
			unknown => Ok(())
		)
	}

	/// Remove every element, keeping the kind.
	pub fn clear(&mut self) -> Result<()> {
		each_storage!(
			self,
			storage => {
				storage.owned_mut("clear")?.clear();
				Ok(())
			},
			table _ids => Err(AttrError::TableStorage { op: "clear" }),
			unknown => Ok(())
		)
	}

	/// Child handles of a table value.
	pub fn nodes(&self) -> Result<&[NodeId]> {
		match self {
			Self::Table(ids) => Ok(ids.as_slice()),
			other => Err(AttrError::TypeMismatch {
				actual: other.kind(),
				requested: ValueKind::Table,
			}),
		}
	}

	pub(crate) fn nodes_mut(&mut self) -> Result<&mut Vec<NodeId>> {
		let actual = self.kind();
		match self {
			Self::Table(ids) => Ok(ids),
			_ => Err(AttrError::TypeMismatch {
				actual,
				requested: ValueKind::Table,
			}),
		}
	}

	/// Deep copy into an owned value. Table handles are copied as-is.
	pub fn to_owned_value(&self) -> VariantValue<'static> {
		match self {
			Self::Unknown => VariantValue::Unknown,
			Self::Integer(storage) => VariantValue::Integer(storage.to_owned_storage()),
			Self::Float(storage) => VariantValue::Float(storage.to_owned_storage()),
			Self::String(storage) => VariantValue::String(storage.to_owned_storage()),
			Self::Vector(storage) => VariantValue::Vector(storage.to_owned_storage()),
			Self::Matrix(storage) => VariantValue::Matrix(storage.to_owned_storage()),
			Self::Pointer(storage) => VariantValue::Pointer(storage.to_owned_storage()),
			Self::Table(ids) => VariantValue::Table(ids.clone()),
		}
	}

	/// Render the element at `index` as text.
	pub fn to_string_at(&self, index: usize) -> Result<String> {
		match self {
			Self::Integer(_) => self.get::<i32>(index).map(|value| value.to_string()),
			Self::Float(_) => self.get::<f32>(index).map(|value| codec::format_float(*value)),
			Self::String(_) => self.get::<String>(index).cloned(),
			Self::Vector(_) => self.get::<Vec4>(index).map(codec::format_vec4),
			Self::Matrix(_) => self.get::<Mat4>(index).map(codec::format_mat4),
			Self::Pointer(_) => self.get::<Pointer>(index).map(codec::format_pointer),
			other => Err(AttrError::TextUnsupported { kind: other.kind() }),
		}
	}

	/// Parse `input` and overwrite the element at `index`.
	pub fn set_from_str(&mut self, input: &str, index: usize) -> Result<()> {
		match self.kind() {
			ValueKind::Integer => self.set(codec::parse_integer(input)?, index),
			ValueKind::Float => self.set(codec::parse_float(input)?, index),
			ValueKind::String => self.set(input.to_owned(), index),
			ValueKind::Vector => self.set(codec::parse_vec4(input)?, index),
			ValueKind::Matrix => self.set(codec::parse_mat4(input)?, index),
			kind => Err(AttrError::TextUnsupported { kind }),
		}
	}

	/// Parse `input` and append it.
	pub fn push_back_from_str(&mut self, input: &str) -> Result<()> {
		match self.kind() {
			ValueKind::Integer => self.push_back(codec::parse_integer(input)?),
			ValueKind::Float => self.push_back(codec::parse_float(input)?),
			ValueKind::String => self.push_back(input.to_owned()),
			ValueKind::Vector => self.push_back(codec::parse_vec4(input)?),
			ValueKind::Matrix => self.push_back(codec::parse_mat4(input)?),
			kind => Err(AttrError::TextUnsupported { kind }),
		}
	}
}

impl Clone for VariantValue<'_> {
	fn clone(&self) -> Self {
		self.to_owned_value()
	}
}

impl<T: Element> From<Vec<T>> for VariantValue<'_> {
	fn from(values: Vec<T>) -> Self {
		Self::from_values(values)
	}
}

/// Element-wise equality across storage modes. Floats compare bitwise and
/// pointers delegate to [`Object::equals`].
///
/// A value cannot see the tree, so two `Table` values are equal only when they
/// list the same child handles. Use [`AttributeTree::subtree_eq`] or
/// [`AttributeTree::nodes_equal`] to compare the children's contents.
///
/// [`AttributeTree::subtree_eq`]: crate::attr::AttributeTree::subtree_eq
/// [`AttributeTree::nodes_equal`]: crate::attr::AttributeTree::nodes_equal
impl<'b> PartialEq<VariantValue<'b>> for VariantValue<'_> {
	fn eq(&self, other: &VariantValue<'b>) -> bool {
		match (self, other) {
			(Self::Unknown, VariantValue::Unknown) => true,
			(Self::Integer(left), VariantValue::Integer(right)) => slices_same(left.as_slice(), right.as_slice()),
			(Self::Float(left), VariantValue::Float(right)) => slices_same(left.as_slice(), right.as_slice()),
			(Self::String(left), VariantValue::String(right)) => slices_same(left.as_slice(), right.as_slice()),
			(Self::Vector(left), VariantValue::Vector(right)) => slices_same(left.as_slice(), right.as_slice()),
			(Self::Matrix(left), VariantValue::Matrix(right)) => slices_same(left.as_slice(), right.as_slice()),
			(Self::Pointer(left), VariantValue::Pointer(right)) => slices_same(left.as_slice(), right.as_slice()),
			(Self::Table(left), VariantValue::Table(right)) => left == right,
			_ => false,
		}
	}
}

fn slices_same<T: Element>(left: &[T], right: &[T]) -> bool {
	left.len() == right.len() && left.iter().zip(right).all(|(a, b)| a.same(b))
}

fn bits_eq(left: &[f32], right: &[f32]) -> bool {
	left.iter().zip(right).all(|(a, b)| a.to_bits() == b.to_bits())
}

// Growth is one slot at a time.
fn push_exact<T>(values: &mut Vec<T>, value: T) {
	if values.len() == values.capacity() {
		values.reserve_exact(1);
	}
	values.push(value);
}

#[cfg(test)]
mod tests;
