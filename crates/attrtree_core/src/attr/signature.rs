use std::fmt;
use std::rc::Rc;

use crate::attr::{Attributed, Element, ValueKind, VariantValue};

/// Produces value views over one field of an attributed host.
pub trait FieldAccess {
	/// Read-only view, or `None` if `host` has no matching part.
	fn view<'h>(&self, host: &'h dyn Attributed) -> Option<VariantValue<'h>>;

	/// Writable view, or `None` if `host` has no matching part.
	fn view_mut<'h>(&self, host: &'h mut dyn Attributed) -> Option<VariantValue<'h>>;
}

/// Field accessor built from a pair of projection functions on host type `H`.
pub struct BoundField<H, T> {
	get: fn(&H) -> &[T],
	get_mut: fn(&mut H) -> &mut [T],
}

impl<H: Attributed, T: Element> FieldAccess for BoundField<H, T> {
	fn view<'h>(&self, host: &'h dyn Attributed) -> Option<VariantValue<'h>> {
		resolve_host::<H>(host).map(|host| VariantValue::shared((self.get)(host)))
	}

	fn view_mut<'h>(&self, host: &'h mut dyn Attributed) -> Option<VariantValue<'h>> {
		resolve_host_mut::<H>(host).map(|host| VariantValue::alias((self.get_mut)(host)))
	}
}

/// Find the `H` part of `host`, walking base hosts.
pub(crate) fn resolve_host<H: Attributed>(host: &dyn Attributed) -> Option<&H> {
	let mut current = Some(host);
	while let Some(part) = current {
		if let Some(found) = part.as_any().downcast_ref::<H>() {
			return Some(found);
		}
		current = part.base();
	}
	None
}

/// Mutable counterpart of [`resolve_host`].
pub(crate) fn resolve_host_mut<H: Attributed>(host: &mut dyn Attributed) -> Option<&mut H> {
	if host.as_any().is::<H>() {
		return host.as_any_mut().downcast_mut::<H>();
	}
	host.base_mut().and_then(resolve_host_mut::<H>)
}

/// One schema entry: a prescribed attribute of an attributed type.
#[derive(Clone)]
pub struct Signature {
	/// Attribute key.
	pub name: String,
	/// Element kind; [`ValueKind::Table`] for nested-node entries.
	pub kind: ValueKind,
	/// Element count for fields, pre-allocated children for tables.
	pub count: usize,
	/// Host field binding. Tables have none.
	pub accessor: Option<Rc<dyn FieldAccess>>,
}

impl Signature {
	/// Field entry bound through a projection pair on `H`.
	///
	/// Prefer the [`field!`](crate::field) macro for plain struct fields.
	pub fn field<H: Attributed, T: Element>(name: impl Into<String>, count: usize, get: fn(&H) -> &[T], get_mut: fn(&mut H) -> &mut [T]) -> Self {
		Self {
			name: name.into(),
			kind: T::KIND,
			count,
			accessor: Some(Rc::new(BoundField { get, get_mut })),
		}
	}

	/// Table entry that pre-allocates `count` empty children.
	pub fn table(name: impl Into<String>, count: usize) -> Self {
		Self {
			name: name.into(),
			kind: ValueKind::Table,
			count,
			accessor: None,
		}
	}

	/// Whether this entry holds nested nodes.
	pub fn is_table(&self) -> bool {
		self.kind == ValueKind::Table
	}

	pub(crate) fn view<'h>(&self, host: &'h dyn Attributed) -> Option<VariantValue<'h>> {
		self.accessor.as_ref()?.view(host)
	}

	pub(crate) fn view_mut<'h>(&self, host: &'h mut dyn Attributed) -> Option<VariantValue<'h>> {
		self.accessor.as_ref()?.view_mut(host)
	}
}

impl fmt::Debug for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signature")
			.field("name", &self.name)
			.field("kind", &self.kind)
			.field("count", &self.count)
			.field("bound", &self.accessor.is_some())
			.finish()
	}
}

/// Build a [`Signature`](crate::attr::Signature) for a host struct field.
///
/// ```ignore
/// field!(Monster, health)                 // scalar, key "health"
/// field!(Monster, health as "Health")     // scalar, explicit key
/// field!(Monster, scores[3] as "Scores")  // array field with three elements
/// ```
#[macro_export]
macro_rules! field {
	($host:ty, $field:ident[$count:expr] as $name:expr) => {
		$crate::attr::Signature::field::<$host, _>($name, $count, |host: &$host| &host.$field[..], |host: &mut $host| &mut host.$field[..])
	};
	($host:ty, $field:ident as $name:expr) => {
		$crate::attr::Signature::field::<$host, _>(
			$name,
			1,
			|host: &$host| ::std::slice::from_ref(&host.$field),
			|host: &mut $host| ::std::slice::from_mut(&mut host.$field),
		)
	};
	($host:ty, $field:ident[$count:expr]) => {
		$crate::field!($host, $field[$count] as stringify!($field))
	};
	($host:ty, $field:ident) => {
		$crate::field!($host, $field as stringify!($field))
	};
}
