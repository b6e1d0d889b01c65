//! Text forms for value elements.
//!
//! Vectors render as `vec4(x, y, z, w)` and matrices as
//! `mat4x4((c0), (c1), (c2), (c3))`, one parenthesized group per column.

use glam::{Mat4, Vec4};

use crate::attr::{AttrError, Pointer, Result, ValueKind};

pub(crate) fn format_float(value: f32) -> String {
	value.to_string()
}

pub(crate) fn format_vec4(value: &Vec4) -> String {
	format!("vec4({})", components(value))
}

pub(crate) fn format_mat4(value: &Mat4) -> String {
	let columns = [value.x_axis, value.y_axis, value.z_axis, value.w_axis]
		.iter()
		.map(|column| format!("({})", components(column)))
		.collect::<Vec<_>>();
	format!("mat4x4({})", columns.join(", "))
}

pub(crate) fn format_pointer(value: &Pointer) -> String {
	match value {
		Pointer::Null => "null".to_owned(),
		Pointer::Node(node) => node.to_string(),
		Pointer::Object(object) => object.describe(),
	}
}

fn components(value: &Vec4) -> String {
	format!("{}, {}, {}, {}", value.x, value.y, value.z, value.w)
}

pub(crate) fn parse_integer(input: &str) -> Result<i32> {
	input.trim().parse().map_err(|_| parse_error(ValueKind::Integer, input))
}

pub(crate) fn parse_float(input: &str) -> Result<f32> {
	input.trim().parse().map_err(|_| parse_error(ValueKind::Float, input))
}

pub(crate) fn parse_vec4(input: &str) -> Result<Vec4> {
	call_body(input, "vec4")
		.and_then(parse_components)
		.map(Vec4::from_array)
		.ok_or_else(|| parse_error(ValueKind::Vector, input))
}

pub(crate) fn parse_mat4(input: &str) -> Result<Mat4> {
	call_body(input, "mat4x4")
		.and_then(parse_columns)
		.ok_or_else(|| parse_error(ValueKind::Matrix, input))
}

fn parse_error(kind: ValueKind, input: &str) -> AttrError {
	AttrError::ParseValue {
		kind,
		input: input.to_owned(),
	}
}

/// Text between `name(` and the closing `)`.
fn call_body<'s>(input: &'s str, name: &str) -> Option<&'s str> {
	input
		.trim()
		.strip_prefix(name)?
		.trim_start()
		.strip_prefix('(')?
		.strip_suffix(')')
}

fn parse_components(body: &str) -> Option<[f32; 4]> {
	let mut out = [0.0; 4];
	let mut parts = body.split(',');
	for slot in &mut out {
		*slot = parts.next()?.trim().parse().ok()?;
	}
	parts.next().is_none().then_some(out)
}

fn parse_columns(body: &str) -> Option<Mat4> {
	let mut columns = [Vec4::ZERO; 4];
	let mut rest = body.trim();
	for (index, column) in columns.iter_mut().enumerate() {
		if index > 0 {
			rest = rest.strip_prefix(',')?.trim_start();
		}
		let inner = rest.strip_prefix('(')?;
		let close = inner.find(')')?;
		*column = Vec4::from_array(parse_components(&inner[..close])?);
		rest = inner[close + 1..].trim_start();
	}
	rest.is_empty().then(|| Mat4::from_cols(columns[0], columns[1], columns[2], columns[3]))
}

#[cfg(test)]
mod tests {
	use glam::{Mat4, Vec4};

	use super::{format_mat4, format_vec4, parse_float, parse_integer, parse_mat4, parse_vec4};
	use crate::attr::{AttrError, ValueKind};

	#[test]
	fn vector_text_round_trips() {
		let value = Vec4::new(1.5, -2.0, 0.25, 8.0);
		let text = format_vec4(&value);
		assert_eq!(text, "vec4(1.5, -2, 0.25, 8)");
		assert_eq!(parse_vec4(&text).expect("parse vector"), value);
		assert_eq!(parse_vec4(" vec4(1,2,3,4) ").expect("compact vector"), Vec4::new(1.0, 2.0, 3.0, 4.0));
	}

	#[test]
	fn matrix_text_is_column_major() {
		let value = Mat4::from_cols_array(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
		let text = format_mat4(&value);
		assert_eq!(text, "mat4x4((1, 2, 3, 4), (5, 6, 7, 8), (9, 10, 11, 12), (13, 14, 15, 16))");
		assert_eq!(parse_mat4(&text).expect("parse matrix"), value);
	}

	#[test]
	fn malformed_text_reports_kind_and_input() {
		let err = parse_vec4("vec4(1, 2, 3)").expect_err("three components");
		assert!(matches!(err, AttrError::ParseValue { kind: ValueKind::Vector, ref input } if input == "vec4(1, 2, 3)"));

		assert!(parse_mat4("mat4x4((1, 2, 3, 4))").is_err());
		assert!(parse_mat4("mat4x4((1,2,3,4),(5,6,7,8),(9,10,11,12),(13,14,15,16),)").is_err());
		assert!(parse_integer("12abc").is_err());
		assert!(parse_float("").is_err());
	}

	#[test]
	fn scalars_ignore_surrounding_whitespace() {
		assert_eq!(parse_integer(" -42 ").expect("integer"), -42);
		assert_eq!(parse_float("3.25\n").expect("float"), 3.25);
	}
}
