//! Dynamic attribute trees with schema-bound host fields.

/// Variant values, attribute trees, schema registry, and attributed host binding.
pub mod attr;
