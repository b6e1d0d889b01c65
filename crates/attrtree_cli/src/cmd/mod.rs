/// Load and print a document.
pub mod load;
/// Upward key search from a node path.
pub mod search;
/// Registered host types and classes.
pub mod types;

mod util;
