//! Optional extensions to the base room plugin.

#[cfg(feature = "extension_edit_bounds")]
pub mod edit_bounds;
