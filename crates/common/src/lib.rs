//! Shared types for the world-option pipeline.
//!
//! # Invariants
//! - A property's type tag is derived from its value, never stored separately.
//! - Property maps preserve insertion order and are immutable once built.

pub mod fields;
pub mod property;

pub use fields::{split_fields, strip_parens, unquote};
pub use property::{DuplicateProperty, Property, PropertyMap, PropertyType, PropertyValue};
