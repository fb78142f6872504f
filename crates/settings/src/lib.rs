//! Settings Loader: reads the server settings file into flat key/value pairs.
//!
//! # Invariants
//! - Keys are case-insensitive and unique after folding.
//! - No type knowledge: values are passed through as text.
//! - A missing file is reported before any parse attempt.

pub mod loader;

pub use loader::{RawSetting, RawSettings, SettingsError, load, parse_str};
