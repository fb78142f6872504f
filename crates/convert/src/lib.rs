//! Conversion pipeline: settings file -> typed properties -> save file.
//!
//! # Invariants
//! - Run options are passed explicitly in [`RunConfig`]; there is no global state.
//! - Mapping errors stop the run before the codec is touched.

pub mod pipeline;

pub use pipeline::{ConversionSummary, ConvertError, RunConfig, convert};
