//! Codec Invoker: writes the JSON IR and drives the external save codec.
//!
//! Layout inside the output directory:
//! ```text
//! WorldOption.sav.json     - IR document handed to the codec
//! WorldOption.sav.partial  - codec output while it runs
//! WorldOption.sav          - committed save file
//! ```
//!
//! # Invariants
//! - Preconditions are checked before anything is written.
//! - The save file only appears after the codec exits zero and produced output.

pub mod invoker;
pub mod ir;

pub use invoker::{CodecError, CodecInvoker, EmitOutcome, emit};
pub use ir::{IR_FILE_NAME, IrDocument, SAVE_FILE_NAME, STAGING_FILE_NAME, sha256_hex};
