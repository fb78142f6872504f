use serde::Serialize;
use sha2::{Digest, Sha256};
use worldoption_common::PropertyMap;

/// Fixed name of the IR document inside the output directory.
pub const IR_FILE_NAME: &str = "WorldOption.sav.json";
/// Name of the committed save file.
pub const SAVE_FILE_NAME: &str = "WorldOption.sav";
/// Name the codec writes to before the save file is committed.
pub const STAGING_FILE_NAME: &str = "WorldOption.sav.partial";

/// The document the external codec consumes.
///
/// ```text
/// { "properties": [ { "name": ..., "type": ..., "value": ... }, ... ] }
/// ```
/// Field names and type tags are a stability contract with the codec.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IrDocument<'a> {
    pub properties: &'a PropertyMap,
}

impl<'a> IrDocument<'a> {
    pub fn new(properties: &'a PropertyMap) -> Self {
        Self { properties }
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
