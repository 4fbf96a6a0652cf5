//! JSON record exchanged on the wire.
//!
//! Binary fields are carried as standard base64 text and the digest as hex, so
//! the whole envelope is a flat object of four strings:
//!
//! ```json
//! {"encrypted_data": "...", "salt": "...", "hash": "<64 hex>", "filename": "report.pdf"}
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransferError};

#[derive(Debug, Serialize, Deserialize)]
pub struct WirePackage {
    pub encrypted_data: String,
    pub salt: String,
    pub hash: String,
    pub filename: String,
}

impl WirePackage {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| TransferError::malformed(format!("failed to serialize package: {e}")))
    }

    /// Parses the JSON object. Missing fields and non-string values are
    /// rejected; unknown extra fields are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| TransferError::malformed(format!("invalid package json: {e}")))
    }

    pub fn encode_bytes(data: &[u8]) -> String {
        BASE64.encode(data)
    }

    pub fn decode_bytes(field: &str, text: &str) -> Result<Vec<u8>> {
        BASE64.decode(text).map_err(|e| TransferError::malformed(format!("field `{field}` is not valid base64: {e}")))
    }
}
