//! Plaintext integrity digest.
//!
//! The package carries a SHA-256 of the plaintext as lowercase hex. It is an
//! audit trail on top of the AEAD tag: the receiver recomputes it after
//! decryption and refuses to write the file on mismatch.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::{HASH_HEX_LEN, HASH_SIZE};
use crate::error::{Result, TransferError};

/// A SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hash {
    hash: [u8; HASH_SIZE],
}

impl Hash {
    /// Hashes `data` in one pass.
    pub fn new(data: &[u8]) -> Self {
        Self { hash: Sha256::digest(data).into() }
    }

    /// Parses the 64-character hex form used on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::MalformedPackage`] unless `text` is exactly
    /// 64 hex digits.
    pub fn from_hex(text: &str) -> Result<Self> {
        if text.len() != HASH_HEX_LEN {
            return Err(TransferError::malformed(format!("hash must be {HASH_HEX_LEN} hex characters, got {}", text.len())));
        }

        let mut hash = [0u8; HASH_SIZE];
        hex::decode_to_slice(text, &mut hash).map_err(|e| TransferError::malformed(format!("hash is not hex: {e}")))?;

        Ok(Self { hash })
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Checks that `data` hashes to this digest, in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::IntegrityMismatch`] if the digests differ.
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        let computed = Self::new(data);
        if bool::from(self.hash.ct_eq(&computed.hash)) { Ok(()) } else { Err(TransferError::IntegrityMismatch) }
    }
}
