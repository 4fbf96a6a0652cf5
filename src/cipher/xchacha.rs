//! XChaCha20-Poly1305 file cipher.
//!
//! Wraps the `chacha20poly1305` crate so that one call produces one
//! self-contained blob:
//!
//! - **Key Size**: 256 bits (32 bytes), from [`crate::cipher::Derive`]
//! - **Nonce Size**: 192 bits (24 bytes), randomly generated per call
//! - **Tag Size**: 128 bits (16 bytes), appended by the AEAD
//! - **Blob Format**: `[Nonce (24 bytes)] || [Ciphertext] || [Auth Tag (16 bytes)]`
//!
//! No nonce counter is kept; the extended nonce is drawn at random per call.

use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{AeadCore, XChaCha20Poly1305, XNonce};

use crate::config::{NONCE_SIZE, TAG_SIZE};
use crate::error::{Result, TransferError};
use crate::secret::SecretKey;

/// Authenticated encryption bound to one derived key.
pub struct XChaCha {
    inner: XChaCha20Poly1305,
}

impl XChaCha {
    #[inline]
    pub fn new(key: &SecretKey) -> Self {
        Self { inner: XChaCha20Poly1305::new(key.expose_secret().into()) }
    }

    /// Encrypts `plaintext` and prepends the random nonce.
    ///
    /// Empty plaintext is valid and yields a nonce plus a bare tag.
    ///
    /// # Errors
    ///
    /// Fails only if the AEAD refuses the input length, which cannot happen
    /// for payloads within the package size limit.
    #[inline]
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

        let mut blob = self.inner.encrypt(&nonce, plaintext).map_err(|e| TransferError::malformed(format!("xchacha20poly1305 encryption failed: {e}")))?;
        blob.splice(0..0, nonce.iter().copied());

        Ok(blob)
    }

    /// Splits off the nonce and decrypts, verifying the tag first.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::AuthenticationFailure`] if the blob is too
    /// short to hold a nonce and tag, or if the tag does not verify.
    #[inline]
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        if blob.len() < NONCE_SIZE + TAG_SIZE {
            return Err(TransferError::AuthenticationFailure);
        }

        let (nonce, data) = blob.split_at(NONCE_SIZE);
        self.inner.decrypt(XNonce::from_slice(nonce), data).map_err(|_| TransferError::AuthenticationFailure)
    }
}
