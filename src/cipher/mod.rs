//! # Cryptographic Operations Module
//!
//! Password-based authenticated encryption for single-file transfers.
//!
//! ## Architecture
//!
//! - **Key Layer**: [`Derive`] turns the shared password and a per-transfer
//!   [`Salt`] into a 32-byte key with PBKDF2-HMAC-SHA256
//! - **Cipher Layer**: [`XChaCha`] seals and opens self-describing
//!   XChaCha20-Poly1305 blobs
//! - **Integrity Layer**: [`Hash`] records and checks SHA-256 of the plaintext
//! - **Facade**: [`Cipher`] combines derivation and encryption into stateless
//!   per-operation calls, so no key outlives the salt it was derived for

mod derive;
mod hash;
mod xchacha;

pub use derive::{Derive, Salt};
pub use hash::Hash;
pub use xchacha::XChaCha;

use crate::error::Result;
use crate::secret::Secret;

/// Stateless password-based encryption.
///
/// Every call derives its own key from the password and the salt it is given
/// and drops it before returning.
pub struct Cipher;

impl Cipher {
    /// Encrypts `plaintext` under the key derived from `password` and `salt`.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`XChaCha::encrypt`].
    pub fn encrypt_with(password: &Secret, salt: &Salt, plaintext: &[u8]) -> Result<Vec<u8>> {
        let key = Derive::new(password).derive_key(salt);
        XChaCha::new(&key).encrypt(plaintext)
    }

    /// Decrypts a blob produced by [`Cipher::encrypt_with`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TransferError::AuthenticationFailure`] if the
    /// password or salt is wrong, or the blob was altered.
    pub fn decrypt_with(password: &Secret, salt: &Salt, blob: &[u8]) -> Result<Vec<u8>> {
        let key = Derive::new(password).derive_key(salt);
        XChaCha::new(&key).decrypt(blob)
    }
}
