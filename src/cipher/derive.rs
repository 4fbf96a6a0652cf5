//! # Key Derivation with PBKDF2
//!
//! Both peers turn the shared password into the same 32-byte key by running
//! PBKDF2-HMAC-SHA256 over the password and the salt that travels with each
//! package. The iteration count is fixed, so the salt is the only per-transfer
//! input.
//!
//! ## Salt Handling
//!
//! A [`Salt`] is always exactly [`SALT_LEN`] bytes. Fresh salts come from the
//! operating system CSPRNG; salts read off the wire go through
//! [`Salt::try_from`], which rejects any other length.

use chacha20poly1305::aead::OsRng;
use chacha20poly1305::aead::rand_core::RngCore;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::config::{KDF_ITERATIONS, SALT_LEN};
use crate::error::TransferError;
use crate::secret::{Secret, SecretKey};

/// Per-transfer random salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draws a new salt from the OS random number generator.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut bytes);

        Self(bytes)
    }

    pub const fn from_array(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Salt {
    type Error = TransferError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; SALT_LEN] = bytes.try_into().map_err(|_| TransferError::malformed(format!("salt must be {SALT_LEN} bytes, got {}", bytes.len())))?;
        Ok(Self(array))
    }
}

/// # Key Derivation Function
///
/// Holds a borrowed password for the duration of one encrypt or decrypt
/// operation. The derived key is returned in a zeroizing wrapper and must not
/// be kept around for a different salt.
pub struct Derive<'a> {
    password: &'a [u8],
}

impl<'a> Derive<'a> {
    pub fn new(password: &'a Secret) -> Self {
        Self { password: password.as_bytes() }
    }

    pub const fn from_bytes(password: &'a [u8]) -> Self {
        Self { password }
    }

    /// Derives the symmetric key for `salt`.
    ///
    /// Deterministic: the same password and salt always produce the same key.
    pub fn derive_key(&self, salt: &Salt) -> SecretKey {
        SecretKey::init_with_mut(|key| pbkdf2_hmac::<Sha256>(self.password, salt.as_bytes(), KDF_ITERATIONS, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KEY_SIZE;

    #[test]
    fn test_derive_deterministic() {
        let salt = Salt::from_array([7u8; SALT_LEN]);
        let a = Derive::from_bytes(b"correct-horse").derive_key(&salt);
        let b = Derive::from_bytes(b"correct-horse").derive_key(&salt);
        assert_eq!(a.expose_secret(), b.expose_secret());
        assert_eq!(a.expose_secret().len(), KEY_SIZE);
    }

    #[test]
    fn test_derive_depends_on_salt() {
        let derive = Derive::from_bytes(b"correct-horse");
        let a = derive.derive_key(&Salt::from_array([1u8; SALT_LEN]));
        let b = derive.derive_key(&Salt::from_array([2u8; SALT_LEN]));
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn test_derive_depends_on_password() {
        let salt = Salt::from_array([3u8; SALT_LEN]);
        let a = Derive::from_bytes(b"correct-horse").derive_key(&salt);
        let b = Derive::from_bytes(b"battery-staple").derive_key(&salt);
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn test_known_vector() {
        // Published PBKDF2-HMAC-SHA256 vector: P="password", S="salt", c=1, dkLen=32.
        let mut key = [0u8; 32];
        pbkdf2_hmac::<Sha256>(b"password", b"salt", 1, &mut key);
        assert_eq!(hex::encode(key), "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b");
    }

    #[test]
    fn test_generate_salt_fresh() {
        assert_ne!(Salt::generate(), Salt::generate());
    }

    #[test]
    fn test_salt_rejects_wrong_length() {
        assert!(Salt::try_from(&[0u8; SALT_LEN - 1][..]).is_err());
        assert!(Salt::try_from(&[0u8; SALT_LEN + 1][..]).is_err());
        assert!(Salt::try_from(&[0u8; 0][..]).is_err());
        assert!(Salt::try_from(&[9u8; SALT_LEN][..]).is_ok());
    }
}
