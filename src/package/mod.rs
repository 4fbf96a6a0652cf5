//! Transfer package: the envelope a client builds and a server opens.
//!
//! A [`Package`] holds everything the receiver needs besides the password:
//! the sealed blob, the salt the key was derived with, the SHA-256 of the
//! plaintext, and the name of the source file. It exists only in memory and
//! on the wire; the server never stores it.

use crate::cipher::{Cipher, Hash, Salt};
use crate::error::Result;
use crate::package::wire::WirePackage;
use crate::secret::Secret;

pub mod wire;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    ciphertext: Vec<u8>,
    salt: Salt,
    hash: Hash,
    filename: String,
}

impl Package {
    pub fn new(ciphertext: Vec<u8>, salt: Salt, hash: Hash, filename: impl Into<String>) -> Self {
        Self { ciphertext, salt, hash, filename: filename.into() }
    }

    /// Encrypts `plaintext` under a fresh salt and records its hash.
    ///
    /// # Errors
    ///
    /// Propagates encryption failures.
    pub fn seal(password: &Secret, filename: impl Into<String>, plaintext: &[u8]) -> Result<Self> {
        let hash = Hash::new(plaintext);
        let salt = Salt::generate();
        let ciphertext = Cipher::encrypt_with(password, &salt, plaintext)?;

        Ok(Self::new(ciphertext, salt, hash, filename))
    }

    /// Decrypts the blob and checks the plaintext against the carried hash.
    ///
    /// # Errors
    ///
    /// [`crate::error::TransferError::AuthenticationFailure`] if the blob does
    /// not open under `password`, and
    /// [`crate::error::TransferError::IntegrityMismatch`] if it opens but the
    /// digest differs.
    pub fn open(&self, password: &Secret) -> Result<Vec<u8>> {
        let plaintext = Cipher::decrypt_with(password, &self.salt, &self.ciphertext)?;
        self.hash.verify(&plaintext)?;

        Ok(plaintext)
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub const fn salt(&self) -> &Salt {
        &self.salt
    }

    pub const fn hash(&self) -> &Hash {
        &self.hash
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Serializes to the JSON wire form.
    ///
    /// # Errors
    ///
    /// Fails only if JSON serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        WirePackage {
            encrypted_data: WirePackage::encode_bytes(&self.ciphertext),
            salt: WirePackage::encode_bytes(self.salt.as_bytes()),
            hash: self.hash.to_hex(),
            filename: self.filename.clone(),
        }
        .encode()
    }

    /// Parses and validates the JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TransferError::MalformedPackage`] if a field is
    /// missing, a base64 field does not decode, the salt is not 16 bytes, or
    /// the hash is not 64 hex characters.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let wire = WirePackage::decode(bytes)?;

        let ciphertext = WirePackage::decode_bytes("encrypted_data", &wire.encrypted_data)?;
        let salt = Salt::try_from(WirePackage::decode_bytes("salt", &wire.salt)?.as_slice())?;
        let hash = Hash::from_hex(&wire.hash)?;

        Ok(Self { ciphertext, salt, hash, filename: wire.filename })
    }
}
