use secrecy::{ExposeSecret, SecretBox, SecretString};

use crate::config::KEY_SIZE;

/// The shared transfer password.
pub struct Secret {
    inner: SecretString,
}

impl Secret {
    pub fn new(password: &str) -> Self {
        Self { inner: SecretString::from(password.to_owned()) }
    }

    pub fn from_string(password: String) -> Self {
        Self { inner: SecretString::from(password) }
    }

    pub fn expose_secret(&self) -> &str {
        self.inner.expose_secret()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.expose_secret().as_bytes()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// A derived symmetric key, zeroized on drop.
pub struct SecretKey {
    inner: SecretBox<[u8; KEY_SIZE]>,
}

impl SecretKey {
    /// Fills the key in place on the heap so no stack copy outlives the call.
    pub fn init_with_mut(fill: impl FnOnce(&mut [u8; KEY_SIZE])) -> Self {
        Self { inner: SecretBox::init_with_mut(fill) }
    }

    pub fn from_array(key: [u8; KEY_SIZE]) -> Self {
        Self { inner: SecretBox::new(Box::new(key)) }
    }

    pub fn expose_secret(&self) -> &[u8; KEY_SIZE] {
        self.inner.expose_secret()
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey([... {KEY_SIZE} bytes ...])")
    }
}
