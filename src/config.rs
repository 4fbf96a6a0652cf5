//! Configuration for sealpost.
//!
//! Compile-time protocol constants live at the top of this module. The
//! runtime settings a peer needs (where to listen or connect, the shared
//! password, limits) are carried by [`ServerConfig`] and [`ClientConfig`],
//! which are built once at startup and never mutated afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};

use crate::secret::Secret;

/// Application name used in user-facing output.
pub const APP_NAME: &str = "sealpost";

// === Key Derivation ===

/// PBKDF2-HMAC-SHA256 iteration count.
///
/// Fixed so that both peers derive the same key from the same password and
/// salt without negotiating parameters.
pub const KDF_ITERATIONS: u32 = 10_000;

/// Length of the per-transfer salt in bytes.
pub const SALT_LEN: usize = 16;

/// Length of the derived symmetric key in bytes.
pub const KEY_SIZE: usize = 32;

// === Authenticated Encryption ===

/// XChaCha20 extended nonce size in bytes.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size in bytes.
pub const TAG_SIZE: usize = 16;

// === Integrity ===

/// SHA-256 digest size in bytes.
pub const HASH_SIZE: usize = 32;

/// Length of the hex-encoded digest carried on the wire.
pub const HASH_HEX_LEN: usize = HASH_SIZE * 2;

// === Wire & Transport ===

/// Size of the big-endian length header that precedes every request.
pub const FRAME_HEADER_LEN: usize = 4;

/// Largest request frame the server accepts.
///
/// Also caps the size of a file the client is willing to send; the JSON
/// envelope inflates the file by roughly a third (base64), so the source file
/// limit is derived from this.
pub const MAX_PACKAGE_SIZE: usize = 64 * 1024 * 1024;

/// Largest source file the client will read, leaving room for base64 and the
/// JSON field names within [`MAX_PACKAGE_SIZE`].
pub const MAX_FILE_SIZE: u64 = (MAX_PACKAGE_SIZE as u64 / 4) * 3 - 4096;

/// Upper bound on the status string the client reads back.
pub const MAX_RESPONSE_SIZE: u64 = 1024;

/// Prefix applied to every file the server persists.
pub const RECEIVED_PREFIX: &str = "received_";

/// Longest filename (in bytes) the server will write.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Listen backlog passed to `listen(2)`.
pub const LISTEN_BACKLOG: u32 = 128;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8888;

/// Default cap on handlers running at the same time.
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

/// Default bound on how long a handler waits for the request to arrive.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on connect and response reads on the client.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum length enforced on interactively entered passwords.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Environment variable consulted for the shared password.
pub const PASSWORD_ENV: &str = "SEALPOST_PASSWORD";

/// Settings for a listening server.
#[derive(Debug)]
pub struct ServerConfig {
    host: String,
    port: u16,
    password: Secret,
    output_dir: PathBuf,
    max_connections: usize,
    read_timeout: Duration,
}

impl ServerConfig {
    /// Creates a server configuration with default limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is empty.
    pub fn new(host: impl Into<String>, port: u16, password: Secret, output_dir: impl Into<PathBuf>) -> Result<Self> {
        ensure!(!password.expose_secret().is_empty(), "password cannot be empty");

        Ok(Self {
            host: host.into(),
            port,
            password,
            output_dir: output_dir.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    /// Caps the number of connections handled concurrently.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub fn password(&self) -> &Secret {
        &self.password
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub const fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub const fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}

/// Settings for a sending client.
#[derive(Debug)]
pub struct ClientConfig {
    host: String,
    port: u16,
    password: Secret,
    timeout: Duration,
}

impl ClientConfig {
    /// Creates a client configuration with the default I/O timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is empty.
    pub fn new(host: impl Into<String>, port: u16, password: Secret) -> Result<Self> {
        ensure!(!password.expose_secret().is_empty(), "password cannot be empty");

        Ok(Self { host: host.into(), port, password, timeout: DEFAULT_CLIENT_TIMEOUT })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    pub fn password(&self) -> &Secret {
        &self.password
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_rejects_empty_password() {
        assert!(ServerConfig::new(DEFAULT_HOST, DEFAULT_PORT, Secret::new(""), ".").is_err());
    }

    #[test]
    fn test_client_config_rejects_empty_password() {
        assert!(ClientConfig::new(DEFAULT_HOST, DEFAULT_PORT, Secret::new("")).is_err());
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::new("0.0.0.0", 9000, Secret::new("correct-horse"), "/tmp/out").unwrap();
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.port(), 9000);
        assert_eq!(config.output_dir(), Path::new("/tmp/out"));
        assert_eq!(config.max_connections(), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.read_timeout(), DEFAULT_READ_TIMEOUT);
    }

    #[test]
    fn test_max_connections_never_zero() {
        let config = ServerConfig::new(DEFAULT_HOST, 0, Secret::new("pw"), ".").unwrap().with_max_connections(0);
        assert_eq!(config.max_connections(), 1);
    }

    #[test]
    fn test_file_limit_fits_in_package() {
        assert!(MAX_FILE_SIZE.div_ceil(3) * 4 < MAX_PACKAGE_SIZE as u64);
    }
}
