//! Sealpost - password-sealed file drop over TCP.
//!
//! A client reads one file, seals it and sends it to a server that shares the
//! same password. The server opens it, checks it and writes it to disk.
//!
//! - PBKDF2-HMAC-SHA256 for key derivation from the shared password
//! - XChaCha20-Poly1305 for authenticated encryption
//! - SHA-256 for an end-to-end integrity check of the plaintext
//! - JSON envelope in a length-prefixed TCP frame

pub mod cipher;
pub mod config;
pub mod error;
pub mod file;
pub mod package;
pub mod secret;
pub mod transport;
pub mod types;
pub mod ui;
