//! Transfer error taxonomy.
//!
//! Every failure a single transfer can hit, on either peer, is one of the
//! five [`TransferError`] variants. Callers match on the variant (or on
//! [`FailureKind`]) to tell security rejections apart from operational
//! faults; the server sends the kind back to the client by its wire name.

use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Result alias for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;

#[derive(Debug, Error)]
pub enum TransferError {
    /// Connect, accept, read, write or timeout failure on the socket.
    #[error("network error: {0}")]
    Network(String),

    /// The envelope could not be framed, parsed or decoded.
    #[error("malformed package: {0}")]
    MalformedPackage(String),

    /// The AEAD tag did not verify: wrong password, wrong salt, or tampered data.
    #[error("authentication failed: ciphertext could not be verified")]
    AuthenticationFailure,

    /// The decrypted plaintext does not hash to the carried digest.
    #[error("integrity mismatch: plaintext hash does not match package hash")]
    IntegrityMismatch,

    /// Reading the source or persisting the output failed.
    #[error("filesystem error: {0}")]
    Filesystem(String),
}

/// Discriminant of [`TransferError`], as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum FailureKind {
    Network,
    MalformedPackage,
    AuthenticationFailure,
    IntegrityMismatch,
    Filesystem,
}

impl TransferError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }

    pub fn malformed(err: impl std::fmt::Display) -> Self {
        Self::MalformedPackage(err.to_string())
    }

    pub fn filesystem(err: impl std::fmt::Display) -> Self {
        Self::Filesystem(err.to_string())
    }

    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) => FailureKind::Network,
            Self::MalformedPackage(_) => FailureKind::MalformedPackage,
            Self::AuthenticationFailure => FailureKind::AuthenticationFailure,
            Self::IntegrityMismatch => FailureKind::IntegrityMismatch,
            Self::Filesystem(_) => FailureKind::Filesystem,
        }
    }

    /// True for rejections that point at a wrong key or tampering rather
    /// than an operational fault.
    pub const fn is_security_relevant(&self) -> bool {
        matches!(self, Self::AuthenticationFailure | Self::IntegrityMismatch)
    }

    /// Rebuilds an error from a kind and message received from the peer.
    pub fn from_kind(kind: FailureKind, message: &str) -> Self {
        match kind {
            FailureKind::Network => Self::Network(message.to_owned()),
            FailureKind::MalformedPackage => Self::MalformedPackage(message.to_owned()),
            FailureKind::AuthenticationFailure => Self::AuthenticationFailure,
            FailureKind::IntegrityMismatch => Self::IntegrityMismatch,
            FailureKind::Filesystem => Self::Filesystem(message.to_owned()),
        }
    }

    /// The message without the kind prefix that `Display` adds.
    pub fn detail(&self) -> String {
        match self {
            Self::Network(msg) | Self::MalformedPackage(msg) | Self::Filesystem(msg) => msg.clone(),
            Self::AuthenticationFailure => "ciphertext could not be verified".to_owned(),
            Self::IntegrityMismatch => "plaintext hash does not match package hash".to_owned(),
        }
    }
}
