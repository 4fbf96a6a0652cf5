//! Common type definitions for sealpost.
//!
//! - [`Receipt`]: what a successful transfer produced
//! - [`TransferOutcome`]: success or a tagged [`TransferError`]
//! - [`Stage`]: the steps a server handler walks through for one connection

use strum::{Display, IntoStaticStr};

use crate::error::TransferError;

/// Result of a successful transfer, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Plaintext bytes written to disk.
    pub bytes_written: u64,

    /// File name the server stored the data under, relative to its output
    /// directory.
    pub stored_as: String,
}

/// What one transfer attempt ended in.
pub type TransferOutcome = Result<Receipt, TransferError>;

/// Handler state for one accepted connection.
///
/// `Accepted → Reading → Parsing → Deriving → Decrypting → Verifying →
/// Writing → Responding → Closed`. Any failure skips straight to
/// `Responding` with an error status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Accepted,
    Reading,
    Parsing,
    Deriving,
    Decrypting,
    Verifying,
    Writing,
    Responding,
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::Decrypting.to_string(), "decrypting");
        let label: &'static str = Stage::Responding.into();
        assert_eq!(label, "responding");
    }
}
