//! The status line a server sends back after each transfer.
//!
//! Exactly one of these is written per connection, as plain UTF-8:
//!
//! - `OK <bytes>: file received and decrypted successfully as <stored name>`
//! - `ERROR <kind>: <message>`

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{FailureKind, TransferError};
use crate::types::Receipt;

const OK_PREFIX: &str = "OK ";
const ERROR_PREFIX: &str = "ERROR ";
const SUCCESS_TEXT: &str = "file received and decrypted successfully as ";

/// Longest error detail put on the wire; the line as a whole must stay well
/// inside the client's response bound.
const MAX_MESSAGE_LEN: usize = 256;

#[derive(Debug, PartialEq, Eq)]
pub enum Response {
    Delivered(Receipt),
    Rejected { kind: FailureKind, message: String },
}

impl Response {
    pub fn rejected(err: &TransferError) -> Self {
        Self::Rejected { kind: err.kind(), message: clip(err.detail()) }
    }

    /// Converts into the outcome the client reports.
    ///
    /// # Errors
    ///
    /// A rejection becomes the [`TransferError`] variant it was built from.
    pub fn into_result(self) -> Result<Receipt, TransferError> {
        match self {
            Self::Delivered(receipt) => Ok(receipt),
            Self::Rejected { kind, message } => Err(TransferError::from_kind(kind, &message)),
        }
    }

    /// Parses a status line received from the server.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Network`] for anything that is not a status
    /// line this protocol produces.
    pub fn parse(text: &str) -> Result<Self, TransferError> {
        let unexpected = || TransferError::network(format!("unexpected server response: {text:?}"));

        if let Some(rest) = text.strip_prefix(OK_PREFIX) {
            let (bytes, tail) = rest.split_once(": ").ok_or_else(unexpected)?;
            let bytes_written = bytes.parse::<u64>().map_err(|_| unexpected())?;
            let stored_as = tail.strip_prefix(SUCCESS_TEXT).ok_or_else(unexpected)?;

            return Ok(Self::Delivered(Receipt { bytes_written, stored_as: stored_as.to_owned() }));
        }

        if let Some(rest) = text.strip_prefix(ERROR_PREFIX) {
            let (kind, message) = rest.split_once(": ").unwrap_or((rest, ""));
            let kind = FailureKind::from_str(kind).map_err(|_| unexpected())?;

            return Ok(Self::Rejected { kind, message: message.to_owned() });
        }

        Err(unexpected())
    }
}

fn clip(mut message: String) -> String {
    if message.len() > MAX_MESSAGE_LEN {
        let mut end = MAX_MESSAGE_LEN;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
        message.push_str("...");
    }

    message
}

impl From<Result<Receipt, TransferError>> for Response {
    fn from(outcome: Result<Receipt, TransferError>) -> Self {
        match outcome {
            Ok(receipt) => Self::Delivered(receipt),
            Err(err) => Self::rejected(&err),
        }
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delivered(receipt) => write!(f, "{OK_PREFIX}{}: {SUCCESS_TEXT}{}", receipt.bytes_written, receipt.stored_as),
            Self::Rejected { kind, message } => write!(f, "{ERROR_PREFIX}{kind}: {message}"),
        }
    }
}
