//! Request framing.
//!
//! A request is one frame: `[Length: u32 BE][Payload: Length bytes]`. The
//! server never has to guess where the envelope ends, and a peer that
//! announces more than the server accepts is turned away before anything is
//! buffered. Responses are short and unframed: the reader consumes until the
//! peer closes, up to a fixed bound.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::FRAME_HEADER_LEN;
use crate::error::{Result, TransferError};

/// Writes `payload` behind its length header and flushes.
///
/// # Errors
///
/// [`TransferError::MalformedPackage`] if the payload does not fit a `u32`
/// length, [`TransferError::Network`] on write failure.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| TransferError::malformed(format!("payload of {} bytes does not fit a frame", payload.len())))?;

    writer.write_all(&len.to_be_bytes()).await.map_err(|e| TransferError::network(format!("failed to write frame header: {e}")))?;
    writer.write_all(payload).await.map_err(|e| TransferError::network(format!("failed to write frame payload: {e}")))?;
    writer.flush().await.map_err(|e| TransferError::network(format!("failed to flush frame: {e}")))
}

/// Reads one frame of at most `max_len` payload bytes.
///
/// The payload buffer grows as bytes arrive rather than being sized from the
/// untrusted header.
///
/// # Errors
///
/// [`TransferError::MalformedPackage`] if the stream ends inside the frame or
/// the announced length exceeds `max_len`; [`TransferError::Network`] on any
/// other read failure.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R, max_len: usize) -> Result<Vec<u8>> {
    let mut header = [0u8; FRAME_HEADER_LEN];
    reader.read_exact(&mut header).await.map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => TransferError::malformed("connection closed before a complete frame header"),
        _ => TransferError::network(format!("failed to read frame header: {e}")),
    })?;

    let len = u32::from_be_bytes(header) as usize;
    if len > max_len {
        return Err(TransferError::malformed(format!("frame of {len} bytes exceeds limit of {max_len}")));
    }

    let mut payload = Vec::with_capacity(len.min(64 * 1024));
    (&mut *reader).take(len as u64).read_to_end(&mut payload).await.map_err(|e| TransferError::network(format!("failed to read frame payload: {e}")))?;

    if payload.len() != len {
        return Err(TransferError::malformed(format!("frame truncated: expected {len} bytes, got {}", payload.len())));
    }

    Ok(payload)
}

/// Reads until the peer closes, keeping at most `limit` bytes.
///
/// # Errors
///
/// [`TransferError::Network`] on read failure.
pub async fn read_to_close<R: AsyncRead + Unpin>(reader: &mut R, limit: u64) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    (&mut *reader).take(limit).read_to_end(&mut buffer).await.map_err(|e| TransferError::network(format!("failed to read response: {e}")))?;

    Ok(buffer)
}
