//! Sending side of a transfer.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::{ClientConfig, MAX_PACKAGE_SIZE, MAX_RESPONSE_SIZE};
use crate::error::TransferError;
use crate::file::File;
use crate::package::Package;
use crate::transport::frame::{read_to_close, write_frame};
use crate::transport::response::Response;
use crate::types::TransferOutcome;

pub struct Client {
    config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Seals the file at `path` and delivers it to the configured server.
    ///
    /// One attempt, one connection. The server's verdict comes back as the
    /// matching [`TransferError`] variant.
    ///
    /// # Errors
    ///
    /// - [`TransferError::Filesystem`] if the file cannot be read
    /// - [`TransferError::MalformedPackage`] if the package cannot be built
    /// - [`TransferError::Network`] on connect, I/O or timeout failure
    /// - whatever the server rejected the transfer with
    pub async fn send_file(&self, path: impl AsRef<Path>) -> TransferOutcome {
        let file = File::new(path.as_ref());
        let filename = file.file_name()?;
        let plaintext = file.read_all().await?;

        let package = Package::seal(self.config.password(), filename.as_str(), &plaintext).map_err(sealing_failed)?;
        let request = package.to_bytes().map_err(sealing_failed)?;

        if request.len() > MAX_PACKAGE_SIZE {
            return Err(TransferError::malformed(format!("package of {} bytes exceeds limit of {MAX_PACKAGE_SIZE}", request.len())));
        }

        debug!(%filename, plaintext_len = plaintext.len(), package_len = request.len(), "package sealed");

        let response = self.exchange(&request).await?;
        let receipt = Response::parse(&response)?.into_result()?;
        info!(bytes = receipt.bytes_written, stored_as = %receipt.stored_as, "transfer accepted");

        Ok(receipt)
    }

    async fn exchange(&self, request: &[u8]) -> Result<String, TransferError> {
        let (host, port) = (self.config.host(), self.config.port());
        let limit = self.config.timeout();

        let mut stream = within(limit, "connect", TcpStream::connect((host, port)))
            .await?
            .map_err(|e| TransferError::network(format!("failed to connect to {host}:{port}: {e}")))?;
        debug!(%host, port, "connected");

        within(limit, "send", write_frame(&mut stream, request)).await??;
        stream.shutdown().await.map_err(|e| TransferError::network(format!("failed to half-close: {e}")))?;

        let raw = within(limit, "response", read_to_close(&mut stream, MAX_RESPONSE_SIZE)).await??;

        String::from_utf8(raw).map_err(|_| TransferError::network("server response is not UTF-8"))
    }
}

fn sealing_failed(err: TransferError) -> TransferError {
    TransferError::malformed(format!("failed to build package: {}", err.detail()))
}

async fn within<F: Future>(limit: Duration, step: &str, future: F) -> Result<F::Output, TransferError> {
    timeout(limit, future).await.map_err(|_| TransferError::network(format!("{step} timed out after {limit:?}")))
}
