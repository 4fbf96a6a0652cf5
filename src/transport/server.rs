//! Receiving side of a transfer.
//!
//! [`Server`] owns the listening socket and an accept loop that hands each
//! connection to its own task. A semaphore caps how many of those tasks run
//! at once: a permit is taken before `accept()`, so once the cap is reached
//! further peers wait in the kernel backlog instead of in memory.
//!
//! Every connection walks the same stages (see [`Stage`]) and always ends
//! with exactly one status line, whatever went wrong before it.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream, lookup_host};
use tokio::sync::Semaphore;
use tracing::{Instrument, Span, debug, info, info_span, warn};

use crate::cipher::{Derive, XChaCha};
use crate::config::{LISTEN_BACKLOG, MAX_PACKAGE_SIZE, ServerConfig};
use crate::error::TransferError;
use crate::file::OutputDir;
use crate::package::Package;
use crate::secret::Secret;
use crate::transport::frame::read_frame;
use crate::transport::response::Response;
use crate::types::{Receipt, Stage, TransferOutcome};

/// Pause after a failed `accept()` so a persistent error (e.g. out of file
/// descriptors) does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    permits: Arc<Semaphore>,
}

impl Server {
    /// Binds the listening socket described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host does not resolve or the address cannot be
    /// bound.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let addr = lookup_host((config.host(), config.port()))
            .await
            .with_context(|| format!("failed to resolve {}:{}", config.host(), config.port()))?
            .next()
            .with_context(|| format!("no address found for {}", config.host()))?;

        let listener = listen(addr).with_context(|| format!("failed to bind {addr}"))?;
        let permits = Arc::new(Semaphore::new(config.max_connections()));

        Ok(Self { listener, config: Arc::new(config), permits })
    }

    /// The address actually bound; differs from the configured one when port
    /// 0 was requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("failed to get local address")
    }

    /// Serves until the process is stopped.
    ///
    /// # Errors
    ///
    /// See [`Server::run_until`].
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` completes.
    ///
    /// Handlers already running are left to finish on their own.
    ///
    /// # Errors
    ///
    /// Returns an error only if the listener cannot report its address or the
    /// connection limiter is closed.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);

        info!(
            addr = %self.local_addr()?,
            output_dir = %self.config.output_dir().display(),
            max_connections = self.config.max_connections(),
            "listening"
        );

        loop {
            let permit = tokio::select! {
                () = &mut shutdown => break,
                permit = Arc::clone(&self.permits).acquire_owned() => permit.context("connection limiter closed")?,
            };

            let (stream, peer) = tokio::select! {
                () = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
            };

            let handler = Handler::new(Arc::clone(&self.config));
            tokio::spawn(
                async move {
                    handler.handle(stream).await;
                    drop(permit);
                }
                .instrument(info_span!("connection", %peer)),
            );
        }

        info!("shutting down");
        Ok(())
    }
}

fn listen(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = if addr.is_ipv4() { TcpSocket::new_v4()? } else { TcpSocket::new_v6()? };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

/// Work done for one accepted connection.
struct Handler {
    config: Arc<ServerConfig>,
}

impl Handler {
    fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }

    async fn handle(&self, mut stream: TcpStream) {
        stage(Stage::Accepted);

        let outcome = self.serve(&mut stream).await;
        match &outcome {
            Ok(receipt) => info!(bytes = receipt.bytes_written, stored_as = %receipt.stored_as, "file received"),
            Err(e) if e.is_security_relevant() => warn!(kind = %e.kind(), "transfer rejected"),
            Err(e) => warn!(kind = %e.kind(), error = %e, "transfer failed"),
        }

        stage(Stage::Responding);
        let limit = self.config.read_timeout();
        match tokio::time::timeout(limit, respond(&mut stream, &Response::from(outcome))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "could not deliver response"),
            Err(_) => debug!(?limit, "peer did not take the response in time"),
        }

        stage(Stage::Closed);
    }

    async fn serve(&self, stream: &mut TcpStream) -> TransferOutcome {
        stage(Stage::Reading);
        let request = tokio::time::timeout(self.config.read_timeout(), read_frame(stream, MAX_PACKAGE_SIZE))
            .await
            .map_err(|_| TransferError::network(format!("no complete request within {:?}", self.config.read_timeout())))??;

        receive(request, Arc::clone(&self.config)).await
    }
}

/// Turns one request body into a file in the configured output directory.
///
/// Parsing, key derivation, decryption and the hash check run on the
/// blocking pool. Nothing is written unless the ciphertext authenticates
/// under the server password and the plaintext matches the carried hash.
///
/// # Errors
///
/// Returns the [`TransferError`] of the first stage that fails.
pub async fn receive(request: Vec<u8>, config: Arc<ServerConfig>) -> TransferOutcome {
    let output = OutputDir::new(config.output_dir());
    let span = Span::current();

    let (package, plaintext) = tokio::task::spawn_blocking(move || span.in_scope(|| open(&request, config.password())))
        .await
        .map_err(|e| TransferError::malformed(format!("package could not be processed: {e}")))??;

    stage(Stage::Writing);
    let (stored_as, path) = output.target(package.filename())?;
    let bytes_written = plaintext.len() as u64;
    output.write(&path, plaintext).await?;

    Ok(Receipt { bytes_written, stored_as })
}

fn open(request: &[u8], password: &Secret) -> Result<(Package, Vec<u8>), TransferError> {
    stage(Stage::Parsing);
    let package = Package::from_bytes(request)?;
    debug!(filename_len = package.filename().len(), ciphertext_len = package.ciphertext().len(), "package parsed");

    stage(Stage::Deriving);
    let key = Derive::new(password).derive_key(package.salt());

    stage(Stage::Decrypting);
    let plaintext = XChaCha::new(&key).decrypt(package.ciphertext())?;

    stage(Stage::Verifying);
    package.hash().verify(&plaintext)?;

    Ok((package, plaintext))
}

async fn respond(stream: &mut TcpStream, response: &Response) -> std::io::Result<()> {
    stream.write_all(response.to_string().as_bytes()).await?;
    stream.shutdown().await
}

fn stage(stage: Stage) {
    debug!(%stage, "stage");
}
