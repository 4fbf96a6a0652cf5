//! TCP transport between a sending client and a receiving server.
//!
//! # Modules
//!
//! - [`frame`]: length-prefixed request framing and bounded response reads
//! - [`response`]: the status line returned for every connection
//! - [`server`]: accept loop and per-connection handler
//! - [`client`]: one-shot sender

pub mod client;
pub mod frame;
pub mod response;
pub mod server;

pub use client::Client;
pub use response::Response;
pub use server::Server;

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};

    use tempfile::{TempDir, tempdir};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::config::{ClientConfig, DEFAULT_HOST, DEFAULT_MAX_CONNECTIONS, MAX_PACKAGE_SIZE, MAX_RESPONSE_SIZE, ServerConfig};
    use crate::error::{FailureKind, TransferError};
    use crate::package::Package;
    use crate::package::wire::WirePackage;
    use crate::secret::Secret;
    use crate::transport::frame::{read_to_close, write_frame};

    const PASSWORD: &str = "correct-horse";

    struct Harness {
        addr: SocketAddr,
        output: TempDir,
        server: JoinHandle<anyhow::Result<()>>,
    }

    impl Harness {
        async fn start(password: &str) -> Self {
            Self::start_with(password, Duration::from_secs(5)).await
        }

        async fn start_with(password: &str, read_timeout: Duration) -> Self {
            Self::start_limited(password, read_timeout, DEFAULT_MAX_CONNECTIONS).await
        }

        async fn start_limited(password: &str, read_timeout: Duration, max_connections: usize) -> Self {
            let output = tempdir().unwrap();
            let config = ServerConfig::new(DEFAULT_HOST, 0, Secret::new(password), output.path())
                .unwrap()
                .with_read_timeout(read_timeout)
                .with_max_connections(max_connections);
            let server = Server::bind(config).await.unwrap();
            let addr = server.local_addr().unwrap();
            let server = tokio::spawn(server.run());

            Self { addr, output, server }
        }

        fn client(&self, password: &str) -> Client {
            let config = ClientConfig::new(DEFAULT_HOST, self.addr.port(), Secret::new(password)).unwrap().with_timeout(Duration::from_secs(5));
            Client::new(config)
        }

        fn output_path(&self, name: &str) -> PathBuf {
            self.output.path().join(name)
        }

        async fn raw_exchange(&self, payload: &[u8]) -> String {
            let mut stream = TcpStream::connect(self.addr).await.unwrap();
            write_frame(&mut stream, payload).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8(read_to_close(&mut stream, MAX_RESPONSE_SIZE).await.unwrap()).unwrap()
        }
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            self.server.abort();
        }
    }

    fn source(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn test_end_to_end_transfer() {
        let harness = Harness::start(PASSWORD).await;
        let scratch = tempdir().unwrap();
        let path = source(scratch.path(), "test.txt", b"hello world");

        let receipt = harness.client(PASSWORD).send_file(&path).await.unwrap();

        assert_eq!(receipt.bytes_written, 11);
        assert_eq!(receipt.stored_as, "received_test.txt");
        assert_eq!(std::fs::read(harness.output_path("received_test.txt")).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_empty_file_transfer() {
        let harness = Harness::start(PASSWORD).await;
        let scratch = tempdir().unwrap();
        let path = source(scratch.path(), "empty.bin", b"");

        let receipt = harness.client(PASSWORD).send_file(&path).await.unwrap();

        assert_eq!(receipt.bytes_written, 0);
        assert!(std::fs::read(harness.output_path("received_empty.bin")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let harness = Harness::start("server-secret").await;
        let scratch = tempdir().unwrap();
        let path = source(scratch.path(), "test.txt", b"hello world");

        let result = harness.client(PASSWORD).send_file(&path).await;

        assert!(matches!(result, Err(TransferError::AuthenticationFailure)));
        assert!(!harness.output_path("received_test.txt").exists());
    }

    #[tokio::test]
    async fn test_malformed_then_valid() {
        let harness = Harness::start(PASSWORD).await;

        let bad = format!(r#"{{"encrypted_data": "AAAA", "salt": "not base64!", "hash": "{}", "filename": "x"}}"#, "0".repeat(64));
        let reply = harness.raw_exchange(bad.as_bytes()).await;
        let response = Response::parse(&reply).unwrap();
        assert!(matches!(response, Response::Rejected { kind: FailureKind::MalformedPackage, .. }), "{reply}");

        let scratch = tempdir().unwrap();
        let path = source(scratch.path(), "after.txt", b"still serving");
        harness.client(PASSWORD).send_file(&path).await.unwrap();
        assert_eq!(std::fs::read(harness.output_path("received_after.txt")).unwrap(), b"still serving");
    }

    #[tokio::test]
    async fn test_traversal_name_confined() {
        let harness = Harness::start(PASSWORD).await;
        let package = Package::seal(&Secret::new(PASSWORD), "../../etc/passwd", b"root:x:0:0").unwrap();

        let reply = harness.raw_exchange(&package.to_bytes().unwrap()).await;

        assert_eq!(reply, "OK 10: file received and decrypted successfully as received_passwd");
        assert_eq!(std::fs::read(harness.output_path("received_passwd")).unwrap(), b"root:x:0:0");
    }

    #[tokio::test]
    async fn test_unusable_name_rejected() {
        let harness = Harness::start(PASSWORD).await;
        let package = Package::seal(&Secret::new(PASSWORD), "..", b"data").unwrap();

        let reply = harness.raw_exchange(&package.to_bytes().unwrap()).await;

        assert!(reply.starts_with("ERROR filesystem: "), "{reply}");
        assert_eq!(std::fs::read_dir(harness.output.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_tampered_hash_rejected() {
        let harness = Harness::start(PASSWORD).await;
        let package = Package::seal(&Secret::new(PASSWORD), "a.txt", b"original").unwrap();
        let mut wire: serde_json::Value = serde_json::from_slice(&package.to_bytes().unwrap()).unwrap();
        wire["hash"] = serde_json::Value::String("f".repeat(64));

        let reply = harness.raw_exchange(&serde_json::to_vec(&wire).unwrap()).await;

        assert!(reply.starts_with("ERROR integrity-mismatch: "), "{reply}");
        assert!(!harness.output_path("received_a.txt").exists());
    }

    #[tokio::test]
    async fn test_oversize_frame_rejected() {
        let harness = Harness::start(PASSWORD).await;
        let mut stream = TcpStream::connect(harness.addr).await.unwrap();

        let announced = u32::try_from(MAX_PACKAGE_SIZE + 1).unwrap();
        stream.write_all(&announced.to_be_bytes()).await.unwrap();

        let reply = String::from_utf8(read_to_close(&mut stream, MAX_RESPONSE_SIZE).await.unwrap()).unwrap();
        assert!(reply.starts_with("ERROR malformed-package: "), "{reply}");
    }

    #[tokio::test]
    async fn test_silent_peer_times_out_without_blocking_others() {
        let harness = Harness::start_with(PASSWORD, Duration::from_millis(300)).await;

        let mut silent = TcpStream::connect(harness.addr).await.unwrap();

        let scratch = tempdir().unwrap();
        let path = source(scratch.path(), "busy.txt", b"served meanwhile");
        harness.client(PASSWORD).send_file(&path).await.unwrap();

        let reply = String::from_utf8(read_to_close(&mut silent, MAX_RESPONSE_SIZE).await.unwrap()).unwrap();
        assert!(reply.starts_with("ERROR network: "), "{reply}");
    }

    #[tokio::test]
    async fn test_missing_field_rejected() {
        let harness = Harness::start(PASSWORD).await;
        let salt = WirePackage::encode_bytes(&[7u8; 16]);

        let reply = harness.raw_exchange(format!(r#"{{"salt": "{salt}", "hash": "{}", "filename": "x"}}"#, "0".repeat(64)).as_bytes()).await;

        assert!(reply.starts_with("ERROR malformed-package: "), "{reply}");
    }

    #[tokio::test]
    async fn test_connection_cap_queues_until_permit_frees() {
        let read_timeout = Duration::from_millis(400);
        let harness = Harness::start_limited(PASSWORD, read_timeout, 1).await;

        let mut silent = TcpStream::connect(harness.addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let scratch = tempdir().unwrap();
        let path = source(scratch.path(), "queued.txt", b"waited my turn");
        let started = Instant::now();
        harness.client(PASSWORD).send_file(&path).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(250), "served after {:?}", started.elapsed());
        assert_eq!(std::fs::read(harness.output_path("received_queued.txt")).unwrap(), b"waited my turn");

        let reply = String::from_utf8(read_to_close(&mut silent, MAX_RESPONSE_SIZE).await.unwrap()).unwrap();
        assert!(reply.starts_with("ERROR network: "), "{reply}");
    }

    #[tokio::test]
    async fn test_non_reading_peer_with_huge_name_releases_permit() {
        let harness = Harness::start_limited(PASSWORD, Duration::from_secs(2), 1).await;

        let name = format!("{}/", "a/".repeat(2 * 1024 * 1024));
        let package = Package::seal(&Secret::new(PASSWORD), name, b"data").unwrap();
        let mut hostile = TcpStream::connect(harness.addr).await.unwrap();
        write_frame(&mut hostile, &package.to_bytes().unwrap()).await.unwrap();

        let scratch = tempdir().unwrap();
        let path = source(scratch.path(), "ok.txt", b"still reachable");
        harness.client(PASSWORD).send_file(&path).await.unwrap();
        assert_eq!(std::fs::read(harness.output_path("received_ok.txt")).unwrap(), b"still reachable");

        let reply = String::from_utf8(read_to_close(&mut hostile, MAX_RESPONSE_SIZE).await.unwrap()).unwrap();
        assert!(reply.starts_with("ERROR filesystem: "), "{reply}");
        assert!(reply.len() < 128, "{} byte reply", reply.len());
    }
}
