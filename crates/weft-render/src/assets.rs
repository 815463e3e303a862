//! Asset-root and remote-probe seams.
//!
//! These traits isolate the dimension resolver from the filesystem and
//! the network so tests can substitute deterministic implementations.
//! [`DirAssetRoot`] and [`HttpProbe`] are the production implementations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncRead;

use weft_core::{Error, Result};

use crate::dimensions::{sniff_dimensions, Dimensions};

/// Maximum header bytes a remote probe transfers.
pub const PROBE_RANGE_BYTES: usize = 64 * 1024;

/// A static-asset root: existence checks and byte-stream opening rooted
/// at a known directory.
#[async_trait]
pub trait AssetRoot: Send + Sync {
    /// Whether `path` (relative to the root) exists.
    async fn exists(&self, path: &str) -> bool;

    /// Open a byte stream for `path`. The caller owns the stream and is
    /// responsible for dropping it promptly.
    async fn open(&self, path: &str) -> Result<Box<dyn AsyncRead + Send + Unpin>>;
}

/// A header-only probe for remote image dimensions.
#[async_trait]
pub trait RemoteProbe: Send + Sync {
    /// Probe `url` for declared width/height without a full-body
    /// transfer. `Ok(None)` means the resource was reachable but its
    /// dimensions could not be determined.
    async fn probe(&self, url: &str) -> Result<Option<Dimensions>>;
}

/// Filesystem-backed asset root.
#[derive(Debug, Clone)]
pub struct DirAssetRoot {
    root: PathBuf,
}

impl DirAssetRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a site-relative reference against the root, refusing
    /// traversal outside it.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = path.trim_start_matches('/');
        if Path::new(relative)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl AssetRoot for DirAssetRoot {
    async fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Some(full) => fs::try_exists(&full).await.unwrap_or(false),
            None => false,
        }
    }

    async fn open(&self, path: &str) -> Result<Box<dyn AsyncRead + Send + Unpin>> {
        let full = self
            .resolve(path)
            .ok_or_else(|| Error::not_found(format!("path escapes asset root: {}", path)))?;
        let file = fs::File::open(&full).await?;
        Ok(Box::new(file))
    }
}

/// Remote probe issuing a ranged GET for the first header bytes only.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured client (e.g. with a caller-side timeout, which
    /// is the recommended way to bound probe latency).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteProbe for HttpProbe {
    async fn probe(&self, url: &str) -> Result<Option<Dimensions>> {
        let mut response = self
            .client
            .get(url)
            .header("range", format!("bytes=0-{}", PROBE_RANGE_BYTES - 1))
            .send()
            .await
            .map_err(|e| Error::probe_with_source("probe request failed", e))?;

        if !response.status().is_success() {
            return Err(Error::probe(format!(
                "probe returned status {} for {}",
                response.status(),
                url
            )));
        }

        // Servers ignoring the range header stream the full body; stop
        // pulling chunks once the sniff window is filled and let the
        // rest die with the connection.
        let mut header: Vec<u8> = Vec::new();
        while header.len() < PROBE_RANGE_BYTES {
            match response.chunk().await {
                Ok(Some(chunk)) => header.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    return Err(Error::probe_with_source("probe body read failed", e));
                }
            }
        }
        header.truncate(PROBE_RANGE_BYTES);

        Ok(sniff_dimensions(&header))
    }
}

// ============================================================================
// Mock implementations for testing
// ============================================================================

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// In-memory asset root serving fixed byte blobs.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryAssetRoot {
        files: HashMap<String, Vec<u8>>,
    }

    impl MemoryAssetRoot {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(mut self, path: &str, bytes: Vec<u8>) -> Self {
            self.files.insert(path.to_string(), bytes);
            self
        }
    }

    #[async_trait]
    impl AssetRoot for MemoryAssetRoot {
        async fn exists(&self, path: &str) -> bool {
            self.files.contains_key(path.trim_start_matches('/'))
        }

        async fn open(&self, path: &str) -> Result<Box<dyn AsyncRead + Send + Unpin>> {
            let bytes = self
                .files
                .get(path.trim_start_matches('/'))
                .ok_or_else(|| Error::not_found(path.to_string()))?;
            Ok(Box::new(Cursor::new(bytes.clone())))
        }
    }

    /// Probe returning a fixed answer and counting invocations.
    #[derive(Debug, Default)]
    pub struct FixedProbe {
        pub answer: Option<Dimensions>,
        pub fail: bool,
        pub calls: Arc<AtomicUsize>,
    }

    impl FixedProbe {
        pub fn answering(dimensions: Dimensions) -> Self {
            Self {
                answer: Some(dimensions),
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl RemoteProbe for FixedProbe {
        async fn probe(&self, url: &str) -> Result<Option<Dimensions>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::probe(format!("mock probe failure for {}", url)));
            }
            Ok(self.answer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Minimal valid PNG header for the given size.
    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }

    #[tokio::test]
    async fn test_dir_asset_root_exists() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("logo.png"), b"bytes").await.unwrap();

        let root = DirAssetRoot::new(temp.path());
        assert!(root.exists("/logo.png").await);
        assert!(root.exists("logo.png").await);
        assert!(!root.exists("/missing.png").await);
    }

    #[tokio::test]
    async fn test_dir_asset_root_open_reads_bytes() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("data.bin"), b"header").await.unwrap();

        let root = DirAssetRoot::new(temp.path());
        let mut stream = root.open("/data.bin").await.unwrap();
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await.unwrap();
        assert_eq!(buffer, b"header");
    }

    #[tokio::test]
    async fn test_dir_asset_root_refuses_traversal() {
        let temp = TempDir::new().unwrap();
        let root = DirAssetRoot::new(temp.path());

        assert!(!root.exists("../outside.txt").await);
        assert!(root.open("/../outside.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_http_probe_stops_at_header_window() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // A server that ignores the range header: declares a body far
        // larger than the window, writes only the first window, then
        // stalls with the socket open. A probe that waits for the full
        // declared body hangs here; one that stops at the window returns.
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;

            let mut window = png_header(800, 600);
            window.resize(PROBE_RANGE_BYTES, 0);
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n",
                PROBE_RANGE_BYTES * 16
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&window).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let probe = HttpProbe::new();
        let url = format!("http://{}/hero.png", addr);
        let result = tokio::time::timeout(Duration::from_secs(5), probe.probe(&url))
            .await
            .expect("probe must return once the header window is filled");

        assert_eq!(result.unwrap(), Some(Dimensions::new(800, 600)));
        server.abort();
    }

    #[tokio::test]
    async fn test_memory_asset_root() {
        let root = mock::MemoryAssetRoot::new().with_file("img/a.png", vec![1, 2, 3]);
        assert!(root.exists("/img/a.png").await);
        assert!(!root.exists("/img/b.png").await);

        let mut stream = root.open("img/a.png").await.unwrap();
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await.unwrap();
        assert_eq!(buffer, vec![1, 2, 3]);
    }
}
