//! Minimal HTTP server for exercising downloads without the network.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub struct MediaServer {
    addr: std::net::SocketAddr,
    hits: Arc<AtomicUsize>,
    requested: Arc<Notify>,
    task: JoinHandle<()>,
}

impl MediaServer {
    /// Serves `body` for every path, after `delay`.
    pub async fn start(body: Vec<u8>, delay: Duration) -> Self {
        Self::serve(200, body, delay).await
    }

    pub async fn start_with_status(status: u16, delay: Duration) -> Self {
        Self::serve(status, Vec::new(), delay).await
    }

    async fn serve(status: u16, body: Vec<u8>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let requested = Arc::new(Notify::new());
        let body = Arc::new(body);

        let task = tokio::spawn({
            let hits = hits.clone();
            let requested = requested.clone();
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    hits.fetch_add(1, Ordering::SeqCst);
                    requested.notify_one();
                    tokio::spawn(respond(stream, status, body.clone(), delay));
                }
            }
        });

        Self {
            addr,
            hits,
            requested,
            task,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Resolves once a connection has been accepted.
    pub async fn wait_for_request(&self) {
        self.requested.notified().await;
    }
}

impl Drop for MediaServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn respond(mut stream: TcpStream, status: u16, body: Arc<Vec<u8>>, delay: Duration) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    tokio::time::sleep(delay).await;

    let head = format!(
        "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(&body).await;
    let _ = stream.shutdown().await;
}

/// Fresh, empty cache directory unique to this test and process.
pub fn temp_cache_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "dnr-player-cache-{}-{}",
        label,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
