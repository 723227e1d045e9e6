use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use tracing::{debug, info};

use crate::error::EngineError;

/// Downloads remote media into a local cache so the player thread can read it
/// as a seekable file.
pub struct MediaFetcher {
    client: Client,
    cache_dir: PathBuf,
    // Numbers partial files so overlapping downloads never share one
    downloads: AtomicU64,
}

impl MediaFetcher {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            cache_dir: cache_dir.into(),
            downloads: AtomicU64::new(0),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub async fn fetch(&self, url: &str) -> Result<PathBuf, EngineError> {
        let path = self.cache_dir.join(cache_file_name(url));
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(path = %path.display(), "Using cached media");
            return Ok(path);
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;

        info!(url, "Downloading media");
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        // Write beside the target first so an interrupted download never looks cached.
        let partial = self.partial_path(&path);
        tokio::fs::write(&partial, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                debug!(path = %path.display(), "Another download cached the media first");
                return Ok(path);
            }
            return Err(e.into());
        }

        info!(path = %path.display(), bytes = bytes.len(), "Media cached");
        Ok(path)
    }

    fn partial_path(&self, path: &Path) -> PathBuf {
        let n = self.downloads.fetch_add(1, Ordering::Relaxed);
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.{n}.part", std::process::id()));
        path.with_file_name(name)
    }
}

/// Flattens a URL into a file name, keeping the extension as a decoder hint.
pub fn cache_file_name(url: &str) -> String {
    let trimmed = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .trim_end_matches('/');
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);

    let name: String = without_scheme
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() {
        "media.audio".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::player::test_server::{MediaServer, temp_cache_dir};

    fn leftover_partials(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".part"))
            .collect()
    }

    #[tokio::test]
    async fn test_second_fetch_uses_cache() {
        let server = MediaServer::start(b"ID3 not really audio".to_vec(), Duration::ZERO).await;
        let dir = temp_cache_dir("reuse");
        let fetcher = MediaFetcher::new(&dir);

        let first = fetcher.fetch(&server.url("show/1874.mp3")).await.unwrap();
        let second = fetcher.fetch(&server.url("show/1874.mp3")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(server.hits(), 1);
        assert_eq!(std::fs::read(&first).unwrap(), b"ID3 not really audio");
        assert!(leftover_partials(&dir).is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_overlapping_fetches_of_same_url_both_succeed() {
        let body = vec![7u8; 4 * 1024 * 1024];
        let server = MediaServer::start(body.clone(), Duration::from_millis(100)).await;
        let dir = temp_cache_dir("overlap");
        let fetcher = MediaFetcher::new(&dir);
        let url = server.url("show/1875.mp3");

        for _ in 0..5 {
            let _ = std::fs::remove_dir_all(&dir);
            let (a, b) = tokio::join!(fetcher.fetch(&url), fetcher.fetch(&url));
            let a = a.unwrap();
            assert_eq!(a, b.unwrap());
            assert_eq!(std::fs::read(&a).unwrap().len(), body.len());
            assert!(leftover_partials(&dir).is_empty());
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_http_error_caches_nothing() {
        let server = MediaServer::start_with_status(404, Duration::ZERO).await;
        let dir = temp_cache_dir("missing");
        let fetcher = MediaFetcher::new(&dir);
        let url = server.url("gone.mp3");

        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(matches!(err, EngineError::Download(_)));
        assert!(!dir.join(cache_file_name(&url)).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_cache_file_name_keeps_extension() {
        let name = cache_file_name("https://pwop6300.blob.core.windows.net/mtfb/01-Garde1.mp3");
        assert_eq!(name, "pwop6300.blob.core.windows.net_mtfb_01-Garde1.mp3");
        assert_eq!(Path::new(&name).extension().and_then(|e| e.to_str()), Some("mp3"));
    }

    #[test]
    fn test_cache_file_name_drops_query_and_fragment() {
        assert_eq!(
            cache_file_name("http://host/a/b.ogg?token=1#t=5"),
            "host_a_b.ogg"
        );
    }

    #[test]
    fn test_cache_file_name_never_empty() {
        assert_eq!(cache_file_name(""), "media.audio");
    }
}
