use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ui::theme::ThemeName;

pub const DEFAULT_MEDIA_URL: &str = "https://pwop6300.blob.core.windows.net/mtfb/01-Garde1.mp3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub media_url: String,
    #[serde(default)]
    pub theme: ThemeName,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Where downloaded media is kept. Defaults to the platform cache dir.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media_url: DEFAULT_MEDIA_URL.to_string(),
            theme: ThemeName::default(),
            log_level: default_log_level(),
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let url = self.media_url.trim();
        if url.is_empty() {
            anyhow::bail!("media_url is empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("media_url must be an http(s) address: {}", url);
        }
        Ok(())
    }

    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("dnr-player")
        })
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not find config directory")?
        .join("dnr-player");

    Ok(config_dir.join("config.yml"))
}

/// Read the config at `path`, writing the defaults there first if the file
/// does not exist yet.
pub fn load_or_create_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let default_config = Config::default();
        let yaml =
            serde_yaml::to_string(&default_config).context("Failed to serialize default config")?;

        fs::write(path, yaml).context("Failed to write default config file")?;
        tracing::info!(path = %path.display(), "Created default config file");

        return Ok(default_config);
    }

    let config_content = fs::read_to_string(path).context("Failed to read config file")?;

    let config: Config =
        serde_yaml::from_str(&config_content).context("Failed to parse config file")?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "dnr-player-config-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = scratch_dir("create");
        let path = dir.join("nested").join("config.yml");

        let config = load_or_create_config(&path).unwrap();

        assert_eq!(config, Config::default());
        assert!(path.exists());
        let reloaded = load_or_create_config(&path).unwrap();
        assert_eq!(reloaded.media_url, DEFAULT_MEDIA_URL);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let dir = scratch_dir("partial");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yml");
        fs::write(&path, "media_url: https://example.com/show.mp3\n").unwrap();

        let config = load_or_create_config(&path).unwrap();

        assert_eq!(config.media_url, "https://example.com/show.mp3");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.theme, ThemeName::default());
        assert!(config.cache_dir.is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_non_http_url_is_rejected() {
        let dir = scratch_dir("invalid");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yml");
        fs::write(&path, "media_url: ftp://example.com/show.mp3\n").unwrap();

        let err = load_or_create_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("http(s)"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_explicit_cache_dir_wins() {
        let config = Config {
            cache_dir: Some(PathBuf::from("/tmp/dnr-cache")),
            ..Config::default()
        };
        assert_eq!(config.resolved_cache_dir(), PathBuf::from("/tmp/dnr-cache"));
    }
}
