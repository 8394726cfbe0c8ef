use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Reconnect-signal tag that triggers deferred replay.
pub const SYNC_STORIES_TAG: &str = "sync-stories";

/// Queue collection holding locally saved stories.
pub const FAVORITES_COLLECTION: &str = "favorites";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Origin the application shell is served from
  pub app_origin: Url,
  /// Origin of the story API; requests here take the network-first path
  pub api_origin: Url,
  /// Active deployment version tag
  pub version: String,
  /// Prefix for cache store names
  pub cache_prefix: String,
  /// Application-shell resources fetched and stored on activation
  pub shell_manifest: Vec<String>,
  /// Override for the directory holding the cache database and logs
  pub data_dir: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      app_origin: Url::parse("https://cerita-app.web.app").expect("valid default origin"),
      api_origin: Url::parse("https://story-api.dicoding.dev").expect("valid default origin"),
      version: "v1".to_string(),
      cache_prefix: "cerita".to_string(),
      shell_manifest: [
        "/",
        "/index.html",
        "/app.bundle.js",
        "/app.webmanifest",
        "/favicon.png",
        "/icons/icon-192x192.png",
        "/icons/icon-512x512.png",
      ]
      .iter()
      .map(|s| s.to_string())
      .collect(),
      data_dir: None,
    }
  }
}

/// Names of the cache stores belonging to the active version.
///
/// Every store whose name is not one of these is stale and eligible for
/// deletion on activation.
#[derive(Debug, Clone)]
pub struct StoreNames {
  pub shell: String,
  pub dynamic: String,
}

impl StoreNames {
  pub fn is_current(&self, name: &str) -> bool {
    name == self.shell || name == self.dynamic
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./ceritad.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/ceritad/config.yaml
  ///
  /// Falls back to built-in defaults when no file is found; every field has
  /// a default so the worker runs configless.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("ceritad.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("ceritad").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Store names derived from the cache prefix and the active version tag.
  pub fn store_names(&self) -> StoreNames {
    StoreNames {
      shell: format!("{}-shell-{}", self.cache_prefix, self.version),
      dynamic: format!("{}-dynamic-{}", self.cache_prefix, self.version),
    }
  }

  /// Shell manifest entries resolved against the application origin.
  pub fn shell_urls(&self) -> Result<Vec<Url>> {
    self
      .shell_manifest
      .iter()
      .map(|entry| {
        self
          .app_origin
          .join(entry)
          .map_err(|e| eyre!("Invalid shell manifest entry '{}': {}", entry, e))
      })
      .collect()
  }

  /// Resolve the data directory holding the cache database and logs.
  pub fn resolve_data_dir(&self) -> Result<PathBuf> {
    if let Some(dir) = &self.data_dir {
      return Ok(dir.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("ceritad"))
  }
}
