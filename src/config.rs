//! Configuration management.
//!
//! Settings are resolved in layers: built-in defaults, then a config file
//! (explicit `--config`, one next to the data directory, or auto-discovered
//! by `prefer`), then environment variables, then command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::govinfo::{ArchiveConfig, ArchiveError, RetryConfig, DEFAULT_BASE_URL};
use crate::repository::DbContext;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "cht.db";

/// Environment variable holding the GovInfo API key.
pub const API_KEY_ENV: &str = "GOVINFO_KEY";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CHT_DATA_DIR";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory (database and `.env`).
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Root directory for downloaded content.
    pub downloads_dir: PathBuf,
    /// GovInfo API key.
    pub api_key: Option<String>,
    /// GovInfo API root.
    pub api_base_url: String,
    /// Listing page size.
    pub page_size: u32,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// User agent for HTTP requests.
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            downloads_dir: PathBuf::from("downloads"),
            api_key: None,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 1000,
            request_timeout: 30,
            max_attempts: 3,
            retry_base_delay_ms: 500,
            user_agent: format!("cht/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the full path to the database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Path of the `.env` file kept in the data directory.
    pub fn env_file(&self) -> PathBuf {
        self.data_dir.join(".env")
    }

    /// Check if the database appears to be initialized.
    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (label, dir) in [("data", &self.data_dir), ("downloads", &self.downloads_dir)] {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create {} directory '{}': {}",
                        label,
                        dir.display(),
                        e
                    ),
                )
            })?;
        }
        Ok(())
    }

    /// Create a database context for the configured database file.
    pub fn create_db_context(&self) -> DbContext {
        DbContext::new(&self.database_path())
    }

    /// Retry policy for archive requests.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            ..RetryConfig::default()
        }
    }

    /// Archive connection settings. Fails without an API key.
    pub fn archive_config(&self) -> Result<ArchiveConfig, ArchiveError> {
        let key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ArchiveError::MissingCredential)?;

        Ok(ArchiveConfig {
            api_key: key.to_string(),
            base_url: self.api_base_url.clone(),
            page_size: self.page_size,
            timeout: Duration::from_secs(self.request_timeout),
            user_agent: self.user_agent.clone(),
            retry: self.retry_config(),
        })
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Download root directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<String>,
    /// GovInfo API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// GovInfo API root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    /// Listing page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Attempts per request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Delay before the first retry, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_base_delay_ms: Option<u64>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers cht config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("cht").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                    Self::default()
                }),
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref downloads_dir) = self.downloads_dir {
            settings.downloads_dir = self.resolve_path(downloads_dir, base_dir);
        }
        if let Some(ref key) = self.api_key {
            settings.api_key = Some(key.clone());
        }
        if let Some(ref url) = self.api_base_url {
            settings.api_base_url = url.clone();
        }
        if let Some(size) = self.page_size {
            settings.page_size = size;
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(attempts) = self.max_attempts {
            settings.max_attempts = attempts;
        }
        if let Some(delay) = self.retry_base_delay_ms {
            settings.retry_base_delay_ms = delay;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Data directory (--data-dir flag).
    pub data_dir: Option<PathBuf>,
    /// Download root (--path flag).
    pub downloads_dir: Option<PathBuf>,
}

/// Look for a config file inside the data directory.
fn find_config_in_data_dir(data_dir: &Path) -> Option<PathBuf> {
    let extensions = ["toml", "yaml", "yml", "json"];
    let basenames = ["cht", "config"];

    for basename in basenames {
        for ext in extensions {
            let path = data_dir.join(format!("{}.{}", basename, ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        current_dir().join(path)
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Load config from file sources.
async fn load_file_config(options: &LoadOptions, data_dir_override: Option<&Path>) -> Config {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Ignoring config file {}: {}", config_path.display(), e);
                Config::default()
            });
    }

    // Priority 2: Config inside the data dir
    if let Some(data_dir) = data_dir_override {
        if let Some(config_path) = find_config_in_data_dir(data_dir) {
            tracing::debug!("Found config in data dir: {}", config_path.display());
            return Config::load_from_path(&config_path)
                .await
                .unwrap_or_default();
        }
    }

    // Priority 3: Auto-discover via prefer
    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let data_dir_override = options
        .data_dir
        .as_deref()
        .map(absolute)
        .or_else(|| non_empty_env(DATA_DIR_ENV).map(|d| absolute(Path::new(&d))));

    let config = load_file_config(&options, data_dir_override.as_deref()).await;

    let mut settings = Settings::default();

    let base_dir = if options.use_cwd {
        current_dir()
    } else {
        config.base_dir().unwrap_or_else(current_dir)
    };

    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(data_dir) = data_dir_override {
        settings.data_dir = data_dir;
    }
    if let Some(ref downloads_dir) = options.downloads_dir {
        settings.downloads_dir = downloads_dir.clone();
    }
    // Stored content paths must not depend on the working directory
    settings.data_dir = absolute(&settings.data_dir);
    settings.downloads_dir = absolute(&settings.downloads_dir);

    // The data directory may carry its own .env with a saved key
    let env_file = settings.env_file();
    if env_file.exists() {
        if let Err(e) = dotenvy::from_path(&env_file) {
            tracing::warn!("Failed to load {}: {}", env_file.display(), e);
        }
    }

    if let Some(key) = non_empty_env(API_KEY_ENV) {
        tracing::debug!("Using {} from environment", API_KEY_ENV);
        settings.api_key = Some(key);
    }

    (settings, config)
}

/// Persist an API key to the data directory's `.env`, replacing any earlier key.
///
/// The file is created with owner-only permissions on Unix.
pub fn save_api_key(settings: &Settings, key: &str) -> std::io::Result<PathBuf> {
    let path = settings.env_file();
    let existing = fs::read_to_string(&path).unwrap_or_default();

    let mut contents: String = existing
        .lines()
        .filter(|line| !line.trim_start().starts_with(&format!("{}=", API_KEY_ENV)))
        .map(|line| format!("{}\n", line))
        .collect();
    contents.push_str(&format!("{}={}\n", API_KEY_ENV, key));

    crate::storage::write_atomic(&path, contents.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(path)
}
