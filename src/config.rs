use serde::{Deserialize, Serialize};
use std::env;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AvatarDlError, ConfigError};

type Result<T> = std::result::Result<T, AvatarDlError>;

/// Settings file looked up in the working directory when `--settings` is not given
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Expand tilde (~) in paths to the actual home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Run settings, read once at startup from a JSON file
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Bot token, sent as `Authorization: Bot <token>`
    #[serde(default)]
    pub token: String,

    /// Servers to harvest, processed in this order
    #[serde(rename = "serverIDs", default)]
    pub server_ids: Vec<String>,

    /// Root for the per-server folders; empty means the working directory
    #[serde(default)]
    pub output_dir: PathBuf,

    /// Maximum in-flight downloads per server; unset or 0 is unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_avatar_size")]
    pub avatar_size: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_avatar_size() -> u32 {
    512
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::new(),
            server_ids: Vec::new(),
            output_dir: PathBuf::new(),
            concurrency: None,
            timeout_secs: default_timeout_secs(),
            avatar_size: default_avatar_size(),
        }
    }
}

// Custom Debug implementation to hide the token
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("token", &"<REDACTED>")
            .field("server_ids", &self.server_ids)
            .field("output_dir", &self.output_dir)
            .field("concurrency", &self.concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .field("avatar_size", &self.avatar_size)
            .finish()
    }
}

/// Apply DL_AVATARS_ prefixed environment variables
fn load_env_overrides(mut settings: Settings) -> Settings {
    if let Ok(val) = env::var("DL_AVATARS_TOKEN") {
        settings.token = val;
    }
    if let Ok(val) = env::var("DL_AVATARS_OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(val);
    }
    settings
}

impl Settings {
    /// Load settings from a JSON file, then apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        tracing::debug!("Loaded settings from: {}", path.display());

        let mut settings = Self::from_json(&content)?;
        settings = load_env_overrides(settings);
        settings.output_dir = expand_tilde(&settings.output_dir);
        Ok(settings)
    }

    /// Parse settings from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// Write a template settings file for the user to fill in
    pub fn create_sample<P: AsRef<Path>>(path: P) -> Result<()> {
        let sample = Self {
            token: "YOUR_BOT_TOKEN".to_string(),
            server_ids: vec!["123456789012345678".to_string()],
            output_dir: PathBuf::from("avatars"),
            ..Self::default()
        };
        let content = serde_json::to_string_pretty(&sample)
            .map_err(|e| ConfigError::ParseError(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(path, content + "\n")?;
        Ok(())
    }

    /// Check everything that must hold before any network activity
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::NoToken.into());
        }

        if self.server_ids.is_empty() {
            return Err(ConfigError::NoServers.into());
        }

        if self.server_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "serverIDs".to_string(),
                reason: "Server IDs must not be blank".to_string(),
            }
            .into());
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "timeoutSecs".to_string(),
                reason: "Must be at least 1".to_string(),
            }
            .into());
        }

        // Discord's CDN only serves power-of-two sizes
        if !self.avatar_size.is_power_of_two() || !(16..=4096).contains(&self.avatar_size) {
            return Err(ConfigError::Invalid {
                field: "avatarSize".to_string(),
                reason: format!(
                    "{} is not a power of two between 16 and 4096",
                    self.avatar_size
                ),
            }
            .into());
        }

        Ok(())
    }

    /// Root directory under which per-server folders are created
    pub fn base_dir(&self) -> PathBuf {
        Path::new(".").join(&self.output_dir)
    }

    /// Create the base output directory, returning its path
    pub fn ensure_base_dir(&self) -> Result<PathBuf> {
        let base = self.base_dir();
        std::fs::create_dir_all(&base).map_err(|e| ConfigError::BaseDir {
            path: base.clone(),
            source: e,
        })?;
        Ok(base)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: SettingsOverrides) {
        if !overrides.server_ids.is_empty() {
            self.server_ids = overrides.server_ids;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = expand_tilde(&dir);
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = Some(concurrency);
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(size) = overrides.avatar_size {
            self.avatar_size = size;
        }
    }
}

/// Command-line settings overrides
#[derive(Debug, Default)]
pub struct SettingsOverrides {
    pub server_ids: Vec<String>,
    pub output_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub avatar_size: Option<u32>,
}
