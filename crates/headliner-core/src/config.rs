use crate::location::PermissionState;
use headliner_api::geo::{IP_GEOLOCATION_URL, NOMINATIM_REVERSE_URL};
use headliner_api::gnews::GNEWS_API_BASE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
///
/// Loaded from the config file; the CLI layers flags and env vars on top.
/// Priority: CLI > Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub location: LocationConfig,
}

impl Config {
    /// Load config from the default location, falling back to defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            // No config file? Use defaults
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save config to the default location
    pub fn save(&self) -> crate::Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Copy safe to print: the API token is masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.api.token = config.api.token.as_ref().map(|_| "***".to_string());
        config
    }

    /// `<config dir>/headliner/config.toml` (XDG on Linux, AppData on Windows)
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("headliner");

        Ok(config_dir.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// GNews API key - get one at https://gnews.io
    pub token: Option<String>,

    pub base_url: String,

    /// Article language
    pub language: String,

    /// Articles per request
    pub max_articles: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: GNEWS_API_BASE.to_string(),
            language: "en".to_string(),
            max_articles: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a response stays fresh
    pub ttl_secs: u64,

    /// Max cached responses
    pub capacity: usize,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: headliner_cache::DEFAULT_TTL.as_secs(),
            capacity: headliner_cache::DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Overrides the region read from the system locale
    pub region: Option<String>,

    /// Stored answer to "may we look up your location?"
    pub permission: PermissionState,

    /// What asking returns while `permission` is still not_determined
    pub grant_on_request: bool,

    pub geolocation_url: String,
    pub geocoder_url: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            region: None,
            permission: PermissionState::NotDetermined,
            grant_on_request: true,
            geolocation_url: IP_GEOLOCATION_URL.to_string(),
            geocoder_url: NOMINATIM_REVERSE_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.api.max_articles, 10);
        assert_eq!(config.location.permission, PermissionState::NotDetermined);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [api]
            token = "abc123"

            [location]
            region = "de"
            permission = "denied"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.token.as_deref(), Some("abc123"));
        assert_eq!(config.api.language, "en");
        assert_eq!(config.location.region.as_deref(), Some("de"));
        assert_eq!(config.location.permission, PermissionState::Denied);
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml("[cache]\nttl_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigError(_)));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("ttl_secs"));
        assert!(toml.contains("grant_on_request"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/definitely/not/here/config.toml")).unwrap();
        assert_eq!(config.api.base_url, GNEWS_API_BASE);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("headliner-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");

        let mut config = Config::default();
        config.location.region = Some("br".into());
        config.cache.capacity = 20;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.location.region.as_deref(), Some("br"));
        assert_eq!(loaded.cache.capacity, 20);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_redacted_masks_token() {
        let mut config = Config::default();
        config.api.token = Some("abc123".into());

        let printed = config.redacted().to_toml().unwrap();
        assert!(!printed.contains("abc123"));
        assert!(printed.contains("***"));
        assert_eq!(config.api.token.as_deref(), Some("abc123"));

        assert!(Config::default().redacted().api.token.is_none());
    }
}
