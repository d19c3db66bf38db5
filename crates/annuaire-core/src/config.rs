//! Configuration management for the harvester.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. API credentials are never written to disk.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/annuaire/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output and bookkeeping directories
    pub general: GeneralConfig,
    /// What to search for
    pub search: SearchConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Retry policy for page interactions
    pub retry: RetryConfig,
    /// Company registry enrichment
    pub enrichment: EnrichmentConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error here.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `ANNUAIRE_KEYWORD` (or `SCRAPER_KEYWORD`): Override the search keyword
    /// - `ANNUAIRE_LOCATION` (or `SCRAPER_LOCATION`): Override the search location
    /// - `ANNUAIRE_HEADLESS` (or `SCRAPER_HEADLESS`): Override browser headless mode (true/false)
    /// - `ANNUAIRE_DISABLE_JS` (or `SCRAPER_DISABLE_JS`): Launch the browser with JavaScript disabled
    /// - `SIREN_API_KEY`: INSEE Sirene API key
    /// - `PAPERS_API_KEY`: Pappers API token
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from an environment lookup function.
    ///
    /// Each `ANNUAIRE_*` name also accepts its legacy `SCRAPER_*` spelling;
    /// the `ANNUAIRE_*` value wins when both are set.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str, legacy: &str| lookup(name).or_else(|| lookup(legacy));
        let flag = |name: &str, legacy: &str| {
            var(name, legacy).and_then(|v| v.trim().to_ascii_lowercase().parse::<bool>().ok())
        };

        if let Some(val) = var("ANNUAIRE_KEYWORD", "SCRAPER_KEYWORD") {
            tracing::debug!("Override search.keyword from env: {}", val);
            self.search.keyword = val;
        }

        if let Some(val) = var("ANNUAIRE_LOCATION", "SCRAPER_LOCATION") {
            tracing::debug!("Override search.location from env: {}", val);
            self.search.location = val;
        }

        if let Some(headless) = flag("ANNUAIRE_HEADLESS", "SCRAPER_HEADLESS") {
            self.browser.headless = headless;
            tracing::debug!("Override browser.headless from env: {}", headless);
        }

        if let Some(disable) = flag("ANNUAIRE_DISABLE_JS", "SCRAPER_DISABLE_JS") {
            self.browser.disable_javascript = disable;
            tracing::debug!("Override browser.disable_javascript from env: {}", disable);
        }

        if let Some(key) = lookup("SIREN_API_KEY").filter(|k| !k.is_empty()) {
            self.enrichment.sirene_api_key = Some(key);
        }

        if let Some(key) = lookup("PAPERS_API_KEY").filter(|k| !k.is_empty()) {
            self.enrichment.pappers_api_key = Some(key);
        }
    }

    /// Check values that would make a run meaningless.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.search.keyword.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "search.keyword".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.retry.profile_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.profile_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.enrichment.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "enrichment.timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/annuaire/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("fr", "annuaire", "annuaire").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Output and bookkeeping directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory for `.jsonl`, `.json` and `.csv` outputs
    pub output_dir: PathBuf,
    /// Directory for done-set files
    pub done_dir: PathBuf,
    /// Directory for `scraper.log`
    pub log_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("scraped_data"),
            done_dir: PathBuf::from("done"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// What to search for on the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Profession or free-text keyword
    pub keyword: String,
    /// City or area
    pub location: String,
    /// Directory home page holding the search form
    pub start_url: String,
    /// Hard cap on result pages (0 = follow "next" until it disappears)
    pub max_pages: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            keyword: "Médecin".to_string(),
            location: "bordeaux".to_string(),
            start_url: "https://annuaire.sante.fr/".to_string(),
            max_pages: 0,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// How long to wait for the loading spinner to disappear, in seconds
    pub loading_timeout_secs: u64,
    /// Persistent profile directory (None = throwaway profile)
    pub user_data_dir: Option<PathBuf>,
    /// Launch with JavaScript disabled
    pub disable_javascript: bool,
    /// Number of attempts to launch the browser
    pub launch_attempts: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
            loading_timeout_secs: 10,
            user_data_dir: None,
            disable_javascript: false,
            launch_attempts: 3,
        }
    }
}

/// Retry policy for page interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per interaction (navigate, read, click)
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `n * base_delay_ms` before the next one
    pub base_delay_ms: u64,
    /// Whole-profile attempts before a profile is counted as failed
    pub profile_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            profile_attempts: 2,
        }
    }
}

/// Which registry is consulted first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierOrder {
    /// INSEE Sirene first, Pappers as fallback
    #[default]
    SireneFirst,
    /// Pappers first, INSEE Sirene as fallback
    PappersFirst,
}

/// Company registry enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Tier precedence
    pub tier_order: TierOrder,
    /// Per-lookup timeout in seconds
    pub timeout_secs: u64,
    /// INSEE Sirene API base URL
    pub sirene_base_url: String,
    /// Pappers API base URL
    pub pappers_base_url: String,
    /// INSEE Sirene API key (from `SIREN_API_KEY`, never serialized)
    #[serde(skip)]
    pub sirene_api_key: Option<String>,
    /// Pappers API token (from `PAPERS_API_KEY`, never serialized)
    #[serde(skip)]
    pub pappers_api_key: Option<String>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            tier_order: TierOrder::SireneFirst,
            timeout_secs: 10,
            sirene_base_url: "https://api.insee.fr/api-sirene/3.11".to_string(),
            pappers_base_url: "https://api.pappers.fr/v2".to_string(),
            sirene_api_key: None,
            pappers_api_key: None,
        }
    }
}
