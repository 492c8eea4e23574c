use std::{
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, RwLock},
    time::Duration,
};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;
use webfeat_utils::{path::xdg_config_home, time::parse_duration};

use crate::error::{ConfigError, Result};

pub const DEFAULT_REPOSITORY: &str = "web-platform-tests/wpt";
pub const DEFAULT_ASSET_NAME: &str = "WEB_FEATURES_MANIFEST.json.gz";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT: &str = "5m";
pub const DEFAULT_TOKEN_ENV: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

static REPOSITORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(?:(?:https?://)?github\.com/)?([\w.-]+)/([\w.-]+?)(?:\.git)?/?$")
        .expect("unable to compile repository regex")
});

/// Application's configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Repository whose latest release carries the manifest, as `owner/name`.
    /// Default: "web-platform-tests/wpt"
    pub repository: Option<String>,

    /// Name of the release asset holding the manifest. Matched exactly.
    /// Default: "WEB_FEATURES_MANIFEST.json.gz"
    pub asset_name: Option<String>,

    /// Base URL of the GitHub REST API.
    /// Default: "https://api.github.com"
    pub api_url: Option<String>,

    /// Environment variables checked, in order, for an API token.
    /// Default: ["GITHUB_TOKEN", "GH_TOKEN"]
    pub token_env: Option<Vec<String>>,

    /// User agent sent with every request.
    pub user_agent: Option<String>,

    /// Proxy for all requests, e.g. "http://localhost:8080".
    pub proxy: Option<String>,

    /// Overall deadline for fetching and parsing the manifest (e.g. "90s", "5m").
    /// Default: "5m"
    pub timeout: Option<String>,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("WEBFEAT_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("webfeat").join("config.toml"),
    })
});

pub fn init() -> Result<()> {
    let config = Config::new()?;
    let mut global_config = CONFIG.write().unwrap();
    *global_config = Some(config);
    Ok(())
}

pub fn get_config() -> Config {
    {
        let config_guard = CONFIG.read().unwrap();
        if let Some(config) = config_guard.as_ref() {
            return config.clone();
        }
    }

    let mut config_guard = CONFIG.write().unwrap();
    config_guard.get_or_insert_with(Config::default_config).clone()
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            repository: Some(DEFAULT_REPOSITORY.to_string()),
            asset_name: Some(DEFAULT_ASSET_NAME.to_string()),
            api_url: Some(DEFAULT_API_URL.to_string()),
            token_env: Some(DEFAULT_TOKEN_ENV.map(String::from).to_vec()),
            user_agent: None,
            proxy: None,
            timeout: Some(DEFAULT_TIMEOUT.to_string()),
        }
    }

    /// Loads the configuration from [`CONFIG_PATH`].
    /// If the configuration file is not found, it uses the default configuration.
    pub fn new() -> Result<Self> {
        let config_path = CONFIG_PATH.read().unwrap().to_path_buf();
        Self::load(&config_path)
    }

    /// Loads the configuration from `path`, applies environment overrides and
    /// resolves it.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loading configuration from {}", path.display());
                toml::from_str(&content)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default_config(),
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.apply_env_overrides();
        config.resolve()?;

        Ok(config)
    }

    /// Overrides fields from `WEBFEAT_REPOSITORY`, `WEBFEAT_ASSET_NAME` and
    /// `WEBFEAT_API_URL`.
    pub fn apply_env_overrides(&mut self) {
        let overrides = [
            ("WEBFEAT_REPOSITORY", &mut self.repository),
            ("WEBFEAT_ASSET_NAME", &mut self.asset_name),
            ("WEBFEAT_API_URL", &mut self.api_url),
        ];

        for (var, field) in overrides {
            if let Ok(value) = std::env::var(var) {
                debug!("Using {} from environment", var);
                *field = Some(value);
            }
        }
    }

    /// Fills unset fields with defaults and validates the result.
    pub fn resolve(&mut self) -> Result<()> {
        self.repository
            .get_or_insert_with(|| DEFAULT_REPOSITORY.to_string());
        self.asset_name
            .get_or_insert_with(|| DEFAULT_ASSET_NAME.to_string());
        self.api_url.get_or_insert_with(|| DEFAULT_API_URL.to_string());
        self.token_env
            .get_or_insert_with(|| DEFAULT_TOKEN_ENV.map(String::from).to_vec());
        self.timeout.get_or_insert_with(|| DEFAULT_TIMEOUT.to_string());

        self.repository_parts()?;

        if self.asset_name().trim().is_empty() {
            return Err(ConfigError::EmptyAssetName);
        }

        validate_url("API", self.api_url())?;
        if let Some(proxy) = &self.proxy {
            validate_url("proxy", proxy)?;
        }

        self.timeout()?;

        Ok(())
    }

    /// Splits the configured repository into `(owner, name)`.
    ///
    /// Accepts `owner/name` as well as `github.com/owner/name` and full
    /// repository URLs.
    pub fn repository_parts(&self) -> Result<(String, String)> {
        let repository = self.repository.as_deref().unwrap_or(DEFAULT_REPOSITORY);
        parse_repository(repository)
    }

    pub fn asset_name(&self) -> &str {
        self.asset_name.as_deref().unwrap_or(DEFAULT_ASSET_NAME)
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// The overall deadline, or `None` when set to `"0"`/`"none"`.
    pub fn timeout(&self) -> Result<Option<Duration>> {
        let value = self.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT);
        if matches!(value.trim(), "0" | "none") {
            return Ok(None);
        }

        parse_duration(value).map(Some).map_err(|source| {
            ConfigError::InvalidTimeout {
                value: value.to_string(),
                source,
            }
        })
    }

    /// The first non-empty token among the configured environment variables.
    pub fn token(&self) -> Option<String> {
        let default_vars = DEFAULT_TOKEN_ENV.map(String::from).to_vec();
        self.token_env
            .as_ref()
            .unwrap_or(&default_vars)
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|token| !token.trim().is_empty())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = CONFIG_PATH.read().unwrap().to_path_buf();
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let serialized = self.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serialized)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

pub fn parse_repository(repository: &str) -> Result<(String, String)> {
    REPOSITORY_RE
        .captures(repository.trim())
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .ok_or_else(|| ConfigError::InvalidRepository(repository.to_string()))
}

fn validate_url(field: &'static str, value: &str) -> Result<()> {
    let invalid = |reason: String| {
        ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
            reason,
        }
    };

    let url = Url::parse(value).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("not a base URL".to_string()));
    }
    Ok(())
}
