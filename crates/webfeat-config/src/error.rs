use miette::Diagnostic;
use thiserror::Error;
use webfeat_utils::error::{DurationError, PathError};

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(webfeat_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(webfeat_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Invalid repository: {0}")]
    #[diagnostic(
        code(webfeat_config::invalid_repository),
        help("Use the `owner/name` form, e.g. `web-platform-tests/wpt`")
    )]
    InvalidRepository(String),

    #[error("Asset name cannot be empty")]
    #[diagnostic(
        code(webfeat_config::empty_asset_name),
        help("Set `asset_name` to the file attached to the release")
    )]
    EmptyAssetName,

    #[error("Invalid {field} URL `{value}`: {reason}")]
    #[diagnostic(
        code(webfeat_config::invalid_url),
        help("Ensure the URL is valid and properly formatted")
    )]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid timeout `{value}`: {source}")]
    #[diagnostic(
        code(webfeat_config::invalid_timeout),
        help("Use a duration such as `90s`, `5m` or `1h30m`")
    )]
    InvalidTimeout {
        value: String,
        #[source]
        source: DurationError,
    },

    #[error("IO error: {0}")]
    #[diagnostic(code(webfeat_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(webfeat_config::path))]
    Path(#[from] PathError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
