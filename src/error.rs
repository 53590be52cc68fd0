use thiserror::Error;

/// Failures while turning fields into text or back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Missing value delimiter in item: {0}")]
    MissingDelimiter(String),

    #[error("Too many value delimiters in item: {0}")]
    ExtraDelimiter(String),

    #[error("Delimiters must not be empty")]
    EmptyDelimiter,

    #[error("Unsupported character encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Cannot encode {text:?} as {charset}")]
    Unencodable { charset: &'static str, text: String },

    #[error("Cannot decode {text:?} as {charset}")]
    Undecodable { charset: &'static str, text: String },

    #[error("Malformed percent escape in {0:?}")]
    MalformedEscape(String),

    #[error("Unable to parse {0:?} as timestamp")]
    InvalidTimestamp(String),

    #[error("Unable to convert {0:?} to integer")]
    InvalidInteger(String),

    #[error("Field {field} expects a {expected} value")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("The url provided does not have query parameters")]
    MissingQuery,
}

/// Failures while computing a MAC.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("Unsupported MAC algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid key for MAC computation")]
    InvalidKey,

    #[error("Encoding error while computing MAC: {0}")]
    Encoding(#[from] FieldError),
}

/// Why a URL with a time-to-live was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// The URL carries a time-to-live but no signing timestamp
    MissingTimestamp,
    /// The time-to-live has elapsed
    Elapsed,
}

impl std::fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpiryReason::MissingTimestamp => write!(f, "the url has ttl and no hmac timestamp"),
            ExpiryReason::Elapsed => write!(f, "the url has expired"),
        }
    }
}

/// Failures while loading or resolving signing profiles.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("HMAC module is disabled")]
    Disabled,

    #[error("No signing profile for context {0:?} and no default profile")]
    UnknownContext(String),
}

/// Top-level error for signing and verification operations.
#[derive(Debug, Error)]
pub enum HmacError {
    #[error("Field error: {0}")]
    Field(#[from] FieldError),

    #[error("Signing error: {0}")]
    Sign(#[from] SignError),

    #[error("URL expired: {0}")]
    UrlExpired(ExpiryReason),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
