use crate::error::ConfigError;
use crate::models::{Charset, HmacAlgorithm, SecretKey};
use serde::Deserialize;
use std::path::Path;

/// Signing configuration loaded from a YAML file
#[derive(Debug, Deserialize, Clone)]
pub struct HmacConfig {
    /// Whether signing is enabled at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Profile used when a context has no profile of its own
    #[serde(default = "default_name")]
    pub default_name: Option<String>,

    /// Named signing profiles
    #[serde(default, alias = "config")]
    pub profiles: Vec<SigningProfile>,
}

fn default_enabled() -> bool {
    true
}

fn default_name() -> Option<String> {
    Some("default".to_string())
}

/// One named signing context
#[derive(Debug, Deserialize, Clone)]
pub struct SigningProfile {
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub secret: SecretKey,

    /// MAC construction (default: HmacSHA256)
    #[serde(default)]
    pub algorithm: HmacAlgorithm,

    /// Character encoding (default: UTF-8)
    #[serde(default, alias = "charset")]
    pub encoding: Charset,
}

impl SigningProfile {
    pub fn new(name: impl Into<String>, secret: impl Into<SecretKey>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            secret: secret.into(),
            algorithm: HmacAlgorithm::default(),
            encoding: Charset::default(),
        }
    }

    /// Profile with a freshly generated random secret
    pub fn with_random_secret(name: impl Into<String>) -> Self {
        Self::new(name, SecretKey::random())
    }

    pub fn algorithm(mut self, algorithm: HmacAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn encoding(mut self, encoding: Charset) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl HmacConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        tracing::info!(
            profiles = config.profiles.len(),
            default = config.default_name.as_deref().unwrap_or("-"),
            "Loaded signing configuration"
        );
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            tracing::warn!(path = %path.display(), %e, "Failed to read signing configuration");
            ConfigError::Io(e)
        })?;
        Self::from_yaml_str(&content)
    }

    /// Configuration holding a single profile, which is also the default
    pub fn single(profile: SigningProfile) -> Self {
        Self {
            enabled: true,
            default_name: Some(profile.name.clone()),
            profiles: vec![profile],
        }
    }
}

impl Default for HmacConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_name: default_name(),
            profiles: Vec::new(),
        }
    }
}
