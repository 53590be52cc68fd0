//! Test fixtures and constants.

use chrono::{DateTime, TimeZone, Utc};
use hmac_url::models::{ExceptedFields, FieldMap, FieldValue};
use hmac_url::{HmacAlgorithm, HmacConfig, HmacService, SignedUrl, SigningProfile};

/// Secret used by the worked example
pub const SECRET: &str = "k";

/// Base URL used by the worked example
pub const CONFIRM_BASE: &str = "https://x.test/confirm";

/// Signing configuration with a default profile and two named contexts
pub const CONFIG_YAML: &str = r#"
enabled: true
default_name: default
profiles:
  - name: default
    secret: k
  - name: newsletter
    secret: newsletter-secret
    algorithm: HmacSHA1
    encoding: UTF-8
  - name: legacy
    enabled: false
    secret: legacy-secret
    algorithm: HmacMD5
"#;

/// Fixed signing instant
pub fn signing_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Build a field map from text pairs
pub fn fields(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), FieldValue::from(*value)))
        .collect()
}

pub fn excepted(names: &[&str]) -> ExceptedFields {
    names.iter().map(|name| name.to_string()).collect()
}

/// Verifier for the worked example
pub fn verifier() -> SignedUrl {
    SignedUrl::builder()
        .secret(SECRET)
        .algorithm(HmacAlgorithm::HmacSha256)
        .build()
        .unwrap()
}

pub fn service() -> HmacService {
    HmacService::new(HmacConfig::from_yaml_str(CONFIG_YAML).unwrap()).unwrap()
}

pub fn single_profile_service(profile: SigningProfile) -> HmacService {
    HmacService::new(HmacConfig::single(profile)).unwrap()
}
