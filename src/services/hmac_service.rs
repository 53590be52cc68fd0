use std::collections::HashMap;

use crate::error::{ConfigError, HmacError};
use crate::models::{Charset, ExceptedFields, FieldMap, HmacAlgorithm, HmacConfig, SigningProfile};
use crate::services::mac;
use crate::services::signed_url::{SignedUrl, SignedUrlBuilder};

/// Signs and verifies URLs with named signing profiles.
///
/// Every call builds its own [`SignedUrl`], so a shared `HmacService` needs no
/// locking.
#[derive(Debug, Clone)]
pub struct HmacService {
    profiles: HashMap<String, SigningProfile>,
    default_name: Option<String>,
}

impl HmacService {
    /// Index the enabled profiles of `config`
    pub fn new(config: HmacConfig) -> Result<Self, ConfigError> {
        if !config.enabled {
            return Err(ConfigError::Disabled);
        }

        let mut profiles = HashMap::new();
        for profile in config.profiles.into_iter().filter(|p| p.enabled) {
            if let Some(previous) = profiles.insert(profile.name.clone(), profile) {
                tracing::warn!(name = %previous.name, "Duplicate signing profile, keeping the last one");
            }
        }

        tracing::info!(
            profiles = profiles.len(),
            default = config.default_name.as_deref().unwrap_or("-"),
            "HMAC service initialized"
        );

        Ok(Self {
            profiles,
            default_name: config.default_name,
        })
    }

    /// Profile for `context`, falling back to the default profile
    pub fn profile(&self, context: &str) -> Result<&SigningProfile, ConfigError> {
        self.profiles
            .get(context)
            .or_else(|| {
                let fallback = self.default_name.as_deref()?;
                tracing::debug!(context, fallback, "Unknown signing context, using default");
                self.profiles.get(fallback)
            })
            .ok_or_else(|| ConfigError::UnknownContext(context.to_string()))
    }

    pub fn algorithm(&self, context: &str) -> Result<HmacAlgorithm, ConfigError> {
        Ok(self.profile(context)?.algorithm)
    }

    pub fn encoding(&self, context: &str) -> Result<Charset, ConfigError> {
        Ok(self.profile(context)?.encoding)
    }

    /// Whether `context` resolves to an enabled profile
    pub fn is_enabled(&self, context: &str) -> bool {
        self.profile(context).is_ok_and(|p| p.enabled)
    }

    fn builder(&self, context: &str) -> Result<SignedUrlBuilder, ConfigError> {
        Ok(SignedUrl::builder().profile(self.profile(context)?))
    }

    /// MAC over `fields`, leaving out `excepted`
    pub fn calculate_hmac(
        &self,
        context: &str,
        fields: &FieldMap,
        excepted: &ExceptedFields,
    ) -> Result<String, HmacError> {
        let signed = self
            .builder(context)?
            .fields(fields.clone())
            .excepted_fields(excepted.iter().cloned())
            .build()?;
        signed.calculate_mac()
    }

    /// Compare `hmac` with the MAC of `fields`
    pub fn validate_hmac(
        &self,
        context: &str,
        hmac: &str,
        fields: &FieldMap,
        excepted: &ExceptedFields,
    ) -> Result<bool, HmacError> {
        let expected = self.calculate_hmac(context, fields, excepted)?;
        Ok(mac::constant_time_eq(hmac, &expected))
    }

    /// Sign `fields` into `base/?query[#fragment]`
    pub fn calculate_url(
        &self,
        context: &str,
        fields: &FieldMap,
        excepted: &ExceptedFields,
        base: &str,
        fragment: Option<&str>,
    ) -> Result<String, HmacError> {
        let mut builder = self
            .builder(context)?
            .fields(fields.clone())
            .excepted_fields(excepted.iter().cloned())
            .base(base);
        if let Some(fragment) = fragment {
            builder = builder.fragment(fragment);
        }
        builder.build()?.calculate_url()
    }

    /// Verify a signed URL. See [`SignedUrl::validate_url`].
    pub fn validate_url(
        &self,
        context: &str,
        url: &str,
        excepted: &ExceptedFields,
        throw_on_expiration: bool,
    ) -> Result<bool, HmacError> {
        let mut signed = self
            .builder(context)?
            .excepted_fields(excepted.iter().cloned())
            .build()?;
        let valid = signed.validate_url(url, throw_on_expiration)?;
        tracing::debug!(context, valid, "Validated signed URL");
        Ok(valid)
    }

    /// Fields carried by `url`, without verification
    pub fn url_fields(&self, context: &str, url: &str) -> Result<FieldMap, HmacError> {
        let signed = self.builder(context)?.build()?;
        Ok(signed.extract_fields_from_url(url)?)
    }
}
