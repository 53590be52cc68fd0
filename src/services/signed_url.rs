//! A single signable URL: payload fields, reserved `hmac`/`hmac-ts`/`hmac-ttl`
//! fields and the structural parts (base and fragment) around the query.
//!
//! A [`SignedUrl`] is built fresh for each sign or verify call and dropped
//! afterwards. Operations that change it take `&mut self`, so one instance is
//! never driven by two callers at once.

use chrono::{DateTime, SubsecRound, Utc};

use crate::error::{ExpiryReason, FieldError, HmacError};
use crate::models::{
    Charset, ExceptedFields, FieldMap, FieldValue, HmacAlgorithm, ReservedField, SecretKey,
    SigningProfile, FIELD_HMAC,
};
use crate::services::canonical::{self, Delimiters};
use crate::services::{expiration, mac};

/// Builder for [`SignedUrl`]. All normalization happens in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct SignedUrlBuilder {
    fields: Vec<(String, FieldValue)>,
    excepted_fields: ExceptedFields,
    algorithm: Option<HmacAlgorithm>,
    secret: SecretKey,
    charset: Option<Charset>,
    base: Option<String>,
    fragment: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    time_to_live: Option<i64>,
}

impl SignedUrlBuilder {
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn excepted_field(mut self, name: impl Into<String>) -> Self {
        self.excepted_fields.insert(name.into());
        self
    }

    pub fn excepted_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excepted_fields.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn algorithm(mut self, algorithm: HmacAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn secret(mut self, secret: impl Into<SecretKey>) -> Self {
        self.secret = secret.into();
        self
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = Some(charset);
        self
    }

    /// Take secret, algorithm and charset from a signing profile
    pub fn profile(self, profile: &SigningProfile) -> Self {
        self.secret(profile.secret.clone())
            .algorithm(profile.algorithm)
            .charset(profile.encoding)
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Time-to-live in seconds. Without an explicit timestamp the URL is
    /// stamped with the build time.
    pub fn time_to_live(mut self, seconds: i64) -> Self {
        self.time_to_live = Some(seconds);
        self
    }

    pub fn build(self) -> Result<SignedUrl, FieldError> {
        self.build_at(Utc::now())
    }

    /// Build with `now` standing in for the current time
    pub fn build_at(self, now: DateTime<Utc>) -> Result<SignedUrl, FieldError> {
        let mut excepted_fields: ExceptedFields = self
            .excepted_fields
            .iter()
            .map(|name| ReservedField::canonical_name(name).to_string())
            .collect();
        excepted_fields.insert(FIELD_HMAC.to_string());

        let mut signed = SignedUrl {
            fields: FieldMap::new(),
            excepted_fields,
            algorithm: self.algorithm.unwrap_or_default(),
            secret: self.secret,
            charset: self.charset.unwrap_or_default(),
            base: normalize_base(self.base.unwrap_or_default()),
            fragment: normalize_fragment(self.fragment.unwrap_or_default()),
            timestamp: None,
            time_to_live: None,
            hmac: None,
        };

        for (name, value) in self.fields {
            signed.set_field(&name, Some(value))?;
        }
        if let Some(timestamp) = self.timestamp {
            signed.set_reserved(ReservedField::Timestamp, Some(timestamp.into()))?;
        }
        if let Some(ttl) = self.time_to_live {
            signed.set_reserved(ReservedField::TimeToLive, Some(ttl.into()))?;
        }
        if signed.time_to_live.is_some() && signed.timestamp.is_none() {
            let stamp = now.trunc_subsecs(0);
            signed.set_reserved(ReservedField::Timestamp, Some(stamp.into()))?;
        }

        Ok(signed)
    }
}

fn normalize_base(mut base: String) -> String {
    if base.ends_with('/') {
        base.pop();
    }
    base
}

fn normalize_fragment(mut fragment: String) -> String {
    if fragment.starts_with('#') {
        fragment.remove(0);
    }
    fragment
}

/// Base, query and fragment of a signed URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UrlParts<'a> {
    base: &'a str,
    query: &'a str,
    fragment: Option<&'a str>,
}

/// Split at the first `?` and at the last `#` after it
fn split_url(url: &str) -> Result<UrlParts<'_>, FieldError> {
    let (head, rest) = url.split_once('?').ok_or(FieldError::MissingQuery)?;
    let base = head.strip_suffix('/').unwrap_or(head);
    let (query, fragment) = match rest.rsplit_once('#') {
        Some((query, fragment)) => (query, Some(fragment)),
        None => (rest, None),
    };
    Ok(UrlParts {
        base,
        query,
        fragment,
    })
}

/// One signable URL
#[derive(Debug)]
pub struct SignedUrl {
    fields: FieldMap,
    excepted_fields: ExceptedFields,
    algorithm: HmacAlgorithm,
    secret: SecretKey,
    charset: Charset,
    base: String,
    fragment: String,
    timestamp: Option<DateTime<Utc>>,
    time_to_live: Option<i64>,
    hmac: Option<String>,
}

impl SignedUrl {
    pub fn builder() -> SignedUrlBuilder {
        SignedUrlBuilder::default()
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn excepted_fields(&self) -> &ExceptedFields {
        &self.excepted_fields
    }

    pub fn is_excepted_field(&self, name: &str) -> bool {
        self.excepted_fields
            .contains(ReservedField::canonical_name(name))
    }

    pub fn algorithm(&self) -> HmacAlgorithm {
        self.algorithm
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn time_to_live(&self) -> Option<i64> {
        self.time_to_live
    }

    pub fn hmac(&self) -> Option<&str> {
        self.hmac.as_deref()
    }

    /// Field value by name. Reserved names return the typed attribute.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match ReservedField::lookup(name) {
            Some(ReservedField::Hmac) => self.hmac.clone().map(FieldValue::Text),
            Some(ReservedField::Timestamp) => self.timestamp.map(FieldValue::Timestamp),
            Some(ReservedField::TimeToLive) => self.time_to_live.map(FieldValue::Integer),
            None => self.fields.get(name).cloned(),
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(ReservedField::canonical_name(name))
    }

    /// Set or remove (`None`) a field.
    ///
    /// Reserved names are stored under their lower-case form with their
    /// typed value, and the matching attribute is kept in sync.
    pub fn set_field(&mut self, name: &str, value: Option<FieldValue>) -> Result<(), FieldError> {
        match ReservedField::lookup(name) {
            Some(reserved) => self.set_reserved(reserved, value),
            None => {
                match value {
                    Some(value) => self.fields.insert(name.to_string(), value),
                    None => self.fields.remove(name),
                };
                Ok(())
            }
        }
    }

    fn set_reserved(
        &mut self,
        reserved: ReservedField,
        value: Option<FieldValue>,
    ) -> Result<(), FieldError> {
        let value = value.map(|v| reserved.convert(v)).transpose()?;

        match reserved {
            ReservedField::Hmac => {
                self.hmac = value.as_ref().and_then(FieldValue::as_text).map(str::to_string)
            }
            ReservedField::Timestamp => {
                self.timestamp = value.as_ref().and_then(FieldValue::as_timestamp)
            }
            ReservedField::TimeToLive => {
                self.time_to_live = value.as_ref().and_then(FieldValue::as_integer)
            }
        }

        match value {
            Some(value) => self.fields.insert(reserved.name().to_string(), value),
            None => self.fields.remove(reserved.name()),
        };
        Ok(())
    }

    fn clear_fields(&mut self) {
        self.fields.clear();
        self.hmac = None;
        self.timestamp = None;
        self.time_to_live = None;
    }

    /// MAC over the canonical string of all non-excepted fields
    pub fn calculate_mac(&self) -> Result<String, HmacError> {
        let message = canonical::serialize(
            &self.fields,
            self.charset,
            Delimiters::URL,
            &self.excepted_fields,
        )?;
        Ok(mac::sign(&self.secret, self.charset, self.algorithm, &message)?)
    }

    /// Sign the fields and return `base/?query[#fragment]`.
    ///
    /// The query carries every field, including excepted ones and the MAC.
    pub fn calculate_url(&mut self) -> Result<String, HmacError> {
        let hmac = self.calculate_mac()?;
        self.set_reserved(ReservedField::Hmac, Some(FieldValue::Text(hmac)))?;

        let query = canonical::serialize(
            &self.fields,
            self.charset,
            Delimiters::URL,
            &ExceptedFields::new(),
        )?;

        let mut url = format!("{}/?{}", self.base, query);
        if !self.fragment.is_empty() {
            url.push('#');
            url.push_str(&self.fragment);
        }
        tracing::debug!(base = %self.base, fields = self.fields.len(), "Signed URL");
        Ok(url)
    }

    /// Parse the query of `url` without checking its MAC
    pub fn extract_fields_from_url(&self, url: &str) -> Result<FieldMap, FieldError> {
        let parts = split_url(url)?;
        canonical::deserialize(parts.query, self.charset, Delimiters::URL)
    }

    /// Check the MAC of `url` and, when it carries a time-to-live, its expiry.
    ///
    /// A MAC mismatch yields `Ok(false)`. An expired URL yields `Ok(false)`,
    /// or [`HmacError::UrlExpired`] when `throw_on_expiration` is set. A
    /// time-to-live without a timestamp is treated as expired.
    pub fn validate_url(&mut self, url: &str, throw_on_expiration: bool) -> Result<bool, HmacError> {
        self.validate_url_at(url, throw_on_expiration, Utc::now())
    }

    /// [`validate_url`](Self::validate_url) evaluated at `now`
    pub fn validate_url_at(
        &mut self,
        url: &str,
        throw_on_expiration: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, HmacError> {
        let parts = split_url(url)?;
        let presented = canonical::deserialize(parts.query, self.charset, Delimiters::URL)?;

        self.base = parts.base.to_string();
        self.fragment = parts.fragment.unwrap_or_default().to_string();
        self.clear_fields();
        for (name, value) in presented {
            self.set_field(&name, Some(value))?;
        }

        let expected = self.calculate_mac()?;
        let matches = self
            .hmac
            .as_deref()
            .is_some_and(|candidate| mac::constant_time_eq(candidate, &expected));
        if !matches {
            tracing::debug!(base = %self.base, "MAC mismatch");
            return Ok(false);
        }

        let Some(ttl) = self.time_to_live else {
            return Ok(true);
        };
        let expired = match self.timestamp {
            None => Some(ExpiryReason::MissingTimestamp),
            Some(ts) if expiration::is_expired_at(ts, ttl, now) => Some(ExpiryReason::Elapsed),
            Some(_) => None,
        };

        match expired {
            None => Ok(true),
            Some(reason) => {
                tracing::debug!(base = %self.base, %reason, "Signed URL rejected");
                if throw_on_expiration {
                    Err(HmacError::UrlExpired(reason))
                } else {
                    Ok(false)
                }
            }
        }
    }
}
