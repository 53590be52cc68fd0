//! Canonical serialization of field maps.
//!
//! Signer and verifier must feed byte-identical input into the MAC, so the
//! string is built from fields sorted by name, with every name and value
//! form-encoded (`+` for space, `%XX` for everything outside
//! `[A-Za-z0-9.*_-]`).

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;

use crate::error::FieldError;
use crate::models::{Charset, ExceptedFields, FieldMap, FieldValue};

/// Bytes passed through as-is. Space is kept here and turned into `+` afterwards.
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'*')
    .remove(b'_')
    .remove(b' ');

/// Separators between name and value, and between items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters<'a> {
    pub value: &'a str,
    pub item: &'a str,
}

impl Delimiters<'static> {
    /// `name=value&name=value`
    pub const URL: Self = Self {
        value: "=",
        item: "&",
    };
}

impl Default for Delimiters<'static> {
    fn default() -> Self {
        Self::URL
    }
}

impl Delimiters<'_> {
    fn validate(&self) -> Result<(), FieldError> {
        if self.value.is_empty() || self.item.is_empty() {
            return Err(FieldError::EmptyDelimiter);
        }
        Ok(())
    }
}

/// Form-encode one name or value under the given charset
pub fn encode_component(text: &str, charset: Charset) -> Result<String, FieldError> {
    let bytes = charset.encode(text)?;
    Ok(percent_encode(&bytes, FORM_ENCODE_SET)
        .to_string()
        .replace(' ', "+"))
}

/// Reverse of [`encode_component`]
pub fn decode_component(text: &str, charset: Charset) -> Result<String, FieldError> {
    check_escapes(text)?;
    let spaced = text.replace('+', " ");
    let bytes: Cow<'_, [u8]> = percent_decode_str(&spaced).into();
    charset.decode(&bytes)
}

/// Every `%` must start a two-digit hex escape
fn check_escapes(text: &str) -> Result<(), FieldError> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return Err(FieldError::MalformedEscape(text.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// Build the canonical string for `fields`, skipping names in `excepted`.
pub fn serialize(
    fields: &FieldMap,
    charset: Charset,
    delimiters: Delimiters<'_>,
    excepted: &ExceptedFields,
) -> Result<String, FieldError> {
    delimiters.validate()?;

    let items = fields
        .iter()
        .filter(|(name, _)| !excepted.contains(name.as_str()))
        .map(|(name, value)| -> Result<String, FieldError> {
            Ok(format!(
                "{}{}{}",
                encode_component(name, charset)?,
                delimiters.value,
                encode_component(&value.to_string(), charset)?
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items.join(delimiters.item))
}

/// Parse a canonical string back into text-valued fields.
///
/// An empty string yields an empty map. Typed reserved fields come back as
/// text; converting them is up to the caller.
pub fn deserialize(
    raw: &str,
    charset: Charset,
    delimiters: Delimiters<'_>,
) -> Result<FieldMap, FieldError> {
    delimiters.validate()?;

    let mut fields = FieldMap::new();
    if raw.is_empty() {
        return Ok(fields);
    }

    for item in raw.split(delimiters.item) {
        let (name, value) = item
            .split_once(delimiters.value)
            .ok_or_else(|| FieldError::MissingDelimiter(item.to_string()))?;
        if value.contains(delimiters.value) {
            return Err(FieldError::ExtraDelimiter(item.to_string()));
        }
        fields.insert(
            decode_component(name, charset)?,
            FieldValue::Text(decode_component(value, charset)?),
        );
    }

    Ok(fields)
}
