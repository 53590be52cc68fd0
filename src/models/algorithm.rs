use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{FieldError, SignError};

/// Keyed-hash constructions available for signing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum HmacAlgorithm {
    HmacMd5,
    HmacSha1,
    #[default]
    HmacSha256,
}

impl HmacAlgorithm {
    /// Conventional identifier, e.g. `HmacSHA256`
    pub fn name(self) -> &'static str {
        match self {
            HmacAlgorithm::HmacMd5 => "HmacMD5",
            HmacAlgorithm::HmacSha1 => "HmacSHA1",
            HmacAlgorithm::HmacSha256 => "HmacSHA256",
        }
    }
}

impl fmt::Display for HmacAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HmacAlgorithm {
    type Err = SignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hmacmd5" | "md5" => Ok(HmacAlgorithm::HmacMd5),
            "hmacsha1" | "sha1" => Ok(HmacAlgorithm::HmacSha1),
            "hmacsha256" | "sha256" => Ok(HmacAlgorithm::HmacSha256),
            _ => Err(SignError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for HmacAlgorithm {
    type Error = SignError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Character encoding used for percent-encoding and for the MAC input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Charset {
    #[default]
    Utf8,
    UsAscii,
    Iso8859_1,
}

impl Charset {
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::UsAscii => "US-ASCII",
            Charset::Iso8859_1 => "ISO-8859-1",
        }
    }

    /// Encode text to bytes, failing on characters the charset cannot carry
    pub fn encode<'a>(self, text: &'a str) -> Result<Cow<'a, [u8]>, FieldError> {
        match self {
            Charset::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            Charset::UsAscii if text.is_ascii() => Ok(Cow::Borrowed(text.as_bytes())),
            Charset::UsAscii => Err(self.unencodable(text)),
            Charset::Iso8859_1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| self.unencodable(text)))
                .collect::<Result<Vec<u8>, _>>()
                .map(Cow::Owned),
        }
    }

    /// Decode bytes produced by [`Charset::encode`]
    pub fn decode(self, bytes: &[u8]) -> Result<String, FieldError> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| self.undecodable(bytes)),
            Charset::UsAscii if bytes.is_ascii() => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Charset::UsAscii => Err(self.undecodable(bytes)),
            Charset::Iso8859_1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    fn unencodable(self, text: &str) -> FieldError {
        FieldError::Unencodable {
            charset: self.name(),
            text: text.to_string(),
        }
    }

    fn undecodable(self, bytes: &[u8]) -> FieldError {
        FieldError::Undecodable {
            charset: self.name(),
            text: String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "us-ascii" | "ascii" => Ok(Charset::UsAscii),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Ok(Charset::Iso8859_1),
            _ => Err(FieldError::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl TryFrom<String> for Charset {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("HmacSHA256".parse::<HmacAlgorithm>().unwrap(), HmacAlgorithm::HmacSha256);
        assert_eq!("hmacsha1".parse::<HmacAlgorithm>().unwrap(), HmacAlgorithm::HmacSha1);
        assert_eq!("MD5".parse::<HmacAlgorithm>().unwrap(), HmacAlgorithm::HmacMd5);
    }

    #[test]
    fn test_algorithm_unsupported() {
        let err = "HmacSHA512".parse::<HmacAlgorithm>().unwrap_err();
        assert_eq!(err, SignError::UnsupportedAlgorithm("HmacSHA512".to_string()));
    }

    #[test]
    fn test_algorithm_default_is_sha256() {
        assert_eq!(HmacAlgorithm::default(), HmacAlgorithm::HmacSha256);
        assert_eq!(HmacAlgorithm::default().to_string(), "HmacSHA256");
    }

    #[test]
    fn test_charset_from_str() {
        assert_eq!("UTF-8".parse::<Charset>().unwrap(), Charset::Utf8);
        assert_eq!("us-ascii".parse::<Charset>().unwrap(), Charset::UsAscii);
        assert_eq!("ISO_8859_1".parse::<Charset>().unwrap(), Charset::Iso8859_1);
        assert!("EBCDIC".parse::<Charset>().is_err());
    }

    #[test]
    fn test_latin1_encode_decode() {
        let bytes = Charset::Iso8859_1.encode("café").unwrap();
        assert_eq!(bytes.as_ref(), &[b'c', b'a', b'f', 0xE9]);
        assert_eq!(Charset::Iso8859_1.decode(&bytes).unwrap(), "café");

        assert!(Charset::Iso8859_1.encode("€").is_err());
    }

    #[test]
    fn test_ascii_rejects_non_ascii() {
        assert!(Charset::UsAscii.encode("plain").is_ok());
        assert!(Charset::UsAscii.encode("café").is_err());
        assert!(Charset::UsAscii.decode(&[0xE9]).is_err());
    }

    #[test]
    fn test_utf8_rejects_invalid_bytes() {
        assert!(Charset::Utf8.decode(&[0xFF, 0xFE]).is_err());
    }
}
