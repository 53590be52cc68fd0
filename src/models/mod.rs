pub mod algorithm;
pub mod config;
pub mod field;
pub mod secret;

pub use algorithm::{Charset, HmacAlgorithm};
pub use config::{HmacConfig, SigningProfile};
pub use field::{
    format_timestamp, parse_timestamp, ExceptedFields, FieldMap, FieldValue, ReservedField,
    FIELD_HMAC, FIELD_HMAC_TIMESTAMP, FIELD_HMAC_TTL, TIMESTAMP_FORMAT, TTL_ONE_DAY,
};
pub use secret::SecretKey;
