//! hmac-url - tamper-evident URLs
//!
//! Signs a set of named fields with a shared secret and appends the MAC to a
//! URL; verifies such URLs later, optionally enforcing a time-to-live.

pub mod error;
pub mod models;
pub mod services;

pub use error::{ConfigError, ExpiryReason, FieldError, HmacError, SignError};
pub use models::{Charset, FieldMap, FieldValue, HmacAlgorithm, HmacConfig, SigningProfile};
pub use services::{HmacService, SignedUrl};
