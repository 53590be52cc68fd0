pub mod canonical;
pub mod expiration;
pub mod hmac_service;
pub mod mac;
pub mod signed_url;
pub mod temporal;

pub use canonical::Delimiters;
pub use hmac_service::HmacService;
pub use signed_url::{SignedUrl, SignedUrlBuilder};
pub use temporal::{add_temporal_mark, add_temporal_mark_now, remove_temporal_mark, TemporalOffset};
