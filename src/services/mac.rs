use base64::Engine;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::SignError;
use crate::models::{Charset, HmacAlgorithm, SecretKey};

type HmacMd5 = Hmac<Md5>;
type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

fn digest<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>, SignError> {
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|_| SignError::InvalidKey)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Compute the MAC of `message` and return it base64 encoded.
///
/// Both the secret and the message are encoded with `charset` before hashing.
pub fn sign(
    secret: &SecretKey,
    charset: Charset,
    algorithm: HmacAlgorithm,
    message: &str,
) -> Result<String, SignError> {
    if secret.is_empty() {
        return Err(SignError::InvalidKey);
    }
    let key = Zeroizing::new(charset.encode(secret.expose())?.into_owned());
    let message = charset.encode(message)?;

    let raw = match algorithm {
        HmacAlgorithm::HmacMd5 => digest::<HmacMd5>(&key, &message)?,
        HmacAlgorithm::HmacSha1 => digest::<HmacSha1>(&key, &message)?,
        HmacAlgorithm::HmacSha256 => digest::<HmacSha256>(&key, &message)?,
    };

    Ok(base64::engine::general_purpose::STANDARD.encode(raw))
}

/// Recompute the MAC of `message` and compare it with `candidate`
pub fn verify(
    candidate: &str,
    secret: &SecretKey,
    charset: Charset,
    algorithm: HmacAlgorithm,
    message: &str,
) -> Result<bool, SignError> {
    let expected = sign(secret, charset, algorithm, message)?;
    Ok(constant_time_eq(candidate, &expected))
}

/// Exact comparison that does not short-circuit on the first differing byte
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
