use serde::Deserialize;
use std::fmt;
use zeroize::Zeroizing;

/// Shared signing secret, wiped from memory on drop
#[derive(Clone, Default, Deserialize)]
#[serde(from = "String")]
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Generate a random 32-byte secret, base64 encoded
    pub fn random() -> Self {
        use base64::Engine;
        use rand::Rng;
        let bytes = Zeroizing::new(rand::thread_rng().gen::<[u8; 32]>());
        Self::new(base64::engine::general_purpose::STANDARD.encode(bytes.as_ref()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}
