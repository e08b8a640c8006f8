//! Fingerprint - keyed digest standing in for a raw identity
//!
//! HMAC-SHA256 over [`Identity::digest_input`] with the operator secret,
//! hex encoded. Used as the cache key and as the only identity reference
//! written to the audit log.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::identity::Identity;

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded fingerprint
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// A 64-character lowercase hex HMAC-SHA256 digest.
///
/// # Example
/// ```
/// use guardscreen_core::{Fingerprint, Identity};
///
/// let identity = Identity::new("Jane Public", "1990-04-01", "1234");
/// let a = Fingerprint::compute("secret", &identity).unwrap();
/// let b = Fingerprint::compute("secret", &identity).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of `identity` under `secret`
    pub fn compute(secret: &str, identity: &Identity) -> CoreResult<Self> {
        if secret.is_empty() {
            return Err(CoreError::EmptySecret);
        }

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| CoreError::InvalidFingerprint(e.to_string()))?;
        mac.update(identity.digest_input().as_bytes());

        Ok(Self(hex::encode(mac.finalize().into_bytes())))
    }

    /// Parse a hex fingerprint produced elsewhere (e.g. by a client)
    pub fn from_hex(value: &str) -> CoreResult<Self> {
        if value.len() != FINGERPRINT_HEX_LEN {
            return Err(CoreError::InvalidFingerprint(format!(
                "expected {} hex chars, got {}",
                FINGERPRINT_HEX_LEN,
                value.len()
            )));
        }
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidFingerprint(
                "non-hex character in fingerprint".to_string(),
            ));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.0
    }
}
