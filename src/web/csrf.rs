//! CSRF tokens for the HTML forms.
//!
//! A token is `base64url(nonce || issued_at || tag)` where `tag` is an
//! HMAC-SHA256 over the nonce and the big-endian issue time in seconds.
//! Tokens are stateless and expire after [`CSRF_TOKEN_MAX_AGE_SECS`].

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{DocvaultError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime.
pub const CSRF_TOKEN_MAX_AGE_SECS: i64 = 3600;

/// Name of the hidden form field.
pub const CSRF_FIELD: &str = "csrf_token";

const NONCE_LEN: usize = 16;
const TIMESTAMP_LEN: usize = 8;
const TAG_LEN: usize = 32;
const PAYLOAD_LEN: usize = NONCE_LEN + TIMESTAMP_LEN;

/// Issues and verifies CSRF tokens.
#[derive(Clone)]
pub struct CsrfProtector {
    mac: HmacSha256,
    max_age_secs: i64,
}

impl CsrfProtector {
    /// Create a protector from a secret.
    ///
    /// An empty secret selects a random per-process key, so tokens do not
    /// survive a restart.
    pub fn new(secret: &str) -> Result<Self> {
        let key: Vec<u8> = if secret.is_empty() {
            tracing::info!("No CSRF secret configured, using a random per-process key");
            rand::random::<[u8; 32]>().to_vec()
        } else {
            secret.as_bytes().to_vec()
        };

        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| DocvaultError::Config(format!("invalid CSRF secret: {e}")))?;

        Ok(Self {
            mac,
            max_age_secs: CSRF_TOKEN_MAX_AGE_SECS,
        })
    }

    /// Issue a fresh token.
    pub fn issue(&self) -> String {
        self.issue_at(Utc::now().timestamp())
    }

    /// Verify a token.
    pub fn verify(&self, token: &str) -> bool {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn issue_at(&self, issued_at: i64) -> String {
        let nonce: [u8; NONCE_LEN] = rand::random();

        let mut buf = Vec::with_capacity(PAYLOAD_LEN + TAG_LEN);
        buf.extend_from_slice(&nonce);
        buf.extend_from_slice(&issued_at.to_be_bytes());

        let mut mac = self.mac.clone();
        mac.update(&buf);
        buf.extend_from_slice(&mac.finalize().into_bytes());

        URL_SAFE_NO_PAD.encode(buf)
    }

    fn verify_at(&self, token: &str, now: i64) -> bool {
        let Ok(raw) = URL_SAFE_NO_PAD.decode(token.trim()) else {
            return false;
        };
        if raw.len() != PAYLOAD_LEN + TAG_LEN {
            return false;
        }
        let (payload, tag) = raw.split_at(PAYLOAD_LEN);

        let mut mac = self.mac.clone();
        mac.update(payload);
        if mac.verify_slice(tag).is_err() {
            return false;
        }

        let mut ts = [0u8; TIMESTAMP_LEN];
        ts.copy_from_slice(&payload[NONCE_LEN..]);
        let age = now - i64::from_be_bytes(ts);

        (0..=self.max_age_secs).contains(&age)
    }
}

impl std::fmt::Debug for CsrfProtector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfProtector")
            .field("max_age_secs", &self.max_age_secs)
            .finish_non_exhaustive()
    }
}
