//! services/api/src/web/cookies.rs
//!
//! Signed session cookies.
//!
//! The cookie carries the session token together with an HMAC-SHA256 tag so a
//! forged or altered token is rejected before the session store is consulted:
//!
//! ```text
//! session=<token>.<hex(HMAC-SHA256(secret, token))>
//! ```

use axum::http::{header, HeaderMap};
use cardio_core::ports::{PortError, PortResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "session";

#[derive(Clone)]
pub struct SessionCookies {
    secret_key: Vec<u8>,
}

impl SessionCookies {
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
        }
    }

    fn tag(&self, token: &str) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret_key)
            .expect("HMAC can take key of any size");
        mac.update(token.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// The signed cookie value for `token`.
    pub fn sign(&self, token: &str) -> String {
        format!("{}.{}", token, hex::encode(self.tag(token)))
    }

    /// Returns the token if the signature matches.
    pub fn verify(&self, value: &str) -> Option<String> {
        let (token, signature) = value.rsplit_once('.')?;
        let provided = hex::decode(signature).ok()?;
        let expected = self.tag(token);
        if provided.len() == expected.len() && bool::from(provided.as_slice().ct_eq(expected.as_slice())) {
            Some(token.to_string())
        } else {
            None
        }
    }

    /// Reads and verifies the session cookie from request headers.
    pub fn token_from_headers(&self, headers: &HeaderMap) -> PortResult<String> {
        let value = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .find_map(|c| c.trim().strip_prefix("session="))
            .ok_or(PortError::Unauthorized)?;

        self.verify(value).ok_or_else(|| {
            debug!("Rejected session cookie with invalid signature");
            PortError::Unauthorized
        })
    }

    pub fn set_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/",
            SESSION_COOKIE,
            self.sign(token)
        )
    }

    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
            SESSION_COOKIE
        )
    }
}
