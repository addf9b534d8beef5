//! One-shot notices carried across a redirect in a signed cookie
//!
//! Cookie value: `base64url(message).hex(HMAC-SHA256(secret, base64url(message)))`.

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Cookie holding the pending notice
pub const FLASH_COOKIE: &str = "medrag_flash";

/// Signs and verifies flash cookies with the session secret
#[derive(Clone)]
pub struct FlashKey {
    mac: HmacSha256,
}

impl FlashKey {
    /// Create a key from the session secret
    pub fn new(secret: &str) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid session secret: {}", e)))?;
        Ok(Self { mac })
    }

    /// `Set-Cookie` value carrying `message`
    pub fn set_cookie(&self, message: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            FLASH_COOKIE,
            self.sign(message)
        )
    }

    /// `Set-Cookie` value removing the notice
    pub fn clear_cookie() -> String {
        format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", FLASH_COOKIE)
    }

    /// Signed token for `message`
    pub fn sign(&self, message: &str) -> String {
        let payload = URL_SAFE_NO_PAD.encode(message.as_bytes());
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        format!("{}.{}", payload, hex::encode(mac.finalize().into_bytes()))
    }

    /// Message inside a token, if the signature holds
    pub fn verify(&self, token: &str) -> Option<String> {
        let (payload, signature) = token.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            tracing::debug!("Discarding flash cookie with a bad signature");
            return None;
        }
        let message = URL_SAFE_NO_PAD.decode(payload).ok()?;
        String::from_utf8(message).ok()
    }

    /// Verified notice from the request cookies
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == FLASH_COOKIE)
            .and_then(|(_, token)| self.verify(token))
    }
}
