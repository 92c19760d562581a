//! Webhook secret validation.
//!
//! Implements constant-time comparison to mitigate timing attacks.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::config::GithubConfig;

type HmacSha1 = Hmac<Sha1>;

pub const SECRET_VALIDATOR_SHA1: &str = "SHA-1";
pub const SECRET_VALIDATOR_URL_APPEND: &str = "URL_APPEND";
pub const SECRET_VALIDATOR_PLAIN_TEXT: &str = "PLAIN_TEXT";

/// How the webhook proves it knows the shared secret.
#[derive(Debug, Clone, PartialEq)]
pub enum SecretValidatorMode {
    /// `sha1=<hex>` HMAC of the raw body in a header
    Sha1,
    /// Secret as the last path segment of the callback URL
    UrlAppend,
    /// Secret verbatim in a header
    PlainText,
    /// Anything else; never validates
    Unsupported(String),
}

impl SecretValidatorMode {
    pub fn parse(name: &str) -> Self {
        match name {
            SECRET_VALIDATOR_SHA1 => SecretValidatorMode::Sha1,
            SECRET_VALIDATOR_URL_APPEND => SecretValidatorMode::UrlAppend,
            SECRET_VALIDATOR_PLAIN_TEXT => SecretValidatorMode::PlainText,
            other => SecretValidatorMode::Unsupported(other.to_string()),
        }
    }
}

/// Validates inbound release webhooks against the configured secret.
#[derive(Debug, Clone)]
pub struct WebhookSecretValidator {
    mode: SecretValidatorMode,
    secret: String,
    header: String,
}

impl WebhookSecretValidator {
    pub fn new(mode: SecretValidatorMode, secret: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            mode,
            secret: secret.into(),
            header: header.into(),
        }
    }

    pub fn from_config(config: &GithubConfig) -> Self {
        Self::new(
            SecretValidatorMode::parse(&config.secret_validator),
            config.webhook_secret.clone(),
            config.secret_header.clone(),
        )
    }

    /// Check a webhook request. `path_secret` is the trailing `{secret}` segment
    /// of the callback URL. Fails closed on every unexpected input.
    pub fn validate(&self, headers: &HeaderMap, path_secret: Option<&str>, body: &[u8]) -> bool {
        tracing::debug!("Validating webhook secret with mode {:?}", self.mode);

        if self.secret.is_empty() {
            tracing::error!("No webhook secret configured, rejecting webhook");
            return false;
        }

        match &self.mode {
            SecretValidatorMode::Sha1 => {
                let Some(signature) = self.header_value(headers) else {
                    return false;
                };
                let Some(hex_digest) = signature.strip_prefix("sha1=") else {
                    return false;
                };
                let Ok(expected) = hmac_sha1_hex(&self.secret, body) else {
                    return false;
                };
                constant_time_compare(hex_digest, &expected)
            }
            SecretValidatorMode::UrlAppend => {
                path_secret.is_some_and(|s| constant_time_compare(s, &self.secret))
            }
            SecretValidatorMode::PlainText => self
                .header_value(headers)
                .is_some_and(|v| constant_time_compare(v, &self.secret)),
            SecretValidatorMode::Unsupported(name) => {
                tracing::error!("Unsupported secret validator: {}", name);
                false
            }
        }
    }

    fn header_value<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers.get(self.header.as_str()).and_then(|v| v.to_str().ok())
    }
}

/// Hex-encoded HMAC-SHA1 of `body` keyed with `secret`.
pub fn hmac_sha1_hex(secret: &str, body: &[u8]) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // Constant-time comparison
    a_bytes.ct_eq(b_bytes).into()
}
