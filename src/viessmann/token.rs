//! Bearer token model
//!
//! The identity service issues JWT access tokens. Only the `exp` claim is
//! inspected; the signature is never verified because the token is opaque to
//! us and validated by the IoT service on every call.

use crate::error::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use std::fmt;

/// A token is usable only while its expiry lies this far in the future
pub const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<f64>,
}

/// Opaque bearer token as issued by the identity service
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Expiry instant taken from the unverified `exp` claim.
    ///
    /// `Ok(None)` means the token decoded but carries no usable expiry.
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<ExpiryClaims>(
            &self.0,
            &DecodingKey::from_secret(&[]),
            &validation,
        )?;

        Ok(data
            .claims
            .exp
            .filter(|exp| exp.is_finite())
            .and_then(|exp| DateTime::from_timestamp(exp.floor() as i64, 0)))
    }

    /// See [`is_valid`]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        is_valid(self, now)
    }
}

/// True iff the token decodes and expires more than [`EXPIRY_MARGIN_SECS`] after `now`
pub fn is_valid(token: &BearerToken, now: DateTime<Utc>) -> bool {
    match token.expires_at() {
        Ok(Some(expiry)) => expiry > now + chrono::Duration::seconds(EXPIRY_MARGIN_SECS),
        Ok(None) | Err(_) => false,
    }
}

// Keep tokens out of logs
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken(<{} chars>)", self.0.len())
    }
}
