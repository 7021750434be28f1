//! Ed25519 request authentication.
//!
//! Every inbound webhook is signed by the platform over
//! `timestamp || body`. [`SignatureVerifier`] recomputes that message and
//! checks it against the application's public key. Verification fails closed:
//! a missing header, an undecodable signature, a stale timestamp, or a bad
//! signature all produce the same [`CoreError::Unauthenticated`], and the body
//! is never interpreted before this check passes.

use std::time::Duration;

use ed25519_dalek::{Signature, VerifyingKey};
use tracing::debug;

use crate::error::CoreError;

/// Header carrying the hex-encoded Ed25519 signature.
pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";

/// Header carrying the signing timestamp (unix seconds).
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Verifies signed interaction requests against a pre-loaded public key.
///
/// # Examples
///
/// ```
/// use chime_core::SignatureVerifier;
///
/// let hex_key = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";
/// let verifier = SignatureVerifier::from_hex(hex_key).unwrap();
///
/// // Missing headers fail closed.
/// assert!(verifier.verify(None, None, b"{}").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
    tolerance: Option<Duration>,
}

impl SignatureVerifier {
    /// Creates a verifier for the given key with no freshness window.
    pub fn new(key: VerifyingKey) -> Self {
        Self {
            key,
            tolerance: None,
        }
    }

    /// Creates a verifier from the hex-encoded public key shown in the
    /// platform's developer portal.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidKey` if the value is not 32 hex-encoded
    /// bytes forming a valid Ed25519 point.
    pub fn from_hex(public_key: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| CoreError::InvalidKey(format!("not hex: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidKey("expected 32 bytes".into()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;
        Ok(Self::new(key))
    }

    /// Rejects requests whose timestamp differs from the local clock by more
    /// than `tolerance`. A zero tolerance disables the check.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = (!tolerance.is_zero()).then_some(tolerance);
        self
    }

    /// Verifies a request against the current wall clock.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Unauthenticated` on any failure.
    pub fn verify(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> Result<(), CoreError> {
        self.verify_at(signature, timestamp, body, chrono::Utc::now().timestamp())
    }

    /// Verifies a request as if the local clock read `now` (unix seconds).
    ///
    /// The freshness window is checked before any cryptographic work.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Unauthenticated` on any failure.
    pub fn verify_at(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> Result<(), CoreError> {
        let signature = signature.ok_or(CoreError::Unauthenticated("missing signature"))?;
        let timestamp = timestamp.ok_or(CoreError::Unauthenticated("missing timestamp"))?;

        if let Some(tolerance) = self.tolerance {
            let sent: i64 = timestamp
                .trim()
                .parse()
                .map_err(|_| CoreError::Unauthenticated("invalid timestamp"))?;
            let skew = now.abs_diff(sent);
            if skew > tolerance.as_secs() {
                debug!(skew, "Rejecting request outside freshness window");
                return Err(CoreError::Unauthenticated("stale timestamp"));
            }
        }

        let sig_bytes: [u8; 64] = hex::decode(signature.trim())
            .ok()
            .and_then(|b| b.try_into().ok())
            .ok_or(CoreError::Unauthenticated("malformed signature"))?;
        let signature = Signature::from_bytes(&sig_bytes);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify_strict(&message, &signature)
            .map_err(|_| CoreError::Unauthenticated("bad signature"))
    }
}
