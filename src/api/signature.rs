//! Webhook Signature Verification (Standard Webhooks / Svix)
//!
//! ```text
//! signed content = "{webhook-id}.{webhook-timestamp}.{raw body}"
//! signature      = base64(HMAC-SHA256(secret, signed content))
//! header         = "v1,<sig> v1,<sig2> ..."   (any match passes)
//! ```
//!
//! `svix-*` header names are accepted as aliases.

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::WEBHOOK_TOLERANCE_SECS;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";

/// HMAC key holder for inbound webhook verification
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: u64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    /// `secret` is `whsec_<base64>`; the prefix is optional
    pub fn new(secret: &str) -> AppResult<Self> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = BASE64
            .decode(encoded)
            .map_err(|e| AppError::invalid_config(format!("WEBHOOK_SECRET is not base64: {}", e)))?;
        if key.is_empty() {
            return Err(AppError::invalid_config("WEBHOOK_SECRET is empty"));
        }
        Ok(Self {
            key,
            tolerance_secs: WEBHOOK_TOLERANCE_SECS,
        })
    }

    /// Verify against request headers at the current time
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> AppResult<()> {
        self.verify_at(headers, body, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, headers: &HeaderMap, body: &[u8], now: i64) -> AppResult<()> {
        let id = header(headers, "webhook-id", "svix-id")?;
        let timestamp = header(headers, "webhook-timestamp", "svix-timestamp")?;
        let signatures = header(headers, "webhook-signature", "svix-signature")?;

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| AppError::invalid_signature("Malformed webhook timestamp"))?;
        let skew = now.abs_diff(ts);
        if skew > self.tolerance_secs {
            return Err(AppError::invalid_signature(format!(
                "Webhook timestamp outside tolerance ({}s skew)",
                skew
            )));
        }

        let mac = self.mac(id, timestamp, body)?;
        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == "v1")
            .filter_map(|(_, sig)| BASE64.decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            Err(AppError::invalid_signature("No matching webhook signature"))
        }
    }

    /// Raw HMAC over the signed content
    pub fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> AppResult<Vec<u8>> {
        Ok(self.mac(id, timestamp, body)?.finalize().into_bytes().to_vec())
    }

    /// `v1,<base64>` header value for outbound use and tests
    pub fn signature_header(&self, id: &str, timestamp: &str, body: &[u8]) -> AppResult<String> {
        Ok(format!("v1,{}", BASE64.encode(self.sign(id, timestamp, body)?)))
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::invalid_config(format!("Unusable webhook key: {}", e)))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str, alias: &str) -> AppResult<&'a str> {
    headers
        .get(name)
        .or_else(|| headers.get(alias))
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::invalid_signature(format!("Missing {} header", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    // Standard Webhooks reference vector
    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
    const MSG_ID: &str = "msg_p5jXN8AQM9LWM0D4loKWxJek";
    const TIMESTAMP: i64 = 1614265330;
    const BODY: &[u8] = br#"{"test": 2432232314}"#;
    const EXPECTED: &str = "v1,g0hM9SsE+OTPJTGt/tmIKtSyZlE3uFJELVlNIOLJ1OE=";

    fn headers(id: &str, ts: i64, sig: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("webhook-id", HeaderValue::from_str(id).unwrap());
        h.insert("webhook-timestamp", HeaderValue::from_str(&ts.to_string()).unwrap());
        h.insert("webhook-signature", HeaderValue::from_str(sig).unwrap());
        h
    }

    #[test]
    fn test_reference_vector() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        assert_eq!(
            verifier.signature_header(MSG_ID, &TIMESTAMP.to_string(), BODY).unwrap(),
            EXPECTED
        );
        assert!(verifier
            .verify_at(&headers(MSG_ID, TIMESTAMP, EXPECTED), BODY, TIMESTAMP)
            .is_ok());
    }

    #[test]
    fn test_any_listed_signature_passes() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let sig = format!("v1,Zm9vYmFy {} v2,abc", EXPECTED);
        assert!(verifier
            .verify_at(&headers(MSG_ID, TIMESTAMP, &sig), BODY, TIMESTAMP + 10)
            .is_ok());
    }

    #[test]
    fn test_tampered_body_fails() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let err = verifier
            .verify_at(&headers(MSG_ID, TIMESTAMP, EXPECTED), b"{}", TIMESTAMP)
            .unwrap_err();
        assert_eq!(err.code_str(), "WEBHOOK_INVALID_SIGNATURE");
    }

    #[test]
    fn test_stale_timestamp_fails() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let res = verifier.verify_at(
            &headers(MSG_ID, TIMESTAMP, EXPECTED),
            BODY,
            TIMESTAMP + WEBHOOK_TOLERANCE_SECS as i64 + 1,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_extreme_timestamp_is_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let mut h = headers(MSG_ID, TIMESTAMP, EXPECTED);
        h.insert("webhook-timestamp", HeaderValue::from_static("-9223372036854775808"));
        let err = verifier.verify_at(&h, BODY, 1_700_000_000).unwrap_err();
        assert_eq!(err.code_str(), "WEBHOOK_INVALID_SIGNATURE");
        assert!(err.message.contains("outside tolerance"));

        h.insert("webhook-timestamp", HeaderValue::from_static("9223372036854775807"));
        assert!(verifier.verify_at(&h, BODY, i64::MIN).is_err());
    }

    #[test]
    fn test_truncated_signature_fails() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let short = &EXPECTED[..EXPECTED.len() - 8];
        assert!(verifier
            .verify_at(&headers(MSG_ID, TIMESTAMP, short), BODY, TIMESTAMP)
            .is_err());
    }

    #[test]
    fn test_svix_aliases_and_unprefixed_secret() {
        let verifier = WebhookVerifier::new(SECRET.trim_start_matches(SECRET_PREFIX)).unwrap();
        let mut h = HeaderMap::new();
        h.insert("svix-id", HeaderValue::from_static(MSG_ID));
        h.insert("svix-timestamp", HeaderValue::from_str(&TIMESTAMP.to_string()).unwrap());
        h.insert("svix-signature", HeaderValue::from_static(EXPECTED));
        assert!(verifier.verify_at(&h, BODY, TIMESTAMP).is_ok());
    }

    #[test]
    fn test_missing_headers_fail() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        assert!(verifier.verify_at(&HeaderMap::new(), BODY, TIMESTAMP).is_err());
    }

    #[test]
    fn test_invalid_secret_is_config_error() {
        let err = WebhookVerifier::new("whsec_!!!").unwrap_err();
        assert_eq!(err.code_str(), "CFG_INVALID_VALUE");
    }
}
