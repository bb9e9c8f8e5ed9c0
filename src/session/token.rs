//! Display-only decoding of the session token's claims.
//!
//! The access token is a compact three-segment structure; the middle
//! segment, base64-decoded, is a JSON object carrying at least `role`.
//! No signature verification happens here — the decoded role is a UI
//! label, never an input to an access-control decision (the backend
//! enforces access on every request).

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;

/// Extract the `role` claim from an access token.
pub fn role_claim(token: &str) -> Result<String> {
    let payload = claims(token)?;
    payload
        .get("role")
        .and_then(Value::as_str)
        .map(str::to_string)
        .context("token payload carries no role claim")
}

/// Decode the token's middle segment as a JSON claims object.
pub fn claims(token: &str) -> Result<Value> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        anyhow::bail!("token is not a three-segment compact structure");
    }

    let bytes = decode_segment(segments[1])?;
    serde_json::from_slice(&bytes).context("token payload is not valid JSON")
}

/// Base64-decode one token segment.
///
/// Tokens use the URL-safe alphabet without padding, but padded and
/// standard-alphabet payloads are accepted too.
fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    let trimmed = segment.trim_end_matches('=');
    general_purpose::URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(trimmed))
        .context("token payload is not valid base64")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

    fn fake_token(payload: &str) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode("signature")
        )
    }

    #[test]
    fn role_claim_extracts_role() {
        let token = fake_token(r#"{"sub":"u1","role":"admin"}"#);
        assert_eq!(role_claim(&token).unwrap(), "admin");
    }

    #[test]
    fn role_claim_accepts_padded_standard_base64() {
        use base64::engine::general_purpose::STANDARD;
        let token = format!(
            "header.{}.sig",
            STANDARD.encode(r#"{"role":"viewer"}"#)
        );
        assert_eq!(role_claim(&token).unwrap(), "viewer");
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(claims("only-one-segment").is_err());
        assert!(claims("two.segments").is_err());
        assert!(claims("a.b.c.d").is_err());
    }

    #[test]
    fn rejects_missing_role() {
        let token = fake_token(r#"{"sub":"u1"}"#);
        assert!(role_claim(&token).is_err());
    }

    #[test]
    fn rejects_non_json_payload() {
        let token = fake_token("not json");
        assert!(claims(&token).is_err());
    }

    #[test]
    fn rejects_garbage_base64() {
        assert!(claims("a.!!!.c").is_err());
    }
}
