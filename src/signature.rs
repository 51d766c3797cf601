//! Signed-header codec for gateway webhooks.
//!
//! Pure functions: no I/O and no clock access except where the caller
//! leaves the timestamp to [`build_header`]. The header format is
//! `t=<unix_seconds>,v1=<hex_hmac_sha256>[,v1=...]`; multiple `v1` entries
//! carry concurrently valid signatures during secret rotation.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Longest `v1` value accepted during parsing, in characters.
///
/// Oversized values are dropped rather than failing the whole header, so
/// an attacker cannot invalidate a legitimate co-present signature by
/// padding the header.
pub const MAX_SIGNATURE_LENGTH: usize = 256;

/// A parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeader {
    /// Unix seconds at which the sender signed the payload.
    pub timestamp: i64,
    /// Candidate signatures (lowercase hex), in order of appearance.
    pub signatures: Vec<String>,
}

/// Raw HMAC-SHA256 digest over `"{timestamp}.{payload}"`.
pub(crate) fn digest(secret: &str, timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(signed_payload.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Compute the signature for a payload at a given timestamp.
///
/// Returns the lowercase hex HMAC-SHA256 digest (64 characters) over the
/// string `"{timestamp}.{payload}"`. Payload bytes are normalized to UTF-8
/// text lossily, so a byte slice and a string with the same content sign
/// identically.
pub fn sign(secret: &str, timestamp: i64, payload: impl AsRef<[u8]>) -> String {
    hex::encode(digest(secret, timestamp, payload.as_ref()))
}

/// Build a complete signature header for an outbound payload.
///
/// With `timestamp = None` the current unix time is used. Mostly useful
/// for tests and for emitting gateway-compatible callbacks of your own.
pub fn build_header(secret: &str, payload: impl AsRef<[u8]>, timestamp: Option<i64>) -> String {
    let timestamp = timestamp.unwrap_or_else(unix_now);
    let signature = sign(secret, timestamp, payload);
    format!("t={timestamp},v1={signature}")
}

/// Parse a signature header into its timestamp and candidate signatures.
///
/// Segments are comma-separated `key=value` pairs with whitespace tolerated
/// around keys and values. A repeated `t` keeps the last occurrence; every
/// `v1` is collected in order (secret rotation); unknown keys and segments
/// without `=` are ignored. A `v1` longer than [`MAX_SIGNATURE_LENGTH`]
/// is dropped without failing the header.
///
/// Returns `None` when no timestamp was found, the timestamp is not an
/// integer, or no usable signature remains. Never panics.
pub fn parse_header(header: &str) -> Option<SignedHeader> {
    let mut timestamp_raw: Option<&str> = None;
    let mut signatures = Vec::new();

    for segment in header.split(',') {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };

        match (key.trim(), value.trim()) {
            ("t", value) => timestamp_raw = Some(value),
            ("v1", value) => {
                if value.len() <= MAX_SIGNATURE_LENGTH {
                    signatures.push(value.to_string());
                }
            }
            _ => {} // Ignore other schemes
        }
    }

    let timestamp = timestamp_raw?.parse::<i64>().ok()?;
    if signatures.is_empty() {
        return None;
    }

    Some(SignedHeader {
        timestamp,
        signatures,
    })
}

/// Current unix time in seconds.
pub(crate) fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"id":"evt_1"}"#;
    const TS: i64 = 1_700_000_000;

    #[test]
    fn test_sign_is_deterministic_hex() {
        let a = sign(SECRET, TS, BODY);
        let b = sign(SECRET, TS, BODY);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_sign_sensitive_to_every_input() {
        let base = sign(SECRET, TS, BODY);
        assert_ne!(base, sign("whsec_other", TS, BODY));
        assert_ne!(base, sign(SECRET, TS + 1, BODY));
        assert_ne!(base, sign(SECRET, TS, br#"{"id":"evt_2"}"#));
    }

    #[test]
    fn test_sign_str_and_bytes_agree() {
        assert_eq!(sign(SECRET, TS, BODY), sign(SECRET, TS, r#"{"id":"evt_1"}"#));
    }

    #[test]
    fn test_build_header_embeds_timestamp_and_signature() {
        let header = build_header(SECRET, BODY, Some(TS));
        assert_eq!(header, format!("t={},v1={}", TS, sign(SECRET, TS, BODY)));
    }

    #[test]
    fn test_build_header_defaults_to_now() {
        let before = unix_now();
        let header = build_header(SECRET, BODY, None);
        let parsed = parse_header(&header).unwrap();
        assert!(parsed.timestamp >= before);
        assert!(parsed.timestamp <= unix_now());
    }

    #[test]
    fn test_parse_header_roundtrip() {
        let parsed = parse_header(&build_header(SECRET, BODY, Some(TS))).unwrap();
        assert_eq!(parsed.timestamp, TS);
        assert_eq!(parsed.signatures, vec![sign(SECRET, TS, BODY)]);
    }

    #[test]
    fn test_parse_header_trims_whitespace() {
        let parsed = parse_header(" t = 1700000000 , v1 = abc123 ").unwrap();
        assert_eq!(parsed.timestamp, 1_700_000_000);
        assert_eq!(parsed.signatures, vec!["abc123"]);
    }

    #[test]
    fn test_parse_header_last_timestamp_wins() {
        let parsed = parse_header("t=1,v1=aa,t=2").unwrap();
        assert_eq!(parsed.timestamp, 2);
    }

    #[test]
    fn test_parse_header_collects_all_signatures_in_order() {
        let parsed = parse_header("t=1700000000,v1=aaaa,v1=bbbb,v1=cccc").unwrap();
        assert_eq!(parsed.signatures, vec!["aaaa", "bbbb", "cccc"]);
    }

    #[test]
    fn test_parse_header_ignores_unknown_keys_and_loose_segments() {
        let parsed = parse_header("t=1700000000,v0=old,v1=aaaa,scheme=hmac,garbage").unwrap();
        assert_eq!(parsed.signatures, vec!["aaaa"]);
    }

    #[test]
    fn test_parse_header_rejects_malformed() {
        assert_eq!(parse_header(""), None);
        assert_eq!(parse_header("v1=aaaa"), None); // no timestamp
        assert_eq!(parse_header("t=1700000000"), None); // no signature
        assert_eq!(parse_header("t=notanumber,v1=aaaa"), None);
        assert_eq!(parse_header("t=1.5,v1=aaaa"), None);
    }

    #[test]
    fn test_parse_header_drops_oversized_signature_keeps_valid_one() {
        let oversized = "a".repeat(MAX_SIGNATURE_LENGTH + 1);
        let parsed = parse_header(&format!("t=1700000000,v1={oversized},v1=bbbb")).unwrap();
        assert_eq!(parsed.signatures, vec!["bbbb"]);

        // With only the oversized entry the header no longer parses.
        assert_eq!(parse_header(&format!("t=1700000000,v1={oversized}")), None);
    }

    #[test]
    fn test_parse_header_accepts_boundary_length_signature() {
        let exact = "a".repeat(MAX_SIGNATURE_LENGTH);
        let parsed = parse_header(&format!("t=1700000000,v1={exact}")).unwrap();
        assert_eq!(parsed.signatures.len(), 1);
    }
}
