//! Value encoding for CredHub `value` credentials
//!
//! CredHub stores values as JSON strings. Bytes that are valid UTF-8 are sent
//! as-is; anything else (and any text that itself starts with the marker) is
//! sent as `Base64:` followed by standard base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::store::{StoreError, StoreResult};

/// Marker prefix of base64-encoded values
pub const BASE64_PREFIX: &str = "Base64:";

/// Encode bytes as a JSON-safe string
pub fn encode_value(value: &[u8], force_base64: bool) -> String {
    if !force_base64 {
        if let Ok(text) = std::str::from_utf8(value) {
            if !text.starts_with(BASE64_PREFIX) {
                return text.to_string();
            }
        }
    }
    format!("{}{}", BASE64_PREFIX, STANDARD.encode(value))
}

/// Decode a string produced by `encode_value`
pub fn decode_value(encoded: &str) -> StoreResult<Vec<u8>> {
    match encoded.strip_prefix(BASE64_PREFIX) {
        Some(payload) => STANDARD
            .decode(payload)
            .map_err(|e| StoreError::Protocol(format!("invalid base64 value: {}", e))),
        None => Ok(encoded.as_bytes().to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINARY: [u8; 19] = [
        0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 80, 114, 122, 255, 121, 107, 108, 255,
    ];

    #[test]
    fn test_text_is_sent_raw() {
        assert_eq!(encode_value(b"string-value", false), "string-value");
        assert_eq!(encode_value(b"", false), "");
        assert_eq!(encode_value("zażółć".as_bytes(), false), "zażółć");
    }

    #[test]
    fn test_forced_base64() {
        assert_eq!(encode_value(b"string-value", true), "Base64:c3RyaW5nLXZhbHVl");
    }

    #[test]
    fn test_invalid_utf8_is_base64() {
        assert_eq!(encode_value(&BINARY, false), "Base64:AAECAwQFBgcICQpQcnr/eWts/w==");
    }

    #[test]
    fn test_marker_text_is_escaped() {
        assert_eq!(
            encode_value(b"Base64:string-value", false),
            "Base64:QmFzZTY0OnN0cmluZy12YWx1ZQ=="
        );
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode_value("string-value").unwrap(), b"string-value");
        assert_eq!(decode_value("Base64:AAECAwQFBgcICQpQcnr/eWts/w==").unwrap(), BINARY);
        assert_eq!(
            decode_value("Base64:QmFzZTY0OnN0cmluZy12YWx1ZQ==").unwrap(),
            b"Base64:string-value"
        );
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(matches!(decode_value("Base64:not base64!"), Err(StoreError::Protocol(_))));
    }

    #[test]
    fn test_round_trip_either_way() {
        let samples: [&[u8]; 5] = [b"", b"plain", b"Base64:", &BINARY, &[0xff]];
        for value in samples {
            assert_eq!(decode_value(&encode_value(value, false)).unwrap(), value);
            assert_eq!(decode_value(&encode_value(value, true)).unwrap(), value);
        }
    }
}
