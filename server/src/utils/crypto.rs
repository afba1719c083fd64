//! Cryptographic helpers: random keys, entity hashes and constant-time comparison

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::core::constants::HASH_RANDOM_BYTES;

/// Generate a cryptographically secure random key
pub fn generate_key(len: usize) -> Vec<u8> {
    let mut key = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut key);
    key
}

/// Generate a random URL-safe token of `byte_len` random bytes
pub fn generate_token(byte_len: usize) -> String {
    URL_SAFE_NO_PAD.encode(generate_key(byte_len))
}

/// Generate an entity ID: SHA-256 of fresh random bytes, URL-safe base64 without padding
///
/// Always 43 characters long.
pub fn generate_hash() -> String {
    let digest = Sha256::digest(generate_key(HASH_RANDOM_BYTES));
    URL_SAFE_NO_PAD.encode(digest)
}

/// Constant-time string comparison
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Decode a hex string (either case) to bytes
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s).context("Invalid hex string")
}

/// Encode bytes as lowercase hex
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// SHA-256 of a string as lowercase hex
pub fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_hash_shape() {
        let hash = generate_hash();
        assert_eq!(hash.len(), 43);
        assert!(
            hash.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(hash, generate_hash());
    }

    #[test]
    fn test_generate_token_is_url_safe() {
        let token = generate_token(16);
        assert!(!token.contains('+') && !token.contains('/') && !token.contains('='));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("state-123", "state-123"));
        assert!(!constant_time_eq("state-123", "state-124"));
        assert!(!constant_time_eq("short", "longer"));
    }

    #[test]
    fn test_hex_helpers() {
        let key = generate_key(32);
        assert_eq!(decode_hex(&encode_hex(&key)).unwrap(), key);
        assert_eq!(decode_hex("ABff").unwrap(), vec![0xab, 0xff]);
        assert!(decode_hex("abc").is_err());
        assert!(decode_hex("zz").is_err());
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
