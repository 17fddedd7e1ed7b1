use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 of the token keyed with the server secret. Only this value is
/// stored, so a leaked database does not yield usable tokens.
pub fn hash_token(secret: &str, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update([0u8]);
    hasher.update(token.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert_eq!(t1.len(), 43);
    }

    #[test]
    fn hash_token_is_deterministic() {
        assert_eq!(hash_token("k", "test"), hash_token("k", "test"));
        assert_eq!(hash_token("k", "test").len(), 64);
    }

    #[test]
    fn hash_token_depends_on_secret() {
        assert_ne!(hash_token("k1", "token"), hash_token("k2", "token"));
        assert_ne!(hash_token("k", "token-a"), hash_token("k", "token-b"));
    }
}
