use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CryptoError;

/// Work factor for newly hashed passwords. Stored hashes carry their own
/// iteration count, so raising this does not invalidate existing accounts.
#[cfg(not(test))]
pub const PBKDF2_ITERATIONS: u32 = 600_000;
#[cfg(test)]
pub const PBKDF2_ITERATIONS: u32 = 1_000;

pub const SALT_LENGTH: usize = 16;
pub const HASH_LENGTH: usize = 32;
pub const MIN_PASSWORD_LENGTH: usize = 8;

const SCHEME: &str = "pbkdf2_sha256";

/// Hash a password as `pbkdf2_sha256$<iterations>$<salt>$<hash>`.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LENGTH] = rand::random();
    encode(password, &salt, PBKDF2_ITERATIONS)
}

fn encode(password: &str, salt: &[u8], iterations: u32) -> String {
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut hash);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Check `password` against a stored hash in constant time.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CryptoError> {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CryptoError::MalformedHash);
    };

    let iterations: u32 = iterations.parse().map_err(|_| CryptoError::MalformedHash)?;
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| CryptoError::MalformedHash)?;
    let expected = STANDARD_NO_PAD
        .decode(expected)
        .map_err(|_| CryptoError::MalformedHash)?;
    if iterations == 0 || expected.len() != HASH_LENGTH {
        return Err(CryptoError::MalformedHash);
    }

    let mut actual = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut actual);
    Ok(actual.ct_eq(&expected[..]).into())
}

pub fn validate_password_strength(password: &str) -> Result<(), CryptoError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CryptoError::WeakPassword(MIN_PASSWORD_LENGTH));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let stored = hash_password("correct horse");
        assert!(stored.starts_with("pbkdf2_sha256$1000$"));
        assert!(verify_password("correct horse", &stored).unwrap());
        assert!(!verify_password("wrong horse", &stored).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn iteration_count_read_from_hash() {
        let stored = encode("pw", b"fixed-salt-bytes", 7);
        assert!(verify_password("pw", &stored).unwrap());
    }

    #[test]
    fn malformed_hash_rejected() {
        for bad in ["", "bcrypt$12$abc", "pbkdf2_sha256$x$c2FsdA$aGFzaA", "pbkdf2_sha256$1$c2FsdA$aGFzaA"] {
            assert!(matches!(
                verify_password("pw", bad),
                Err(CryptoError::MalformedHash)
            ));
        }
    }

    #[test]
    fn short_password_is_weak() {
        assert!(validate_password_strength("1234567").is_err());
        assert!(validate_password_strength("12345678").is_ok());
    }
}
