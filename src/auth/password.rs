//! Password hashing and verification.
//!
//! PBKDF2-HMAC-SHA512 with a random per-account salt. The salt and the
//! iteration count travel with the digest so old records stay verifiable
//! after the default cost changes.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;

const SCHEME: &str = "pbkdf2-sha512";
const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 64;
const DEFAULT_ITERATIONS: u32 = 210_000;

/// Salted one-way hasher for account credentials.
///
/// Stateless apart from the configured cost; safe to share via `Arc`.
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl PasswordHasher {
    /// Hasher with a custom iteration count. Tests use a low count to stay fast.
    pub fn with_iterations(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// Output format: `pbkdf2-sha512$<iterations>$<salt hex>$<digest hex>`.
    pub fn hash(&self, plaintext: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let digest = derive(plaintext, &salt, self.iterations);
        format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            hex::encode(salt),
            hex::encode(digest)
        )
    }

    /// Check a candidate password against a stored digest.
    ///
    /// Malformed stored values verify as false rather than erroring; the
    /// digest comparison is constant-time.
    pub fn verify(&self, plaintext: &str, stored: &str) -> bool {
        let mut parts = stored.split('$');
        let (scheme, iterations, salt_hex, digest_hex) = match (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) {
            (Some(s), Some(i), Some(salt), Some(digest), None) => (s, i, salt, digest),
            _ => return false,
        };

        if scheme != SCHEME {
            return false;
        }
        let iterations: u32 = match iterations.parse() {
            Ok(n) if n > 0 => n,
            _ => return false,
        };
        let salt = match hex::decode(salt_hex) {
            Ok(s) => s,
            Err(_) => return false,
        };
        let expected = match hex::decode(digest_hex) {
            Ok(d) => d,
            Err(_) => return false,
        };

        let candidate = derive(plaintext, &salt, iterations);
        constant_time_eq(&candidate, &expected)
    }
}

fn derive(plaintext: &str, salt: &[u8], iterations: u32) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    pbkdf2_hmac::<Sha512>(plaintext.as_bytes(), salt, iterations, &mut out);
    out
}

/// Constant-time comparison to prevent timing side channels.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
