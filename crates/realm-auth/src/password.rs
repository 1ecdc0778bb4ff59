//! Password hashing and verification.
//!
//! [`CryptPasswordHasher`] writes salted SHA-2 digests in RFC 2307 form or
//! Argon2id PHC strings, and verifies either. Stored values with no scheme
//! marker are legacy plaintext and are compared in constant time.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use aws_lc_rs::{constant_time, digest};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::Rng;

use crate::algorithm::HashAlgorithm;
use crate::error::{AuthError, AuthResult};

/// Password hashing collaborator used by realm providers.
pub trait PasswordHasher: Send + Sync {
    /// Hashes `password` with `algorithm`.
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::Hashing` if the underlying primitive fails.
    fn hash(&self, password: &str, algorithm: HashAlgorithm) -> AuthResult<String>;

    /// Checks `password` against a stored digest.
    ///
    /// Returns `Ok(false)` for a wrong password.
    ///
    /// ## Errors
    ///
    /// Returns `AuthError::MalformedHash` or `AuthError::UnsupportedAlgorithm`
    /// when the stored value cannot be interpreted.
    fn matches(&self, password: &str, stored: &str) -> AuthResult<bool>;

    /// Identifies the algorithm a stored digest was produced with.
    fn algorithm_of(&self, stored: &str) -> Option<HashAlgorithm>;

    /// Returns true if the stored digest should be replaced by one made with `algorithm`.
    fn needs_rehash(&self, stored: &str, algorithm: HashAlgorithm) -> bool {
        self.algorithm_of(stored) != Some(algorithm)
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: u32,
    /// Salt length in bytes for salted SHA digests.
    pub salt_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        // OWASP recommended settings for Argon2id
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
            salt_length: 4,
        }
    }
}

impl PasswordPolicy {
    /// Creates a new policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the time cost (iterations).
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    /// Sets the salt length for salted SHA digests.
    #[must_use]
    pub const fn salt_length(mut self, bytes: usize) -> Self {
        self.salt_length = bytes;
        self
    }

    #[allow(clippy::missing_const_for_fn)] // Params::new is not const
    fn build_params(&self) -> Result<Params, argon2::Error> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.hash_length as usize),
        )
    }
}

/// Default [`PasswordHasher`].
#[derive(Debug, Clone, Default)]
pub struct CryptPasswordHasher {
    policy: PasswordPolicy,
}

impl CryptPasswordHasher {
    /// Creates a hasher with the given policy.
    #[must_use]
    pub const fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    fn hash_argon2(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let params = self
            .policy
            .build_params()
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn hash_salted(&self, password: &str, algorithm: HashAlgorithm) -> AuthResult<String> {
        let scheme = algorithm
            .scheme()
            .ok_or_else(|| AuthError::UnsupportedAlgorithm(algorithm.to_string()))?;

        let mut salt = vec![0u8; self.policy.salt_length];
        rand::rng().fill(&mut salt[..]);

        let mut payload = sha_digest(algorithm, password.as_bytes(), &salt)?;
        payload.extend_from_slice(&salt);
        Ok(format!("{{{scheme}}}{}", STANDARD.encode(payload)))
    }

    fn matches_rfc2307(password: &str, stored: &str) -> AuthResult<bool> {
        let (scheme, encoded) = stored[1..]
            .split_once('}')
            .ok_or_else(|| AuthError::MalformedHash("unterminated scheme".to_string()))?;
        let (algorithm, salted) = HashAlgorithm::from_scheme(scheme)
            .ok_or_else(|| AuthError::UnsupportedAlgorithm(scheme.to_string()))?;
        let payload = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthError::MalformedHash(e.to_string()))?;

        let len = algorithm.output_len().unwrap_or_default();
        if payload.len() < len || (!salted && payload.len() != len) {
            return Err(AuthError::MalformedHash(format!(
                "{scheme} digest has wrong length"
            )));
        }
        let (expected, salt) = payload.split_at(len);
        let actual = sha_digest(algorithm, password.as_bytes(), salt)?;
        Ok(constant_time::verify_slices_are_equal(&actual, expected).is_ok())
    }

    fn matches_argon2(password: &str, stored: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(stored).map_err(|e| AuthError::MalformedHash(e.to_string()))?;

        // Argon2::default() can verify any Argon2 variant
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn sha_digest(algorithm: HashAlgorithm, password: &[u8], salt: &[u8]) -> AuthResult<Vec<u8>> {
    let alg = match algorithm {
        HashAlgorithm::Sha256 => &digest::SHA256,
        HashAlgorithm::Sha384 => &digest::SHA384,
        HashAlgorithm::Sha512 => &digest::SHA512,
        HashAlgorithm::Argon2id => {
            return Err(AuthError::UnsupportedAlgorithm(algorithm.to_string()));
        }
    };
    let mut ctx = digest::Context::new(alg);
    ctx.update(password);
    ctx.update(salt);
    Ok(ctx.finish().as_ref().to_vec())
}

impl PasswordHasher for CryptPasswordHasher {
    fn hash(&self, password: &str, algorithm: HashAlgorithm) -> AuthResult<String> {
        match algorithm {
            HashAlgorithm::Argon2id => self.hash_argon2(password),
            _ => self.hash_salted(password, algorithm),
        }
    }

    fn matches(&self, password: &str, stored: &str) -> AuthResult<bool> {
        if stored.starts_with("$argon2") {
            Self::matches_argon2(password, stored)
        } else if stored.starts_with('{') {
            Self::matches_rfc2307(password, stored)
        } else {
            Ok(constant_time::verify_slices_are_equal(password.as_bytes(), stored.as_bytes()).is_ok())
        }
    }

    fn algorithm_of(&self, stored: &str) -> Option<HashAlgorithm> {
        if stored.starts_with("$argon2id$") {
            return Some(HashAlgorithm::Argon2id);
        }
        let scheme = stored.strip_prefix('{')?.split_once('}')?.0;
        HashAlgorithm::from_scheme(scheme).map(|(algorithm, _)| algorithm)
    }

    fn needs_rehash(&self, stored: &str, algorithm: HashAlgorithm) -> bool {
        if self.algorithm_of(stored) != Some(algorithm) {
            return true;
        }
        if algorithm != HashAlgorithm::Argon2id {
            return false;
        }
        let Ok(parsed) = PasswordHash::new(stored) else {
            return true;
        };

        // params is a field, not a method
        let params = &parsed.params;
        params.get_decimal("m").unwrap_or(0) != self.policy.memory_cost
            || params.get_decimal("t").unwrap_or(0) != self.policy.time_cost
            || params.get_decimal("p").unwrap_or(0) != self.policy.parallelism
    }
}
