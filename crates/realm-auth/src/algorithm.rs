//! Password hashing algorithms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Algorithms a realm can hash new passwords with.
///
/// Salted digests are written in RFC 2307 form (`{SSHA512}base64(digest || salt)`),
/// Argon2id as a PHC string (`$argon2id$...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// Salted SHA-256.
    #[serde(rename = "SHA-256")]
    Sha256,
    /// Salted SHA-384.
    #[serde(rename = "SHA-384")]
    Sha384,
    /// Salted SHA-512.
    #[default]
    #[serde(rename = "SHA-512")]
    Sha512,
    /// Argon2id.
    #[serde(rename = "Argon2id")]
    Argon2id,
}

impl HashAlgorithm {
    /// Returns the canonical algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
            Self::Argon2id => "Argon2id",
        }
    }

    /// Returns the digest length in bytes for SHA variants.
    #[must_use]
    pub const fn output_len(self) -> Option<usize> {
        match self {
            Self::Sha256 => Some(32),
            Self::Sha384 => Some(48),
            Self::Sha512 => Some(64),
            Self::Argon2id => None,
        }
    }

    /// Returns the RFC 2307 scheme tag for salted SHA variants.
    #[must_use]
    pub const fn scheme(self) -> Option<&'static str> {
        match self {
            Self::Sha256 => Some("SSHA256"),
            Self::Sha384 => Some("SSHA384"),
            Self::Sha512 => Some("SSHA512"),
            Self::Argon2id => None,
        }
    }

    /// Resolves an RFC 2307 scheme tag (`SSHA512`, `SHA512`) to an algorithm and
    /// whether the digest is salted.
    #[must_use]
    pub fn from_scheme(scheme: &str) -> Option<(Self, bool)> {
        let upper = scheme.to_ascii_uppercase();
        let (salted, bare) = match upper.strip_prefix("SSHA") {
            Some(bits) => (true, bits),
            None => (false, upper.strip_prefix("SHA")?),
        };
        let algorithm = match bare {
            "256" => Self::Sha256,
            "384" => Self::Sha384,
            "512" => Self::Sha512,
            _ => return None,
        };
        Some((algorithm, salted))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            "argon2" | "argon2id" => Ok(Self::Argon2id),
            _ => Err(AuthError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}
