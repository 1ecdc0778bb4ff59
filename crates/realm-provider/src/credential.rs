//! Password checks and expiry.

use chrono::{DateTime, Utc};
use realm_auth::PasswordHasher;
use realm_model::{Record, RecordExt, Value};

use crate::config::RealmConfig;
use crate::error::{ProviderError, ProviderResult};

/// Credential policy of one realm.
pub struct Credentials<'a> {
    config: &'a RealmConfig,
    hasher: &'a dyn PasswordHasher,
}

impl<'a> Credentials<'a> {
    /// Creates a credential checker.
    #[must_use]
    pub const fn new(config: &'a RealmConfig, hasher: &'a dyn PasswordHasher) -> Self {
        Self { config, hasher }
    }

    /// Checks a candidate password against a user row.
    ///
    /// A user without a stored password, or with a digest that cannot be
    /// read, never matches.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Auth` if the hasher itself fails.
    pub fn matches(&self, user: &Record, password: &str) -> ProviderResult<bool> {
        let Some(stored) = user.text(self.config.password_column()) else {
            return Ok(false);
        };
        match self.hasher.matches(password, stored) {
            Ok(matched) => Ok(matched),
            Err(e) if e.is_unreadable_digest() => {
                tracing::warn!(error = %e, "stored password digest is unreadable");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Hashes a new password with the realm's algorithm.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Auth` if hashing fails.
    pub fn hash(&self, password: &str) -> ProviderResult<String> {
        Ok(self.hasher.hash(password, self.config.algorithm())?)
    }

    /// Returns true if the user's digest was made with another algorithm
    /// than the realm's.
    #[must_use]
    pub fn needs_rehash(&self, user: &Record) -> bool {
        user.text(self.config.password_column())
            .is_some_and(|stored| self.hasher.needs_rehash(stored, self.config.algorithm()))
    }

    /// Decides whether a user's password has expired as of `now`.
    ///
    /// Expiry compares calendar days: a password changed yesterday is one day old.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Config` if an expiry window is set without a
    /// password-changed column.
    pub fn password_expired_at(&self, user: &Record, now: DateTime<Utc>) -> ProviderResult<bool> {
        let Some(days) = self.config.password_expiry_days() else {
            return Ok(false);
        };
        let Some(column) = self.config.pwchanged_column() else {
            return Err(ProviderError::config(
                "password_expiry_days requires users_pwchanged_column",
            ));
        };
        let Some(changed) = user.value(column).and_then(Value::as_timestamp) else {
            return Ok(true);
        };

        let elapsed = (now.date_naive() - changed.date_naive()).num_days();
        Ok(elapsed > i64::from(days))
    }
}
