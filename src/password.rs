//! Password strength checks and bcrypt hashing.
//!
//! A raw password becomes a [ValidatedPassword] once it passes the strength
//! check, and only a [ValidatedPassword] can be turned into a [PasswordHash].

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use serde::{Deserialize, Serialize};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A plaintext password that is strong enough to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password`.
    ///
    /// `user_inputs` are the other values on the same form (name, email and
    /// so on). Passwords built from them score lower.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with a suggestion for a stronger password if
    /// the zxcvbn score is below three.
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        let entropy = zxcvbn(raw_password, user_inputs);

        if matches!(entropy.score(), Score::Three | Score::Four) {
            return Ok(Self(raw_password.to_owned()));
        }

        let feedback = entropy.feedback().cloned().unwrap_or_else(Feedback::default);

        Err(Error::TooWeak(feedback.to_string()))
    }

    /// Wrap `raw_password` without checking its strength.
    ///
    /// Only meant for tests and for passwords that were checked elsewhere.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A salted bcrypt hash of a password, as stored in the `user` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used for stored passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with the given bcrypt `cost`.
    ///
    /// Tests use a cost of 4 to keep them fast.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Whether `raw_password` hashes to this hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod password_hash_tests {
    use crate::password::{PasswordHash, ValidatedPassword};

    #[test]
    fn verify_accepts_matching_password() {
        let hash = PasswordHash::new(ValidatedPassword::new_unchecked("okon"), 4).unwrap();

        assert!(hash.verify("okon").unwrap());
    }

    #[test]
    fn verify_rejects_other_password() {
        let hash = PasswordHash::new(ValidatedPassword::new_unchecked("okon"), 4).unwrap();

        assert!(!hash.verify("okno").unwrap());
    }

    #[test]
    fn same_password_gets_a_new_salt() {
        let password = ValidatedPassword::new_unchecked("turkeysgogobblegobble");

        let first = PasswordHash::new(password.clone(), 4).unwrap();
        let second = PasswordHash::new(password, 4).unwrap();

        assert_ne!(first, second);
    }
}
