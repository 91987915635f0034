//! Email addresses as the portal's forms accept them.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why an address was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email is required")]
    Blank,

    #[error("email is longer than {} characters", Email::MAX_LENGTH)]
    TooLong,

    #[error("email must look like name@domain.tld")]
    Malformed,
}

/// A trimmed, lowercased address of the form `name@domain.tld`.
///
/// The gateway keys credentials by address without regard to case, so
/// `Ada@Example.edu` and `ada@example.edu` name the same account. Parsing
/// normalizes to the lowercase form before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Normalize and check a submitted address.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Blank` for empty or whitespace-only input,
    /// `EmailError::TooLong` past [`Self::MAX_LENGTH`], and
    /// `EmailError::Malformed` for anything that is not `name@domain.tld`.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let address = input.trim().to_lowercase();

        if address.is_empty() {
            return Err(EmailError::Blank);
        }
        if address.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong);
        }
        if !is_well_formed(&address) {
            return Err(EmailError::Malformed);
        }

        Ok(Self(address))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// One `@`, a non-empty name, and a dotted domain with no empty labels.
fn is_well_formed(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((name, domain)) = address.split_once('@') else {
        return false;
    };

    !name.is_empty()
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty() && !label.contains('@'))
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}
