//! Authenticated access to the payment portal
//!
//! Handles the CSRF-protected login handshake and the extraction of the
//! balance-card token from the post-login account page.

mod client;
pub mod markup;

pub use client::{PortalClient, PortalSession};
pub use markup::TokenRule;

use crate::error::{Error, Result};
use std::fmt;

/// Portal account credentials
///
/// Held in memory for the duration of a single run and never persisted.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials, rejecting empty fields.
    pub fn new(username: &str, password: &str) -> Result<Self> {
        if username.trim().is_empty() {
            return Err(Error::Validation("username must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(Error::Validation("password must not be empty".to_string()));
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// The account username.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

const MAX_TOKEN_LEN: usize = 256;

/// Balance-card token extracted from the account page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardToken(String);

impl CardToken {
    /// Validate and wrap a raw token string.
    ///
    /// Surrounding whitespace is trimmed; the remainder must be non-empty and
    /// restricted to the portal's token alphabet.
    pub fn parse(raw: &str) -> Result<Self> {
        let token = raw.trim();
        if token.is_empty() {
            return Err(Error::Parse("card token is empty".to_string()));
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(Error::Parse(format!(
                "card token exceeds {MAX_TOKEN_LEN} bytes"
            )));
        }
        let valid = token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b':' | b'/' | b'+' | b'=' | b'-'));
        if !valid {
            return Err(Error::Parse(
                "card token contains unexpected characters".to_string(),
            ));
        }
        Ok(Self(token.to_string()))
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_reject_empty_fields() {
        assert!(matches!(
            Credentials::new("", "secret"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            Credentials::new("alice", ""),
            Err(Error::Validation(_))
        ));
        assert!(Credentials::new("alice", "secret").is_ok());
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let credentials = Credentials::new("alice", "hunter2").unwrap();
        let debug = format!("{credentials:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn card_token_accepts_portal_alphabet() {
        let token = CardToken::parse("  CARD-0042.xyz/7  ").unwrap();
        assert_eq!(token.as_str(), "CARD-0042.xyz/7");
        assert_eq!(token.to_string(), "CARD-0042.xyz/7");
    }

    #[test]
    fn card_token_rejects_empty_input() {
        assert!(matches!(CardToken::parse("   "), Err(Error::Parse(_))));
    }

    #[test]
    fn card_token_rejects_markup_fragments() {
        assert!(matches!(
            CardToken::parse("<span>123</span>"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn card_token_rejects_oversized_input() {
        let raw = "a".repeat(MAX_TOKEN_LEN + 1);
        assert!(matches!(CardToken::parse(&raw), Err(Error::Parse(_))));
    }
}
