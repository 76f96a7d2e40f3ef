//! Confirmation tokens handed out with a granted code.
//!
//! A token is Base64 of `CODE:expires:secret`. It is reversible and carries no
//! signature; it only stops a visitor from fabricating client-side state by
//! hand. Callers re-check `expires` on every use instead of trusting it.

use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationToken(String);

impl ConfirmationToken {
    /// Issue a token for an already normalized (trimmed, upper-cased) code.
    pub fn issue(code: &str, expires: &str, secret: &str) -> Self {
        let payload = format!("{code}:{expires}:{secret}");
        ConfirmationToken(Base64::encode_string(payload.as_bytes()))
    }

    /// Whether this token is the one that would be issued for these values.
    pub fn matches(&self, code: &str, expires: &str, secret: &str) -> bool {
        *self == Self::issue(&code.trim().to_uppercase(), expires, secret)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for ConfirmationToken {
    fn from(raw: String) -> Self {
        ConfirmationToken(raw)
    }
}

impl fmt::Display for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
