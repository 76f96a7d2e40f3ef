//! Access-code validation.
//!
//! A pure function of the submitted code, the configured code list and the
//! current time. The list is parsed on every call; nothing is cached.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::access_code::AccessCode;
use crate::token::ConfirmationToken;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configured code list is not a JSON list of codes: {0}")]
    MalformedCodes(#[from] serde_json::Error),
}

/// Why a submitted code was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NoCode,
    UnknownCode,
    Expired,
}

impl Denial {
    pub fn message(&self) -> &'static str {
        match self {
            Denial::NoCode => "No code provided",
            Denial::UnknownCode => "Invalid access code",
            Denial::Expired => "This code has expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub name: String,
    pub expires: String,
    pub token: ConfirmationToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Granted(Grant),
    Denied(Denial),
}

/// Parse the configured code list. A missing or blank list is an empty one.
pub fn parse_codes(raw: Option<&str>) -> Result<Vec<AccessCode>, ConfigError> {
    match raw.filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(Vec::new()),
    }
}

/// Trim and upper-case a submitted code; `None` when nothing usable remains.
pub fn normalize(submitted: Option<&str>) -> Option<String> {
    let trimmed = submitted?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Check a submitted code against the raw configured list.
///
/// The submitted value is checked before the configuration is parsed, so an
/// empty submission is reported as such even when the list is broken.
pub fn validate(
    submitted: Option<&str>,
    raw_codes: Option<&str>,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<Verdict, ConfigError> {
    let Some(normalized) = normalize(submitted) else {
        return Ok(Verdict::Denied(Denial::NoCode));
    };
    let codes = parse_codes(raw_codes)?;
    Ok(check(&normalized, &codes, secret, now))
}

/// Look up an already normalized code. First match in list order wins.
pub fn check(normalized: &str, codes: &[AccessCode], secret: &str, now: DateTime<Utc>) -> Verdict {
    let Some(found) = codes.iter().find(|c| c.matches(normalized)) else {
        return Verdict::Denied(Denial::UnknownCode);
    };

    if !found.is_active_at(now) {
        return Verdict::Denied(Denial::Expired);
    }

    Verdict::Granted(Grant {
        name: found.display_name().to_string(),
        expires: found.expires.clone(),
        token: ConfirmationToken::issue(normalized, &found.expires, secret),
    })
}
