use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::expiry::parse_instant;

/// Label shown to a visitor whose code carries no name.
pub const DEFAULT_NAME: &str = "Guest";

/// One authorized entry, in the shape the validator reads from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessCode {
    pub code: String,
    #[serde(default, deserialize_with = "lenient_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    // missing or non-string expiries fail to parse later and count as expired
    #[serde(default, deserialize_with = "lenient_expires")]
    pub expires: String,
}

/// A name that is not a string is treated as absent.
fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(name) => Ok(Some(name)),
        _ => Ok(None),
    }
}

/// An expiry that is not a string becomes empty, which never parses.
fn lenient_expires<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(expires) => Ok(expires),
        _ => Ok(String::new()),
    }
}

impl AccessCode {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_NAME,
        }
    }

    pub fn matches(&self, normalized: &str) -> bool {
        self.code.to_uppercase() == normalized
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        parse_instant(&self.expires).is_some_and(|expires| expires > now)
    }
}

/// A code as kept in the management store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCode {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub expires: String,
    pub created: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeStatus {
    Active(DateTime<Utc>),
    Expired,
}

impl StoredCode {
    pub fn status(&self, now: DateTime<Utc>) -> CodeStatus {
        match parse_instant(&self.expires) {
            Some(expires) if expires > now => CodeStatus::Active(expires),
            _ => CodeStatus::Expired,
        }
    }
}

impl From<StoredCode> for AccessCode {
    fn from(stored: StoredCode) -> Self {
        AccessCode {
            code: stored.code,
            name: Some(stored.name),
            expires: stored.expires,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn code(name: Option<&str>, expires: &str) -> AccessCode {
        AccessCode {
            code: "Abc123".to_string(),
            name: name.map(str::to_string),
            expires: expires.to_string(),
        }
    }

    #[test]
    fn test_display_name_falls_back_to_guest() {
        assert_eq!(code(Some("Jane"), "").display_name(), "Jane");
        assert_eq!(code(Some(""), "").display_name(), "Guest");
        assert_eq!(code(None, "").display_name(), "Guest");
    }

    #[test]
    fn test_matches_ignores_stored_case() {
        assert!(code(None, "").matches("ABC123"));
        assert!(!code(None, "").matches("ABC124"));
    }

    #[test]
    fn test_missing_fields_deserialize() {
        let parsed: AccessCode = serde_json::from_str(r#"{"code":"X1","created":"ignored"}"#)
            .expect("valid record");
        assert_eq!(parsed.name, None);
        assert_eq!(parsed.expires, "");
        assert!(!parsed.is_active_at(Utc::now()));
    }

    #[test]
    fn test_non_string_fields_deserialize() {
        let parsed: Vec<AccessCode> = serde_json::from_str(
            r#"[{"code":"N1","name":null,"expires":null},{"code":"N2","name":7,"expires":1767225600000}]"#,
        )
        .expect("valid records");
        assert!(parsed.iter().all(|c| c.expires.is_empty() && c.name.is_none()));
        assert!(parsed.iter().all(|c| !c.is_active_at(Utc::now())));
    }

    #[test]
    fn test_stored_status() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut stored = StoredCode {
            id: 1,
            code: "ABC123".to_string(),
            name: "Jane".to_string(),
            expires: "2026-01-08T00:00:00.000Z".to_string(),
            created: "2026-01-01T00:00:00.000Z".to_string(),
        };
        assert!(matches!(stored.status(now), CodeStatus::Active(_)));

        stored.expires = "2026-01-01T00:00:00Z".to_string();
        assert_eq!(stored.status(now), CodeStatus::Expired);

        stored.expires = "soon".to_string();
        assert_eq!(stored.status(now), CodeStatus::Expired);
    }
}
