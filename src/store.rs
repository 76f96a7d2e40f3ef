//! The operator's store of issued codes, kept in SQLite.
//!
//! The validator never reads this store; `export` produces the list that is
//! copied into the validator's configuration.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rusqlite::params;
use std::path::Path;
use thiserror::Error;

use crate::db::{init_db, init_pool, SqlitePool};
use crate::expiry::format_instant;
use crate::models::access_code::{AccessCode, CodeStatus, StoredCode};

/// Letters and digits, without the easily confused `0 O 1 I L`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 6;
const MAX_ATTEMPTS: usize = 16;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Code \"{0}\" not found")]
    NotFound(String),

    #[error("Name must not be empty")]
    EmptyName,

    #[error("could not find an unused code after {0} attempts")]
    Exhausted(usize),

    #[error("expiry out of range")]
    ExpiryOutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub remaining: usize,
}

pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub struct CodeStore {
    pool: SqlitePool,
}

impl CodeStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let pool = init_pool(path)?;
        init_db(&pool)?;
        Ok(CodeStore { pool })
    }

    /// Issue a new code for `name`, valid for `lifetime` from `now`.
    pub fn add(&self, name: &str, lifetime: Duration, now: DateTime<Utc>) -> Result<StoredCode, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        let expires = now
            .checked_add_signed(lifetime)
            .map(format_instant)
            .ok_or(StoreError::ExpiryOutOfRange)?;
        let created = format_instant(now);

        let conn = self.pool.get()?;
        let mut rng = rand::thread_rng();
        for _ in 0..MAX_ATTEMPTS {
            let code = generate_code(&mut rng);
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO access_codes (code, name, expires, created) VALUES (?1, ?2, ?3, ?4)",
                params![code, name, expires, created],
            )?;
            if inserted == 1 {
                log::debug!("issued code {code} for {name}");
                return Ok(StoredCode {
                    id: conn.last_insert_rowid(),
                    code,
                    name: name.to_string(),
                    expires,
                    created,
                });
            }
            log::debug!("generated code {code} already taken, retrying");
        }
        Err(StoreError::Exhausted(MAX_ATTEMPTS))
    }

    pub fn list(&self) -> Result<Vec<StoredCode>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, code, name, expires, created FROM access_codes ORDER BY id")?;
        let codes = stmt
            .query_map([], |row| {
                Ok(StoredCode {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    name: row.get(2)?,
                    expires: row.get(3)?,
                    created: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(codes)
    }

    /// Remove a code, matched case-insensitively. Returns the normalized code.
    pub fn revoke(&self, code: &str) -> Result<String, StoreError> {
        let normalized = code.trim().to_uppercase();
        let conn = self.pool.get()?;
        let rows_affected = conn.execute(
            "DELETE FROM access_codes WHERE UPPER(code) = ?1",
            params![normalized],
        )?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(normalized));
        }
        Ok(normalized)
    }

    /// Drop every code that is no longer valid at `now`, including codes
    /// whose expiry cannot be read.
    pub fn cleanup(&self, now: DateTime<Utc>) -> Result<CleanupReport, StoreError> {
        let codes = self.list()?;
        let expired: Vec<i64> = codes
            .iter()
            .filter(|c| c.status(now) == CodeStatus::Expired)
            .map(|c| c.id)
            .collect();

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        for id in &expired {
            tx.execute("DELETE FROM access_codes WHERE id = ?1", params![id])?;
        }
        tx.commit()?;

        Ok(CleanupReport {
            removed: expired.len(),
            remaining: codes.len() - expired.len(),
        })
    }

    /// The current codes in the shape the validator reads.
    pub fn export(&self) -> Result<Vec<AccessCode>, StoreError> {
        Ok(self.list()?.into_iter().map(AccessCode::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{check, Verdict};
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, CodeStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = CodeStore::open(dir.path().join("codes.db")).expect("store opens");
        (dir, store)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_code_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)), "{code}");
        }
    }

    #[test]
    fn test_add_and_list() {
        let (_dir, store) = setup_store();
        let created = store.add("Jane Smith", Duration::days(7), now()).expect("add");
        assert_eq!(created.name, "Jane Smith");
        assert_eq!(created.expires, "2026-03-15T00:00:00.000Z");
        assert_eq!(created.created, "2026-03-08T00:00:00.000Z");

        let listed = store.list().expect("list");
        assert_eq!(listed, vec![created]);
    }

    #[test]
    fn test_add_rejects_empty_name() {
        let (_dir, store) = setup_store();
        assert!(matches!(
            store.add("  ", Duration::days(1), now()),
            Err(StoreError::EmptyName)
        ));
    }

    #[test]
    fn test_revoke_is_case_insensitive() {
        let (_dir, store) = setup_store();
        let created = store.add("Recruiter Inc", Duration::hours(48), now()).expect("add");
        let revoked = store.revoke(&created.code.to_lowercase()).expect("revoke");
        assert_eq!(revoked, created.code);
        assert!(store.list().expect("list").is_empty());

        assert!(matches!(store.revoke(&created.code), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_cleanup_removes_expired() {
        let (_dir, store) = setup_store();
        let old = store.add("Old", Duration::hours(1), now()).expect("add");
        let fresh = store.add("Fresh", Duration::days(30), now()).expect("add");

        let later = now() + Duration::hours(1);
        let report = store.cleanup(later).expect("cleanup");
        assert_eq!(report, CleanupReport { removed: 1, remaining: 1 });

        let codes: Vec<String> = store.list().expect("list").into_iter().map(|c| c.code).collect();
        assert_eq!(codes, vec![fresh.code]);
        assert!(!codes.contains(&old.code));
    }

    #[test]
    fn test_export_feeds_validator() {
        let (_dir, store) = setup_store();
        let created = store.add("Conference Lead", Duration::days(7), now()).expect("add");
        let exported = store.export().expect("export");
        let json = serde_json::to_string(&exported).expect("serializes");
        assert!(!json.contains("created"));

        let parsed: Vec<AccessCode> = serde_json::from_str(&json).expect("round trip");
        match check(&created.code, &parsed, "salt", now()) {
            Verdict::Granted(grant) => assert_eq!(grant.name, "Conference Lead"),
            other => panic!("expected grant, got {other:?}"),
        }
    }
}
