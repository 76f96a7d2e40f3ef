use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use crate::store::StoreError;

pub type SqlitePool = Pool<SqliteConnectionManager>;

pub fn init_pool(path: impl AsRef<Path>) -> Result<SqlitePool, StoreError> {
    let manager = SqliteConnectionManager::file(path);
    Ok(Pool::builder().max_size(1).build(manager)?)
}

pub fn init_db(pool: &SqlitePool) -> Result<(), StoreError> {
    let conn = pool.get()?;
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS access_codes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            expires TEXT NOT NULL,
            created TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}
