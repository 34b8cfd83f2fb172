//! SQLite-backed typed preference store.
//!
//! One table, `prefs(key TEXT PRIMARY KEY, value TEXT)`. Every scalar is
//! stored through its string encoding; typed getters parse on the way out
//! and fall back to the caller's default when the key is absent or the
//! stored text does not parse. Reads never fail.

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Well-known preference keys, kept in one place.
pub mod keys {
    pub const IS_LOGGED_IN: &str = "is_logged_in";
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const IS_USER_DETAILS_PRESENT: &str = "is_user_detail_present";

    // User details
    pub const USER_ID: &str = "user_id";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const IS_ALUMNUS: &str = "is_alumnus";
    pub const IS_ADMIN: &str = "is_admin";
    pub const ADMISSION_YEAR: &str = "admission_year";
    pub const DEPT_NAME: &str = "department_name";
    pub const EMAIL: &str = "email_address";
    pub const UNIV_ROLL: &str = "univ_roll";
    pub const PASSOUT_YEAR: &str = "passout_year";
    pub const GCM_REG_ID: &str = "gcm_reg_id";
    pub const IS_VERIFIED: &str = "is_verified";
    pub const URL: &str = "url";
    pub const GOOGLE_SUB: &str = "google_sub";
    pub const CURRENT_SEM: &str = "current_semester";
}

const UPSERT_SQL: &str = "INSERT INTO prefs (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value";

/// A single deferred mutation inside a batch edit.
enum BatchOp {
    Put(String, String),
    Remove(String),
    Clear,
}

/// Durable typed key-value preference store.
pub struct PrefsStore {
    conn: Mutex<Connection>,
    batch_open: AtomicBool,
}

impl PrefsStore {
    /// Open (or create) the preference database at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)?;

        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prefs (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            batch_open: AtomicBool::new(false),
        })
    }

    // ── Typed getters ───────────────────────────────────────────────

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get_raw(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_i32(&self, key: &str, default: i32) -> i32 {
        self.get_parsed(key, default)
    }

    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.get_parsed(key, default)
    }

    pub fn get_f32(&self, key: &str, default: f32) -> f32 {
        self.get_parsed(key, default)
    }

    /// f64 values round-trip through their string encoding; a stored value
    /// that does not parse back yields the caller's default.
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get_parsed(key, default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_parsed(key, default)
    }

    // ── Typed setters (immediate) ───────────────────────────────────

    pub fn put_string(&self, key: &str, val: &str) -> Result<()> {
        self.put_raw(key, val)
    }

    pub fn put_i32(&self, key: &str, val: i32) -> Result<()> {
        self.put_raw(key, &val.to_string())
    }

    pub fn put_i64(&self, key: &str, val: i64) -> Result<()> {
        self.put_raw(key, &val.to_string())
    }

    pub fn put_f32(&self, key: &str, val: f32) -> Result<()> {
        self.put_raw(key, &val.to_string())
    }

    pub fn put_f64(&self, key: &str, val: f64) -> Result<()> {
        self.put_raw(key, &val.to_string())
    }

    pub fn put_bool(&self, key: &str, val: bool) -> Result<()> {
        self.put_raw(key, &val.to_string())
    }

    // ── Deletion ────────────────────────────────────────────────────

    /// Remove the given keys in one transaction.
    pub fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute("DELETE FROM prefs WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove every key.
    pub fn clear(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM prefs", [])?;
        Ok(())
    }

    // ── Batch edits ─────────────────────────────────────────────────

    /// Open a batch edit. Writes issued on the returned handle are not
    /// visible to readers until the batch flushes, in one transaction,
    /// on `commit()` or on drop.
    ///
    /// Only one batch may be open at a time; a second `batch()` call while
    /// one is live is an error rather than a silent lost update.
    pub fn batch(&self) -> Result<PrefsBatch<'_>> {
        if self.batch_open.swap(true, Ordering::AcqRel) {
            bail!("a preference batch edit is already open");
        }
        Ok(PrefsBatch {
            store: self,
            ops: Vec::new(),
            flushed: false,
        })
    }

    fn apply_ops(&self, ops: Vec<BatchOp>) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for op in ops {
            match op {
                BatchOp::Put(key, value) => {
                    tx.execute(UPSERT_SQL, params![key, value])?;
                }
                BatchOp::Remove(key) => {
                    tx.execute("DELETE FROM prefs WHERE key = ?1", params![key])?;
                }
                BatchOp::Clear => {
                    tx.execute("DELETE FROM prefs", [])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ── Raw access ──────────────────────────────────────────────────

    fn get_raw(&self, key: &str) -> Option<String> {
        let conn = self.conn.lock();
        match conn.query_row(
            "SELECT value FROM prefs WHERE key = ?1",
            params![key],
            |row| row.get(0),
        ) {
            Ok(value) => Some(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                tracing::warn!(key = key, "preference read failed: {e}");
                None
            }
        }
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(UPSERT_SQL, params![key, value])?;
        Ok(())
    }

    fn get_parsed<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        match self.get_raw(key) {
            Some(raw) => raw.parse().unwrap_or(default),
            None => default,
        }
    }
}

/// A scoped batch edit over a [`PrefsStore`].
///
/// Accumulates writes in memory and flushes them in one transaction when
/// committed or dropped, whichever comes first.
pub struct PrefsBatch<'a> {
    store: &'a PrefsStore,
    ops: Vec<BatchOp>,
    flushed: bool,
}

impl PrefsBatch<'_> {
    pub fn put_string(&mut self, key: &str, val: &str) -> &mut Self {
        self.push_put(key, val.to_string())
    }

    pub fn put_i32(&mut self, key: &str, val: i32) -> &mut Self {
        self.push_put(key, val.to_string())
    }

    pub fn put_i64(&mut self, key: &str, val: i64) -> &mut Self {
        self.push_put(key, val.to_string())
    }

    pub fn put_f32(&mut self, key: &str, val: f32) -> &mut Self {
        self.push_put(key, val.to_string())
    }

    pub fn put_f64(&mut self, key: &str, val: f64) -> &mut Self {
        self.push_put(key, val.to_string())
    }

    pub fn put_bool(&mut self, key: &str, val: bool) -> &mut Self {
        self.push_put(key, val.to_string())
    }

    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.ops.push(BatchOp::Remove(key.to_string()));
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        self.ops.push(BatchOp::Clear);
        self
    }

    /// Flush the batch now and surface any write error. Dropping the batch
    /// without calling this still flushes, but can only log failures.
    pub fn commit(mut self) -> Result<()> {
        self.flush()
    }

    fn push_put(&mut self, key: &str, value: String) -> &mut Self {
        self.ops.push(BatchOp::Put(key.to_string(), value));
        self
    }

    fn flush(&mut self) -> Result<()> {
        if self.flushed {
            return Ok(());
        }
        self.flushed = true;
        let ops = std::mem::take(&mut self.ops);
        let result = self.store.apply_ops(ops);
        self.store.batch_open.store(false, Ordering::Release);
        result
    }
}

impl Drop for PrefsBatch<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("preference batch flush on drop failed: {e}");
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
