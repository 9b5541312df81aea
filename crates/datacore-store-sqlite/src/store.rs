// crates/datacore-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Cache Store
// Description: Durable CacheStore backed by SQLite WAL.
// Purpose: Persist last-known payloads where complication renderers can read.
// Dependencies: datacore-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`CacheStore`] using `SQLite`. One row per
//! cache key holds the raw payload bytes, their encoding tag, and the write
//! time; a meta table holds the global `lastUpdated` refresh mark.
//!
//! The app opens the store read-write; complication renderers open the same
//! file with [`SqliteCacheStore::open_read_only`]. An incompatible schema is
//! wiped and re-created on read-write open, and read as empty on read-only
//! open, so the cache degrades to "absent" instead of failing.

// ============================================================================//
// SECTION: Imports
// ============================================================================//

use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use datacore_core::CacheError;
use datacore_core::CacheKey;
use datacore_core::CacheStore;
use datacore_core::CachedItem;
use datacore_core::EncodingTag;
use datacore_core::REFRESH_MARK_KEY;
use datacore_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================//
// SECTION: Constants
// ============================================================================//

/// `SQLite` schema version for the cache.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum payload size accepted for one cache entry.
pub const MAX_ENTRY_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================//
// SECTION: Config
// ============================================================================//

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode; lets renderers read while the app writes.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    Full,
    /// Normal synchronous mode; durable enough for a rebuildable cache.
    #[default]
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` cache store.
#[derive(Debug, Clone)]
pub struct SqliteCacheConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    pub sync_mode: SqliteSyncMode,
}

impl SqliteCacheConfig {
    /// Creates a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

// ============================================================================//
// SECTION: Errors
// ============================================================================//

/// `SQLite` cache errors.
#[derive(Debug, Error)]
pub enum SqliteCacheError {
    /// Store I/O error.
    #[error("sqlite cache io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite cache db error: {0}")]
    Db(String),
    /// Stored data is corrupted.
    #[error("sqlite cache corruption: {0}")]
    Corrupt(String),
    /// Invalid store input.
    #[error("sqlite cache invalid data: {0}")]
    Invalid(String),
    /// Payload exceeded the entry size limit.
    #[error("sqlite cache payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
    /// Write attempted through a read-only handle.
    #[error("sqlite cache opened read-only")]
    ReadOnly,
}

impl From<SqliteCacheError> for CacheError {
    fn from(error: SqliteCacheError) -> Self {
        match error {
            SqliteCacheError::Io(message) => Self::Io(message),
            SqliteCacheError::Db(message) => Self::Store(message),
            SqliteCacheError::Corrupt(message) => Self::Corrupt(message),
            SqliteCacheError::Invalid(message) => Self::Store(message),
            SqliteCacheError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Store(format!(
                "cache entry exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
            SqliteCacheError::ReadOnly => Self::ReadOnly,
        }
    }
}

// ============================================================================//
// SECTION: Store
// ============================================================================//

/// Outcome of schema initialization on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    /// A new cache was created.
    Created,
    /// An existing compatible cache was opened.
    Opened,
    /// An incompatible cache was wiped and re-created.
    Reset,
    /// The file holds an incompatible or missing schema; reads return nothing.
    Incompatible,
}

/// `SQLite`-backed cache store with WAL support.
#[derive(Clone)]
pub struct SqliteCacheStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
    /// Whether this handle may write.
    writable: bool,
    /// Schema status observed at open.
    status: SchemaStatus,
}

impl SqliteCacheStore {
    /// Opens the cache read-write, creating the file and schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteCacheError`] when the database cannot be opened or
    /// initialized.
    pub fn open(config: &SqliteCacheConfig) -> Result<Self, SqliteCacheError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let mut connection = Connection::open_with_flags(&config.path, flags)
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        apply_pragmas(&connection, config)?;
        let status = initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            writable: true,
            status,
        })
    }

    /// Opens an existing cache without write access.
    ///
    /// Complication renderers use this handle; it never creates or migrates
    /// the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteCacheError`] when the file does not exist or cannot be
    /// opened.
    pub fn open_read_only(path: &Path) -> Result<Self, SqliteCacheError> {
        validate_store_path(path)?;
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let connection = Connection::open_with_flags(path, flags)
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        connection
            .busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        let status = if read_schema_version(&connection)? == Some(SCHEMA_VERSION) {
            SchemaStatus::Opened
        } else {
            SchemaStatus::Incompatible
        };
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            writable: false,
            status,
        })
    }

    /// Returns the schema status observed when the store was opened.
    #[must_use]
    pub const fn schema_status(&self) -> SchemaStatus {
        self.status
    }

    /// Returns whether this handle may write.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.writable
    }

    /// Returns true when reads should behave as an empty cache.
    const fn reads_disabled(&self) -> bool {
        matches!(self.status, SchemaStatus::Incompatible)
    }

    /// Fails writes through read-only handles.
    const fn ensure_writable(&self) -> Result<(), SqliteCacheError> {
        if self.writable { Ok(()) } else { Err(SqliteCacheError::ReadOnly) }
    }

    /// Acquires the connection lock.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteCacheError> {
        self.connection.lock().map_err(|_| SqliteCacheError::Db("mutex poisoned".to_string()))
    }

    /// Loads one entry.
    fn load_entry(&self, key: CacheKey) -> Result<Option<CachedItem>, SqliteCacheError> {
        if self.reads_disabled() {
            return Ok(None);
        }
        let row = {
            let guard = self.lock()?;
            let metadata: Option<(i64, String, i64)> = guard
                .query_row(
                    "SELECT length(bytes), encoding, written_at FROM cache_entries WHERE key = ?1",
                    params![key.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
                .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
            let Some((length, encoding, written_at)) = metadata else {
                return Ok(None);
            };
            let length = usize::try_from(length).map_err(|_| {
                SqliteCacheError::Corrupt(format!("negative entry length for {key}"))
            })?;
            if length > MAX_ENTRY_BYTES {
                return Ok(None);
            }
            let Some(encoding) = EncodingTag::parse(&encoding) else {
                return Ok(None);
            };
            let bytes: Vec<u8> = guard
                .query_row(
                    "SELECT bytes FROM cache_entries WHERE key = ?1",
                    params![key.as_str()],
                    |row| row.get(0),
                )
                .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
            drop(guard);
            CachedItem {
                bytes,
                encoding,
                written_at: Timestamp::from_unix_millis(written_at),
            }
        };
        Ok(Some(row))
    }

    /// Replaces one entry.
    fn store_entry(
        &self,
        key: CacheKey,
        bytes: &[u8],
        written_at: Timestamp,
    ) -> Result<(), SqliteCacheError> {
        self.ensure_writable()?;
        if bytes.len() > MAX_ENTRY_BYTES {
            return Err(SqliteCacheError::TooLarge {
                max_bytes: MAX_ENTRY_BYTES,
                actual_bytes: bytes.len(),
            });
        }
        self.lock()?
            .execute(
                "INSERT INTO cache_entries (key, bytes, encoding, written_at) VALUES (?1, ?2, ?3, \
                 ?4) ON CONFLICT(key) DO UPDATE SET bytes = excluded.bytes, encoding = \
                 excluded.encoding, written_at = excluded.written_at",
                params![
                    key.as_str(),
                    bytes,
                    EncodingTag::Json.as_str(),
                    written_at.as_unix_millis()
                ],
            )
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        Ok(())
    }

    /// Removes one entry.
    fn remove_entry(&self, key: CacheKey) -> Result<(), SqliteCacheError> {
        self.ensure_writable()?;
        self.lock()?
            .execute("DELETE FROM cache_entries WHERE key = ?1", params![key.as_str()])
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        Ok(())
    }

    /// Reads the refresh mark.
    fn load_refresh_mark(&self) -> Result<Option<Timestamp>, SqliteCacheError> {
        if self.reads_disabled() {
            return Ok(None);
        }
        let guard = self.lock()?;
        let value = read_meta(&guard, REFRESH_MARK_KEY)?;
        drop(guard);
        Ok(value.and_then(|text| i64::from_str(&text).ok()).map(Timestamp::from_unix_millis))
    }

    /// Advances the refresh mark inside one transaction.
    fn store_refresh_mark(&self, mark: Timestamp) -> Result<(), SqliteCacheError> {
        self.ensure_writable()?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        let current = read_meta(&tx, REFRESH_MARK_KEY)?.and_then(|text| i64::from_str(&text).ok());
        if current.is_none_or(|current| current < mark.as_unix_millis()) {
            tx.execute(
                "INSERT INTO cache_meta (name, value) VALUES (?1, ?2) ON CONFLICT(name) DO UPDATE \
                 SET value = excluded.value",
                params![REFRESH_MARK_KEY, mark.as_unix_millis().to_string()],
            )
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        }
        tx.commit().map_err(|err| SqliteCacheError::Db(err.to_string()))?;
        drop(guard);
        Ok(())
    }
}

impl CacheStore for SqliteCacheStore {
    fn get(&self, key: CacheKey) -> Result<Option<CachedItem>, CacheError> {
        self.load_entry(key).map_err(CacheError::from)
    }

    fn put(&self, key: CacheKey, bytes: &[u8], written_at: Timestamp) -> Result<(), CacheError> {
        self.store_entry(key, bytes, written_at).map_err(CacheError::from)
    }

    fn clear(&self, key: CacheKey) -> Result<(), CacheError> {
        self.remove_entry(key).map_err(CacheError::from)
    }

    fn refresh_mark(&self) -> Result<Option<Timestamp>, CacheError> {
        self.load_refresh_mark().map_err(CacheError::from)
    }

    fn set_refresh_mark(&self, mark: Timestamp) -> Result<(), CacheError> {
        self.store_refresh_mark(mark).map_err(CacheError::from)
    }
}

// ============================================================================//
// SECTION: Helpers
// ============================================================================//

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteCacheError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteCacheError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteCacheError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteCacheError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteCacheError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteCacheError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteCacheError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Applies `SQLite` pragmas for a writable handle.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteCacheConfig,
) -> Result<(), SqliteCacheError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    Ok(())
}

/// Reads the stored schema version, if the meta table exists.
fn read_schema_version(connection: &Connection) -> Result<Option<i64>, SqliteCacheError> {
    let table: Option<String> = connection
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'store_meta'",
            params![],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    if table.is_none() {
        return Ok(None);
    }
    connection
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteCacheError::Db(err.to_string()))
}

/// Reads one value from the meta table.
fn read_meta(connection: &Connection, name: &str) -> Result<Option<String>, SqliteCacheError> {
    connection
        .query_row("SELECT value FROM cache_meta WHERE name = ?1", params![name], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteCacheError::Db(err.to_string()))
}

/// Initializes the schema, resetting it when the version is incompatible.
fn initialize_schema(connection: &mut Connection) -> Result<SchemaStatus, SqliteCacheError> {
    let tx = connection.transaction().map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    let status = match version {
        None => SchemaStatus::Created,
        Some(value) if value == SCHEMA_VERSION => SchemaStatus::Opened,
        Some(_) => {
            tx.execute_batch(
                "DROP TABLE IF EXISTS cache_entries;
                DROP TABLE IF EXISTS cache_meta;
                DELETE FROM store_meta;",
            )
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
            SchemaStatus::Reset
        }
    };
    if status != SchemaStatus::Opened {
        tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
            .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    }
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS cache_entries (
            key TEXT PRIMARY KEY,
            bytes BLOB NOT NULL,
            encoding TEXT NOT NULL,
            written_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS cache_meta (
            name TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )
    .map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    tx.commit().map_err(|err| SqliteCacheError::Db(err.to_string()))?;
    Ok(status)
}
