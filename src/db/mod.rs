/// Database layer for persistent storage.
/// Owns the lazily-established store connection and every read/write against
/// the admin credential, presale end date, progress bar and wallet address tables.

pub mod init;
pub mod models;

use chrono::{SecondsFormat, Utc};
use models::{AdminCredential, PresaleEnd, ProgressBarValue, WalletAddress};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

pub type DbPool = Arc<ConnectionManager>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(#[source] rusqlite::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

/// Where the store lives
#[derive(Debug, Clone, PartialEq)]
pub enum DbTarget {
    File(PathBuf),
    Memory,
}

/// Holds the single process-wide store connection.
///
/// The connection is opened on first use and memoized. A failed attempt leaves
/// the slot empty, so the next caller dials again.
pub struct ConnectionManager {
    target: DbTarget,
    conn: Mutex<Option<Connection>>,
}

impl ConnectionManager {
    pub fn new(target: DbTarget) -> Self {
        ConnectionManager {
            target,
            conn: Mutex::new(None),
        }
    }

    pub fn target(&self) -> &DbTarget {
        &self.target
    }

    /// Connect if no connection is held yet; no-op otherwise
    pub async fn ensure_connected(&self) -> StoreResult<()> {
        self.with_connection(|_| Ok(())).await
    }

    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Run `f` against the shared connection, dialing first if needed
    pub async fn with_connection<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let mut slot = self.conn.lock().await;
        let conn = match slot.take() {
            Some(conn) => conn,
            None => self.open()?,
        };
        let conn = slot.insert(conn);
        f(conn)
    }

    fn open(&self) -> StoreResult<Connection> {
        let conn = match &self.target {
            DbTarget::File(path) => Connection::open(path),
            DbTarget::Memory => Connection::open_in_memory(),
        }
        .map_err(|e| {
            log::error!("Failed to connect to store {:?}: {}", self.target, e);
            StoreError::Connection(e)
        })?;

        init::initialize_database(&conn).map_err(StoreError::Connection)?;
        log::info!("Connected to store {:?}", self.target);
        Ok(conn)
    }
}

/// Create a lazily-connecting pool for a database file
pub fn create_pool(db_path: impl Into<PathBuf>) -> DbPool {
    Arc::new(ConnectionManager::new(DbTarget::File(db_path.into())))
}

/// Create an in-memory database for testing
pub fn create_test_pool() -> DbPool {
    Arc::new(ConnectionManager::new(DbTarget::Memory))
}

/// Store-assigned timestamp; fixed width so lexical order is chronological
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Canonical form of a wallet address
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn admin_from_row(row: &Row<'_>) -> rusqlite::Result<AdminCredential> {
    Ok(AdminCredential {
        id: row.get(0)?,
        password_hash: row.get(1)?,
        initialized: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn presale_end_from_row(row: &Row<'_>) -> rusqlite::Result<PresaleEnd> {
    Ok(PresaleEnd {
        id: row.get(0)?,
        end_date_time: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn progress_from_row(row: &Row<'_>) -> rusqlite::Result<ProgressBarValue> {
    Ok(ProgressBarValue {
        id: row.get(0)?,
        value: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn wallet_from_row(row: &Row<'_>) -> rusqlite::Result<WalletAddress> {
    Ok(WalletAddress {
        id: row.get(0)?,
        address: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

const SELECT_ADMIN: &str =
    "SELECT id, password_hash, initialized, created_at, updated_at FROM admin_credentials ORDER BY created_at DESC LIMIT 1";
const SELECT_PRESALE_END: &str =
    "SELECT id, end_date_time, created_at, updated_at FROM presale_end ORDER BY created_at DESC LIMIT 1";
const SELECT_PROGRESS: &str =
    "SELECT id, value, created_at, updated_at FROM progress_bar ORDER BY created_at DESC LIMIT 1";

/// Database operations
pub struct Database;

impl Database {
    /// Get the admin credential, if one has been created
    pub async fn get_admin(pool: &DbPool) -> StoreResult<Option<AdminCredential>> {
        pool.with_connection(|conn| {
            Ok(conn.query_row(SELECT_ADMIN, [], admin_from_row).optional()?)
        })
        .await
    }

    /// Create the admin credential row
    pub async fn create_admin(
        pool: &DbPool,
        password_hash: Option<&str>,
        initialized: bool,
    ) -> StoreResult<AdminCredential> {
        pool.with_connection(|conn| {
            let ts = now();
            conn.execute(
                "INSERT INTO admin_credentials (id, password_hash, initialized, created_at, updated_at) VALUES (1, ?1, ?2, ?3, ?3)",
                params![password_hash, initialized, &ts],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Duplicate("admin credential".to_string())
                } else {
                    StoreError::Sqlite(e)
                }
            })?;

            Ok(conn.query_row(SELECT_ADMIN, [], admin_from_row)?)
        })
        .await
    }

    /// Overwrite the hash and flag of the existing admin credential
    pub async fn update_admin(
        pool: &DbPool,
        password_hash: &str,
        initialized: bool,
    ) -> StoreResult<AdminCredential> {
        pool.with_connection(|conn| {
            conn.execute(
                "UPDATE admin_credentials SET password_hash = ?1, initialized = ?2, updated_at = ?3 WHERE id = 1",
                params![password_hash, initialized, now()],
            )?;

            Ok(conn.query_row(SELECT_ADMIN, [], admin_from_row)?)
        })
        .await
    }

    /// Set the presale end date, creating the record on first write
    pub async fn upsert_presale_end(pool: &DbPool, end_date_time: &str) -> StoreResult<PresaleEnd> {
        pool.with_connection(|conn| {
            conn.execute(
                "INSERT INTO presale_end (id, end_date_time, created_at, updated_at) VALUES (1, ?1, ?2, ?2)
                 ON CONFLICT(id) DO UPDATE SET end_date_time = excluded.end_date_time, updated_at = excluded.updated_at",
                params![end_date_time, now()],
            )?;

            Ok(conn.query_row(SELECT_PRESALE_END, [], presale_end_from_row)?)
        })
        .await
    }

    /// Get the most recently created presale end record
    pub async fn get_presale_end(pool: &DbPool) -> StoreResult<Option<PresaleEnd>> {
        pool.with_connection(|conn| {
            Ok(conn
                .query_row(SELECT_PRESALE_END, [], presale_end_from_row)
                .optional()?)
        })
        .await
    }

    /// Set the progress bar value, creating the record on first write.
    /// Callers clamp the value; the table rejects anything outside [0, 100].
    pub async fn upsert_progress_bar(pool: &DbPool, value: f64) -> StoreResult<ProgressBarValue> {
        pool.with_connection(|conn| {
            conn.execute(
                "INSERT INTO progress_bar (id, value, created_at, updated_at) VALUES (1, ?1, ?2, ?2)
                 ON CONFLICT(id) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![value, now()],
            )?;

            Ok(conn.query_row(SELECT_PROGRESS, [], progress_from_row)?)
        })
        .await
    }

    /// Get the most recently created progress bar record
    pub async fn get_progress_bar(pool: &DbPool) -> StoreResult<Option<ProgressBarValue>> {
        pool.with_connection(|conn| {
            Ok(conn.query_row(SELECT_PROGRESS, [], progress_from_row).optional()?)
        })
        .await
    }

    /// Register a wallet address. The address is normalized before the
    /// uniqueness check, so `0xABC` and `0xabc` collide.
    pub async fn create_wallet_address(pool: &DbPool, address: &str) -> StoreResult<WalletAddress> {
        let address = normalize_address(address);

        pool.with_connection(move |conn| {
            let ts = now();
            conn.execute(
                "INSERT INTO wallet_addresses (address, created_at, updated_at) VALUES (?1, ?2, ?2)",
                params![&address, &ts],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Duplicate(address.clone())
                } else {
                    StoreError::Sqlite(e)
                }
            })?;

            let id = conn.last_insert_rowid();
            Ok(conn.query_row(
                "SELECT id, address, created_at, updated_at FROM wallet_addresses WHERE id = ?1",
                params![id],
                wallet_from_row,
            )?)
        })
        .await
    }

    /// Look up a wallet address (normalized before matching)
    pub async fn get_wallet_address(
        pool: &DbPool,
        address: &str,
    ) -> StoreResult<Option<WalletAddress>> {
        let address = normalize_address(address);

        pool.with_connection(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, address, created_at, updated_at FROM wallet_addresses WHERE address = ?1",
                    params![address],
                    wallet_from_row,
                )
                .optional()?)
        })
        .await
    }

    /// All wallet addresses, newest first
    pub async fn list_wallet_addresses(pool: &DbPool) -> StoreResult<Vec<WalletAddress>> {
        pool.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, address, created_at, updated_at FROM wallet_addresses ORDER BY created_at DESC, id DESC",
            )?;
            let addresses = stmt
                .query_map([], wallet_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(addresses)
        })
        .await
    }
}
