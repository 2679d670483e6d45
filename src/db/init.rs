/// Database schema initialization.
/// Sets up SQLite WAL mode and creates tables the first time a connection is made.
use rusqlite::{Connection, Result as SqliteResult};

/// Initialize database connection with WAL mode and schema
pub fn initialize_database(conn: &Connection) -> SqliteResult<()> {
    // Enable WAL mode (for file-based DB only, ignore error for in-memory)
    let _ = conn.execute_batch("PRAGMA journal_mode = WAL");
    let _ = conn.execute("PRAGMA synchronous = NORMAL", []);

    create_schema(conn)?;

    Ok(())
}

/// Create all database tables
///
/// The singleton tables pin their primary key to 1 so that an upsert can never
/// produce a second row.
fn create_schema(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS admin_credentials (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            password_hash TEXT,
            initialized INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS presale_end (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            end_date_time TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS progress_bar (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            value REAL NOT NULL CHECK (value >= 0 AND value <= 100),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS wallet_addresses (
            id INTEGER PRIMARY KEY,
            address TEXT UNIQUE NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_wallet_addresses_created
            ON wallet_addresses(created_at);
        "#,
    )?;

    Ok(())
}
