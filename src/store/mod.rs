//! SQLite storage.
//!
//! One database holds the four entity tables and the checkpoint registry:
//! - clients: cpf, name, contact, birth_date, sex
//! - policies: policy_number, start_date, monthly_value, coverage, client_cpf -> clients
//! - apartments: address, city, area, policy_number -> policies, market_value, residents
//! - accidents: accident_id, date, accident_count, apartment_address -> apartments, description, involved
//! - checkpoints: name, data_backup, created_at
//!
//! Supports:
//! - CRUD per entity (`records`)
//! - Named checkpoint capture and restore (`checkpoint`)
//! - Reporting queries (`queries`)

pub mod checkpoint;
pub mod queries;
pub mod records;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

use crate::config::Config;
use crate::error::{Error, Result};

/// Get the default database path (~/.local/share/claimbook/claimbook.db or platform equivalent)
pub fn default_db_path() -> Result<PathBuf> {
    let data_dir = directories::ProjectDirs::from("", "", "claimbook")
        .ok_or_else(|| Error::Config("could not determine data directory".to_string()))?
        .data_dir()
        .to_path_buf();

    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir.join("claimbook.db"))
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS clients (
            cpf TEXT PRIMARY KEY CHECK (length(cpf) = 11),
            name TEXT NOT NULL,
            contact TEXT NOT NULL,
            birth_date TEXT NOT NULL,
            sex TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS policies (
            policy_number TEXT PRIMARY KEY,
            start_date TEXT NOT NULL,
            monthly_value INTEGER NOT NULL,
            coverage TEXT NOT NULL,
            client_cpf TEXT NOT NULL,
            FOREIGN KEY(client_cpf) REFERENCES clients(cpf)
        );

        CREATE TABLE IF NOT EXISTS apartments (
            address TEXT PRIMARY KEY,
            city TEXT NOT NULL,
            area INTEGER NOT NULL,
            policy_number TEXT NOT NULL,
            market_value INTEGER NOT NULL,
            residents INTEGER NOT NULL,
            FOREIGN KEY(policy_number) REFERENCES policies(policy_number)
        );

        CREATE TABLE IF NOT EXISTS accidents (
            accident_id INTEGER PRIMARY KEY,
            date TEXT NOT NULL,
            accident_count INTEGER NOT NULL,
            apartment_address TEXT NOT NULL,
            description TEXT NOT NULL,
            involved INTEGER NOT NULL,
            FOREIGN KEY(apartment_address) REFERENCES apartments(address)
        );

        CREATE TABLE IF NOT EXISTS checkpoints (
            name TEXT PRIMARY KEY,
            data_backup TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_policies_client ON policies(client_cpf);
        CREATE INDEX IF NOT EXISTS idx_apartments_policy ON apartments(policy_number);
        CREATE INDEX IF NOT EXISTS idx_accidents_apartment ON accidents(apartment_address);",
    )
}

/// Database handle. Open once per command, reuse across all operations.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open the database named by the config, falling back to the platform data dir.
    pub fn open(config: &Config) -> Result<Self> {
        let path = match &config.database {
            Some(path) => path.clone(),
            None => default_db_path()?,
        };
        Store::open_path(&path, config.busy_timeout)
    }

    pub fn open_path(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        // readers keep working while a restore holds the write lock
        let _mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        let store = Store::prepare(conn, Some(path.to_path_buf()))?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Store::prepare(Connection::open_in_memory()?, None)
    }

    fn prepare(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_schema(&conn)?;
        Ok(Store { conn, path })
    }

    /// Location of the database file, None for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Underlying connection, for callers that need statements the store does not wrap.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
