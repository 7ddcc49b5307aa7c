//! Named checkpoints of the four entity tables.
//!
//! Capture reads every table inside one IMMEDIATE transaction and writes the
//! encoded document to the `checkpoints` registry before committing. Restore
//! validates the stored document first, then deletes and re-inserts all four
//! tables inside one IMMEDIATE transaction. Taking the write lock at BEGIN
//! serializes concurrent restores against the same database.

use rusqlite::{params, OptionalExtension, Row, Transaction, TransactionBehavior};

use super::records::{
    accident_from_row, apartment_from_row, client_from_row, policy_from_row, ACCIDENT_COLUMNS,
    APARTMENT_COLUMNS, CLIENT_COLUMNS, POLICY_COLUMNS,
};
use super::Store;
use crate::checkpoint::{CheckpointDocument, CheckpointEntry, CheckpointInfo, TABLES};
use crate::error::{Error, Result};

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        Err(Error::EmptyName)
    } else {
        Ok(name)
    }
}

/// Row conversion failures mean a stored value has no representation in the
/// document (a date column holding something other than YYYY-MM-DD, text in an
/// integer column).
fn read_error(table: &'static str, err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            Error::Serialization { table, reason: err.to_string() }
        }
        other => Error::Database(other),
    }
}

fn read_table<T>(
    tx: &Transaction,
    table: &'static str,
    columns: &str,
    order_by: &str,
    map: fn(&Row) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = tx.prepare(&format!("SELECT {columns} FROM {table} ORDER BY {order_by}"))?;
    let rows = stmt
        .query_map([], map)
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .map_err(|e| read_error(table, e))?;
    Ok(rows)
}

fn read_document(tx: &Transaction) -> Result<CheckpointDocument> {
    Ok(CheckpointDocument {
        clients: read_table(tx, "clients", CLIENT_COLUMNS, "cpf", client_from_row)?,
        policies: read_table(tx, "policies", POLICY_COLUMNS, "policy_number", policy_from_row)?,
        apartments: read_table(tx, "apartments", APARTMENT_COLUMNS, "address", apartment_from_row)?,
        accidents: read_table(tx, "accidents", ACCIDENT_COLUMNS, "accident_id", accident_from_row)?,
    })
}

/// Replace the contents of all four tables with `doc`. Deletes run child
/// first, inserts parent first, so no statement sees a dangling reference.
fn replace_tables(tx: &Transaction, doc: &CheckpointDocument) -> rusqlite::Result<()> {
    for table in TABLES.iter().rev() {
        tx.execute(&format!("DELETE FROM {table}"), [])?;
    }

    let mut stmt = tx.prepare_cached(&format!(
        "INSERT INTO clients ({CLIENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"
    ))?;
    for c in &doc.clients {
        stmt.execute(params![c.cpf, c.name, c.contact, c.birth_date, c.sex])?;
    }

    let mut stmt = tx.prepare_cached(&format!(
        "INSERT INTO policies ({POLICY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"
    ))?;
    for p in &doc.policies {
        stmt.execute(params![p.policy_number, p.start_date, p.monthly_value, p.coverage, p.client_cpf])?;
    }

    let mut stmt = tx.prepare_cached(&format!(
        "INSERT INTO apartments ({APARTMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    ))?;
    for a in &doc.apartments {
        stmt.execute(params![a.address, a.city, a.area, a.policy_number, a.market_value, a.residents])?;
    }

    let mut stmt = tx.prepare_cached(&format!(
        "INSERT INTO accidents ({ACCIDENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    ))?;
    for a in &doc.accidents {
        stmt.execute(params![
            a.accident_id,
            a.date,
            a.accident_count,
            a.apartment_address,
            a.description,
            a.involved
        ])?;
    }

    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl Store {
    /// Capture the current contents of all four tables under `name`.
    ///
    /// Names are unique: capturing under an existing name fails with
    /// `DuplicateName` and leaves the earlier checkpoint untouched.
    pub fn capture_checkpoint(&mut self, name: &str) -> Result<CheckpointInfo> {
        let name = validate_name(name)?;
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists = tx
            .query_row("SELECT 1 FROM checkpoints WHERE name = ?1", params![name], |_| Ok(()))
            .optional()?
            .is_some();
        if exists {
            return Err(Error::DuplicateName(name.to_string()));
        }

        let doc = read_document(&tx)?;
        let payload = doc.encode()?;
        let created_at = chrono::Utc::now().timestamp();

        tx.execute(
            "INSERT INTO checkpoints (name, data_backup, created_at) VALUES (?1, ?2, ?3)",
            params![name, payload, created_at],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::DuplicateName(name.to_string())
            } else {
                Error::Database(e)
            }
        })?;
        tx.commit()?;

        let counts = doc.counts();
        tracing::info!(
            checkpoint = name,
            rows = counts.total(),
            bytes = payload.len(),
            "checkpoint saved"
        );
        tracing::debug!(
            clients = counts.clients,
            policies = counts.policies,
            apartments = counts.apartments,
            accidents = counts.accidents,
            "checkpoint contents"
        );

        Ok(CheckpointInfo { name: name.to_string(), created_at, counts })
    }

    /// Replace all four tables with the rows captured under `name`.
    ///
    /// Nothing is written unless the checkpoint exists, decodes and is
    /// referentially closed. The delete and insert sequence commits as a unit;
    /// on any failure it is rolled back and the tables are as they were.
    pub fn restore_checkpoint(&mut self, name: &str) -> Result<CheckpointInfo> {
        let name = validate_name(name)?;

        let (payload, created_at) = self
            .load_checkpoint_payload(name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        let doc = CheckpointDocument::decode(name, &payload)?;
        doc.validate(name)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| Error::transaction(name, e))?;

        // dropping tx without commit rolls back
        if let Err(e) = replace_tables(&tx, &doc) {
            tracing::warn!(checkpoint = name, error = %e, "restore failed, rolling back");
            return Err(Error::transaction(name, e));
        }
        tx.commit().map_err(|e| Error::transaction(name, e))?;

        let counts = doc.counts();
        tracing::info!(checkpoint = name, rows = counts.total(), "checkpoint restored");

        Ok(CheckpointInfo { name: name.to_string(), created_at, counts })
    }

    pub fn checkpoint_exists(&self, name: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM checkpoints WHERE name = ?1", params![name.trim()], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Stored document for `name`, without applying it.
    pub fn load_checkpoint(&self, name: &str) -> Result<CheckpointDocument> {
        let name = validate_name(name)?;
        let (payload, _) = self
            .load_checkpoint_payload(name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        CheckpointDocument::decode(name, &payload)
    }

    /// All checkpoints, newest first. A checkpoint whose payload does not
    /// decode is still listed, with no counts.
    pub fn list_checkpoints(&self) -> Result<Vec<CheckpointEntry>> {
        // created_at has one-second resolution; rowid orders saves within a second
        let mut stmt = self.conn.prepare(
            "SELECT name, data_backup, created_at FROM checkpoints ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let entries = rows
            .into_iter()
            .map(|(name, payload, created_at)| {
                let counts = match CheckpointDocument::decode(&name, &payload) {
                    Ok(doc) => Some(doc.counts()),
                    Err(e) => {
                        tracing::warn!(checkpoint = %name, error = %e, "unreadable checkpoint");
                        None
                    }
                };
                CheckpointEntry { name, created_at, counts }
            })
            .collect();
        Ok(entries)
    }

    fn load_checkpoint_payload(&self, name: &str) -> Result<Option<(String, i64)>> {
        let row = self
            .conn
            .query_row(
                "SELECT data_backup, created_at FROM checkpoints WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }
}
