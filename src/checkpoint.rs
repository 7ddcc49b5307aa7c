//! Checkpoint documents.
//!
//! A checkpoint is one JSON document holding every row of the four entity
//! tables at capture time:
//!
//! ```json
//! {"clients": [...], "policies": [...], "apartments": [...], "accidents": [...]}
//! ```
//!
//! Rows are flat objects keyed by column name, dates as `YYYY-MM-DD`.
//! Decoding is strict: unknown tables or columns, missing columns and
//! malformed dates all fail.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Accident, Apartment, Client, Policy};

/// Entity tables, parents before children. Restore deletes in the reverse of
/// this order and inserts in this order.
pub const TABLES: [&str; 4] = ["clients", "policies", "apartments", "accidents"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointDocument {
    pub clients: Vec<Client>,
    pub policies: Vec<Policy>,
    pub apartments: Vec<Apartment>,
    pub accidents: Vec<Accident>,
}

/// Outcome of a capture or restore.
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointInfo {
    pub name: String,
    pub created_at: i64,
    pub counts: TableCounts,
}

/// One row of `checkpoint list`. `counts` is `None` when the stored payload
/// does not decode; restoring that checkpoint reports why.
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointEntry {
    pub name: String,
    pub created_at: i64,
    pub counts: Option<TableCounts>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub clients: usize,
    pub policies: usize,
    pub apartments: usize,
    pub accidents: usize,
}

impl TableCounts {
    pub fn total(&self) -> usize {
        self.clients + self.policies + self.apartments + self.accidents
    }
}

impl CheckpointDocument {
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            clients: self.clients.len(),
            policies: self.policies.len(),
            apartments: self.apartments.len(),
            accidents: self.accidents.len(),
        }
    }

    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization {
            table: "checkpoint",
            reason: e.to_string(),
        })
    }

    pub fn decode(name: &str, payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| Error::CorruptCheckpoint {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Checks that the document is closed under its parent references and has
    /// no duplicate keys, so a restore in dependency order cannot trip a
    /// foreign key or primary key constraint.
    pub fn validate(&self, name: &str) -> Result<()> {
        let corrupt = |reason: String| Error::CorruptCheckpoint { name: name.to_string(), reason };

        let mut clients = HashSet::new();
        for client in &self.clients {
            if !clients.insert(client.cpf.as_str()) {
                return Err(corrupt(format!("duplicate client '{}'", client.cpf)));
            }
        }

        let mut policies = HashSet::new();
        for policy in &self.policies {
            if !policies.insert(policy.policy_number.as_str()) {
                return Err(corrupt(format!("duplicate policy '{}'", policy.policy_number)));
            }
            if !clients.contains(policy.client_cpf.as_str()) {
                return Err(Error::ReferentialViolation {
                    table: "policies",
                    key: policy.policy_number.clone(),
                    parent_table: "clients",
                    parent_key: policy.client_cpf.clone(),
                });
            }
        }

        let mut apartments = HashSet::new();
        for apartment in &self.apartments {
            if !apartments.insert(apartment.address.as_str()) {
                return Err(corrupt(format!("duplicate apartment '{}'", apartment.address)));
            }
            if !policies.contains(apartment.policy_number.as_str()) {
                return Err(Error::ReferentialViolation {
                    table: "apartments",
                    key: apartment.address.clone(),
                    parent_table: "policies",
                    parent_key: apartment.policy_number.clone(),
                });
            }
        }

        let mut accidents = HashSet::new();
        for accident in &self.accidents {
            if !accidents.insert(accident.accident_id) {
                return Err(corrupt(format!("duplicate accident {}", accident.accident_id)));
            }
            if !apartments.contains(accident.apartment_address.as_str()) {
                return Err(Error::ReferentialViolation {
                    table: "accidents",
                    key: accident.accident_id.to_string(),
                    parent_table: "apartments",
                    parent_key: accident.apartment_address.clone(),
                });
            }
        }

        Ok(())
    }
}
