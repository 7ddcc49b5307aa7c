//! Row-level CRUD for the four entity tables.
//!
//! Every call is one statement in autocommit mode. Updates take a patch where
//! `None` leaves the column as it is.

use rusqlite::{params, OptionalExtension, Row};

use super::Store;
use crate::error::{Error, Result};
use crate::model::{
    Accident, AccidentPatch, Apartment, ApartmentPatch, Client, ClientPatch, NewAccident, Policy,
    PolicyPatch,
};

pub(crate) const CLIENT_COLUMNS: &str = "cpf, name, contact, birth_date, sex";
pub(crate) const POLICY_COLUMNS: &str = "policy_number, start_date, monthly_value, coverage, client_cpf";
pub(crate) const APARTMENT_COLUMNS: &str =
    "address, city, area, policy_number, market_value, residents";
pub(crate) const ACCIDENT_COLUMNS: &str =
    "accident_id, date, accident_count, apartment_address, description, involved";

pub(crate) fn client_from_row(row: &Row) -> rusqlite::Result<Client> {
    Ok(Client {
        cpf: row.get(0)?,
        name: row.get(1)?,
        contact: row.get(2)?,
        birth_date: row.get(3)?,
        sex: row.get(4)?,
    })
}

pub(crate) fn policy_from_row(row: &Row) -> rusqlite::Result<Policy> {
    Ok(Policy {
        policy_number: row.get(0)?,
        start_date: row.get(1)?,
        monthly_value: row.get(2)?,
        coverage: row.get(3)?,
        client_cpf: row.get(4)?,
    })
}

pub(crate) fn apartment_from_row(row: &Row) -> rusqlite::Result<Apartment> {
    Ok(Apartment {
        address: row.get(0)?,
        city: row.get(1)?,
        area: row.get(2)?,
        policy_number: row.get(3)?,
        market_value: row.get(4)?,
        residents: row.get(5)?,
    })
}

pub(crate) fn accident_from_row(row: &Row) -> rusqlite::Result<Accident> {
    Ok(Accident {
        accident_id: row.get(0)?,
        date: row.get(1)?,
        accident_count: row.get(2)?,
        apartment_address: row.get(3)?,
        description: row.get(4)?,
        involved: row.get(5)?,
    })
}

fn require_changed(affected: usize, table: &'static str, key: impl ToString) -> Result<()> {
    if affected == 0 {
        Err(Error::RecordNotFound { table, key: key.to_string() })
    } else {
        Ok(())
    }
}

impl Store {
    // clients

    pub fn create_client(&self, client: &Client) -> Result<()> {
        client.validate()?;
        self.conn.execute(
            &format!("INSERT INTO clients ({CLIENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
            params![client.cpf, client.name, client.contact, client.birth_date, client.sex],
        )?;
        tracing::debug!(cpf = %client.cpf, "created client");
        Ok(())
    }

    pub fn get_client(&self, cpf: &str) -> Result<Option<Client>> {
        let client = self
            .conn
            .query_row(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE cpf = ?1"),
                params![cpf],
                client_from_row,
            )
            .optional()?;
        Ok(client)
    }

    pub fn update_client(&self, cpf: &str, patch: &ClientPatch) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE clients SET
                name = COALESCE(?2, name),
                contact = COALESCE(?3, contact),
                birth_date = COALESCE(?4, birth_date),
                sex = COALESCE(?5, sex)
             WHERE cpf = ?1",
            params![cpf, patch.name, patch.contact, patch.birth_date, patch.sex],
        )?;
        require_changed(affected, "clients", cpf)
    }

    pub fn delete_client(&self, cpf: &str) -> Result<()> {
        let affected = self.conn.execute("DELETE FROM clients WHERE cpf = ?1", params![cpf])?;
        require_changed(affected, "clients", cpf)
    }

    pub fn list_clients(&self) -> Result<Vec<Client>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY cpf"))?;
        let clients = stmt.query_map([], client_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(clients)
    }

    // policies

    pub fn create_policy(&self, policy: &Policy) -> Result<()> {
        policy.validate()?;
        self.conn.execute(
            &format!("INSERT INTO policies ({POLICY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
            params![
                policy.policy_number,
                policy.start_date,
                policy.monthly_value,
                policy.coverage,
                policy.client_cpf
            ],
        )?;
        tracing::debug!(policy_number = %policy.policy_number, "created policy");
        Ok(())
    }

    pub fn get_policy(&self, policy_number: &str) -> Result<Option<Policy>> {
        let policy = self
            .conn
            .query_row(
                &format!("SELECT {POLICY_COLUMNS} FROM policies WHERE policy_number = ?1"),
                params![policy_number],
                policy_from_row,
            )
            .optional()?;
        Ok(policy)
    }

    pub fn update_policy(&self, policy_number: &str, patch: &PolicyPatch) -> Result<()> {
        if let Some(cpf) = &patch.client_cpf {
            crate::model::validate_cpf(cpf)?;
        }
        let affected = self.conn.execute(
            "UPDATE policies SET
                start_date = COALESCE(?2, start_date),
                monthly_value = COALESCE(?3, monthly_value),
                coverage = COALESCE(?4, coverage),
                client_cpf = COALESCE(?5, client_cpf)
             WHERE policy_number = ?1",
            params![
                policy_number,
                patch.start_date,
                patch.monthly_value,
                patch.coverage,
                patch.client_cpf
            ],
        )?;
        require_changed(affected, "policies", policy_number)
    }

    pub fn delete_policy(&self, policy_number: &str) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM policies WHERE policy_number = ?1", params![policy_number])?;
        require_changed(affected, "policies", policy_number)
    }

    pub fn list_policies(&self) -> Result<Vec<Policy>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {POLICY_COLUMNS} FROM policies ORDER BY policy_number"))?;
        let policies = stmt.query_map([], policy_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(policies)
    }

    // apartments

    pub fn create_apartment(&self, apartment: &Apartment) -> Result<()> {
        apartment.validate()?;
        self.conn.execute(
            &format!("INSERT INTO apartments ({APARTMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
            params![
                apartment.address,
                apartment.city,
                apartment.area,
                apartment.policy_number,
                apartment.market_value,
                apartment.residents
            ],
        )?;
        tracing::debug!(address = %apartment.address, "created apartment");
        Ok(())
    }

    pub fn get_apartment(&self, address: &str) -> Result<Option<Apartment>> {
        let apartment = self
            .conn
            .query_row(
                &format!("SELECT {APARTMENT_COLUMNS} FROM apartments WHERE address = ?1"),
                params![address],
                apartment_from_row,
            )
            .optional()?;
        Ok(apartment)
    }

    pub fn update_apartment(&self, address: &str, patch: &ApartmentPatch) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE apartments SET
                city = COALESCE(?2, city),
                area = COALESCE(?3, area),
                policy_number = COALESCE(?4, policy_number),
                market_value = COALESCE(?5, market_value),
                residents = COALESCE(?6, residents)
             WHERE address = ?1",
            params![
                address,
                patch.city,
                patch.area,
                patch.policy_number,
                patch.market_value,
                patch.residents
            ],
        )?;
        require_changed(affected, "apartments", address)
    }

    pub fn delete_apartment(&self, address: &str) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM apartments WHERE address = ?1", params![address])?;
        require_changed(affected, "apartments", address)
    }

    pub fn list_apartments(&self) -> Result<Vec<Apartment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {APARTMENT_COLUMNS} FROM apartments ORDER BY address"))?;
        let apartments = stmt
            .query_map([], apartment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(apartments)
    }

    // accidents

    /// Insert an accident, returning its id (assigned by the store when not given).
    pub fn create_accident(&self, accident: &NewAccident) -> Result<i64> {
        accident.validate()?;
        self.conn.execute(
            &format!("INSERT INTO accidents ({ACCIDENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
            params![
                accident.accident_id,
                accident.date,
                accident.accident_count,
                accident.apartment_address,
                accident.description,
                accident.involved
            ],
        )?;
        let id = accident.accident_id.unwrap_or_else(|| self.conn.last_insert_rowid());
        tracing::debug!(accident_id = id, "created accident");
        Ok(id)
    }

    pub fn get_accident(&self, accident_id: i64) -> Result<Option<Accident>> {
        let accident = self
            .conn
            .query_row(
                &format!("SELECT {ACCIDENT_COLUMNS} FROM accidents WHERE accident_id = ?1"),
                params![accident_id],
                accident_from_row,
            )
            .optional()?;
        Ok(accident)
    }

    pub fn update_accident(&self, accident_id: i64, patch: &AccidentPatch) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE accidents SET
                date = COALESCE(?2, date),
                accident_count = COALESCE(?3, accident_count),
                apartment_address = COALESCE(?4, apartment_address),
                description = COALESCE(?5, description),
                involved = COALESCE(?6, involved)
             WHERE accident_id = ?1",
            params![
                accident_id,
                patch.date,
                patch.accident_count,
                patch.apartment_address,
                patch.description,
                patch.involved
            ],
        )?;
        require_changed(affected, "accidents", accident_id)
    }

    pub fn delete_accident(&self, accident_id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM accidents WHERE accident_id = ?1", params![accident_id])?;
        require_changed(affected, "accidents", accident_id)
    }

    pub fn list_accidents(&self) -> Result<Vec<Accident>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ACCIDENT_COLUMNS} FROM accidents ORDER BY accident_id"))?;
        let accidents = stmt
            .query_map([], accident_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(accidents)
    }
}
