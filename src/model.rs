//! Entity records.
//!
//! Dependency chain: Client <- Policy <- Apartment <- Accident. Each child
//! carries the natural key of its parent. Field names double as column names
//! and as keys in checkpoint documents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CPF_LEN: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Client {
    pub cpf: String,
    pub name: String,
    pub contact: String,
    pub birth_date: NaiveDate,
    pub sex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    pub policy_number: String,
    pub start_date: NaiveDate,
    pub monthly_value: i64,
    pub coverage: String,
    pub client_cpf: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Apartment {
    pub address: String,
    pub city: String,
    pub area: i64,
    pub policy_number: String,
    pub market_value: i64,
    pub residents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Accident {
    pub accident_id: i64,
    pub date: NaiveDate,
    pub accident_count: i64,
    pub apartment_address: String,
    pub description: String,
    pub involved: i64,
}

/// Accident without a surrogate id yet; the store assigns one when `accident_id` is None.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccident {
    pub accident_id: Option<i64>,
    pub date: NaiveDate,
    pub accident_count: i64,
    pub apartment_address: String,
    pub description: String,
    pub involved: i64,
}

// update patches: None leaves the column unchanged

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyPatch {
    pub start_date: Option<NaiveDate>,
    pub monthly_value: Option<i64>,
    pub coverage: Option<String>,
    pub client_cpf: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApartmentPatch {
    pub city: Option<String>,
    pub area: Option<i64>,
    pub policy_number: Option<String>,
    pub market_value: Option<i64>,
    pub residents: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccidentPatch {
    pub date: Option<NaiveDate>,
    pub accident_count: Option<i64>,
    pub apartment_address: Option<String>,
    pub description: Option<String>,
    pub involved: Option<i64>,
}

impl ClientPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.contact.is_none() && self.birth_date.is_none() && self.sex.is_none()
    }
}

impl PolicyPatch {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.monthly_value.is_none()
            && self.coverage.is_none()
            && self.client_cpf.is_none()
    }
}

impl ApartmentPatch {
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.area.is_none()
            && self.policy_number.is_none()
            && self.market_value.is_none()
            && self.residents.is_none()
    }
}

impl AccidentPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.accident_count.is_none()
            && self.apartment_address.is_none()
            && self.description.is_none()
            && self.involved.is_none()
    }
}

pub fn validate_cpf(cpf: &str) -> Result<()> {
    if cpf.len() == CPF_LEN && cpf.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("cpf must be {CPF_LEN} digits, got '{cpf}'")))
    }
}

pub fn validate_key(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::InvalidInput(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

/// Parses a `YYYY-MM-DD` date as typed on the command line.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("invalid date '{s}' (expected YYYY-MM-DD): {e}")))
}

impl Client {
    pub fn validate(&self) -> Result<()> {
        validate_cpf(&self.cpf)
    }
}

impl Policy {
    pub fn validate(&self) -> Result<()> {
        validate_key("policy_number", &self.policy_number)?;
        validate_cpf(&self.client_cpf)
    }
}

impl Apartment {
    pub fn validate(&self) -> Result<()> {
        validate_key("address", &self.address)?;
        validate_key("policy_number", &self.policy_number)
    }
}

impl NewAccident {
    pub fn validate(&self) -> Result<()> {
        validate_key("apartment_address", &self.apartment_address)
    }
}
