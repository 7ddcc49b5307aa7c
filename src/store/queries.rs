//! Reporting queries over the entity tables.

use rusqlite::params;
use serde::Serialize;

use super::records::{client_from_row, policy_from_row};
use super::Store;
use crate::error::Result;
use crate::model::{Client, Policy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyWithClient {
    pub policy: Policy,
    pub client: Client,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub apartments: i64,
}

impl Store {
    /// Every policy joined with the client that holds it.
    pub fn policies_with_clients(&self) -> Result<Vec<PolicyWithClient>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.policy_number, p.start_date, p.monthly_value, p.coverage, p.client_cpf,
                    c.cpf, c.name, c.contact, c.birth_date, c.sex
             FROM policies p
             JOIN clients c ON p.client_cpf = c.cpf
             ORDER BY p.policy_number",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let policy = policy_from_row(row)?;
                // client columns start after the five policy columns
                let client = Client {
                    cpf: row.get(5)?,
                    name: row.get(6)?,
                    contact: row.get(7)?,
                    birth_date: row.get(8)?,
                    sex: row.get(9)?,
                };
                Ok(PolicyWithClient { policy, client })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    pub fn apartments_per_city(&self) -> Result<Vec<CityCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT city, COUNT(address) FROM apartments GROUP BY city ORDER BY city",
        )?;

        let rows = stmt
            .query_map([], |row| Ok(CityCount { city: row.get(0)?, apartments: row.get(1)? }))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Policies whose monthly value is strictly greater than `min_monthly_value`.
    pub fn policies_above(&self, min_monthly_value: i64) -> Result<Vec<Policy>> {
        let mut stmt = self.conn.prepare(
            "SELECT policy_number, start_date, monthly_value, coverage, client_cpf
             FROM policies
             WHERE monthly_value > ?1
             ORDER BY monthly_value DESC, policy_number",
        )?;

        let rows = stmt
            .query_map(params![min_monthly_value], policy_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Clients with no policy, candidates for cleanup before a checkpoint.
    pub fn clients_without_policies(&self) -> Result<Vec<Client>> {
        let mut stmt = self.conn.prepare(
            "SELECT cpf, name, contact, birth_date, sex FROM clients
             WHERE cpf NOT IN (SELECT client_cpf FROM policies)
             ORDER BY cpf",
        )?;

        let rows = stmt
            .query_map([], client_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Apartment;
    use chrono::NaiveDate;

    fn store_with_policies() -> Store {
        let store = Store::open_in_memory().unwrap();
        for (cpf, name) in [("11122233344", "Ana"), ("55566677788", "Bruno"), ("99988877766", "Carla")] {
            store
                .create_client(&Client {
                    cpf: cpf.into(),
                    name: name.into(),
                    contact: String::new(),
                    birth_date: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
                    sex: "F".into(),
                })
                .unwrap();
        }
        for (number, value, cpf) in [("SEG001", 250, "11122233344"), ("SEG002", 900, "55566677788")] {
            store
                .create_policy(&Policy {
                    policy_number: number.into(),
                    start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                    monthly_value: value,
                    coverage: "fire".into(),
                    client_cpf: cpf.into(),
                })
                .unwrap();
        }
        for (address, city, policy) in [
            ("Rua A, 10", "Curitiba", "SEG001"),
            ("Rua B, 20", "Curitiba", "SEG002"),
            ("Av C, 5", "Recife", "SEG002"),
        ] {
            store
                .create_apartment(&Apartment {
                    address: address.into(),
                    city: city.into(),
                    area: 50,
                    policy_number: policy.into(),
                    market_value: 300_000,
                    residents: 2,
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn join_pairs_policy_with_holder() {
        let rows = store_with_policies().policies_with_clients().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].policy.policy_number, "SEG001");
        assert_eq!(rows[0].client.name, "Ana");
        assert_eq!(rows[1].client.name, "Bruno");
    }

    #[test]
    fn apartments_grouped_by_city() {
        let rows = store_with_policies().apartments_per_city().unwrap();
        assert_eq!(
            rows,
            vec![
                CityCount { city: "Curitiba".into(), apartments: 2 },
                CityCount { city: "Recife".into(), apartments: 1 },
            ]
        );
    }

    #[test]
    fn policies_above_is_strict() {
        let store = store_with_policies();
        assert_eq!(store.policies_above(250).unwrap().len(), 1);
        assert_eq!(store.policies_above(249).unwrap().len(), 2);
    }

    #[test]
    fn finds_clients_without_policies() {
        let rows = store_with_policies().clients_without_policies().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Carla");
    }
}
