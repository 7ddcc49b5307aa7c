use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use claimbook::checkpoint::CheckpointDocument;
use claimbook::error::{Error, TransactionFailure};
use claimbook::model::{Apartment, Client, NewAccident, Policy};
use claimbook::store::Store;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn open(path: &Path) -> Store {
    Store::open_path(path, Duration::from_millis(100)).unwrap()
}

fn temp_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir.path().join("claimbook.db"));
    (dir, store)
}

/// Everything in the four entity tables, in key order.
fn contents(store: &Store) -> CheckpointDocument {
    CheckpointDocument {
        clients: store.list_clients().unwrap(),
        policies: store.list_policies().unwrap(),
        apartments: store.list_apartments().unwrap(),
        accidents: store.list_accidents().unwrap(),
    }
}

fn ana() -> Client {
    Client {
        cpf: "11122233344".into(),
        name: "Ana".into(),
        contact: "ana@example.com".into(),
        birth_date: date(1988, 4, 12),
        sex: "F".into(),
    }
}

fn seg001() -> Policy {
    Policy {
        policy_number: "SEG001".into(),
        start_date: date(2023, 1, 15),
        monthly_value: 320,
        coverage: "fire and flood".into(),
        client_cpf: "11122233344".into(),
    }
}

fn rua_a() -> Apartment {
    Apartment {
        address: "Rua A, 10".into(),
        city: "Porto Alegre".into(),
        area: 68,
        policy_number: "SEG001".into(),
        market_value: 450_000,
        residents: 3,
    }
}

fn accident_1() -> NewAccident {
    NewAccident {
        accident_id: Some(1),
        date: date(2024, 7, 3),
        accident_count: 1,
        apartment_address: "Rua A, 10".into(),
        description: "burst pipe".into(),
        involved: 2,
    }
}

fn seed_scenario(store: &Store) {
    store.create_client(&ana()).unwrap();
    store.create_policy(&seg001()).unwrap();
    store.create_apartment(&rua_a()).unwrap();
    store.create_accident(&accident_1()).unwrap();
}

/// A few clients, each with policies, apartments and accidents.
fn seed_portfolio(store: &Store) {
    for c in 0..3 {
        let cpf = format!("{:011}", 10_000_000_000u64 + c);
        store
            .create_client(&Client {
                cpf: cpf.clone(),
                name: format!("Client {c}"),
                contact: format!("555-01{c:02}"),
                birth_date: date(1970 + c as i32, 1 + c as u32, 10),
                sex: if c % 2 == 0 { "F".into() } else { "M".into() },
            })
            .unwrap();
        for p in 0..2 {
            let number = format!("SEG{c}{p}");
            store
                .create_policy(&Policy {
                    policy_number: number.clone(),
                    start_date: date(2020 + p, 6, 1),
                    monthly_value: 100 * (c as i64 + 1) + p as i64,
                    coverage: "full".into(),
                    client_cpf: cpf.clone(),
                })
                .unwrap();
            let address = format!("Rua {c}, {p}");
            store
                .create_apartment(&Apartment {
                    address: address.clone(),
                    city: if p == 0 { "Recife".into() } else { "Natal".into() },
                    area: 40 + p as i64,
                    policy_number: number,
                    market_value: 200_000,
                    residents: 1 + p as i64,
                })
                .unwrap();
            store
                .create_accident(&NewAccident {
                    accident_id: None,
                    date: date(2024, 1 + c as u32, 1 + p as u32),
                    accident_count: 1,
                    apartment_address: address,
                    description: format!("incident {c}-{p}"),
                    involved: p as i64,
                })
                .unwrap();
        }
    }
}

#[test]
fn scenario_deleted_rows_come_back() {
    let (_dir, mut store) = temp_store();
    seed_scenario(&store);

    store.capture_checkpoint("chk1").unwrap();

    store.delete_accident(1).unwrap();
    store.delete_apartment("Rua A, 10").unwrap();
    assert!(store.get_accident(1).unwrap().is_none());

    store.restore_checkpoint("chk1").unwrap();

    let accident = store.get_accident(1).unwrap().unwrap();
    assert_eq!(accident.description, "burst pipe");
    assert_eq!(accident.date, date(2024, 7, 3));
    assert_eq!(accident.involved, 2);
    assert_eq!(store.get_apartment("Rua A, 10").unwrap(), Some(rua_a()));
    assert_eq!(store.get_client("11122233344").unwrap(), Some(ana()));
    assert_eq!(store.get_policy("SEG001").unwrap(), Some(seg001()));
}

#[test]
fn capture_then_restore_is_identity() {
    let (_dir, mut store) = temp_store();
    seed_portfolio(&store);
    let before = contents(&store);

    store.capture_checkpoint("x").unwrap();
    store.restore_checkpoint("x").unwrap();

    assert_eq!(contents(&store), before);
}

#[test]
fn restore_discards_rows_created_after_capture() {
    let (_dir, mut store) = temp_store();
    seed_scenario(&store);
    let captured = contents(&store);
    store.capture_checkpoint("base").unwrap();

    seed_portfolio(&store);
    store
        .update_policy("SEG001", &claimbook::model::PolicyPatch { monthly_value: Some(999), ..Default::default() })
        .unwrap();

    store.restore_checkpoint("base").unwrap();
    assert_eq!(contents(&store), captured);
}

#[test]
fn restore_twice_gives_same_contents() {
    let (_dir, mut store) = temp_store();
    seed_portfolio(&store);
    store.capture_checkpoint("x").unwrap();
    store.delete_accident(1).unwrap();

    store.restore_checkpoint("x").unwrap();
    let first = contents(&store);
    store.restore_checkpoint("x").unwrap();
    assert_eq!(contents(&store), first);
}

#[test]
fn restore_leaves_no_dangling_references() {
    let (_dir, mut store) = temp_store();
    seed_portfolio(&store);
    store.capture_checkpoint("x").unwrap();
    store.restore_checkpoint("x").unwrap();

    let violations: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM pragma_foreign_key_check", [], |row| row.get(0))
        .unwrap();
    assert_eq!(violations, 0);
}

#[test]
fn unknown_name_is_not_found_and_changes_nothing() {
    let (_dir, mut store) = temp_store();
    seed_portfolio(&store);
    store.capture_checkpoint("x").unwrap();
    store.delete_accident(1).unwrap();
    let before = contents(&store);

    match store.restore_checkpoint("nonexistent") {
        Err(Error::NotFound(name)) => assert_eq!(name, "nonexistent"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(contents(&store), before);
}

#[test]
fn failed_insert_rolls_back_every_delete() {
    let (_dir, mut store) = temp_store();
    seed_portfolio(&store);
    store.capture_checkpoint("x").unwrap();
    store.delete_accident(1).unwrap();
    let before = contents(&store);

    // last insert batch fails after all four deletes have run
    store
        .connection()
        .execute_batch(
            "CREATE TRIGGER fail_accident_insert BEFORE INSERT ON accidents
             BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
        )
        .unwrap();

    match store.restore_checkpoint("x") {
        Err(Error::Transaction { name, kind, .. }) => {
            assert_eq!(name, "x");
            assert_eq!(kind, TransactionFailure::ConstraintViolation);
        }
        other => panic!("expected Transaction error, got {other:?}"),
    }
    assert_eq!(contents(&store), before);
}

#[test]
fn failed_delete_midway_rolls_back() {
    let (_dir, mut store) = temp_store();
    seed_portfolio(&store);
    store.capture_checkpoint("x").unwrap();
    let before = contents(&store);

    // accidents and apartments are already gone when this fires
    store
        .connection()
        .execute_batch(
            "CREATE TRIGGER fail_policy_delete BEFORE DELETE ON policies
             BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
        )
        .unwrap();

    assert!(matches!(store.restore_checkpoint("x"), Err(Error::Transaction { .. })));
    assert_eq!(contents(&store), before);
}

#[test]
fn restore_waits_for_other_writer_then_reports_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("claimbook.db");
    let mut store = open(&path);
    seed_scenario(&store);
    store.capture_checkpoint("chk1").unwrap();
    store.delete_accident(1).unwrap();

    let writer = open(&path);
    writer.connection().execute_batch("BEGIN IMMEDIATE").unwrap();

    match store.restore_checkpoint("chk1") {
        Err(Error::Transaction { kind, .. }) => assert_eq!(kind, TransactionFailure::Unavailable),
        other => panic!("expected busy failure, got {other:?}"),
    }
    writer.connection().execute_batch("ROLLBACK").unwrap();

    assert!(store.get_accident(1).unwrap().is_none());
    store.restore_checkpoint("chk1").unwrap();
    assert!(store.get_accident(1).unwrap().is_some());
}

#[test]
fn checkpoints_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("claimbook.db");
    {
        let mut store = open(&path);
        seed_scenario(&store);
        store.capture_checkpoint("chk1").unwrap();
    }

    let mut store = open(&path);
    store.delete_accident(1).unwrap();
    store.delete_apartment("Rua A, 10").unwrap();
    store.restore_checkpoint("chk1").unwrap();
    assert_eq!(store.list_accidents().unwrap().len(), 1);

    let listed = store.list_checkpoints().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].counts.map(|c| c.total()), Some(4));
}

#[test]
fn duplicate_capture_rejected() {
    let (_dir, mut store) = temp_store();
    seed_scenario(&store);
    store.capture_checkpoint("chk1").unwrap();
    store.delete_accident(1).unwrap();

    assert!(matches!(store.capture_checkpoint("chk1"), Err(Error::DuplicateName(_))));

    store.restore_checkpoint("chk1").unwrap();
    assert!(store.get_accident(1).unwrap().is_some());
}

#[test]
fn empty_tables_round_trip() {
    let (_dir, mut store) = temp_store();
    store.capture_checkpoint("empty").unwrap();
    seed_scenario(&store);

    store.restore_checkpoint("empty").unwrap();
    assert_eq!(contents(&store), CheckpointDocument::default());
}

#[test]
fn stored_payload_uses_table_keys_and_iso_dates() {
    let (_dir, mut store) = temp_store();
    seed_scenario(&store);
    store.capture_checkpoint("chk1").unwrap();

    let payload: String = store
        .connection()
        .query_row("SELECT data_backup FROM checkpoints WHERE name = 'chk1'", [], |row| row.get(0))
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(json["clients"][0]["birth_date"], "1988-04-12");
    assert_eq!(json["accidents"][0]["apartment_address"], "Rua A, 10");
    assert_eq!(json["policies"][0]["monthly_value"], 320);
}
