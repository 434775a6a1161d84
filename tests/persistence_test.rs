#![cfg(feature = "storage-rocksdb")]

mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{ADDRESS, BUYER, DALLAH, OUD, SELLER};
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");
    let order = "44444444-4444-4444-4444-444444444444";

    // 1. First run: seed the catalog and place the order
    let first = dir.path().join("first.csv");
    common::write_commands(&first, &[format!("create,{order},{BUYER},{OUD},{ADDRESS}")]).unwrap();

    let output1 = Command::new(cargo_bin!("marketplace-ledger"))
        .arg(&first)
        .arg("--items")
        .arg("tests/fixtures/items.csv")
        .arg("--addresses")
        .arg("tests/fixtures/addresses.csv")
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("122.50,AED,pending,pending"));

    // 2. Second run: pay and ship against the same database, no seeding
    let second = dir.path().join("second.csv");
    common::write_commands(
        &second,
        &[
            format!("pay,{order},{BUYER},,,cod"),
            format!("ship,{order},{SELLER}"),
        ],
    )
    .unwrap();

    let output2 = Command::new(cargo_bin!("marketplace-ledger"))
        .arg(&second)
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);

    assert!(stdout2.contains("122.50,AED,shipped,paid"));
    assert_eq!(stdout2.lines().count(), 2);
}

#[test]
fn test_adapters_resume_after_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");
    let lamp = "88888888-8888-8888-8888-888888888888";
    let (shipped, carded, later) = (
        "44444444-4444-4444-4444-444444444444",
        "77777777-7777-7777-7777-777777777777",
        "99999999-9999-9999-9999-999999999999",
    );

    let items = dir.path().join("items.csv");
    let catalog = std::fs::read_to_string("tests/fixtures/items.csv").unwrap();
    std::fs::write(&items, format!("{catalog}{lamp},{SELLER},Brass lamp,70.00,AED\n")).unwrap();

    // 1. Ship with a carrier-issued tracking number and open a card payment
    let first = dir.path().join("first.csv");
    common::write_commands(
        &first,
        &[
            format!("create,{shipped},{BUYER},{OUD},{ADDRESS}"),
            format!("pay,{shipped},{BUYER},,,cod"),
            format!("ship,{shipped},{SELLER}"),
            format!("create,{carded},{BUYER},{DALLAH},{ADDRESS}"),
            format!("pay,{carded},{BUYER},,,card"),
        ],
    )
    .unwrap();
    Command::new(cargo_bin!("marketplace-ledger"))
        .arg(&first)
        .arg("--items")
        .arg(&items)
        .arg("--addresses")
        .arg("tests/fixtures/addresses.csv")
        .arg("--db-path")
        .arg(&db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("122.50,AED,shipped,paid"))
        .stdout(predicate::str::contains("59.50,AED,pending,pending"));

    // 2. A fresh process books another parcel and settles and refunds the old intent
    let second = dir.path().join("second.csv");
    let ledger = dir.path().join("ledger.csv");
    common::write_commands(
        &second,
        &[
            format!("create,{later},{BUYER},{lamp},{ADDRESS}"),
            format!("pay,{later},{BUYER},,,cod"),
            format!("ship,{later},{SELLER}"),
            format!("settle,{carded}"),
            format!("cancel,{carded},{SELLER},,,,,,,Out of stock"),
        ],
    )
    .unwrap();
    Command::new(cargo_bin!("marketplace-ledger"))
        .arg(&second)
        .arg("--db-path")
        .arg(&db_path)
        .arg("--ledger-out")
        .arg(&ledger)
        .assert()
        .success()
        .stdout(predicate::str::contains("91.00,AED,shipped,paid"))
        .stdout(predicate::str::contains("59.50,AED,cancelled,refunded"))
        .stderr(predicate::str::contains("failed to process command").not());

    let rows = std::fs::read_to_string(&ledger).unwrap();
    assert_eq!(rows.matches(",refund,59.50,AED,success,card,re_").count(), 1);
}
