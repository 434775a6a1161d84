use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let ledger_out = dir.path().join("ledger.csv");

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg("tests/fixtures/lifecycle.csv")
        .arg("--items")
        .arg("tests/fixtures/items.csv")
        .arg("--addresses")
        .arg("tests/fixtures/addresses.csv")
        .arg("--ledger-out")
        .arg(&ledger_out);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "order,buyer,seller,item,item_price,shipping_cost,buyer_protection_fee,total_price,currency,order_status,payment_status",
        ))
        // COD order taken all the way to payout
        .stdout(predicate::str::contains(
            "44444444-4444-4444-4444-444444444444,11111111-1111-1111-1111-111111111111,55555555-5555-5555-5555-555555555555,22222222-2222-2222-2222-222222222222,100.00,15.00,7.50,122.50,AED,completed,paid",
        ))
        // Card order settled through the gateway, then cancelled by the seller
        .stdout(predicate::str::contains(
            "40.00,15.00,4.50,59.50,AED,cancelled,refunded",
        ))
        .stderr(
            predicate::str::contains("catalog seeded").and(predicate::str::contains("items=2")),
        );

    let ledger = std::fs::read_to_string(&ledger_out)?;
    assert!(ledger.starts_with("tx,order,type,amount,currency,status,method,gateway_ref,created_at"));
    assert!(ledger.contains(",payment,122.50,AED,success,cod,,"));
    assert!(ledger.contains(",payout,115.00,AED,success,wallet,,"));
    assert!(ledger.contains(",payment,59.50,AED,pending,card,pi_"));
    assert!(ledger.contains(",refund,59.50,AED,success,card,re_"));
    assert_eq!(ledger.matches(",refund,").count(), 1);

    Ok(())
}

#[test]
fn test_cli_pricing_from_config() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = tempfile::NamedTempFile::new()?;
    writeln!(config, "[pricing]")?;
    writeln!(config, "base_shipping = \"20.00\"")?;
    writeln!(config, "protection_flat = \"5.00\"")?;

    let mut commands = tempfile::NamedTempFile::new()?;
    writeln!(
        commands,
        "command,order,actor,item,address\n\
         create,44444444-4444-4444-4444-444444444444,11111111-1111-1111-1111-111111111111,22222222-2222-2222-2222-222222222222,33333333-3333-3333-3333-333333333333"
    )?;

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(commands.path())
        .arg("--items")
        .arg("tests/fixtures/items.csv")
        .arg("--addresses")
        .arg("tests/fixtures/addresses.csv")
        .arg("--config")
        .arg(config.path());

    // 100.00 * 0.05 + 5.00 = 10.00, plus 20.00 shipping
    cmd.assert().success().stdout(predicate::str::contains(
        "100.00,20.00,10.00,130.00,AED,pending,pending",
    ));
    Ok(())
}

#[test]
fn test_cli_rejects_invalid_config() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = tempfile::NamedTempFile::new()?;
    writeln!(config, "[pricing]")?;
    writeln!(config, "protection_rate = \"-0.10\"")?;

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg("tests/fixtures/lifecycle.csv")
        .arg("--config")
        .arg(config.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("protection_rate"));
    Ok(())
}
