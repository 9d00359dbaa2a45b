//! Brokerage history replayed from the rendered Transactions CSVs.

use populator_core::{
    artifact::Record,
    config::RunConfig,
    facts::Account,
    ledger::FactKey,
    money::Money,
    pipeline,
};
use std::collections::HashMap;

#[test]
fn inventory_never_goes_negative_across_years() {
    let config = RunConfig::default_test();
    let (output, sink) = pipeline::generate(&config).expect("test run");
    let account = output
        .ledger
        .get::<Account>(&FactKey::account(&config.brokerage))
        .expect("ledger read")
        .expect("brokerage account");
    let today = output.summary.reference_time.date();

    let mut rows = Vec::new();
    for y in &config.tax_years {
        let csv = sink
            .find(&format!("Investments/Transactions_{y}.csv"))
            .unwrap_or_else(|| panic!("no transactions for {y}"));
        let Record::Workbook(table) = &csv.record else { panic!("transactions are a table") };
        assert_eq!(table.headers[0], "Date");
        rows.extend(table.rows.iter().cloned());
    }
    rows.sort_by(|a, b| a[0].cmp(&b[0]));

    let mut open: HashMap<String, i64> = HashMap::new();
    for row in &rows {
        let date = chrono::NaiveDate::parse_from_str(&row[0], "%Y-%m-%d").expect("row date");
        assert!(date >= account.opened && date <= today, "trade {date} outside the account window");

        let quantity: i64 = row[4].parse().expect("quantity");
        let held = open.entry(row[3].clone()).or_default();
        match row[1].as_str() {
            "BUY" => *held += quantity,
            "SELL" => *held -= quantity,
            other => panic!("unknown side {other}"),
        }
        assert!(*held >= 0, "{} went short on {}", row[3], row[0]);

        let cents = |s: &str| Money::from_cents((s.parse::<f64>().expect("amount") * 100.0).round() as i64);
        assert_eq!(
            cents(&row[6]),
            Money::from_cents(cents(&row[5]).cents() * quantity),
            "total is not quantity x price on {}",
            row[0]
        );
    }
}
