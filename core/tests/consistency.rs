//! Facts surfaced by more than one artifact must resolve to one ledger
//! value. These tests read the rendered artifacts back, not the ledger
//! alone, so a generator that recomputes a figure is caught.

use populator_core::{
    artifact::{Artifact, Record},
    config::RunConfig,
    facts::{Account, CredentialEntry, FinancialYearRecord, PaymentCard},
    ledger::FactKey,
    pipeline::{self, RunOutput},
    writer::MemorySink,
};
use std::collections::HashSet;

fn run() -> (RunOutput, MemorySink) {
    pipeline::generate(&RunConfig::default_test()).expect("test run")
}

fn text_of(artifact: &Artifact) -> String {
    match &artifact.record {
        Record::Text(text) => text.clone(),
        Record::Report(report) => report.lines.join("\n"),
        other => panic!("{} is not a text document", other.kind()),
    }
}

fn find_text(sink: &MemorySink, suffix: &str) -> String {
    text_of(sink.find(suffix).unwrap_or_else(|| panic!("{suffix} not generated")))
}

fn year(output: &RunOutput, y: i32) -> FinancialYearRecord {
    output
        .ledger
        .get::<FinancialYearRecord>(&FactKey::tax_year(y))
        .expect("ledger read")
        .unwrap_or_else(|| panic!("{y} missing from ledger"))
}

#[test]
fn wages_agree_across_w2_1040_statement_and_review() {
    let (output, sink) = run();
    for y in [2023, 2024] {
        let record = year(&output, y);
        let wages = record.wages.to_string();

        let w2 = find_text(&sink, &format!("Tax Documents/{y}/W2_Form_{y}.pdf"));
        let federal = find_text(&sink, &format!("Tax Documents/{y}/Form_1040_Federal_{y}.pdf"));
        let statement = find_text(&sink, &format!("Investments/Investment_Statement_{y}.pdf"));
        let review = find_text(&sink, &format!("Performance_Reviews/Performance_Review_{y}.txt"));

        assert!(
            w2.lines().any(|l| l.starts_with("1  Wages") && l.ends_with(&wages)),
            "W-2 {y} does not show {wages}"
        );
        assert!(
            federal.lines().any(|l| l.starts_with("1a  Wages") && l.ends_with(&wages)),
            "1040 {y} does not show {wages}"
        );
        assert!(statement.contains(&wages), "statement {y} does not cite {wages}");
        assert!(
            review.contains(&format!("Base Salary ({y}): {wages}")),
            "review {y} does not show {wages}"
        );
    }
}

#[test]
fn refund_is_withholding_minus_liability() {
    let (output, _) = run();
    for y in [2023, 2024] {
        let r = year(&output, y);
        assert_eq!(r.federal_refund, r.federal_withholding - r.federal_liability);
        assert_eq!(r.state_refund, r.state_withholding - r.state_liability);
    }
}

#[test]
fn one_account_number_per_institution() {
    let (output, sink) = run();
    let config = RunConfig::default_test();
    let bank = output
        .ledger
        .get::<Account>(&FactKey::account(&config.bank))
        .expect("ledger read")
        .expect("checking account");
    let brokerage = output
        .ledger
        .get::<Account>(&FactKey::account(&config.brokerage))
        .expect("ledger read")
        .expect("brokerage account");
    assert_ne!(bank.number, brokerage.number);

    for y in [2023, 2024] {
        let federal = find_text(&sink, &format!("Form_1040_Federal_{y}.pdf"));
        let state = find_text(&sink, &format!("Form_540_California_{y}.pdf"));
        let owes = federal.contains("Amount you owe");
        if !owes {
            assert!(federal.contains(&bank.number), "{y} 1040 deposits elsewhere");
        }
        if !state.contains("Amount you owe") {
            assert!(state.contains(&bank.masked()));
        }
        let statement = find_text(&sink, &format!("Investment_Statement_{y}.pdf"));
        assert!(statement.contains(&brokerage.number) || statement.contains(&brokerage.masked()));
    }
}

#[test]
fn one_secret_per_service_everywhere() {
    let (output, sink) = run();
    let config = RunConfig::default_test();

    let mut secrets = HashSet::new();
    for service in &config.credential_services {
        let entry = output
            .ledger
            .get::<CredentialEntry>(&FactKey::credential(service))
            .expect("ledger read")
            .unwrap_or_else(|| panic!("{service} has no credential"));
        assert!(secrets.insert(entry.secret.clone()), "{service} reuses a secret");

        for browser in ["Chrome", "Firefox", "Edge"] {
            let summary = find_text(&sink, &format!("Browser_Data_{browser}/Saved_Passwords.txt"));
            assert!(
                summary.contains(&format!("Password: {}", entry.secret)),
                "{browser} stores a different secret for {service}"
            );
        }
        let master = find_text(&sink, "Credentials/Master_Credentials.txt");
        assert!(master.contains(&entry.secret), "master file lacks {service}");
    }
}

#[test]
fn receipts_and_licenses_share_the_card() {
    let (output, sink) = run();
    let card = output
        .ledger
        .get::<PaymentCard>(&FactKey::payment_card("primary"))
        .expect("ledger read")
        .expect("card on record");

    let receipts: Vec<&Artifact> = sink
        .files
        .values()
        .filter(|a| a.file_name().starts_with("Receipt_"))
        .collect();
    assert_eq!(receipts.len(), RunConfig::default_test().counts.receipts);
    for receipt in receipts {
        assert!(text_of(receipt).contains(&format!("ending in {}", card.last_four)));
    }
    let licenses = find_text(&sink, "Downloads/Software_Licenses.txt");
    assert!(licenses.contains(&format!("{} ending in {}", card.network, card.last_four)));
}

#[test]
fn every_cited_fact_is_on_record() {
    let (output, _) = run();
    let keys: HashSet<String> = output.ledger.keys().iter().map(|k| k.to_string()).collect();
    for (key, paths) in &output.summary.citations {
        assert!(keys.contains(key), "{key} is cited but never created");
        assert!(!paths.is_empty());
    }
    let wage_citations = output.ledger.citations_of(&FactKey::tax_year(2024));
    assert!(
        wage_citations.len() >= 4,
        "2024 wages should surface in W-2, 1040, 540, statement and review: {wage_citations:?}"
    );
}
