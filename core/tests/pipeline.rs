//! End-to-end runs against a real directory.

use populator_core::{
    config::RunConfig,
    error::PopError,
    layout::SKELETON,
    pipeline,
    types::ArtifactCategory,
};
use chrono::NaiveDate;

#[test]
fn populates_a_fresh_directory() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("profile");
    let summary = pipeline::run(Some(&target), &RunConfig::default_test()).expect("file run");

    for rel in SKELETON {
        assert!(target.join(rel).is_dir(), "skeleton folder {rel} missing");
    }
    for rel in [
        "Desktop/Tax Documents/2024/W2_Form_2024.pdf",
        "Desktop/Investments/Transactions_2023.csv",
        "Documents/Credentials/aws_credentials.txt",
        "Downloads/Software_Installers/INSTALLERS_MANIFEST.txt",
        "Downloads/Download_History.txt",
        "Program Files/Slack/install.log",
        "AppData/Roaming/Docker_Desktop/usage.log",
    ] {
        let path = target.join(rel);
        assert!(path.is_file(), "{rel} missing");
        assert!(std::fs::metadata(&path).expect("metadata").len() > 0, "{rel} is empty");
    }

    let pdf = std::fs::read(target.join("Desktop/Tax Documents/2023/Form_1040_Federal_2023.pdf"))
        .expect("1040 on disk");
    assert!(pdf.starts_with(b"%PDF-"));
    assert_eq!(summary.files_per_category.len(), ArtifactCategory::ORDER.len());
    assert!(summary.bytes_written > 0);
}

#[test]
fn tax_year_before_account_creation_writes_no_tax_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = RunConfig::default_test();
    config.identity.account_created = NaiveDate::from_ymd_opt(2022, 3, 1);
    config.tax_years = vec![2021, 2022];

    let err = pipeline::run(Some(dir.path()), &config).expect_err("2021 precedes the account");
    assert!(err.is_configuration(), "unexpected error: {err}");
    assert_eq!(pipeline::exit_code(&err), 2);
    assert_eq!(err.category(), Some(ArtifactCategory::Tax));
    match err.root() {
        PopError::Configuration { field, .. } => assert_eq!(field, "tax_years"),
        other => panic!("expected the tax_years field, got {other:?}"),
    }

    let tax_dir = dir.path().join("Desktop/Tax Documents");
    assert!(tax_dir.is_dir(), "skeleton is created before generation");
    assert_eq!(std::fs::read_dir(&tax_dir).expect("read tax dir").count(), 0);
}

#[test]
fn reference_year_in_the_future_is_rejected_up_front() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = RunConfig::default_test();
    config.tax_years = vec![2024, 2026];

    let err = pipeline::run(Some(dir.path()), &config).expect_err("2026 is after 2025");
    assert!(err.is_configuration());
    assert!(!dir.path().join("Desktop").exists(), "nothing is written for an invalid config");
}

#[test]
fn unfinished_reference_year_is_rejected_up_front() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = RunConfig::default_test();
    config.tax_years = vec![2024, 2025];

    let err = pipeline::run(Some(dir.path()), &config).expect_err("2025 has not ended");
    assert_eq!(pipeline::exit_code(&err), 2);
    assert!(matches!(err, PopError::Configuration { ref field, .. } if field == "tax_years"));
    assert!(!dir.path().join("Desktop").exists());
}

#[test]
fn bank_doubling_as_brokerage_is_rejected() {
    let mut config = RunConfig::default_test();
    config.bank = config.brokerage.clone();

    let err = pipeline::generate(&config).err().expect("one institution, two account kinds");
    assert!(matches!(err, PopError::Configuration { ref field, .. } if field == "brokerage"));
}

#[test]
fn later_stage_failure_keeps_earlier_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = RunConfig::default_test();
    // Two names with the same footprint folder.
    config.applications = vec!["Python 3.11".into(), "Python_3.11".into()];

    let err = pipeline::run(Some(dir.path()), &config).expect_err("footprint collision");
    assert!(!err.is_configuration());
    assert_eq!(pipeline::exit_code(&err), 1);
    assert!(matches!(
        err,
        PopError::ConsistencyViolation { category: ArtifactCategory::Application, .. }
    ));
    assert!(dir.path().join("Desktop/Tax Documents/2024/W2_Form_2024.pdf").is_file());
    assert!(!dir.path().join("Downloads/Download_History.txt").exists());
}
