use crate::{
    clock::RunClock,
    error::{PopError, PopResult},
    types::{ArtifactCategory, Year},
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_TAX_YEARS: [Year; 4] = [2022, 2023, 2024, 2025];

pub const DEFAULT_STOCK_HOLDINGS: [&str; 19] = [
    "AAPL", "GOOGL", "MSFT", "AMZN", "TSLA", "NVDA", "META", "NFLX", "AMD", "INTC", "JPM", "BAC",
    "V", "MA", "DIS", "PYPL", "ADBE", "SMCI", "MSTR",
];

pub const DEFAULT_ETF_HOLDINGS: [&str; 10] = [
    "SPY", "QQQ", "VTI", "VOO", "IVV", "VEA", "VWO", "AGG", "BND", "TLT",
];

pub const DEFAULT_BOND_HOLDINGS: [&str; 5] = [
    "US Treasury 10Y", "US Treasury 5Y", "Corporate Bond AAA", "Municipal Bond CA", "TIPS 2030",
];

pub const DEFAULT_APPLICATIONS: [&str; 24] = [
    "Google Chrome", "Mozilla Firefox", "Microsoft Edge", "Google Drive", "Box", "Dropbox",
    "Microsoft OneDrive", "Microsoft Office 365", "Microsoft Teams", "Zoom", "VLC Media Player",
    "WinRAR", "7-Zip", "Adobe Acrobat Reader DC", "Visual Studio Code", "Git", "Python 3.11",
    "Node.js", "Docker Desktop", "Slack", "Notepad++", "FileZilla", "Putty", "Spotify",
];

pub const DEFAULT_CREDENTIAL_SERVICES: [&str; 15] = [
    "github.com", "gitlab.com", "gmail.com", "linkedin.com", "amazon.com", "chase.com",
    "fidelity.com", "zoom.us", "slack.com", "office.com", "dropbox.com", "docker.com",
    "aws.amazon.com", "spotify.com", "netflix.com",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedFilingJointly,
    HeadOfHousehold,
}

impl FilingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::MarriedFilingJointly => "Married Filing Jointly",
            Self::HeadOfHousehold => "Head of Household",
        }
    }
}

/// Identity overrides. Anything left empty is drawn by the persona builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub company_name: Option<String>,
    pub account_created: Option<NaiveDate>,
}

/// How many items of each repeated artifact to generate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentCounts {
    pub chrome_history: usize,
    pub firefox_history: usize,
    pub edge_history: usize,
    pub history_window_days: i64,
    pub receipts: usize,
    pub photos: usize,
    pub project_proposals: usize,
    pub training_certificates: usize,
    pub budget_sheets: usize,
}

impl Default for ContentCounts {
    fn default() -> Self {
        Self {
            chrome_history: 250,
            firefox_history: 200,
            edge_history: 180,
            history_window_days: 90,
            receipts: 8,
            photos: 15,
            project_proposals: 2,
            training_certificates: 3,
            budget_sheets: 2,
        }
    }
}

/// The immutable configuration of one run. Loaded once, validated
/// before any generator runs, then shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Master seed. None draws a fresh seed per run.
    pub seed: Option<u64>,
    /// The run's "now". None uses the local wall clock.
    pub reference_time: Option<NaiveDateTime>,
    pub identity: IdentityConfig,
    pub filing_status: FilingStatus,
    pub tax_years: Vec<Year>,
    pub holdings: Vec<String>,
    pub etf_holdings: Vec<String>,
    pub bond_holdings: Vec<String>,
    pub applications: Vec<String>,
    pub credential_services: Vec<String>,
    pub brokerage: String,
    pub bank: String,
    pub counts: ContentCounts,
    pub generators: Vec<ArtifactCategory>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            reference_time: None,
            identity: IdentityConfig::default(),
            filing_status: FilingStatus::Single,
            tax_years: DEFAULT_TAX_YEARS.to_vec(),
            holdings: to_strings(&DEFAULT_STOCK_HOLDINGS),
            etf_holdings: to_strings(&DEFAULT_ETF_HOLDINGS),
            bond_holdings: to_strings(&DEFAULT_BOND_HOLDINGS),
            applications: to_strings(&DEFAULT_APPLICATIONS),
            credential_services: to_strings(&DEFAULT_CREDENTIAL_SERVICES),
            brokerage: "Fidelity Investments".into(),
            bank: "Chase".into(),
            counts: ContentCounts::default(),
            generators: ArtifactCategory::ORDER.to_vec(),
        }
    }
}

impl RunConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: RunConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Config with a fixed seed, a fixed reference time and small
    /// counts, for use in tests.
    pub fn default_test() -> Self {
        Self {
            seed: Some(0x5EED_1234),
            reference_time: NaiveDate::from_ymd_opt(2025, 6, 15)
                .and_then(|d| d.and_hms_opt(12, 0, 0)),
            tax_years: vec![2023, 2024],
            holdings: vec!["AAPL".into(), "MSFT".into(), "NVDA".into()],
            etf_holdings: vec!["VTI".into()],
            bond_holdings: vec!["US Treasury 10Y".into()],
            applications: to_strings(&[
                "Google Chrome",
                "Mozilla Firefox",
                "Microsoft Edge",
                "Visual Studio Code",
                "Docker Desktop",
                "Slack",
            ]),
            counts: ContentCounts {
                chrome_history: 60,
                firefox_history: 50,
                edge_history: 40,
                history_window_days: 90,
                receipts: 3,
                photos: 4,
                project_proposals: 1,
                training_certificates: 1,
                budget_sheets: 1,
            },
            ..Self::default()
        }
    }

    pub fn enabled(&self, category: ArtifactCategory) -> bool {
        self.generators.contains(&category)
    }

    /// Field-level validation that needs no persona or clock.
    pub fn validate(&self) -> PopResult<()> {
        if self.generators.is_empty() {
            return Err(PopError::config("generators", "at least one generator must be enabled"));
        }
        if self.generators.contains(&ArtifactCategory::Persona) {
            return Err(PopError::config(
                "generators",
                "persona is always built and cannot be listed as a generator",
            ));
        }
        ensure_unique("generators", self.generators.iter().map(|c| c.name().to_string()))?;

        if let Some(name) = &self.identity.full_name {
            crate::persona::split_name(name)?;
        }
        if let Some(email) = &self.identity.email {
            let valid = email
                .split_once('@')
                .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
                .unwrap_or(false);
            if !valid {
                return Err(PopError::config("identity.email", format!("'{email}' is not an address")));
            }
        }
        if let Some(company) = &self.identity.company_name {
            if company.trim().is_empty() {
                return Err(PopError::config("identity.company_name", "must not be blank"));
            }
        }

        let needs_years = self.enabled(ArtifactCategory::Tax)
            || self.enabled(ArtifactCategory::Investment)
            || self.enabled(ArtifactCategory::Office);
        if needs_years && self.tax_years.is_empty() {
            return Err(PopError::config("tax_years", "must list at least one year"));
        }
        for pair in self.tax_years.windows(2) {
            if pair[0] >= pair[1] {
                return Err(PopError::config(
                    "tax_years",
                    format!("years must be strictly ascending ({} then {})", pair[0], pair[1]),
                ));
            }
        }
        if let Some(year) = self.tax_years.iter().find(|y| !(1970..=9999).contains(*y)) {
            return Err(PopError::config("tax_years", format!("{year} is out of range")));
        }

        if self.enabled(ArtifactCategory::Investment) {
            if self.holdings.is_empty() {
                return Err(PopError::config("holdings", "must list at least one ticker"));
            }
            for (field, list) in [
                ("holdings", &self.holdings),
                ("etf_holdings", &self.etf_holdings),
            ] {
                if let Some(bad) = list.iter().find(|t| !is_ticker(t)) {
                    return Err(PopError::config(field, format!("'{bad}' is not a ticker symbol")));
                }
            }
            if self.bond_holdings.iter().any(|b| b.trim().is_empty()) {
                return Err(PopError::config("bond_holdings", "bond names must not be blank"));
            }
            ensure_unique(
                "holdings",
                self.holdings
                    .iter()
                    .chain(&self.etf_holdings)
                    .chain(&self.bond_holdings)
                    .cloned(),
            )?;
            if self.brokerage.trim().is_empty() {
                return Err(PopError::config("brokerage", "must not be blank"));
            }
        }
        if self.bank.trim().is_empty() {
            return Err(PopError::config("bank", "must not be blank"));
        }
        // One account per institution, so the bank cannot also be the brokerage.
        if self.brokerage.trim().eq_ignore_ascii_case(self.bank.trim()) {
            return Err(PopError::config(
                "brokerage",
                format!("'{}' is also the bank", self.brokerage),
            ));
        }

        if self.enabled(ArtifactCategory::Application) {
            if self.applications.is_empty() {
                return Err(PopError::config("applications", "must list at least one application"));
            }
            if self.applications.iter().any(|a| a.trim().is_empty()) {
                return Err(PopError::config("applications", "application names must not be blank"));
            }
            ensure_unique("applications", self.applications.iter().cloned())?;
        }

        if self.enabled(ArtifactCategory::Credentials) || self.enabled(ArtifactCategory::Browser) {
            if let Some(bad) = self
                .credential_services
                .iter()
                .find(|h| !h.contains('.') || h.contains(char::is_whitespace))
            {
                return Err(PopError::config(
                    "credential_services",
                    format!("'{bad}' is not a host name"),
                ));
            }
            ensure_unique("credential_services", self.credential_services.iter().cloned())?;
        }

        if self.enabled(ArtifactCategory::Browser) {
            let c = &self.counts;
            if c.chrome_history == 0 || c.firefox_history == 0 || c.edge_history == 0 {
                return Err(PopError::config("counts", "browser history counts must be positive"));
            }
            if c.history_window_days <= 0 {
                return Err(PopError::config("counts.history_window_days", "must be positive"));
            }
        }
        Ok(())
    }

    /// Validation that depends on the run's reference time.
    pub fn validate_against(&self, clock: &RunClock) -> PopResult<()> {
        // A return exists only for a year that has ended.
        if let Some(year) = self.tax_years.iter().find(|y| **y >= clock.current_year()) {
            return Err(PopError::config(
                "tax_years",
                format!("{year} has not ended by the reference date {}", clock.today()),
            ));
        }
        if let Some(created) = self.identity.account_created {
            if created >= clock.today() {
                return Err(PopError::config(
                    "identity.account_created",
                    format!("{created} is not before the reference date {}", clock.today()),
                ));
            }
        }
        Ok(())
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn is_ticker(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= 10
        && symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-')
}

fn ensure_unique(field: &str, items: impl Iterator<Item = String>) -> PopResult<()> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.to_lowercase()) {
            return Err(PopError::config(field, format!("'{item}' is listed twice")));
        }
    }
    Ok(())
}
