//! Shared fact records.
//!
//! RULE: A fact that surfaces in more than one artifact is one of
//! these records, stored once in the ConsistencyLedger.
//! Generators read them back; they never recompute them.

use crate::{config::FilingStatus, money::Money, types::Year};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ── Employment & tax ──────────────────────────────────────────

/// Terms of the persona's employment, fixed at hire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentRecord {
    pub employer: String,
    pub employee_id: String,
    pub hire_date: NaiveDate,
    pub starting_salary: Money,
    pub manager: String,
}

/// All figures of one tax year. `federal_refund` and `state_refund` are
/// signed: negative means an amount owed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialYearRecord {
    pub year: Year,
    pub filing_status: FilingStatus,
    pub wages: Money,
    pub standard_deduction: Money,
    pub taxable_income: Money,
    pub federal_withholding: Money,
    pub federal_liability: Money,
    pub federal_refund: Money,
    pub social_security_wages: Money,
    pub social_security_tax: Money,
    pub medicare_tax: Money,
    pub state_wages: Money,
    pub state_withholding: Money,
    pub state_liability: Money,
    pub state_refund: Money,
}

/// Dividends and interest of one year, shared by the 1040 and the
/// brokerage statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentIncome {
    pub year: Year,
    pub ordinary_dividends: Money,
    pub qualified_dividends: Money,
    pub interest: Money,
}

// ── Accounts ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Brokerage,
    Checking,
}

impl AccountKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Brokerage => "Individual Brokerage",
            Self::Checking => "Personal Checking",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub institution: String,
    pub number: String,
    pub routing_number: String,
    pub kind: AccountKind,
    pub opened: NaiveDate,
    pub opening_balance: Money,
}

impl Account {
    /// `****1234`, the form statements and receipts print.
    pub fn masked(&self) -> String {
        let tail = &self.number[self.number.len().saturating_sub(4)..];
        format!("****{tail}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCard {
    pub network: String,
    pub last_four: String,
    pub expires: String,
}

// ── Credentials & applications ───────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub service: String,
    pub host: String,
    pub username: String,
    pub email: String,
    pub secret: String,
    pub created: NaiveDate,
    /// Access key id for services that pair one with the secret.
    pub key_id: Option<String>,
    pub times_used: u32,
}

impl CredentialEntry {
    /// The login name a site form expects: username where the
    /// service has one, otherwise the email address.
    pub fn login(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub name: String,
    /// File-system safe form of the name, used for footprint folders.
    pub safe_name: String,
    pub publisher: String,
    pub version: String,
    pub installed_at: NaiveDateTime,
    pub last_used: NaiveDateTime,
    pub size_mb: u32,
    /// Ascending, all strictly after `installed_at`.
    pub sessions: Vec<NaiveDateTime>,
    pub installer_file: String,
    pub installer_bytes: u64,
    pub program_dir: String,
    pub appdata_dir: String,
}
