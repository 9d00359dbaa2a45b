//! Consistency ledger: the run-scoped registry of shared facts.
//!
//! RULE: Every fact surfaced by more than one artifact is obtained
//! through `get_or_create`. The factory for a key runs at most once
//! per run; a failing factory leaves the key unset.
//!
//! Locking: the key map is held only long enough to find or insert the
//! key's slot. The slot's own mutex is held while the factory runs, so
//! concurrent callers of the same key wait for the first one instead of
//! racing it, while factories for other keys (including ones the
//! factory itself resolves) proceed independently.
//! A factory must never request its own key.

use crate::{
    error::{PopError, PopResult},
    facts::{
        Account, ApplicationRecord, CredentialEntry, EmploymentRecord, FinancialYearRecord,
        InvestmentIncome, PaymentCard,
    },
    types::{ArtifactCategory, Year},
};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Composite ledger key: `(category, sub-identifier)`,
/// e.g. `("account", "Chase")` or `("tax_year", "2024")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FactKey {
    pub category: &'static str,
    pub id: String,
}

impl FactKey {
    pub fn new(category: &'static str, id: impl Into<String>) -> Self {
        Self {
            category,
            id: id.into(),
        }
    }

    pub fn tax_year(year: Year) -> Self {
        Self::new("tax_year", year.to_string())
    }

    pub fn investment_income(year: Year) -> Self {
        Self::new("investment_income", year.to_string())
    }

    pub fn account(institution: &str) -> Self {
        Self::new("account", institution)
    }

    pub fn employment(employer: &str) -> Self {
        Self::new("employment", employer)
    }

    pub fn credential(service: &str) -> Self {
        Self::new("credential", service)
    }

    pub fn application(name: &str) -> Self {
        Self::new("application", name)
    }

    pub fn payment_card(label: &str) -> Self {
        Self::new("payment_card", label)
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.id)
    }
}

/// Every kind of value the ledger stores.
#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    Employment(EmploymentRecord),
    TaxYear(FinancialYearRecord),
    InvestmentIncome(InvestmentIncome),
    Account(Account),
    PaymentCard(PaymentCard),
    Credential(CredentialEntry),
    Application(ApplicationRecord),
}

/// Typed access to one `Fact` variant.
pub trait LedgerFact: Clone + Sized {
    /// The generator category that owns this kind of fact.
    const OWNER: ArtifactCategory;
    fn into_fact(self) -> Fact;
    fn from_fact(fact: &Fact) -> Option<Self>;
}

macro_rules! ledger_fact {
    ($ty:ty, $variant:ident, $owner:expr) => {
        impl LedgerFact for $ty {
            const OWNER: ArtifactCategory = $owner;

            fn into_fact(self) -> Fact {
                Fact::$variant(self)
            }

            fn from_fact(fact: &Fact) -> Option<Self> {
                match fact {
                    Fact::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

ledger_fact!(EmploymentRecord, Employment, ArtifactCategory::Tax);
ledger_fact!(FinancialYearRecord, TaxYear, ArtifactCategory::Tax);
ledger_fact!(InvestmentIncome, InvestmentIncome, ArtifactCategory::Investment);
ledger_fact!(Account, Account, ArtifactCategory::Investment);
ledger_fact!(PaymentCard, PaymentCard, ArtifactCategory::Personal);
ledger_fact!(CredentialEntry, Credential, ArtifactCategory::Credentials);
ledger_fact!(ApplicationRecord, Application, ArtifactCategory::Application);

type Slot = Arc<Mutex<Option<Fact>>>;

#[derive(Default)]
pub struct ConsistencyLedger {
    slots: Mutex<HashMap<FactKey, Slot>>,
    /// identifier value -> the key that owns it
    claims: Mutex<HashMap<String, FactKey>>,
    /// fact key -> artifact paths that surface it
    citations: Mutex<BTreeMap<FactKey, BTreeSet<String>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConsistencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value stored under `key`, creating it with `factory`
    /// if it has never been created. Concurrent callers of one key see
    /// a single factory invocation.
    pub fn get_or_create<T, F>(&self, key: FactKey, factory: F) -> PopResult<T>
    where
        T: LedgerFact,
        F: FnOnce() -> PopResult<T>,
    {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let mut guard = lock(&slot);
        if let Some(fact) = guard.as_ref() {
            return T::from_fact(fact).ok_or_else(|| mismatch::<T>(&key, fact));
        }

        let value = factory()?;
        log::debug!("ledger: created {key}");
        *guard = Some(value.clone().into_fact());
        Ok(value)
    }

    /// Read a fact without creating it.
    pub fn get<T: LedgerFact>(&self, key: &FactKey) -> PopResult<Option<T>> {
        let Some(slot) = lock(&self.slots).get(key).cloned() else {
            return Ok(None);
        };
        let guard = lock(&slot);
        match guard.as_ref() {
            Some(fact) => T::from_fact(fact).map(Some).ok_or_else(|| mismatch::<T>(key, fact)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, key: &FactKey) -> bool {
        let slot = lock(&self.slots).get(key).cloned();
        slot.map(|s| lock(&s).is_some()).unwrap_or(false)
    }

    /// Reserve `value` as an identifier of `owner`. Claiming a value
    /// already held by a different key is a consistency violation;
    /// re-claiming for the same key is a no-op.
    pub fn claim_identifier(
        &self,
        category: ArtifactCategory,
        value: &str,
        owner: &FactKey,
    ) -> PopResult<()> {
        let mut claims = lock(&self.claims);
        match claims.get(value) {
            Some(existing) if existing == owner => Ok(()),
            Some(existing) => Err(PopError::violation(
                category,
                format!("identifier '{value}' already belongs to {existing}, requested by {owner}"),
            )),
            None => {
                claims.insert(value.to_string(), owner.clone());
                Ok(())
            }
        }
    }

    /// Whether `value` has been claimed by any key.
    pub fn is_claimed(&self, value: &str) -> bool {
        lock(&self.claims).contains_key(value)
    }

    /// Record that `artifact` surfaces the fact under `key`.
    pub fn cite(&self, key: &FactKey, artifact: impl Into<String>) {
        lock(&self.citations)
            .entry(key.clone())
            .or_default()
            .insert(artifact.into());
    }

    /// Artifacts citing each fact, ordered by key then path.
    pub fn citations(&self) -> BTreeMap<FactKey, Vec<String>> {
        lock(&self.citations)
            .iter()
            .map(|(k, paths)| (k.clone(), paths.iter().cloned().collect()))
            .collect()
    }

    pub fn citations_of(&self, key: &FactKey) -> Vec<String> {
        lock(&self.citations)
            .get(key)
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Keys holding a value, sorted.
    pub fn keys(&self) -> Vec<FactKey> {
        let slots: Vec<(FactKey, Slot)> = lock(&self.slots)
            .iter()
            .map(|(k, slot)| (k.clone(), Arc::clone(slot)))
            .collect();
        let mut keys: Vec<FactKey> = slots
            .into_iter()
            .filter(|(_, slot)| lock(slot).is_some())
            .map(|(k, _)| k)
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn mismatch<T: LedgerFact>(key: &FactKey, found: &Fact) -> PopError {
    let found = match found {
        Fact::Employment(_) => "employment",
        Fact::TaxYear(_) => "tax year",
        Fact::InvestmentIncome(_) => "investment income",
        Fact::Account(_) => "account",
        Fact::PaymentCard(_) => "payment card",
        Fact::Credential(_) => "credential",
        Fact::Application(_) => "application",
    };
    PopError::violation(
        T::OWNER,
        format!("ledger key {key} holds a {found} record, not the requested kind"),
    )
}
