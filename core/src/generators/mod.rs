//! Domain generator trait and registry.
//!
//! RULE: Every domain generator implements DomainGenerator.
//! The pipeline calls generate() once per run, in the order fixed by
//! ArtifactCategory::ORDER. A generator reads the persona, pulls or
//! creates shared facts through the ledger, and returns finished
//! artifacts. It never writes files and never calls another
//! generator's generate().
//!
//! Shared-fact resolvers (`tax::year_record`, `shared::account`, ...)
//! are plain functions so that any generator can resolve a fact the
//! owning generator has not produced yet; the ledger guarantees it is
//! created only once.

pub mod application;
pub mod browser;
pub mod credentials;
pub mod investment;
pub mod office;
pub mod personal;
pub mod shared;
pub mod tax;

use crate::{
    artifact::Artifact,
    clock::RunClock,
    config::RunConfig,
    error::PopResult,
    ledger::ConsistencyLedger,
    persona::Persona,
    rng::{GeneratorRng, GeneratorSlot},
    types::ArtifactCategory,
};

/// Everything a generator may read.
pub struct GenerationContext<'a> {
    pub persona: &'a Persona,
    pub ledger: &'a ConsistencyLedger,
    pub config: &'a RunConfig,
    pub clock: &'a RunClock,
    /// Artifacts produced by earlier stages, in production order.
    pub manifest: &'a [Artifact],
}

/// The contract every domain generator must fulfill.
pub trait DomainGenerator {
    /// Unique stable name for this generator.
    fn name(&self) -> &'static str;

    fn category(&self) -> ArtifactCategory;

    /// RNG slot. Never changes once assigned.
    fn slot(&self) -> GeneratorSlot;

    /// Produce this category's artifacts.
    ///
    /// - `ctx`: persona, ledger, configuration, clock and manifest
    /// - `rng`: this generator's deterministic RNG stream
    fn generate(
        &mut self,
        ctx: &GenerationContext<'_>,
        rng: &mut GeneratorRng,
    ) -> PopResult<Vec<Artifact>>;
}

/// The generator for one category. Persona is not a generator.
pub fn for_category(category: ArtifactCategory) -> Option<Box<dyn DomainGenerator>> {
    let generator: Box<dyn DomainGenerator> = match category {
        ArtifactCategory::Persona => return None,
        ArtifactCategory::Tax => Box::new(tax::TaxGenerator::new()),
        ArtifactCategory::Investment => Box::new(investment::InvestmentGenerator::new()),
        ArtifactCategory::Credentials => Box::new(credentials::CredentialsGenerator::new()),
        ArtifactCategory::Office => Box::new(office::OfficeGenerator::new()),
        ArtifactCategory::Personal => Box::new(personal::PersonalGenerator::new()),
        ArtifactCategory::Application => Box::new(application::ApplicationGenerator::new()),
        ArtifactCategory::Browser => Box::new(browser::BrowserGenerator::new()),
    };
    Some(generator)
}

/// Folder-safe form of a display name: `"Python 3.11"` -> `"Python_3.11"`.
pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '+' { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// A persona, ledger and clock for generator unit tests.
#[cfg(test)]
pub(crate) mod fixture {
    use super::GenerationContext;
    use crate::{
        clock::RunClock,
        config::RunConfig,
        ledger::ConsistencyLedger,
        persona::{Persona, PersonaBuilder},
        rng::{GeneratorRng, GeneratorSlot, RngBank},
    };

    pub struct Fixture {
        pub persona: Persona,
        pub ledger: ConsistencyLedger,
        pub config: RunConfig,
        pub clock: RunClock,
        pub bank: RngBank,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self::with_config(RunConfig::default_test())
        }

        pub fn with_config(config: RunConfig) -> Self {
            let clock = RunClock::new(config.reference_time.expect("test config fixes the clock"));
            let bank = RngBank::new(config.seed.expect("test config fixes the seed"));
            let persona = PersonaBuilder::new(&config.identity, &clock)
                .build(&mut bank.for_generator(GeneratorSlot::Persona))
                .expect("persona");
            Self {
                persona,
                ledger: ConsistencyLedger::new(),
                config,
                clock,
                bank,
            }
        }

        pub fn ctx(&self) -> GenerationContext<'_> {
            GenerationContext {
                persona: &self.persona,
                ledger: &self.ledger,
                config: &self.config,
                clock: &self.clock,
                manifest: &[],
            }
        }

        pub fn rng(&self, slot: GeneratorSlot) -> GeneratorRng {
            self.bank.for_generator(slot)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ordered_category_has_a_generator() {
        for category in ArtifactCategory::ORDER {
            let generator = for_category(category).expect("generator registered");
            assert_eq!(generator.category(), category);
            assert_eq!(generator.name(), category.name());
        }
        assert!(for_category(ArtifactCategory::Persona).is_none());
    }

    #[test]
    fn safe_name_replaces_separators() {
        assert_eq!(safe_name("Python 3.11"), "Python_3.11");
        assert_eq!(safe_name("Notepad++"), "Notepad++");
        assert_eq!(safe_name("Adobe Acrobat Reader DC"), "Adobe_Acrobat_Reader_DC");
    }
}
