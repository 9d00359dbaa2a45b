//! The generation pipeline: one run, start to finish.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   0. Persona          (built once, not a generator)
//!   1. Tax
//!   2. Investment
//!   3. Credentials
//!   4. Office
//!   5. Personal
//!   6. Application
//!   7. Browser
//!
//! RULES:
//!   - Configuration is validated before anything touches the disk.
//!   - Generators run in ArtifactCategory::ORDER, each with its own RNG slot.
//!   - A stage's artifacts are written before the next stage starts.
//!   - The first failing stage aborts the run; files already written stay.

use crate::{
    artifact::Artifact,
    clock::RunClock,
    config::RunConfig,
    error::{PopError, PopResult},
    generators::{self, GenerationContext},
    layout::OutputLayout,
    ledger::ConsistencyLedger,
    persona::{Persona, PersonaBuilder},
    rng::{GeneratorSlot, RngBank},
    types::{ArtifactCategory, RunId},
    writer::{ArtifactWriter, FileSink, MemorySink},
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Where a memory run pretends its home directory is.
const MEMORY_ROOT: &str = "sandbox";

/// What a finished run reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub seed: u64,
    pub reference_time: NaiveDateTime,
    pub home: PathBuf,
    pub persona: String,
    pub username: String,
    pub email: String,
    pub account_created: chrono::NaiveDate,
    pub files_per_category: BTreeMap<ArtifactCategory, usize>,
    pub files_written: usize,
    pub bytes_written: u64,
    pub ledger_facts: usize,
    /// Fact key -> display paths of the artifacts surfacing it.
    pub citations: BTreeMap<String, Vec<String>>,
}

/// Everything a run produced, for callers that inspect more than the summary.
pub struct RunOutput {
    pub summary: RunSummary,
    pub persona: Persona,
    pub ledger: ConsistencyLedger,
    pub manifest: Vec<Artifact>,
}

pub struct Pipeline<'c> {
    config: &'c RunConfig,
    layout: OutputLayout,
    clock: RunClock,
    seed: u64,
}

impl<'c> Pipeline<'c> {
    /// Validate `config` and fix the run's seed and clock.
    pub fn new(config: &'c RunConfig, layout: OutputLayout) -> PopResult<Self> {
        config.validate()?;
        let clock = config
            .reference_time
            .map(RunClock::new)
            .unwrap_or_else(RunClock::system);
        config.validate_against(&clock)?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(Self {
            config,
            layout,
            clock,
            seed,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Run every enabled stage, handing each artifact to `sink`.
    pub fn execute<W: ArtifactWriter>(&self, sink: &mut W) -> PopResult<RunOutput> {
        let run_id = format!("run-{:016x}", self.seed);
        log::info!(
            "{run_id}: home {} at {}",
            self.layout.home.display(),
            self.clock.now().format("%Y-%m-%d %H:%M:%S")
        );

        let bank = RngBank::new(self.seed);
        let persona = PersonaBuilder::new(&self.config.identity, &self.clock)
            .build(&mut bank.for_generator(GeneratorSlot::Persona))
            .map_err(|e| e.in_stage(ArtifactCategory::Persona))?;
        log::info!(
            "persona: {} <{}> employed at {} since {}, account created {}",
            persona.full_name,
            persona.email,
            persona.employer.name,
            persona.employer.hire_date,
            persona.account_created
        );

        let ledger = ConsistencyLedger::new();
        let mut manifest: Vec<Artifact> = Vec::new();
        let mut files_per_category = BTreeMap::new();
        let mut bytes_written = 0u64;

        for category in ArtifactCategory::ORDER {
            if !self.config.enabled(category) {
                log::info!("{category}: disabled, skipped");
                continue;
            }
            let Some(mut generator) = generators::for_category(category) else {
                continue;
            };

            let artifacts = {
                let ctx = GenerationContext {
                    persona: &persona,
                    ledger: &ledger,
                    config: self.config,
                    clock: &self.clock,
                    manifest: &manifest,
                };
                let mut rng = bank.for_generator(generator.slot()).with_name(generator.name());
                generator
                    .generate(&ctx, &mut rng)
                    .map_err(|e| e.in_stage(category))?
            };

            for artifact in &artifacts {
                let path = self.layout.path_for(artifact.location, &artifact.relative_path);
                bytes_written += sink.write(artifact, &path).map_err(|e| e.in_stage(category))?;
                for key in &artifact.cites {
                    ledger.cite(key, artifact.display_path());
                }
            }
            log::info!("{category}: wrote {} files", artifacts.len());
            files_per_category.insert(category, artifacts.len());
            manifest.extend(artifacts);
        }

        let summary = RunSummary {
            run_id,
            seed: self.seed,
            reference_time: self.clock.now(),
            home: self.layout.home.clone(),
            persona: persona.full_name.clone(),
            username: persona.username.clone(),
            email: persona.email.clone(),
            account_created: persona.account_created,
            files_written: manifest.len(),
            files_per_category,
            bytes_written,
            ledger_facts: ledger.len(),
            citations: ledger
                .citations()
                .into_iter()
                .map(|(key, paths)| (key.to_string(), paths))
                .collect(),
        };
        log::info!(
            "{}: {} files, {} bytes, {} ledger facts",
            summary.run_id,
            summary.files_written,
            summary.bytes_written,
            summary.ledger_facts
        );
        Ok(RunOutput {
            summary,
            persona,
            ledger,
            manifest,
        })
    }
}

/// Populate `target` (or the resolved profile folder) on disk.
pub fn run(target: Option<&Path>, config: &RunConfig) -> PopResult<RunSummary> {
    let pipeline = Pipeline::new(config, OutputLayout::resolve(target))?;
    let dirs = pipeline.layout().create_skeleton()?;
    log::info!("layout: {dirs} skeleton directories ready");

    let mut sink = FileSink::new();
    let output = pipeline.execute(&mut sink)?;
    Ok(output.summary)
}

/// The same run against an in-memory sink. Nothing touches the disk.
pub fn generate(config: &RunConfig) -> PopResult<(RunOutput, MemorySink)> {
    let pipeline = Pipeline::new(config, OutputLayout::rooted(Path::new(MEMORY_ROOT)))?;
    let mut sink = MemorySink::new();
    let output = pipeline.execute(&mut sink)?;
    Ok((output, sink))
}

/// Exit code for a failed run: 2 for configuration errors, 1 otherwise.
pub fn exit_code(err: &PopError) -> i32 {
    if err.is_configuration() {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_run_writes_every_category() {
        let config = RunConfig::default_test();
        let (output, sink) = generate(&config).unwrap();

        for category in ArtifactCategory::ORDER {
            assert!(
                output.summary.files_per_category.get(&category).copied().unwrap_or(0) > 0,
                "{category} produced no files"
            );
        }
        assert_eq!(sink.len(), output.summary.files_written);
        assert!(sink.find("Downloads/Download_History.txt").is_some());
    }

    #[test]
    fn disabled_stage_is_skipped() {
        let mut config = RunConfig::default_test();
        config.generators = vec![ArtifactCategory::Tax, ArtifactCategory::Office];
        let (output, _) = generate(&config).unwrap();
        assert_eq!(
            output.summary.files_per_category.keys().copied().collect::<Vec<_>>(),
            vec![ArtifactCategory::Tax, ArtifactCategory::Office]
        );
    }

    #[test]
    fn invalid_config_fails_before_generation() {
        let mut config = RunConfig::default_test();
        config.generators.clear();
        let err = generate(&config).err().expect("empty generator list is rejected");
        assert!(err.is_configuration());
        assert_eq!(exit_code(&err), 2);
    }
}
