//! Shared primitive types used across the entire populator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical run identifier.
pub type RunId = String;

/// A calendar year (tax year, statement year).
pub type Year = i32;

/// One category of generated artifacts. Every domain generator owns
/// exactly one category; errors and summaries are reported per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactCategory {
    Persona,
    Tax,
    Investment,
    Credentials,
    Office,
    Personal,
    Application,
    Browser,
}

impl ArtifactCategory {
    /// Execution order of the pipeline. Never reorder: later categories
    /// cite facts and files produced by earlier ones.
    pub const ORDER: [ArtifactCategory; 7] = [
        ArtifactCategory::Tax,
        ArtifactCategory::Investment,
        ArtifactCategory::Credentials,
        ArtifactCategory::Office,
        ArtifactCategory::Personal,
        ArtifactCategory::Application,
        ArtifactCategory::Browser,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Persona     => "persona",
            Self::Tax         => "tax",
            Self::Investment  => "investment",
            Self::Credentials => "credentials",
            Self::Office      => "office",
            Self::Personal    => "personal",
            Self::Application => "application",
            Self::Browser     => "browser",
        }
    }
}

impl fmt::Display for ArtifactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
