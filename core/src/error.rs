use crate::types::ArtifactCategory;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PopError {
    #[error("Configuration error in '{field}': {reason}")]
    Configuration { field: String, reason: String },

    #[error("Consistency violation in {category}: {reason}")]
    ConsistencyViolation {
        category: ArtifactCategory,
        reason: String,
    },

    #[error("Cannot write {}: {source}", path.display())]
    GenerationIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Generation of {category} artifacts failed: {source}")]
    StageFailed {
        category: ArtifactCategory,
        #[source]
        source: Box<PopError>,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PopError {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn violation(category: ArtifactCategory, reason: impl Into<String>) -> Self {
        Self::ConsistencyViolation {
            category,
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::GenerationIo {
            path: path.into(),
            source,
        }
    }

    /// Attach the failing artifact category. Errors that already name
    /// their category pass through unchanged.
    pub fn in_stage(self, category: ArtifactCategory) -> Self {
        match self {
            e @ (Self::ConsistencyViolation { .. } | Self::StageFailed { .. }) => e,
            other => Self::StageFailed {
                category,
                source: Box::new(other),
            },
        }
    }

    /// The error below any stage wrapping.
    pub fn root(&self) -> &PopError {
        match self {
            Self::StageFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// The artifact category the run failed in, if it got that far.
    pub fn category(&self) -> Option<ArtifactCategory> {
        match self {
            Self::StageFailed { category, .. } | Self::ConsistencyViolation { category, .. } => {
                Some(*category)
            }
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Configuration { .. } => true,
            Self::StageFailed { source, .. } => source.is_configuration(),
            _ => false,
        }
    }
}

pub type PopResult<T> = Result<T, PopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_keeps_configuration_exit_class() {
        let err = PopError::config("tax_years", "2021 precedes the account").in_stage(ArtifactCategory::Tax);
        assert!(err.is_configuration());
        assert_eq!(err.category(), Some(ArtifactCategory::Tax));
        assert!(matches!(err.root(), PopError::Configuration { field, .. } if field == "tax_years"));
        assert!(err.to_string().starts_with("Generation of tax artifacts failed"));
    }

    #[test]
    fn violation_keeps_its_own_category() {
        let err = PopError::violation(ArtifactCategory::Application, "collision")
            .in_stage(ArtifactCategory::Browser);
        assert_eq!(err.category(), Some(ArtifactCategory::Application));
        assert!(!err.is_configuration());
    }
}
