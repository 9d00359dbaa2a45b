//! Finished artifact records handed from generators to writers.
//!
//! RULE: An Artifact is fully rendered data. Writers turn it into
//! bytes without consulting the persona or the ledger.

use crate::{ledger::FactKey, types::ArtifactCategory};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Which root of the output layout an artifact path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Home,
    LocalAppData,
    RoamingAppData,
    ProgramFiles,
}

/// A titled document rendered as PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub lines: Vec<String>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    /// `label ............ value`, padded to a fixed column.
    pub fn field(&mut self, label: &str, value: impl std::fmt::Display) -> &mut Self {
        self.lines.push(format!("{label:<52}{value:>18}"));
        self
    }

    pub fn heading(&mut self, heading: &str) -> &mut Self {
        self.lines.push(String::new());
        self.lines.push(heading.to_uppercase());
        self.lines.push("-".repeat(heading.len().max(8)));
        self
    }
}

/// Rows and columns rendered as CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }
}

/// All visits to one URL in a browser profile.
#[derive(Debug, Clone, PartialEq)]
pub struct PageVisits {
    pub site: String,
    pub url: String,
    pub title: String,
    pub typed_count: u32,
    /// Ascending.
    pub visits: Vec<NaiveDateTime>,
    /// Seconds spent on the page, parallel to `visits`.
    pub durations: Vec<u32>,
}

impl PageVisits {
    pub fn visit_count(&self) -> usize {
        self.visits.len()
    }

    pub fn last_visit(&self) -> Option<NaiveDateTime> {
        self.visits.last().copied()
    }
}

/// Browsing history of one profile, most visited page first.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStore {
    pub pages: Vec<PageVisits>,
}

impl HistoryStore {
    pub fn visit_total(&self) -> usize {
        self.pages.iter().map(PageVisits::visit_count).sum()
    }
}

/// The polymorphic payload. One writer variant exists per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Text(String),
    Report(Report),
    Workbook(Table),
    Json(serde_json::Value),
    Binary(Vec<u8>),
    ChromiumHistory(HistoryStore),
    FirefoxHistory(HistoryStore),
}

impl Record {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Report(_) => "pdf",
            Self::Workbook(_) => "csv",
            Self::Json(_) => "json",
            Self::Binary(_) => "binary",
            Self::ChromiumHistory(_) => "chromium-history",
            Self::FirefoxHistory(_) => "firefox-places",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub category: ArtifactCategory,
    pub location: Location,
    pub relative_path: PathBuf,
    pub record: Record,
    /// Ledger facts this artifact surfaces.
    pub cites: Vec<FactKey>,
}

impl Artifact {
    pub fn new(
        category: ArtifactCategory,
        location: Location,
        relative_path: impl Into<PathBuf>,
        record: Record,
    ) -> Self {
        Self {
            category,
            location,
            relative_path: relative_path.into(),
            record,
            cites: Vec::new(),
        }
    }

    /// Artifact under the home directory.
    pub fn home(category: ArtifactCategory, relative_path: impl Into<PathBuf>, record: Record) -> Self {
        Self::new(category, Location::Home, relative_path, record)
    }

    pub fn citing(mut self, key: FactKey) -> Self {
        if !self.cites.contains(&key) {
            self.cites.push(key);
        }
        self
    }

    pub fn file_name(&self) -> String {
        self.relative_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Stable display form: location prefix plus forward-slash path.
    pub fn display_path(&self) -> String {
        let prefix = match self.location {
            Location::Home => "~",
            Location::LocalAppData => "%LOCALAPPDATA%",
            Location::RoamingAppData => "%APPDATA%",
            Location::ProgramFiles => "%ProgramFiles%",
        };
        format!("{prefix}/{}", slash_path(&self.relative_path))
    }
}

pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
