//! Output layout: where each artifact location lives on disk.
//!
//! Resolution order for the home root:
//!   1. the explicit target directory
//!   2. USERPROFILE, then HOME
//!   3. the current directory
//!
//! AppData and Program Files follow LOCALAPPDATA / APPDATA / ProgramFiles
//! only when no explicit target was given; otherwise they nest under
//! the target so a sandbox image stays self-contained.

use crate::{
    artifact::Location,
    error::{PopError, PopResult},
};
use std::path::{Path, PathBuf};

/// Relative skeleton under the home root. Paths are a compatibility
/// surface for harnesses that inspect specific locations.
pub const SKELETON: &[&str] = &[
    "Desktop",
    "Desktop/Tax Documents",
    "Desktop/Investments",
    "Desktop/Office",
    "Desktop/Office/Reports",
    "Desktop/Office/Presentations",
    "Desktop/Office/Spreadsheets",
    "Desktop/Office/Projects",
    "Desktop/Personal",
    "Desktop/Personal/Music",
    "Desktop/Personal/Photos",
    "Desktop/Personal/Health",
    "Desktop/Personal/Receipts",
    "Documents",
    "Documents/Work",
    "Documents/Work/Projects",
    "Documents/Work/Meetings",
    "Documents/Work/Budgets",
    "Documents/Work/Performance_Reviews",
    "Documents/Work/Training_Materials",
    "Documents/Personal",
    "Documents/Personal/Finances",
    "Documents/Personal/Medical",
    "Documents/Personal/Insurance",
    "Documents/Personal/Recipes",
    "Documents/Technical_Docs",
    "Documents/Code_Snippets",
    "Documents/Credentials",
    "Documents/Invoices",
    "Documents/Contracts",
    "Downloads",
    "Downloads/Software_Installers",
    "Downloads/Documentation",
    "Downloads/Archive",
    "Downloads/Temp",
    "Pictures",
    "Music",
    "Videos",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub home: PathBuf,
    pub local_appdata: PathBuf,
    pub roaming_appdata: PathBuf,
    pub program_files: PathBuf,
}

impl OutputLayout {
    /// Resolve from the process environment.
    pub fn resolve(target: Option<&Path>) -> Self {
        Self::resolve_with(target, |name| std::env::var(name).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve_with(target: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        match target {
            Some(root) => Self::rooted(root),
            None => {
                let home = non_empty("USERPROFILE")
                    .or_else(|| non_empty("HOME"))
                    .unwrap_or_else(|| PathBuf::from("."));
                let base = Self::rooted(&home);
                Self {
                    local_appdata: non_empty("LOCALAPPDATA").unwrap_or(base.local_appdata),
                    roaming_appdata: non_empty("APPDATA").unwrap_or(base.roaming_appdata),
                    program_files: non_empty("ProgramFiles").unwrap_or(base.program_files),
                    home,
                }
            }
        }
    }

    /// Every location nested under one root.
    pub fn rooted(root: &Path) -> Self {
        Self {
            home: root.to_path_buf(),
            local_appdata: root.join("AppData").join("Local"),
            roaming_appdata: root.join("AppData").join("Roaming"),
            program_files: root.join("Program Files"),
        }
    }

    pub fn root_of(&self, location: Location) -> &Path {
        match location {
            Location::Home => &self.home,
            Location::LocalAppData => &self.local_appdata,
            Location::RoamingAppData => &self.roaming_appdata,
            Location::ProgramFiles => &self.program_files,
        }
    }

    pub fn path_for(&self, location: Location, relative: &Path) -> PathBuf {
        self.root_of(location).join(relative)
    }

    /// Absolute skeleton directories, in creation order.
    pub fn skeleton(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = SKELETON.iter().map(|rel| self.home.join(rel)).collect();
        dirs.push(self.local_appdata.clone());
        dirs.push(self.roaming_appdata.clone());
        dirs.push(self.program_files.clone());
        dirs
    }

    /// Create the skeleton. Returns the number of directories ensured.
    pub fn create_skeleton(&self) -> PopResult<usize> {
        let dirs = self.skeleton();
        for dir in &dirs {
            std::fs::create_dir_all(dir).map_err(|e| PopError::io(dir, e))?;
        }
        log::debug!("layout: ensured {} skeleton directories under {}", dirs.len(), self.home.display());
        Ok(dirs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn explicit_target_wins_over_environment() {
        let layout = OutputLayout::resolve_with(
            Some(Path::new("/sandbox")),
            env(&[("USERPROFILE", "C:/Users/x"), ("LOCALAPPDATA", "C:/Users/x/AppData/Local")]),
        );
        assert_eq!(layout.home, PathBuf::from("/sandbox"));
        assert_eq!(layout.local_appdata, PathBuf::from("/sandbox/AppData/Local"));
        assert_eq!(layout.program_files, PathBuf::from("/sandbox/Program Files"));
    }

    #[test]
    fn falls_back_through_profile_variables() {
        let layout = OutputLayout::resolve_with(None, env(&[("HOME", "/home/x")]));
        assert_eq!(layout.home, PathBuf::from("/home/x"));
        assert_eq!(layout.roaming_appdata, PathBuf::from("/home/x/AppData/Roaming"));

        let layout = OutputLayout::resolve_with(None, env(&[("USERPROFILE", "/u"), ("HOME", "/h")]));
        assert_eq!(layout.home, PathBuf::from("/u"));

        let layout = OutputLayout::resolve_with(None, env(&[("HOME", "  ")]));
        assert_eq!(layout.home, PathBuf::from("."));
    }

    #[test]
    fn platform_folders_apply_without_target() {
        let layout = OutputLayout::resolve_with(
            None,
            env(&[("HOME", "/h"), ("APPDATA", "/roam"), ("ProgramFiles", "/pf")]),
        );
        assert_eq!(layout.roaming_appdata, PathBuf::from("/roam"));
        assert_eq!(layout.program_files, PathBuf::from("/pf"));
        assert_eq!(layout.local_appdata, PathBuf::from("/h/AppData/Local"));
    }

    #[test]
    fn skeleton_is_created_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::rooted(dir.path());
        let n = layout.create_skeleton().unwrap();
        assert_eq!(n, SKELETON.len() + 3);
        assert!(dir.path().join("Documents/Credentials").is_dir());
        assert!(dir.path().join("AppData/Roaming").is_dir());
        assert!(dir.path().join("Program Files").is_dir());
    }
}
