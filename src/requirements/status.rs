//! Composite status sets for preflight checks.
//!
//! A check run produces a [`StatusSet`] holding every item that failed, in
//! the order the checks ran. The set is a typed collection; the legacy
//! one-character codes consumed by older agents are produced only by
//! [`StatusSet::legacy_code`].

use crate::config::RuntimeDependency;

/// Code reported when nothing is missing.
pub const SUCCESS_SENTINEL: &str = "0";

/// An item that can appear in a status set.
pub trait Tagged {
    /// One-character legacy tag.
    fn tag(&self) -> char;

    /// Human-readable name.
    fn label(&self) -> &str;
}

/// A prerequisite of the install workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prerequisite {
    /// The package manager executable is not on the execution path.
    PackageManager {
        /// Executable name
        executable: String,
        /// Legacy tag
        tag: char,
    },
    /// A runtime component is not installed.
    Runtime(RuntimeDependency),
}

impl Tagged for Prerequisite {
    fn tag(&self) -> char {
        match self {
            Prerequisite::PackageManager { tag, .. } => *tag,
            Prerequisite::Runtime(dep) => dep.tag,
        }
    }

    fn label(&self) -> &str {
        match self {
            Prerequisite::PackageManager { executable, .. } => executable,
            Prerequisite::Runtime(dep) => &dep.name,
        }
    }
}

/// Missing items collected by a check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSet<T> {
    missing: Vec<T>,
}

impl<T> Default for StatusSet<T> {
    fn default() -> Self {
        Self {
            missing: Vec::new(),
        }
    }
}

impl<T: Tagged> StatusSet<T> {
    /// Create an empty (successful) set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a missing item. Items with an already-recorded tag are ignored.
    pub fn insert(&mut self, item: T) {
        if !self.contains_tag(item.tag()) {
            self.missing.push(item);
        }
    }

    /// Whether nothing is missing.
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }

    /// Missing items in check order.
    pub fn missing(&self) -> &[T] {
        &self.missing
    }

    /// Whether an item with this tag is missing.
    pub fn contains_tag(&self, tag: char) -> bool {
        self.missing.iter().any(|m| m.tag() == tag)
    }

    /// Names of the missing items.
    pub fn labels(&self) -> Vec<&str> {
        self.missing.iter().map(Tagged::label).collect()
    }

    /// Legacy encoding: `"0"` on success, else every missing tag in order.
    pub fn legacy_code(&self) -> String {
        if self.is_ok() {
            SUCCESS_SENTINEL.to_string()
        } else {
            self.missing.iter().map(Tagged::tag).collect()
        }
    }
}

/// Result of the prerequisite checker.
pub type PrerequisiteStatus = StatusSet<Prerequisite>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DependencySource;

    fn runtime(name: &str, tag: char) -> Prerequisite {
        Prerequisite::Runtime(RuntimeDependency {
            name: name.to_string(),
            tag,
            pattern: format!("{}*", name),
            source: DependencySource::AppxPackage,
        })
    }

    #[test]
    fn empty_set_is_success_sentinel() {
        let status = PrerequisiteStatus::new();
        assert!(status.is_ok());
        assert_eq!(status.legacy_code(), "0");
        assert!(status.labels().is_empty());
    }

    #[test]
    fn legacy_code_keeps_check_order() {
        let mut status = PrerequisiteStatus::new();
        status.insert(Prerequisite::PackageManager {
            executable: "winget.exe".to_string(),
            tag: 'W',
        });
        status.insert(runtime("UI.Xaml", 'X'));
        status.insert(runtime("VCLibs", 'V'));

        assert!(!status.is_ok());
        assert_eq!(status.legacy_code(), "WXV");
        assert_eq!(status.labels(), vec!["winget.exe", "UI.Xaml", "VCLibs"]);
    }

    #[test]
    fn duplicate_tags_are_recorded_once() {
        let mut status = PrerequisiteStatus::new();
        status.insert(runtime("VCLibs", 'V'));
        status.insert(runtime("VCLibs", 'V'));

        assert_eq!(status.missing().len(), 1);
        assert!(status.contains_tag('V'));
        assert!(!status.contains_tag('X'));
    }
}
