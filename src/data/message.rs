//! Commit message as returned by the model.

use serde::{Deserialize, Serialize};

/// A dependency name and version pair.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Dependency {
    /// Package name.
    #[serde(default)]
    pub name: String,
    /// Version the change moved to (or from, for removals).
    #[serde(default)]
    pub version: String,
}

/// Dependency changes grouped by kind.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DependencyChanges {
    /// Newly introduced dependencies.
    pub added: Vec<Dependency>,
    /// Dependencies moved to a newer version.
    pub upgraded: Vec<Dependency>,
    /// Dependencies moved to an older version.
    pub downgraded: Vec<Dependency>,
    /// Dependencies dropped entirely.
    pub removed: Vec<Dependency>,
}

impl DependencyChanges {
    /// Returns each non-empty group with its display label, in render order.
    fn groups(&self) -> impl Iterator<Item = (&'static str, &[Dependency])> {
        [
            ("Added", self.added.as_slice()),
            ("Upgraded", self.upgraded.as_slice()),
            ("Downgraded", self.downgraded.as_slice()),
            ("Removed", self.removed.as_slice()),
        ]
        .into_iter()
        .filter(|(_, deps)| !deps.is_empty())
    }

    /// Returns true when no group has entries.
    pub fn is_empty(&self) -> bool {
        self.groups().next().is_none()
    }
}

/// Headline, description and dependency changes for one commit.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct StructuredCommitMessage {
    /// Short title line.
    pub headline: String,
    /// Free-text body.
    pub description: String,
    /// Dependency changes, rendered into the body rather than the headline.
    pub dependencies: DependencyChanges,
}

impl StructuredCommitMessage {
    /// Returns the description with the dependency appendix merged in.
    ///
    /// Groups are emitted in the order Added, Upgraded, Downgraded, Removed
    /// and each entry renders as `name (version)`. Empty groups are skipped;
    /// with no dependency changes the description is returned unchanged.
    pub fn description_with_dependencies(&self) -> String {
        let mut appendix = String::new();
        for (label, deps) in self.dependencies.groups() {
            appendix.push_str(&format!("\n- {label}:\n"));
            for dep in deps {
                appendix.push_str(&format!("  - {} ({})\n", dep.name, dep.version));
            }
        }

        if appendix.is_empty() {
            self.description.clone()
        } else {
            format!("{}\n\nDependency changes:{appendix}", self.description)
        }
    }

    /// Returns the full commit message: headline, blank line, body.
    pub fn full_message(&self) -> String {
        format_commit_message(&self.headline, &self.description_with_dependencies())
    }
}

/// Joins a headline and description the way `git commit -m` expects.
pub fn format_commit_message(headline: &str, description: &str) -> String {
    format!("{headline}\n\n{description}")
}
