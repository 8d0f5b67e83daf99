//! Unified diff splitting and partial patch construction.
//!
//! Hunks are numbered in the order their `@@` header lines appear in the
//! diff, which is the order hunk flags refer to.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::data::HunkFlag;
use crate::git::error::GitError;

/// Marker that begins a per-file section in unified diff output.
const FILE_DIFF_MARKER: &str = "diff --git ";

/// Marker that begins a hunk within a file diff.
const HUNK_MARKER: &str = "@@";

static HUNK_HEADER_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(.*)$"));

/// Line ranges of a hunk, as written in its `@@` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkHeader {
    /// First line in the old file.
    pub old_start: u32,
    /// Lines taken from the old file.
    pub old_count: u32,
    /// First line in the new file.
    pub new_start: u32,
    /// Lines in the new file.
    pub new_count: u32,
    /// Trailing section heading, including its leading space.
    pub section: String,
}

impl HunkHeader {
    /// Parses a `@@ -a,b +c,d @@ section` line.
    pub fn parse(line: &str) -> Result<Self, GitError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let malformed = || GitError::MalformedHunkHeader(line.to_string());
        let pattern = HUNK_HEADER_PATTERN.as_ref().map_err(|_| malformed())?;
        let caps = pattern.captures(line).ok_or_else(malformed)?;

        let number = |index: usize, default: Option<u32>| -> Result<u32, GitError> {
            match caps.get(index) {
                Some(m) => m.as_str().parse().map_err(|_| malformed()),
                None => default.ok_or_else(malformed),
            }
        };

        Ok(Self {
            old_start: number(1, None)?,
            old_count: number(2, Some(1))?,
            new_start: number(3, None)?,
            new_count: number(4, Some(1))?,
            section: caps
                .get(5)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
    }

    /// Net lines this hunk adds to the file.
    fn line_delta(&self) -> i64 {
        i64::from(self.new_count) - i64::from(self.old_count)
    }

    /// Returns a copy whose new-file start is moved up by `shift` lines.
    fn shifted(&self, shift: i64) -> Self {
        let new_start = i64::from(self.new_start) - shift;
        Self {
            new_start: u32::try_from(new_start.max(0)).unwrap_or(0),
            ..self.clone()
        }
    }
}

impl fmt::Display for HunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@@ -{},{} +{},{} @@{}",
            self.old_start, self.old_count, self.new_start, self.new_count, self.section
        )
    }
}

/// One hunk: its header and the lines following it.
#[derive(Debug, Clone)]
pub struct Hunk {
    /// Parsed `@@` line.
    pub header: HunkHeader,
    /// Context, added and removed lines after the header.
    pub body: String,
}

/// A per-file slice of a unified diff.
#[derive(Debug, Clone, Default)]
pub struct FileDiff {
    /// Path of the file (from the `b/` side of `diff --git a/... b/...`).
    pub path: String,
    /// Header lines (`diff --git`, `index`, `---`, `+++`, mode lines).
    pub header: String,
    /// Hunks in diff order. Empty for binary and mode-only changes.
    pub hunks: Vec<Hunk>,
}

/// Splits a unified diff into files and hunks.
///
/// Text before the first file header is ignored unless it contains hunks,
/// which are then kept under a file with an empty header so hunk numbering
/// still matches the `@@` lines of the input.
pub fn split_diff(diff: &str) -> Result<Vec<FileDiff>, GitError> {
    let mut files: Vec<FileDiff> = Vec::new();

    for line in diff.split_inclusive('\n') {
        if line.starts_with(FILE_DIFF_MARKER) {
            files.push(FileDiff {
                path: extract_path_from_diff_header(line),
                header: line.to_string(),
                hunks: Vec::new(),
            });
        } else if line.starts_with(HUNK_MARKER) {
            let header = HunkHeader::parse(line)?;
            if files.is_empty() {
                files.push(FileDiff::default());
            }
            if let Some(file) = files.last_mut() {
                file.hunks.push(Hunk {
                    header,
                    body: String::new(),
                });
            }
        } else if let Some(file) = files.last_mut() {
            match file.hunks.last_mut() {
                Some(hunk) => hunk.body.push_str(line),
                None => file.header.push_str(line),
            }
        }
    }

    Ok(files)
}

/// Builds a patch holding only the hunks flagged for inclusion.
///
/// `flags` must contain one entry per hunk of `diff`. Files without any
/// included hunk are left out entirely. Each kept hunk's new-file start is
/// moved up by the net lines of the skipped hunks before it in the same
/// file, so the patch applies cleanly to the index.
pub fn build_partial_patch(diff: &str, flags: &[HunkFlag]) -> Result<String, GitError> {
    let files = split_diff(diff)?;
    let total: usize = files.iter().map(|file| file.hunks.len()).sum();
    if total != flags.len() {
        return Err(GitError::FlagCountMismatch {
            expected: total,
            actual: flags.len(),
        });
    }

    let mut flags = flags.iter();
    let mut patch = String::new();
    for file in &files {
        let mut selected = String::new();
        let mut shift = 0i64;

        for hunk in &file.hunks {
            let included = flags.next().is_some_and(|flag| flag.is_included());
            if !included {
                shift += hunk.header.line_delta();
                continue;
            }

            selected.push_str(&hunk.header.shifted(shift).to_string());
            selected.push('\n');
            selected.push_str(&hunk.body);
            if !selected.ends_with('\n') {
                selected.push('\n');
            }
        }

        if !selected.is_empty() {
            debug!(path = %file.path, "Including file in partial patch");
            patch.push_str(&file.header);
            patch.push_str(&selected);
        }
    }

    Ok(patch)
}

/// Extracts the file path from the `b/` side of a `diff --git` header line.
fn extract_path_from_diff_header(header_line: &str) -> String {
    let header_line = header_line.trim_end();
    if let Some(b_pos) = header_line.rfind(" b/") {
        header_line[b_pos + 3..].to_string()
    } else {
        header_line
            .strip_prefix(FILE_DIFF_MARKER)
            .unwrap_or(header_line)
            .to_string()
    }
}
