//! Content-only checks on a single pull request: merge state, change type,
//! and the spam heuristic. None of these make network calls.

use serde::Serialize;
use std::fmt;

use crate::config::SpamConfig;
use crate::github::{ChangedFile, PullRequest};

/// A PR touching exactly this many files...
pub const DEFAULT_SPAM_FILE_COUNT: usize = 1;
/// ...with fewer total changed lines than this is flagged as likely spam.
pub const DEFAULT_SPAM_CHANGE_THRESHOLD: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MergeStatus {
    #[serde(rename = "Merge status pending.")]
    Pending,
    #[serde(rename = "No merge conflicts.")]
    NoConflicts,
    #[serde(rename = "This PR has merge conflicts.")]
    HasConflicts,
}

impl fmt::Display for MergeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStatus::Pending => write!(f, "Merge status pending."),
            MergeStatus::NoConflicts => write!(f, "No merge conflicts."),
            MergeStatus::HasConflicts => write!(f, "This PR has merge conflicts."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrType {
    #[serde(rename = "README update")]
    ReadmeUpdate,
    #[serde(rename = "Feature or bug fix")]
    FeatureOrBugFix,
    #[serde(rename = "Other changes")]
    Other,
}

impl fmt::Display for PrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrType::ReadmeUpdate => write!(f, "README update"),
            PrType::FeatureOrBugFix => write!(f, "Feature or bug fix"),
            PrType::Other => write!(f, "Other changes"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpamVerdict {
    #[serde(rename = "This PR is likely spam.")]
    LikelySpam,
    #[serde(rename = "This PR seems legitimate.")]
    Legitimate,
}

impl fmt::Display for SpamVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpamVerdict::LikelySpam => write!(f, "This PR is likely spam."),
            SpamVerdict::Legitimate => write!(f, "This PR seems legitimate."),
        }
    }
}

pub fn merge_conflict_status(pr: &PullRequest) -> MergeStatus {
    match pr.mergeable {
        None => MergeStatus::Pending,
        Some(true) => MergeStatus::NoConflicts,
        Some(false) => MergeStatus::HasConflicts,
    }
}

/// One label per matching file, in file order. Repeats are kept: a PR touching
/// two README files yields two "README update" labels.
pub fn detect_pr_type(files: &[ChangedFile]) -> Vec<PrType> {
    let labels: Vec<PrType> = files
        .iter()
        .filter_map(|file| {
            if file.filename.contains("README.md") {
                Some(PrType::ReadmeUpdate)
            } else if file.filename.contains("/src/") || file.filename.contains("/lib/") {
                Some(PrType::FeatureOrBugFix)
            } else {
                None
            }
        })
        .collect();

    if labels.is_empty() {
        vec![PrType::Other]
    } else {
        labels
    }
}

pub fn detect_spam_pr(files: &[ChangedFile], thresholds: &SpamConfig) -> SpamVerdict {
    let total_changes: u64 = files.iter().map(|f| f.changes).sum();
    if files.len() == thresholds.file_count && total_changes < thresholds.min_changes {
        SpamVerdict::LikelySpam
    } else {
        SpamVerdict::Legitimate
    }
}
