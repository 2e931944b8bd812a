use serde::Serialize;

use crate::analysis::classifier::{MergeStatus, PrType, SpamVerdict};
use crate::analysis::complexity::ComplexityBlock;
use crate::analysis::language::FileLanguage;
use crate::metrics::{AveragePrSize, CodeChurn, IssueCounts, PrCounts};
use crate::github::Contributor;

/// Quality signals for a single pull request.
#[derive(Debug, Clone, Serialize)]
pub struct PrQualityReport {
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub merge_status: MergeStatus,
    pub pr_type: Vec<PrType>,
    pub spam_status: SpamVerdict,
    /// One entry per scored function, method or class
    pub complexity: Vec<ComplexityBlock>,
    /// Average complexity and rank across `complexity`
    pub complexity_summary: String,
    /// Content-based language guess per changed file
    pub language_detection: Vec<FileLanguage>,
    /// Extension-based language summary
    pub languages: String,
}

/// Activity metrics for a repository. Times are in seconds.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryMetrics {
    pub repo: String,
    pub pr_counts: PrCounts,
    pub issue_counts: IssueCounts,
    pub pr_response_time: f64,
    pub average_merge_time: f64,
    pub contributor_activity: Vec<Contributor>,
    pub issue_resolution_time: f64,
    pub average_size_of_prs: AveragePrSize,
    pub code_churn: CodeChurn,
}

/// Either report, for shared output handling.
#[derive(Debug)]
pub enum Report {
    PullRequest(PrQualityReport),
    Repository(RepositoryMetrics),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_metrics_json_contract() {
        let metrics = RepositoryMetrics {
            repo: "o/r".to_string(),
            pr_counts: PrCounts {
                open: 1,
                closed: 2,
                merged: 1,
            },
            issue_counts: IssueCounts { open: 3, closed: 4 },
            pr_response_time: 60.0,
            average_merge_time: 120.0,
            contributor_activity: vec![Contributor {
                login: "alice".to_string(),
                contributions: 9,
            }],
            issue_resolution_time: 0.0,
            average_size_of_prs: AveragePrSize {
                average_lines_added: 1.5,
                average_lines_removed: 0.5,
            },
            code_churn: CodeChurn {
                lines_added: 10,
                lines_removed: 2,
            },
        };

        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["pr_counts"]["closed"], 2);
        assert_eq!(json["issue_counts"]["open"], 3);
        assert_eq!(json["pr_response_time"], 60.0);
        assert_eq!(json["contributor_activity"][0]["login"], "alice");
        assert_eq!(json["contributor_activity"][0]["contributions"], 9);
        assert_eq!(json["average_size_of_prs"]["average_lines_added"], 1.5);
        assert_eq!(json["code_churn"]["lines_removed"], 2);
    }
}
