pub mod classifier;
pub mod complexity;
pub mod language;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::SpamConfig;
use crate::github::{GitHubError, HostingApi, PrRef};
use crate::report::types::PrQualityReport;
use complexity::{ComplexityBlock, PythonComplexity, Rank};
use language::HeuristicGuesser;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Could not analyze {language} source: {reason}")]
    Parse { language: String, reason: String },
}

/// A function-level score before ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockScore {
    pub name: String,
    pub complexity: u32,
}

/// Scores source code of one language by cyclomatic complexity.
pub trait ComplexityAnalyzer: Send + Sync {
    fn language(&self) -> &str;

    /// Whether files with this name are analyzed at all.
    fn handles(&self, filename: &str) -> bool;

    fn analyze(&self, source: &str) -> Result<Vec<BlockScore>, AnalysisError>;

    fn rank(&self, score: f64) -> Rank {
        Rank::from_score(score)
    }
}

/// Guesses the language of raw file content; `None` when it cannot tell.
pub trait LanguageGuesser: Send + Sync {
    fn guess(&self, content: &str) -> Option<String>;
}

/// Runs every quality check against one pull request.
pub struct QualityChecker {
    complexity: Box<dyn ComplexityAnalyzer>,
    languages: Box<dyn LanguageGuesser>,
    spam: SpamConfig,
}

impl QualityChecker {
    pub fn new(spam: SpamConfig) -> Self {
        Self::with_capabilities(Box::new(PythonComplexity::new()), Box::new(HeuristicGuesser::new()), spam)
    }

    pub fn with_capabilities(
        complexity: Box<dyn ComplexityAnalyzer>,
        languages: Box<dyn LanguageGuesser>,
        spam: SpamConfig,
    ) -> Self {
        Self {
            complexity,
            languages,
            spam,
        }
    }

    /// Fetch a pull request and its files, then classify it. Failing to load
    /// the PR or its file list aborts; per-file content failures only drop
    /// that file from the complexity and language sections.
    #[instrument(skip(self, api), fields(repo = %pr_ref.repo, pr = pr_ref.number))]
    pub async fn fetch_pr_quality_report(
        &self,
        api: &dyn HostingApi,
        pr_ref: &PrRef,
    ) -> Result<PrQualityReport, GitHubError> {
        let pr = api.get_pull_request(pr_ref).await?;
        let files = api.list_pull_request_files(&pr).await?;
        info!(files = files.len(), "fetched pull request files");

        let merge_status = classifier::merge_conflict_status(&pr);
        let pr_type = classifier::detect_pr_type(&files);
        let spam_status = classifier::detect_spam_pr(&files, &self.spam);
        debug!(%merge_status, %spam_status, "classified pull request");

        let complexity: Vec<ComplexityBlock> =
            complexity::cyclomatic_check(api, self.complexity.as_ref(), &files).await;
        let complexity_summary = complexity::format_cyclomatic_results(&complexity, self.complexity.as_ref());
        debug!(language = self.complexity.language(), blocks = complexity.len(), "complexity scan complete");

        let language_detection = language::detect_file_languages(api, self.languages.as_ref(), &files).await;
        let languages = language::detect_languages(&files);

        Ok(PrQualityReport {
            repo: pr_ref.repo.to_string(),
            number: pr.number,
            title: pr.title,
            merge_status,
            pr_type,
            spam_status,
            complexity,
            complexity_summary,
            language_detection,
            languages,
        })
    }
}
