pub mod types;

pub use types::Report;

use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::analysis::classifier::{MergeStatus, SpamVerdict};
use types::{PrQualityReport, RepositoryMetrics};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Terminal,
    Json,
}

/// Print the report to stdout, or write it to `output_path` (markdown, or
/// JSON when `format` is `Json`).
#[instrument(skip(report))]
pub fn output(report: &Report, format: Format, output_path: Option<&Path>) -> Result<(), ReportError> {
    let rendered = match (format, output_path) {
        (Format::Json, _) => Some(render_json(report)?),
        (Format::Terminal, Some(_)) => Some(render_markdown(report)),
        (Format::Terminal, None) => None,
    };

    match (rendered, output_path) {
        (Some(text), Some(path)) => {
            debug!(path = %path.display(), "writing report to file");
            std::fs::write(path, text)?;
        }
        (Some(text), None) => println!("{text}"),
        (None, _) => {
            debug!("writing report to terminal");
            print_terminal_report(report);
        }
    }
    Ok(())
}

pub fn render_json(report: &Report) -> Result<String, ReportError> {
    let json = match report {
        Report::PullRequest(pr) => serde_json::to_string_pretty(pr)?,
        Report::Repository(repo) => serde_json::to_string_pretty(repo)?,
    };
    Ok(json)
}

fn join_labels<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Human-readable duration for a number of seconds.
fn humanize_seconds(seconds: f64) -> String {
    let secs = seconds.max(0.0);
    if secs < 60.0 {
        format!("{secs:.0}s")
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else if secs < 86_400.0 {
        format!("{:.1}h", secs / 3600.0)
    } else {
        format!("{:.1}d", secs / 86_400.0)
    }
}

fn print_terminal_report(report: &Report) {
    match report {
        Report::PullRequest(pr) => print_pr_report(pr),
        Report::Repository(metrics) => print_metrics_report(metrics),
    }
}

fn colorize_merge(status: MergeStatus) -> colored::ColoredString {
    let text = status.to_string();
    match status {
        MergeStatus::NoConflicts => text.green(),
        MergeStatus::Pending => text.yellow(),
        MergeStatus::HasConflicts => text.red().bold(),
    }
}

fn colorize_spam(verdict: SpamVerdict) -> colored::ColoredString {
    let text = verdict.to_string();
    match verdict {
        SpamVerdict::Legitimate => text.green(),
        SpamVerdict::LikelySpam => text.red().bold(),
    }
}

fn print_pr_report(report: &PrQualityReport) {
    println!();
    println!("{} #{}: \"{}\"", report.repo, report.number, report.title);
    println!();
    println!("═══ PR Quality Check ═══");
    println!("Merge Conflict Status: {}", colorize_merge(report.merge_status));
    println!("PR Type: {}", join_labels(&report.pr_type));
    println!("Spam Check: {}", colorize_spam(report.spam_status));
    println!("Languages: {}", report.languages);
    println!();

    println!("═══ Cyclomatic Complexity Analysis ═══");
    for block in &report.complexity {
        println!("  • {} ({})", block, block.file);
    }
    println!("{}", report.complexity_summary.bold());
    println!();

    if !report.language_detection.is_empty() {
        println!("═══ Language Detection ═══");
        for detection in &report.language_detection {
            println!("  • {}: {}", detection.filename, detection.language);
        }
        println!();
    }
}

fn print_metrics_report(metrics: &RepositoryMetrics) {
    println!();
    println!("═══ Repository Metrics: {} ═══", metrics.repo.bold());
    println!(
        "Pull requests: {} open | {} closed | {} merged",
        metrics.pr_counts.open, metrics.pr_counts.closed, metrics.pr_counts.merged
    );
    println!(
        "Issues: {} open | {} closed",
        metrics.issue_counts.open, metrics.issue_counts.closed
    );
    println!("PR response time: {}", humanize_seconds(metrics.pr_response_time));
    println!("Average merge time: {}", humanize_seconds(metrics.average_merge_time));
    println!("Issue resolution time: {}", humanize_seconds(metrics.issue_resolution_time));
    println!(
        "Average PR size: +{:.1} -{:.1}",
        metrics.average_size_of_prs.average_lines_added, metrics.average_size_of_prs.average_lines_removed
    );
    println!(
        "Code churn: +{} -{}",
        metrics.code_churn.lines_added, metrics.code_churn.lines_removed
    );
    println!();

    println!("═══ Contributors ═══");
    if metrics.contributor_activity.is_empty() {
        println!("  No contributor data.");
    }
    for contributor in &metrics.contributor_activity {
        println!("  • {}: {}", contributor.login, contributor.contributions);
    }
    println!();
}

pub fn render_markdown(report: &Report) -> String {
    match report {
        Report::PullRequest(pr) => pr_markdown(pr),
        Report::Repository(metrics) => metrics_markdown(metrics),
    }
}

fn pr_markdown(report: &PrQualityReport) -> String {
    let mut md = String::new();
    md.push_str(&format!("# {} #{}: \"{}\"\n\n", report.repo, report.number, report.title));
    md.push_str("## PR Quality Check\n\n");
    md.push_str(&format!("- **Merge Conflict Status:** {}\n", report.merge_status));
    md.push_str(&format!("- **PR Type:** {}\n", join_labels(&report.pr_type)));
    md.push_str(&format!("- **Spam Check:** {}\n", report.spam_status));
    md.push_str(&format!("- **Languages:** {}\n\n", report.languages));

    md.push_str("## Cyclomatic Complexity Analysis\n\n");
    if !report.complexity.is_empty() {
        md.push_str("| File | Function | Complexity | Rank |\n|---|---|---|---|\n");
        for block in &report.complexity {
            md.push_str(&format!(
                "| `{}` | `{}` | {} | {} |\n",
                block.file, block.name, block.complexity, block.rank
            ));
        }
        md.push('\n');
    }
    md.push_str(&format!("{}\n", report.complexity_summary));

    if !report.language_detection.is_empty() {
        md.push_str("\n## Language Detection\n\n");
        for detection in &report.language_detection {
            md.push_str(&format!("- `{}`: {}\n", detection.filename, detection.language));
        }
    }
    md
}

fn metrics_markdown(metrics: &RepositoryMetrics) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Repository Metrics: {}\n\n", metrics.repo));
    md.push_str("| Metric | Value |\n|---|---|\n");
    md.push_str(&format!(
        "| Pull requests | {} open, {} closed, {} merged |\n",
        metrics.pr_counts.open, metrics.pr_counts.closed, metrics.pr_counts.merged
    ));
    md.push_str(&format!(
        "| Issues | {} open, {} closed |\n",
        metrics.issue_counts.open, metrics.issue_counts.closed
    ));
    md.push_str(&format!("| PR response time | {} |\n", humanize_seconds(metrics.pr_response_time)));
    md.push_str(&format!("| Average merge time | {} |\n", humanize_seconds(metrics.average_merge_time)));
    md.push_str(&format!(
        "| Issue resolution time | {} |\n",
        humanize_seconds(metrics.issue_resolution_time)
    ));
    md.push_str(&format!(
        "| Average PR size | +{:.1} -{:.1} |\n",
        metrics.average_size_of_prs.average_lines_added, metrics.average_size_of_prs.average_lines_removed
    ));
    md.push_str(&format!(
        "| Code churn | +{} -{} |\n",
        metrics.code_churn.lines_added, metrics.code_churn.lines_removed
    ));

    md.push_str("\n## Contributors\n\n");
    for contributor in &metrics.contributor_activity {
        md.push_str(&format!("- **{}**: {}\n", contributor.login, contributor.contributions));
    }
    md
}
