mod analysis;
mod config;
mod github;
mod metrics;
mod report;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error, info, info_span};
use tracing_subscriber::EnvFilter;

use github::{GitHubClient, GitHubError, RepoId};
use report::{Format, Report};

/// PR Quality: quality checks for GitHub pull requests and activity metrics
/// for repositories.
#[derive(Parser, Debug)]
#[command(name = "pr-quality", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print the report as JSON instead of the terminal summary
    #[arg(long, global = true)]
    json: bool,

    /// Write the report to this file (markdown, or JSON with --json)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run merge, type, spam, complexity and language checks on one PR
    Check {
        /// `owner/repo` or a full PR URL (e.g., https://github.com/org/repo/pull/42)
        target: String,

        /// PR number, required when the target is `owner/repo`
        number: Option<u64>,
    },

    /// Aggregate pull request, issue, contributor and commit metrics
    Metrics {
        /// Repository as `owner/repo`
        repo: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = config::Config::load()?;
    let client = GitHubClient::new(&config.github, config.github_token())?;
    debug!(api_url = %config.github.api_url, "GitHub client ready");

    let built_report = match &cli.command {
        Command::Check { target, number } => {
            let _span = info_span!("pr_check", target = %target).entered();
            let pr_ref = github::resolve_pr_ref(target, *number)?;
            debug!(repo = %pr_ref.repo, pr = pr_ref.number, "resolved pull request");

            info!("running quality checks");
            let checker = analysis::QualityChecker::new(config.spam);
            let pr_report = checker
                .fetch_pr_quality_report(&client, &pr_ref)
                .await
                .inspect_err(log_lookup_failure)?;
            Report::PullRequest(pr_report)
        }
        Command::Metrics { repo } => {
            let _span = info_span!("repo_metrics", repo = %repo).entered();
            let repo: RepoId = repo.parse()?;

            info!("gathering repository metrics");
            let repo_metrics = metrics::gather_repository_metrics(&client, &repo)
                .await
                .inspect_err(log_lookup_failure)?;
            Report::Repository(repo_metrics)
        }
    };

    let format = if cli.json { Format::Json } else { Format::Terminal };
    report::output(&built_report, format, cli.output.as_deref())?;
    info!("done");

    Ok(())
}

/// Hint at the likely cause when a primary lookup comes back with an HTTP status.
fn log_lookup_failure(err: &GitHubError) {
    match err.status() {
        Some(status @ (401 | 403)) => error!(status, "GitHub rejected the request, check the token"),
        Some(status @ 404) => error!(status, "repository or pull request not found"),
        Some(status) => error!(status, "GitHub lookup failed"),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_both_subcommands() {
        let cli = Cli::parse_from(["pr-quality", "check", "org/repo", "42", "--json"]);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Check { ref target, number: Some(42) } if target == "org/repo"
        ));

        let cli = Cli::parse_from(["pr-quality", "-o", "out.md", "metrics", "org/repo"]);
        assert_eq!(cli.output, Some(PathBuf::from("out.md")));
        assert!(matches!(cli.command, Command::Metrics { ref repo } if repo == "org/repo"));
    }

    #[test]
    fn test_log_lookup_failure_accepts_any_error() {
        // Should not panic
        for status in [401, 403, 404, 500] {
            log_lookup_failure(&GitHubError::Status {
                status,
                url: "https://api.github.com/repos/o/r".to_string(),
            });
        }
        log_lookup_failure(&GitHubError::InvalidRepo("nope".to_string()));
    }
}
