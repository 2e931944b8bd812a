//! Pure reductions over already-fetched pull request and issue lists.
//! Every average over an empty set is 0.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::{IssueCounts, PrCounts};
use crate::github::{IssueRecord, PullRequest, State};

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0
}

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// `closed` and `merged` overlap: a merged PR is also closed.
pub fn count_pull_requests(prs: &[PullRequest]) -> PrCounts {
    PrCounts {
        open: prs.iter().filter(|pr| pr.state == State::Open).count(),
        closed: prs.iter().filter(|pr| pr.state == State::Closed).count(),
        merged: prs.iter().filter(|pr| pr.merged_at.is_some()).count(),
    }
}

/// Pull requests returned by the issues endpoint are never counted.
pub fn count_issues(issues: &[IssueRecord]) -> IssueCounts {
    let real = || issues.iter().filter(|issue| !issue.is_pull_request());
    IssueCounts {
        open: real().filter(|issue| issue.state == State::Open).count(),
        closed: real().filter(|issue| issue.state == State::Closed).count(),
    }
}

/// Mean seconds from creation to last update.
pub fn average_response_time(prs: &[PullRequest]) -> f64 {
    mean(
        prs.iter()
            .filter_map(|pr| pr.updated_at.map(|updated| seconds_between(pr.created_at, updated))),
    )
}

/// Mean seconds from creation to merge, over merged PRs.
pub fn average_merge_time(prs: &[PullRequest]) -> f64 {
    mean(
        prs.iter()
            .filter_map(|pr| pr.merged_at.map(|merged| seconds_between(pr.created_at, merged))),
    )
}

/// Mean seconds from creation to close, over closed issues. A closed issue
/// without `closed_at` is left out of the average.
pub fn average_issue_resolution_time(issues: &[IssueRecord]) -> f64 {
    mean(
        issues
            .iter()
            .filter(|issue| issue.state == State::Closed && !issue.is_pull_request())
            .filter_map(|issue| match issue.closed_at {
                Some(closed) => Some(seconds_between(issue.created_at, closed)),
                None => {
                    warn!(created_at = %issue.created_at, "closed issue has no closed_at, excluding");
                    None
                }
            }),
    )
}
