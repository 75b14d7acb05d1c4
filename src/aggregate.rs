//! Contribution tallying over already-fetched repositories.
//!
//! An issue or pull request is relevant when any of its created, closed or
//! updated timestamps is in window. Authorship by a tracked user counts the
//! item by state; reviews on relevant pull requests count separately, except
//! when the reviewer authored the pull request.

use crate::model::{Issue, IssueState, Repository, TrackedUsers};
use crate::stats::ContributionStats;
use crate::window::TimeWindow;

pub fn aggregate(
    repositories: &[Repository],
    tracked: &TrackedUsers,
    window: &TimeWindow,
) -> ContributionStats {
    repositories
        .iter()
        .fold(ContributionStats::default(), |mut stats, repo| {
            tally_repository(&mut stats, repo, tracked, window);
            stats
        })
}

fn tally_repository(
    stats: &mut ContributionStats,
    repo: &Repository,
    tracked: &TrackedUsers,
    window: &TimeWindow,
) {
    let mut touched = false;

    for pull in &repo.pull_requests {
        if !in_window(&pull.issue, window) {
            continue;
        }

        let author = pull.issue.author_login.as_deref();
        if tracked.contains(author) {
            match pull.issue.state {
                IssueState::Open => stats.open_prs += 1,
                IssueState::Closed => stats.closed_prs += 1,
                IssueState::Other => {}
            }
            touched = true;
        }

        for review in &pull.reviews {
            let reviewer = review.author_login.as_deref();
            if tracked.contains(reviewer)
                && reviewer != author
                && review.submitted_at.is_some_and(|ts| window.contains(ts))
            {
                stats.reviewed_prs += 1;
                touched = true;
            }
        }
    }

    for issue in &repo.issues {
        if !in_window(issue, window) || !tracked.contains(issue.author_login.as_deref()) {
            continue;
        }
        match issue.state {
            IssueState::Open => stats.open_issues += 1,
            IssueState::Closed => stats.closed_issues += 1,
            IssueState::Other => {}
        }
        touched = true;
    }

    if touched && !stats.touched_repos.contains(&repo.full_name) {
        stats.touched_repos.insert(repo.full_name.clone());
    }
}

fn in_window(issue: &Issue, window: &TimeWindow) -> bool {
    window.contains_any(&issue.timestamps())
}
