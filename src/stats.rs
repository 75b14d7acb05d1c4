use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContributionStats {
    pub open_issues: u64,
    pub closed_issues: u64,
    pub open_prs: u64,
    pub closed_prs: u64,
    pub reviewed_prs: u64,
    pub touched_repos: BTreeSet<String>,
}

impl ContributionStats {
    pub fn issues_authored(&self) -> u64 {
        self.open_issues + self.closed_issues
    }

    pub fn pull_requests_authored(&self) -> u64 {
        self.open_prs + self.closed_prs
    }

    pub fn touched_repo_count(&self) -> usize {
        self.touched_repos.len()
    }
}
