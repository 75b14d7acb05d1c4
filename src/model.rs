use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;

/// GitHub reports `open` or `closed`; anything else lands in `Other` and is
/// tallied nowhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone)]
pub struct Issue {
    /// `None` for items whose author account was deleted.
    pub author_login: Option<String>,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    pub fn timestamps(&self) -> [Option<DateTime<Utc>>; 3] {
        [Some(self.created_at), self.closed_at, Some(self.updated_at)]
    }
}

#[derive(Debug, Clone)]
pub struct Review {
    pub author_login: Option<String>,
    /// Pending reviews have not been submitted yet.
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct PullRequest {
    pub issue: Issue,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone)]
pub struct Repository {
    pub full_name: String,
    pub issues: Vec<Issue>,
    pub pull_requests: Vec<PullRequest>,
}

impl Repository {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            issues: Vec::new(),
            pull_requests: Vec::new(),
        }
    }
}

/// Logins whose contributions are counted. Matching is exact, as returned by
/// the API.
#[derive(Debug, Clone, Default)]
pub struct TrackedUsers(HashSet<String>);

impl TrackedUsers {
    pub fn contains(&self, login: Option<&str>) -> bool {
        login.is_some_and(|l| self.0.contains(l))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<String>> FromIterator<S> for TrackedUsers {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
