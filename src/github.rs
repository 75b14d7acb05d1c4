use crate::model::{Issue, IssueState, PullRequest, Repository, Review};
use crate::window::TimeWindow;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, LINK, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: &str = "100";

#[derive(Deserialize)]
struct UserRef {
    login: String,
}

#[derive(Deserialize)]
struct RepoPayload {
    full_name: String,
}

/// Shared shape of `/issues` and `/pulls` list entries.
#[derive(Deserialize)]
struct IssuePayload {
    number: u64,
    user: Option<UserRef>,
    state: IssueState,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    /// Present only when an `/issues` entry is really a pull request.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl From<IssuePayload> for Issue {
    fn from(p: IssuePayload) -> Self {
        Issue {
            author_login: p.user.map(|u| u.login),
            state: p.state,
            created_at: p.created_at,
            closed_at: p.closed_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct ReviewPayload {
    user: Option<UserRef>,
    submitted_at: Option<DateTime<Utc>>,
}

impl From<ReviewPayload> for Review {
    fn from(p: ReviewPayload) -> Self {
        Review {
            author_login: p.user.map(|u| u.login),
            submitted_at: p.submitted_at,
        }
    }
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    api_url: Arc<String>,
    http: Arc<Client>,
}

impl GithubClient {
    /// Create a GitHub REST client authenticating with `token`.
    pub fn new(token: impl Into<String>, api_url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent("set-contributions")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            token: Arc::new(token.into()),
            api_url: Arc::new(api_url.trim_end_matches('/').to_string()),
            http: Arc::new(http),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let raw = format!("{}/{}", self.api_url, path);
        Url::parse_with_params(&raw, params).with_context(|| format!("Invalid API URL: {raw}"))
    }

    /// Single GET with basic retry/backoff. Returns the decoded page and the
    /// `rel="next"` link, if any.
    async fn get_page<T: DeserializeOwned>(&self, url: &Url) -> Result<(Vec<T>, Option<Url>)> {
        const MAX_RETRIES: usize = 4;
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            debug!(%url, attempt, "GET");

            let resp = self
                .http
                .get(url.clone())
                .bearer_auth(&*self.token)
                .header(ACCEPT, "application/vnd.github+json")
                .send()
                .await
                .with_context(|| format!("Network error requesting {url}"))?;

            let status = resp.status();
            let headers = resp.headers().clone();

            if status.is_success() {
                let items: Vec<T> = resp
                    .json()
                    .await
                    .with_context(|| format!("Failed to decode response from {url}"))?;
                return Ok((items, next_link(&headers)));
            }

            let body = resp.text().await.unwrap_or_default();

            if is_rate_limited(status, &headers) {
                if attempt >= MAX_RETRIES {
                    anyhow::bail!("GitHub API rate limit hit for {url} and retries exhausted");
                }
                let wait_secs = rate_limit_wait(&headers, Utc::now());
                warn!(%url, wait_secs, "rate limited, waiting before retry");
                sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            if status.is_server_error() && attempt < MAX_RETRIES {
                let backoff = Duration::from_millis(250u64.saturating_mul(1 << (attempt - 1)));
                warn!(%url, status = status.as_u16(), ?backoff, "server error, retrying");
                sleep(backoff).await;
                continue;
            }

            anyhow::bail!("GitHub API returned HTTP {} for {url}: {body}", status.as_u16());
        }
    }

    /// Follow `Link` pagination, collecting items while `keep` holds. The
    /// first item failing `keep` ends the whole walk.
    async fn paginate_while<T, F>(&self, first: Url, mut keep: F) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> bool,
    {
        let mut out = Vec::new();
        let mut next = Some(first);

        while let Some(url) = next {
            let (page, link) = self.get_page::<T>(&url).await?;
            for item in page {
                if !keep(&item) {
                    return Ok(out);
                }
                out.push(item);
            }
            next = link;
        }

        Ok(out)
    }

    async fn paginate<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>> {
        self.paginate_while(first, |_| true).await
    }

    /// Full names (`owner/name`) of every repository in `org`.
    async fn list_org_repos(&self, org: &str) -> Result<Vec<String>> {
        let url = self.endpoint(
            &format!("orgs/{org}/repos"),
            &[("type", "all"), ("per_page", PER_PAGE)],
        )?;
        let repos: Vec<RepoPayload> = self
            .paginate(url)
            .await
            .with_context(|| format!("Failed to list repositories of {org}"))?;
        Ok(repos.into_iter().map(|r| r.full_name).collect())
    }

    /// Pull requests most recently updated first; stops once `updated_at`
    /// falls before the window, since every timestamp of that and later
    /// entries is older still.
    async fn list_pulls(&self, full_name: &str, window: &TimeWindow) -> Result<Vec<IssuePayload>> {
        let url = self.endpoint(
            &format!("repos/{full_name}/pulls"),
            &[
                ("state", "all"),
                ("sort", "updated"),
                ("direction", "desc"),
                ("per_page", PER_PAGE),
            ],
        )?;
        self.paginate_while(url, |p: &IssuePayload| still_in_range(p, window))
            .await
            .with_context(|| format!("Failed to list pull requests of {full_name}"))
    }

    async fn list_reviews(&self, full_name: &str, number: u64) -> Result<Vec<Review>> {
        let url = self.endpoint(
            &format!("repos/{full_name}/pulls/{number}/reviews"),
            &[("per_page", PER_PAGE)],
        )?;
        let reviews: Vec<ReviewPayload> = self
            .paginate(url)
            .await
            .with_context(|| format!("Failed to list reviews of {full_name}#{number}"))?;
        Ok(reviews.into_iter().map(Review::from).collect())
    }

    /// Issues updated since the window start, excluding pull requests.
    async fn list_issues(&self, full_name: &str, window: &TimeWindow) -> Result<Vec<Issue>> {
        let since = window.start_instant().to_rfc3339();
        let url = self.endpoint(
            &format!("repos/{full_name}/issues"),
            &[("state", "all"), ("since", since.as_str()), ("per_page", PER_PAGE)],
        )?;
        let issues: Vec<IssuePayload> = self
            .paginate(url)
            .await
            .with_context(|| format!("Failed to list issues of {full_name}"))?;
        Ok(issues
            .into_iter()
            .filter(is_plain_issue)
            .map(Issue::from)
            .collect())
    }

    /// Everything the aggregator needs for one repository. Reviews are only
    /// fetched for pull requests that are themselves in window.
    async fn fetch_repository(&self, full_name: &str, window: &TimeWindow) -> Result<Repository> {
        let mut repo = Repository::new(full_name);

        for payload in self.list_pulls(full_name, window).await? {
            let number = payload.number;
            let issue = Issue::from(payload);
            let reviews = if window.contains_any(&issue.timestamps()) {
                self.list_reviews(full_name, number).await?
            } else {
                Vec::new()
            };
            repo.pull_requests.push(PullRequest { issue, reviews });
        }

        repo.issues = self.list_issues(full_name, window).await?;

        info!(
            repo = full_name,
            pulls = repo.pull_requests.len(),
            issues = repo.issues.len(),
            "fetched repository"
        );
        Ok(repo)
    }

    /// Fetch every repository of every org, one request at a time.
    pub async fn fetch_orgs(&self, orgs: &[String], window: &TimeWindow) -> Result<Vec<Repository>> {
        let mut out = Vec::new();
        for org in orgs {
            let names = self.list_org_repos(org).await?;
            info!(org = %org, repos = names.len(), "listed organization repositories");
            for name in names {
                out.push(self.fetch_repository(&name, window).await?);
            }
        }
        Ok(out)
    }
}

/// With pulls sorted by `updated` descending, an entry last updated before
/// the window start ends the walk: none of its timestamps, nor those of any
/// later entry, can be in window.
fn still_in_range(pull: &IssuePayload, window: &TimeWindow) -> bool {
    pull.updated_at.date_naive() >= window.start()
}

/// The issues endpoint also lists pull requests; those carry a
/// `pull_request` key.
fn is_plain_issue(issue: &IssuePayload) -> bool {
    issue.pull_request.is_none()
}

/// Extract the `rel="next"` target from a `Link` header.
fn next_link(headers: &HeaderMap) -> Option<Url> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| p.trim() == r#"rel="next""#);
        if !is_next {
            return None;
        }
        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    // Secondary limits answer 403 with Retry-After while quota remains.
    status == StatusCode::FORBIDDEN
        && (headers.contains_key(RETRY_AFTER)
            || headers
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                == Some("0"))
}

/// Seconds to wait: `Retry-After` when present, else until
/// `x-ratelimit-reset`, else 2.
fn rate_limit_wait(headers: &HeaderMap, now: DateTime<Utc>) -> u64 {
    let header_u64 = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
    };

    if let Some(secs) = header_u64(RETRY_AFTER.as_str()) {
        return secs;
    }
    if let Some(reset) = header_u64("x-ratelimit-reset") {
        let now = u64::try_from(now.timestamp()).unwrap_or(0);
        return reset.saturating_sub(now).max(1);
    }
    2
}
