//! Issue search and severity counting against `api/issues/search`.

use std::fmt;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use tracing::{debug, instrument, warn};

use crate::client::{BasicAuth, Requester, Sender, check_response};
use crate::config::{SonarConfig, non_empty};
use crate::error::{Error, Result};
use crate::models::{Issue, IssuesSearchOptions, IssuesSearchResult, Severity, SeverityCounts};

pub const SEARCH_PATH: &str = "issues/search";

const API_ROOT: &str = "api/";

/// Counting only needs the total, not the records.
const COUNT_PAGE_SIZE: u32 = 1;

const DEFAULT_PAGE_SIZE: u32 = 100;
const MAX_PAGE_SIZE: u32 = 500;

/// The server refuses pages beyond the first 10 000 results.
const MAX_RESULT_WINDOW: u64 = 10_000;

/// Makes sure `host` ends with `/api/`. Applying it twice changes nothing.
pub fn normalize_host(host: &str) -> String {
    let mut host = host.to_string();
    if !host.ends_with('/') {
        host.push('/');
    }
    if !host.ends_with(API_ROOT) {
        host.push_str(API_ROOT);
    }
    host
}

/// Decoded search page together with the status and headers it arrived with.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub result: IssuesSearchResult,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

#[derive(Clone)]
pub struct IssueService {
    host: String,
    token: String,
    project: String,
    organization: Option<String>,
    branch: Option<String>,
    pull_request: Option<String>,
    api_client: Requester,
}

impl IssueService {
    pub fn new(config: SonarConfig, sender: Arc<dyn Sender>) -> Self {
        let host = normalize_host(&config.host);
        let auth = BasicAuth::new(config.token.clone(), "");
        let api_client = Requester::new(auth, host.clone(), sender);

        Self {
            host,
            token: config.token,
            project: config.project,
            organization: config.organization.and_then(non_empty),
            branch: config.branch.and_then(non_empty),
            pull_request: config.pull_request.and_then(non_empty),
            api_client,
        }
    }

    pub fn from_env(sender: Arc<dyn Sender>) -> Result<Self> {
        Ok(Self::new(SonarConfig::from_env()?, sender))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn pull_request(&self) -> Option<&str> {
        self.pull_request.as_deref()
    }

    /// Runs one `GET issues/search`.
    ///
    /// Non-2xx responses fail before the body is decoded. A body that does not
    /// match [`IssuesSearchResult`] exactly yields [`Error::Decode`], which still
    /// carries the response status and headers.
    #[instrument(skip(self, options), fields(host = %self.host))]
    pub async fn search(&self, options: &IssuesSearchOptions) -> Result<SearchResponse> {
        let query = options.to_query_pairs()?;
        let request = self.api_client.create(Method::GET, SEARCH_PATH, &query)?;

        let response = self
            .api_client
            .send(request)
            .await
            .map_err(|source| Error::Transport {
                operation: SEARCH_PATH.to_string(),
                source: Box::new(source),
            })?;

        let response = check_response(SEARCH_PATH, response).await?;
        let status = response.status();
        let headers = response.headers().clone();

        let result: IssuesSearchResult = self.api_client.decode(SEARCH_PATH, response).await?;
        debug!(total = result.total, returned = result.issues.len(), "Issue search finished");

        Ok(SearchResponse {
            result,
            status,
            headers,
        })
    }

    /// Collects every issue matching `options`, page by page.
    ///
    /// Options left unset are scoped to the configured project, branch,
    /// organization and pull request.
    #[instrument(skip(self, options), fields(host = %self.host))]
    pub async fn search_all(&self, options: IssuesSearchOptions) -> Result<Vec<Issue>> {
        let mut options = self.scoped(options);
        if options.component_keys.is_none() {
            options.component_keys = Some(self.project.clone());
        }

        let page_size = options
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let mut page = options.page.unwrap_or(1).max(1);
        let mut issues = Vec::new();

        loop {
            options.page = Some(page);
            options.page_size = Some(page_size);

            let response = self.search(&options).await?;
            let total = response
                .result
                .paging
                .as_ref()
                .map_or(response.result.total, |paging| paging.total);
            let returned = response.result.issues.len();
            issues.extend(response.result.issues);

            let seen = u64::from(page) * u64::from(page_size);
            if returned == 0 || seen >= total {
                break;
            }
            if seen >= MAX_RESULT_WINDOW {
                warn!(total, collected = issues.len(), "Result window exhausted");
                break;
            }
            page += 1;
        }

        Ok(issues)
    }

    /// Number of unresolved issues of `severity` in the configured scope.
    #[instrument(skip(self), fields(host = %self.host))]
    pub async fn count_by_severity(&self, severity: Severity) -> Result<u64> {
        debug!("Using API client for '{}'", self.host);

        let options = self.scoped(
            IssuesSearchOptions::new()
                .component_keys(self.project.clone())
                .severity(severity)
                .resolved(false)
                .page_size(COUNT_PAGE_SIZE),
        );

        match self.search(&options).await {
            Ok(response) => Ok(response.result.total),
            Err(source) => Err(Error::SeverityCount {
                severity,
                source: Box::new(source),
            }),
        }
    }

    pub async fn blocker_issue_count(&self) -> Result<u64> {
        self.count_by_severity(Severity::Blocker).await
    }

    pub async fn critical_issue_count(&self) -> Result<u64> {
        self.count_by_severity(Severity::Critical).await
    }

    pub async fn major_issue_count(&self) -> Result<u64> {
        self.count_by_severity(Severity::Major).await
    }

    pub async fn minor_issue_count(&self) -> Result<u64> {
        self.count_by_severity(Severity::Minor).await
    }

    pub async fn info_issue_count(&self) -> Result<u64> {
        self.count_by_severity(Severity::Info).await
    }

    /// Counts every severity in turn; the first failure aborts the rest.
    pub async fn count_all(&self) -> Result<SeverityCounts> {
        let mut counts = SeverityCounts::default();
        for severity in Severity::ALL {
            counts.set(severity, self.count_by_severity(severity).await?);
        }
        Ok(counts)
    }

    fn scoped(&self, mut options: IssuesSearchOptions) -> IssuesSearchOptions {
        if options.branch.is_none() {
            options.branch = self.branch.clone();
        }
        if options.organization.is_none() {
            options.organization = self.organization.clone();
        }
        if options.pull_request.is_none() {
            options.pull_request = self.pull_request.clone();
        }
        options
    }
}

impl fmt::Debug for IssueService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssueService")
            .field("host", &self.host)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("project", &self.project)
            .field("organization", &self.organization)
            .field("branch", &self.branch)
            .field("pull_request", &self.pull_request)
            .finish()
    }
}
