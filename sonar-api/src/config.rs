use crate::error::{Error, Result};

pub const ENV_HOST: &str = "SONAR_HOST_URL";
pub const ENV_TOKEN: &str = "SONAR_TOKEN";
pub const ENV_PROJECT: &str = "SONAR_PROJECT_KEY";
pub const ENV_ORGANIZATION: &str = "SONAR_ORGANIZATION";
pub const ENV_BRANCH: &str = "SONAR_BRANCH";
pub const ENV_PULL_REQUEST: &str = "SONAR_PULL_REQUEST";

/// Connection and scope settings for one project on a SonarQube server.
#[derive(Clone, PartialEq, Eq)]
pub struct SonarConfig {
    pub host: String,
    pub token: String,
    pub project: String,
    pub organization: Option<String>,
    pub branch: Option<String>,
    pub pull_request: Option<String>,
}

impl SonarConfig {
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            project: project.into(),
            organization: None,
            branch: None,
            pull_request: None,
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = non_empty(organization.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = non_empty(branch.into());
        self
    }

    pub fn with_pull_request(mut self, pull_request: impl Into<String>) -> Self {
        self.pull_request = non_empty(pull_request.into());
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the settings through `lookup`; empty optional values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).filter(|v| !v.is_empty()).ok_or_else(|| {
                Error::ConfigurationMissing(format!("{} not found in environment", name))
            })
        };

        let host = required(ENV_HOST)?;
        let token = required(ENV_TOKEN)?;
        let project = required(ENV_PROJECT)?;

        Ok(Self {
            host,
            token,
            project,
            organization: lookup(ENV_ORGANIZATION).and_then(non_empty),
            branch: lookup(ENV_BRANCH).and_then(non_empty),
            pull_request: lookup(ENV_PULL_REQUEST).and_then(non_empty),
        })
    }
}

impl std::fmt::Debug for SonarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonarConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("project", &self.project)
            .field("organization", &self.organization)
            .field("branch", &self.branch)
            .field("pull_request", &self.pull_request)
            .finish()
    }
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
