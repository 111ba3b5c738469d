pub mod client;
pub mod config;
pub mod error;
pub mod issues;
pub mod logging;
pub mod models;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{BasicAuth, ReqwestSender, Requester, Sender, check_response};
pub use config::SonarConfig;
pub use error::{Error, Result};
pub use issues::{IssueService, SearchResponse, normalize_host};
pub use models::*;
