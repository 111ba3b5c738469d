//! Prints the unresolved issue counts of one project.
//!
//! ```
//! export SONAR_HOST_URL=https://sonarcloud.io
//! export SONAR_TOKEN=your-token
//! export SONAR_PROJECT_KEY=your_project
//! export SONAR_ORGANIZATION=your-org   # optional
//! cargo run --example issue_counts
//! ```
use std::sync::Arc;

use dotenv::dotenv;
use sonar_api::{IssueService, ReqwestSender, Severity, logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init()?;

    let sender = ReqwestSender::new()?;
    let service = IssueService::from_env(Arc::new(sender))?;
    println!("Host: {}", service.host());
    println!("Project: {}", service.project());
    if let Some(branch) = service.branch() {
        println!("Branch: {}", branch);
    }

    let counts = service.count_all().await?;
    for severity in Severity::ALL {
        println!("{:<10} {}", severity, counts.get(severity));
    }
    println!("{:<10} {}", "TOTAL", counts.total());

    Ok(())
}
