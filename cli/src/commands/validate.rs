use colored::*;
use tokio_util::sync::CancellationToken;
use topomap_core::TopologyAnalyzer;
use topomap_core::validate::{Severity, validate as check};
use tracing::info;

use super::analyze::build;
use crate::terminal::print;

pub async fn validate(analyzer: &TopologyAnalyzer, cancel: &CancellationToken) -> anyhow::Result<()> {
    let snapshot = build(analyzer, cancel).await?;
    let issues = check(&snapshot);

    if issues.is_empty() {
        info!("Topology validation passed");
        return Ok(());
    }

    for issue in &issues {
        let tag = match issue.severity {
            Severity::Warning => issue.severity.to_string().yellow().bold(),
            Severity::Info => issue.severity.to_string().blue(),
        };
        print::print(&format!("{} {}", tag, issue.message));
    }
    print::fat_separator();
    print::print(&format!("{} issues found", issues.len().to_string().bold()));
    Ok(())
}
