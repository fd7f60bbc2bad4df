use std::sync::Arc;
use std::time::Instant;

use colored::*;
use tokio_util::sync::CancellationToken;
use topomap_common::topology::{TopologySnapshot, short_id};
use topomap_core::TopologyAnalyzer;
use tracing::Instrument;

use crate::terminal::{print, spinner};

const KEY_WIDTH: usize = 18;

pub async fn analyze(analyzer: &TopologyAnalyzer, cancel: &CancellationToken) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let snapshot = build(analyzer, cancel).await?;

    if snapshot.workloads.is_empty() {
        print::header("zero workloads detected");
        print::no_results("The inventory reported no workloads.");
        return Ok(());
    }

    print::header("services");
    print_services(&snapshot);
    print::header("summary");
    print_summary(&snapshot);
    print::fat_separator();
    print::print(&format!(
        "Analysis complete in {}",
        format!("{:.2}s", start_time.elapsed().as_secs_f64()).bold().yellow()
    ));
    Ok(())
}

/// Runs the analyzer under a spinner.
pub async fn build(analyzer: &TopologyAnalyzer, cancel: &CancellationToken) -> anyhow::Result<Arc<TopologySnapshot>> {
    let span = spinner::analysis_span("Mapping networks and probing workloads...");
    let snapshot = analyzer.snapshot(cancel).instrument(span).await?;
    Ok(snapshot)
}

fn print_services(snapshot: &TopologySnapshot) {
    for (idx, service) in snapshot.services.iter().enumerate() {
        print::tree_head(idx, &service.name);
        let members: Vec<String> = service
            .workloads
            .iter()
            .map(|id| {
                snapshot
                    .workload(id)
                    .map(|w| w.name.clone())
                    .unwrap_or_else(|| short_id(id, 12).to_string())
            })
            .collect();
        let ports: Vec<String> = service
            .endpoints
            .iter()
            .map(|e| format!("{}/{}", e.port, e.protocol))
            .collect();

        let mut details = vec![
            ("Type".to_string(), service.service_type.to_string()),
            ("Workloads".to_string(), members.join(", ")),
        ];
        if !ports.is_empty() {
            details.push(("Ports".to_string(), ports.join(", ")));
        }
        let deps: Vec<String> = snapshot
            .dependencies
            .iter()
            .filter(|d| d.source_service == service.name)
            .map(|d| format!("{} ({})", d.target_service, d.health_impact))
            .collect();
        if !deps.is_empty() {
            details.push(("Depends on".to_string(), deps.join(", ")));
        }
        print::as_tree_one_level(&details);
    }
}

fn print_summary(snapshot: &TopologySnapshot) {
    let summary = &snapshot.summary;
    let metrics = &snapshot.analysis_metrics;

    print::aligned_line("Networks", summary.total_networks, KEY_WIDTH);
    print::aligned_line("Workloads", summary.total_workloads, KEY_WIDTH);
    print::aligned_line("Services", summary.total_services, KEY_WIDTH);
    print::aligned_line("Connections", summary.total_connections, KEY_WIDTH);
    print::aligned_line("Dependencies", summary.total_dependencies, KEY_WIDTH);
    print::aligned_line("Clusters", summary.total_clusters, KEY_WIDTH);
    print::aligned_line(
        "Probes",
        format!(
            "{} ok, {} failed, {} unknown",
            metrics.successful_tests.to_string().green(),
            metrics.failed_tests.to_string().red(),
            metrics.unknown_tests
        ),
        KEY_WIDTH,
    );
    print::aligned_line(
        "Density",
        format!("{:.3}", summary.complexity.connection_density),
        KEY_WIDTH,
    );
    print::aligned_line("Max depth", summary.complexity.max_depth, KEY_WIDTH);
    if !metrics.warnings.is_empty() {
        print::aligned_line("Warnings", metrics.warnings.len().to_string().yellow(), KEY_WIDTH);
    }
}
