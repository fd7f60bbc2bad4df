use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use topomap_core::TopologyAnalyzer;
use tracing::info;

use crate::terminal::print;

pub async fn monitor(analyzer: &TopologyAnalyzer, cancel: &CancellationToken, interval_secs: u64) -> anyhow::Result<()> {
    let interval = Duration::from_secs(interval_secs.max(1));
    info!("Re-analyzing every {:?}, Ctrl-C to stop", interval);

    analyzer
        .monitor(interval, cancel, |snapshot| {
            print::print(&format!(
                "[{}] {} workloads, {} services, {} connections, {} clusters",
                Local::now().format("%H:%M:%S"),
                snapshot.summary.total_workloads,
                snapshot.summary.total_services,
                snapshot.summary.total_connections,
                snapshot.summary.total_clusters,
            ));
        })
        .await?;

    info!("Monitor stopped");
    Ok(())
}
