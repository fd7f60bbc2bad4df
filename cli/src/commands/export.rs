use std::path::Path;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use topomap_core::{ExportFormat, TopologyAnalyzer};
use tracing::info;

use super::analyze::build;

pub async fn export(
    analyzer: &TopologyAnalyzer,
    cancel: &CancellationToken,
    format: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    // Bad formats fail before any analysis runs.
    let format: ExportFormat = format.parse()?;
    let snapshot = build(analyzer, cancel).await?;
    let bytes = analyzer.render(&snapshot, format)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &bytes)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {} export to {}", format, path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&bytes).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
