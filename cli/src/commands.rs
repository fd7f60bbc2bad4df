pub mod analyze;
pub mod export;
pub mod monitor;
pub mod validate;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use topomap_common::config::{AnalyzerConfig, DEFAULT_PROBE_CONCURRENCY};

#[derive(Parser)]
#[command(name = "topomap")]
#[command(about = "Maps the network topology of a container environment.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Inventory file produced by a runtime provider
    #[arg(short, long, global = true, default_value = "inventory.json")]
    pub inventory: PathBuf,

    /// How long a snapshot is reused before rebuilding
    #[arg(long, global = true, default_value_t = 60)]
    pub ttl_secs: u64,

    /// Timeout for a single reachability probe
    #[arg(long, global = true, default_value_t = 3000)]
    pub probe_timeout_ms: u64,

    /// Probes allowed in flight at once
    #[arg(short, long, global = true, default_value_t = DEFAULT_PROBE_CONCURRENCY)]
    pub concurrency: usize,

    /// Skip live probing; connections are reported as unknown
    #[arg(long, global = true)]
    pub no_probe: bool,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a snapshot and print its summary
    #[command(alias = "a")]
    Analyze,
    /// Render a snapshot as json, dot or cytoscape
    #[command(alias = "e")]
    Export {
        #[arg(short, long, default_value = "json")]
        format: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a snapshot for structural problems
    #[command(alias = "v")]
    Validate,
    /// Re-analyze periodically and report changes
    #[command(alias = "m")]
    Monitor {
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig::default()
            .with_cache_ttl(Duration::from_secs(self.ttl_secs))
            .with_probe_timeout(Duration::from_millis(self.probe_timeout_ms))
            .with_probe_concurrency(self.concurrency)
            .with_probing(!self.no_probe)
    }
}
