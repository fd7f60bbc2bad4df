mod commands;
mod inventory;
mod terminal;

use std::sync::Arc;

use commands::{CommandLine, Commands, analyze, export, monitor, validate};
use inventory::JsonFileInventory;
use terminal::{logging, print};
use tokio_util::sync::CancellationToken;
use topomap_core::TopologyAnalyzer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose);

    let provider = Arc::new(JsonFileInventory::new(&commands.inventory));
    let analyzer = TopologyAnalyzer::new(provider, commands.analyzer_config());

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    match commands.command {
        Commands::Analyze => {
            print::header("analyzing topology");
            analyze::analyze(&analyzer, &cancel).await
        }
        Commands::Export { format, output } => export::export(&analyzer, &cancel, &format, output.as_deref()).await,
        Commands::Validate => {
            print::header("validating topology");
            validate::validate(&analyzer, &cancel).await
        }
        Commands::Monitor { interval_secs } => {
            print::header("monitoring topology");
            monitor::monitor(&analyzer, &cancel, interval_secs).await
        }
    }
}
