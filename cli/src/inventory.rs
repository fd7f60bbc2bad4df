//! File-backed inventory provider.
//!
//! Reads the JSON document a runtime collector wrote out, in the shape of
//! [`Inventory`]. Missing fields default to empty.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use topomap_common::inventory::{Inventory, InventoryProvider};
use tracing::debug;

pub struct JsonFileInventory {
    path: PathBuf,
}

impl JsonFileInventory {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

#[async_trait]
impl InventoryProvider for JsonFileInventory {
    async fn detect(&self, _cancel: &CancellationToken) -> anyhow::Result<Inventory> {
        let raw = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("reading inventory {}", self.path.display()))?;
        let inventory: Inventory = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing inventory {}", self.path.display()))?;
        debug!(
            "Loaded {} networks and {} workloads from {}",
            inventory.networks.len(),
            inventory.workloads.len(),
            self.path.display()
        );
        Ok(inventory)
    }
}
