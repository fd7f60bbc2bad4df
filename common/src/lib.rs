//! # Topomap Common
//!
//! Shared vocabulary for the topology analyzer.
//!
//! * **[`inventory`]**: raw facts as delivered by an [`inventory::InventoryProvider`].
//! * **[`topology`]**: the derived model (networks, workloads, services, edges, clusters).
//! * **[`network`]**: address normalization helpers used while mapping raw facts.
//! * **[`config`]** and **[`error`]**: analyzer settings and the error taxonomy.

pub mod config;
pub mod error;
pub mod inventory;
pub mod network;
pub mod topology;

pub use error::{TopologyError, TopologyResult};
