//! # Topomap Core
//!
//! The analysis pipeline. [`analyzer::TopologyAnalyzer`] is the entry point;
//! the phase modules are public so callers can run a single phase on their own
//! data.

pub mod analyzer;
pub mod cache;
pub mod cluster;
pub mod dependency;
pub mod discovery;
pub mod export;
pub mod mapping;
pub mod network;
pub mod prober;
pub mod summary;
pub mod validate;

#[cfg(test)]
mod testing;

pub use analyzer::TopologyAnalyzer;
pub use export::ExportFormat;
pub use prober::Prober;
