//! # Mappers
//!
//! Turn raw inventory facts into topology records. Both mappers are pure and
//! independent of each other, so the analyzer runs them side by side.
//!
//! Malformed items never abort a mapper: the item (or the offending field) is
//! dropped and an [`AnalysisWarning`] is returned next to the mapped records.

mod network;
mod workload;

pub use network::map_networks;
pub use workload::{map_workloads, well_known_port_name};

use topomap_common::topology::AnalysisWarning;
use tracing::warn;

/// Records a skipped item and logs it.
pub(crate) fn record(warnings: &mut Vec<AnalysisWarning>, warning: AnalysisWarning) {
    warn!("{}: {} ({})", warning.phase, warning.message, warning.subject);
    warnings.push(warning);
}
