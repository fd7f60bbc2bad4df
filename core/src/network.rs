//! Transport-level reachability checks.

pub mod tcp;

pub use tcp::TcpProber;
