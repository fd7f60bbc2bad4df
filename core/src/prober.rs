//! # Connection Prober
//!
//! Probes every exposed port of every workload pair that shares a network and
//! turns the outcomes into [`NetworkConnection`] edges.
//!
//! Probes run on a bounded pool: a [`Semaphore`] caps how many are in flight and
//! a [`JoinSet`] collects them. Cancelling the outer token abandons whatever is
//! queued or still running; outcomes already collected are kept.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use topomap_common::topology::{
    short_id, AnalysisWarning, ConnectionDirection, ConnectionNode, ConnectionStatus, ExposedPort,
    NetworkConnection, NodeKind, Phase, TopologyWorkload,
};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::mapping::record;

const PROBED_PROTOCOL: &str = "tcp";

/// Reachability check against a single socket address.
///
/// Implementations own their timeout. An `Err` is a failed probe, never a
/// failed analysis.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: SocketAddr) -> anyhow::Result<()>;
}

/// Outcome of one probing phase.
#[derive(Debug, Default)]
pub struct ProbeReport {
    pub connections: Vec<NetworkConnection>,
    pub tests: usize,
    pub successful: usize,
    pub failed: usize,
    pub unknown: usize,
    pub abandoned: usize,
    pub duration: Duration,
    pub warnings: Vec<AnalysisWarning>,
}

/// One (source, target, port) triple to check.
struct PlannedProbe<'a> {
    source: &'a TopologyWorkload,
    target: &'a TopologyWorkload,
    port: &'a ExposedPort,
    address: Option<IpAddr>,
}

impl PlannedProbe<'_> {
    /// Socket to probe, or `None` when the outcome can only be `unknown`.
    fn socket(&self) -> Option<SocketAddr> {
        if !self.port.protocol.eq_ignore_ascii_case(PROBED_PROTOCOL) {
            return None;
        }
        self.address.map(|ip| SocketAddr::new(ip, self.port.container_port))
    }

    fn into_connection(self, status: ConnectionStatus) -> NetworkConnection {
        let port = self.port.container_port;
        NetworkConnection {
            id: connection_id(&self.source.id, &self.target.id, port),
            source: ConnectionNode {
                id: self.source.id.clone(),
                kind: NodeKind::Workload,
                name: self.source.name.clone(),
                address: self
                    .source
                    .shared_interface(self.target)
                    .and_then(|intf| intf.ip_address)
                    .or_else(|| self.source.primary_address()),
                port: None,
            },
            target: ConnectionNode {
                id: self.target.id.clone(),
                kind: NodeKind::Workload,
                name: self.target.name.clone(),
                address: self.address,
                port: Some(port),
            },
            protocol: self.port.protocol.clone(),
            port,
            direction: ConnectionDirection::Outbound,
            status,
            bandwidth_bps: None,
            latency_ms: None,
            packet_loss: None,
            last_seen: Utc::now(),
        }
    }
}

/// Stable edge identity: both truncated workload identities plus the port.
pub fn connection_id(source: &str, target: &str, port: u16) -> String {
    format!("{}-{}-{}", short_id(source, 12), short_id(target, 12), port)
}

pub struct ConnectionProber {
    prober: Arc<dyn Prober>,
    concurrency: usize,
    enabled: bool,
}

impl ConnectionProber {
    pub fn new(prober: Arc<dyn Prober>, concurrency: usize) -> Self {
        Self {
            prober,
            concurrency: concurrency.max(1),
            enabled: true,
        }
    }

    /// With probing disabled every planned edge is recorded as `unknown`.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub async fn run(&self, workloads: &[TopologyWorkload], cancel: &CancellationToken) -> ProbeReport {
        let started = Instant::now();
        let plan = plan_probes(workloads);
        let span = info_span!("probe", planned = plan.len(), concurrency = self.concurrency);

        let outcomes = self.execute(&plan, cancel).instrument(span).await;

        let mut report = ProbeReport {
            tests: plan.len(),
            ..ProbeReport::default()
        };
        for (planned, outcome) in plan.into_iter().zip(outcomes) {
            let Some(status) = outcome else {
                report.abandoned += 1;
                record(
                    &mut report.warnings,
                    AnalysisWarning::new(
                        Phase::Probing,
                        connection_id(&planned.source.id, &planned.target.id, planned.port.container_port),
                        "probe abandoned before it completed",
                    ),
                );
                continue;
            };
            match status {
                ConnectionStatus::Active => report.successful += 1,
                ConnectionStatus::Failed => report.failed += 1,
                _ => report.unknown += 1,
            }
            report.connections.push(planned.into_connection(status));
        }
        report.duration = started.elapsed();

        info!(
            "Probed {} ports: {} active, {} failed, {} unknown, {} abandoned",
            report.tests, report.successful, report.failed, report.unknown, report.abandoned
        );
        report
    }

    /// Runs the plan and returns one outcome per entry, `None` for abandoned ones.
    async fn execute(&self, plan: &[PlannedProbe<'_>], cancel: &CancellationToken) -> Vec<Option<ConnectionStatus>> {
        let mut outcomes: Vec<Option<ConnectionStatus>> = plan
            .iter()
            .map(|p| match p.socket() {
                Some(_) if self.enabled => None,
                _ => Some(ConnectionStatus::Unknown),
            })
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<(usize, ConnectionStatus)> = JoinSet::new();

        for (idx, planned) in plan.iter().enumerate() {
            if outcomes[idx].is_some() {
                continue;
            }
            let Some(socket) = planned.socket() else { continue };

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let prober = Arc::clone(&self.prober);
            tasks.spawn(async move {
                let _permit = permit;
                match prober.probe(socket).await {
                    Ok(()) => (idx, ConnectionStatus::Active),
                    Err(e) => {
                        debug!("Probe {} failed: {:#}", socket, e);
                        (idx, ConnectionStatus::Failed)
                    }
                }
            });
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Probing cancelled with {} probes outstanding", tasks.len());
                    tasks.abort_all();
                    // Finished tasks still yield their outcome after abort_all.
                    while let Some(joined) = tasks.join_next().await {
                        if let Ok((idx, status)) = joined {
                            outcomes[idx] = Some(status);
                        }
                    }
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((idx, status))) => outcomes[idx] = Some(status),
                    Some(Err(e)) => warn!("Probe task did not complete: {}", e),
                    None => break,
                },
            }
        }

        outcomes
    }
}

/// Every (source, target, port) triple for workload pairs sharing a network.
///
/// Each side of a pair is probed as the target with the other side as the
/// source. A port listed twice on the same workload is planned once.
fn plan_probes(workloads: &[TopologyWorkload]) -> Vec<PlannedProbe<'_>> {
    let mut plan = Vec::new();
    for (i, first) in workloads.iter().enumerate() {
        for second in &workloads[i + 1..] {
            if first.id == second.id || !first.shares_network_with(second) {
                continue;
            }
            plan_direction(first, second, &mut plan);
            plan_direction(second, first, &mut plan);
        }
    }
    debug!("Planned {} probes", plan.len());
    plan
}

fn plan_direction<'a>(source: &'a TopologyWorkload, target: &'a TopologyWorkload, plan: &mut Vec<PlannedProbe<'a>>) {
    let address = target
        .shared_interface(source)
        .and_then(|intf| intf.ip_address)
        .or_else(|| target.primary_address());

    for (n, port) in target.exposed_ports.iter().enumerate() {
        let repeated = target.exposed_ports[..n]
            .iter()
            .any(|earlier| earlier.container_port == port.container_port);
        if repeated {
            continue;
        }
        plan.push(PlannedProbe {
            source,
            target,
            port,
            address,
        });
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
