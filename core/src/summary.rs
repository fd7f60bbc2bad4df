//! # Summary
//!
//! Counts and complexity figures. Everything here is a pure function of the
//! collections passed in.

use std::collections::{BTreeMap, HashMap};

use topomap_common::topology::{
    ComplexityMetrics, NetworkCluster, NetworkConnection, ServiceDependency, Summary, TopologyNetwork,
    TopologyService, TopologyWorkload,
};

pub struct SummaryInput<'a> {
    pub networks: &'a [TopologyNetwork],
    pub workloads: &'a [TopologyWorkload],
    pub services: &'a [TopologyService],
    pub connections: &'a [NetworkConnection],
    pub dependencies: &'a [ServiceDependency],
    pub clusters: &'a [NetworkCluster],
}

pub fn summarize(input: &SummaryInput<'_>) -> Summary {
    Summary {
        total_networks: input.networks.len(),
        total_workloads: input.workloads.len(),
        total_services: input.services.len(),
        total_connections: input.connections.len(),
        total_dependencies: input.dependencies.len(),
        total_clusters: input.clusters.len(),
        networks_by_driver: count_by(input.networks.iter().map(|n| n.driver.as_str())),
        workloads_by_state: count_by(input.workloads.iter().map(|w| w.state.as_str())),
        services_by_type: count_by(input.services.iter().map(|s| s.service_type.as_str())),
        complexity: complexity(input),
    }
}

pub fn complexity(input: &SummaryInput<'_>) -> ComplexityMetrics {
    let nodes = input.workloads.len() + input.services.len();
    let edges = input.connections.len();

    let connection_density = if nodes > 1 {
        edges as f64 / ((nodes * (nodes - 1)) as f64 / 2.0)
    } else {
        0.0
    };
    let branching_factor = if edges > 0 && nodes > 0 {
        edges as f64 / nodes as f64
    } else {
        0.0
    };

    let non_bridge = input.networks.iter().filter(|n| !n.is_bridge()).count();
    let routing_heavy = input
        .services
        .iter()
        .filter(|s| s.service_type.is_routing_heavy())
        .count();

    ComplexityMetrics {
        network_complexity: input.networks.len() as f64 + 0.5 * non_bridge as f64,
        service_complexity: input.services.len() as f64 + 0.5 * routing_heavy as f64,
        connection_density,
        cyclomatic_complexity: edges as i64 - nodes as i64 + 2,
        max_depth: max_depth(input.dependencies),
        branching_factor,
    }
}

fn count_by<'a>(keys: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for key in keys {
        let key = if key.is_empty() { "unknown" } else { key };
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Longest dependency chain, in edges.
///
/// Computed on the condensation of the dependency graph: a strongly connected
/// group of `k` services counts as a chain of `k - 1` edges and groups are
/// joined by single edges. Exact for acyclic graphs and for fully meshed
/// groups, an upper bound otherwise. Linear in services plus dependencies.
pub fn max_depth(dependencies: &[ServiceDependency]) -> usize {
    let mut ids: HashMap<&str, usize> = HashMap::new();
    let mut adjacency: Vec<Vec<usize>> = Vec::new();
    for dep in dependencies {
        let source = node_index(&mut ids, &mut adjacency, &dep.source_service);
        let target = node_index(&mut ids, &mut adjacency, &dep.target_service);
        if source != target {
            adjacency[source].push(target);
        }
    }

    // Components arrive in reverse topological order, so every successor's
    // depth is known by the time a component is reached.
    let components = strongly_connected(&adjacency);
    let mut component_of = vec![0; adjacency.len()];
    for (c, members) in components.iter().enumerate() {
        for &node in members {
            component_of[node] = c;
        }
    }

    let mut depth = vec![0usize; components.len()];
    for (c, members) in components.iter().enumerate() {
        let downstream = members
            .iter()
            .flat_map(|&node| adjacency[node].iter())
            .map(|&next| component_of[next])
            .filter(|&d| d != c)
            .map(|d| 1 + depth[d])
            .max()
            .unwrap_or(0);
        depth[c] = members.len() - 1 + downstream;
    }
    depth.into_iter().max().unwrap_or(0)
}

fn node_index<'a>(ids: &mut HashMap<&'a str, usize>, adjacency: &mut Vec<Vec<usize>>, name: &'a str) -> usize {
    *ids.entry(name).or_insert_with(|| {
        adjacency.push(Vec::new());
        adjacency.len() - 1
    })
}

/// Tarjan's algorithm over an adjacency list.
fn strongly_connected(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut tarjan = Tarjan {
        adjacency,
        index: vec![None; adjacency.len()],
        low: vec![0; adjacency.len()],
        on_stack: vec![false; adjacency.len()],
        stack: Vec::new(),
        next_index: 0,
        components: Vec::new(),
    };
    for node in 0..adjacency.len() {
        if tarjan.index[node].is_none() {
            tarjan.visit(node);
        }
    }
    tarjan.components
}

struct Tarjan<'g> {
    adjacency: &'g [Vec<usize>],
    index: Vec<Option<usize>>,
    low: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

impl Tarjan<'_> {
    fn visit(&mut self, node: usize) {
        self.index[node] = Some(self.next_index);
        self.low[node] = self.next_index;
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack[node] = true;

        let adjacency = self.adjacency;
        for &next in &adjacency[node] {
            match self.index[next] {
                None => {
                    self.visit(next);
                    self.low[node] = self.low[node].min(self.low[next]);
                }
                Some(idx) if self.on_stack[next] => self.low[node] = self.low[node].min(idx),
                Some(_) => {}
            }
        }

        if self.index[node] == Some(self.low[node]) {
            let mut component = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack[member] = false;
                component.push(member);
                if member == node {
                    break;
                }
            }
            self.components.push(component);
        }
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
