//! Graphviz DOT renderer.
//!
//!   topomap export --format dot | dot -Tsvg -o topology.svg

use topomap_common::topology::{short_id, TopologySnapshot};

pub fn render(snapshot: &TopologySnapshot) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("digraph NetworkTopology {\n");
    out.push_str("    rankdir=TB;\n");
    out.push_str("    node [shape=box];\n\n");

    for w in &snapshot.workloads {
        out.push_str(&format!(
            "    \"{}\" [label=\"{}\\n{}\"];\n",
            escape(short_id(&w.id, 12)),
            escape(&w.name),
            escape(&w.image),
        ));
    }

    for s in &snapshot.services {
        out.push_str(&format!(
            "    \"service:{}\" [label=\"{}\\n{}\", shape=ellipse];\n",
            escape(&s.name),
            escape(&s.name),
            s.service_type,
        ));
    }

    if !snapshot.connections.is_empty() {
        out.push('\n');
    }
    for c in &snapshot.connections {
        out.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"{}:{}\"];\n",
            escape(short_id(&c.source.id, 12)),
            escape(short_id(&c.target.id, 12)),
            escape(&c.protocol),
            c.port,
        ));
    }

    out.push_str("}\n");
    out
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
