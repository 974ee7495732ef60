//! Network description files
//!
//! A network is a list of nodes followed by a list of edges, written as
//! TOML or JSON. The format is picked from the file extension.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use cashflow_core::NodeType;
use cashflow_rl::CashFlowOptimizer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    /// `account`, `revenue` or `expense`, any case
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: String,
    pub destination: String,
    pub capacity: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSpec {
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
}

/// Outcome of loading a network into an optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub nodes: usize,
    pub edges_added: usize,
    pub edges_rejected: usize,
}

impl NetworkSpec {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read network file {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let parsed = match extension.as_deref() {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            _ => bail!(
                "Unsupported network file {}: expected a .toml or .json extension",
                path.display()
            ),
        };
        parsed.with_context(|| format!("Failed to parse network file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Add every node, then every edge, in file order. Unknown node types
    /// fail the load; edges the graph rejects are skipped and counted.
    pub fn apply(&self, optimizer: &mut CashFlowOptimizer) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        for node in &self.nodes {
            let node_type: NodeType = node
                .node_type
                .parse()
                .map_err(|e| anyhow!("Node {}: {}", node.id, e))?;
            optimizer.add_node(node.id.as_str(), node_type, node.balance);
            report.nodes += 1;
        }

        for edge in &self.edges {
            match optimizer.try_add_edge(&edge.source, &edge.destination, edge.capacity, edge.cost) {
                Ok(_) => report.edges_added += 1,
                Err(e) => {
                    warn!(
                        "Skipping edge {} -> {}: {}",
                        edge.source, edge.destination, e
                    );
                    report.edges_rejected += 1;
                }
            }
        }

        Ok(report)
    }
}
