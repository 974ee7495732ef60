//! Persisted result snapshot
//!
//! The data contract with whatever writes results to disk: nodes with
//! their balances, the retained ledger, the per-iteration cost history,
//! the retained cost and whether the policy learned anything. Amounts are
//! rounded to two decimals when captured.

use serde::{Deserialize, Serialize};

use cashflow_core::{Graph, NodeType, TransactionRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub source: String,
    pub destination: String,
    pub amount: f64,
    /// Unit cost of the edge the transfer used
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub nodes: Vec<NodeEntry>,
    pub transactions: Vec<TransactionEntry>,
    pub cost_history: Vec<f64>,
    pub total_cost: f64,
    pub rl_improved: bool,
}

/// Round to cents; values too large to scale are left as they are
pub fn round2(value: f64) -> f64 {
    if value.is_finite() && value.abs() < 1e15 {
        (value * 100.0).round() / 100.0
    } else {
        value
    }
}

impl Snapshot {
    pub fn capture(
        graph: &Graph,
        transactions: &[TransactionRecord],
        cost_history: &[f64],
        total_cost: f64,
        rl_improved: bool,
    ) -> Self {
        Self {
            nodes: graph
                .nodes()
                .iter()
                .map(|node| NodeEntry {
                    id: node.id.clone(),
                    node_type: node.node_type,
                    balance: round2(node.balance),
                })
                .collect(),
            transactions: transactions
                .iter()
                .map(|t| TransactionEntry {
                    source: t.source_id().to_string(),
                    destination: t.dest_id().to_string(),
                    amount: round2(t.amount()),
                    cost: round2(t.unit_cost()),
                })
                .collect(),
            cost_history: cost_history.iter().copied().map(round2).collect(),
            total_cost: round2(total_cost),
            rl_improved,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
