//! Residual graph of financial nodes and twin edges
//!
//! Edges live in a single arena owned by the [`Graph`]. Every edge is
//! allocated together with its twin: a forward edge carrying the stated
//! capacity and cost, and a reverse edge with zero capacity and negated
//! cost. The two members refer to each other by [`EdgeId`], and flow is
//! only ever changed through [`Graph::push_flow`], which updates both.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CashFlowError, Result};

/// Role of a node in the cash network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// Bank or intermediate account
    Account,
    /// Revenue source (inflow)
    Revenue,
    /// Expense destination (outflow)
    Expense,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Account => "ACCOUNT",
            NodeType::Revenue => "REVENUE",
            NodeType::Expense => "EXPENSE",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = CashFlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACCOUNT" => Ok(NodeType::Account),
            "REVENUE" => Ok(NodeType::Revenue),
            "EXPENSE" => Ok(NodeType::Expense),
            other => Err(CashFlowError::Config(format!("unknown node type: {other}"))),
        }
    }
}

/// A financial node and its current balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub balance: f64,
}

/// Index of an edge inside the graph's edge arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Directed, capacitated, costed edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    source: usize,
    dest: usize,
    capacity: f64,
    flow: f64,
    cost: f64,
    twin: EdgeId,
    forward: bool,
}

impl Edge {
    pub fn source(&self) -> usize {
        self.source
    }

    pub fn dest(&self) -> usize {
        self.dest
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn flow(&self) -> f64 {
        self.flow
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// The other member of this edge's twin pair
    pub fn twin(&self) -> EdgeId {
        self.twin
    }

    /// True for the member created with the caller's capacity and cost
    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// Additional flow this edge can carry
    pub fn residual_capacity(&self) -> f64 {
        self.capacity - self.flow
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Edge({}->{}, cap: {:.2}, flow: {:.2}, cost: {:.2})",
            self.source, self.dest, self.capacity, self.flow, self.cost
        )
    }
}

/// Residual graph owning all nodes and twin edges
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<EdgeId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index.
    ///
    /// Re-adding an existing id returns the existing index and leaves the
    /// node's type and balance untouched.
    pub fn add_node(&mut self, id: impl Into<String>, node_type: NodeType, balance: f64) -> usize {
        let id = id.into();
        if let Some(&existing) = self.index.get(&id) {
            return existing;
        }

        let index = self.nodes.len();
        self.index.insert(id.clone(), index);
        self.nodes.push(Node {
            id,
            node_type,
            balance,
        });
        self.adjacency.push(Vec::new());
        index
    }

    /// Add a forward/reverse twin pair, returning the forward edge id.
    ///
    /// Nothing is mutated when an endpoint is unknown or the numbers are
    /// out of range.
    pub fn add_edge(
        &mut self,
        source_id: &str,
        dest_id: &str,
        capacity: f64,
        cost: f64,
    ) -> Result<EdgeId> {
        let source = self
            .node_index(source_id)
            .ok_or_else(|| CashFlowError::NodeNotFound(source_id.to_string()))?;
        let dest = self
            .node_index(dest_id)
            .ok_or_else(|| CashFlowError::NodeNotFound(dest_id.to_string()))?;

        if !capacity.is_finite() || capacity < 0.0 {
            return Err(CashFlowError::InvalidCapacity {
                source_id: source_id.to_string(),
                dest_id: dest_id.to_string(),
                capacity,
            });
        }
        if !cost.is_finite() {
            return Err(CashFlowError::InvalidCost {
                source_id: source_id.to_string(),
                dest_id: dest_id.to_string(),
                cost,
            });
        }

        Ok(self.push_twin_pair(source, dest, capacity, cost))
    }

    fn push_twin_pair(&mut self, source: usize, dest: usize, capacity: f64, cost: f64) -> EdgeId {
        let forward_id = EdgeId(self.edges.len());
        let reverse_id = EdgeId(forward_id.0 + 1);

        self.edges.push(Edge {
            source,
            dest,
            capacity,
            flow: 0.0,
            cost,
            twin: reverse_id,
            forward: true,
        });
        self.edges.push(Edge {
            source: dest,
            dest: source,
            capacity: 0.0,
            flow: 0.0,
            cost: -cost,
            twin: forward_id,
            forward: false,
        });

        self.adjacency[source].push(forward_id);
        self.adjacency[dest].push(reverse_id);
        forward_id
    }

    /// Push up to `amount` units along `edge` and the opposite amount along
    /// its twin, returning the amount actually pushed.
    ///
    /// The amount is clamped to `[0, residual_capacity]`, so flow never
    /// exceeds capacity. This is the only place flow changes, so
    /// `twin.flow == -edge.flow` holds after every call.
    pub fn push_flow(&mut self, edge: EdgeId, amount: f64) -> f64 {
        let twin = self.edges[edge.0].twin;
        let residual = self.edges[edge.0].residual_capacity();
        let pushed = amount.min(residual).max(0.0);
        if pushed < amount {
            debug!(%edge, requested = amount, pushed, "Clamped flow push to residual capacity");
        }
        self.edges[edge.0].flow += pushed;
        self.edges[twin.0].flow -= pushed;
        pushed
    }

    /// Independent sandbox with the same nodes, balances and edge topology
    /// but no flow.
    pub fn copy(&self) -> Graph {
        Graph {
            nodes: self.nodes.clone(),
            index: self.index.clone(),
            edges: self
                .edges
                .iter()
                .map(|edge| Edge { flow: 0.0, ..*edge })
                .collect(),
            adjacency: self.adjacency.clone(),
        }
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node_id(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|node| node.id.as_str())
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.node_index(id).and_then(|index| self.nodes.get(index))
    }

    pub fn node_type(&self, id: &str) -> Option<NodeType> {
        self.node_by_id(id).map(|node| node.node_type)
    }

    pub fn balance(&self, id: &str) -> Option<f64> {
        self.node_by_id(id).map(|node| node.balance)
    }

    /// Overwrite a balance. Returns false for an unknown id.
    pub fn set_balance(&mut self, id: &str, balance: f64) -> bool {
        match self.node_index(id) {
            Some(index) => {
                self.nodes[index].balance = balance;
                true
            }
            None => false,
        }
    }

    /// Add `delta` to a node's balance and return the new balance.
    pub fn adjust_balance(&mut self, id: &str, delta: f64) -> Option<f64> {
        let index = self.node_index(id)?;
        self.adjust_balance_at(index, delta)
    }

    pub fn adjust_balance_at(&mut self, index: usize, delta: f64) -> Option<f64> {
        let node = self.nodes.get_mut(index)?;
        node.balance += delta;
        debug!(node = %node.id, balance = node.balance, "Updated balance");
        Some(node.balance)
    }

    /// Node ids in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.id.as_str())
    }

    /// Ids of every node of the given type, in insertion order
    pub fn nodes_of_type(&self, node_type: NodeType) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|node| node.node_type == node_type)
            .map(|node| node.id.as_str())
            .collect()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    /// All edges, forward and reverse, in allocation order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges in the arena, counting both twin members
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn forward_edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.forward)
            .map(|(i, edge)| (EdgeId(i), edge))
    }

    /// Outgoing edges of a node, reverse twins included
    pub fn adjacent_edges(&self, index: usize) -> &[EdgeId] {
        match self.adjacency.get(index) {
            Some(edges) => edges,
            None => &[],
        }
    }
}
