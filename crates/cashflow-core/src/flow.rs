//! Budget-constrained min-cost max-flow
//!
//! Successive shortest augmenting paths: find the cheapest residual path
//! from source to sink, push the bottleneck along it, repeat. The
//! bottleneck is additionally capped by the balance of the path's first
//! node, so a source can never send more than it holds.
//!
//! Balances are updated additively while augmenting: every edge on the
//! path debits its tail and credits its head by the pushed amount, which
//! leaves interior nodes unchanged and moves the funds from source to sink.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CashFlowError, Result};
use crate::graph::Graph;
use crate::path::ShortestPaths;
use crate::transaction::TransactionRecord;

/// Amounts at or below this are treated as zero.
pub const FLOW_EPSILON: f64 = 1e-6;

/// Outcome of one solver run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowResult {
    pub total_cost: f64,
    pub total_flow: f64,
    pub transactions: Vec<TransactionRecord>,
    /// Number of augmenting paths used
    pub augmentations: usize,
}

impl FlowResult {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Min-cost max-flow solver bound to one graph
pub struct MinCostMaxFlow<'g> {
    graph: &'g mut Graph,
}

impl<'g> MinCostMaxFlow<'g> {
    pub fn new(graph: &'g mut Graph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &Graph {
        &*self.graph
    }

    /// Route as much flow as possible from `source_id` to `sink_id` at
    /// minimum cost.
    ///
    /// Unknown ids produce an empty result and leave the graph untouched.
    pub fn compute(&mut self, source_id: &str, sink_id: &str) -> FlowResult {
        match self.try_compute(source_id, sink_id) {
            Ok(result) => result,
            Err(e) => {
                warn!("Min-cost flow skipped: {}", e);
                FlowResult::default()
            }
        }
    }

    /// Like [`compute`](Self::compute) but reports unknown endpoints as errors.
    pub fn try_compute(&mut self, source_id: &str, sink_id: &str) -> Result<FlowResult> {
        let source = self
            .graph
            .node_index(source_id)
            .ok_or_else(|| CashFlowError::NodeNotFound(source_id.to_string()))?;
        let sink = self
            .graph
            .node_index(sink_id)
            .ok_or_else(|| CashFlowError::NodeNotFound(sink_id.to_string()))?;

        let mut result = FlowResult::default();

        loop {
            let paths = match ShortestPaths::from_source(&*self.graph, source) {
                Ok(paths) => paths,
                Err(e) => {
                    warn!("Stopping augmentation from {}: {}", source_id, e);
                    break;
                }
            };

            let path = paths.path_to(sink);
            if path.is_empty() {
                break;
            }

            let capacity = path
                .iter()
                .map(|&id| self.graph.edge(id).residual_capacity())
                .fold(f64::INFINITY, f64::min);

            let origin = self.graph.edge(path[0]).source();
            let available = self.graph.node(origin).map_or(0.0, |node| node.balance);
            let bottleneck = capacity.min(available);

            if bottleneck <= FLOW_EPSILON {
                debug!(
                    capacity,
                    available, "No usable capacity or funds left on cheapest path"
                );
                break;
            }

            for &edge_id in &path {
                self.graph.push_flow(edge_id, bottleneck);

                let edge = *self.graph.edge(edge_id);
                self.graph.adjust_balance_at(edge.source(), -bottleneck);
                self.graph.adjust_balance_at(edge.dest(), bottleneck);

                result.total_cost += edge.cost() * bottleneck;
                result.transactions.push(TransactionRecord::new(
                    self.node_name(edge.source()),
                    self.node_name(edge.dest()),
                    bottleneck,
                    edge.cost(),
                ));
            }

            result.total_flow += bottleneck;
            result.augmentations += 1;

            debug!(
                source = source_id,
                sink = sink_id,
                edges = path.len(),
                amount = bottleneck,
                unit_cost = paths.distance(sink).unwrap_or_default(),
                "Augmented flow"
            );
        }

        Ok(result)
    }

    fn node_name(&self, index: usize) -> String {
        self.graph.node_id(index).unwrap_or_default().to_string()
    }
}
