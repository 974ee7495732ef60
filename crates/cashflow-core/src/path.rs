//! Single-source shortest paths over the residual graph
//!
//! Reverse twins carry negated costs, so a plain Dijkstra search is not
//! sound here. The finder is a label-correcting search (queue-based
//! Bellman-Ford, "SPFA"): a node is re-queued whenever its distance drops.
//! Each label also tracks the number of edges on its path; a label that
//! reaches `node_count` edges can only come from a negative cycle and is
//! reported as [`CashFlowError::NegativeCycle`].

use std::collections::VecDeque;

use crate::error::{CashFlowError, Result};
use crate::flow::FLOW_EPSILON;
use crate::graph::{EdgeId, Graph};

/// Relaxations must improve a label by more than this to count.
const COST_TOLERANCE: f64 = 1e-9;

/// Distances and predecessor edges from one source node
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    source: usize,
    distance: Vec<f64>,
    predecessor: Vec<Option<(usize, EdgeId)>>,
}

impl ShortestPaths {
    /// Run the search from `source` using only edges with positive residual
    /// capacity.
    pub fn from_source(graph: &Graph, source: usize) -> Result<Self> {
        let n = graph.node_count();
        if source >= n {
            return Err(CashFlowError::NodeNotFound(format!("#{source}")));
        }

        let mut distance = vec![f64::INFINITY; n];
        let mut predecessor: Vec<Option<(usize, EdgeId)>> = vec![None; n];
        let mut hops = vec![0usize; n];
        let mut in_queue = vec![false; n];
        let mut queue = VecDeque::with_capacity(n);

        distance[source] = 0.0;
        queue.push_back(source);
        in_queue[source] = true;

        while let Some(u) = queue.pop_front() {
            in_queue[u] = false;
            let du = distance[u];

            for &edge_id in graph.adjacent_edges(u) {
                let edge = graph.edge(edge_id);
                if edge.residual_capacity() <= FLOW_EPSILON {
                    continue;
                }

                let v = edge.dest();
                let candidate = du + edge.cost();
                if candidate < distance[v] - COST_TOLERANCE {
                    distance[v] = candidate;
                    predecessor[v] = Some((u, edge_id));
                    hops[v] = hops[u] + 1;

                    if hops[v] >= n {
                        let id = graph.node_id(source).unwrap_or_default();
                        return Err(CashFlowError::NegativeCycle(id.to_string()));
                    }

                    if !in_queue[v] {
                        queue.push_back(v);
                        in_queue[v] = true;
                    }
                }
            }
        }

        Ok(Self {
            source,
            distance,
            predecessor,
        })
    }

    pub fn source(&self) -> usize {
        self.source
    }

    /// Cost of the cheapest path to `target`, if reachable
    pub fn distance(&self, target: usize) -> Option<f64> {
        self.distance
            .get(target)
            .copied()
            .filter(|d| d.is_finite())
    }

    pub fn is_reachable(&self, target: usize) -> bool {
        self.distance(target).is_some()
    }

    /// Edges from the source to `target` in travel order.
    ///
    /// Empty when `target` is unreachable or is the source itself.
    pub fn path_to(&self, target: usize) -> Vec<EdgeId> {
        if !self.is_reachable(target) {
            return Vec::new();
        }

        let mut path = Vec::new();
        let mut current = target;
        while current != self.source {
            match self.predecessor[current] {
                Some((prev, edge)) => {
                    path.push(edge);
                    current = prev;
                }
                None => return Vec::new(),
            }
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeType;

    fn index(graph: &Graph, id: &str) -> usize {
        graph.node_index(id).unwrap()
    }

    #[test]
    fn test_prefers_cheaper_longer_path() {
        let mut graph = Graph::new();
        graph.add_node("A", NodeType::Revenue, 100.0);
        graph.add_node("B", NodeType::Account, 0.0);
        graph.add_node("C", NodeType::Expense, 0.0);
        let ab = graph.add_edge("A", "B", 50.0, 1.0).unwrap();
        let bc = graph.add_edge("B", "C", 50.0, 1.0).unwrap();
        graph.add_edge("A", "C", 30.0, 5.0).unwrap();

        let paths = ShortestPaths::from_source(&graph, index(&graph, "A")).unwrap();
        assert_eq!(paths.distance(index(&graph, "C")), Some(2.0));
        assert_eq!(paths.path_to(index(&graph, "C")), vec![ab, bc]);
    }

    #[test]
    fn test_unreachable_target() {
        let mut graph = Graph::new();
        graph.add_node("A", NodeType::Revenue, 10.0);
        graph.add_node("B", NodeType::Expense, 0.0);
        // Only a zero-capacity edge
        graph.add_edge("A", "B", 0.0, 1.0).unwrap();

        let paths = ShortestPaths::from_source(&graph, 0).unwrap();
        assert!(!paths.is_reachable(1));
        assert!(paths.path_to(1).is_empty());
        assert!(paths.path_to(0).is_empty());
        assert!(paths.path_to(99).is_empty());
    }

    #[test]
    fn test_uses_negative_reverse_edge() {
        let mut graph = Graph::new();
        for id in ["S", "A", "B", "T"] {
            graph.add_node(id, NodeType::Account, 0.0);
        }
        let sa = graph.add_edge("S", "A", 1.0, 1.0).unwrap();
        let ab = graph.add_edge("A", "B", 1.0, 1.0).unwrap();
        let bt = graph.add_edge("B", "T", 1.0, 1.0).unwrap();
        let sb = graph.add_edge("S", "B", 1.0, 5.0).unwrap();
        let at = graph.add_edge("A", "T", 1.0, 5.0).unwrap();

        // Saturate the cheapest route S->A->B->T
        for edge in [sa, ab, bt] {
            graph.push_flow(edge, 1.0);
        }

        // The only remaining route cancels A->B through its twin
        let paths = ShortestPaths::from_source(&graph, index(&graph, "S")).unwrap();
        let t = index(&graph, "T");
        assert_eq!(paths.distance(t), Some(9.0));
        assert_eq!(paths.path_to(t), vec![sb, graph.edge(ab).twin(), at]);
    }

    #[test]
    fn test_negative_cycle_detected() {
        let mut graph = Graph::new();
        graph.add_node("A", NodeType::Account, 0.0);
        graph.add_node("B", NodeType::Account, 0.0);
        graph.add_node("C", NodeType::Account, 0.0);
        graph.add_edge("A", "B", 5.0, -2.0).unwrap();
        graph.add_edge("B", "C", 5.0, -2.0).unwrap();
        graph.add_edge("C", "A", 5.0, -2.0).unwrap();

        let result = ShortestPaths::from_source(&graph, 0);
        assert!(matches!(result, Err(CashFlowError::NegativeCycle(id)) if id == "A"));
    }

    #[test]
    fn test_invalid_source() {
        let graph = Graph::new();
        assert!(ShortestPaths::from_source(&graph, 0).is_err());
    }
}
