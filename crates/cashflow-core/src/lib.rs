//! Cashflow Core - Residual graph model and min-cost max-flow solver
//!
//! This crate provides the network-flow engine used by the optimizer:
//! the twin-edge residual graph, the shortest path finder, and the
//! budget-constrained successive shortest path solver.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]

pub mod error;
pub mod flow;
pub mod graph;
pub mod path;
pub mod transaction;

pub use error::{CashFlowError, Result};
pub use flow::{FlowResult, MinCostMaxFlow, FLOW_EPSILON};
pub use graph::{Edge, EdgeId, Graph, Node, NodeType};
pub use path::ShortestPaths;
pub use transaction::TransactionRecord;
