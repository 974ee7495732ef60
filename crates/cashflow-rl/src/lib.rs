//! Cashflow RL - Reinforcement learning over cash routing decisions
//!
//! This crate provides the tabular Q-learning agent that picks which
//! revenue->expense pair to route, and the optimization driver that runs
//! the min-cost flow solver for each pick and tracks the results.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::module_name_repetitions)]

pub mod algorithm;
pub mod engine;
pub mod experience;
pub mod snapshot;
pub mod state;

pub use algorithm::{LearningParams, QLearning, RLAlgorithm};
pub use engine::{
    CashFlowOptimizer, CostSavings, OptimizationSummary, OptimizerOptions, RetentionPolicy,
};
pub use experience::Experience;
pub use snapshot::Snapshot;
pub use state::{Action, Reward, State};
