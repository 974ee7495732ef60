//! Optimization driver - runs the learning loop over the cash network
//!
//! Each iteration walks every revenue/expense pair in insertion order. For
//! a pair the driver snapshots the live balances, lets the agent pick the
//! routing action, solves min-cost flow on a disposable copy of the live
//! graph, and feeds `-cost` back as the reward. The live graph is only
//! touched once, after the last iteration, when the retained ledger is
//! applied to it. A ledger carried over from an earlier run was computed
//! against balances that no longer exist, so it is applied only when some
//! pair of the current run replaced it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cashflow_core::{
    CashFlowError, EdgeId, Graph, MinCostMaxFlow, NodeType, Result, TransactionRecord,
};

use crate::algorithm::{QLearning, RLAlgorithm};
use crate::experience::Experience;
use crate::snapshot::Snapshot;
use crate::state::{Action, State};

/// Which evaluated pair replaces the retained "best" result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// A strictly cheaper result wins, and every pair of the final
    /// iteration overwrites regardless of cost
    #[default]
    FinalIteration,
    /// Only a strictly cheaper result wins
    StrictlyLower,
}

impl RetentionPolicy {
    fn retains(self, flow_cost: f64, best_cost: f64, final_iteration: bool) -> bool {
        match self {
            RetentionPolicy::FinalIteration => final_iteration || flow_cost < best_cost,
            RetentionPolicy::StrictlyLower => flow_cost < best_cost,
        }
    }
}

/// Driver tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerOptions {
    /// Exploration is multiplied by this after every iteration
    pub exploration_decay: f64,
    pub retention: RetentionPolicy,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            exploration_decay: 0.95,
            retention: RetentionPolicy::default(),
        }
    }
}

/// What one `optimize` call did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationSummary {
    pub iterations: u64,
    pub pairs_evaluated: usize,
    pub best_total_cost: f64,
    /// Zero when this run retained nothing new
    pub transactions_applied: usize,
    pub exploration_rate: f64,
}

/// Change between the first and last iteration cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostSavings {
    pub initial: f64,
    pub final_cost: f64,
    pub savings: f64,
    /// `None` when the initial cost is zero
    pub percent: Option<f64>,
}

impl CostSavings {
    /// Needs at least two entries of history
    pub fn from_history(history: &[f64]) -> Option<Self> {
        if history.len() < 2 {
            return None;
        }
        let initial = history[0];
        let final_cost = history[history.len() - 1];
        let savings = initial - final_cost;
        let percent = (initial != 0.0).then(|| savings / initial * 100.0);
        Some(Self {
            initial,
            final_cost,
            savings,
            percent,
        })
    }
}

/// Cash-flow optimizer owning the live graph and the learning agent
pub struct CashFlowOptimizer {
    graph: Graph,
    agent: Box<dyn RLAlgorithm>,
    options: OptimizerOptions,
    best_transactions: Vec<TransactionRecord>,
    best_total_cost: f64,
    cost_history: Vec<f64>,
    has_run: bool,
}

impl CashFlowOptimizer {
    /// Optimizer with the default Q-learning agent
    pub fn new() -> Self {
        Self::with_agent(Box::new(QLearning::default()), OptimizerOptions::default())
    }

    pub fn with_agent(agent: Box<dyn RLAlgorithm>, options: OptimizerOptions) -> Self {
        Self {
            graph: Graph::new(),
            agent,
            options,
            best_transactions: Vec::new(),
            best_total_cost: f64::MAX,
            cost_history: Vec::new(),
            has_run: false,
        }
    }

    pub fn add_node(&mut self, id: impl Into<String>, node_type: NodeType, balance: f64) -> usize {
        self.graph.add_node(id, node_type, balance)
    }

    /// Add a costed, capacitated link. Returns false and changes nothing
    /// when either node is unknown or the numbers are invalid.
    pub fn add_edge(&mut self, source_id: &str, dest_id: &str, capacity: f64, cost: f64) -> bool {
        match self.try_add_edge(source_id, dest_id, capacity, cost) {
            Ok(_) => true,
            Err(e) => {
                warn!("Edge {}->{} rejected: {}", source_id, dest_id, e);
                false
            }
        }
    }

    pub fn try_add_edge(
        &mut self,
        source_id: &str,
        dest_id: &str,
        capacity: f64,
        cost: f64,
    ) -> Result<EdgeId> {
        self.graph.add_edge(source_id, dest_id, capacity, cost)
    }

    /// Run `iterations` rounds of learning over every revenue/expense pair.
    ///
    /// Non-positive `iterations`, or a graph without revenue or expense
    /// nodes, is a no-op reported as an error; nothing is modified.
    pub fn optimize(&mut self, iterations: i64) -> Result<OptimizationSummary> {
        if iterations <= 0 {
            warn!("Number of iterations must be positive, got {}", iterations);
            return Err(CashFlowError::InvalidIterations(iterations));
        }

        let revenues: Vec<String> = self
            .graph
            .nodes_of_type(NodeType::Revenue)
            .into_iter()
            .map(str::to_string)
            .collect();
        let expenses: Vec<String> = self
            .graph
            .nodes_of_type(NodeType::Expense)
            .into_iter()
            .map(str::to_string)
            .collect();

        if revenues.is_empty() || expenses.is_empty() {
            warn!("Need at least one revenue source and one expense destination");
            let missing = if revenues.is_empty() {
                NodeType::Revenue
            } else {
                NodeType::Expense
            };
            return Err(CashFlowError::MissingNodeClass(missing));
        }

        self.has_run = true;
        self.cost_history.clear();

        let mut pairs_evaluated = 0;
        let mut retained_this_run = false;

        for i in 0..iterations {
            let final_iteration = i == iterations - 1;
            let mut iteration_cost = 0.0;

            for revenue_id in &revenues {
                for expense_id in &expenses {
                    let current_state = State::from_graph(&self.graph);
                    let actions = vec![Action::new(revenue_id.as_str(), expense_id.as_str())];

                    let Some(selected) = self.agent.select_action(&current_state, &actions).cloned()
                    else {
                        continue;
                    };

                    let mut sandbox = self.graph.copy();
                    let result =
                        MinCostMaxFlow::new(&mut sandbox).compute(&selected.source, &selected.sink);
                    let flow_cost = result.total_cost;
                    iteration_cost += flow_cost;
                    pairs_evaluated += 1;

                    let next_state = State::from_graph(&sandbox);
                    let reward = -flow_cost;
                    self.agent.update(&Experience::new(
                        current_state,
                        selected,
                        reward,
                        next_state,
                        actions,
                    ));

                    if self
                        .options
                        .retention
                        .retains(flow_cost, self.best_total_cost, final_iteration)
                    {
                        debug!(
                            revenue = revenue_id.as_str(),
                            expense = expense_id.as_str(),
                            cost = flow_cost,
                            "Retained flow result"
                        );
                        self.best_total_cost = flow_cost;
                        self.best_transactions = result.transactions;
                        retained_this_run = true;
                    }
                }
            }

            self.cost_history.push(iteration_cost);
            self.agent.decay_exploration(self.options.exploration_decay);

            info!(
                "Iteration {}: total cost = {:.2}, exploration rate = {:.2}",
                i + 1,
                iteration_cost,
                self.agent.exploration_rate()
            );
        }

        let transactions_applied = if retained_this_run {
            apply_to_graph(&mut self.graph, &self.best_transactions);
            self.best_transactions.len()
        } else {
            debug!("No cheaper result this run, live balances left unchanged");
            0
        };

        Ok(OptimizationSummary {
            iterations: iterations.unsigned_abs(),
            pairs_evaluated,
            best_total_cost: self.best_total_cost,
            transactions_applied,
            exploration_rate: self.agent.exploration_rate(),
        })
    }

    /// Debit each transaction's source and credit its destination on the
    /// live graph
    pub fn apply_transactions(&mut self, transactions: &[TransactionRecord]) {
        apply_to_graph(&mut self.graph, transactions);
    }

    pub fn best_transactions(&self) -> &[TransactionRecord] {
        &self.best_transactions
    }

    /// Cost of the retained result; `f64::MAX` until something is retained
    pub fn best_total_cost(&self) -> f64 {
        self.best_total_cost
    }

    /// One entry per iteration of the most recent run
    pub fn cost_history(&self) -> &[f64] {
        &self.cost_history
    }

    pub fn has_run(&self) -> bool {
        self.has_run
    }

    pub fn node_type(&self, id: &str) -> Option<NodeType> {
        self.graph.node_type(id)
    }

    pub fn node_balance(&self, id: &str) -> Option<f64> {
        self.graph.balance(id)
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.graph.node_ids().collect()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn agent(&self) -> &dyn RLAlgorithm {
        self.agent.as_ref()
    }

    pub fn agent_mut(&mut self) -> &mut dyn RLAlgorithm {
        self.agent.as_mut()
    }

    pub fn options(&self) -> &OptimizerOptions {
        &self.options
    }

    /// Whether the agent has learned any values
    pub fn rl_improved(&self) -> bool {
        self.agent.has_learned()
    }

    pub fn cost_savings(&self) -> Option<CostSavings> {
        CostSavings::from_history(&self.cost_history)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            &self.graph,
            &self.best_transactions,
            &self.cost_history,
            self.best_total_cost,
            self.rl_improved(),
        )
    }
}

impl Default for CashFlowOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_to_graph(graph: &mut Graph, transactions: &[TransactionRecord]) {
    for t in transactions {
        if graph.adjust_balance(t.source_id(), -t.amount()).is_none() {
            warn!("Transaction source {} not found", t.source_id());
        }
        if graph.adjust_balance(t.dest_id(), t.amount()).is_none() {
            warn!("Transaction destination {} not found", t.dest_id());
        }
    }
}
