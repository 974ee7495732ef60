//! Integration tests for the optimization driver
//!
//! These tests run the full learning loop over small cash networks.

#![allow(clippy::float_cmp)]

use cashflow_core::{CashFlowError, NodeType};
use cashflow_rl::{
    Action, CashFlowOptimizer, OptimizerOptions, QLearning, RLAlgorithm, RetentionPolicy, Snapshot,
    State,
};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn seeded_optimizer(retention: RetentionPolicy) -> CashFlowOptimizer {
    let agent = QLearning::new(0.1, 0.9, 0.3).with_seed(2024);
    let options = OptimizerOptions {
        retention,
        ..OptimizerOptions::default()
    };
    CashFlowOptimizer::with_agent(Box::new(agent), options)
}

/// One revenue feeding a cheap and an expensive expense
fn two_expense_optimizer(retention: RetentionPolicy) -> CashFlowOptimizer {
    let mut optimizer = seeded_optimizer(retention);
    optimizer.add_node("Revenue", NodeType::Revenue, 100.0);
    optimizer.add_node("Cheap", NodeType::Expense, 0.0);
    optimizer.add_node("Pricey", NodeType::Expense, 0.0);
    assert!(optimizer.add_edge("Revenue", "Cheap", 10.0, 1.0));
    assert!(optimizer.add_edge("Revenue", "Pricey", 10.0, 5.0));
    optimizer
}

fn chain_optimizer() -> CashFlowOptimizer {
    let mut optimizer = seeded_optimizer(RetentionPolicy::FinalIteration);
    optimizer.add_node("A", NodeType::Revenue, 100.0);
    optimizer.add_node("B", NodeType::Account, 0.0);
    optimizer.add_node("C", NodeType::Expense, 0.0);
    optimizer.add_edge("A", "B", 50.0, 1.0);
    optimizer.add_edge("B", "C", 50.0, 1.0);
    optimizer.add_edge("A", "C", 30.0, 5.0);
    optimizer
}

#[test]
fn test_zero_and_negative_iterations_do_nothing() {
    let mut optimizer = chain_optimizer();

    assert!(optimizer.optimize(0).is_err());
    assert!(optimizer.optimize(-5).is_err());

    assert!(!optimizer.has_run());
    assert!(optimizer.best_transactions().is_empty());
    assert!(optimizer.cost_history().is_empty());
    assert_eq!(optimizer.node_balance("A"), Some(100.0));
}

#[test]
fn test_no_expense_node_is_noop() {
    let mut optimizer = seeded_optimizer(RetentionPolicy::FinalIteration);
    optimizer.add_node("A", NodeType::Revenue, 100.0);
    optimizer.add_node("B", NodeType::Account, 0.0);

    let result = optimizer.optimize(3);

    assert!(matches!(
        result,
        Err(CashFlowError::MissingNodeClass(NodeType::Expense))
    ));
    assert!(optimizer.cost_history().is_empty());
    assert!(!optimizer.has_run());
}

#[test]
fn test_no_revenue_node_is_noop() {
    let mut optimizer = seeded_optimizer(RetentionPolicy::FinalIteration);
    optimizer.add_node("C", NodeType::Expense, 0.0);

    assert!(matches!(
        optimizer.optimize(1),
        Err(CashFlowError::MissingNodeClass(NodeType::Revenue))
    ));
    assert!(!optimizer.has_run());
}

#[test]
fn test_final_iteration_overwrites_best() {
    let mut optimizer = two_expense_optimizer(RetentionPolicy::FinalIteration);
    optimizer.optimize(2).unwrap();

    // The last pair of the last iteration wins even though it is pricier
    assert_close(optimizer.best_total_cost(), 50.0);
    let best = optimizer.best_transactions();
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].dest_id(), "Pricey");

    assert_eq!(optimizer.cost_history(), &[60.0, 60.0]);
    assert_close(optimizer.node_balance("Revenue").unwrap(), 90.0);
    assert_close(optimizer.node_balance("Pricey").unwrap(), 10.0);
    assert_close(optimizer.node_balance("Cheap").unwrap(), 0.0);
}

#[test]
fn test_strictly_lower_keeps_cheapest() {
    let mut optimizer = two_expense_optimizer(RetentionPolicy::StrictlyLower);
    optimizer.optimize(2).unwrap();

    assert_close(optimizer.best_total_cost(), 10.0);
    assert_eq!(optimizer.best_transactions()[0].dest_id(), "Cheap");
    assert_close(optimizer.node_balance("Cheap").unwrap(), 10.0);
}

#[test]
fn test_best_persists_across_runs_but_history_resets() {
    let mut optimizer = two_expense_optimizer(RetentionPolicy::StrictlyLower);
    optimizer.optimize(3).unwrap();
    assert_eq!(optimizer.cost_history().len(), 3);

    let second = optimizer.optimize(1).unwrap();
    assert_eq!(optimizer.cost_history().len(), 1);
    assert_close(optimizer.best_total_cost(), 10.0);
    // Nothing cheaper than the carried-over best, so balances stay put
    assert_eq!(second.transactions_applied, 0);
    assert_close(optimizer.node_balance("Cheap").unwrap(), 10.0);
    assert_close(optimizer.node_balance("Revenue").unwrap(), 90.0);
}

#[test]
fn test_drained_revenue_never_goes_negative() {
    let mut optimizer = seeded_optimizer(RetentionPolicy::StrictlyLower);
    optimizer.add_node("R", NodeType::Revenue, 100.0);
    optimizer.add_node("E", NodeType::Expense, 0.0);
    assert!(optimizer.add_edge("R", "E", 100.0, 0.0));

    for _ in 0..3 {
        optimizer.optimize(1).unwrap();
        assert_close(optimizer.node_balance("R").unwrap(), 0.0);
        assert_close(optimizer.node_balance("E").unwrap(), 100.0);
    }
}

#[test]
fn test_final_iteration_reapplies_fresh_ledger_each_run() {
    let mut optimizer = two_expense_optimizer(RetentionPolicy::FinalIteration);
    optimizer.optimize(1).unwrap();
    optimizer.optimize(1).unwrap();

    // Each run recomputes against current balances before applying
    assert_close(optimizer.node_balance("Pricey").unwrap(), 20.0);
    assert_close(optimizer.node_balance("Revenue").unwrap(), 80.0);
}

#[test]
fn test_q_values_follow_rewards() {
    let mut optimizer = chain_optimizer();
    optimizer.optimize(2).unwrap();

    let initial = State::new([("A", 100.0), ("B", 0.0), ("C", 0.0)]);
    let action = Action::new("A", "C");

    // First update: 0.1 * -250 = -25; second: -25 + 0.1 * (-250 - -25)
    assert_close(optimizer.agent().q_value(&initial, &action), -47.5);
    assert!(optimizer.rl_improved());
}

#[test]
fn test_exploration_decays_per_iteration() {
    let mut optimizer = chain_optimizer();
    let summary = optimizer.optimize(4).unwrap();

    assert_close(summary.exploration_rate, 0.3 * 0.95_f64.powi(4));
    assert_close(optimizer.agent().exploration_rate(), summary.exploration_rate);
}

#[test]
fn test_every_pair_evaluated_in_order() {
    let mut optimizer = seeded_optimizer(RetentionPolicy::FinalIteration);
    optimizer.add_node("R1", NodeType::Revenue, 50.0);
    optimizer.add_node("R2", NodeType::Revenue, 50.0);
    optimizer.add_node("Hub", NodeType::Account, 0.0);
    optimizer.add_node("E1", NodeType::Expense, 0.0);
    optimizer.add_node("E2", NodeType::Expense, 0.0);
    optimizer.add_edge("R1", "Hub", 40.0, 1.0);
    optimizer.add_edge("R2", "Hub", 40.0, 2.0);
    optimizer.add_edge("Hub", "E1", 30.0, 1.0);
    optimizer.add_edge("Hub", "E2", 30.0, 3.0);

    let summary = optimizer.optimize(2).unwrap();
    assert_eq!(summary.pairs_evaluated, 8);

    // Per iteration: R1->E1 60, R1->E2 120, R2->E1 90, R2->E2 150
    for cost in optimizer.cost_history() {
        assert_close(*cost, 420.0);
    }
    // Last pair of the last iteration
    assert_close(optimizer.best_total_cost(), 150.0);
    assert_eq!(optimizer.best_transactions()[0].source_id(), "R2");
}

#[test]
fn test_unreachable_pair_contributes_zero() {
    let mut optimizer = seeded_optimizer(RetentionPolicy::StrictlyLower);
    optimizer.add_node("R", NodeType::Revenue, 10.0);
    optimizer.add_node("E", NodeType::Expense, 0.0);

    optimizer.optimize(1).unwrap();
    assert_eq!(optimizer.cost_history(), &[0.0]);
    assert_eq!(optimizer.best_total_cost(), 0.0);
    assert!(optimizer.best_transactions().is_empty());
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let mut first = chain_optimizer();
    let mut second = chain_optimizer();
    first.optimize(5).unwrap();
    second.optimize(5).unwrap();

    assert_eq!(first.snapshot(), second.snapshot());
}

#[test]
fn test_snapshot_after_run() {
    let mut optimizer = chain_optimizer();
    optimizer.optimize(2).unwrap();

    let snapshot = optimizer.snapshot();
    assert_eq!(snapshot.nodes.len(), 3);
    assert_eq!(snapshot.transactions.len(), 3);
    assert_eq!(snapshot.cost_history, vec![250.0, 250.0]);
    assert_eq!(snapshot.total_cost, 250.0);
    assert!(snapshot.rl_improved);

    let json = snapshot.to_json_pretty().unwrap();
    assert!(json.contains("\"costHistory\""));
    assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
}

#[test]
fn test_cost_savings_report() {
    let mut optimizer = chain_optimizer();
    optimizer.optimize(1).unwrap();
    assert!(optimizer.cost_savings().is_none());

    optimizer.optimize(3).unwrap();
    let savings = optimizer.cost_savings().unwrap();
    assert_close(savings.savings, 0.0);
}

#[test]
fn test_pure_exploitation_prefers_higher_value() {
    let mut agent = QLearning::new(0.1, 0.9, 0.0).with_seed(9);
    let state = State::new([("A", 100.0), ("B", 0.0)]);
    let worse = Action::new("A", "B");
    let better = Action::new("B", "A");
    agent.set_q_value(&state, &worse, 3.0);
    agent.set_q_value(&state, &better, 5.0);

    let actions = vec![worse, better.clone()];
    let agent: &mut dyn RLAlgorithm = &mut agent;
    for _ in 0..100 {
        assert_eq!(agent.select_action(&state, &actions), Some(&better));
    }
}
