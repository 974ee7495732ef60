//! Run the optimizer over a network file

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use cashflow_rl::{CashFlowOptimizer, QLearning, RetentionPolicy, Snapshot};

use crate::config::Config;
use crate::network::NetworkSpec;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Network description file (.toml or .json)
    pub network: PathBuf,

    /// Number of learning iterations (overrides config)
    #[arg(short, long)]
    pub iterations: Option<i64>,

    /// Snapshot output path (overrides config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only keep a result when it is strictly cheaper
    #[arg(long)]
    pub strictly_lower: bool,

    /// Do not write the snapshot file
    #[arg(long)]
    pub no_snapshot: bool,

    /// Print the snapshot JSON instead of the text report
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: RunArgs, config: &Config) -> Result<()> {
    let spec = NetworkSpec::load(&args.network)?;

    let mut options = config.optimizer_options();
    if args.strictly_lower {
        options.retention = RetentionPolicy::StrictlyLower;
    }
    let agent = QLearning::try_from_params(&config.learning.params())?;
    let mut optimizer = CashFlowOptimizer::with_agent(Box::new(agent), options);

    let report = spec.apply(&mut optimizer)?;
    info!(
        nodes = report.nodes,
        edges = report.edges_added,
        rejected = report.edges_rejected,
        "Loaded network from {}",
        args.network.display()
    );

    let iterations = args.iterations.unwrap_or(config.optimizer.iterations);
    let (optimizer, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = optimizer.optimize(iterations);
        (optimizer, outcome)
    })
    .await
    .context("Optimizer task panicked")?;

    let summary = outcome.context("Optimization did not run")?;
    info!(
        iterations = summary.iterations,
        pairs = summary.pairs_evaluated,
        "Optimization complete"
    );

    let snapshot = optimizer.snapshot();
    if args.json {
        println!("{}", snapshot.to_json_pretty()?);
    } else {
        print!("{}", render_report(&optimizer));
    }

    if !args.no_snapshot {
        let path = args
            .output
            .unwrap_or_else(|| config.output.snapshot_path.clone());
        write_snapshot(&path, &snapshot)?;
        info!("Snapshot written to {}", path.display());
    }

    Ok(())
}

/// Human-readable results: retained ledger, costs, and balances
pub fn render_report(optimizer: &CashFlowOptimizer) -> String {
    let mut out = String::new();

    if !optimizer.has_run() {
        out.push_str("No optimization has been run yet.\n");
        return out;
    }

    out.push_str("Optimized Cash Flow Allocation:\n");
    for transaction in optimizer.best_transactions() {
        let _ = writeln!(out, "{transaction}");
    }
    let _ = writeln!(out, "Total Cost: ${:.2}", optimizer.best_total_cost());

    if let Some(savings) = optimizer.cost_savings() {
        match savings.percent {
            Some(percent) => {
                let _ = writeln!(
                    out,
                    "Total Cost Savings: ${:.2} ({:.2}%)",
                    savings.savings, percent
                );
            }
            None => {
                let _ = writeln!(out, "Total Cost Savings: ${:.2}", savings.savings);
            }
        }
        let _ = writeln!(
            out,
            "RL Policy Updated: {}",
            if optimizer.rl_improved() { "Yes" } else { "No" }
        );
    }

    out.push_str("\nCurrent Node Balances:\n");
    for node in optimizer.graph().nodes() {
        let _ = writeln!(out, "{} ({}): ${:.2}", node.id, node.node_type, node.balance);
    }

    out
}

/// Write the snapshot as pretty JSON, creating parent directories
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let json = snapshot.to_json_pretty()?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write snapshot to {}", path.display()))
}
