//! Check a network file without optimizing it

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use cashflow_core::NodeType;
use cashflow_rl::CashFlowOptimizer;

use crate::network::NetworkSpec;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Network description file (.toml or .json)
    pub network: PathBuf,
}

pub async fn run(args: ValidateArgs) -> Result<()> {
    let spec = NetworkSpec::load(&args.network)?;
    let mut optimizer = CashFlowOptimizer::new();
    let report = spec.apply(&mut optimizer)?;

    let graph = optimizer.graph();
    let revenues = graph.nodes_of_type(NodeType::Revenue).len();
    let expenses = graph.nodes_of_type(NodeType::Expense).len();

    println!("Network: {}", args.network.display());
    println!("  nodes:          {}", report.nodes);
    println!("  revenue nodes:  {revenues}");
    println!("  expense nodes:  {expenses}");
    println!("  edges added:    {}", report.edges_added);
    println!("  edges rejected: {}", report.edges_rejected);

    if revenues == 0 || expenses == 0 {
        bail!("Network needs at least one revenue and one expense node");
    }
    Ok(())
}
