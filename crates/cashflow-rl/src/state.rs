//! State, Action, and Reward types for RL

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use cashflow_core::Graph;

/// Reward value from environment
pub type Reward = f64;

/// Immutable snapshot of every node balance.
///
/// Identity is the canonical signature: ids in lexicographic order, each
/// balance rounded to two decimals, `id:balance;` concatenated. Two states
/// built from the same balances compare equal and hash identically no
/// matter how they were constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct State {
    balances: BTreeMap<String, f64>,
    signature: String,
}

impl State {
    pub fn new<K: Into<String>>(balances: impl IntoIterator<Item = (K, f64)>) -> Self {
        let balances: BTreeMap<String, f64> = balances
            .into_iter()
            .map(|(id, balance)| (id.into(), balance))
            .collect();
        let signature = Self::canonical_signature(&balances);
        Self {
            balances,
            signature,
        }
    }

    /// Snapshot the current balances of a graph
    pub fn from_graph(graph: &Graph) -> Self {
        Self::new(
            graph
                .nodes()
                .iter()
                .map(|node| (node.id.clone(), node.balance)),
        )
    }

    fn canonical_signature(balances: &BTreeMap<String, f64>) -> String {
        balances
            .iter()
            .map(|(id, balance)| {
                // -0.0 + 0.0 is +0.0, so balances that round to zero print unsigned
                let cents = (balance * 100.0).round() / 100.0 + 0.0;
                format!("{id}:{cents:.2};")
            })
            .collect()
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn balance(&self, id: &str) -> Option<f64> {
        self.balances.get(id).copied()
    }

    pub fn balances(&self) -> &BTreeMap<String, f64> {
        &self.balances
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.signature.hash(state);
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.signature)
    }
}

impl From<BTreeMap<String, f64>> for State {
    fn from(balances: BTreeMap<String, f64>) -> Self {
        Self::new(balances)
    }
}

impl From<State> for BTreeMap<String, f64> {
    fn from(state: State) -> Self {
        state.balances
    }
}

/// Route funds from one node to another
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub source: String,
    pub sink: String,
}

impl Action {
    pub fn new(source: impl Into<String>, sink: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sink: sink.into(),
        }
    }

    /// `source->sink`
    pub fn signature(&self) -> String {
        format!("{}->{}", self.source, self.sink)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.source, self.sink)
    }
}
