//! Ledger entries produced by flow augmentation

use serde::{Deserialize, Serialize};

/// One transfer along one edge of an augmenting path.
///
/// Records are created by the solver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    source_id: String,
    dest_id: String,
    amount: f64,
    unit_cost: f64,
}

impl TransactionRecord {
    pub fn new(
        source_id: impl Into<String>,
        dest_id: impl Into<String>,
        amount: f64,
        unit_cost: f64,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            dest_id: dest_id.into(),
            amount,
            unit_cost,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn dest_id(&self) -> &str {
        &self.dest_id
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_cost
    }

    /// Cost of this transfer, `amount * unit_cost`
    pub fn total_cost(&self) -> f64 {
        self.amount * self.unit_cost
    }
}

impl std::fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "- Transferred ${:.2} from {} to {} (Cost: ${:.2})",
            self.amount,
            self.source_id,
            self.dest_id,
            self.total_cost()
        )
    }
}
