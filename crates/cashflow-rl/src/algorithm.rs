//! RL Algorithm trait and implementations

use std::collections::HashMap;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::experience::Experience;
use crate::state::{Action, State};

/// Exploration never decays below this rate
pub const MIN_EXPLORATION_RATE: f64 = 0.01;

/// Trait for RL algorithms
pub trait RLAlgorithm: Send {
    /// Algorithm name
    fn name(&self) -> &str;

    /// Pick one of `actions` for `state`; `None` only when `actions` is empty
    fn select_action<'a>(&mut self, state: &State, actions: &'a [Action]) -> Option<&'a Action>;

    /// Learn from one transition, returning the temporal-difference error
    fn update(&mut self, experience: &Experience) -> f64;

    /// Current value estimate for a state/action pair
    fn q_value(&self, state: &State, action: &Action) -> f64;

    /// Multiply the exploration rate by `factor`, floored at [`MIN_EXPLORATION_RATE`]
    fn decay_exploration(&mut self, factor: f64);

    fn exploration_rate(&self) -> f64;

    /// Whether any value has been learned yet
    fn has_learned(&self) -> bool;

    /// Get algorithm parameters as JSON
    fn get_params(&self) -> serde_json::Value;

    /// Set algorithm parameters from JSON
    fn set_params(&mut self, params: serde_json::Value) -> Result<()>;
}

/// Constructor parameters for [`QLearning`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningParams {
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub exploration_rate: f64,
    /// Fixed seed for reproducible exploration
    pub seed: Option<u64>,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            exploration_rate: 0.3,
            seed: None,
        }
    }
}

impl LearningParams {
    /// Same ranges `set_params` enforces
    pub fn validate(&self) -> Result<()> {
        check_learning_rate(self.learning_rate)?;
        check_unit_range("discount_factor", self.discount_factor)?;
        check_unit_range("exploration_rate", self.exploration_rate)
    }
}

fn check_learning_rate(lr: f64) -> Result<()> {
    if !(lr > 0.0 && lr <= 1.0) {
        bail!("learning_rate must be in (0, 1], got {lr}");
    }
    Ok(())
}

fn check_unit_range(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        bail!("{name} must be in [0, 1], got {value}");
    }
    Ok(())
}

/// Q-Learning implementation (tabular, epsilon-greedy)
pub struct QLearning {
    q_table: HashMap<String, f64>,
    learning_rate: f64,
    discount_factor: f64,
    epsilon: f64,
    rng: StdRng,
}

impl QLearning {
    pub fn new(learning_rate: f64, discount_factor: f64, epsilon: f64) -> Self {
        Self {
            q_table: HashMap::new(),
            learning_rate,
            discount_factor,
            epsilon,
            rng: StdRng::from_entropy(),
        }
    }

    /// Build from validated parameters
    pub fn try_from_params(params: &LearningParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::from_params(params))
    }

    pub fn from_params(params: &LearningParams) -> Self {
        let agent = Self::new(
            params.learning_rate,
            params.discount_factor,
            params.exploration_rate,
        );
        match params.seed {
            Some(seed) => agent.with_seed(seed),
            None => agent,
        }
    }

    /// Make exploration and tie-breaking reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Table key: state signature, `|`, action signature
    pub fn state_action_key(state: &State, action: &Action) -> String {
        format!("{}|{}", state.signature(), action.signature())
    }

    pub fn set_q_value(&mut self, state: &State, action: &Action, value: f64) {
        self.q_table
            .insert(Self::state_action_key(state, action), value);
    }

    /// Set the exploration rate directly, clamped to `[0, 1]`
    pub fn set_exploration_rate(&mut self, rate: f64) {
        self.epsilon = rate.clamp(0.0, 1.0);
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn q_table_len(&self) -> usize {
        self.q_table.len()
    }

    fn max_q(&self, state: &State, actions: &[Action]) -> Option<f64> {
        actions
            .iter()
            .map(|action| self.q_value(state, action))
            .fold(None, |best, value| match best {
                Some(b) if b >= value => Some(b),
                _ => Some(value),
            })
    }
}

impl RLAlgorithm for QLearning {
    fn name(&self) -> &str {
        "q_learning"
    }

    fn select_action<'a>(&mut self, state: &State, actions: &'a [Action]) -> Option<&'a Action> {
        if actions.is_empty() {
            return None;
        }

        if self.rng.gen::<f64>() < self.epsilon {
            let chosen = actions.choose(&mut self.rng);
            if let Some(action) = chosen {
                debug!("[Explore] Chose random action: {}", action);
            }
            return chosen;
        }

        let mut best_value = f64::NEG_INFINITY;
        let mut best_actions: Vec<&Action> = Vec::new();

        for action in actions {
            let value = self.q_value(state, action);
            if value > best_value {
                best_value = value;
                best_actions.clear();
                best_actions.push(action);
            } else if value == best_value {
                best_actions.push(action);
            }
        }

        let chosen = best_actions
            .choose(&mut self.rng)
            .copied()
            .or_else(|| actions.first());
        if let Some(action) = chosen {
            debug!("[Exploit] Chose best action: {} (Q={:.2})", action, best_value);
        }
        chosen
    }

    fn update(&mut self, experience: &Experience) -> f64 {
        let key = Self::state_action_key(&experience.state, &experience.action);
        let current_q = self.q_table.get(&key).copied().unwrap_or(0.0);

        let max_next_q = self
            .max_q(&experience.next_state, &experience.next_actions)
            .unwrap_or(0.0);

        let target = experience.reward + self.discount_factor * max_next_q;
        let td_error = target - current_q;
        let updated_q = current_q + self.learning_rate * td_error;

        debug!(
            "Q-Update: [{}] {:.4} -> {:.4} (reward={:.2}, maxNextQ={:.2})",
            key, current_q, updated_q, experience.reward, max_next_q
        );

        self.q_table.insert(key, updated_q);
        td_error
    }

    fn q_value(&self, state: &State, action: &Action) -> f64 {
        self.q_table
            .get(&Self::state_action_key(state, action))
            .copied()
            .unwrap_or(0.0)
    }

    fn decay_exploration(&mut self, factor: f64) {
        self.epsilon *= factor;
        if self.epsilon < MIN_EXPLORATION_RATE {
            self.epsilon = MIN_EXPLORATION_RATE;
        }
    }

    fn exploration_rate(&self) -> f64 {
        self.epsilon
    }

    fn has_learned(&self) -> bool {
        !self.q_table.is_empty()
    }

    fn get_params(&self) -> serde_json::Value {
        serde_json::json!({
            "learning_rate": self.learning_rate,
            "discount_factor": self.discount_factor,
            "epsilon": self.epsilon,
            "q_table_size": self.q_table.len()
        })
    }

    fn set_params(&mut self, params: serde_json::Value) -> Result<()> {
        if let Some(lr) = params["learning_rate"].as_f64() {
            check_learning_rate(lr)?;
            self.learning_rate = lr;
        }
        if let Some(df) = params["discount_factor"].as_f64() {
            check_unit_range("discount_factor", df)?;
            self.discount_factor = df;
        }
        if let Some(eps) = params["epsilon"].as_f64() {
            check_unit_range("epsilon", eps)?;
            self.epsilon = eps;
        }
        Ok(())
    }
}

impl Default for QLearning {
    fn default() -> Self {
        Self::from_params(&LearningParams::default())
    }
}
