//! Experience tuples fed to the learning update

use serde::{Deserialize, Serialize};

use crate::state::{Action, Reward, State};

/// A single transition (s, a, r, s', A(s'))
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub state: State,
    pub action: Action,
    pub reward: Reward,
    pub next_state: State,
    /// Actions available from `next_state`; empty means terminal
    pub next_actions: Vec<Action>,
}

impl Experience {
    /// Create a new experience
    pub fn new(
        state: State,
        action: Action,
        reward: Reward,
        next_state: State,
        next_actions: Vec<Action>,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            next_actions,
        }
    }

    /// Transition with no follow-up actions
    pub fn terminal(state: State, action: Action, reward: Reward, next_state: State) -> Self {
        Self::new(state, action, reward, next_state, Vec::new())
    }

    pub fn is_terminal(&self) -> bool {
        self.next_actions.is_empty()
    }
}
