use serde::{Deserialize, Serialize};
use std::ops::Neg;

use crate::game::{Outcome, Side};

/// 从某一固定视角看的终局效用：胜 +10、平 0、负 -10。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Utility {
    Loss,
    Draw,
    Win,
}

impl Utility {
    pub fn value(self) -> i32 {
        match self {
            Utility::Loss => -10,
            Utility::Draw => 0,
            Utility::Win => 10,
        }
    }
}

impl Neg for Utility {
    type Output = Utility;

    fn neg(self) -> Self::Output {
        match self {
            Utility::Loss => Utility::Win,
            Utility::Draw => Utility::Draw,
            Utility::Win => Utility::Loss,
        }
    }
}

/// Reconciles a side-neutral outcome with the agent's side. `None` while the game is running.
pub fn translate_score(outcome: Outcome, agent: Side) -> Option<Utility> {
    match outcome {
        Outcome::InProgress => None,
        Outcome::Draw => Some(Utility::Draw),
        Outcome::PlayerOneWins | Outcome::PlayerTwoWins => {
            if outcome.winner() == Some(agent) {
                Some(Utility::Win)
            } else {
                Some(Utility::Loss)
            }
        }
    }
}
