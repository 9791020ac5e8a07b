use serde::{Deserialize, Serialize};
use std::fmt;

use super::state::{Board, Cell, IntegrityError, Outcome, Position, Side};

/// 八条连线（三行、三列、两条对角线），格子按 1..=9 编号。
pub const LINES: [[u8; 3]; 8] = [
    [1, 2, 3],
    [4, 5, 6],
    [7, 8, 9],
    [1, 4, 7],
    [2, 5, 8],
    [3, 6, 9],
    [1, 5, 9],
    [3, 5, 7],
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    GameFinished,
    CellOutOfRange { cell: u8 },
    CellOccupied { cell: Cell },
    IntegrityViolation { error: IntegrityError },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::GameFinished => write!(f, "the game is already over"),
            RuleError::CellOutOfRange { cell } => write!(f, "cell {cell} is outside 1..=9"),
            RuleError::CellOccupied { cell } => write!(f, "cell {cell} is already taken"),
            RuleError::IntegrityViolation { error } => write!(f, "malformed board: {error}"),
        }
    }
}

impl std::error::Error for RuleError {}

impl From<IntegrityError> for RuleError {
    fn from(error: IntegrityError) -> Self {
        RuleError::IntegrityViolation { error }
    }
}

/// 一次真实落子的结果。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResolution {
    pub board: Board,
    pub cell: Cell,
    pub side: Side,
    pub outcome: Outcome,
}

pub fn has_line(marks: &[Cell]) -> bool {
    LINES
        .iter()
        .any(|line| line.iter().all(|id| marks.iter().any(|cell| cell.id() == *id)))
}

/// 判定局面：任一方连成一线即胜，九格占满则平局。
pub fn outcome(x: &[Cell], o: &[Cell]) -> Outcome {
    if has_line(x) {
        Outcome::PlayerOneWins
    } else if has_line(o) {
        Outcome::PlayerTwoWins
    } else if x.len() + o.len() >= Cell::COUNT {
        Outcome::Draw
    } else {
        Outcome::InProgress
    }
}

pub struct RuleEngine;

impl RuleEngine {
    /// Validates and applies a real move for the side to move, flipping the turn.
    pub fn play_move(board: &mut Board, cell: Cell) -> Result<MoveResolution, RuleError> {
        if board.game_over().is_terminal() {
            return Err(RuleError::GameFinished);
        }
        if !board.cell_free(cell) {
            return Err(RuleError::CellOccupied { cell });
        }

        let side = board.active_side();
        *board = board.successor(cell);

        Ok(MoveResolution {
            board: board.clone(),
            cell,
            side,
            outcome: board.game_over(),
        })
    }

    pub fn validate(board: &Board) -> Result<(), RuleError> {
        board.integrity_check()?;
        Ok(())
    }
}
