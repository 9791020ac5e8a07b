use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::rules::{self, RuleError};

/// 棋盘格子编号，按行优先取 1..=9。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Cell(u8);

impl Cell {
    pub const CENTER: Cell = Cell(5);
    pub const COUNT: usize = 9;

    pub fn new(id: u8) -> Result<Self, RuleError> {
        if (1..=Self::COUNT as u8).contains(&id) {
            Ok(Cell(id))
        } else {
            Err(RuleError::CellOutOfRange { cell: id })
        }
    }

    pub fn id(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Cell> {
        (1..=Self::COUNT as u8).map(Cell)
    }

    pub fn is_corner(self) -> bool {
        matches!(self.0, 1 | 3 | 7 | 9)
    }
}

impl TryFrom<u8> for Cell {
    type Error = RuleError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Cell::new(id)
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        cell.0
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 对局双方。先手为 `PlayerOne`（X）。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    PlayerOne,
    PlayerTwo,
}

impl Side {
    pub fn from_player_one(flag: bool) -> Self {
        if flag {
            Side::PlayerOne
        } else {
            Side::PlayerTwo
        }
    }

    pub fn is_player_one(self) -> bool {
        self == Side::PlayerOne
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::PlayerOne => Side::PlayerTwo,
            Side::PlayerTwo => Side::PlayerOne,
        }
    }

    pub fn mark(self) -> char {
        match self {
            Side::PlayerOne => 'X',
            Side::PlayerTwo => 'O',
        }
    }
}

/// 终局判定结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    InProgress,
    PlayerOneWins,
    PlayerTwoWins,
    Draw,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::InProgress
    }

    pub fn winner(self) -> Option<Side> {
        match self {
            Outcome::PlayerOneWins => Some(Side::PlayerOne),
            Outcome::PlayerTwoWins => Some(Side::PlayerTwo),
            Outcome::InProgress | Outcome::Draw => None,
        }
    }

    /// JS 侧沿用的数字编码：0 未结束、1 先手胜、2 后手胜、3 平局。
    pub fn code(self) -> u8 {
        match self {
            Outcome::InProgress => 0,
            Outcome::PlayerOneWins => 1,
            Outcome::PlayerTwoWins => 2,
            Outcome::Draw => 3,
        }
    }
}

/// The board contract the search consumes.
///
/// Implementors only need cell occupancy, mark placement, the active-turn flag and the
/// terminal query; successor construction is provided on top of `Clone`.
pub trait Position: Clone {
    fn cell_free(&self, cell: Cell) -> bool;

    fn place(&mut self, cell: Cell, side: Side);

    fn player_one(&self) -> bool;

    fn set_player_one(&mut self, player_one: bool);

    fn game_over(&self) -> Outcome;

    fn moves_played(&self) -> usize;

    fn active_side(&self) -> Side {
        Side::from_player_one(self.player_one())
    }

    fn is_fresh(&self) -> bool {
        self.moves_played() == 0
    }

    fn free_cells(&self) -> Vec<Cell> {
        Cell::all().filter(|cell| self.cell_free(*cell)).collect()
    }

    /// 复制当前局面，为行动方落子并交换行动方。
    fn successor(&self, cell: Cell) -> Self {
        let side = self.active_side();
        let mut next = self.clone();
        next.place(cell, side);
        next.set_player_one(!side.is_player_one());
        next
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    DuplicateCell { cell: Cell },
    ContestedCell { cell: Cell },
    MarkCountMismatch { x: usize, o: usize },
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::DuplicateCell { cell } => write!(f, "cell {cell} is listed twice"),
            IntegrityError::ContestedCell { cell } => {
                write!(f, "cell {cell} is claimed by both sides")
            }
            IntegrityError::MarkCountMismatch { x, o } => {
                write!(f, "{x} X marks and {o} O marks cannot occur in play")
            }
        }
    }
}

impl std::error::Error for IntegrityError {}

/// 井字棋棋盘：按落子顺序记录双方占据的格子，以及当前是否轮到先手。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    #[serde(rename = "X", default)]
    pub x: Vec<Cell>,
    #[serde(rename = "O", default)]
    pub o: Vec<Cell>,
    #[serde(rename = "playerOne", default = "default_player_one")]
    pub player_one: bool,
}

fn default_player_one() -> bool {
    true
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            x: Vec::new(),
            o: Vec::new(),
            player_one: true,
        }
    }

    /// 由两组格子编号直接构造局面，便于测试和调试。
    pub fn from_marks(x: &[u8], o: &[u8], player_one: bool) -> Result<Self, RuleError> {
        let x = x.iter().map(|id| Cell::new(*id)).collect::<Result<Vec<_>, _>>()?;
        let o = o.iter().map(|id| Cell::new(*id)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { x, o, player_one })
    }

    pub fn occupant(&self, cell: Cell) -> Option<Side> {
        if self.x.contains(&cell) {
            Some(Side::PlayerOne)
        } else if self.o.contains(&cell) {
            Some(Side::PlayerTwo)
        } else {
            None
        }
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let mut seen = HashSet::new();
        for cell in &self.x {
            if !seen.insert(*cell) {
                return Err(IntegrityError::DuplicateCell { cell: *cell });
            }
        }

        let mut seen_o = HashSet::new();
        for cell in &self.o {
            if !seen_o.insert(*cell) {
                return Err(IntegrityError::DuplicateCell { cell: *cell });
            }
            if seen.contains(cell) {
                return Err(IntegrityError::ContestedCell { cell: *cell });
            }
        }

        if self.x.len().abs_diff(self.o.len()) > 1 {
            return Err(IntegrityError::MarkCountMismatch {
                x: self.x.len(),
                o: self.o.len(),
            });
        }

        Ok(())
    }

    pub fn sample() -> Self {
        Self {
            x: vec![Cell(1), Cell(5)],
            o: vec![Cell(3)],
            player_one: true,
        }
    }
}

impl Position for Board {
    fn cell_free(&self, cell: Cell) -> bool {
        self.occupant(cell).is_none()
    }

    fn place(&mut self, cell: Cell, side: Side) {
        match side {
            Side::PlayerOne => self.x.push(cell),
            Side::PlayerTwo => self.o.push(cell),
        }
    }

    fn player_one(&self) -> bool {
        self.player_one
    }

    fn set_player_one(&mut self, player_one: bool) {
        self.player_one = player_one;
    }

    fn game_over(&self) -> Outcome {
        rules::outcome(&self.x, &self.o)
    }

    fn moves_played(&self) -> usize {
        self.x.len() + self.o.len()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, cell) in Cell::all().enumerate() {
            let mark = self.occupant(cell).map(Side::mark).unwrap_or('.');
            write!(f, "{mark}")?;
            if index % 3 == 2 && index + 1 < Cell::COUNT {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_rejects_ids_off_the_board() {
        assert!(Cell::new(0).is_err());
        assert!(Cell::new(10).is_err());
        assert_eq!(Cell::new(5).expect("center exists"), Cell::CENTER);
        assert_eq!(Cell::all().count(), Cell::COUNT);
    }

    #[test]
    fn successor_leaves_original_untouched() {
        let board = Board::sample();
        let before = board.clone();
        let next = board.successor(Cell::new(9).expect("cell 9 exists"));

        assert_eq!(board, before);
        assert_eq!(next.x.len(), 3);
        assert!(!next.player_one);
        assert!(!next.cell_free(Cell::new(9).expect("cell 9 exists")));
    }

    #[test]
    fn successor_places_mark_of_active_side() {
        let board = Board::from_marks(&[5], &[], false).expect("valid board");
        let next = board.successor(Cell::new(1).expect("cell 1 exists"));
        assert_eq!(next.o, vec![Cell::new(1).expect("cell 1 exists")]);
        assert!(next.player_one);
    }

    #[test]
    fn board_json_uses_move_lists() {
        let board: Board =
            serde_json::from_str(r#"{"X":[1,5],"O":[3],"playerOne":true}"#).expect("parse board");
        assert_eq!(board, Board::sample());
        assert!(serde_json::from_str::<Board>(r#"{"X":[12],"O":[]}"#).is_err());
    }

    #[test]
    fn integrity_check_flags_contested_cells() {
        let board = Board::from_marks(&[1, 5], &[5], false).expect("valid ids");
        assert_eq!(
            board.integrity_check(),
            Err(IntegrityError::ContestedCell {
                cell: Cell::CENTER
            })
        );

        let lopsided = Board::from_marks(&[1, 2, 3], &[4], false).expect("valid ids");
        assert_eq!(
            lopsided.integrity_check(),
            Err(IntegrityError::MarkCountMismatch { x: 3, o: 1 })
        );

        assert!(Board::sample().integrity_check().is_ok());
    }

    #[test]
    fn display_renders_three_rows() {
        assert_eq!(Board::sample().to_string(), "X.O\n.X.\n...");
    }
}
