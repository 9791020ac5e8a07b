//! 棋盘与规则（格子编号、终局判定、落子校验）。

pub mod rules;
pub mod state;

pub use rules::{MoveResolution, RuleEngine, RuleError, LINES};
pub use state::{Board, Cell, IntegrityError, Outcome, Position, Side};
