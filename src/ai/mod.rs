//! AI 算法模块（穷举极小化极大搜索与终局效用换算）。

pub mod minimax;
pub mod score;

pub use minimax::{minimax, AiAgent, AiConfig, AiDecision, AiStrategy, MoveScore, SearchStats};
pub use score::{translate_score, Utility};
