pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    minimax, translate_score, AiAgent, AiConfig, AiDecision, AiStrategy, MoveScore, SearchStats,
    Utility,
};
pub use game::{
    Board, Cell, IntegrityError, MoveResolution, Outcome, Position, RuleEngine, RuleError, Side,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn config_for(strategy: Option<&str>) -> AiConfig {
    let strategy = strategy
        .and_then(|value| AiStrategy::from_str(value).ok())
        .unwrap_or(AiStrategy::Minimax);
    AiConfig::from_strategy(strategy)
}

fn board_from_js(board: JsValue) -> Result<Board, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    RuleEngine::validate(&board).map_err(to_js_error)?;
    Ok(board)
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: AiDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<MoveResolution>,
}

#[wasm_bindgen]
pub struct TicTacToeEngine {
    board: Board,
}

#[wasm_bindgen]
impl TicTacToeEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_board_json: Option<String>) -> Result<TicTacToeEngine, JsValue> {
        let board = if let Some(json) = initial_board_json {
            let board: Board = serde_json::from_str(&json).map_err(serde_to_js_error)?;
            RuleEngine::validate(&board).map_err(to_js_error)?;
            board
        } else {
            Board::new()
        };
        Ok(TicTacToeEngine { board })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.board).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let board: Board = serde_json::from_str(json).map_err(serde_to_js_error)?;
        RuleEngine::validate(&board).map_err(to_js_error)?;
        self.board = board;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.board = Board::new();
    }

    /// 返回 0 未结束、1 先手胜、2 后手胜、3 平局。
    pub fn outcome(&self) -> u8 {
        self.board.game_over().code()
    }

    pub fn play_move(&mut self, cell: u8) -> Result<String, JsValue> {
        let cell = Cell::new(cell).map_err(to_js_error)?;
        let resolution = RuleEngine::play_move(&mut self.board, cell).map_err(to_js_error)?;
        serde_json::to_string(&resolution).map_err(serde_to_js_error)
    }

    pub fn apply_ai_move(&mut self, strategy: Option<String>) -> Result<String, JsValue> {
        let mut agent = AiAgent::new(config_for(strategy.as_deref()));
        let decision = agent.decide(&self.board);

        let applied = match decision.cell {
            Some(cell) => {
                Some(RuleEngine::play_move(&mut self.board, cell).map_err(to_js_error)?)
            }
            None => None,
        };

        let response = AiMoveResponse { decision, applied };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    pub fn think_ai(&self, strategy: Option<String>, delay_ms: Option<u32>) -> Promise {
        let board = self.board.clone();
        let config = config_for(strategy.as_deref());
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut agent = AiAgent::new(config);
            let decision = agent.decide(&board);
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

/// 返回空棋盘，先手行棋。
#[wasm_bindgen(js_name = "createBoard")]
pub fn create_board() -> Result<JsValue, JsValue> {
    to_value(&Board::new()).map_err(JsValue::from)
}

/// 为当前行动方选择一步；棋局已结束时返回 `undefined`。
#[wasm_bindgen(js_name = "selectMove")]
pub fn select_move(board: JsValue, strategy: Option<String>) -> Result<Option<u8>, JsValue> {
    let board = board_from_js(board)?;
    let mut agent = AiAgent::new(config_for(strategy.as_deref()));
    Ok(agent.select_move(&board).map(Cell::id))
}

#[wasm_bindgen(js_name = "scoreMoves")]
pub fn score_moves(board: JsValue) -> Result<JsValue, JsValue> {
    let board = board_from_js(board)?;
    let mut agent = AiAgent::new(AiConfig::default());
    to_value(&agent.score_moves(&board)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "gameOver")]
pub fn game_over(board: JsValue) -> Result<u8, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    Ok(board.game_over().code())
}

#[wasm_bindgen(js_name = "validateBoard")]
pub fn validate_board(board: JsValue) -> Result<(), JsValue> {
    board_from_js(board).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_for_falls_back_to_minimax() {
        assert_eq!(config_for(None).strategy, AiStrategy::Minimax);
        assert_eq!(config_for(Some("easy")).strategy, AiStrategy::Random);
        assert_eq!(config_for(Some("nonsense")).strategy, AiStrategy::Minimax);
    }

    #[test]
    fn ai_move_response_serializes_decision_and_move() {
        let mut board = Board::from_marks(&[5], &[1, 2], true).expect("valid board");
        let mut agent = AiAgent::with_seed(AiConfig::default(), 2);
        let decision = agent.decide(&board);
        let cell = decision.cell.expect("board has free cells");
        let applied = RuleEngine::play_move(&mut board, cell).ok();

        let json = serde_json::to_string(&AiMoveResponse { decision, applied })
            .expect("response should serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["decision"]["cell"], 3);
        assert_eq!(value["decision"]["utility"], "draw");
        assert_eq!(value["applied"]["board"]["X"], serde_json::json!([5, 3]));
        assert_eq!(value["applied"]["outcome"], "inProgress");
    }
}
