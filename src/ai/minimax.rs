use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::score::{translate_score, Utility};
use crate::game::{Cell, Position, Side};
use crate::log;
use crate::utils::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiStrategy {
    Minimax,
    Random,
}

impl FromStr for AiStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimax" | "perfect" | "optimal" => Ok(AiStrategy::Minimax),
            "random" | "easy" => Ok(AiStrategy::Random),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub strategy: AiStrategy,
    /// 空盘直接占中，不做搜索。
    #[serde(default = "default_center_opening")]
    pub center_opening: bool,
    /// 同分着法中若有能立即获胜的，只在这些着法里随机。
    #[serde(default)]
    pub prefer_immediate_win: bool,
}

fn default_center_opening() -> bool {
    true
}

impl AiConfig {
    pub fn from_strategy(strategy: AiStrategy) -> Self {
        Self {
            strategy,
            center_opening: true,
            prefer_immediate_win: false,
        }
    }

    pub fn with_strategy(mut self, strategy: AiStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_immediate_wins(mut self, prefer: bool) -> Self {
        self.prefer_immediate_win = prefer;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_strategy(AiStrategy::Minimax)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveScore {
    pub cell: Cell,
    pub utility: Utility,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<Cell>,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utility: Option<Utility>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<MoveScore>,
    pub nodes: u64,
    pub duration_ms: u64,
    pub strategy: AiStrategy,
}

#[derive(Debug, Default)]
pub struct SearchStats {
    pub nodes: u64,
}

/// Exhaustive minimax value of `position` seen from `viewpoint`.
///
/// The side to move at `position` maximizes when it is `viewpoint` and minimizes otherwise.
/// Every child is a fresh successor, so `position` itself is never touched.
pub fn minimax<P: Position>(position: &P, viewpoint: Side, stats: &mut SearchStats) -> Utility {
    stats.nodes += 1;

    if let Some(utility) = translate_score(position.game_over(), viewpoint) {
        return utility;
    }

    let children = position
        .free_cells()
        .into_iter()
        .map(|cell| minimax(&position.successor(cell), viewpoint, stats));

    let value = if position.active_side() == viewpoint {
        children.max()
    } else {
        children.min()
    };

    // 非终局却无空格只可能来自损坏的棋盘，按和棋处理
    value.unwrap_or(Utility::Draw)
}

pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
    side: Side,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
            side: Side::PlayerOne,
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
            side: Side::PlayerOne,
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// 最近一次决策时所执的一方。
    pub fn side(&self) -> Side {
        self.side
    }

    pub fn select_move<P: Position>(&mut self, board: &P) -> Option<Cell> {
        self.decide(board).cell
    }

    /// Value of `position` from the side recorded by the last decision.
    pub fn evaluate<P: Position>(&self, position: &P) -> Utility {
        minimax(position, self.side, &mut SearchStats::default())
    }

    /// Scores every legal move for the side to move on `board`.
    pub fn score_moves<P: Position>(&mut self, board: &P) -> Vec<MoveScore> {
        self.side = board.active_side();
        let mut stats = SearchStats::default();
        score_candidates(board, self.side, &mut stats)
    }

    pub fn decide<P: Position>(&mut self, board: &P) -> AiDecision {
        let start = Instant::now();
        self.side = board.active_side();
        let side = self.side;
        let strategy = self.config.strategy;

        let outcome = board.game_over();
        if outcome.is_terminal() || board.free_cells().is_empty() {
            return AiDecision {
                cell: None,
                side,
                utility: translate_score(outcome, side),
                candidates: Vec::new(),
                nodes: 0,
                duration_ms: start.elapsed_ms(),
                strategy,
            };
        }

        if strategy == AiStrategy::Random {
            return self.random_decision(board, start);
        }

        // 空盘的博弈值是和棋，中心是最优开局
        if self.config.center_opening && board.is_fresh() && board.cell_free(Cell::CENTER) {
            log!("{:?} opens in the center", side);
            return AiDecision {
                cell: Some(Cell::CENTER),
                side,
                utility: Some(Utility::Draw),
                candidates: Vec::new(),
                nodes: 0,
                duration_ms: start.elapsed_ms(),
                strategy,
            };
        }

        let mut stats = SearchStats::default();
        let candidates = score_candidates(board, side, &mut stats);
        let best = candidates.iter().map(|candidate| candidate.utility).max();

        let mut top: Vec<Cell> = candidates
            .iter()
            .filter(|candidate| Some(candidate.utility) == best)
            .map(|candidate| candidate.cell)
            .collect();

        if self.config.prefer_immediate_win && best == Some(Utility::Win) {
            let immediate: Vec<Cell> = top
                .iter()
                .copied()
                .filter(|cell| {
                    translate_score(board.successor(*cell).game_over(), side) == Some(Utility::Win)
                })
                .collect();
            if !immediate.is_empty() {
                top = immediate;
            }
        }

        let cell = top.choose(&mut self.rng).copied();

        log!(
            "{:?} plays {:?} ({:?}) after {} nodes",
            side,
            cell.map(Cell::id),
            best,
            stats.nodes
        );

        AiDecision {
            cell,
            side,
            utility: best,
            candidates,
            nodes: stats.nodes,
            duration_ms: start.elapsed_ms(),
            strategy,
        }
    }

    fn random_decision<P: Position>(&mut self, board: &P, start: Instant) -> AiDecision {
        let cell = board.free_cells().choose(&mut self.rng).copied();

        AiDecision {
            cell,
            side: self.side,
            utility: None,
            candidates: Vec::new(),
            nodes: 0,
            duration_ms: start.elapsed_ms(),
            strategy: AiStrategy::Random,
        }
    }
}

fn score_candidates<P: Position>(board: &P, side: Side, stats: &mut SearchStats) -> Vec<MoveScore> {
    board
        .free_cells()
        .into_iter()
        .map(|cell| MoveScore {
            cell,
            utility: minimax(&board.successor(cell), side, stats),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Outcome};
    use std::collections::HashSet;

    fn cell(id: u8) -> Cell {
        Cell::new(id).expect("cell id should be on the board")
    }

    fn board(x: &[u8], o: &[u8], player_one: bool) -> Board {
        Board::from_marks(x, o, player_one).expect("test board should be valid")
    }

    fn seeded(seed: u64) -> AiAgent {
        AiAgent::with_seed(AiConfig::default(), seed)
    }

    #[test]
    fn empty_board_opens_in_center_without_search() {
        for seed in 0..8 {
            let mut agent = seeded(seed);
            let decision = agent.decide(&Board::new());
            assert_eq!(decision.cell, Some(Cell::CENTER));
            assert_eq!(decision.nodes, 0);
        }
    }

    #[test]
    fn agent_completes_diagonal_when_asked_to_finish() {
        let position = board(&[1, 5], &[3], true);
        let mut agent = seeded(7);
        let scores = agent.score_moves(&position);
        let nine = scores
            .iter()
            .find(|score| score.cell == cell(9))
            .expect("cell 9 is free");
        assert_eq!(nine.utility, Utility::Win);

        for seed in 0..16 {
            let mut agent = seeded(seed);
            let decision = agent.decide(&position);
            assert_eq!(decision.utility, Some(Utility::Win));

            let mut finisher =
                AiAgent::with_seed(AiConfig::default().with_immediate_wins(true), seed);
            assert_eq!(finisher.select_move(&position), Some(cell(9)));
        }
    }

    #[test]
    fn agent_blocks_open_row() {
        let position = board(&[5], &[1, 2], true);
        for seed in 0..16 {
            let mut agent = seeded(seed);
            let decision = agent.decide(&position);
            assert_eq!(decision.cell, Some(cell(3)));
            assert_eq!(decision.utility, Some(Utility::Draw));
            assert!(decision
                .candidates
                .iter()
                .filter(|score| score.cell != cell(3))
                .all(|score| score.utility == Utility::Loss));
        }
    }

    #[test]
    fn full_board_draw_translates_to_zero() {
        let position = board(&[1, 3, 4, 8, 9], &[2, 5, 6, 7], false);
        assert_eq!(position.game_over(), Outcome::Draw);
        for side in [Side::PlayerOne, Side::PlayerTwo] {
            let mut stats = SearchStats::default();
            assert_eq!(minimax(&position, side, &mut stats).value(), 0);
        }
    }

    #[test]
    fn terminal_position_is_not_expanded() {
        let position = board(&[1, 5, 9], &[2, 3], false);
        let mut stats = SearchStats::default();
        assert_eq!(minimax(&position, Side::PlayerTwo, &mut stats), Utility::Loss);
        assert_eq!(stats.nodes, 1);

        let mut agent = seeded(1);
        let decision = agent.decide(&position);
        assert_eq!(decision.cell, None);
        assert_eq!(decision.utility, Some(Utility::Loss));
    }

    #[test]
    fn values_are_zero_sum_between_sides() {
        let root = Board::new();
        for first in root.free_cells() {
            let after_first = root.successor(first);
            for second in after_first.free_cells() {
                let position = after_first.successor(second);
                let one = minimax(&position, Side::PlayerOne, &mut SearchStats::default());
                let two = minimax(&position, Side::PlayerTwo, &mut SearchStats::default());
                assert_eq!(one, -two, "position\n{position}");
            }
        }
    }

    #[test]
    fn evaluation_is_idempotent_and_non_mutating() {
        let position = board(&[1], &[5], true);
        let before = position.clone();
        let mut agent = seeded(3);

        agent.decide(&position);
        let first = agent.evaluate(&position);
        let second = agent.evaluate(&position);

        assert_eq!(first, second);
        assert_eq!(position, before);
    }

    #[test]
    fn agent_side_follows_the_board() {
        let mut agent = seeded(5);
        agent.decide(&board(&[5], &[], false));
        assert_eq!(agent.side(), Side::PlayerTwo);
        agent.decide(&board(&[5], &[1], true));
        assert_eq!(agent.side(), Side::PlayerOne);
    }

    #[test]
    fn tie_break_samples_every_optimal_reply() {
        // X 占中后，O 只有角落能守和
        let position = board(&[5], &[], false);
        let mut seen = HashSet::new();
        for seed in 0..64 {
            let mut agent = seeded(seed);
            let decision = agent.decide(&position);
            let chosen = decision.cell.expect("there are free cells");
            assert!(chosen.is_corner(), "edge reply {chosen} loses");
            assert_eq!(decision.utility, Some(Utility::Draw));
            seen.insert(chosen);
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn random_strategy_only_picks_free_cells() {
        let position = board(&[1, 5], &[3], true);
        let config = AiConfig::default().with_strategy(AiStrategy::Random);
        for seed in 0..32 {
            let mut agent = AiAgent::with_seed(config.clone(), seed);
            let decision = agent.decide(&position);
            let chosen = decision.cell.expect("there are free cells");
            assert!(position.cell_free(chosen));
            assert_eq!(decision.strategy, AiStrategy::Random);
        }
    }

    #[test]
    fn strategy_parses_aliases() {
        assert_eq!("Perfect".parse(), Ok(AiStrategy::Minimax));
        assert_eq!("easy".parse(), Ok(AiStrategy::Random));
        assert!("hard".parse::<AiStrategy>().is_err());
    }

    /// Plays every opponent continuation against the agent and checks it never loses.
    fn assert_never_loses(position: &Board, agent_side: Side, agent: &mut AiAgent) {
        let outcome = position.game_over();
        if outcome.is_terminal() {
            assert_ne!(
                outcome.winner(),
                Some(agent_side.opponent()),
                "agent lost:\n{position}"
            );
            return;
        }

        if position.active_side() == agent_side {
            let choice = agent.select_move(position).expect("non-terminal board has a move");
            assert!(position.cell_free(choice));
            assert_never_loses(&position.successor(choice), agent_side, agent);
        } else {
            for reply in position.free_cells() {
                assert_never_loses(&position.successor(reply), agent_side, agent);
            }
        }
    }

    #[test]
    fn agent_never_loses_as_either_side() {
        let mut agent = seeded(11);
        assert_never_loses(&Board::new(), Side::PlayerOne, &mut agent);
        assert_never_loses(&Board::new(), Side::PlayerTwo, &mut agent);
    }

    #[test]
    fn agent_converts_opponent_mistake_into_win() {
        // O 应对中心时走边，X 必胜
        let position = board(&[5], &[2], true);
        let mut agent = seeded(9);
        let decision = agent.decide(&position);
        assert_eq!(decision.utility, Some(Utility::Win));
    }
}
