//! Depth-limited negamax search with alpha-beta pruning.
//!
//! Optional iterative deepening reorders the root so the previous best move is tried
//! first; an optional transposition table caches results by canonical position.

use crate::agent::Agent;
use crate::board::{Board, Move, Player};
use crate::error::HexError;
use crate::evaluator::{DistanceEvaluator, EvaluationKind, Evaluator, RandomEvaluator};
use crate::game_state::GameState;
use crate::random::SeededRandomGenerator;
use crate::transposition::{Bound, SharedTranspositionTable, TableEntry, TranspositionTable};
use serde::{Deserialize, Serialize};
use std::sync::PoisonError;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Score of a won position, before the ply adjustment.
pub const WIN_SCORE: i32 = 100_000;
/// Scores at least this large in magnitude are forced wins or losses.
pub const DECISIVE_SCORE: i32 = WIN_SCORE - 1_000;
const INFINITY: i32 = WIN_SCORE + 1;

/// Configuration for [`AlphaBetaAgent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaBetaConfig {
    /// Search depth in plies; the last depth tried under iterative deepening.
    pub max_depth: u32,
    /// Searches depth 1, 2, ... up to `max_depth`, trying the previous best move first.
    pub use_iterative_deepening: bool,
    /// Caches scores, bounds and best moves by canonical position.
    pub use_transposition_table: bool,
    /// Iterative deepening does not start another depth after this many milliseconds.
    pub time_budget_ms: Option<u64>,
    pub evaluation: EvaluationKind,
    /// Cap on transposition table positions, unbounded when `None`.
    pub table_max_entries: Option<usize>,
}

impl Default for AlphaBetaConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            use_iterative_deepening: false,
            use_transposition_table: false,
            time_budget_ms: None,
            evaluation: EvaluationKind::Dijkstra,
            table_max_entries: None,
        }
    }
}

impl AlphaBetaConfig {
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_iterative_deepening(mut self, enabled: bool) -> Self {
        self.use_iterative_deepening = enabled;
        self
    }

    pub fn with_transposition_table(mut self, enabled: bool) -> Self {
        self.use_transposition_table = enabled;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = Some(budget.as_millis() as u64);
        self
    }

    pub fn with_evaluation(mut self, evaluation: EvaluationKind) -> Self {
        self.evaluation = evaluation;
        self
    }

    pub fn validate(&self) -> Result<(), HexError> {
        if self.max_depth == 0 {
            return Err(HexError::config("alpha-beta max_depth must be > 0"));
        }
        if self.time_budget_ms == Some(0) {
            return Err(HexError::config("alpha-beta time_budget_ms must be > 0"));
        }
        if self.table_max_entries == Some(0) {
            return Err(HexError::config("alpha-beta table_max_entries must be > 0"));
        }
        Ok(())
    }
}

/// Counters collected during one search call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub cutoffs: u64,
    pub evaluations: u64,
    /// Table hits deep enough to be used as a score or bound.
    pub table_hits_full: u64,
    /// Table hits only good for move ordering.
    pub table_hits_partial: u64,
    pub depth_reached: u32,
}

/// Result of [`AlphaBetaAgent::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub best_move: Move,
    /// Minimax score from the point of view of the side to move.
    pub score: i32,
    pub stats: SearchStats,
}

enum TableHandle {
    Disabled,
    Owned(TranspositionTable),
    Shared(SharedTranspositionTable),
}

impl TableHandle {
    fn probe(&mut self, board: &Board, to_move: Player) -> Option<TableEntry> {
        match self {
            TableHandle::Disabled => None,
            TableHandle::Owned(table) => table.probe(board, to_move),
            TableHandle::Shared(table) => table
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .probe(board, to_move),
        }
    }

    fn store(&mut self, board: &Board, to_move: Player, entry: TableEntry) {
        match self {
            TableHandle::Disabled => {}
            TableHandle::Owned(table) => table.store(board, to_move, entry),
            TableHandle::Shared(table) => table
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .store(board, to_move, entry),
        }
    }
}

/// Negamax alpha-beta player.
pub struct AlphaBetaAgent {
    config: AlphaBetaConfig,
    evaluator: Box<dyn Evaluator>,
    table: TableHandle,
    stats: SearchStats,
}

impl AlphaBetaAgent {
    /// Builds an agent; `seed` drives the random evaluator when it is selected.
    pub fn new(config: AlphaBetaConfig, seed: u64) -> Result<Self, HexError> {
        let evaluator: Box<dyn Evaluator> = match config.evaluation {
            EvaluationKind::Dijkstra => Box::new(DistanceEvaluator),
            EvaluationKind::Random => {
                Box::new(RandomEvaluator::new(SeededRandomGenerator::new(seed)))
            }
        };
        Self::with_evaluator(config, evaluator)
    }

    /// Builds an agent around a custom evaluator.
    pub fn with_evaluator(
        config: AlphaBetaConfig,
        evaluator: Box<dyn Evaluator>,
    ) -> Result<Self, HexError> {
        config.validate()?;
        let table = match (config.use_transposition_table, config.table_max_entries) {
            (false, _) => TableHandle::Disabled,
            (true, None) => TableHandle::Owned(TranspositionTable::new()),
            (true, Some(max)) => TableHandle::Owned(TranspositionTable::with_max_entries(max)),
        };

        Ok(Self {
            config,
            evaluator,
            table,
            stats: SearchStats::default(),
        })
    }

    /// Builds an agent that reads and writes `table` instead of owning one.
    ///
    /// The table survives [`Agent::reset`]; clearing it is up to whoever shares it.
    pub fn with_shared_table(
        config: AlphaBetaConfig,
        seed: u64,
        table: SharedTranspositionTable,
    ) -> Result<Self, HexError> {
        let config = config.with_transposition_table(true);
        let mut agent = Self::new(config, seed)?;
        agent.table = TableHandle::Shared(table);
        Ok(agent)
    }

    pub fn config(&self) -> &AlphaBetaConfig {
        &self.config
    }

    /// Number of positions in the agent's own table, if it owns one.
    pub fn table_len(&self) -> Option<usize> {
        match &self.table {
            TableHandle::Owned(table) => Some(table.len()),
            _ => None,
        }
    }

    /// Searches `state` and returns the best move with its score.
    ///
    /// Ties go to the first move in root order, so repeated calls agree.
    pub fn search(&mut self, state: &GameState) -> Result<SearchOutcome, HexError> {
        let root_moves = ordered_moves(state.board(), None, state.legal_moves());
        if root_moves.is_empty() {
            return Err(HexError::NoLegalMove);
        }

        self.stats = SearchStats::default();
        let started = Instant::now();

        let (best_move, score) = if self.config.use_iterative_deepening {
            let budget = self.config.time_budget_ms.map(Duration::from_millis);
            let mut order = root_moves.clone();
            let mut best = None;

            for depth in 1..=self.config.max_depth {
                let (mv, score) = self.search_root(state, &order, depth)?;
                best = Some((mv, score));
                self.stats.depth_reached = depth;
                trace!(depth, best_move = %mv, score, "iterative deepening step");

                if score.abs() >= DECISIVE_SCORE {
                    break;
                }
                if budget.is_some_and(|b| started.elapsed() >= b) {
                    break;
                }
                order = ordered_moves(state.board(), Some(mv), root_moves.clone());
            }

            best.ok_or(HexError::NoLegalMove)?
        } else {
            self.stats.depth_reached = self.config.max_depth;
            self.search_root(state, &root_moves, self.config.max_depth)?
        };

        debug!(
            player = %state.to_move(),
            best_move = %best_move,
            score,
            depth = self.stats.depth_reached,
            nodes = self.stats.nodes,
            cutoffs = self.stats.cutoffs,
            table_hits_full = self.stats.table_hits_full,
            table_hits_partial = self.stats.table_hits_partial,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "alpha-beta search finished"
        );

        Ok(SearchOutcome {
            best_move,
            score,
            stats: self.stats,
        })
    }

    /// Full-window search over `moves` in the given order; never cut off by the table.
    fn search_root(
        &mut self,
        state: &GameState,
        moves: &[Move],
        depth: u32,
    ) -> Result<(Move, i32), HexError> {
        self.stats.nodes += 1;
        let mut alpha = -INFINITY;
        let mut best: Option<(Move, i32)> = None;

        for &mv in moves {
            let child = state.with_move(mv)?;
            let score = -self.negamax(&child, depth - 1, 1, -INFINITY, -alpha)?;
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((mv, score));
            }
            alpha = alpha.max(score);
        }

        let (best_move, score) = best.ok_or(HexError::NoLegalMove)?;
        self.table.store(
            state.board(),
            state.to_move(),
            TableEntry {
                score: score_to_table(score, 0),
                depth,
                best_move: Some(best_move),
                bound: Bound::Exact,
            },
        );
        Ok((best_move, score))
    }

    fn negamax(
        &mut self,
        state: &GameState,
        depth: u32,
        ply: u32,
        mut alpha: i32,
        mut beta: i32,
    ) -> Result<i32, HexError> {
        self.stats.nodes += 1;

        // Only the player who just moved can have completed a chain.
        if state.is_terminal() {
            return Ok(-(WIN_SCORE - ply as i32));
        }

        let board = state.board();
        let to_move = state.to_move();
        if depth == 0 {
            self.stats.evaluations += 1;
            return Ok(self.evaluator.evaluate(board, to_move));
        }

        let mut table_move = None;
        if let Some(entry) = self.table.probe(board, to_move) {
            table_move = entry.best_move;
            if entry.depth >= depth {
                self.stats.table_hits_full += 1;
                let score = score_from_table(entry.score, ply);
                match entry.bound {
                    Bound::Exact => return Ok(score),
                    Bound::Lower => alpha = alpha.max(score),
                    Bound::Upper => beta = beta.min(score),
                }
                if alpha >= beta {
                    return Ok(score);
                }
            } else {
                self.stats.table_hits_partial += 1;
            }
        }

        // Bounds are classified against the window actually searched.
        let window_alpha = alpha;
        let mut best_score = -INFINITY;
        let mut best_move = None;

        for mv in ordered_moves(board, table_move, state.legal_moves()) {
            let child = state.with_move(mv)?;
            let score = -self.negamax(&child, depth - 1, ply + 1, -beta, -alpha)?;
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }

        if best_move.is_none() {
            self.stats.evaluations += 1;
            return Ok(self.evaluator.evaluate(board, to_move));
        }

        let bound = if best_score <= window_alpha {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.table.store(
            board,
            to_move,
            TableEntry {
                score: score_to_table(best_score, ply),
                depth,
                best_move,
                bound,
            },
        );

        Ok(best_score)
    }
}

impl Agent for AlphaBetaAgent {
    fn name(&self) -> &str {
        "AlphaBeta"
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Move, HexError> {
        Ok(self.search(state)?.best_move)
    }

    fn reset(&mut self) {
        if let TableHandle::Owned(table) = &mut self.table {
            table.clear();
        }
    }
}

/// Decisive scores are stored relative to the node so they stay valid from any root.
fn score_to_table(score: i32, ply: u32) -> i32 {
    if score >= DECISIVE_SCORE {
        score + ply as i32
    } else if score <= -DECISIVE_SCORE {
        score - ply as i32
    } else {
        score
    }
}

fn score_from_table(score: i32, ply: u32) -> i32 {
    if score >= DECISIVE_SCORE {
        score - ply as i32
    } else if score <= -DECISIVE_SCORE {
        score + ply as i32
    } else {
        score
    }
}

/// Sorts `moves` centre-first (stable over their incoming order), with `first` moved to the front.
fn ordered_moves(board: &Board, first: Option<Move>, mut moves: Vec<Move>) -> Vec<Move> {
    let span = board.size() as i32 - 1;
    moves.sort_by_key(|mv| {
        // Doubled axial offsets from the centre keep even sizes integral.
        let q = 2 * mv.col as i32 - span;
        let r = 2 * mv.row as i32 - span;
        q.abs() + r.abs() + (q + r).abs()
    });

    if let Some(pos) = first.and_then(|f| moves.iter().position(|&mv| mv == f)) {
        let mv = moves.remove(pos);
        moves.insert(0, mv);
    }
    moves
}
