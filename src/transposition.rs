//! Cache of alpha-beta results keyed by canonical position.

use crate::board::{Board, Move, Player};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

/// How a stored score relates to the true value of the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The score is the value of the position.
    Exact,
    /// The search failed high; the value is at least the score.
    Lower,
    /// The search failed low; the value is at most the score.
    Upper,
}

/// Board transformations that map Hex positions onto equivalent positions.
///
/// The colour-swapping ones also hand the move to the other player. Each one is its own inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    Identity,
    Rotate180,
    SwapTranspose,
    SwapAntiTranspose,
}

impl Symmetry {
    pub const ALL: [Symmetry; 4] = [
        Symmetry::Identity,
        Symmetry::Rotate180,
        Symmetry::SwapTranspose,
        Symmetry::SwapAntiTranspose,
    ];

    pub fn swaps_colors(self) -> bool {
        matches!(self, Symmetry::SwapTranspose | Symmetry::SwapAntiTranspose)
    }

    /// Maps a cell of a board of side `size` through the transformation.
    pub fn map_move(self, mv: Move, size: usize) -> Move {
        let last = size as u8 - 1;
        match self {
            Symmetry::Identity => mv,
            Symmetry::Rotate180 => Move::new(last - mv.row, last - mv.col),
            Symmetry::SwapTranspose => Move::new(mv.col, mv.row),
            Symmetry::SwapAntiTranspose => Move::new(last - mv.col, last - mv.row),
        }
    }

    fn map_player(self, player: Player) -> Player {
        if self.swaps_colors() {
            player.opponent()
        } else {
            player
        }
    }
}

/// Packed cell contents plus side to move. Two bits per cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey {
    cells: Box<[u8]>,
    to_move: Player,
}

impl PositionKey {
    /// The key of `board` with `to_move` to play, seen through `symmetry`.
    pub fn under(board: &Board, to_move: Player, symmetry: Symmetry) -> Self {
        let size = board.size();
        let mut cells = vec![0u8; (size * size).div_ceil(4)];
        for index in 0..size * size {
            let source = symmetry.map_move(board.move_at(index), size);
            let code = match board.owner(source).map(|p| symmetry.map_player(p)) {
                None => 0,
                Some(Player::Blue) => 1,
                Some(Player::Red) => 2,
            };
            cells[index / 4] |= code << ((index % 4) * 2);
        }

        Self {
            cells: cells.into_boxed_slice(),
            to_move: symmetry.map_player(to_move),
        }
    }

    /// The smallest key among all symmetric views, and the symmetry producing it.
    pub fn canonical(board: &Board, to_move: Player) -> (Self, Symmetry) {
        let mut best = (PositionKey::under(board, to_move, Symmetry::Identity), Symmetry::Identity);
        for symmetry in &Symmetry::ALL[1..] {
            let key = PositionKey::under(board, to_move, *symmetry);
            if key < best.0 {
                best = (key, *symmetry);
            }
        }
        best
    }
}

/// One cached search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    pub score: i32,
    pub depth: u32,
    pub best_move: Option<Move>,
    pub bound: Bound,
}

/// Probe, hit and store counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
}

/// Map from canonical position to the deepest search result seen for it.
///
/// Best moves are stored in the canonical frame and mapped back on lookup, so a hit
/// on a rotated or colour-swapped position yields a move for the board looked up.
#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: FxHashMap<PositionKey, TableEntry>,
    max_entries: Option<usize>,
    stats: TableStats,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table that stops admitting new positions once it holds `max_entries`.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> TableStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = TableStats::default();
    }

    /// Looks up the position, translating the stored move back onto `board`.
    pub fn probe(&mut self, board: &Board, to_move: Player) -> Option<TableEntry> {
        self.stats.probes += 1;
        let (key, symmetry) = PositionKey::canonical(board, to_move);
        let entry = self.entries.get(&key)?;
        self.stats.hits += 1;
        Some(TableEntry {
            best_move: entry.best_move.map(|mv| symmetry.map_move(mv, board.size())),
            ..*entry
        })
    }

    /// Records a result. An existing entry is only replaced by one searched at least as deep.
    pub fn store(&mut self, board: &Board, to_move: Player, entry: TableEntry) {
        let (key, symmetry) = PositionKey::canonical(board, to_move);
        let canonical = TableEntry {
            best_move: entry.best_move.map(|mv| symmetry.map_move(mv, board.size())),
            ..entry
        };

        if let Some(existing) = self.entries.get_mut(&key) {
            if canonical.depth >= existing.depth {
                *existing = canonical;
                self.stats.stores += 1;
            }
            return;
        }

        if self.max_entries.is_some_and(|max| self.entries.len() >= max) {
            return;
        }
        self.entries.insert(key, canonical);
        self.stats.stores += 1;
    }
}

/// A table shared between agents, possibly on different threads.
pub type SharedTranspositionTable = Arc<Mutex<TranspositionTable>>;
