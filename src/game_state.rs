use crate::board::{Board, Move, Player};
use crate::error::{HexError, MoveRejection};

/// A board together with whose turn it is.
///
/// Advanced by exactly one move per ply; terminal once a player has connected their edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    to_move: Player,
    move_count: usize,
    last_move: Option<Move>,
    winner: Option<Player>,
}

impl GameState {
    /// Empty board of side `size` with `first` to move.
    pub fn new(size: usize, first: Player) -> Result<Self, HexError> {
        Ok(Self::from_board(Board::new(size)?, first))
    }

    /// Wraps an existing position. The move count is the number of stones on the board.
    pub fn from_board(board: Board, to_move: Player) -> Self {
        let winner = board.winner();
        Self {
            move_count: board.stone_count(),
            board,
            to_move,
            last_move: None,
            winner,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn is_terminal(&self) -> bool {
        self.winner.is_some()
    }

    /// Empty cells in row-major order; none once the game is decided.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.board.empty_cells()
    }

    /// Plays `mv` for the side to move. Rejected moves leave the state unchanged.
    pub fn apply_move(&mut self, mv: Move) -> Result<(), HexError> {
        if let Some(winner) = self.winner {
            return Err(HexError::InvalidMove {
                mv,
                reason: MoveRejection::GameOver(winner),
            });
        }

        let mover = self.to_move;
        self.board.place(mv, mover)?;
        if self.board.has_won(mover) {
            self.winner = Some(mover);
        }
        self.to_move = mover.opponent();
        self.move_count += 1;
        self.last_move = Some(mv);
        Ok(())
    }

    /// Returns the state after `mv`, leaving `self` untouched.
    pub fn with_move(&self, mv: Move) -> Result<GameState, HexError> {
        let mut next = self.clone();
        next.apply_move(mv)?;
        Ok(next)
    }
}
