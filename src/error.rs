use crate::board::{Move, Player};

/// Why a move was refused by the board or the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("cell is already occupied")]
    Occupied,

    #[error("cell is outside the board")]
    OutOfRange,

    #[error("game is already won by {0}")]
    GameOver(Player),
}

/// Errors reported by the board model and the search engines.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HexError {
    /// The board refused `mv`; the position is unchanged.
    #[error("invalid move {mv}: {reason}")]
    InvalidMove { mv: Move, reason: MoveRejection },

    /// A game or agent setting is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The position is already decided or full.
    #[error("no legal move available")]
    NoLegalMove,

    /// Text that is neither letter-row notation like `b3` nor a `(row,col)` pair.
    #[error("cannot parse move {0:?}")]
    MoveParse(String),
}

impl HexError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        HexError::Configuration(msg.into())
    }

    /// Returns `true` for rejected moves, regardless of the reason.
    pub fn is_invalid_move(&self) -> bool {
        matches!(self, HexError::InvalidMove { .. })
    }
}
