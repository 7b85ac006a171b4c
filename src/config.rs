use crate::agent::{Agent, AgentConfig};
use crate::alpha_beta::AlphaBetaConfig;
use crate::board::{MAX_BOARD_SIZE, MIN_BOARD_SIZE, Move, Player};
use crate::error::HexError;
use crate::mcts::MctsConfig;
use serde::{Deserialize, Serialize};

/// Everything needed to set up one game.
///
/// Seat 0 plays Blue and seat 1 plays Red.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub board_size: usize,
    pub players: [AgentConfig; 2],
    /// Turns the transposition table on or off for every alpha-beta player.
    pub use_transposition_table: bool,
    pub starting_player: Player,
    pub seed: u64,
    /// Stone placed for the second player before the first move, to vary openings.
    pub opening: Option<Move>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: 5,
            players: [
                AgentConfig::AlphaBeta(AlphaBetaConfig::default().with_iterative_deepening(true)),
                AgentConfig::Mcts(MctsConfig::default()),
            ],
            use_transposition_table: false,
            starting_player: Player::Blue,
            seed: 0,
            opening: None,
        }
    }
}

impl GameConfig {
    pub fn with_board_size(mut self, board_size: usize) -> Self {
        self.board_size = board_size;
        self
    }

    pub fn with_players(mut self, blue: AgentConfig, red: AgentConfig) -> Self {
        self.players = [blue, red];
        self
    }

    pub fn with_transposition_table(mut self, enabled: bool) -> Self {
        self.use_transposition_table = enabled;
        self
    }

    pub fn with_starting_player(mut self, player: Player) -> Self {
        self.starting_player = player;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_opening(mut self, opening: Move) -> Self {
        self.opening = Some(opening);
        self
    }

    pub fn validate(&self) -> Result<(), HexError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.board_size) {
            return Err(HexError::config(format!(
                "board size must be in {MIN_BOARD_SIZE}..={MAX_BOARD_SIZE}, got {}",
                self.board_size
            )));
        }
        if let Some(opening) = self.opening {
            let size = self.board_size;
            if usize::from(opening.row) >= size || usize::from(opening.col) >= size {
                return Err(HexError::config(format!(
                    "opening {opening} is outside a {size}x{size} board"
                )));
            }
        }
        for player in self.effective_players() {
            player.validate()?;
        }
        Ok(())
    }

    /// Player configurations with the table flag applied to alpha-beta players.
    pub fn effective_players(&self) -> [AgentConfig; 2] {
        self.players.clone().map(|player| match player {
            AgentConfig::AlphaBeta(config) => AgentConfig::AlphaBeta(
                config.with_transposition_table(self.use_transposition_table),
            ),
            other => other,
        })
    }

    /// Builds both engine players. Seat 1 gets the next seed so the two never share a random stream.
    pub fn build_agents(&self) -> Result<[Box<dyn Agent>; 2], HexError> {
        self.validate()?;
        let [blue, red] = self.effective_players();
        Ok([
            blue.build(self.seed)?,
            red.build(self.seed.wrapping_add(1))?,
        ])
    }
}
