use crate::alpha_beta::{AlphaBetaAgent, AlphaBetaConfig};
use crate::board::Move;
use crate::error::HexError;
use crate::game_state::GameState;
use crate::mcts::{MctsAgent, MctsConfig};
use crate::random::SeededRandomGenerator;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Receiver;

/// Anything that can pick a move for the side to move.
///
/// Each game owns its agents; nothing here is shared between games unless an
/// agent is explicitly built around shared state.
pub trait Agent: Send {
    fn name(&self) -> &str;

    /// Picks a move for `state.to_move()`.
    fn choose_move(&mut self, state: &GameState) -> Result<Move, HexError>;

    /// Drops per-game state before a new game starts.
    fn reset(&mut self) {}
}

/// The kinds of player a game can be configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentConfig {
    Human,
    AlphaBeta(AlphaBetaConfig),
    Mcts(MctsConfig),
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), HexError> {
        match self {
            AgentConfig::Human => Ok(()),
            AgentConfig::AlphaBeta(config) => config.validate(),
            AgentConfig::Mcts(config) => config.validate(),
        }
    }

    /// Builds a search agent. Human players have no engine and are built with [`HumanAgent::new`].
    pub fn build(&self, seed: u64) -> Result<Box<dyn Agent>, HexError> {
        match self {
            AgentConfig::Human => Err(HexError::config(
                "human players need a move source, build them with HumanAgent::new",
            )),
            AgentConfig::AlphaBeta(config) => {
                Ok(Box::new(AlphaBetaAgent::new(config.clone(), seed)?))
            }
            AgentConfig::Mcts(config) => Ok(Box::new(MctsAgent::new(
                config.clone(),
                SeededRandomGenerator::new(seed),
            )?)),
        }
    }
}

/// A player whose moves arrive, already parsed, over a channel.
pub struct HumanAgent {
    name: String,
    moves: Receiver<Move>,
}

impl HumanAgent {
    pub fn new(name: impl Into<String>, moves: Receiver<Move>) -> Self {
        Self {
            name: name.into(),
            moves,
        }
    }
}

impl Agent for HumanAgent {
    fn name(&self) -> &str {
        &self.name
    }

    /// Blocks until the next move arrives. A closed channel means no move will come.
    fn choose_move(&mut self, _state: &GameState) -> Result<Move, HexError> {
        self.moves.recv().map_err(|_| HexError::NoLegalMove)
    }
}
