//! Search engines for the board game Hex.
//!
//! The crate models the Hex board and its win condition, and provides two players:
//! a negamax alpha-beta search guided by a shortest-path evaluator (with optional
//! iterative deepening and a symmetry-aware transposition table) and a Monte Carlo
//! tree search with UCB1 selection and random rollouts. An [`arbiter::Arbiter`]
//! plays two agents against each other.
//!
//! # Example
//!
//! ```rust
//! use hex_search::agent::Agent;
//! use hex_search::alpha_beta::{AlphaBetaAgent, AlphaBetaConfig};
//! use hex_search::board::{Move, Player};
//! use hex_search::game_state::GameState;
//! use hex_search::mcts::{MctsAgent, MctsConfig};
//! use hex_search::random::SeededRandomGenerator;
//!
//! // Blue opens in the corner of a 4x4 board
//! let mut state = GameState::new(4, Player::Blue).unwrap();
//! state.apply_move(Move::new(0, 0)).unwrap();
//!
//! // Red answers with a depth 3 alpha-beta search
//! let mut alpha_beta = AlphaBetaAgent::new(AlphaBetaConfig::default().with_max_depth(3), 0).unwrap();
//! let reply = alpha_beta.choose_move(&state).unwrap();
//! assert!(state.board().is_empty(reply));
//! state.apply_move(reply).unwrap();
//!
//! // Blue continues with a seeded Monte Carlo search
//! let config = MctsConfig::default().with_iterations(500);
//! let mut mcts = MctsAgent::new(config, SeededRandomGenerator::new(42)).unwrap();
//! let next = mcts.choose_move(&state).unwrap();
//!
//! println!("Blue plays {next}");
//! ```

/// The `Agent` capability shared by every kind of player, and its configuration.
pub mod agent;
/// Negamax alpha-beta search with iterative deepening and a transposition table.
pub mod alpha_beta;
/// Turn loop that plays two agents against each other.
pub mod arbiter;
/// Board, moves, players and win detection.
pub mod board;
/// Configuration of a whole game.
pub mod config;
/// Error types shared by the board and the engines.
pub mod error;
/// Static position evaluation.
pub mod evaluator;
/// Board plus side to move, advanced one ply at a time.
pub mod game_state;
/// The core Monte Carlo tree search implementation and the agent built on it.
pub mod mcts;
/// Contains the `MctsNode` struct, which represents a node in the search tree.
pub mod mcts_node;
/// Contains traits and implementations for random number generation.
pub mod random;
/// Position cache keyed by canonical, symmetry-reduced positions.
pub mod transposition;

pub use agent::{Agent, AgentConfig, HumanAgent};
pub use alpha_beta::{AlphaBetaAgent, AlphaBetaConfig};
pub use arbiter::{Arbiter, GameRecord};
pub use board::{Board, Move, Player};
pub use config::GameConfig;
pub use error::HexError;
pub use game_state::GameState;
pub use mcts::{MctsAgent, MctsConfig, MonteCarloTreeSearch};
