use crate::board::{Move, Player};
use crate::game_state::GameState;

/// Represents a single node in the Monte Carlo search tree.
///
/// The parent link and the children live in the arena tree that holds the node;
/// the node itself only carries the position and its statistics.
#[derive(Debug, Clone)]
pub struct MctsNode {
    /// The depth of the node in the tree.
    pub height: u32,
    /// The game state that this node represents.
    pub state: GameState,
    /// The move that led to this node's state from its parent. `None` for the root node.
    pub prev_move: Option<Move>,
    /// The number of times this node has been visited during the search.
    pub visits: u32,
    /// Rollouts won by the player who moved into this node.
    pub wins: u32,
    /// Legal moves that do not have a child yet.
    pub untried_moves: Vec<Move>,
}

impl MctsNode {
    /// Creates a root node for `state`.
    pub fn new(state: GameState) -> Self {
        let untried_moves = state.legal_moves();
        MctsNode {
            height: 0,
            state,
            prev_move: None,
            visits: 0,
            wins: 0,
            untried_moves,
        }
    }

    /// Creates the node reached by playing `mv` from a node at depth `height - 1`.
    pub fn child(state: GameState, mv: Move, height: u32) -> Self {
        MctsNode {
            height,
            prev_move: Some(mv),
            ..MctsNode::new(state)
        }
    }

    /// The player who made the move into this node, whose wins are counted here.
    pub fn mover(&self) -> Player {
        self.state.to_move().opponent()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.untried_moves.is_empty()
    }

    /// Calculates the win rate of this node.
    pub fn wins_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            (self.wins as f64) / (self.visits as f64)
        }
    }

    /// UCB1 priority of this node as a child of a parent visited `parent_visits` times.
    /// Unvisited nodes always come first.
    pub fn ucb_value(&self, parent_visits: u32, exploration_constant: f64) -> f64 {
        if self.visits == 0 {
            f64::INFINITY
        } else {
            self.wins_rate()
                + exploration_constant
                    * f64::sqrt(f64::ln(parent_visits as f64) / (self.visits as f64))
        }
    }
}
