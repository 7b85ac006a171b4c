use crate::agent::Agent;
use crate::board::{Move, Player};
use crate::error::HexError;
use crate::game_state::GameState;
use crate::mcts_node::MctsNode;
use crate::random::RandomGenerator;
use ego_tree::{NodeId, NodeRef, Tree};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Number of nodes preallocated for the search tree unless configured otherwise.
pub const DEFAULT_NODE_CAPACITY: usize = 4096;
/// Largest arena preallocation an [`MctsConfig`] may ask for.
pub const MAX_NODE_CAPACITY: usize = 1 << 24;

/// How a simulation plays out the game from a freshly expanded node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RolloutPolicy {
    /// Fills every empty cell in a random order, alternating colours, then reads the winner
    /// off the full board. A full Hex board always has exactly one winner.
    #[default]
    FillBoard,
    /// Plays random moves one at a time and stops at the first winning move.
    Stepwise,
}

/// The main struct for running the Monte Carlo Tree Search algorithm.
///
/// It holds the search tree, the random number generator, and the configuration for the search.
/// Nodes live in an arena tree and are addressed by [`NodeId`].
pub struct MonteCarloTreeSearch<K: RandomGenerator> {
    tree: Tree<MctsNode>,
    root_id: NodeId,
    random: K,
    exploration_constant: f64,
    rollout_policy: RolloutPolicy,
    next_action: MctsAction,
    node_count: usize,
    iterations: u32,
}

/// A builder for creating instances of `MonteCarloTreeSearch`.
///
/// This provides a convenient way to configure the MCTS search with different parameters.
pub struct MonteCarloTreeSearchBuilder<K: RandomGenerator> {
    state: GameState,
    random_generator: K,
    node_capacity: usize,
    exploration_constant: f64,
    rollout_policy: RolloutPolicy,
}

impl<K: RandomGenerator> MonteCarloTreeSearchBuilder<K> {
    /// Creates a new builder searching from `state` with the given random number generator.
    pub fn new(state: GameState, random_generator: K) -> Self {
        Self {
            state,
            random_generator,
            node_capacity: DEFAULT_NODE_CAPACITY,
            exploration_constant: std::f64::consts::SQRT_2,
            rollout_policy: RolloutPolicy::default(),
        }
    }

    /// Sets how many nodes the tree preallocates, capped at [`MAX_NODE_CAPACITY`].
    pub fn with_node_capacity(mut self, capacity: usize) -> Self {
        self.node_capacity = capacity;
        self
    }

    /// Sets the UCB1 exploration constant.
    pub fn with_exploration_constant(mut self, exploration_constant: f64) -> Self {
        self.exploration_constant = exploration_constant;
        self
    }

    pub fn with_rollout_policy(mut self, rollout_policy: RolloutPolicy) -> Self {
        self.rollout_policy = rollout_policy;
        self
    }

    /// Builds the `MonteCarloTreeSearch` instance with the configured parameters.
    pub fn build(self) -> MonteCarloTreeSearch<K> {
        let tree = Tree::with_capacity(
            MctsNode::new(self.state),
            self.node_capacity.clamp(1, MAX_NODE_CAPACITY),
        );
        let root_id = tree.root().id();

        MonteCarloTreeSearch {
            tree,
            root_id,
            random: self.random_generator,
            exploration_constant: self.exploration_constant,
            rollout_policy: self.rollout_policy,
            next_action: MctsAction::Selection {
                last_branch: vec![],
            },
            node_count: 1,
            iterations: 0,
        }
    }
}

impl<K: RandomGenerator> MonteCarloTreeSearch<K> {
    /// Returns a new builder for `MonteCarloTreeSearch`.
    pub fn builder(state: GameState, random_generator: K) -> MonteCarloTreeSearchBuilder<K> {
        MonteCarloTreeSearchBuilder::new(state, random_generator)
    }

    /// Returns an immutable reference to the underlying search tree.
    pub fn get_tree(&self) -> &Tree<MctsNode> {
        &self.tree
    }

    /// Returns the next MCTS action to be performed. Useful for debugging and visualization.
    pub fn get_next_mcts_action(&self) -> &MctsAction {
        &self.next_action
    }

    /// Returns a reference to the root node of the search tree.
    pub fn get_root(&self) -> NodeRef<'_, MctsNode> {
        self.node(self.root_id)
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Completed iterations, counted at the end of each backpropagation.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Executes a single step of the MCTS algorithm (Selection, Expansion, Simulation, or Backpropagation).
    pub fn execute_action(&mut self) -> Result<(), HexError> {
        trace!(action = self.next_action.get_name(), "mcts step");
        self.next_action = match self.next_action.clone() {
            MctsAction::Selection { .. } => MctsAction::Expansion {
                leaf: self.select_next_node(),
            },
            MctsAction::Expansion { leaf } => MctsAction::Simulation {
                node: self.expand_node(leaf)?,
            },
            MctsAction::Simulation { node } => MctsAction::Backpropagation {
                node,
                winner: self.simulate(node)?,
            },
            MctsAction::Backpropagation { node, winner } => MctsAction::Selection {
                last_branch: self.backpropagate(node, winner),
            },
        };
        Ok(())
    }

    /// Performs one full iteration of the MCTS algorithm (Selection, Expansion, Simulation, Backpropagation).
    /// Returns the path of nodes that were updated during backpropagation.
    pub fn do_iteration(&mut self) -> Result<Vec<NodeId>, HexError> {
        self.execute_action()?;
        while !matches!(self.next_action, MctsAction::Selection { .. }) {
            self.execute_action()?;
        }

        match &self.next_action {
            MctsAction::Selection { last_branch } => Ok(last_branch.clone()),
            _ => Ok(vec![]),
        }
    }

    /// Runs the MCTS search for a specified number of iterations.
    pub fn iterate_n_times(&mut self, n: u32) -> Result<(), HexError> {
        for _ in 0..n {
            self.do_iteration()?;
        }
        Ok(())
    }

    /// The root move whose child was visited most. Ties go to the child expanded first.
    pub fn get_most_visited_move(&self) -> Option<Move> {
        let mut best: Option<(Move, u32)> = None;
        for child in self.get_root().children() {
            let data = child.value();
            let Some(mv) = data.prev_move else {
                continue;
            };
            if best.is_none_or(|(_, visits)| data.visits > visits) {
                best = Some((mv, data.visits));
            }
        }
        best.map(|(mv, _)| mv)
    }

    fn node(&self, id: NodeId) -> NodeRef<'_, MctsNode> {
        self.tree
            .get(id)
            .expect("node ids are only handed out by this tree")
    }

    /// Descends from the root through fully expanded nodes, always taking the child with the
    /// highest UCB1 value, and stops at the first node that is terminal or still has untried moves.
    fn select_next_node(&self) -> NodeId {
        let mut current = self.get_root();
        loop {
            let data = current.value();
            if data.is_terminal() || !data.is_fully_expanded() {
                return current.id();
            }

            let mut best: Option<(NodeRef<'_, MctsNode>, f64)> = None;
            for child in current.children() {
                let ucb = child
                    .value()
                    .ucb_value(data.visits, self.exploration_constant);
                if best.is_none_or(|(_, best_ucb)| ucb > best_ucb) {
                    best = Some((child, ucb));
                }
            }

            match best {
                Some((child, _)) => current = child,
                None => return current.id(),
            }
        }
    }

    /// Adds one child for a random untried move of `leaf`. Terminal leaves are returned unchanged.
    fn expand_node(&mut self, leaf: NodeId) -> Result<NodeId, HexError> {
        let untried = {
            let data = self.node(leaf).value();
            if data.is_terminal() {
                0
            } else {
                data.untried_moves.len()
            }
        };
        if untried == 0 {
            return Ok(leaf);
        }

        let index = self.random.next_range(0, untried);
        let mut leaf_node = self
            .tree
            .get_mut(leaf)
            .expect("node ids are only handed out by this tree");
        let data = leaf_node.value();
        let mv = data.untried_moves.swap_remove(index);
        let height = data.height + 1;
        let child_state = data.state.with_move(mv)?;

        let child_id = leaf_node
            .append(MctsNode::child(child_state, mv, height))
            .id();
        self.node_count += 1;
        Ok(child_id)
    }

    /// Plays the game out at random from `node` and returns the winner.
    fn simulate(&mut self, node: NodeId) -> Result<Player, HexError> {
        let state = self.node(node).value().state.clone();
        if let Some(winner) = state.winner() {
            return Ok(winner);
        }

        match self.rollout_policy {
            RolloutPolicy::FillBoard => {
                let mut board = state.board().clone();
                let mut cells = board.empty_cells();
                self.random.shuffle(&mut cells);

                let mut player = state.to_move();
                for mv in cells {
                    board.place(mv, player)?;
                    player = player.opponent();
                }

                Ok(if board.has_won(Player::Blue) {
                    Player::Blue
                } else {
                    Player::Red
                })
            }
            RolloutPolicy::Stepwise => {
                let mut state = state;
                let mut moves = state.legal_moves();
                self.random.shuffle(&mut moves);

                for mv in moves {
                    state.apply_move(mv)?;
                    if let Some(winner) = state.winner() {
                        return Ok(winner);
                    }
                }
                Err(HexError::NoLegalMove)
            }
        }
    }

    /// Adds the rollout to every node from `node` up to the root.
    ///
    /// A node counts a win when the rollout was won by the player who moved into it, which is
    /// the player choosing among the children of its parent.
    fn backpropagate(&mut self, node: NodeId, winner: Player) -> Vec<NodeId> {
        let mut branch = vec![node];
        let mut current = self.node(node);
        while let Some(parent) = current.parent() {
            branch.push(parent.id());
            current = parent;
        }

        for id in &branch {
            let mut tree_node = self
                .tree
                .get_mut(*id)
                .expect("node ids are only handed out by this tree");
            let data = tree_node.value();
            data.visits += 1;
            if data.mover() == winner {
                data.wins += 1;
            }
        }

        self.iterations += 1;
        branch
    }
}

/// Represents the four main stages of the MCTS algorithm.
///
/// This enum is used to manage the state of the search process.
#[derive(Debug, PartialEq, Clone)]
pub enum MctsAction {
    /// **Selection**: Start from the root and select successive child nodes until a leaf is reached.
    Selection {
        /// The path of nodes updated by the last backpropagation, leaf first.
        last_branch: Vec<NodeId>,
    },
    /// **Expansion**: Create one child node from the selected `leaf`.
    Expansion { leaf: NodeId },
    /// **Simulation**: Run a random playout from the newly created `node`.
    Simulation { node: NodeId },
    /// **Backpropagation**: Update the statistics of the nodes on the path from `node` to the root.
    Backpropagation { node: NodeId, winner: Player },
}

impl MctsAction {
    /// Returns the name of the current MCTS action.
    pub fn get_name(&self) -> &'static str {
        match self {
            MctsAction::Selection { .. } => "Selection",
            MctsAction::Expansion { .. } => "Expansion",
            MctsAction::Simulation { .. } => "Simulation",
            MctsAction::Backpropagation { .. } => "Backpropagation",
        }
    }
}

/// Configuration for [`MctsAgent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Iterations per move.
    pub iterations: u32,
    /// The `c` in UCB1. Larger values explore more.
    pub exploration_constant: f64,
    pub rollout_policy: RolloutPolicy,
    /// Stops early once this many milliseconds have passed, checked between iterations.
    pub time_budget_ms: Option<u64>,
    /// Nodes preallocated in the arena, at most [`MAX_NODE_CAPACITY`].
    pub node_capacity: usize,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            exploration_constant: std::f64::consts::SQRT_2,
            rollout_policy: RolloutPolicy::FillBoard,
            time_budget_ms: None,
            node_capacity: DEFAULT_NODE_CAPACITY,
        }
    }
}

impl MctsConfig {
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_exploration_constant(mut self, exploration_constant: f64) -> Self {
        self.exploration_constant = exploration_constant;
        self
    }

    pub fn with_rollout_policy(mut self, rollout_policy: RolloutPolicy) -> Self {
        self.rollout_policy = rollout_policy;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = Some(budget.as_millis() as u64);
        self
    }

    pub fn with_node_capacity(mut self, node_capacity: usize) -> Self {
        self.node_capacity = node_capacity;
        self
    }

    pub fn validate(&self) -> Result<(), HexError> {
        if self.iterations == 0 {
            return Err(HexError::config("mcts iterations must be at least 1"));
        }
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(HexError::config(format!(
                "exploration constant must be a finite non-negative number, got {}",
                self.exploration_constant
            )));
        }
        if self.time_budget_ms == Some(0) {
            return Err(HexError::config("mcts time budget must be positive"));
        }
        if self.node_capacity > MAX_NODE_CAPACITY {
            return Err(HexError::config(format!(
                "node capacity must be at most {MAX_NODE_CAPACITY}, got {}",
                self.node_capacity
            )));
        }
        Ok(())
    }
}

/// Where an [`MctsAgent`] is in its move cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MctsPhase {
    /// No search running and no move picked since the last reset or failure.
    Idle,
    Searching,
    /// The last `choose_move` returned a move.
    MoveSelected,
}

/// Summary of the last search an [`MctsAgent`] ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MctsStats {
    pub iterations: u32,
    /// Nodes in the tree when the search stopped, root included.
    pub nodes: usize,
    /// Visits of the chosen child.
    pub best_visits: u32,
    pub elapsed_ms: u64,
}

/// Monte Carlo tree search player. Builds a fresh tree for every move.
pub struct MctsAgent<K: RandomGenerator> {
    config: MctsConfig,
    random: K,
    phase: MctsPhase,
    stats: MctsStats,
}

impl<K: RandomGenerator> MctsAgent<K> {
    pub fn new(config: MctsConfig, random: K) -> Result<Self, HexError> {
        config.validate()?;
        Ok(Self {
            config,
            random,
            phase: MctsPhase::Idle,
            stats: MctsStats::default(),
        })
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn phase(&self) -> MctsPhase {
        self.phase
    }

    pub fn last_stats(&self) -> MctsStats {
        self.stats
    }
}

impl<K: RandomGenerator> Agent for MctsAgent<K> {
    fn name(&self) -> &str {
        "Mcts"
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Move, HexError> {
        self.phase = MctsPhase::Idle;
        if state.legal_moves().is_empty() {
            return Err(HexError::NoLegalMove);
        }

        self.phase = MctsPhase::Searching;
        let started = Instant::now();
        let budget = self.config.time_budget_ms.map(Duration::from_millis);

        let mut search = MonteCarloTreeSearch::builder(state.clone(), &mut self.random)
            .with_node_capacity(self.config.node_capacity)
            .with_exploration_constant(self.config.exploration_constant)
            .with_rollout_policy(self.config.rollout_policy)
            .build();

        while search.iterations() < self.config.iterations {
            if search.iterations() > 0 && budget.is_some_and(|b| started.elapsed() >= b) {
                break;
            }
            if let Err(err) = search.do_iteration() {
                self.phase = MctsPhase::Idle;
                return Err(err);
            }
        }

        let Some(best_move) = search.get_most_visited_move() else {
            self.phase = MctsPhase::Idle;
            return Err(HexError::NoLegalMove);
        };
        let best_visits = search
            .get_root()
            .children()
            .find(|child| child.value().prev_move == Some(best_move))
            .map_or(0, |child| child.value().visits);

        self.stats = MctsStats {
            iterations: search.iterations(),
            nodes: search.node_count(),
            best_visits,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        self.phase = MctsPhase::MoveSelected;

        debug!(
            player = %state.to_move(),
            best_move = %best_move,
            iterations = self.stats.iterations,
            nodes = self.stats.nodes,
            best_visits,
            elapsed_ms = self.stats.elapsed_ms,
            "mcts search finished"
        );
        Ok(best_move)
    }

    fn reset(&mut self) {
        self.phase = MctsPhase::Idle;
        self.stats = MctsStats::default();
    }
}
