//! Turn loop that plays two agents against each other.

use crate::agent::Agent;
use crate::board::{Board, Move, Player};
use crate::config::GameConfig;
use crate::error::HexError;
use crate::game_state::GameState;
use tracing::{debug, info};

/// Outcome of one finished game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub winner: Player,
    /// Name of the agent that won.
    pub winner_name: String,
    pub starting_player: Player,
    pub opening: Option<Move>,
    /// Moves in the order they were played, the opening stone excluded.
    pub moves: Vec<Move>,
    pub board: Board,
}

/// Runs games between two agents. Seat 0 plays Blue and seat 1 plays Red.
pub struct Arbiter {
    size: usize,
    starting_player: Player,
    opening: Option<Move>,
    agents: [Box<dyn Agent>; 2],
}

impl Arbiter {
    pub fn new(
        size: usize,
        starting_player: Player,
        agents: [Box<dyn Agent>; 2],
    ) -> Result<Self, HexError> {
        // Fails early on a bad size instead of at the first game.
        Board::new(size)?;
        Ok(Self {
            size,
            starting_player,
            opening: None,
            agents,
        })
    }

    /// Builds the engine players described by `config`.
    pub fn from_config(config: &GameConfig) -> Result<Self, HexError> {
        let agents = config.build_agents()?;
        let mut arbiter = Self::new(config.board_size, config.starting_player, agents)?;
        arbiter.opening = config.opening;
        Ok(arbiter)
    }

    /// Places a stone for the second player on `opening` before every game.
    pub fn with_opening(mut self, opening: Move) -> Self {
        self.opening = Some(opening);
        self
    }

    pub fn agent(&self, player: Player) -> &dyn Agent {
        self.agents[seat(player)].as_ref()
    }

    /// The position every game starts from.
    pub fn initial_state(&self) -> Result<GameState, HexError> {
        let mut board = Board::new(self.size)?;
        if let Some(opening) = self.opening {
            board.place(opening, self.starting_player.opponent())?;
        }
        Ok(GameState::from_board(board, self.starting_player))
    }

    /// Plays one game to the end.
    ///
    /// A move rejected by the board ends the game with that error and leaves the
    /// offending agent's state as it was.
    pub fn play(&mut self) -> Result<GameRecord, HexError> {
        let mut state = self.initial_state()?;
        for agent in &mut self.agents {
            agent.reset();
        }

        info!(
            size = self.size,
            blue = self.agents[0].name(),
            red = self.agents[1].name(),
            starting = %self.starting_player,
            "game started"
        );

        let mut moves = Vec::new();
        while !state.is_terminal() {
            let player = state.to_move();
            let agent = &mut self.agents[seat(player)];
            let mv = agent.choose_move(&state)?;
            state.apply_move(mv)?;
            moves.push(mv);
            debug!(turn = moves.len(), player = %player, agent = agent.name(), mv = %mv, "move played");
        }

        let winner = state.winner().ok_or(HexError::NoLegalMove)?;
        let winner_name = self.agents[seat(winner)].name().to_string();
        info!(
            winner = %winner,
            agent = %winner_name,
            moves = moves.len(),
            "game finished"
        );

        Ok(GameRecord {
            winner,
            winner_name,
            starting_player: self.starting_player,
            opening: self.opening,
            moves,
            board: state.board().clone(),
        })
    }
}

fn seat(player: Player) -> usize {
    match player {
        Player::Blue => 0,
        Player::Red => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentConfig, HumanAgent};
    use crate::alpha_beta::AlphaBetaConfig;
    use crate::mcts::MctsConfig;
    use std::sync::mpsc::channel;

    /// Plays the first empty cell in row-major order.
    struct FirstEmpty;

    impl Agent for FirstEmpty {
        fn name(&self) -> &str {
            "FirstEmpty"
        }

        fn choose_move(&mut self, state: &GameState) -> Result<Move, HexError> {
            state.legal_moves().first().copied().ok_or(HexError::NoLegalMove)
        }
    }

    /// Always answers the same cell.
    struct Stubborn;

    impl Agent for Stubborn {
        fn name(&self) -> &str {
            "Stubborn"
        }

        fn choose_move(&mut self, _state: &GameState) -> Result<Move, HexError> {
            Ok(Move::new(0, 0))
        }
    }

    #[test]
    fn plays_until_someone_connects() {
        // arrange
        let mut arbiter =
            Arbiter::new(3, Player::Blue, [Box::new(FirstEmpty), Box::new(FirstEmpty)]).unwrap();

        // act
        let record = arbiter.play().unwrap();

        // assert
        assert_eq!(record.board.winner(), Some(record.winner));
        assert_eq!(record.board.stone_count(), record.moves.len());
        assert_eq!(record.moves[0], Move::new(0, 0));
        assert_eq!(record.winner_name, "FirstEmpty");
    }

    #[test]
    fn moves_alternate_from_the_starting_player() {
        let mut arbiter =
            Arbiter::new(3, Player::Red, [Box::new(FirstEmpty), Box::new(FirstEmpty)]).unwrap();
        let record = arbiter.play().unwrap();

        for (turn, mv) in record.moves.iter().enumerate() {
            let expected = if turn % 2 == 0 { Player::Red } else { Player::Blue };
            assert_eq!(record.board.owner(*mv), Some(expected), "turn {turn}");
        }
    }

    #[test]
    fn opening_stone_belongs_to_the_second_player() {
        let arbiter = Arbiter::new(3, Player::Blue, [Box::new(FirstEmpty), Box::new(FirstEmpty)])
            .unwrap()
            .with_opening(Move::new(1, 1));
        let state = arbiter.initial_state().unwrap();

        assert_eq!(state.board().owner(Move::new(1, 1)), Some(Player::Red));
        assert_eq!(state.to_move(), Player::Blue);
    }

    #[test]
    fn illegal_agent_move_is_reported() {
        let mut arbiter =
            Arbiter::new(3, Player::Blue, [Box::new(Stubborn), Box::new(Stubborn)]).unwrap();

        let err = arbiter.play().unwrap_err();
        assert!(err.is_invalid_move());
    }

    #[test]
    fn bad_size_is_a_configuration_error() {
        let result = Arbiter::new(1, Player::Blue, [Box::new(FirstEmpty), Box::new(FirstEmpty)]);
        assert!(matches!(result, Err(HexError::Configuration(_))));
    }

    #[test]
    fn human_moves_are_replayed() {
        // Blue walks along the bottom row while Red fills the top row.
        let (tx, rx) = channel();
        for col in 0..3 {
            tx.send(Move::new(2, col)).unwrap();
        }
        let mut arbiter = Arbiter::new(
            3,
            Player::Blue,
            [Box::new(HumanAgent::new("Human", rx)), Box::new(FirstEmpty)],
        )
        .unwrap();

        let record = arbiter.play().unwrap();
        assert_eq!(record.winner, Player::Blue);
        assert_eq!(record.winner_name, "Human");
    }

    #[test]
    fn engines_play_a_full_game_from_config() {
        let config = GameConfig::default()
            .with_board_size(3)
            .with_players(
                AgentConfig::AlphaBeta(AlphaBetaConfig::default().with_max_depth(2)),
                AgentConfig::Mcts(MctsConfig::default().with_iterations(200)),
            )
            .with_transposition_table(true)
            .with_seed(11);
        let mut arbiter = Arbiter::from_config(&config).unwrap();

        let record = arbiter.play().unwrap();
        assert_eq!(record.board.winner(), Some(record.winner));
        assert!(record.moves.len() >= 5);

        // Alpha-beta opens the same way after the reset between games.
        let rematch = arbiter.play().unwrap();
        assert_eq!(rematch.moves[0], record.moves[0]);
    }
}
