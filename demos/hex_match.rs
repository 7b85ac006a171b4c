extern crate hex_search;

use hex_search::agent::AgentConfig;
use hex_search::alpha_beta::AlphaBetaConfig;
use hex_search::arbiter::Arbiter;
use hex_search::board::{Move, Player};
use hex_search::config::GameConfig;
use hex_search::game_state::GameState;
use hex_search::mcts::{MctsConfig, MonteCarloTreeSearch};
use hex_search::random::SeededRandomGenerator;
use std::thread;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("hex_search=info".parse().expect("static directive")),
        )
        .init();

    // Look at what the tree thinks of Blue's openings on a 3x3 board
    let state = GameState::new(3, Player::Blue).expect("3 is a valid board size");
    let mut mcts = MonteCarloTreeSearch::builder(state, SeededRandomGenerator::new(1)).build();
    mcts.iterate_n_times(5_000).expect("rollouts on a fresh board cannot fail");

    for child in mcts.get_root().children() {
        let node = child.value();
        println!(
            "Move: {} = {:.2?}% over {} visits",
            node.prev_move.map_or("-".to_string(), |mv| mv.to_string()),
            node.wins_rate() * 100.0,
            node.visits
        );
    }
    println!("The best move is: {:?}", mcts.get_most_visited_move());

    // Alpha-beta against MCTS, one game per thread, each game owning its agents
    let games: Vec<GameConfig> = (0..2)
        .map(|seed| {
            GameConfig::default()
                .with_board_size(4)
                .with_players(
                    AgentConfig::AlphaBeta(
                        AlphaBetaConfig::default()
                            .with_max_depth(3)
                            .with_iterative_deepening(true),
                    ),
                    AgentConfig::Mcts(MctsConfig::default().with_iterations(1_000)),
                )
                .with_transposition_table(true)
                .with_starting_player(if seed % 2 == 0 { Player::Blue } else { Player::Red })
                .with_opening(Move::new(0, 0))
                .with_seed(seed)
        })
        .collect();

    thread::scope(|scope| {
        let handles: Vec<_> = games
            .iter()
            .map(|config| {
                scope.spawn(move || {
                    Arbiter::from_config(config).and_then(|mut arbiter| arbiter.play())
                })
            })
            .collect();

        for (game, handle) in handles.into_iter().enumerate() {
            match handle.join().expect("game thread panicked") {
                Ok(record) => {
                    println!(
                        "Game {game}: {} ({}) won after {} moves",
                        record.winner_name,
                        record.winner,
                        record.moves.len()
                    );
                    println!("{}", record.board);
                }
                Err(err) => println!("Game {game} failed: {err}"),
            }
        }
    });
}
