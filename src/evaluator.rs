//! Static evaluation of non-terminal positions.

use crate::board::{Board, Edge, Player};
use crate::random::RandomGenerator;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Scores a position from the point of view of the side to move; larger is better for the mover.
pub trait Evaluator: Send {
    fn evaluate(&mut self, board: &Board, to_move: Player) -> i32;
}

/// Which evaluator an alpha-beta agent uses at its leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvaluationKind {
    /// Shortest-path distance difference, see [`DistanceEvaluator`].
    #[default]
    Dijkstra,
    /// Uniform noise, see [`RandomEvaluator`]. Only useful as a baseline opponent.
    Random,
}

/// Counts how many more stones each player needs to connect their edges.
///
/// Empty cells cost one stone, own stones are free and opponent stones are walls.
/// The near edge acts as a virtual source and the far edge as a virtual sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceEvaluator;

impl DistanceEvaluator {
    /// Minimum number of stones `player` still has to place, `None` if the opponent has cut every path.
    pub fn distance(&self, board: &Board, player: Player) -> Option<u32> {
        let cost = |owner: Option<Player>| match owner {
            None => Some(1),
            Some(p) if p == player => Some(0),
            Some(_) => None,
        };

        let mut dist = vec![u32::MAX; board.size() * board.size()];
        let mut heap = BinaryHeap::new();

        for mv in board.edge(player, Edge::Near) {
            if let Some(c) = cost(board.owner(mv)) {
                let index = board.index(mv);
                dist[index] = c;
                heap.push(Reverse((c, index)));
            }
        }

        while let Some(Reverse((d, index))) = heap.pop() {
            if d > dist[index] {
                continue;
            }
            let mv = board.move_at(index);
            if board.on_edge(player, Edge::Far, mv) {
                return Some(d);
            }
            for next in board.neighbors(mv) {
                let Some(c) = cost(board.owner(next)) else {
                    continue;
                };
                let next_index = board.index(next);
                if d + c < dist[next_index] {
                    dist[next_index] = d + c;
                    heap.push(Reverse((d + c, next_index)));
                }
            }
        }

        None
    }

    /// Distance with blocked players mapped to one more than any real distance.
    fn bounded_distance(&self, board: &Board, player: Player) -> i32 {
        self.distance(board, player)
            .map_or((board.size() * board.size()) as i32 + 1, |d| d as i32)
    }
}

impl Evaluator for DistanceEvaluator {
    fn evaluate(&mut self, board: &Board, to_move: Player) -> i32 {
        self.bounded_distance(board, to_move.opponent()) - self.bounded_distance(board, to_move)
    }
}

/// Returns a uniform score in `0..=2N`, ignoring the position.
pub struct RandomEvaluator<K: RandomGenerator> {
    random: K,
}

impl<K: RandomGenerator> RandomEvaluator<K> {
    pub fn new(random: K) -> Self {
        Self { random }
    }
}

impl<K: RandomGenerator> Evaluator for RandomEvaluator<K> {
    fn evaluate(&mut self, board: &Board, _to_move: Player) -> i32 {
        self.random.next_range(0, board.size() * 2 + 1) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Move;
    use crate::random::SeededRandomGenerator;
    use rand::SeedableRng;
    use rand::seq::SliceRandom;
    use rand_chacha::ChaCha8Rng;

    fn board_with(size: usize, blue: &[(u8, u8)], red: &[(u8, u8)]) -> Board {
        let mut board = Board::new(size).unwrap();
        for &(row, col) in blue {
            board.place(Move::new(row, col), Player::Blue).unwrap();
        }
        for &(row, col) in red {
            board.place(Move::new(row, col), Player::Red).unwrap();
        }
        board
    }

    /// Transposes the board and swaps the stone colours.
    fn mirror_swap(board: &Board) -> Board {
        let mut mirrored = Board::new(board.size()).unwrap();
        for index in 0..board.size() * board.size() {
            let mv = board.move_at(index);
            if let Some(owner) = board.owner(mv) {
                mirrored
                    .place(Move::new(mv.col, mv.row), owner.opponent())
                    .unwrap();
            }
        }
        mirrored
    }

    #[test]
    fn empty_board_distance_is_size() {
        let board = Board::new(5).unwrap();
        let evaluator = DistanceEvaluator;
        assert_eq!(evaluator.distance(&board, Player::Blue), Some(5));
        assert_eq!(evaluator.distance(&board, Player::Red), Some(5));
    }

    #[test]
    fn own_stones_are_free() {
        let evaluator = DistanceEvaluator;

        let board = board_with(3, &[(0, 0)], &[]);
        assert_eq!(evaluator.distance(&board, Player::Blue), Some(2));
        assert_eq!(evaluator.distance(&board, Player::Red), Some(3));

        let board = board_with(3, &[(0, 0), (0, 1)], &[]);
        assert_eq!(evaluator.distance(&board, Player::Blue), Some(1));

        let board = board_with(3, &[(0, 0), (0, 1), (0, 2)], &[]);
        assert_eq!(evaluator.distance(&board, Player::Blue), Some(0));
        assert_eq!(evaluator.distance(&board, Player::Red), None);
    }

    #[test]
    fn opponent_stones_force_detours() {
        // Red wall in column b except the bottom cell.
        let board = board_with(3, &[], &[(0, 1), (1, 1)]);
        let evaluator = DistanceEvaluator;
        assert_eq!(evaluator.distance(&board, Player::Blue), Some(3));
        assert_eq!(evaluator.distance(&board, Player::Red), Some(1));
    }

    #[test]
    fn evaluate_is_from_movers_perspective() {
        let board = board_with(3, &[(0, 0), (0, 1)], &[]);
        let mut evaluator = DistanceEvaluator;
        assert_eq!(evaluator.evaluate(&board, Player::Blue), 3 - 1);
        assert_eq!(evaluator.evaluate(&board, Player::Red), 1 - 3);
    }

    #[test]
    fn blocked_player_scores_below_everything_real() {
        let board = board_with(2, &[(0, 0), (0, 1)], &[]);
        let mut evaluator = DistanceEvaluator;
        assert_eq!(evaluator.evaluate(&board, Player::Red), 0 - 5);
    }

    #[test]
    fn distance_is_symmetric_under_mirror_swap() {
        let evaluator = DistanceEvaluator;
        for seed in 0..25u64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut board = Board::new(5).unwrap();
            let mut cells = board.empty_cells();
            cells.shuffle(&mut rng);

            let mut player = Player::Blue;
            for mv in cells.into_iter().take(seed as usize % 12) {
                board.place(mv, player).unwrap();
                player = player.opponent();
            }
            let mirrored = mirror_swap(&board);

            for player in [Player::Blue, Player::Red] {
                assert_eq!(
                    evaluator.distance(&board, player),
                    evaluator.distance(&mirrored, player.opponent()),
                    "seed {seed}, player {player}"
                );
            }
        }
    }

    #[test]
    fn random_evaluator_stays_in_range() {
        let board = Board::new(4).unwrap();
        let mut evaluator = RandomEvaluator::new(SeededRandomGenerator::new(7));
        for _ in 0..100 {
            let score = evaluator.evaluate(&board, Player::Blue);
            assert!((0..=8).contains(&score));
        }
    }
}
