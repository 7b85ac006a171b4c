use crate::error::{HexError, MoveRejection};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Smallest board the engines accept.
pub const MIN_BOARD_SIZE: usize = 2;
/// Largest board the engines accept; one column letter per column.
pub const MAX_BOARD_SIZE: usize = 26;

/// Offsets of the six hexagonal neighbors of a cell, as `(row, col)` deltas.
const NEIGHBOR_OFFSETS: [(i32, i32); 6] = [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, 1), (1, -1)];

/// The two sides of a game of Hex.
///
/// `Blue` (player A) connects the left edge to the right edge, `Red` (player B)
/// connects the top edge to the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    Blue,
    Red,
}

impl Player {
    /// Returns the other player.
    pub fn opponent(self) -> Player {
        match self {
            Player::Blue => Player::Red,
            Player::Red => Player::Blue,
        }
    }

    /// Colour name as shown in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Player::Blue => "Blue",
            Player::Red => "Red",
        }
    }

    fn symbol(self) -> char {
        match self {
            Player::Blue => 'B',
            Player::Red => 'R',
        }
    }
}

impl Display for Player {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the two edges a player has to connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Left edge for `Blue`, top edge for `Red`.
    Near,
    /// Right edge for `Blue`, bottom edge for `Red`.
    Far,
}

/// A board coordinate. Textual form is a column letter followed by the row number, e.g. `b3`.
/// Columns past `z` have no letter and are written as `(row,col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub row: u8,
    pub col: u8,
}

impl Move {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if usize::from(self.col) < MAX_BOARD_SIZE {
            write!(f, "{}{}", char::from(b'a' + self.col), self.row)
        } else {
            write!(f, "({},{})", self.row, self.col)
        }
    }
}

impl FromStr for Move {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parse_error = || HexError::MoveParse(s.to_string());

        if let Some(pair) = trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
            let (row, col) = pair.split_once(',').ok_or_else(parse_error)?;
            let row = row.trim().parse::<u8>().map_err(|_| parse_error())?;
            let col = col.trim().parse::<u8>().map_err(|_| parse_error())?;
            return Ok(Move::new(row, col));
        }

        let mut chars = trimmed.chars();
        let letter = chars.next().ok_or_else(parse_error)?;
        if !letter.is_ascii_alphabetic() {
            return Err(parse_error());
        }
        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(parse_error());
        }

        let col = letter.to_ascii_lowercase() as u8 - b'a';
        let row = digits.parse::<u8>().map_err(|_| parse_error())?;
        Ok(Move::new(row, col))
    }
}

/// An N x N Hex board.
///
/// Cells are stored row-major; a cell, once occupied, is never vacated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Player>>,
}

impl Board {
    /// Creates an empty board of side `size`.
    pub fn new(size: usize) -> Result<Self, HexError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            return Err(HexError::config(format!(
                "board size must be in {MIN_BOARD_SIZE}..={MAX_BOARD_SIZE}, got {size}"
            )));
        }

        Ok(Self {
            size,
            cells: vec![None; size * size],
        })
    }

    /// Side length; the board holds `size * size` cells.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether `mv` lies on the board.
    pub fn contains(&self, mv: Move) -> bool {
        (mv.row as usize) < self.size && (mv.col as usize) < self.size
    }

    pub(crate) fn index(&self, mv: Move) -> usize {
        mv.row as usize * self.size + mv.col as usize
    }

    pub(crate) fn move_at(&self, index: usize) -> Move {
        Move::new((index / self.size) as u8, (index % self.size) as u8)
    }

    /// Returns the player occupying `mv`, or `None` for empty and off-board cells.
    pub fn owner(&self, mv: Move) -> Option<Player> {
        if self.contains(mv) {
            self.cells[self.index(mv)]
        } else {
            None
        }
    }

    /// Whether `mv` is an empty cell on the board.
    pub fn is_empty(&self, mv: Move) -> bool {
        self.contains(mv) && self.cells[self.index(mv)].is_none()
    }

    /// Puts a stone of `player` on `mv`. The board is left untouched when the move is rejected.
    pub fn place(&mut self, mv: Move, player: Player) -> Result<(), HexError> {
        if !self.contains(mv) {
            return Err(HexError::InvalidMove {
                mv,
                reason: MoveRejection::OutOfRange,
            });
        }

        let index = self.index(mv);
        if self.cells[index].is_some() {
            return Err(HexError::InvalidMove {
                mv,
                reason: MoveRejection::Occupied,
            });
        }

        self.cells[index] = Some(player);
        Ok(())
    }

    /// The on-board neighbors of `mv`. Off-board cells have no neighbors.
    pub fn neighbors(&self, mv: Move) -> impl Iterator<Item = Move> {
        let size = self.size as i32;
        let on_board = self.contains(mv);
        NEIGHBOR_OFFSETS
            .iter()
            .filter(move |_| on_board)
            .filter_map(move |&(dr, dc)| {
                let row = mv.row as i32 + dr;
                let col = mv.col as i32 + dc;
                (row >= 0 && row < size && col >= 0 && col < size)
                    .then(|| Move::new(row as u8, col as u8))
            })
    }

    /// Cells along one of `player`'s goal edges.
    pub fn edge(&self, player: Player, edge: Edge) -> impl Iterator<Item = Move> {
        let line = match edge {
            Edge::Near => 0,
            Edge::Far => self.size as u8 - 1,
        };
        (0..self.size as u8).map(move |i| match player {
            Player::Blue => Move::new(i, line),
            Player::Red => Move::new(line, i),
        })
    }

    /// Both goal edges of `player`, near edge first.
    pub fn edge_cells(&self, player: Player) -> (Vec<Move>, Vec<Move>) {
        (
            self.edge(player, Edge::Near).collect(),
            self.edge(player, Edge::Far).collect(),
        )
    }

    /// Whether `mv` lies on the given edge of `player`.
    pub fn on_edge(&self, player: Player, edge: Edge, mv: Move) -> bool {
        let line = match edge {
            Edge::Near => 0,
            Edge::Far => self.size - 1,
        };
        match player {
            Player::Blue => mv.col as usize == line,
            Player::Red => mv.row as usize == line,
        }
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Move> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(i, _)| self.move_at(i))
            .collect()
    }

    /// Number of stones on the board.
    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    /// Whether `player` has a chain of own stones between their two edges.
    ///
    /// Flood fill from every own stone on the near edge through own stones,
    /// stopping as soon as a reached cell lies on the far edge.
    pub fn has_won(&self, player: Player) -> bool {
        let mut visited = vec![false; self.cells.len()];
        let mut stack = Vec::with_capacity(self.size);

        for mv in self.edge(player, Edge::Near) {
            let index = self.index(mv);
            if self.cells[index] == Some(player) {
                visited[index] = true;
                stack.push(mv);
            }
        }

        while let Some(mv) = stack.pop() {
            if self.on_edge(player, Edge::Far, mv) {
                return true;
            }
            for next in self.neighbors(mv) {
                let index = self.index(next);
                if !visited[index] && self.cells[index] == Some(player) {
                    visited[index] = true;
                    stack.push(next);
                }
            }
        }

        false
    }

    /// The player with a winning connection, if any. Hex topology rules out two winners.
    pub fn winner(&self) -> Option<Player> {
        [Player::Blue, Player::Red]
            .into_iter()
            .find(|&player| self.has_won(player))
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let letters: String = (0..self.size)
            .map(|col| format!("{} ", (b'a' + col as u8) as char))
            .collect();
        let border = "-".repeat(self.size * 2 + 2);

        writeln!(f, "   {letters}")?;
        writeln!(f, "  {border}")?;
        for row in 0..self.size {
            let label = row.to_string();
            write!(f, "{}{} \\ ", " ".repeat((row + 1).saturating_sub(label.len())), label)?;
            for col in 0..self.size {
                let symbol = self.cells[row * self.size + col].map_or('-', Player::symbol);
                write!(f, "{symbol} ")?;
            }
            writeln!(f, "\\ {label}")?;
        }
        writeln!(f, "{}{border}", " ".repeat(self.size + 2))?;
        write!(f, "{}{letters}", " ".repeat(self.size + 4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::seq::SliceRandom;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeSet;

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

    fn neighbor_set(board: &Board, row: u8, col: u8) -> BTreeSet<Move> {
        board.neighbors(Move::new(row, col)).collect()
    }

    fn set(cells: &[(u8, u8)]) -> BTreeSet<Move> {
        cells.iter().map(|&(r, c)| Move::new(r, c)).collect()
    }

    #[test]
    fn rejects_unsupported_sizes() {
        assert!(matches!(Board::new(1), Err(HexError::Configuration(_))));
        assert!(matches!(Board::new(27), Err(HexError::Configuration(_))));
        assert!(Board::new(2).is_ok());
        assert!(Board::new(26).is_ok());
    }

    #[test]
    fn neighbors_on_size_two() {
        let board = Board::new(2).unwrap();
        assert_eq!(neighbor_set(&board, 0, 0), set(&[(1, 0), (0, 1)]));
        assert_eq!(neighbor_set(&board, 0, 1), set(&[(0, 0), (1, 1), (1, 0)]));
        assert_eq!(neighbor_set(&board, 1, 0), set(&[(0, 0), (1, 1), (0, 1)]));
        assert_eq!(neighbor_set(&board, 1, 1), set(&[(0, 1), (1, 0)]));
    }

    #[test]
    fn neighbors_on_size_three() {
        let board = Board::new(3).unwrap();
        assert_eq!(
            neighbor_set(&board, 1, 1),
            set(&[(0, 1), (2, 1), (1, 0), (1, 2), (0, 2), (2, 0)])
        );
        assert_eq!(neighbor_set(&board, 0, 0), set(&[(1, 0), (0, 1)]));
        assert_eq!(neighbor_set(&board, 2, 2), set(&[(1, 2), (2, 1)]));
        assert_eq!(neighbor_set(&board, 0, 2), set(&[(0, 1), (1, 2), (1, 1)]));
        assert_eq!(neighbor_set(&board, 2, 0), set(&[(1, 0), (2, 1), (1, 1)]));
        assert_eq!(neighbor_set(&board, 9, 9), BTreeSet::new());
    }

    #[test]
    fn neighbors_are_symmetric() {
        let board = Board::new(5).unwrap();
        for a in board.empty_cells() {
            for b in board.neighbors(a) {
                assert!(board.neighbors(b).any(|x| x == a), "{a} -> {b} not mutual");
            }
        }
    }

    #[test]
    fn place_sets_owner() {
        let mut board = Board::new(4).unwrap();
        board.place(Move::new(2, 3), Player::Red).unwrap();
        assert_eq!(board.owner(Move::new(2, 3)), Some(Player::Red));
        assert!(!board.is_empty(Move::new(2, 3)));
        assert_eq!(board.stone_count(), 1);
    }

    #[test]
    fn place_on_occupied_cell_leaves_board_unchanged() {
        let mut board = board_with(3, &[(1, 1)], &[]);
        let before = board.clone();

        let result = board.place(Move::new(1, 1), Player::Red);

        assert_eq!(
            result,
            Err(HexError::InvalidMove {
                mv: Move::new(1, 1),
                reason: MoveRejection::Occupied,
            })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn place_out_of_range_is_rejected() {
        let mut board = Board::new(3).unwrap();
        let result = board.place(Move::new(0, 3), Player::Blue);
        assert!(matches!(
            result,
            Err(HexError::InvalidMove {
                reason: MoveRejection::OutOfRange,
                ..
            })
        ));
        assert_eq!(board.stone_count(), 0);
    }

    #[test]
    fn edges_follow_orientation() {
        let board = Board::new(3).unwrap();
        let (near, far) = board.edge_cells(Player::Blue);
        assert_eq!(near, vec![Move::new(0, 0), Move::new(1, 0), Move::new(2, 0)]);
        assert_eq!(far, vec![Move::new(0, 2), Move::new(1, 2), Move::new(2, 2)]);

        let (near, far) = board.edge_cells(Player::Red);
        assert_eq!(near, vec![Move::new(0, 0), Move::new(0, 1), Move::new(0, 2)]);
        assert_eq!(far, vec![Move::new(2, 0), Move::new(2, 1), Move::new(2, 2)]);
    }

    #[test]
    fn win_detection_on_size_two() {
        assert_eq!(board_with(2, &[(0, 0), (0, 1)], &[]).winner(), Some(Player::Blue));
        assert_eq!(board_with(2, &[(1, 0), (0, 1)], &[]).winner(), Some(Player::Blue));
        assert_eq!(board_with(2, &[(0, 0), (1, 1)], &[]).winner(), None);
        assert_eq!(board_with(2, &[], &[(0, 1), (1, 0)]).winner(), Some(Player::Red));
        assert_eq!(board_with(2, &[], &[(0, 0), (1, 0)]).winner(), Some(Player::Red));
        assert_eq!(board_with(2, &[], &[(0, 0), (1, 1)]).winner(), None);
    }

    #[test]
    fn blue_wins_along_bent_chain() {
        // a1 links to b0 through the (r-1, c+1) diagonal, then c0 reaches the right edge.
        let board = board_with(3, &[(1, 0), (0, 1), (0, 2)], &[(0, 0), (2, 0)]);
        assert!(board.has_won(Player::Blue));
        assert!(!board.has_won(Player::Red));
    }

    #[test]
    fn broken_chain_is_not_a_win() {
        let board = board_with(3, &[(0, 0), (1, 1), (2, 2)], &[]);
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn full_board_has_exactly_one_winner() {
        // Alternate row-major fill: Blue holds columns a and c, Red holds b and d.
        let mut board = Board::new(4).unwrap();
        let mut player = Player::Blue;
        for mv in board.empty_cells() {
            board.place(mv, player).unwrap();
            player = player.opponent();
        }

        assert!(board.is_full());
        assert_eq!(board.winner(), Some(Player::Red));
        assert!(!board.has_won(Player::Blue));
    }

    #[test]
    fn never_two_winners_and_full_boards_are_decided() {
        for seed in 0..40 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut board = Board::new(5).unwrap();
            let mut moves = board.empty_cells();
            moves.shuffle(&mut rng);

            let mut player = if seed % 2 == 0 { Player::Blue } else { Player::Red };
            for mv in moves {
                board.place(mv, player).unwrap();
                player = player.opponent();
                assert!(!(board.has_won(Player::Blue) && board.has_won(Player::Red)));
            }
            assert!(board.winner().is_some(), "seed {seed} filled without a winner");
        }
    }

    #[test]
    fn move_text_round_trip() {
        let mv: Move = "c4".parse().unwrap();
        assert_eq!(mv, Move::new(4, 2));
        assert_eq!(mv.to_string(), "c4");
        assert_eq!(" B10 ".parse::<Move>().unwrap(), Move::new(10, 1));
    }

    #[test]
    fn columns_without_a_letter_use_the_pair_form() {
        for col in [26, 30, 158, 159, 200, 255] {
            let mv = Move::new(7, col);
            let text = mv.to_string();
            assert_eq!(text, format!("(7,{col})"));
            assert_eq!(text.parse::<Move>().unwrap(), mv);
        }
        assert_eq!(Move::new(0, 25).to_string(), "z0");
        assert_eq!(" (3, 2) ".parse::<Move>().unwrap(), Move::new(3, 2));
    }

    #[test]
    fn rejected_far_move_can_be_reported() {
        let mut board = Board::new(4).unwrap();
        let err = board.place(Move::new(0, 200), Player::Blue).unwrap_err();
        assert_eq!(err.to_string(), "invalid move (0,200): cell is outside the board");
        assert_eq!(board.stone_count(), 0);
    }

    #[test]
    fn move_text_rejects_garbage() {
        for text in ["", "4c", "c", "cc", "c-1", "c1x", "(1)", "(1,x)", "(1,2"] {
            assert!(
                matches!(text.parse::<Move>(), Err(HexError::MoveParse(_))),
                "{text:?} parsed"
            );
        }
    }

    #[test]
    fn display_renders_rhombus() {
        let board = board_with(2, &[(0, 1)], &[(1, 0)]);
        let expected = "   a b \n  ------\n0 \\ - B \\ 0\n 1 \\ R - \\ 1\n    ------\n      a b ";
        assert_eq!(board.to_string(), expected);
    }
}
