use crate::chambers::ChamberAnalyzer;
use crate::geometry::Dimensions;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_QUEENS_PER_COLOR: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Piece {
    WhiteQueen,
    BlackQueen,
    Arrow,
}

impl Piece {
    pub fn queen_of(color: Color) -> Piece {
        match color {
            Color::White => Piece::WhiteQueen,
            Color::Black => Piece::BlackQueen,
        }
    }

    pub fn queen_color(self) -> Option<Color> {
        match self {
            Piece::WhiteQueen => Some(Color::White),
            Piece::BlackQueen => Some(Color::Black),
            Piece::Arrow => None,
        }
    }
}

/// The two halves of a turn. A side moves a queen, then that queen shoots an
/// arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    Queen,
    Arrow,
}

impl MoveKind {
    pub fn next(self) -> MoveKind {
        match self {
            MoveKind::Queen => MoveKind::Arrow,
            MoveKind::Arrow => MoveKind::Queen,
        }
    }
}

/// Queen moves pack source and destination into one u32; arrow moves are the
/// bare destination position.
#[inline]
pub fn encode_queen_move(source: u32, destination: u32) -> u32 {
    (destination << 16) | source
}

#[inline]
pub fn decode_queen_source(queen_move: u32) -> u32 {
    queen_move & 0xFFFF
}

#[inline]
pub fn decode_queen_destination(queen_move: u32) -> u32 {
    queen_move >> 16
}

/// A complete turn: an encoded queen move and an arrow destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub queen_move: u32,
    pub arrow_shot: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub enum MoveError {
    IllegalQueenMove { source: u32, destination: u32 },
    IllegalArrowShot(u32),
    NoBoard,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::IllegalQueenMove {
                source,
                destination,
            } => write!(
                f,
                "queen move from {source} to {destination} is not legal"
            ),
            MoveError::IllegalArrowShot(position) => {
                write!(f, "arrow shot at {position} is not legal")
            }
            MoveError::NoBoard => write!(f, "no board has been adopted"),
        }
    }
}

impl std::error::Error for MoveError {}

/// A complete mutable Game of Amazons position.
///
/// Cloning is cheap (a few small vector copies), which the search relies on.
/// Move application is unchecked; legality is the caller's concern and the
/// move generators only ever produce legal moves.
#[derive(Debug, Clone)]
pub struct Board {
    pub dimensions: Dimensions,
    cells: Vec<Option<Piece>>,
    chambers: ChamberAnalyzer,
    chambers_dirty: bool,
    color_to_move: Color,
    next_kind: MoveKind,
    move_count: u32,
    untrapped_white: Vec<u32>,
    untrapped_black: Vec<u32>,
    last_queen_source: Option<u32>,
    last_queen_destination: Option<u32>,
    last_arrow: Option<u32>,
}

impl Board {
    /// An empty board; place queens before playing.
    pub fn new(dimensions: Dimensions) -> Self {
        Board {
            dimensions,
            cells: vec![None; dimensions.array_size as usize],
            chambers: ChamberAnalyzer::new(dimensions),
            chambers_dirty: true,
            color_to_move: Color::White,
            next_kind: MoveKind::Queen,
            move_count: 0,
            untrapped_white: Vec::with_capacity(MAX_QUEENS_PER_COLOR),
            untrapped_black: Vec::with_capacity(MAX_QUEENS_PER_COLOR),
            last_queen_source: None,
            last_queen_destination: None,
            last_arrow: None,
        }
    }

    /// The tournament 10x10 opening position, White to move.
    pub fn standard() -> Self {
        let dimensions = Dimensions::new(10, 10).expect("10x10 is within the supported range");
        let mut board = Board::new(dimensions);
        board.place_queen(Color::White, dimensions.position(0, 3));
        board.place_queen(Color::White, dimensions.position(3, 0));
        board.place_queen(Color::White, dimensions.position(6, 0));
        board.place_queen(Color::White, dimensions.position(9, 3));
        board.place_queen(Color::Black, dimensions.position(0, 6));
        board.place_queen(Color::Black, dimensions.position(3, 9));
        board.place_queen(Color::Black, dimensions.position(6, 9));
        board.place_queen(Color::Black, dimensions.position(9, 6));
        board
    }

    pub fn place_queen(&mut self, color: Color, position: u32) {
        self.place_piece(Piece::queen_of(color), position);
        self.untrapped_mut(color).push(position);
    }

    pub fn place_arrow(&mut self, position: u32) {
        self.chambers.place_arrow(position);
        self.chambers_dirty = true;
        self.place_piece(Piece::Arrow, position);
    }

    fn place_piece(&mut self, piece: Piece, position: u32) {
        debug_assert!(
            !self.dimensions.out_of_bounds(position as i32),
            "position {position} is off the board"
        );
        debug_assert!(
            self.cells[position as usize].is_none(),
            "position {position} is not empty"
        );
        self.cells[position as usize] = Some(piece);
    }

    /// Applies an encoded move without legality checking.
    pub fn do_move(&mut self, kind: MoveKind, mv: u32) {
        self.move_count += 1;
        match kind {
            MoveKind::Queen => {
                let source = decode_queen_source(mv);
                let destination = decode_queen_destination(mv);
                self.relocate_queen(source, destination);
                self.last_queen_source = Some(source);
                self.last_queen_destination = Some(destination);
            }
            MoveKind::Arrow => {
                self.place_arrow(mv);
                self.last_arrow = Some(mv);
                self.color_to_move = self.color_to_move.other();
            }
        }
        self.next_kind = kind.next();
    }

    /// Applies a move of whichever kind the board expects next.
    pub fn do_next_move(&mut self, mv: u32) {
        self.do_move(self.next_kind, mv);
    }

    pub fn do_turn(&mut self, turn: Turn) {
        self.do_move(MoveKind::Queen, turn.queen_move);
        self.do_move(MoveKind::Arrow, turn.arrow_shot);
    }

    // The mover's color is read off the board, so replaying an externally
    // sourced game keeps color-to-move in sync.
    fn relocate_queen(&mut self, source: u32, destination: u32) {
        let Some(piece) = self.cells[source as usize] else {
            return;
        };
        let Some(color) = piece.queen_color() else {
            return;
        };
        let queens = self.untrapped_mut(color);
        if let Some(entry) = queens.iter_mut().find(|p| **p == source) {
            *entry = destination;
        }
        self.color_to_move = color;
        self.cells[source as usize] = None;
        self.cells[destination as usize] = Some(piece);
    }

    pub fn untrapped_queens(&self, color: Color) -> &[u32] {
        match color {
            Color::White => &self.untrapped_white,
            Color::Black => &self.untrapped_black,
        }
    }

    fn untrapped_mut(&mut self, color: Color) -> &mut Vec<u32> {
        match color {
            Color::White => &mut self.untrapped_white,
            Color::Black => &mut self.untrapped_black,
        }
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn color_to_move(&self) -> Color {
        self.color_to_move
    }

    pub fn next_kind(&self) -> MoveKind {
        self.next_kind
    }

    pub fn piece_at(&self, position: u32) -> Option<Piece> {
        self.cells[position as usize]
    }

    pub fn last_queen_destination(&self) -> Option<u32> {
        self.last_queen_destination
    }

    /// Appends every sliding destination from `source`: all 8 rays, stopping
    /// at the first occupied or off-board square.
    pub fn trace_all(&self, source: u32, output: &mut Vec<u32>) {
        for &offset in self.dimensions.offsets() {
            let mut position = source as i32 + offset;
            while !self.dimensions.out_of_bounds(position)
                && self.cells[position as usize].is_none()
            {
                output.push(position as u32);
                position += offset;
            }
        }
    }

    fn surrounded_by_arrows(&self, position: u32) -> bool {
        for &offset in self.dimensions.offsets() {
            let adjacent = position as i32 + offset;
            if !self.dimensions.out_of_bounds(adjacent)
                && self.cells[adjacent as usize] != Some(Piece::Arrow)
            {
                return false;
            }
        }
        true
    }

    /// Generates all legal moves for the expected kind. In the queen phase a
    /// queen with no destinations whose every in-bounds neighbor is an arrow
    /// can never move again and is removed from its alive list for good.
    pub fn generate_moves(&mut self, output: &mut Vec<u32>) {
        match self.next_kind {
            MoveKind::Queen => self.generate_queen_moves(output),
            MoveKind::Arrow => self.generate_arrow_shots(output),
        }
    }

    fn generate_queen_moves(&mut self, output: &mut Vec<u32>) {
        let color = self.color_to_move;
        let mut q = self.untrapped_queens(color).len();
        while q > 0 {
            q -= 1;
            let queen = self.untrapped_queens(color)[q];
            let output_base = output.len();
            self.trace_all(queen, output);
            if output.len() == output_base && self.surrounded_by_arrows(queen) {
                self.untrapped_mut(color).remove(q);
            }
            for destination in &mut output[output_base..] {
                *destination = encode_queen_move(queen, *destination);
            }
        }
    }

    fn generate_arrow_shots(&self, output: &mut Vec<u32>) {
        let Some(shooter) = self.last_queen_destination else {
            debug_assert!(false, "arrow phase before any queen move");
            return;
        };
        self.trace_all(shooter, output);
    }

    /// Encoded moves of one queen, without the trapped-queen side effect.
    pub fn generate_queen_moves_from(&self, queen: u32, output: &mut Vec<u32>) {
        let output_base = output.len();
        self.trace_all(queen, output);
        for destination in &mut output[output_base..] {
            *destination = encode_queen_move(queen, *destination);
        }
    }

    /// Capacity hint for a move list of the expected kind.
    pub fn max_moves(&self) -> usize {
        match self.next_kind {
            MoveKind::Queen => MAX_QUEENS_PER_COLOR * self.dimensions.max_trace as usize,
            MoveKind::Arrow => self.dimensions.max_trace as usize,
        }
    }

    /// Capacity hint valid for either kind.
    pub fn max_moves_absolute(&self) -> usize {
        MAX_QUEENS_PER_COLOR * self.dimensions.max_trace as usize
    }

    /// Brings the chamber partition up to date. Arrow placement only marks it
    /// stale; the recompute runs here, once, when somebody asks.
    pub fn compute_chambers(&mut self) {
        if self.chambers_dirty {
            self.chambers.update();
            self.chambers_dirty = false;
        }
    }

    /// Chamber id of a non-arrow position. Call `compute_chambers` first.
    pub fn position_chamber(&self, position: u32) -> u32 {
        debug_assert!(!self.chambers_dirty, "chambers queried while stale");
        self.chambers.position_chamber(position)
    }

    pub fn chamber_size(&self, chamber: u32) -> u32 {
        debug_assert!(!self.chambers_dirty, "chambers queried while stale");
        self.chambers.chamber_size(chamber)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.dimensions.width;
        let mut line = String::new();
        for i in 0..=4 * width {
            line.push(if i % 4 == 0 { '+' } else { '-' });
        }
        writeln!(f, "{line}")?;
        for y in (0..self.dimensions.height).rev() {
            write!(f, "|")?;
            for x in 0..width {
                let symbol = match self.cells[self.dimensions.position(x, y) as usize] {
                    None => ' ',
                    Some(Piece::WhiteQueen) => 'W',
                    Some(Piece::BlackQueen) => 'B',
                    Some(Piece::Arrow) => '*',
                };
                write!(f, " {symbol} |")?;
            }
            writeln!(f)?;
            writeln!(f, "{line}")?;
        }
        write!(
            f,
            "{} to make {} move",
            self.color_to_move,
            match self.next_kind {
                MoveKind::Queen => "queen",
                MoveKind::Arrow => "arrow",
            }
        )
    }
}
