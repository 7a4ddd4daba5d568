use crate::board::{Board, MoveKind, decode_queen_source};

/// Produces the candidate moves the search will consider. Takes the board
/// mutably: generation prunes trapped queens and may recompute the chamber
/// partition.
pub trait MoveGenerator {
    fn generate(&mut self, board: &mut Board, output: &mut Vec<u32>);
}

/// Every legal move, straight from the board.
pub struct LegalMoveGenerator;

impl MoveGenerator for LegalMoveGenerator {
    fn generate(&mut self, board: &mut Board, output: &mut Vec<u32>) {
        board.generate_moves(output);
    }
}

/// Prefers queens in contested chambers (chambers also holding enemy queens)
/// over queens already walled off. When nothing is contested, concentrates on
/// the smallest uncontested chamber. Note: occasionally it is critical for a
/// queen in a contested chamber NOT to move, so this generator is a pruning
/// gamble, not a sound reduction.
pub struct ContestedMoveGenerator {
    contested_queens: Vec<u32>,
    uncontested_queens: Vec<u32>,
    friendly_chambers: Vec<u32>,
    enemy_chambers: Vec<u32>,
}

impl ContestedMoveGenerator {
    pub fn new() -> Self {
        ContestedMoveGenerator {
            contested_queens: Vec::new(),
            uncontested_queens: Vec::new(),
            friendly_chambers: Vec::new(),
            enemy_chambers: Vec::new(),
        }
    }
}

impl Default for ContestedMoveGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveGenerator for ContestedMoveGenerator {
    fn generate(&mut self, board: &mut Board, output: &mut Vec<u32>) {
        let output_base = output.len();

        if board.next_kind() != MoveKind::Queen {
            board.generate_moves(output);
            return;
        }

        self.contested_queens.clear();
        self.uncontested_queens.clear();
        self.friendly_chambers.clear();
        self.enemy_chambers.clear();
        board.compute_chambers();

        let color = board.color_to_move();
        for &queen in board.untrapped_queens(color) {
            self.friendly_chambers.push(board.position_chamber(queen));
        }
        for &queen in board.untrapped_queens(color.other()) {
            self.enemy_chambers.push(board.position_chamber(queen));
        }

        let friendly_queens = board.untrapped_queens(color);
        for (i, &chamber) in self.friendly_chambers.iter().enumerate() {
            let size = board.chamber_size(chamber);
            let occupants = self.friendly_chambers.iter().filter(|&&c| c == chamber).count()
                + self.enemy_chambers.iter().filter(|&&c| c == chamber).count();
            // A chamber packed wall to wall with queens offers no moves at all.
            if size as usize > occupants {
                if self.enemy_chambers.contains(&chamber) {
                    self.contested_queens.push(friendly_queens[i]);
                } else {
                    self.uncontested_queens.push(friendly_queens[i]);
                }
            }
        }

        for &queen in &self.contested_queens {
            board.generate_queen_moves_from(queen, output);
        }

        if !self.uncontested_queens.is_empty() && output.len() == output_base {
            let mut smallest_chamber = None;
            let mut min_size = u32::MAX;
            for (i, &chamber) in self.friendly_chambers.iter().enumerate() {
                let size = board.chamber_size(chamber);
                if size < min_size && self.uncontested_queens.contains(&friendly_queens[i]) {
                    smallest_chamber = Some(chamber);
                    min_size = size;
                }
            }
            for (i, &chamber) in self.friendly_chambers.iter().enumerate().rev() {
                if Some(chamber) == smallest_chamber {
                    board.generate_queen_moves_from(friendly_queens[i], output);
                }
            }
        }
    }
}

/// Filters the queen phase down to queens that still share a chamber with
/// another queen; queens already alone in a chamber can fill their room later
/// in any order. Falls back to the full move list when the filter would leave
/// nothing.
pub struct UnchamberedMoveGenerator {
    candidates: Vec<u32>,
}

impl UnchamberedMoveGenerator {
    pub fn new() -> Self {
        UnchamberedMoveGenerator {
            candidates: Vec::new(),
        }
    }
}

impl Default for UnchamberedMoveGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveGenerator for UnchamberedMoveGenerator {
    fn generate(&mut self, board: &mut Board, output: &mut Vec<u32>) {
        let output_base = output.len();
        board.generate_moves(output);
        if board.next_kind() != MoveKind::Queen {
            return;
        }

        board.compute_chambers();
        let color = board.color_to_move();
        self.candidates.clear();
        for &queen in board.untrapped_queens(color) {
            let chamber = board.position_chamber(queen);
            let occupants = board
                .untrapped_queens(color)
                .iter()
                .chain(board.untrapped_queens(color.other()))
                .filter(|&&other| board.position_chamber(other) == chamber)
                .count();
            if occupants > 1 {
                self.candidates.push(queen);
            }
        }

        if self.candidates.len() > 1 {
            let before = output.len();
            let mut write = output_base;
            for read in output_base..before {
                let mv = output[read];
                if self.candidates.contains(&decode_queen_source(mv)) {
                    output[write] = mv;
                    write += 1;
                }
            }
            if write > output_base {
                output.truncate(write);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;
    use crate::geometry::Dimensions;

    fn dims() -> Dimensions {
        Dimensions::new(10, 10).unwrap()
    }

    /// Vertical arrow wall at x = 4, splitting the board left/right.
    fn walled_board() -> Board {
        let mut board = Board::new(dims());
        for y in 0..10 {
            board.place_arrow(board.dimensions.position(4, y));
        }
        board
    }

    fn sources(moves: &[u32]) -> Vec<u32> {
        let mut s: Vec<u32> = moves.iter().map(|&m| decode_queen_source(m)).collect();
        s.sort_unstable();
        s.dedup();
        s
    }

    #[test]
    fn legal_generator_matches_board() {
        let mut board = Board::standard();
        let mut expected = Vec::new();
        board.clone().generate_moves(&mut expected);
        let mut actual = Vec::new();
        LegalMoveGenerator.generate(&mut board, &mut actual);
        assert_eq!(actual, expected);
    }

    #[test]
    fn contested_generator_prefers_contested_queens() {
        let d = dims();
        let mut board = walled_board();
        // Left chamber: one queen of each color, contested.
        let contested = d.position(0, 0);
        board.place_queen(Color::White, contested);
        board.place_queen(Color::Black, d.position(3, 3));
        // Right chamber: a lone white queen, uncontested.
        board.place_queen(Color::White, d.position(8, 8));

        let mut moves = Vec::new();
        ContestedMoveGenerator::new().generate(&mut board, &mut moves);
        assert!(!moves.is_empty());
        assert_eq!(sources(&moves), vec![contested]);
    }

    #[test]
    fn contested_generator_falls_back_to_smallest_chamber() {
        let d = dims();
        let mut board = walled_board();
        // Both whites uncontested, in chambers of different sizes; black is
        // walled into its own corner so nothing is contested.
        for x in 0..4 {
            board.place_arrow(d.position(x, 4));
        }
        // Bottom-left chamber is 4x4 = 16 cells, right chamber is 5x10 = 50.
        let small = d.position(1, 1);
        board.place_queen(Color::White, small);
        board.place_queen(Color::White, d.position(8, 8));
        board.place_queen(Color::Black, d.position(0, 9));

        let mut moves = Vec::new();
        ContestedMoveGenerator::new().generate(&mut board, &mut moves);
        assert!(!moves.is_empty());
        assert_eq!(sources(&moves), vec![small]);
    }

    #[test]
    fn contested_generator_delegates_in_arrow_phase() {
        let d = dims();
        let mut board = Board::standard();
        board.do_move(
            MoveKind::Queen,
            crate::board::encode_queen_move(d.position(3, 0), d.position(3, 5)),
        );
        let mut expected = Vec::new();
        board.clone().generate_moves(&mut expected);
        let mut actual = Vec::new();
        ContestedMoveGenerator::new().generate(&mut board, &mut actual);
        assert_eq!(actual, expected);
    }

    #[test]
    fn unchambered_generator_skips_isolated_queens() {
        let d = dims();
        let mut board = walled_board();
        // Two whites and a black share the left chamber, a third white is
        // alone on the right.
        let shared_a = d.position(0, 0);
        let shared_b = d.position(2, 7);
        board.place_queen(Color::White, shared_a);
        board.place_queen(Color::White, shared_b);
        board.place_queen(Color::Black, d.position(3, 3));
        board.place_queen(Color::White, d.position(8, 8));

        let mut moves = Vec::new();
        UnchamberedMoveGenerator::new().generate(&mut board, &mut moves);
        assert!(!moves.is_empty());
        assert_eq!(sources(&moves), vec![shared_a, shared_b]);
    }

    #[test]
    fn unchambered_generator_falls_back_when_all_isolated() {
        let d = dims();
        let mut board = walled_board();
        board.place_queen(Color::White, d.position(1, 1));
        board.place_queen(Color::Black, d.position(8, 8));

        let mut expected = Vec::new();
        board.clone().generate_moves(&mut expected);
        let mut actual = Vec::new();
        UnchamberedMoveGenerator::new().generate(&mut board, &mut actual);
        assert_eq!(actual, expected);
    }
}
