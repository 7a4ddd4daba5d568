use crate::board::{Board, MoveError, Turn};
use crate::generators::{LegalMoveGenerator, MoveGenerator};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// A move policy used inside simulations. Plays directly on the board it is
/// handed; callers pass scratch clones.
pub trait RolloutPlayer {
    /// Plays up to `max_moves` moves, appending each to `output`. Stops short
    /// when the side to move has nothing.
    fn play_moves(&mut self, board: &mut Board, max_moves: usize, output: &mut Vec<u32>);
}

/// Picks uniformly among whatever its generator offers.
pub struct RandomRolloutPlayer<G> {
    generator: G,
    rng: StdRng,
    move_buffer: Vec<u32>,
}

impl<G: MoveGenerator> RandomRolloutPlayer<G> {
    pub fn new(generator: G) -> Self {
        RandomRolloutPlayer {
            generator,
            rng: StdRng::from_os_rng(),
            move_buffer: Vec::new(),
        }
    }

    /// Reproducible variant for tests and fixed experiments.
    pub fn with_seed(generator: G, seed: u64) -> Self {
        RandomRolloutPlayer {
            generator,
            rng: StdRng::seed_from_u64(seed),
            move_buffer: Vec::new(),
        }
    }
}

impl<G: MoveGenerator> RolloutPlayer for RandomRolloutPlayer<G> {
    fn play_moves(&mut self, board: &mut Board, max_moves: usize, output: &mut Vec<u32>) {
        for _ in 0..max_moves {
            self.move_buffer.clear();
            self.generator.generate(board, &mut self.move_buffer);
            if self.move_buffer.is_empty() {
                return;
            }
            let mv = self.move_buffer[self.rng.random_range(0..self.move_buffer.len())];
            board.do_next_move(mv);
            output.push(mv);
        }
    }
}

/// A full game-playing agent: owns its view of the game, replays opponent
/// turns and produces its own.
pub trait Player: Send {
    /// Resets the player onto a fresh position.
    fn adopt(&mut self, board: Board);

    /// Replays a turn played by the opponent.
    fn apply_turn(&mut self, turn: Turn) -> Result<(), MoveError>;

    /// Chooses a turn, applies it to the player's own board and returns it.
    /// `None` signals the player has no legal turn and has lost.
    fn suggest_and_apply_turn(&mut self) -> Option<Turn>;
}

/// Uniform-random baseline player.
pub struct RandomPlayer {
    board: Option<Board>,
    rollout: RandomRolloutPlayer<LegalMoveGenerator>,
    turn_buffer: Vec<u32>,
}

impl RandomPlayer {
    pub fn new() -> Self {
        RandomPlayer {
            board: None,
            rollout: RandomRolloutPlayer::new(LegalMoveGenerator),
            turn_buffer: Vec::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomPlayer {
            board: None,
            rollout: RandomRolloutPlayer::with_seed(LegalMoveGenerator, seed),
            turn_buffer: Vec::new(),
        }
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }
}

impl Default for RandomPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for RandomPlayer {
    fn adopt(&mut self, board: Board) {
        self.board = Some(board);
    }

    fn apply_turn(&mut self, turn: Turn) -> Result<(), MoveError> {
        match self.board.as_mut() {
            Some(board) => {
                board.do_turn(turn);
                Ok(())
            }
            None => Err(MoveError::NoBoard),
        }
    }

    fn suggest_and_apply_turn(&mut self) -> Option<Turn> {
        let board = self.board.as_mut()?;
        self.turn_buffer.clear();
        self.rollout.play_moves(board, 2, &mut self.turn_buffer);
        if self.turn_buffer.len() == 2 {
            Some(Turn {
                queen_move: self.turn_buffer[0],
                arrow_shot: self.turn_buffer[1],
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, decode_queen_destination, decode_queen_source};

    #[test]
    fn rollout_plays_only_legal_moves() {
        let mut board = Board::standard();
        let mut rollout = RandomRolloutPlayer::with_seed(LegalMoveGenerator, 42);
        let mut played = Vec::new();
        let mut reference = board.clone();
        rollout.play_moves(&mut board, 6, &mut played);
        assert_eq!(played.len(), 6);
        // Replaying the same moves on a reference board must stay consistent:
        // every move must be in the legal list at its point in the game.
        for &mv in &played {
            let mut legal = Vec::new();
            reference.generate_moves(&mut legal);
            assert!(legal.contains(&mv), "move {mv:#x} was not legal");
            reference.do_next_move(mv);
        }
    }

    #[test]
    fn seeded_rollouts_are_reproducible() {
        let run = || {
            let mut board = Board::standard();
            let mut rollout = RandomRolloutPlayer::with_seed(LegalMoveGenerator, 7);
            let mut played = Vec::new();
            rollout.play_moves(&mut board, 20, &mut played);
            played
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn random_player_finishes_a_game() {
        let mut white = RandomPlayer::with_seed(1);
        let mut black = RandomPlayer::with_seed(2);
        white.adopt(Board::standard());
        black.adopt(Board::standard());
        let mut referee = Board::standard();

        loop {
            let mover: &mut dyn Player = match referee.color_to_move() {
                Color::White => &mut white,
                Color::Black => &mut black,
            };
            let Some(turn) = mover.suggest_and_apply_turn() else {
                break;
            };
            let source = decode_queen_source(turn.queen_move);
            let destination = decode_queen_destination(turn.queen_move);
            assert!(referee.piece_at(source).is_some());
            assert!(referee.piece_at(destination).is_none());
            referee.do_turn(turn);
            let waiter: &mut dyn Player = match referee.color_to_move() {
                Color::White => &mut white,
                Color::Black => &mut black,
            };
            waiter.apply_turn(turn).unwrap();
            assert!(referee.move_count() < 400, "game failed to terminate");
        }
        // Someone lost; the board agrees there are no queen moves left.
        let mut remaining = Vec::new();
        referee.generate_moves(&mut remaining);
        assert!(remaining.is_empty());
    }

    #[test]
    fn apply_turn_without_board_errors() {
        let mut player = RandomPlayer::new();
        let err = player
            .apply_turn(Turn {
                queen_move: 0,
                arrow_shot: 0,
            })
            .unwrap_err();
        assert_eq!(err, MoveError::NoBoard);
    }
}
