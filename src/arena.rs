use crate::board::{Board, Color, MoveError};
use crate::players::Player;
use rayon::prelude::*;

/// Win tally from a batch of games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchTotals {
    pub games: u32,
    pub white_wins: u32,
    pub black_wins: u32,
}

impl MatchTotals {
    pub fn win_count(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white_wins,
            Color::Black => self.black_wins,
        }
    }

    pub fn win_rate(&self, color: Color) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.win_count(color) as f64 / self.games as f64
    }
}

/// Plays one game out between two players adopted onto the initial position.
/// The loser is whoever cannot produce a turn; the winner's color is
/// returned.
fn play_single(
    initial: &Board,
    white: &mut dyn Player,
    black: &mut dyn Player,
) -> Result<Color, MoveError> {
    white.adopt(initial.clone());
    black.adopt(initial.clone());
    let mut to_move = initial.color_to_move();
    loop {
        let (mover, waiter): (&mut dyn Player, &mut dyn Player) = match to_move {
            Color::White => (&mut *white, &mut *black),
            Color::Black => (&mut *black, &mut *white),
        };
        match mover.suggest_and_apply_turn() {
            Some(turn) => {
                waiter.apply_turn(turn)?;
                to_move = to_move.other();
            }
            None => return Ok(to_move.other()),
        }
    }
}

/// Repeated head-to-head games between two fixed players, replaying the same
/// initial position. Useful for comparing generators and heuristics.
pub struct HeadToHead {
    initial: Board,
    white: Box<dyn Player>,
    black: Box<dyn Player>,
    totals: MatchTotals,
}

impl HeadToHead {
    pub fn new(initial: Board, white: Box<dyn Player>, black: Box<dyn Player>) -> Self {
        HeadToHead {
            initial,
            white,
            black,
            totals: MatchTotals::default(),
        }
    }

    /// Plays `games` more games, accumulating onto previous totals.
    pub fn play(&mut self, games: u32) -> Result<(), MoveError> {
        for _ in 0..games {
            let winner = play_single(&self.initial, self.white.as_mut(), self.black.as_mut())?;
            self.totals.games += 1;
            match winner {
                Color::White => self.totals.white_wins += 1,
                Color::Black => self.totals.black_wins += 1,
            }
        }
        Ok(())
    }

    pub fn totals(&self) -> MatchTotals {
        self.totals
    }

    pub fn games_played(&self) -> u32 {
        self.totals.games
    }

    pub fn win_count(&self, color: Color) -> u32 {
        self.totals.win_count(color)
    }

    pub fn win_rate(&self, color: Color) -> f64 {
        self.totals.win_rate(color)
    }
}

/// Plays a batch of games across the rayon pool, building fresh players per
/// game from the factories.
pub fn play_parallel<W, B>(
    initial: &Board,
    games: u32,
    white_factory: impl Fn() -> W + Sync,
    black_factory: impl Fn() -> B + Sync,
) -> Result<MatchTotals, MoveError>
where
    W: Player,
    B: Player,
{
    let winners: Result<Vec<Color>, MoveError> = (0..games)
        .into_par_iter()
        .map(|_| {
            let mut white = white_factory();
            let mut black = black_factory();
            play_single(initial, &mut white, &mut black)
        })
        .collect();

    let winners = winners?;
    let white_wins = winners.iter().filter(|&&w| w == Color::White).count() as u32;
    Ok(MatchTotals {
        games,
        white_wins,
        black_wins: games - white_wins,
    })
}
