use crate::board::{Board, Color};
use crate::players::RolloutPlayer;

/// Scores a position; positive favors White. Evaluation receives the board
/// mutably and may consume it (rollout heuristics play it to the end), so
/// callers evaluate scratch clones.
pub trait Heuristic {
    fn evaluate(&mut self, board: &mut Board) -> i32;
}

/// Plays the position out with a rollout policy and scores the result:
/// whoever is to move at the end has no queen move and has lost.
pub struct RolloutHeuristic<P> {
    player: P,
    simulation_buffer: Vec<u32>,
}

impl<P: RolloutPlayer> RolloutHeuristic<P> {
    pub fn new(player: P) -> Self {
        RolloutHeuristic {
            player,
            simulation_buffer: Vec::with_capacity(300),
        }
    }
}

impl<P: RolloutPlayer> Heuristic for RolloutHeuristic<P> {
    fn evaluate(&mut self, board: &mut Board) -> i32 {
        loop {
            self.simulation_buffer.clear();
            let batch = self.simulation_buffer.capacity().max(2);
            self.player
                .play_moves(board, batch, &mut self.simulation_buffer);
            if self.simulation_buffer.is_empty() {
                break;
            }
        }
        match board.color_to_move() {
            Color::White => -1,
            Color::Black => 1,
        }
    }
}

/// Whether a chamber holding queens of both colors leaves the position
/// undecided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedChamberPolicy {
    /// Any shared chamber is undecided.
    Always,
    /// Shared chambers of at most this size count as settled; the queens
    /// inside only matter if they still have room to maneuver.
    LargerThan(u32),
}

impl Default for SharedChamberPolicy {
    fn default() -> Self {
        SharedChamberPolicy::LargerThan(4)
    }
}

/// Territory count over the chamber partition. Returns 0 while the position
/// is still undecided (some chamber is meaningfully shared); otherwise the
/// signed territory difference, with the side to move losing ties.
pub struct EndgameHeuristic {
    policy: SharedChamberPolicy,
    white_chambers: Vec<u32>,
    black_chambers: Vec<u32>,
    all_chambers: Vec<u32>,
}

impl EndgameHeuristic {
    pub fn new() -> Self {
        Self::with_policy(SharedChamberPolicy::default())
    }

    pub fn with_policy(policy: SharedChamberPolicy) -> Self {
        EndgameHeuristic {
            policy,
            white_chambers: Vec::new(),
            black_chambers: Vec::new(),
            all_chambers: Vec::new(),
        }
    }

    fn undecided_when_shared(&self, chamber_size: u32) -> bool {
        match self.policy {
            SharedChamberPolicy::Always => true,
            SharedChamberPolicy::LargerThan(limit) => chamber_size > limit,
        }
    }
}

impl Default for EndgameHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl Heuristic for EndgameHeuristic {
    fn evaluate(&mut self, board: &mut Board) -> i32 {
        board.compute_chambers();
        self.white_chambers.clear();
        self.black_chambers.clear();
        self.all_chambers.clear();

        let white_queens = board.untrapped_queens(Color::White);
        let black_queens = board.untrapped_queens(Color::Black);
        // Tiebreak bias: each surviving queen occupies one cell of its own
        // territory.
        let mut territory = black_queens.len() as i32 - white_queens.len() as i32;

        let max_queens = white_queens.len().max(black_queens.len());
        for q in 0..max_queens {
            if let Some(&queen) = white_queens.get(q) {
                let chamber = board.position_chamber(queen);
                if self.black_chambers.contains(&chamber)
                    && self.undecided_when_shared(board.chamber_size(chamber))
                {
                    return 0;
                }
                self.all_chambers.push(chamber);
                if !self.white_chambers.contains(&chamber) {
                    self.white_chambers.push(chamber);
                    territory += board.chamber_size(chamber) as i32;
                }
            }
            if let Some(&queen) = black_queens.get(q) {
                let chamber = board.position_chamber(queen);
                if self.white_chambers.contains(&chamber)
                    && self.undecided_when_shared(board.chamber_size(chamber))
                {
                    return 0;
                }
                self.all_chambers.push(chamber);
                if !self.black_chambers.contains(&chamber) {
                    self.black_chambers.push(chamber);
                    territory -= board.chamber_size(chamber) as i32;
                }
            }
        }

        // A small shared chamber is still undecided while its queens have
        // room left to fight over.
        self.all_chambers.sort_unstable();
        let mut i = 0;
        while i < self.all_chambers.len() {
            let chamber = self.all_chambers[i];
            let mut count = 1;
            while i + count < self.all_chambers.len() && self.all_chambers[i + count] == chamber {
                count += 1;
            }
            if (count as u32) < board.chamber_size(chamber)
                && self.white_chambers.contains(&chamber)
                && self.black_chambers.contains(&chamber)
            {
                return 0;
            }
            i += count;
        }

        if territory != 0 {
            territory
        } else {
            match board.color_to_move() {
                Color::White => -1,
                Color::Black => 1,
            }
        }
    }
}

/// Rollout that keeps checking for a decided endgame; once the chamber
/// analysis settles the game the verdict is returned without playing the
/// rest out.
pub struct HybridRolloutHeuristic<P> {
    player: P,
    endgame: EndgameHeuristic,
    simulation_buffer: Vec<u32>,
}

impl<P: RolloutPlayer> HybridRolloutHeuristic<P> {
    pub fn new(player: P) -> Self {
        Self::with_policy(player, SharedChamberPolicy::default())
    }

    pub fn with_policy(player: P, policy: SharedChamberPolicy) -> Self {
        HybridRolloutHeuristic {
            player,
            endgame: EndgameHeuristic::with_policy(policy),
            simulation_buffer: Vec::with_capacity(4),
        }
    }
}

impl<P: RolloutPlayer> Heuristic for HybridRolloutHeuristic<P> {
    fn evaluate(&mut self, board: &mut Board) -> i32 {
        loop {
            let endgame_evaluation = self.endgame.evaluate(board);
            if endgame_evaluation != 0 {
                return endgame_evaluation;
            }
            self.simulation_buffer.clear();
            self.player.play_moves(board, 4, &mut self.simulation_buffer);
            if self.simulation_buffer.is_empty() {
                break;
            }
        }
        match board.color_to_move() {
            Color::White => -1,
            Color::Black => 1,
        }
    }
}

/// Queen mobility difference: reachable squares for White minus Black.
pub struct MobilityHeuristic {
    trace_buffer: Vec<u32>,
}

impl MobilityHeuristic {
    pub fn new() -> Self {
        MobilityHeuristic {
            trace_buffer: Vec::with_capacity(36),
        }
    }
}

impl Default for MobilityHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl Heuristic for MobilityHeuristic {
    fn evaluate(&mut self, board: &mut Board) -> i32 {
        let mut heuristic = 0;
        for color in [Color::White, Color::Black] {
            let mut mobility = 0;
            for &queen in board.untrapped_queens(color) {
                self.trace_buffer.clear();
                board.trace_all(queen, &mut self.trace_buffer);
                mobility += self.trace_buffer.len() as i32;
            }
            match color {
                Color::White => heuristic += mobility,
                Color::Black => heuristic -= mobility,
            }
        }
        heuristic
    }
}

/// Delegates to one heuristic for the opening and another once the move count
/// passes a threshold.
pub struct SwitchHeuristic<A, B> {
    switch_after_move: u32,
    opening: A,
    endgame: B,
}

impl<A: Heuristic, B: Heuristic> SwitchHeuristic<A, B> {
    pub fn new(switch_after_move: u32, opening: A, endgame: B) -> Self {
        SwitchHeuristic {
            switch_after_move,
            opening,
            endgame,
        }
    }
}

impl<A: Heuristic, B: Heuristic> Heuristic for SwitchHeuristic<A, B> {
    fn evaluate(&mut self, board: &mut Board) -> i32 {
        if board.move_count() > self.switch_after_move {
            self.endgame.evaluate(board)
        } else {
            self.opening.evaluate(board)
        }
    }
}
