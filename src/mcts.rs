//! Concurrent Monte-Carlo tree search.
//!
//! The tree is built from immutable-structure nodes: per-child statistics are
//! relaxed atomics and child links are write-once slots, so worker threads
//! share the tree without locks. Workers snapshot the current search root
//! (board, root node, root aggregates) each iteration; replacing the root is
//! a single swap under a mutex and superseded iterations finish harmlessly
//! against the old aggregates.

use crate::board::{Board, Color, MoveError, MoveKind, Turn};
use crate::generators::MoveGenerator;
use crate::heuristics::Heuristic;
use crate::players::Player;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub type GeneratorFactory = Arc<dyn Fn() -> Box<dyn MoveGenerator + Send> + Send + Sync>;
pub type HeuristicFactory = Arc<dyn Fn() -> Box<dyn Heuristic + Send> + Send + Sync>;

pub struct MonteCarloConfig {
    pub threads: usize,
    pub thinking_time: Duration,
    pub exploration_factor: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        MonteCarloConfig {
            threads: 4,
            thinking_time: Duration::from_secs(1),
            exploration_factor: std::f64::consts::SQRT_2,
        }
    }
}

/// Read-only search telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub white_win_ratio: f64,
    pub simulations: u32,
    pub max_depth: u32,
}

// ====== TREE ======

/// One position in the search tree. Structure is fixed at construction;
/// statistics live in parallel arrays of relaxed atomics indexed like
/// `moves`. `rewards[i]` counts simulations through child i won by this
/// node's side to move.
struct Node {
    color: Color,
    /// Board move count at this node; selection abandons an iteration when a
    /// node's stamp disagrees with the board being walked.
    stamp: u32,
    moves: Vec<u32>,
    children: Vec<OnceLock<Arc<Node>>>,
    evaluations: Vec<AtomicU32>,
    rewards: Vec<AtomicU32>,
    next_unexplored: AtomicUsize,
}

impl Node {
    fn from_board(board: &mut Board, generator: &mut dyn MoveGenerator) -> Node {
        let mut moves = Vec::with_capacity(board.max_moves());
        generator.generate(board, &mut moves);
        let count = moves.len();
        Node {
            color: board.color_to_move(),
            stamp: board.move_count(),
            moves,
            children: (0..count).map(|_| OnceLock::new()).collect(),
            evaluations: (0..count).map(|_| AtomicU32::new(0)).collect(),
            rewards: (0..count).map(|_| AtomicU32::new(0)).collect(),
            next_unexplored: AtomicUsize::new(0),
        }
    }
}

/// Aggregate counters for the current root, kept outside the tree so a rebase
/// can install fresh ones.
struct RootStats {
    evaluations: AtomicU32,
    rewards: AtomicU32,
    max_depth: AtomicU32,
}

impl RootStats {
    fn new(evaluations: u32, rewards: u32, max_depth: u32) -> Self {
        RootStats {
            evaluations: AtomicU32::new(evaluations),
            rewards: AtomicU32::new(rewards),
            max_depth: AtomicU32::new(max_depth),
        }
    }
}

/// What a worker needs for one iteration, swapped atomically as one unit.
/// The board snapshot is immutable; workers clone it, so they can never
/// observe a half-applied move.
struct SearchRoot {
    board: Board,
    node: Arc<Node>,
    stats: Arc<RootStats>,
}

struct Shared {
    current: Mutex<Option<Arc<SearchRoot>>>,
}

// ====== SELECTION ======

// Unexpanded children are handed out in move order; once all have been
// visited the pick is argmax UCB1. Returns None at a terminal node.
fn select_child(node: &Node, parent_evaluations: u32, exploration: f64) -> Option<usize> {
    if node.moves.is_empty() {
        return None;
    }

    if node.next_unexplored.load(Ordering::Relaxed) < node.moves.len() {
        let index = node.next_unexplored.fetch_add(1, Ordering::Relaxed);
        if index < node.moves.len() {
            return Some(index);
        }
    }

    let ln_parent = (parent_evaluations.max(1) as f64).ln();
    let mut best_index = 0;
    let mut best_score = f64::NEG_INFINITY;
    for i in 0..node.moves.len() {
        let evaluations = node.evaluations[i].load(Ordering::Relaxed);
        // A raced slot that is still empty or unvisited is taken immediately.
        if evaluations == 0 || node.children[i].get().is_none() {
            return Some(i);
        }
        let rewards = node.rewards[i].load(Ordering::Relaxed) as f64;
        let n = evaluations as f64;
        let score = rewards / n + exploration * (ln_parent / n).sqrt();
        if score > best_score {
            best_score = score;
            best_index = i;
        }
    }
    Some(best_index)
}

// ====== SEARCH ======

// One full iteration: selection down the tree, expansion + heuristic
// evaluation at the frontier, then backpropagation along the recorded trace.
fn search_iteration(
    root: &SearchRoot,
    board: &mut Board,
    generator: &mut dyn MoveGenerator,
    heuristic: &mut dyn Heuristic,
    exploration: f64,
    trace: &mut Vec<(Arc<Node>, usize)>,
) {
    trace.clear();
    let mut node = root.node.clone();
    if node.stamp != board.move_count() {
        return;
    }
    let mut parent_evaluations = root.stats.evaluations.load(Ordering::Relaxed);

    let winner;
    loop {
        match select_child(&node, parent_evaluations, exploration) {
            None => {
                // No moves: the side to move here has lost.
                winner = board.color_to_move().other();
                break;
            }
            Some(index) => {
                trace.push((node.clone(), index));
                board.do_next_move(node.moves[index]);
                parent_evaluations = node.evaluations[index].load(Ordering::Relaxed);
                match node.children[index].get() {
                    Some(child) => {
                        if child.stamp != board.move_count() {
                            // Stale view of a rebased tree; drop the iteration.
                            return;
                        }
                        let child = child.clone();
                        node = child;
                    }
                    None => {
                        let expanded = Arc::new(Node::from_board(board, generator));
                        let score = heuristic.evaluate(board);
                        winner = winner_from_score(score, board);
                        // First writer wins; a racing loser's statistics
                        // still flow into the same counters below.
                        let _ = node.children[index].set(expanded);
                        break;
                    }
                }
            }
        }
    }

    root.stats
        .max_depth
        .fetch_max(trace.len() as u32, Ordering::Relaxed);
    root.stats.evaluations.fetch_add(1, Ordering::Relaxed);
    if winner == root.node.color {
        root.stats.rewards.fetch_add(1, Ordering::Relaxed);
    }
    for (node, index) in trace.drain(..) {
        node.evaluations[index].fetch_add(1, Ordering::Relaxed);
        if node.color == winner {
            node.rewards[index].fetch_add(1, Ordering::Relaxed);
        }
    }
}

// Positive favors White; a zero from a played-out board falls back to the
// loser-is-to-move convention.
fn winner_from_score(score: i32, board: &Board) -> Color {
    match score.signum() {
        1 => Color::White,
        -1 => Color::Black,
        _ => board.color_to_move().other(),
    }
}

fn worker_loop(
    shared: Arc<Shared>,
    running: Arc<AtomicBool>,
    mut generator: Box<dyn MoveGenerator + Send>,
    mut heuristic: Box<dyn Heuristic + Send>,
    exploration: f64,
) {
    let mut trace = Vec::new();
    while running.load(Ordering::Acquire) {
        let snapshot = {
            let guard = shared
                .current
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.clone()
        };
        let Some(root) = snapshot else {
            thread::yield_now();
            continue;
        };
        let mut board = root.board.clone();
        search_iteration(
            &root,
            &mut board,
            generator.as_mut(),
            heuristic.as_mut(),
            exploration,
            &mut trace,
        );
    }
}

// ====== PLAYER ======

/// MCTS player with tree reuse across turns. Worker threads run from `adopt`
/// until the next `adopt` or drop; applying moves swaps the search root under
/// the workers without stopping them.
pub struct MonteCarloPlayer {
    board: Option<Board>,
    shared: Arc<Shared>,
    running: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
    threads: usize,
    thinking_time: Duration,
    exploration_factor: f64,
    generator_factory: GeneratorFactory,
    heuristic_factory: HeuristicFactory,
    root_generator: Box<dyn MoveGenerator + Send>,
}

impl MonteCarloPlayer {
    pub fn new(
        config: MonteCarloConfig,
        generator_factory: GeneratorFactory,
        heuristic_factory: HeuristicFactory,
    ) -> Self {
        let root_generator = generator_factory();
        MonteCarloPlayer {
            board: None,
            shared: Arc::new(Shared {
                current: Mutex::new(None),
            }),
            running: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
            threads: config.threads,
            thinking_time: config.thinking_time,
            exploration_factor: config.exploration_factor,
            generator_factory,
            heuristic_factory,
            root_generator,
        }
    }

    /// Resets the player onto a new position: stops the old worker pool,
    /// rebuilds the root and starts a fresh pool.
    pub fn adopt(&mut self, board: Board) {
        self.stop_workers();
        self.board = Some(board);
        self.rebuild_root();
        self.start_workers();
    }

    /// Applies a move of the engine's own choosing or a validated opponent
    /// move, reusing the played subtree when possible.
    fn advance(&mut self, kind: MoveKind, mv: u32) {
        if let Some(board) = self.board.as_mut() {
            board.do_move(kind, mv);
            if !self.rebase(mv) {
                self.rebuild_root();
            }
        }
    }

    /// Re-roots the tree on the played child. The child's counters become the
    /// new root aggregates; its rewards are counted for the parent's color,
    /// so they flip to `evaluations - rewards` when the child is to move for
    /// the other side (arrow moves flip the mover, queen moves do not).
    fn rebase(&mut self, mv: u32) -> bool {
        let Some(board) = self.board.as_ref() else {
            return false;
        };
        let mut guard = self
            .shared
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(current) = guard.as_ref() else {
            return false;
        };
        let Some(index) = current.node.moves.iter().position(|&m| m == mv) else {
            return false;
        };
        let Some(child) = current.node.children[index].get() else {
            return false;
        };
        if child.stamp != board.move_count() {
            return false;
        }

        let evaluations = current.node.evaluations[index].load(Ordering::Relaxed);
        let rewards = current.node.rewards[index].load(Ordering::Relaxed);
        let rewards = if current.node.color != child.color {
            evaluations.saturating_sub(rewards)
        } else {
            rewards
        };
        let max_depth = current
            .stats
            .max_depth
            .load(Ordering::Relaxed)
            .saturating_sub(1);

        let child = child.clone();
        *guard = Some(Arc::new(SearchRoot {
            board: board.clone(),
            node: child,
            stats: Arc::new(RootStats::new(evaluations, rewards, max_depth)),
        }));
        true
    }

    fn rebuild_root(&mut self) {
        let Some(board) = self.board.as_ref() else {
            return;
        };
        let node = Arc::new(Node::from_board(
            &mut board.clone(),
            self.root_generator.as_mut(),
        ));
        let mut guard = self
            .shared
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(Arc::new(SearchRoot {
            board: board.clone(),
            node,
            stats: Arc::new(RootStats::new(0, 0, 0)),
        }));
    }

    fn start_workers(&mut self) {
        self.running.store(true, Ordering::Release);
        for _ in 0..self.threads {
            let shared = self.shared.clone();
            let running = self.running.clone();
            let generator = (self.generator_factory)();
            let heuristic = (self.heuristic_factory)();
            let exploration = self.exploration_factor;
            self.workers.push(thread::spawn(move || {
                worker_loop(shared, running, generator, heuristic, exploration);
            }));
        }
    }

    fn stop_workers(&mut self) {
        self.running.store(false, Ordering::Release);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }

    fn current_root(&self) -> Option<Arc<SearchRoot>> {
        self.shared
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Best root move by empirical reward ratio. Falls back to the first
    /// legal move when thinking produced no visits, so a slow start is never
    /// mistaken for a lost position.
    fn best_move(&self) -> Option<u32> {
        let root = self.current_root()?;
        let node = &root.node;
        if node.moves.is_empty() {
            return None;
        }
        let mut best = None;
        let mut best_ratio = f64::NEG_INFINITY;
        for i in 0..node.moves.len() {
            let evaluations = node.evaluations[i].load(Ordering::Relaxed);
            if evaluations == 0 {
                continue;
            }
            let rewards = node.rewards[i].load(Ordering::Relaxed) as f64;
            let ratio = rewards / evaluations as f64;
            if ratio > best_ratio {
                best_ratio = ratio;
                best = Some(node.moves[i]);
            }
        }
        best.or(Some(node.moves[0]))
    }

    /// Lets the workers think for the configured time, then commits the best
    /// queen move and arrow shot. `None` means the engine has no legal turn
    /// and has lost.
    pub fn suggest_and_apply_turn(&mut self) -> Option<Turn> {
        self.board.as_ref()?;
        thread::sleep(self.thinking_time);

        let queen_move = self.best_move()?;
        self.advance(MoveKind::Queen, queen_move);
        let arrow_shot = self.best_move()?;
        self.advance(MoveKind::Arrow, arrow_shot);

        Some(Turn {
            queen_move,
            arrow_shot,
        })
    }

    /// Validates and applies one opponent move. The board is untouched when
    /// the move is not in the legal list.
    pub fn apply_opponent_move(&mut self, mv: u32) -> Result<(), MoveError> {
        let board = self.board.as_ref().ok_or(MoveError::NoBoard)?;
        let kind = board.next_kind();
        let mut legal = Vec::with_capacity(board.max_moves());
        // Generate on a clone: probing must not mutate authoritative state
        // before the move is accepted.
        board.clone().generate_moves(&mut legal);
        if !legal.contains(&mv) {
            return Err(match kind {
                MoveKind::Queen => MoveError::IllegalQueenMove {
                    source: crate::board::decode_queen_source(mv),
                    destination: crate::board::decode_queen_destination(mv),
                },
                MoveKind::Arrow => MoveError::IllegalArrowShot(mv),
            });
        }
        self.advance(kind, mv);
        Ok(())
    }

    /// Validates and applies a whole opponent turn, stage by stage.
    pub fn apply_opponent_turn(&mut self, turn: Turn) -> Result<(), MoveError> {
        self.apply_opponent_move(turn.queen_move)?;
        self.apply_opponent_move(turn.arrow_shot)
    }

    /// Telemetry snapshot of the current root.
    pub fn stats(&self) -> SearchStats {
        let Some(root) = self.current_root() else {
            return SearchStats {
                white_win_ratio: 0.5,
                simulations: 0,
                max_depth: 0,
            };
        };
        let evaluations = root.stats.evaluations.load(Ordering::Relaxed);
        let rewards = root.stats.rewards.load(Ordering::Relaxed);
        let ratio = if evaluations == 0 {
            0.5
        } else {
            (rewards as f64 / evaluations as f64).clamp(0.0, 1.0)
        };
        SearchStats {
            white_win_ratio: match root.node.color {
                Color::White => ratio,
                Color::Black => 1.0 - ratio,
            },
            simulations: evaluations,
            max_depth: root.stats.max_depth.load(Ordering::Relaxed),
        }
    }

    /// Runs a fixed number of iterations synchronously on the calling
    /// thread. With zero worker threads this makes the search deterministic
    /// for a seeded heuristic.
    pub fn search_iterations(&mut self, iterations: usize) {
        let mut generator = (self.generator_factory)();
        let mut heuristic = (self.heuristic_factory)();
        let mut trace = Vec::new();
        for _ in 0..iterations {
            let Some(root) = self.current_root() else {
                return;
            };
            let mut board = root.board.clone();
            search_iteration(
                &root,
                &mut board,
                generator.as_mut(),
                heuristic.as_mut(),
                self.exploration_factor,
                &mut trace,
            );
        }
    }

    #[cfg(test)]
    fn root_child_counters(&self) -> Vec<(u32, u32, u32)> {
        let Some(root) = self.current_root() else {
            return Vec::new();
        };
        let node = &root.node;
        (0..node.moves.len())
            .map(|i| {
                (
                    node.moves[i],
                    node.evaluations[i].load(Ordering::Relaxed),
                    node.rewards[i].load(Ordering::Relaxed),
                )
            })
            .collect()
    }
}

impl Drop for MonteCarloPlayer {
    fn drop(&mut self) {
        self.stop_workers();
    }
}

impl Player for MonteCarloPlayer {
    fn adopt(&mut self, board: Board) {
        MonteCarloPlayer::adopt(self, board);
    }

    fn apply_turn(&mut self, turn: Turn) -> Result<(), MoveError> {
        self.apply_opponent_turn(turn)
    }

    fn suggest_and_apply_turn(&mut self) -> Option<Turn> {
        MonteCarloPlayer::suggest_and_apply_turn(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, decode_queen_destination, decode_queen_source, encode_queen_move};
    use crate::generators::LegalMoveGenerator;
    use crate::geometry::Dimensions;
    use crate::heuristics::{HybridRolloutHeuristic, RolloutHeuristic};
    use crate::players::RandomRolloutPlayer;
    use std::sync::atomic::AtomicU64;

    fn synchronous_player() -> MonteCarloPlayer {
        // No worker threads; tests drive the search with search_iterations.
        let seed = Arc::new(AtomicU64::new(0));
        MonteCarloPlayer::new(
            MonteCarloConfig {
                threads: 0,
                thinking_time: Duration::from_millis(0),
                exploration_factor: std::f64::consts::SQRT_2,
            },
            Arc::new(|| Box::new(LegalMoveGenerator)),
            Arc::new(move || {
                let seed = seed.fetch_add(1, Ordering::Relaxed);
                Box::new(RolloutHeuristic::new(RandomRolloutPlayer::with_seed(
                    LegalMoveGenerator,
                    0xBEEF ^ seed,
                )))
            }),
        )
    }

    #[test]
    fn iterations_accumulate_root_statistics() {
        let mut player = synchronous_player();
        player.adopt(Board::standard());
        assert_eq!(player.stats().simulations, 0);

        player.search_iterations(50);
        let stats = player.stats();
        assert_eq!(stats.simulations, 50);
        assert!(stats.max_depth >= 1);
        assert!((0.0..=1.0).contains(&stats.white_win_ratio));

        player.search_iterations(25);
        assert_eq!(player.stats().simulations, 75);
    }

    #[test]
    fn suggested_turns_are_legal() {
        let mut player = synchronous_player();
        player.adopt(Board::standard());
        player.search_iterations(200);

        let mut reference = Board::standard();
        let turn = player.suggest_and_apply_turn().unwrap();

        let mut legal = Vec::new();
        reference.clone().generate_moves(&mut legal);
        assert!(legal.contains(&turn.queen_move));
        reference.do_move(MoveKind::Queen, turn.queen_move);

        legal.clear();
        reference.clone().generate_moves(&mut legal);
        assert!(legal.contains(&turn.arrow_shot));
    }

    #[test]
    fn rebase_reconstructs_root_statistics_from_child_counters() {
        let mut player = synchronous_player();
        player.adopt(Board::standard());
        player.search_iterations(300);

        let counters = player.root_child_counters();
        let (mv, child_evals, child_rewards) = counters
            .iter()
            .copied()
            .max_by_key(|&(_, e, _)| e)
            .unwrap();
        assert!(child_evals > 0);

        player.apply_opponent_move(mv).unwrap();
        let stats = player.stats();
        assert_eq!(stats.simulations, child_evals);
        // A queen move does not change the side to move, so the reward count
        // carries over without the color flip.
        let root_rewards = player
            .stats()
            .white_win_ratio; // ratio is rewards/evals from White's view
        let expected = child_rewards as f64 / child_evals as f64;
        assert!((root_rewards - expected).abs() < 1e-9);
    }

    #[test]
    fn rebase_flips_rewards_across_an_arrow_move() {
        let mut player = synchronous_player();
        player.adopt(Board::standard());
        player.search_iterations(400);

        // Descend past the queen move first.
        let (queen_move, _, _) = player
            .root_child_counters()
            .into_iter()
            .max_by_key(|&(_, e, _)| e)
            .unwrap();
        player.apply_opponent_move(queen_move).unwrap();
        player.search_iterations(200);

        let counters = player.root_child_counters();
        let Some((arrow, child_evals, child_rewards)) =
            counters.into_iter().filter(|&(_, e, _)| e > 0).max_by_key(|&(_, e, _)| e)
        else {
            panic!("no visited arrow child");
        };

        player.apply_opponent_move(arrow).unwrap();
        let stats = player.stats();
        assert_eq!(stats.simulations, child_evals);
        // The arrow hands the move to Black: rewards counted for White at the
        // old root become evaluations - rewards at the new Black root, and
        // stats() converts back to White's perspective, so the white ratio is
        // unchanged.
        let expected_white = child_rewards as f64 / child_evals as f64;
        assert!((stats.white_win_ratio - expected_white).abs() < 1e-9);
    }

    #[test]
    fn unexplored_move_rebuilds_instead_of_rebasing() {
        let mut player = synchronous_player();
        player.adopt(Board::standard());
        // One iteration expands at most one root child.
        player.search_iterations(1);

        let counters = player.root_child_counters();
        let (mv, _, _) = counters
            .iter()
            .copied()
            .find(|&(_, e, _)| e == 0)
            .expect("an unvisited root move must exist");

        player.apply_opponent_move(mv).unwrap();
        let stats = player.stats();
        assert_eq!(stats.simulations, 0);
        assert_eq!(stats.max_depth, 0);
    }

    #[test]
    fn illegal_opponent_moves_are_rejected_without_side_effects() {
        let mut player = synchronous_player();
        player.adopt(Board::standard());
        player.search_iterations(10);
        let before = player.stats();

        let d = Dimensions::new(10, 10).unwrap();
        // Queen sliding through its own arrow line: (0,3) to (0,8) is blocked
        // by the black queen on (0,6).
        let illegal = encode_queen_move(d.position(0, 3), d.position(0, 8));
        let err = player.apply_opponent_move(illegal).unwrap_err();
        assert_eq!(
            err,
            MoveError::IllegalQueenMove {
                source: d.position(0, 3),
                destination: d.position(0, 8),
            }
        );
        assert_eq!(player.stats().simulations, before.simulations);

        // A legal queen move followed by an arrow on no ray from the queen.
        let legal_queen = encode_queen_move(d.position(3, 0), d.position(3, 5));
        player.apply_opponent_move(legal_queen).unwrap();
        let err = player.apply_opponent_move(d.position(4, 7)).unwrap_err();
        let MoveError::IllegalArrowShot(_) = err else {
            panic!("expected an arrow error, got {err:?}");
        };
    }

    #[test]
    fn terminal_position_signals_loss() {
        let d = Dimensions::new(10, 10).unwrap();
        let mut board = Board::new(d);
        let queen = d.position(0, 0);
        board.place_queen(Color::White, queen);
        board.place_queen(Color::Black, d.position(9, 9));
        board.place_arrow(d.position(1, 0));
        board.place_arrow(d.position(0, 1));
        board.place_arrow(d.position(1, 1));

        let mut player = synchronous_player();
        player.adopt(board);
        player.search_iterations(5);
        assert_eq!(player.suggest_and_apply_turn(), None);
    }

    #[test]
    fn search_finds_the_winning_room_in_a_decided_endgame() {
        let d = Dimensions::new(10, 10).unwrap();
        let mut board = Board::new(d);
        for y in 0..10 {
            for x in 0..10 {
                let white_room = x < 3 && y < 2; // 6 cells
                let black_room = x >= 8 && y >= 8; // 4 cells
                if !white_room && !black_room {
                    board.place_arrow(d.position(x, y));
                }
            }
        }
        board.place_queen(Color::White, d.position(0, 0));
        board.place_queen(Color::Black, d.position(9, 9));

        let mut player = MonteCarloPlayer::new(
            MonteCarloConfig {
                threads: 0,
                thinking_time: Duration::from_millis(0),
                exploration_factor: std::f64::consts::SQRT_2,
            },
            Arc::new(|| Box::new(LegalMoveGenerator)),
            Arc::new(|| {
                Box::new(HybridRolloutHeuristic::new(RandomRolloutPlayer::with_seed(
                    LegalMoveGenerator,
                    99,
                )))
            }),
        );
        player.adopt(board);
        player.search_iterations(200);

        // White owns the larger room; every simulation settles in its favor.
        let stats = player.stats();
        assert!(stats.white_win_ratio > 0.5);
        assert_eq!(stats.simulations, 200);
    }

    #[test]
    fn stats_serialize_for_telemetry() {
        let mut player = synchronous_player();
        player.adopt(Board::standard());
        player.search_iterations(10);
        let stats = player.stats();
        let json = serde_json::to_string(&stats).unwrap();
        let parsed: SearchStats = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, stats);
    }

    #[test]
    fn threaded_search_accumulates_and_stops_cleanly() {
        let mut player = MonteCarloPlayer::new(
            MonteCarloConfig {
                threads: 2,
                thinking_time: Duration::from_millis(120),
                exploration_factor: std::f64::consts::SQRT_2,
            },
            Arc::new(|| Box::new(LegalMoveGenerator)),
            Arc::new(|| {
                Box::new(RolloutHeuristic::new(RandomRolloutPlayer::new(
                    LegalMoveGenerator,
                )))
            }),
        );
        player.adopt(Board::standard());
        thread::sleep(Duration::from_millis(200));
        assert!(player.stats().simulations > 0);

        let turn = player.suggest_and_apply_turn().unwrap();

        let mut reference = Board::standard();
        let mut legal = Vec::new();
        reference.clone().generate_moves(&mut legal);
        assert!(legal.contains(&turn.queen_move));
        reference.do_move(MoveKind::Queen, turn.queen_move);
        legal.clear();
        reference.clone().generate_moves(&mut legal);
        assert!(legal.contains(&turn.arrow_shot));

        // Re-adopting joins the old pool before starting a new one.
        player.adopt(Board::standard());
        let source = decode_queen_source(turn.queen_move);
        let destination = decode_queen_destination(turn.queen_move);
        assert_eq!(
            player.board.as_ref().unwrap().piece_at(source),
            Some(Piece::WhiteQueen)
        );
        assert_eq!(player.board.as_ref().unwrap().piece_at(destination), None);
    }
}
