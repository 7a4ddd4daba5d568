pub mod arena;
pub mod board;
pub mod chambers;
pub mod generators;
pub mod geometry;
pub mod heuristics;
pub mod mcts;
pub mod players;

pub use arena::*;
pub use board::*;
pub use chambers::*;
pub use generators::*;
pub use geometry::*;
pub use heuristics::*;
pub use mcts::*;
pub use players::*;
