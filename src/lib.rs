/// Maze-chase core: maze generation, grid search, line of sight,
/// pursuer AI and the fixed-timestep session that ties them together.
///
/// The terminal frontend lives in the binary (`main.rs` + `ui/`).

pub mod config;
pub mod domain;
pub mod sim;
