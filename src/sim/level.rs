/// Session construction: maze, spawns, entities.
///
/// ## Spawns
///
///   Player   : centre column, `PLAYER_SPAWN_ROWS_FROM_BOTTOM` rows up from
///               the bottom edge, searching upward for an open cell.
///   Pursuers : nearest open cell to the board centre (`find_spawn_point`).
///
/// Both are recomputed only here; respawning reuses the stored cells.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::config::{GameConfig, GeneralConfig};
use crate::domain::cell::Cell;
use crate::domain::entity::Player;
use crate::domain::grid::{Grid, GridError};
use crate::domain::maze::{self, CARVE_ORIGIN};
use crate::domain::pursuer::{self, Pursuer};
use crate::sim::world::{Phase, WorldState};

pub const PLAYER_SPAWN_ROWS_FROM_BOTTOM: usize = 4;

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Session RNG: seeded when `general.seed` is set, entropy otherwise.
pub fn session_rng(general: &GeneralConfig) -> StdRng {
    match general.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Generate a maze and place every entity. Starts in `Phase::Countdown`
/// (or `Playing` when the countdown is disabled).
pub fn new_session(config: &GameConfig, mut rng: StdRng) -> Result<WorldState, GridError> {
    let mut grid = maze::generate(config.maze.width, config.maze.height, config.maze.difficulty, &mut rng)?;
    maze::populate_pickups(&mut grid);
    Ok(session_on_grid(config, grid, rng))
}

/// Build a session on an existing grid (hand-made boards, tests).
pub fn session_on_grid(config: &GameConfig, grid: Grid, rng: StdRng) -> WorldState {
    let player_spawn = find_player_spawn(&grid);
    let pursuer_spawn = pursuer::find_spawn_point(&grid);

    let player = Player::new(player_spawn, config.player_tuning());
    let pursuers: Vec<Pursuer> = (0..config.pursuers.count)
        .map(|i| Pursuer::at(i, pursuer_spawn, config.pursuer_config(i)))
        .collect();

    let pickups = grid.pickup_count();
    info!(
        width = grid.width(), height = grid.height(), pickups,
        ?player_spawn, ?pursuer_spawn, pursuers = pursuers.len(),
        "session ready"
    );

    let countdown = config.timing.countdown_secs.max(0.0);
    WorldState {
        grid,
        cell_size: config.maze.cell_size,
        player,
        pursuers,
        pickups_total: pickups,
        pickups_remaining: pickups,
        score: 0,
        lives: config.player.lives,
        phase: if countdown > 0.0 { Phase::Countdown } else { Phase::Playing },
        countdown,
        tick: 0,
        paused: false,
        message: String::new(),
        message_timer: 0.0,
        rng,
    }
}

/// Player spawn cell: centre column, searching upward from the configured
/// row. Falls back to the carve origin.
pub fn find_player_spawn(grid: &Grid) -> Cell {
    let col = (grid.width() / 2) as i32;
    let start_row = grid.height().saturating_sub(PLAYER_SPAWN_ROWS_FROM_BOTTOM) as i32;
    (0..=start_row)
        .rev()
        .map(|row| Cell::new(col, row))
        .find(|&c| grid.is_walkable(c))
        .unwrap_or(CARVE_ORIGIN)
}

/// Put the player and every pursuer back on their spawn cells.
/// Board state (pickups, score) is preserved.
pub fn respawn_all(world: &mut WorldState) {
    world.player.respawn();
    for p in &mut world.pursuers {
        p.respawn();
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
