/// Pursuer AI: periodic re-planning over the grid, continuous movement.
///
/// ## State machine
///
///   Patrolling ──(target sighted at re-plan)──────────▶ Pursuing
///   Pursuing   ──(path done, no sighting / no route)──▶ Patrolling
///   any live   ──(no progress for stuck_threshold)────▶ StuckRecovery
///   StuckRecovery ──(next re-plan)────────────────────▶ Patrolling | Pursuing
///   any        ──(die)────────────────────────────────▶ Dead
///   Dead       ──(respawn)────────────────────────────▶ Patrolling
///
/// ## Per-tick order (`advance`)
///
///   1. Dead → animate only.
///   2. Re-plan timer; on expiry pick a goal and run the configured search.
///   3. Follow the current waypoint (each axis validated separately, so the
///      body slides along walls). No waypoint → wander to a random neighbour.
///   4. Stuck detection: time accumulates while the position is unchanged,
///      and resets on any committed move.
///   5. Animation frame.
///
/// Planning failures never surface: an empty path falls back to wandering,
/// a boxed-in body teleports to spawn.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use super::cell::Cell;
use super::entity::{Heading, Vec2};
use super::grid::Grid;
use super::physics;
use super::search::{Path, Strategy};
use super::visibility::{self, SightPolicy};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PursuerState {
    Patrolling,
    Pursuing,
    StuckRecovery,
    Dead,
}

#[derive(Clone, Debug)]
pub struct PursuerConfig {
    pub strategy: Strategy,
    /// false: the target is always treated as seen (pure chase).
    pub use_visibility: bool,
    pub sight_policy: SightPolicy,
    /// Manhattan range in cells beyond which the target is never seen.
    pub sight_range: Option<u32>,
    pub replan_interval: f32,
    pub stuck_threshold: f32,
    pub speed: f32,
    pub radius: f32,
    pub cell_size: f32,
    pub anim_frame_time: f32,
    pub death_frame_time: f32,
    pub death_frames: u32,
}

impl Default for PursuerConfig {
    fn default() -> Self {
        PursuerConfig {
            strategy: Strategy::AStar,
            use_visibility: true,
            sight_policy: SightPolicy::AxisAligned,
            sight_range: None,
            replan_interval: 1.0,
            stuck_threshold: 0.5,
            speed: 180.0,
            radius: 12.0,
            cell_size: 25.0,
            anim_frame_time: 0.05,
            death_frame_time: 0.25,
            death_frames: 2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Pursuer {
    pub id: usize,
    config: PursuerConfig,
    state: PursuerState,
    pos: Vec2,
    /// Sign of the last movement delta per axis (render hint).
    dx: f32,
    dy: f32,
    path: VecDeque<Cell>,
    next_waypoint: Option<Cell>,
    replan_timer: f32,
    stuck_timer: f32,
    last_known_target: Option<Cell>,
    spawn: Cell,
    frame: u32,
    anim_timer: f32,
    replans: u32,
}

impl Pursuer {
    /// Place a pursuer at the spawn cell chosen by `find_spawn_point`.
    pub fn new(id: usize, grid: &Grid, config: PursuerConfig) -> Self {
        let spawn = find_spawn_point(grid);
        Self::at(id, spawn, config)
    }

    /// Place a pursuer at an explicit spawn cell.
    pub fn at(id: usize, spawn: Cell, config: PursuerConfig) -> Self {
        Pursuer {
            id,
            pos: physics::cell_center(spawn, config.cell_size),
            config,
            state: PursuerState::Patrolling,
            dx: 0.0,
            dy: 0.0,
            path: VecDeque::new(),
            next_waypoint: None,
            replan_timer: 0.0,
            stuck_timer: 0.0,
            last_known_target: None,
            spawn,
            frame: 0,
            anim_timer: 0.0,
            replans: 0,
        }
    }

    // ── Read-only view for the frame loop ──

    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn cell(&self, grid: &Grid) -> Cell {
        physics::cell_at(self.pos, self.config.cell_size, grid)
    }

    pub fn state(&self) -> PursuerState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == PursuerState::Dead
    }

    pub fn heading(&self) -> Heading {
        Heading::from_delta(self.dx, self.dy)
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn radius(&self) -> f32 {
        self.config.radius
    }

    pub fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    pub fn spawn(&self) -> Cell {
        self.spawn
    }

    pub fn next_waypoint(&self) -> Option<Cell> {
        self.next_waypoint
    }

    /// Remaining waypoints after `next_waypoint`.
    pub fn path(&self) -> impl Iterator<Item = &Cell> {
        self.path.iter()
    }

    pub fn last_known_target(&self) -> Option<Cell> {
        self.last_known_target
    }

    /// Number of re-plans since creation.
    pub fn replan_count(&self) -> u32 {
        self.replans
    }

    /// Move the body without touching plan or timers (scripted setups).
    pub fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    // ── Lifecycle ──

    pub fn die(&mut self) {
        debug!(pursuer = self.id, "died");
        self.state = PursuerState::Dead;
        self.clear_plan();
        self.replan_timer = 0.0;
        self.stuck_timer = 0.0;
        self.frame = 0;
        self.anim_timer = 0.0;
    }

    pub fn respawn(&mut self) {
        self.pos = physics::cell_center(self.spawn, self.config.cell_size);
        self.state = PursuerState::Patrolling;
        self.clear_plan();
        self.last_known_target = None;
        self.replan_timer = 0.0;
        self.stuck_timer = 0.0;
        self.dx = 0.0;
        self.dy = 0.0;
        self.frame = 0;
        self.anim_timer = 0.0;
    }

    // ── Tick ──

    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f32, target: Vec2, grid: &Grid, rng: &mut R) {
        if self.state == PursuerState::Dead {
            self.tick_death_animation(dt);
            return;
        }

        self.replan_timer += dt;
        if self.replan_timer >= self.config.replan_interval {
            self.replan_timer = 0.0;
            self.replan(target, grid, rng);
        }

        let before = self.pos;
        self.follow_path(dt, grid, rng);
        self.check_if_stuck(dt, before, grid, rng);
        self.tick_animation(dt);
    }

    fn replan<R: Rng + ?Sized>(&mut self, target: Vec2, grid: &Grid, rng: &mut R) {
        self.replans += 1;
        self.clear_plan();

        let start = self.cell(grid);
        let target_cell = physics::cell_at(target, self.config.cell_size, grid);

        let goal = if self.sees(grid, start, target_cell) {
            self.last_known_target = Some(target_cell);
            self.set_state(PursuerState::Pursuing);
            Some(target_cell)
        } else if self.state == PursuerState::Pursuing {
            self.last_known_target
        } else {
            self.set_state(PursuerState::Patrolling);
            grid.walkable_cells().choose(rng).copied()
        };

        let Some(goal) = goal else {
            self.set_random_adjacent_target(grid, rng);
            return;
        };

        if goal == start {
            // Already there: settle on the cell centre.
            self.next_waypoint = Some(start);
            return;
        }

        let path: Path = self.config.strategy.find(start, goal, grid);
        debug!(
            pursuer = self.id,
            strategy = self.config.strategy.label(),
            ?start, ?goal, len = path.len(),
            "re-planned"
        );

        if path.is_empty() {
            self.set_state(PursuerState::Patrolling);
            self.set_random_adjacent_target(grid, rng);
        } else {
            self.path = path.into();
            self.next_waypoint = self.path.pop_front();
            self.stuck_timer = 0.0;
        }
    }

    fn sees(&self, grid: &Grid, from: Cell, to: Cell) -> bool {
        if !self.config.use_visibility {
            return true;
        }
        if let Some(range) = self.config.sight_range {
            if from.manhattan(to) > range {
                return false;
            }
        }
        visibility::can_see(grid, from, to, self.config.sight_policy)
    }

    fn follow_path<R: Rng + ?Sized>(&mut self, dt: f32, grid: &Grid, rng: &mut R) {
        if self.next_waypoint.is_none() {
            self.next_waypoint = self.path.pop_front();
        }
        if self.next_waypoint.is_none() {
            if self.state == PursuerState::Pursuing {
                // Reached the last-known cell without a fresh sighting.
                self.set_state(PursuerState::Patrolling);
            }
            self.set_random_adjacent_target(grid, rng);
        }
        let Some(waypoint) = self.next_waypoint else { return };

        let goal = physics::cell_center(waypoint, self.config.cell_size);
        let delta = goal - self.pos;
        let distance = delta.length();
        let step = self.config.speed * dt;

        if distance < step {
            self.pos = goal;
            self.next_waypoint = self.path.pop_front();
        } else if distance > 0.0 {
            let moved = delta * (step / distance);
            let try_x = Vec2::new(self.pos.x + moved.x, self.pos.y);
            if self.fits(try_x, grid) {
                self.pos.x = try_x.x;
            }
            let try_y = Vec2::new(self.pos.x, self.pos.y + moved.y);
            if self.fits(try_y, grid) {
                self.pos.y = try_y.y;
            }
        }

        self.dx = axis_sign(delta.x);
        self.dy = axis_sign(delta.y);
    }

    fn fits(&self, pos: Vec2, grid: &Grid) -> bool {
        physics::can_occupy(grid, pos, self.config.radius, self.config.cell_size)
    }

    fn check_if_stuck<R: Rng + ?Sized>(&mut self, dt: f32, before: Vec2, grid: &Grid, rng: &mut R) {
        if self.pos != before {
            self.stuck_timer = 0.0;
            return;
        }
        self.stuck_timer += dt;
        if self.stuck_timer >= self.config.stuck_threshold {
            self.stuck_timer = 0.0;
            self.recover(grid, rng);
        }
    }

    /// Drop the plan and head for a random neighbour; if there is none,
    /// teleport home.
    fn recover<R: Rng + ?Sized>(&mut self, grid: &Grid, rng: &mut R) {
        self.set_state(PursuerState::StuckRecovery);
        self.clear_plan();
        if !self.set_random_adjacent_target(grid, rng) {
            warn!(pursuer = self.id, cell = ?self.cell(grid), "boxed in, teleporting to spawn");
            self.pos = physics::cell_center(self.spawn, self.config.cell_size);
        }
    }

    /// Pick a random walkable 4-neighbour as the next waypoint.
    /// Returns false when every neighbour is a wall.
    fn set_random_adjacent_target<R: Rng + ?Sized>(&mut self, grid: &Grid, rng: &mut R) -> bool {
        let here = self.cell(grid);
        let options: Vec<Cell> = grid.neighbors(here).collect();
        match options.choose(rng) {
            Some(&cell) => {
                self.next_waypoint = Some(cell);
                true
            }
            None => false,
        }
    }

    fn clear_plan(&mut self) {
        self.path.clear();
        self.next_waypoint = None;
    }

    fn set_state(&mut self, next: PursuerState) {
        if self.state != next {
            debug!(pursuer = self.id, from = ?self.state, to = ?next, "state change");
            self.state = next;
        }
    }

    fn tick_animation(&mut self, dt: f32) {
        self.anim_timer += dt;
        if self.anim_timer > self.config.anim_frame_time {
            self.anim_timer = 0.0;
            self.frame = (self.frame + 1) % 2;
        }
    }

    fn tick_death_animation(&mut self, dt: f32) {
        self.anim_timer += dt;
        if self.anim_timer > self.config.death_frame_time {
            self.anim_timer = 0.0;
            self.frame = (self.frame + 1) % self.config.death_frames.max(1);
        }
    }
}

fn axis_sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Nearest open cell to the grid centre, searched in growing square
/// rings. Deterministic for a given grid; falls back to the centre.
pub fn find_spawn_point(grid: &Grid) -> Cell {
    let w = grid.width() as i32;
    let h = grid.height() as i32;
    let (cx, cy) = (w / 2, h / 2);
    let max_distance = cx.max(w - cx).max(cy).max(h - cy);

    for d in 0..=max_distance {
        for x in (cx - d)..=(cx + d) {
            for y in (cy - d)..=(cy + d) {
                let on_ring = (x - cx).abs() == d || (y - cy).abs() == d;
                let cell = Cell::new(x, y);
                if on_ring && grid.is_walkable(cell) {
                    return cell;
                }
            }
        }
    }
    Cell::new(cx, cy)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
