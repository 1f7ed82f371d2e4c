/// Entities: the continuous vector type, render headings, and the Player
/// (the target every pursuer chases). Pursuers live in `pursuer.rs`.

use std::ops::{Add, Mul, Sub};

use super::cell::Cell;
use super::grid::Grid;
use super::physics;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, k: f32) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }
}

/// Movement/animation direction. Screen coordinates: +y is Down.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Heading {
    Right,
    Down,
    Left,
    Up,
    None,
}

impl Heading {
    /// Horizontal motion wins over vertical, matching sprite-sheet order.
    pub fn from_delta(dx: f32, dy: f32) -> Self {
        if dx > 0.0 {
            Heading::Right
        } else if dx < 0.0 {
            Heading::Left
        } else if dy > 0.0 {
            Heading::Down
        } else if dy < 0.0 {
            Heading::Up
        } else {
            Heading::None
        }
    }

    pub fn unit(self) -> Vec2 {
        match self {
            Heading::Right => Vec2::new(1.0, 0.0),
            Heading::Down => Vec2::new(0.0, 1.0),
            Heading::Left => Vec2::new(-1.0, 0.0),
            Heading::Up => Vec2::new(0.0, -1.0),
            Heading::None => Vec2::ZERO,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Heading::Left | Heading::Right)
    }
}

/// Frame input from the presentation layer.
/// `turn` is edge-triggered: it is queued until the turn fits.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub turn: Option<Heading>,
}

/// Tunables the player needs every tick.
#[derive(Clone, Debug)]
pub struct PlayerTuning {
    pub speed: f32,
    pub radius: f32,
    pub cell_size: f32,
    /// Max distance from the lane centre at which a queued turn snaps in.
    pub turn_tolerance: f32,
    pub death_frames: u32,
    pub death_frame_time: f32,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub heading: Heading,
    pub queued: Option<Heading>,
    pub spawn: Cell,
    pub dead: bool,
    pub death_frame: u32,
    pub death_finished: bool,
    death_timer: f32,
    tuning: PlayerTuning,
}

impl Player {
    pub fn new(spawn: Cell, tuning: PlayerTuning) -> Self {
        Player {
            pos: physics::cell_center(spawn, tuning.cell_size),
            heading: Heading::None,
            queued: None,
            spawn,
            dead: false,
            death_frame: 0,
            death_finished: false,
            death_timer: 0.0,
            tuning,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn radius(&self) -> f32 {
        self.tuning.radius
    }

    pub fn cell(&self, grid: &Grid) -> Cell {
        physics::cell_at(self.pos, self.tuning.cell_size, grid)
    }

    pub fn set_turn(&mut self, heading: Heading) {
        self.queued = Some(heading);
    }

    /// Advance one tick: apply a queued turn if it fits, move, wrap.
    pub fn advance(&mut self, dt: f32, grid: &Grid) {
        if self.dead {
            self.tick_death(dt);
            return;
        }

        let step = self.tuning.speed * dt;
        if let Some(turn) = self.queued {
            self.try_turn(turn, step, grid);
        }

        let next = self.pos + self.heading.unit() * step;
        if self.fits(next, grid) {
            self.pos = next;
        } else if self.heading != Heading::None {
            // Blocked: close the remaining gap to the lane centre so the
            // body comes to rest flush against the wall.
            let center = physics::cell_center(self.cell(grid), self.tuning.cell_size);
            let snapped = if self.heading.is_horizontal() {
                Vec2::new(center.x, self.pos.y)
            } else {
                Vec2::new(self.pos.x, center.y)
            };
            if self.fits(snapped, grid) {
                self.pos = snapped;
            }
        }

        self.pos = physics::wrap_position(self.pos, grid, self.tuning.cell_size);
    }

    /// Apply `turn` if a step in that direction is free, snapping onto the
    /// lane centre when the body is within `turn_tolerance` of it.
    fn try_turn(&mut self, turn: Heading, step: f32, grid: &Grid) {
        let center = physics::cell_center(self.cell(grid), self.tuning.cell_size);
        let aligned = if turn.is_horizontal() {
            Vec2::new(self.pos.x, center.y)
        } else {
            Vec2::new(center.x, self.pos.y)
        };
        if aligned.distance(self.pos) > self.tuning.turn_tolerance {
            return;
        }
        let ahead = aligned + turn.unit() * step.max(1.0);
        if self.fits(aligned, grid) && self.fits(ahead, grid) {
            self.pos = aligned;
            self.heading = turn;
            self.queued = None;
        }
    }

    fn fits(&self, pos: Vec2, grid: &Grid) -> bool {
        physics::can_occupy(grid, pos, self.tuning.radius, self.tuning.cell_size)
    }

    pub fn die(&mut self) {
        self.dead = true;
        self.death_frame = 0;
        self.death_timer = 0.0;
        self.death_finished = false;
    }

    fn tick_death(&mut self, dt: f32) {
        if self.death_finished {
            return;
        }
        self.death_timer += dt;
        if self.death_timer > self.tuning.death_frame_time {
            self.death_timer = 0.0;
            self.death_frame += 1;
            if self.death_frame + 1 >= self.tuning.death_frames {
                self.death_finished = true;
            }
        }
    }

    pub fn respawn(&mut self) {
        self.pos = physics::cell_center(self.spawn, self.tuning.cell_size);
        self.heading = Heading::None;
        self.queued = None;
        self.dead = false;
        self.death_frame = 0;
        self.death_timer = 0.0;
        self.death_finished = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CS: f32 = 20.0;

    fn tuning() -> PlayerTuning {
        PlayerTuning {
            speed: 60.0,
            radius: CS / 2.0,
            cell_size: CS,
            turn_tolerance: CS / 4.0,
            death_frames: 4,
            death_frame_time: 0.25,
        }
    }

    fn plus() -> Grid {
        Grid::parse(&[
            "#####",
            "## ##",
            "#   #",
            "## ##",
            "#####",
        ]).unwrap()
    }

    #[test]
    fn heading_from_delta_prefers_horizontal() {
        assert_eq!(Heading::from_delta(1.0, 1.0), Heading::Right);
        assert_eq!(Heading::from_delta(-0.1, -5.0), Heading::Left);
        assert_eq!(Heading::from_delta(0.0, 2.0), Heading::Down);
        assert_eq!(Heading::from_delta(0.0, -2.0), Heading::Up);
        assert_eq!(Heading::from_delta(0.0, 0.0), Heading::None);
    }

    #[test]
    fn vec_math() {
        let a = Vec2::new(3.0, 4.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!(a - Vec2::new(1.0, 1.0), Vec2::new(2.0, 3.0));
        assert_eq!(a * 2.0, Vec2::new(6.0, 8.0));
        assert_eq!(Vec2::ZERO.distance(a), 5.0);
    }

    #[test]
    fn queued_turn_applies_when_free() {
        let g = plus();
        let mut p = Player::new(Cell::new(2, 2), tuning());
        p.set_turn(Heading::Right);
        p.advance(0.1, &g);
        assert_eq!(p.heading, Heading::Right);
        assert!(p.queued.is_none());
        assert!(p.pos.x > 50.0);
    }

    #[test]
    fn queued_turn_waits_until_it_fits() {
        let g = plus();
        let mut p = Player::new(Cell::new(1, 2), tuning());
        p.set_turn(Heading::Up); // wall above (1,1)
        p.advance(0.1, &g);
        assert_eq!(p.heading, Heading::None);
        assert_eq!(p.queued, Some(Heading::Up));
    }

    #[test]
    fn stops_flush_against_wall() {
        let g = plus();
        let mut p = Player::new(Cell::new(2, 2), tuning());
        p.set_turn(Heading::Right);
        for _ in 0..60 {
            p.advance(1.0 / 30.0, &g);
        }
        assert_eq!(p.cell(&g), Cell::new(3, 2));
        assert!((p.pos.x - 70.0).abs() < 1e-3);
    }

    #[test]
    fn death_animation_finishes() {
        let g = plus();
        let mut p = Player::new(Cell::new(2, 2), tuning());
        p.die();
        for _ in 0..20 {
            p.advance(0.1, &g);
        }
        assert!(p.death_finished);
        p.respawn();
        assert!(!p.dead);
        assert_eq!(p.cell(&g), Cell::new(2, 2));
    }

    #[test]
    fn dead_player_does_not_move() {
        let g = plus();
        let mut p = Player::new(Cell::new(2, 2), tuning());
        p.set_turn(Heading::Left);
        p.die();
        let before = p.pos;
        p.advance(0.5, &g);
        assert_eq!(p.pos, before);
    }
}
