/// WorldState: the complete snapshot of a running session.
///
/// ## Ownership
///
/// The session owns the only `Grid`. Pursuers, the player and the
/// renderer borrow it; the step function is the only writer (pickup
/// consumption), and it writes before any pursuer reads in the same tick.
///
/// ## Randomness
///
/// One `StdRng` per session, threaded by `&mut` into maze generation and
/// every pursuer. A fixed seed replays the same maze and the same AI
/// choices for the same input sequence.

use rand::rngs::StdRng;

use crate::domain::entity::Player;
use crate::domain::grid::Grid;
use crate::domain::pursuer::Pursuer;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Board visible, nothing moves until the timer runs out.
    Countdown,
    Playing,
    /// Player death animation; pursuers play theirs too.
    Dying,
    GameOver,
    Won,
}

pub struct WorldState {
    // ── Board ──
    pub grid: Grid,
    pub cell_size: f32,

    // ── Entities ──
    pub player: Player,
    pub pursuers: Vec<Pursuer>,

    // ── Game tracking ──
    pub pickups_total: usize,
    pub pickups_remaining: usize,
    pub score: u32,
    pub lives: u32,

    // ── Meta ──
    pub phase: Phase,
    /// Seconds left in `Phase::Countdown`.
    pub countdown: f32,
    pub tick: u64,
    pub paused: bool,

    // ── UI ──
    pub message: String,
    pub message_timer: f32,

    pub rng: StdRng,
}

impl WorldState {
    pub fn set_message(&mut self, msg: &str, seconds: f32) {
        self.message = msg.to_string();
        self.message_timer = seconds;
    }

    pub fn tick_message(&mut self, dt: f32) {
        if self.message_timer > 0.0 {
            self.message_timer -= dt;
            if self.message_timer <= 0.0 {
                self.message_timer = 0.0;
                self.message.clear();
            }
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver | Phase::Won)
    }
}
