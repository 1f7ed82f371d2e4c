/// Input state tracker.
///
/// Movement is edge-triggered: a press queues a turn on the player, which
/// keeps moving in its current heading until the turn fits. So only fresh
/// presses matter; Release events are ignored.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use mazechase::domain::entity::{FrameInput, Heading};

const LEFT: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('h')];
const RIGHT: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('l')];
const UP: [KeyCode; 3] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('k')];
const DOWN: [KeyCode; 3] = [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('j')];

pub struct InputState {
    /// Keys pressed during the most recent `drain_events()` call, in order.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the
    /// simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                self.raw_events.push(key);
                self.fresh_presses.push(normalize(key.code));
            }
        }
    }

    /// Was this key freshly pressed this frame?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    pub fn quit_requested(&self) -> bool {
        self.ctrl_c_pressed() || self.any_pressed(&[KeyCode::Esc, KeyCode::Char('q')])
    }

    /// The last direction pressed this frame wins.
    pub fn frame_input(&self) -> FrameInput {
        let turn = self.fresh_presses.iter().rev().find_map(|&code| heading_for(code));
        FrameInput { turn }
    }
}

fn heading_for(code: KeyCode) -> Option<Heading> {
    if LEFT.contains(&code) {
        Some(Heading::Left)
    } else if RIGHT.contains(&code) {
        Some(Heading::Right)
    } else if UP.contains(&code) {
        Some(Heading::Up)
    } else if DOWN.contains(&code) {
        Some(Heading::Down)
    } else {
        None
    }
}

/// Fold upper-case letters so Shift or Caps Lock doesn't matter.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
