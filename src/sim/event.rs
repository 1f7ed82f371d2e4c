/// Events emitted during a simulation step.
/// The presentation layer consumes these for messages and effects.

use crate::domain::cell::Cell;
use crate::domain::pursuer::PursuerState;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    CountdownFinished,
    PickupConsumed { cell: Cell },
    PursuerStateChanged { id: usize, from: PursuerState, to: PursuerState },
    PlayerKilled { by: usize },
    Respawned,
    GameOver,
    Won,
}
