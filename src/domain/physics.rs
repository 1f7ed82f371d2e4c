/// Occupancy queries: single source of truth for continuous ↔ grid.
///
/// ## Coordinates
///
/// Continuous positions are world units; a cell spans `cell_size` units.
///   `cell = floor(position / cell_size)`
/// Lookups wrap toroidally so an agent half-way through a tunnel edge
/// samples the cells on the opposite side of the board.
///
/// ## Body Sampling
///
/// An agent is an axis-aligned box of half-extent `radius`. `can_occupy`
/// samples the four corners, inset by `CORNER_INSET`, and rejects the
/// position if any corner lands in a wall. Sampling corners rather than the
/// center keeps a body from clipping a wall corner it is not centred on.

use super::cell::Cell;
use super::entity::Vec2;
use super::grid::Grid;

/// Corners are pulled in by this many units so that a body exactly one
/// cell wide fits a one-cell corridor.
pub const CORNER_INSET: f32 = 1.0;

/// Cell under a continuous position, with toroidal wrap.
#[inline]
pub fn cell_at(pos: Vec2, cell_size: f32, grid: &Grid) -> Cell {
    let w = grid.width() as f32 * cell_size;
    let h = grid.height() as f32 * cell_size;
    let col = (pos.x.rem_euclid(w) / cell_size).floor() as i32;
    let row = (pos.y.rem_euclid(h) / cell_size).floor() as i32;
    // rem_euclid can round up to exactly w on tiny negative inputs
    Cell::new(
        col.clamp(0, grid.width() as i32 - 1),
        row.clamp(0, grid.height() as i32 - 1),
    )
}

/// Continuous center of a cell.
#[inline]
pub fn cell_center(cell: Cell, cell_size: f32) -> Vec2 {
    Vec2::new(
        (cell.col as f32 + 0.5) * cell_size,
        (cell.row as f32 + 0.5) * cell_size,
    )
}

/// Can a body of half-extent `radius` stand at `pos`?
pub fn can_occupy(grid: &Grid, pos: Vec2, radius: f32, cell_size: f32) -> bool {
    let r = (radius - CORNER_INSET).max(0.0);
    for dx in [-r, r] {
        for dy in [-r, r] {
            let corner = Vec2::new(pos.x + dx, pos.y + dy);
            if grid.get(cell_at(corner, cell_size, grid)).is_wall() {
                return false;
            }
        }
    }
    true
}

/// Tunnel wrap: once a body is more than half a cell past a board edge,
/// it re-enters from the opposite side.
pub fn wrap_position(pos: Vec2, grid: &Grid, cell_size: f32) -> Vec2 {
    let w = grid.width() as f32 * cell_size;
    let h = grid.height() as f32 * cell_size;
    let half = cell_size / 2.0;
    let mut out = pos;
    if out.x < -half {
        out.x += w;
    } else if out.x > w - half {
        out.x -= w;
    }
    if out.y < -half {
        out.y += h;
    } else if out.y > h - half {
        out.y -= h;
    }
    out
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
