/// Line-of-sight between cells. Pure functions of the grid snapshot.
///
/// Two policies:
///   - `AxisAligned`: same row or column, no wall on the segment.
///   - `Bresenham`  : any two cells, no wall on the rasterized line.
///
/// Both are symmetric: `can_see(a, b) == can_see(b, a)`. Bresenham is not
/// symmetric on its own for every slope, so the line is always traced from
/// the smaller endpoint.

use serde::Deserialize;

use super::cell::Cell;
use super::grid::Grid;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SightPolicy {
    AxisAligned,
    Bresenham,
}

impl Default for SightPolicy {
    fn default() -> Self {
        SightPolicy::AxisAligned
    }
}

pub fn can_see(grid: &Grid, from: Cell, to: Cell, policy: SightPolicy) -> bool {
    if !grid.in_bounds(from) || !grid.in_bounds(to) {
        return false;
    }
    match policy {
        SightPolicy::AxisAligned => axis_aligned(grid, from, to),
        SightPolicy::Bresenham => trace_line(from, to).iter().all(|&c| grid.is_walkable(c)),
    }
}

fn axis_aligned(grid: &Grid, from: Cell, to: Cell) -> bool {
    if from.row == to.row {
        let (lo, hi) = (from.col.min(to.col), from.col.max(to.col));
        (lo..=hi).all(|col| grid.is_walkable(Cell::new(col, from.row)))
    } else if from.col == to.col {
        let (lo, hi) = (from.row.min(to.row), from.row.max(to.row));
        (lo..=hi).all(|row| grid.is_walkable(Cell::new(from.col, row)))
    } else {
        false
    }
}

/// Integer Bresenham rasterization, endpoints included.
/// Output order runs from the smaller endpoint to the larger.
pub fn trace_line(a: Cell, b: Cell) -> Vec<Cell> {
    let (from, to) = if a <= b { (a, b) } else { (b, a) };

    let dx = (to.col - from.col).abs();
    let dy = -(to.row - from.row).abs();
    let sx = if from.col < to.col { 1 } else { -1 };
    let sy = if from.row < to.row { 1 } else { -1 };
    let mut err = dx + dy;

    let mut out = Vec::with_capacity((dx - dy) as usize + 1);
    let (mut x, mut y) = (from.col, from.row);
    loop {
        out.push(Cell::new(x, y));
        if x == to.col && y == to.row {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    out
}
