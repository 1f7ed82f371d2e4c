/// Cell codes and grid coordinates.
/// Cell semantics are queried via methods, not stored as flags,
/// so walkability rules are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellCode {
    Wall,
    Empty,
    Pickup, // Consumed by the player, becomes Empty
}

impl CellCode {
    pub fn is_wall(self) -> bool {
        matches!(self, CellCode::Wall)
    }

    /// Can an agent stand in (and path through) this cell?
    pub fn is_walkable(self) -> bool {
        !self.is_wall()
    }

    pub fn is_pickup(self) -> bool {
        matches!(self, CellCode::Pickup)
    }

    /// Diagram character used by `Grid::parse` and debug dumps.
    pub fn glyph(self) -> char {
        match self {
            CellCode::Wall => '#',
            CellCode::Empty => ' ',
            CellCode::Pickup => '.',
        }
    }
}

/// Integer grid coordinate. Signed so that out-of-bounds neighbours
/// and goals can be represented and rejected by the grid.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Cell { col, row }
    }

    pub fn offset(self, dc: i32, dr: i32) -> Self {
        Cell { col: self.col + dc, row: self.row + dr }
    }

    pub fn manhattan(self, other: Cell) -> u32 {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row)
    }

    /// 4-adjacent (no diagonals, not the same cell).
    pub fn is_adjacent(self, other: Cell) -> bool {
        self.manhattan(other) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walkability_by_code() {
        assert!(!CellCode::Wall.is_walkable());
        assert!(CellCode::Empty.is_walkable());
        assert!(CellCode::Pickup.is_walkable());
        assert!(CellCode::Pickup.is_pickup());
    }

    #[test]
    fn manhattan_and_adjacency() {
        let a = Cell::new(1, 1);
        assert_eq!(a.manhattan(Cell::new(5, 5)), 8);
        assert!(a.is_adjacent(Cell::new(2, 1)));
        assert!(a.is_adjacent(Cell::new(1, 0)));
        assert!(!a.is_adjacent(Cell::new(2, 2)));
        assert!(!a.is_adjacent(a));
    }

    #[test]
    fn ordering_is_column_major() {
        assert!(Cell::new(0, 9) < Cell::new(1, 0));
        assert!(Cell::new(2, 1) < Cell::new(2, 3));
    }
}
