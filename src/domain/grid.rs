/// The maze occupancy grid.
///
/// ## Ownership
///
/// One `Grid` per session, owned by `WorldState` and lent out by shared
/// reference to every consumer (pathfinding, visibility, occupancy).
/// The only runtime mutation is pickup consumption (`Pickup → Empty`),
/// done once per tick by the step function before pursuers read it.
///
/// ## Layout
///
/// Row-major: `cells[row][col]`. Rows are validated rectangular at
/// construction; a `Grid` that exists is always well-formed.

use thiserror::Error;

use super::cell::{Cell, CellCode};

/// 4-directional neighbour order shared by every search strategy.
/// Fixed so that searches are deterministic for a given grid.
pub const DIRS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("grid has zero dimensions ({width}x{height})")]
    ZeroSized { width: usize, height: usize },

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },

    #[error("maze must be at least 3x3 to have an interior, got {width}x{height}")]
    TooSmall { width: usize, height: usize },

    #[error("unknown cell character {ch:?} at ({col}, {row})")]
    UnknownGlyph { ch: char, col: usize, row: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<CellCode>>,
    width: usize,
    height: usize,
}

impl Grid {
    /// A `width × height` grid with every cell set to `code`.
    pub fn filled(width: usize, height: usize, code: CellCode) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSized { width, height });
        }
        Ok(Grid { cells: vec![vec![code; width]; height], width, height })
    }

    /// Build from explicit rows. Rejects empty and ragged input.
    pub fn from_rows(rows: Vec<Vec<CellCode>>) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSized { width, height });
        }
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(GridError::Ragged { row, expected: width, found: r.len() });
        }
        Ok(Grid { cells: rows, width, height })
    }

    /// Build from a string diagram.
    /// Legend: `'#'` = Wall, `'.'` = Pickup, `' '` = Empty.
    pub fn parse(rows: &[&str]) -> Result<Self, GridError> {
        let mut parsed = Vec::with_capacity(rows.len());
        for (row, line) in rows.iter().enumerate() {
            let mut out = Vec::with_capacity(line.len());
            for (col, ch) in line.chars().enumerate() {
                out.push(match ch {
                    '#' => CellCode::Wall,
                    '.' => CellCode::Pickup,
                    ' ' => CellCode::Empty,
                    _ => return Err(GridError::UnknownGlyph { ch, col, row }),
                });
            }
            parsed.push(out);
        }
        Self::from_rows(parsed)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.col >= 0
            && cell.row >= 0
            && (cell.col as usize) < self.width
            && (cell.row as usize) < self.height
    }

    /// Cell code at `cell`. Out of bounds reads as Wall.
    #[inline]
    pub fn get(&self, cell: Cell) -> CellCode {
        if self.in_bounds(cell) {
            self.cells[cell.row as usize][cell.col as usize]
        } else {
            CellCode::Wall
        }
    }

    /// Overwrite a cell. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, cell: Cell, code: CellCode) {
        if self.in_bounds(cell) {
            self.cells[cell.row as usize][cell.col as usize] = code;
        }
    }

    #[inline]
    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.get(cell).is_walkable()
    }

    /// Walkable 4-neighbours of `cell`, in `DIRS` order.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        DIRS.iter()
            .map(move |&(dc, dr)| cell.offset(dc, dr))
            .filter(move |&n| self.is_walkable(n))
    }

    /// Turn a pickup into empty floor. Returns true if there was one.
    pub fn consume_pickup(&mut self, cell: Cell) -> bool {
        if self.get(cell).is_pickup() {
            self.set(cell, CellCode::Empty);
            true
        } else {
            false
        }
    }

    pub fn pickup_count(&self) -> usize {
        self.cells.iter()
            .flat_map(|row| row.iter())
            .filter(|c| c.is_pickup())
            .count()
    }

    /// Every non-wall cell, row by row.
    pub fn walkable_cells(&self) -> Vec<Cell> {
        let mut out = Vec::new();
        for (row, line) in self.cells.iter().enumerate() {
            for (col, code) in line.iter().enumerate() {
                if code.is_walkable() {
                    out.push(Cell::new(col as i32, row as i32));
                }
            }
        }
        out
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.cells {
            let s: String = line.iter().map(|c| c.glyph()).collect();
            writeln!(f, "{s}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_diagram() {
        let g = Grid::parse(&[
            "###",
            "#.#",
            "# #",
            "###",
        ]).unwrap();
        assert_eq!(g.width(), 3);
        assert_eq!(g.height(), 4);
        assert_eq!(g.get(Cell::new(1, 1)), CellCode::Pickup);
        assert_eq!(g.get(Cell::new(1, 2)), CellCode::Empty);
        assert_eq!(g.get(Cell::new(0, 0)), CellCode::Wall);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = Grid::parse(&["###", "##"]).unwrap_err();
        assert_eq!(err, GridError::Ragged { row: 1, expected: 3, found: 2 });
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(Grid::from_rows(vec![]), Err(GridError::ZeroSized { .. })));
        assert!(matches!(Grid::filled(0, 4, CellCode::Wall), Err(GridError::ZeroSized { .. })));
    }

    #[test]
    fn unknown_glyph_rejected() {
        assert!(matches!(
            Grid::parse(&["#x#"]),
            Err(GridError::UnknownGlyph { ch: 'x', col: 1, row: 0 })
        ));
    }

    #[test]
    fn out_of_bounds_reads_as_wall() {
        let g = Grid::filled(2, 2, CellCode::Empty).unwrap();
        assert_eq!(g.get(Cell::new(-1, 0)), CellCode::Wall);
        assert_eq!(g.get(Cell::new(2, 0)), CellCode::Wall);
        assert!(!g.is_walkable(Cell::new(0, 5)));
    }

    #[test]
    fn neighbors_skip_walls_and_edges() {
        let g = Grid::parse(&[
            "   ",
            " ##",
        ]).unwrap();
        let n: Vec<Cell> = g.neighbors(Cell::new(0, 0)).collect();
        assert_eq!(n, vec![Cell::new(1, 0), Cell::new(0, 1)]);
        let n: Vec<Cell> = g.neighbors(Cell::new(1, 0)).collect();
        assert_eq!(n, vec![Cell::new(2, 0), Cell::new(0, 0)]);
    }

    #[test]
    fn pickup_consumption() {
        let mut g = Grid::parse(&["#..#"]).unwrap();
        assert_eq!(g.pickup_count(), 2);
        assert!(g.consume_pickup(Cell::new(1, 0)));
        assert!(!g.consume_pickup(Cell::new(1, 0)));
        assert!(!g.consume_pickup(Cell::new(0, 0)));
        assert_eq!(g.pickup_count(), 1);
        assert_eq!(g.get(Cell::new(1, 0)), CellCode::Empty);
    }

    #[test]
    fn display_round_trips_diagram() {
        let rows = ["###", "#.#", "###"];
        let g = Grid::parse(&rows).unwrap();
        assert_eq!(g.to_string(), "###\n#.#\n###\n");
    }
}
