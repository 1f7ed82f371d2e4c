/// Procedural maze generation.
///
/// Two passes:
///   1. **Carve**: recursive backtracker on the step-2 lattice. Odd
///      coordinates are rooms, even coordinates are separators. Produces a
///      perfect maze (spanning tree, no loops) rooted at `CARVE_ORIGIN`.
///   2. **Loosen**: every interior wall is independently knocked out with
///      a difficulty-dependent probability, adding loops.
///
/// The border (row/col 0 and max) is never carved.
///
/// The backtracker keeps its frames on an explicit heap stack, so depth is
/// bounded by memory (≈ width×height/4 frames), not the call stack.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use super::cell::{Cell, CellCode};
use super::grid::{Grid, GridError};

/// Fixed interior cell where carving starts.
pub const CARVE_ORIGIN: Cell = Cell::new(1, 1);

const LATTICE_STEPS: [(i32, i32); 4] = [(-2, 0), (2, 0), (0, -2), (0, 2)];

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "Easy", alias = "EASY")]
    Easy,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Hard", alias = "HARD")]
    Hard,
}

impl Difficulty {
    /// Chance that an interior wall is removed in the loosen pass.
    /// More removal = more loops = easier evasion.
    pub fn wall_removal_chance(self) -> f64 {
        match self {
            Difficulty::Easy => 0.4,
            Difficulty::Medium => 0.25,
            Difficulty::Hard => 0.1,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

/// Generate a maze: carve, then loosen by difficulty.
pub fn generate<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<Grid, GridError> {
    let mut grid = carve(width, height, rng)?;
    loosen(&mut grid, difficulty.wall_removal_chance(), rng);
    Ok(grid)
}

/// Pass 1: perfect maze. Every open cell is reachable from `CARVE_ORIGIN`.
pub fn carve<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Result<Grid, GridError> {
    let mut grid = Grid::filled(width, height, CellCode::Wall)?;
    if width < 3 || height < 3 {
        return Err(GridError::TooSmall { width, height });
    }

    grid.set(CARVE_ORIGIN, CellCode::Empty);

    struct Frame {
        cell: Cell,
        pending: Vec<Cell>,
    }

    let mut stack = vec![Frame {
        cell: CARVE_ORIGIN,
        pending: shuffled_candidates(&grid, CARVE_ORIGIN, rng),
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(next) = frame.pending.pop() else {
            stack.pop();
            continue;
        };
        let here = frame.cell;

        // Shuffled at push time; a sibling branch may have carved it since.
        if !grid.get(next).is_wall() {
            continue;
        }

        let between = Cell::new((here.col + next.col) / 2, (here.row + next.row) / 2);
        grid.set(next, CellCode::Empty);
        grid.set(between, CellCode::Empty);

        let pending = shuffled_candidates(&grid, next, rng);
        stack.push(Frame { cell: next, pending });
    }

    Ok(grid)
}

/// Pass 2: knock out interior walls with probability `chance`.
/// Never adds walls and never touches the border.
pub fn loosen<R: Rng + ?Sized>(grid: &mut Grid, chance: f64, rng: &mut R) {
    let chance = chance.clamp(0.0, 1.0);
    for row in 1..grid.height().saturating_sub(1) {
        for col in 1..grid.width().saturating_sub(1) {
            let cell = Cell::new(col as i32, row as i32);
            if grid.get(cell).is_wall() && rng.gen_bool(chance) {
                grid.set(cell, CellCode::Empty);
            }
        }
    }
}

/// Fill every empty cell with a pickup.
pub fn populate_pickups(grid: &mut Grid) {
    for cell in grid.walkable_cells() {
        if grid.get(cell) == CellCode::Empty {
            grid.set(cell, CellCode::Pickup);
        }
    }
}

/// Step-2 lattice neighbours that are still walls and stay off the border.
fn shuffled_candidates<R: Rng + ?Sized>(grid: &Grid, at: Cell, rng: &mut R) -> Vec<Cell> {
    let max_col = grid.width() as i32 - 1;
    let max_row = grid.height() as i32 - 1;
    let mut out: Vec<Cell> = LATTICE_STEPS.iter()
        .map(|&(dc, dr)| at.offset(dc, dr))
        .filter(|c| c.col >= 1 && c.row >= 1 && c.col < max_col && c.row < max_row)
        .filter(|&c| grid.get(c).is_wall())
        .collect();
    out.shuffle(rng);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashSet, VecDeque};

    fn reachable_from(grid: &Grid, origin: Cell) -> HashSet<Cell> {
        let mut seen = HashSet::from([origin]);
        let mut queue = VecDeque::from([origin]);
        while let Some(c) = queue.pop_front() {
            for n in grid.neighbors(c) {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen
    }

    fn is_border(grid: &Grid, c: Cell) -> bool {
        c.col == 0 || c.row == 0
            || c.col as usize == grid.width() - 1
            || c.row as usize == grid.height() - 1
    }

    #[test]
    fn carve_reaches_every_open_cell() {
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let g = carve(27, 29, &mut rng).unwrap();
            let open: HashSet<Cell> = g.walkable_cells().into_iter().collect();
            assert_eq!(reachable_from(&g, CARVE_ORIGIN), open, "seed {seed}");
        }
    }

    #[test]
    fn carve_visits_every_room() {
        let mut rng = StdRng::seed_from_u64(7);
        let g = carve(21, 15, &mut rng).unwrap();
        for row in (1..14).step_by(2) {
            for col in (1..20).step_by(2) {
                assert!(g.is_walkable(Cell::new(col, row)), "room ({col},{row}) not carved");
            }
        }
    }

    #[test]
    fn carve_is_a_tree() {
        // A spanning tree over V open cells has exactly V-1 edges.
        let mut rng = StdRng::seed_from_u64(3);
        let g = carve(17, 13, &mut rng).unwrap();
        let open = g.walkable_cells();
        let edges: usize = open.iter()
            .map(|&c| g.neighbors(c).filter(|&n| n > c).count())
            .sum();
        assert_eq!(edges, open.len() - 1);
    }

    #[test]
    fn border_never_carved() {
        for seed in 0..4 {
            let mut rng = StdRng::seed_from_u64(seed);
            // Even dimensions put the last lattice room next to the border.
            let g = generate(28, 30, Difficulty::Easy, &mut rng).unwrap();
            for c in g.walkable_cells() {
                assert!(!is_border(&g, c), "border cell {c:?} open (seed {seed})");
            }
        }
    }

    #[test]
    fn loosen_never_adds_walls() {
        let mut rng = StdRng::seed_from_u64(11);
        let carved = carve(27, 29, &mut rng).unwrap();
        let mut loosened = carved.clone();
        loosen(&mut loosened, Difficulty::Easy.wall_removal_chance(), &mut rng);

        let before: HashSet<Cell> = carved.walkable_cells().into_iter().collect();
        let after: HashSet<Cell> = loosened.walkable_cells().into_iter().collect();
        assert!(before.is_subset(&after));
        assert!(after.len() > before.len());
    }

    #[test]
    fn easier_mazes_have_fewer_walls() {
        let walls = |d: Difficulty| {
            let mut rng = StdRng::seed_from_u64(99);
            let g = generate(41, 41, d, &mut rng).unwrap();
            41 * 41 - g.walkable_cells().len()
        };
        assert!(walls(Difficulty::Easy) < walls(Difficulty::Hard));
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = generate(27, 29, Difficulty::Medium, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = generate(27, 29, Difficulty::Medium, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn large_maze_does_not_overflow() {
        let mut rng = StdRng::seed_from_u64(1);
        let g = carve(601, 601, &mut rng).unwrap();
        assert_eq!(g.walkable_cells().len(), 2 * 300 * 300 - 1);
    }

    #[test]
    fn too_small_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            generate(2, 10, Difficulty::Hard, &mut rng).unwrap_err(),
            GridError::TooSmall { width: 2, height: 10 }
        );
        assert!(matches!(
            generate(0, 0, Difficulty::Hard, &mut rng),
            Err(GridError::ZeroSized { .. })
        ));
    }

    #[test]
    fn pickups_fill_open_floor() {
        let mut g = Grid::parse(&["#  #", "# ##"]).unwrap();
        populate_pickups(&mut g);
        assert_eq!(g.pickup_count(), 3);
        assert_eq!(g.get(Cell::new(0, 0)), CellCode::Wall);
    }

    #[test]
    fn difficulty_parses_from_config_strings() {
        #[derive(Deserialize)]
        struct Doc {
            d: Difficulty,
        }
        let p: Doc = toml::from_str("d = \"hard\"").unwrap();
        assert_eq!(p.d, Difficulty::Hard);
        let p: Doc = toml::from_str("d = \"EASY\"").unwrap();
        assert_eq!(p.d, Difficulty::Easy);
        assert!(toml::from_str::<Doc>("d = \"brutal\"").is_err());
    }
}
