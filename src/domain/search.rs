/// Grid pathfinding: four interchangeable strategies.
///
/// Shared contract:
///   `Strategy::find(start, goal, grid) -> Path`
///
///   - 4-connected, unit cost, walls excluded (`Grid::neighbors`).
///   - `Path` excludes `start` and ends at `goal`.
///   - Empty path = no route (goal is a wall / out of bounds, cells are
///     disconnected, or `start == goal`).
///   - Deterministic: same grid + endpoints → same path.
///
/// ## Strategies
///
///   | Strategy        | Frontier            | Shortest? |
///   |-----------------|---------------------|-----------|
///   | AStar           | heap on f = g + h   | yes       |
///   | GreedyBestFirst | heap on h           | no        |
///   | BreadthFirst    | FIFO queue          | yes       |
///   | DepthFirst      | stack + path copies | no        |
///
/// `h` is Manhattan distance, which is admissible on this grid.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use serde::Deserialize;

use super::cell::Cell;
use super::grid::Grid;

/// Cells from start (exclusive) to goal (inclusive).
pub type Path = Vec<Cell>;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
pub enum Strategy {
    #[serde(rename = "astar", alias = "a_star")]
    AStar,
    #[serde(rename = "greedy", alias = "greedy_best_first")]
    GreedyBestFirst,
    #[serde(rename = "bfs", alias = "breadth_first")]
    BreadthFirst,
    #[serde(rename = "dfs", alias = "depth_first")]
    DepthFirst,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::AStar
    }
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::AStar,
        Strategy::GreedyBestFirst,
        Strategy::BreadthFirst,
        Strategy::DepthFirst,
    ];

    pub fn find(self, start: Cell, goal: Cell, grid: &Grid) -> Path {
        if start == goal || !grid.is_walkable(start) || !grid.is_walkable(goal) {
            return Path::new();
        }
        match self {
            Strategy::AStar => a_star(start, goal, grid),
            Strategy::GreedyBestFirst => greedy_best_first(start, goal, grid),
            Strategy::BreadthFirst => breadth_first(start, goal, grid),
            Strategy::DepthFirst => depth_first(start, goal, grid),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strategy::AStar => "A*",
            Strategy::GreedyBestFirst => "Greedy",
            Strategy::BreadthFirst => "BFS",
            Strategy::DepthFirst => "DFS",
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Heap frontier (A*, greedy)
// ══════════════════════════════════════════════════════════════

/// One search node. Lives for a single `find` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SearchNode {
    cell: Cell,
    g: u32,
    h: u32,
}

impl SearchNode {
    fn f(&self) -> u32 {
        self.g + self.h
    }
}

/// Heap entry: lowest `rank` first, then earliest insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Queued {
    rank: u32,
    seq: u64,
    node: SearchNode,
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        (Reverse(self.rank), Reverse(self.seq)).cmp(&(Reverse(other.rank), Reverse(other.seq)))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap with a monotonically increasing tie-break sequence.
struct Frontier {
    heap: BinaryHeap<Queued>,
    seq: u64,
}

impl Frontier {
    fn new() -> Self {
        Frontier { heap: BinaryHeap::with_capacity(64), seq: 0 }
    }

    fn push(&mut self, rank: u32, node: SearchNode) {
        self.heap.push(Queued { rank, seq: self.seq, node });
        self.seq += 1;
    }

    fn pop(&mut self) -> Option<SearchNode> {
        self.heap.pop().map(|q| q.node)
    }
}

fn heuristic(a: Cell, b: Cell) -> u32 {
    a.manhattan(b)
}

/// A*: `best_g` is the index-keyed decrease-key map. A cheaper route
/// pushes a fresh entry; the stale one is skipped by the closed set.
fn a_star(start: Cell, goal: Cell, grid: &Grid) -> Path {
    let mut open = Frontier::new();
    let mut best_g: HashMap<Cell, u32> = HashMap::from([(start, 0)]);
    let mut came_from: HashMap<Cell, Cell> = HashMap::new();
    let mut closed: HashSet<Cell> = HashSet::new();

    let root = SearchNode { cell: start, g: 0, h: heuristic(start, goal) };
    open.push(root.f(), root);

    while let Some(current) = open.pop() {
        if current.cell == goal {
            return reconstruct(&came_from, start, goal);
        }
        if !closed.insert(current.cell) {
            continue;
        }

        for next in grid.neighbors(current.cell) {
            if closed.contains(&next) {
                continue;
            }
            let g = current.g + 1;
            if best_g.get(&next).is_some_and(|&known| known <= g) {
                continue;
            }
            best_g.insert(next, g);
            came_from.insert(next, current.cell);
            let node = SearchNode { cell: next, g, h: heuristic(next, goal) };
            open.push(node.f(), node);
        }
    }

    Path::new()
}

/// Greedy best-first: ranks by `h` only. Each cell is queued once.
fn greedy_best_first(start: Cell, goal: Cell, grid: &Grid) -> Path {
    let mut open = Frontier::new();
    let mut came_from: HashMap<Cell, Cell> = HashMap::new();
    let mut queued: HashSet<Cell> = HashSet::from([start]);

    open.push(heuristic(start, goal), SearchNode { cell: start, g: 0, h: heuristic(start, goal) });

    while let Some(current) = open.pop() {
        if current.cell == goal {
            return reconstruct(&came_from, start, goal);
        }
        for next in grid.neighbors(current.cell) {
            if !queued.insert(next) {
                continue;
            }
            came_from.insert(next, current.cell);
            let node = SearchNode { cell: next, g: current.g + 1, h: heuristic(next, goal) };
            open.push(node.h, node);
        }
    }

    Path::new()
}

// ══════════════════════════════════════════════════════════════
// Uninformed searches
// ══════════════════════════════════════════════════════════════

fn breadth_first(start: Cell, goal: Cell, grid: &Grid) -> Path {
    let mut queue: VecDeque<Cell> = VecDeque::from([start]);
    let mut came_from: HashMap<Cell, Cell> = HashMap::new();

    while let Some(current) = queue.pop_front() {
        if current == goal {
            return reconstruct(&came_from, start, goal);
        }
        for next in grid.neighbors(current) {
            if next == start || came_from.contains_key(&next) {
                continue;
            }
            came_from.insert(next, current);
            queue.push_back(next);
        }
    }

    Path::new()
}

/// Each stack entry carries its own copy of the path so far.
fn depth_first(start: Cell, goal: Cell, grid: &Grid) -> Path {
    let mut stack: Vec<(Cell, Path)> = vec![(start, Path::new())];
    let mut visited: HashSet<Cell> = HashSet::new();

    while let Some((current, path)) = stack.pop() {
        if current == goal {
            return path;
        }
        if !visited.insert(current) {
            continue;
        }
        // Reversed so the first `DIRS` neighbour is popped first.
        let neighbors: Vec<Cell> = grid.neighbors(current).collect();
        for next in neighbors.into_iter().rev() {
            if visited.contains(&next) {
                continue;
            }
            let mut branch = path.clone();
            branch.push(next);
            stack.push((next, branch));
        }
    }

    Path::new()
}

/// Walk predecessors back from `goal`. `start` itself is not included.
fn reconstruct(came_from: &HashMap<Cell, Cell>, start: Cell, goal: Cell) -> Path {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
