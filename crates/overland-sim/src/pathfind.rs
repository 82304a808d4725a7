//! Grid pathfinding (A*).
//!
//! Search nodes live in a flat arena and refer to their predecessor by
//! index, so a finished search hands back the whole arena plus the goal
//! index instead of a pointer chain. Costs are Euclidean: 1 per orthogonal
//! step, √2 per diagonal step, with the straight-line distance to the goal
//! as the heuristic.

use crate::grid::OccupancyGrid;

/// A node produced during search.
///
/// `f` is fixed at construction as `g + h`; a rediscovered cell gets a new
/// node rather than a mutated one.
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    /// Grid x
    pub x: i64,
    /// Grid y
    pub y: i64,
    /// Accumulated cost from the start
    pub g: f32,
    /// Euclidean distance to the goal
    pub h: f32,
    /// Total cost `g + h`
    pub f: f32,
    parent: Option<u32>,
}

impl Cell {
    fn new(x: i64, y: i64, g: f32, goal: (i64, i64), parent: Option<u32>) -> Self {
        let h = euclid(x, y, goal.0, goal.1);
        Self {
            x,
            y,
            g,
            h,
            f: g + h,
            parent,
        }
    }
}

fn euclid(x: i64, y: i64, gx: i64, gy: i64) -> f32 {
    let dx = (x - gx) as f32;
    let dy = (y - gy) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// A found path: the search arena plus the goal node's index.
#[derive(Debug, Clone)]
pub struct Path {
    arena: Vec<Cell>,
    goal: u32,
}

impl Path {
    /// Total cost of the path (the goal node's `g`).
    #[must_use]
    pub fn cost(&self) -> f32 {
        self.arena[self.goal as usize].g
    }

    /// Number of cells on the path, start and goal included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter_from_goal().count()
    }

    /// True only for the degenerate start-equals-goal path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena[self.goal as usize].parent.is_none()
    }

    /// Walks the ancestry chain from the goal back to the start.
    pub fn iter_from_goal(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        let mut next = Some(self.goal);
        std::iter::from_fn(move || {
            let idx = next?;
            let cell = &self.arena[idx as usize];
            next = cell.parent;
            Some((cell.x, cell.y))
        })
    }

    /// The first movement step: `(start_cell, next_cell)`.
    ///
    /// Movement code only ever needs the direction implied by the two cells
    /// closest to the start; the rest of the chain is recomputed next tick
    /// anyway. Returns `None` for the degenerate single-cell path.
    #[must_use]
    pub fn first_step(&self) -> Option<((i64, i64), (i64, i64))> {
        let mut child = self.goal;
        let mut parent = self.arena[child as usize].parent?;
        while let Some(grand) = self.arena[parent as usize].parent {
            child = parent;
            parent = grand;
        }
        let p = &self.arena[parent as usize];
        let c = &self.arena[child as usize];
        Some(((p.x, p.y), (c.x, c.y)))
    }
}

const ORTHO: f32 = 1.0;
const DIAG: f32 = std::f32::consts::SQRT_2;

/// The complete 8-connected neighborhood with step costs.
const NEIGHBORS: [(i64, i64, f32); 8] = [
    (0, -1, ORTHO),
    (1, 0, ORTHO),
    (0, 1, ORTHO),
    (-1, 0, ORTHO),
    (1, -1, DIAG),
    (1, 1, DIAG),
    (-1, 1, DIAG),
    (-1, -1, DIAG),
];

/// Finds a least-cost path between two grid cells.
///
/// Returns `None` when the open set is exhausted without reaching the goal
/// or when either endpoint lies outside the grid — absence of a path is an
/// ordinary outcome the caller handles, not an error. A neighbor equal to
/// the goal ends the search immediately and is exempt from the occupancy
/// filter, so a path *to* an occupied cell (a building the NPC is walking
/// at) still resolves.
#[must_use]
pub fn find_path(
    grid: &OccupancyGrid,
    start: (i64, i64),
    goal: (i64, i64),
) -> Option<Path> {
    if !grid.in_bounds(start.0, start.1) || !grid.in_bounds(goal.0, goal.1) {
        return None;
    }
    if start == goal {
        return Some(Path {
            arena: vec![Cell::new(start.0, start.1, 0.0, goal, None)],
            goal: 0,
        });
    }

    let width = grid.width();
    let slot = |x: i64, y: i64| y as usize * width + x as usize;

    let mut arena = vec![Cell::new(start.0, start.1, 0.0, goal, None)];
    let mut open: Vec<u32> = vec![0];
    let mut closed = vec![false; width * grid.height()];
    let mut best_f = vec![f32::INFINITY; width * grid.height()];
    best_f[slot(start.0, start.1)] = arena[0].f;

    while !open.is_empty() {
        // Min-f with first-found tie-break; the open set stays small on a
        // 30x30 window, so a linear scan beats heap bookkeeping here.
        let mut min = 0;
        for (i, &idx) in open.iter().enumerate() {
            if arena[idx as usize].f < arena[open[min] as usize].f {
                min = i;
            }
        }
        let qi = open.remove(min);
        let q = arena[qi as usize];
        if closed[slot(q.x, q.y)] {
            continue;
        }
        closed[slot(q.x, q.y)] = true;

        for (dx, dy, cost) in NEIGHBORS {
            let (nx, ny) = (q.x + dx, q.y + dy);
            if (nx, ny) == goal {
                arena.push(Cell::new(nx, ny, q.g + cost, goal, Some(qi)));
                let goal_idx = (arena.len() - 1) as u32;
                return Some(Path {
                    arena,
                    goal: goal_idx,
                });
            }
            if !grid.in_bounds(nx, ny) || grid.is_blocked(nx, ny) || closed[slot(nx, ny)] {
                continue;
            }
            let cell = Cell::new(nx, ny, q.g + cost, goal, Some(qi));
            if cell.f < best_f[slot(nx, ny)] {
                best_f[slot(nx, ny)] = cell.f;
                arena.push(cell);
                open.push((arena.len() - 1) as u32);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid_with(blocked: &[(i64, i64)], w: usize, h: usize) -> OccupancyGrid {
        let mut grid = OccupancyGrid::new(w, h);
        for &(x, y) in blocked {
            grid.set_tile(x, y, 1);
        }
        grid
    }

    #[test]
    fn test_straight_path_on_empty_grid_is_optimal() {
        let grid = OccupancyGrid::new(5, 4);
        let path = find_path(&grid, (0, 0), (0, 3)).expect("path");
        // Straight vertical traversal, not a diagonal detour.
        assert!((path.cost() - 3.0).abs() < 1e-5);
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_path_around_wall() {
        // Row y = 2 walled for x in 0..=2, plus spurs at (2, 1) and (4, 3).
        let grid = grid_with(&[(0, 2), (1, 2), (2, 2), (2, 1), (4, 3)], 5, 4);
        let path = find_path(&grid, (0, 0), (0, 3)).expect("path");
        let expected = 5.0 + 2.0 * std::f32::consts::SQRT_2;
        assert!(
            (path.cost() - expected).abs() < 1e-4,
            "cost {} != {expected}",
            path.cost()
        );
        // Every cell on the chain is free.
        for (x, y) in path.iter_from_goal() {
            assert!(!grid.is_blocked(x, y), "path crosses obstacle at ({x}, {y})");
        }
    }

    #[test]
    fn test_enclosed_goal_yields_no_path() {
        let mut blocked = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if (dx, dy) != (0, 0) {
                    blocked.push((2 + dx, 2 + dy));
                }
            }
        }
        let grid = grid_with(&blocked, 5, 5);
        assert!(find_path(&grid, (0, 0), (2, 2)).is_none());
    }

    #[test]
    fn test_occupied_goal_is_still_reachable() {
        // The goal short-circuit skips the occupancy filter.
        let grid = grid_with(&[(3, 0)], 5, 1);
        let path = find_path(&grid, (0, 0), (3, 0)).expect("path");
        assert!((path.cost() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = OccupancyGrid::new(3, 3);
        let path = find_path(&grid, (1, 1), (1, 1)).expect("trivial path");
        assert!(path.is_empty());
        assert!(path.first_step().is_none());
        assert!(path.cost().abs() < f32::EPSILON);
    }

    #[test]
    fn test_out_of_bounds_endpoints() {
        let grid = OccupancyGrid::new(3, 3);
        assert!(find_path(&grid, (-1, 0), (2, 2)).is_none());
        assert!(find_path(&grid, (0, 0), (3, 0)).is_none());
    }

    #[test]
    fn test_first_step_points_toward_goal() {
        let grid = OccupancyGrid::new(8, 8);
        let path = find_path(&grid, (0, 0), (5, 0)).expect("path");
        let (from, to) = path.first_step().expect("step");
        assert_eq!(from, (0, 0));
        assert_eq!(to, (1, 0));
    }

    #[test]
    fn test_first_step_routes_around_adjacent_obstacle() {
        // Wall directly east of the start forces the first step off-axis.
        let grid = grid_with(&[(1, 0), (1, 1)], 5, 3);
        let path = find_path(&grid, (0, 0), (4, 0)).expect("path");
        let (from, to) = path.first_step().expect("step");
        assert_eq!(from, (0, 0));
        assert!(!grid.is_blocked(to.0, to.1));
        assert_ne!(to, (1, 0));
    }

    #[test]
    fn test_chain_ends_at_start() {
        let grid = OccupancyGrid::new(6, 6);
        let path = find_path(&grid, (2, 3), (5, 5)).expect("path");
        let cells: Vec<_> = path.iter_from_goal().collect();
        assert_eq!(cells.first().copied(), Some((5, 5)));
        assert_eq!(cells.last().copied(), Some((2, 3)));
    }

    proptest! {
        #[test]
        fn prop_empty_grid_cost_is_exact(
            sx in 0i64..12, sy in 0i64..12,
            gx in 0i64..12, gy in 0i64..12,
        ) {
            let grid = OccupancyGrid::new(12, 12);
            let path = find_path(&grid, (sx, sy), (gx, gy)).expect("open grid");
            let dx = (gx - sx).abs() as f32;
            let dy = (gy - sy).abs() as f32;
            let long = dx.max(dy);
            let short = dx.min(dy);
            let expected = (long - short) + short * std::f32::consts::SQRT_2;
            prop_assert!((path.cost() - expected).abs() < 1e-3);
        }

        #[test]
        fn prop_path_steps_are_adjacent(
            seed in 0u64..500,
            sx in 0i64..10, sy in 0i64..10,
            gx in 0i64..10, gy in 0i64..10,
        ) {
            let mut grid = OccupancyGrid::new(10, 10);
            // Scatter deterministic obstacles, keeping the endpoints free.
            for x in 0..10i64 {
                for y in 0..10i64 {
                    let h = overland_common::cell_hash(seed, x, y, 0);
                    if overland_common::unit_f32(h) > 0.75
                        && (x, y) != (sx, sy)
                        && (x, y) != (gx, gy)
                    {
                        grid.set_tile(x, y, 1);
                    }
                }
            }
            if let Some(path) = find_path(&grid, (sx, sy), (gx, gy)) {
                let cells: Vec<_> = path.iter_from_goal().collect();
                for pair in cells.windows(2) {
                    let (ax, ay) = pair[0];
                    let (bx, by) = pair[1];
                    prop_assert!((ax - bx).abs() <= 1 && (ay - by).abs() <= 1);
                    prop_assert!((ax, ay) != (bx, by));
                }
            }
        }
    }
}
