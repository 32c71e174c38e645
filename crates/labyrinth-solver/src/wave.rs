//! Wave search: breadth-first flood fill with backtrace.
//!
//! The wave spreads from the start one hop-distance layer at a time over
//! 8-connected cells. Every cell records where the wave reached it from
//! (the [`VisitRecord`]), and once the finish is touched the route is
//! recovered by following those links back to the start.
//!
//! Because the queue is FIFO, the first time the finish is reached is
//! along a route with the minimum number of hops. The fixed expansion
//! order in [`DIRECTIONS`] only decides which of several equally short
//! routes is recorded.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::classify::{Maze, SimilarityRule};
use crate::overlay;
use crate::types::{Dimensions, Point, SolveConfig, SolveError};

/// Expansion order as `(d_row, d_col)`: up, right, down, left, then the
/// diagonals up-left, up-right, down-left, down-right.
pub const DIRECTIONS: [(i64, i64); 8] = [
    (-1, 0),
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Per-cell entry of the [`VisitRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Not reached yet.
    Unvisited,
    /// The start cell; it has no predecessor.
    Origin,
    /// Reached from the cell with this flattened index.
    From(usize),
}

/// Flat arena of [`Visit`] entries addressed by `row * cols + col`.
///
/// Each entry is written at most once per search.
#[derive(Debug, Clone)]
pub struct VisitRecord {
    cells: Vec<Visit>,
    cols: u32,
    writes: usize,
}

impl VisitRecord {
    /// A record with every cell unvisited.
    #[must_use]
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            cells: vec![Visit::Unvisited; dimensions.cell_count()],
            cols: dimensions.width,
            writes: 0,
        }
    }

    /// The entry for `point`, or `None` when it lies outside the grid.
    #[must_use]
    pub fn get(&self, point: Point) -> Option<Visit> {
        if point.col >= self.cols {
            return None;
        }
        self.cells.get(point.index(self.cols)).copied()
    }

    /// Whether `point` has been reached. Out-of-grid points never are.
    #[must_use]
    pub fn is_visited(&self, point: Point) -> bool {
        self.get(point).is_some_and(|visit| visit != Visit::Unvisited)
    }

    /// Predecessor of `point`, or `None` for the origin, unvisited cells
    /// and points outside the grid.
    #[must_use]
    pub fn predecessor(&self, point: Point) -> Option<Point> {
        match self.get(point)? {
            Visit::From(index) => Some(Point::from_index(index, self.cols)),
            Visit::Origin | Visit::Unvisited => None,
        }
    }

    /// Total number of writes performed.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }

    /// Number of cells that are no longer unvisited.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.cells.iter().filter(|v| **v != Visit::Unvisited).count()
    }

    fn set(&mut self, point: Point, visit: Visit) {
        let slot = &mut self.cells[point.index(self.cols)];
        debug_assert_eq!(*slot, Visit::Unvisited, "cell {point} visited twice");
        *slot = visit;
        self.writes += 1;
    }
}

/// Lifecycle of a [`WaveSearch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveState {
    /// Initialized, nothing enqueued.
    Idle,
    /// Start marked and enqueued.
    Seeded,
    /// Processing the queue.
    Expanding,
    /// The finish was reached.
    Found,
    /// The queue ran dry without reaching the finish.
    Exhausted,
}

/// A route from start to finish, both inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    cells: Vec<Point>,
    explored: usize,
}

impl Route {
    /// Cells in walking order, start first.
    #[must_use]
    pub fn cells(&self) -> &[Point] {
        &self.cells
    }

    /// Number of cells on the route.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the route holds no cells. Routes produced by a search
    /// always hold at least their start.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of moves between start and finish.
    #[must_use]
    pub const fn hop_count(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    /// First cell.
    #[must_use]
    pub fn start(&self) -> Option<Point> {
        self.cells.first().copied()
    }

    /// Last cell.
    #[must_use]
    pub fn finish(&self) -> Option<Point> {
        self.cells.last().copied()
    }

    /// How many cells the wave reached before finding the finish.
    #[must_use]
    pub const fn explored(&self) -> usize {
        self.explored
    }
}

/// One breadth-first search over a classified maze.
#[derive(Debug)]
pub struct WaveSearch<'a> {
    maze: &'a Maze,
    rule: SimilarityRule,
    tolerance: u8,
    record: VisitRecord,
    queue: VecDeque<Point>,
    state: WaveState,
}

impl<'a> WaveSearch<'a> {
    /// Allocate a fresh visit record and an empty queue.
    #[must_use]
    pub fn new(maze: &'a Maze, rule: SimilarityRule, tolerance: u8) -> Self {
        Self {
            maze,
            rule,
            tolerance,
            record: VisitRecord::new(maze.dimensions()),
            queue: VecDeque::new(),
            state: WaveState::Idle,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> WaveState {
        self.state
    }

    /// The visit record as filled so far.
    #[must_use]
    pub const fn record(&self) -> &VisitRecord {
        &self.record
    }

    /// Run the search from `start` towards `finish`.
    ///
    /// Each call starts from a fresh visit record and an empty queue, so
    /// one `WaveSearch` can serve several endpoint pairs. The overlay is
    /// not touched; see [`solve`] for the marking variant.
    ///
    /// # Errors
    ///
    /// - [`SolveError::MissingStart`] when `start` is `None`.
    /// - [`SolveError::OutOfBounds`] when an endpoint is outside the grid.
    /// - [`SolveError::Unreachable`] when `finish` is `None` or the wave
    ///   exhausts every reachable cell without touching it.
    pub fn run(&mut self, start: Option<Point>, finish: Option<Point>) -> Result<Route, SolveError> {
        self.reset();
        let start = start.ok_or(SolveError::MissingStart)?;
        self.maze.check_bounds(start)?;
        let Some(finish) = finish else {
            log::debug!("no finish set, nothing to search for");
            return Err(SolveError::Unreachable);
        };
        self.maze.check_bounds(finish)?;

        self.record.set(start, Visit::Origin);
        self.queue.push_back(start);
        self.state = WaveState::Seeded;

        if start == finish {
            self.state = WaveState::Found;
            return Ok(self.backtrace(finish));
        }

        self.state = WaveState::Expanding;
        let dims = self.maze.dimensions();
        while let Some(current) = self.queue.pop_front() {
            let from = current.index(dims.width);
            for (d_row, d_col) in DIRECTIONS {
                let Some(next) = current.offset(d_row, d_col, dims) else {
                    continue;
                };
                if self.record.is_visited(next) {
                    continue;
                }
                if next == finish {
                    self.record.set(next, Visit::From(from));
                    self.state = WaveState::Found;
                    log::debug!(
                        "wave reached {finish} after visiting {} cells",
                        self.record.writes(),
                    );
                    return Ok(self.backtrace(finish));
                }
                if self
                    .rule
                    .permits(self.maze.probe(current), self.maze.probe(next), self.tolerance)
                {
                    self.record.set(next, Visit::From(from));
                    self.queue.push_back(next);
                }
            }
        }

        self.state = WaveState::Exhausted;
        log::debug!(
            "wave exhausted after visiting {} cells without reaching {finish}",
            self.record.writes(),
        );
        Err(SolveError::Unreachable)
    }

    fn reset(&mut self) {
        self.record = VisitRecord::new(self.maze.dimensions());
        self.queue.clear();
        self.state = WaveState::Idle;
    }

    /// Follow predecessor links from `finish` back to the origin.
    fn backtrace(&self, finish: Point) -> Route {
        let mut cells = vec![finish];
        let mut current = finish;
        while let Some(prev) = self.record.predecessor(current) {
            cells.push(prev);
            current = prev;
        }
        cells.reverse();
        Route {
            cells,
            explored: self.record.writes(),
        }
    }
}

/// Search the maze and, on success, mark the route on its overlay.
///
/// On failure the overlay is left exactly as it was.
///
/// # Errors
///
/// See [`WaveSearch::run`].
pub fn solve(
    maze: &mut Maze,
    start: Option<Point>,
    finish: Option<Point>,
    config: &SolveConfig,
) -> Result<Route, SolveError> {
    let route = WaveSearch::new(maze, config.similarity, config.tolerance).run(start, finish)?;
    overlay::mark_all(maze.overlay_mut(), route.cells());
    Ok(route)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    const FLOOR: Rgb<u8> = Rgb([250, 250, 250]);
    const WALL: Rgb<u8> = Rgb([0, 0, 0]);

    /// Build a maze from rows of `.` (floor) and `#` (wall).
    fn maze_from(rows: &[&str]) -> Maze {
        #[allow(clippy::cast_possible_truncation)]
        let (w, h) = (rows[0].len() as u32, rows.len() as u32);
        let img = RgbImage::from_fn(w, h, |x, y| {
            if rows[y as usize].as_bytes()[x as usize] == b'#' {
                WALL
            } else {
                FLOOR
            }
        });
        Maze::without_cleanup(img)
    }

    /// The 5x5 grid with a wall down column 2 that is open only at row 0.
    fn gate_maze() -> Maze {
        maze_from(&[".....", "..#..", "..#..", "..#..", "..#.."])
    }

    fn run(maze: &Maze, start: Point, finish: Point) -> Result<Route, SolveError> {
        WaveSearch::new(maze, SimilarityRule::Absolute, 2).run(Some(start), Some(finish))
    }

    fn assert_adjacent_chain(route: &Route) {
        for pair in route.cells().windows(2) {
            let dr = pair[0].row.abs_diff(pair[1].row);
            let dc = pair[0].col.abs_diff(pair[1].col);
            assert!(
                dr <= 1 && dc <= 1 && (dr, dc) != (0, 0),
                "{} and {} are not 8-adjacent",
                pair[0],
                pair[1],
            );
        }
    }

    #[test]
    fn gate_scenario_routes_through_opening() {
        let maze = gate_maze();
        let route = run(&maze, Point::new(0, 0), Point::new(4, 4)).unwrap();

        assert_eq!(route.start(), Some(Point::new(0, 0)));
        assert_eq!(route.finish(), Some(Point::new(4, 4)));
        assert!(route.cells().contains(&Point::new(0, 2)));
        // Two hops to reach the opening, four more to descend to row 4.
        assert_eq!(route.hop_count(), 6);
        assert_eq!(route.len(), 7);
        assert_adjacent_chain(&route);
    }

    #[test]
    fn gate_scenario_predecessor_chain_reaches_origin() {
        let maze = gate_maze();
        let mut search = WaveSearch::new(&maze, SimilarityRule::Absolute, 2);
        let route = search.run(Some(Point::new(0, 0)), Some(Point::new(4, 4))).unwrap();
        assert_eq!(search.state(), WaveState::Found);

        let record = search.record();
        assert_eq!(record.get(Point::new(0, 0)), Some(Visit::Origin));
        // Tie-break: (0, 1) is expanded before (1, 1), so it claims (0, 2).
        assert_eq!(record.predecessor(Point::new(0, 2)), Some(Point::new(0, 1)));

        let mut steps = 0;
        let mut current = Point::new(4, 4);
        while let Some(prev) = record.predecessor(current) {
            current = prev;
            steps += 1;
            assert!(steps <= route.hop_count(), "predecessor chain has a cycle");
        }
        assert_eq!(current, Point::new(0, 0));
        assert_eq!(steps, route.hop_count());
    }

    #[test]
    fn open_field_diagonal_is_shortest() {
        let maze = maze_from(&["......"; 6]);
        let route = run(&maze, Point::new(0, 0), Point::new(5, 5)).unwrap();
        assert_eq!(route.hop_count(), 5);
        assert_adjacent_chain(&route);
    }

    #[test]
    fn straight_corridor_hop_count() {
        let maze = maze_from(&["#######", ".......", "#######"]);
        let route = run(&maze, Point::new(1, 0), Point::new(1, 6)).unwrap();
        assert_eq!(route.hop_count(), 6);
        assert!(route.cells().iter().all(|p| p.row == 1));
    }

    #[test]
    fn winding_corridor_hop_count() {
        let maze = maze_from(&[
            ".#...", //
            ".#.#.", //
            ".#.#.", //
            "...#.", //
        ]);
        // Down the left column, diagonally up through the middle column,
        // diagonally down the right column.
        let route = run(&maze, Point::new(0, 0), Point::new(3, 4)).unwrap();
        assert_eq!(route.hop_count(), 9);
        assert_adjacent_chain(&route);
        for p in route.cells() {
            assert_ne!(maze.probe(*p), 0, "route passes through wall at {p}");
        }
    }

    #[test]
    fn unbroken_wall_is_unreachable() {
        let maze = maze_from(&["..#..", "..#..", "..#..", "..#..", "..#.."]);
        let mut search = WaveSearch::new(&maze, SimilarityRule::Absolute, 2);
        let result = search.run(Some(Point::new(0, 0)), Some(Point::new(4, 4)));
        assert!(matches!(result, Err(SolveError::Unreachable)));
        assert_eq!(search.state(), WaveState::Exhausted);
        // Only the left two columns were reachable.
        assert_eq!(search.record().visited_count(), 10);
    }

    #[test]
    fn failed_solve_leaves_overlay_untouched() {
        let mut maze = maze_from(&["..#..", "..#..", "..#..", "..#..", "..#.."]);
        let before = maze.overlay().clone();
        let result = solve(
            &mut maze,
            Some(Point::new(0, 0)),
            Some(Point::new(4, 4)),
            &SolveConfig::default(),
        );
        assert!(matches!(result, Err(SolveError::Unreachable)));
        assert_eq!(*maze.overlay(), before);
    }

    #[test]
    fn missing_start_does_no_search() {
        let maze = gate_maze();
        let mut search = WaveSearch::new(&maze, SimilarityRule::Absolute, 2);
        let result = search.run(None, Some(Point::new(4, 4)));
        assert!(matches!(result, Err(SolveError::MissingStart)));
        assert_eq!(search.state(), WaveState::Idle);
        assert_eq!(search.record().writes(), 0);
    }

    #[test]
    fn missing_finish_is_unreachable() {
        let maze = gate_maze();
        let mut search = WaveSearch::new(&maze, SimilarityRule::Absolute, 2);
        let result = search.run(Some(Point::new(0, 0)), None);
        assert!(matches!(result, Err(SolveError::Unreachable)));
    }

    #[test]
    fn out_of_bounds_endpoint_is_rejected() {
        let maze = gate_maze();
        let result = run(&maze, Point::new(0, 0), Point::new(5, 0));
        assert!(matches!(result, Err(SolveError::OutOfBounds { .. })));
    }

    #[test]
    fn start_equal_to_finish_is_single_cell() {
        let maze = gate_maze();
        let route = run(&maze, Point::new(3, 3), Point::new(3, 3)).unwrap();
        assert_eq!(route.cells(), &[Point::new(3, 3)]);
        assert_eq!(route.hop_count(), 0);
    }

    #[test]
    fn finish_on_dissimilar_cell_is_still_accepted() {
        // The finish sits on the wall; it only needs to be adjacent.
        let maze = maze_from(&["...#"]);
        let route = run(&maze, Point::new(0, 0), Point::new(0, 3)).unwrap();
        assert_eq!(route.hop_count(), 3);
    }

    #[test]
    fn start_at_origin_cell_is_included() {
        // Index 0 is an ordinary cell, not a terminator.
        let maze = maze_from(&["...", "..."]);
        let route = run(&maze, Point::new(1, 2), Point::new(0, 0)).unwrap();
        assert_eq!(route.finish(), Some(Point::new(0, 0)));
        assert_eq!(route.start(), Some(Point::new(1, 2)));
        assert_eq!(route.hop_count(), 2);
    }

    #[test]
    fn record_lookups_outside_grid_are_none() {
        let maze = gate_maze();
        let mut search = WaveSearch::new(&maze, SimilarityRule::Absolute, 2);
        search.run(Some(Point::new(0, 0)), Some(Point::new(4, 4))).unwrap();
        let record = search.record();
        assert_eq!(record.get(Point::new(0, 5)), None);
        assert_eq!(record.get(Point::new(5, 0)), None);
        assert!(!record.is_visited(Point::new(9, 9)));
        assert_eq!(record.predecessor(Point::new(0, 7)), None);
    }

    #[test]
    fn search_can_be_rerun_with_new_endpoints() {
        let maze = maze_from(&["....."; 5]);
        let mut search = WaveSearch::new(&maze, SimilarityRule::Absolute, 2);

        let first = search.run(Some(Point::new(0, 0)), Some(Point::new(4, 4))).unwrap();
        assert_eq!(first.hop_count(), 4);

        let second = search.run(Some(Point::new(4, 0)), Some(Point::new(0, 4))).unwrap();
        assert_eq!(second.start(), Some(Point::new(4, 0)));
        assert_eq!(second.finish(), Some(Point::new(0, 4)));
        assert_eq!(second.hop_count(), 4);
        assert_eq!(search.state(), WaveState::Found);
        assert_eq!(search.record().get(Point::new(4, 0)), Some(Visit::Origin));
        assert_eq!(search.record().writes(), search.record().visited_count());
        assert_eq!(second, run(&maze, Point::new(4, 0), Point::new(0, 4)).unwrap());
    }

    #[test]
    fn failed_rerun_leaves_no_stale_visits() {
        let maze = gate_maze();
        let mut search = WaveSearch::new(&maze, SimilarityRule::Absolute, 2);
        search.run(Some(Point::new(0, 0)), Some(Point::new(4, 4))).unwrap();
        let result = search.run(None, Some(Point::new(4, 4)));
        assert!(matches!(result, Err(SolveError::MissingStart)));
        assert_eq!(search.state(), WaveState::Idle);
        assert_eq!(search.record().writes(), 0);
    }

    #[test]
    fn deserialized_empty_route_reports_empty() {
        let route: Route = serde_json::from_str(r#"{"cells":[],"explored":0}"#).unwrap();
        assert!(route.is_empty());
        assert_eq!(route.hop_count(), 0);
        assert_eq!(route.start(), None);
    }

    #[test]
    fn each_cell_is_written_at_most_once() {
        let maze = maze_from(&["........"; 8]);
        let mut search = WaveSearch::new(&maze, SimilarityRule::Absolute, 2);
        let result = search.run(Some(Point::new(0, 0)), Some(Point::new(7, 7)));
        assert!(result.is_ok());
        let record = search.record();
        assert_eq!(record.writes(), record.visited_count());
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let maze = maze_from(&[
            "........", //
            ".##.###.", //
            ".#....#.", //
            ".#.##.#.", //
            "........", //
        ]);
        let first = run(&maze, Point::new(0, 0), Point::new(4, 7)).unwrap();
        for _ in 0..5 {
            let again = run(&maze, Point::new(0, 0), Point::new(4, 7)).unwrap();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn gentle_gradient_is_walkable() {
        // Intensity drops by one per column: an anti-aliased corridor.
        let img = RgbImage::from_fn(6, 1, |x, _| {
            #[allow(clippy::cast_possible_truncation)]
            let v = 250 - x as u8;
            Rgb([v, v, v])
        });
        let maze = Maze::without_cleanup(img);
        assert!(run(&maze, Point::new(0, 0), Point::new(0, 5)).is_ok());
    }

    #[test]
    fn saturating_rule_can_step_into_darker_cells() {
        // A sharp drop into a dark band that then brightens by one per step.
        let img = RgbImage::from_fn(4, 1, |x, _| {
            let v = [250, 100, 101, 102][x as usize];
            Rgb([v, v, v])
        });
        let maze = Maze::without_cleanup(img);
        let absolute = WaveSearch::new(&maze, SimilarityRule::Absolute, 2)
            .run(Some(Point::new(0, 0)), Some(Point::new(0, 3)));
        assert!(matches!(absolute, Err(SolveError::Unreachable)));
        let saturating = WaveSearch::new(&maze, SimilarityRule::Saturating, 2)
            .run(Some(Point::new(0, 0)), Some(Point::new(0, 3)));
        assert_eq!(saturating.unwrap().hop_count(), 3);
    }

    #[test]
    fn solve_marks_exactly_the_route() {
        let mut maze = gate_maze();
        let route = solve(
            &mut maze,
            Some(Point::new(0, 0)),
            Some(Point::new(4, 4)),
            &SolveConfig::default(),
        )
        .unwrap();
        assert_eq!(overlay::count_marked(maze.overlay()), route.len());
        for p in route.cells() {
            assert_eq!(*maze.overlay().get_pixel(p.col, p.row), overlay::PATH_COLOR);
        }
    }
}
