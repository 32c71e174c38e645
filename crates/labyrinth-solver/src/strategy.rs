//! Strategy selection: pick a solver by name and run it.
//!
//! The [`MazeSolver`] trait is the uniform interface both strategies
//! share, and [`StrategyKind`] is the runtime selector. Adding a strategy
//! means adding a variant; callers keep calling `solve`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classify::Maze;
use crate::types::{Point, Solution, SolveConfig, SolveError};
use crate::{morphology, wave};

/// Selects which solving strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Breadth-first wave over 8-connected cells with backtrace.
    ///
    /// Requires a start and a finish. Finds a shortest-hop route.
    #[default]
    Wave,
    /// Iterated morphological opening and thinning.
    ///
    /// Ignores the endpoints. Much slower on large images and gives no
    /// connectivity guarantee.
    Morphology,
}

impl StrategyKind {
    /// Every selectable strategy.
    pub const ALL: [Self; 2] = [Self::Wave, Self::Morphology];

    /// The identifier accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wave => "wave",
            Self::Morphology => "morphology",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| SolveError::InvalidSelector(s.to_string()))
    }
}

/// Trait for maze solving strategies.
///
/// Input: a classified maze and the caller's endpoints.
/// Output: the strategy's [`Solution`], with the path already painted on
/// the maze overlay. On error the overlay is unchanged.
pub trait MazeSolver {
    /// Solve `maze` between `start` and `finish`.
    ///
    /// # Errors
    ///
    /// Strategy-specific; see [`wave::solve`] and [`morphology::solve`].
    fn solve(
        &self,
        maze: &mut Maze,
        start: Option<Point>,
        finish: Option<Point>,
        config: &SolveConfig,
    ) -> Result<Solution, SolveError>;
}

impl MazeSolver for StrategyKind {
    fn solve(
        &self,
        maze: &mut Maze,
        start: Option<Point>,
        finish: Option<Point>,
        config: &SolveConfig,
    ) -> Result<Solution, SolveError> {
        match *self {
            Self::Wave => wave::solve(maze, start, finish, config).map(Solution::Wave),
            Self::Morphology => morphology::solve(maze, config).map(Solution::Morphology),
        }
    }
}
