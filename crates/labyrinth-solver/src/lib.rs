//! labyrinth-solver: maze path solving over raster images (sans-IO).
//!
//! Takes a photographed or drawn maze and paints a route on it through:
//! decode -> border neutralization -> strategy search -> overlay marking.
//!
//! Two strategies are available behind [`MazeSolver`]:
//! a breadth-first wave with backtrace that finds a shortest-hop route
//! between two chosen points, and a morphological skeletonizer that thins
//! the open space without looking at the endpoints.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory byte
//! slices and rasters; reading files and drawing UI live in the
//! `labyrinth` binary.

pub mod classify;
pub mod decode;
pub mod diagnostics;
pub mod morphology;
pub mod overlay;
pub mod raster;
pub mod strategy;
pub mod types;
pub mod wave;

pub use classify::{Maze, SimilarityRule};
pub use morphology::Skeleton;
pub use strategy::{MazeSolver, StrategyKind};
pub use types::{Dimensions, Point, Solution, SolveConfig, SolveError, SolveResult};
pub use wave::Route;

use types::RgbImage;

/// Decode `image_bytes` and solve the maze it contains.
///
/// Accepts PNG, JPEG, BMP and WebP. See [`solve_image`] for the steps
/// that follow decoding.
///
/// # Errors
///
/// Returns [`SolveError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`SolveError::ImageDecode`] if the image format is unrecognized.
/// Otherwise the errors of [`solve_image`].
pub fn solve(
    image_bytes: &[u8],
    start: Option<Point>,
    finish: Option<Point>,
    config: &SolveConfig,
) -> Result<SolveResult, SolveError> {
    config.validate()?;
    let image = decode::decode_rgb(image_bytes)?;
    solve_image(&image, start, finish, config)
}

/// Solve an already decoded maze image.
///
/// # Steps
///
/// 1. Validate the configuration
/// 2. Neutralize wide light areas around the maze (border cleanup)
/// 3. Run the configured strategy on the cleaned grid
/// 4. Return the overlay with the path painted on it
///
/// # Errors
///
/// Returns [`SolveError::InvalidConfig`] for an unusable configuration.
/// The wave strategy returns [`SolveError::MissingStart`],
/// [`SolveError::OutOfBounds`] or [`SolveError::Unreachable`]; the
/// morphology strategy returns [`SolveError::NoConvergence`].
pub fn solve_image(
    image: &RgbImage,
    start: Option<Point>,
    finish: Option<Point>,
    config: &SolveConfig,
) -> Result<SolveResult, SolveError> {
    config.validate()?;
    let dimensions = Dimensions::of(image);
    if dimensions.width == 0 || dimensions.height == 0 {
        return Err(SolveError::EmptyInput);
    }

    let mut maze = Maze::classify(image, config.border_radius);
    let solution = config.strategy.solve(&mut maze, start, finish, config)?;
    log::info!(
        "{} strategy painted {} path pixels on a {}x{} maze",
        config.strategy,
        solution.path_pixel_count(),
        dimensions.width,
        dimensions.height,
    );

    Ok(SolveResult {
        overlay: maze.into_overlay(),
        solution,
        dimensions,
    })
}
