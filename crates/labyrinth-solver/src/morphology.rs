//! Morphological skeletonizer.
//!
//! Repeatedly opens the open-space region of the cleaned maze (a disk
//! opening followed by a square opening) and binarizes it, until an
//! iteration leaves the mask unchanged. A final disk erosion then thins
//! the surviving region towards a single route, and every pixel that is
//! white both in the thinned mask and in the overlay is painted as path.
//!
//! This is a visual thinning heuristic. It ignores the endpoints and does
//! not guarantee that anything it paints connects them.

use image::RgbImage;
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::morphology::{Mask, grayscale_erode, grayscale_open};
use serde::{Deserialize, Serialize};

use crate::classify::{Maze, OPEN};
use crate::overlay;
use crate::raster::map_channels;
use crate::types::{Point, SolveConfig, SolveError};

/// Outcome of a skeletonizer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skeleton {
    /// Iterations needed to reach the fixed point.
    pub iterations: usize,
    /// Pixels painted as path.
    pub marked: usize,
}

/// Iterate open + open + binarize from the cleaned grid to a fixed point.
///
/// Returns the stable mask and the number of iterations performed,
/// including the final one that confirmed stability.
///
/// # Errors
///
/// Returns [`SolveError::NoConvergence`] if the mask still changes after
/// `config.max_iterations` iterations.
pub fn stabilize(cleaned: &RgbImage, config: &SolveConfig) -> Result<(RgbImage, usize), SolveError> {
    let disk = Mask::disk(config.open_disk_radius);
    let square = Mask::square(config.open_square_radius);

    let mut mask = cleaned.clone();
    for iteration in 1..=config.max_iterations {
        let next = map_channels(&mask, |plane| {
            let opened = grayscale_open(&grayscale_open(plane, &disk), &square);
            threshold(&opened, config.binarize_threshold, ThresholdType::Binary)
        });
        if next == mask {
            log::debug!("morphology reached a fixed point after {iteration} iterations");
            return Ok((next, iteration));
        }
        mask = next;
    }

    log::warn!(
        "morphology still changing after {} iterations",
        config.max_iterations
    );
    Err(SolveError::NoConvergence {
        iterations: config.max_iterations,
    })
}

/// Final thinning pass: erode every channel with a disk of `radius`.
#[must_use]
pub fn thin(mask: &RgbImage, radius: u8) -> RgbImage {
    let disk = Mask::disk(radius);
    map_channels(mask, |plane| grayscale_erode(plane, &disk))
}

/// Skeletonize the maze and paint the result on its overlay.
///
/// Only pixels that are pure white in both the thinned mask and the
/// overlay are painted, so neutralized border areas never receive path.
///
/// # Errors
///
/// Returns [`SolveError::NoConvergence`] from [`stabilize`]; the overlay
/// is untouched in that case.
pub fn solve(maze: &mut Maze, config: &SolveConfig) -> Result<Skeleton, SolveError> {
    let (stable, iterations) = stabilize(maze.cleaned(), config)?;
    let thinned = thin(&stable, config.erode_disk_radius);

    let path: Vec<Point> = thinned
        .enumerate_pixels()
        .filter(|&(x, y, pixel)| *pixel == OPEN && *maze.overlay().get_pixel(x, y) == OPEN)
        .map(|(x, y, _)| Point::new(y, x))
        .collect();
    overlay::mark_all(maze.overlay_mut(), &path);

    log::debug!("morphology painted {} path pixels", path.len());
    Ok(Skeleton {
        iterations,
        marked: path.len(),
    })
}
