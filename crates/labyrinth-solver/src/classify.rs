//! Traversability classification.
//!
//! Turns a raw maze raster into the two working surfaces every solver
//! uses:
//!
//! - the **cleaned** grid, which the solvers read, and
//! - the **overlay**, which the solvers paint the path onto.
//!
//! Wide open areas around the maze (margins, title blocks, frames) are
//! detected with a large square opening and neutralized to flat gray in
//! both surfaces, so only the corridors keep their original white.
//!
//! Walkability is *not* a fixed wall/floor split. Two adjacent cells are
//! walkable when their intensities on a single probe channel are within
//! a small tolerance of each other, see [`SimilarityRule`].

use image::{Rgb, RgbImage};
use imageproc::morphology::{Mask, grayscale_open};
use serde::{Deserialize, Serialize};

use crate::raster::map_channels;
use crate::types::{Dimensions, Point, SolveError};

/// Color written into the cleaned grid for neutralized border pixels.
pub const CLEANED_BORDER: Rgb<u8> = Rgb([240, 240, 240]);

/// Color written into the overlay for neutralized border pixels.
///
/// Not white, so border areas are never selectable and
/// never picked up by the skeletonizer.
pub const OVERLAY_BORDER: Rgb<u8> = Rgb([210, 210, 210]);

/// Pure white: the only overlay color that counts as open corridor.
pub const OPEN: Rgb<u8> = Rgb([255, 255, 255]);

/// Channel compared by the walkability test (blue, in RGB order).
pub const PROBE_CHANNEL: usize = 2;

/// How the intensities of two adjacent cells are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimilarityRule {
    /// Walkable when `|next - current| < tolerance`.
    ///
    /// Symmetric: a wall line blocks movement in both directions.
    #[default]
    Absolute,
    /// Walkable when `max(next - current, 0) < tolerance`.
    ///
    /// Stepping onto a darker cell is always allowed; only brightening
    /// steps are limited. This is the saturating 8-bit subtraction some
    /// image libraries perform on pixel differences.
    Saturating,
}

impl SimilarityRule {
    /// Whether a step from a cell with probe value `current` to one with
    /// probe value `next` is walkable.
    #[must_use]
    pub const fn permits(self, current: u8, next: u8, tolerance: u8) -> bool {
        let diff = match self {
            Self::Absolute => current.abs_diff(next),
            Self::Saturating => next.saturating_sub(current),
        };
        diff < tolerance
    }
}

/// A classified maze: cleaned grid plus the overlay the path is drawn on.
#[derive(Debug, Clone)]
pub struct Maze {
    cleaned: RgbImage,
    overlay: RgbImage,
    border_pixels: u64,
}

impl Maze {
    /// Classify a raw maze raster.
    ///
    /// Opens each channel with a square of radius `border_radius`. Every
    /// pixel that survives the opening with a non-black value belongs to
    /// an open area too wide to be a corridor and is neutralized.
    #[must_use]
    pub fn classify(image: &RgbImage, border_radius: u8) -> Self {
        let mask = Mask::square(border_radius);
        let opened = map_channels(image, |plane| grayscale_open(plane, &mask));

        let mut cleaned = image.clone();
        let mut overlay = image.clone();
        let mut border_pixels = 0;
        for (x, y, pixel) in opened.enumerate_pixels() {
            if pixel.0 != [0, 0, 0] {
                cleaned.put_pixel(x, y, CLEANED_BORDER);
                overlay.put_pixel(x, y, OVERLAY_BORDER);
                border_pixels += 1;
            }
        }
        log::debug!(
            "classified {}x{} maze: {border_pixels} border pixels neutralized",
            image.width(),
            image.height(),
        );

        Self {
            cleaned,
            overlay,
            border_pixels,
        }
    }

    /// Use `image` as both surfaces without border neutralization.
    ///
    /// Useful for synthetic grids that have no decoration to strip.
    #[must_use]
    pub fn without_cleanup(image: RgbImage) -> Self {
        Self {
            overlay: image.clone(),
            cleaned: image,
            border_pixels: 0,
        }
    }

    /// Grid dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.cleaned)
    }

    /// The cleaned grid the solvers read.
    #[must_use]
    pub const fn cleaned(&self) -> &RgbImage {
        &self.cleaned
    }

    /// The overlay the solvers paint onto.
    #[must_use]
    pub const fn overlay(&self) -> &RgbImage {
        &self.overlay
    }

    /// Mutable access to the overlay.
    pub const fn overlay_mut(&mut self) -> &mut RgbImage {
        &mut self.overlay
    }

    /// Consume the maze and return the overlay.
    #[must_use]
    pub fn into_overlay(self) -> RgbImage {
        self.overlay
    }

    /// Number of pixels neutralized as border decoration.
    #[must_use]
    pub const fn border_pixels(&self) -> u64 {
        self.border_pixels
    }

    /// Probe-channel value of the cleaned grid at `point`.
    ///
    /// `point` must lie inside the grid.
    #[must_use]
    pub fn probe(&self, point: Point) -> u8 {
        self.cleaned.get_pixel(point.col, point.row).0[PROBE_CHANNEL]
    }

    /// Whether `point` sits on open corridor (pure white in the overlay).
    ///
    /// Points outside the grid are never selectable.
    #[must_use]
    pub fn is_selectable(&self, point: Point) -> bool {
        self.dimensions().contains(point) && *self.overlay.get_pixel(point.col, point.row) == OPEN
    }

    /// Check that `point` lies inside the grid.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::OutOfBounds`] otherwise.
    pub fn check_bounds(&self, point: Point) -> Result<(), SolveError> {
        let dims = self.dimensions();
        if dims.contains(point) {
            Ok(())
        } else {
            Err(SolveError::OutOfBounds {
                point,
                width: dims.width,
                height: dims.height,
            })
        }
    }

    /// Number of selectable (pure white) overlay pixels.
    #[must_use]
    pub fn open_pixel_count(&self) -> u64 {
        self.overlay
            .pixels()
            .map(|p| u64::from(u8::from(*p == OPEN)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 100x100 maze: a 35-pixel white margin around a black block
    /// containing one 3-pixel-wide white corridor along row 50.
    fn framed_maze() -> RgbImage {
        RgbImage::from_fn(100, 100, |x, y| {
            let inside = (35..65).contains(&x) && (35..65).contains(&y);
            let corridor = (49..52).contains(&y) && inside;
            if !inside || corridor {
                OPEN
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn absolute_rule_is_symmetric() {
        let rule = SimilarityRule::Absolute;
        assert!(rule.permits(250, 251, 2));
        assert!(rule.permits(251, 250, 2));
        assert!(!rule.permits(250, 252, 2));
        assert!(!rule.permits(0, 250, 2));
        assert!(!rule.permits(250, 0, 2));
    }

    #[test]
    fn saturating_rule_allows_darkening() {
        let rule = SimilarityRule::Saturating;
        assert!(rule.permits(250, 0, 2));
        assert!(rule.permits(250, 251, 2));
        assert!(!rule.permits(0, 250, 2));
    }

    #[test]
    fn tolerance_is_strict() {
        assert!(!SimilarityRule::Absolute.permits(10, 12, 2));
        assert!(SimilarityRule::Absolute.permits(10, 12, 3));
    }

    #[test]
    fn margin_is_neutralized() {
        let maze = Maze::classify(&framed_maze(), 10);
        assert_eq!(*maze.cleaned().get_pixel(2, 2), CLEANED_BORDER);
        assert_eq!(*maze.overlay().get_pixel(2, 2), OVERLAY_BORDER);
        assert!(maze.border_pixels() > 0);
    }

    #[test]
    fn narrow_corridor_survives() {
        let maze = Maze::classify(&framed_maze(), 10);
        assert_eq!(*maze.cleaned().get_pixel(50, 50), OPEN);
        assert_eq!(*maze.overlay().get_pixel(50, 50), OPEN);
        assert!(maze.is_selectable(Point::new(50, 50)));
        assert!(!maze.is_selectable(Point::new(2, 2)));
    }

    #[test]
    fn walls_are_untouched() {
        let maze = Maze::classify(&framed_maze(), 10);
        assert_eq!(maze.cleaned().get_pixel(40, 40).0, [0, 0, 0]);
        assert!(!maze.is_selectable(Point::new(40, 40)));
    }

    #[test]
    fn outside_points_are_not_selectable() {
        let maze = Maze::without_cleanup(RgbImage::from_pixel(4, 4, OPEN));
        assert!(!maze.is_selectable(Point::new(4, 0)));
        assert!(matches!(
            maze.check_bounds(Point::new(0, 9)),
            Err(SolveError::OutOfBounds { width: 4, height: 4, .. })
        ));
        assert!(maze.check_bounds(Point::new(3, 3)).is_ok());
    }

    #[test]
    fn probe_reads_blue_channel() {
        let maze = Maze::without_cleanup(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])));
        assert_eq!(maze.probe(Point::new(1, 1)), 3);
    }

    #[test]
    fn without_cleanup_counts_open_pixels() {
        let mut img = RgbImage::from_pixel(3, 3, OPEN);
        img.put_pixel(1, 1, Rgb([0, 0, 0]));
        let maze = Maze::without_cleanup(img);
        assert_eq!(maze.open_pixel_count(), 8);
        assert_eq!(maze.border_pixels(), 0);
    }
}
