//! Path overlay: recolor discovered path cells on the output raster.
//!
//! Shared by both strategies. Marking only ever writes the fixed
//! [`PATH_COLOR`], so marking a cell twice is the same as marking it once.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_circle_mut;

use crate::types::Point;

/// Color of path pixels (pure blue).
pub const PATH_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Outline color of the start marker.
pub const START_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline color of the finish marker.
pub const FINISH_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Radius of the endpoint marker circles in pixels.
pub const MARKER_RADIUS: i32 = 4;

/// Recolor the overlay pixel at `point` as path.
///
/// Points outside the overlay are ignored.
pub fn mark(overlay: &mut RgbImage, point: Point) {
    if point.col < overlay.width() && point.row < overlay.height() {
        overlay.put_pixel(point.col, point.row, PATH_COLOR);
    }
}

/// Recolor every point in `points` as path.
pub fn mark_all<'a>(overlay: &mut RgbImage, points: impl IntoIterator<Item = &'a Point>) {
    for &point in points {
        mark(overlay, point);
    }
}

/// Draw hollow circles around whichever endpoints are set.
///
/// Meant for presentation after a solve; circles are not path pixels.
pub fn draw_endpoints(overlay: &mut RgbImage, start: Option<Point>, finish: Option<Point>) {
    for (point, color) in [(start, START_COLOR), (finish, FINISH_COLOR)] {
        if let Some(p) = point {
            #[allow(clippy::cast_possible_wrap)]
            let center = (p.col as i32, p.row as i32);
            draw_hollow_circle_mut(overlay, center, MARKER_RADIUS, color);
        }
    }
}

/// Count overlay pixels carrying [`PATH_COLOR`].
#[must_use]
pub fn count_marked(overlay: &RgbImage) -> usize {
    overlay.pixels().filter(|p| **p == PATH_COLOR).count()
}
