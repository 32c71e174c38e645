//! Shared types for the labyrinth solver.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::SimilarityRule;
use crate::morphology::Skeleton;
use crate::strategy::StrategyKind;
use crate::wave::Route;

/// Re-export `RgbImage` so downstream crates can hand rasters in and
/// out without depending on `image` directly.
pub use image::RgbImage;

/// A grid cell addressed as `(row, col)`.
///
/// `row` grows downward (image `y`), `col` grows rightward (image `x`).
/// An unset endpoint is represented as `Option::<Point>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Row index (pixels from the top edge).
    pub row: u32,
    /// Column index (pixels from the left edge).
    pub col: u32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Flattened index `row * cols + col` for a grid `cols` wide.
    #[must_use]
    pub const fn index(self, cols: u32) -> usize {
        self.row as usize * cols as usize + self.col as usize
    }

    /// Inverse of [`index`](Self::index).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_index(index: usize, cols: u32) -> Self {
        let cols = cols as usize;
        Self {
            row: (index / cols) as u32,
            col: (index % cols) as u32,
        }
    }

    /// The neighbor at `(row + d_row, col + d_col)`, or `None` when it
    /// falls outside `dimensions`.
    #[must_use]
    pub fn offset(self, d_row: i64, d_col: i64, dimensions: Dimensions) -> Option<Self> {
        let row = u32::try_from(i64::from(self.row) + d_row).ok()?;
        let col = u32::try_from(i64::from(self.col) + d_col).ok()?;
        let next = Self { row, col };
        dimensions.contains(next).then_some(next)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels (number of columns).
    pub width: u32,
    /// Height in pixels (number of rows).
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an image buffer.
    #[must_use]
    pub fn of<P: image::Pixel>(image: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Whether `point` lies inside the grid.
    #[must_use]
    pub const fn contains(self, point: Point) -> bool {
        point.row < self.height && point.col < self.width
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Configuration for a single solve.
///
/// The defaults reproduce the classic tuning: a 21x21 border probe,
/// a tolerance of 2 on the blue channel, 9x9 openings, binarization at
/// 210 and a 7x7 final erosion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    /// Which solving strategy to run.
    pub strategy: StrategyKind,

    /// Square radius of the opening used to detect border decoration.
    /// Open regions wider than `2 * border_radius + 1` are neutralized.
    pub border_radius: u8,

    /// How the wave engine compares adjacent pixel intensities.
    pub similarity: SimilarityRule,

    /// Two neighbors are walkable when their probe-channel difference
    /// is strictly below this value. Must be at least 1.
    pub tolerance: u8,

    /// Disk radius of the first opening in each skeletonizer iteration.
    pub open_disk_radius: u8,

    /// Square radius of the second opening in each skeletonizer iteration.
    pub open_square_radius: u8,

    /// Binarization level: values above it become 255, the rest 0.
    pub binarize_threshold: u8,

    /// Disk radius of the final thinning erosion.
    pub erode_disk_radius: u8,

    /// Upper bound on fixed-point iterations before giving up.
    pub max_iterations: usize,
}

impl SolveConfig {
    /// Default border probe radius.
    pub const DEFAULT_BORDER_RADIUS: u8 = 10;
    /// Default similarity tolerance.
    pub const DEFAULT_TOLERANCE: u8 = 2;
    /// Default first opening radius.
    pub const DEFAULT_OPEN_DISK_RADIUS: u8 = 4;
    /// Default second opening radius.
    pub const DEFAULT_OPEN_SQUARE_RADIUS: u8 = 4;
    /// Default binarization level.
    pub const DEFAULT_BINARIZE_THRESHOLD: u8 = 210;
    /// Default final erosion radius.
    pub const DEFAULT_ERODE_DISK_RADIUS: u8 = 3;
    /// Default fixed-point iteration cap.
    pub const DEFAULT_MAX_ITERATIONS: usize = 64;

    /// Check the invariants that the solvers rely on.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::InvalidConfig`] when `tolerance` or
    /// `max_iterations` is zero.
    pub fn validate(&self) -> Result<(), SolveError> {
        if self.tolerance == 0 {
            return Err(SolveError::InvalidConfig(
                "tolerance must be at least 1".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(SolveError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            border_radius: Self::DEFAULT_BORDER_RADIUS,
            similarity: SimilarityRule::default(),
            tolerance: Self::DEFAULT_TOLERANCE,
            open_disk_radius: Self::DEFAULT_OPEN_DISK_RADIUS,
            open_square_radius: Self::DEFAULT_OPEN_SQUARE_RADIUS,
            binarize_threshold: Self::DEFAULT_BINARIZE_THRESHOLD,
            erode_disk_radius: Self::DEFAULT_ERODE_DISK_RADIUS,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// What a strategy found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Solution {
    /// A verified 8-connected route from start to finish.
    Wave(Route),
    /// A thinned open-space skeleton with no connectivity guarantee.
    Morphology(Skeleton),
}

impl Solution {
    /// Number of overlay pixels recolored as path.
    #[must_use]
    pub fn path_pixel_count(&self) -> usize {
        match self {
            Self::Wave(route) => route.len(),
            Self::Morphology(skeleton) => skeleton.marked,
        }
    }
}

/// Result of a successful solve.
///
/// Uses custom `Serialize`/`Deserialize` because `RgbImage` does not
/// implement serde traits. The overlay is serialized as a
/// `(width, height, raw_pixels)` tuple.
#[derive(Debug, Clone)]
pub struct SolveResult {
    /// The cleaned maze with path pixels recolored.
    pub overlay: RgbImage,
    /// Strategy-specific outcome.
    pub solution: Solution,
    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
}

#[derive(Serialize, Deserialize)]
struct SolveResultProxy {
    overlay: (u32, u32, Vec<u8>),
    solution: Solution,
    dimensions: Dimensions,
}

impl Serialize for SolveResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = SolveResultProxy {
            overlay: (
                self.overlay.width(),
                self.overlay.height(),
                self.overlay.as_raw().clone(),
            ),
            solution: self.solution.clone(),
            dimensions: self.dimensions,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SolveResult {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = SolveResultProxy::deserialize(deserializer)?;
        let overlay = RgbImage::from_raw(proxy.overlay.0, proxy.overlay.1, proxy.overlay.2)
            .ok_or_else(|| serde::de::Error::custom("invalid overlay image dimensions"))?;
        Ok(Self {
            overlay,
            solution: proxy.solution,
            dimensions: proxy.dimensions,
        })
    }
}

/// Errors that can occur while solving.
///
/// None of these are fatal: every failure leaves the overlay exactly as
/// the classifier produced it.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// The wave strategy was invoked without a start point.
    #[error("no start point was set")]
    MissingStart,

    /// The search space was exhausted without reaching the finish.
    #[error("finish is unreachable from start")]
    Unreachable,

    /// An unrecognized strategy name was requested.
    #[error("unknown strategy {0:?} (expected \"wave\" or \"morphology\")")]
    InvalidSelector(String),

    /// An endpoint lies outside the image.
    #[error("point {point} is outside the {width}x{height} image")]
    OutOfBounds {
        /// The offending endpoint.
        point: Point,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// The skeletonizer did not reach a fixed point within the cap.
    #[error("morphology did not converge after {iterations} iterations")]
    NoConvergence {
        /// Number of iterations performed.
        iterations: usize,
    },

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty or decoded to a zero-size image.
    #[error("input image data is empty")]
    EmptyInput,

    /// Solver configuration is invalid.
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),
}

/// Serde-compatible proxy for `SolveError`.
///
/// `image::ImageError` does not implement serde, so the `ImageDecode`
/// variant stores its `Display` string instead.
#[derive(Serialize, Deserialize)]
enum SolveErrorProxy {
    MissingStart,
    Unreachable,
    InvalidSelector(String),
    OutOfBounds {
        point: Point,
        width: u32,
        height: u32,
    },
    NoConvergence {
        iterations: usize,
    },
    ImageDecode(String),
    EmptyInput,
    InvalidConfig(String),
}

impl Serialize for SolveError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::MissingStart => SolveErrorProxy::MissingStart,
            Self::Unreachable => SolveErrorProxy::Unreachable,
            Self::InvalidSelector(s) => SolveErrorProxy::InvalidSelector(s.clone()),
            Self::OutOfBounds {
                point,
                width,
                height,
            } => SolveErrorProxy::OutOfBounds {
                point: *point,
                width: *width,
                height: *height,
            },
            Self::NoConvergence { iterations } => SolveErrorProxy::NoConvergence {
                iterations: *iterations,
            },
            Self::ImageDecode(e) => SolveErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => SolveErrorProxy::EmptyInput,
            Self::InvalidConfig(s) => SolveErrorProxy::InvalidConfig(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SolveError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = SolveErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            SolveErrorProxy::MissingStart => Self::MissingStart,
            SolveErrorProxy::Unreachable => Self::Unreachable,
            SolveErrorProxy::InvalidSelector(s) => Self::InvalidSelector(s),
            SolveErrorProxy::OutOfBounds {
                point,
                width,
                height,
            } => Self::OutOfBounds {
                point,
                width,
                height,
            },
            SolveErrorProxy::NoConvergence { iterations } => Self::NoConvergence { iterations },
            // The typed image error cannot be rebuilt; keep the message.
            SolveErrorProxy::ImageDecode(msg) => {
                Self::InvalidConfig(format!("image decode error: {msg}"))
            }
            SolveErrorProxy::EmptyInput => Self::EmptyInput,
            SolveErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
        })
    }
}
