//! Solve diagnostics: timing and counts for each stage.
//!
//! Every call to [`solve_with_diagnostics`] collects diagnostics
//! alongside the solve result. Time is read through the [`Clock`] trait
//! so this crate stays free of platform timing code; binaries supply an
//! implementation.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::Maze;
use crate::strategy::{MazeSolver, StrategyKind};
use crate::types::{Dimensions, Point, Solution, SolveConfig, SolveError, SolveResult};

/// Source of monotonic time.
pub trait Clock {
    /// Opaque instant type.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveDiagnostics {
    /// Image decoding.
    pub decode: StageDiagnostics,
    /// Border neutralization.
    pub classify: StageDiagnostics,
    /// Strategy search, including overlay marking.
    pub search: StageDiagnostics,
    /// Total wall-clock duration of the solve (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: SolveSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Classification metrics.
    Classify {
        /// Square radius of the border probe.
        border_radius: u8,
        /// Pixels neutralized as border decoration.
        border_pixel_count: u64,
        /// Pure white pixels left in the overlay.
        open_pixel_count: u64,
    },
    /// Wave search metrics.
    Wave {
        /// Cells reached by the wave.
        explored_cells: usize,
        /// Cells on the route, endpoints included.
        route_cells: usize,
        /// Moves from start to finish.
        hop_count: usize,
    },
    /// Skeletonizer metrics.
    Morphology {
        /// Iterations to the fixed point.
        iterations: usize,
        /// Pixels painted as path.
        marked_pixels: usize,
    },
}

/// High-level summary for the whole solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveSummary {
    /// Strategy that ran.
    pub strategy: StrategyKind,
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Pixels painted as path.
    pub path_pixel_count: usize,
}

/// Decode, classify and solve, timing each stage with `clock`.
///
/// # Errors
///
/// Same as [`crate::solve`].
pub fn solve_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    start: Option<Point>,
    finish: Option<Point>,
    config: &SolveConfig,
    clock: &C,
) -> Result<(SolveResult, SolveDiagnostics), SolveError> {
    config.validate()?;
    let total_start = clock.now();

    let t = clock.now();
    let image = crate::decode::decode_rgb(image_bytes)?;
    let dimensions = Dimensions::of(&image);
    let pixel_count = u64::from(dimensions.width) * u64::from(dimensions.height);
    let decode = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: dimensions.width,
            height: dimensions.height,
            pixel_count,
        },
    };

    let t = clock.now();
    let mut maze = Maze::classify(&image, config.border_radius);
    let classify = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Classify {
            border_radius: config.border_radius,
            border_pixel_count: maze.border_pixels(),
            open_pixel_count: maze.open_pixel_count(),
        },
    };

    let t = clock.now();
    let solution = config.strategy.solve(&mut maze, start, finish, config)?;
    let metrics = match &solution {
        Solution::Wave(route) => StageMetrics::Wave {
            explored_cells: route.explored(),
            route_cells: route.len(),
            hop_count: route.hop_count(),
        },
        Solution::Morphology(skeleton) => StageMetrics::Morphology {
            iterations: skeleton.iterations,
            marked_pixels: skeleton.marked,
        },
    };
    let search = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics,
    };

    let summary = SolveSummary {
        strategy: config.strategy,
        image_width: dimensions.width,
        image_height: dimensions.height,
        pixel_count,
        path_pixel_count: solution.path_pixel_count(),
    };
    let diagnostics = SolveDiagnostics {
        decode,
        classify,
        search,
        total_duration: clock.elapsed(&total_start),
        summary,
    };
    let result = SolveResult {
        overlay: maze.into_overlay(),
        solution,
        dimensions,
    };
    Ok((result, diagnostics))
}

impl SolveDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Solve Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)  |  Strategy: {}",
            self.summary.image_width,
            self.summary.image_height,
            self.summary.pixel_count,
            self.summary.strategy,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Decode", &self.decode),
            ("Classify", &self.classify),
            ("Search", &self.search),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Path pixels: {}",
            self.summary.path_pixel_count
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
pub fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Classify {
            border_radius,
            border_pixel_count,
            open_pixel_count,
        } => format!("r={border_radius} border={border_pixel_count} open={open_pixel_count}"),
        StageMetrics::Wave {
            explored_cells,
            route_cells,
            hop_count,
        } => format!("explored={explored_cells} route={route_cells} cells ({hop_count} hops)"),
        StageMetrics::Morphology {
            iterations,
            marked_pixels,
        } => format!("{iterations} iterations, {marked_pixels} px marked"),
    }
}
