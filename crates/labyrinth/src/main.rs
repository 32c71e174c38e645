//! labyrinth: solve a maze image from the command line.
//!
//! Picks a strategy by name, runs it on the given image and writes the
//! overlay with the route painted on it. Per-stage diagnostics go to
//! stdout, progress logging to stderr.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin labyrinth -- wave maze.png --start 40,12 --finish 310,290 -o solved.png
//! cargo run --release --bin labyrinth -- morphology maze.png -o skeleton.png
//! ```
//!
//! Set `RUST_LOG=debug` for stage-level logging from the solver.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use labyrinth_solver::diagnostics::{Clock, SolveDiagnostics};
use labyrinth_solver::{Maze, Point, SimilarityRule, SolveConfig, SolveError, StrategyKind};

/// Paint the route through a maze image.
///
/// Runs the selected solving strategy on the image and prints per-stage
/// timing and count diagnostics.
#[derive(Parser)]
#[command(name = "labyrinth", version)]
struct Cli {
    /// Solving strategy: "wave" or "morphology".
    strategy: String,

    /// Path to the maze image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Start cell as ROW,COL. Required by the wave strategy.
    #[arg(long, value_parser = parse_point)]
    start: Option<Point>,

    /// Finish cell as ROW,COL.
    #[arg(long, value_parser = parse_point)]
    finish: Option<Point>,

    /// Write the solved overlay as an image (format from the extension).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Draw start and finish circles on the written overlay.
    #[arg(long)]
    markers: bool,

    /// Accept endpoints that are not pure white in the cleaned maze.
    #[arg(long)]
    allow_any_endpoint: bool,

    /// Square radius of the border cleanup probe.
    #[arg(long, default_value_t = SolveConfig::DEFAULT_BORDER_RADIUS)]
    border_radius: u8,

    /// Walkability rule between neighboring cells.
    #[arg(long, value_enum, default_value_t = Similarity::Absolute)]
    similarity: Similarity,

    /// Neighbors are passable when their blue values differ by less than this.
    #[arg(long, default_value_t = SolveConfig::DEFAULT_TOLERANCE, value_parser = clap::builder::RangedU64ValueParser::<u8>::new().range(1..))]
    tolerance: u8,

    /// Iteration cap for the morphology strategy.
    #[arg(long, default_value_t = SolveConfig::DEFAULT_MAX_ITERATIONS, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    max_iterations: usize,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full solver config as a JSON string.
    ///
    /// When provided, all other tuning flags are ignored; the positional
    /// strategy still wins over any `strategy` field in the JSON.
    #[arg(long)]
    config_json: Option<String>,
}

/// Walkability rule selection.
#[derive(Clone, Copy, ValueEnum)]
enum Similarity {
    /// Absolute difference of the blue channel.
    Absolute,
    /// Only brightening steps count against the tolerance.
    Saturating,
}

/// Parse a `ROW,COL` pair.
fn parse_point(s: &str) -> Result<Point, String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got {s:?}"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|e| format!("invalid row {row:?}: {e}"))?;
    let col = col
        .trim()
        .parse()
        .map_err(|e| format!("invalid column {col:?}: {e}"))?;
    Ok(Point::new(row, col))
}

/// Build a [`SolveConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual tuning flags are ignored. Missing JSON fields take their
/// defaults.
fn config_from_cli(cli: &Cli, strategy: StrategyKind) -> Result<SolveConfig, SolveError> {
    let config = if let Some(ref json) = cli.config_json {
        let parsed: SolveConfig = serde_json::from_str(json)
            .map_err(|e| SolveError::InvalidConfig(format!("--config-json: {e}")))?;
        SolveConfig {
            strategy,
            ..parsed
        }
    } else {
        SolveConfig {
            strategy,
            border_radius: cli.border_radius,
            similarity: match cli.similarity {
                Similarity::Absolute => SimilarityRule::Absolute,
                Similarity::Saturating => SimilarityRule::Saturating,
            },
            tolerance: cli.tolerance,
            max_iterations: cli.max_iterations,
            ..SolveConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

/// Reject endpoints that fall outside the image or on non-open pixels.
fn check_endpoints(
    image_bytes: &[u8],
    config: &SolveConfig,
    endpoints: [(&str, Option<Point>); 2],
) -> Result<(), String> {
    let image = labyrinth_solver::decode::decode_rgb(image_bytes).map_err(|e| e.to_string())?;
    let maze = Maze::classify(&image, config.border_radius);
    for (name, point) in endpoints {
        let Some(point) = point else { continue };
        maze.check_bounds(point)
            .map_err(|e| format!("{name}: {e}"))?;
        if !maze.is_selectable(point) {
            return Err(format!(
                "{name} {point} is not inside the labyrinth (pass --allow-any-endpoint to override)"
            ));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let strategy: StrategyKind = match cli.strategy.parse() {
        Ok(s) => s,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let config = match config_from_cli(&cli, strategy) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "image: {} ({} bytes), strategy: {strategy}, runs: {}",
        cli.image_path.display(),
        image_bytes.len(),
        cli.runs,
    );
    log::debug!("config: {config:#?}");

    if !cli.allow_any_endpoint
        && let Err(msg) = check_endpoints(
            &image_bytes,
            &config,
            [("start", cli.start), ("finish", cli.finish)],
        )
    {
        log::error!("{msg}");
        return ExitCode::FAILURE;
    }

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            log::info!("run {}/{}", run + 1, cli.runs);
        }

        match labyrinth_solver::diagnostics::solve_with_diagnostics(
            &image_bytes,
            cli.start,
            cli.finish,
            &config,
            &StdClock,
        ) {
            Ok((result, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            log::error!("serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write the overlay on the first run only.
                if run == 0
                    && let Some(ref output) = cli.output
                {
                    let mut overlay = result.overlay;
                    if cli.markers {
                        labyrinth_solver::overlay::draw_endpoints(
                            &mut overlay,
                            cli.start,
                            cli.finish,
                        );
                    }
                    match overlay.save(output) {
                        Ok(()) => log::info!("overlay written to {}", output.display()),
                        Err(e) => {
                            log::error!("writing overlay to {}: {e}", output.display());
                            return ExitCode::FAILURE;
                        }
                    }
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                log::error!("solve failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&SolveDiagnostics) -> Duration;

/// Print aggregated timings across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[SolveDiagnostics]) {
    if all_diagnostics.is_empty() {
        return;
    }

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();
    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Decode", |d| d.decode.duration),
        ("Classify", |d| d.classify.duration),
        ("Search", |d| d.search.duration),
    ];
    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
