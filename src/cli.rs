//! Command line front end shared by the search executables.
//!
//! Every executable takes `<world> <start-x> <start-y> <end-x> <end-y>`, loads
//! `<worlds-dir>/<world>.world` and hands the outcome to a [`ResultWriter`].

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, ValueEnum};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::errors::PathPlannerError;
use crate::geometry::Point;
use crate::graph_algos::Route;
use crate::parallel_algos::ThresholdPolicy;
use crate::planner::{Algorithm, Planner, PlannerConfig};
use crate::world::World;


const WORLD_EXT: &str = "world";


// --- Command Line Arguments ---

#[derive(Parser, Debug, Clone)]
#[command(version)]
#[command(about = "Find the cheapest path between two tiles of a world")]
pub struct SearchCommand {
    #[command(flatten)]
    pub search: SearchArgs,
}

/// Inputs of a single search
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Name of the world, read from <WORLDS_DIR>/<WORLD>.world
    pub world: String,
    pub start_x: u32,
    pub start_y: u32,
    pub end_x: u32,
    pub end_y: u32,

    /// Directory holding the world files
    #[arg(long, default_value = "../worlds")]
    pub worlds_dir: PathBuf,

    /// Worker threads for the parallel searches, defaults to the available cores
    #[arg(long)]
    pub threads: Option<usize>,

    /// How parallel fringe search raises its threshold
    #[arg(long, value_enum, default_value_t = CliThresholdPolicy::MaxTileCost)]
    pub threshold_policy: CliThresholdPolicy,
}

impl SearchArgs {
    pub fn start(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }

    pub fn goal(&self) -> Point {
        Point::new(self.end_x, self.end_y)
    }

    pub fn world_path(&self) -> PathBuf {
        self.worlds_dir.join(format!("{}.{}", self.world, WORLD_EXT))
    }

    pub fn planner_config(&self) -> PlannerConfig {
        let config = PlannerConfig::default().with_threshold_policy(self.threshold_policy.into());
        match self.threads {
            Some(threads) => config.with_threads(threads),
            None => config,
        }
    }
}

/// CLI threshold policy selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CliThresholdPolicy {
    /// Raise the threshold by the highest tile cost
    #[default]
    MaxTileCost,
    /// Raise the threshold to the cheapest deferred node
    MinDeferred,
}

impl From<CliThresholdPolicy> for ThresholdPolicy {
    fn from(cli: CliThresholdPolicy) -> Self {
        match cli {
            CliThresholdPolicy::MaxTileCost => ThresholdPolicy::MaxTileCost,
            CliThresholdPolicy::MinDeferred => ThresholdPolicy::MinDeferred,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(version)]
#[command(about = "Run every search on the same world and endpoints")]
pub struct CompareArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Search a random SIZE x SIZE world instead of reading one, WORLD only names it
    #[arg(long, value_name = "SIZE")]
    pub random_size: Option<u32>,

    /// Seed of the random world
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}


/// Errors that end an executable
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Plan(#[from] PathPlannerError),
    #[error("failed to write results: {0}")]
    Output(#[from] io::Error),
}


/// Everything known about one finished search
#[derive(Debug, Clone, Copy)]
pub struct SearchReport<'a> {
    pub world_name: &'a str,
    pub algorithm: Algorithm,
    pub route: &'a Route,
    pub elapsed: Duration,
}

impl SearchReport<'_> {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// Destination of search results
pub trait ResultWriter {
    fn write(&mut self, report: &SearchReport) -> io::Result<()>;

    /// Called instead of `write` when a search fails
    fn write_failure(&mut self, algorithm: Algorithm, error: &PathPlannerError) -> io::Result<()>;
}

/// Human readable summaries
pub struct TextWriter<W> {
    out: W,
    show_path: bool,
}

impl TextWriter<io::Stdout> {
    pub fn stdout(show_path: bool) -> Self {
        Self::new(io::stdout(), show_path)
    }
}

impl<W: Write> TextWriter<W> {
    pub fn new(out: W, show_path: bool) -> Self {
        Self { out, show_path }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultWriter for TextWriter<W> {
    fn write(&mut self, report: &SearchReport) -> io::Result<()> {
        writeln!(
            self.out,
            "{:<10} {}: cost {}, {} tiles, {} expansions, {} ms",
            report.algorithm.name(),
            report.world_name,
            report.route.cost,
            report.route.path.len(),
            report.route.expanded,
            report.elapsed_ms(),
        )?;
        if self.show_path {
            let points: Vec<String> = report.route.path.iter().map(Point::to_string).collect();
            writeln!(self.out, "{}", points.join(" "))?;
        }
        self.out.flush()
    }

    fn write_failure(&mut self, algorithm: Algorithm, error: &PathPlannerError) -> io::Result<()> {
        writeln!(self.out, "{:<10} failed: {}", algorithm.name(), error)?;
        self.out.flush()
    }
}


/// Entry point of the single algorithm executables
pub fn run(algorithm: Algorithm) -> ExitCode {
    init_logging();
    let args = match SearchCommand::try_parse() {
        Ok(command) => command.search,
        Err(err) => return exit_for_usage(err),
    };

    let mut writer = TextWriter::stdout(true);
    match execute(algorithm, &args, &mut writer) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {}", algorithm.name(), err);
            ExitCode::FAILURE
        }
    }
}

/// Entry point of the comparison executable
pub fn run_comparison() -> ExitCode {
    init_logging();
    let args = match CompareArgs::try_parse() {
        Ok(args) => args,
        Err(err) => return exit_for_usage(err),
    };

    let mut writer = TextWriter::stdout(false);
    match compare(&args, &mut writer) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("compare: {err}");
            ExitCode::FAILURE
        }
    }
}


/// Load the world named by `args` and run one search on it
pub fn execute<R: ResultWriter>(algorithm: Algorithm, args: &SearchArgs, writer: &mut R) -> Result<Route, CliError> {
    let world = World::load(args.world_path()).map_err(PathPlannerError::from)?;
    let planner = Planner::new(&world, args.planner_config())?;

    let (route, elapsed) = planner.plan_timed(algorithm, args.start(), args.goal())?;
    writer.write(&SearchReport { world_name: &args.world, algorithm, route: &route, elapsed })?;
    Ok(route)
}

/// Run every algorithm on the same inputs, returns how many of them failed
pub fn compare<R: ResultWriter>(args: &CompareArgs, writer: &mut R) -> Result<usize, CliError> {
    let search = &args.search;
    let world = match args.random_size {
        Some(size) => World::random(size, size, 0.8, 9, &mut StdRng::seed_from_u64(args.seed)),
        None => World::load(search.world_path()),
    }
    .map_err(PathPlannerError::from)?;
    info!("compare: {}x{} world with {} open tiles", world.width(), world.height(), world.open_tile_count());

    let planner = Planner::new(&world, search.planner_config())?;
    world.validate_endpoint(search.start())?;
    world.validate_endpoint(search.goal())?;

    let mut failures = 0;
    for algorithm in Algorithm::ALL {
        match planner.plan_timed(algorithm, search.start(), search.goal()) {
            Ok((route, elapsed)) => {
                writer.write(&SearchReport { world_name: &search.world, algorithm, route: &route, elapsed })?;
            }
            Err(err) => {
                failures += 1;
                writer.write_failure(algorithm, &err)?;
            }
        }
    }
    Ok(failures)
}


fn init_logging() {
    // a second init only happens in tests, keep the first logger
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).try_init();
}

/// Help and version requests exit cleanly, anything else is a usage error
fn exit_for_usage(err: clap::Error) -> ExitCode {
    let _ = err.print();
    if err.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
