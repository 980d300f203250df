mod common;
mod logic;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use trackroll_engine::{SimulationResult, Simulator};

use common::parse_segment_specs;
use logic::reports::ReportOptions;
use logic::{FileSource, RunOverrides, resolve_config, write_exports, write_user_history};

#[derive(Debug, Parser)]
#[command(name = "trackroll", version = "0.1.0")]
#[command(about = "Deterministic dice-track engagement simulator with reports and CSV export")]
struct Args {
    /// Number of simulated users
    #[arg(long)]
    users: Option<usize>,

    /// Sessions each user is offered per day
    #[arg(long)]
    sessions_per_day: Option<u32>,

    /// Dice rolled per played session (before segment extras)
    #[arg(long)]
    rolls_per_session: Option<u32>,

    /// Percent of sessions actually played (0-100)
    #[arg(long)]
    participation: Option<f64>,

    /// Sixes roll again (ignored when segments are configured)
    #[arg(long)]
    explode_six: bool,

    /// Seed for the run; any integer, wrapped to 32 bits
    #[arg(long, allow_negative_numbers = true)]
    seed: Option<i64>,

    /// Number of simulated days
    #[arg(long)]
    days: Option<u32>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON segment table (list, or object keyed by segment id)
    #[arg(long)]
    segments: Option<PathBuf>,

    /// Segment shorthand NAME:PERCENT[:extra=N][:explode][:cost=X] (repeatable, comma-separated)
    #[arg(long = "segment", value_name = "SPEC")]
    segment: Vec<String>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "markdown", "json"])]
    report: String,

    /// Include the top N of the final standings
    #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "20")]
    leaderboard: Option<usize>,

    /// Print the session history of one user (1-based id)
    #[arg(long, value_name = "USER_ID")]
    inspect: Option<usize>,

    /// Directory to write the CSV exports into
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Result<RunOverrides> {
        Ok(RunOverrides {
            users: self.users,
            sessions_per_day: self.sessions_per_day,
            rolls_per_session: self.rolls_per_session,
            participation: self.participation,
            explode_six: self.explode_six,
            seed: self.seed,
            days: self.days,
            config: self.config.clone(),
            segments_file: self.segments.clone(),
            segments: parse_segment_specs(&self.segment)?,
        })
    }

    const fn report_options(&self) -> ReportOptions {
        ReportOptions {
            leaderboard: self.leaderboard,
        }
    }

    fn is_console(&self) -> bool {
        self.report == "console"
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = resolve_config(&args.overrides()?, &FileSource)?;
    if args.is_console() {
        announce_banner();
    }

    let start_time = Instant::now();
    let mut simulator = Simulator::new(config);
    simulator.run()?;
    let elapsed = start_time.elapsed();
    let result = simulator
        .last()
        .context("simulation finished without a result")?;

    let mut output_target = OutputTarget::new(args.output.clone())?;
    write_reports(&args, &mut output_target, result, elapsed)?;

    if let Some(dir) = &args.export_dir {
        let summary = write_exports(dir, result)?;
        if args.is_console() {
            writeln!(
                &mut output_target,
                "📁 Exported {} files to {}",
                summary.files.len(),
                dir.display()
            )?;
            if summary.detailed_skipped {
                writeln!(
                    &mut output_target,
                    "   Detailed history rows omitted for populations above {}",
                    logic::export::DETAILED_HISTORY_MAX_USERS
                )?;
            }
        }
    }

    if let Some(user_id) = args.inspect {
        let days = match simulator.inspect(user_id) {
            Ok(days) => days,
            Err(err) => {
                output_target.flush_inner()?;
                return Err(anyhow!(err));
            }
        };
        let segment = result.segment_name(user_id - 1);
        write_user_history(&mut output_target, user_id, segment, days)?;
    }

    if args.is_console() {
        writeln!(&mut output_target)?;
        writeln!(
            &mut output_target,
            "🏁 Total time: {:?}",
            start_time.elapsed()
        )?;
    }
    output_target.flush_inner()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn announce_banner() {
    println!("{}", "🎲 Trackroll Simulator".bright_cyan().bold());
    println!("{}", "======================".cyan());
}

fn write_reports(
    args: &Args,
    output_target: &mut OutputTarget,
    result: &SimulationResult,
    elapsed: Duration,
) -> Result<()> {
    let options = args.report_options();
    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(output_target, result, options)?,
        "markdown" => {
            logic::reports::generate_markdown_report(output_target, result, options, elapsed)?;
        }
        _ => logic::reports::generate_console_report(output_target, result, options, elapsed)?,
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
