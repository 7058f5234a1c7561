use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mpgg::{
    MemoryHost, Project, ScanType, Session, SessionOptions, SourceSummary,
    analysis::detect_color_range,
    indexer::{index_with_options, is_project, project_path},
};
use num_rational::Rational64;
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  mpgg info VTS_01_1.VOB\n  mpgg info VTS_01_1.VOB.d2v --json\n  mpgg plan movie.mkv --recover --deinterlace --ceil\n  mpgg plan VTS_01_1.VOB --floor-to 24000/1001 --json\n  mpgg completions zsh > _mpgg";

#[derive(Debug, Parser)]
#[command(
    name = "mpgg",
    version,
    about = "Inspect DVD MPEG streams and plan their scan and frame rate normalization",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Log per-frame stage reports.
    #[arg(long, global = true)]
    verbose: bool,

    /// DGIndex executable.
    #[arg(long, global = true)]
    dgindex: Option<PathBuf>,

    /// mkvextract executable.
    #[arg(long, global = true)]
    mkvextract: Option<PathBuf>,

    /// Index again even if a project already exists next to the input.
    #[arg(long, global = true)]
    reindex: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Summarize scan type, pulldown and aspect ratio of a source.
    #[command(
        about = "Print source summary",
        visible_alias = "probe",
        after_help = "Examples:\n  mpgg info VTS_01_1.VOB\n  mpgg info VTS_01_1.VOB.d2v --json"
    )]
    Info {
        /// Input MPEG, VOB, MKV or D2V path.
        input: PathBuf,

        /// Output the summary as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run the processing stages and print the resulting frame plan.
    #[command(
        about = "Print the frame plan",
        after_help = "Examples:\n  mpgg plan VTS_01_1.VOB --recover --ceil\n  mpgg plan VTS_01_1.VOB --floor --json"
    )]
    Plan {
        /// Input MPEG, VOB, MKV or D2V path.
        input: PathBuf,
        /// Recover progressive frames from split fields.
        #[arg(long)]
        recover: bool,
        /// Mark the remaining interlaced frames as deinterlaced.
        #[arg(long)]
        deinterlace: bool,
        /// Duplicate frames up to the source rate.
        #[arg(long, conflicts_with_all = ["floor", "floor_to"])]
        ceil: bool,
        /// Drop one frame per pulldown cycle.
        #[arg(long, conflicts_with = "floor_to")]
        floor: bool,
        /// Drop frames down to an explicit rate, e.g. 24000/1001.
        #[arg(long, value_name = "RATE")]
        floor_to: Option<String>,
        /// Keep the source rate for fully progressive pulldown sources.
        #[arg(long)]
        no_auto_floor: bool,
        /// Output the plan as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Index a source with DGIndex and print where the project went.
    #[command(about = "Index a source")]
    Index {
        /// Input MPEG, VOB or MKV path.
        input: PathBuf,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_rate(value: &str) -> Option<Rational64> {
    let rate = match value.split_once('/') {
        Some((numerator, denominator)) => {
            let denominator: i64 = denominator.trim().parse().ok()?;
            if denominator == 0 {
                return None;
            }
            Rational64::new(numerator.trim().parse().ok()?, denominator)
        }
        None => Rational64::from_integer(value.trim().parse().ok()?),
    };
    (rate > Rational64::from_integer(0)).then_some(rate)
}

fn session_options(global: &GlobalOptions) -> SessionOptions {
    let mut options = SessionOptions::new()
        .with_verbose(global.verbose)
        .with_reuse_index(!global.reindex);
    if let Some(path) = &global.dgindex {
        options = options.with_dgindex_path(path);
    }
    if let Some(path) = &global.mkvextract {
        options = options.with_mkvextract_path(path);
    }
    options
}

fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Index `input`, with a spinner when DGIndex actually has to run.
fn load_project(
    input: &Path,
    options: &SessionOptions,
    reindex: bool,
) -> Result<Project, Box<dyn std::error::Error>> {
    let needs_indexing = !is_project(input) && (reindex || !project_path(input).is_file());
    let spinner = if needs_indexing {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        spinner.set_message(format!("indexing {}", input.display()));
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    } else {
        None
    };

    let result = index_with_options(input, options);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    Ok(result?)
}

fn summary_json(summary: &SourceSummary) -> serde_json::Value {
    json!({
        "total_frames": summary.total_frames,
        "progressive_frames": summary.progressive_frames,
        "interlaced_frames": summary.interlaced_frames,
        "progressive_percentage": summary.progressive_percentage(),
        "pulldown_cycle": summary.pulldown,
        "pulldown_pattern": summary.pulldown_pattern(),
        "variable_frame_rate": summary.variable_frame_rate,
        "frame_rate": summary.frame_rate.to_string(),
        "standard": summary.standard,
        "display_aspect_ratio": summary.display_aspect_ratio,
        "storage_aspect_ratio": summary.storage_aspect_ratio,
        "pixel_aspect_ratio": summary.pixel_aspect_ratio,
        "color_range": summary.color_range.to_string(),
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);
    let options = session_options(&cli.global);

    match cli.command {
        Commands::Info { input, json } => {
            let project = load_project(&input, &options, cli.global.reindex)?;
            let mut summary = SourceSummary::from_project(&project);
            summary.color_range = detect_color_range(&project);
            if json {
                let mut payload = summary_json(&summary);
                payload["project"] = json!(project.path.display().to_string());
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{} {}", "Project:".bold(), project.path.display());
                for video in &project.videos {
                    println!("{} {}", "Video:".bold(), video.display());
                }
                println!("{summary}");
            }
        }
        Commands::Plan {
            input,
            recover,
            deinterlace,
            ceil,
            floor,
            floor_to,
            no_auto_floor,
            json,
        } => {
            let floor_rate = floor_to
                .as_deref()
                .map(|value| parse_rate(value).ok_or(format!("invalid --floor-to rate: {value}")))
                .transpose()?;

            let project = load_project(&input, &options, cli.global.reindex)?;
            let options = options.with_auto_floor(!no_auto_floor);
            let mut session = Session::from_project(MemoryHost::new(), project, options)?;
            if let Some(stage) = session.normalized() {
                eprintln!(
                    "{} {}",
                    "note:".cyan().bold(),
                    format!("source is fully progressive pulldown, applied {stage}()").cyan()
                );
            }

            if recover {
                session.recover(cli.global.verbose)?;
            }
            if deinterlace {
                session.deinterlace(
                    |clip, order| Ok(clip.filtered(format!("deinterlace {order}"))),
                    cli.global.verbose,
                )?;
            }
            if ceil {
                session.ceil()?;
            } else if floor {
                session.floor()?;
            } else if let Some(rate) = floor_rate {
                session.floor_to(rate)?;
            }

            let plan = session.plan();
            let frames = session.clip().frames();
            if json {
                let payload = json!({
                    "project": session.project().path.display().to_string(),
                    "normalized": session.normalized(),
                    "recovered": session.recovered(),
                    "deinterlaced": session.deinterlaced(),
                    "frames": plan.records().iter().zip(frames).map(|(record, frame)| json!({
                        "source": record.source,
                        "scan": record.scan.to_string(),
                        "top": record.top,
                        "bottom": record.bottom,
                        "order": record.field_order().to_string(),
                        "duration": record.duration.to_string(),
                        "origin": format!("{:?}", record.origin),
                        "clip": frame.to_string(),
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for (position, (record, frame)) in plan.records().iter().zip(frames).enumerate() {
                    let scan = match record.scan {
                        ScanType::Progressive => record.scan.to_string().green(),
                        ScanType::Interlaced => record.scan.to_string().yellow(),
                        ScanType::MixedField => record.scan.to_string().red(),
                    };
                    println!(
                        "{position:>6}  {scan:<12}  {:<4} {:>12}s  {frame}",
                        record.field_order().to_string(),
                        record.duration.to_string()
                    );
                }
                println!(
                    "{} {} frames, {} recovered, {} deinterlaced",
                    "Total:".bold(),
                    plan.len(),
                    session.recovered().len(),
                    session.deinterlaced().len()
                );
            }
        }
        Commands::Index { input } => {
            let project = load_project(&input, &options, cli.global.reindex)?;
            println!(
                "{} {} ({} pictures)",
                "Indexed:".green().bold(),
                project.path.display(),
                project.pictures.len()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "mpgg", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
