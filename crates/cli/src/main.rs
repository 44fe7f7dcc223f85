//! `poseaxis`: run pipeline stages and query the pose store.
//!
//! Every stage is its own subcommand; `run` executes them all in dependency
//! order. Reports and query results are printed to stdout as JSON, logs go
//! to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use poseaxis_core::config::PipelineConfig;
use poseaxis_db::models::similarity::{SegmentVector, SimilarityQuery};
use poseaxis_db::repositories::SimilarityRepo;
use poseaxis_db::schema::{FULL_SCHEMA, INGEST_SCHEMA};
use poseaxis_pipeline::ingest::remove_source_file;
use poseaxis_pipeline::tagging::parse_mappings;
use poseaxis_pipeline::{Pipeline, Stage};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod detector;

use detector::JsonDetector;

#[derive(Parser)]
#[command(name = "poseaxis", version, about = "Body orientation vectors from pose landmarks")]
struct Cli {
    /// Store file; overrides POSEAXIS_DATABASE_PATH.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Drop and recreate the tables of every stage that runs.
    #[arg(long, global = true)]
    reinit: bool,

    /// Fail on missing tables instead of recreating them.
    #[arg(long, global = true)]
    strict_schema: bool,

    /// Verbosity (-v, -vv, -vvv); ignored when RUST_LOG is set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register images and store the detector's landmarks.
    Ingest(IngestArgs),
    /// Score per-frame detection reliability.
    Reliability,
    /// Infer torso and spine directions.
    Torso,
    /// Infer thigh and crus directions for both sides.
    Limbs,
    /// Derive hip and knee flexion angles.
    Flexion,
    /// Tag frames by source directory.
    Tag(TagArgs),
    /// Run every stage in order, stopping at the first failure.
    Run {
        #[command(flatten)]
        ingest: IngestArgs,
        #[command(flatten)]
        tags: TagArgs,
    },
    /// Unregister images along with their frames and derived rows.
    Remove {
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },
    /// Nearest stored orientations to a query vector.
    Similar(SimilarArgs),
}

#[derive(Args)]
struct IngestArgs {
    /// JSON document of precomputed detections.
    #[arg(long)]
    detections: PathBuf,

    /// Images to ingest; defaults to every image in the detections document.
    sources: Vec<PathBuf>,

    /// Concurrent detector invocations; overrides POSEAXIS_MAX_WORKERS.
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Args)]
struct TagArgs {
    /// `keyword=tag`: tag frames whose source path has a `keyword` directory.
    #[arg(long = "tag", value_name = "KEYWORD=TAG")]
    tags: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Segment {
    Torso,
    TorsoYaw,
    Spine,
    Thigh,
    Crus,
}

impl From<Segment> for SegmentVector {
    fn from(segment: Segment) -> Self {
        match segment {
            Segment::Torso => Self::Torso,
            Segment::TorsoYaw => Self::TorsoYaw,
            Segment::Spine => Self::Spine,
            Segment::Thigh => Self::Thigh,
            Segment::Crus => Self::Crus,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct QueryVector(Vec<f32>);

impl FromStr for QueryVector {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.split(',')
            .map(|part| {
                part.trim()
                    .parse::<f32>()
                    .map_err(|_| format!("'{part}' is not a number"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

#[derive(Args)]
struct SimilarArgs {
    #[arg(value_enum)]
    segment: Segment,

    /// Comma-separated components, e.g. `0,0,-1`; give options first.
    #[arg(allow_hyphen_values = true)]
    vector: QueryVector,

    /// Neighbours fetched from the index before filtering.
    #[arg(short, long, default_value_t = 10)]
    k: u32,

    /// Minimum torso reliability of the frame.
    #[arg(long)]
    min_score: Option<f64>,

    /// Only frames carrying this tag.
    #[arg(long)]
    tag: Option<String>,

    /// Extra SQL predicate over `f` (Frame), `file`, `d` (direction) and `r` (Reliability).
    #[arg(long = "where", value_name = "SQL")]
    predicate: Option<String>,
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn log_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(log_filter(cli.verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = PipelineConfig::from_env().context("Invalid configuration")?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    if cli.strict_schema {
        config.repair_missing_tables = false;
    }

    match cli.command {
        Command::Ingest(args) => {
            let report = ingest_pipeline(config, args)
                .await?
                .with_reset(cli.reinit)
                .run_stage(Stage::Ingest)
                .await?;
            print_json(&report)
        }
        Command::Reliability => run_stage(config, cli.reinit, Stage::Reliability).await,
        Command::Torso => run_stage(config, cli.reinit, Stage::Torso).await,
        Command::Limbs => run_stage(config, cli.reinit, Stage::Limbs).await,
        Command::Flexion => run_stage(config, cli.reinit, Stage::Flexion).await,
        Command::Tag(args) => {
            let report = Pipeline::new(config)
                .with_reset(cli.reinit)
                .with_tags(parse_mappings(&args.tags))
                .run_stage(Stage::Tagging)
                .await?;
            print_json(&report)
        }
        Command::Run { ingest, tags } => {
            let pipeline = ingest_pipeline(config, ingest)
                .await?
                .with_reset(cli.reinit)
                .with_tags(parse_mappings(&tags.tags));
            let reports = pipeline.run_all().await?;
            print_json(&reports)
        }
        Command::Remove { sources } => remove(config, &sources).await,
        Command::Similar(args) => similar(config, args).await,
    }
}

async fn run_stage(config: PipelineConfig, reset: bool, stage: Stage) -> anyhow::Result<()> {
    let report = Pipeline::new(config).with_reset(reset).run_stage(stage).await?;
    print_json(&report)
}

async fn ingest_pipeline(mut config: PipelineConfig, args: IngestArgs) -> anyhow::Result<Pipeline> {
    if let Some(workers) = args.workers {
        anyhow::ensure!(workers > 0, "--workers must be positive");
        config.max_workers = workers;
    }
    let detector = JsonDetector::load(&args.detections).await?;
    let sources = if args.sources.is_empty() {
        detector.images()
    } else {
        args.sources
    };
    Ok(Pipeline::new(config)
        .with_detector(Arc::new(detector))
        .with_sources(sources))
}

async fn remove(config: PipelineConfig, sources: &[PathBuf]) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config);
    let mut store = pipeline.open_store(&INGEST_SCHEMA).await?;

    let result = async {
        let mut tx = store.begin().await?;
        let mut removed = Vec::new();
        for path in sources {
            if remove_source_file(&mut *tx, path).await? {
                removed.push(path.display().to_string());
            } else {
                tracing::warn!(path = %path.display(), "Not registered");
            }
        }
        tx.commit().await?;
        anyhow::Ok(removed)
    }
    .await;

    store.close().await?;
    print_json(&result?)
}

async fn similar(config: PipelineConfig, args: SimilarArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config);
    let mut store = pipeline.open_store(&FULL_SCHEMA).await?;

    let query = SimilarityQuery {
        min_score: args.min_score,
        tag: args.tag,
        predicate: args.predicate,
        ..SimilarityQuery::new(args.segment.into(), args.vector.0, args.k)
    };
    let result = SimilarityRepo::search(store.conn()?, &query).await;

    store.close().await?;
    print_json(&result?)
}
