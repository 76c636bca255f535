//! cliparchive - operator and worker command line for the clip archive.
//!
//! Records are printed as JSON on stdout; logs go to stderr.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use cliparchive::config::{default_config_path, load_config, LoggingConfig};
use cliparchive::{
    ArchiveError, Classification, Clip, ClipArchive, ClipError, Config, ExternalMatch, Fault,
    MatchPolicy, MediaUris, NewEvent, Operation,
};

#[derive(Parser, Debug)]
#[command(name = "cliparchive")]
#[command(about = "Clip archive: processing queue, tags and match-history correlation")]
#[command(version)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, env = "CLIPARCHIVE_CONFIG")]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, env = "CLIPARCHIVE_DATABASE")]
    database: Option<PathBuf>,

    /// Correlation policy, overriding the config
    #[arg(long)]
    policy: Option<MatchPolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a new clip and enqueue it for transcoding
    Ingest {
        #[arg(long)]
        owner: i64,
        #[arg(long)]
        filename: String,
        /// Creation time (RFC 3339), defaults to now
        #[arg(long)]
        created_at: Option<DateTime<Utc>>,
    },
    /// Enqueue another operation for a clip whose last entry is terminal
    Enqueue {
        clip_id: i64,
        #[command(flatten)]
        operation: OperationArgs,
    },
    /// List entries waiting for a worker
    Pending,
    /// Claim the oldest pending entry and mark it transcoding
    Claim,
    /// pending -> queued
    Ack { clip_id: i64 },
    /// queued/pending -> transcoding
    Start { clip_id: i64 },
    /// transcoding -> finished, recording the clip duration
    Finish {
        clip_id: i64,
        #[arg(long)]
        duration: f64,
    },
    /// Any active state -> error
    Fail {
        clip_id: i64,
        #[arg(long)]
        message: String,
    },
    /// Show the queue entry of one clip, or every entry
    Queue { clip_id: Option<i64> },
    /// Show a clip with its media URIs
    Show { clip_id: i64 },
    /// List processed clips created on a UTC date (YYYY-MM-DD)
    Day { date: NaiveDate },
    /// Set a clip's tags to exactly the given names
    Tag { clip_id: i64, names: Vec<String> },
    /// List the tag vocabulary
    Tags,
    /// Overwrite a clip's map, legend and game mode
    Classify {
        clip_id: i64,
        #[arg(long)]
        map: Option<i64>,
        #[arg(long)]
        legend: Option<i64>,
        #[arg(long)]
        mode: Option<String>,
    },
    /// Match a clip against its owner's match history
    Correlate { clip_id: i64 },
    /// Delete a clip with its queue entry and tag memberships
    Delete { clip_id: i64 },
    /// Enqueue clips that have no queue entry
    Repair,
    #[command(subcommand)]
    Events(EventsCommand),
    #[command(subcommand)]
    Catalog(CatalogCommand),
}

#[derive(Args, Debug)]
struct OperationArgs {
    /// Trim to [START, END) seconds
    #[arg(long, num_args = 2, value_names = ["START", "END"], conflicts_with = "combine_with")]
    trim: Option<Vec<i64>>,
    /// Append another clip
    #[arg(long)]
    combine_with: Option<i64>,
}

impl OperationArgs {
    fn to_operation(&self) -> Operation {
        match (&self.trim, self.combine_with) {
            (Some(window), _) if window.len() == 2 => Operation::Trim {
                start_seconds: window[0],
                end_seconds: window[1],
            },
            (_, Some(with_clip_id)) => Operation::Combine { with_clip_id },
            _ => Operation::Transcode,
        }
    }
}

#[derive(Subcommand, Debug)]
enum EventsCommand {
    /// Import matches from a JSON array file
    Import {
        file: PathBuf,
        /// Entries are already resolved to catalog ids
        #[arg(long)]
        resolved: bool,
    },
    /// List a user's matches
    List { subject_id: i64 },
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    AddUser {
        name: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        uid: Option<String>,
    },
    AddMap {
        name: String,
        #[arg(long)]
        log_name: Option<String>,
        #[arg(long)]
        card_image: Option<String>,
    },
    AddLegend {
        name: String,
        #[arg(long)]
        card_image: Option<String>,
    },
    List,
}

#[derive(Serialize)]
struct ClipView {
    #[serde(flatten)]
    clip: Clip,
    #[serde(flatten)]
    media: MediaUris,
}

#[derive(Serialize)]
struct CatalogView {
    users: Vec<cliparchive::User>,
    maps: Vec<cliparchive::Map>,
    legends: Vec<cliparchive::Legend>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Repaired {
    healed_clip_ids: Vec<i64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("cliparchive: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("cliparchive: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(report_failure(&e, &mut std::io::stderr()))
        }
    }
}

/// Loads the explicit config, else the default file if present, else
/// defaults. Command line overrides are applied last.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => load_config(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::default(),
        },
    };

    if let Some(database) = &cli.database {
        config.database_path = Some(database.clone());
    }
    if let Some(policy) = cli.policy {
        config.correlation.policy = policy;
    }
    Ok(config)
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    tracing_log::LogTracer::init().context("Failed to bridge log records")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cliparchive={}", logging.level)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if logging.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("Failed to install tracing subscriber")
}

fn run(command: Command, config: &Config) -> Result<()> {
    let archive = ClipArchive::open(config)?;
    debug!(command = ?command, "Running command");

    match command {
        Command::Ingest {
            owner,
            filename,
            created_at,
        } => {
            let clip = archive
                .ingest
                .ingest(owner, &filename, created_at.unwrap_or_else(Utc::now))?;
            print_json(&clip)
        }
        Command::Enqueue { clip_id, operation } => {
            let entry = archive.lifecycle.create(clip_id, operation.to_operation())?;
            print_json(&entry)
        }
        Command::Pending => print_json(&archive.lifecycle.list_pending()?),
        Command::Claim => match archive.lifecycle.claim_next()? {
            Some(entry) => print_json(&entry),
            None => {
                info!("Nothing to claim");
                print_json(&serde_json::Value::Null)
            }
        },
        Command::Ack { clip_id } => print_json(&archive.lifecycle.mark_queued(clip_id)?),
        Command::Start { clip_id } => print_json(&archive.lifecycle.mark_transcoding(clip_id)?),
        Command::Finish { clip_id, duration } => {
            print_json(&archive.lifecycle.mark_finished(clip_id, duration)?)
        }
        Command::Fail { clip_id, message } => {
            print_json(&archive.lifecycle.mark_error(clip_id, &message)?)
        }
        Command::Queue { clip_id: Some(id) } => print_json(&archive.lifecycle.get_by_clip(id)?),
        Command::Queue { clip_id: None } => print_json(&archive.lifecycle.get_all()?),
        Command::Show { clip_id } => {
            let clip = archive.library.get(clip_id)?;
            let media = archive.library.media_uris(&clip);
            print_json(&ClipView { clip, media })
        }
        Command::Day { date } => print_json(&archive.library.processed_on(date)?),
        Command::Tag { clip_id, names } => {
            let desired: BTreeSet<String> = names.into_iter().collect();
            print_json(&archive.tags.apply_desired(clip_id, &desired)?)
        }
        Command::Tags => print_json(&archive.vocabulary.all()?),
        Command::Classify {
            clip_id,
            map,
            legend,
            mode,
        } => {
            let clip = archive.library.update_classification(
                clip_id,
                Classification {
                    map,
                    legend,
                    game_mode: mode,
                },
            )?;
            print_json(&clip)
        }
        Command::Correlate { clip_id } => print_json(&archive.correlator.correlate(clip_id)?),
        Command::Delete { clip_id } => {
            archive.library.delete(clip_id)?;
            info!(clip_id, "Deleted");
            Ok(())
        }
        Command::Repair => print_json(&Repaired {
            healed_clip_ids: archive.ingest.repair_orphans()?,
        }),
        Command::Events(EventsCommand::Import { file, resolved }) => {
            import_events(&archive, &file, resolved)
        }
        Command::Events(EventsCommand::List { subject_id }) => {
            print_json(&archive.events.for_subject(subject_id)?)
        }
        Command::Catalog(command) => run_catalog(&archive, command),
    }
}

fn import_events(archive: &ClipArchive, file: &Path, resolved: bool) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let records = if resolved {
        let events: Vec<NewEvent> =
            serde_json::from_str(&content).context("Invalid event list")?;
        events
            .into_iter()
            .map(|event| archive.events.record(event))
            .collect::<std::result::Result<Vec<_>, _>>()?
    } else {
        let matches: Vec<ExternalMatch> =
            serde_json::from_str(&content).context("Invalid match list")?;
        matches
            .into_iter()
            .map(|m| archive.events.record_external(m))
            .collect::<std::result::Result<Vec<_>, _>>()?
    };

    info!(count = records.len(), "Matches imported");
    print_json(&records)
}

fn run_catalog(archive: &ClipArchive, command: CatalogCommand) -> Result<()> {
    let catalog = &archive.catalog;
    match command {
        CatalogCommand::AddUser {
            name,
            username,
            uid,
        } => print_json(&catalog.add_user(&name, username.as_deref(), uid.as_deref())?),
        CatalogCommand::AddMap {
            name,
            log_name,
            card_image,
        } => print_json(&catalog.add_map(&name, log_name.as_deref(), card_image.as_deref())?),
        CatalogCommand::AddLegend { name, card_image } => {
            print_json(&catalog.add_legend(&name, card_image.as_deref())?)
        }
        CatalogCommand::List => print_json(&CatalogView {
            users: catalog.users()?,
            maps: catalog.maps()?,
            legends: catalog.legends()?,
        }),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes the error for the user regardless of the log filter and returns
/// the exit code.
fn report_failure(err: &anyhow::Error, out: &mut impl Write) -> u8 {
    let _ = writeln!(out, "cliparchive: {:#}", err);
    exit_code(err)
}

/// 2 for caller mistakes, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    let fault = err
        .downcast_ref::<ClipError>()
        .map(ClipError::fault)
        .or_else(|| match err.downcast_ref::<ArchiveError>() {
            Some(ArchiveError::Clip(e)) => Some(e.fault()),
            Some(ArchiveError::Config(_)) => Some(Fault::Client),
            _ => None,
        });
    match fault {
        Some(Fault::Client) => 2,
        _ => 1,
    }
}
