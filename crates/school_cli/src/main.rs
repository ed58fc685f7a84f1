//! school - command-line front end for the school records store.
//!
//! Opens the configured store, runs the startup sequence, then executes one
//! subcommand and prints its result.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use school_core::{
    default_log_level, init_logging, open_embedded_with_recovery, AssistantDraft, ChartKind,
    Database, LogLevel, PersonDraft, PersonKind, SchoolRepository, SchoolService, SeedData,
    SortMode, StoreConfig, StoreSchoolRepository, StudentDraft, TeacherDraft,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "school")]
#[command(about = "Manage teachers, assistants and students")]
#[command(version)]
struct Cli {
    /// Embedded database file (defaults to school.db beside the binary)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Network store connection string; overrides --db
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace | debug | info | warn | error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// JSON seed file applied when every table is empty
    #[arg(long, global = true)]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every table as text
    Dump,
    /// Print all records as JSON
    List {
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,
    },
    /// Print one chart payload as JSON (e.g. "Teachers by Subject")
    Chart { kind: String },
    /// Add one record
    Add {
        #[command(subcommand)]
        record: AddRecord,
    },
    /// Delete a record by id
    Delete { kind: KindArg, id: String },
    /// Re-normalize stored values and report what changed
    Normalize,
    /// Print record counts per role
    Counts,
}

#[derive(Subcommand)]
enum AddRecord {
    Teacher {
        id: String,
        name: String,
        salary: String,
        #[arg(long, default_value = "")]
        department: String,
        #[arg(long, default_value = "")]
        subject: String,
    },
    Assistant {
        id: String,
        name: String,
        salary: String,
        #[arg(long, default_value = "")]
        department: String,
    },
    Student {
        id: String,
        name: String,
        grade: String,
        #[arg(long, default_value = "")]
        speciality: String,
    },
}

impl AddRecord {
    fn into_draft(self) -> PersonDraft {
        match self {
            Self::Teacher {
                id,
                name,
                salary,
                department,
                subject,
            } => PersonDraft::Teacher(TeacherDraft {
                id,
                name,
                salary,
                department,
                subject,
            }),
            Self::Assistant {
                id,
                name,
                salary,
                department,
            } => PersonDraft::Assistant(AssistantDraft {
                id,
                name,
                salary,
                department,
            }),
            Self::Student {
                id,
                name,
                grade,
                speciality,
            } => PersonDraft::Student(StudentDraft {
                id,
                name,
                grade,
                speciality,
            }),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Teacher,
    Assistant,
    Student,
}

impl From<KindArg> for PersonKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Teacher => PersonKind::Teacher,
            KindArg::Assistant => PersonKind::Assistant,
            KindArg::Student => PersonKind::Student,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Grade,
    Salary,
}

impl From<SortArg> for SortMode {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Name => SortMode::Name,
            SortArg::Grade => SortMode::Grade,
            SortArg::Salary => SortMode::Salary,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = match &cli.log_level {
            Some(raw) => raw.parse::<LogLevel>()?,
            None => default_log_level(),
        };
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    let config = resolve_store(&cli);
    let database = open_store(&config)?;
    info!("event=cli_start module=cli status=ok backend={:?}", database.kind());
    let repo = StoreSchoolRepository::new(&database);
    let service = SchoolService::new(repo);

    let seed = cli.seed.as_deref().map(load_seed).transpose()?;
    let report = service.startup(seed.as_ref());
    if report.seed_failures > 0 {
        eprintln!("warning: {} seed record(s) rejected", report.seed_failures);
    }

    match cli.command {
        Command::Dump => print!("{}", service.dump_all()),
        Command::List { sort } => {
            let snapshot = service.snapshot(sort.into());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Chart { kind } => {
            let payload = service.chart_payload(ChartKind::parse(&kind));
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Add { record } => {
            let outcome = service.add_person(&record.into_draft());
            report_outcome(outcome.ok, &outcome.message)?;
        }
        Command::Delete { kind, id } => {
            let outcome = service.delete_by_id(kind.into(), &id);
            report_outcome(outcome.ok, &outcome.message)?;
        }
        Command::Normalize => {
            println!("{}", serde_json::to_string_pretty(&report.normalized)?);
        }
        Command::Counts => {
            for (kind, count) in service.repo().counts_by_role()? {
                println!("{kind}: {count}");
            }
        }
    }

    Ok(())
}

fn resolve_store(cli: &Cli) -> StoreConfig {
    if let Some(url) = &cli.database_url {
        return StoreConfig::from_connection_string(url);
    }
    match &cli.db {
        Some(path) => StoreConfig::embedded(path),
        None => StoreConfig::from_env(),
    }
}

fn open_store(config: &StoreConfig) -> Result<Database> {
    match config {
        StoreConfig::Embedded { path } => {
            let recovered = open_embedded_with_recovery(path)
                .with_context(|| format!("failed to open database at {}", path.display()))?;
            if let Some(moved) = &recovered.quarantined {
                eprintln!(
                    "warning: unreadable database moved to {}; started with an empty store",
                    moved.display()
                );
            }
            Ok(recovered.database)
        }
        StoreConfig::Network { .. } => {
            Database::open(config).context("failed to connect to network store")
        }
    }
}

fn load_seed(path: &Path) -> Result<SeedData> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid seed file {}", path.display()))
}

fn report_outcome(ok: bool, message: &str) -> Result<()> {
    if ok {
        println!("{message}");
        Ok(())
    } else {
        bail!("{message}")
    }
}
