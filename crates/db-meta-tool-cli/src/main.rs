//! db-meta-tool CLI - build a Firebird database from scripts, or export its DDL.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use db_meta_tool::{Config, MetaError, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

/// Exit status for failures outside a verb.
const EXIT_UNHANDLED: u8 = 255;

#[derive(Parser)]
#[command(name = "db-meta-tool")]
#[command(about = "Build Firebird databases from DDL scripts and export DDL back out")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Path to YAML configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long, global = true)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text", global = true)]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info", global = true)]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new database and apply every script in a directory
    BuildDb {
        /// Directory that receives the database file (removed on failure)
        #[arg(long)]
        db_dir: PathBuf,

        /// Directory holding the ordered *.sql scripts
        #[arg(long)]
        scripts_dir: PathBuf,
    },

    /// Export the full DDL of an existing database
    ExportScripts {
        /// Connection string, e.g. "User=SYSDBA;Password=masterkey;Database=/data/app.fdb"
        #[arg(long)]
        connection_string: String,

        /// Directory that receives the DDL file
        #[arg(long)]
        output_dir: PathBuf,
    },

    /// Apply scripts to an existing database (not implemented)
    UpdateDb {
        /// Connection string of the database to update
        #[arg(long)]
        connection_string: String,

        /// Directory holding the update scripts
        #[arg(long)]
        scripts_dir: PathBuf,
    },
}

/// A failure and the exit status it maps to.
enum Failure {
    /// Setup failed before any verb ran; holds the full report.
    Setup(String),
    /// The verb itself failed.
    Verb(MetaError),
}

impl From<MetaError> for Failure {
    fn from(e: MetaError) -> Self {
        Failure::Verb(e)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Verb(e)) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
        Err(Failure::Setup(report)) => {
            eprintln!("{}", report);
            ExitCode::from(EXIT_UNHANDLED)
        }
    }
}

async fn run(cli: Cli) -> Result<(), Failure> {
    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| Failure::Setup(format!("Error: {}", e)))?;

    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path).map_err(|e| Failure::Setup(e.format_detailed()))?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    let orchestrator = Orchestrator::firebird(config);

    match cli.command {
        Commands::BuildDb {
            db_dir,
            scripts_dir,
        } => {
            let report = orchestrator.build_database(&db_dir, &scripts_dir).await?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                println!("\nDatabase created!");
                println!("  Database: {}", report.database.display());
                println!("  Files: {}", report.summary.files.len());
                println!("  Statements: {}", report.summary.total_statements);
            }
        }

        Commands::ExportScripts {
            connection_string,
            output_dir,
        } => {
            let report = orchestrator
                .export_scripts(&connection_string, &output_dir)
                .await?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                println!("\nExport completed!");
                println!("  Output: {}", report.output.display());
                if let Some(ref ddl) = report.ddl {
                    println!("  Domains: {}", ddl.domains);
                    println!("  Tables: {} ({} columns)", ddl.tables, ddl.columns);
                    println!("  Procedures: {}", ddl.procedures);
                }
            }
        }

        Commands::UpdateDb {
            connection_string,
            scripts_dir,
        } => {
            orchestrator
                .update_database(&connection_string, &scripts_dir)
                .await?;
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("Invalid verbosity '{}': expected debug, info, warn, or error", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = match format {
        "json" => subscriber.json().try_init(),
        "text" => subscriber.try_init(),
        other => return Err(format!("Invalid log format '{}': expected text or json", other)),
    };

    result.map_err(|e| format!("Failed to initialize logging: {}", e))
}
