//! gdpr-export: export or erase the activity data of one account.
//!
//! Every command prints a single JSON document on stdout; logs go to
//! stderr. The process exit code follows [`gdpr_core::exit_codes`].

use clap::{Args, Parser, Subcommand};
use gdpr_bundle::ArchiveReader;
use gdpr_core::exit_codes::ExitCode;
use gdpr_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use gdpr_core::{
    dispose_archive, resolve_config, DeletionCoordinator, Error, ExportCoordinator,
    JsonlRecordSource, LdifFormatter, ResolvedConfig, Result,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

/// Export or erase the personal activity data of a user account
#[derive(Parser)]
#[command(name = "gdpr-export")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to export.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for staging trees and archives
    #[arg(long, global = true)]
    staging_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log output format on stderr (human, json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the data archive of one account
    Export(ExportArgs),

    /// Delete or obfuscate every record of one account
    Delete(AccountArgs),

    /// Delete an archive produced by `export`
    Dispose {
        /// Archive to delete
        archive: PathBuf,
    },

    /// List the entries of an archive
    Inspect {
        archive: PathBuf,
    },

    /// Show the resolved configuration
    Config,
}

#[derive(Args, Debug)]
struct AccountArgs {
    /// Account uid
    #[arg(long)]
    account: String,

    /// Record store directory
    #[arg(long)]
    source: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    target: AccountArgs,

    /// Move the finished archive into this directory
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let resolved = match resolve_config(
        cli.global.config.as_deref(),
        cli.global.staging_dir.as_deref(),
    ) {
        Ok(resolved) => resolved,
        Err(e) => {
            init_logging(&LogConfig::from_env(
                &Default::default(),
                LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
                cli.global.log_format,
            ));
            return report_error(&e).into();
        }
    };

    init_logging(&LogConfig::from_env(
        &resolved.config.log,
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    ));

    let outcome = match cli.command {
        Commands::Export(args) => run_export(&resolved, &args),
        Commands::Delete(args) => run_delete(&args),
        Commands::Dispose { archive } => run_dispose(archive),
        Commands::Inspect { archive } => run_inspect(archive),
        Commands::Config => print_json(&resolved),
    };

    match outcome {
        Ok(()) => ExitCode::Ok.into(),
        Err(e) => report_error(&e).into(),
    }
}

fn run_export(resolved: &ResolvedConfig, args: &ExportArgs) -> Result<()> {
    let store = Arc::new(JsonlRecordSource::new(&args.target.source));
    let formatter = Arc::new(LdifFormatter::new(resolved.config.base_dn()));
    let coordinator = ExportCoordinator::new(store.clone(), formatter, resolved.staging_root());

    let mut handle = coordinator.export_uid(store.as_ref(), &args.target.account)?;
    if let Some(output) = &args.output {
        coordinator.deliver(&mut handle, output)?;
    }
    print_json(&handle)
}

fn run_delete(args: &AccountArgs) -> Result<()> {
    let store = Arc::new(JsonlRecordSource::new(&args.source));
    let coordinator = DeletionCoordinator::new(store.clone());
    let summary = coordinator.delete_uid(store.as_ref(), &args.account)?;
    print_json(&summary)
}

fn run_dispose(archive: PathBuf) -> Result<()> {
    let disposal = dispose_archive(&archive)?;
    print_json(&json!({ "path": archive, "disposal": disposal }))
}

fn run_inspect(archive: PathBuf) -> Result<()> {
    let reader = ArchiveReader::open(&archive)?;
    print_json(&json!({ "path": archive, "entries": reader.entry_names() }))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_error(e: &Error) -> ExitCode {
    let code = e.exit_code();
    error!(error = %e, code = e.code(), "Command failed");
    let payload = json!({
        "error": {
            "code": e.code(),
            "kind": code.code_name(),
            "message": e.to_string(),
        }
    });
    println!("{}", payload);
    code
}
