use std::io::{self, BufRead};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use ouidex::app::{App, UpdateOptions};
use ouidex::error::OuidexError;
use ouidex::output::{self, JsonOutput};
use ouidex::store::Store;

#[derive(Parser)]
#[command(name = "ouidex")]
#[command(about = "Mirror the IEEE OUI registries and resolve hardware addresses to vendors")]
#[command(version)]
struct Cli {
    /// Directory holding the mirrored registry files and lookup data
    #[arg(long, global = true)]
    cache_dir: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Refresh the registry mirror and rebuild the lookup data")]
    Update(UpdateArgs),
    #[command(about = "Resolve hardware addresses to their registered organizations")]
    Lookup(LookupArgs),
}

#[derive(Args)]
struct UpdateArgs {
    /// Bypass client-side caching (ETags) and re-download every source
    #[arg(long)]
    force: bool,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LookupArgs {
    /// Addresses to resolve; read from stdin, one per line, when empty
    addrs: Vec<String>,

    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<OuidexError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &OuidexError) -> u8 {
    match error {
        OuidexError::LookupArtifactMissing(_) => 2,
        OuidexError::Network { .. }
        | OuidexError::UnexpectedStatus { .. }
        | OuidexError::Cancelled { .. }
        | OuidexError::Client(_)
        | OuidexError::Task(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = match cli.cache_dir {
        Some(dir) => Store::with_root(dir),
        None => Store::new()?,
    };
    let app = App::new(store);

    match cli.command {
        Commands::Update(args) => run_update(args, app),
        Commands::Lookup(args) => run_lookup(args, app),
    }
}

fn run_update(args: UpdateArgs, app: App) -> miette::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    // Plain `?` keeps the concrete error type downcastable for map_exit_code.
    let result = runtime.block_on(app.update(UpdateOptions { force: args.force }))?;

    if args.json {
        JsonOutput::print_update(&result).into_diagnostic()?;
    } else {
        output::print_update_text(&result).into_diagnostic()?;
    }
    Ok(())
}

fn run_lookup(args: LookupArgs, app: App) -> miette::Result<()> {
    let inputs = if args.addrs.is_empty() {
        read_stdin_lines().into_diagnostic()?
    } else {
        args.addrs
    };

    let result = app.lookup(&inputs)?;
    if args.json {
        JsonOutput::print_lookup(&result).into_diagnostic()?;
    } else {
        output::print_lookup_text(&result).into_diagnostic()?;
    }
    Ok(())
}

fn read_stdin_lines() -> io::Result<Vec<String>> {
    let mut inputs = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            inputs.push(trimmed.to_string());
        }
    }
    Ok(inputs)
}
