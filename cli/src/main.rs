use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sink_directory_watcher::{ConfigSource, RegenerationSink};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod listing;
mod source;

use listing::ListingSink;
use source::{CliConfigSource, Overrides};

#[derive(Parser)]
#[command(name = "sink")]
#[command(about = "Select source files and keep the selection current")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the files selected under a directory.
    Generate(SelectionArgs),

    /// Print the selection, then again after every settled burst of changes.
    Watch(WatchArgs),
}

#[derive(Args)]
struct SelectionArgs {
    #[arg(help = "Directory to select from")]
    path: PathBuf,

    #[arg(
        short = 'f',
        long = "filter",
        value_delimiter = ',',
        help = "Only select files matching these globs"
    )]
    filter: Vec<String>,

    #[arg(
        short = 'e',
        long = "exclude",
        value_delimiter = ',',
        help = "Skip files and directories matching these globs"
    )]
    exclude: Vec<String>,

    #[arg(short = 'c', long, help = "Match patterns case-sensitively")]
    case_sensitive: bool,

    #[arg(long, help = "Configuration file (default: <path>/sink-config.yaml)")]
    config: Option<PathBuf>,

    #[arg(long, help = "JSON output")]
    json: bool,
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    #[arg(long, value_name = "MS", help = "Quiet period before regenerating [default: 500]")]
    debounce: Option<u64>,
}

impl SelectionArgs {
    fn source(&self, debounce_ms: Option<u64>) -> CliConfigSource {
        let overrides = Overrides {
            filter: self.filter.clone(),
            exclude: self.exclude.clone(),
            case_sensitive: self.case_sensitive,
            debounce_ms,
        };
        CliConfigSource::new(&self.path, self.config.clone(), overrides)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => generate(args).await,
        Command::Watch(args) => watch(args).await,
    }
}

async fn generate(args: SelectionArgs) -> Result<()> {
    let source = args.source(None);
    let records = listing::select(args.path.clone(), &source)
        .await
        .with_context(|| format!("failed to select files under {}", args.path.display()))?;

    print!("{}", listing::render(&records, args.json)?);
    Ok(())
}

async fn watch(args: WatchArgs) -> Result<()> {
    let root = args.selection.path.clone();
    let source: Arc<dyn ConfigSource> = Arc::new(args.selection.source(args.debounce));
    let sink = Arc::new(ListingSink::new(
        root.clone(),
        Arc::clone(&source),
        args.selection.json,
    ));

    sink.regenerate().await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping");
            on_interrupt.cancel();
        }
    });

    sink_directory_watcher::watch(&root, source, sink, cancel)
        .await
        .with_context(|| format!("watch session for {} failed", root.display()))
}
