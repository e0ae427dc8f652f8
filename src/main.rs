use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reweave::cli::commands::{self, SourceArgs, optimize::OptimizeOptions};
use reweave::collab::ExportFormat;
use reweave::engine::MergeStrategy;

#[derive(Parser)]
#[command(name = "reweave")]
#[command(
    version,
    about = "Reconcile an article's structure with competing pages without losing its facts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every heading as KEEP, IMPROVE, ADD or REMOVE
    Analyze {
        #[command(flatten)]
        sources: SourceFlags,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Revise the article: generate, merge and export
    Optimize {
        #[command(flatten)]
        sources: SourceFlags,
        #[arg(long, short, help = "Write the revised article to this file")]
        output: Option<PathBuf>,
        #[arg(
            short = 'f',
            long,
            default_value = "markdown",
            help = "Export format: markdown, json"
        )]
        format: ExportFormat,
        #[arg(
            long,
            help = "Merge strategy for every section: replace, append, smart, preserve_valuable"
        )]
        strategy: Option<MergeStrategy>,
        #[arg(long, help = "Write the optimization report to this file")]
        report: Option<PathBuf>,
        #[arg(long, help = "Skip generation (sections keep their text or get placeholders)")]
        offline: bool,
    },

    /// Show topic keys, scores and valuable elements of one document
    Inspect {
        #[arg(help = "Document to inspect (.md, .json, .yaml)")]
        source: String,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
struct SourceFlags {
    #[arg(help = "Existing article (.md, .json, .yaml)")]
    existing: String,
    #[arg(
        long = "competitor",
        short = 'c',
        num_args = 1..,
        help = "Competitor documents"
    )]
    competitors: Vec<String>,
    #[arg(long, help = "Fail when too few competitors are usable")]
    require_competitors: bool,
}

impl From<SourceFlags> for SourceArgs {
    fn from(flags: SourceFlags) -> Self {
        Self {
            existing: flags.existing,
            competitors: flags.competitors,
            require_competitors: flags.require_competitors,
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mreweave encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        eprintln!("\n\x1b[33mPlease report this issue at:\x1b[0m");
        eprintln!("  https://github.com/junyeong-ai/reweave/issues");
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Analyze { sources, format } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::analyze::run(sources.into(), &format))?;
        }
        Commands::Optimize {
            sources,
            output,
            format,
            strategy,
            report,
            offline,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::optimize::run(OptimizeOptions {
                sources: sources.into(),
                output,
                format,
                strategy,
                report,
                offline,
            }))?;
        }
        Commands::Inspect { source, format } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::inspect::run(&source, &format))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
