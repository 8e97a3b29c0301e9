use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use routesage::ai::ProviderRegistry;
use routesage::cli::Output;
use routesage::cli::commands::{self, generate::GenerateArgs};
use routesage::export::ExportFormat;

/// Parse export format from string
fn parse_export_format(s: &str) -> Result<ExportFormat, String> {
    s.parse::<ExportFormat>().map_err(|e| e.to_string())
}

/// Parse a confidence threshold in [0, 1]
fn parse_confidence(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("Invalid confidence '{}'", s))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("Confidence must be between 0.0 and 1.0, got {}", value))
    }
}

#[derive(Parser)]
#[command(name = "routesage")]
#[command(
    version,
    about = "Verified, LLM-assisted API documentation for FastAPI route handlers"
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
    /// Generate documentation for a FastAPI file or directory
    Generate {
        #[arg(help = "Python file or directory to analyze")]
        path: PathBuf,
        #[arg(long, short, help = "Output directory (default: ./docs)")]
        output: Option<PathBuf>,
        #[arg(long, short, value_parser = parse_export_format, help = "Export format: json, markdown")]
        format: Option<ExportFormat>,
        #[arg(long, short, help = "LLM provider (openai, deepseek, anthropic, gemini)")]
        provider: Option<String>,
        #[arg(long, short, help = "Model to use (provider default when omitted)")]
        model: Option<String>,
        #[arg(long, env = "ROUTESAGE_API_KEY", hide_env_values = true, help = "API key (falls back to the provider's env var)")]
        api_key: Option<String>,
        #[arg(long = "no-cache", help = "Bypass the response cache")]
        no_cache: bool,
        #[arg(long, help = "Keep routes not found in source, marked unverified")]
        lenient: bool,
        #[arg(long = "min-confidence", value_parser = parse_confidence, help = "Reject routes below this confidence (0.0-1.0)")]
        min_confidence: Option<f64>,
        #[arg(long = "no-enhance", help = "Skip description enhancement")]
        no_enhance: bool,
        #[arg(long = "no-write", help = "Do not write documented decorators back to source")]
        no_write: bool,
        #[arg(long, help = "Entry-point file for directory metadata (relative to PATH)")]
        entry: Option<PathBuf>,
    },

    /// List available LLM providers and their models
    ListProviders,

    /// List available export formats
    ListFormats,

    /// Manage the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove every cached response
    Clear,
    /// Show cache size
    Stats,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
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

        eprintln!(
            "\n{}",
            console::style("━━━ PANIC ━━━").red().bold()
        );
        eprintln!(
            "{}",
            console::style("routesage encountered an unexpected error:").red()
        );
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "{}",
                console::style(format!(
                    "Location: {}:{}:{}",
                    location.file(),
                    location.line(),
                    location.column()
                ))
                .dim()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Output::new().error(&format!("Error: {:#}", e));
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
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            path,
            output,
            format,
            provider,
            model,
            api_key,
            no_cache,
            lenient,
            min_confidence,
            no_enhance,
            no_write,
            entry,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::generate::run(GenerateArgs {
                path,
                output,
                format,
                provider,
                model,
                api_key,
                no_cache,
                lenient,
                min_confidence,
                no_enhance,
                no_write,
                entry,
            }))?;
        }
        Commands::ListProviders => {
            commands::providers::list_providers(&ProviderRegistry::new());
        }
        Commands::ListFormats => {
            commands::providers::list_export_formats();
        }
        Commands::Cache { action } => {
            let rt = Runtime::new()?;
            match action {
                CacheAction::Clear => rt.block_on(commands::cache::clear())?,
                CacheAction::Stats => rt.block_on(commands::cache::stats())?,
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                commands::config::show(&format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
        },
    }

    Ok(())
}
