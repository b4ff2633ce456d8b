use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizforge::cli::ReportFormat;
use quizforge::types::{GenerationMode, GenerationStatus, OutputLanguage};

/// Parse generation mode from string
fn parse_mode(s: &str) -> Result<GenerationMode, String> {
    match s.to_lowercase().as_str() {
        "questions" => Ok(GenerationMode::Questions),
        "summary" => Ok(GenerationMode::Summary),
        "flashcards" => Ok(GenerationMode::Flashcards),
        _ => Err(format!(
            "Invalid mode '{}'. Valid values: questions, summary, flashcards",
            s
        )),
    }
}

/// Parse output language from string
fn parse_language(s: &str) -> Result<OutputLanguage, String> {
    match s.to_lowercase().as_str() {
        "ar" | "arabic" => Ok(OutputLanguage::Arabic),
        "en" | "english" => Ok(OutputLanguage::English),
        _ => Err(format!("Invalid language '{}'. Valid values: ar, en", s)),
    }
}

/// Parse report format from string
fn parse_format(s: &str) -> Result<ReportFormat, String> {
    match s.to_lowercase().as_str() {
        "text" => Ok(ReportFormat::Text),
        "json" => Ok(ReportFormat::Json),
        _ => Err(format!("Invalid format '{}'. Valid values: text, json", s)),
    }
}

#[derive(Parser)]
#[command(name = "quizforge")]
#[command(
    version,
    about = "AI-driven quiz and study-aid generator with resilient batched generation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, help = "Load configuration from this file only")]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate study items from a topic
    Ask {
        #[arg(help = "Topic to generate items from")]
        topic: String,
        #[arg(long, short = 'n', default_value = "10", help = "Number of items to produce")]
        count: usize,
        #[arg(long, value_parser = parse_mode, default_value = "questions", help = "Item kind: questions, summary, flashcards")]
        mode: GenerationMode,
        #[arg(long, short, value_parser = parse_language, default_value = "ar", help = "Output language: ar, en")]
        language: OutputLanguage,
        #[arg(long, short, value_parser = parse_format, default_value = "text", help = "Output format: text, json")]
        format: ReportFormat,
    },

    /// Generate study items from a document (txt, md, pdf, png, jpg, webp)
    File {
        #[arg(help = "Path to the source document")]
        path: PathBuf,
        #[arg(long, short = 'n', default_value = "10", help = "Number of items to produce")]
        count: usize,
        #[arg(long, value_parser = parse_mode, default_value = "questions", help = "Item kind: questions, summary, flashcards")]
        mode: GenerationMode,
        #[arg(long, short, value_parser = parse_language, default_value = "ar", help = "Output language: ar, en")]
        language: OutputLanguage,
        #[arg(long, short, value_parser = parse_format, default_value = "text", help = "Output format: text, json")]
        format: ReportFormat,
    },

    /// Show configuration and upstream reachability
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show,
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

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mquizforge encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }

        default_hook(panic_info);
    }));
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_cli() -> anyhow::Result<ExitCode> {
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
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &cli.config {
        Some(path) => quizforge::ConfigLoader::load_from_file(path)?,
        None => quizforge::ConfigLoader::load()?,
    };

    let status = match cli.command {
        Commands::Ask {
            topic,
            count,
            mode,
            language,
            format,
        } => {
            quizforge::cli::commands::ask(&config, topic, count, mode, language, format).await?
        }
        Commands::File {
            path,
            count,
            mode,
            language,
            format,
        } => {
            quizforge::cli::commands::file(&config, &path, count, mode, language, format).await?
        }
        Commands::Status => {
            quizforge::cli::commands::status(&config).await?;
            GenerationStatus::Succeeded
        }
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => quizforge::cli::commands::config_show(&config)?,
                ConfigAction::Path => quizforge::cli::commands::config_path(),
            }
            GenerationStatus::Succeeded
        }
    };

    // A partial result is a distinct terminal outcome, not a success and not
    // a hard failure
    Ok(match status {
        GenerationStatus::Succeeded => ExitCode::SUCCESS,
        GenerationStatus::Partial => ExitCode::from(2),
    })
}
