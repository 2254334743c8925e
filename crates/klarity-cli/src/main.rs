//! `klarity`: screen, analyze and learn from legal agreements.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use klarity_learning::LearningConfig;

mod commands;
mod extraction;

#[derive(Parser)]
#[command(name = "klarity", version, about = "Legal agreement analyzer with feedback learning")]
struct Cli {
    /// Quality model snapshot file
    #[arg(long, global = true, env = "LEARNING_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// Feedback journal directory
    #[arg(long, global = true, env = "FEEDBACK_STORAGE_PATH")]
    storage_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a document is an agreement
    Classify {
        /// Plain-text document
        file: PathBuf,
    },

    /// Classify, analyze and score a document
    Analyze {
        /// Plain-text document
        file: PathBuf,
    },

    /// Submit a rating of an analysis
    Feedback {
        /// JSON file with document_id, original_document, analysis_result and feedback
        file: PathBuf,
    },

    /// Show feedback statistics and model performance
    Performance,

    /// Export the feedback history as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Process feedback in the background until Ctrl-C
    Run,
}

impl Cli {
    /// Learning config from the environment, with command-line overrides.
    fn learning_config(&self) -> LearningConfig {
        let mut config = LearningConfig::from_env();
        if let Some(path) = &self.model_path {
            config = config.with_model_path(path);
        }
        if let Some(path) = &self.storage_path {
            config = config.with_storage_path(path);
        }
        // one-shot commands leave pending feedback to `run`
        if !matches!(self.command, Commands::Run) {
            config = config.with_enabled(false);
        }
        config
    }
}

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter (default: info for the klarity crates)
///
/// Console logs go to stderr so command output on stdout stays parseable.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "klarity=info,klarity_learning=info,klarity_inference=info,klarity_db=info".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("klarity.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            // no ANSI in files unless asked
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let cli = Cli::parse();
    let config = cli.learning_config();

    let result = match &cli.command {
        Commands::Classify { file } => commands::classify(file).await,
        Commands::Analyze { file } => commands::analyze(file, config).await,
        Commands::Feedback { file } => commands::feedback(file, config).await,
        Commands::Performance => commands::performance(config).await,
        Commands::Export { output } => commands::export(output.as_deref(), config).await,
        Commands::Run => commands::run(config).await,
    };

    match result {
        Ok(status) => status.into(),
        Err(e) => {
            error!(error = %format!("{:#}", e), "Command failed");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_and_one_shot_disable_sweep() {
        let cli = Cli::parse_from([
            "klarity",
            "--model-path",
            "/tmp/m.json",
            "performance",
        ]);
        let config = cli.learning_config();
        assert_eq!(config.model_path, PathBuf::from("/tmp/m.json"));
        assert!(!config.enabled);
    }

    #[test]
    fn test_export_output_flag() {
        let cli = Cli::parse_from(["klarity", "export", "-o", "out.json"]);
        match cli.command {
            Commands::Export { output } => assert_eq!(output, Some(PathBuf::from("out.json"))),
            _ => panic!("expected export"),
        }
    }
}
