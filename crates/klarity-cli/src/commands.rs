//! Subcommand handlers.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;

use klarity_classify::{classify_agreement, detect_document_type};
use klarity_inference::OpenAIBackend;
use klarity_learning::{AnalysisPipeline, LearningConfig, LearningCoordinator, RunningCoordinator};

use crate::extraction::{extract_or_empty, PlainTextExtractor};

/// How a subcommand finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// The document was not accepted as an agreement.
    Rejected,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Ok => ExitCode::SUCCESS,
            Status::Rejected => ExitCode::from(2),
        }
    }
}

/// Body of a `feedback` submission file. Every field is required.
#[derive(Debug, Deserialize)]
pub struct FeedbackSubmission {
    pub document_id: String,
    pub original_document: String,
    pub analysis_result: JsonValue,
    pub feedback: JsonValue,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn read_document(path: &Path) -> anyhow::Result<String> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or_default();
    Ok(extract_or_empty(&PlainTextExtractor, &data, filename).await)
}

async fn start_coordinator(config: LearningConfig) -> anyhow::Result<RunningCoordinator> {
    let backend = OpenAIBackend::from_env().context("Failed to configure analysis backend")?;
    let coordinator = LearningCoordinator::open(config, backend)
        .await
        .context("Failed to open learning state")?;
    Ok(coordinator.start())
}

/// Screen a document and print the classification.
pub async fn classify(file: &Path) -> anyhow::Result<Status> {
    let text = read_document(file).await?;
    let classification = classify_agreement(&text);
    let document_type = classification
        .accepted
        .then(|| detect_document_type(&text));

    print_json(&serde_json::json!({
        "classification": classification,
        "document_type": document_type,
    }))?;

    Ok(if classification.accepted {
        Status::Ok
    } else {
        Status::Rejected
    })
}

/// Run the full pipeline on a document.
pub async fn analyze(file: &Path, config: LearningConfig) -> anyhow::Result<Status> {
    let text = read_document(file).await?;
    let running = start_coordinator(config).await?;
    let pipeline = AnalysisPipeline::new(running.handle());

    let outcome = pipeline.analyze_document(&text).await;
    running.shutdown().await?;
    let outcome = outcome?;

    print_json(&outcome)?;
    Ok(if outcome.is_rejected() {
        Status::Rejected
    } else {
        Status::Ok
    })
}

/// Submit a rating read from a JSON file.
pub async fn feedback(file: &Path, config: LearningConfig) -> anyhow::Result<Status> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let submission: FeedbackSubmission =
        serde_json::from_str(&raw).context("Feedback file is not a valid submission")?;

    let running = start_coordinator(config).await?;
    let receipt = running
        .handle()
        .submit_feedback(
            &submission.document_id,
            &submission.original_document,
            submission.analysis_result,
            submission.feedback,
        )
        .await;
    running.shutdown().await?;

    print_json(&receipt?)?;
    Ok(Status::Ok)
}

pub async fn performance(config: LearningConfig) -> anyhow::Result<Status> {
    let running = start_coordinator(config).await?;
    let report = running.handle().system_performance().await;
    running.shutdown().await?;

    print_json(&report?)?;
    Ok(Status::Ok)
}

/// Write the feedback history to `output`, or stdout.
pub async fn export(output: Option<&Path>, config: LearningConfig) -> anyhow::Result<Status> {
    let running = start_coordinator(config).await?;
    let exported = running.handle().export_feedback().await;
    running.shutdown().await?;
    let exported = exported?;

    match output {
        Some(path) => {
            tokio::fs::write(path, exported.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Feedback exported");
        }
        None => println!("{}", exported),
    }
    Ok(Status::Ok)
}

/// Run the background sweep until Ctrl-C.
pub async fn run(config: LearningConfig) -> anyhow::Result<Status> {
    let running = start_coordinator(config).await?;
    info!("Learning coordinator running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    running.shutdown().await?;
    Ok(Status::Ok)
}
