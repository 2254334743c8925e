//! Learning coordinator: the single writer for feedback and the quality model.
//!
//! One tokio task owns the feedback store and the quality learner. Callers
//! talk to it through a cloneable [`CoordinatorHandle`]; every request and
//! every sweep tick is handled in turn by one `select!` loop, so the store and
//! the learner never see concurrent access.
//!
//! The analysis backend call in [`CoordinatorHandle::analyze_with_learning`]
//! runs on the caller's task; only the quality prediction goes through the
//! actor.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use klarity_classify::detect_document_type;
use klarity_core::{
    defaults, AnalysisBackend, EnrichedAnalysis, Error, FeedbackEntry, FeedbackReceipt,
    FeedbackRepository, FeedbackSummary, ModelPerformance, QualityPrediction, Result,
    SystemPerformance,
};
use klarity_db::FeedbackJournal;
use klarity_inference::ResilientAnalyzer;

use crate::enrich::enrich;
use crate::learner::{LearnerConfig, QualityLearner};

/// Shortest sweep period accepted by [`LearningConfig::with_sweep_interval`].
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the learning coordinator.
#[derive(Debug, Clone)]
pub struct LearningConfig {
    /// Quality model snapshot file.
    pub model_path: PathBuf,
    /// Feedback journal directory.
    pub storage_path: PathBuf,
    /// Interval between background sweeps.
    pub sweep_interval: Duration,
    /// Retrain cadence in samples.
    pub retrain_every: usize,
    /// Whether the periodic sweep runs.
    pub enabled: bool,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(defaults::LEARNING_MODEL_PATH),
            storage_path: PathBuf::from(defaults::FEEDBACK_STORAGE_PATH),
            sweep_interval: Duration::from_secs(defaults::SWEEP_INTERVAL_SECS),
            retrain_every: defaults::RETRAIN_EVERY,
            enabled: true,
        }
    }
}

impl LearningConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `LEARNING_MODEL_PATH` | `learning_model.json` | Model snapshot file |
    /// | `FEEDBACK_STORAGE_PATH` | `feedback_storage` | Feedback journal directory |
    /// | `FEEDBACK_PROCESSING_INTERVAL` | `300` | Sweep interval in seconds |
    /// | `LEARNING_RETRAIN_EVERY` | `10` | Retrain cadence |
    /// | `LEARNING_ENABLED` | `true` | Enable/disable the periodic sweep |
    pub fn from_env() -> Self {
        let model_path = std::env::var("LEARNING_MODEL_PATH")
            .unwrap_or_else(|_| defaults::LEARNING_MODEL_PATH.to_string());

        let storage_path = std::env::var("FEEDBACK_STORAGE_PATH")
            .unwrap_or_else(|_| defaults::FEEDBACK_STORAGE_PATH.to_string());

        let sweep_secs = std::env::var("FEEDBACK_PROCESSING_INTERVAL")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SWEEP_INTERVAL_SECS)
            .max(1);

        let retrain_every = std::env::var("LEARNING_RETRAIN_EVERY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::RETRAIN_EVERY)
            .max(1);

        let enabled = std::env::var("LEARNING_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            model_path: PathBuf::from(model_path),
            storage_path: PathBuf::from(storage_path),
            sweep_interval: Duration::from_secs(sweep_secs),
            retrain_every,
            enabled,
        }
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Clamped to at least one millisecond; a zero period is not a valid tick.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval.max(MIN_SWEEP_INTERVAL);
        self
    }

    pub fn with_retrain_every(mut self, every: usize) -> Self {
        self.retrain_every = every.max(1);
        self
    }

    /// Enable or disable the periodic sweep.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn learner_config(&self) -> LearnerConfig {
        LearnerConfig::new(&self.model_path).with_retrain_every(self.retrain_every)
    }
}

/// Event emitted by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum LearningEvent {
    /// Coordinator task started.
    Started,
    /// A feedback entry was folded into the learner.
    FeedbackProcessed { feedback_id: u64 },
    /// The quality model was rebuilt.
    ModelRetrained { samples: usize },
    /// A background sweep finished.
    SweepCompleted { processed: usize, failed: usize },
    /// Coordinator task stopped.
    Stopped,
}

/// Outcome of one sweep over unprocessed feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub processed: usize,
    pub failed: usize,
}

enum Command {
    SubmitFeedback {
        document_id: String,
        original_document: String,
        analysis_result: JsonValue,
        feedback: JsonValue,
        reply: oneshot::Sender<Result<FeedbackReceipt>>,
    },
    Predict {
        text: String,
        reply: oneshot::Sender<QualityPrediction>,
    },
    Sweep {
        reply: oneshot::Sender<SweepReport>,
    },
    SystemPerformance {
        reply: oneshot::Sender<SystemPerformance>,
    },
    FeedbackSummary {
        reply: oneshot::Sender<FeedbackSummary>,
    },
    ModelPerformance {
        reply: oneshot::Sender<ModelPerformance>,
    },
    Export {
        reply: oneshot::Sender<Result<String>>,
    },
}

/// Cloneable handle for talking to a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    cmd_tx: mpsc::Sender<Command>,
    event_tx: broadcast::Sender<LearningEvent>,
    analyzer: Arc<dyn AnalysisBackend>,
}

impl CoordinatorHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(reply))
            .await
            .map_err(|_| Error::Internal("Learning coordinator is not running".into()))?;
        rx.await
            .map_err(|_| Error::Internal("Learning coordinator dropped the request".into()))
    }

    /// Produce an analysis enriched with the learner's quality prediction.
    ///
    /// The document type is detected from `text` when not given. Backend
    /// failures are replaced by the fallback analysis.
    #[instrument(skip(self, text), fields(subsystem = "learning", component = "coordinator", op = "analyze"))]
    pub async fn analyze_with_learning(
        &self,
        text: &str,
        document_type: Option<&str>,
    ) -> Result<EnrichedAnalysis> {
        let document_type = document_type.unwrap_or_else(|| detect_document_type(text));
        let analysis = self.analyzer.analyze(text, document_type).await?;
        let prediction = self.predict_quality(text).await?;
        Ok(enrich(analysis, prediction))
    }

    /// Store feedback and fold it into the learner immediately.
    pub async fn submit_feedback(
        &self,
        document_id: &str,
        original_document: &str,
        analysis_result: JsonValue,
        feedback: JsonValue,
    ) -> Result<FeedbackReceipt> {
        self.request(|reply| Command::SubmitFeedback {
            document_id: document_id.to_string(),
            original_document: original_document.to_string(),
            analysis_result,
            feedback,
            reply,
        })
        .await?
    }

    pub async fn predict_quality(&self, text: &str) -> Result<QualityPrediction> {
        self.request(|reply| Command::Predict {
            text: text.to_string(),
            reply,
        })
        .await
    }

    /// Run a sweep now instead of waiting for the next tick.
    pub async fn sweep_now(&self) -> Result<SweepReport> {
        self.request(|reply| Command::Sweep { reply }).await
    }

    pub async fn system_performance(&self) -> Result<SystemPerformance> {
        self.request(|reply| Command::SystemPerformance { reply })
            .await
    }

    pub async fn feedback_summary(&self) -> Result<FeedbackSummary> {
        self.request(|reply| Command::FeedbackSummary { reply })
            .await
    }

    pub async fn model_performance(&self) -> Result<ModelPerformance> {
        self.request(|reply| Command::ModelPerformance { reply })
            .await
    }

    /// Full feedback history as pretty-printed JSON.
    pub async fn export_feedback(&self) -> Result<String> {
        self.request(|reply| Command::Export { reply }).await?
    }

    /// Get a receiver for coordinator events.
    pub fn events(&self) -> broadcast::Receiver<LearningEvent> {
        self.event_tx.subscribe()
    }
}

/// A started coordinator: its handle plus the means to stop it.
pub struct RunningCoordinator {
    handle: CoordinatorHandle,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RunningCoordinator {
    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    /// Get a receiver for coordinator events.
    pub fn events(&self) -> broadcast::Receiver<LearningEvent> {
        self.handle.events()
    }

    /// Signal the coordinator to stop and wait for it to finish.
    ///
    /// A request or sweep already in progress completes first.
    pub async fn shutdown(self) -> Result<()> {
        // the task may already have exited if every handle was dropped
        let _ = self.shutdown_tx.send(()).await;
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Learning coordinator task failed: {}", e)))
    }
}

/// Owner of the feedback store and the quality learner.
pub struct LearningCoordinator {
    config: LearningConfig,
    store: Box<dyn FeedbackRepository>,
    learner: QualityLearner,
    analyzer: Arc<dyn AnalysisBackend>,
    event_tx: broadcast::Sender<LearningEvent>,
}

impl LearningCoordinator {
    /// Assemble a coordinator from explicit parts.
    ///
    /// `analyzer` is wrapped so that analysis failures yield the fallback
    /// record.
    pub fn new<S, B>(config: LearningConfig, store: S, learner: QualityLearner, analyzer: B) -> Self
    where
        S: FeedbackRepository + 'static,
        B: AnalysisBackend + 'static,
    {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            config,
            store: Box::new(store),
            learner,
            analyzer: Arc::new(ResilientAnalyzer::new(analyzer)),
            event_tx,
        }
    }

    /// Open the feedback journal and model snapshot named by `config`.
    pub async fn open<B>(config: LearningConfig, analyzer: B) -> Result<Self>
    where
        B: AnalysisBackend + 'static,
    {
        let store = FeedbackJournal::open(&config.storage_path).await?;
        let learner = QualityLearner::open(config.learner_config()).await;
        Ok(Self::new(config, store, learner, analyzer))
    }

    /// Get a receiver for coordinator events (subscribe before `start`).
    pub fn events(&self) -> broadcast::Receiver<LearningEvent> {
        self.event_tx.subscribe()
    }

    /// Spawn the coordinator task.
    pub fn start(self) -> RunningCoordinator {
        let (cmd_tx, cmd_rx) = mpsc::channel(defaults::COORDINATOR_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let handle = CoordinatorHandle {
            cmd_tx,
            event_tx: self.event_tx.clone(),
            analyzer: self.analyzer.clone(),
        };

        let task = tokio::spawn(self.run(cmd_rx, shutdown_rx));

        RunningCoordinator {
            handle,
            shutdown_tx,
            task,
        }
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<Command>, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(
            subsystem = "learning",
            component = "coordinator",
            sweep_interval_secs = self.config.sweep_interval.as_secs_f64(),
            sweep_enabled = self.config.enabled,
            feedback_entries = self.store.len(),
            samples = self.learner.corpus().len(),
            trained = self.learner.is_trained(),
            "Learning coordinator started"
        );
        self.emit(LearningEvent::Started);

        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Learning coordinator received shutdown signal");
                    break;
                }
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        debug!("All coordinator handles dropped");
                        break;
                    }
                },
                _ = ticker.tick(), if self.config.enabled => {
                    self.sweep().await;
                }
            }
        }

        self.emit(LearningEvent::Stopped);
        info!("Learning coordinator stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SubmitFeedback {
                document_id,
                original_document,
                analysis_result,
                feedback,
                reply,
            } => {
                let result = self
                    .submit_feedback(&document_id, &original_document, analysis_result, &feedback)
                    .await;
                let _ = reply.send(result);
            }
            Command::Predict { text, reply } => {
                let _ = reply.send(self.learner.predict_quality(&text));
            }
            Command::Sweep { reply } => {
                let report = self.sweep().await;
                let _ = reply.send(report);
            }
            Command::SystemPerformance { reply } => {
                let _ = reply.send(SystemPerformance {
                    feedback_summary: self.store.summary(),
                    model_performance: self.learner.performance_metrics(),
                    timestamp: Utc::now(),
                });
            }
            Command::FeedbackSummary { reply } => {
                let _ = reply.send(self.store.summary());
            }
            Command::ModelPerformance { reply } => {
                let _ = reply.send(self.learner.performance_metrics());
            }
            Command::Export { reply } => {
                let _ = reply.send(self.store.export_json());
            }
        }
    }

    #[instrument(
        skip(self, original_document, analysis_result, feedback),
        fields(subsystem = "learning", component = "coordinator", op = "submit_feedback")
    )]
    async fn submit_feedback(
        &mut self,
        document_id: &str,
        original_document: &str,
        analysis_result: JsonValue,
        feedback: &JsonValue,
    ) -> Result<FeedbackReceipt> {
        let feedback_id = self
            .store
            .submit(document_id, original_document, analysis_result, feedback)
            .await?;

        if let Some(newest) = self.store.unprocessed().pop() {
            if let Err(e) = self.process_entry(newest).await {
                warn!(feedback_id, error = %e, "Immediate feedback processing failed");
            }
        }

        Ok(FeedbackReceipt::received(feedback_id))
    }

    /// Flag one entry processed, then feed it to the learner.
    ///
    /// An entry whose flag could not be written stays pending and never
    /// reaches the corpus, so a later sweep adds it exactly once.
    async fn process_entry(&mut self, entry: FeedbackEntry) -> Result<()> {
        let id = entry.id;
        self.store.mark_processed(id).await?;

        let retrained = self
            .learner
            .add_feedback(
                &entry.original_document_snippet,
                entry.analysis_result,
                entry.feedback,
            )
            .await;
        if retrained {
            self.emit(LearningEvent::ModelRetrained {
                samples: self.learner.corpus().len(),
            });
        }

        debug!(feedback_id = id, document_id = %entry.document_id, "Processed feedback");
        self.emit(LearningEvent::FeedbackProcessed { feedback_id: id });
        Ok(())
    }

    async fn sweep(&mut self) -> SweepReport {
        let pending = self.store.unprocessed();
        let mut report = SweepReport::default();

        if !pending.is_empty() {
            info!(count = pending.len(), "Processing unprocessed feedback");
        }

        for entry in pending {
            let id = entry.id;
            match self.process_entry(entry).await {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    error!(feedback_id = id, error = %e, "Failed to process feedback entry");
                    report.failed += 1;
                }
            }
        }

        self.emit(LearningEvent::SweepCompleted {
            processed: report.processed,
            failed: report.failed,
        });
        report
    }

    fn emit(&self, event: LearningEvent) {
        // no subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
