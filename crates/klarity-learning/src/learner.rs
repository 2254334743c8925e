//! Quality learner: predicts how users will rate an analysis of a document.
//!
//! The learner keeps every feedback sample it has seen and rebuilds its model
//! from the whole corpus on each retrain. Labels come from the free-text
//! comments of each rating, so they are re-derived whenever the labelling
//! rule changes. The model, the corpus and the trained flag are saved as one
//! JSON snapshot after every retrain.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use klarity_core::{defaults, Error, ModelPerformance, QualityPrediction, Result, UserFeedback};

use crate::classifier::{LogisticRegression, TrainingConfig};
use crate::features::{extract_features, DocumentFeatures};
use crate::metrics::classification_report;
use crate::vectorizer::TfidfVectorizer;

const SNAPSHOT_VERSION: u32 = 1;

/// Comment terms that mark an analysis as poor. Checked before
/// [`POSITIVE_TERMS`] since "inaccurate" and "incorrect" contain positive terms.
pub const NEGATIVE_TERMS: [&str; 3] = ["inaccurate", "bad", "incorrect"];

/// Comment terms that mark an analysis as good.
pub const POSITIVE_TERMS: [&str; 3] = ["accurate", "good", "correct"];

/// Label a rating: `true` for a favourable analysis.
///
/// Comments without a recognised term count as favourable.
pub fn label_for(feedback: &UserFeedback) -> bool {
    let comments = feedback.comments.to_lowercase();
    if NEGATIVE_TERMS.iter().any(|t| comments.contains(t)) {
        return false;
    }
    if POSITIVE_TERMS.iter().any(|t| comments.contains(t)) {
        return true;
    }
    true
}

/// One unit of training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub text: String,
    pub features: DocumentFeatures,
    pub analysis_result: JsonValue,
    pub feedback: UserFeedback,
    pub timestamp: DateTime<Utc>,
}

impl TrainingSample {
    pub fn label(&self) -> bool {
        label_for(&self.feedback)
    }
}

/// Vectorizer and classifier fitted together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityModel {
    pub vectorizer: TfidfVectorizer,
    pub classifier: LogisticRegression,
}

impl QualityModel {
    /// Probability that `text` gets a favourable rating.
    pub fn score(&self, text: &str) -> Result<f64> {
        let row = self.vectorizer.transform(text);
        self.classifier.predict_proba(&row)
    }
}

/// On-disk snapshot layout.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    is_trained: bool,
    model: Option<QualityModel>,
    corpus: Vec<TrainingSample>,
    saved_at: DateTime<Utc>,
}

/// Learner settings.
#[derive(Debug, Clone)]
pub struct LearnerConfig {
    pub model_path: PathBuf,
    /// Retrain whenever the corpus length becomes a multiple of this.
    pub retrain_every: usize,
    pub training: TrainingConfig,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(defaults::LEARNING_MODEL_PATH),
            retrain_every: defaults::RETRAIN_EVERY,
            training: TrainingConfig::default(),
        }
    }
}

impl LearnerConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    pub fn with_retrain_every(mut self, every: usize) -> Self {
        self.retrain_every = every.max(1);
        self
    }
}

/// Supervised quality predictor trained on accumulated feedback.
#[derive(Debug)]
pub struct QualityLearner {
    config: LearnerConfig,
    corpus: Vec<TrainingSample>,
    model: Option<QualityModel>,
}

impl QualityLearner {
    /// Untrained learner with an empty corpus.
    pub fn new(config: LearnerConfig) -> Self {
        Self {
            config,
            corpus: Vec::new(),
            model: None,
        }
    }

    /// Restore from the snapshot at `config.model_path`.
    ///
    /// A missing snapshot is a cold start. An unreadable one is logged and
    /// also treated as a cold start.
    #[instrument(skip_all, fields(subsystem = "learning", component = "learner", op = "open"))]
    pub async fn open(config: LearnerConfig) -> Self {
        let mut learner = Self::new(config);
        match learner.load().await {
            Ok(true) => info!(
                path = %learner.config.model_path.display(),
                samples = learner.corpus.len(),
                trained = learner.is_trained(),
                "Quality model loaded"
            ),
            Ok(false) => debug!(
                path = %learner.config.model_path.display(),
                "No quality model snapshot, starting untrained"
            ),
            Err(e) => {
                warn!(
                    path = %learner.config.model_path.display(),
                    error = %e,
                    "Failed to load quality model, starting untrained"
                );
                learner.corpus.clear();
                learner.model = None;
            }
        }
        learner
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn corpus(&self) -> &[TrainingSample] {
        &self.corpus
    }

    pub fn model(&self) -> Option<&QualityModel> {
        self.model.as_ref()
    }

    /// Append a sample; retrains when the corpus reaches the cadence.
    ///
    /// The snapshot is rewritten either way, so the corpus survives a
    /// restart between retrains. Returns whether a retrain ran.
    pub async fn add_feedback(
        &mut self,
        text: &str,
        analysis_result: JsonValue,
        feedback: UserFeedback,
    ) -> bool {
        self.corpus.push(TrainingSample {
            text: text.to_string(),
            features: extract_features(text),
            analysis_result,
            feedback,
            timestamp: Utc::now(),
        });
        debug!(samples = self.corpus.len(), "Training sample added");

        if self.corpus.len() % self.config.retrain_every.max(1) == 0 {
            return self.train().await;
        }

        if let Err(e) = self.save().await {
            warn!(path = %self.config.model_path.display(), error = %e, "Failed to save training corpus");
        }
        false
    }

    /// Rebuild the model from the whole corpus and save a snapshot.
    ///
    /// Returns whether a model was fitted. Save failures are logged; the
    /// freshly fitted model stays in use.
    #[instrument(skip(self), fields(subsystem = "learning", component = "learner", op = "train", samples = self.corpus.len()))]
    pub async fn train(&mut self) -> bool {
        if self.corpus.is_empty() {
            info!("No training data available");
            return false;
        }

        let texts: Vec<&str> = self.corpus.iter().map(|s| s.text.as_str()).collect();
        let labels: Vec<bool> = self.corpus.iter().map(TrainingSample::label).collect();

        let mut vectorizer = TfidfVectorizer::new(defaults::TFIDF_MAX_FEATURES);
        let rows = vectorizer.fit_transform(&texts);
        let classifier = match LogisticRegression::fit(
            &rows,
            &labels,
            vectorizer.feature_count(),
            self.config.training,
        ) {
            Ok(classifier) => classifier,
            Err(e) => {
                warn!(error = %e, "Quality model training failed");
                return false;
            }
        };

        self.model = Some(QualityModel {
            vectorizer,
            classifier,
        });
        info!(
            samples = labels.len(),
            positive = labels.iter().filter(|l| **l).count(),
            "Quality model trained"
        );

        if let Err(e) = self.save().await {
            warn!(path = %self.config.model_path.display(), error = %e, "Failed to save quality model");
        }
        true
    }

    /// Predict the quality of an analysis of `text`.
    pub fn predict_quality(&self, text: &str) -> QualityPrediction {
        let Some(model) = &self.model else {
            return QualityPrediction::cold_start();
        };

        match model.score(text) {
            Ok(p) => QualityPrediction {
                quality_score: p,
                confidence: p.max(1.0 - p),
            },
            Err(e) => {
                warn!(error = %e, "Quality prediction failed");
                QualityPrediction::untrusted()
            }
        }
    }

    /// Retrospective fit quality of the model over its own corpus.
    pub fn performance_metrics(&self) -> ModelPerformance {
        if self.corpus.len() < defaults::METRICS_MIN_SAMPLES {
            return ModelPerformance::insufficient_data();
        }

        let truth: Vec<bool> = self.corpus.iter().map(TrainingSample::label).collect();
        let predicted: Vec<bool> = self
            .corpus
            .iter()
            .map(|s| match &self.model {
                Some(model) => model.score(&s.text).map(|p| p >= 0.5).unwrap_or(true),
                None => true,
            })
            .collect();

        let report = classification_report(&truth, &predicted);
        ModelPerformance::Metrics {
            accuracy: report.accuracy,
            precision: report.precision,
            recall: report.recall,
            f1_score: report.f1_score,
            total_samples: truth.len(),
        }
    }

    /// Write the snapshot atomically: temp file, fsync, rename.
    pub async fn save(&self) -> Result<()> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            is_trained: self.is_trained(),
            model: self.model.clone(),
            corpus: self.corpus.clone(),
            saved_at: Utc::now(),
        };
        let data = serde_json::to_vec(&snapshot)?;
        write_atomic(&self.config.model_path, &data).await?;
        debug!(path = %self.config.model_path.display(), bytes = data.len(), "Quality model saved");
        Ok(())
    }

    /// Replace state from the snapshot. Returns `false` if none exists.
    pub async fn load(&mut self) -> Result<bool> {
        let path = &self.config.model_path;
        if !fs::try_exists(path).await? {
            return Ok(false);
        }

        let data = fs::read(path).await?;
        let snapshot: Snapshot = serde_json::from_slice(&data)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::Model(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        self.corpus = snapshot.corpus;
        self.model = if snapshot.is_trained {
            snapshot.model
        } else {
            None
        };
        Ok(true)
    }
}

async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).await.map_err(|e| {
        warn!(temp_path = %temp_path.display(), error = %e, "quality model: File::create failed");
        e
    })?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, path).await.map_err(|e| {
        warn!(from = %temp_path.display(), to = %path.display(), error = %e, "quality model: rename failed");
        e
    })?;
    Ok(())
}
