//! Binary logistic regression over sparse TF-IDF rows.
//!
//! Fitted by full-batch gradient descent with L2 regularisation on the
//! weights (the bias is not regularised). A corpus containing a single class
//! produces a constant model that predicts that class with probability 1.

use serde::{Deserialize, Serialize};

use klarity_core::{defaults, Error, Result};

use crate::vectorizer::SparseVector;

/// Gradient-descent hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: defaults::CLASSIFIER_EPOCHS,
            learning_rate: defaults::CLASSIFIER_LEARNING_RATE,
            l2: defaults::CLASSIFIER_L2,
        }
    }
}

/// Fitted classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    bias: f64,
    /// Set when every training label was the same.
    constant: Option<bool>,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LogisticRegression {
    /// Fit on `rows` with boolean `labels` (true = positive).
    ///
    /// `dimension` is the vectorizer's feature count.
    pub fn fit(
        rows: &[SparseVector],
        labels: &[bool],
        dimension: usize,
        config: TrainingConfig,
    ) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Model("cannot fit on an empty corpus".to_string()));
        }
        if rows.len() != labels.len() {
            return Err(Error::Model(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let positives = labels.iter().filter(|l| **l).count();
        if positives == 0 || positives == labels.len() {
            return Ok(Self {
                weights: vec![0.0; dimension],
                bias: 0.0,
                constant: Some(positives > 0),
            });
        }

        let n = rows.len() as f64;
        let mut weights = vec![0.0; dimension];
        let mut bias = 0.0;
        let mut grad = vec![0.0; dimension];

        for _ in 0..config.epochs {
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_bias = 0.0;

            for (row, label) in rows.iter().zip(labels) {
                let z = bias + dot(&weights, row)?;
                let err = sigmoid(z) - if *label { 1.0 } else { 0.0 };
                for &(idx, value) in row {
                    grad[idx] += err * value;
                }
                grad_bias += err;
            }

            for (w, g) in weights.iter_mut().zip(&grad) {
                *w -= config.learning_rate * (g / n + config.l2 * *w);
            }
            bias -= config.learning_rate * grad_bias / n;
        }

        Ok(Self {
            weights,
            bias,
            constant: None,
        })
    }

    /// Probability that `row` belongs to the positive class.
    ///
    /// Fails if `row` references a feature the model was not fitted with.
    pub fn predict_proba(&self, row: &SparseVector) -> Result<f64> {
        if let Some(class) = self.constant {
            return Ok(if class { 1.0 } else { 0.0 });
        }
        Ok(sigmoid(self.bias + dot(&self.weights, row)?))
    }

    /// Hard prediction at the 0.5 boundary.
    pub fn predict(&self, row: &SparseVector) -> Result<bool> {
        Ok(self.predict_proba(row)? >= 0.5)
    }

    pub fn dimension(&self) -> usize {
        self.weights.len()
    }

    /// The single class this model always predicts, if any.
    pub fn constant_class(&self) -> Option<bool> {
        self.constant
    }
}

fn dot(weights: &[f64], row: &SparseVector) -> Result<f64> {
    row.iter().try_fold(0.0, |acc, &(idx, value)| {
        weights
            .get(idx)
            .map(|w| acc + w * value)
            .ok_or_else(|| {
                Error::Model(format!(
                    "feature {} outside model dimension {}",
                    idx,
                    weights.len()
                ))
            })
    })
}
