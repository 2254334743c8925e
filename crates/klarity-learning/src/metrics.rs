//! Classification metrics with support-weighted averaging.

/// Accuracy and support-weighted precision, recall and F1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Compute a report for binary labels.
///
/// Per-class scores with a zero denominator count as 0. Classes are weighted
/// by their support in `truth`.
pub fn classification_report(truth: &[bool], predicted: &[bool]) -> ClassificationReport {
    let total = truth.len().min(predicted.len());
    if total == 0 {
        return ClassificationReport {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
        };
    }

    let pairs: Vec<(bool, bool)> = truth
        .iter()
        .copied()
        .zip(predicted.iter().copied())
        .collect();
    let correct = pairs.iter().filter(|(t, p)| t == p).count();

    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1_score = 0.0;
    for class in [false, true] {
        let tp = pairs.iter().filter(|(t, p)| *t == class && *p == class).count() as f64;
        let predicted_as = pairs.iter().filter(|(_, p)| *p == class).count() as f64;
        let support = pairs.iter().filter(|(t, _)| *t == class).count() as f64;

        let p = ratio(tp, predicted_as);
        let r = ratio(tp, support);
        let f = ratio(2.0 * p * r, p + r);

        let weight = support / total as f64;
        precision += weight * p;
        recall += weight * r;
        f1_score += weight * f;
    }

    ClassificationReport {
        accuracy: correct as f64 / total as f64,
        precision,
        recall,
        f1_score,
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let labels = [true, false, true];
        let report = classification_report(&labels, &labels);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.precision, 1.0);
        assert_eq!(report.recall, 1.0);
        assert_eq!(report.f1_score, 1.0);
    }

    #[test]
    fn test_all_positive_predictions() {
        let truth = [true, true, true, false];
        let report = classification_report(&truth, &[true; 4]);
        assert_eq!(report.accuracy, 0.75);
        // positive: p = 0.75, r = 1.0; negative: p = r = 0 (weight 0.25)
        assert!((report.precision - 0.5625).abs() < 1e-12);
        assert!((report.recall - 0.75).abs() < 1e-12);
        let f_pos = 2.0 * 0.75 / 1.75;
        assert!((report.f1_score - 0.75 * f_pos).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(classification_report(&[], &[]).accuracy, 0.0);
    }
}
