//! Evaluation metrics for the held-out split.

use std::fmt;

use serde::Serialize;

/// Confusion matrix for a `K`-class classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn from_predictions(n_classes: usize, truth: &[usize], predicted: &[usize]) -> Self {
        let mut matrix = Self::new(n_classes);
        for (&t, &p) in truth.iter().zip(predicted) {
            matrix.add(t, p);
        }
        matrix
    }

    /// Out-of-range indices are ignored.
    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

/// Precision/recall/F1 for one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub name: String,
    /// `TP / (TP + FP)`, 0 when nothing was predicted as this class.
    pub precision: f32,
    /// `TP / (TP + FN)`, 0 when the class has no support.
    pub recall: f32,
    pub f1: f32,
    /// Number of true examples of the class.
    pub support: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub support: u32,
}

/// Per-class metrics plus accuracy and averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f32,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn from_predictions(class_names: &[String], truth: &[usize], predicted: &[usize]) -> Self {
        let confusion = ConfusionMatrix::from_predictions(class_names.len(), truth, predicted);
        Self::from_confusion(class_names, confusion)
    }

    pub fn from_confusion(class_names: &[String], confusion: ConfusionMatrix) -> Self {
        let k = confusion.n_classes;
        let mut classes = Vec::with_capacity(k);
        for class_idx in 0..k {
            let tp = confusion.get(class_idx, class_idx) as f32;
            let mut fp = 0f32;
            let mut fn_ = 0f32;
            let mut support = 0u32;
            for j in 0..k {
                let v = confusion.get(class_idx, j);
                support = support.saturating_add(v);
                if j != class_idx {
                    fn_ += v as f32;
                }
            }
            for i in 0..k {
                if i != class_idx {
                    fp += confusion.get(i, class_idx) as f32;
                }
            }
            let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
            let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            let name = class_names
                .get(class_idx)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", class_idx));
            classes.push(ClassMetrics {
                name,
                precision,
                recall,
                f1,
                support,
            });
        }

        let total = confusion.total();
        let correct: u32 = (0..k).map(|i| confusion.get(i, i)).sum();
        let accuracy = if total == 0 {
            0.0
        } else {
            correct as f32 / total as f32
        };

        let n = k.max(1) as f32;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f32>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f32>() / n,
            f1: classes.iter().map(|c| c.f1).sum::<f32>() / n,
            support: total,
        };
        let weighted = |metric: fn(&ClassMetrics) -> f32| -> f32 {
            if total == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|c| metric(c) * c.support as f32)
                    .sum::<f32>()
                    / total as f32
            }
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
            support: total,
        };

        Self {
            classes,
            accuracy,
            macro_avg,
            weighted_avg,
            confusion,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.name.len())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                class.name, class.precision, class.recall, class.f1, class.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }

        writeln!(f)?;
        writeln!(f, "confusion matrix (rows = truth, columns = predicted):")?;
        for truth in 0..self.confusion.n_classes {
            let row: Vec<String> = (0..self.confusion.n_classes)
                .map(|predicted| format!("{:>5}", self.confusion.get(truth, predicted)))
                .collect();
            writeln!(f, "{:>width$} {}", self.classes[truth].name, row.join(""))?;
        }
        Ok(())
    }
}
