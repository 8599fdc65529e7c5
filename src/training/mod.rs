// Training module - offline batch that turns a labelled corpus into a model
// artifact and a held-out classification report.
//
// Flow: dataset::load → train_test_split → RandomForest::fit → report on the
// test rows → ModelArtifact::save. Every failure here is fatal for the batch.

pub mod dataset;

pub use dataset::{load, load_with, Dataset, LabelMap};

use std::path::Path;

use anyhow::Context;

use crate::config::TrainingConfig;
use crate::error::TrainingError;
use crate::model::{train_test_split, ClassificationReport, ModelArtifact, RandomForest};

/// Fitted forest plus its evaluation on the held-out rows
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub forest: RandomForest,
    pub report: ClassificationReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Split, fit and evaluate
///
/// `class_names[i]` names class index `i`; the report always lists every
/// class, including ones absent from the test rows.
pub fn train_model(
    x: &[Vec<f32>],
    y: &[usize],
    class_names: &[String],
    config: &TrainingConfig,
) -> Result<TrainingOutcome, TrainingError> {
    if x.len() != y.len() {
        return Err(TrainingError::MismatchedLengths {
            reason: format!("{} feature rows but {} labels", x.len(), y.len()),
        });
    }
    if x.is_empty() {
        return Err(TrainingError::EmptyDataset { samples: 0 });
    }
    let first = y[0];
    if y.iter().all(|&label| label == first) {
        return Err(TrainingError::SingleClass { label: first });
    }

    let split = train_test_split(x.len(), config.test_fraction, config.seed)?;
    let pick = |indices: &[usize]| -> (Vec<Vec<f32>>, Vec<usize>) {
        indices.iter().map(|&i| (x[i].clone(), y[i])).unzip()
    };
    let (x_train, y_train) = pick(&split.train);
    let (x_test, y_test) = pick(&split.test);

    tracing::info!(
        train = x_train.len(),
        test = x_test.len(),
        seed = config.seed,
        "Training random forest"
    );

    let forest = RandomForest::fit(&x_train, &y_train, class_names.len(), &config.forest_options())?;

    let mut y_pred = Vec::with_capacity(x_test.len());
    for row in &x_test {
        let predicted = forest.predict(row).map_err(|err| TrainingError::MismatchedLengths {
            reason: err.to_string(),
        })?;
        y_pred.push(predicted);
    }
    let report = ClassificationReport::from_predictions(class_names, &y_test, &y_pred);

    tracing::info!(accuracy = report.accuracy, "Held-out evaluation finished");

    Ok(TrainingOutcome {
        forest,
        report,
        train_rows: x_train.len(),
        test_rows: x_test.len(),
    })
}

/// Load the corpus, train, evaluate and write the artifact to `output`.
pub fn train_from_corpus(
    corpus_root: &Path,
    label_map: &LabelMap,
    config: &TrainingConfig,
    output: &Path,
) -> anyhow::Result<TrainingOutcome> {
    let dataset = load(corpus_root, label_map)
        .with_context(|| format!("loading corpus from {}", corpus_root.display()))?;

    let class_names = label_map.class_names();
    let outcome = train_model(&dataset.x, &dataset.y, &class_names, config)
        .context("training random forest")?;

    ModelArtifact::new(outcome.forest.clone(), class_names)
        .save(output)
        .with_context(|| format!("writing model to {}", output.display()))?;

    Ok(outcome)
}
