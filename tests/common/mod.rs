//! Fitted classifiers written as artifacts for the integration tests.

#![expect(clippy::unwrap_used)]

use churnguard::features::FEATURE_COLUMNS;
use churnguard::model::{FittedClassifier, ModelArtifact};
use linfa::traits::Fit;
use linfa_logistic::LogisticRegression;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2};
use std::path::{Path, PathBuf};

/// Every charge/phone/tenure combination appears once per contract type and
/// churns exactly when the contract is month-to-month.
fn month_to_month_rows() -> linfa::Dataset<f64, usize, ndarray::Ix1> {
    let mut records = Vec::new();
    let mut targets = Vec::new();
    for i in 0..12 {
        let charges = 20.0 + 700.0 * f64::from(i);
        let phone = f64::from(i % 2);
        let tenure = 1.0 + 6.0 * f64::from(i);
        for contract in 0..3 {
            let mut onehot = [0.0; 3];
            onehot[contract] = 1.0;
            records.extend([charges, onehot[0], onehot[1], onehot[2], phone, tenure]);
            targets.push(usize::from(contract == 0));
        }
    }
    let records = Array2::from_shape_vec((targets.len(), FEATURE_COLUMNS.len()), records).unwrap();
    linfa::Dataset::new(records, Array1::from(targets))
}

#[derive(Clone, Copy, Debug)]
pub enum Family {
    Logistic,
    Tree,
}

/// Fit a month-to-month churn model and write it to `dir/<name>`.
pub fn write_model(dir: &Path, family: Family) -> PathBuf {
    let rows = month_to_month_rows();
    let (name, classifier) = match family {
        Family::Logistic => (
            "model_logistic.json",
            FittedClassifier::LogisticRegression(
                LogisticRegression::default()
                    .max_iterations(500)
                    .fit(&rows)
                    .unwrap(),
            ),
        ),
        Family::Tree => (
            "model_tree.json",
            FittedClassifier::DecisionTree(DecisionTree::params().fit(&rows).unwrap()),
        ),
    };
    let path = dir.join(name);
    ModelArtifact::new(&FEATURE_COLUMNS, classifier)
        .write(&path)
        .unwrap();
    path
}
