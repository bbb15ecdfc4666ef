//! Property tests for drift scoring.

#![expect(clippy::unwrap_used)]

use churnguard::data::Dataset;
use churnguard::monitor::{DivergencePolicy, DriftDetector};
use polars::prelude::*;
use proptest::prelude::*;

const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];

fn build(rows: &[(f64, usize)]) -> Dataset {
    let charges: Vec<f64> = rows.iter().map(|(c, _)| *c).collect();
    let contracts: Vec<&str> = rows.iter().map(|(_, k)| CONTRACTS[*k]).collect();
    Dataset::from_frame(df!("TotalCharges" => charges, "Contract" => contracts).unwrap()).unwrap()
}

fn rows() -> impl Strategy<Value = Vec<(f64, usize)>> {
    prop::collection::vec((0.0..8684.0f64, 0..3usize), 2..60)
}

/// A batch of rows and a permutation of it.
fn shuffled_pair() -> impl Strategy<Value = (Vec<(f64, usize)>, Vec<(f64, usize)>)> {
    rows().prop_flat_map(|r| (Just(r.clone()), Just(r).prop_shuffle()))
}

fn policies() -> impl Strategy<Value = DivergencePolicy> {
    prop_oneof![
        Just(DivergencePolicy::MomentShift),
        Just(DivergencePolicy::QuantileDistance)
    ]
}

fn scores(detector: &DriftDetector, current: &Dataset) -> Vec<(String, f64)> {
    let report = detector.detect_drift(current, None).unwrap();
    report
        .metrics()
        .map(|(name, m)| (name.to_owned(), m.divergence_score))
        .collect()
}

proptest! {
    #[test]
    fn identical_data_never_drifts(data in rows(), policy in policies()) {
        let ds = build(&data);
        let detector = DriftDetector::new(&ds).unwrap().with_policy(policy);
        let summary = detector.detect_drift(&ds, None).unwrap().summary();

        prop_assert_eq!(summary.drift_score, 0.0);
        prop_assert!(!summary.drift_detected);
        prop_assert!(summary.features_drifted.is_empty());
    }

    #[test]
    fn row_order_does_not_change_scores(
        (reference, shuffled_ref) in shuffled_pair(),
        (current, shuffled_cur) in shuffled_pair(),
        policy in policies(),
    ) {
        let original = DriftDetector::new(&build(&reference)).unwrap().with_policy(policy);
        let permuted = DriftDetector::new(&build(&shuffled_ref)).unwrap().with_policy(policy);

        prop_assert_eq!(
            scores(&original, &build(&current)),
            scores(&permuted, &build(&shuffled_cur))
        );
    }

    #[test]
    fn categorical_scores_are_bounded(reference in rows(), current in rows()) {
        let detector = DriftDetector::new(&build(&reference)).unwrap();
        let report = detector.detect_drift(&build(&current), None).unwrap();
        let metric = report.metric("Contract");
        prop_assert!(metric.is_some());
        if let Some(metric) = metric {
            prop_assert!((0.0..=1.0).contains(&metric.divergence_score));
        }
    }
}
