//! End-to-end integration tests: generate -> CSV -> train -> JSON -> deserialize.

use std::fs;

use chrono::{TimeZone, Utc};
use ctr_io::{DatasetWriter, ExperimentName, InteractionReader, ResultWriter};
use ctr_model::{ClickModel, ModelConfig};
use ctr_synth::GeneratorConfig;
use tempfile::TempDir;

#[test]
fn report_round_trip() {
    let dataset = GeneratorConfig::new(500)
        .unwrap()
        .with_anchor(Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap())
        .generate();

    let dir = TempDir::new().unwrap();
    let experiment = ExperimentName::new("ctr_rt".into()).unwrap();
    let writer = ResultWriter::new(dir.path(), experiment).unwrap();

    // 1. Dataset survives the CSV round trip exactly.
    DatasetWriter::new(&writer.dataset_path()).write(&dataset).unwrap();
    let reloaded = InteractionReader::new(&writer.dataset_path()).read().unwrap();
    assert_eq!(reloaded, dataset);

    // 2. Train on the reloaded copy.
    let mut model = ClickModel::with_config(ModelConfig::new().with_n_trees(25).unwrap());
    let accuracy = model.train(&reloaded).unwrap();

    // 3. Report artifact.
    let report_path = writer
        .write_report(&reloaded, model.evaluation().unwrap(), model.feature_importance())
        .unwrap();
    assert_eq!(report_path, dir.path().join("ctr_rt_report.json"));
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();

    assert_eq!(report["experiment"], "ctr_rt");
    assert!((report["accuracy"].as_f64().unwrap() - accuracy).abs() < 1e-12);
    assert_eq!(report["evaluation"]["n_test"], 100);

    let importance = report["feature_importance"].as_array().unwrap();
    assert_eq!(importance.len(), 9);
    let total: f64 = importance.iter().map(|f| f["importance"].as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(importance[0]["rank"], 1);

    let analytics = &report["analytics"];
    assert_eq!(analytics["summary"]["n_samples"], 500);
    assert_eq!(analytics["click_rate_by_device_type"].as_array().unwrap().len(), 3);
    assert_eq!(analytics["correlation"]["columns"][3], "clicked");
    assert_eq!(analytics["correlation"]["matrix"][2][2], 1.0);
    let days = analytics["daily_click_rate"].as_array().unwrap();
    assert!(!days.is_empty() && days.len() <= 31);

    // 4. Predictions artifact.
    let probabilities = model.predict(&reloaded).unwrap();
    let predictions_path = writer.write_predictions(&reloaded, &probabilities).unwrap();
    let predictions: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&predictions_path).unwrap()).unwrap();
    let rows = predictions["predictions"].as_array().unwrap();
    assert_eq!(rows.len(), 500);
    assert!(rows.iter().all(|r| {
        let p = r["probability"].as_f64().unwrap();
        (0.0..=1.0).contains(&p)
    }));
}
