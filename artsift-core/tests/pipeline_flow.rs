//! End-to-end tests for the verification pipeline.
//!
//! These drive the public entry points with a scripted HTTP client,
//! covering partial failure, idempotence, and the subset guarantee for
//! both sources.

use artsift_core::batch::ProgressSink;
use artsift_core::{
    Dataset, PipelineConfig, ScriptedProbeClient, ScriptedResponse, Source, filter_with_client,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

const BASE: &str = "https://collection.example.org/objects";

struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_complete(&self, _done: usize, _total: usize) {}
}

fn config() -> PipelineConfig {
    PipelineConfig {
        met_base_url: BASE.to_string(),
        max_in_flight: 16,
        ..PipelineConfig::default()
    }
}

fn met_dataset(ids: &[&str]) -> Dataset {
    Dataset::new(
        vec!["Object ID".into(), "Title".into()],
        ids.iter()
            .map(|id| vec![id.to_string(), format!("object {id}")])
            .collect(),
    )
    .unwrap()
}

async fn run(
    dataset: &Dataset,
    source: Source,
    client: ScriptedProbeClient,
) -> artsift_core::FilterOutcome {
    filter_with_client(
        dataset,
        source,
        &config(),
        Arc::new(client),
        Arc::new(NullProgress),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn met_partial_failure_keeps_exactly_the_verified_row() {
    let dataset = met_dataset(&["1", "2", "3"]);
    // 1 has no image, 2 verifies, 3 fails at the transport level
    let client = ScriptedProbeClient::new()
        .with_response(
            &format!("{BASE}/1"),
            ScriptedResponse::Json(json!({ "primaryImage": "" })),
        )
        .with_response(
            &format!("{BASE}/2"),
            ScriptedResponse::Json(json!({ "primaryImage": "https://img/2.jpg" })),
        )
        .with_response(
            &format!("{BASE}/3"),
            ScriptedResponse::Error("timed out".into()),
        );

    let outcome = run(&dataset, Source::Met, client).await;

    assert_eq!(outcome.dataset.len(), 1);
    let id_col = outcome.dataset.column_index("Object ID").unwrap();
    let url_col = outcome.dataset.column_index("image_url").unwrap();
    assert_eq!(outcome.dataset.rows()[0][id_col], "2");
    assert_eq!(outcome.dataset.rows()[0][url_col], "https://img/2.jpg");

    assert_eq!(outcome.stats.targets_total, 3);
    assert_eq!(outcome.stats.targets_valid, 1);
    assert_eq!(outcome.stats.rows_in, 3);
    assert_eq!(outcome.stats.rows_out, 1);
}

#[tokio::test]
async fn europeana_dropbox_html_row_is_dropped() {
    let dropbox_url = "https://www.dropbox.com/s/abc/painting.jpg";
    let plain_url = "https://images.example.org/painting.jpg";
    let dataset = Dataset::new(
        vec!["europeana_id".into(), "image_url".into()],
        vec![
            vec!["/e/1".into(), dropbox_url.into()],
            vec!["/e/2".into(), plain_url.into()],
        ],
    )
    .unwrap();
    let client = ScriptedProbeClient::new()
        .with_response(
            dropbox_url,
            ScriptedResponse::Bytes(b"<!DOCTYPE html><html>".to_vec()),
        )
        .with_response(plain_url, ScriptedResponse::Bytes(vec![0xFF, 0xD8, 0xFF]));

    let outcome = run(&dataset, Source::Europeana, client).await;

    assert_eq!(outcome.dataset.len(), 1);
    assert_eq!(
        outcome.dataset.rows()[0],
        vec!["/e/2".to_string(), plain_url.to_string()]
    );
}

#[tokio::test]
async fn pipeline_is_idempotent_against_a_stable_upstream() {
    let dataset = met_dataset(&["1", "2", "3", "4"]);
    let client = ScriptedProbeClient::new()
        .with_response(
            &format!("{BASE}/1"),
            ScriptedResponse::Json(json!({ "primaryImage": "https://img/1.jpg" })),
        )
        .with_response(&format!("{BASE}/2"), ScriptedResponse::Status(404))
        .with_response(
            &format!("{BASE}/3"),
            ScriptedResponse::Json(json!({ "primaryImage": "https://img/3.jpg" })),
        )
        .with_response(
            &format!("{BASE}/4"),
            ScriptedResponse::Error("connection reset".into()),
        );

    let first = run(&dataset, Source::Met, client.clone()).await;
    let second = run(&dataset, Source::Met, client).await;

    let keys = |outcome: &artsift_core::FilterOutcome| -> HashSet<String> {
        let id_col = outcome.dataset.column_index("Object ID").unwrap();
        outcome
            .dataset
            .rows()
            .iter()
            .map(|row| row[id_col].clone())
            .collect()
    };
    assert_eq!(keys(&first), keys(&second));
    assert_eq!(keys(&first), HashSet::from(["1".to_string(), "3".to_string()]));
}

#[tokio::test]
async fn output_rows_are_a_subset_of_input_rows() {
    let dataset = met_dataset(&["10", "11", "12"]);
    let client = ScriptedProbeClient::new()
        .with_response(
            &format!("{BASE}/10"),
            ScriptedResponse::Json(json!({ "primaryImage": "https://img/10.jpg" })),
        )
        .with_response(
            &format!("{BASE}/11"),
            ScriptedResponse::Json(json!({ "primaryImage": "https://img/11.jpg" })),
        )
        .with_response(&format!("{BASE}/12"), ScriptedResponse::Status(500));

    let outcome = run(&dataset, Source::Met, client).await;

    let input_ids: HashSet<_> = dataset.rows().iter().map(|row| row[0].clone()).collect();
    let id_col = outcome.dataset.column_index("Object ID").unwrap();
    assert!(
        outcome
            .dataset
            .rows()
            .iter()
            .all(|row| input_ids.contains(&row[id_col]))
    );
    // and the input table kept every row and column it started with
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.header().len(), 2);
}

#[tokio::test]
async fn duplicate_met_identifiers_are_looked_up_once() {
    // a single scripted response serves all duplicate rows; if the
    // extractor requested per-row the unscripted duplicates would fail
    let dataset = met_dataset(&["7", "7", "7"]);
    let client = ScriptedProbeClient::new().with_response(
        &format!("{BASE}/7"),
        ScriptedResponse::Json(json!({ "primaryImage": "https://img/7.jpg" })),
    );

    let outcome = run(&dataset, Source::Met, client).await;

    assert_eq!(outcome.stats.targets_total, 1);
    assert_eq!(outcome.dataset.len(), 3);
}

#[tokio::test]
async fn zero_concurrency_is_a_configuration_error() {
    let dataset = met_dataset(&["1"]);
    let config = PipelineConfig {
        max_in_flight: 0,
        ..PipelineConfig::default()
    };
    let result = filter_with_client(
        &dataset,
        Source::Met,
        &config,
        Arc::new(ScriptedProbeClient::new()),
        Arc::new(NullProgress),
    )
    .await;
    assert!(matches!(
        result,
        Err(artsift_core::ArtsiftError::Config(
            artsift_core::ConfigError::ZeroConcurrency
        ))
    ));
}
