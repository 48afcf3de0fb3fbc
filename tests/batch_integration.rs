//! Integration tests for the batch driver and its reports.

use serde_json::json;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use searchduel::batch::{load_queries, write_report, BatchReport, BatchRunner};
use searchduel::executors::{GeminiExecutor, PerplexityExecutor, SearchExecutor};
use searchduel::types::requests::Provider;
use searchduel::types::responses::Citation;

async fn mock_providers() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Gemini says hi. [G](https://g.example)"}]}}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_batch_runs_sequentially_with_delay() {
    let server = mock_providers().await;
    let executors: Vec<Box<dyn SearchExecutor>> = vec![
        Box::new(GeminiExecutor::new("k").unwrap().with_base_url(server.uri())),
        Box::new(PerplexityExecutor::new("k").unwrap().with_base_url(server.uri())),
    ];
    let runner = BatchRunner::new(executors).with_delay(Duration::from_millis(50));
    let queries = vec!["first".to_string(), "second".to_string()];

    let start = Instant::now();
    let report = runner.run(&queries).await;

    // four calls, three pauses between them
    assert!(start.elapsed() >= Duration::from_millis(150));
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.error_count(), 2);
    assert_eq!(report.delay_ms, 50);

    let entry = &report.entries[0];
    assert_eq!(entry.query, "first");
    assert_eq!(entry.results[0].provider, Provider::Gemini);
    assert_eq!(entry.results[0].citations, vec![Citation::new("G", "https://g.example")]);
    assert!(entry.results[1].error.as_deref().unwrap().contains("500"));

    let comparison = entry.comparison.as_ref().unwrap();
    assert_eq!(comparison.faster, None);
    assert_eq!(comparison.citation_delta, 1);

    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_batch_report_is_written_and_parseable() {
    let server = mock_providers().await;
    let runner = BatchRunner::new(vec![Box::new(
        GeminiExecutor::new("k").unwrap().with_base_url(server.uri()),
    )]);

    let report = runner.run(&["only".to_string()]).await;

    let temp = TempDir::new().unwrap();
    let path = write_report(&report, temp.path(), "gemini_test_results").unwrap();
    let parsed: BatchReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(parsed.run_id, report.run_id);
    assert_eq!(parsed.entries[0].results, report.entries[0].results);
}

#[test]
fn test_load_queries_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("queries.txt");
    std::fs::write(&file, "# daily\nWhat are today's top news headlines?\n\nNVIDIA price?\n").unwrap();

    let queries = load_queries(&file).unwrap();

    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1], "NVIDIA price?");
}

#[tokio::test]
async fn test_model_sweep_stays_on_its_provider() {
    let server = mock_providers().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Pro answer"}]}}]
        })))
        .mount(&server)
        .await;

    let executors: Vec<Box<dyn SearchExecutor>> = vec![
        Box::new(GeminiExecutor::new("k").unwrap().with_base_url(server.uri())),
        Box::new(PerplexityExecutor::new("k").unwrap().with_base_url(server.uri())),
    ];
    let runner = BatchRunner::new(executors).with_models(
        Provider::Gemini,
        vec!["gemini-1.5-pro".to_string(), "gemini-2.0-flash".to_string()],
    );

    let report = runner.run(&["q".to_string()]).await;

    let results = &report.entries[0].results;
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].answer, "Pro answer");
    assert_eq!(results[2].provider, Provider::Perplexity);
    assert_eq!(results[2].model, "sonar");

    let requests = server.received_requests().await.unwrap();
    let perplexity_body: serde_json::Value = requests
        .iter()
        .find(|r| r.url.path() == "/chat/completions")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .unwrap();
    assert_eq!(perplexity_body["model"], "sonar");
}
