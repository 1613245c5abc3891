use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{Map, Value};

use wardrobe_config::{Analyzer, EmbeddingProviderConfig, GenerationProviderConfig};
use wardrobe_providers::{AnalysisError, Attachment, RetryingAnalyzer, embedding};
use wardrobe_testkit::{MockEndpoint, MockResponse};

#[derive(Debug, PartialEq, Deserialize)]
struct Swatch {
	color: String,
	pattern: String,
}

fn generation_config(api_base: String) -> GenerationProviderConfig {
	GenerationProviderConfig {
		provider_id: "gemini".to_string(),
		api_base,
		api_key: "secret".to_string(),
		path: "/v1beta/models/gemini-test:generateContent".to_string(),
		model: "gemini-test".to_string(),
		temperature: 0.1,
		timeout_ms: 5_000,
		default_headers: Map::new(),
		api_key_header: Some("x-goog-api-key".to_string()),
	}
}

fn embedding_config(api_base: String) -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		provider_id: "vertex".to_string(),
		api_base,
		api_key: "secret".to_string(),
		path: "/v1/models/text-embedding-test:predict".to_string(),
		model: "text-embedding-test".to_string(),
		dimensions: 3,
		timeout_ms: 5_000,
		default_headers: Map::new(),
		api_key_header: None,
	}
}

fn policy(max_attempts: u32) -> Analyzer {
	Analyzer { max_attempts, retry_backoff_ms: 1, max_backoff_ms: 5, deadline_ms: None }
}

fn analyzer_for(endpoint: &MockEndpoint, policy: Analyzer) -> RetryingAnalyzer {
	RetryingAnalyzer::new(generation_config(endpoint.base_url()), policy)
		.expect("Failed to build analyzer.")
}

#[test]
fn builds_bearer_auth_header() {
	let headers = wardrobe_providers::auth_headers("secret", None, &Map::new())
		.expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn builds_named_api_key_header() {
	let mut defaults = Map::new();

	defaults.insert("x-client".to_string(), Value::String("wardrobe".to_string()));

	let headers = wardrobe_providers::auth_headers("secret", Some("x-goog-api-key"), &defaults)
		.expect("Failed to build headers.");

	assert!(headers.get(AUTHORIZATION).is_none());
	assert_eq!(headers.get("x-goog-api-key").expect("Missing api key header."), "secret");
	assert_eq!(headers.get("x-client").expect("Missing default header."), "wardrobe");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	assert!(wardrobe_providers::auth_headers("secret", None, &defaults).is_err());
}

#[tokio::test]
async fn decodes_fenced_model_output() {
	let endpoint = MockEndpoint::start(vec![MockResponse::generation(
		"```json\n{\"Color\":\"navy\",\"PATTERN\":\"plaid\"}\n```",
	)])
	.await
	.expect("Failed to start mock endpoint.");
	let analyzer = analyzer_for(&endpoint, policy(3));
	let swatch: Swatch = analyzer
		.analyze_one("Describe the swatch.", &[Attachment::new("image/jpeg", vec![0xFF, 0xD8])])
		.await
		.expect("Expected analysis to succeed.");

	assert_eq!(swatch, Swatch { color: "navy".to_string(), pattern: "plaid".to_string() });

	let requests = endpoint.requests();

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].path, "/v1beta/models/gemini-test:generateContent");
	assert_eq!(requests[0].headers.get("x-goog-api-key").map(String::as_str), Some("secret"));
	assert_eq!(requests[0].body["contents"][0]["parts"][1]["inline_data"]["data"], "/9g=");
}

#[tokio::test]
async fn decodes_bare_object_as_list() {
	let endpoint = MockEndpoint::start(vec![MockResponse::generation(
		"Sure! {\"color\":\"red\",\"pattern\":\"solid\"}",
	)])
	.await
	.expect("Failed to start mock endpoint.");
	let analyzer = analyzer_for(&endpoint, policy(3));
	let swatches: Vec<Swatch> =
		analyzer.analyze_many("List swatches.", &[]).await.expect("Expected analysis to succeed.");

	assert_eq!(swatches, vec![Swatch { color: "red".to_string(), pattern: "solid".to_string() }]);
}

#[tokio::test]
async fn retries_transient_status_then_succeeds() {
	let endpoint = MockEndpoint::start(vec![
		MockResponse::text(503, "overloaded"),
		MockResponse::generation("{\"color\":\"green\",\"pattern\":\"striped\"}"),
	])
	.await
	.expect("Failed to start mock endpoint.");
	let analyzer = analyzer_for(&endpoint, policy(3));
	let swatch: Swatch =
		analyzer.analyze_one("Describe.", &[]).await.expect("Expected retry to succeed.");

	assert_eq!(swatch.color, "green");
	assert_eq!(endpoint.request_count(), 2);
}

#[tokio::test]
async fn retries_malformed_output_then_succeeds() {
	let endpoint = MockEndpoint::start(vec![
		MockResponse::generation("I am not sure what this is."),
		MockResponse::generation("{\"color\":\"black\",\"pattern\":\"solid\"}"),
	])
	.await
	.expect("Failed to start mock endpoint.");
	let analyzer = analyzer_for(&endpoint, policy(3));
	let swatch: Swatch =
		analyzer.analyze_one("Describe.", &[]).await.expect("Expected retry to succeed.");

	assert_eq!(swatch.color, "black");
	assert_eq!(endpoint.request_count(), 2);
}

#[tokio::test]
async fn client_error_is_returned_without_retry() {
	let endpoint = MockEndpoint::start(vec![MockResponse::text(400, "{\"error\":\"bad request\"}")])
		.await
		.expect("Failed to start mock endpoint.");
	let analyzer = analyzer_for(&endpoint, policy(3));
	let err = analyzer.analyze_one::<Swatch>("Describe.", &[]).await.expect_err("Expected error.");

	match err {
		AnalysisError::TransportFailure { status, body } => {
			assert_eq!(status, 400);
			assert!(body.contains("bad request"), "Unexpected body: {body}");
		},
		other => panic!("Unexpected error: {other}"),
	}

	assert_eq!(endpoint.request_count(), 1);
}

#[tokio::test]
async fn exhausts_attempts_on_persistent_failure() {
	let endpoint =
		MockEndpoint::start_with_fallback(Vec::new(), MockResponse::generation("no json"))
			.await
			.expect("Failed to start mock endpoint.");
	let analyzer = analyzer_for(&endpoint, policy(3));
	let err = analyzer.analyze_one::<Swatch>("Describe.", &[]).await.expect_err("Expected error.");

	match err {
		AnalysisError::ExhaustedRetries { attempts, last } => {
			assert_eq!(attempts, 3);
			assert!(matches!(*last, AnalysisError::MalformedPayload { .. }), "Unexpected: {last}");
		},
		other => panic!("Unexpected error: {other}"),
	}

	assert_eq!(endpoint.request_count(), 3);
}

#[tokio::test]
async fn single_attempt_policy_makes_one_request() {
	let endpoint = MockEndpoint::start_with_fallback(Vec::new(), MockResponse::text(503, "busy"))
		.await
		.expect("Failed to start mock endpoint.");
	let analyzer = analyzer_for(&endpoint, policy(1));
	let err = analyzer.analyze_one::<Swatch>("Describe.", &[]).await.expect_err("Expected error.");

	assert!(
		matches!(err, AnalysisError::ExhaustedRetries { attempts: 1, .. }),
		"Unexpected error: {err}"
	);
	assert_eq!(endpoint.request_count(), 1);
}

#[tokio::test]
async fn empty_payload_is_reported() {
	let endpoint = MockEndpoint::start_with_fallback(Vec::new(), MockResponse::generation("[]"))
		.await
		.expect("Failed to start mock endpoint.");
	let analyzer = analyzer_for(&endpoint, policy(1));
	let err = analyzer.analyze_many::<Swatch>("List.", &[]).await.expect_err("Expected error.");

	match err {
		AnalysisError::ExhaustedRetries { last, .. } => {
			assert!(matches!(*last, AnalysisError::EmptyResult), "Unexpected: {last}");
		},
		other => panic!("Unexpected error: {other}"),
	}
}

#[tokio::test]
async fn cancellation_stops_in_flight_request() {
	let endpoint = MockEndpoint::start(vec![
		MockResponse::generation("{\"color\":\"red\",\"pattern\":\"solid\"}")
			.delayed(Duration::from_secs(2)),
	])
	.await
	.expect("Failed to start mock endpoint.");
	let analyzer = analyzer_for(&endpoint, policy(3));
	let err = analyzer
		.analyze_one_until::<Swatch, _>(
			"Describe.",
			&[],
			tokio::time::sleep(Duration::from_millis(50)),
		)
		.await
		.expect_err("Expected cancellation.");

	assert!(matches!(err, AnalysisError::Cancelled), "Unexpected error: {err}");
}

#[tokio::test]
async fn deadline_bounds_the_whole_call() {
	let endpoint = MockEndpoint::start(vec![
		MockResponse::generation("{\"color\":\"red\",\"pattern\":\"solid\"}")
			.delayed(Duration::from_secs(2)),
	])
	.await
	.expect("Failed to start mock endpoint.");
	let analyzer = analyzer_for(
		&endpoint,
		Analyzer { max_attempts: 3, retry_backoff_ms: 1, max_backoff_ms: 5, deadline_ms: Some(50) },
	);
	let err = analyzer.analyze_one::<Swatch>("Describe.", &[]).await.expect_err("Expected error.");

	assert!(matches!(err, AnalysisError::DeadlineExceeded), "Unexpected error: {err}");
}

#[tokio::test]
async fn embeds_texts_in_order() {
	let endpoint = MockEndpoint::start(vec![MockResponse::json(
		200,
		&serde_json::json!({
			"predictions": [
				{ "embeddings": { "values": [1.0, 0.0, 0.0] } },
				{ "embedding": { "values": [0.0, 1.0, 0.0] } }
			]
		}),
	)])
	.await
	.expect("Failed to start mock endpoint.");
	let cfg = embedding_config(endpoint.base_url());
	let vectors = embedding::embed(&cfg, &["navy coat".to_string(), "red scarf".to_string()])
		.await
		.expect("Expected embeddings.");

	assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);

	let requests = endpoint.requests();

	assert_eq!(requests[0].body["instances"][1]["content"], "red scarf");
	assert_eq!(
		requests[0].headers.get("authorization").map(String::as_str),
		Some("Bearer secret")
	);
}

#[tokio::test]
async fn embedding_count_mismatch_is_rejected() {
	let endpoint = MockEndpoint::start(vec![MockResponse::json(
		200,
		&serde_json::json!({ "predictions": [ { "embeddings": { "values": [1.0] } } ] }),
	)])
	.await
	.expect("Failed to start mock endpoint.");
	let cfg = embedding_config(endpoint.base_url());
	let err = embedding::embed(&cfg, &["a".to_string(), "b".to_string()])
		.await
		.expect_err("Expected mismatch error.");

	assert!(matches!(err, wardrobe_providers::Error::InvalidResponse { .. }), "Unexpected: {err}");
}
