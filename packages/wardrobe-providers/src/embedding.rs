use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use wardrobe_config::EmbeddingProviderConfig;

pub async fn embed(cfg: &EmbeddingProviderConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let instances: Vec<Value> =
		texts.iter().map(|text| serde_json::json!({ "content": text })).collect();
	let body = serde_json::json!({
		"instances": instances,
		"parameters": { "outputDimensionality": cfg.dimensions },
	});

	tracing::debug!(model = %cfg.model, count = texts.len(), "Requesting embeddings.");

	let res = client
		.post(url)
		.headers(crate::auth_headers(
			&cfg.api_key,
			cfg.api_key_header.as_deref(),
			&cfg.default_headers,
		)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let vectors = parse_embedding_response(json)?;

	if vectors.len() != texts.len() {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding response has {} predictions for {} inputs.",
				vectors.len(),
				texts.len()
			),
		});
	}

	Ok(vectors)
}

/// Accepts both `predictions[].embeddings.values` and `predictions[].embedding.values`.
fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let predictions = json.get("predictions").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse {
			message: "Embedding response is missing predictions array.".to_string(),
		}
	})?;
	let mut out = Vec::with_capacity(predictions.len());

	for prediction in predictions {
		let values = prediction
			.get("embeddings")
			.or_else(|| prediction.get("embedding"))
			.and_then(|embedding| embedding.get("values"))
			.and_then(|v| v.as_array())
			.ok_or_else(|| Error::InvalidResponse {
				message: "Embedding prediction is missing values array.".to_string(),
			})?;
		let mut vec = Vec::with_capacity(values.len());

		for value in values {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		out.push(vec);
	}

	Ok(out)
}
