use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde_json::Value;

use crate::{AnalysisError, AnalysisResult};
use wardrobe_config::GenerationProviderConfig;

/// Binary part sent inline with a prompt, e.g. a garment photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
	pub mime_type: String,
	pub data: Vec<u8>,
}
impl Attachment {
	pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
		Self { mime_type: mime_type.into(), data }
	}
}

/// Sends one generation request and returns the model's message text.
pub async fn generate(
	client: &Client,
	cfg: &GenerationProviderConfig,
	prompt: &str,
	attachments: &[Attachment],
) -> AnalysisResult<String> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let headers =
		crate::auth_headers(&cfg.api_key, cfg.api_key_header.as_deref(), &cfg.default_headers)?;
	let body = build_request_body(cfg, prompt, attachments);
	let res = client.post(url).headers(headers).json(&body).send().await?;
	let status = res.status();
	let text = res.text().await?;

	if !status.is_success() {
		return Err(AnalysisError::TransportFailure { status: status.as_u16(), body: text });
	}

	let json: Value = serde_json::from_str(&text).map_err(|err| AnalysisError::MalformedPayload {
		message: format!("Generation envelope is not valid JSON: {err}"),
	})?;

	parse_generation_envelope(&json)
}

pub fn build_request_body(
	cfg: &GenerationProviderConfig,
	prompt: &str,
	attachments: &[Attachment],
) -> Value {
	let mut parts = Vec::with_capacity(attachments.len() + 1);

	parts.push(serde_json::json!({ "text": prompt }));

	for attachment in attachments {
		parts.push(serde_json::json!({
			"inline_data": {
				"mime_type": attachment.mime_type,
				"data": STANDARD.encode(&attachment.data),
			}
		}));
	}

	serde_json::json!({
		"contents": [
			{ "role": "user", "parts": parts }
		],
		"generationConfig": {
			"temperature": cfg.temperature,
			"responseMimeType": "application/json",
		},
	})
}

/// Reads `candidates[0].content.parts[0].text`.
pub fn parse_generation_envelope(json: &Value) -> AnalysisResult<String> {
	json.get("candidates")
		.and_then(|v| v.as_array())
		.and_then(|candidates| candidates.first())
		.and_then(|candidate| candidate.get("content"))
		.and_then(|content| content.get("parts"))
		.and_then(|v| v.as_array())
		.and_then(|parts| parts.first())
		.and_then(|part| part.get("text"))
		.and_then(|v| v.as_str())
		.map(str::to_string)
		.ok_or_else(|| AnalysisError::MalformedPayload {
			message: "Generation response is missing candidates[0].content.parts[0].text."
				.to_string(),
		})
}
