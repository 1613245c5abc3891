use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub analyzer: Analyzer,
	#[serde(default)]
	pub matching: Matching,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub generation: GenerationProviderConfig,
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	/// Request path appended to `api_base`, e.g. "/v1beta/models/gemini-2.0-flash:generateContent".
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	/// Optional. When set, the api key is sent in this header instead of as a bearer token.
	pub api_key_header: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	pub api_key_header: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Analyzer {
	/// Total attempts per analysis call, including the first one.
	pub max_attempts: u32,
	pub retry_backoff_ms: u64,
	pub max_backoff_ms: u64,
	/// Optional. Upper bound on a whole analysis call, backoff included.
	pub deadline_ms: Option<u64>,
}
impl Default for Analyzer {
	fn default() -> Self {
		Self { max_attempts: 3, retry_backoff_ms: 250, max_backoff_ms: 4_000, deadline_ms: None }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Matching {
	pub description_threshold: f32,
	pub description_top_k: u32,
	pub similar_threshold: f32,
	pub default_page_size: u32,
	pub max_page_size: u32,
}
impl Default for Matching {
	fn default() -> Self {
		Self {
			description_threshold: 0.5,
			description_top_k: 3,
			similar_threshold: 0.7,
			default_page_size: 10,
			max_page_size: 100,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
