mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Analyzer, Config, EmbeddingProviderConfig, GenerationProviderConfig, Matching, Providers,
	Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	for (label, api_base, api_key, path, timeout_ms) in [
		(
			"generation",
			&cfg.providers.generation.api_base,
			&cfg.providers.generation.api_key,
			&cfg.providers.generation.path,
			cfg.providers.generation.timeout_ms,
		),
		(
			"embedding",
			&cfg.providers.embedding.api_base,
			&cfg.providers.embedding.api_key,
			&cfg.providers.embedding.path,
			cfg.providers.embedding.timeout_ms,
		),
	] {
		if api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_base must be non-empty."),
			});
		}
		if api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
		if !path.starts_with('/') {
			return Err(Error::Validation {
				message: format!("Provider {label} path must start with '/'."),
			});
		}
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	let temperature = cfg.providers.generation.temperature;

	if !temperature.is_finite() || temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.analyzer.max_attempts == 0 {
		return Err(Error::Validation {
			message: "analyzer.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.analyzer.max_backoff_ms < cfg.analyzer.retry_backoff_ms {
		return Err(Error::Validation {
			message: "analyzer.max_backoff_ms must be at least analyzer.retry_backoff_ms."
				.to_string(),
		});
	}

	if let Some(deadline) = cfg.analyzer.deadline_ms
		&& deadline == 0
	{
		return Err(Error::Validation {
			message: "analyzer.deadline_ms must be greater than zero.".to_string(),
		});
	}

	for (label, threshold) in [
		("matching.description_threshold", cfg.matching.description_threshold),
		("matching.similar_threshold", cfg.matching.similar_threshold),
	] {
		if !threshold.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(-1.0..=1.0).contains(&threshold) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range -1.0-1.0."),
			});
		}
	}

	if cfg.matching.description_top_k == 0 {
		return Err(Error::Validation {
			message: "matching.description_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.matching.default_page_size == 0 {
		return Err(Error::Validation {
			message: "matching.default_page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.matching.default_page_size > cfg.matching.max_page_size {
		return Err(Error::Validation {
			message: "matching.default_page_size must be at most matching.max_page_size."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for header in [
		&mut cfg.providers.generation.api_key_header,
		&mut cfg.providers.embedding.api_key_header,
	] {
		if header.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false) {
			*header = None;
		}
	}

	cfg.providers.generation.api_base =
		cfg.providers.generation.api_base.trim_end_matches('/').to_string();
	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim_end_matches('/').to_string();
}
