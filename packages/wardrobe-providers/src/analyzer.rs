use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{
	AnalysisError, AnalysisResult, Attachment, decode, extract::extract_json, generation,
};
use wardrobe_config::{Analyzer, GenerationProviderConfig};

/// Longest exponent applied to the base backoff.
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Sends a prompt to the generation endpoint and decodes the reply, retrying transient failures
/// up to `max_attempts` times.
#[derive(Debug, Clone)]
pub struct RetryingAnalyzer {
	client: Client,
	provider: GenerationProviderConfig,
	policy: Analyzer,
}
impl RetryingAnalyzer {
	pub fn new(provider: GenerationProviderConfig, policy: Analyzer) -> AnalysisResult<Self> {
		let client = Client::builder().timeout(Duration::from_millis(provider.timeout_ms)).build()?;

		Ok(Self { client, provider, policy })
	}

	pub async fn analyze_one<T>(
		&self,
		prompt: &str,
		attachments: &[Attachment],
	) -> AnalysisResult<T>
	where
		T: DeserializeOwned,
	{
		self.analyze_one_until(prompt, attachments, std::future::pending()).await
	}

	pub async fn analyze_many<T>(
		&self,
		prompt: &str,
		attachments: &[Attachment],
	) -> AnalysisResult<Vec<T>>
	where
		T: DeserializeOwned,
	{
		self.analyze_many_until(prompt, attachments, std::future::pending()).await
	}

	/// Like [`Self::analyze_one`], but gives up with [`AnalysisError::Cancelled`] as soon as
	/// `cancelled` resolves. The in-flight request is dropped.
	pub async fn analyze_one_until<T, C>(
		&self,
		prompt: &str,
		attachments: &[Attachment],
		cancelled: C,
	) -> AnalysisResult<T>
	where
		T: DeserializeOwned,
		C: Future<Output = ()>,
	{
		self.run(prompt, attachments, cancelled, decode::decode_one::<T>).await
	}

	pub async fn analyze_many_until<T, C>(
		&self,
		prompt: &str,
		attachments: &[Attachment],
		cancelled: C,
	) -> AnalysisResult<Vec<T>>
	where
		T: DeserializeOwned,
		C: Future<Output = ()>,
	{
		self.run(prompt, attachments, cancelled, decode::decode_many::<T>).await
	}

	async fn run<R, C, F>(
		&self,
		prompt: &str,
		attachments: &[Attachment],
		cancelled: C,
		decoder: F,
	) -> AnalysisResult<R>
	where
		C: Future<Output = ()>,
		F: Fn(&str) -> AnalysisResult<R>,
	{
		let attempts = self.attempt_all(prompt, attachments, &decoder);
		let bounded = async {
			match self.policy.deadline_ms {
				Some(deadline_ms) =>
					tokio::time::timeout(Duration::from_millis(deadline_ms), attempts)
						.await
						.unwrap_or(Err(AnalysisError::DeadlineExceeded)),
				None => attempts.await,
			}
		};

		tokio::select! {
			result = bounded => result,
			() = cancelled => {
				tracing::info!(provider_id = %self.provider.provider_id, "Analysis cancelled.");

				Err(AnalysisError::Cancelled)
			},
		}
	}

	async fn attempt_all<R, F>(
		&self,
		prompt: &str,
		attachments: &[Attachment],
		decoder: &F,
	) -> AnalysisResult<R>
	where
		F: Fn(&str) -> AnalysisResult<R>,
	{
		let max_attempts = self.policy.max_attempts.max(1);
		let mut attempt = 0;

		loop {
			attempt += 1;

			tracing::debug!(
				provider_id = %self.provider.provider_id,
				model = %self.provider.model,
				attempt,
				max_attempts,
				attachments = attachments.len(),
				"Sending analysis request."
			);

			let err = match self.attempt_once(prompt, attachments, decoder).await {
				Ok(value) => return Ok(value),
				Err(err) => err,
			};

			if !err.is_retryable() {
				tracing::warn!(attempt, error = %err, "Analysis failed with a permanent error.");

				return Err(err);
			}
			if attempt >= max_attempts {
				tracing::warn!(attempt, error = %err, "Analysis attempts exhausted.");

				return Err(AnalysisError::ExhaustedRetries {
					attempts: attempt,
					last: Box::new(err),
				});
			}

			let backoff = self.backoff_for(attempt);

			tracing::warn!(
				attempt,
				max_attempts,
				backoff_ms = backoff.as_millis() as u64,
				error = %err,
				"Analysis attempt failed. Retrying."
			);

			tokio::time::sleep(backoff).await;
		}
	}

	async fn attempt_once<R, F>(
		&self,
		prompt: &str,
		attachments: &[Attachment],
		decoder: &F,
	) -> AnalysisResult<R>
	where
		F: Fn(&str) -> AnalysisResult<R>,
	{
		let text = generation::generate(&self.client, &self.provider, prompt, attachments).await?;

		decoder(extract_json(&text))
	}

	/// Exponential backoff after the given 1-based attempt, capped at `max_backoff_ms`.
	fn backoff_for(&self, attempt: u32) -> Duration {
		let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
		let millis = self
			.policy
			.retry_backoff_ms
			.saturating_mul(1_u64 << shift)
			.min(self.policy.max_backoff_ms);

		Duration::from_millis(millis)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::Map;

	use super::*;

	fn analyzer(retry_backoff_ms: u64, max_backoff_ms: u64) -> RetryingAnalyzer {
		let provider = GenerationProviderConfig {
			provider_id: "gemini".to_string(),
			api_base: "http://127.0.0.1".to_string(),
			api_key: "secret".to_string(),
			path: "/generate".to_string(),
			model: "gemini-test".to_string(),
			temperature: 0.0,
			timeout_ms: 1_000,
			default_headers: Map::new(),
			api_key_header: None,
		};
		let policy =
			Analyzer { max_attempts: 5, retry_backoff_ms, max_backoff_ms, deadline_ms: None };

		RetryingAnalyzer::new(provider, policy).expect("Failed to build analyzer.")
	}

	#[test]
	fn backoff_doubles_until_capped() {
		let analyzer = analyzer(100, 350);

		assert_eq!(analyzer.backoff_for(1), Duration::from_millis(100));
		assert_eq!(analyzer.backoff_for(2), Duration::from_millis(200));
		assert_eq!(analyzer.backoff_for(3), Duration::from_millis(350));
		assert_eq!(analyzer.backoff_for(40), Duration::from_millis(350));
	}

	#[test]
	fn zero_backoff_stays_zero() {
		assert_eq!(analyzer(0, 0).backoff_for(3), Duration::ZERO);
	}
}
