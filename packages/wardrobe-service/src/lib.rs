pub mod analysis;
pub mod matching;
pub mod ranker;
pub mod similarity;

mod error;

pub use error::{Error, Result};
pub use matching::{MatchByDescriptionRequest, MatchBySourceRequest, MatchPage};
pub use ranker::{Candidate, RankOptions, RankedCandidate, Ranking, Selection};

use std::{future::Future, pin::Pin, sync::Arc};

use wardrobe_config::{Config, EmbeddingProviderConfig};
use wardrobe_providers::{RetryingAnalyzer, embedding};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, wardrobe_providers::Result<Vec<Vec<f32>>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

/// Hosts the analysis and matching operations. Holds no per-request state, so one instance can
/// be shared across concurrent callers.
pub struct MatchService {
	pub cfg: Config,
	pub analyzer: RetryingAnalyzer,
	pub providers: Providers,
}
impl MatchService {
	pub fn new(cfg: Config) -> Result<Self> {
		Self::with_providers(cfg, Providers::default())
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Result<Self> {
		let analyzer =
			RetryingAnalyzer::new(cfg.providers.generation.clone(), cfg.analyzer.clone())?;

		Ok(Self { cfg, analyzer, providers })
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, wardrobe_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}
