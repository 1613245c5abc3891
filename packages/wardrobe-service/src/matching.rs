use serde::Serialize;
use uuid::Uuid;

use crate::{
	Error, MatchService, Result,
	ranker::{self, Candidate, RankOptions, RankedCandidate, Selection},
	similarity,
};
use wardrobe_domain::Identified;

#[derive(Debug, Clone)]
pub struct MatchByDescriptionRequest<E> {
	pub query_text: String,
	pub candidates: Vec<Candidate<E>>,
	/// Defaults to `matching.description_threshold`.
	pub threshold: Option<f32>,
	/// Defaults to `matching.description_top_k`.
	pub top_k: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct MatchBySourceRequest<E> {
	pub source_id: Uuid,
	pub source_vector: Vec<f32>,
	pub candidates: Vec<Candidate<E>>,
	/// Defaults to `matching.similar_threshold`.
	pub threshold: Option<f32>,
	/// 1-based.
	pub page: u32,
	/// Defaults to `matching.default_page_size`.
	pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPage<E> {
	pub items: Vec<RankedCandidate<E>>,
	pub qualifying_count: usize,
	pub page: u32,
	pub page_size: u32,
}

impl MatchService {
	pub fn compute_similarity(&self, lhs: &[f32], rhs: &[f32]) -> f32 {
		similarity::cosine_similarity(lhs, rhs)
	}

	/// Embeds the description and returns the best catalog matches. No pagination and no
	/// self-exclusion.
	pub async fn match_by_description<E>(
		&self,
		req: MatchByDescriptionRequest<E>,
	) -> Result<Vec<RankedCandidate<E>>>
	where
		E: Identified,
	{
		let query_text = req.query_text.trim();

		if query_text.is_empty() {
			return Err(Error::InvalidRequest {
				message: "query_text must be non-empty.".to_string(),
			});
		}

		let threshold = resolve_threshold(req.threshold, self.cfg.matching.description_threshold)?;
		let top_k = req.top_k.unwrap_or(self.cfg.matching.description_top_k);

		if top_k == 0 {
			return Err(Error::InvalidRequest {
				message: "top_k must be greater than zero.".to_string(),
			});
		}

		let query = self.embed_one(query_text.to_string()).await?;
		let ranking = ranker::rank(
			&query,
			req.candidates,
			&RankOptions { threshold, selection: Selection::TopK(top_k as usize), exclude: None },
		);

		tracing::info!(
			qualifying_count = ranking.qualifying_count,
			returned = ranking.items.len(),
			"Matched description against catalog."
		);

		Ok(ranking.items)
	}

	/// Ranks the pool against a stored entity's vector, leaving the entity itself out.
	pub fn match_by_source_entity<E>(&self, req: MatchBySourceRequest<E>) -> Result<MatchPage<E>>
	where
		E: Identified,
	{
		let threshold = resolve_threshold(req.threshold, self.cfg.matching.similar_threshold)?;
		let page_size = req.page_size.unwrap_or(self.cfg.matching.default_page_size);

		if req.page == 0 {
			return Err(Error::InvalidRequest {
				message: "page must be greater than zero.".to_string(),
			});
		}
		if page_size == 0 {
			return Err(Error::InvalidRequest {
				message: "page_size must be greater than zero.".to_string(),
			});
		}
		if page_size > self.cfg.matching.max_page_size {
			return Err(Error::InvalidRequest {
				message: format!(
					"page_size must be at most {}.",
					self.cfg.matching.max_page_size
				),
			});
		}

		let ranking = ranker::rank(
			&req.source_vector,
			req.candidates,
			&RankOptions {
				threshold,
				selection: Selection::Page {
					page: req.page as usize,
					page_size: page_size as usize,
				},
				exclude: Some(req.source_id),
			},
		);

		tracing::info!(
			source_id = %req.source_id,
			qualifying_count = ranking.qualifying_count,
			page = req.page,
			"Matched similar entities."
		);

		Ok(MatchPage {
			items: ranking.items,
			qualifying_count: ranking.qualifying_count,
			page: req.page,
			page_size,
		})
	}
}

fn resolve_threshold(requested: Option<f32>, default: f32) -> Result<f32> {
	let threshold = requested.unwrap_or(default);

	if !threshold.is_finite() {
		return Err(Error::InvalidRequest {
			message: "threshold must be a finite number.".to_string(),
		});
	}

	Ok(threshold)
}
