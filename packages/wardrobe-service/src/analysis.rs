use serde::de::DeserializeOwned;

use crate::{Error, MatchService, Result};
use wardrobe_domain::{
	garment::{self, GarmentAnalysis},
	outfit::{self, OutfitSuggestion, WardrobeEntry},
};
use wardrobe_providers::{AnalysisResult, Attachment};

#[derive(Debug, Clone)]
pub struct SuggestOutfitsRequest {
	pub wardrobe: Vec<WardrobeEntry>,
	pub occasion: Option<String>,
	pub max_outfits: u32,
}

impl MatchService {
	pub async fn analyze_structured<T>(
		&self,
		prompt: &str,
		attachments: &[Attachment],
	) -> AnalysisResult<T>
	where
		T: DeserializeOwned,
	{
		self.analyzer.analyze_one(prompt, attachments).await
	}

	pub async fn analyze_structured_list<T>(
		&self,
		prompt: &str,
		attachments: &[Attachment],
	) -> AnalysisResult<Vec<T>>
	where
		T: DeserializeOwned,
	{
		self.analyzer.analyze_many(prompt, attachments).await
	}

	pub async fn describe_garment(&self, photos: &[Attachment]) -> Result<GarmentAnalysis> {
		if photos.is_empty() {
			return Err(Error::InvalidRequest {
				message: "At least one garment photo is required.".to_string(),
			});
		}
		if let Some(photo) = photos.iter().find(|photo| !photo.mime_type.starts_with("image/")) {
			return Err(Error::InvalidRequest {
				message: format!("Unsupported garment photo type {}.", photo.mime_type),
			});
		}

		let prompt = garment::describe_prompt(photos.len());
		let analysis: GarmentAnalysis = self.analyze_structured(&prompt, photos).await?;

		tracing::info!(
			name = %analysis.name,
			category = %analysis.category,
			photos = photos.len(),
			"Garment described."
		);

		Ok(analysis)
	}

	/// Suggestions that reference garments outside the wardrobe are dropped.
	pub async fn suggest_outfits(
		&self,
		req: SuggestOutfitsRequest,
	) -> Result<Vec<OutfitSuggestion>> {
		if req.wardrobe.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Wardrobe must contain at least one garment.".to_string(),
			});
		}
		if req.max_outfits == 0 {
			return Err(Error::InvalidRequest {
				message: "max_outfits must be greater than zero.".to_string(),
			});
		}

		let prompt =
			outfit::suggest_prompt(&req.wardrobe, req.occasion.as_deref(), req.max_outfits);
		let suggestions: Vec<OutfitSuggestion> = self.analyze_structured_list(&prompt, &[]).await?;
		let total = suggestions.len();
		let mut kept: Vec<OutfitSuggestion> = suggestions
			.into_iter()
			.filter(|suggestion| suggestion.references_only(&req.wardrobe))
			.collect();

		if kept.len() < total {
			tracing::warn!(
				dropped = total - kept.len(),
				"Dropped outfit suggestions referencing unknown garments."
			);
		}

		kept.truncate(req.max_outfits as usize);

		Ok(kept)
	}

	pub async fn embed_garment(&self, analysis: &GarmentAnalysis) -> Result<Vec<f32>> {
		let text = garment::embedding_text(analysis);

		self.embed_one(text).await
	}

	pub(crate) async fn embed_one(&self, text: String) -> Result<Vec<f32>> {
		let texts = [text];
		let mut vectors =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;

		if vectors.len() != 1 {
			return Err(Error::Provider {
				message: format!("Expected one embedding, got {}.", vectors.len()),
			});
		}

		let vector = vectors.swap_remove(0);
		let dimensions = self.cfg.providers.embedding.dimensions as usize;

		if vector.len() != dimensions {
			return Err(Error::Provider {
				message: format!(
					"Expected an embedding with {dimensions} dimensions, got {}.",
					vector.len()
				),
			});
		}

		Ok(vector)
	}
}
