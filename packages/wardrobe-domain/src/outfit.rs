use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A garment as listed in an outfit prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardrobeEntry {
	pub id: Uuid,
	pub name: String,
	pub category: String,
	#[serde(default)]
	pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitSuggestion {
	pub name: String,
	pub garment_ids: Vec<Uuid>,
	#[serde(default)]
	pub occasion: Option<String>,
	#[serde(default)]
	pub rationale: String,
}
impl OutfitSuggestion {
	/// Whether every referenced garment exists in `wardrobe`.
	pub fn references_only(&self, wardrobe: &[WardrobeEntry]) -> bool {
		!self.garment_ids.is_empty()
			&& self.garment_ids.iter().all(|id| wardrobe.iter().any(|entry| entry.id == *id))
	}
}

pub fn suggest_prompt(
	wardrobe: &[WardrobeEntry],
	occasion: Option<&str>,
	max_outfits: u32,
) -> String {
	let listing = serde_json::to_string(wardrobe).unwrap_or_else(|_| "[]".to_string());
	let occasion = occasion
		.map(str::trim)
		.filter(|occasion| !occasion.is_empty())
		.map(|occasion| format!(" suitable for {occasion}"))
		.unwrap_or_default();

	format!(
		"You are styling outfits from this wardrobe (JSON): {listing}. Suggest up to \
		 {max_outfits} outfits{occasion} using only the garment ids listed. Respond with \
		 single-line JSON only, no markdown, as an array of objects with the fields: name, \
		 garment_ids (array of ids), occasion, rationale (one sentence)."
	)
}
