use serde::{Deserialize, Serialize};

/// What the generation model is asked to report about a garment photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentAnalysis {
	pub name: String,
	pub category: String,
	#[serde(default)]
	pub subcategory: Option<String>,
	#[serde(default)]
	pub colors: Vec<String>,
	#[serde(default)]
	pub material: Option<String>,
	#[serde(default)]
	pub pattern: Option<String>,
	#[serde(default)]
	pub seasons: Vec<String>,
	#[serde(default)]
	pub occasions: Vec<String>,
	#[serde(default)]
	pub description: String,
}

pub fn describe_prompt(image_count: usize) -> String {
	let subject = if image_count > 1 {
		"These photos show a single garment from different angles."
	} else {
		"This photo shows a single garment."
	};

	format!(
		"{subject} Describe it for a wardrobe catalogue. Respond with single-line JSON only, no \
		 markdown, as one object with the fields: name (short title), category (one of top, \
		 bottom, dress, outerwear, shoes, accessory), subcategory, colors (array of color \
		 names, dominant first), material, pattern, seasons (array of spring, summer, autumn, \
		 winter), occasions (array), description (one sentence)."
	)
}

/// Text embedded for a garment. Field order is fixed so that equal analyses embed equally.
pub fn embedding_text(garment: &GarmentAnalysis) -> String {
	let mut parts = vec![garment.name.trim().to_string(), garment.category.trim().to_string()];

	if let Some(subcategory) = garment.subcategory.as_deref().map(str::trim)
		&& !subcategory.is_empty()
	{
		parts.push(subcategory.to_string());
	}
	if !garment.colors.is_empty() {
		parts.push(format!("colors: {}", garment.colors.join(", ")));
	}

	for (label, value) in [("material", &garment.material), ("pattern", &garment.pattern)] {
		if let Some(value) = value.as_deref().map(str::trim)
			&& !value.is_empty()
		{
			parts.push(format!("{label}: {value}"));
		}
	}

	if !garment.seasons.is_empty() {
		parts.push(format!("seasons: {}", garment.seasons.join(", ")));
	}
	if !garment.occasions.is_empty() {
		parts.push(format!("occasions: {}", garment.occasions.join(", ")));
	}
	if !garment.description.trim().is_empty() {
		parts.push(garment.description.trim().to_string());
	}

	parts.retain(|part| !part.is_empty());

	parts.join(". ")
}
