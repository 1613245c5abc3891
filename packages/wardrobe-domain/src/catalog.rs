use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Identified;

/// Stored catalog entity as handed over by the persistence layer, together with its
/// pre-computed embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
	pub id: Uuid,
	pub name: String,
	#[serde(default)]
	pub category: Option<String>,
}
impl Identified for CatalogItem {
	fn id(&self) -> Uuid {
		self.id
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
	#[serde(flatten)]
	pub item: CatalogItem,
	#[serde(default)]
	pub embedding: Option<Vec<f32>>,
}
