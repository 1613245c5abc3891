//! Candidate pools read from JSON files, standing in for the persistence layer.

use std::path::Path;

use color_eyre::{Result, eyre};
use uuid::Uuid;

use wardrobe_domain::catalog::{CatalogEntry, CatalogItem};
use wardrobe_service::Candidate;

pub fn load(path: &Path) -> Result<Vec<Candidate<CatalogItem>>> {
	let raw = std::fs::read_to_string(path)?;

	parse(&raw)
}

pub fn parse(raw: &str) -> Result<Vec<Candidate<CatalogItem>>> {
	let entries: Vec<CatalogEntry> = serde_json::from_str(raw)?;

	Ok(entries.into_iter().map(|entry| Candidate::new(entry.item, entry.embedding)).collect())
}

pub fn source_vector(candidates: &[Candidate<CatalogItem>], source: Uuid) -> Result<Vec<f32>> {
	let candidate = candidates
		.iter()
		.find(|candidate| candidate.entity.id == source)
		.ok_or_else(|| eyre::eyre!("Source {source} is not in the pool."))?;

	candidate.vector.clone().ok_or_else(|| eyre::eyre!("Source {source} has no embedding."))
}
