pub mod pool;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use wardrobe_domain::outfit::WardrobeEntry;
use wardrobe_providers::Attachment;
use wardrobe_service::{
	MatchByDescriptionRequest, MatchBySourceRequest, MatchService,
	analysis::SuggestOutfitsRequest,
};

#[derive(Debug, Parser)]
#[command(
	version = wardrobe_cli::VERSION,
	rename_all = "kebab",
	styles = wardrobe_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Describe a garment from one or more photos.
	Describe {
		#[arg(long = "image", value_name = "FILE", required = true)]
		images: Vec<PathBuf>,
		/// Also print the embedding of the description.
		#[arg(long)]
		embed: bool,
	},
	/// Suggest outfits from a wardrobe listing (JSON array of garments).
	Suggest {
		#[arg(long, value_name = "FILE")]
		wardrobe: PathBuf,
		#[arg(long)]
		occasion: Option<String>,
		#[arg(long, default_value_t = 3)]
		max_outfits: u32,
	},
	/// Match a free-text description against a catalog pool.
	Match {
		#[arg(long, value_name = "FILE")]
		pool: PathBuf,
		#[arg(long)]
		query: String,
		#[arg(long)]
		threshold: Option<f32>,
		#[arg(long)]
		top_k: Option<u32>,
	},
	/// List pool entries similar to one of its members.
	Similar {
		#[arg(long, value_name = "FILE")]
		pool: PathBuf,
		#[arg(long)]
		source: Uuid,
		#[arg(long)]
		threshold: Option<f32>,
		#[arg(long, default_value_t = 1)]
		page: u32,
		#[arg(long)]
		page_size: Option<u32>,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = wardrobe_config::load(&args.config)?;

	init_tracing(&config)?;

	let service = MatchService::new(config)?;

	match args.command {
		Command::Describe { images, embed } => {
			let photos = images.iter().map(|path| read_photo(path)).collect::<Result<Vec<_>, _>>()?;
			let analysis = service.describe_garment(&photos).await?;

			if embed {
				let embedding = service.embed_garment(&analysis).await?;

				print_json(&serde_json::json!({ "analysis": analysis, "embedding": embedding }))
			} else {
				print_json(&analysis)
			}
		},
		Command::Suggest { wardrobe, occasion, max_outfits } => {
			let raw = std::fs::read_to_string(&wardrobe)?;
			let wardrobe: Vec<WardrobeEntry> = serde_json::from_str(&raw)?;
			let suggestions = service
				.suggest_outfits(SuggestOutfitsRequest { wardrobe, occasion, max_outfits })
				.await?;

			print_json(&suggestions)
		},
		Command::Match { pool, query, threshold, top_k } => {
			let candidates = pool::load(&pool)?;
			let matches = service
				.match_by_description(MatchByDescriptionRequest {
					query_text: query,
					candidates,
					threshold,
					top_k,
				})
				.await?;

			print_json(&matches)
		},
		Command::Similar { pool, source, threshold, page, page_size } => {
			let candidates = pool::load(&pool)?;
			let source_vector = pool::source_vector(&candidates, source)?;
			let page = service.match_by_source_entity(MatchBySourceRequest {
				source_id: source,
				source_vector,
				candidates,
				threshold,
				page,
				page_size,
			})?;

			print_json(&page)
		},
	}
}

fn init_tracing(config: &wardrobe_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}

fn read_photo(path: &Path) -> color_eyre::Result<Attachment> {
	let mime_type = mime_type_for(path)
		.ok_or_else(|| eyre::eyre!("Unsupported image extension for {}.", path.display()))?;
	let data = std::fs::read(path)?;

	tracing::debug!(path = %path.display(), bytes = data.len(), mime_type, "Read garment photo.");

	Ok(Attachment::new(mime_type, data))
}

fn mime_type_for(path: &Path) -> Option<&'static str> {
	let extension = path.extension()?.to_str()?.to_ascii_lowercase();

	match extension.as_str() {
		"jpg" | "jpeg" => Some("image/jpeg"),
		"png" => Some("image/png"),
		"webp" => Some("image/webp"),
		"heic" => Some("image/heic"),
		"heif" => Some("image/heif"),
		_ => None,
	}
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: Serialize,
{
	println!("{}", serde_json::to_string_pretty(value)?);

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn infers_photo_mime_types() {
		assert_eq!(mime_type_for(Path::new("coat.JPG")), Some("image/jpeg"));
		assert_eq!(mime_type_for(Path::new("a/b/scarf.webp")), Some("image/webp"));
		assert_eq!(mime_type_for(Path::new("notes.txt")), None);
		assert_eq!(mime_type_for(Path::new("no_extension")), None);
	}

	#[test]
	fn parses_similar_subcommand() {
		let source = Uuid::new_v4().to_string();
		let args = Args::try_parse_from([
			"wardrobe-ctl",
			"--config",
			"wardrobe.toml",
			"similar",
			"--pool",
			"outfits.json",
			"--source",
			source.as_str(),
			"--page-size",
			"5",
		])
		.expect("Failed to parse args.");

		match args.command {
			Command::Similar { page, page_size, threshold, .. } => {
				assert_eq!(page, 1);
				assert_eq!(page_size, Some(5));
				assert_eq!(threshold, None);
			},
			other => panic!("Unexpected command: {other:?}"),
		}
	}
}
