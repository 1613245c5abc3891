use std::cmp::Ordering;

use serde::Serialize;
use uuid::Uuid;

use crate::similarity::cosine_similarity;
use wardrobe_domain::Identified;

#[derive(Debug, Clone)]
pub struct Candidate<E> {
	pub entity: E,
	pub vector: Option<Vec<f32>>,
}
impl<E> Candidate<E> {
	pub fn new(entity: E, vector: Option<Vec<f32>>) -> Self {
		Self { entity, vector }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate<E> {
	pub entity: E,
	pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
	TopK(usize),
	/// 1-based page. Page 0 is read as page 1.
	Page { page: usize, page_size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
	/// Inclusive minimum score.
	pub threshold: f32,
	pub selection: Selection,
	pub exclude: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking<E> {
	pub items: Vec<RankedCandidate<E>>,
	/// Candidates at or above the threshold, counted before selection.
	pub qualifying_count: usize,
}

/// Scores every usable candidate against `query`, keeps those at or above the threshold,
/// orders them by score (ties keep pool order) and applies the selection.
pub fn rank<E>(query: &[f32], candidates: Vec<Candidate<E>>, options: &RankOptions) -> Ranking<E>
where
	E: Identified,
{
	let pool_size = candidates.len();
	let mut scored: Vec<RankedCandidate<E>> = candidates
		.into_iter()
		.filter(|candidate| options.exclude.is_none_or(|id| candidate.entity.id() != id))
		.filter_map(|candidate| {
			let vector = candidate.vector?;
			let score = cosine_similarity(query, &vector);

			Some(RankedCandidate { entity: candidate.entity, score })
		})
		.filter(|ranked| ranked.score >= options.threshold)
		.collect();

	scored.sort_by(|a, b| cmp_f32_desc(a.score, b.score));

	let qualifying_count = scored.len();
	let items = match options.selection {
		Selection::TopK(k) => {
			scored.truncate(k);

			scored
		},
		Selection::Page { page, page_size } => {
			let skip = page.max(1).saturating_sub(1).saturating_mul(page_size);

			scored.into_iter().skip(skip).take(page_size).collect()
		},
	};

	tracing::debug!(
		pool_size,
		qualifying_count,
		returned = items.len(),
		threshold = options.threshold,
		"Ranked candidate pool."
	);

	Ranking { items, qualifying_count }
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Clone, PartialEq)]
	struct Item {
		id: Uuid,
		label: &'static str,
	}
	impl Identified for Item {
		fn id(&self) -> Uuid {
			self.id
		}
	}

	fn candidate(label: &'static str, vector: Option<Vec<f32>>) -> Candidate<Item> {
		Candidate::new(Item { id: Uuid::new_v4(), label }, vector)
	}

	fn labels(ranking: &Ranking<Item>) -> Vec<&'static str> {
		ranking.items.iter().map(|ranked| ranked.entity.label).collect()
	}

	#[test]
	fn sorts_descending_and_filters_threshold() {
		let pool = vec![
			candidate("low", Some(vec![0.0, 1.0])),
			candidate("high", Some(vec![1.0, 0.0])),
			candidate("mid", Some(vec![1.0, 1.0])),
		];
		let ranking = rank(
			&[1.0, 0.0],
			pool,
			&RankOptions { threshold: 0.5, selection: Selection::TopK(10), exclude: None },
		);

		assert_eq!(labels(&ranking), vec!["high", "mid"]);
		assert_eq!(ranking.qualifying_count, 2);
		assert!(ranking.items.iter().all(|ranked| ranked.score >= 0.5));
	}

	#[test]
	fn threshold_is_inclusive() {
		let pool = vec![candidate("exact", Some(vec![1.0, 0.0]))];
		let ranking = rank(
			&[1.0, 0.0],
			pool,
			&RankOptions { threshold: 1.0, selection: Selection::TopK(1), exclude: None },
		);

		assert_eq!(labels(&ranking), vec!["exact"]);
	}

	#[test]
	fn equal_scores_keep_pool_order() {
		let pool = vec![
			candidate("first", Some(vec![2.0, 0.0])),
			candidate("better", Some(vec![1.0, 0.1])),
			candidate("second", Some(vec![1.0, 0.0])),
			candidate("third", Some(vec![3.0, 0.0])),
		];
		let ranking = rank(
			&[1.0, 0.0],
			pool,
			&RankOptions { threshold: 0.0, selection: Selection::TopK(10), exclude: None },
		);

		assert_eq!(labels(&ranking), vec!["first", "second", "third", "better"]);
	}

	#[test]
	fn drops_candidates_without_vectors() {
		let pool = vec![candidate("none", None), candidate("some", Some(vec![1.0]))];
		let ranking = rank(
			&[1.0],
			pool,
			&RankOptions { threshold: -1.0, selection: Selection::TopK(10), exclude: None },
		);

		assert_eq!(labels(&ranking), vec!["some"]);
		assert_eq!(ranking.qualifying_count, 1);
	}

	#[test]
	fn degenerate_vectors_score_zero_and_can_still_qualify() {
		let pool = vec![candidate("short", Some(vec![1.0])), candidate("empty", Some(Vec::new()))];
		let ranking = rank(
			&[1.0, 0.0],
			pool,
			&RankOptions { threshold: 0.0, selection: Selection::TopK(10), exclude: None },
		);

		assert_eq!(labels(&ranking), vec!["short", "empty"]);
		assert!(ranking.items.iter().all(|ranked| ranked.score == 0.0));
	}

	#[test]
	fn excludes_source_entity() {
		let source = candidate("source", Some(vec![1.0, 0.0]));
		let source_id = source.entity.id;
		let pool = vec![source, candidate("other", Some(vec![1.0, 0.0]))];
		let ranking = rank(
			&[1.0, 0.0],
			pool,
			&RankOptions {
				threshold: 0.7,
				selection: Selection::TopK(10),
				exclude: Some(source_id),
			},
		);

		assert_eq!(labels(&ranking), vec!["other"]);
	}

	#[test]
	fn pages_after_counting() {
		let pool: Vec<_> = ["a", "b", "c", "d", "e"]
			.into_iter()
			.enumerate()
			.map(|(idx, label)| candidate(label, Some(vec![1.0, idx as f32 * 0.1])))
			.collect();
		let options = |page, page_size| RankOptions {
			threshold: 0.0,
			selection: Selection::Page { page, page_size },
			exclude: None,
		};
		let first = rank(&[1.0, 0.0], pool.clone(), &options(1, 2));
		let second = rank(&[1.0, 0.0], pool.clone(), &options(2, 2));
		let third = rank(&[1.0, 0.0], pool.clone(), &options(3, 2));
		let beyond = rank(&[1.0, 0.0], pool.clone(), &options(9, 2));
		let zeroth = rank(&[1.0, 0.0], pool, &options(0, 2));

		assert_eq!(labels(&first), vec!["a", "b"]);
		assert_eq!(labels(&second), vec!["c", "d"]);
		assert_eq!(labels(&third), vec!["e"]);
		assert!(beyond.items.is_empty());
		assert_eq!(labels(&zeroth), vec!["a", "b"]);

		for ranking in [first, second, third, beyond, zeroth] {
			assert_eq!(ranking.qualifying_count, 5);
		}
	}

	#[test]
	fn top_k_keeps_highest() {
		let names = ["g0", "g1", "g2", "g3", "g4", "g5", "g6", "g7", "g8", "g9"];
		// Reversed so the best candidates sit at the end of the pool.
		let pool: Vec<_> = names
			.into_iter()
			.enumerate()
			.rev()
			.map(|(idx, label)| candidate(label, Some(vec![1.0, idx as f32 * 0.05])))
			.collect();
		let ranking = rank(
			&[1.0, 0.0],
			pool,
			&RankOptions { threshold: 0.0, selection: Selection::TopK(3), exclude: None },
		);

		assert_eq!(labels(&ranking), vec!["g0", "g1", "g2"]);
		assert_eq!(ranking.qualifying_count, 10);
		assert!(ranking.items.windows(2).all(|pair| pair[0].score > pair[1].score));
	}

	#[test]
	fn orders_nan_last() {
		let mut scores = vec![0.2, f32::NAN, 0.9];

		scores.sort_by(|a, b| cmp_f32_desc(*a, *b));

		assert_eq!(scores[0], 0.9);
		assert_eq!(scores[1], 0.2);
		assert!(scores[2].is_nan());
	}
}
