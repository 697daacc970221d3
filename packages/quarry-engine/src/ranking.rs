//! In-memory scoring for rankings that a store cannot express natively.

use std::{
	cmp::Ordering,
	collections::{HashMap, HashSet},
};

use quarry_config::Ranking;

use crate::{path::FieldPath, shape::Slot, value::Key, vector};

/// Blend applied by [`hybrid_rank`]: `text * text_score + vector * cosine_similarity`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HybridWeights {
	pub text: f32,
	pub vector: f32,
}
impl Default for HybridWeights {
	fn default() -> Self {
		Self { text: 0.5, vector: 0.5 }
	}
}
impl From<&Ranking> for HybridWeights {
	fn from(ranking: &Ranking) -> Self {
		Self { text: ranking.text_weight, vector: ranking.vector_weight }
	}
}

/// Scores every item and returns them by descending combined score, stable on ties.
///
/// Items whose vector is absent or of another length score the maximal-distance similarity,
/// which ranks them last whenever `weights.vector` is positive.
pub fn hybrid_rank<T, F>(
	items: Vec<T>,
	text_score: F,
	vector_path: &FieldPath<T>,
	query: &[f32],
	weights: HybridWeights,
) -> Vec<T>
where
	F: Fn(&T) -> f32,
{
	rank_by_score(
		items,
		|item| {
			let similarity = match vector_path.read(item) {
				Slot::Value(value) => vector::cosine_similarity(value.as_vector(), Some(query)),
				Slot::Present | Slot::Unreachable { .. } => vector::cosine_similarity(None, Some(query)),
			};

			weights.text * text_score(item) + weights.vector * similarity
		},
		true,
	)
}

/// Stable sort by an arbitrary scorer. NaN scores always sort last.
pub fn rank_by_score<T, F>(items: Vec<T>, score: F, descending: bool) -> Vec<T>
where
	F: Fn(&T) -> f32,
{
	let mut scored = items.into_iter().map(|item| (score(&item), item)).collect::<Vec<_>>();

	if descending {
		scored.sort_by(|(lhs, _), (rhs, _)| cmp_f32_desc(*lhs, *rhs));
	} else {
		scored.sort_by(|(lhs, _), (rhs, _)| cmp_f32_asc(*lhs, *rhs));
	}

	scored.into_iter().map(|(_, item)| item).collect()
}

/// Keeps items whose key is in `matching` and orders them by the external score, highest first.
/// Matching keys without a score count as `0.0`.
pub fn rank_by_external_scores<T>(
	items: Vec<T>,
	key_path: &FieldPath<T>,
	matching: &HashSet<Key>,
	scores: &HashMap<Key, f32>,
) -> Vec<T> {
	let mut kept = items
		.into_iter()
		.filter_map(|item| {
			let key = Key::from_value(&key_path.get(&item))?;

			matching.contains(&key).then(|| (scores.get(&key).copied().unwrap_or(0.0), item))
		})
		.collect::<Vec<_>>();

	kept.sort_by(|(lhs, _), (rhs, _)| cmp_f32_desc(*lhs, *rhs));

	kept.into_iter().map(|(_, item)| item).collect()
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

fn cmp_f32_asc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
	}
}
