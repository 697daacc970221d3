/// Distance reported when vectors are absent or their lengths differ.
pub const MAX_DISTANCE: f32 = f32::MAX;

/// Cosine distance `1 - cos(a, b)`.
///
/// Absent inputs or unequal lengths yield [`MAX_DISTANCE`]; a zero norm on either side yields
/// `1.0`. Identical non-zero inputs yield exactly `0.0`. Never fails, so predicates and rankings
/// stay total over partially populated records.
pub fn cosine_distance(lhs: Option<&[f32]>, rhs: Option<&[f32]>) -> f32 {
	let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
		return MAX_DISTANCE;
	};

	if lhs.len() != rhs.len() {
		return MAX_DISTANCE;
	}

	let mut dot = 0.0_f64;
	let mut lhs_norm = 0.0_f64;
	let mut rhs_norm = 0.0_f64;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		let (l, r) = (f64::from(*l), f64::from(*r));

		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	// One square root over the product keeps identical inputs at a ratio of exactly 1.
	let denom = (lhs_norm * rhs_norm).sqrt();

	if denom == 0.0 {
		return 1.0;
	}

	(1.0 - (dot / denom).clamp(-1.0, 1.0)) as f32
}

pub fn cosine_similarity(lhs: Option<&[f32]>, rhs: Option<&[f32]>) -> f32 {
	1.0 - cosine_distance(lhs, rhs)
}

#[cfg(test)]
mod tests {
	use crate::vector::{MAX_DISTANCE, cosine_distance, cosine_similarity};

	#[test]
	fn distance_is_symmetric() {
		let a = [0.3_f32, -1.2, 4.0];
		let b = [2.0_f32, 0.5, -0.7];

		assert_eq!(cosine_distance(Some(&a), Some(&b)), cosine_distance(Some(&b), Some(&a)));
	}

	#[test]
	fn self_distance_is_zero_for_nonzero_vectors() {
		let a = [1.0_f32, 2.0, 3.0];

		assert!(cosine_distance(Some(&a), Some(&a)).abs() < 1e-6);
	}

	#[test]
	fn mismatched_or_missing_vectors_are_maximally_distant() {
		let a = [1.0_f32, 0.0];
		let b = [1.0_f32, 0.0, 0.0];

		assert_eq!(cosine_distance(Some(&a), Some(&b)), MAX_DISTANCE);
		assert_eq!(cosine_distance(None, Some(&b)), MAX_DISTANCE);
		assert_eq!(cosine_distance(Some(&a), None), MAX_DISTANCE);
	}

	#[test]
	fn self_distance_is_exact_for_unnormalized_vectors() {
		let a = [0.1_f32, 0.2, 0.3];
		let b = [3.0_f32, -7.25, 1e-3, 42.0];

		assert_eq!(cosine_distance(Some(&a), Some(&a)), 0.0);
		assert_eq!(cosine_distance(Some(&b), Some(&b)), 0.0);
		assert_eq!(cosine_similarity(Some(&a), Some(&a)), 1.0);
	}

	#[test]
	fn zero_norm_is_distance_one() {
		let zero = [0.0_f32, 0.0];
		let a = [1.0_f32, 0.0];

		assert_eq!(cosine_distance(Some(&zero), Some(&a)), 1.0);
	}

	#[test]
	fn orthogonal_and_opposite_vectors() {
		let a = [1.0_f32, 0.0];
		let b = [0.0_f32, 1.0];
		let c = [-1.0_f32, 0.0];

		assert!((cosine_distance(Some(&a), Some(&b)) - 1.0).abs() < 1e-6);
		assert!((cosine_distance(Some(&a), Some(&c)) - 2.0).abs() < 1e-6);
		assert!((cosine_similarity(Some(&a), Some(&a)) - 1.0).abs() < 1e-6);
	}
}
