/// Cosine similarity, or `None` when the vectors cannot be compared: either is empty, their
/// lengths differ, or either has zero magnitude.
pub fn try_cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
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

	if lhs_norm == 0.0 || rhs_norm == 0.0 {
		return None;
	}

	Some((dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0) as f32)
}

/// Cosine similarity with `0.0` for incomparable vectors. Callers rely on never getting an
/// error here.
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> f32 {
	try_cosine_similarity(lhs, rhs).unwrap_or(0.0)
}

/// As [`cosine_similarity`], with a missing vector scoring `0.0`.
pub fn cosine_similarity_opt(lhs: Option<&[f32]>, rhs: Option<&[f32]>) -> f32 {
	match (lhs, rhs) {
		(Some(lhs), Some(rhs)) => cosine_similarity(lhs, rhs),
		_ => 0.0,
	}
}
