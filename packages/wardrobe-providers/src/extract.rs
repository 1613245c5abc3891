//! Best-effort isolation of a JSON payload from model text.
//!
//! This does not balance braces or understand string literals. Model output is expected to be
//! well-formed JSON wrapped in fences or prose, and anything this gets wrong is rejected by the
//! decoder.

const FENCE: &str = "```";

/// Returns the slice of `text` most likely to hold a JSON object, or the trimmed text when no
/// object span can be found.
pub fn extract_json(text: &str) -> &str {
	let trimmed = text.trim();

	if trimmed.starts_with(FENCE) {
		return object_span(trimmed).unwrap_or(trimmed);
	}
	if trimmed.starts_with('{') && trimmed.ends_with('}') {
		return trimmed;
	}

	object_span(trimmed).unwrap_or(trimmed)
}

/// First `{` through last `}`, inclusive.
fn object_span(text: &str) -> Option<&str> {
	let start = text.find('{')?;
	let end = text.rfind('}')?;

	(end > start).then(|| &text[start..=end])
}
