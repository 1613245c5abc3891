//! Typed decoding of extracted model payloads.
//!
//! Object keys are matched case-insensitively against the fields each struct in the target type
//! declares through `#[derive(Deserialize)]`, at every depth. Keys that match no declared field
//! are passed through unchanged.

use serde::{
	Deserializer,
	de::{
		DeserializeOwned, IntoDeserializer, Visitor,
		value::{MapDeserializer, SeqDeserializer},
	},
};
use serde_json::{Map, Value};

use crate::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
	One,
	Many,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
	One(T),
	Many(Vec<T>),
}
impl<T> Decoded<T> {
	pub fn into_vec(self) -> Vec<T> {
		match self {
			Self::One(value) => vec![value],
			Self::Many(values) => values,
		}
	}
}

pub fn decode<T>(candidate: &str, mode: DecodeMode) -> AnalysisResult<Decoded<T>>
where
	T: DeserializeOwned,
{
	match mode {
		DecodeMode::One => decode_one(candidate).map(Decoded::One),
		DecodeMode::Many => decode_many(candidate).map(Decoded::Many),
	}
}

pub fn decode_one<T>(candidate: &str) -> AnalysisResult<T>
where
	T: DeserializeOwned,
{
	let value = parse_value(candidate.trim())?;

	if is_absent(&value) {
		return Err(AnalysisError::EmptyResult);
	}

	let blank = is_empty_object(&value);

	decode_value(value, blank)
}

/// Decodes a list. A payload that starts with `{` is wrapped in brackets first, which covers a
/// single bare object as well as comma-separated objects without an enclosing array.
pub fn decode_many<T>(candidate: &str) -> AnalysisResult<Vec<T>>
where
	T: DeserializeOwned,
{
	let trimmed = candidate.trim();
	let value = if trimmed.starts_with('{') {
		parse_value(&format!("[{trimmed}]"))?
	} else {
		parse_value(trimmed)?
	};

	if is_absent(&value) {
		return Err(AnalysisError::EmptyResult);
	}

	let Value::Array(items) = &value else {
		return Err(AnalysisError::MalformedPayload {
			message: "Expected a JSON array or object.".to_string(),
		});
	};
	let blank = items.iter().all(is_empty_object);

	decode_value(value, blank)
}

/// An empty object only counts as an empty result when the target cannot be built from it.
fn decode_value<R>(value: Value, blank: bool) -> AnalysisResult<R>
where
	R: DeserializeOwned,
{
	R::deserialize(CaseFolding(value)).map_err(|err| {
		if blank { AnalysisError::EmptyResult } else { malformed(err) }
	})
}

fn parse_value(text: &str) -> AnalysisResult<Value> {
	serde_json::from_str(text).map_err(malformed)
}

fn malformed(err: serde_json::Error) -> AnalysisError {
	AnalysisError::MalformedPayload { message: err.to_string() }
}

fn is_absent(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::Array(items) => items.is_empty(),
		_ => false,
	}
}

fn is_empty_object(value: &Value) -> bool {
	matches!(value, Value::Object(map) if map.is_empty())
}

fn canonical_key(fields: &[&str], key: String) -> String {
	if fields.iter().any(|field| *field == key) {
		return key;
	}

	fields
		.iter()
		.find(|field| field.eq_ignore_ascii_case(&key))
		.map(|field| (*field).to_string())
		.unwrap_or(key)
}

/// Deserializes a JSON value, renaming object keys to the field names of whichever struct is
/// being built at that point.
struct CaseFolding(Value);
impl CaseFolding {
	fn visit_object<'de, V>(
		map: Map<String, Value>,
		fields: Option<&'static [&'static str]>,
		visitor: V,
	) -> Result<V::Value, serde_json::Error>
	where
		V: Visitor<'de>,
	{
		let entries = map.into_iter().map(|(key, value)| {
			let key = match fields {
				Some(fields) => canonical_key(fields, key),
				None => key,
			};

			(key, CaseFolding(value))
		});
		let mut access = MapDeserializer::<_, serde_json::Error>::new(entries);
		let value = visitor.visit_map(&mut access)?;

		access.end()?;

		Ok(value)
	}

	fn visit_array<'de, V>(items: Vec<Value>, visitor: V) -> Result<V::Value, serde_json::Error>
	where
		V: Visitor<'de>,
	{
		let mut access =
			SeqDeserializer::<_, serde_json::Error>::new(items.into_iter().map(CaseFolding));
		let value = visitor.visit_seq(&mut access)?;

		access.end()?;

		Ok(value)
	}
}
impl<'de> IntoDeserializer<'de, serde_json::Error> for CaseFolding {
	type Deserializer = Self;

	fn into_deserializer(self) -> Self::Deserializer {
		self
	}
}
impl<'de> Deserializer<'de> for CaseFolding {
	type Error = serde_json::Error;

	fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
	where
		V: Visitor<'de>,
	{
		match self.0 {
			Value::Object(map) => Self::visit_object(map, None, visitor),
			Value::Array(items) => Self::visit_array(items, visitor),
			other => other.deserialize_any(visitor),
		}
	}

	fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
	where
		V: Visitor<'de>,
	{
		match self.0 {
			Value::Null => visitor.visit_none(),
			other => visitor.visit_some(CaseFolding(other)),
		}
	}

	fn deserialize_newtype_struct<V>(
		self,
		_name: &'static str,
		visitor: V,
	) -> Result<V::Value, Self::Error>
	where
		V: Visitor<'de>,
	{
		visitor.visit_newtype_struct(self)
	}

	fn deserialize_struct<V>(
		self,
		_name: &'static str,
		fields: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, Self::Error>
	where
		V: Visitor<'de>,
	{
		match self.0 {
			Value::Object(map) => Self::visit_object(map, Some(fields), visitor),
			other => CaseFolding(other).deserialize_any(visitor),
		}
	}

	fn deserialize_enum<V>(
		self,
		name: &'static str,
		variants: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, Self::Error>
	where
		V: Visitor<'de>,
	{
		self.0.deserialize_enum(name, variants, visitor)
	}

	serde::forward_to_deserialize_any! {
		bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string bytes byte_buf
		unit unit_struct seq tuple tuple_struct map identifier ignored_any
	}
}
