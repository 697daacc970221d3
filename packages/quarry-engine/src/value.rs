use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
	hash::{Hash, Hasher},
};

use serde::{
	Serialize, Serializer,
	ser::{SerializeMap, SerializeSeq},
};
use time::{
	Date, OffsetDateTime,
	format_description::{BorrowedFormatItem, well_known::Rfc3339},
	macros::format_description,
};
use uuid::Uuid;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The type found at the end of a resolved path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
	Bool,
	Int,
	Float,
	Text,
	Date,
	DateTime,
	Uuid,
	Vector,
	List(Box<ValueKind>),
	Record(&'static str),
}
impl ValueKind {
	pub fn is_ordered(&self) -> bool {
		matches!(
			self,
			Self::Bool | Self::Int | Self::Float | Self::Text | Self::Date | Self::DateTime | Self::Uuid
		)
	}

	pub fn is_numeric(&self) -> bool {
		matches!(self, Self::Int | Self::Float)
	}

	pub fn is_keyable(&self) -> bool {
		match self {
			Self::List(item) => item.is_keyable(),
			other => other.is_ordered(),
		}
	}

	pub fn is_record(&self) -> bool {
		matches!(self, Self::Record(_))
	}
}
impl Display for ValueKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Bool => f.write_str("bool"),
			Self::Int => f.write_str("int"),
			Self::Float => f.write_str("float"),
			Self::Text => f.write_str("text"),
			Self::Date => f.write_str("date"),
			Self::DateTime => f.write_str("datetime"),
			Self::Uuid => f.write_str("uuid"),
			Self::Vector => f.write_str("vector"),
			Self::List(item) => write!(f, "list<{item}>"),
			Self::Record(name) => write!(f, "record {name}"),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Date(Date),
	DateTime(OffsetDateTime),
	Uuid(Uuid),
	Vector(Vec<f32>),
	List(Vec<Value>),
	/// Nested record rendered by a projection, in field registration order.
	Map(Vec<(String, Value)>),
}
impl Value {
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Int(value) => Some(*value as f64),
			Self::Float(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_vector(&self) -> Option<&[f32]> {
		match self {
			Self::Vector(vector) => Some(vector),
			_ => None,
		}
	}

	pub fn kind_name(&self) -> String {
		match self {
			Self::Null => "null".to_string(),
			Self::Bool(_) => ValueKind::Bool.to_string(),
			Self::Int(_) => ValueKind::Int.to_string(),
			Self::Float(_) => ValueKind::Float.to_string(),
			Self::Text(_) => ValueKind::Text.to_string(),
			Self::Date(_) => ValueKind::Date.to_string(),
			Self::DateTime(_) => ValueKind::DateTime.to_string(),
			Self::Uuid(_) => ValueKind::Uuid.to_string(),
			Self::Vector(_) => ValueKind::Vector.to_string(),
			Self::List(_) => "list".to_string(),
			Self::Map(_) => "map".to_string(),
		}
	}

	/// Converts a caller-supplied constant to the leaf kind it will be compared against.
	///
	/// Null converts to every kind. Text parses into numbers, dates (`YYYY-MM-DD`), RFC 3339
	/// date-times and UUIDs.
	pub fn convert_to(self, kind: &ValueKind) -> Option<Self> {
		match (self, kind) {
			(Self::Null, _) => Some(Self::Null),
			(Self::Bool(value), ValueKind::Bool) => Some(Self::Bool(value)),
			(Self::Int(value), ValueKind::Int) => Some(Self::Int(value)),
			(Self::Int(value), ValueKind::Float) => Some(Self::Float(value as f64)),
			(Self::Float(value), ValueKind::Float) => Some(Self::Float(value)),
			(Self::Float(value), ValueKind::Int)
				if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 =>
				Some(Self::Int(value as i64)),
			(Self::Int(value), ValueKind::Text) => Some(Self::Text(value.to_string())),
			(Self::Text(text), ValueKind::Text) => Some(Self::Text(text)),
			(Self::Text(text), ValueKind::Int) => text.trim().parse().ok().map(Self::Int),
			(Self::Text(text), ValueKind::Float) => text.trim().parse().ok().map(Self::Float),
			(Self::Text(text), ValueKind::Bool) => text.trim().parse().ok().map(Self::Bool),
			(Self::Text(text), ValueKind::Date) =>
				Date::parse(text.trim(), DATE_FORMAT).ok().map(Self::Date),
			(Self::Text(text), ValueKind::DateTime) =>
				OffsetDateTime::parse(text.trim(), &Rfc3339).ok().map(Self::DateTime),
			(Self::Text(text), ValueKind::Uuid) => Uuid::parse_str(text.trim()).ok().map(Self::Uuid),
			(Self::Date(value), ValueKind::Date) => Some(Self::Date(value)),
			(Self::DateTime(value), ValueKind::DateTime) => Some(Self::DateTime(value)),
			(Self::DateTime(value), ValueKind::Date) => Some(Self::Date(value.date())),
			(Self::Uuid(value), ValueKind::Uuid) => Some(Self::Uuid(value)),
			(Self::Vector(value), ValueKind::Vector) => Some(Self::Vector(value)),
			(Self::List(items), ValueKind::List(item_kind)) => items
				.into_iter()
				.map(|item| item.convert_to(item_kind))
				.collect::<Option<Vec<_>>>()
				.map(Self::List),
			_ => None,
		}
	}

	/// Equality with integer and float treated as one numeric domain.
	pub fn loose_eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Int(lhs), Self::Float(rhs)) | (Self::Float(rhs), Self::Int(lhs)) =>
				(*lhs as f64) == *rhs,
			(lhs, rhs) => lhs == rhs,
		}
	}

	/// Partial ordering between two non-null values of compatible kinds.
	pub fn compare(&self, other: &Self) -> Option<Ordering> {
		match (self, other) {
			(Self::Bool(lhs), Self::Bool(rhs)) => Some(lhs.cmp(rhs)),
			(Self::Int(lhs), Self::Int(rhs)) => Some(lhs.cmp(rhs)),
			(Self::Int(_), Self::Float(_))
			| (Self::Float(_), Self::Int(_))
			| (Self::Float(_), Self::Float(_)) => self.as_f64()?.partial_cmp(&other.as_f64()?),
			(Self::Text(lhs), Self::Text(rhs)) => Some(lhs.cmp(rhs)),
			(Self::Date(lhs), Self::Date(rhs)) => Some(lhs.cmp(rhs)),
			(Self::DateTime(lhs), Self::DateTime(rhs)) => Some(lhs.cmp(rhs)),
			(Self::Uuid(lhs), Self::Uuid(rhs)) => Some(lhs.cmp(rhs)),
			_ => None,
		}
	}

	/// Total order used by sorting: null first, then by kind, then by value.
	pub fn total_cmp(&self, other: &Self) -> Ordering {
		match (self, other) {
			(Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => {
				let lhs = self.as_f64().unwrap_or_default();
				let rhs = other.as_f64().unwrap_or_default();

				lhs.total_cmp(&rhs)
			},
			(lhs, rhs) => match lhs.compare(rhs) {
				Some(ordering) => ordering,
				None => lhs.rank().cmp(&rhs.rank()),
			},
		}
	}

	fn rank(&self) -> u8 {
		match self {
			Self::Null => 0,
			Self::Bool(_) => 1,
			Self::Int(_) | Self::Float(_) => 2,
			Self::Text(_) => 3,
			Self::Date(_) => 4,
			Self::DateTime(_) => 5,
			Self::Uuid(_) => 6,
			Self::Vector(_) => 7,
			Self::List(_) => 8,
			Self::Map(_) => 9,
		}
	}
}
impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Null => f.write_str("null"),
			Self::Bool(value) => write!(f, "{value}"),
			Self::Int(value) => write!(f, "{value}"),
			Self::Float(value) => write!(f, "{value}"),
			Self::Text(value) => write!(f, "{value:?}"),
			Self::Date(value) => match value.format(DATE_FORMAT) {
				Ok(formatted) => f.write_str(&formatted),
				Err(_) => write!(f, "{value}"),
			},
			Self::DateTime(value) => match value.format(&Rfc3339) {
				Ok(formatted) => f.write_str(&formatted),
				Err(_) => write!(f, "{value}"),
			},
			Self::Uuid(value) => write!(f, "{value}"),
			Self::Vector(value) => write!(f, "vector[{}]", value.len()),
			Self::List(items) => {
				f.write_str("[")?;

				for (idx, item) in items.iter().enumerate() {
					if idx > 0 {
						f.write_str(", ")?;
					}

					write!(f, "{item}")?;
				}

				f.write_str("]")
			},
			Self::Map(fields) => {
				f.write_str("{")?;

				for (idx, (name, value)) in fields.iter().enumerate() {
					if idx > 0 {
						f.write_str(", ")?;
					}

					write!(f, "{name}: {value}")?;
				}

				f.write_str("}")
			},
		}
	}
}

impl Serialize for Value {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Self::Null => serializer.serialize_unit(),
			Self::Bool(value) => serializer.serialize_bool(*value),
			Self::Int(value) => serializer.serialize_i64(*value),
			Self::Float(value) => serializer.serialize_f64(*value),
			Self::Text(value) => serializer.serialize_str(value),
			Self::Date(value) => {
				let formatted = value.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;

				serializer.serialize_str(&formatted)
			},
			Self::DateTime(value) => {
				let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

				serializer.serialize_str(&formatted)
			},
			Self::Uuid(value) => serializer.serialize_str(&value.to_string()),
			Self::Vector(values) => {
				let mut seq = serializer.serialize_seq(Some(values.len()))?;

				for value in values {
					seq.serialize_element(value)?;
				}

				seq.end()
			},
			Self::List(items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;

				for item in items {
					seq.serialize_element(item)?;
				}

				seq.end()
			},
			Self::Map(fields) => {
				let mut map = serializer.serialize_map(Some(fields.len()))?;

				for (name, value) in fields {
					map.serialize_entry(name, value)?;
				}

				map.end()
			},
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Int(value.into())
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<u32> for Value {
	fn from(value: u32) -> Self {
		Self::Int(value.into())
	}
}

impl From<f32> for Value {
	fn from(value: f32) -> Self {
		Self::Float(value.into())
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<&String> for Value {
	fn from(value: &String) -> Self {
		Self::Text(value.clone())
	}
}

impl From<Date> for Value {
	fn from(value: Date) -> Self {
		Self::Date(value)
	}
}

impl From<OffsetDateTime> for Value {
	fn from(value: OffsetDateTime) -> Self {
		Self::DateTime(value)
	}
}

impl From<Uuid> for Value {
	fn from(value: Uuid) -> Self {
		Self::Uuid(value)
	}
}

impl From<Vec<f32>> for Value {
	fn from(value: Vec<f32>) -> Self {
		Self::Vector(value)
	}
}

impl From<&[f32]> for Value {
	fn from(value: &[f32]) -> Self {
		Self::Vector(value.to_vec())
	}
}

impl From<Vec<String>> for Value {
	fn from(value: Vec<String>) -> Self {
		Self::List(value.into_iter().map(Self::Text).collect())
	}
}

impl From<&[String]> for Value {
	fn from(value: &[String]) -> Self {
		Self::List(value.iter().map(Self::from).collect())
	}
}

impl<T> From<Option<T>> for Value
where
	T: Into<Value>,
{
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// Float wrapper with a total order so it can key a group.
#[derive(Clone, Copy, Debug)]
pub struct Decimal(f64);
impl Decimal {
	pub fn new(value: f64) -> Self {
		// -0.0 and 0.0 must land in the same group.
		if value == 0.0 { Self(0.0) } else { Self(value) }
	}

	pub fn get(self) -> f64 {
		self.0
	}
}
impl PartialEq for Decimal {
	fn eq(&self, other: &Self) -> bool {
		self.0.total_cmp(&other.0) == Ordering::Equal
	}
}
impl Eq for Decimal {}
impl PartialOrd for Decimal {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for Decimal {
	fn cmp(&self, other: &Self) -> Ordering {
		self.0.total_cmp(&other.0)
	}
}
impl Hash for Decimal {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.to_bits().hash(state);
	}
}

/// Grouping and membership key. Closed set of variants with a uniform total order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
	Null,
	Bool(bool),
	Int(i64),
	Decimal(Decimal),
	Text(String),
	Date(Date),
	DateTime(OffsetDateTime),
	Uuid(Uuid),
	Composite(Vec<Key>),
}
impl Key {
	/// Returns `None` for values that carry no stable identity (vectors, maps).
	pub fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Null => Some(Self::Null),
			Value::Bool(value) => Some(Self::Bool(*value)),
			Value::Int(value) => Some(Self::Int(*value)),
			// Integral floats share keys with integers so `in [1, 2]` matches `1.0`.
			Value::Float(value)
				if value.fract() == 0.0
					&& *value >= i64::MIN as f64
					&& *value <= i64::MAX as f64 =>
				Some(Self::Int(*value as i64)),
			Value::Float(value) => Some(Self::Decimal(Decimal::new(*value))),
			Value::Text(value) => Some(Self::Text(value.clone())),
			Value::Date(value) => Some(Self::Date(*value)),
			Value::DateTime(value) => Some(Self::DateTime(*value)),
			Value::Uuid(value) => Some(Self::Uuid(*value)),
			Value::List(items) =>
				items.iter().map(Self::from_value).collect::<Option<Vec<_>>>().map(Self::Composite),
			Value::Vector(_) | Value::Map(_) => None,
		}
	}

	/// Keys a caller-supplied constant. Unkeyable values collapse to `Key::Null`.
	pub fn of(value: impl Into<Value>) -> Self {
		Self::from_value(&value.into()).unwrap_or(Self::Null)
	}

	pub fn to_value(&self) -> Value {
		match self {
			Self::Null => Value::Null,
			Self::Bool(value) => Value::Bool(*value),
			Self::Int(value) => Value::Int(*value),
			Self::Decimal(value) => Value::Float(value.get()),
			Self::Text(value) => Value::Text(value.clone()),
			Self::Date(value) => Value::Date(*value),
			Self::DateTime(value) => Value::DateTime(*value),
			Self::Uuid(value) => Value::Uuid(*value),
			Self::Composite(keys) => Value::List(keys.iter().map(Self::to_value).collect()),
		}
	}
}
impl Display for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.to_value())
	}
}
impl Serialize for Key {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.to_value().serialize(serializer)
	}
}

#[cfg(test)]
mod tests {
	use time::macros::{date, datetime};

	use crate::value::{Key, Value, ValueKind};

	#[test]
	fn text_constants_convert_to_leaf_kinds() {
		assert_eq!(Value::from("18").convert_to(&ValueKind::Int), Some(Value::Int(18)));
		assert_eq!(
			Value::from("2024-03-01").convert_to(&ValueKind::Date),
			Some(Value::Date(date!(2024 - 03 - 01)))
		);
		assert_eq!(
			Value::from("2024-03-01T10:00:00Z").convert_to(&ValueKind::DateTime),
			Some(Value::DateTime(datetime!(2024-03-01 10:00:00 UTC)))
		);
		assert_eq!(Value::from("abc").convert_to(&ValueKind::Int), None);
	}

	#[test]
	fn floats_only_convert_to_int_when_integral() {
		assert_eq!(Value::Float(3.0).convert_to(&ValueKind::Int), Some(Value::Int(3)));
		assert_eq!(Value::Float(3.5).convert_to(&ValueKind::Int), None);
		assert_eq!(Value::Int(3).convert_to(&ValueKind::Float), Some(Value::Float(3.0)));
	}

	#[test]
	fn null_converts_to_any_kind() {
		assert_eq!(Value::Null.convert_to(&ValueKind::Vector), Some(Value::Null));
		assert_eq!(Value::Null.convert_to(&ValueKind::Record("City")), Some(Value::Null));
	}

	#[test]
	fn numeric_domain_is_shared_by_compare_and_eq() {
		assert!(Value::Int(2).loose_eq(&Value::Float(2.0)));
		assert_eq!(
			Value::Int(2).compare(&Value::Float(2.5)),
			Some(std::cmp::Ordering::Less)
		);
		assert_eq!(Value::Null.compare(&Value::Int(1)), None);
		assert_eq!(Value::Text("a".into()).compare(&Value::Int(1)), None);
	}

	#[test]
	fn total_cmp_sorts_null_first() {
		let mut values = vec![Value::Int(3), Value::Null, Value::Float(1.5)];

		values.sort_by(Value::total_cmp);

		assert_eq!(values, vec![Value::Null, Value::Float(1.5), Value::Int(3)]);
	}

	#[test]
	fn keys_unify_integral_floats_and_zero_signs() {
		assert_eq!(Key::from_value(&Value::Float(1.0)), Some(Key::Int(1)));
		assert_eq!(Key::from_value(&Value::Float(-0.0)), Key::from_value(&Value::Float(0.0)));
		assert_eq!(Key::from_value(&Value::Vector(vec![1.0])), None);
		assert_eq!(
			Key::from_value(&Value::from(vec!["a".to_string(), "b".to_string()])),
			Some(Key::Composite(vec![Key::Text("a".into()), Key::Text("b".into())]))
		);
	}

	#[test]
	fn value_serializes_to_plain_json() {
		let value = Value::Map(vec![
			("name".to_string(), Value::from("Seattle")),
			("founded".to_string(), Value::Date(date!(1851 - 11 - 13))),
			("country".to_string(), Value::Null),
		]);
		let json = serde_json::to_value(&value).expect("serialize");

		assert_eq!(
			json,
			serde_json::json!({ "name": "Seattle", "founded": "1851-11-13", "country": null })
		);
	}
}
