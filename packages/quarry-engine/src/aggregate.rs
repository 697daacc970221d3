use std::collections::{HashMap, HashSet};

use crate::{
	error::{EvaluationError, ResolutionError, Result},
	path::FieldPath,
	shape::{Record, Slot},
	value::{Key, Value, ValueKind},
};

/// Result types accepted by `sum` and `average`.
pub trait Numeric: Copy + Send + 'static {
	const ZERO: Self;

	/// Whether a leaf of `kind` can be folded into this type without loss of meaning.
	fn accepts(kind: &ValueKind) -> bool;

	fn from_value(value: &Value) -> Option<Self>;

	fn checked_add(self, other: Self) -> Option<Self>;

	fn from_f64(value: f64) -> Self;
}

macro_rules! impl_integer {
	($($ty:ty),*) => {
		$(
			impl Numeric for $ty {
				const ZERO: Self = 0;

				fn accepts(kind: &ValueKind) -> bool {
					kind == &ValueKind::Int
				}

				fn from_value(value: &Value) -> Option<Self> {
					match value {
						Value::Int(number) => <$ty>::try_from(*number).ok(),
						_ => None,
					}
				}

				fn checked_add(self, other: Self) -> Option<Self> {
					<$ty>::checked_add(self, other)
				}

				fn from_f64(value: f64) -> Self {
					value as $ty
				}
			}
		)*
	};
}

macro_rules! impl_float {
	($($ty:ty),*) => {
		$(
			impl Numeric for $ty {
				const ZERO: Self = 0.0;

				fn accepts(kind: &ValueKind) -> bool {
					kind.is_numeric()
				}

				fn from_value(value: &Value) -> Option<Self> {
					value.as_f64().map(|number| number as $ty)
				}

				fn checked_add(self, other: Self) -> Option<Self> {
					let sum = self + other;

					sum.is_finite().then_some(sum)
				}

				fn from_f64(value: f64) -> Self {
					value as $ty
				}
			}
		)*
	};
}

impl_integer!(i32, i64);
impl_float!(f32, f64);

/// Records sharing one key, in first-occurrence order.
#[derive(Clone, Debug, PartialEq)]
pub struct Group<T> {
	pub key: Key,
	pub items: Vec<T>,
}

/// Resolves a path whose leaf can be folded into `R`.
pub fn numeric_path<T, R>(path: &str) -> Result<FieldPath<T>>
where
	T: Record,
	R: Numeric,
{
	let path = T::shape().resolve(path)?;

	if !R::accepts(path.leaf()) {
		return Err(ResolutionError::NotNumeric {
			path: path.to_string(),
			kind: path.leaf().to_string(),
		}
		.into());
	}

	Ok(path)
}

/// Resolves a path whose leaf can key a group.
pub fn keyable_path<T>(path: &str) -> Result<FieldPath<T>>
where
	T: Record,
{
	let path = T::shape().resolve(path)?;

	if !path.leaf().is_keyable() {
		return Err(ResolutionError::NotKeyable {
			path: path.to_string(),
			kind: path.leaf().to_string(),
		}
		.into());
	}

	Ok(path)
}

/// Sum over non-null leaves. Empty input sums to zero.
pub fn sum<'a, T, R, I>(items: I, path: &FieldPath<T>) -> Result<R, EvaluationError>
where
	T: 'a,
	R: Numeric,
	I: IntoIterator<Item = &'a T>,
{
	let mut total = R::ZERO;

	for number in numbers::<T, R, I>(items, path) {
		total = total
			.checked_add(number?)
			.ok_or_else(|| EvaluationError::Overflow { path: path.to_string() })?;
	}

	Ok(total)
}

/// Mean over non-null leaves, `None` when there are none.
pub fn average<'a, T, R, I>(items: I, path: &FieldPath<T>) -> Result<Option<R>, EvaluationError>
where
	T: 'a,
	R: Numeric,
	I: IntoIterator<Item = &'a T>,
{
	let mut total = 0.0_f64;
	let mut count = 0_usize;

	for item in items {
		let Some(value) = leaf(item, path) else {
			continue;
		};
		let number = value.as_f64().ok_or_else(|| mismatch(path, &value))?;

		total += number;
		count += 1;
	}

	if count == 0 {
		return Ok(None);
	}

	let mean = total / count as f64;

	if !mean.is_finite() {
		return Err(EvaluationError::Overflow { path: path.to_string() });
	}

	Ok(Some(R::from_f64(mean)))
}

/// Groups by the leaf key. Absent hops group under [`Key::Null`].
pub fn group_in_memory<T>(items: Vec<T>, path: &FieldPath<T>) -> Vec<Group<T>> {
	let mut groups: Vec<Group<T>> = Vec::new();
	let mut index: HashMap<Key, usize> = HashMap::new();

	for item in items {
		let key = key_of(&item, path);

		match index.get(&key) {
			Some(&slot) => groups[slot].items.push(item),
			None => {
				index.insert(key.clone(), groups.len());
				groups.push(Group { key, items: vec![item] });
			},
		}
	}

	groups
}

/// Keeps the first item seen for each key.
pub fn distinct_first<T>(items: Vec<T>, path: &FieldPath<T>) -> Vec<T> {
	let mut seen = HashSet::new();

	items.into_iter().filter(|item| seen.insert(key_of(item, path))).collect()
}

fn key_of<T>(item: &T, path: &FieldPath<T>) -> Key {
	Key::from_value(&path.get(item)).unwrap_or(Key::Null)
}

fn leaf<T>(item: &T, path: &FieldPath<T>) -> Option<Value> {
	match path.read(item) {
		Slot::Value(value) if !value.is_null() => Some(value),
		_ => None,
	}
}

fn numbers<'a, T, R, I>(
	items: I,
	path: &FieldPath<T>,
) -> impl Iterator<Item = Result<R, EvaluationError>>
where
	T: 'a,
	R: Numeric,
	I: IntoIterator<Item = &'a T>,
{
	items.into_iter().filter_map(move |item| {
		let value = leaf(item, path)?;

		Some(R::from_value(&value).ok_or_else(|| {
			// The registered kind, but out of range for `R`.
			if value.kind_name() == path.leaf().to_string() {
				EvaluationError::Overflow { path: path.to_string() }
			} else {
				mismatch(path, &value)
			}
		}))
	})
}

fn mismatch<T>(path: &FieldPath<T>, value: &Value) -> EvaluationError {
	EvaluationError::KindMismatch {
		path: path.to_string(),
		expected: path.leaf().to_string(),
		found: value.kind_name(),
	}
}

#[cfg(test)]
mod tests {
	use std::sync::OnceLock;

	use crate::{
		aggregate::{self, Group},
		error::{Error, EvaluationError, ResolutionError},
		path::FieldPath,
		shape::{Record, Shape},
		value::{Key, Value, ValueKind},
	};

	#[derive(Clone, Debug, PartialEq)]
	struct Sale {
		region: Option<&'static str>,
		units: Option<i64>,
		amount: f64,
	}
	impl Record for Sale {
		fn shape() -> &'static Shape<Self> {
			static SHAPE: OnceLock<Shape<Sale>> = OnceLock::new();

			SHAPE.get_or_init(|| {
				Shape::builder("Sale")
					.optional_field("Region", ValueKind::Text, |sale: &Sale| Value::from(sale.region))
					.optional_field("Units", ValueKind::Int, |sale: &Sale| Value::from(sale.units))
					.field("Amount", ValueKind::Float, |sale: &Sale| Value::from(sale.amount))
					.build()
			})
		}
	}

	fn sale(region: Option<&'static str>, units: Option<i64>, amount: f64) -> Sale {
		Sale { region, units, amount }
	}

	fn sales() -> Vec<Sale> {
		vec![
			sale(Some("north"), Some(2), 10.0),
			sale(None, None, 4.5),
			sale(Some("south"), Some(5), 1.5),
			sale(Some("north"), Some(1), 2.0),
		]
	}

	#[test]
	fn sum_and_average_skip_nulls() {
		let units = aggregate::numeric_path::<Sale, i64>("Units").expect("path must resolve");
		let amount = aggregate::numeric_path::<Sale, f64>("Amount").expect("path must resolve");
		let items = sales();

		assert_eq!(aggregate::sum::<Sale, i64, _>(&items, &units), Ok(8));
		assert_eq!(aggregate::average::<Sale, f64, _>(&items, &amount), Ok(Some(4.5)));
		assert_eq!(aggregate::average::<Sale, f64, _>(&[], &amount), Ok(None));
	}

	#[test]
	fn integer_results_require_integer_leaves() {
		assert!(matches!(
			aggregate::numeric_path::<Sale, i32>("Amount"),
			Err(Error::Resolution(ResolutionError::NotNumeric { .. }))
		));
		assert!(aggregate::numeric_path::<Sale, f32>("Units").is_ok());
		assert!(aggregate::numeric_path::<Sale, f64>("Region").is_err());
	}

	#[test]
	fn integer_overflow_is_reported() {
		let units = aggregate::numeric_path::<Sale, i32>("Units").expect("path must resolve");
		let items = vec![sale(None, Some(i64::from(i32::MAX)), 0.0), sale(None, Some(1), 0.0)];

		assert_eq!(
			aggregate::sum::<Sale, i32, _>(&items, &units),
			Err(EvaluationError::Overflow { path: "Units".to_string() })
		);
	}

	#[test]
	fn leaves_disagreeing_with_their_kind_are_not_overflows() {
		struct Drifted;
		impl Record for Drifted {
			fn shape() -> &'static Shape<Self> {
				static SHAPE: OnceLock<Shape<Drifted>> = OnceLock::new();

				SHAPE.get_or_init(|| {
					Shape::builder("Drifted")
						.field("Count", ValueKind::Int, |_: &Drifted| Value::from("seven"))
						.build()
				})
			}
		}

		let count = aggregate::numeric_path::<Drifted, i64>("Count").expect("path must resolve");
		let expected = EvaluationError::KindMismatch {
			path: "Count".to_string(),
			expected: "int".to_string(),
			found: "text".to_string(),
		};

		assert_eq!(aggregate::sum::<Drifted, i64, _>(&[Drifted], &count), Err(expected.clone()));
		assert_eq!(aggregate::average::<Drifted, f64, _>(&[Drifted], &count), Err(expected));
	}

	#[test]
	fn groups_keep_first_occurrence_order() {
		let region: FieldPath<Sale> = aggregate::keyable_path("Region").expect("path must resolve");
		let groups = aggregate::group_in_memory(sales(), &region);
		let keys = groups.iter().map(|group| group.key.clone()).collect::<Vec<_>>();

		assert_eq!(keys, vec![Key::of("north"), Key::Null, Key::of("south")]);
		assert_eq!(
			groups[0],
			Group {
				key: Key::of("north"),
				items: vec![sale(Some("north"), Some(2), 10.0), sale(Some("north"), Some(1), 2.0)]
			}
		);
	}

	#[test]
	fn distinct_keeps_first_per_key_including_null() {
		let region: FieldPath<Sale> = aggregate::keyable_path("Region").expect("path must resolve");
		let mut items = sales();

		items.push(sale(None, Some(9), 9.0));

		let distinct = aggregate::distinct_first(items, &region);

		assert_eq!(
			distinct,
			vec![
				sale(Some("north"), Some(2), 10.0),
				sale(None, None, 4.5),
				sale(Some("south"), Some(5), 1.5)
			]
		);
	}
}
