use std::{collections::BTreeSet, marker::PhantomData, sync::Arc};

use time::Date;

use quarry_config::SoftDelete;

use crate::{
	error::{ConversionError, ResolutionError, Result},
	path::FieldPath,
	predicate::{CompareOp, Operand, Predicate, TextOp},
	shape::Record,
	value::{Key, Value, ValueKind},
};

/// Builds predicates from path strings.
///
/// Every builder resolves its path against the shape of `T`, converts the constant to the leaf
/// kind and, for multi-hop paths, conjoins a `prefix != null` guard for each intermediate hop
/// ahead of the comparison.
pub struct PredicateBuilder<T>(PhantomData<fn() -> T>);
impl<T> PredicateBuilder<T>
where
	T: Record,
{
	pub fn compare(path: &str, op: CompareOp, value: impl Into<Value>) -> Result<Predicate<T>> {
		let path = resolve::<T>(path)?;

		if op.is_ordering() {
			require_ordered(&path)?;
		}

		let value = convert(&path, value.into())?;

		guarded(&path, Predicate::Compare { operand: Operand::Field(path.clone()), op, value })
	}

	pub fn equals(path: &str, value: impl Into<Value>) -> Result<Predicate<T>> {
		Self::compare(path, CompareOp::Eq, value)
	}

	pub fn not_equals(path: &str, value: impl Into<Value>) -> Result<Predicate<T>> {
		Self::compare(path, CompareOp::Ne, value)
	}

	pub fn greater_than(path: &str, value: impl Into<Value>) -> Result<Predicate<T>> {
		Self::compare(path, CompareOp::Gt, value)
	}

	pub fn greater_or_equal(path: &str, value: impl Into<Value>) -> Result<Predicate<T>> {
		Self::compare(path, CompareOp::Ge, value)
	}

	pub fn less_than(path: &str, value: impl Into<Value>) -> Result<Predicate<T>> {
		Self::compare(path, CompareOp::Lt, value)
	}

	pub fn less_or_equal(path: &str, value: impl Into<Value>) -> Result<Predicate<T>> {
		Self::compare(path, CompareOp::Le, value)
	}

	/// Equality that never reads through an absent hop: `(hop != null) && ... && (leaf == value)`.
	pub fn null_safe_equals(path: &str, value: impl Into<Value>) -> Result<Predicate<T>> {
		Self::equals(path, value)
	}

	pub fn contains(path: &str, needle: &str) -> Result<Predicate<T>> {
		text(path, TextOp::Contains, needle.to_string())
	}

	pub fn contains_ignore_case(path: &str, needle: &str) -> Result<Predicate<T>> {
		text(path, TextOp::ContainsIgnoreCase, needle.to_lowercase())
	}

	pub fn starts_with(path: &str, needle: &str) -> Result<Predicate<T>> {
		text(path, TextOp::StartsWith, needle.to_string())
	}

	pub fn ends_with(path: &str, needle: &str) -> Result<Predicate<T>> {
		text(path, TextOp::EndsWith, needle.to_string())
	}

	pub fn not_contains(path: &str, needle: &str) -> Result<Predicate<T>> {
		negated_text(path, TextOp::Contains, needle.to_string())
	}

	pub fn not_starts_with(path: &str, needle: &str) -> Result<Predicate<T>> {
		negated_text(path, TextOp::StartsWith, needle.to_string())
	}

	pub fn not_ends_with(path: &str, needle: &str) -> Result<Predicate<T>> {
		negated_text(path, TextOp::EndsWith, needle.to_string())
	}

	/// Membership by [`Key`] equality. An empty set matches nothing.
	pub fn is_in<I, V>(path: &str, values: I) -> Result<Predicate<T>>
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		let path = resolve::<T>(path)?;

		if !path.leaf().is_keyable() {
			return Err(ResolutionError::NotKeyable {
				path: path.to_string(),
				kind: path.leaf().to_string(),
			}
			.into());
		}

		let mut keys = BTreeSet::new();

		for value in values {
			let value = convert(&path, value.into())?;

			if let Some(key) = Key::from_value(&value) {
				keys.insert(key);
			}
		}

		guarded(&path, Predicate::In { path: path.clone(), keys })
	}

	/// Inclusive range: `min <= leaf && leaf <= max`.
	pub fn between(
		path: &str,
		min: impl Into<Value>,
		max: impl Into<Value>,
	) -> Result<Predicate<T>> {
		let path = resolve::<T>(path)?;

		require_ordered(&path)?;

		let min = convert(&path, min.into())?;
		let max = convert(&path, max.into())?;
		let lower =
			Predicate::Compare { operand: Operand::Field(path.clone()), op: CompareOp::Ge, value: min };
		let upper =
			Predicate::Compare { operand: Operand::Field(path.clone()), op: CompareOp::Le, value: max };

		guarded(&path, lower.and(upper))
	}

	pub fn not_null(path: &str) -> Result<Predicate<T>> {
		Self::not_equals(path, Value::Null)
	}

	/// `abs(leaf) < threshold` over a numeric leaf.
	pub fn absolute_less_than(path: &str, threshold: impl Into<Value>) -> Result<Predicate<T>> {
		let path = resolve::<T>(path)?;

		if !path.leaf().is_numeric() {
			return Err(ResolutionError::NotNumeric {
				path: path.to_string(),
				kind: path.leaf().to_string(),
			}
			.into());
		}

		let threshold = threshold.into();
		let threshold = threshold.as_f64().ok_or_else(|| ConversionError {
			path: path.to_string(),
			expected: ValueKind::Float.to_string(),
			found: threshold.kind_name(),
		})?;

		guarded(
			&path,
			Predicate::Compare {
				operand: Operand::Abs(path.clone()),
				op: CompareOp::Lt,
				value: Value::Float(threshold),
			},
		)
	}

	/// Character-indexed `substring(leaf, start, length) == expected`.
	///
	/// Bounds are checked per record; a short value fails evaluation instead of matching.
	pub fn substring_equals(
		path: &str,
		start: usize,
		length: usize,
		expected: &str,
	) -> Result<Predicate<T>> {
		let path = require_text(resolve::<T>(path)?)?;

		guarded(
			&path,
			Predicate::Compare {
				operand: Operand::Substring { path: path.clone(), start, length },
				op: CompareOp::Eq,
				value: Value::from(expected),
			},
		)
	}

	pub fn vector_distance_less_than(
		path: &str,
		query: &[f32],
		threshold: f32,
	) -> Result<Predicate<T>> {
		let path = require_vector(resolve::<T>(path)?)?;

		guarded(
			&path,
			Predicate::Compare {
				operand: Operand::CosineDistance { path: path.clone(), query: Arc::from(query) },
				op: CompareOp::Lt,
				value: Value::Float(threshold.into()),
			},
		)
	}

	/// Compares the calendar date of a date or date-time leaf.
	pub fn date_equals(path: &str, date: Date) -> Result<Predicate<T>> {
		let path = resolve::<T>(path)?;

		if !matches!(path.leaf(), ValueKind::Date | ValueKind::DateTime) {
			return Err(ResolutionError::NotDateTime {
				path: path.to_string(),
				kind: path.leaf().to_string(),
			}
			.into());
		}

		guarded(
			&path,
			Predicate::Compare {
				operand: Operand::Date(path.clone()),
				op: CompareOp::Eq,
				value: Value::Date(date),
			},
		)
	}

	/// True when the list leaf contains an element equal to `value`.
	pub fn any_equals(path: &str, value: impl Into<Value>) -> Result<Predicate<T>> {
		let path = resolve::<T>(path)?;
		let ValueKind::List(item_kind) = path.leaf() else {
			return Err(ResolutionError::NotList {
				path: path.to_string(),
				kind: path.leaf().to_string(),
			}
			.into());
		};
		let value = value.into();
		let found = value.kind_name();
		let value = value.convert_to(item_kind).ok_or_else(|| ConversionError {
			path: path.to_string(),
			expected: item_kind.to_string(),
			found,
		})?;

		guarded(&path, Predicate::Any { path: path.clone(), value })
	}

	/// Soft-delete guard over the configured flag fields that exist on `T` as booleans.
	///
	/// Returns `None` when `T` has neither field.
	pub fn live(guard: &SoftDelete) -> Result<Option<Predicate<T>>> {
		let active = flag::<T>(guard.active_field.as_deref(), true)?;
		let archived = flag::<T>(guard.archived_field.as_deref(), false)?;

		Ok(match (active, archived) {
			(Some(active), Some(archived)) => Some(active.and(archived)),
			(Some(predicate), None) | (None, Some(predicate)) => Some(predicate),
			(None, None) => None,
		})
	}
}

fn flag<T>(field: Option<&str>, expected: bool) -> Result<Option<Predicate<T>>>
where
	T: Record,
{
	let Some(field) = field else {
		return Ok(None);
	};
	let shape = T::shape();
	let Some(path) = shape.resolve_lenient(field) else {
		tracing::debug!(record = shape.name(), field, "Soft-delete field not present; skipping.");

		return Ok(None);
	};

	if path.leaf() != &ValueKind::Bool {
		tracing::debug!(
			record = shape.name(),
			field,
			kind = %path.leaf(),
			"Soft-delete field is not boolean; skipping."
		);

		return Ok(None);
	}

	PredicateBuilder::<T>::equals(path.as_str(), expected).map(Some)
}

fn resolve<T>(path: &str) -> Result<FieldPath<T>>
where
	T: Record,
{
	Ok(T::shape().resolve(path)?)
}

fn convert<T>(path: &FieldPath<T>, value: Value) -> Result<Value> {
	let found = value.kind_name();

	value.convert_to(path.leaf()).ok_or_else(|| {
		ConversionError { path: path.to_string(), expected: path.leaf().to_string(), found }.into()
	})
}

fn require_ordered<T>(path: &FieldPath<T>) -> Result<()> {
	if path.leaf().is_ordered() {
		Ok(())
	} else {
		Err(ResolutionError::NotComparable { path: path.to_string(), kind: path.leaf().to_string() }
			.into())
	}
}

fn require_text<T>(path: FieldPath<T>) -> Result<FieldPath<T>> {
	if path.leaf() == &ValueKind::Text {
		Ok(path)
	} else {
		Err(ResolutionError::NotText { path: path.to_string(), kind: path.leaf().to_string() }.into())
	}
}

fn require_vector<T>(path: FieldPath<T>) -> Result<FieldPath<T>> {
	if path.leaf() == &ValueKind::Vector {
		Ok(path)
	} else {
		Err(ResolutionError::NotVector { path: path.to_string(), kind: path.leaf().to_string() }
			.into())
	}
}

fn text<T>(path: &str, op: TextOp, needle: String) -> Result<Predicate<T>>
where
	T: Record,
{
	let path = require_text(resolve::<T>(path)?)?;

	guarded(&path, Predicate::Text { path: path.clone(), op, needle })
}

fn negated_text<T>(path: &str, op: TextOp, needle: String) -> Result<Predicate<T>>
where
	T: Record,
{
	let path = require_text(resolve::<T>(path)?)?;

	guarded(&path, !Predicate::Text { path: path.clone(), op, needle })
}

/// Prefixes `predicate` with `prefix != null` for every intermediate hop of `path`.
fn guarded<T>(path: &FieldPath<T>, predicate: Predicate<T>) -> Result<Predicate<T>>
where
	T: Record,
{
	let mut guard: Option<Predicate<T>> = None;

	for prefix in path.intermediate_prefixes() {
		let check = Predicate::Compare {
			operand: Operand::Field(resolve::<T>(&prefix)?),
			op: CompareOp::Ne,
			value: Value::Null,
		};

		guard = Some(match guard {
			Some(guard) => guard.and(check),
			None => check,
		});
	}

	Ok(match guard {
		Some(guard) => guard.and(predicate),
		None => predicate,
	})
}
