//! Boolean predicate AST over resolved paths.

pub mod builder;
pub mod normalize;

pub use builder::PredicateBuilder;
pub use normalize::normalize;

use std::{
	cmp::Ordering,
	collections::BTreeSet,
	fmt::{Debug, Display, Formatter},
	sync::Arc,
};

use crate::{
	error::EvaluationError,
	path::FieldPath,
	shape::Slot,
	value::{Key, Value},
	vector::{self, MAX_DISTANCE},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
	Eq,
	Ne,
	Gt,
	Ge,
	Lt,
	Le,
}
impl CompareOp {
	/// The operator whose result is the logical complement on non-null operands.
	pub fn negate(self) -> Self {
		match self {
			Self::Eq => Self::Ne,
			Self::Ne => Self::Eq,
			Self::Gt => Self::Le,
			Self::Ge => Self::Lt,
			Self::Lt => Self::Ge,
			Self::Le => Self::Gt,
		}
	}

	pub fn symbol(self) -> &'static str {
		match self {
			Self::Eq => "==",
			Self::Ne => "!=",
			Self::Gt => ">",
			Self::Ge => ">=",
			Self::Lt => "<",
			Self::Le => "<=",
		}
	}

	pub fn is_ordering(self) -> bool {
		!matches!(self, Self::Eq | Self::Ne)
	}

	fn holds(self, ordering: Ordering) -> bool {
		match self {
			Self::Eq => ordering == Ordering::Equal,
			Self::Ne => ordering != Ordering::Equal,
			Self::Gt => ordering == Ordering::Greater,
			Self::Ge => ordering != Ordering::Less,
			Self::Lt => ordering == Ordering::Less,
			Self::Le => ordering != Ordering::Greater,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextOp {
	Contains,
	/// Needle is stored lowercased.
	ContainsIgnoreCase,
	StartsWith,
	EndsWith,
}
impl TextOp {
	fn name(self) -> &'static str {
		match self {
			Self::Contains => "contains",
			Self::ContainsIgnoreCase => "contains_ignore_case",
			Self::StartsWith => "starts_with",
			Self::EndsWith => "ends_with",
		}
	}

	fn matches(self, haystack: &str, needle: &str) -> bool {
		match self {
			Self::Contains => haystack.contains(needle),
			Self::ContainsIgnoreCase => haystack.to_lowercase().contains(needle),
			Self::StartsWith => haystack.starts_with(needle),
			Self::EndsWith => haystack.ends_with(needle),
		}
	}
}

/// Left-hand side of a comparison.
pub enum Operand<T> {
	Field(FieldPath<T>),
	Abs(FieldPath<T>),
	/// Character-based `start..start + length` slice of a text leaf.
	Substring { path: FieldPath<T>, start: usize, length: usize },
	/// Calendar date of a date or date-time leaf.
	Date(FieldPath<T>),
	CosineDistance { path: FieldPath<T>, query: Arc<[f32]> },
}
impl<T> Operand<T> {
	pub fn path(&self) -> &FieldPath<T> {
		match self {
			Self::Field(path)
			| Self::Abs(path)
			| Self::Substring { path, .. }
			| Self::Date(path)
			| Self::CosineDistance { path, .. } => path,
		}
	}

	fn evaluate(&self, item: &T) -> Result<Slot, EvaluationError> {
		if let Self::CosineDistance { path, query } = self {
			let distance = match path.read(item) {
				Slot::Value(value) => vector::cosine_distance(value.as_vector(), Some(&query[..])),
				Slot::Present | Slot::Unreachable { .. } => MAX_DISTANCE,
			};

			return Ok(Slot::Value(Value::Float(distance.into())));
		}

		let path = self.path();
		let value = match path.read(item) {
			Slot::Value(value) => value,
			Slot::Present => return Ok(Slot::Present),
			Slot::Unreachable { hop } => return Err(unguarded(path, hop)),
		};

		if value.is_null() {
			return Ok(Slot::Value(Value::Null));
		}

		let value = match self {
			Self::Field(_) => value,
			Self::Abs(_) => match value {
				Value::Int(number) => Value::Int(
					number
						.checked_abs()
						.ok_or_else(|| EvaluationError::Overflow { path: path.to_string() })?,
				),
				Value::Float(number) => Value::Float(number.abs()),
				other => other,
			},
			Self::Substring { start, length, .. } => match value {
				Value::Text(text) => Value::Text(substring(path, &text, *start, *length)?),
				other => other,
			},
			Self::Date(_) => match value {
				Value::DateTime(at) => Value::Date(at.date()),
				other => other,
			},
			Self::CosineDistance { .. } => value,
		};

		Ok(Slot::Value(value))
	}
}
impl<T> Clone for Operand<T> {
	fn clone(&self) -> Self {
		match self {
			Self::Field(path) => Self::Field(path.clone()),
			Self::Abs(path) => Self::Abs(path.clone()),
			Self::Substring { path, start, length } =>
				Self::Substring { path: path.clone(), start: *start, length: *length },
			Self::Date(path) => Self::Date(path.clone()),
			Self::CosineDistance { path, query } =>
				Self::CosineDistance { path: path.clone(), query: query.clone() },
		}
	}
}
impl<T> PartialEq for Operand<T> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Field(lhs), Self::Field(rhs))
			| (Self::Abs(lhs), Self::Abs(rhs))
			| (Self::Date(lhs), Self::Date(rhs)) => lhs == rhs,
			(
				Self::Substring { path: lhs, start: lhs_start, length: lhs_length },
				Self::Substring { path: rhs, start: rhs_start, length: rhs_length },
			) => lhs == rhs && lhs_start == rhs_start && lhs_length == rhs_length,
			(
				Self::CosineDistance { path: lhs, query: lhs_query },
				Self::CosineDistance { path: rhs, query: rhs_query },
			) => lhs == rhs && lhs_query == rhs_query,
			_ => false,
		}
	}
}
impl<T> Display for Operand<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Field(path) => write!(f, "{path}"),
			Self::Abs(path) => write!(f, "abs({path})"),
			Self::Substring { path, start, length } => write!(f, "substring({path}, {start}, {length})"),
			Self::Date(path) => write!(f, "date({path})"),
			Self::CosineDistance { path, query } =>
				write!(f, "cosine_distance({path}, vector[{}])", query.len()),
		}
	}
}

pub enum Predicate<T> {
	Const(bool),
	Not(Box<Predicate<T>>),
	And(Box<Predicate<T>>, Box<Predicate<T>>),
	Or(Box<Predicate<T>>, Box<Predicate<T>>),
	Compare { operand: Operand<T>, op: CompareOp, value: Value },
	Text { path: FieldPath<T>, op: TextOp, needle: String },
	In { path: FieldPath<T>, keys: BTreeSet<Key> },
	/// True when the list leaf holds an element equal to `value`.
	Any { path: FieldPath<T>, value: Value },
}
impl<T> Predicate<T> {
	pub fn and(self, other: Self) -> Self {
		Self::And(Box::new(self), Box::new(other))
	}

	pub fn or(self, other: Self) -> Self {
		Self::Or(Box::new(self), Box::new(other))
	}

	/// Evaluates against one record.
	///
	/// `And`/`Or` short-circuit left to right, so a null guard on the left protects the
	/// comparison on the right.
	pub fn evaluate(&self, item: &T) -> Result<bool, EvaluationError> {
		match self {
			Self::Const(value) => Ok(*value),
			Self::Not(inner) => Ok(!inner.evaluate(item)?),
			Self::And(lhs, rhs) => Ok(lhs.evaluate(item)? && rhs.evaluate(item)?),
			Self::Or(lhs, rhs) => Ok(lhs.evaluate(item)? || rhs.evaluate(item)?),
			Self::Compare { operand, op, value } => {
				let lhs = operand.evaluate(item)?;

				Ok(compare(&lhs, *op, value))
			},
			Self::Text { path, op, needle } => match read_reachable(path, item)? {
				Slot::Value(Value::Text(text)) => Ok(op.matches(&text, needle)),
				_ => Ok(false),
			},
			Self::In { path, keys } => match read_reachable(path, item)? {
				Slot::Value(value) =>
					Ok(Key::from_value(&value).is_some_and(|key| keys.contains(&key))),
				_ => Ok(false),
			},
			Self::Any { path, value } => match read_reachable(path, item)? {
				Slot::Value(Value::List(items)) => Ok(items.iter().any(|element| element.loose_eq(value))),
				_ => Ok(false),
			},
		}
	}
}
impl<T> Clone for Predicate<T> {
	fn clone(&self) -> Self {
		match self {
			Self::Const(value) => Self::Const(*value),
			Self::Not(inner) => Self::Not(inner.clone()),
			Self::And(lhs, rhs) => Self::And(lhs.clone(), rhs.clone()),
			Self::Or(lhs, rhs) => Self::Or(lhs.clone(), rhs.clone()),
			Self::Compare { operand, op, value } =>
				Self::Compare { operand: operand.clone(), op: *op, value: value.clone() },
			Self::Text { path, op, needle } =>
				Self::Text { path: path.clone(), op: *op, needle: needle.clone() },
			Self::In { path, keys } => Self::In { path: path.clone(), keys: keys.clone() },
			Self::Any { path, value } => Self::Any { path: path.clone(), value: value.clone() },
		}
	}
}
impl<T> PartialEq for Predicate<T> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Const(lhs), Self::Const(rhs)) => lhs == rhs,
			(Self::Not(lhs), Self::Not(rhs)) => lhs == rhs,
			(Self::And(lhs_l, lhs_r), Self::And(rhs_l, rhs_r))
			| (Self::Or(lhs_l, lhs_r), Self::Or(rhs_l, rhs_r)) => lhs_l == rhs_l && lhs_r == rhs_r,
			(
				Self::Compare { operand: lhs_operand, op: lhs_op, value: lhs_value },
				Self::Compare { operand: rhs_operand, op: rhs_op, value: rhs_value },
			) => lhs_operand == rhs_operand && lhs_op == rhs_op && lhs_value == rhs_value,
			(
				Self::Text { path: lhs_path, op: lhs_op, needle: lhs_needle },
				Self::Text { path: rhs_path, op: rhs_op, needle: rhs_needle },
			) => lhs_path == rhs_path && lhs_op == rhs_op && lhs_needle == rhs_needle,
			(
				Self::In { path: lhs_path, keys: lhs_keys },
				Self::In { path: rhs_path, keys: rhs_keys },
			) => lhs_path == rhs_path && lhs_keys == rhs_keys,
			(
				Self::Any { path: lhs_path, value: lhs_value },
				Self::Any { path: rhs_path, value: rhs_value },
			) => lhs_path == rhs_path && lhs_value == rhs_value,
			_ => false,
		}
	}
}
impl<T> std::ops::Not for Predicate<T> {
	type Output = Self;

	fn not(self) -> Self::Output {
		Self::Not(Box::new(self))
	}
}
impl<T> Display for Predicate<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Const(value) => write!(f, "{value}"),
			Self::Not(inner) => write!(f, "!({inner})"),
			Self::And(lhs, rhs) => write!(f, "({lhs} && {rhs})"),
			Self::Or(lhs, rhs) => write!(f, "({lhs} || {rhs})"),
			Self::Compare { operand, op, value } => write!(f, "{operand} {} {value}", op.symbol()),
			Self::Text { path, op, needle } => write!(f, "{}({path}, {needle:?})", op.name()),
			Self::In { path, keys } => {
				write!(f, "{path} in [")?;

				for (idx, key) in keys.iter().enumerate() {
					if idx > 0 {
						f.write_str(", ")?;
					}

					write!(f, "{key}")?;
				}

				f.write_str("]")
			},
			Self::Any { path, value } => write!(f, "any({path} == {value})"),
		}
	}
}
impl<T> Debug for Predicate<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "Predicate({self})")
	}
}

fn compare(lhs: &Slot, op: CompareOp, rhs: &Value) -> bool {
	match lhs {
		Slot::Present => op == CompareOp::Ne && rhs.is_null(),
		Slot::Unreachable { .. } => false,
		Slot::Value(lhs) => match (lhs.is_null(), rhs.is_null()) {
			(true, true) => op == CompareOp::Eq,
			(true, false) | (false, true) => op == CompareOp::Ne,
			(false, false) => match op {
				CompareOp::Eq => lhs.loose_eq(rhs),
				CompareOp::Ne => !lhs.loose_eq(rhs),
				op => lhs.compare(rhs).is_some_and(|ordering| op.holds(ordering)),
			},
		},
	}
}

fn read_reachable<T>(path: &FieldPath<T>, item: &T) -> Result<Slot, EvaluationError> {
	match path.read(item) {
		Slot::Unreachable { hop } => Err(unguarded(path, hop)),
		slot => Ok(slot),
	}
}

fn unguarded<T>(path: &FieldPath<T>, hop: usize) -> EvaluationError {
	EvaluationError::UnguardedNullHop { path: path.to_string(), hop: path.prefix_through(hop) }
}

fn substring<T>(
	path: &FieldPath<T>,
	text: &str,
	start: usize,
	length: usize,
) -> Result<String, EvaluationError> {
	let len = text.chars().count();

	if start.checked_add(length).is_none_or(|end| end > len) {
		return Err(EvaluationError::SubstringOutOfRange {
			path: path.to_string(),
			start,
			length,
			len,
		});
	}

	Ok(text.chars().skip(start).take(length).collect())
}

#[cfg(test)]
mod tests {
	use std::sync::OnceLock;

	use crate::{
		error::EvaluationError,
		path::{self, FieldPath},
		predicate::{CompareOp, Operand, Predicate, TextOp},
		shape::{Record, Shape},
		value::{Value, ValueKind},
	};

	struct Leaf {
		label: Option<String>,
		score: i64,
	}
	impl Record for Leaf {
		fn shape() -> &'static Shape<Self> {
			static SHAPE: OnceLock<Shape<Leaf>> = OnceLock::new();

			SHAPE.get_or_init(|| {
				Shape::builder("Leaf")
					.optional_field("Label", ValueKind::Text, |leaf: &Leaf| {
						Value::from(leaf.label.clone())
					})
					.field("Score", ValueKind::Int, |leaf: &Leaf| Value::from(leaf.score))
					.build()
			})
		}
	}

	struct Root {
		leaf: Option<Leaf>,
	}
	impl Record for Root {
		fn shape() -> &'static Shape<Self> {
			static SHAPE: OnceLock<Shape<Root>> = OnceLock::new();

			SHAPE.get_or_init(|| {
				Shape::builder("Root").optional_record("Leaf", |root: &Root| root.leaf.as_ref()).build()
			})
		}
	}

	fn field(path: &str) -> FieldPath<Root> {
		path::resolve(path).expect("path must resolve")
	}

	fn with_label(label: Option<&str>) -> Root {
		Root { leaf: Some(Leaf { label: label.map(str::to_string), score: -4 }) }
	}

	#[test]
	fn null_comparisons_are_lifted() {
		let eq_null = Predicate::Compare {
			operand: Operand::Field(field("Leaf.Label")),
			op: CompareOp::Eq,
			value: Value::Null,
		};
		let gt = Predicate::Compare {
			operand: Operand::Field(field("Leaf.Label")),
			op: CompareOp::Gt,
			value: Value::from("a"),
		};
		let item = with_label(None);

		assert_eq!(eq_null.evaluate(&item), Ok(true));
		assert_eq!(gt.evaluate(&item), Ok(false));
	}

	#[test]
	fn unguarded_hop_fails_and_guard_short_circuits() {
		let compare = Predicate::Compare {
			operand: Operand::Field(field("Leaf.Score")),
			op: CompareOp::Lt,
			value: Value::Int(0),
		};
		let guard = Predicate::Compare {
			operand: Operand::Field(field("Leaf")),
			op: CompareOp::Ne,
			value: Value::Null,
		};
		let missing = Root { leaf: None };

		assert_eq!(
			compare.evaluate(&missing),
			Err(EvaluationError::UnguardedNullHop {
				path: "Leaf.Score".to_string(),
				hop: "Leaf".to_string()
			})
		);
		assert_eq!(guard.clone().and(compare.clone()).evaluate(&missing), Ok(false));
		assert_eq!(guard.and(compare).evaluate(&with_label(None)), Ok(true));
	}

	#[test]
	fn abs_and_substring_operands() {
		let abs = Predicate::Compare {
			operand: Operand::Abs(field("Leaf.Score")),
			op: CompareOp::Lt,
			value: Value::Float(5.0),
		};
		let substring = Predicate::Compare {
			operand: Operand::Substring { path: field("Leaf.Label"), start: 1, length: 3 },
			op: CompareOp::Eq,
			value: Value::from("éta"),
		};

		assert_eq!(abs.evaluate(&with_label(None)), Ok(true));
		assert_eq!(substring.evaluate(&with_label(Some("Béta"))), Ok(true));
		assert_eq!(
			substring.evaluate(&with_label(Some("Bé"))),
			Err(EvaluationError::SubstringOutOfRange {
				path: "Leaf.Label".to_string(),
				start: 1,
				length: 3,
				len: 2
			})
		);
	}

	#[test]
	fn text_on_null_leaf_is_false() {
		let contains =
			Predicate::Text { path: field("Leaf.Label"), op: TextOp::Contains, needle: "x".into() };

		assert_eq!(contains.evaluate(&with_label(None)), Ok(false));
		assert_eq!(contains.evaluate(&with_label(Some("axe"))), Ok(true));
	}

	#[test]
	fn renders_infix() {
		let predicate = Predicate::Compare {
			operand: Operand::Field(field("Leaf")),
			op: CompareOp::Ne,
			value: Value::Null,
		}
		.and(!Predicate::Text {
			path: field("leaf.label"),
			op: TextOp::StartsWith,
			needle: "a".into(),
		});

		assert_eq!(predicate.to_string(), "(Leaf != null && !(starts_with(Leaf.Label, \"a\")))");
	}
}
