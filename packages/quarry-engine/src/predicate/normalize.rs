use crate::predicate::Predicate;

/// Pushes negations inward until only text, membership and list tests remain negated.
///
/// Double negations cancel, negated comparisons flip their operator, negated constants fold and
/// De Morgan rewrites negated conjunctions and disjunctions. The result is a fixed point:
/// `normalize(normalize(p)) == normalize(p)`.
pub fn normalize<T>(predicate: Predicate<T>) -> Predicate<T> {
	match predicate {
		Predicate::Not(inner) => negate(*inner),
		Predicate::And(lhs, rhs) => normalize(*lhs).and(normalize(*rhs)),
		Predicate::Or(lhs, rhs) => normalize(*lhs).or(normalize(*rhs)),
		other => other,
	}
}

/// Normal form of `!predicate`.
fn negate<T>(predicate: Predicate<T>) -> Predicate<T> {
	match predicate {
		Predicate::Not(inner) => normalize(*inner),
		Predicate::Const(value) => Predicate::Const(!value),
		Predicate::Compare { operand, op, value } =>
			Predicate::Compare { operand, op: op.negate(), value },
		Predicate::And(lhs, rhs) => negate(*lhs).or(negate(*rhs)),
		Predicate::Or(lhs, rhs) => negate(*lhs).and(negate(*rhs)),
		other => !other,
	}
}

#[cfg(test)]
mod tests {
	use std::sync::OnceLock;

	use crate::{
		predicate::{Predicate, PredicateBuilder, normalize},
		shape::{Record, Shape},
		value::{Value, ValueKind},
	};

	struct Row {
		age: i64,
		name: String,
	}
	impl Record for Row {
		fn shape() -> &'static Shape<Self> {
			static SHAPE: OnceLock<Shape<Row>> = OnceLock::new();

			SHAPE.get_or_init(|| {
				Shape::builder("Row")
					.field("Age", ValueKind::Int, |row: &Row| Value::from(row.age))
					.field("Name", ValueKind::Text, |row: &Row| Value::from(&row.name))
					.build()
			})
		}
	}

	fn gt(age: i64) -> Predicate<Row> {
		PredicateBuilder::greater_than("Age", age).expect("predicate must build")
	}

	fn named(prefix: &str) -> Predicate<Row> {
		PredicateBuilder::starts_with("Name", prefix).expect("predicate must build")
	}

	#[test]
	fn double_negation_cancels() {
		assert_eq!(normalize(!!gt(3)), gt(3));
		assert_eq!(normalize(!!!named("a")), !named("a"));
	}

	#[test]
	fn negated_comparisons_flip() {
		assert_eq!(normalize(!gt(3)).to_string(), "Age <= 3");
		assert_eq!(
			normalize(!PredicateBuilder::<Row>::equals("Age", 3).expect("predicate must build"))
				.to_string(),
			"Age != 3"
		);
		assert_eq!(normalize(!Predicate::<Row>::Const(true)), Predicate::Const(false));
	}

	#[test]
	fn de_morgan_over_nested_combinations() {
		let and_of_or = !(gt(1).and(gt(2).or(named("x"))));
		let or_of_and = !(gt(1).or(gt(2).and(named("x"))));

		assert_eq!(
			normalize(and_of_or).to_string(),
			"(Age <= 1 || (Age <= 2 && !(starts_with(Name, \"x\"))))"
		);
		assert_eq!(
			normalize(or_of_and).to_string(),
			"(Age <= 1 && (Age <= 2 || !(starts_with(Name, \"x\"))))"
		);
	}

	#[test]
	fn normalization_is_a_fixed_point() {
		let predicates = [
			!(gt(1).and(!named("a"))),
			!!(gt(1).or(!(gt(2).and(Predicate::Const(false))))),
			named("b").and(!!!gt(4)),
		];

		for predicate in predicates {
			let once = normalize(predicate);
			let twice = normalize(once.clone());

			assert_eq!(once, twice);
		}
	}

	#[test]
	fn normalization_preserves_truth_on_non_null_records() {
		let predicate = !(gt(30).or(!named("Al")));
		let rows = [
			Row { age: 20, name: "Alice".to_string() },
			Row { age: 40, name: "Alice".to_string() },
			Row { age: 20, name: "Bob".to_string() },
		];
		let normalized = normalize(predicate.clone());

		for row in &rows {
			assert_eq!(predicate.evaluate(row), normalized.evaluate(row));
		}
	}
}
