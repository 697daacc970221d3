use std::{
	borrow::Borrow,
	cmp::Ordering,
	fmt::{Debug, Display, Formatter},
	sync::Arc,
};

use crate::{
	error::{ResolutionError, Result},
	path::FieldPath,
	shape::{Record, Slot},
	value::{Value, ValueKind},
	vector,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	Ascending,
	Descending,
}
impl Direction {
	pub fn from_descending(descending: bool) -> Self {
		if descending { Self::Descending } else { Self::Ascending }
	}

	fn apply(self, ordering: Ordering) -> Ordering {
		match self {
			Self::Ascending => ordering,
			Self::Descending => ordering.reverse(),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortStage {
	Primary,
	/// Tie-breaker under the preceding keys. Requires an active primary ordering.
	ThenBy,
}

pub enum SortExpr<T> {
	Field(FieldPath<T>),
	VectorSimilarity { path: FieldPath<T>, query: Arc<[f32]> },
}
impl<T> Clone for SortExpr<T> {
	fn clone(&self) -> Self {
		match self {
			Self::Field(path) => Self::Field(path.clone()),
			Self::VectorSimilarity { path, query } =>
				Self::VectorSimilarity { path: path.clone(), query: query.clone() },
		}
	}
}

pub struct SortKey<T> {
	pub expr: SortExpr<T>,
	pub direction: Direction,
	pub stage: SortStage,
}
impl<T> SortKey<T>
where
	T: Record,
{
	pub fn by_field(path: &str, direction: Direction, stage: SortStage) -> Result<Self> {
		let path = T::shape().resolve(path)?;

		if !path.leaf().is_ordered() {
			return Err(ResolutionError::NotComparable {
				path: path.to_string(),
				kind: path.leaf().to_string(),
			}
			.into());
		}

		Ok(Self { expr: SortExpr::Field(path), direction, stage })
	}

	/// Sorts by cosine similarity to `query`. Records without a usable vector score lowest.
	pub fn by_vector_similarity(
		path: &str,
		query: &[f32],
		direction: Direction,
		stage: SortStage,
	) -> Result<Self> {
		let path = T::shape().resolve(path)?;

		if path.leaf() != &ValueKind::Vector {
			return Err(ResolutionError::NotVector {
				path: path.to_string(),
				kind: path.leaf().to_string(),
			}
			.into());
		}

		Ok(Self {
			expr: SortExpr::VectorSimilarity { path, query: Arc::from(query) },
			direction,
			stage,
		})
	}
}
impl<T> SortKey<T> {
	/// Key value for one record. Absent hops read as null.
	pub fn key(&self, item: &T) -> Value {
		match &self.expr {
			SortExpr::Field(path) => match path.read(item) {
				Slot::Value(value) => value,
				Slot::Present | Slot::Unreachable { .. } => Value::Null,
			},
			SortExpr::VectorSimilarity { path, query } => {
				let value = match path.read(item) {
					Slot::Value(value) => value,
					Slot::Present | Slot::Unreachable { .. } => Value::Null,
				};

				Value::Float(vector::cosine_similarity(value.as_vector(), Some(&query[..])).into())
			},
		}
	}

	pub fn with_stage(mut self, stage: SortStage) -> Self {
		self.stage = stage;

		self
	}

	fn compare_keys(&self, lhs: &Value, rhs: &Value) -> Ordering {
		self.direction.apply(lhs.total_cmp(rhs))
	}
}
impl<T> Clone for SortKey<T> {
	fn clone(&self) -> Self {
		Self { expr: self.expr.clone(), direction: self.direction, stage: self.stage }
	}
}
impl<T> Display for SortKey<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match &self.expr {
			SortExpr::Field(path) => write!(f, "{path}")?,
			SortExpr::VectorSimilarity { path, query } =>
				write!(f, "cosine_similarity({path}, vector[{}])", query.len())?,
		}

		match self.direction {
			Direction::Ascending => f.write_str(" asc"),
			Direction::Descending => f.write_str(" desc"),
		}
	}
}
impl<T> Debug for SortKey<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "SortKey({self}, {:?})", self.stage)
	}
}

/// Stable sort by `keys` in order. Each key is computed once per item.
pub fn sort_by_keys<T, I>(items: Vec<I>, keys: &[SortKey<T>]) -> Vec<I>
where
	I: Borrow<T>,
{
	if keys.is_empty() {
		return items;
	}

	let mut decorated = items
		.into_iter()
		.map(|item| {
			let values = keys.iter().map(|key| key.key(item.borrow())).collect::<Vec<_>>();

			(values, item)
		})
		.collect::<Vec<_>>();

	decorated.sort_by(|(lhs, _), (rhs, _)| {
		keys.iter()
			.zip(lhs.iter().zip(rhs.iter()))
			.map(|(key, (lhs, rhs))| key.compare_keys(lhs, rhs))
			.find(|ordering| ordering.is_ne())
			.unwrap_or(Ordering::Equal)
	});

	decorated.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
	use std::sync::OnceLock;

	use crate::{
		error::{Error, ResolutionError},
		ordering::{Direction, SortKey, SortStage, sort_by_keys},
		shape::{Record, Shape},
		value::{Value, ValueKind},
	};

	#[derive(Debug, PartialEq)]
	struct Doc {
		id: u32,
		rank: Option<i64>,
		embedding: Option<Vec<f32>>,
	}
	impl Record for Doc {
		fn shape() -> &'static Shape<Self> {
			static SHAPE: OnceLock<Shape<Doc>> = OnceLock::new();

			SHAPE.get_or_init(|| {
				Shape::builder("Doc")
					.field("Id", ValueKind::Int, |doc: &Doc| Value::from(doc.id))
					.optional_field("Rank", ValueKind::Int, |doc: &Doc| Value::from(doc.rank))
					.optional_field("Embedding", ValueKind::Vector, |doc: &Doc| {
						Value::from(doc.embedding.clone())
					})
					.build()
			})
		}
	}

	fn doc(id: u32, rank: Option<i64>, embedding: Option<Vec<f32>>) -> Doc {
		Doc { id, rank, embedding }
	}

	fn ids(docs: &[&Doc]) -> Vec<u32> {
		docs.iter().map(|doc| doc.id).collect()
	}

	#[test]
	fn nulls_first_ascending_and_stable_ties() {
		let docs = [
			doc(1, Some(2), None),
			doc(2, None, None),
			doc(3, Some(1), None),
			doc(4, Some(2), None),
		];
		let keys = [SortKey::<Doc>::by_field("Rank", Direction::Ascending, SortStage::Primary)
			.expect("key must build")];
		let sorted = sort_by_keys(docs.iter().collect(), &keys);

		assert_eq!(ids(&sorted), vec![2, 3, 1, 4]);
	}

	#[test]
	fn then_by_breaks_ties() {
		let docs = [doc(1, Some(2), None), doc(2, Some(1), None), doc(3, Some(2), None)];
		let keys = [
			SortKey::<Doc>::by_field("Rank", Direction::Descending, SortStage::Primary)
				.expect("key must build"),
			SortKey::<Doc>::by_field("Id", Direction::Descending, SortStage::ThenBy)
				.expect("key must build"),
		];
		let sorted = sort_by_keys(docs.iter().collect(), &keys);

		assert_eq!(ids(&sorted), vec![3, 1, 2]);
	}

	#[test]
	fn vector_similarity_descending_puts_closest_first() {
		let docs = [
			doc(1, None, Some(vec![0.0, 1.0])),
			doc(2, None, None),
			doc(3, None, Some(vec![1.0, 0.1])),
			doc(4, None, Some(vec![1.0, 0.0, 0.0])),
		];
		let keys = [SortKey::<Doc>::by_vector_similarity(
			"Embedding",
			&[1.0, 0.0],
			Direction::Descending,
			SortStage::Primary,
		)
		.expect("key must build")];
		let sorted = sort_by_keys(docs.iter().collect(), &keys);

		assert_eq!(ids(&sorted), vec![3, 1, 2, 4]);
	}

	#[test]
	fn keys_reject_unsuitable_leaves() {
		assert!(matches!(
			SortKey::<Doc>::by_field("Embedding", Direction::Ascending, SortStage::Primary),
			Err(Error::Resolution(ResolutionError::NotComparable { .. }))
		));
		assert!(matches!(
			SortKey::<Doc>::by_vector_similarity(
				"Rank",
				&[1.0],
				Direction::Ascending,
				SortStage::Primary
			),
			Err(Error::Resolution(ResolutionError::NotVector { .. }))
		));
	}
}
