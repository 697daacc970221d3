use std::sync::Arc;

use crate::{
	aggregate::{self, Group, Numeric},
	error::Result,
	ordering::{self, SortKey},
	path::FieldPath,
	predicate::Predicate,
	source::{AsyncQuerySource, BoxFuture, QuerySource},
};

/// In-process source over a shared slice.
///
/// Stages are recorded in call order and replayed over borrowed items on every terminal call,
/// so cloning a source never copies the records.
pub struct MemorySource<T> {
	items: Arc<[T]>,
	stages: Vec<Stage<T>>,
}
impl<T> MemorySource<T> {
	pub fn new(items: impl Into<Arc<[T]>>) -> Self {
		Self { items: items.into(), stages: Vec::new() }
	}

	/// Number of backing records, ignoring recorded stages.
	pub fn backing_len(&self) -> usize {
		self.items.len()
	}

	fn push(mut self, stage: Stage<T>) -> Self {
		self.stages.push(stage);

		self
	}

	fn select(&self) -> Result<Vec<&T>> {
		let mut current = self.items.iter().collect::<Vec<_>>();

		for stage in &self.stages {
			current = match stage {
				Stage::Filter(predicate) => {
					let mut kept = Vec::with_capacity(current.len());

					for item in current {
						if predicate.evaluate(item)? {
							kept.push(item);
						}
					}

					kept
				},
				Stage::Order(keys) => ordering::sort_by_keys(current, keys),
				Stage::Skip(count) => current.into_iter().skip(*count).collect(),
				Stage::Take(count) => current.into_iter().take(*count).collect(),
			};
		}

		tracing::debug!(
			backing = self.items.len(),
			stages = self.stages.len(),
			items = current.len(),
			"Evaluated in-memory source."
		);

		Ok(current)
	}
}
impl<T> Clone for MemorySource<T> {
	fn clone(&self) -> Self {
		Self { items: self.items.clone(), stages: self.stages.clone() }
	}
}
impl<T> From<Vec<T>> for MemorySource<T> {
	fn from(items: Vec<T>) -> Self {
		Self::new(items)
	}
}
impl<T> QuerySource<T> for MemorySource<T>
where
	T: Clone,
{
	fn filter(self, predicate: Predicate<T>) -> Self {
		self.push(Stage::Filter(predicate))
	}

	fn order_by(self, key: SortKey<T>) -> Self {
		self.push(Stage::Order(vec![key]))
	}

	fn then_by(mut self, key: SortKey<T>) -> Self {
		match self.stages.last_mut() {
			Some(Stage::Order(keys)) => {
				keys.push(key);

				self
			},
			_ => self.push(Stage::Order(vec![key])),
		}
	}

	fn skip(self, count: usize) -> Self {
		self.push(Stage::Skip(count))
	}

	fn take(self, count: usize) -> Self {
		self.push(Stage::Take(count))
	}

	fn materialize(&self) -> Result<Vec<T>> {
		Ok(self.select()?.into_iter().cloned().collect())
	}

	fn count(&self) -> Result<usize> {
		Ok(self.select()?.len())
	}

	fn group_by(&self, path: &FieldPath<T>) -> Option<Result<Vec<Group<T>>>> {
		Some(self.materialize().map(|items| aggregate::group_in_memory(items, path)))
	}

	fn sum<R>(&self, path: &FieldPath<T>) -> Option<Result<R>>
	where
		R: Numeric,
	{
		Some(self.select().and_then(|items| Ok(aggregate::sum::<T, R, _>(items, path)?)))
	}

	fn average<R>(&self, path: &FieldPath<T>) -> Option<Result<Option<R>>>
	where
		R: Numeric,
	{
		Some(self.select().and_then(|items| Ok(aggregate::average::<T, R, _>(items, path)?)))
	}
}
impl<T> AsyncQuerySource<T> for MemorySource<T>
where
	T: Clone + Send + Sync,
{
	fn materialize_async(&self) -> BoxFuture<'_, Result<Vec<T>>> {
		Box::pin(async move { self.materialize() })
	}
}

enum Stage<T> {
	Filter(Predicate<T>),
	Order(Vec<SortKey<T>>),
	Skip(usize),
	Take(usize),
}
impl<T> Clone for Stage<T> {
	fn clone(&self) -> Self {
		match self {
			Self::Filter(predicate) => Self::Filter(predicate.clone()),
			Self::Order(keys) => Self::Order(keys.clone()),
			Self::Skip(count) => Self::Skip(*count),
			Self::Take(count) => Self::Take(*count),
		}
	}
}
