//! The collaborator that actually stores and scans records.

pub mod memory;

pub use memory::MemorySource;

use std::{future::Future, pin::Pin};

use crate::{
	aggregate::{Group, Numeric},
	error::Result,
	ordering::SortKey,
	path::FieldPath,
	predicate::Predicate,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A lazily composed query over some backing store.
///
/// Transformations consume the source and return the refined one; nothing runs until
/// [`QuerySource::materialize`] or another terminal method is called. Predicates reach the
/// source already normalized.
pub trait QuerySource<T>: Clone {
	fn filter(self, predicate: Predicate<T>) -> Self;

	/// Starts a new primary ordering.
	fn order_by(self, key: SortKey<T>) -> Self;

	/// Refines the most recent primary ordering.
	fn then_by(self, key: SortKey<T>) -> Self;

	fn skip(self, count: usize) -> Self;

	fn take(self, count: usize) -> Self;

	fn materialize(&self) -> Result<Vec<T>>;

	fn count(&self) -> Result<usize> {
		Ok(self.materialize()?.len())
	}

	fn any(&self) -> Result<bool> {
		Ok(self.clone().take(1).count()? > 0)
	}

	/// Native grouping, if the store has one. `None` makes the engine group in memory.
	fn group_by(&self, path: &FieldPath<T>) -> Option<Result<Vec<Group<T>>>> {
		let _ = path;

		None
	}

	/// Native sum over a numeric leaf. `None` makes the engine fold materialized records.
	fn sum<R>(&self, path: &FieldPath<T>) -> Option<Result<R>>
	where
		R: Numeric,
	{
		let _ = path;

		None
	}

	fn average<R>(&self, path: &FieldPath<T>) -> Option<Result<Option<R>>>
	where
		R: Numeric,
	{
		let _ = path;

		None
	}
}

/// A source that can materialize without blocking the caller.
pub trait AsyncQuerySource<T>: QuerySource<T> + Send + Sync {
	fn materialize_async(&self) -> BoxFuture<'_, Result<Vec<T>>>;
}
