pub mod fixtures;

pub use fixtures::{Address, Category, City, Person, Product, people, products};

use std::time::Duration;

use tokio::time;

use quarry_engine::{
	AsyncQuerySource, BoxFuture, Error, MemorySource, Predicate, QuerySource, Result, SortKey,
};

/// A store with latency and no native grouping.
///
/// Delegates every stage to a [`MemorySource`], sleeps before async materialization, and can be
/// told to fail so error propagation through the engine is observable.
pub struct DelayedSource<T> {
	inner: MemorySource<T>,
	delay: Duration,
	failure: Option<String>,
}
impl<T> DelayedSource<T> {
	pub fn new(items: Vec<T>, delay: Duration) -> Self {
		Self { inner: MemorySource::from(items), delay, failure: None }
	}

	/// Every terminal call returns `Error::Source` with `message`.
	pub fn failing(mut self, message: &str) -> Self {
		self.failure = Some(message.to_string());

		self
	}

	fn check(&self) -> Result<()> {
		match &self.failure {
			Some(message) => Err(Error::Source { message: message.clone() }),
			None => Ok(()),
		}
	}

	fn map(self, f: impl FnOnce(MemorySource<T>) -> MemorySource<T>) -> Self {
		Self { inner: f(self.inner), delay: self.delay, failure: self.failure }
	}
}
impl<T> Clone for DelayedSource<T> {
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone(), delay: self.delay, failure: self.failure.clone() }
	}
}
impl<T> QuerySource<T> for DelayedSource<T>
where
	T: Clone,
{
	fn filter(self, predicate: Predicate<T>) -> Self {
		self.map(|inner| inner.filter(predicate))
	}

	fn order_by(self, key: SortKey<T>) -> Self {
		self.map(|inner| inner.order_by(key))
	}

	fn then_by(self, key: SortKey<T>) -> Self {
		self.map(|inner| inner.then_by(key))
	}

	fn skip(self, count: usize) -> Self {
		self.map(|inner| inner.skip(count))
	}

	fn take(self, count: usize) -> Self {
		self.map(|inner| inner.take(count))
	}

	fn materialize(&self) -> Result<Vec<T>> {
		self.check()?;

		self.inner.materialize()
	}
}
impl<T> AsyncQuerySource<T> for DelayedSource<T>
where
	T: Clone + Send + Sync,
{
	fn materialize_async(&self) -> BoxFuture<'_, Result<Vec<T>>> {
		Box::pin(async move {
			time::sleep(self.delay).await;

			self.materialize()
		})
	}
}

/// People behind a source that never groups natively.
pub fn people_source(delay: Duration) -> DelayedSource<Person> {
	DelayedSource::new(people(), delay)
}

pub fn products_source() -> MemorySource<Product> {
	MemorySource::from(products())
}
