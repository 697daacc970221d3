use std::{
	collections::{HashMap, HashSet},
	future::Future,
	marker::PhantomData,
};

use time::Date;

use quarry_config::SoftDelete;

use crate::{
	aggregate::{self, Group, Numeric},
	error::{Error, ResolutionError, Result},
	ordering::{Direction, SortKey, SortStage},
	path::{self, FieldPath},
	predicate::{self, Predicate, PredicateBuilder},
	projection::{self, Projection},
	ranking::{self, HybridWeights},
	shape::Record,
	source::{AsyncQuerySource, QuerySource},
	value::{Key, Value, ValueKind},
};

/// Chainable, immutable query over a [`QuerySource`].
///
/// Every builder validates its paths and constants before the source is touched, then returns a
/// new engine. Terminal methods run the query.
pub struct QueryEngine<T, S> {
	source: S,
	ordered: bool,
	_record: PhantomData<fn() -> T>,
}
impl<T, S> QueryEngine<T, S>
where
	T: Record,
	S: QuerySource<T>,
{
	pub fn new(source: S) -> Self {
		Self { source, ordered: false, _record: PhantomData }
	}

	/// Whether the next `then_by*` call has a primary ordering to refine.
	pub fn is_ordered(&self) -> bool {
		self.ordered
	}

	/// Normalizes `predicate` and appends it. Filtering ends the active ordering chain.
	pub fn filter(&self, predicate: Predicate<T>) -> Self {
		let predicate = predicate::normalize(predicate);

		tracing::debug!(record = T::shape().name(), predicate = %predicate, "Applying filter.");

		self.with_source(self.source.clone().filter(predicate), false)
	}

	pub fn where_equals(&self, path: &str, value: impl Into<Value>) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::equals(path, value)?))
	}

	pub fn where_not_equals(&self, path: &str, value: impl Into<Value>) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::not_equals(path, value)?))
	}

	pub fn where_greater_than(&self, path: &str, value: impl Into<Value>) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::greater_than(path, value)?))
	}

	pub fn where_greater_or_equal(&self, path: &str, value: impl Into<Value>) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::greater_or_equal(path, value)?))
	}

	pub fn where_less_than(&self, path: &str, value: impl Into<Value>) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::less_than(path, value)?))
	}

	pub fn where_less_or_equal(&self, path: &str, value: impl Into<Value>) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::less_or_equal(path, value)?))
	}

	pub fn where_null_safe_equals(&self, path: &str, value: impl Into<Value>) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::null_safe_equals(path, value)?))
	}

	pub fn where_contains(&self, path: &str, needle: &str) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::contains(path, needle)?))
	}

	pub fn where_contains_ignore_case(&self, path: &str, needle: &str) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::contains_ignore_case(path, needle)?))
	}

	pub fn where_starts_with(&self, path: &str, needle: &str) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::starts_with(path, needle)?))
	}

	pub fn where_ends_with(&self, path: &str, needle: &str) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::ends_with(path, needle)?))
	}

	pub fn where_not_contains(&self, path: &str, needle: &str) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::not_contains(path, needle)?))
	}

	pub fn where_not_starts_with(&self, path: &str, needle: &str) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::not_starts_with(path, needle)?))
	}

	pub fn where_not_ends_with(&self, path: &str, needle: &str) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::not_ends_with(path, needle)?))
	}

	pub fn where_in<I, V>(&self, path: &str, values: I) -> Result<Self>
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		Ok(self.filter(PredicateBuilder::is_in(path, values)?))
	}

	pub fn where_between(
		&self,
		path: &str,
		min: impl Into<Value>,
		max: impl Into<Value>,
	) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::between(path, min, max)?))
	}

	pub fn where_not_null(&self, path: &str) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::not_null(path)?))
	}

	pub fn where_absolute_less_than(&self, path: &str, threshold: impl Into<Value>) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::absolute_less_than(path, threshold)?))
	}

	pub fn where_substring_equals(
		&self,
		path: &str,
		start: usize,
		length: usize,
		expected: &str,
	) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::substring_equals(path, start, length, expected)?))
	}

	pub fn where_vector_distance_less_than(
		&self,
		path: &str,
		query: &[f32],
		threshold: f32,
	) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::vector_distance_less_than(path, query, threshold)?))
	}

	pub fn where_date_equals(&self, path: &str, date: Date) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::date_equals(path, date)?))
	}

	pub fn where_any_equals(&self, path: &str, value: impl Into<Value>) -> Result<Self> {
		Ok(self.filter(PredicateBuilder::any_equals(path, value)?))
	}

	/// Keeps live records only. A no-op when `T` carries none of the configured flag fields.
	pub fn where_live(&self, guard: &SoftDelete) -> Result<Self> {
		Ok(match PredicateBuilder::live(guard)? {
			Some(predicate) => self.filter(predicate),
			None => self.clone(),
		})
	}

	pub fn order_by(&self, path: &str, descending: bool) -> Result<Self> {
		let key =
			SortKey::by_field(path, Direction::from_descending(descending), SortStage::Primary)?;

		Ok(self.ordered_by(key))
	}

	pub fn then_by(&self, path: &str, descending: bool) -> Result<Self> {
		self.require_ordered("then_by")?;

		let key = SortKey::by_field(path, Direction::from_descending(descending), SortStage::ThenBy)?;

		Ok(self.refined_by(key))
	}

	/// Orders by cosine similarity to `query`. Descending puts the most similar records first.
	pub fn order_by_vector_similarity(
		&self,
		path: &str,
		query: &[f32],
		descending: bool,
	) -> Result<Self> {
		let key = SortKey::by_vector_similarity(
			path,
			query,
			Direction::from_descending(descending),
			SortStage::Primary,
		)?;

		Ok(self.ordered_by(key))
	}

	pub fn then_by_vector_similarity(
		&self,
		path: &str,
		query: &[f32],
		descending: bool,
	) -> Result<Self> {
		self.require_ordered("then_by_vector_similarity")?;

		let key = SortKey::by_vector_similarity(
			path,
			query,
			Direction::from_descending(descending),
			SortStage::ThenBy,
		)?;

		Ok(self.refined_by(key))
	}

	/// Skips then takes. Paginating ends the active ordering chain.
	pub fn paginate(&self, skip: usize, take: usize) -> Self {
		self.with_source(self.source.clone().skip(skip).take(take), false)
	}

	/// The composed source, ready for a caller that wants to run it directly.
	pub fn build(&self) -> S {
		self.source.clone()
	}

	pub fn into_source(self) -> S {
		self.source
	}

	pub fn materialize(&self) -> Result<Vec<T>> {
		let items = self.source.materialize()?;

		tracing::debug!(record = T::shape().name(), items = items.len(), "Materialized query.");

		Ok(items)
	}

	pub fn count(&self) -> Result<usize> {
		self.source.count()
	}

	pub fn any(&self) -> Result<bool> {
		self.source.any()
	}

	/// Sums a numeric leaf, skipping nulls. Uses the source's native sum when it has one.
	pub fn sum<R>(&self, path: &str) -> Result<R>
	where
		R: Numeric,
	{
		let path = aggregate::numeric_path::<T, R>(path)?;

		if let Some(total) = self.source.sum::<R>(&path) {
			return total;
		}

		tracing::debug!(path = %path, "Source has no native sum; folding in memory.");

		let items = self.materialize()?;

		Ok(aggregate::sum::<T, R, _>(&items, &path)?)
	}

	pub fn average<R>(&self, path: &str) -> Result<Option<R>>
	where
		R: Numeric,
	{
		let path = aggregate::numeric_path::<T, R>(path)?;

		if let Some(mean) = self.source.average::<R>(&path) {
			return mean;
		}

		tracing::debug!(path = %path, "Source has no native average; folding in memory.");

		let items = self.materialize()?;

		Ok(aggregate::average::<T, R, _>(&items, &path)?)
	}

	/// Groups by a keyable leaf, natively when the source supports it.
	pub fn group_by(&self, path: &str) -> Result<Vec<Group<T>>> {
		let path = aggregate::keyable_path::<T>(path)?;

		if let Some(groups) = self.source.group_by(&path) {
			return groups;
		}

		tracing::debug!(path = %path, "Source has no native grouping; grouping in memory.");

		Ok(aggregate::group_in_memory(self.materialize()?, &path))
	}

	/// First record per key, in upstream order.
	pub fn distinct_by(&self, path: &str) -> Result<Vec<T>> {
		let path = aggregate::keyable_path::<T>(path)?;

		Ok(aggregate::distinct_first(self.materialize()?, &path))
	}

	pub fn select_fields<P>(&self, paths: &[P]) -> Result<Vec<Projection>>
	where
		P: AsRef<str>,
	{
		Ok(projection::project_all(&self.materialize()?, paths))
	}

	pub fn to_hybrid_ranking<F>(
		&self,
		text_score: F,
		vector_path: &str,
		query: &[f32],
		weights: HybridWeights,
	) -> Result<Vec<T>>
	where
		F: Fn(&T) -> f32,
	{
		let vector_path = vector_path_of::<T>(vector_path)?;

		Ok(ranking::hybrid_rank(self.materialize()?, text_score, &vector_path, query, weights))
	}

	pub fn order_by_score<F>(&self, score: F, descending: bool) -> Result<Vec<T>>
	where
		F: Fn(&T) -> f32,
	{
		Ok(ranking::rank_by_score(self.materialize()?, score, descending))
	}

	/// Keeps records whose key is among `matching` and orders them by an external engine's
	/// scores, highest first. Keys missing from `scores` count as `0.0`.
	pub fn external_full_text_search<I, V>(
		&self,
		key_path: &str,
		matching: I,
		scores: &HashMap<Key, f32>,
	) -> Result<Vec<T>>
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		let key_path = aggregate::keyable_path::<T>(key_path)?;
		let matching = matching.into_iter().map(Key::of).collect::<HashSet<_>>();

		Ok(ranking::rank_by_external_scores(self.materialize()?, &key_path, &matching, scores))
	}

	fn with_source(&self, source: S, ordered: bool) -> Self {
		Self { source, ordered, _record: PhantomData }
	}

	fn ordered_by(&self, key: SortKey<T>) -> Self {
		tracing::debug!(record = T::shape().name(), key = %key, "Applying primary ordering.");

		self.with_source(self.source.clone().order_by(key), true)
	}

	fn refined_by(&self, key: SortKey<T>) -> Self {
		tracing::debug!(record = T::shape().name(), key = %key, "Refining ordering.");

		self.with_source(self.source.clone().then_by(key), true)
	}

	fn require_ordered(&self, method: &'static str) -> Result<()> {
		if self.ordered { Ok(()) } else { Err(Error::OrderingState { method }) }
	}
}
impl<T, S> QueryEngine<T, S>
where
	T: Record,
	S: AsyncQuerySource<T>,
{
	/// Materializes without blocking. Resolves to [`Error::Cancelled`] if `cancel` completes
	/// first.
	pub async fn materialize_async<C>(&self, cancel: C) -> Result<Vec<T>>
	where
		C: Future<Output = ()>,
	{
		let items = tokio::select! {
			biased;
			_ = cancel => {
				tracing::debug!(record = T::shape().name(), "Materialization cancelled.");

				return Err(Error::Cancelled);
			},
			result = self.source.materialize_async() => result?,
		};

		tracing::debug!(record = T::shape().name(), items = items.len(), "Materialized query.");

		Ok(items)
	}

	pub async fn count_async<C>(&self, cancel: C) -> Result<usize>
	where
		C: Future<Output = ()>,
	{
		Ok(self.materialize_async(cancel).await?.len())
	}

	pub async fn any_async<C>(&self, cancel: C) -> Result<bool>
	where
		C: Future<Output = ()>,
	{
		let first = self.with_source(self.source.clone().take(1), false);

		Ok(!first.materialize_async(cancel).await?.is_empty())
	}

	/// Folds the asynchronously materialized records. Native sums are synchronous and are not
	/// consulted here.
	pub async fn sum_async<R, C>(&self, path: &str, cancel: C) -> Result<R>
	where
		R: Numeric,
		C: Future<Output = ()>,
	{
		let path = aggregate::numeric_path::<T, R>(path)?;
		let items = self.materialize_async(cancel).await?;

		Ok(aggregate::sum::<T, R, _>(&items, &path)?)
	}

	pub async fn average_async<R, C>(&self, path: &str, cancel: C) -> Result<Option<R>>
	where
		R: Numeric,
		C: Future<Output = ()>,
	{
		let path = aggregate::numeric_path::<T, R>(path)?;
		let items = self.materialize_async(cancel).await?;

		Ok(aggregate::average::<T, R, _>(&items, &path)?)
	}

	/// Groups the asynchronously materialized records in memory.
	pub async fn group_by_async<C>(&self, path: &str, cancel: C) -> Result<Vec<Group<T>>>
	where
		C: Future<Output = ()>,
	{
		let path = aggregate::keyable_path::<T>(path)?;
		let items = self.materialize_async(cancel).await?;

		Ok(aggregate::group_in_memory(items, &path))
	}

	pub async fn to_hybrid_ranking_async<F, C>(
		&self,
		text_score: F,
		vector_path: &str,
		query: &[f32],
		weights: HybridWeights,
		cancel: C,
	) -> Result<Vec<T>>
	where
		F: Fn(&T) -> f32,
		C: Future<Output = ()>,
	{
		let vector_path = vector_path_of::<T>(vector_path)?;
		let items = self.materialize_async(cancel).await?;

		Ok(ranking::hybrid_rank(items, text_score, &vector_path, query, weights))
	}

	pub async fn order_by_score_async<F, C>(
		&self,
		score: F,
		descending: bool,
		cancel: C,
	) -> Result<Vec<T>>
	where
		F: Fn(&T) -> f32,
		C: Future<Output = ()>,
	{
		let items = self.materialize_async(cancel).await?;

		Ok(ranking::rank_by_score(items, score, descending))
	}

	pub async fn distinct_by_async<C>(&self, path: &str, cancel: C) -> Result<Vec<T>>
	where
		C: Future<Output = ()>,
	{
		let path = aggregate::keyable_path::<T>(path)?;
		let items = self.materialize_async(cancel).await?;

		Ok(aggregate::distinct_first(items, &path))
	}

	pub async fn select_fields_async<P, C>(&self, paths: &[P], cancel: C) -> Result<Vec<Projection>>
	where
		P: AsRef<str>,
		C: Future<Output = ()>,
	{
		let items = self.materialize_async(cancel).await?;

		Ok(projection::project_all(&items, paths))
	}
}
impl<T, S> Clone for QueryEngine<T, S>
where
	S: Clone,
{
	fn clone(&self) -> Self {
		Self { source: self.source.clone(), ordered: self.ordered, _record: PhantomData }
	}
}

fn vector_path_of<T>(path: &str) -> Result<FieldPath<T>>
where
	T: Record,
{
	let path = path::resolve::<T>(path)?;

	if path.leaf() != &ValueKind::Vector {
		return Err(ResolutionError::NotVector {
			path: path.to_string(),
			kind: path.leaf().to_string(),
		}
		.into());
	}

	Ok(path)
}
