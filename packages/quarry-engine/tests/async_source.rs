use std::{future, time::Duration};

use tokio::time;

use quarry_engine::{Error, HybridWeights, QueryEngine};
use quarry_testkit::{DelayedSource, Person};

fn delayed(delay: Duration) -> QueryEngine<Person, DelayedSource<Person>> {
	QueryEngine::new(quarry_testkit::people_source(delay))
}

fn names(people: &[Person]) -> Vec<&str> {
	people.iter().map(|person| person.name.as_str()).collect()
}

#[tokio::test]
async fn materializes_when_never_cancelled() {
	let items = delayed(Duration::from_millis(5))
		.where_greater_than("Age", 30)
		.expect("filter")
		.materialize_async(future::pending())
		.await
		.expect("materialize");

	assert_eq!(names(&items), vec!["Ada", "Eli"]);
}

#[tokio::test]
async fn ready_cancellation_wins() {
	let result = delayed(Duration::ZERO).materialize_async(future::ready(())).await;

	assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn cancellation_interrupts_a_slow_source() {
	let result = delayed(Duration::from_secs(30))
		.materialize_async(time::sleep(Duration::from_millis(10)))
		.await;

	assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn source_failures_propagate() {
	let engine = QueryEngine::new(
		DelayedSource::new(quarry_testkit::people(), Duration::ZERO).failing("store offline"),
	);
	let result = engine.materialize_async(future::pending()).await;

	assert!(matches!(result, Err(Error::Source { ref message }) if message == "store offline"));
	assert!(matches!(engine.group_by("Age"), Err(Error::Source { .. })));
}

#[tokio::test]
async fn async_terminals_match_their_sync_counterparts() {
	let engine = delayed(Duration::from_millis(1));
	let query = [0.0, 1.0, 0.0];
	let ranked = engine
		.to_hybrid_ranking_async(
			|_| 0.0,
			"Embedding",
			&query,
			HybridWeights::default(),
			future::pending(),
		)
		.await
		.expect("ranking");

	assert_eq!(
		ranked,
		engine
			.to_hybrid_ranking(|_| 0.0, "Embedding", &query, HybridWeights::default())
			.expect("ranking")
	);
	assert_eq!(names(&ranked[..2]), vec!["Chen", "Eli"]);

	let by_balance = engine
		.order_by_score_async(|person| person.balance as f32, false, future::pending())
		.await
		.expect("ranking");

	assert_eq!(by_balance.first().map(|person| person.name.as_str()), Some("Brian"));

	let distinct = engine
		.distinct_by_async("Address.City.Name", future::pending())
		.await
		.expect("distinct");

	assert_eq!(names(&distinct), vec!["Ada", "Brian", "Chen", "Eli"]);

	let rows = engine.select_fields_async(&["Name"], future::pending()).await.expect("projection");

	assert_eq!(rows.len(), 6);
}

#[tokio::test]
async fn async_aggregates_fold_the_materialized_records() {
	let engine = delayed(Duration::from_millis(1));

	assert_eq!(engine.count_async(future::pending()).await.expect("count"), 6);
	assert!(
		engine
			.where_greater_than("Age", 35)
			.expect("filter")
			.any_async(future::pending())
			.await
			.expect("any")
	);
	assert_eq!(engine.sum_async::<i64, _>("Age", future::pending()).await.expect("sum"), 150);
	assert_eq!(
		engine.average_async::<f64, _>("Age", future::pending()).await.expect("average"),
		Some(25.0)
	);

	let groups = engine
		.group_by_async("Address.City.Name", future::pending())
		.await
		.expect("grouping");

	assert_eq!(groups, engine.group_by("Address.City.Name").expect("grouping"));
	assert_eq!(groups.len(), 4);
}

#[tokio::test]
async fn async_aggregates_honor_cancellation() {
	let engine = delayed(Duration::from_secs(30));

	assert!(matches!(engine.count_async(future::ready(())).await, Err(Error::Cancelled)));
	assert!(matches!(
		engine.sum_async::<i64, _>("Age", time::sleep(Duration::from_millis(10))).await,
		Err(Error::Cancelled)
	));
	assert!(matches!(
		engine.group_by_async("Address.City.Name", future::ready(())).await,
		Err(Error::Cancelled)
	));
}
