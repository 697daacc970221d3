pub mod catalog;

mod timestamp;

use std::{
	future::{self, Future},
	io::{self, Write},
	path::PathBuf,
	time::Duration,
};

use clap::Parser;
use serde::Serialize;
use tokio::time;

use quarry_cli::Embedding;
use quarry_config::Config;
use quarry_engine::{
	HybridWeights, MemorySource, PredicateBuilder, QueryEngine, Result, Value, aggregate,
	projection::{Projection, Projector},
};

use crate::catalog::Product;

type CatalogEngine = QueryEngine<Product, MemorySource<Product>>;

#[derive(Debug, Parser)]
#[command(
	version = quarry_cli::VERSION,
	rename_all = "kebab",
	styles = quarry_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, value_name = "FILE")]
	pub catalog: PathBuf,
	#[command(flatten)]
	pub search: SearchArgs,
	/// Print one summary line per group instead of ranked products.
	#[arg(long, value_name = "PATH")]
	pub group_by: Option<String>,
	/// Abandon the search if loading results takes longer than this.
	#[arg(long, value_name = "MS")]
	pub deadline_ms: Option<u64>,
}

#[derive(Clone, Debug, clap::Args)]
pub struct SearchArgs {
	#[arg(long, short = 'q')]
	pub query: Option<String>,
	#[arg(long, value_name = "F32,...")]
	pub vector: Option<Embedding>,
	/// Matches the product category or its parent.
	#[arg(long)]
	pub category: Option<String>,
	#[arg(long, value_name = "PRICE")]
	pub min_price: Option<f64>,
	#[arg(long, value_name = "PRICE")]
	pub max_price: Option<f64>,
	/// Drop inactive and archived products.
	#[arg(long)]
	pub live: bool,
	#[arg(long, value_name = "N", default_value_t = 10)]
	pub top_k: usize,
	#[arg(long, value_delimiter = ',', default_value = "Sku,Name,Price,Category.Name")]
	pub fields: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupSummary {
	pub key: Value,
	pub count: usize,
	pub average_price: Option<f64>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = quarry_config::load(&args.config)?;

	quarry_cli::init_tracing(&config.service.log_level);

	let products = catalog::load(&args.catalog)?;

	if let Some(path) = &args.group_by {
		let summaries = summarize(&config, products, &args.search, path)?;

		return print_lines(&summaries);
	}

	let deadline = args.deadline_ms.map(Duration::from_millis);
	let cancel = async move {
		match deadline {
			Some(deadline) => time::sleep(deadline).await,
			None => future::pending().await,
		}
	};
	let rows = search(&config, products, &args.search, cancel).await?;

	print_lines(&rows)
}

/// Filters, ranks and projects the catalog.
///
/// With a query vector the ranking is hybrid, using the configured weights. With only a text
/// query, products are ordered by text score and non-matching ones dropped. With neither, the
/// cheapest products come first.
pub async fn search<C>(
	config: &Config,
	products: Vec<Product>,
	search: &SearchArgs,
	cancel: C,
) -> Result<Vec<Projection>>
where
	C: Future<Output = ()>,
{
	let engine = narrow(config, QueryEngine::new(MemorySource::from(products)), search)?;
	let query = search.query.as_deref().unwrap_or_default();
	let ranked = match &search.vector {
		Some(Embedding(vector)) =>
			engine
				.to_hybrid_ranking_async(
					|product| product.text_score(query),
					"Embedding",
					vector,
					HybridWeights::from(&config.ranking),
					cancel,
				)
				.await?,
		None if !query.trim().is_empty() => {
			let mut ranked = engine
				.order_by_score_async(|product| product.text_score(query), true, cancel)
				.await?;

			ranked.retain(|product| product.text_score(query) > 0.0);

			ranked
		},
		None =>
			engine
				.order_by("Price", false)?
				.then_by("Name", false)?
				.paginate(0, search.top_k)
				.materialize_async(cancel)
				.await?,
	};

	tracing::info!(matched = ranked.len(), top_k = search.top_k, "Catalog search finished.");

	let projector = Projector::<Product>::new(&search.fields);

	Ok(ranked.iter().take(search.top_k).map(|product| projector.project(product)).collect())
}

/// Groups the filtered catalog by `path` and reports each group's size and mean price.
pub fn summarize(
	config: &Config,
	products: Vec<Product>,
	search: &SearchArgs,
	path: &str,
) -> Result<Vec<GroupSummary>> {
	let engine = narrow(config, QueryEngine::new(MemorySource::from(products)), search)?;
	let price = aggregate::numeric_path::<Product, f64>("Price")?;

	engine
		.group_by(path)?
		.into_iter()
		.map(|group| -> Result<GroupSummary> {
			Ok(GroupSummary {
				key: group.key.to_value(),
				count: group.items.len(),
				average_price: aggregate::average::<Product, f64, _>(&group.items, &price)?,
			})
		})
		.collect()
}

fn narrow(config: &Config, mut engine: CatalogEngine, search: &SearchArgs) -> Result<CatalogEngine> {
	if search.live {
		engine = engine.where_live(&config.soft_delete)?;
	}
	if let Some(category) = &search.category {
		let direct = PredicateBuilder::equals("Category.Name", category.as_str())?;
		let parent = PredicateBuilder::equals("Category.Parent.Name", category.as_str())?;

		engine = engine.filter(direct.or(parent));
	}

	Ok(match (search.min_price, search.max_price) {
		(Some(min), Some(max)) => engine.where_between("Price", min, max)?,
		(Some(min), None) => engine.where_greater_or_equal("Price", min)?,
		(None, Some(max)) => engine.where_less_or_equal("Price", max)?,
		(None, None) => engine,
	})
}

fn print_lines<T>(rows: &[T]) -> color_eyre::Result<()>
where
	T: Serialize,
{
	let mut out = io::stdout().lock();

	for row in rows {
		serde_json::to_writer(&mut out, row)?;
		writeln!(out)?;
	}

	Ok(())
}
