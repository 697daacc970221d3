use std::{fs, path::Path, sync::OnceLock};

use color_eyre::eyre::WrapErr;
use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use quarry_engine::{Record, Shape, Value, ValueKind};

#[derive(Clone, Debug, Deserialize)]
pub struct Category {
	pub name: String,
	#[serde(default)]
	pub parent: Option<Box<Category>>,
}
impl Record for Category {
	fn shape() -> &'static Shape<Self> {
		static SHAPE: OnceLock<Shape<Category>> = OnceLock::new();

		SHAPE.get_or_init(|| {
			Shape::builder("Category")
				.field("Name", ValueKind::Text, |category: &Category| Value::from(&category.name))
				.optional_record("Parent", |category: &Category| category.parent.as_deref())
				.build()
		})
	}
}

/// One catalog entry as stored in the JSON catalog file.
#[derive(Clone, Debug, Deserialize)]
pub struct Product {
	pub id: Uuid,
	pub sku: String,
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	pub price: f64,
	#[serde(default)]
	pub stock: i64,
	#[serde(default)]
	pub category: Option<Category>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub embedding: Option<Vec<f32>>,
	#[serde(default = "default_true")]
	pub is_active: bool,
	#[serde(default)]
	pub is_archived: bool,
	#[serde(with = "crate::timestamp")]
	pub listed_at: OffsetDateTime,
}
impl Product {
	/// Fraction of whitespace-separated query terms found in the name, description or tags,
	/// ignoring case.
	pub fn text_score(&self, query: &str) -> f32 {
		let terms = query.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>();

		if terms.is_empty() {
			return 0.0;
		}

		let haystack = [self.name.as_str(), self.description.as_deref().unwrap_or_default()]
			.into_iter()
			.chain(self.tags.iter().map(String::as_str))
			.collect::<Vec<_>>()
			.join(" ")
			.to_lowercase();
		let hits = terms.iter().filter(|term| haystack.contains(term.as_str())).count();

		hits as f32 / terms.len() as f32
	}
}
impl Record for Product {
	fn shape() -> &'static Shape<Self> {
		static SHAPE: OnceLock<Shape<Product>> = OnceLock::new();

		SHAPE.get_or_init(|| {
			Shape::builder("Product")
				.field("Id", ValueKind::Uuid, |product: &Product| Value::from(product.id))
				.field("Sku", ValueKind::Text, |product: &Product| Value::from(&product.sku))
				.field("Name", ValueKind::Text, |product: &Product| Value::from(&product.name))
				.optional_field("Description", ValueKind::Text, |product: &Product| {
					Value::from(product.description.as_ref())
				})
				.field("Price", ValueKind::Float, |product: &Product| Value::from(product.price))
				.field("Stock", ValueKind::Int, |product: &Product| Value::from(product.stock))
				.optional_record("Category", |product: &Product| product.category.as_ref())
				.field("Tags", ValueKind::List(Box::new(ValueKind::Text)), |product: &Product| {
					Value::from(product.tags.as_slice())
				})
				.optional_field("Embedding", ValueKind::Vector, |product: &Product| {
					Value::from(product.embedding.as_deref())
				})
				.field("IsActive", ValueKind::Bool, |product: &Product| {
					Value::from(product.is_active)
				})
				.field("IsArchived", ValueKind::Bool, |product: &Product| {
					Value::from(product.is_archived)
				})
				.field("ListedAt", ValueKind::DateTime, |product: &Product| {
					Value::from(product.listed_at)
				})
				.build()
		})
	}
}

pub fn load(path: &Path) -> color_eyre::Result<Vec<Product>> {
	let raw = fs::read_to_string(path)
		.wrap_err_with(|| format!("Failed to read catalog at {}.", path.display()))?;
	let products: Vec<Product> = serde_json::from_str(&raw)
		.wrap_err_with(|| format!("Failed to parse catalog at {}.", path.display()))?;

	tracing::debug!(path = %path.display(), products = products.len(), "Loaded catalog.");

	Ok(products)
}

fn default_true() -> bool {
	true
}
