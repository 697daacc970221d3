use std::sync::OnceLock;

use time::{Duration, OffsetDateTime, macros::datetime};
use uuid::Uuid;

use quarry_engine::{Record, Shape, Value, ValueKind};

const EPOCH: OffsetDateTime = datetime!(2024-01-01 00:00:00 UTC);

#[derive(Clone, Debug, PartialEq)]
pub struct City {
	pub name: String,
	pub country: Option<String>,
}
impl Record for City {
	fn shape() -> &'static Shape<Self> {
		static SHAPE: OnceLock<Shape<City>> = OnceLock::new();

		SHAPE.get_or_init(|| {
			Shape::builder("City")
				.field("Name", ValueKind::Text, |city: &City| Value::from(&city.name))
				.optional_field("Country", ValueKind::Text, |city: &City| {
					Value::from(city.country.as_ref())
				})
				.build()
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Address {
	pub street: String,
	pub city: Option<City>,
}
impl Record for Address {
	fn shape() -> &'static Shape<Self> {
		static SHAPE: OnceLock<Shape<Address>> = OnceLock::new();

		SHAPE.get_or_init(|| {
			Shape::builder("Address")
				.field("Street", ValueKind::Text, |address: &Address| Value::from(&address.street))
				.optional_record("City", |address: &Address| address.city.as_ref())
				.build()
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Person {
	pub id: Uuid,
	pub name: String,
	pub age: i32,
	pub email: Option<String>,
	pub balance: f64,
	pub address: Option<Address>,
	pub tags: Vec<String>,
	pub embedding: Option<Vec<f32>>,
	pub joined_at: OffsetDateTime,
	pub is_active: bool,
	pub is_archived: bool,
}
impl Person {
	/// An active, unarchived person with no address, tags or embedding.
	pub fn new(seq: u32, name: &str, age: i32) -> Self {
		Self {
			id: Uuid::from_u128(seq.into()),
			name: name.to_string(),
			age,
			email: None,
			balance: 0.0,
			address: None,
			tags: Vec::new(),
			embedding: None,
			joined_at: EPOCH + Duration::days(seq.into()),
			is_active: true,
			is_archived: false,
		}
	}

	pub fn with_email(mut self, email: &str) -> Self {
		self.email = Some(email.to_string());

		self
	}

	pub fn with_balance(mut self, balance: f64) -> Self {
		self.balance = balance;

		self
	}

	/// Address on `street`, with a city only when `city` is given.
	pub fn with_address(mut self, street: &str, city: Option<(&str, Option<&str>)>) -> Self {
		self.address = Some(Address {
			street: street.to_string(),
			city: city.map(|(name, country)| City {
				name: name.to_string(),
				country: country.map(str::to_string),
			}),
		});

		self
	}

	pub fn with_tags(mut self, tags: &[&str]) -> Self {
		self.tags = tags.iter().map(|tag| tag.to_string()).collect();

		self
	}

	pub fn with_embedding(mut self, embedding: &[f32]) -> Self {
		self.embedding = Some(embedding.to_vec());

		self
	}

	pub fn joined_at(mut self, at: OffsetDateTime) -> Self {
		self.joined_at = at;

		self
	}

	pub fn inactive(mut self) -> Self {
		self.is_active = false;

		self
	}

	pub fn archived(mut self) -> Self {
		self.is_archived = true;

		self
	}
}
impl Record for Person {
	fn shape() -> &'static Shape<Self> {
		static SHAPE: OnceLock<Shape<Person>> = OnceLock::new();

		SHAPE.get_or_init(|| {
			Shape::builder("Person")
				.field("Id", ValueKind::Uuid, |person: &Person| Value::from(person.id))
				.field("Name", ValueKind::Text, |person: &Person| Value::from(&person.name))
				.field("Age", ValueKind::Int, |person: &Person| Value::from(person.age))
				.optional_field("Email", ValueKind::Text, |person: &Person| {
					Value::from(person.email.as_ref())
				})
				.field("Balance", ValueKind::Float, |person: &Person| Value::from(person.balance))
				.optional_record("Address", |person: &Person| person.address.as_ref())
				.field("Tags", ValueKind::List(Box::new(ValueKind::Text)), |person: &Person| {
					Value::from(person.tags.as_slice())
				})
				.optional_field("Embedding", ValueKind::Vector, |person: &Person| {
					Value::from(person.embedding.as_deref())
				})
				.field("JoinedAt", ValueKind::DateTime, |person: &Person| {
					Value::from(person.joined_at)
				})
				.field("IsActive", ValueKind::Bool, |person: &Person| Value::from(person.is_active))
				.field("IsArchived", ValueKind::Bool, |person: &Person| {
					Value::from(person.is_archived)
				})
				.build()
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Category {
	pub name: String,
	pub parent: Option<Box<Category>>,
}
impl Category {
	pub fn new(name: &str) -> Self {
		Self { name: name.to_string(), parent: None }
	}

	pub fn under(mut self, parent: Category) -> Self {
		self.parent = Some(Box::new(parent));

		self
	}
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

#[derive(Clone, Debug, PartialEq)]
pub struct Product {
	pub id: Uuid,
	pub code: i64,
	pub name: String,
	pub description: Option<String>,
	pub price: f64,
	pub stock: i64,
	pub category: Option<Category>,
	pub embedding: Option<Vec<f32>>,
	pub is_active: bool,
	pub created_at: OffsetDateTime,
}
impl Product {
	pub fn new(seq: u32, name: &str, price: f64) -> Self {
		Self {
			id: Uuid::from_u128(0x1000 + u128::from(seq)),
			code: i64::from(seq) * 100,
			name: name.to_string(),
			description: None,
			price,
			stock: 0,
			category: None,
			embedding: None,
			is_active: true,
			created_at: EPOCH + Duration::hours(seq.into()),
		}
	}

	pub fn with_description(mut self, description: &str) -> Self {
		self.description = Some(description.to_string());

		self
	}

	pub fn with_stock(mut self, stock: i64) -> Self {
		self.stock = stock;

		self
	}

	pub fn in_category(mut self, category: Category) -> Self {
		self.category = Some(category);

		self
	}

	pub fn with_embedding(mut self, embedding: &[f32]) -> Self {
		self.embedding = Some(embedding.to_vec());

		self
	}

	pub fn inactive(mut self) -> Self {
		self.is_active = false;

		self
	}
}
impl Record for Product {
	fn shape() -> &'static Shape<Self> {
		static SHAPE: OnceLock<Shape<Product>> = OnceLock::new();

		SHAPE.get_or_init(|| {
			Shape::builder("Product")
				.field("Id", ValueKind::Uuid, |product: &Product| Value::from(product.id))
				.field("Code", ValueKind::Int, |product: &Product| Value::from(product.code))
				.field("Name", ValueKind::Text, |product: &Product| Value::from(&product.name))
				.optional_field("Description", ValueKind::Text, |product: &Product| {
					Value::from(product.description.as_ref())
				})
				.field("Price", ValueKind::Float, |product: &Product| Value::from(product.price))
				.field("Stock", ValueKind::Int, |product: &Product| Value::from(product.stock))
				.optional_record("Category", |product: &Product| product.category.as_ref())
				.optional_field("Embedding", ValueKind::Vector, |product: &Product| {
					Value::from(product.embedding.as_deref())
				})
				.field("IsActive", ValueKind::Bool, |product: &Product| {
					Value::from(product.is_active)
				})
				.field("CreatedAt", ValueKind::DateTime, |product: &Product| {
					Value::from(product.created_at)
				})
				.build()
		})
	}
}

/// Six people covering every nullable hop of `Address.City.Country`.
pub fn people() -> Vec<Person> {
	vec![
		Person::new(1, "Ada", 36)
			.with_email("ada@example.com")
			.with_balance(120.5)
			.with_address("1 Analytical Way", Some(("London", Some("UK"))))
			.with_tags(&["math", "engines"])
			.with_embedding(&[1.0, 0.0, 0.0]),
		Person::new(2, "Brian", 17)
			.with_balance(-40.0)
			.with_address("9 Unix Rd", Some(("Toronto", None)))
			.with_tags(&["c"]),
		Person::new(3, "Chen", 18)
			.with_email("chen@example.com")
			.with_balance(15.25)
			.with_address("3 Harbor St", None)
			.with_embedding(&[0.0, 1.0, 0.0]),
		Person::new(4, "Dana", 30).with_balance(0.0).with_tags(&["ops", "math"]).archived(),
		Person::new(5, "Eli", 31)
			.with_email("eli@example.com")
			.with_balance(8.0)
			.with_address("5 Fjord Ln", Some(("Oslo", Some("NO"))))
			.with_embedding(&[0.7, 0.7, 0.0])
			.inactive(),
		Person::new(6, "Fay", 18)
			.with_balance(2.5)
			.with_address("6 Bay Ave", Some(("London", Some("UK"))))
			.with_embedding(&[1.0, 0.0]),
	]
}

/// Five products across a two-level category tree, one without a category.
pub fn products() -> Vec<Product> {
	let hardware = Category::new("Hardware");
	let keyboards = Category::new("Keyboards").under(hardware.clone());
	let books = Category::new("Books");

	vec![
		Product::new(1, "Mechanical keyboard", 129.0)
			.with_description("Tactile switches, aluminium frame")
			.with_stock(12)
			.in_category(keyboards.clone())
			.with_embedding(&[0.9, 0.1, 0.0]),
		Product::new(2, "Rust in Action", 39.5)
			.with_description("Systems programming with Rust")
			.with_stock(40)
			.in_category(books.clone())
			.with_embedding(&[0.0, 0.2, 0.9]),
		Product::new(3, "USB hub", 24.0)
			.with_stock(0)
			.in_category(hardware)
			.with_embedding(&[0.6, 0.6, 0.1])
			.inactive(),
		Product::new(4, "Gift card", 50.0).with_stock(500),
		Product::new(5, "Low-profile keyboard", 89.0)
			.with_description("Slim keyboard for travel")
			.with_stock(7)
			.in_category(keyboards)
			.with_embedding(&[0.8, 0.0, 0.2]),
	]
}
