use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{path::FieldPath, shape::Record, value::Value};

/// One projected row, keyed by the requested path strings in request order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
	fields: Vec<(String, Value)>,
}
impl Projection {
	pub fn get(&self, path: &str) -> Option<&Value> {
		self.fields.iter().find(|(name, _)| name == path).map(|(_, value)| value)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.fields.iter().map(|(name, value)| (name.as_str(), value))
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}
impl Serialize for Projection {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.fields.len()))?;

		for (name, value) in &self.fields {
			map.serialize_entry(name, value)?;
		}

		map.end()
	}
}

/// Resolved column set for projecting many records.
pub struct Projector<T> {
	columns: Vec<(String, Option<FieldPath<T>>)>,
}
impl<T> Projector<T>
where
	T: Record,
{
	/// Paths that do not resolve are kept as columns that always read null.
	pub fn new<S>(paths: &[S]) -> Self
	where
		S: AsRef<str>,
	{
		let shape = T::shape();
		let columns = paths
			.iter()
			.map(|path| {
				let path = path.as_ref();
				let resolved = shape.resolve_lenient(path);

				if resolved.is_none() {
					tracing::warn!(record = shape.name(), path, "Projection path does not resolve.");
				}

				(path.to_string(), resolved)
			})
			.collect();

		Self { columns }
	}

	pub fn project(&self, item: &T) -> Projection {
		let fields = self
			.columns
			.iter()
			.map(|(name, path)| {
				let value = path.as_ref().map_or(Value::Null, |path| path.get(item));

				(name.clone(), value)
			})
			.collect();

		Projection { fields }
	}
}

pub fn project_all<T, S>(items: &[T], paths: &[S]) -> Vec<Projection>
where
	T: Record,
	S: AsRef<str>,
{
	let projector = Projector::<T>::new(paths);

	items.iter().map(|item| projector.project(item)).collect()
}

#[cfg(test)]
mod tests {
	use std::sync::OnceLock;

	use crate::{
		projection,
		shape::{Record, Shape},
		value::{Value, ValueKind},
	};

	struct Owner {
		name: String,
	}
	impl Record for Owner {
		fn shape() -> &'static Shape<Self> {
			static SHAPE: OnceLock<Shape<Owner>> = OnceLock::new();

			SHAPE.get_or_init(|| {
				Shape::builder("Owner")
					.field("Name", ValueKind::Text, |owner: &Owner| Value::from(&owner.name))
					.build()
			})
		}
	}

	struct Pet {
		name: String,
		owner: Option<Owner>,
	}
	impl Record for Pet {
		fn shape() -> &'static Shape<Self> {
			static SHAPE: OnceLock<Shape<Pet>> = OnceLock::new();

			SHAPE.get_or_init(|| {
				Shape::builder("Pet")
					.field("Name", ValueKind::Text, |pet: &Pet| Value::from(&pet.name))
					.optional_record("Owner", |pet: &Pet| pet.owner.as_ref())
					.build()
			})
		}
	}

	#[test]
	fn projects_in_request_order_with_nulls_for_gaps() {
		let pets = [
			Pet { name: "Rex".to_string(), owner: Some(Owner { name: "Ana".to_string() }) },
			Pet { name: "Tom".to_string(), owner: None },
		];
		let rows = projection::project_all(&pets, &["Owner.Name", "name", "Owner", "Color"]);
		let json = serde_json::to_value(&rows).expect("serialize");

		assert_eq!(
			json,
			serde_json::json!([
				{ "Owner.Name": "Ana", "name": "Rex", "Owner": { "Name": "Ana" }, "Color": null },
				{ "Owner.Name": null, "name": "Tom", "Owner": null, "Color": null }
			])
		);
		assert_eq!(rows[1].get("name"), Some(&Value::from("Tom")));
		assert_eq!(rows[0].len(), 4);
	}
}
