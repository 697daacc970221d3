//! Per-type field registries.
//!
//! A [`Shape`] maps field names to typed accessors. Record-typed fields point at the nested
//! type's own shape, which is looked up lazily so recursive types (a category with a parent
//! category) register without cycles.

use std::sync::Arc;

use crate::{
	error::ResolutionError,
	path::{FieldPath, Hop},
	value::{Value, ValueKind},
};

pub(crate) type Reader<T> = Arc<dyn Fn(&T) -> Slot + Send + Sync>;
pub(crate) type Renderer<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

type ScalarRead<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
type NestedRead<T, U> = Arc<dyn Fn(&T) -> Option<&U> + Send + Sync>;

/// A type whose fields can be addressed by path.
pub trait Record: Sized + 'static {
	fn shape() -> &'static Shape<Self>;
}

/// What reading a path produced on one record.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Slot {
	Value(Value),
	/// A record-typed leaf that is present.
	Present,
	/// Hop `hop` (zero-based) was absent, so the rest of the path could not be read.
	Unreachable { hop: usize },
}

pub(crate) struct Resolved<T> {
	pub(crate) hops: Vec<Hop>,
	pub(crate) read: Reader<T>,
	pub(crate) project: Renderer<T>,
}

pub struct Shape<T> {
	name: &'static str,
	fields: Vec<FieldDef<T>>,
}
impl<T> Shape<T>
where
	T: 'static,
{
	pub fn builder(name: &'static str) -> ShapeBuilder<T> {
		ShapeBuilder { name, fields: Vec::new() }
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn has_field(&self, name: &str) -> bool {
		self.field(name).is_some()
	}

	pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.fields.iter().map(|field| field.name)
	}

	/// Resolves a dot-separated path against this shape. Segment lookup ignores ASCII case.
	pub fn resolve(&self, path: &str) -> Result<FieldPath<T>, ResolutionError> {
		let segments = path.split('.').collect::<Vec<_>>();

		if segments.iter().any(|segment| segment.is_empty()) {
			return Err(ResolutionError::EmptyPath { path: path.to_string() });
		}

		let resolved = self.resolve_segments(&segments)?;

		Ok(FieldPath::new(resolved))
	}

	/// Same as [`Shape::resolve`] but reports failure as `None`.
	pub fn resolve_lenient(&self, path: &str) -> Option<FieldPath<T>> {
		self.resolve(path).ok()
	}

	/// Renders every registered field of `item`, nested records included.
	pub fn project(&self, item: &T) -> Value {
		Value::Map(
			self.fields
				.iter()
				.map(|field| {
					let value = match &field.access {
						FieldAccess::Scalar { read, .. } => read(item),
						FieldAccess::Nested(nested) => nested.project(item),
					};

					(field.name.to_string(), value)
				})
				.collect(),
		)
	}

	pub(crate) fn resolve_segments(&self, segments: &[&str]) -> Result<Resolved<T>, ResolutionError> {
		let Some((first, rest)) = segments.split_first() else {
			return Err(ResolutionError::EmptyPath { path: String::new() });
		};
		let field = self.field(first).ok_or_else(|| ResolutionError::UnknownField {
			segment: first.to_string(),
			host: self.name.to_string(),
		})?;

		match &field.access {
			FieldAccess::Scalar { kind, read } => {
				if let Some(next) = rest.first() {
					return Err(ResolutionError::UnknownField {
						segment: next.to_string(),
						host: kind.to_string(),
					});
				}

				let hop = Hop {
					name: field.name,
					host: self.name,
					nullable: field.nullable,
					kind: kind.clone(),
				};
				let slot_read = read.clone();
				let project = read.clone();

				Ok(Resolved {
					hops: vec![hop],
					read: Arc::new(move |item: &T| Slot::Value(slot_read(item))),
					project,
				})
			},
			FieldAccess::Nested(nested) => nested.resolve(field.name, field.nullable, self.name, rest),
		}
	}

	fn field(&self, name: &str) -> Option<&FieldDef<T>> {
		self.fields.iter().find(|field| field.name.eq_ignore_ascii_case(name))
	}
}

pub struct ShapeBuilder<T> {
	name: &'static str,
	fields: Vec<FieldDef<T>>,
}
impl<T> ShapeBuilder<T>
where
	T: 'static,
{
	pub fn field<F>(self, name: &'static str, kind: ValueKind, read: F) -> Self
	where
		F: Fn(&T) -> Value + Send + Sync + 'static,
	{
		self.push_scalar(name, kind, false, read)
	}

	/// A scalar field whose reader may return [`Value::Null`].
	pub fn optional_field<F>(self, name: &'static str, kind: ValueKind, read: F) -> Self
	where
		F: Fn(&T) -> Value + Send + Sync + 'static,
	{
		self.push_scalar(name, kind, true, read)
	}

	pub fn record<U, F>(self, name: &'static str, read: F) -> Self
	where
		U: Record,
		F: Fn(&T) -> &U + Send + Sync + 'static,
	{
		let nested = Nested { read: nested_read(move |item: &T| Some(read(item))) };

		self.push_nested(name, false, nested)
	}

	pub fn optional_record<U, F>(self, name: &'static str, read: F) -> Self
	where
		U: Record,
		F: Fn(&T) -> Option<&U> + Send + Sync + 'static,
	{
		let nested = Nested { read: nested_read(read) };

		self.push_nested(name, true, nested)
	}

	pub fn build(self) -> Shape<T> {
		Shape { name: self.name, fields: self.fields }
	}

	fn push_scalar<F>(mut self, name: &'static str, kind: ValueKind, nullable: bool, read: F) -> Self
	where
		F: Fn(&T) -> Value + Send + Sync + 'static,
	{
		self.fields.push(FieldDef {
			name,
			nullable,
			access: FieldAccess::Scalar { kind, read: Arc::new(read) },
		});

		self
	}

	fn push_nested<U>(mut self, name: &'static str, nullable: bool, nested: Nested<T, U>) -> Self
	where
		U: Record,
	{
		self.fields.push(FieldDef { name, nullable, access: FieldAccess::Nested(Arc::new(nested)) });

		self
	}
}

fn nested_read<T, U, F>(read: F) -> NestedRead<T, U>
where
	F: Fn(&T) -> Option<&U> + Send + Sync + 'static,
{
	Arc::new(read)
}

struct FieldDef<T> {
	name: &'static str,
	nullable: bool,
	access: FieldAccess<T>,
}

enum FieldAccess<T> {
	Scalar { kind: ValueKind, read: ScalarRead<T> },
	Nested(Arc<dyn NestedAccess<T>>),
}

trait NestedAccess<T>: Send + Sync {
	fn resolve(
		&self,
		name: &'static str,
		nullable: bool,
		host: &'static str,
		rest: &[&str],
	) -> Result<Resolved<T>, ResolutionError>;

	fn project(&self, item: &T) -> Value;
}

struct Nested<T, U> {
	read: NestedRead<T, U>,
}
impl<T, U> NestedAccess<T> for Nested<T, U>
where
	T: 'static,
	U: Record,
{
	fn resolve(
		&self,
		name: &'static str,
		nullable: bool,
		host: &'static str,
		rest: &[&str],
	) -> Result<Resolved<T>, ResolutionError> {
		let shape = U::shape();
		let hop = Hop { name, host, nullable, kind: ValueKind::Record(shape.name) };
		let project_read = self.read.clone();
		let slot_read = self.read.clone();

		if rest.is_empty() {
			return Ok(Resolved {
				hops: vec![hop],
				read: Arc::new(move |item: &T| match slot_read(item) {
					Some(_) => Slot::Present,
					None => Slot::Value(Value::Null),
				}),
				project: Arc::new(move |item: &T| {
					project_read(item).map_or(Value::Null, |inner| U::shape().project(inner))
				}),
			});
		}

		let inner = shape.resolve_segments(rest)?;
		let inner_read = inner.read;
		let inner_project = inner.project;
		let mut hops = Vec::with_capacity(inner.hops.len() + 1);

		hops.push(hop);
		hops.extend(inner.hops);

		Ok(Resolved {
			hops,
			read: Arc::new(move |item: &T| match slot_read(item) {
				Some(inner) => match inner_read(inner) {
					Slot::Unreachable { hop } => Slot::Unreachable { hop: hop + 1 },
					slot => slot,
				},
				None => Slot::Unreachable { hop: 0 },
			}),
			project: Arc::new(move |item: &T| {
				project_read(item).map_or(Value::Null, |inner| inner_project(inner))
			}),
		})
	}

	fn project(&self, item: &T) -> Value {
		(self.read)(item).map_or(Value::Null, |inner| U::shape().project(inner))
	}
}

#[cfg(test)]
mod tests {
	use std::sync::OnceLock;

	use crate::{
		error::ResolutionError,
		shape::{Record, Shape, Slot},
		value::{Value, ValueKind},
	};

	struct Node {
		label: String,
		weight: Option<i64>,
		next: Option<Box<Node>>,
	}
	impl Record for Node {
		fn shape() -> &'static Shape<Self> {
			static SHAPE: OnceLock<Shape<Node>> = OnceLock::new();

			SHAPE.get_or_init(|| {
				Shape::builder("Node")
					.field("Label", ValueKind::Text, |node: &Node| Value::from(&node.label))
					.optional_field("Weight", ValueKind::Int, |node: &Node| Value::from(node.weight))
					.optional_record("Next", |node: &Node| node.next.as_deref())
					.build()
			})
		}
	}

	fn chain() -> Node {
		Node {
			label: "head".to_string(),
			weight: Some(3),
			next: Some(Box::new(Node { label: "tail".to_string(), weight: None, next: None })),
		}
	}

	#[test]
	fn resolves_recursive_paths_case_insensitively() {
		let path = Node::shape().resolve("next.LABEL").expect("path must resolve");

		assert_eq!(path.as_str(), "Next.Label");
		assert_eq!(path.leaf(), &ValueKind::Text);
		assert_eq!(path.read(&chain()), Slot::Value(Value::from("tail")));
	}

	#[test]
	fn absent_intermediate_hop_is_unreachable() {
		let path = Node::shape().resolve("Next.Next.Label").expect("path must resolve");

		assert_eq!(path.read(&chain()), Slot::Unreachable { hop: 1 });
		assert_eq!(path.get(&chain()), Value::Null);
	}

	#[test]
	fn record_leaf_reports_presence() {
		let path = Node::shape().resolve("Next").expect("path must resolve");
		let node = chain();

		assert_eq!(path.read(&node), Slot::Present);
		assert_eq!(
			path.read(node.next.as_deref().expect("tail exists")),
			Slot::Value(Value::Null)
		);
	}

	#[test]
	fn resolution_failures_name_the_offending_segment() {
		assert_eq!(
			Node::shape().resolve("Next.Color").err(),
			Some(ResolutionError::UnknownField {
				segment: "Color".to_string(),
				host: "Node".to_string()
			})
		);
		assert_eq!(
			Node::shape().resolve("Label.Length").err(),
			Some(ResolutionError::UnknownField {
				segment: "Length".to_string(),
				host: "text".to_string()
			})
		);
		assert_eq!(
			Node::shape().resolve("Next..Label").err(),
			Some(ResolutionError::EmptyPath { path: "Next..Label".to_string() })
		);
		assert!(Node::shape().resolve("").is_err());
		assert!(Node::shape().resolve_lenient("Missing").is_none());
	}

	#[test]
	fn projection_renders_nested_records() {
		let projected = Node::shape().project(&chain());
		let json = serde_json::to_value(&projected).expect("serialize");

		assert_eq!(
			json,
			serde_json::json!({
				"Label": "head",
				"Weight": 3,
				"Next": { "Label": "tail", "Weight": null, "Next": null }
			})
		);
	}
}
