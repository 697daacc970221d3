use std::{
	fmt::{Debug, Display, Formatter},
	sync::Arc,
};

use crate::{
	error::ResolutionError,
	shape::{Reader, Record, Renderer, Resolved, Slot},
	value::{Value, ValueKind},
};

/// One resolved segment of a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hop {
	pub name: &'static str,
	/// Name of the record type that owns this field.
	pub host: &'static str,
	pub nullable: bool,
	pub kind: ValueKind,
}

/// A path validated against the shape of `T`, with a composed accessor.
pub struct FieldPath<T> {
	path: String,
	hops: Arc<[Hop]>,
	read: Reader<T>,
	project: Renderer<T>,
}
impl<T> FieldPath<T> {
	pub(crate) fn new(resolved: Resolved<T>) -> Self {
		let path = resolved.hops.iter().map(|hop| hop.name).collect::<Vec<_>>().join(".");

		Self { path, hops: resolved.hops.into(), read: resolved.read, project: resolved.project }
	}

	/// Canonical form of the path, using the registered field names.
	pub fn as_str(&self) -> &str {
		&self.path
	}

	pub fn hops(&self) -> &[Hop] {
		&self.hops
	}

	pub fn leaf(&self) -> &ValueKind {
		// Resolution never yields an empty hop list.
		&self.hops[self.hops.len() - 1].kind
	}

	pub fn is_multi_hop(&self) -> bool {
		self.hops.len() > 1
	}

	/// Canonical prefixes ending on each intermediate hop, shortest first.
	pub fn intermediate_prefixes(&self) -> Vec<String> {
		(1..self.hops.len())
			.map(|depth| {
				self.hops[..depth].iter().map(|hop| hop.name).collect::<Vec<_>>().join(".")
			})
			.collect()
	}

	/// Reads the leaf as a plain value. Absent hops read as null and records render as maps.
	pub fn get(&self, item: &T) -> Value {
		(self.project)(item)
	}

	pub(crate) fn read(&self, item: &T) -> Slot {
		(self.read)(item)
	}

	pub(crate) fn prefix_through(&self, hop: usize) -> String {
		self.hops[..=hop.min(self.hops.len() - 1)]
			.iter()
			.map(|hop| hop.name)
			.collect::<Vec<_>>()
			.join(".")
	}
}
impl<T> Clone for FieldPath<T> {
	fn clone(&self) -> Self {
		Self {
			path: self.path.clone(),
			hops: self.hops.clone(),
			read: self.read.clone(),
			project: self.project.clone(),
		}
	}
}
impl<T> PartialEq for FieldPath<T> {
	fn eq(&self, other: &Self) -> bool {
		self.path == other.path && self.hops == other.hops
	}
}
impl<T> Debug for FieldPath<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FieldPath").field("path", &self.path).field("leaf", self.leaf()).finish()
	}
}
impl<T> Display for FieldPath<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.path)
	}
}

/// Resolves `path` against the registered shape of `T`.
pub fn resolve<T>(path: &str) -> Result<FieldPath<T>, ResolutionError>
where
	T: Record,
{
	T::shape().resolve(path)
}

#[cfg(test)]
mod tests {
	use std::sync::OnceLock;

	use crate::{
		path::{self, FieldPath},
		shape::{Record, Shape},
		value::{Value, ValueKind},
	};

	struct Inner {
		code: Option<String>,
	}
	impl Record for Inner {
		fn shape() -> &'static Shape<Self> {
			static SHAPE: OnceLock<Shape<Inner>> = OnceLock::new();

			SHAPE.get_or_init(|| {
				Shape::builder("Inner")
					.optional_field("Code", ValueKind::Text, |inner: &Inner| {
						Value::from(inner.code.clone())
					})
					.build()
			})
		}
	}

	struct Outer {
		inner: Option<Inner>,
	}
	impl Record for Outer {
		fn shape() -> &'static Shape<Self> {
			static SHAPE: OnceLock<Shape<Outer>> = OnceLock::new();

			SHAPE.get_or_init(|| {
				Shape::builder("Outer")
					.optional_record("Inner", |outer: &Outer| outer.inner.as_ref())
					.build()
			})
		}
	}

	#[test]
	fn canonical_path_and_prefixes() {
		let path: FieldPath<Outer> = path::resolve("inner.code").expect("path must resolve");

		assert_eq!(path.to_string(), "Inner.Code");
		assert!(path.is_multi_hop());
		assert_eq!(path.intermediate_prefixes(), vec!["Inner".to_string()]);
		assert_eq!(path.prefix_through(0), "Inner");
		assert_eq!(path.hops()[0].kind, ValueKind::Record("Inner"));
		assert_eq!(path.hops()[1].host, "Inner");
	}

	#[test]
	fn paths_compare_by_canonical_form() {
		let lower: FieldPath<Outer> = path::resolve("inner.code").expect("path must resolve");
		let upper: FieldPath<Outer> = path::resolve("INNER.CODE").expect("path must resolve");

		assert_eq!(lower, upper);
	}

	#[test]
	fn get_reads_through_present_hops_only() {
		let path: FieldPath<Outer> = path::resolve("Inner.Code").expect("path must resolve");
		let present = Outer { inner: Some(Inner { code: Some("x1".to_string()) }) };
		let absent = Outer { inner: None };

		assert_eq!(path.get(&present), Value::from("x1"));
		assert_eq!(path.get(&absent), Value::Null);
	}
}
