//! Schema-agnostic filtering, ordering, grouping and hybrid ranking over typed records.
//!
//! Records describe their fields once through a [`Shape`]; queries then address fields by
//! dot-separated paths such as `Address.City.Name`, validated when the query is built.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod ordering;
pub mod path;
pub mod predicate;
pub mod projection;
pub mod ranking;
pub mod shape;
pub mod source;
pub mod value;
pub mod vector;

pub use aggregate::{Group, Numeric};
pub use engine::QueryEngine;
pub use error::{ConversionError, Error, EvaluationError, ResolutionError, Result};
pub use ordering::{Direction, SortKey, SortStage};
pub use path::{FieldPath, Hop};
pub use predicate::{CompareOp, Operand, Predicate, PredicateBuilder, TextOp};
pub use projection::Projection;
pub use ranking::HybridWeights;
pub use shape::{Record, Shape, ShapeBuilder};
pub use source::{AsyncQuerySource, BoxFuture, MemorySource, QuerySource};
pub use value::{Key, Value, ValueKind};
pub use vector::{MAX_DISTANCE, cosine_distance, cosine_similarity};
