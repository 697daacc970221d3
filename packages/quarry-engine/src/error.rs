pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Resolution(#[from] ResolutionError),
	#[error(transparent)]
	Conversion(#[from] ConversionError),
	#[error(transparent)]
	Evaluation(#[from] EvaluationError),
	#[error("{method} requires a primary ordering; call order_by first.")]
	OrderingState { method: &'static str },
	#[error("Source error: {message}")]
	Source { message: String },
	#[error("Query was cancelled before materialization completed.")]
	Cancelled,
}

/// Raised while a query is being built, before the source sees it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
	#[error("Path '{path}' is empty or contains an empty segment.")]
	EmptyPath { path: String },
	#[error("Field '{segment}' does not exist on '{host}'.")]
	UnknownField { segment: String, host: String },
	#[error("Field '{path}' of type {kind} is not comparable.")]
	NotComparable { path: String, kind: String },
	#[error("Field '{path}' of type {kind} must be text for string operators.")]
	NotText { path: String, kind: String },
	#[error("Field '{path}' of type {kind} must be a vector for vector operators.")]
	NotVector { path: String, kind: String },
	#[error("Field '{path}' of type {kind} must be numeric.")]
	NotNumeric { path: String, kind: String },
	#[error("Field '{path}' of type {kind} must be a list.")]
	NotList { path: String, kind: String },
	#[error("Field '{path}' of type {kind} cannot be used as a grouping key.")]
	NotKeyable { path: String, kind: String },
	#[error("Field '{path}' of type {kind} must be a date or date-time.")]
	NotDateTime { path: String, kind: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot convert {found} to {expected} for field '{path}'.")]
pub struct ConversionError {
	pub path: String,
	pub expected: String,
	pub found: String,
}

/// Raised while a built predicate or aggregate runs against real records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
	#[error(
		"substring({start}, {length}) is out of range for field '{path}' holding {len} characters."
	)]
	SubstringOutOfRange { path: String, start: usize, length: usize, len: usize },
	#[error("Field '{path}' was read through absent hop '{hop}' without a null guard.")]
	UnguardedNullHop { path: String, hop: String },
	#[error("Aggregate over field '{path}' overflowed.")]
	Overflow { path: String },
	#[error("Field '{path}' is registered as {expected} but produced a {found} value.")]
	KindMismatch { path: String, expected: String, found: String },
}
