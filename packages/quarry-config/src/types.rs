use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub ranking: Ranking,
	#[serde(default)]
	pub soft_delete: SoftDelete,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

/// Default weights for hybrid ranking when a caller does not pass its own.
#[derive(Debug, Clone, Deserialize)]
pub struct Ranking {
	#[serde(default = "default_weight")]
	pub text_weight: f32,
	#[serde(default = "default_weight")]
	pub vector_weight: f32,
}
impl Default for Ranking {
	fn default() -> Self {
		Self { text_weight: default_weight(), vector_weight: default_weight() }
	}
}

/// Field names consulted by the opt-in live-record guard. A `None` entry disables that half of
/// the guard.
#[derive(Debug, Clone, Deserialize)]
pub struct SoftDelete {
	#[serde(default = "default_active_field")]
	pub active_field: Option<String>,
	#[serde(default = "default_archived_field")]
	pub archived_field: Option<String>,
}
impl Default for SoftDelete {
	fn default() -> Self {
		Self { active_field: default_active_field(), archived_field: default_archived_field() }
	}
}

fn default_weight() -> f32 {
	0.5
}

fn default_active_field() -> Option<String> {
	Some("IsActive".to_string())
}

fn default_archived_field() -> Option<String> {
	Some("IsArchived".to_string())
}
