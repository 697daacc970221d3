use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures while loading or validating a quarry config.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read quarry config {}: {source}.", path.display())]
	ReadConfig {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("Quarry config {} is not valid TOML.", path.display())]
	ParseConfig {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
	#[error("Invalid quarry config: {message}")]
	Validation { message: String },
}
