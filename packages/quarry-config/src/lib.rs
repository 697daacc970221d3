mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Ranking, Service, SoftDelete};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	for (label, weight) in [
		("ranking.text_weight", cfg.ranking.text_weight),
		("ranking.vector_weight", cfg.ranking.vector_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(0.0..=1.0).contains(&weight) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if cfg.ranking.text_weight == 0.0 && cfg.ranking.vector_weight == 0.0 {
		return Err(Error::Validation {
			message: "ranking.text_weight and ranking.vector_weight must not both be zero."
				.to_string(),
		});
	}

	for (label, field) in [
		("soft_delete.active_field", &cfg.soft_delete.active_field),
		("soft_delete.archived_field", &cfg.soft_delete.archived_field),
	] {
		if let Some(field) = field
			&& field.contains('.')
		{
			return Err(Error::Validation {
				message: format!("{label} must name a top-level field, got '{field}'."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.soft_delete.active_field.as_deref().map(|field| field.trim().is_empty()).unwrap_or(false)
	{
		cfg.soft_delete.active_field = None;
	}
	if cfg
		.soft_delete
		.archived_field
		.as_deref()
		.map(|field| field.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.soft_delete.archived_field = None;
	}
}
