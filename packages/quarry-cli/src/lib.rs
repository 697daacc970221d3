//! Shared command-line plumbing for the quarry binaries.

use std::{io, str::FromStr};

use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};
use tracing_subscriber::EnvFilter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

/// Installs the global subscriber. Logs go to stderr so stdout stays machine-readable.
pub fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

/// Query embedding given on the command line as `0.1,0.2,0.3`.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(pub Vec<f32>);
impl FromStr for Embedding {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		raw.split(',')
			.map(|component| {
				let component = component.trim();

				component
					.parse::<f32>()
					.ok()
					.filter(|value| value.is_finite())
					.ok_or_else(|| format!("'{component}' is not a finite number."))
			})
			.collect::<Result<Vec<_>, _>>()
			.map(Self)
	}
}

#[cfg(test)]
mod tests {
	use crate::Embedding;

	#[test]
	fn parses_comma_separated_components() {
		assert_eq!("0.5, -1,2e-1".parse::<Embedding>(), Ok(Embedding(vec![0.5, -1.0, 0.2])));
	}

	#[test]
	fn rejects_blank_and_non_finite_components() {
		for raw in ["", "1,,2", "1,NaN", "inf"] {
			assert!(raw.parse::<Embedding>().is_err(), "{raw:?} must be rejected");
		}
	}
}
