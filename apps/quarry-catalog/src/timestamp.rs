//! Catalog timestamps: RFC 3339, or a bare `YYYY-MM-DD` read as midnight UTC.

use serde::{Deserialize, Deserializer};
use time::{
	Date, OffsetDateTime,
	format_description::{BorrowedFormatItem, well_known::Rfc3339},
	macros::format_description,
};

const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse(&raw).map_err(serde::de::Error::custom)
}

fn parse(raw: &str) -> Result<OffsetDateTime, String> {
	let raw = raw.trim();

	if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Ok(at);
	}

	Date::parse(raw, DATE)
		.map(|date| date.midnight().assume_utc())
		.map_err(|_| format!("'{raw}' is neither an RFC 3339 timestamp nor a YYYY-MM-DD date."))
}
