//! Calendar-date helpers. Dates are local calendar days keyed as `YYYY-MM-DD`.

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The current calendar day in the local timezone.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Strict `YYYY-MM-DD` parse; unpadded or decorated input is rejected.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.len() != 10 || trimmed != value {
        return Err(anyhow!("invalid date '{value}': expected YYYY-MM-DD"));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|err| anyhow!("invalid date '{value}': {err}"))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Long form used in headings, e.g. "Monday, Jan 1, 2024".
pub fn format_for_display(date: NaiveDate) -> String {
    date.format("%A, %b %-d, %Y").to_string()
}

/// Serde adapter for `YYYY-MM-DD` dates using [`parse_date`].
pub mod ymd {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_strict() {
        assert!(parse_date("2024-01-05").is_ok());
        assert!(parse_date("2024-1-5").is_err());
        assert!(parse_date(" 2024-01-05").is_err());
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn display_format_matches_long_form() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(format_for_display(date), "Monday, Jan 1, 2024");
        assert_eq!(format_date(date), "2024-01-01");
    }
}
