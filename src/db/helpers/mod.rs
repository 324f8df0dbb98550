use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;

use crate::models::PhraseCategory;
use crate::navigation::dates::{format_date, parse_date};

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

pub fn date_key(date: NaiveDate) -> String {
    format_date(date)
}

pub fn parse_date_column(value: &str, field: &str) -> Result<NaiveDate> {
    parse_date(value).with_context(|| format!("failed to parse {field}"))
}

pub fn parse_category(value: &str) -> Result<PhraseCategory> {
    match value {
        "positive" => Ok(PhraseCategory::Positive),
        "avoid" => Ok(PhraseCategory::Avoid),
        other => Err(anyhow!("unknown phrase category {other}")),
    }
}
