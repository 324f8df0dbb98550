//! JSON export and import of every daily record.
//!
//! The backup format is a JSON array of records, each shaped like
//! `{ "date": "YYYY-MM-DD", "positivePhrases": [...], "avoidPhrases": [...] }`.
//! Import is all-or-nothing and replaces the whole store; it never merges.

use std::collections::HashSet;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::{
    db::connection::Database,
    errors::{TrackerError, TrackerResult},
    log_info,
    models::{DailyRecord, PhraseCategory},
    navigation::dates::format_date,
};

use super::daily_records::{read_all_records, write_record};

const ENABLE_LOGS: bool = true;

/// Suggested file name for a backup taken on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("affirmation-data-{}.json", format_date(date))
}

/// Parses and validates a backup without touching storage.
pub fn parse_backup(payload: &str) -> TrackerResult<Vec<DailyRecord>> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|err| TrackerError::Validation(format!("backup is not valid JSON: {err}")))?;

    let Value::Array(items) = value else {
        return Err(TrackerError::Validation(
            "backup must be a JSON array of daily records".into(),
        ));
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let record: DailyRecord = serde_json::from_value(item).map_err(|err| {
            TrackerError::Validation(format!("record {index} is malformed: {err}"))
        })?;

        if !seen.insert(record.date) {
            return Err(TrackerError::Validation(format!(
                "record {index} repeats date {}",
                record.date_key()
            )));
        }

        for category in [PhraseCategory::Positive, PhraseCategory::Avoid] {
            if let Some(position) = record
                .phrases(category)
                .iter()
                .position(|phrase| phrase.text.trim().is_empty())
            {
                return Err(TrackerError::Validation(format!(
                    "record {index} ({}) has a blank {} phrase at position {position}",
                    record.date_key(),
                    category.as_str()
                )));
            }
        }

        records.push(record);
    }

    Ok(records)
}

impl Database {
    /// Serializes every record, newest first, as pretty-printed JSON.
    pub async fn export_all(&self) -> TrackerResult<String> {
        let records = self.execute(|conn| read_all_records(conn)).await?;
        serde_json::to_string_pretty(&records)
            .map_err(|err| TrackerError::Storage(format!("failed to serialize backup: {err}")))
    }

    /// Replaces the entire store with the records in `payload`.
    ///
    /// The payload is validated in full before anything is written; a
    /// validation failure leaves existing data untouched. The clear and the
    /// inserts share one transaction, so a storage failure part way through
    /// is rolled back as well. Returns the number of imported records.
    pub async fn import_all(&self, payload: &str) -> TrackerResult<usize> {
        let records = parse_backup(payload)?;
        self.replace_all(records).await
    }

    /// Clears the store and writes `records` in a single transaction.
    pub async fn replace_all(&self, records: Vec<DailyRecord>) -> TrackerResult<usize> {
        let imported = records.len();

        self.execute(move |conn| {
            let now = Utc::now().to_rfc3339();
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM tracked_phrases", [])?;
            tx.execute("DELETE FROM daily_records", [])?;
            for record in &records {
                write_record(&tx, record, &now)?;
            }
            tx.commit().context("failed to commit import")?;
            Ok(())
        })
        .await?;

        log_info!("Imported {imported} daily records from backup");
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_array_payloads() {
        for payload in ["{}", "\"text\"", "42", "not json"] {
            let err = parse_backup(payload).unwrap_err();
            assert!(err.is_validation(), "{payload}: {err}");
        }
    }

    #[test]
    fn rejects_records_missing_fields() {
        let payload = r#"[{"date":"2024-01-01","positivePhrases":[]}]"#;
        let err = parse_backup(payload).unwrap_err();
        assert!(err.to_string().contains("record 0"));
    }

    #[test]
    fn rejects_duplicate_dates_and_blank_text() {
        let duplicate = r#"[
            {"date":"2024-01-01","positivePhrases":[],"avoidPhrases":[]},
            {"date":"2024-01-01","positivePhrases":[],"avoidPhrases":[]}
        ]"#;
        assert!(parse_backup(duplicate).unwrap_err().is_validation());

        let blank = r#"[{"date":"2024-01-01","positivePhrases":[
            {"text":"  ","count":0,"target":0,"completed":false}
        ],"avoidPhrases":[]}]"#;
        assert!(parse_backup(blank).unwrap_err().is_validation());
    }

    #[test]
    fn rejects_negative_counts() {
        let payload = r#"[{"date":"2024-01-01","positivePhrases":[
            {"text":"I am worthy","count":-1,"target":0,"completed":false}
        ],"avoidPhrases":[]}]"#;
        assert!(parse_backup(payload).unwrap_err().is_validation());
    }

    #[test]
    fn accepts_empty_array() {
        assert!(parse_backup("[]").unwrap().is_empty());
    }

    #[test]
    fn export_file_name_uses_date() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        assert_eq!(export_file_name(date), "affirmation-data-2024-07-04.json");
    }
}
