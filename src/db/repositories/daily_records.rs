use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{date_key, parse_category, parse_date_column, to_u32},
    },
    errors::TrackerResult,
    models::{DailyRecord, PhraseCategory, TrackedPhrase},
};

#[derive(Default)]
struct PhraseColumns {
    positive: Vec<TrackedPhrase>,
    avoid: Vec<TrackedPhrase>,
}

impl PhraseColumns {
    fn push(&mut self, category: PhraseCategory, phrase: TrackedPhrase) {
        match category {
            PhraseCategory::Positive => self.positive.push(phrase),
            PhraseCategory::Avoid => self.avoid.push(phrase),
        }
    }

    fn into_record(self, date: NaiveDate) -> DailyRecord {
        DailyRecord::new(date, self.positive, self.avoid)
    }
}

fn row_to_phrase(row: &Row) -> Result<(PhraseCategory, TrackedPhrase)> {
    let category: String = row.get("category")?;
    let phrase = TrackedPhrase {
        text: row.get("text")?,
        count: to_u32(row.get("count")?, "count")?,
        target: to_u32(row.get("target")?, "target")?,
        completed: row.get("completed")?,
    };
    Ok((parse_category(&category)?, phrase))
}

pub(super) fn read_record(conn: &Connection, date: NaiveDate) -> Result<Option<DailyRecord>> {
    let key = date_key(date);
    let exists = conn
        .query_row(
            "SELECT 1 FROM daily_records WHERE date = ?1",
            params![key],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !exists {
        return Ok(None);
    }

    let mut stmt = conn.prepare(
        "SELECT category, position, text, count, target, completed
         FROM tracked_phrases
         WHERE date = ?1
         ORDER BY category, position",
    )?;
    let mut rows = stmt.query(params![key])?;
    let mut columns = PhraseColumns::default();
    while let Some(row) = rows.next()? {
        let (category, phrase) = row_to_phrase(row)?;
        columns.push(category, phrase);
    }

    Ok(Some(columns.into_record(date)))
}

/// Every record, newest first.
pub(super) fn read_all_records(conn: &Connection) -> Result<Vec<DailyRecord>> {
    let dates = read_dates(conn)?;

    let mut stmt = conn.prepare(
        "SELECT date, category, position, text, count, target, completed
         FROM tracked_phrases
         ORDER BY date, category, position",
    )?;
    let mut rows = stmt.query([])?;
    let mut by_date: HashMap<String, PhraseColumns> = HashMap::new();
    while let Some(row) = rows.next()? {
        let key: String = row.get("date")?;
        let (category, phrase) = row_to_phrase(row)?;
        by_date.entry(key).or_default().push(category, phrase);
    }

    Ok(dates
        .into_iter()
        .map(|date| {
            by_date
                .remove(&date_key(date))
                .unwrap_or_default()
                .into_record(date)
        })
        .collect())
}

fn read_dates(conn: &Connection) -> Result<Vec<NaiveDate>> {
    let mut stmt = conn.prepare("SELECT date FROM daily_records ORDER BY date DESC")?;
    let mut rows = stmt.query([])?;
    let mut dates = Vec::new();
    while let Some(row) = rows.next()? {
        let raw: String = row.get(0)?;
        dates.push(parse_date_column(&raw, "date")?);
    }
    Ok(dates)
}

/// Upserts the record row and replaces its phrases wholesale.
///
/// Callers wrap this in a transaction.
pub(super) fn write_record(conn: &Connection, record: &DailyRecord, now: &str) -> Result<()> {
    let key = record.date_key();
    conn.execute(
        "INSERT INTO daily_records (date, created_at, updated_at)
         VALUES (?1, ?2, ?2)
         ON CONFLICT(date) DO UPDATE SET updated_at = excluded.updated_at",
        params![key, now],
    )
    .with_context(|| format!("failed to upsert daily record {key}"))?;

    conn.execute("DELETE FROM tracked_phrases WHERE date = ?1", params![key])
        .with_context(|| format!("failed to clear phrases for {key}"))?;

    let mut insert = conn.prepare(
        "INSERT INTO tracked_phrases (date, category, position, text, count, target, completed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for category in [PhraseCategory::Positive, PhraseCategory::Avoid] {
        for (position, phrase) in record.phrases(category).iter().enumerate() {
            insert
                .execute(params![
                    key,
                    category.as_str(),
                    position as i64,
                    phrase.text,
                    i64::from(phrase.count),
                    i64::from(phrase.target),
                    phrase.completed,
                ])
                .with_context(|| format!("failed to insert phrase '{}' for {key}", phrase.text))?;
        }
    }

    Ok(())
}

impl Database {
    /// Upserts `record`, replacing whatever was stored for its date.
    pub async fn save_record(&self, record: &DailyRecord) -> TrackerResult<()> {
        let record = record.clone();
        self.execute(move |conn| {
            let now = Utc::now().to_rfc3339();
            let tx = conn.transaction()?;
            write_record(&tx, &record, &now)?;
            tx.commit().context("failed to commit daily record")?;
            Ok(())
        })
        .await
        .map_err(Into::into)
    }

    pub async fn load_record(&self, date: NaiveDate) -> TrackerResult<Option<DailyRecord>> {
        self.execute(move |conn| read_record(conn, date))
            .await
            .map_err(Into::into)
    }

    /// All records, newest first.
    pub async fn list_records(&self) -> TrackerResult<Vec<DailyRecord>> {
        self.execute(|conn| read_all_records(conn))
            .await
            .map_err(Into::into)
    }

    /// Dates that have a stored record, newest first.
    pub async fn list_record_dates(&self) -> TrackerResult<Vec<NaiveDate>> {
        self.execute(|conn| read_dates(conn))
            .await
            .map_err(Into::into)
    }

    /// The most recent record strictly before `date`, if any.
    pub async fn latest_record_before(&self, date: NaiveDate) -> TrackerResult<Option<DailyRecord>> {
        self.execute(move |conn| {
            let previous: Option<String> = conn
                .query_row(
                    "SELECT date FROM daily_records WHERE date < ?1 ORDER BY date DESC LIMIT 1",
                    params![date_key(date)],
                    |row| row.get(0),
                )
                .optional()?;

            match previous {
                Some(raw) => read_record(conn, parse_date_column(&raw, "date")?),
                None => Ok(None),
            }
        })
        .await
        .map_err(Into::into)
    }

    /// Deletes the record for `date`. Returns false when none existed.
    pub async fn delete_record(&self, date: NaiveDate) -> TrackerResult<bool> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "DELETE FROM daily_records WHERE date = ?1",
                params![date_key(date)],
            )?;
            Ok(rows_affected > 0)
        })
        .await
        .map_err(Into::into)
    }

    /// Removes every record. Returns how many were deleted.
    pub async fn clear_records(&self) -> TrackerResult<usize> {
        self.execute(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM tracked_phrases", [])?;
            let removed = tx.execute("DELETE FROM daily_records", [])?;
            tx.commit().context("failed to commit clear")?;
            Ok(removed)
        })
        .await
        .map_err(Into::into)
    }

    pub async fn record_count(&self) -> TrackerResult<usize> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM daily_records", [], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhraseDefinition;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample(date: NaiveDate) -> DailyRecord {
        let mut record = DailyRecord::seeded(
            date,
            vec![
                PhraseDefinition::new("I am confident", 3),
                PhraseDefinition::new("I can do this", 2),
            ],
            vec![PhraseDefinition::new("never", 0)],
        );
        record.positive_phrases[1].count = 2;
        record.positive_phrases[1].completed = true;
        record
    }

    #[tokio::test]
    async fn save_then_load_preserves_order_and_counts() {
        let db = Database::open_in_memory().unwrap();
        let record = sample(day(2024, 1, 1));
        db.save_record(&record).await.unwrap();

        let loaded = db.load_record(day(2024, 1, 1)).await.unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(db.load_record(day(2024, 1, 2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_whole_record() {
        let db = Database::open_in_memory().unwrap();
        db.save_record(&sample(day(2024, 1, 1))).await.unwrap();

        let replacement = DailyRecord::seeded(
            day(2024, 1, 1),
            vec![PhraseDefinition::new("I am worthy", 1)],
            Vec::new(),
        );
        db.save_record(&replacement).await.unwrap();

        let loaded = db.load_record(day(2024, 1, 1)).await.unwrap().unwrap();
        assert_eq!(loaded, replacement);
        assert_eq!(db.record_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_record_still_exists() {
        let db = Database::open_in_memory().unwrap();
        let empty = DailyRecord::new(day(2024, 2, 2), Vec::new(), Vec::new());
        db.save_record(&empty).await.unwrap();
        assert_eq!(db.load_record(day(2024, 2, 2)).await.unwrap(), Some(empty));
    }

    #[tokio::test]
    async fn latest_before_skips_same_and_later_days() {
        let db = Database::open_in_memory().unwrap();
        for date in [day(2024, 1, 1), day(2024, 1, 5), day(2024, 1, 9)] {
            db.save_record(&sample(date)).await.unwrap();
        }

        let found = db.latest_record_before(day(2024, 1, 9)).await.unwrap();
        assert_eq!(found.map(|r| r.date), Some(day(2024, 1, 5)));
        assert!(db
            .latest_record_before(day(2024, 1, 1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_and_delete() {
        let db = Database::open_in_memory().unwrap();
        for date in [day(2024, 1, 3), day(2024, 1, 1), day(2024, 1, 2)] {
            db.save_record(&sample(date)).await.unwrap();
        }

        let dates = db.list_record_dates().await.unwrap();
        assert_eq!(dates, vec![day(2024, 1, 3), day(2024, 1, 2), day(2024, 1, 1)]);

        let records = db.list_records().await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].positive_phrases.len(), 2);

        assert!(db.delete_record(day(2024, 1, 2)).await.unwrap());
        assert!(!db.delete_record(day(2024, 1, 2)).await.unwrap());
        assert_eq!(db.record_count().await.unwrap(), 2);

        assert_eq!(db.clear_records().await.unwrap(), 2);
        assert!(db.list_records().await.unwrap().is_empty());
    }
}
