use chrono::NaiveDate;
use mantra_score_lib::{
    db::export_file_name, DailyRecord, Database, PhraseCategory, PhraseDefinition,
};
use tempfile::TempDir;

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
}

fn record(day: &str, count: u32) -> DailyRecord {
    let mut record = DailyRecord::seeded(
        date(day),
        vec![PhraseDefinition::new("I am confident", 3)],
        vec![PhraseDefinition::new("never", 0)],
    );
    record.positive_phrases[0].count = count;
    record
}

#[tokio::test]
async fn records_survive_reopening_the_store() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("store.sqlite3");

    {
        let db = Database::new(path.clone()).expect("open store");
        db.save_record(&record("2024-01-01", 1)).await.expect("save");
        db.save_record(&record("2024-01-03", 2)).await.expect("save");
    }

    let db = Database::new(path).expect("reopen store");
    let dates = db.list_record_dates().await.expect("dates");
    assert_eq!(dates, vec![date("2024-01-03"), date("2024-01-01")]);

    let loaded = db
        .load_record(date("2024-01-03"))
        .await
        .expect("load")
        .expect("record exists");
    assert_eq!(loaded.positive_phrases[0].count, 2);
    assert_eq!(loaded.phrases(PhraseCategory::Avoid)[0].text, "never");
}

#[tokio::test]
async fn export_then_import_into_a_fresh_store() {
    let source = Database::open_in_memory().expect("source");
    source.save_record(&record("2024-01-01", 1)).await.expect("save");
    source.save_record(&record("2024-01-02", 3)).await.expect("save");
    let backup = source.export_all().await.expect("export");

    let dir = TempDir::new().expect("temp dir");
    let target = Database::new(dir.path().join("target.sqlite3")).expect("target");
    target.save_record(&record("2023-06-01", 9)).await.expect("save");

    assert_eq!(target.import_all(&backup).await.expect("import"), 2);
    assert_eq!(target.list_records().await.expect("list"), source.list_records().await.expect("list"));
    assert!(target
        .load_record(date("2023-06-01"))
        .await
        .expect("load")
        .is_none());
}

#[tokio::test]
async fn rejected_import_leaves_existing_records() {
    let db = Database::open_in_memory().expect("store");
    db.save_record(&record("2024-01-01", 4)).await.expect("save");

    let payload = r#"[
        {"date":"2024-02-01","positivePhrases":[],"avoidPhrases":[]},
        {"date":"2024-2-2","positivePhrases":[],"avoidPhrases":[]}
    ]"#;
    let err = db.import_all(payload).await.expect_err("bad date rejected");
    assert!(err.is_validation(), "{err}");

    assert_eq!(db.record_count().await.expect("count"), 1);
    assert_eq!(
        db.load_record(date("2024-01-01"))
            .await
            .expect("load")
            .expect("kept")
            .positive_phrases[0]
            .count,
        4
    );
}

#[tokio::test]
async fn legacy_backups_with_old_collection_names_import() {
    let db = Database::open_in_memory().expect("store");
    let payload = r#"[{
        "date":"2024-01-05",
        "positiveAffirmations":[{"text":"I can do this","count":2,"target":10,"completed":false}],
        "negativePhrases":[{"text":"can't","count":1,"target":0,"completed":false}]
    }]"#;

    assert_eq!(db.import_all(payload).await.expect("import"), 1);
    let loaded = db
        .load_record(date("2024-01-05"))
        .await
        .expect("load")
        .expect("imported");
    assert_eq!(loaded.positive_phrases[0].count, 2);
    assert_eq!(loaded.avoid_phrases[0].text, "can't");
}

#[test]
fn backup_file_name_uses_the_export_day() {
    assert_eq!(
        export_file_name(date("2024-03-09")),
        "affirmation-data-2024-03-09.json"
    );
}
