pub mod backup;
pub mod daily_records;
