pub mod controller;
pub mod events;
mod persistence;

pub use controller::{Clock, Tracker, TrackerSnapshot, DB_FILE_NAME, SETTINGS_FILE_NAME};
pub use events::TrackerEvent;
