mod connection;
pub mod helpers;
mod migrations;
pub mod repositories;

pub use connection::Database;
pub use repositories::backup::{export_file_name, parse_backup};
