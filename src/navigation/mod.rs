pub mod dates;
pub mod navigator;

pub use dates::{format_date, format_for_display, parse_date, today_local};
pub use navigator::{CalendarDay, CalendarMonth, DateMode, DateNavigator, NavigationSnapshot};
