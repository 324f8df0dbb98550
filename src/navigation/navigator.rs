use std::collections::BTreeSet;
use std::ops::Bound::{Excluded, Included};

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::log_info;

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DateMode {
    Today,
    Historical,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSnapshot {
    #[serde(with = "super::dates::ymd")]
    pub selected: NaiveDate,
    #[serde(with = "super::dates::ymd")]
    pub today: NaiveDate,
    pub mode: DateMode,
    pub read_only: bool,
    pub can_go_previous: bool,
    pub can_go_next: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    #[serde(with = "super::dates::ymd")]
    pub date: NaiveDate,
    pub has_record: bool,
    pub is_today: bool,
    pub is_selected: bool,
    /// Future days cannot be selected.
    pub is_future: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Blank cells before the 1st in a Sunday-first week grid.
    pub leading_blank_days: u32,
    pub days: Vec<CalendarDay>,
}

/// Tracks which day is selected and which days have stored records.
///
/// The selected day is either today (editable) or an earlier day
/// (read-only). Future days are never selected; requests for them clamp to
/// today.
#[derive(Debug, Clone)]
pub struct DateNavigator {
    today: NaiveDate,
    selected: NaiveDate,
    recorded: BTreeSet<NaiveDate>,
}

impl DateNavigator {
    pub fn new(today: NaiveDate, recorded: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            today,
            selected: today,
            recorded: recorded.into_iter().collect(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn selected(&self) -> NaiveDate {
        self.selected
    }

    pub fn mode(&self) -> DateMode {
        if self.selected == self.today {
            DateMode::Today
        } else {
            DateMode::Historical
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.mode() == DateMode::Historical
    }

    pub fn has_record(&self, date: NaiveDate) -> bool {
        self.recorded.contains(&date)
    }

    pub fn recorded_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.recorded.iter().copied()
    }

    /// Selects `date`, clamping future days to today. Returns the day actually selected.
    pub fn select(&mut self, date: NaiveDate) -> NaiveDate {
        self.selected = date.min(self.today);
        self.selected
    }

    pub fn go_to_today(&mut self) -> NaiveDate {
        self.selected = self.today;
        self.selected
    }

    fn previous_recorded(&self) -> Option<NaiveDate> {
        self.recorded.range(..self.selected).next_back().copied()
    }

    fn next_target(&self) -> Option<NaiveDate> {
        if self.selected >= self.today {
            return None;
        }
        let later = self
            .recorded
            .range((Excluded(self.selected), Included(self.today)))
            .next()
            .copied();
        Some(later.unwrap_or(self.today))
    }

    pub fn can_go_previous(&self) -> bool {
        self.previous_recorded().is_some()
    }

    pub fn can_go_next(&self) -> bool {
        self.next_target().is_some()
    }

    /// Moves to the nearest earlier recorded day. `None` when there is none.
    pub fn previous(&mut self) -> Option<NaiveDate> {
        let target = self.previous_recorded()?;
        self.selected = target;
        Some(target)
    }

    /// Moves to the nearest later recorded day, or to today when no later
    /// record exists. `None` when already at today.
    pub fn next(&mut self) -> Option<NaiveDate> {
        let target = self.next_target()?;
        self.selected = target;
        Some(target)
    }

    pub fn mark_recorded(&mut self, date: NaiveDate) {
        self.recorded.insert(date);
    }

    pub fn forget(&mut self, date: NaiveDate) {
        self.recorded.remove(&date);
    }

    pub fn replace_recorded(&mut self, dates: impl IntoIterator<Item = NaiveDate>) {
        self.recorded = dates.into_iter().collect();
    }

    /// Updates the notion of today. Returns true when the day changed.
    ///
    /// The previously current day, if still selected, becomes historical.
    pub fn advance_today(&mut self, today: NaiveDate) -> bool {
        if today == self.today {
            return false;
        }
        log_info!("Calendar day changed from {} to {}", self.today, today);
        self.today = today;
        if self.selected > today {
            self.selected = today;
        }
        true
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        NavigationSnapshot {
            selected: self.selected,
            today: self.today,
            mode: self.mode(),
            read_only: self.is_read_only(),
            can_go_previous: self.can_go_previous(),
            can_go_next: self.can_go_next(),
        }
    }

    /// Month grid for a date picker. `None` for an invalid year/month.
    pub fn calendar_month(&self, year: i32, month: u32) -> Option<CalendarMonth> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let last = first.checked_add_months(Months::new(1))?.pred_opt()?;

        let days = first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|date| CalendarDay {
                date,
                has_record: self.recorded.contains(&date),
                is_today: date == self.today,
                is_selected: date == self.selected,
                is_future: date > self.today,
            })
            .collect();

        Some(CalendarMonth {
            year,
            month,
            leading_blank_days: first.weekday().num_days_from_sunday(),
            days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn previous_and_next_follow_recorded_days() {
        let mut nav = DateNavigator::new(day(2024, 1, 3), [day(2024, 1, 1), day(2024, 1, 3)]);
        assert_eq!(nav.mode(), DateMode::Today);
        assert!(!nav.can_go_next());
        assert_eq!(nav.next(), None);

        assert_eq!(nav.previous(), Some(day(2024, 1, 1)));
        assert!(nav.is_read_only());
        assert!(!nav.can_go_previous());
        assert_eq!(nav.previous(), None);
        assert_eq!(nav.selected(), day(2024, 1, 1));

        assert_eq!(nav.next(), Some(day(2024, 1, 3)));
        assert_eq!(nav.mode(), DateMode::Today);
    }

    #[test]
    fn next_falls_back_to_today_without_later_records() {
        let mut nav = DateNavigator::new(day(2024, 5, 10), [day(2024, 5, 1)]);
        nav.select(day(2024, 5, 1));
        assert!(nav.can_go_next());
        assert_eq!(nav.next(), Some(day(2024, 5, 10)));
        assert!(!nav.is_read_only());
    }

    #[test]
    fn next_ignores_records_after_today() {
        let mut nav = DateNavigator::new(
            day(2024, 5, 10),
            [day(2024, 5, 1), day(2024, 5, 20)],
        );
        nav.select(day(2024, 5, 1));
        assert_eq!(nav.next(), Some(day(2024, 5, 10)));
        assert_eq!(nav.next(), None);
    }

    #[test]
    fn selecting_future_clamps_to_today() {
        let mut nav = DateNavigator::new(day(2024, 5, 10), []);
        assert_eq!(nav.select(day(2024, 6, 1)), day(2024, 5, 10));
        assert_eq!(nav.mode(), DateMode::Today);
    }

    #[test]
    fn day_rollover_makes_previous_today_historical() {
        let mut nav = DateNavigator::new(day(2024, 5, 10), [day(2024, 5, 10)]);
        assert!(!nav.is_read_only());
        assert!(nav.advance_today(day(2024, 5, 11)));
        assert_eq!(nav.selected(), day(2024, 5, 10));
        assert!(nav.is_read_only());
        assert!(!nav.advance_today(day(2024, 5, 11)));
    }

    #[test]
    fn calendar_month_marks_days() {
        let mut nav = DateNavigator::new(day(2024, 2, 15), [day(2024, 2, 3)]);
        nav.select(day(2024, 2, 3));
        let month = nav.calendar_month(2024, 2).unwrap();
        assert_eq!(month.days.len(), 29);
        // 2024-02-01 was a Thursday.
        assert_eq!(month.leading_blank_days, 4);
        assert!(month.days[2].has_record && month.days[2].is_selected);
        assert!(month.days[14].is_today);
        assert!(month.days[15].is_future);
        assert!(nav.calendar_month(2024, 13).is_none());
    }
}
