//! Month calendar aggregation.
//!
//! Joins fetched schedule days against every date of a displayed month and
//! derives the per-day status shown in each cell.

use crate::types::{DayStatus, ScheduleDay};
use crate::{Error, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(Error::Validation(format!("invalid month {}-{:02}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(NaiveDate::MAX)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    /// Every date of the month in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.first_day()
            .iter_days()
            .take_while(move |date| *date <= last)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("invalid month '{}', expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

/// First day of the displayed week
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

/// One visual cell of the month grid
#[derive(Clone, Debug, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub schedule: Option<ScheduleDay>,
}

impl DayCell {
    pub fn status(&self) -> Option<DayStatus> {
        self.schedule.as_ref().map(ScheduleDay::status)
    }
}

/// The displayed month with one cell per date
#[derive(Clone, Debug)]
pub struct MonthGrid {
    pub month: YearMonth,
    pub week_start: WeekStart,
    pub cells: Vec<DayCell>,
}

impl MonthGrid {
    /// Join schedules against the dates of `month`.
    ///
    /// A cell gets the first schedule whose date equals the cell date.
    /// Schedules outside the month are ignored.
    pub fn build(month: YearMonth, schedules: &[ScheduleDay], week_start: WeekStart) -> Self {
        let cells = month
            .days()
            .map(|date| DayCell {
                date,
                schedule: select(schedules, date).cloned(),
            })
            .collect();

        Self {
            month,
            week_start,
            cells,
        }
    }

    /// Empty slots before day 1 in the first displayed week
    pub fn leading_blanks(&self) -> usize {
        let first = self.month.first_day().weekday();
        let start = self.week_start.weekday();
        ((first.num_days_from_monday() + 7 - start.num_days_from_monday()) % 7) as usize
    }

    /// Cells split into display weeks, `None` marking padding slots
    pub fn weeks(&self) -> Vec<Vec<Option<&DayCell>>> {
        let mut slots: Vec<Option<&DayCell>> = vec![None; self.leading_blanks()];
        slots.extend(self.cells.iter().map(Some));
        while slots.len() % 7 != 0 {
            slots.push(None);
        }
        slots.chunks(7).map(<[_]>::to_vec).collect()
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell> {
        if !self.month.contains(date) {
            return None;
        }
        self.cells.get(date.day0() as usize)
    }

    /// Weekday header labels in display order
    pub fn weekday_labels(&self) -> [&'static str; 7] {
        match self.week_start {
            WeekStart::Sunday => ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
            WeekStart::Monday => ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
        }
    }

    pub fn summary(&self) -> MonthSummary {
        let mut summary = MonthSummary::default();
        for schedule in self.cells.iter().filter_map(|c| c.schedule.as_ref()) {
            summary.planned += 1;
            if schedule.has_photo() {
                summary.photos += 1;
            }
            match schedule.status() {
                DayStatus::Rest => summary.rest += 1,
                DayStatus::Complete => summary.complete += 1,
                DayStatus::PartiallyComplete => summary.partial += 1,
                DayStatus::NoActivity => {}
            }
        }
        summary
    }
}

/// Dashboard counters for a month
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub planned: usize,
    pub rest: usize,
    pub complete: usize,
    pub partial: usize,
    pub photos: usize,
}

/// First schedule for `date`
pub fn select(schedules: &[ScheduleDay], date: NaiveDate) -> Option<&ScheduleDay> {
    schedules.iter().find(|s| s.schedule_date == date)
}

/// Parse a `YYYY-MM-DD` date, also accepting `today`
pub fn parse_date(s: &str, today: NaiveDate) -> Result<NaiveDate> {
    let s = s.trim();
    match s {
        "today" => Ok(today),
        "yesterday" => today
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| Error::Validation("date out of range".into())),
        "tomorrow" => today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| Error::Validation("date out of range".into())),
        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| Error::Validation(format!("invalid date '{}', expected YYYY-MM-DD", s))),
    }
}
