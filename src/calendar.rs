use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

/// Placeholder shown when a schedule row no longer resolves to a named
/// member (removed membership, empty profile).
pub const UNNAMED: &str = "ไม่ระบุ";

/// A (year, month) position in the calendar, month 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    pub month: u32,
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| panic!("invalid month cursor {}-{}", self.year, self.month))
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().expect("date underflow")
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::with_capacity(31);
        let mut day = self.first_day();
        while day.month() == self.month {
            days.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }

    /// Number of empty cells before day 1 in a Sunday-first week grid.
    pub fn leading_blanks(&self) -> u32 {
        self.first_day().weekday().num_days_from_sunday()
    }
}

/// Display name for a member in calendar cells and the monthly summary:
/// first name, else nickname, else the local part of the email, appending
/// the year level when present.
pub fn display_name(
    first_name: Option<&str>,
    nickname: Option<&str>,
    email: Option<&str>,
    year_level: Option<&str>,
) -> String {
    let base = first_name
        .filter(|s| !s.trim().is_empty())
        .or_else(|| nickname.filter(|s| !s.trim().is_empty()))
        .map(str::to_string)
        .or_else(|| {
            email
                .and_then(|e| e.split('@').next())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNNAMED.to_string());

    match year_level.filter(|s| !s.trim().is_empty()) {
        Some(level) => format!("{base} ({level})"),
        None => base,
    }
}

/// Folds schedule rows into per-member duty counts for the visible month,
/// sorted by count descending (ties by member id for a stable order).
pub fn fold_duty_counts<I>(member_ids: I) -> Vec<(Uuid, i64)>
where
    I: IntoIterator<Item = Uuid>,
{
    let mut counts: HashMap<Uuid, i64> = HashMap::new();
    for member_id in member_ids {
        *counts.entry(member_id).or_insert(0) += 1;
    }
    let mut summary: Vec<(Uuid, i64)> = counts.into_iter().collect();
    summary.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    summary
}
