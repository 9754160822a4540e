//! Month cursor and the month grid the heatmap is drawn from.

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};

use crate::{
    aggregation::{percentage, ColorBand},
    storage::entities::{MonthData, Task},
    utils::{
        percentage::Percentage,
        time::{day_key, days_in_month, month_name, month_start},
    },
};

/// Which month is displayed. `month` is 0-based. The cursor is independent of "today" and is never
/// persisted, every session starts at the current month.
///
/// Navigation does not check the range, but only months inside chrono's `NaiveDate` range (about
/// ±262,000 years) can be built into a [MonthGrid]. Anything past that is an error, not a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub year: i32,
    pub month: u32,
}

impl ViewState {
    pub fn current(today: NaiveDate) -> Self {
        Self {
            year: today.year(),
            month: today.month0(),
        }
    }

    pub fn prev_month(&mut self) {
        if self.month == 0 {
            self.month = 11;
            self.year -= 1;
        } else {
            self.month -= 1;
        }
    }

    pub fn next_month(&mut self) {
        if self.month >= 11 {
            self.month = 0;
            self.year += 1;
        } else {
            self.month += 1;
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.year == date.year() && self.month == date.month0()
    }

    /// E.g. `October 2026`.
    pub fn title(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub day: u32,
    pub percentage: Percentage,
    pub band: ColorBand,
    pub is_today: bool,
}

/// Everything needed to draw one month of the heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid {
    pub view: ViewState,
    /// Blank cells before the 1st. Weeks start on Sunday.
    pub leading_blanks: u32,
    pub days: Vec<DayCell>,
}

impl MonthGrid {
    pub fn build(
        view: ViewState,
        month_data: &MonthData,
        tasks: &[Task],
        today: NaiveDate,
    ) -> Result<Self> {
        let first = month_start(view.year, view.month)
            .ok_or_else(|| anyhow!("Month {}/{} can't be displayed", view.month + 1, view.year))?;
        let day_count = days_in_month(view.year, view.month)
            .ok_or_else(|| anyhow!("Month {}/{} can't be displayed", view.month + 1, view.year))?;
        let is_current_month = view.contains(today);

        let days = first
            .iter_days()
            .take(day_count as usize)
            .map(|date| {
                let percentage = month_data
                    .get(&day_key(date))
                    .map(|record| percentage(record, tasks))
                    .unwrap_or(Percentage::ZERO);
                DayCell {
                    day: date.day(),
                    percentage,
                    band: ColorBand::for_percentage(percentage),
                    is_today: is_current_month && date.day() == today.day(),
                }
            })
            .collect();

        Ok(Self {
            view,
            leading_blanks: first.weekday().num_days_from_sunday(),
            days,
        })
    }

    /// Rows of seven cells, `None` being a blank before the 1st or after the last day.
    pub fn weeks(&self) -> Vec<Vec<Option<&DayCell>>> {
        let cells = (0..self.leading_blanks)
            .map(|_| None)
            .chain(self.days.iter().map(Some))
            .collect::<Vec<_>>();
        cells
            .chunks(7)
            .map(|week| {
                let mut week = week.to_vec();
                week.resize(7, None);
                week
            })
            .collect()
    }
}
