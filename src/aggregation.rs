//! Turns day records into numbers and heatmap colors. Every place that counts completions goes
//! through [completed_count], so stale ids are filtered in exactly one spot.

use std::collections::HashSet;

use crate::{
    storage::entities::{DailyRecord, Task},
    utils::percentage::Percentage,
};

/// Heatmap band of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBand {
    Zero,
    Low,
    Medium,
    High,
    Complete,
}

impl ColorBand {
    /// Upper bounds are inclusive for low and medium. 100% is its own band, so anything below it
    /// stays high.
    pub fn for_percentage(percentage: Percentage) -> Self {
        let p = *percentage;
        if p == 0. {
            ColorBand::Zero
        } else if p <= 25. {
            ColorBand::Low
        } else if p <= 50. {
            ColorBand::Medium
        } else if p < 100. {
            ColorBand::High
        } else {
            ColorBand::Complete
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            ColorBand::Zero => "#ebedf0",
            ColorBand::Low => "#fff3b0",
            ColorBand::Medium => "#ffe066",
            ColorBand::High => "#8cc665",
            ColorBand::Complete => "#216e39",
        }
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            ColorBand::Zero => (0xeb, 0xed, 0xf0),
            ColorBand::Low => (0xff, 0xf3, 0xb0),
            ColorBand::Medium => (0xff, 0xe0, 0x66),
            ColorBand::High => (0x8c, 0xc6, 0x65),
            ColorBand::Complete => (0x21, 0x6e, 0x39),
        }
    }
}

/// Number of live tasks completed in `record`. Ids of deleted tasks are ignored and every task
/// counts once even if its id got recorded twice.
pub fn completed_count(record: &DailyRecord, tasks: &[Task]) -> usize {
    let completed = record.completed.iter().map(String::as_str).collect::<HashSet<_>>();
    tasks
        .iter()
        .filter(|task| completed.contains(task.id.as_str()))
        .count()
}

pub fn percentage(record: &DailyRecord, tasks: &[Task]) -> Percentage {
    Percentage::of(completed_count(record, tasks), tasks.len())
}

/// Progress summary for a single day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: Percentage,
}

impl DayProgress {
    pub fn new(record: &DailyRecord, tasks: &[Task]) -> Self {
        let completed = completed_count(record, tasks);
        Self {
            completed,
            total: tasks.len(),
            percentage: Percentage::of(completed, tasks.len()),
        }
    }

    pub fn band(&self) -> ColorBand {
        ColorBand::for_percentage(self.percentage)
    }
}
