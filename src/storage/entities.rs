use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_APP_TITLE: &str = "My Consistency Tracker";

/// A habit the user wants to do every day. Tasks are never edited in place, only added and
/// removed.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Task {
    /// Creation time in milliseconds, as a decimal string.
    pub id: String,
    pub name: String,
}

/// Completions of a single calendar day. Ids may point at tasks that were deleted since, so
/// anything counting them has to filter against the live task list first.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
pub struct DailyRecord {
    #[serde(default)]
    pub completed: Vec<String>,
}

impl DailyRecord {
    pub fn is_completed(&self, task_id: &str) -> bool {
        self.completed.iter().any(|id| id == task_id)
    }

    /// Removes the first occurrence of `task_id` if present, appends it otherwise.
    pub fn toggle(&mut self, task_id: &str) {
        match self.completed.iter().position(|id| id == task_id) {
            Some(index) => {
                self.completed.remove(index);
            }
            None => self.completed.push(task_id.to_owned()),
        }
    }
}

/// Every day record of a single month, keyed by
/// [day_key](crate::utils::time::day_key). This is the unit that gets persisted, so changing a
/// single day rewrites the whole month.
pub type MonthData = BTreeMap<String, DailyRecord>;
