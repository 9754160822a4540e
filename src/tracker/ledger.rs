use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::{
    storage::{
        entities::{DailyRecord, MonthData},
        local_store::{read_json, write_json, LocalStore},
    },
    sync::{queue::SyncHandle, RemotePaths},
    utils::{
        clock::Clock,
        time::{day_key, month_storage_key},
    },
};

/// Per-day sets of completed task ids. Persisted a month at a time, mirrored a day at a time.
pub struct DailyLedger {
    store: Arc<dyn LocalStore>,
    sync: SyncHandle,
    paths: RemotePaths,
    clock: Arc<dyn Clock>,
}

impl DailyLedger {
    pub fn new(
        store: Arc<dyn LocalStore>,
        sync: SyncHandle,
        paths: RemotePaths,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            sync,
            paths,
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.time().date_naive()
    }

    /// All records of a 0-based month. Missing or malformed data is an empty month.
    pub fn month_data(&self, year: i32, month: u32) -> Result<MonthData> {
        Ok(read_json(self.store.as_ref(), &month_storage_key(year, month))?.unwrap_or_default())
    }

    /// Record of `date`, or an empty one. Never writes anything.
    pub fn day_record(&self, date: NaiveDate) -> Result<DailyRecord> {
        let mut month = self.month_data(date.year(), date.month0())?;
        Ok(month.remove(&day_key(date)).unwrap_or_default())
    }

    pub fn today_record(&self) -> Result<DailyRecord> {
        self.day_record(self.today())
    }

    /// Replaces the record of `date`. The whole month is written back locally, only the day
    /// itself is mirrored.
    pub fn set_day_record(&self, date: NaiveDate, record: DailyRecord) -> Result<()> {
        let key = day_key(date);
        let storage_key = month_storage_key(date.year(), date.month0());

        let mut month: MonthData =
            read_json(self.store.as_ref(), &storage_key)?.unwrap_or_default();
        let value = serde_json::to_value(&record)?;
        month.insert(key.clone(), record);
        write_json(self.store.as_ref(), &storage_key, &month)?;

        self.sync.push(self.paths.daily(&key), value);
        Ok(())
    }

    /// Flips `task_id` in today's record and returns the new record.
    pub fn toggle(&self, task_id: &str) -> Result<DailyRecord> {
        let today = self.today();
        let mut record = self.day_record(today)?;
        record.toggle(task_id);
        self.set_day_record(today, record.clone())?;
        info!(
            "Task {task_id} is now {} for {}",
            if record.is_completed(task_id) { "done" } else { "not done" },
            day_key(today)
        );
        Ok(record)
    }
}
