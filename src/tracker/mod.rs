//! The controller the presentation layer talks to. Every user action maps to one method here:
//! the method updates the local store, queues a push to the remote mirror and tells the view
//! what to draw again.

pub mod ledger;
pub mod notify;
pub mod registry;

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use ledger::DailyLedger;
use notify::{Notifier, Refresh, RefreshReceiver};
use registry::TaskRegistry;
use serde_json::Value;
use tracing::info;

use crate::{
    aggregation::DayProgress,
    calendar::{MonthGrid, ViewState},
    identity::get_or_create_user_id,
    storage::{
        entities::{DailyRecord, Task, DEFAULT_APP_TITLE},
        local_store::LocalStore,
        TITLE_KEY,
    },
    sync::{
        queue::{PullTarget, SyncHandle, SyncQueue},
        RemoteMirror, RemotePaths,
    },
    utils::clock::Clock,
};

pub struct Tracker {
    user_id: String,
    store: Arc<dyn LocalStore>,
    registry: TaskRegistry,
    ledger: DailyLedger,
    queue: SyncQueue,
    sync: SyncHandle,
    paths: RemotePaths,
    notifier: Notifier,
    view: ViewState,
}

impl Tracker {
    /// Wires the tracker together and starts the sync queue on the current tokio runtime. The
    /// returned receiver gets a [Refresh] whenever part of the view is out of date.
    pub fn start(
        store: Arc<dyn LocalStore>,
        mirror: Arc<dyn RemoteMirror>,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, RefreshReceiver)> {
        let user_id = get_or_create_user_id(store.as_ref(), clock.as_ref())?;
        let paths = RemotePaths::new(&user_id);
        let (notifier, refreshes) = Notifier::channel();
        let queue = SyncQueue::start(mirror, store.clone(), notifier.clone());
        let sync = queue.handle();

        let registry = TaskRegistry::new(store.clone(), sync.clone(), paths.clone(), clock.clone());
        let ledger = DailyLedger::new(store.clone(), sync.clone(), paths.clone(), clock.clone());
        let view = ViewState::current(ledger.today());

        info!("Tracker started for {user_id}");
        Ok((
            Self {
                user_id,
                store,
                registry,
                ledger,
                queue,
                sync,
                paths,
                notifier,
                view,
            },
            refreshes,
        ))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &DailyLedger {
        &self.ledger
    }

    pub fn today(&self) -> NaiveDate {
        self.ledger.today()
    }

    /// Local task list. Also asks the remote for its copy, which replaces the local one when it
    /// arrives and triggers another [Refresh::TaskList].
    pub fn tasks(&self) -> Result<Vec<Task>> {
        let tasks = self.registry.list()?;
        self.sync.pull(self.paths.tasks(), PullTarget::Tasks);
        Ok(tasks)
    }

    pub fn add_task(&self, name: &str) -> Result<Option<Task>> {
        let task = self.registry.add(name)?;
        if task.is_some() {
            self.notifier.notify_all(&[Refresh::TaskList, Refresh::Calendar]);
        }
        Ok(task)
    }

    pub fn remove_task(&self, id: &str) -> Result<()> {
        self.registry.remove(id)?;
        self.notifier.notify_all(&[Refresh::TaskList, Refresh::Calendar]);
        Ok(())
    }

    /// Marks `task_id` done for today, or undoes it.
    pub fn toggle_task(&self, task_id: &str) -> Result<DailyRecord> {
        let record = self.ledger.toggle(task_id)?;
        self.notifier.notify_all(&[Refresh::TaskList, Refresh::Calendar]);
        Ok(record)
    }

    pub fn today_record(&self) -> Result<DailyRecord> {
        self.ledger.today_record()
    }

    /// How many of the live tasks are done today.
    pub fn today_progress(&self) -> Result<DayProgress> {
        let tasks = self.registry.list()?;
        let record = self.ledger.today_record()?;
        Ok(DayProgress::new(&record, &tasks))
    }

    /// Stored title or the default one. Like [Tracker::tasks] this also pulls the remote copy.
    pub fn title(&self) -> Result<String> {
        let title = self.local_title()?;
        self.sync.pull(self.paths.title(), PullTarget::Title);
        Ok(title)
    }

    /// Stored title or the default one, without asking the remote.
    pub fn local_title(&self) -> Result<String> {
        Ok(self
            .store
            .get(TITLE_KEY)?
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APP_TITLE.to_owned()))
    }

    /// Saves a trimmed title. A blank title resets to the default. Returns what was saved.
    pub fn set_title(&self, title: &str) -> Result<String> {
        let title = match title.trim() {
            "" => DEFAULT_APP_TITLE,
            title => title,
        };
        self.store.set(TITLE_KEY, title)?;
        self.sync
            .push(self.paths.title(), Value::String(title.to_owned()));
        self.notifier.notify(Refresh::Title);
        info!("Title set to {title}");
        Ok(title.to_owned())
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn prev_month(&mut self) {
        self.view.prev_month();
        self.notifier.notify(Refresh::Calendar);
    }

    pub fn next_month(&mut self) {
        self.view.next_month();
        self.notifier.notify(Refresh::Calendar);
    }

    /// Heatmap of the displayed month, computed from the local store.
    pub fn month_grid(&self) -> Result<MonthGrid> {
        let tasks = self.registry.list()?;
        let month = self.ledger.month_data(self.view.year, self.view.month)?;
        MonthGrid::build(self.view, &month, &tasks, self.today())
    }

    /// Pulls tasks and title from the remote without reading them locally.
    pub fn refresh_from_remote(&self) {
        self.sync.pull(self.paths.tasks(), PullTarget::Tasks);
        self.sync.pull(self.paths.title(), PullTarget::Title);
    }

    /// Waits for every queued push and pull to finish.
    pub async fn flush(&self) {
        self.sync.flush().await;
    }

    pub async fn shutdown(self) -> Result<()> {
        self.queue.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use chrono::{Duration, NaiveDate};
    use serde_json::json;

    use crate::{
        aggregation::ColorBand,
        calendar::ViewState,
        storage::{
            entities::DailyRecord,
            local_store::{FileStore, LocalStore, MemoryStore},
            TASKS_KEY, USER_ID_KEY,
        },
        sync::{memory::MemoryMirror, RemoteMirror},
        utils::{
            clock::{Clock, TestClock},
            logging::TEST_LOGGING,
        },
    };

    use super::{notify::{Refresh, RefreshReceiver}, Tracker};

    struct Fixture {
        tracker: Tracker,
        refreshes: RefreshReceiver,
        store: Arc<MemoryStore>,
        mirror: Arc<MemoryMirror>,
        clock: Arc<TestClock>,
    }

    fn fixture() -> Result<Fixture> {
        *TEST_LOGGING;
        let store = Arc::new(MemoryStore::new());
        store.set("userId", "user_1_1")?;
        let mirror = Arc::new(MemoryMirror::new());
        let clock = Arc::new(TestClock::at(2026, 10, 19));
        let (tracker, refreshes) = Tracker::start(store.clone(), mirror.clone(), clock.clone())?;
        Ok(Fixture {
            tracker,
            refreshes,
            store,
            mirror,
            clock,
        })
    }

    fn drain(refreshes: &mut RefreshReceiver) -> Vec<Refresh> {
        let mut received = vec![];
        while let Ok(refresh) = refreshes.try_recv() {
            received.push(refresh);
        }
        received
    }

    #[tokio::test]
    async fn test_add_then_remove_leaves_stale_completion() -> Result<()> {
        let Fixture {
            tracker,
            mut refreshes,
            clock,
            ..
        } = fixture()?;

        let read = tracker.add_task("  Read ")?.expect("name is not blank");
        assert_eq!(read.name, "Read");
        assert_eq!(read.id, clock.timestamp_millis().to_string());
        clock.advance(Duration::milliseconds(10));
        let run = tracker.add_task("Run")?.expect("name is not blank");

        tracker.toggle_task(&read.id)?;
        assert_eq!(*tracker.today_progress()?.percentage, 50.);

        tracker.remove_task(&read.id)?;
        assert_eq!(tracker.registry().list()?, vec![run.clone()]);
        assert!(tracker.today_record()?.is_completed(&read.id));
        let progress = tracker.today_progress()?;
        assert_eq!((progress.completed, progress.total), (0, 1));

        tracker.remove_task(&run.id)?;
        assert!(tracker.registry().list()?.is_empty());
        assert_eq!(*tracker.today_progress()?.percentage, 0.);

        let received = drain(&mut refreshes);
        assert_eq!(received.len(), 10);
        assert!(received.chunks(2).all(|pair| pair == [Refresh::TaskList, Refresh::Calendar]));

        tracker.shutdown().await
    }

    #[tokio::test]
    async fn test_blank_task_is_ignored() -> Result<()> {
        let Fixture {
            tracker,
            mut refreshes,
            store,
            ..
        } = fixture()?;

        assert_eq!(tracker.add_task("   ")?, None);
        assert_eq!(tracker.add_task("")?, None);
        assert_eq!(store.get(TASKS_KEY)?, None);
        assert!(drain(&mut refreshes).is_empty());
        tracker.shutdown().await
    }

    #[tokio::test]
    async fn test_ids_stay_unique_within_a_millisecond() -> Result<()> {
        let Fixture { tracker, .. } = fixture()?;

        let first = tracker.add_task("Read")?.expect("name is not blank");
        let second = tracker.add_task("Run")?.expect("name is not blank");
        let third = tracker.add_task("Stretch")?.expect("name is not blank");

        let first_id: i64 = first.id.parse()?;
        assert_eq!(second.id, (first_id + 1).to_string());
        assert_eq!(third.id, (first_id + 2).to_string());
        tracker.shutdown().await
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_record() -> Result<()> {
        let Fixture { tracker, .. } = fixture()?;
        let task = tracker.add_task("Read")?.expect("name is not blank");

        let before = tracker.today_record()?;
        tracker.toggle_task(&task.id)?;
        assert!(tracker.today_record()?.is_completed(&task.id));
        tracker.toggle_task(&task.id)?;
        assert_eq!(tracker.today_record()?, before);
        tracker.shutdown().await
    }

    #[tokio::test]
    async fn test_day_record_round_trip() -> Result<()> {
        let Fixture { tracker, store, .. } = fixture()?;
        let date = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        let record = DailyRecord {
            completed: vec!["1".into(), "2".into()],
        };

        assert_eq!(tracker.ledger().day_record(date)?, DailyRecord::default());
        assert_eq!(store.get("consistency-2026-2")?, None);

        tracker.ledger().set_day_record(date, record.clone())?;
        assert_eq!(tracker.ledger().day_record(date)?, record);

        let other = NaiveDate::from_ymd_opt(2026, 2, 4).unwrap();
        tracker.ledger().set_day_record(other, DailyRecord::default())?;
        assert_eq!(tracker.ledger().day_record(date)?, record);
        assert_eq!(tracker.ledger().month_data(2026, 1)?.len(), 2);
        tracker.shutdown().await
    }

    #[tokio::test]
    async fn test_changes_are_mirrored() -> Result<()> {
        let Fixture {
            tracker,
            store,
            mirror,
            ..
        } = fixture()?;

        let task = tracker.add_task("Read")?.expect("name is not blank");
        tracker.toggle_task(&task.id)?;
        tracker.set_title("Habits")?;
        tracker.flush().await;

        assert_eq!(
            mirror.pull("users/user_1_1/tasks").await?,
            Some(json!([{"id": &task.id, "name": "Read"}]))
        );
        assert_eq!(
            mirror.pull("users/user_1_1/daily/2026-10-19").await?,
            Some(json!({"completed": [&task.id]}))
        );
        assert_eq!(
            mirror.pull("users/user_1_1/appTitle").await?,
            Some(json!("Habits"))
        );
        assert_eq!(
            mirror.paths(),
            vec![
                "users/user_1_1/appTitle".to_string(),
                "users/user_1_1/daily/2026-10-19".to_string(),
                "users/user_1_1/tasks".to_string(),
            ]
        );
        assert_eq!(
            store.get("consistency-2026-10")?,
            Some(format!(r#"{{"2026-10-19":{{"completed":["{}"]}}}}"#, task.id))
        );
        tracker.shutdown().await
    }

    #[tokio::test]
    async fn test_remote_tasks_win_on_load() -> Result<()> {
        let Fixture {
            tracker,
            mut refreshes,
            mirror,
            ..
        } = fixture()?;
        tracker.add_task("Local")?;
        tracker.flush().await;
        drain(&mut refreshes);

        mirror
            .push("users/user_1_1/tasks", &json!([{"id": "5", "name": "Remote"}]))
            .await?;

        let first_render = tracker.tasks()?;
        assert_eq!(first_render[0].name, "Local");

        tracker.flush().await;
        assert_eq!(drain(&mut refreshes), vec![Refresh::TaskList, Refresh::Calendar]);
        let second_render = tracker.tasks()?;
        assert_eq!(second_render.len(), 1);
        assert_eq!(second_render[0].name, "Remote");
        tracker.shutdown().await
    }

    #[tokio::test]
    async fn test_title_defaults_and_trims() -> Result<()> {
        let Fixture {
            tracker,
            mut refreshes,
            mirror,
            ..
        } = fixture()?;

        assert_eq!(tracker.title()?, "My Consistency Tracker");
        assert_eq!(tracker.set_title("  Morning  ")?, "Morning");
        assert_eq!(tracker.title()?, "Morning");
        assert_eq!(tracker.set_title("   ")?, "My Consistency Tracker");

        tracker.flush().await;
        mirror
            .push("users/user_1_1/appTitle", &json!("From phone"))
            .await?;
        drain(&mut refreshes);

        tracker.refresh_from_remote();
        tracker.flush().await;
        assert_eq!(drain(&mut refreshes), vec![Refresh::Title]);
        assert_eq!(tracker.title()?, "From phone");
        tracker.shutdown().await
    }

    #[tokio::test]
    async fn test_month_grid_follows_navigation() -> Result<()> {
        let Fixture {
            mut tracker,
            mut refreshes,
            ..
        } = fixture()?;
        let read = tracker.add_task("Read")?.expect("name is not blank");
        tracker.add_task("Run")?;
        tracker.toggle_task(&read.id)?;
        drain(&mut refreshes);

        let grid = tracker.month_grid()?;
        let today = grid.days.iter().find(|d| d.is_today).expect("today is shown");
        assert_eq!(today.day, 19);
        assert_eq!(today.band, ColorBand::Medium);

        tracker.prev_month();
        assert_eq!(tracker.view(), ViewState { year: 2026, month: 8 });
        assert!(tracker.month_grid()?.days.iter().all(|d| !d.is_today));
        for _ in 0..4 {
            tracker.next_month();
        }
        assert_eq!(tracker.view(), ViewState { year: 2027, month: 0 });
        assert_eq!(drain(&mut refreshes), vec![Refresh::Calendar; 5]);
        tracker.shutdown().await
    }

    #[tokio::test]
    async fn test_malformed_local_data_is_treated_as_absent() -> Result<()> {
        let Fixture { tracker, store, .. } = fixture()?;
        store.set(TASKS_KEY, "not json")?;
        store.set("consistency-2026-10", "{\"2026-10-19\": 3}")?;

        assert!(tracker.registry().list()?.is_empty());
        assert_eq!(tracker.today_record()?, DailyRecord::default());
        assert_eq!(*tracker.today_progress()?.percentage, 0.);

        let task = tracker.add_task("Read")?.expect("name is not blank");
        assert_eq!(tracker.registry().list()?, vec![task]);
        tracker.shutdown().await
    }

    #[tokio::test]
    async fn test_corrupt_user_id_file_gets_fresh_id() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(USER_ID_KEY), [0xff, 0xfe, 0x00, 0x80])?;
        std::fs::write(dir.path().join(TASKS_KEY), [0xc3, 0x28])?;

        let store = Arc::new(FileStore::new(dir.path().to_owned())?);
        let clock = Arc::new(TestClock::at(2026, 10, 19));
        let (tracker, _refreshes) = Tracker::start(
            store.clone(),
            Arc::new(MemoryMirror::new()),
            clock.clone(),
        )?;

        let prefix = format!("user_{}_", clock.timestamp_millis());
        assert!(tracker.user_id().starts_with(&prefix));
        assert_eq!(store.get(USER_ID_KEY)?.as_deref(), Some(tracker.user_id()));
        assert!(tracker.registry().list()?.is_empty());
        tracker.shutdown().await
    }
}
