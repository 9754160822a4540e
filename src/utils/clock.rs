use chrono::{DateTime, Local};

/// Represents an entity responsible for providing dates across application. This allows tests to
/// pin "today" to a known calendar day.
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Local>;

    fn timestamp_millis(&self) -> i64 {
        self.time().timestamp_millis()
    }
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Local> {
        Local::now()
    }
}

#[cfg(test)]
pub use test_clock::TestClock;
