use chrono::{Duration, Local, NaiveDateTime};
use parking_lot::Mutex;

/// Source of the date and time stamped on new log entries.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Server-local wall clock. Values carry no zone information.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to an explicit instant that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            current: Mutex::new(at),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        *self.current.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.current.lock()
    }
}
