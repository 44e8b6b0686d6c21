use chrono::{DateTime, Utc};

/// Produces the run stamp that prefixes archive file names.
pub trait Clock {
    fn stamp(&self) -> String;
}

/// Wall-clock UTC, e.g. `2024-05-01-17-03-09`.
pub struct SystemClock;

impl Clock for SystemClock {
    fn stamp(&self) -> String {
        format_stamp(Utc::now())
    }
}

/// Always returns the same stamp.
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn stamp(&self) -> String {
        self.0.clone()
    }
}

pub fn format_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d-%H-%M-%S").to_string()
}
