use chrono::{DateTime, FixedOffset, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }
}

/// Offset of the survey's local civil time from UTC (UTC+9).
pub const SURVEY_UTC_OFFSET_SECS: i32 = 9 * 3600;

const SURVEY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed offset used for every timestamp written to the ledger.
#[must_use]
pub fn survey_offset() -> Option<FixedOffset> {
    FixedOffset::east_opt(SURVEY_UTC_OFFSET_SECS)
}

/// Format an instant as survey-local wall-clock time, e.g. `2024-05-01 09:30:00`.
#[must_use]
pub fn format_survey_timestamp(at: DateTime<Utc>) -> String {
    match survey_offset() {
        Some(offset) => at.with_timezone(&offset).format(SURVEY_TIMESTAMP_FORMAT).to_string(),
        None => at.format(SURVEY_TIMESTAMP_FORMAT).to_string(),
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
