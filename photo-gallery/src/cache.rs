use chrono::{DateTime, Duration, Utc};

/// One week, the lifetime of an online listing and its signed URLs
pub const DEFAULT_TTL: Duration = Duration::seconds(604_800);

/// A value together with the time it was fetched
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Cached<T> {
    pub fn new(data: T, fetched_at: DateTime<Utc>) -> Self {
        Self { data, fetched_at }
    }

    /// Still servable at `now` without re-fetching
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}
