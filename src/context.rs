use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of "now" for stamping stored documents.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant. Used by tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// Who is asking and when. Built once per request and passed down
/// explicitly to every pipeline call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: String,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>, clock: &dyn Clock) -> Self {
        Self {
            user_id: user_id.into(),
            now: clock.now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_context_uses_clock() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let ctx = RequestContext::new("alice", &FixedClock(at));

        assert_eq!(ctx.user_id, "alice");
        assert_eq!(ctx.now, at);
    }
}
