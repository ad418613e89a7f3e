//! Daily call budget for the metered mapping service.
//!
//! State is one small JSON record `{date, calls_used}` rewritten on each
//! check/use. The counter resets lazily the first time the stored date
//! differs from today; there is no scheduled job. Read-modify-write is not
//! atomic across processes, so under concurrent load this is a soft
//! ceiling, not a hard guarantee.

use std::fs;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuotaState {
    date: NaiveDate,
    calls_used: u32,
}

/// Gates calls to a metered external service to at most `daily_limit` per
/// calendar day. A limit of zero or below disables the service entirely.
pub struct QuotaGovernor {
    path: PathBuf,
    daily_limit: i64,
}

impl QuotaGovernor {
    pub fn new(path: PathBuf, daily_limit: i64) -> Self {
        Self { path, daily_limit }
    }

    /// Whether another metered call is allowed today.
    pub fn can_call(&self) -> bool {
        self.can_call_on(Local::now().date_naive())
    }

    /// Record one metered call against today's budget.
    pub fn record_call(&self) {
        self.record_call_on(Local::now().date_naive());
    }

    pub fn can_call_on(&self, today: NaiveDate) -> bool {
        if self.daily_limit <= 0 {
            return false;
        }
        i64::from(self.used_on(today)) < self.daily_limit
    }

    pub fn record_call_on(&self, today: NaiveDate) {
        let state = QuotaState {
            date: today,
            calls_used: self.used_on(today).saturating_add(1),
        };
        debug!(used = state.calls_used, limit = self.daily_limit, "mapping call recorded");
        if let Err(e) = self.write(&state) {
            // A lost increment under-counts usage; the cap is soft by design.
            warn!(path = %self.path.display(), error = %e, "could not persist quota counter");
        }
    }

    /// Today's recorded usage, applying the lazy date rollover.
    fn used_on(&self, today: NaiveDate) -> u32 {
        self.load()
            .filter(|state| state.date == today)
            .map(|state| state.calls_used)
            .unwrap_or(0)
    }

    fn load(&self) -> Option<QuotaState> {
        let text = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&text) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable quota file, treating as empty");
                None
            }
        }
    }

    fn write(&self, state: &QuotaState) -> std::io::Result<()> {
        let body = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor(dir: &tempfile::TempDir, limit: i64) -> QuotaGovernor {
        QuotaGovernor::new(dir.path().join("quota.json"), limit)
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn fresh_counter_allows_calls() {
        let dir = tempfile::tempdir().unwrap();
        let quota = governor(&dir, 2);
        assert!(quota.can_call_on(day("2026-08-30")));
    }

    #[test]
    fn cap_blocks_after_limit_same_day() {
        let dir = tempfile::tempdir().unwrap();
        let quota = governor(&dir, 2);
        let today = day("2026-08-30");

        quota.record_call_on(today);
        assert!(quota.can_call_on(today));
        quota.record_call_on(today);
        assert!(!quota.can_call_on(today));
    }

    #[test]
    fn date_rollover_resets_usage() {
        let dir = tempfile::tempdir().unwrap();
        let quota = governor(&dir, 2);

        let today = day("2026-08-30");
        quota.record_call_on(today);
        quota.record_call_on(today);
        assert!(!quota.can_call_on(today));

        let tomorrow = day("2026-08-31");
        assert!(quota.can_call_on(tomorrow));
        quota.record_call_on(tomorrow);
        // The rollover dropped the old count, so one call is recorded.
        assert!(quota.can_call_on(tomorrow));
    }

    #[test]
    fn zero_limit_disables_the_service() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!governor(&dir, 0).can_call_on(day("2026-08-30")));
        assert!(!governor(&dir, -5).can_call_on(day("2026-08-30")));
    }

    #[test]
    fn corrupt_counter_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let quota = governor(&dir, 2);
        fs::write(dir.path().join("quota.json"), "not json").unwrap();
        assert!(quota.can_call_on(day("2026-08-30")));
    }
}
