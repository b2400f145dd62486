//! The sliding fetch window.

use chrono::{DateTime, Months, Utc};
use linkcal_domain::constants::{WINDOW_MONTHS_AHEAD, WINDOW_MONTHS_BACK};

/// Bounded time range within which events are fetched and reconciled:
/// one month back through three months ahead, recomputed at every call.
///
/// Events outside this range are invisible to the sync and will be purged
/// from the store by the diff's delete-on-absence semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
}

impl FetchWindow {
    /// Window anchored at the current instant.
    pub fn current() -> Self {
        Self::anchored_at(Utc::now())
    }

    pub fn anchored_at(now: DateTime<Utc>) -> Self {
        Self {
            time_min: now.checked_sub_months(Months::new(WINDOW_MONTHS_BACK)).unwrap_or(now),
            time_max: now.checked_add_months(Months::new(WINDOW_MONTHS_AHEAD)).unwrap_or(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn window_spans_one_month_back_three_ahead() {
        let anchor = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let window = FetchWindow::anchored_at(anchor);
        assert_eq!(window.time_min, Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap());
        assert_eq!(window.time_max, Utc.with_ymd_and_hms(2024, 9, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn month_end_clamps_instead_of_overflowing() {
        let anchor = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        let window = FetchWindow::anchored_at(anchor);
        // February has no 31st; chrono clamps to the 29th (leap year).
        assert_eq!(window.time_min, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }
}
