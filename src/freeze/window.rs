//! Temporal matching for freeze windows.
//!
//! A window is "active now" iff `now ∈ [start, end)` evaluated in the
//! window's own timezone. A recurring window applies the same check to the
//! next unconsumed occurrence of its lazily-produced sequence; the sequence
//! is infinite unless the recurrence carries an `until` bound.

use super::errors::FreezeError;
use super::types::{FreezeWindow, Recurrence, RecurrencePattern};
use chrono::{DateTime, Days, FixedOffset, Months, NaiveDateTime, Utc};

/// One concrete instance of a window, in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOccurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Parse a window timezone: `"UTC"` (or empty) or a fixed offset such as
/// `"+05:30"` / `"-08:00"`
pub fn parse_timezone(timezone: &str) -> Result<FixedOffset, FreezeError> {
    match timezone {
        "" | "UTC" | "utc" | "Z" => Ok(FixedOffset::east_opt(0).expect("zero offset")),
        other => other
            .parse::<FixedOffset>()
            .map_err(|_| FreezeError::InvalidTimezone {
                timezone: timezone.to_string(),
            }),
    }
}

/// Lazy iterator over a window's occurrences, in order
struct Occurrences {
    offset: FixedOffset,
    current: Option<(NaiveDateTime, NaiveDateTime)>,
    recurrence: Option<Recurrence>,
}

impl Iterator for Occurrences {
    type Item = WindowOccurrence;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, end) = self.current?;

        self.current = match self.recurrence {
            None => None,
            Some(recurrence) => advance(start, end, recurrence).filter(|(next_start, _)| {
                recurrence.until.map_or(true, |until| *next_start <= until)
            }),
        };

        Some(WindowOccurrence {
            start: to_utc(start, self.offset),
            end: to_utc(end, self.offset),
        })
    }
}

/// Step one occurrence forward by the recurrence cadence
fn advance(
    start: NaiveDateTime,
    end: NaiveDateTime,
    recurrence: Recurrence,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let every = recurrence.every.unwrap_or(1);
    let shift = |t: NaiveDateTime| match recurrence.pattern {
        RecurrencePattern::Daily => t.checked_add_days(Days::new(u64::from(every))),
        RecurrencePattern::Weekly => t.checked_add_days(Days::new(7 * u64::from(every))),
        RecurrencePattern::Monthly => t.checked_add_months(Months::new(every)),
        RecurrencePattern::Yearly => t.checked_add_months(Months::new(12 * every)),
    };
    Some((shift(start)?, shift(end)?))
}

fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(local - offset, Utc)
}

/// All occurrences of a window, lazily, from its base instance onward
pub fn occurrences(
    window: &FreezeWindow,
) -> Result<impl Iterator<Item = WindowOccurrence>, FreezeError> {
    let offset = parse_timezone(&window.timezone)?;
    Ok(Occurrences {
        offset,
        current: Some((window.start_time, window.end_time)),
        recurrence: window.recurrence,
    })
}

/// Future occurrences only: the "upcoming windows" sequence
pub fn upcoming_occurrences(
    window: &FreezeWindow,
    now: DateTime<Utc>,
) -> Result<impl Iterator<Item = WindowOccurrence>, FreezeError> {
    Ok(occurrences(window)?.filter(move |occ| occ.start > now))
}

/// Check whether the window is active at `now`.
///
/// Occurrences are strictly increasing, so the scan stops at the first one
/// starting after `now`.
pub fn window_active_at(window: &FreezeWindow, now: DateTime<Utc>) -> Result<bool, FreezeError> {
    for occurrence in occurrences(window)? {
        if occurrence.start > now {
            return Ok(false);
        }
        if now < occurrence.end {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Epoch millis of the first future occurrence, or `None` when the
/// sequence is exhausted (non-recurring and already past, or recurrence
/// bound passed)
pub fn next_iteration(
    window: &FreezeWindow,
    now: DateTime<Utc>,
) -> Result<Option<i64>, FreezeError> {
    Ok(upcoming_occurrences(window, now)?
        .next()
        .map(|occ| occ.start.timestamp_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freeze::types::WindowEnd;
    use chrono::{NaiveDate, TimeZone};

    fn naive(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn daily_window(start: NaiveDateTime) -> FreezeWindow {
        FreezeWindow::build(
            "UTC",
            start,
            WindowEnd::DurationMinutes(120),
            Some(Recurrence {
                pattern: RecurrencePattern::Daily,
                until: None,
                every: None,
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_plain_window_active_inside_bounds() {
        let window =
            FreezeWindow::build("UTC", naive(2023, 5, 1, 9), WindowEnd::DurationMinutes(120), None)
                .unwrap();

        assert!(!window_active_at(&window, utc(2023, 5, 1, 8)).unwrap());
        assert!(window_active_at(&window, utc(2023, 5, 1, 10)).unwrap());
        // end is exclusive
        assert!(!window_active_at(&window, utc(2023, 5, 1, 11)).unwrap());
    }

    #[test]
    fn test_offset_timezone_shifts_activity() {
        // 09:00 at +05:30 is 03:30 UTC
        let window = FreezeWindow::build(
            "+05:30",
            naive(2023, 5, 1, 9),
            WindowEnd::DurationMinutes(60),
            None,
        )
        .unwrap();

        assert!(window_active_at(&window, Utc.with_ymd_and_hms(2023, 5, 1, 3, 45, 0).unwrap())
            .unwrap());
        assert!(!window_active_at(&window, utc(2023, 5, 1, 9)).unwrap());
    }

    #[test]
    fn test_daily_recurrence_matches_each_day() {
        let window = daily_window(naive(2023, 5, 1, 9));

        assert!(window_active_at(&window, utc(2023, 5, 3, 10)).unwrap());
        assert!(!window_active_at(&window, utc(2023, 5, 3, 12)).unwrap());
    }

    #[test]
    fn test_recurring_past_window_has_next_iteration() {
        let window = daily_window(naive(2023, 5, 1, 9));
        let now = utc(2023, 5, 10, 12);

        let next = next_iteration(&window, now).unwrap().unwrap();
        assert_eq!(next, utc(2023, 5, 11, 9).timestamp_millis());
    }

    #[test]
    fn test_spent_window_has_no_next_iteration() {
        let window =
            FreezeWindow::build("UTC", naive(2023, 5, 1, 9), WindowEnd::DurationMinutes(60), None)
                .unwrap();
        assert_eq!(next_iteration(&window, utc(2023, 6, 1, 0)).unwrap(), None);
    }

    #[test]
    fn test_until_bound_exhausts_recurrence() {
        let window = FreezeWindow::build(
            "UTC",
            naive(2023, 5, 1, 9),
            WindowEnd::DurationMinutes(60),
            Some(Recurrence {
                pattern: RecurrencePattern::Daily,
                until: Some(naive(2023, 5, 5, 9)),
                every: None,
            }),
        )
        .unwrap();

        assert!(window_active_at(&window, utc(2023, 5, 5, 9)).unwrap());
        assert!(!window_active_at(&window, utc(2023, 5, 6, 9)).unwrap());
        assert_eq!(next_iteration(&window, utc(2023, 5, 6, 0)).unwrap(), None);
    }

    #[test]
    fn test_monthly_recurrence_with_interval() {
        let window = FreezeWindow::build(
            "UTC",
            naive(2023, 1, 15, 0),
            WindowEnd::DurationMinutes(60),
            Some(Recurrence {
                pattern: RecurrencePattern::Monthly,
                until: None,
                every: Some(2),
            }),
        )
        .unwrap();

        // every second month: Jan, Mar, May...
        assert!(window_active_at(&window, Utc.with_ymd_and_hms(2023, 3, 15, 0, 30, 0).unwrap())
            .unwrap());
        assert!(!window_active_at(&window, Utc.with_ymd_and_hms(2023, 2, 15, 0, 30, 0).unwrap())
            .unwrap());
    }

    #[test]
    fn test_upcoming_sequence_is_strictly_future() {
        let window = daily_window(naive(2023, 5, 1, 9));
        let now = utc(2023, 5, 3, 10); // inside the May 3rd occurrence

        let upcoming: Vec<_> = upcoming_occurrences(&window, now)
            .unwrap()
            .take(3)
            .collect();
        assert_eq!(upcoming[0].start, utc(2023, 5, 4, 9));
        assert_eq!(upcoming[1].start, utc(2023, 5, 5, 9));
        assert_eq!(upcoming[2].start, utc(2023, 5, 6, 9));
    }
}
