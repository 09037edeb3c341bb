//! Six-weeks grading period resolution.
//!
//! A date maps to the first period whose inclusive range contains it. Dates
//! outside every range (before the year, after it, or inside a holiday gap)
//! resolve to the calendar's last period instead of failing, so callers must
//! not use resolution to validate dates.

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::Serialize;
use tracing::debug;

use crate::error::CalendarError;
use crate::models::{Assignment, PeriodRange, SixWeeksPeriod, TaggedAssignment};
use crate::notify::{Notice, Notifier};

const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid calendar date"),
    }
}

/// The 2024-25 academic year.
pub const DEFAULT_RANGES: [PeriodRange; 6] = [
    PeriodRange {
        period: SixWeeksPeriod::First,
        start: ymd(2024, 8, 14),
        end: ymd(2024, 9, 22),
    },
    PeriodRange {
        period: SixWeeksPeriod::Second,
        start: ymd(2024, 9, 23),
        end: ymd(2024, 11, 3),
    },
    PeriodRange {
        period: SixWeeksPeriod::Third,
        start: ymd(2024, 11, 4),
        end: ymd(2024, 12, 22),
    },
    PeriodRange {
        period: SixWeeksPeriod::Fourth,
        start: ymd(2025, 1, 9),
        end: ymd(2025, 2, 19),
    },
    PeriodRange {
        period: SixWeeksPeriod::Fifth,
        start: ymd(2025, 2, 24),
        end: ymd(2025, 4, 17),
    },
    PeriodRange {
        period: SixWeeksPeriod::Sixth,
        start: ymd(2025, 4, 22),
        end: ymd(2025, 5, 29),
    },
];

fn find_range(ranges: &[PeriodRange], date: NaiveDate) -> Option<&PeriodRange> {
    ranges.iter().find(|range| range.contains(date))
}

/// Resolves `date` against the built-in calendar.
pub fn resolve_period(date: NaiveDate) -> SixWeeksPeriod {
    find_range(&DEFAULT_RANGES, date)
        .map(|range| range.period)
        .unwrap_or(SixWeeksPeriod::Sixth)
}

/// Resolves today's local date against the built-in calendar.
pub fn current_period() -> SixWeeksPeriod {
    resolve_period(Local::now().date_naive())
}

/// A validated, ordered set of period ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodCalendar {
    ranges: Vec<PeriodRange>,
}

impl Default for PeriodCalendar {
    fn default() -> Self {
        Self {
            ranges: DEFAULT_RANGES.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeCheck {
    pub period: SixWeeksPeriod,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub matches: bool,
}

/// How a single date was resolved, for troubleshooting misfiled assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodExplanation {
    pub date: NaiveDate,
    pub matched_period: SixWeeksPeriod,
    pub in_range: bool,
    pub ranges: Vec<RangeCheck>,
}

impl PeriodCalendar {
    /// Ranges must be non-empty, ascending, non-overlapping and name each
    /// period at most once. Gaps between ranges are allowed.
    pub fn new(ranges: Vec<PeriodRange>) -> Result<Self, CalendarError> {
        if ranges.is_empty() {
            return Err(CalendarError::Empty);
        }

        let mut seen = HashSet::new();
        for range in &ranges {
            if range.start > range.end {
                return Err(CalendarError::Inverted {
                    period: range.period,
                    start: range.start,
                    end: range.end,
                });
            }
            if !seen.insert(range.period) {
                return Err(CalendarError::Duplicate(range.period));
            }
        }

        for pair in ranges.windows(2) {
            if pair[1].start <= pair[0].end {
                return Err(CalendarError::OutOfOrder {
                    earlier: pair[0].period,
                    later: pair[1].period,
                    start: pair[1].start,
                });
            }
        }

        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[PeriodRange] {
        &self.ranges
    }

    /// The period returned for dates no range contains.
    pub fn fallback(&self) -> SixWeeksPeriod {
        self.ranges
            .last()
            .map(|range| range.period)
            .unwrap_or(SixWeeksPeriod::Sixth)
    }

    pub fn resolve(&self, date: NaiveDate) -> SixWeeksPeriod {
        find_range(&self.ranges, date)
            .map(|range| range.period)
            .unwrap_or_else(|| self.fallback())
    }

    /// Resolves the calendar date of `moment` in its own time zone.
    pub fn resolve_datetime<Tz: TimeZone>(&self, moment: &DateTime<Tz>) -> SixWeeksPeriod {
        self.resolve(moment.date_naive())
    }

    pub fn current(&self) -> SixWeeksPeriod {
        self.resolve_datetime(&Local::now())
    }

    pub fn bounds(&self, period: SixWeeksPeriod) -> Option<&PeriodRange> {
        self.ranges.iter().find(|range| range.period == period)
    }

    pub fn explain(&self, date: NaiveDate) -> PeriodExplanation {
        let ranges: Vec<RangeCheck> = self
            .ranges
            .iter()
            .map(|range| RangeCheck {
                period: range.period,
                start: range.start,
                end: range.end,
                matches: range.contains(date),
            })
            .collect();

        PeriodExplanation {
            date,
            matched_period: self.resolve(date),
            in_range: ranges.iter().any(|check| check.matches),
            ranges,
        }
    }

    /// Recomputes the period of every assignment from its due date. Due
    /// dates outside the calendar are reported to `notifier`.
    pub fn tag_assignments(
        &self,
        assignments: &[Assignment],
        notifier: &dyn Notifier,
    ) -> Vec<TaggedAssignment> {
        assignments
            .iter()
            .map(|assignment| {
                let matched = find_range(&self.ranges, assignment.due_date);
                let six_weeks_period = matched
                    .map(|range| range.period)
                    .unwrap_or_else(|| self.fallback());

                if matched.is_none() {
                    notifier.notify(&Notice::warning(
                        "Date outside grading calendar",
                        format!(
                            "{} is due {}, which matches no six-weeks period; filed under {}",
                            assignment.name, assignment.due_date, six_weeks_period
                        ),
                    ));
                } else {
                    debug!(
                        assignment = %assignment.name,
                        due = %assignment.due_date,
                        period = %six_weeks_period,
                        "tagged assignment"
                    );
                }

                TaggedAssignment {
                    assignment: assignment.clone(),
                    six_weeks_period,
                    in_range: matched.is_some(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::notify::{MemoryNotifier, NoticeLevel};
    use chrono::{FixedOffset, TimeZone, Utc};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn assignment(name: &str, due_date: NaiveDate) -> Assignment {
        Assignment {
            name: name.to_string(),
            due_date,
            category: Category::Daily,
            google_classroom_id: None,
            google_course_id: None,
        }
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(resolve_period(date(2024, 8, 14)), SixWeeksPeriod::First);
        assert_eq!(resolve_period(date(2024, 9, 22)), SixWeeksPeriod::First);
        assert_eq!(resolve_period(date(2024, 9, 23)), SixWeeksPeriod::Second);
        assert_eq!(resolve_period(date(2024, 12, 22)), SixWeeksPeriod::Third);
        assert_eq!(resolve_period(date(2025, 1, 9)), SixWeeksPeriod::Fourth);
        assert_eq!(resolve_period(date(2025, 3, 15)), SixWeeksPeriod::Fifth);
        assert_eq!(resolve_period(date(2025, 5, 29)), SixWeeksPeriod::Sixth);
    }

    #[test]
    fn unmatched_dates_fall_back_to_last_period() {
        // before the year
        assert_eq!(resolve_period(date(2024, 8, 1)), SixWeeksPeriod::Sixth);
        // winter break
        assert_eq!(resolve_period(date(2024, 12, 30)), SixWeeksPeriod::Sixth);
        // spring gap between 5SW and 6SW
        assert_eq!(resolve_period(date(2025, 4, 20)), SixWeeksPeriod::Sixth);
        // summer
        assert_eq!(resolve_period(date(2025, 7, 4)), SixWeeksPeriod::Sixth);
    }

    #[test]
    fn resolution_is_idempotent() {
        let day = date(2024, 10, 1);
        assert_eq!(resolve_period(day), resolve_period(day));
        let calendar = PeriodCalendar::default();
        assert_eq!(calendar.resolve(day), calendar.resolve(day));
    }

    #[test]
    fn default_calendar_matches_free_function() {
        let calendar = PeriodCalendar::default();
        let mut day = date(2024, 8, 1);
        while day <= date(2025, 6, 30) {
            assert_eq!(calendar.resolve(day), resolve_period(day), "{day}");
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn current_period_matches_today() {
        let expected = resolve_period(Local::now().date_naive());
        assert_eq!(current_period(), expected);
    }

    #[test]
    fn calendar_current_matches_today() {
        let calendar = PeriodCalendar::default();
        let expected = calendar.resolve(Local::now().date_naive());
        assert_eq!(calendar.current(), expected);
        assert_eq!(calendar.current(), current_period());
    }

    #[test]
    fn datetimes_resolve_in_their_own_zone() {
        let calendar = PeriodCalendar::default();
        // 23:30 on the last day of 1SW in Central time is already 2SW in UTC.
        let central = FixedOffset::west_opt(5 * 3600).unwrap();
        let moment = central.with_ymd_and_hms(2024, 9, 22, 23, 30, 0).unwrap();
        assert_eq!(calendar.resolve_datetime(&moment), SixWeeksPeriod::First);
        assert_eq!(
            calendar.resolve_datetime(&moment.with_timezone(&Utc)),
            SixWeeksPeriod::Second
        );
    }

    #[test]
    fn custom_calendar_falls_back_to_its_last_range() {
        let calendar = PeriodCalendar::new(vec![
            PeriodRange {
                period: SixWeeksPeriod::First,
                start: date(2025, 8, 13),
                end: date(2025, 9, 19),
            },
            PeriodRange {
                period: SixWeeksPeriod::Second,
                start: date(2025, 9, 22),
                end: date(2025, 10, 31),
            },
        ])
        .unwrap();

        assert_eq!(calendar.resolve(date(2025, 9, 20)), SixWeeksPeriod::Second);
        assert_eq!(calendar.fallback(), SixWeeksPeriod::Second);
        assert_eq!(calendar.bounds(SixWeeksPeriod::Third), None);
    }

    #[test]
    fn rejects_malformed_calendars() {
        assert_eq!(PeriodCalendar::new(Vec::new()), Err(CalendarError::Empty));

        let inverted = PeriodRange {
            period: SixWeeksPeriod::First,
            start: date(2024, 9, 1),
            end: date(2024, 8, 1),
        };
        assert!(matches!(
            PeriodCalendar::new(vec![inverted]),
            Err(CalendarError::Inverted { .. })
        ));

        let mut overlapping = DEFAULT_RANGES.to_vec();
        overlapping[1].start = date(2024, 9, 22);
        assert!(matches!(
            PeriodCalendar::new(overlapping),
            Err(CalendarError::OutOfOrder { .. })
        ));

        let mut duplicated = DEFAULT_RANGES.to_vec();
        duplicated[5].period = SixWeeksPeriod::Fifth;
        assert_eq!(
            PeriodCalendar::new(duplicated),
            Err(CalendarError::Duplicate(SixWeeksPeriod::Fifth))
        );
    }

    #[test]
    fn explain_lists_every_range() {
        let calendar = PeriodCalendar::default();
        let inside = calendar.explain(date(2024, 11, 4));
        assert!(inside.in_range);
        assert_eq!(inside.matched_period, SixWeeksPeriod::Third);
        assert_eq!(inside.ranges.len(), 6);
        assert_eq!(inside.ranges.iter().filter(|check| check.matches).count(), 1);

        let gap = calendar.explain(date(2025, 1, 2));
        assert!(!gap.in_range);
        assert_eq!(gap.matched_period, SixWeeksPeriod::Sixth);
    }

    #[test]
    fn tagging_reports_out_of_calendar_dates() {
        let calendar = PeriodCalendar::default();
        let notifier = MemoryNotifier::default();
        let tagged = calendar.tag_assignments(
            &[
                assignment("Slope intercept", date(2024, 10, 2)),
                assignment("Holiday packet", date(2024, 12, 27)),
            ],
            &notifier,
        );

        assert_eq!(tagged[0].six_weeks_period, SixWeeksPeriod::Second);
        assert!(tagged[0].in_range);
        assert_eq!(tagged[1].six_weeks_period, SixWeeksPeriod::Sixth);
        assert!(!tagged[1].in_range);

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert!(notices[0].description.contains("Holiday packet"));
    }
}
