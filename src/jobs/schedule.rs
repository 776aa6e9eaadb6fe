use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDateTime, NaiveTime, Timelike, Weekday};
use std::fmt;

/// Recurrence rule evaluated in the business time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Every day at a wall-clock time
    Daily { at: NaiveTime },
    /// Every hour at a minute past the hour
    Hourly { minute: u32 },
    /// Once a week on a weekday at a wall-clock time
    Weekly { weekday: Weekday, at: NaiveTime },
}

impl Trigger {
    /// `None` when the hour or minute is out of range.
    pub fn daily(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|at| Self::Daily { at })
    }

    pub fn hourly(minute: u32) -> Option<Self> {
        (minute < 60).then_some(Self::Hourly { minute })
    }

    pub fn weekly(weekday: Weekday, hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|at| Self::Weekly { weekday, at })
    }

    /// First fire time strictly after `after`, in the same offset.
    pub fn next_after(&self, after: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let offset = *after.offset();
        let local = after.naive_local();

        let (candidate, period) = match *self {
            Trigger::Hourly { minute } => {
                let hour_start = local
                    .date()
                    .and_time(NaiveTime::MIN)
                    + Duration::hours(i64::from(local.hour()));
                (hour_start + Duration::minutes(i64::from(minute)), Duration::hours(1))
            }
            Trigger::Daily { at } => (local.date().and_time(at), Duration::days(1)),
            Trigger::Weekly { weekday, at } => {
                let ahead = (7 + weekday.num_days_from_monday()
                    - local.weekday().num_days_from_monday())
                    % 7;
                (
                    (local.date() + Duration::days(i64::from(ahead))).and_time(at),
                    Duration::weeks(1),
                )
            }
        };

        let next = if candidate <= local {
            candidate + period
        } else {
            candidate
        };
        at_offset(next, offset)
    }
}

fn at_offset(local: NaiveDateTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Daily { at } => write!(f, "daily {}", at.format("%H:%M")),
            Trigger::Hourly { minute } => write!(f, "hourly :{:02}", minute),
            Trigger::Weekly { weekday, at } => write!(f, "weekly {} {}", weekday, at.format("%H:%M")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn jakarta() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn local(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[rstest]
    #[case(Trigger::daily(23, 0).unwrap(), "2024-03-10T22:59:59+07:00", "2024-03-10T23:00:00+07:00")]
    #[case(Trigger::daily(23, 0).unwrap(), "2024-03-10T23:00:00+07:00", "2024-03-11T23:00:00+07:00")]
    #[case(Trigger::daily(0, 0).unwrap(), "2024-12-31T12:00:00+07:00", "2025-01-01T00:00:00+07:00")]
    #[case(Trigger::hourly(0).unwrap(), "2024-03-10T10:00:00+07:00", "2024-03-10T11:00:00+07:00")]
    #[case(Trigger::hourly(0).unwrap(), "2024-03-10T23:30:00+07:00", "2024-03-11T00:00:00+07:00")]
    #[case(Trigger::weekly(Weekday::Sun, 2, 0).unwrap(), "2024-03-10T01:00:00+07:00", "2024-03-10T02:00:00+07:00")]
    #[case(Trigger::weekly(Weekday::Sun, 2, 0).unwrap(), "2024-03-10T02:00:00+07:00", "2024-03-17T02:00:00+07:00")]
    #[case(Trigger::weekly(Weekday::Sun, 2, 0).unwrap(), "2024-03-13T09:00:00+07:00", "2024-03-17T02:00:00+07:00")]
    fn next_fire_time(#[case] trigger: Trigger, #[case] now: &str, #[case] expected: &str) {
        assert_eq!(trigger.next_after(local(now)), local(expected));
    }

    #[test]
    fn rejects_out_of_range_times() {
        assert!(Trigger::daily(24, 0).is_none());
        assert!(Trigger::hourly(60).is_none());
        assert!(Trigger::weekly(Weekday::Mon, 1, 75).is_none());
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(Trigger::daily(23, 0).unwrap().to_string(), "daily 23:00");
        assert_eq!(Trigger::hourly(0).unwrap().to_string(), "hourly :00");
        assert_eq!(
            Trigger::weekly(Weekday::Sun, 2, 0).unwrap().to_string(),
            "weekly Sun 02:00"
        );
    }

    proptest! {
        #[test]
        fn next_after_is_later_and_on_the_rule(
            secs in 1_600_000_000i64..1_900_000_000i64,
            hour in 0u32..24,
            minute in 0u32..60,
            weekday in 0usize..7,
        ) {
            let now = DateTime::from_timestamp(secs, 0).unwrap().with_timezone(&jakarta());
            let weekday = [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ][weekday];

            for trigger in [
                Trigger::daily(hour, minute).unwrap(),
                Trigger::hourly(minute).unwrap(),
                Trigger::weekly(weekday, hour, minute).unwrap(),
            ] {
                let next = trigger.next_after(now);
                prop_assert!(next > now);
                prop_assert_eq!(next.second(), 0);
                prop_assert_eq!(next.minute(), minute);
                match trigger {
                    Trigger::Daily { .. } => {
                        prop_assert_eq!(next.hour(), hour);
                        prop_assert!(next - now <= Duration::days(1));
                    }
                    Trigger::Hourly { .. } => prop_assert!(next - now <= Duration::hours(1)),
                    Trigger::Weekly { .. } => {
                        prop_assert_eq!(next.hour(), hour);
                        prop_assert_eq!(next.weekday(), weekday);
                        prop_assert!(next - now <= Duration::weeks(1));
                    }
                }
            }
        }
    }
}
