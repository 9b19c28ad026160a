//! Schedule arithmetic for the daily trigger

use std::time::Duration;

use chrono::{DateTime, Days, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};

/// Delay from `now` until the next occurrence of `at` in `now`'s wall clock
///
/// A time that has already passed today rolls over to tomorrow. The target is
/// resolved in `now`'s time zone, so the delay is exact across DST changes.
pub fn next_daily_delay<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Duration {
    let tz = now.timezone();
    let today = now.date_naive();
    (0..=2)
        .filter_map(|days| today.checked_add_days(Days::new(days)))
        .filter_map(|date| resolve(&tz, date.and_time(at)))
        .find(|target| target >= now)
        .and_then(|target| target.signed_duration_since(now).to_std().ok())
        .unwrap_or_default()
}

/// Earlier instant for a repeated wall-clock time, one hour on for a skipped one
fn resolve<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&local).earliest().or_else(|| {
        local
            .checked_add_signed(TimeDelta::hours(1))
            .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
    })
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, MappedLocalTime, NaiveDate, Utc};

    use super::*;

    /// Central European time with the 2024 DST changes
    #[derive(Debug, Clone, Copy)]
    struct Cet;

    impl Cet {
        fn winter() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }

        fn summer() -> FixedOffset {
            FixedOffset::east_opt(7200).unwrap()
        }
    }

    impl TimeZone for Cet {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            Cet
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> MappedLocalTime<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(
            &self,
            local: &NaiveDateTime,
        ) -> MappedLocalTime<FixedOffset> {
            let valid: Vec<FixedOffset> = [Cet::summer(), Cet::winter()]
                .into_iter()
                .filter(|offset| {
                    let utc = *local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
                    self.offset_from_utc_datetime(&utc) == *offset
                })
                .collect();
            match valid.as_slice() {
                [] => MappedLocalTime::None,
                [one] => MappedLocalTime::Single(*one),
                [earlier, later, ..] => MappedLocalTime::Ambiguous(*earlier, *later),
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            let start = NaiveDate::from_ymd_opt(2024, 3, 31)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap();
            let end = NaiveDate::from_ymd_opt(2024, 10, 27)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap();
            if *utc >= start && *utc < end {
                Cet::summer()
            } else {
                Cet::winter()
            }
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 1, 30, 0).unwrap();
        assert_eq!(next_daily_delay(&now, at(3, 0)), Duration::from_secs(90 * 60));
    }

    #[test]
    fn test_passed_time_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap();
        assert_eq!(next_daily_delay(&now, at(0, 0)), Duration::from_secs(3600));

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 1).unwrap();
        assert_eq!(
            next_daily_delay(&now, at(12, 0)),
            Duration::from_secs(24 * 3600 - 1)
        );
    }

    #[test]
    fn test_spring_forward_is_an_hour_shorter() {
        let now = Cet.with_ymd_and_hms(2024, 3, 30, 23, 0, 0).unwrap();
        assert_eq!(next_daily_delay(&now, at(4, 0)), Duration::from_secs(4 * 3600));
    }

    #[test]
    fn test_skipped_time_runs_an_hour_later() {
        // 02:30 does not exist on 2024-03-31; the check runs at 03:30 CEST
        let now = Cet.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        assert_eq!(
            next_daily_delay(&now, at(2, 30)),
            Duration::from_secs(2 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn test_fall_back_is_an_hour_longer() {
        let now = Cet.with_ymd_and_hms(2024, 10, 26, 23, 0, 0).unwrap();
        assert_eq!(next_daily_delay(&now, at(4, 0)), Duration::from_secs(6 * 3600));

        // 02:30 happens twice; the first one counts
        assert_eq!(
            next_daily_delay(&now, at(2, 30)),
            Duration::from_secs(3 * 3600 + 30 * 60)
        );
    }
}
