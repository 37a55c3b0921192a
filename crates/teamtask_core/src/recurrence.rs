use serde::{Deserialize, Serialize};
use time::util::days_in_year_month;
use time::{Date, Duration, Month, OffsetDateTime};

/// Cadence at which a todo regenerates itself after completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
}

impl Repeat {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

/// Next occurrence of a due date, or `None` when the todo does not repeat.
///
/// Day-based intervals add a fixed number of days. Monthly and yearly use
/// calendar arithmetic: the day of month is clamped to the length of the
/// target month, so Jan 31 rolls to Feb 28 (or 29) and Feb 29 rolls to
/// Feb 28 in a non-leap year. Time of day and UTC offset are preserved.
pub fn next_due_date(current: OffsetDateTime, repeat: Repeat) -> Option<OffsetDateTime> {
    match repeat {
        Repeat::None => None,
        Repeat::Daily => Some(current + Duration::days(1)),
        Repeat::Weekly => Some(current + Duration::days(7)),
        Repeat::Biweekly => Some(current + Duration::days(14)),
        Repeat::Monthly => {
            let date = current.date();
            let (year, month) = match date.month() {
                Month::December => (date.year() + 1, Month::January),
                month => (date.year(), month.next()),
            };
            clamped_date(year, month, date.day()).map(|next| current.replace_date(next))
        }
        Repeat::Yearly => {
            let date = current.date();
            clamped_date(date.year() + 1, date.month(), date.day())
                .map(|next| current.replace_date(next))
        }
    }
}

fn clamped_date(year: i32, month: Month, day: u8) -> Option<Date> {
    let last = days_in_year_month(year, month);
    Date::from_calendar_date(year, month, day.min(last)).ok()
}

#[cfg(test)]
mod tests {
    use super::{Repeat, next_due_date};
    use time::macros::datetime;

    #[test]
    fn none_has_no_next_occurrence() {
        assert_eq!(next_due_date(datetime!(2026-01-15 9:00 UTC), Repeat::None), None);
    }

    #[test]
    fn daily_adds_one_day_across_month_boundary() {
        assert_eq!(
            next_due_date(datetime!(2026-01-31 9:00 UTC), Repeat::Daily),
            Some(datetime!(2026-02-01 9:00 UTC))
        );
    }

    #[test]
    fn weekly_adds_seven_days() {
        assert_eq!(
            next_due_date(datetime!(2026-02-26 18:30 UTC), Repeat::Weekly),
            Some(datetime!(2026-03-05 18:30 UTC))
        );
    }

    #[test]
    fn biweekly_adds_fourteen_days() {
        assert_eq!(
            next_due_date(datetime!(2026-12-25 8:00 UTC), Repeat::Biweekly),
            Some(datetime!(2027-01-08 8:00 UTC))
        );
    }

    #[test]
    fn monthly_clamps_jan_31_to_feb_28() {
        assert_eq!(
            next_due_date(datetime!(2026-01-31 12:00 UTC), Repeat::Monthly),
            Some(datetime!(2026-02-28 12:00 UTC))
        );
    }

    #[test]
    fn monthly_clamps_jan_31_to_feb_29_in_leap_year() {
        assert_eq!(
            next_due_date(datetime!(2024-01-31 12:00 UTC), Repeat::Monthly),
            Some(datetime!(2024-02-29 12:00 UTC))
        );
    }

    #[test]
    fn monthly_clamps_mar_31_to_apr_30() {
        assert_eq!(
            next_due_date(datetime!(2026-03-31 7:15 UTC), Repeat::Monthly),
            Some(datetime!(2026-04-30 7:15 UTC))
        );
    }

    #[test]
    fn monthly_rolls_december_into_next_year() {
        assert_eq!(
            next_due_date(datetime!(2025-12-15 0:00 UTC), Repeat::Monthly),
            Some(datetime!(2026-01-15 0:00 UTC))
        );
    }

    #[test]
    fn monthly_keeps_day_when_it_fits() {
        assert_eq!(
            next_due_date(datetime!(2026-04-12 16:45 UTC), Repeat::Monthly),
            Some(datetime!(2026-05-12 16:45 UTC))
        );
    }

    #[test]
    fn yearly_clamps_leap_day_to_feb_28() {
        assert_eq!(
            next_due_date(datetime!(2024-02-29 10:00 UTC), Repeat::Yearly),
            Some(datetime!(2025-02-28 10:00 UTC))
        );
        assert_eq!(
            next_due_date(datetime!(2020-02-29 10:00 UTC), Repeat::Yearly),
            Some(datetime!(2021-02-28 10:00 UTC))
        );
    }

    #[test]
    fn yearly_keeps_ordinary_dates() {
        assert_eq!(
            next_due_date(datetime!(2026-07-04 9:00 UTC), Repeat::Yearly),
            Some(datetime!(2027-07-04 9:00 UTC))
        );
    }

    #[test]
    fn preserves_offset() {
        assert_eq!(
            next_due_date(datetime!(2026-01-31 23:00 +5), Repeat::Monthly),
            Some(datetime!(2026-02-28 23:00 +5))
        );
    }
}
