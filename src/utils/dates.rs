use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime};

/// Midnight of the day containing `at`, as a new value.
pub fn start_of_day(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_time(NaiveTime::MIN)
}

/// The calendar day after `day`, or `None` at the end of chrono's range.
pub fn next_day(day: NaiveDate) -> Option<NaiveDate> {
    day.succ_opt()
}

/// First and last calendar day of `month` in `year`, or `None` when the pair is not a real month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn days_in_month(year: i32, month: u32) -> Option<u32> {
        month_bounds(year, month).map(|(_, last)| last.day())
    }

    #[test]
    fn start_of_day_truncates_without_touching_input() {
        let at = NaiveDate::from_ymd_opt(2026, 5, 4)
            .unwrap()
            .and_hms_opt(17, 45, 12)
            .unwrap();
        let midnight = start_of_day(at);
        assert_eq!(midnight, NaiveDate::from_ymd_opt(2026, 5, 4).unwrap().and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(at.time(), NaiveTime::from_hms_opt(17, 45, 12).unwrap());
    }

    #[test]
    fn next_day_rolls_over_month_and_year() {
        let eom = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(next_day(eom), NaiveDate::from_ymd_opt(2026, 1, 1));
    }

    #[test]
    fn february_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2000, 2), Some(29));
        assert_eq!(days_in_month(1900, 2), Some(28));
    }

    #[test]
    fn every_month_has_gregorian_length() {
        let expected = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        for (i, days) in expected.iter().enumerate() {
            assert_eq!(days_in_month(2026, i as u32 + 1), Some(*days));
        }
    }

    #[test]
    fn month_bounds_rejects_out_of_range_months() {
        assert_eq!(month_bounds(2026, 0), None);
        assert_eq!(month_bounds(2026, 13), None);

        let (first, last) = month_bounds(2026, 12).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }
}
