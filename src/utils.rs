use chrono::{Datelike, Days, NaiveDate};

/// Number of whole calendar months from `a` to `b`, computed as
/// `years * 12 + months` of the calendar difference. The day-of-month is
/// ignored: this is a month-grid difference, not a duration.
pub fn month_diff(a: NaiveDate, b: NaiveDate) -> i32 {
    let year_diff = b.year() - a.year();
    let month_diff = b.month() as i32 - a.month() as i32;
    year_diff * 12 + month_diff
}

/// Shifts `date` by `months` on the month grid. The day-of-month is clamped
/// to the length of the target month (2023-01-31 + 1 month = 2023-02-28).
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month() as i32 - 1 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;

    let last = last_day_of_month(year, month);
    let day = date.day().min(last.day());
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(last)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .unwrap_or(date)
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .checked_sub_days(Days::new(1))
        .unwrap()
}

/// Inclusive day count of the interval `[since, till]`. This is the
/// proration denominator, computed once per transaction.
pub fn days_in_period(since: NaiveDate, till: NaiveDate) -> i64 {
    (till - since).num_days() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_diff() {
        let jan = NaiveDate::from_ymd_opt(2023, 1, 10).unwrap();
        let mar = NaiveDate::from_ymd_opt(2023, 3, 5).unwrap();

        assert_eq!(month_diff(jan, mar), 2);
        assert_eq!(month_diff(mar, jan), -2);
        assert_eq!(month_diff(jan, jan), 0);

        // Day-of-month is ignored even when the later date has a smaller day.
        let jan_31 = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        let feb_1 = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        assert_eq!(month_diff(jan_31, feb_1), 1);
    }

    #[test]
    fn test_month_diff_across_years() {
        let nov = NaiveDate::from_ymd_opt(2022, 11, 15).unwrap();
        let feb = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        assert_eq!(month_diff(nov, feb), 3);
        assert_eq!(month_diff(feb, nov), -3);
    }

    #[test]
    fn test_add_months() {
        let jan = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(
            add_months(jan, 2),
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
        );
        assert_eq!(
            add_months(jan, 12),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(
            add_months(jan, -1),
            NaiveDate::from_ymd_opt(2022, 12, 1).unwrap()
        );
    }

    #[test]
    fn test_add_months_clamps_day() {
        let jan_31 = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        assert_eq!(
            add_months(jan_31, 1),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
        assert_eq!(
            add_months(jan_31, 13),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(
            last_day_of_month(2023, 2),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            last_day_of_month(2023, 12),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_days_in_period() {
        let since = NaiveDate::from_ymd_opt(2023, 1, 10).unwrap();
        let till = NaiveDate::from_ymd_opt(2023, 3, 5).unwrap();
        assert_eq!(days_in_period(since, till), 55);

        assert_eq!(days_in_period(since, since), 1);
    }
}
