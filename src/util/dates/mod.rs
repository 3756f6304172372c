use chrono::{Datelike, Months, NaiveDate};

pub(crate) trait NaiveDateExt {
    /// Returns the first calendar day of this date's month.
    fn first_day_of_month(&self) -> NaiveDate;

    /// Returns the last calendar day of this date's month, or `None` if the following month is
    /// outside the representable date range.
    fn last_day_of_month(&self) -> Option<NaiveDate>;

    /// Whole days between this date and `other`, negative when `other` is earlier.
    fn days_until(&self, other: NaiveDate) -> i64;
}

impl NaiveDateExt for NaiveDate {
    fn first_day_of_month(&self) -> NaiveDate {
        self.with_day(1).expect("day 1 exists in every month")
    }

    fn last_day_of_month(&self) -> Option<NaiveDate> {
        self.first_day_of_month()
            .checked_add_months(Months::new(1))
            .and_then(|next_month| next_month.pred_opt())
    }

    fn days_until(&self, other: NaiveDate) -> i64 {
        (other - *self).num_days()
    }
}
