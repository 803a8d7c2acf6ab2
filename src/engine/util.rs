use chrono::{Datelike, Duration, NaiveDate};

pub(crate) fn days_between(start: NaiveDate, current: NaiveDate) -> i64 {
    current.signed_duration_since(start).num_days()
}

/// Lundi de la semaine contenant `date`.
pub(crate) fn week_start(date: NaiveDate) -> NaiveDate {
    let back = Duration::days(i64::from(date.weekday().num_days_from_monday()));
    date.checked_sub_signed(back).unwrap_or(date)
}

/// Jours de `[start, end]`, bornes incluses (`NaiveDate::MAX` compris).
pub(crate) fn dates(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |d| d.succ_opt()).take_while(move |d| *d <= end)
}
