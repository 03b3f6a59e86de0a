//! Coercion of "date-like" values into [`PrimitiveDateTime`] along with the
//! calendar arithmetic shared by the view and selection state machines.
use crate::view::View;
use thiserror::Error;
use time::{
    format_description::BorrowedFormatItem, macros::format_description, util::days_in_month,
    Date, Duration, Month, OffsetDateTime, PrimitiveDateTime,
};

static YMD_FMT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

static DATETIME_FMTS: &[&[BorrowedFormatItem<'_>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
];

/// A value that can be turned into a calendar date-time.
///
/// Conversion returns `None` for input that does not describe a valid date;
/// every mutator of the datepicker treats that as "ignore and carry on".
pub trait IntoDateTime {
    fn into_date_time(self) -> Option<PrimitiveDateTime>;
}

impl IntoDateTime for PrimitiveDateTime {
    fn into_date_time(self) -> Option<PrimitiveDateTime> {
        Some(self)
    }
}

impl IntoDateTime for Date {
    fn into_date_time(self) -> Option<PrimitiveDateTime> {
        Some(self.midnight())
    }
}

impl IntoDateTime for OffsetDateTime {
    fn into_date_time(self) -> Option<PrimitiveDateTime> {
        Some(PrimitiveDateTime::new(self.date(), self.time()))
    }
}

/// Milliseconds since the Unix epoch, read as UTC
impl IntoDateTime for i64 {
    fn into_date_time(self) -> Option<PrimitiveDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self) * 1_000_000)
            .ok()
            .and_then(IntoDateTime::into_date_time)
    }
}

impl IntoDateTime for &str {
    fn into_date_time(self) -> Option<PrimitiveDateTime> {
        parse_date_time(self)
    }
}

impl IntoDateTime for &String {
    fn into_date_time(self) -> Option<PrimitiveDateTime> {
        parse_date_time(self)
    }
}

impl IntoDateTime for String {
    fn into_date_time(self) -> Option<PrimitiveDateTime> {
        parse_date_time(&self)
    }
}

impl<T: IntoDateTime> IntoDateTime for Option<T> {
    fn into_date_time(self) -> Option<PrimitiveDateTime> {
        self.and_then(IntoDateTime::into_date_time)
    }
}

/// Parses `YYYY-MM-DD` (at midnight) or an ISO-like `YYYY-MM-DDTHH:MM[:SS]`
/// string.
pub fn parse_date_time(s: &str) -> Option<PrimitiveDateTime> {
    let s = s.trim();
    if let Ok(date) = Date::parse(s, &YMD_FMT) {
        return Some(date.midnight());
    }
    DATETIME_FMTS
        .iter()
        .find_map(|fmt| PrimitiveDateTime::parse(s, fmt).ok())
}

/// Parses a plain `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Option<Date> {
    parse_date_time(s).map(PrimitiveDateTime::date)
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub struct OutOfTimeError;

/// The fields of a date-time that the formatter and the renderers keep
/// asking for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParsedDate {
    pub year: i32,
    pub month: Month,
    pub day: u8,
    /// Day of the week counted from Sunday = 0
    pub weekday: u8,
    pub hours: u8,
    pub minutes: u8,
}

impl ParsedDate {
    pub fn new(dt: PrimitiveDateTime) -> ParsedDate {
        ParsedDate {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            weekday: dt.weekday().number_days_from_sunday(),
            hours: dt.hour(),
            minutes: dt.minute(),
        }
    }

    /// Zero-based month index
    pub fn month0(&self) -> usize {
        usize::from(u8::from(self.month) - 1)
    }

    pub fn hours12(&self) -> u8 {
        match self.hours % 12 {
            0 => 12,
            h => h,
        }
    }
}

/// Returns the first and last year of the ten-year bucket containing `year`
pub fn decade(year: i32) -> (i32, i32) {
    let first = year.div_euclid(10) * 10;
    (first, first + 9)
}

pub fn first_of_month(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

/// Returns the first day of the month `delta` months away from `date`'s month
pub fn add_months(date: Date, delta: i32) -> Result<Date, OutOfTimeError> {
    let total = date
        .year()
        .checked_mul(12)
        .and_then(|m| m.checked_add(i32::from(u8::from(date.month())) - 1))
        .and_then(|m| m.checked_add(delta))
        .ok_or(OutOfTimeError)?;
    let month = u8::try_from(total.rem_euclid(12) + 1).map_err(|_| OutOfTimeError)?;
    let month = Month::try_from(month).map_err(|_| OutOfTimeError)?;
    Date::from_calendar_date(total.div_euclid(12), month, 1).map_err(|_| OutOfTimeError)
}

/// Moves `date` by `amount` units of `unit` (days, months, or years),
/// clamping the day of month when the target month is shorter.
pub fn shift(date: Date, unit: View, amount: i32) -> Option<Date> {
    match unit {
        View::Day => date.checked_add(Duration::days(i64::from(amount))),
        View::Month => shift_months(date, amount),
        View::Year => shift_months(date, amount.checked_mul(12)?),
    }
}

fn shift_months(date: Date, amount: i32) -> Option<Date> {
    let first = add_months(date, amount).ok()?;
    let day = date.day().min(days_in_month(first.month(), first.year()));
    first.replace_day(day).ok()
}

/// Granularity-aware equality: two dates are the same "day", "month", or
/// "year" depending on `granularity`.
pub fn is_same_date(a: Date, b: Date, granularity: View) -> bool {
    match granularity {
        View::Day => a == b,
        View::Month => a.year() == b.year() && a.month() == b.month(),
        View::Year => a.year() == b.year(),
    }
}

/// Serde helpers for reading date-like option values
pub(crate) mod de {
    use super::IntoDateTime;
    use serde::{de::Error, Deserialize, Deserializer};
    use time::{Date, PrimitiveDateTime};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    impl Raw {
        fn coerce<E: Error>(self) -> Result<PrimitiveDateTime, E> {
            match self {
                Raw::Millis(ms) => ms
                    .into_date_time()
                    .ok_or_else(|| E::custom(format!("timestamp out of range: {ms}"))),
                Raw::Text(s) => s
                    .as_str()
                    .into_date_time()
                    .ok_or_else(|| E::custom(format!("invalid date: {s:?}"))),
            }
        }
    }

    pub(crate) fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
        Option::<Raw>::deserialize(d)?
            .map(|raw| raw.coerce().map(PrimitiveDateTime::date))
            .transpose()
    }

    pub(crate) fn date_times<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Vec<PrimitiveDateTime>, D::Error> {
        Vec::<Raw>::deserialize(d)?
            .into_iter()
            .map(Raw::coerce)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(
            "2024-03-07".into_date_time(),
            Some(datetime!(2024-03-07 00:00))
        );
    }

    #[test]
    fn test_parse_iso_date_time() {
        assert_eq!(
            "2024-03-07T14:05".into_date_time(),
            Some(datetime!(2024-03-07 14:05))
        );
        assert_eq!(
            "2024-03-07 14:05:09".into_date_time(),
            Some(datetime!(2024-03-07 14:05:09))
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!("not a date".into_date_time(), None);
        assert_eq!("2024-02-30".into_date_time(), None);
        assert_eq!("".into_date_time(), None);
    }

    #[test]
    fn test_epoch_millis() {
        assert_eq!(
            1_709_769_600_000i64.into_date_time(),
            Some(datetime!(2024-03-07 00:00))
        );
    }

    #[test]
    fn test_decade() {
        assert_eq!(decade(2024), (2020, 2029));
        assert_eq!(decade(2020), (2020, 2029));
        assert_eq!(decade(-5), (-10, -1));
    }

    #[test]
    fn test_add_months_wraps_years() {
        assert_eq!(add_months(date!(2024 - 12 - 15), 1), Ok(date!(2025 - 01 - 01)));
        assert_eq!(add_months(date!(2024 - 01 - 31), -1), Ok(date!(2023 - 12 - 01)));
        assert_eq!(add_months(date!(2024 - 05 - 31), 0), Ok(date!(2024 - 05 - 01)));
    }

    #[test]
    fn test_add_months_end_of_time() {
        assert_eq!(add_months(date!(9999 - 12 - 01), 1), Err(OutOfTimeError));
    }

    #[test]
    fn test_shift_clamps_day() {
        assert_eq!(
            shift(date!(2024 - 01 - 31), View::Month, 1),
            Some(date!(2024 - 02 - 29))
        );
        assert_eq!(
            shift(date!(2024 - 02 - 29), View::Year, 1),
            Some(date!(2025 - 02 - 28))
        );
        assert_eq!(
            shift(date!(2024 - 03 - 01), View::Day, -1),
            Some(date!(2024 - 02 - 29))
        );
    }

    #[test]
    fn test_is_same_date_by_granularity() {
        let a = date!(2024 - 05 - 10);
        let b = date!(2024 - 05 - 20);
        assert!(!is_same_date(a, b, View::Day));
        assert!(is_same_date(a, b, View::Month));
        assert!(is_same_date(a, date!(2024 - 11 - 01), View::Year));
        assert!(!is_same_date(a, date!(2023 - 05 - 10), View::Year));
    }

    #[test]
    fn test_hours12() {
        let at = |h| ParsedDate::new(PrimitiveDateTime::new(
            date!(2024 - 01 - 01),
            time::Time::from_hms(h, 0, 0).unwrap(),
        ));
        assert_eq!(at(0).hours12(), 12);
        assert_eq!(at(9).hours12(), 9);
        assert_eq!(at(12).hours12(), 12);
        assert_eq!(at(23).hours12(), 11);
    }
}
