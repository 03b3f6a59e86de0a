use crate::date::de;
use crate::format::DateFormat;
use crate::locale::{deserialize_locale, Locale};
use crate::position::Position;
use crate::view::View;
use derive_setters::Setters;
use serde::Deserialize;
use std::num::NonZeroUsize;
use time::{Date, PrimitiveDateTime};

/// How many dates may be selected at once outside of range mode
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(from = "RawMultipleDates")]
pub enum MultipleDates {
    #[default]
    Off,
    Unlimited,
    Limit(NonZeroUsize),
}

impl MultipleDates {
    pub fn is_enabled(self) -> bool {
        self != MultipleDates::Off
    }

    /// Whether a selection of `count` dates has no room for another one
    pub fn is_full(self, count: usize) -> bool {
        match self {
            MultipleDates::Limit(cap) => count >= cap.get(),
            MultipleDates::Off | MultipleDates::Unlimited => false,
        }
    }

    pub fn cap(self) -> Option<usize> {
        match self {
            MultipleDates::Off => Some(1),
            MultipleDates::Unlimited => None,
            MultipleDates::Limit(cap) => Some(cap.get()),
        }
    }
}

impl From<usize> for MultipleDates {
    fn from(n: usize) -> MultipleDates {
        NonZeroUsize::new(n).map_or(MultipleDates::Off, MultipleDates::Limit)
    }
}

// `multipleDates` is either a flag or a count
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMultipleDates {
    Flag(bool),
    Count(usize),
}

impl From<RawMultipleDates> for MultipleDates {
    fn from(raw: RawMultipleDates) -> MultipleDates {
        match raw {
            RawMultipleDates::Flag(false) => MultipleDates::Off,
            RawMultipleDates::Flag(true) => MultipleDates::Unlimited,
            RawMultipleDates::Count(n) => MultipleDates::from(n),
        }
    }
}

/// Configuration of a [`Datepicker`](crate::Datepicker).
///
/// Field names deserialize from camelCase, and any field may be omitted.
#[derive(Clone, Debug, Deserialize, PartialEq, Setters)]
#[serde(default, rename_all = "camelCase")]
#[setters(into)]
pub struct Options {
    /// Initial view date; "today" if unset
    #[serde(deserialize_with = "de::opt_date")]
    #[setters(strip_option, into)]
    pub start_date: Option<Date>,
    pub view: View,
    /// Finest view in which clicking a cell selects instead of drilling down
    pub min_view: View,
    #[serde(deserialize_with = "de::opt_date")]
    #[setters(strip_option, into)]
    pub min_date: Option<Date>,
    #[serde(deserialize_with = "de::opt_date")]
    #[setters(strip_option, into)]
    pub max_date: Option<Date>,
    /// Applied silently at construction
    #[serde(deserialize_with = "de::date_times")]
    pub selected_dates: Vec<PrimitiveDateTime>,
    pub multiple_dates: MultipleDates,
    pub multiple_dates_separator: String,
    pub range: bool,
    pub toggle_selected: bool,
    pub move_to_other_months_on_select: bool,
    pub move_to_other_years_on_select: bool,
    pub auto_close: bool,
    /// Overrides the locale's date format
    #[setters(strip_option, into)]
    pub date_format: Option<DateFormat>,
    /// Overrides the locale's time format unless empty
    #[setters(strip_option, into)]
    pub time_format: Option<String>,
    pub date_time_separator: String,
    pub alt_field_date_format: DateFormat,
    pub timepicker: bool,
    pub only_timepicker: bool,
    /// Overrides the locale's first day of the week
    #[setters(strip_option, into)]
    pub first_day: Option<u8>,
    /// Days of the week (0 = Sunday) rendered as weekends
    pub weekends: Vec<u8>,
    pub position: Position,
    pub offset: i32,
    #[serde(deserialize_with = "deserialize_locale")]
    pub locale: Locale,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            start_date: None,
            view: View::Day,
            min_view: View::Day,
            min_date: None,
            max_date: None,
            selected_dates: Vec::new(),
            multiple_dates: MultipleDates::Off,
            multiple_dates_separator: String::from(", "),
            range: false,
            toggle_selected: true,
            move_to_other_months_on_select: true,
            move_to_other_years_on_select: true,
            auto_close: false,
            date_format: None,
            time_format: None,
            date_time_separator: String::from(" "),
            alt_field_date_format: DateFormat::from("T"),
            timepicker: false,
            only_timepicker: false,
            first_day: None,
            weekends: vec![6, 0],
            position: Position::default(),
            offset: 12,
            locale: Locale::en(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn test_deserialize_defaults() {
        let opts: Options = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, Options::default());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let opts: Options = serde_json::from_str(
            r#"{
                "startDate": "2024-05-03",
                "view": "months",
                "minDate": 1704067200000,
                "selectedDates": ["2024-05-10", "2024-05-11T09:30"],
                "multipleDates": 3,
                "range": true,
                "dateFormat": "dd.MM.yyyy",
                "position": "top right",
                "locale": "de"
            }"#,
        )
        .unwrap();
        assert_eq!(opts.start_date, Some(date!(2024 - 05 - 03)));
        assert_eq!(opts.view, View::Month);
        assert_eq!(opts.min_date, Some(date!(2024 - 01 - 01)));
        assert_eq!(
            opts.selected_dates,
            [datetime!(2024-05-10 00:00), datetime!(2024-05-11 09:30)]
        );
        assert_eq!(opts.multiple_dates.cap(), Some(3));
        assert!(opts.range);
        assert_eq!(opts.date_format, Some(DateFormat::from("dd.MM.yyyy")));
        assert_eq!(opts.position.to_string(), "top right");
        assert_eq!(opts.locale.first_day, 1);
    }

    #[test]
    fn test_multiple_dates_flag() {
        let opts: Options = serde_json::from_str(r#"{"multipleDates": true}"#).unwrap();
        assert_eq!(opts.multiple_dates, MultipleDates::Unlimited);
        let opts: Options = serde_json::from_str(r#"{"multipleDates": false}"#).unwrap();
        assert_eq!(opts.multiple_dates, MultipleDates::Off);
        let opts: Options = serde_json::from_str(r#"{"multipleDates": 0}"#).unwrap();
        assert_eq!(opts.multiple_dates, MultipleDates::Off);
    }

    #[test]
    fn test_bad_date_rejected() {
        let r = serde_json::from_str::<Options>(r#"{"minDate": "yesterday"}"#);
        assert!(r.is_err());
    }

    #[test]
    fn test_setters() {
        let opts = Options::default()
            .range(true)
            .min_date(date!(2024 - 01 - 01))
            .date_format("yyyy")
            .multiple_dates(MultipleDates::from(2));
        assert!(opts.range);
        assert_eq!(opts.min_date, Some(date!(2024 - 01 - 01)));
        assert_eq!(opts.date_format, Some(DateFormat::from("yyyy")));
        assert!(opts.multiple_dates.is_full(2));
        assert!(!opts.multiple_dates.is_full(1));
    }
}
