//! Token-based, locale-aware date formatting.
//!
//! A template such as `"dd MMMM yyyy"` is scanned for the tokens below, each
//! of which is replaced only where it stands on its own, i.e., where it is
//! delimited by the start or end of the string or by one of
//! `> < . - / \ , $ ! ? : ;` or whitespace.  That keeps `d` from matching
//! inside `dd` and `yyyy` from matching inside `yyyy1`.
//!
//! | Token          | Output                                      |
//! | -------------- | ------------------------------------------- |
//! | `T`            | milliseconds since the Unix epoch           |
//! | `m`, `mm`      | minutes, unpadded and zero-padded           |
//! | `h`, `hh`      | hours on a 12-hour clock                    |
//! | `H`, `HH`      | hours on a 24-hour clock                    |
//! | `aa`, `AA`     | day period, lowercase and uppercase         |
//! | `E`, `EEEE`    | abbreviated and full weekday name           |
//! | `d`, `dd`      | day of month                                |
//! | `M`, `MM`      | month number                                |
//! | `MMM`, `MMMM`  | abbreviated and full month name             |
//! | `yy`, `yyyy`   | two-digit and full year                     |
//! | `yyyy1`        | first year of the decade                    |
//! | `yyyy2`        | last year of the decade                     |
use crate::date::{decade, IntoDateTime, ParsedDate};
use crate::locale::Locale;
use serde::Deserialize;
use std::fmt;
use std::rc::Rc;
use time::PrimitiveDateTime;

/// Either a token template or a function doing all of the formatting itself
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub enum DateFormat {
    Template(String),
    Function(Rc<dyn Fn(PrimitiveDateTime) -> String>),
}

impl DateFormat {
    pub fn function<F>(func: F) -> DateFormat
    where
        F: Fn(PrimitiveDateTime) -> String + 'static,
    {
        DateFormat::Function(Rc::new(func))
    }

    pub fn as_template(&self) -> Option<&str> {
        match self {
            DateFormat::Template(s) => Some(s),
            DateFormat::Function(_) => None,
        }
    }
}

impl From<String> for DateFormat {
    fn from(s: String) -> DateFormat {
        DateFormat::Template(s)
    }
}

impl From<&str> for DateFormat {
    fn from(s: &str) -> DateFormat {
        DateFormat::Template(s.to_owned())
    }
}

impl PartialEq for DateFormat {
    fn eq(&self, other: &DateFormat) -> bool {
        match (self, other) {
            (DateFormat::Template(a), DateFormat::Template(b)) => a == b,
            (DateFormat::Function(a), DateFormat::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFormat::Template(s) => f.debug_tuple("Template").field(s).finish(),
            DateFormat::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Where the `aa`/`AA` tokens get their value from
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DayPeriod {
    /// No time picker is active; always "am"
    #[default]
    Fixed,
    /// Derived from the hour of the formatted date
    FromTime,
}

impl DayPeriod {
    fn for_hours(self, hours: u8) -> &'static str {
        match self {
            DayPeriod::FromTime if hours >= 12 => "pm",
            _ => "am",
        }
    }
}

pub fn format(
    template: &DateFormat,
    date: PrimitiveDateTime,
    locale: &Locale,
    day_period: DayPeriod,
) -> String {
    match template {
        DateFormat::Template(s) => format_template(s, date, locale, day_period),
        DateFormat::Function(func) => func(date),
    }
}

/// Like [`format`], but returns `None` if `date` cannot be parsed
pub fn format_date_like<D: IntoDateTime>(
    template: &DateFormat,
    date: D,
    locale: &Locale,
    day_period: DayPeriod,
) -> Option<String> {
    date.into_date_time()
        .map(|dt| format(template, dt, locale, day_period))
}

fn format_template(
    template: &str,
    date: PrimitiveDateTime,
    locale: &Locale,
    day_period: DayPeriod,
) -> String {
    let parsed = ParsedDate::new(date);
    let (decade_start, decade_end) = decade(parsed.year);
    let period = day_period.for_hours(parsed.hours);
    let year = parsed.year.to_string();
    let weekday = usize::from(parsed.weekday);
    let month = u8::from(parsed.month);
    let millis = date.assume_utc().unix_timestamp_nanos() / 1_000_000;
    // Order matters: each kind is substituted over the output of the
    // previous ones.
    let fields: [(&str, String); 21] = [
        ("T", millis.to_string()),
        ("m", parsed.minutes.to_string()),
        ("mm", format!("{:02}", parsed.minutes)),
        ("h", parsed.hours12().to_string()),
        ("hh", format!("{:02}", parsed.hours12())),
        ("H", parsed.hours.to_string()),
        ("HH", format!("{:02}", parsed.hours)),
        ("aa", period.to_owned()),
        ("AA", period.to_uppercase()),
        ("E", locale.days_short[weekday].clone()),
        ("EEEE", locale.days[weekday].clone()),
        ("d", parsed.day.to_string()),
        ("dd", format!("{:02}", parsed.day)),
        ("M", month.to_string()),
        ("MM", format!("{month:02}")),
        ("MMM", locale.months_short[parsed.month0()].clone()),
        ("MMMM", locale.months[parsed.month0()].clone()),
        ("yy", last_two_chars(&year).to_owned()),
        ("yyyy", year.clone()),
        ("yyyy1", decade_start.to_string()),
        ("yyyy2", decade_end.to_string()),
    ];
    fields
        .iter()
        .fold(template.to_owned(), |acc, (token, value)| {
            replace_token(&acc, token, value)
        })
}

fn last_two_chars(s: &str) -> &str {
    let start = s
        .char_indices()
        .rev()
        .nth(1)
        .map_or(0, |(i, _)| i);
    &s[start..]
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '>' | '<' | '.' | '-' | '/' | '\\' | ',' | '$' | '!' | '?' | ':' | ';'
        )
}

/// Replaces every delimited occurrence of `token` in `text` with `value`.
/// Delimiters are not consumed, so `"d-d"` has two occurrences of `d`.
fn replace_token(text: &str, token: &str, value: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut prev: Option<char> = None;
    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix(token) {
            if prev.is_none_or(is_delimiter) && after.chars().next().is_none_or(is_delimiter) {
                out.push_str(value);
                prev = token.chars().last();
                rest = after;
                continue;
            }
        }
        out.push(c);
        prev = Some(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}
