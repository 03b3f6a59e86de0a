//! The view-navigation state machine: which grid level is shown and which
//! period of time it shows.
use crate::date::{self, add_months, decade, first_of_month, IntoDateTime, OutOfTimeError};
use crate::events::{Event, EventBus, ViewDateChange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use time::{util::days_in_month, Date, Month, PrimitiveDateTime};
use tracing::{debug, warn};

/// Granularity of the calendar grid, ordered from finest to coarsest
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    #[serde(alias = "days")]
    Day,
    #[serde(alias = "months")]
    Month,
    #[serde(alias = "years")]
    Year,
}

impl View {
    pub const ALL: [View; 3] = [View::Day, View::Month, View::Year];

    pub fn index(self) -> usize {
        match self {
            View::Day => 0,
            View::Month => 1,
            View::Year => 2,
        }
    }

    /// Returns the view at `index`, clamped to the known levels
    pub fn from_index_clamped(index: usize) -> View {
        View::ALL[index.min(View::ALL.len() - 1)]
    }

    /// The adjacent coarser level, or `self` at the top
    pub fn up(self) -> View {
        View::from_index_clamped(self.index() + 1)
    }

    /// The adjacent finer level, or `self` at the bottom
    pub fn down(self) -> View {
        View::from_index_clamped(self.index().saturating_sub(1))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            View::Day => "day",
            View::Month => "month",
            View::Year => "year",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<View, ParseViewError> {
        match s.to_ascii_lowercase().as_str() {
            "day" | "days" => Ok(View::Day),
            "month" | "months" => Ok(View::Month),
            "year" | "years" => Ok(View::Year),
            _ => Err(ParseViewError(s.to_owned())),
        }
    }
}

impl TryFrom<&str> for View {
    type Error = ParseViewError;

    fn try_from(s: &str) -> Result<View, ParseViewError> {
        s.parse()
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("unknown view level: {0:?}")]
pub struct ParseViewError(pub String);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ViewState {
    view_date: Date,
    current_view: View,
    focus_date: Option<PrimitiveDateTime>,
    min_date: Option<Date>,
    max_date: Option<Date>,
    // Views whose renderer has been materialized; the initial view counts
    visited: [bool; 3],
}

impl ViewState {
    pub fn new(view_date: Date, current_view: View) -> ViewState {
        let mut visited = [false; 3];
        visited[current_view.index()] = true;
        ViewState {
            view_date,
            current_view,
            focus_date: None,
            min_date: None,
            max_date: None,
            visited,
        }
    }

    pub fn view_date(&self) -> Date {
        self.view_date
    }

    pub fn current_view(&self) -> View {
        self.current_view
    }

    pub fn focus_date(&self) -> Option<PrimitiveDateTime> {
        self.focus_date
    }

    pub fn min_date(&self) -> Option<Date> {
        self.min_date
    }

    pub fn max_date(&self) -> Option<Date> {
        self.max_date
    }

    pub fn has_visited(&self, view: View) -> bool {
        self.visited[view.index()]
    }

    pub fn view_index(&self) -> usize {
        self.current_view.index()
    }

    pub fn is_final_view(&self) -> bool {
        self.current_view == View::Year
    }

    pub fn is_min_view_reached(&self, min_view: View) -> bool {
        self.current_view == min_view || self.current_view == View::Day
    }

    pub fn cur_decade(&self) -> (i32, i32) {
        decade(self.view_date.year())
    }

    pub fn is_other_month(&self, date: Date) -> bool {
        date.month() != self.view_date.month()
    }

    pub fn is_other_year(&self, date: Date) -> bool {
        date.year() != self.view_date.year()
    }

    pub fn is_other_decade(&self, date: Date) -> bool {
        let (first, last) = self.cur_decade();
        !(first..=last).contains(&date.year())
    }

    pub fn is_within_bounds(&self, date: Date) -> bool {
        self.min_date.is_none_or(|min| date >= min) && self.max_date.is_none_or(|max| date <= max)
    }

    /// Clamps `date` into `[min_date, max_date]`; the upper bound is checked
    /// first.
    pub fn clamped(&self, date: PrimitiveDateTime) -> PrimitiveDateTime {
        match (self.min_date, self.max_date) {
            (_, Some(max)) if date.date() > max => max.midnight(),
            (Some(min), _) if date.date() < min => min.midnight(),
            _ => date,
        }
    }

    /// Installs new bounds and pulls the view date inside them
    pub fn set_bounds(&mut self, min_date: Option<Date>, max_date: Option<Date>, bus: &mut EventBus) {
        self.min_date = min_date;
        self.max_date = max_date;
        let clamped = self.clamped(self.view_date.midnight()).date();
        if clamped != self.view_date {
            debug!(from = %self.view_date, to = %clamped, "clamping view date to bounds");
            self.set_view_date(clamped, bus);
        }
    }

    /// Sets the date anchoring the visible grid, clamped to the bounds.
    /// Returns `false` (and publishes nothing) if `date` is unparsable or
    /// lands on the current view date.
    pub fn set_view_date<D: IntoDateTime>(&mut self, date: D, bus: &mut EventBus) -> bool {
        let Some(date) = date.into_date_time() else {
            warn!("ignoring unparsable view date");
            return false;
        };
        let date = self.clamped(date).date();
        if date == self.view_date {
            return false;
        }
        debug!(from = %self.view_date, to = %date, "changing view date");
        self.view_date = date;
        bus.publish(&Event::ViewDateChanged(ViewDateChange {
            date,
            month: date.month(),
            year: date.year(),
            decade: decade(date.year()),
        }));
        true
    }

    /// Switches the grid level.  Names of unknown levels are ignored.
    pub fn set_current_view<V: TryInto<View>>(&mut self, view: V, bus: &mut EventBus) -> bool {
        let Ok(view) = view.try_into() else {
            warn!("ignoring unknown view level");
            return false;
        };
        if !self.has_visited(view) {
            debug!(%view, "materializing view");
            self.visited[view.index()] = true;
        }
        self.current_view = view;
        bus.publish(&Event::ViewChanged(view));
        true
    }

    pub fn set_focus_date(&mut self, date: Option<PrimitiveDateTime>) {
        self.focus_date = date;
    }

    /// Advances the view date by one period of the current view.  Returns
    /// `Ok(false)` without moving when the next period lies wholly outside
    /// the bounds.
    pub fn next(&mut self, bus: &mut EventBus) -> Result<bool, OutOfTimeError> {
        self.step(1, bus)
    }

    /// Moves the view date back by one period of the current view; see
    /// [`ViewState::next`]
    pub fn prev(&mut self, bus: &mut EventBus) -> Result<bool, OutOfTimeError> {
        self.step(-1, bus)
    }

    fn step(&mut self, step: i32, bus: &mut EventBus) -> Result<bool, OutOfTimeError> {
        let target = self.period_start(step)?;
        let (first, last) = grid_span(self.current_view, target);
        let outside = self.min_date.is_some_and(|min| last < min)
            || self.max_date.is_some_and(|max| first > max);
        if outside {
            debug!(%target, "period is out of bounds; not moving");
            return Ok(false);
        }
        Ok(self.set_view_date(target, bus))
    }

    fn period_start(&self, step: i32) -> Result<Date, OutOfTimeError> {
        let year = self.view_date.year();
        match self.current_view {
            View::Day => add_months(self.view_date, step),
            View::Month => add_months(self.view_date, step * 12),
            View::Year => Date::from_calendar_date(year + step * 10, Month::January, 1)
                .map_err(|_| OutOfTimeError),
        }
    }

    /// Moves to the next coarser view, anchoring on the month of `date`, the
    /// focus date, or the view date (the first of those that is set)
    pub fn up(&mut self, date: Option<PrimitiveDateTime>, bus: &mut EventBus) {
        self.shift_level(date, View::up, bus);
    }

    /// Moves to the next finer view; see [`ViewState::up`]
    pub fn down(&mut self, date: Option<PrimitiveDateTime>, bus: &mut EventBus) {
        self.shift_level(date, View::down, bus);
    }

    fn shift_level(
        &mut self,
        date: Option<PrimitiveDateTime>,
        step: fn(View) -> View,
        bus: &mut EventBus,
    ) {
        let anchor = date
            .or(self.focus_date)
            .map_or(self.view_date, PrimitiveDateTime::date);
        self.set_view_date(first_of_month(anchor), bus);
        self.set_current_view(step(self.current_view), bus);
    }

    /// Whether focusing `date` should move the grid to show it
    pub fn needs_transition(&self, date: Date) -> bool {
        self.is_other_month(date) || self.is_other_year(date) || self.is_other_decade(date)
    }
}

/// First and last dates of the period a grid at `view` covers around
/// `date`: its month, year, or decade
pub fn grid_span(view: View, date: Date) -> (Date, Date) {
    let years = |(first, last): (i32, i32)| {
        (
            Date::from_calendar_date(first, Month::January, 1).unwrap_or(Date::MIN),
            Date::from_calendar_date(last, Month::December, 31).unwrap_or(Date::MAX),
        )
    };
    match view {
        View::Day => {
            let first = first_of_month(date);
            let len = days_in_month(date.month(), date.year());
            (first, first.replace_day(len).unwrap_or(first))
        }
        View::Month => years((date.year(), date.year())),
        View::Year => years(decade(date.year())),
    }
}

/// Returns the dates shown as cells for `view` around `view_date`, in grid
/// order.  Day grids start on `first_day` (0 = Sunday) and are padded with
/// days from the neighbouring months to whole weeks.
pub fn grid_dates(view: View, view_date: Date, first_day: u8) -> Vec<Date> {
    match view {
        View::Day => {
            let first = first_of_month(view_date);
            let lead = (first.weekday().number_days_from_sunday() + 7 - first_day % 7) % 7;
            let start = date::shift(first, View::Day, -i32::from(lead)).unwrap_or(first);
            let len = days_in_month(first.month(), first.year());
            let total = (u16::from(lead) + u16::from(len)).div_ceil(7) * 7;
            std::iter::successors(Some(start), |d| d.next_day())
                .take(usize::from(total))
                .collect()
        }
        View::Month => (1..=12u8)
            .filter_map(|m| Month::try_from(m).ok())
            .filter_map(|m| Date::from_calendar_date(view_date.year(), m, 1).ok())
            .collect(),
        View::Year => {
            let (first, last) = decade(view_date.year());
            (first - 1..=last + 1)
                .filter_map(|y| Date::from_calendar_date(y, Month::January, 1).ok())
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;
    use time::macros::{date, datetime};

    fn recording_bus() -> (EventBus, Rc<RefCell<Vec<Event>>>) {
        let mut bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventKind::ViewDateChanged, EventKind::ViewChanged] {
            let log = Rc::clone(&log);
            bus.subscribe(kind, move |e| log.borrow_mut().push(e.clone()));
        }
        (bus, log)
    }

    #[test]
    fn test_view_order() {
        assert!(View::Day < View::Month);
        assert!(View::Month < View::Year);
        assert_eq!(View::Year.up(), View::Year);
        assert_eq!(View::Day.down(), View::Day);
        assert_eq!("months".parse::<View>(), Ok(View::Month));
        assert_eq!(
            "decade".parse::<View>(),
            Err(ParseViewError(String::from("decade")))
        );
    }

    #[test]
    fn test_next_prev_by_view() {
        let (mut bus, _) = recording_bus();
        let mut state = ViewState::new(date!(2024 - 03 - 15), View::Day);
        state.next(&mut bus).unwrap();
        assert_eq!(state.view_date(), date!(2024 - 04 - 01));
        state.prev(&mut bus).unwrap();
        state.prev(&mut bus).unwrap();
        assert_eq!(state.view_date(), date!(2024 - 02 - 01));
        state.set_current_view(View::Month, &mut bus);
        state.next(&mut bus).unwrap();
        assert_eq!(state.view_date(), date!(2025 - 02 - 01));
        state.set_current_view(View::Year, &mut bus);
        state.next(&mut bus).unwrap();
        assert_eq!(state.view_date(), date!(2035 - 01 - 01));
        state.prev(&mut bus).unwrap();
        assert_eq!(state.view_date(), date!(2025 - 01 - 01));
    }

    #[test]
    fn test_next_at_end_of_time() {
        let (mut bus, log) = recording_bus();
        let mut state = ViewState::new(date!(9999 - 12 - 01), View::Day);
        assert_eq!(state.next(&mut bus), Err(OutOfTimeError));
        assert_eq!(state.view_date(), date!(9999 - 12 - 01));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_set_view_date_idempotent() {
        let (mut bus, log) = recording_bus();
        let mut state = ViewState::new(date!(2024 - 01 - 01), View::Day);
        assert!(state.set_view_date(date!(2024 - 06 - 10), &mut bus));
        assert!(!state.set_view_date("2024-06-10", &mut bus));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(
            log.borrow()[0],
            Event::ViewDateChanged(ViewDateChange {
                date: date!(2024 - 06 - 10),
                month: Month::June,
                year: 2024,
                decade: (2020, 2029),
            })
        );
    }

    #[test]
    fn test_set_view_date_unparsable() {
        let (mut bus, log) = recording_bus();
        let mut state = ViewState::new(date!(2024 - 01 - 01), View::Day);
        assert!(!state.set_view_date("32/13/2024", &mut bus));
        assert_eq!(state.view_date(), date!(2024 - 01 - 01));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_set_unknown_view() {
        let (mut bus, log) = recording_bus();
        let mut state = ViewState::new(date!(2024 - 01 - 01), View::Day);
        assert!(!state.set_current_view("decade", &mut bus));
        assert_eq!(state.current_view(), View::Day);
        assert!(log.borrow().is_empty());
        assert!(!state.has_visited(View::Year));
        assert!(state.set_current_view("years", &mut bus));
        assert!(state.has_visited(View::Year));
    }

    #[test]
    fn test_next_prev_stop_at_bounds() {
        let (mut bus, log) = recording_bus();
        let mut state = ViewState::new(date!(2024 - 05 - 15), View::Day);
        state.set_bounds(Some(date!(2024 - 04 - 10)), Some(date!(2024 - 05 - 20)), &mut bus);
        assert_eq!(state.next(&mut bus), Ok(false));
        assert_eq!(state.next(&mut bus), Ok(false));
        assert_eq!(state.view_date(), date!(2024 - 05 - 15));
        assert!(log.borrow().is_empty());
        assert_eq!(state.prev(&mut bus), Ok(true));
        assert_eq!(state.view_date(), date!(2024 - 04 - 10));
        assert_eq!(state.prev(&mut bus), Ok(false));
        state.set_current_view(View::Year, &mut bus);
        assert_eq!(state.next(&mut bus), Ok(false));
        assert_eq!(state.view_date(), date!(2024 - 04 - 10));
    }

    #[test]
    fn test_set_view_date_clamps() {
        let (mut bus, _) = recording_bus();
        let mut state = ViewState::new(date!(2024 - 05 - 15), View::Day);
        state.set_bounds(None, Some(date!(2024 - 05 - 20)), &mut bus);
        assert!(state.set_view_date("2024-09-01", &mut bus));
        assert_eq!(state.view_date(), date!(2024 - 05 - 20));
        state.up(None, &mut bus);
        assert_eq!(state.view_date(), date!(2024 - 05 - 01));
    }

    #[test]
    fn test_grid_span() {
        assert_eq!(
            grid_span(View::Day, date!(2024 - 02 - 10)),
            (date!(2024 - 02 - 01), date!(2024 - 02 - 29))
        );
        assert_eq!(
            grid_span(View::Month, date!(2024 - 02 - 10)),
            (date!(2024 - 01 - 01), date!(2024 - 12 - 31))
        );
        assert_eq!(
            grid_span(View::Year, date!(2024 - 02 - 10)),
            (date!(2020 - 01 - 01), date!(2029 - 12 - 31))
        );
    }

    #[test]
    fn test_up_then_down() {
        let (mut bus, _) = recording_bus();
        let mut state = ViewState::new(date!(2024 - 07 - 19), View::Day);
        state.up(None, &mut bus);
        assert_eq!(state.current_view(), View::Month);
        state.down(None, &mut bus);
        assert_eq!(state.current_view(), View::Day);
        assert_eq!(state.view_date(), date!(2024 - 07 - 01));
    }

    #[test]
    fn test_down_uses_given_date_then_focus() {
        let (mut bus, _) = recording_bus();
        let mut state = ViewState::new(date!(2024 - 07 - 19), View::Year);
        state.set_focus_date(Some(datetime!(2026-02-14 0:00)));
        state.down(None, &mut bus);
        assert_eq!(state.view_date(), date!(2026 - 02 - 01));
        assert_eq!(state.current_view(), View::Month);
        state.down(Some(datetime!(2027-09-03 0:00)), &mut bus);
        assert_eq!(state.view_date(), date!(2027 - 09 - 01));
        assert_eq!(state.current_view(), View::Day);
    }

    #[test]
    fn test_bounds_clamp() {
        let (mut bus, _) = recording_bus();
        let mut state = ViewState::new(date!(2020 - 01 - 01), View::Day);
        state.set_bounds(Some(date!(2024 - 01 - 01)), None, &mut bus);
        assert_eq!(state.view_date(), date!(2024 - 01 - 01));
        state.set_bounds(None, Some(date!(2023 - 06 - 30)), &mut bus);
        assert_eq!(state.view_date(), date!(2023 - 06 - 30));
    }

    #[test]
    fn test_max_bound_checked_first() {
        let state = {
            let (mut bus, _) = recording_bus();
            let mut state = ViewState::new(date!(2024 - 01 - 01), View::Day);
            state.set_bounds(Some(date!(2025 - 01 - 01)), Some(date!(2022 - 01 - 01)), &mut bus);
            state
        };
        assert_eq!(state.view_date(), date!(2022 - 01 - 01));
    }

    #[test]
    fn test_other_period_checks() {
        let state = ViewState::new(date!(2024 - 05 - 01), View::Day);
        assert!(!state.needs_transition(date!(2024 - 05 - 31)));
        assert!(state.needs_transition(date!(2024 - 06 - 01)));
        assert!(state.is_other_decade(date!(2030 - 05 - 01)));
        assert!(!state.is_other_decade(date!(2029 - 05 - 01)));
    }

    #[test]
    fn test_day_grid_sunday_first() {
        let dates = grid_dates(View::Day, date!(2024 - 03 - 10), 0);
        // March 1st 2024 is a Friday
        assert_eq!(dates.first(), Some(&date!(2024 - 02 - 25)));
        assert_eq!(dates.len(), 42);
        assert_eq!(dates.last(), Some(&date!(2024 - 04 - 06)));
    }

    #[test]
    fn test_day_grid_monday_first() {
        let dates = grid_dates(View::Day, date!(2024 - 04 - 10), 1);
        // April 1st 2024 is a Monday
        assert_eq!(dates.first(), Some(&date!(2024 - 04 - 01)));
        assert_eq!(dates.len(), 35);
    }

    #[test]
    fn test_year_grid() {
        let dates = grid_dates(View::Year, date!(2024 - 04 - 10), 0);
        assert_eq!(dates.len(), 12);
        assert_eq!(dates[0].year(), 2019);
        assert_eq!(dates[11].year(), 2030);
    }
}
