use crate::date::{first_of_month, IntoDateTime, OutOfTimeError};
use crate::events::{Event, EventBus, EventKind, FocusChange, ViewDateChange};
use crate::format::{format, DateFormat, DayPeriod};
use crate::locale::Locale;
use crate::options::Options;
use crate::position::Bounds;
use crate::selection::{ReselectAction, SelectOptions, SelectOutcome, SelectionRules, SelectionState};
use crate::view::{grid_span, View, ViewState};
use futures_channel::oneshot;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use time::{Date, Month, PrimitiveDateTime, Time};
use tracing::{debug, warn};

/// The value handed to the `on_select` callback: a single date unless
/// several dates can be selected
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Selected<T> {
    One(Option<T>),
    Many(Vec<T>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OnSelect {
    pub date: Selected<PrimitiveDateTime>,
    pub formatted_date: Selected<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FocusOptions {
    /// Move the grid to the focused date if it lies in another period
    pub view_date_transition: bool,
}

/// Resolves once the datepicker has run every task queued before it, i.e.,
/// once the mirrored input value reflects the selection that returned it
#[derive(Debug)]
pub struct Completion(oneshot::Receiver<()>);

impl Completion {
    fn ready() -> Completion {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(());
        Completion(rx)
    }

    /// Returns `true` once the completion has resolved (or its datepicker
    /// has been dropped)
    pub fn is_settled(&mut self) -> bool {
        !matches!(self.0.try_recv(), Ok(None))
    }
}

impl Future for Completion {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        Pin::new(&mut self.0).poll(cx).map(|_| ())
    }
}

#[derive(Debug)]
enum Task {
    Refresh { silent: bool },
    Resolve(oneshot::Sender<()>),
}

type OnSelectFn = Box<dyn FnMut(&OnSelect, &Datepicker)>;

/// An interactive date picker's state: what is shown, what is selected, and
/// what has focus.
///
/// Mutators never fail.  Input that cannot be read as a date, selections the
/// current mode does not allow, and unknown view levels are ignored and
/// publish nothing.  Work that must observe the settled selection (the
/// mirrored input value and the `on_select` callback) is queued and runs on
/// the next call to [`Datepicker::run_pending`].
pub struct Datepicker {
    options: Options,
    locale: Locale,
    today: PrimitiveDateTime,
    view: ViewState,
    selection: SelectionState,
    bus: EventBus,
    pending: VecDeque<Task>,
    input_value: String,
    alt_input_value: String,
    visible: bool,
    on_select: Option<OnSelectFn>,
}

impl Datepicker {
    pub fn new(today: PrimitiveDateTime, options: Options) -> Datepicker {
        let view_date = options.start_date.unwrap_or(today.date());
        let mut dp = Datepicker {
            locale: derive_locale(&options),
            today,
            view: ViewState::new(view_date, options.view),
            selection: SelectionState::new(),
            bus: EventBus::new(),
            pending: VecDeque::new(),
            input_value: String::new(),
            alt_input_value: String::new(),
            visible: false,
            on_select: None,
            options,
        };
        dp.view
            .set_bounds(dp.options.min_date, dp.options.max_date, &mut dp.bus);
        for date in dp.options.selected_dates.clone() {
            dp.select_one(date, SelectOptions::silent());
        }
        dp
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The locale after applying the format and first-day overrides
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn today(&self) -> PrimitiveDateTime {
        self.today
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn view_date(&self) -> Date {
        self.view.view_date()
    }

    pub fn current_view(&self) -> View {
        self.view.current_view()
    }

    pub fn focus_date(&self) -> Option<PrimitiveDateTime> {
        self.view.focus_date()
    }

    pub fn selected_dates(&self) -> &[PrimitiveDateTime] {
        self.selection.dates()
    }

    pub fn has_selected_dates(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn last_selected_date(&self) -> Option<PrimitiveDateTime> {
        self.selection.last_selected()
    }

    pub fn range_from(&self) -> Option<PrimitiveDateTime> {
        self.selection.range_from()
    }

    pub fn range_to(&self) -> Option<PrimitiveDateTime> {
        self.selection.range_to()
    }

    /// The selected dates formatted with the locale's date format
    pub fn input_value(&self) -> &str {
        &self.input_value
    }

    /// The selected dates formatted with `alt_field_date_format`
    pub fn alt_input_value(&self) -> &str {
        &self.alt_input_value
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_weekend(&self, weekday: u8) -> bool {
        self.options.weekends.contains(&weekday)
    }

    pub fn is_min_view_reached(&self) -> bool {
        self.view.is_min_view_reached(self.options.min_view)
    }

    pub fn clamped_date(&self, date: PrimitiveDateTime) -> PrimitiveDateTime {
        self.view.clamped(date)
    }

    /// Whether any day of the cell containing `date` in `view` lies within
    /// the min/max bounds
    pub fn is_selectable(&self, date: Date, view: View) -> bool {
        let (first, last) = match view {
            View::Day => (date, date),
            View::Month => grid_span(View::Day, date),
            View::Year => grid_span(View::Month, date),
        };
        self.view.min_date().is_none_or(|min| last >= min)
            && self.view.max_date().is_none_or(|max| first <= max)
    }

    /// Registers a renderer or any other observer of state changes
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.bus.subscribe(kind, handler);
    }

    /// Sets the callback fired after each non-silent selection change
    pub fn on_select<F>(&mut self, callback: F)
    where
        F: FnMut(&OnSelect, &Datepicker) + 'static,
    {
        self.on_select = Some(Box::new(callback));
    }

    pub fn on_change_view_date<F>(&mut self, mut callback: F)
    where
        F: FnMut(&ViewDateChange) + 'static,
    {
        self.bus.subscribe(EventKind::ViewDateChanged, move |e| {
            if let Event::ViewDateChanged(change) = e {
                callback(change);
            }
        });
    }

    pub fn on_change_view<F>(&mut self, mut callback: F)
    where
        F: FnMut(View) + 'static,
    {
        self.bus.subscribe(EventKind::ViewChanged, move |e| {
            if let Event::ViewChanged(view) = e {
                callback(*view);
            }
        });
    }

    pub fn on_show<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.on_visibility(true, callback);
    }

    pub fn on_hide<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.on_visibility(false, callback);
    }

    fn on_visibility<F>(&mut self, shown: bool, mut callback: F)
    where
        F: FnMut() + 'static,
    {
        self.bus.subscribe(EventKind::VisibilityChanged, move |e| {
            if *e == Event::VisibilityChanged(shown) {
                callback();
            }
        });
    }

    fn day_period(&self) -> DayPeriod {
        if self.options.timepicker {
            DayPeriod::FromTime
        } else {
            DayPeriod::Fixed
        }
    }

    /// Formats `date` with `template` using this picker's locale.  Returns
    /// `None` if `date` cannot be parsed.
    pub fn format_date<D: IntoDateTime>(&self, template: &DateFormat, date: D) -> Option<String> {
        let date = date.into_date_time()?;
        Some(format(template, date, &self.locale, self.day_period()))
    }

    fn format_all(&self, template: &DateFormat) -> Vec<String> {
        self.selection
            .dates()
            .iter()
            .map(|&d| format(template, d, &self.locale, self.day_period()))
            .collect()
    }

    // Navigation

    /// Shows the next period.  Returns whether the view moved; it stays put
    /// when the next period is outside the bounds.
    pub fn next(&mut self) -> Result<bool, OutOfTimeError> {
        self.view.next(&mut self.bus)
    }

    pub fn prev(&mut self) -> Result<bool, OutOfTimeError> {
        self.view.prev(&mut self.bus)
    }

    /// Switches to the next coarser view around the focus or view date
    pub fn up(&mut self) {
        self.view.up(None, &mut self.bus);
    }

    /// Switches to the next finer view around the focus or view date
    pub fn down(&mut self) {
        self.view.down(None, &mut self.bus);
    }

    pub fn up_from<D: IntoDateTime>(&mut self, date: D) {
        self.view.up(date.into_date_time(), &mut self.bus);
    }

    pub fn down_to<D: IntoDateTime>(&mut self, date: D) {
        self.view.down(date.into_date_time(), &mut self.bus);
    }

    pub fn set_view_date<D: IntoDateTime>(&mut self, date: D) -> bool {
        self.view.set_view_date(date, &mut self.bus)
    }

    pub fn set_current_view<V: TryInto<View>>(&mut self, view: V) -> bool {
        self.view.set_current_view(view, &mut self.bus)
    }

    pub fn set_focus_date<D: IntoDateTime>(&mut self, date: D, options: FocusOptions) {
        let Some(date) = date.into_date_time() else {
            warn!("ignoring unparsable focus date");
            return;
        };
        self.view.set_focus_date(Some(date));
        if self.options.range {
            self.selection.preview_range(date);
        }
        self.bus.publish(&Event::FocusChanged(FocusChange {
            date: Some(date),
            view_date_transition: options.view_date_transition,
        }));
        if options.view_date_transition && self.view.needs_transition(date.date()) {
            self.view.set_view_date(date, &mut self.bus);
        }
    }

    pub fn clear_focus(&mut self) {
        self.view.set_focus_date(None);
        self.bus.publish(&Event::FocusChanged(FocusChange {
            date: None,
            view_date_transition: false,
        }));
    }

    // Selection

    /// Selects one date.  The returned completion resolves after the queued
    /// refresh of the mirrored input value has run.
    pub fn select_date<D: IntoDateTime>(&mut self, date: D, options: SelectOptions) -> Completion {
        let Some(date) = date.into_date_time() else {
            warn!("ignoring unparsable date");
            return Completion::ready();
        };
        self.select_one(date, options);
        self.completion()
    }

    /// Selects each date in order, as if `select_date` were called on each
    /// in turn, and returns a single completion for the whole batch
    pub fn select_dates<I>(&mut self, dates: I, options: SelectOptions) -> Completion
    where
        I: IntoIterator,
        I::Item: IntoDateTime,
    {
        for date in dates {
            match date.into_date_time() {
                Some(date) => self.select_one(date, options),
                None => warn!("ignoring unparsable date"),
            }
        }
        self.completion()
    }

    fn completion(&mut self) -> Completion {
        let (tx, rx) = oneshot::channel();
        self.pending.push_back(Task::Resolve(tx));
        Completion(rx)
    }

    fn select_one(&mut self, date: PrimitiveDateTime, options: SelectOptions) {
        let current = self.view.current_view();
        let moves = match current {
            View::Day => {
                self.options.move_to_other_months_on_select
                    && (self.view.is_other_month(date.date()) || self.view.is_other_year(date.date()))
            }
            View::Year => {
                self.options.move_to_other_years_on_select && self.view.is_other_year(date.date())
            }
            View::Month => false,
        };
        if moves {
            let anchor = match current {
                View::Year => Date::from_calendar_date(date.year(), Month::January, 1).ok(),
                _ => Some(first_of_month(date.date())),
            };
            if let Some(anchor) = anchor {
                self.view.set_view_date(anchor, &mut self.bus);
            }
        }
        let rules = SelectionRules::from_options(&self.options);
        let outcome = self
            .selection
            .select(date, rules, current, options, &mut self.bus);
        if outcome == SelectOutcome::Ignored {
            return;
        }
        self.pending.push_back(Task::Refresh {
            silent: options.silent,
        });
        if outcome == SelectOutcome::Completed && self.options.auto_close {
            debug!("selection complete; closing");
            self.hide();
        }
    }

    /// Removes `date` from the selection if it is selected (exactly)
    pub fn unselect_date<D: IntoDateTime>(&mut self, date: D) -> bool {
        let Some(date) = date.into_date_time() else {
            return false;
        };
        let removed = self.selection.unselect(date, &mut self.bus);
        if removed {
            self.pending.push_back(Task::Refresh { silent: false });
        }
        removed
    }

    /// Swaps a selected date for another, keeping its position
    pub fn replace_date<D1, D2>(&mut self, old: D1, new: D2) -> bool
    where
        D1: IntoDateTime,
        D2: IntoDateTime,
    {
        let (Some(old), Some(new)) = (old.into_date_time(), new.into_date_time()) else {
            return false;
        };
        let granularity = self.view.current_view();
        let replaced = self.selection.replace(old, new, granularity, &mut self.bus);
        if replaced {
            self.pending.push_back(Task::Refresh { silent: false });
        }
        replaced
    }

    pub fn clear(&mut self) {
        self.selection.clear(&mut self.bus);
        self.pending.push_back(Task::Refresh { silent: false });
    }

    /// Activates the cell for `date`: drills down while above the minimum
    /// view, otherwise selects the date or applies the reselect policy if it
    /// is already selected.
    pub fn pick<D: IntoDateTime>(&mut self, date: D) {
        let Some(date) = date.into_date_time() else {
            return;
        };
        let granularity = self.view.current_view();
        if !self.is_selectable(date.date(), granularity) {
            debug!(%date, "cell is disabled");
            return;
        }
        if !self.is_min_view_reached() {
            self.view.down(Some(date), &mut self.bus);
            return;
        }
        match self.selection.is_selected(date.date(), granularity) {
            Some(already) => self.handle_already_selected(already, date),
            None => self.select_one(date, SelectOptions::default()),
        }
    }

    fn handle_already_selected(&mut self, already: PrimitiveDateTime, date: PrimitiveDateTime) {
        let rules = SelectionRules::from_options(&self.options);
        match self.selection.reselect_action(rules) {
            ReselectAction::Reselect => self.select_one(date, SelectOptions::default()),
            ReselectAction::Unselect => {
                self.unselect_date(already);
            }
            ReselectAction::Nothing => (),
        }
        if !rules.toggle {
            // Lets a time picker edit the date that was clicked again
            self.selection.set_last_selected(Some(already), &mut self.bus);
        }
    }

    /// Applies a time of day chosen in a time picker to the last selected
    /// date, or selects today at that time if nothing is selected yet
    pub fn set_time(&mut self, hours: u8, minutes: u8) {
        let Ok(time) = Time::from_hms(hours, minutes, 0) else {
            warn!(hours, minutes, "ignoring invalid time of day");
            return;
        };
        self.bus.publish(&Event::TimeChanged { hours, minutes });
        let target = self.selection.last_selected().unwrap_or(self.today);
        if !self.is_selectable(target.date(), View::Day) {
            return;
        }
        if self.selection.set_last_time(time).is_some() {
            self.set_input_value();
            self.trigger_on_select();
        } else {
            self.select_one(self.today.replace_time(time), SelectOptions::default());
        }
    }

    // Deferred work

    /// Runs everything queued by earlier calls, in order: refreshing the
    /// mirrored input value, firing `on_select`, and resolving completions
    pub fn run_pending(&mut self) {
        while let Some(task) = self.pending.pop_front() {
            match task {
                Task::Refresh { silent } => {
                    self.set_input_value();
                    if !silent {
                        self.trigger_on_select();
                    }
                }
                Task::Resolve(tx) => {
                    let _ = tx.send(());
                }
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn set_input_value(&mut self) {
        let sep = &self.options.multiple_dates_separator;
        let value = self.format_all(&self.locale.date_format).join(sep);
        let alt_value = self.format_all(&self.options.alt_field_date_format).join(sep);
        self.input_value = value;
        self.alt_input_value = alt_value;
    }

    fn trigger_on_select(&mut self) {
        let Some(mut callback) = self.on_select.take() else {
            return;
        };
        let dates = self.selection.dates().to_vec();
        let formatted = self.format_all(&self.locale.date_format);
        let payload = if self.options.multiple_dates.is_enabled() || self.options.range {
            OnSelect {
                date: Selected::Many(dates),
                formatted_date: Selected::Many(formatted),
            }
        } else {
            OnSelect {
                date: Selected::One(dates.first().copied()),
                formatted_date: Selected::One(formatted.into_iter().next()),
            }
        };
        callback(&payload, self);
        self.on_select = Some(callback);
    }

    // Visibility & placement

    pub fn show(&mut self) {
        if !self.visible {
            self.visible = true;
            self.bus.publish(&Event::VisibilityChanged(true));
        }
    }

    pub fn hide(&mut self) {
        if self.visible {
            self.visible = false;
            self.bus.publish(&Event::VisibilityChanged(false));
        }
    }

    /// Returns the top-left corner for the popup of size `popup` attached to
    /// `anchor`, according to the configured position and offset
    pub fn set_position(&self, anchor: Bounds, popup: Bounds) -> (i32, i32) {
        self.options
            .position
            .place(anchor, popup, self.options.offset)
    }

    /// Replaces the configuration, carrying the current state over
    pub fn update(&mut self, options: Options) {
        let prev = std::mem::replace(&mut self.options, options);
        if prev.range != self.options.range || prev.multiple_dates != self.options.multiple_dates {
            self.selection
                .apply_rules(SelectionRules::from_options(&self.options));
        }
        for date in self.options.selected_dates.clone() {
            self.select_one(date, SelectOptions::default());
        }
        if self.options.view != prev.view {
            self.view.set_current_view(self.options.view, &mut self.bus);
        }
        self.view
            .set_bounds(self.options.min_date, self.options.max_date, &mut self.bus);
        self.locale = derive_locale(&self.options);
        self.set_input_value();
    }
}

impl fmt::Debug for Datepicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datepicker")
            .field("options", &self.options)
            .field("today", &self.today)
            .field("view", &self.view)
            .field("selection", &self.selection)
            .field("bus", &self.bus)
            .field("pending", &self.pending)
            .field("input_value", &self.input_value)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

/// Applies the format and first-day overrides from `options` to its locale
fn derive_locale(options: &Options) -> Locale {
    let mut locale = options.locale.clone();
    if let Some(date_format) = &options.date_format {
        locale.date_format = date_format.clone();
    }
    if let Some(time_format) = options.time_format.as_ref().filter(|s| !s.is_empty()) {
        locale.time_format.clone_from(time_format);
    }
    if let Some(first_day) = options.first_day {
        locale.first_day = first_day;
    }
    if options.timepicker {
        if let Some(date_format) = locale.date_format.as_template() {
            let joined = if locale.time_format.is_empty() {
                date_format.to_owned()
            } else {
                format!(
                    "{date_format}{}{}",
                    options.date_time_separator, locale.time_format
                )
            };
            locale.date_format = DateFormat::Template(joined);
        }
    }
    if options.only_timepicker {
        locale.date_format = DateFormat::Template(locale.time_format.clone());
    }
    locale
}
