//! The selection-mode state machine: single, multiple, and range selection,
//! with optional toggling of already-selected dates.
use crate::date::is_same_date;
use crate::events::{Event, EventBus, SelectionAction, SelectionChange};
use crate::options::{MultipleDates, Options};
use crate::view::View;
use time::{Date, PrimitiveDateTime, Time};
use tracing::debug;

/// Per-call flags for selecting a date
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SelectOptions {
    /// Do not report the change to the `on_select` callback
    pub silent: bool,
    /// Ask a time picker to adopt the time of the selected date
    pub update_time: bool,
}

impl SelectOptions {
    pub fn silent() -> SelectOptions {
        SelectOptions {
            silent: true,
            update_time: false,
        }
    }
}

/// The parts of [`Options`] that decide how a selection behaves
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SelectionRules {
    pub multiple: MultipleDates,
    pub range: bool,
    pub toggle: bool,
}

impl SelectionRules {
    pub fn from_options(options: &Options) -> SelectionRules {
        SelectionRules {
            multiple: options.multiple_dates,
            range: options.range,
            toggle: options.toggle_selected,
        }
    }

    /// Maximum number of simultaneously selected dates, if any
    pub fn cap(&self) -> Option<usize> {
        if self.range {
            Some(2)
        } else {
            self.multiple.cap()
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SelectOutcome {
    /// Nothing changed
    Ignored,
    Selected,
    /// The selection reached the end state of its mode: any date in single
    /// or multiple mode, both endpoints in range mode
    Completed,
}

/// What clicking a date that is already selected should do
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReselectAction {
    Reselect,
    Unselect,
    Nothing,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SelectionState {
    // In selection order, except in range mode where it is [from, to]
    dates: Vec<PrimitiveDateTime>,
    range_from: Option<PrimitiveDateTime>,
    range_to: Option<PrimitiveDateTime>,
    last_selected: Option<PrimitiveDateTime>,
}

impl SelectionState {
    pub fn new() -> SelectionState {
        SelectionState::default()
    }

    pub fn dates(&self) -> &[PrimitiveDateTime] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn range_from(&self) -> Option<PrimitiveDateTime> {
        self.range_from
    }

    pub fn range_to(&self) -> Option<PrimitiveDateTime> {
        self.range_to
    }

    pub fn last_selected(&self) -> Option<PrimitiveDateTime> {
        self.last_selected
    }

    /// Returns the selected date equal to `date` at `granularity`, if any
    pub fn is_selected(&self, date: Date, granularity: View) -> Option<PrimitiveDateTime> {
        self.dates
            .iter()
            .copied()
            .find(|d| is_same_date(d.date(), date, granularity))
    }

    /// Whether `date` lies within the current (possibly previewed) range
    pub fn range_contains(&self, date: Date) -> bool {
        match (self.range_from, self.range_to) {
            (Some(from), Some(to)) => (from.date()..=to.date()).contains(&date),
            _ => false,
        }
    }

    pub fn select(
        &mut self,
        date: PrimitiveDateTime,
        rules: SelectionRules,
        granularity: View,
        options: SelectOptions,
        bus: &mut EventBus,
    ) -> SelectOutcome {
        if rules.range {
            match *self.dates.as_slice() {
                [first] => {
                    let (from, to) = if date < first {
                        (date, first)
                    } else {
                        (first, date)
                    };
                    self.dates = vec![from, to];
                    self.range_from = Some(from);
                    self.range_to = Some(to);
                }
                _ => {
                    self.dates = vec![date];
                    self.range_from = Some(date);
                    self.range_to = None;
                }
            }
        } else if rules.multiple.is_enabled() {
            if rules.multiple.is_full(self.dates.len()) {
                debug!(%date, "selection is full; ignoring");
                return SelectOutcome::Ignored;
            }
            if self.is_selected(date.date(), granularity).is_some() {
                debug!(%date, "already selected; ignoring");
                return SelectOutcome::Ignored;
            }
            self.dates.push(date);
        } else {
            self.dates = vec![date];
        }
        debug!(%date, selected = self.dates.len(), "selected date");
        bus.publish(&Event::SelectionChanged(SelectionChange {
            action: SelectionAction::Select,
            date: Some(date),
            silent: options.silent,
            update_time: options.update_time,
        }));
        self.set_last_selected(Some(date), bus);
        if !rules.range || self.dates.len() == 2 {
            SelectOutcome::Completed
        } else {
            SelectOutcome::Selected
        }
    }

    /// Removes the first date exactly equal to `date`.  Returns whether
    /// anything was removed.
    pub fn unselect(&mut self, date: PrimitiveDateTime, bus: &mut EventBus) -> bool {
        let Some(index) = self.dates.iter().position(|&d| d == date) else {
            return false;
        };
        self.dates.remove(index);
        if self.range_from == Some(date) {
            self.range_from = None;
        }
        if self.range_to == Some(date) {
            self.range_to = None;
        }
        let last = self.dates.last().copied();
        if last.is_none() {
            self.range_from = None;
            self.range_to = None;
        }
        self.set_last_selected(last, bus);
        debug!(%date, selected = self.dates.len(), "unselected date");
        bus.publish(&Event::SelectionChanged(SelectionChange {
            action: SelectionAction::Unselect,
            date: Some(date),
            silent: false,
            update_time: false,
        }));
        true
    }

    /// Replaces the selected date matching `old` at `granularity` with `new`,
    /// keeping its position.  Returns whether anything changed.
    pub fn replace(
        &mut self,
        old: PrimitiveDateTime,
        new: PrimitiveDateTime,
        granularity: View,
        bus: &mut EventBus,
    ) -> bool {
        let Some(slot) = self
            .dates
            .iter_mut()
            .find(|d| is_same_date(d.date(), old.date(), granularity))
        else {
            return false;
        };
        if is_same_date(slot.date(), new.date(), granularity) {
            return false;
        }
        let previous = std::mem::replace(slot, new);
        if self.range_from == Some(previous) {
            self.range_from = Some(new);
        }
        if self.range_to == Some(previous) {
            self.range_to = Some(new);
        }
        debug!(from = %previous, to = %new, "replaced selected date");
        bus.publish(&Event::SelectionChanged(SelectionChange {
            action: SelectionAction::Select,
            date: Some(new),
            silent: false,
            update_time: true,
        }));
        self.set_last_selected(Some(new), bus);
        true
    }

    pub fn clear(&mut self, bus: &mut EventBus) {
        self.dates.clear();
        self.range_from = None;
        self.range_to = None;
        debug!("cleared selection");
        bus.publish(&Event::SelectionChanged(SelectionChange {
            action: SelectionAction::Unselect,
            date: None,
            silent: false,
            update_time: false,
        }));
    }

    pub fn reselect_action(&self, rules: SelectionRules) -> ReselectAction {
        match (rules.range, rules.toggle) {
            (_, true) => ReselectAction::Unselect,
            // Picking the same date twice makes a one-day range
            (true, false) if self.dates.len() != 2 => ReselectAction::Reselect,
            _ => ReselectAction::Nothing,
        }
    }

    pub fn set_last_selected(&mut self, date: Option<PrimitiveDateTime>, bus: &mut EventBus) {
        self.last_selected = date;
        bus.publish(&Event::LastSelectedChanged(date));
    }

    /// With exactly one date selected, spans the range between it and the
    /// focused date so that renderers can preview it
    pub fn preview_range(&mut self, focus: PrimitiveDateTime) {
        if let [selected] = *self.dates.as_slice() {
            if selected > focus {
                self.range_from = Some(focus);
                self.range_to = Some(selected);
            } else {
                self.range_from = Some(selected);
                self.range_to = Some(focus);
            }
        }
    }

    /// Sets the time of day of the last selected date, in place.  Returns the
    /// updated date, or `None` if nothing is selected.
    pub fn set_last_time(&mut self, time: Time) -> Option<PrimitiveDateTime> {
        let last = self.last_selected?;
        let updated = last.replace_time(time);
        for d in self
            .dates
            .iter_mut()
            .chain(self.range_from.iter_mut())
            .chain(self.range_to.iter_mut())
            .filter(|d| **d == last)
        {
            *d = updated;
        }
        self.last_selected = Some(updated);
        Some(updated)
    }

    /// Brings the state in line with changed rules: drops the range bounds
    /// when range mode is off, seeds them from the selection when it is on,
    /// and trims selections that no longer fit the cap.
    pub fn apply_rules(&mut self, rules: SelectionRules) {
        if let Some(cap) = rules.cap() {
            self.dates.truncate(cap);
        }
        if rules.range {
            self.dates.sort();
            self.range_from = self.dates.first().copied();
            self.range_to = self.dates.get(1).copied();
        } else {
            self.range_from = None;
            self.range_to = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::cell::RefCell;
    use std::num::NonZeroUsize;
    use std::rc::Rc;
    use time::macros::{date, datetime, time};

    const SINGLE: SelectionRules = SelectionRules {
        multiple: MultipleDates::Off,
        range: false,
        toggle: true,
    };

    const RANGE: SelectionRules = SelectionRules {
        multiple: MultipleDates::Off,
        range: true,
        toggle: false,
    };

    fn capped(n: usize) -> SelectionRules {
        SelectionRules {
            multiple: MultipleDates::Limit(NonZeroUsize::new(n).unwrap()),
            range: false,
            toggle: true,
        }
    }

    fn changes_bus() -> (EventBus, Rc<RefCell<Vec<SelectionChange>>>) {
        let mut bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        bus.subscribe(EventKind::SelectionChanged, move |e| {
            if let Event::SelectionChanged(change) = e {
                sink.borrow_mut().push(*change);
            }
        });
        (bus, log)
    }

    fn select(
        state: &mut SelectionState,
        date: PrimitiveDateTime,
        rules: SelectionRules,
        bus: &mut EventBus,
    ) -> SelectOutcome {
        state.select(date, rules, View::Day, SelectOptions::default(), bus)
    }

    #[test]
    fn test_single_replaces() {
        let (mut bus, log) = changes_bus();
        let mut state = SelectionState::new();
        assert_eq!(
            select(&mut state, datetime!(2024-05-10 0:00), SINGLE, &mut bus),
            SelectOutcome::Completed
        );
        select(&mut state, datetime!(2024-05-12 0:00), SINGLE, &mut bus);
        assert_eq!(state.dates(), [datetime!(2024-05-12 0:00)]);
        assert_eq!(state.last_selected(), Some(datetime!(2024-05-12 0:00)));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_range_swaps_and_resets() {
        let (mut bus, _) = changes_bus();
        let mut state = SelectionState::new();
        assert_eq!(
            select(&mut state, datetime!(2024-05-10 0:00), RANGE, &mut bus),
            SelectOutcome::Selected
        );
        assert_eq!(
            select(&mut state, datetime!(2024-05-01 0:00), RANGE, &mut bus),
            SelectOutcome::Completed
        );
        assert_eq!(
            state.dates(),
            [datetime!(2024-05-01 0:00), datetime!(2024-05-10 0:00)]
        );
        assert_eq!(state.range_from(), Some(datetime!(2024-05-01 0:00)));
        assert_eq!(state.range_to(), Some(datetime!(2024-05-10 0:00)));
        assert!(state.range_contains(date!(2024 - 05 - 05)));
        assert!(!state.range_contains(date!(2024 - 05 - 11)));
        select(&mut state, datetime!(2024-05-20 0:00), RANGE, &mut bus);
        assert_eq!(state.dates(), [datetime!(2024-05-20 0:00)]);
        assert_eq!(state.range_from(), Some(datetime!(2024-05-20 0:00)));
        assert_eq!(state.range_to(), None);
    }

    #[test]
    fn test_range_same_date_twice() {
        let (mut bus, _) = changes_bus();
        let mut state = SelectionState::new();
        select(&mut state, datetime!(2024-05-10 0:00), RANGE, &mut bus);
        select(&mut state, datetime!(2024-05-10 0:00), RANGE, &mut bus);
        assert_eq!(
            state.dates(),
            [datetime!(2024-05-10 0:00), datetime!(2024-05-10 0:00)]
        );
    }

    #[test]
    fn test_multiple_cap() {
        let (mut bus, log) = changes_bus();
        let mut state = SelectionState::new();
        for day in [1, 2, 3] {
            let date = date!(2024 - 05 - 01).replace_day(day).unwrap().midnight();
            assert_eq!(
                select(&mut state, date, capped(3), &mut bus),
                SelectOutcome::Completed
            );
        }
        assert_eq!(
            select(&mut state, datetime!(2024-05-04 0:00), capped(3), &mut bus),
            SelectOutcome::Ignored
        );
        assert_eq!(state.len(), 3);
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_multiple_skips_duplicates_by_granularity() {
        let (mut bus, log) = changes_bus();
        let mut state = SelectionState::new();
        let rules = capped(5);
        state.select(
            datetime!(2024-05-01 0:00),
            rules,
            View::Month,
            SelectOptions::default(),
            &mut bus,
        );
        assert_eq!(
            state.select(
                datetime!(2024-05-20 0:00),
                rules,
                View::Month,
                SelectOptions::default(),
                &mut bus,
            ),
            SelectOutcome::Ignored
        );
        assert_eq!(state.dates(), [datetime!(2024-05-01 0:00)]);
        assert_eq!(state.last_selected(), Some(datetime!(2024-05-01 0:00)));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_unselect_empty() {
        let (mut bus, log) = changes_bus();
        let mut state = SelectionState::new();
        assert!(!state.unselect(datetime!(2024-05-01 0:00), &mut bus));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unselect_exact_match_only() {
        let (mut bus, log) = changes_bus();
        let mut state = SelectionState::new();
        select(&mut state, datetime!(2024-05-01 10:00), SINGLE, &mut bus);
        assert!(!state.unselect(datetime!(2024-05-01 0:00), &mut bus));
        assert!(state.unselect(datetime!(2024-05-01 10:00), &mut bus));
        assert!(state.is_empty());
        assert_eq!(state.last_selected(), None);
        let last = log.borrow().last().copied().unwrap();
        assert_eq!(last.action, SelectionAction::Unselect);
        assert_eq!(last.date, Some(datetime!(2024-05-01 10:00)));
    }

    #[test]
    fn test_unselect_moves_last_selected() {
        let (mut bus, _) = changes_bus();
        let mut state = SelectionState::new();
        for d in [datetime!(2024-05-01 0:00), datetime!(2024-05-02 0:00), datetime!(2024-05-03 0:00)] {
            select(&mut state, d, capped(3), &mut bus);
        }
        assert!(state.unselect(datetime!(2024-05-03 0:00), &mut bus));
        assert_eq!(state.last_selected(), Some(datetime!(2024-05-02 0:00)));
    }

    #[test]
    fn test_replace_in_place() {
        let (mut bus, log) = changes_bus();
        let mut state = SelectionState::new();
        select(&mut state, datetime!(2024-05-01 0:00), capped(3), &mut bus);
        select(&mut state, datetime!(2024-05-02 0:00), capped(3), &mut bus);
        assert!(state.replace(
            datetime!(2024-05-01 0:00),
            datetime!(2024-06-15 0:00),
            View::Day,
            &mut bus
        ));
        assert_eq!(
            state.dates(),
            [datetime!(2024-06-15 0:00), datetime!(2024-05-02 0:00)]
        );
        let last = log.borrow().last().copied().unwrap();
        assert!(last.update_time);
        assert_eq!(last.action, SelectionAction::Select);
    }

    #[test]
    fn test_replace_noops() {
        let (mut bus, log) = changes_bus();
        let mut state = SelectionState::new();
        select(&mut state, datetime!(2024-05-01 0:00), SINGLE, &mut bus);
        assert!(!state.replace(
            datetime!(2024-07-01 0:00),
            datetime!(2024-08-01 0:00),
            View::Day,
            &mut bus
        ));
        assert!(!state.replace(
            datetime!(2024-05-01 0:00),
            datetime!(2024-05-01 12:00),
            View::Day,
            &mut bus
        ));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_clear() {
        let (mut bus, log) = changes_bus();
        let mut state = SelectionState::new();
        select(&mut state, datetime!(2024-05-01 0:00), RANGE, &mut bus);
        state.clear(&mut bus);
        assert!(state.is_empty());
        assert_eq!(state.range_from(), None);
        assert_eq!(log.borrow().last().and_then(|c| c.date), None);
    }

    #[test]
    fn test_reselect_policy() {
        let (mut bus, _) = changes_bus();
        let mut state = SelectionState::new();
        let toggle_range = SelectionRules {
            toggle: true,
            ..RANGE
        };
        let keep_single = SelectionRules {
            toggle: false,
            ..SINGLE
        };
        assert_eq!(state.reselect_action(SINGLE), ReselectAction::Unselect);
        assert_eq!(state.reselect_action(keep_single), ReselectAction::Nothing);
        assert_eq!(state.reselect_action(toggle_range), ReselectAction::Unselect);
        select(&mut state, datetime!(2024-05-01 0:00), RANGE, &mut bus);
        assert_eq!(state.reselect_action(RANGE), ReselectAction::Reselect);
        select(&mut state, datetime!(2024-05-03 0:00), RANGE, &mut bus);
        assert_eq!(state.reselect_action(RANGE), ReselectAction::Nothing);
    }

    #[test]
    fn test_preview_range() {
        let (mut bus, _) = changes_bus();
        let mut state = SelectionState::new();
        select(&mut state, datetime!(2024-05-10 0:00), RANGE, &mut bus);
        state.preview_range(datetime!(2024-05-04 0:00));
        assert_eq!(state.range_from(), Some(datetime!(2024-05-04 0:00)));
        assert_eq!(state.range_to(), Some(datetime!(2024-05-10 0:00)));
        assert!(state.range_contains(date!(2024 - 05 - 07)));
    }

    #[test]
    fn test_set_last_time() {
        let (mut bus, _) = changes_bus();
        let mut state = SelectionState::new();
        assert_eq!(state.set_last_time(time!(9:30)), None);
        select(&mut state, datetime!(2024-05-10 0:00), SINGLE, &mut bus);
        assert_eq!(
            state.set_last_time(time!(9:30)),
            Some(datetime!(2024-05-10 9:30))
        );
        assert_eq!(state.dates(), [datetime!(2024-05-10 9:30)]);
    }

    #[test]
    fn test_apply_rules() {
        let (mut bus, _) = changes_bus();
        let mut state = SelectionState::new();
        for d in [datetime!(2024-05-09 0:00), datetime!(2024-05-02 0:00), datetime!(2024-05-05 0:00)] {
            select(&mut state, d, capped(3), &mut bus);
        }
        state.apply_rules(RANGE);
        assert_eq!(
            state.dates(),
            [datetime!(2024-05-02 0:00), datetime!(2024-05-09 0:00)]
        );
        assert_eq!(state.range_from(), Some(datetime!(2024-05-02 0:00)));
        state.apply_rules(SINGLE);
        assert_eq!(state.dates(), [datetime!(2024-05-02 0:00)]);
        assert_eq!(state.range_to(), None);
    }
}
