//! Typed synchronous publish/subscribe used to keep renderers in step with
//! the datepicker's state.
use crate::view::View;
use std::fmt;
use time::{Date, Month, PrimitiveDateTime};
use tracing::trace;

/// Payload of [`Event::ViewDateChanged`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ViewDateChange {
    pub date: Date,
    pub month: Month,
    pub year: i32,
    pub decade: (i32, i32),
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SelectionAction {
    Select,
    Unselect,
}

/// Payload of [`Event::SelectionChanged`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SelectionChange {
    pub action: SelectionAction,
    /// `None` when the whole selection was cleared
    pub date: Option<PrimitiveDateTime>,
    /// Silent changes do not reach the `on_select` callback
    pub silent: bool,
    /// Hint for a time picker to adopt the time of `date`
    pub update_time: bool,
}

/// Payload of [`Event::FocusChanged`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FocusChange {
    pub date: Option<PrimitiveDateTime>,
    pub view_date_transition: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    ViewDateChanged(ViewDateChange),
    ViewChanged(View),
    SelectionChanged(SelectionChange),
    FocusChanged(FocusChange),
    LastSelectedChanged(Option<PrimitiveDateTime>),
    TimeChanged { hours: u8, minutes: u8 },
    VisibilityChanged(bool),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ViewDateChanged(_) => EventKind::ViewDateChanged,
            Event::ViewChanged(_) => EventKind::ViewChanged,
            Event::SelectionChanged(_) => EventKind::SelectionChanged,
            Event::FocusChanged(_) => EventKind::FocusChanged,
            Event::LastSelectedChanged(_) => EventKind::LastSelectedChanged,
            Event::TimeChanged { .. } => EventKind::TimeChanged,
            Event::VisibilityChanged(_) => EventKind::VisibilityChanged,
        }
    }
}

/// The name under which handlers subscribe
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EventKind {
    ViewDateChanged,
    ViewChanged,
    SelectionChanged,
    FocusChanged,
    LastSelectedChanged,
    TimeChanged,
    VisibilityChanged,
}

type Handler = Box<dyn FnMut(&Event)>;

/// Handlers run synchronously in registration order.  A panicking handler
/// takes the remaining handlers for that publish down with it.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(EventKind, Handler)>,
}

impl EventBus {
    pub fn new() -> EventBus {
        EventBus::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.handlers.push((kind, Box::new(handler)));
    }

    pub fn publish(&mut self, event: &Event) {
        let kind = event.kind();
        trace!(?event, "publishing");
        for (_, handler) in self.handlers.iter_mut().filter(|(k, _)| *k == kind) {
            handler(event);
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.iter().filter(|(k, _)| *k == kind).count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field(
                "handlers",
                &self.handlers.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .finish()
    }
}
