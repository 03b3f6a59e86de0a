use crate::calendar::{columns, PickerWidget, POPUP_HEIGHT, POPUP_WIDTH};
use crate::help::Help;
use crate::theme::{BASE_STYLE, INPUT_STYLE, STATUS_STYLE};
use calpick::date::shift;
use calpick::events::SelectionAction;
use calpick::{Bounds, Datepicker, Event, EventKind, FocusOptions};
use crossterm::event::{read, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::Rect,
    widgets::Widget,
    Terminal,
};
use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;
use time::{Duration, PrimitiveDateTime};
use tracing::debug;

static PROMPT: &str = "Date: ";

/// Width of the mirrored input line that the popup is attached to
const INPUT_WIDTH: u16 = 30;

/// Minutes added or removed by one press of `+` or `-`
const TIME_STEP: i64 = 15;

#[derive(Debug)]
pub(crate) struct App {
    picker: Datepicker,
    state: AppState,
    status: Rc<RefCell<String>>,
    closed: Rc<Cell<bool>>,
}

impl App {
    pub(crate) fn new(mut picker: Datepicker) -> App {
        let status = Rc::new(RefCell::new(String::new()));
        for kind in [
            EventKind::ViewChanged,
            EventKind::SelectionChanged,
            EventKind::TimeChanged,
        ] {
            let status = Rc::clone(&status);
            picker.subscribe(kind, move |event| {
                if let Some(s) = describe(event) {
                    *status.borrow_mut() = s;
                }
            });
        }
        let closed = Rc::new(Cell::new(false));
        let on_close = Rc::clone(&closed);
        picker.on_hide(move || on_close.set(true));
        let focus = picker
            .selected_dates()
            .last()
            .copied()
            .unwrap_or_else(|| {
                let today = picker.clamped_date(picker.today());
                let state = picker.view_state();
                if state.is_other_month(today.date()) || state.is_other_year(today.date()) {
                    picker.view_date().midnight()
                } else {
                    today
                }
            });
        picker.set_focus_date(focus, FocusOptions::default());
        picker.show();
        picker.run_pending();
        App {
            picker,
            state: AppState::Picking,
            status,
            closed,
        }
    }

    /// Runs the event loop.  Returns the input value if the user accepted
    /// the selection, or `None` if they cancelled.
    pub(crate) fn run<B: Backend>(mut self, mut terminal: Terminal<B>) -> io::Result<Option<String>> {
        while !self.finished() {
            self.draw(&mut terminal)?;
            self.handle_input()?;
        }
        Ok(self.result())
    }

    fn draw<B: Backend>(&self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = read()?.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Cancelled;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        Ok(())
    }

    // Returns `false` if the key did nothing
    fn handle_key(&mut self, key: KeyCode) -> bool {
        let r = match self.state {
            AppState::Picking => match key {
                KeyCode::Char('h') | KeyCode::Left => self.move_focus(-1),
                KeyCode::Char('l') | KeyCode::Right => self.move_focus(1),
                KeyCode::Char('k') | KeyCode::Up => self.move_focus(-self.row_len()),
                KeyCode::Char('j') | KeyCode::Down => self.move_focus(self.row_len()),
                KeyCode::Char('[') | KeyCode::PageUp => matches!(self.picker.prev(), Ok(true)),
                KeyCode::Char(']') | KeyCode::PageDown => matches!(self.picker.next(), Ok(true)),
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.picker.pick(self.focus());
                    true
                }
                KeyCode::Char('u') | KeyCode::Backspace => {
                    self.picker.up();
                    true
                }
                KeyCode::Char('t') => {
                    let today = self.picker.clamped_date(self.picker.today());
                    self.set_focus(today);
                    true
                }
                KeyCode::Char('c') => {
                    self.picker.clear();
                    true
                }
                KeyCode::Char('+') => self.nudge_time(TIME_STEP),
                KeyCode::Char('-') => self.nudge_time(-TIME_STEP),
                KeyCode::Char('d') => {
                    self.state = AppState::Done;
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Cancelled;
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Picking;
                true
            }
            AppState::Done | AppState::Cancelled => false,
        };
        self.picker.run_pending();
        if self.closed.get() && self.state == AppState::Picking {
            debug!("picker closed itself");
            self.state = AppState::Done;
        }
        r
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn finished(&self) -> bool {
        matches!(self.state, AppState::Done | AppState::Cancelled)
    }

    fn result(&self) -> Option<String> {
        (self.state == AppState::Done).then(|| self.picker.input_value().to_owned())
    }

    fn focus(&self) -> PrimitiveDateTime {
        self.picker
            .focus_date()
            .unwrap_or_else(|| self.picker.view_date().midnight())
    }

    fn row_len(&self) -> i32 {
        i32::from(columns(self.picker.current_view()))
    }

    // Moves the focus by `steps` cells of the current view
    fn move_focus(&mut self, steps: i32) -> bool {
        let focus = self.focus();
        let Some(date) = shift(focus.date(), self.picker.current_view(), steps) else {
            return false;
        };
        let target = self
            .picker
            .clamped_date(PrimitiveDateTime::new(date, focus.time()));
        if target.date() == focus.date() {
            return false;
        }
        self.set_focus(target);
        true
    }

    fn set_focus(&mut self, date: PrimitiveDateTime) {
        self.picker.set_focus_date(
            date,
            FocusOptions {
                view_date_transition: true,
            },
        );
    }

    fn nudge_time(&mut self, minutes: i64) -> bool {
        if !self.picker.options().timepicker {
            return false;
        }
        let base = self
            .picker
            .last_selected_date()
            .unwrap_or(self.picker.today());
        let time = base.time() + Duration::minutes(minutes);
        self.picker.set_time(time.hour(), time.minute());
        true
    }

    fn popup_area(&self, area: Rect) -> Rect {
        let anchor = Bounds {
            x: i32::from(area.x) + 1,
            y: i32::from(area.y),
            width: i32::from(INPUT_WIDTH),
            height: 1,
        };
        let popup = Bounds {
            x: 0,
            y: 0,
            width: i32::from(POPUP_WIDTH),
            height: i32::from(POPUP_HEIGHT),
        };
        let (x, y) = self.picker.set_position(anchor, popup);
        let x = u16::try_from(x.max(0)).unwrap_or(u16::MAX);
        let y = u16::try_from(y.max(0)).unwrap_or(u16::MAX);
        Rect::new(x, y, POPUP_WIDTH, POPUP_HEIGHT).intersection(area)
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        if area.is_empty() {
            return;
        }
        buf.set_stringn(
            area.x + 1,
            area.y,
            PROMPT,
            usize::from(area.width.saturating_sub(1)),
            BASE_STYLE,
        );
        let value_x = area.x + 1 + u16::try_from(PROMPT.len()).unwrap_or(0);
        if value_x < area.right() {
            buf.set_stringn(
                value_x,
                area.y,
                self.picker.input_value(),
                usize::from(area.right() - value_x),
                INPUT_STYLE,
            );
        }
        if self.picker.is_visible() {
            PickerWidget::new(&self.picker).render(self.popup_area(area), buf);
        }
        if area.height > 1 {
            buf.set_stringn(
                area.x + 1,
                area.bottom() - 1,
                self.status.borrow().as_str(),
                usize::from(area.width.saturating_sub(1)),
                STATUS_STYLE,
            );
        }
        if self.state == AppState::Helping {
            Help(BASE_STYLE).render(area, buf);
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Picking,
    Helping,
    Done,
    Cancelled,
}

fn describe(event: &Event) -> Option<String> {
    match event {
        Event::ViewChanged(view) => Some(format!("{view} view")),
        Event::SelectionChanged(change) => match (change.action, change.date) {
            (SelectionAction::Select, Some(date)) => Some(format!("selected {}", date.date())),
            (SelectionAction::Unselect, Some(date)) => {
                Some(format!("unselected {}", date.date()))
            }
            (_, None) => Some(String::from("cleared")),
        },
        Event::TimeChanged { hours, minutes } => Some(format!("time {hours:02}:{minutes:02}")),
        _ => None,
    }
}
