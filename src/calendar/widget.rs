use super::{columns, date_style};
use crate::theme::{BASE_STYLE, HEADER_STYLE};
use calpick::date::is_same_date;
use calpick::view::grid_dates;
use calpick::{DateFormat, Datepicker, View};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    widgets::{Block, Clear, Widget},
};
use time::Date;

/// Outer width of the popup, borders included
pub(crate) const POPUP_WIDTH: u16 = 30;

/// Outer height of the popup: a weekday header and up to six weeks, plus
/// borders
pub(crate) const POPUP_HEIGHT: u16 = 9;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Geometry {
    cell_width: u16,
    /// Line of the first row of cells, relative to the inside of the border
    top: u16,
    row_step: u16,
}

impl Geometry {
    fn for_view(view: View) -> Geometry {
        match view {
            View::Day => Geometry {
                cell_width: 4,
                top: 1,
                row_step: 1,
            },
            View::Month => Geometry {
                cell_width: 9,
                top: 0,
                row_step: 2,
            },
            View::Year => Geometry {
                cell_width: 7,
                top: 1,
                row_step: 2,
            },
        }
    }
}

/// Draws the grid for the picker's current view.  The focused cell is
/// bracketed.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PickerWidget<'a> {
    picker: &'a Datepicker,
}

impl<'a> PickerWidget<'a> {
    pub(crate) fn new(picker: &'a Datepicker) -> PickerWidget<'a> {
        PickerWidget { picker }
    }

    fn title(&self) -> String {
        let template = match self.picker.current_view() {
            View::Day => "MMMM yyyy",
            View::Month => "yyyy",
            View::Year => "yyyy1 - yyyy2",
        };
        self.picker
            .format_date(&DateFormat::from(template), self.picker.view_date())
            .unwrap_or_default()
    }

    fn label(&self, date: Date, view: View) -> String {
        match view {
            View::Day => format!("{:>2}", date.day()),
            View::Month => {
                self.picker.locale().months_short[usize::from(u8::from(date.month()) - 1)].clone()
            }
            View::Year => date.year().to_string(),
        }
    }
}

impl Widget for PickerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = self.picker.current_view();
        let block = Block::bordered()
            .title(format!(" < {} > ", self.title()))
            .title_alignment(Alignment::Center)
            .style(BASE_STYLE);
        let inner = block.inner(area);
        Clear.render(area, buf);
        block.render(area, buf);
        let geo = Geometry::for_view(view);
        if view == View::Day {
            for (i, name) in std::iter::zip(0u16.., self.picker.locale().weekday_header()) {
                let text = pad_cell(name, geo.cell_width, false);
                put(buf, inner, i * geo.cell_width, 0, &text, HEADER_STYLE);
            }
        }
        let cols = columns(view);
        let focus = self.picker.focus_date().map(|f| f.date());
        let dates = grid_dates(
            view,
            self.picker.view_date(),
            self.picker.locale().first_day,
        );
        for (i, date) in std::iter::zip(0u16.., dates) {
            let focused = focus.is_some_and(|f| is_same_date(f, date, view));
            let text = pad_cell(&self.label(date, view), geo.cell_width, focused);
            put(
                buf,
                inner,
                (i % cols) * geo.cell_width,
                geo.top + (i / cols) * geo.row_step,
                &text,
                date_style(self.picker, date, view),
            );
        }
    }
}

fn pad_cell(label: &str, width: u16, focused: bool) -> String {
    let inner = usize::from(width.saturating_sub(2));
    if focused {
        format!("[{label:^inner$}]")
    } else {
        format!(" {label:^inner$} ")
    }
}

// `dx` and `dy` are relative to `inner`; text running past its right edge is
// cut off
fn put(buf: &mut Buffer, inner: Rect, dx: u16, dy: u16, text: &str, style: Style) {
    if dy < inner.height && dx < inner.width {
        buf.set_stringn(
            inner.x + dx,
            inner.y + dy,
            text,
            usize::from(inner.width - dx),
            style,
        );
    }
}
