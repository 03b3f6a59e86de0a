mod widget;
pub(crate) use self::widget::{PickerWidget, POPUP_HEIGHT, POPUP_WIDTH};
use crate::theme::{cell::*, BASE_STYLE};
use calpick::date::is_same_date;
use calpick::{Datepicker, View};
use ratatui::style::{Modifier, Style};
use time::Date;

/// Number of cells per grid row in `view`; also the distance in cells moved
/// by a vertical focus step
pub(crate) fn columns(view: View) -> u16 {
    match view {
        View::Day => 7,
        View::Month => 3,
        View::Year => 4,
    }
}

/// Style for the cell showing `date` in `view`
pub(crate) fn date_style(picker: &Datepicker, date: Date, view: View) -> Style {
    if !picker.is_selectable(date, view) {
        return DISABLED_STYLE;
    }
    if picker.selection().is_selected(date, view).is_some() {
        return SELECTED_STYLE;
    }
    if view == View::Day && picker.options().range && picker.selection().range_contains(date) {
        return IN_RANGE_STYLE;
    }
    let state = picker.view_state();
    let other_period = match view {
        View::Day => state.is_other_month(date),
        View::Month => false,
        View::Year => state.is_other_decade(date),
    };
    let style = if other_period {
        OTHER_PERIOD_STYLE
    } else if view == View::Day && picker.is_weekend(date.weekday().number_days_from_sunday()) {
        WEEKEND_STYLE
    } else {
        BASE_STYLE
    };
    if is_same_date(date, picker.today().date(), view) {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}
