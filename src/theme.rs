use ratatui::style::{Color, Modifier, Style};

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const HEADER_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const STATUS_STYLE: Style = BASE_STYLE.fg(Color::Gray);

pub(crate) const INPUT_STYLE: Style = BASE_STYLE.add_modifier(Modifier::UNDERLINED);

pub(crate) mod cell {
    use super::*;

    pub(crate) const OTHER_PERIOD_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

    pub(crate) const WEEKEND_STYLE: Style = BASE_STYLE.fg(Color::LightRed);

    pub(crate) const SELECTED_STYLE: Style = Style::new()
        .fg(Color::Black)
        .bg(Color::LightBlue)
        .add_modifier(Modifier::BOLD);

    pub(crate) const IN_RANGE_STYLE: Style = BASE_STYLE.bg(Color::Blue);

    pub(crate) const DISABLED_STYLE: Style = BASE_STYLE
        .fg(Color::DarkGray)
        .add_modifier(Modifier::CROSSED_OUT);
}
