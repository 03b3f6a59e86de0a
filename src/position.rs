//! Placement of the picker popup relative to the element it is attached to.
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Align {
    Top,
    Right,
    Bottom,
    Left,
    Center,
}

/// A position such as `"bottom left"`: the popup goes below the anchor with
/// their left edges aligned.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(try_from = "String")]
pub struct Position {
    pub main: Side,
    pub secondary: Align,
}

impl Default for Position {
    fn default() -> Position {
        Position {
            main: Side::Bottom,
            secondary: Align::Left,
        }
    }
}

/// An axis-aligned rectangle in whatever units the host uses
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Position {
    /// Returns the top-left corner at which to place a popup of size
    /// `popup` (only its width and height are used) next to `anchor`,
    /// `offset` units away on the main side.
    pub fn place(self, anchor: Bounds, popup: Bounds, offset: i32) -> (i32, i32) {
        let mut left = anchor.x;
        let mut top = anchor.y;
        match self.main {
            Side::Top => top = anchor.y - popup.height - offset,
            Side::Right => left = anchor.x + anchor.width + offset,
            Side::Bottom => top = anchor.y + anchor.height + offset,
            Side::Left => left = anchor.x - popup.width - offset,
        }
        match self.secondary {
            Align::Top => top = anchor.y,
            Align::Right => left = anchor.x + anchor.width - popup.width,
            Align::Bottom => top = anchor.y + anchor.height - popup.height,
            Align::Left => left = anchor.x,
            Align::Center => {
                if matches!(self.main, Side::Left | Side::Right) {
                    top = anchor.y + anchor.height / 2 - popup.height / 2;
                } else {
                    left = anchor.x + anchor.width / 2 - popup.width / 2;
                }
            }
        }
        (left, top)
    }
}

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Position, ParsePositionError> {
        let err = || ParsePositionError(s.to_owned());
        let mut words = s.split_whitespace();
        let main = match words.next() {
            Some("top") => Side::Top,
            Some("right") => Side::Right,
            Some("bottom") => Side::Bottom,
            Some("left") => Side::Left,
            _ => return Err(err()),
        };
        let secondary = match words.next() {
            Some("top") => Align::Top,
            Some("right") => Align::Right,
            Some("bottom") => Align::Bottom,
            Some("left") => Align::Left,
            Some("center") | None => Align::Center,
            Some(_) => return Err(err()),
        };
        if words.next().is_some() {
            return Err(err());
        }
        let vertical_main = matches!(main, Side::Top | Side::Bottom);
        let vertical_secondary = matches!(secondary, Align::Top | Align::Bottom);
        if secondary != Align::Center && vertical_main == vertical_secondary {
            return Err(err());
        }
        Ok(Position { main, secondary })
    }
}

impl TryFrom<String> for Position {
    type Error = ParsePositionError;

    fn try_from(s: String) -> Result<Position, ParsePositionError> {
        s.parse()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = match self.main {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        };
        let secondary = match self.secondary {
            Align::Top => "top",
            Align::Right => "right",
            Align::Bottom => "bottom",
            Align::Left => "left",
            Align::Center => "center",
        };
        write!(f, "{main} {secondary}")
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid position: {0:?}")]
pub struct ParsePositionError(pub String);
