//! State & selection engine for an interactive date picker.
//!
//! A [`Datepicker`] tracks which calendar level is shown (a month of days, a
//! year of months, or a decade of years), which dates are selected, and which
//! date has keyboard focus.  Renderers follow along by subscribing to the
//! [`Event`]s it publishes; hosts drive it with the mutators and call
//! [`Datepicker::run_pending`] once per turn of their event loop to flush
//! deferred work.
//!
//! ```
//! use calpick::{Datepicker, Options, SelectOptions};
//! use time::macros::datetime;
//!
//! let mut dp = Datepicker::new(datetime!(2024-05-15 9:00), Options::default().range(true));
//! dp.select_date("2024-05-20", SelectOptions::default());
//! dp.select_date("2024-05-12", SelectOptions::default());
//! dp.run_pending();
//! assert_eq!(dp.input_value(), "05/12/2024, 05/20/2024");
//! ```
pub mod date;
pub mod datepicker;
pub mod events;
pub mod format;
pub mod locale;
pub mod options;
pub mod position;
pub mod selection;
pub mod view;

pub use crate::date::{IntoDateTime, OutOfTimeError};
pub use crate::datepicker::{Completion, Datepicker, FocusOptions, OnSelect, Selected};
pub use crate::events::{Event, EventBus, EventKind};
pub use crate::format::DateFormat;
pub use crate::locale::{Locale, UnknownLocaleError};
pub use crate::options::{MultipleDates, Options};
pub use crate::position::{Bounds, ParsePositionError, Position};
pub use crate::selection::SelectOptions;
pub use crate::view::{ParseViewError, View};
