mod app;
mod calendar;
mod help;
mod theme;
use crate::app::App;
use anyhow::Context;
use calpick::{DateFormat, Datepicker, Locale, MultipleDates, Options, Position, View};
use lexopt::{Arg, Parser, ValueExt};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use time::{
    format_description::BorrowedFormatItem, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};
use tracing_subscriber::EnvFilter;

static YMD_FMT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

#[derive(Clone, Debug, PartialEq)]
enum Command {
    Run {
        options: Box<Options>,
        log_file: Option<PathBuf>,
    },
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        // The popup sits directly below the input line; offsets are in
        // terminal cells
        let mut options = Options::default().offset(0);
        let mut log_file = None;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                Arg::Short('r') | Arg::Long("range") => options.range = true,
                Arg::Short('m') | Arg::Long("multiple") => {
                    options.multiple_dates = match parser.value()?.parse::<usize>()? {
                        0 => MultipleDates::Unlimited,
                        n => MultipleDates::from(n),
                    };
                }
                Arg::Long("no-toggle") => options.toggle_selected = false,
                Arg::Long("autoclose") => options.auto_close = true,
                Arg::Long("timepicker") => options.timepicker = true,
                Arg::Long("view") => options.view = parser.value()?.parse::<View>()?,
                Arg::Long("min-view") => options.min_view = parser.value()?.parse::<View>()?,
                Arg::Long("locale") => {
                    options.locale = parser.value()?.parse_with(Locale::from_code)?;
                }
                Arg::Long("format") => {
                    options.date_format = Some(DateFormat::from(parser.value()?.string()?));
                }
                Arg::Long("min") => options.min_date = Some(parse_ymd(parser.value()?)?),
                Arg::Long("max") => options.max_date = Some(parse_ymd(parser.value()?)?),
                Arg::Long("position") => {
                    options.position = parser.value()?.parse::<Position>()?;
                }
                Arg::Long("log-file") => log_file = Some(PathBuf::from(parser.value()?)),
                Arg::Value(value) if options.start_date.is_none() => {
                    options.start_date = Some(parse_ymd(value)?);
                }
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Command::Run {
            options: Box::new(options),
            log_file,
        })
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Run { options, log_file } => {
                if let Some(path) = log_file {
                    init_logging(&path)?;
                }
                let now = OffsetDateTime::now_local().context("failed to determine local time")?;
                let today = PrimitiveDateTime::new(now.date(), now.time());
                let picker = Datepicker::new(today, *options);
                let value = with_terminal(|mut terminal| {
                    terminal.hide_cursor().context("failed to hide cursor")?;
                    App::new(picker)
                        .run(terminal)
                        .context("failed to run date picker")
                })?;
                if let Some(value) = value {
                    println!("{value}");
                }
                Ok(())
            }
            Command::Help => {
                println!("Usage: calpick [options] [YYYY-MM-DD]");
                println!();
                println!("Pick dates in the terminal and print them");
                println!();
                println!("Options:");
                println!("  -r, --range             Select a range of two dates");
                println!("  -m, --multiple N        Select up to N dates (0 = no limit)");
                println!("      --no-toggle         Picking a selected date keeps it selected");
                println!("      --autoclose         Finish as soon as the selection is complete");
                println!("      --timepicker        Also pick a time of day");
                println!("      --view LEVEL        Start in the day, month, or year view");
                println!("      --min-view LEVEL    Coarsest level at which picking selects");
                println!("      --locale CODE       Use a built-in locale ({})", codes());
                println!("      --format FMT        Format for the printed dates");
                println!("      --min YYYY-MM-DD    Earliest selectable date");
                println!("      --max YYYY-MM-DD    Latest selectable date");
                println!("      --position POS      Where to open the popup [default: bottom left]");
                println!("      --log-file PATH     Write debug logs to PATH");
                println!("  -h, --help              Display this help message and exit");
                println!("  -V, --version           Show the program version and exit");
                Ok(())
            }
            Command::Version => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    Command::from_parser(Parser::from_env())?.run()
}

fn parse_ymd(value: std::ffi::OsString) -> Result<Date, lexopt::Error> {
    value.parse_with(|s| Date::parse(s, &YMD_FMT))
}

fn codes() -> String {
    Locale::codes().collect::<Vec<_>>().join(", ")
}

// Logs go to a file since the terminal is taken over by the UI
fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("calpick=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn with_terminal<F, T>(func: F) -> anyhow::Result<T>
where
    F: FnOnce(DefaultTerminal) -> anyhow::Result<T>,
{
    let terminal = ratatui::init();
    let r = func(terminal);
    ratatui::restore();
    r
}
