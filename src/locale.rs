use crate::format::DateFormat;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Names, formats, and week layout used to render and format dates
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    /// Full weekday names, starting from Sunday
    pub days: [String; 7],
    pub days_short: [String; 7],
    pub days_min: [String; 7],
    /// Full month names, starting from January
    pub months: [String; 12],
    pub months_short: [String; 12],
    pub today: String,
    pub clear: String,
    pub date_format: DateFormat,
    pub time_format: String,
    /// Day the week starts on (0 = Sunday)
    pub first_day: u8,
}

impl Locale {
    pub fn en() -> Locale {
        EN.to_locale()
    }

    /// Looks up a built-in locale by its language code
    pub fn from_code(code: &str) -> Result<Locale, UnknownLocaleError> {
        PACKS
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(code))
            .map(|(_, data)| data.to_locale())
            .ok_or_else(|| UnknownLocaleError(code.to_owned()))
    }

    pub fn codes() -> impl Iterator<Item = &'static str> {
        PACKS.iter().map(|&(c, _)| c)
    }

    /// Short weekday names ordered so that the week starts on `first_day`
    pub fn weekday_header(&self) -> Vec<&str> {
        (0..7)
            .map(|i| self.days_min[(usize::from(self.first_day) + i) % 7].as_str())
            .collect()
    }
}

impl Default for Locale {
    fn default() -> Locale {
        Locale::en()
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("unknown locale: {0:?}")]
pub struct UnknownLocaleError(pub String);

/// Reads either a built-in locale code or a full locale object
pub(crate) fn deserialize_locale<'de, D: Deserializer<'de>>(d: D) -> Result<Locale, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Code(String),
        Pack(Box<Locale>),
    }

    match Raw::deserialize(d)? {
        Raw::Code(code) => Locale::from_code(&code).map_err(serde::de::Error::custom),
        Raw::Pack(locale) => Ok(*locale),
    }
}

struct LocaleData {
    days: [&'static str; 7],
    days_short: [&'static str; 7],
    days_min: [&'static str; 7],
    months: [&'static str; 12],
    months_short: [&'static str; 12],
    today: &'static str,
    clear: &'static str,
    date_format: &'static str,
    time_format: &'static str,
    first_day: u8,
}

impl LocaleData {
    fn to_locale(&self) -> Locale {
        Locale {
            days: self.days.map(String::from),
            days_short: self.days_short.map(String::from),
            days_min: self.days_min.map(String::from),
            months: self.months.map(String::from),
            months_short: self.months_short.map(String::from),
            today: self.today.into(),
            clear: self.clear.into(),
            date_format: DateFormat::from(self.date_format),
            time_format: self.time_format.into(),
            first_day: self.first_day,
        }
    }
}

static PACKS: &[(&str, &LocaleData)] = &[
    ("en", &EN),
    ("de", &DE),
    ("es", &ES),
    ("fr", &FR),
    ("ru", &RU),
];

static EN: LocaleData = LocaleData {
    days: ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"],
    days_short: ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
    days_min: ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
    months: [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ],
    months_short: [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ],
    today: "Today",
    clear: "Clear",
    date_format: "MM/dd/yyyy",
    time_format: "hh:mm aa",
    first_day: 0,
};

static DE: LocaleData = LocaleData {
    days: ["Sonntag", "Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag", "Samstag"],
    days_short: ["Son", "Mon", "Die", "Mit", "Don", "Fre", "Sam"],
    days_min: ["So", "Mo", "Di", "Mi", "Do", "Fr", "Sa"],
    months: [
        "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
        "Oktober", "November", "Dezember",
    ],
    months_short: [
        "Jan", "Feb", "Mär", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Dez",
    ],
    today: "Heute",
    clear: "Aufräumen",
    date_format: "dd.MM.yyyy",
    time_format: "HH:mm",
    first_day: 1,
};

static ES: LocaleData = LocaleData {
    days: ["Domingo", "Lunes", "Martes", "Miércoles", "Jueves", "Viernes", "Sábado"],
    days_short: ["Dom", "Lun", "Mar", "Mie", "Jue", "Vie", "Sab"],
    days_min: ["Do", "Lu", "Ma", "Mi", "Ju", "Vi", "Sa"],
    months: [
        "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto",
        "Septiembre", "Octubre", "Noviembre", "Diciembre",
    ],
    months_short: [
        "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
    ],
    today: "Hoy",
    clear: "Limpiar",
    date_format: "dd/MM/yyyy",
    time_format: "hh:mm aa",
    first_day: 1,
};

static FR: LocaleData = LocaleData {
    days: ["Dimanche", "Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi", "Samedi"],
    days_short: ["Dim", "Lun", "Mar", "Mer", "Jeu", "Ven", "Sam"],
    days_min: ["Di", "Lu", "Ma", "Me", "Je", "Ve", "Sa"],
    months: [
        "Janvier", "Février", "Mars", "Avril", "Mai", "Juin", "Juillet", "Août", "Septembre",
        "Octobre", "Novembre", "Décembre",
    ],
    months_short: [
        "Jan", "Fév", "Mars", "Avr", "Mai", "Juin", "Juil", "Août", "Sep", "Oct", "Nov", "Déc",
    ],
    today: "Aujourd'hui",
    clear: "Effacer",
    date_format: "dd/MM/yyyy",
    time_format: "HH:mm",
    first_day: 1,
};

static RU: LocaleData = LocaleData {
    days: [
        "Воскресенье", "Понедельник", "Вторник", "Среда", "Четверг", "Пятница", "Суббота",
    ],
    days_short: ["Вос", "Пон", "Вто", "Сре", "Чет", "Пят", "Суб"],
    days_min: ["Вс", "Пн", "Вт", "Ср", "Чт", "Пт", "Сб"],
    months: [
        "Январь", "Февраль", "Март", "Апрель", "Май", "Июнь", "Июль", "Август", "Сентябрь",
        "Октябрь", "Ноябрь", "Декабрь",
    ],
    months_short: [
        "Янв", "Фев", "Мар", "Апр", "Май", "Июн", "Июл", "Авг", "Сен", "Окт", "Ноя", "Дек",
    ],
    today: "Сегодня",
    clear: "Очистить",
    date_format: "dd.MM.yyyy",
    time_format: "HH:mm",
    first_day: 1,
};
