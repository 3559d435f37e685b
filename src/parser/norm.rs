//! Time and date string normalization.
//!
//! Raw token text ("8:00p", "0600", "11o'clock", "6/20/18") is mapped into
//! one of two canonical forms per kind: absolute (hour or year known for
//! certain) or relative (AM/PM or year still undetermined, to be fixed up
//! by the resolver). Anything that fails every pattern or any range check
//! normalizes to `None` — callers treat that as "no time/date here", never
//! as an error to propagate.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// 4-digit years must fall in this range to be believed.
const YEAR_MIN: i32 = 1901;
const YEAR_MAX: i32 = 2099;

/// A time of day in canonical form.
///
/// Renders as `abstime:HH:MM:SS` (hour certain, 0-23) or
/// `reltime:HH:MM:SS` (hour 1-12, AM/PM undetermined). `Display` and
/// `FromStr` round-trip the grammar exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormTime {
    Abs { hour: u32, minute: u32, second: u32 },
    Rel { hour: u32, minute: u32, second: u32 },
}

impl NormTime {
    pub fn is_relative(&self) -> bool {
        matches!(self, NormTime::Rel { .. })
    }
}

impl fmt::Display for NormTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NormTime::Abs { hour, minute, second } => {
                write!(f, "abstime:{:02}:{:02}:{:02}", hour, minute, second)
            }
            NormTime::Rel { hour, minute, second } => {
                write!(f, "reltime:{:02}:{:02}:{:02}", hour, minute, second)
            }
        }
    }
}

/// A calendar date in canonical form.
///
/// Renders as `absdate:MM/DD/YYYY`, `reldate:MM/DD`, `reldate:weekday:N`
/// (N = 0..6, Monday = 0), or `reldate:monthday:N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormDate {
    Abs { month: u32, day: u32, year: i32 },
    /// Month and day known, year not: the next such occurrence.
    MonthDay { month: u32, day: u32 },
    /// The next occurrence of this day of the week.
    Weekday(u32),
    /// The next occurrence of this day of the month ("the 21st").
    DayOfMonth(u32),
}

impl fmt::Display for NormDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NormDate::Abs { month, day, year } => {
                write!(f, "absdate:{:02}/{:02}/{:04}", month, day, year)
            }
            NormDate::MonthDay { month, day } => write!(f, "reldate:{:02}/{:02}", month, day),
            NormDate::Weekday(n) => write!(f, "reldate:weekday:{}", n),
            NormDate::DayOfMonth(n) => write!(f, "reldate:monthday:{}", n),
        }
    }
}

/// The input string is not one of the canonical normalized forms.
#[derive(Debug, thiserror::Error)]
#[error("not a normalized time/date form: {0}")]
pub struct NormFormError(String);

static RE_NORM_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<kind>abs|rel)time:(?P<h>\d{2}):(?P<min>\d{2}):(?P<sec>\d{2})$").unwrap()
});

impl FromStr for NormTime {
    type Err = NormFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = RE_NORM_TIME
            .captures(s)
            .ok_or_else(|| NormFormError(s.to_string()))?;
        let hour: u32 = c["h"].parse().map_err(|_| NormFormError(s.to_string()))?;
        let minute: u32 = c["min"].parse().map_err(|_| NormFormError(s.to_string()))?;
        let second: u32 = c["sec"].parse().map_err(|_| NormFormError(s.to_string()))?;
        if minute > 59 || second > 59 {
            return Err(NormFormError(s.to_string()));
        }
        match &c["kind"] {
            "abs" if hour <= 23 => Ok(NormTime::Abs { hour, minute, second }),
            "rel" if (1..=12).contains(&hour) => Ok(NormTime::Rel { hour, minute, second }),
            _ => Err(NormFormError(s.to_string())),
        }
    }
}

static RE_NORM_ABSDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^absdate:(\d{2})/(\d{2})/(\d{4})$").unwrap());
static RE_NORM_RELDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^reldate:(\d{2})/(\d{2})$").unwrap());
static RE_NORM_WEEKDAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^reldate:weekday:(\d)$").unwrap());
static RE_NORM_MONTHDAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^reldate:monthday:(\d{1,2})$").unwrap());

impl FromStr for NormDate {
    type Err = NormFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || NormFormError(s.to_string());
        if let Some(c) = RE_NORM_ABSDATE.captures(s) {
            let month: u32 = c[1].parse().map_err(|_| err())?;
            let day: u32 = c[2].parse().map_err(|_| err())?;
            let year: i32 = c[3].parse().map_err(|_| err())?;
            if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                return Err(err());
            }
            return Ok(NormDate::Abs { month, day, year });
        }
        if let Some(c) = RE_NORM_RELDATE.captures(s) {
            let month: u32 = c[1].parse().map_err(|_| err())?;
            let day: u32 = c[2].parse().map_err(|_| err())?;
            if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                return Err(err());
            }
            return Ok(NormDate::MonthDay { month, day });
        }
        if let Some(c) = RE_NORM_WEEKDAY.captures(s) {
            let n: u32 = c[1].parse().map_err(|_| err())?;
            if n > 6 {
                return Err(err());
            }
            return Ok(NormDate::Weekday(n));
        }
        if let Some(c) = RE_NORM_MONTHDAY.captures(s) {
            let n: u32 = c[1].parse().map_err(|_| err())?;
            return Ok(NormDate::DayOfMonth(n));
        }
        Err(err())
    }
}

/// Weekday names and common abbreviations, Monday = 0.
pub static WEEKDAY_WORDS: &[&str] = &[
    "monday", "mon", "mo", "tuesday", "tue", "tues", "tu", "wednesday", "wed", "weds",
    "thursday", "thu", "thur", "thurs", "th", "friday", "fri", "fr", "saturday", "sat",
    "sunday", "sun",
];

pub fn weekday_num(s: &str) -> Option<u32> {
    match s {
        "monday" | "mon" | "mo" => Some(0),
        "tuesday" | "tue" | "tues" | "tu" => Some(1),
        "wednesday" | "wed" | "weds" => Some(2),
        "thursday" | "thu" | "thur" | "thurs" | "th" => Some(3),
        "friday" | "fri" | "fr" => Some(4),
        "saturday" | "sat" => Some(5),
        "sunday" | "sun" => Some(6),
        _ => None,
    }
}

/// Month names and common abbreviations.
pub static MONTH_WORDS: &[&str] = &[
    "january", "jan", "february", "feb", "march", "mar", "april", "apr", "may", "june",
    "jun", "july", "jul", "august", "aug", "september", "sept", "sep", "october", "oct",
    "november", "nov", "december", "dec",
];

pub fn month_num(s: &str) -> Option<u32> {
    match s {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sept" | "sep" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}

// Meridian suffix: a, am, a.m., p, pm, p.m., ...
const AMPM: &str = r"(?:[ap]m?)|(?:[ap]\.?m\.?)";

/// Pattern matching strings that are unambiguously times ("8p", "1:30",
/// "0630pm", "noon"). Used by the range recognizer to decide which half of
/// a hyphenated token carries certain information.
pub(crate) static TIME_CERTAIN_PAT: Lazy<String> = Lazy::new(|| {
    format!(
        r"(?:\d{{1,2}}:\d{{2}}(?::\d{{2}})?(?:{ampm})?)|(?:\d{{1,2}}(?:{ampm}))|(?:\d{{1,2}}\d{{2}}(?:{ampm}))|(?:\d{{1,2}}o'?clock)|(?:midnight|noon)",
        ampm = AMPM
    )
});

/// More permissive: anything that might be a time. A superset of
/// [`TIME_CERTAIN_PAT`].
pub(crate) static TIME_POSSIBLE_PAT: Lazy<String> = Lazy::new(|| {
    format!(
        r"(?:\d{{1,2}}:\d{{2}}(?::\d{{2}})?(?:{ampm})?)|(?:\d{{1,2}}(?:{ampm})?)|(?:\d{{1,2}}\d{{2}}(?:{ampm})?)|(?:\d{{1,2}}o'?clock)|(?:midnight|noon)",
        ampm = AMPM
    )
});

static RE_TIMESPEC: Lazy<Regex> = Lazy::new(|| {
    // hh:mm[:ss][am]
    Regex::new(&format!(
        r"^(?P<h>\d{{1,2}}):(?P<min>\d{{2}})(?P<sec>:\d{{2}})?(?P<mer>{})?$",
        AMPM
    ))
    .unwrap()
});
static RE_HOURSPEC: Lazy<Regex> = Lazy::new(|| {
    // hh[am], hh in range 1..23
    Regex::new(&format!(r"^(?P<h>\d{{1,2}})(?P<mer>{})?$", AMPM)).unwrap()
});
static RE_MILSPEC: Lazy<Regex> = Lazy::new(|| {
    // hhmm, all 4 digits present
    Regex::new(r"^(?P<h>\d{2})(?P<min>\d{2})$").unwrap()
});
static RE_NOCOLON: Lazy<Regex> = Lazy::new(|| {
    // hhmm[am], 1 or 2 hour digits
    Regex::new(&format!(r"^(?P<h>\d{{1,2}})(?P<min>\d{{2}})(?P<mer>{})?$", AMPM)).unwrap()
});
static RE_OCLOCK: Lazy<Regex> = Lazy::new(|| {
    // hho'clock, with or without the apostrophe
    Regex::new(r"^(?P<h>\d{1,2})o'?clock$").unwrap()
});

/// Attempt to normalize a string into a time of day.
///
/// Recognizes, in priority order: "midnight"/"noon"; already-normalized
/// strings (idempotent); `hh:mm[:ss][am]`; `hh[am]` with hh in 1..23
/// (a meridian on an hour above 12, like "13pm", is rejected); 4-digit
/// military time; `hmm[am]`/`hhmm[am]`; `hh o'clock` with hh in 1..12.
/// The hour "0"/"00" implies a known meridian. Returns `None` for any
/// input failing every pattern or any range check.
pub fn normalize_time(s: &str) -> Option<NormTime> {
    match s {
        "midnight" => return Some(NormTime::Abs { hour: 0, minute: 0, second: 0 }),
        "noon" => return Some(NormTime::Abs { hour: 12, minute: 0, second: 0 }),
        "000" => return None,
        _ => {}
    }
    if let Ok(t) = s.parse::<NormTime>() {
        return Some(t);
    }

    let mut hour: Option<u32> = None;
    let mut minute = 0u32;
    let mut second = 0u32;
    let mut is_pm = false;
    let mut meridian_known = false;

    if let Some(c) = RE_TIMESPEC.captures(s) {
        let h_txt = c["h"].to_string();
        hour = h_txt.parse().ok();
        minute = c["min"].parse().ok()?;
        if let Some(sec) = c.name("sec") {
            second = sec.as_str()[1..].parse().ok()?;
        }
        if let Some(mer) = c.name("mer") {
            meridian_known = true;
            is_pm = mer.as_str().starts_with('p');
        } else if h_txt == "0" || h_txt == "00" {
            // the hour "0" can only be a 24-hour clock reading
            meridian_known = true;
        }
    }

    if hour.is_none() {
        if let Some(c) = RE_HOURSPEC.captures(s) {
            let h: u32 = c["h"].parse().ok()?;
            if (1..=23).contains(&h) {
                hour = Some(h);
                minute = 0;
                if let Some(mer) = c.name("mer") {
                    if h > 12 {
                        hour = None; // "13pm" is not a time
                    } else {
                        meridian_known = true;
                        is_pm = mer.as_str().starts_with('p');
                    }
                }
            }
        }
    }

    if hour.is_none() {
        if let Some(c) = RE_MILSPEC.captures(s) {
            hour = c["h"].parse().ok();
            minute = c["min"].parse().ok()?;
            meridian_known = true;
        }
    }

    if hour.is_none() {
        if let Some(c) = RE_NOCOLON.captures(s) {
            let h: u32 = c["h"].parse().ok()?;
            hour = Some(h);
            minute = c["min"].parse().ok()?;
            if let Some(mer) = c.name("mer") {
                if h > 12 {
                    hour = None;
                } else {
                    meridian_known = true;
                    is_pm = mer.as_str().starts_with('p');
                }
            }
        }
    }

    if hour.is_none() {
        if let Some(c) = RE_OCLOCK.captures(s) {
            let h: u32 = c["h"].parse().ok()?;
            if (1..=12).contains(&h) {
                hour = Some(h);
                minute = 0;
                meridian_known = false;
            }
        }
    }

    let mut hour = hour?;
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }

    if meridian_known && is_pm && hour < 12 {
        hour += 12;
    }

    if meridian_known || hour > 12 {
        Some(NormTime::Abs { hour, minute, second })
    } else {
        Some(NormTime::Rel { hour, minute, second })
    }
}

static RE_YMD: Lazy<Regex> = Lazy::new(|| {
    // yyyy/mm/dd with a 4-digit year; separators must agree
    Regex::new(r"^(\d{4})([-/])(\d{1,2})([-/])(\d{1,2})$").unwrap()
});
static RE_MDY: Lazy<Regex> = Lazy::new(|| {
    // mm/dd[/yy or /yyyy]; separators must agree
    Regex::new(r"^(\d{1,2})([-/])(\d{1,2})(?:([-/])(\d{2}|\d{4}))?$").unwrap()
});

/// Attempt to normalize a string into a date.
///
/// Recognizes, in priority order: already-normalized strings
/// (idempotent); weekday names; "today"/"tomorrow"/"yesterday" resolved
/// against `anchor`; `yyyy/mm/dd`; `mm/dd[/yy|/yyyy]`. Two-digit years
/// are taken as the occurrence within 50 years before / 49 years after
/// the anchor year. Month must be 1..12 and day 1..31 (day validity is
/// not cross-checked against the month's length here); a 4-digit year
/// outside 1901..2099 fails. Returns `None` on any failure.
pub fn normalize_date(s: &str, anchor: NaiveDate) -> Option<NormDate> {
    if let Ok(d) = s.parse::<NormDate>() {
        return Some(d);
    }

    if let Some(n) = weekday_num(s) {
        return Some(NormDate::Weekday(n));
    }

    match s {
        "today" => return Some(abs_from(anchor)),
        "tomorrow" => return Some(abs_from(anchor + Duration::days(1))),
        "yesterday" => return Some(abs_from(anchor - Duration::days(1))),
        _ => {}
    }

    let mut year: Option<i32> = None;
    let mut month: Option<u32> = None;
    let mut day = 0u32;

    if let Some(c) = RE_YMD.captures(s) {
        if c[2] == c[4] {
            year = c[1].parse().ok();
            month = c[3].parse().ok();
            day = c[5].parse().ok()?;
        }
    } else if let Some(c) = RE_MDY.captures(s) {
        let seps_agree = match c.get(4) {
            Some(sep2) => &c[2] == sep2.as_str(),
            None => true,
        };
        if seps_agree {
            month = c[1].parse().ok();
            day = c[3].parse().ok()?;
            if let Some(y) = c.get(5) {
                let mut y: i32 = y.as_str().parse().ok()?;
                if y < 100 {
                    // two-digit years land within [-50, +49] of the anchor
                    y += 2000;
                    if y > anchor.year() + 49 {
                        y -= 100;
                    }
                }
                year = Some(y);
            }
        }
    }

    let month = month?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    match year {
        None => Some(NormDate::MonthDay { month, day }),
        Some(y) if (YEAR_MIN..=YEAR_MAX).contains(&y) => {
            Some(NormDate::Abs { month, day, year: y })
        }
        Some(_) => None,
    }
}

/// An absolute `NormDate` for the given calendar date.
pub fn abs_from(d: NaiveDate) -> NormDate {
    NormDate::Abs { month: d.month(), day: d.day(), year: d.year() }
}
