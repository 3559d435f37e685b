//! Field resolution: from tagged tokens to concrete calendar values.
//!
//! Buckets the final token sequence by semantic role, promotes generic
//! date/time evidence into start/end slots, and applies the
//! disambiguation heuristics: AM/PM choice for relative times, forward
//! rollover for weekday and day-of-month references, and the
//! title-keyword default times.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::norm::{normalize_date, normalize_time, NormDate, NormTime};
use crate::parser::ParsedEvent;
use crate::token::{Any, SemanticRole, Token};

pub(crate) type Buckets = HashMap<SemanticRole, Vec<Token>>;

/// The resolved date/time value carried by a token, recovering it from
/// the normalized string when the typed value is missing.
pub(crate) fn token_date(tok: &Token, anchor: NaiveDate) -> Option<NormDate> {
    tok.date().or_else(|| normalize_date(&tok.normalized, anchor))
}

pub(crate) fn token_time(tok: &Token) -> Option<NormTime> {
    tok.time().or_else(|| normalize_time(&tok.normalized))
}

/// How to choose AM or PM for a relative time.
#[derive(Clone, Copy)]
pub(crate) enum TimeHint {
    /// No evidence at all: aim for noon.
    Default,
    /// Aim for the hour nearest the hint (used for start times).
    Near(NaiveTime),
    /// Read forward from the hint (used for end times, which follow
    /// their start).
    After(NaiveTime),
}

/// Turn a normalized date into a concrete date. `hint` is a minimum:
/// relative forms resolve to their next occurrence after it.
pub(crate) fn resolve_date(norm: &NormDate, hint: NaiveDate) -> Option<NaiveDate> {
    match *norm {
        NormDate::Abs { month, day, year } => NaiveDate::from_ymd_opt(year, month, day),
        NormDate::Weekday(n) => {
            // strictly in the future: same weekday means one week out
            let mut delta = n as i64 - hint.weekday().num_days_from_monday() as i64;
            if delta <= 0 {
                delta += 7;
            }
            Some(hint + Duration::days(delta))
        }
        NormDate::DayOfMonth(n) => date_from_day(n, hint),
        NormDate::MonthDay { month, day } => {
            let trial = NaiveDate::from_ymd_opt(hint.year(), month, day)?;
            if trial < hint {
                NaiveDate::from_ymd_opt(hint.year() + 1, month, day)
            } else {
                Some(trial)
            }
        }
    }
}

/// "Meet on the 3rd": the next such day after the anchor, rolling into
/// the next month (and year, from December) when needed.
fn date_from_day(day: u32, anchor: NaiveDate) -> Option<NaiveDate> {
    if anchor.day() < day {
        return NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), day);
    }
    if anchor.month() == 12 {
        NaiveDate::from_ymd_opt(anchor.year() + 1, 1, day)
    } else {
        NaiveDate::from_ymd_opt(anchor.year(), anchor.month() + 1, day)
    }
}

/// Turn a normalized time into a concrete time, deciding AM/PM for
/// relative times per the hint.
pub(crate) fn resolve_time(norm: &NormTime, hint: TimeHint) -> Option<NaiveTime> {
    match *norm {
        NormTime::Abs { hour, minute, second } => NaiveTime::from_hms_opt(hour, minute, second),
        NormTime::Rel { hour, minute, second } => {
            let am_hour = hour as i64;
            let pm_hour = if hour == 12 { 12 } else { hour as i64 + 12 };
            let hint_hour = match hint {
                TimeHint::Default => 12,
                TimeHint::Near(t) | TimeHint::After(t) => t.hour() as i64,
            };
            let chosen = match hint {
                TimeHint::Default | TimeHint::Near(_) => {
                    let am_dist = (am_hour - hint_hour).abs();
                    let pm_dist = (pm_hour - hint_hour).abs();
                    if pm_dist < am_dist {
                        pm_hour
                    } else {
                        am_hour
                    }
                }
                TimeHint::After(_) => {
                    // minimize the clockwise distance from the start
                    let am_fwd = (am_hour - hint_hour).rem_euclid(24);
                    let pm_fwd = (pm_hour - hint_hour).rem_euclid(24);
                    if pm_fwd < am_fwd {
                        pm_hour
                    } else {
                        am_hour
                    }
                }
            };
            NaiveTime::from_hms_opt(chosen as u32, minute, second)
        }
    }
}

/// Default start times implied by words in the title.
static TITLE_TIMES: &[(&str, (u32, u32))] = &[
    ("dinner", (18, 0)),
    ("pizza", (19, 0)),
    ("fondue", (18, 0)),
    ("lunch", (12, 0)),
    ("breakfast", (7, 30)),
    ("bfast", (7, 30)),
    ("coffee", (10, 0)),
    ("beer", (17, 0)),
    ("beers", (17, 0)),
    ("evening", (20, 0)),
    ("night", (22, 0)),
    ("morning", (6, 0)),
    ("afternoon", (15, 0)),
];

fn default_time_for_title(title: Option<&Vec<Token>>) -> Option<NaiveTime> {
    for tok in title? {
        for (word, (h, m)) in TITLE_TIMES {
            if tok.matches(*word, Any, Any) {
                return NaiveTime::from_hms_opt(*h, *m, 0);
            }
        }
    }
    None
}

static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r" ([,.!'])").unwrap());
static RE_LEADING_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[,.] ").unwrap());
static RE_TRAILING_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,.]$").unwrap());

/// Clean up the punctuation of a reconstructed title or location string:
/// no space ahead of comma/period/bang/apostrophe, no leading or
/// trailing comma/period, and tokenizer-style quotes folded back into
/// double quotes.
pub fn clean_punctuation(s: &str) -> String {
    let s = RE_SPACE_BEFORE_PUNCT.replace_all(s, "$1");
    let s = s.replace(" `` ", " \"");
    let s = s.replace("''", "\"");
    let s = RE_LEADING_PUNCT.replace(&s, "");
    RE_TRAILING_PUNCT.replace(&s, "").into_owned()
}

/// Join the original text of the tokens in a bucket, cleaned up.
fn joined_text(toks: Option<&Vec<Token>>) -> Option<String> {
    let toks = toks?;
    if toks.is_empty() {
        return None;
    }
    let joined = toks
        .iter()
        .map(|t| t.original.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Some(clean_punctuation(&joined))
}

/// When no explicit start/end exists, the first generic date/time seen
/// is the start and the next one, if present, is the end.
fn promote(buckets: &mut Buckets, from: SemanticRole, to: SemanticRole) {
    if buckets.contains_key(&to) {
        return;
    }
    let Some(generic) = buckets.get_mut(&from) else {
        return;
    };
    if generic.is_empty() {
        return;
    }
    let tok = generic.remove(0);
    buckets.insert(to, vec![tok]);
}

fn first_norm_date(buckets: &Buckets, role: SemanticRole, anchor: NaiveDate) -> Option<NormDate> {
    buckets.get(&role)?.first().and_then(|t| token_date(t, anchor))
}

fn first_norm_time(buckets: &Buckets, role: SemanticRole) -> Option<NormTime> {
    buckets.get(&role)?.first().and_then(token_time)
}

/// Compute the final six-field event from the bucketed tokens.
pub(crate) fn resolve(mut buckets: Buckets, anchor: NaiveDateTime) -> ParsedEvent {
    promote(&mut buckets, SemanticRole::Date, SemanticRole::StartDate);
    promote(&mut buckets, SemanticRole::Date, SemanticRole::EndDate);
    promote(&mut buckets, SemanticRole::Time, SemanticRole::StartTime);
    promote(&mut buckets, SemanticRole::Time, SemanticRole::EndTime);
    debug!("resolving buckets: {:?}", buckets);

    let title = joined_text(buckets.get(&SemanticRole::Title));
    let location = joined_text(buckets.get(&SemanticRole::Location));

    let anchor_date = anchor.date();
    let start_date = first_norm_date(&buckets, SemanticRole::StartDate, anchor_date)
        .and_then(|nd| resolve_date(&nd, anchor_date));
    let mut end_date = first_norm_date(&buckets, SemanticRole::EndDate, anchor_date)
        .and_then(|nd| resolve_date(&nd, start_date.unwrap_or(anchor_date)));

    let start_norm = first_norm_time(&buckets, SemanticRole::StartTime);
    let end_norm = first_norm_time(&buckets, SemanticRole::EndTime);

    let mut start_time = None;
    let mut end_time = None;
    match (start_norm, end_norm) {
        // A certain end and an uncertain start: resolve the end first
        // and let it disambiguate the start.
        (Some(st), Some(end)) if st.is_relative() && !end.is_relative() => {
            end_time = resolve_time(&end, TimeHint::Default);
            let hint = end_time.map(TimeHint::Near).unwrap_or(TimeHint::Default);
            start_time = resolve_time(&st, hint);
        }
        (Some(st), _) => {
            let hint = default_time_for_title(buckets.get(&SemanticRole::Title))
                .map(TimeHint::Near)
                .unwrap_or(TimeHint::Default);
            start_time = resolve_time(&st, hint);
        }
        _ => {}
    }
    if end_time.is_none() {
        if let Some(end) = end_norm {
            let hint = start_time.map(TimeHint::After).unwrap_or(TimeHint::Default);
            end_time = resolve_time(&end, hint);
        }
    }

    // An explicit duration supplies the end when nothing else did. The
    // core never invents an end time from nothing.
    if start_time.is_some() && end_time.is_none() {
        let minutes = buckets
            .get(&SemanticRole::Duration)
            .and_then(|v| v.first())
            .and_then(|t| t.normalized.parse::<i64>().ok());
        if let (Some(st), Some(minutes)) = (start_time, minutes) {
            let base = start_date.unwrap_or(anchor_date);
            let dt = NaiveDateTime::new(base, st) + Duration::minutes(minutes);
            if start_date.is_some() {
                end_date = Some(dt.date());
            }
            end_time = Some(dt.time());
        }
    }

    // A single date covers the whole event.
    if end_date.is_none() {
        end_date = start_date;
    }

    ParsedEvent {
        start_date,
        end_date,
        start_time,
        end_time,
        title,
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::PartOfSpeech as Pos;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn weekday_resolution_is_strictly_future() {
        // 2018-06-05 is a Tuesday
        let anchor = d(2018, 6, 5);
        for n in 0..7 {
            let got = resolve_date(&NormDate::Weekday(n), anchor).unwrap();
            assert!(got > anchor, "weekday {}", n);
            assert!(got - anchor <= Duration::days(7), "weekday {}", n);
            assert_eq!(got.weekday().num_days_from_monday(), n);
        }
        // asking for Tuesday on a Tuesday lands a full week out
        assert_eq!(resolve_date(&NormDate::Weekday(1), anchor), Some(d(2018, 6, 12)));
    }

    #[test]
    fn monthday_rolls_forward() {
        assert_eq!(
            resolve_date(&NormDate::DayOfMonth(21), d(2018, 6, 5)),
            Some(d(2018, 6, 21))
        );
        // already past this month: next month
        assert_eq!(
            resolve_date(&NormDate::DayOfMonth(3), d(2018, 6, 5)),
            Some(d(2018, 7, 3))
        );
        // December rolls into the next year
        assert_eq!(
            resolve_date(&NormDate::DayOfMonth(3), d(2018, 12, 15)),
            Some(d(2019, 1, 3))
        );
        // invalid day-of-month resolves to nothing rather than failing
        assert_eq!(resolve_date(&NormDate::DayOfMonth(99), d(2018, 6, 5)), None);
    }

    #[test]
    fn month_day_picks_this_year_or_next() {
        assert_eq!(
            resolve_date(&NormDate::MonthDay { month: 8, day: 9 }, d(2018, 6, 5)),
            Some(d(2018, 8, 9))
        );
        assert_eq!(
            resolve_date(&NormDate::MonthDay { month: 2, day: 1 }, d(2018, 6, 5)),
            Some(d(2019, 2, 1))
        );
    }

    #[test_case(5, 12, 17; "five near noon is 5pm")]
    #[test_case(10, 12, 10; "ten near noon is 10am")]
    #[test_case(11, 13, 11; "eleven near 1pm stays morning")]
    #[test_case(8, 7, 8; "eight near breakfast stays morning")]
    #[test_case(6, 12, 6; "equidistant six stays am")]
    fn near_hint_picks_closest_meridian(hour: u32, hint: u32, expect: u32) {
        let norm = NormTime::Rel { hour, minute: 0, second: 0 };
        let got = resolve_time(&norm, TimeHint::Near(t(hint, 0))).unwrap();
        assert_eq!(got.hour(), expect);
    }

    #[test_case(6, 17, 18; "six after 5pm is 6pm")]
    #[test_case(11, 15, 23; "eleven after 3pm is 11pm")]
    #[test_case(1, 23, 1; "one after 11pm wraps to 1am")]
    fn after_hint_reads_forward(hour: u32, hint: u32, expect: u32) {
        let norm = NormTime::Rel { hour, minute: 0, second: 0 };
        let got = resolve_time(&norm, TimeHint::After(t(hint, 0))).unwrap();
        assert_eq!(got.hour(), expect);
    }

    #[test]
    fn title_keywords_supply_the_default_hint() {
        let title = vec![Token::new("team", Pos::Nn), Token::new("dinner", Pos::Nn)];
        assert_eq!(default_time_for_title(Some(&title)), Some(t(18, 0)));
        let title = vec![Token::new("breakfast", Pos::Nn)];
        assert_eq!(default_time_for_title(Some(&title)), Some(t(7, 30)));
        let title = vec![Token::new("sync", Pos::Nn)];
        assert_eq!(default_time_for_title(Some(&title)), None);
        assert_eq!(default_time_for_title(None), None);
    }

    #[test]
    fn punctuation_cleanup() {
        assert_eq!(clean_punctuation(", committee meeting"), "committee meeting");
        assert_eq!(clean_punctuation("559 Madison Ave ."), "559 Madison Ave");
        assert_eq!(clean_punctuation("Sam 's birthday"), "Sam's birthday");
        assert_eq!(clean_punctuation("party ,"), "party");
    }

    #[test]
    fn duration_supplies_the_end() {
        let mut buckets: Buckets = HashMap::new();
        buckets.insert(
            SemanticRole::StartDate,
            vec![Token::from_date(
                NormDate::Abs { month: 6, day: 20, year: 2018 },
                SemanticRole::StartDate,
            )],
        );
        buckets.insert(
            SemanticRole::StartTime,
            vec![Token::from_time(
                NormTime::Abs { hour: 23, minute: 30, second: 0 },
                SemanticRole::StartTime,
            )],
        );
        let mut dur = Token::new("90", Pos::Cd);
        dur.assign_duration(90);
        buckets.insert(SemanticRole::Duration, vec![dur]);

        let anchor = d(2018, 6, 5).and_hms_opt(10, 0, 0).unwrap();
        let ev = resolve(buckets, anchor);
        assert_eq!(ev.start_time, Some(t(23, 30)));
        assert_eq!(ev.end_time, Some(t(1, 0)));
        // the duration crossed midnight
        assert_eq!(ev.start_date, Some(d(2018, 6, 20)));
        assert_eq!(ev.end_date, Some(d(2018, 6, 21)));
    }
}
