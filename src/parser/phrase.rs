//! Phrase pass over the token sequence.
//!
//! Second of the two pattern passes. Recognizes the larger syntactic
//! shapes: "from X to Y" ranges, "on (date)", relative offsets like
//! "in two weeks" and "a month after 6/20", durations, location noun
//! phrases after "at"/"in", and "at (time)". Each rule is independent;
//! at every position the rules are tried in priority order and only the
//! first match fires. The scan then advances one token, so rules may
//! re-examine normalized output of earlier matches — the normalizers are
//! idempotent, which makes that harmless.

use chrono::{Duration, Months, NaiveDate, NaiveDateTime, Timelike};

use crate::parser::norm::{abs_from, normalize_date, normalize_time, NormDate, NormTime};
use crate::parser::resolve::{resolve_date, token_date};
use crate::token::{Any, PartOfSpeech, SemanticRole, Token, TokenWindow};

static DAY_TXT: &[&str] = &["day", "days", "d"];
static WEEK_TXT: &[&str] = &["week", "weeks", "wk"];
static MONTH_TXT: &[&str] = &["month", "months", "mon"];
static MINUTE_TXT: &[&str] = &["min", "mins", "minute", "minutes"];
static HOUR_TXT: &[&str] = &["hr", "hrs", "hour", "hours", "h"];

static UNTIL_WORDS: &[&str] = &["to", "-", ":", "until", "til", "till", "thru", "through"];

static TIME_OR_CD: &[PartOfSpeech] = &[PartOfSpeech::Time, PartOfSpeech::Cd];
static DATE_OR_NUM: &[PartOfSpeech] = &[PartOfSpeech::Date, PartOfSpeech::Cd, PartOfSpeech::Od];
static CD_OR_OD: &[PartOfSpeech] = &[PartOfSpeech::Cd, PartOfSpeech::Od];
static DT_OR_CD: &[PartOfSpeech] = &[PartOfSpeech::Dt, PartOfSpeech::Cd];

static NA_POS: &[PartOfSpeech] = &[
    PartOfSpeech::Nn,
    PartOfSpeech::Nns,
    PartOfSpeech::Nnp,
    PartOfSpeech::Nnps,
    PartOfSpeech::Jj,
    PartOfSpeech::Jjr,
    PartOfSpeech::Jjs,
];
static LOC_POS: &[PartOfSpeech] = &[
    PartOfSpeech::Nn,
    PartOfSpeech::Nns,
    PartOfSpeech::Nnp,
    PartOfSpeech::Nnps,
    PartOfSpeech::Jj,
    PartOfSpeech::Jjr,
    PartOfSpeech::Jjs,
    PartOfSpeech::Comma,
    PartOfSpeech::Cd,
    PartOfSpeech::Od,
];
static LOC_LEAD_POS: &[PartOfSpeech] =
    &[PartOfSpeech::Dt, PartOfSpeech::Prp, PartOfSpeech::PrpS];

/// Run the phrase pass, rewriting tokens in place.
pub fn phrase_pass(tokens: &mut [Token], anchor: NaiveDateTime) {
    for i in 0..tokens.len() {
        phrase_at(tokens, i, anchor);
    }
}

fn phrase_at(tokens: &mut [Token], i: usize, anchor: NaiveDateTime) {
    if rule_time_range(tokens, i) {
        return;
    }
    if rule_date_range(tokens, i, anchor.date()) {
        return;
    }
    if rule_on_date(tokens, i, anchor.date()) {
        return;
    }
    if rule_offset_date(tokens, i, anchor.date()) {
        return;
    }
    if rule_offset_after_date(tokens, i, anchor.date()) {
        return;
    }
    if rule_in_minutes(tokens, i, anchor) {
        return;
    }
    if rule_duration(tokens, i) {
        return;
    }
    if rule_location(tokens, i) {
        return;
    }
    if rule_at_hour_minute(tokens, i) {
        return;
    }
    rule_at_time(tokens, i);
}

/// True for any form of "until" or "to" joining two range endpoints.
fn until_at(w: &TokenWindow, i: usize) -> bool {
    w.matches(i, UNTIL_WORDS, Any, Any)
}

/// `[from] (time|number) (until) (time|number)`
fn rule_time_range(toks: &mut [Token], i: usize) -> bool {
    let w = TokenWindow::new(&toks[i..]);
    let m = if w.matches(0, "from", PartOfSpeech::In, Any) { 1 } else { 0 };
    if !(w.matches(m, Any, TIME_OR_CD, Any)
        && until_at(&w, m + 1)
        && w.matches(m + 2, Any, TIME_OR_CD, Any))
    {
        return false;
    }
    let st = w.norm(m).and_then(normalize_time);
    let end = w.norm(m + 2).and_then(normalize_time);
    let (Some(st), Some(end)) = (st, end) else {
        return false;
    };
    if m == 1 {
        toks[i].sem = SemanticRole::Ignore;
    }
    toks[i + m].assign_time(st, SemanticRole::StartTime);
    toks[i + m + 1].sem = SemanticRole::Ignore;
    toks[i + m + 2].assign_time(end, SemanticRole::EndTime);
    true
}

/// `[from] (date) (until) (date|number)` — a bare number as the second
/// endpoint reads as a day of the month ("from August 9th - 18").
fn rule_date_range(toks: &mut [Token], i: usize, anchor: NaiveDate) -> bool {
    let w = TokenWindow::new(&toks[i..]);
    let m = if w.matches(0, "from", PartOfSpeech::In, Any) { 1 } else { 0 };
    if !(w.matches(m, Any, PartOfSpeech::Date, Any)
        && until_at(&w, m + 1)
        && w.matches(m + 2, Any, DATE_OR_NUM, Any))
    {
        return false;
    }
    let st = w.norm(m).and_then(|s| normalize_date(s, anchor));
    let end = if w.matches(m + 2, Any, CD_OR_OD, Any) {
        w.norm(m + 2)
            .and_then(|s| s.parse().ok())
            .map(NormDate::DayOfMonth)
    } else {
        w.norm(m + 2).and_then(|s| normalize_date(s, anchor))
    };
    let (Some(st), Some(end)) = (st, end) else {
        return false;
    };
    if m == 1 {
        toks[i].sem = SemanticRole::Ignore;
    }
    toks[i + m].assign_date(st, SemanticRole::StartDate);
    toks[i + m + 1].sem = SemanticRole::Ignore;
    toks[i + m + 2].assign_date(end, SemanticRole::EndDate);
    true
}

/// `on (date)`
fn rule_on_date(toks: &mut [Token], i: usize, anchor: NaiveDate) -> bool {
    let w = TokenWindow::new(&toks[i..]);
    if !(w.matches(0, "on", PartOfSpeech::In, Any) && w.matches(1, Any, PartOfSpeech::Date, Any)) {
        return false;
    }
    let Some(st) = w.norm(1).and_then(|s| normalize_date(s, anchor)) else {
        return false;
    };
    toks[i].sem = SemanticRole::Ignore;
    toks[i + 1].assign_date(st, SemanticRole::StartDate);
    true
}

fn offset_from(anchor: NaiveDate, num: i64, unit: &Token) -> Option<NaiveDate> {
    if unit.matches(WEEK_TXT, Any, Any) {
        return anchor.checked_add_signed(Duration::weeks(num));
    }
    if unit.matches(MONTH_TXT, Any, Any) {
        // calendar months, not a fixed day count
        return anchor.checked_add_months(Months::new(u32::try_from(num).ok()?));
    }
    anchor.checked_add_signed(Duration::days(num))
}

/// `[in] (a|number) (week|month|day) [from (date)]` — an absolute date
/// offset from today, or from the referenced date.
fn rule_offset_date(toks: &mut [Token], i: usize, anchor: NaiveDate) -> bool {
    let w = TokenWindow::new(&toks[i..]);
    let m = if w.matches(0, "in", PartOfSpeech::In, Any) { 1 } else { 0 };
    let unit_ok = w.matches(m + 1, WEEK_TXT, Any, Any)
        || w.matches(m + 1, MONTH_TXT, Any, Any)
        || w.matches(m + 1, DAY_TXT, Any, Any);
    if !((w.matches(m, "a", PartOfSpeech::Dt, Any) || w.matches(m, Any, PartOfSpeech::Cd, Any))
        && unit_ok)
    {
        return false;
    }
    let num: i64 = if w.matches(m, Any, PartOfSpeech::Dt, Any) {
        1
    } else {
        match w.norm(m).and_then(|s| s.parse().ok()) {
            Some(n) => n,
            None => return false,
        }
    };

    let (offset_anchor, end_tok) = if w.matches(m + 2, "from", PartOfSpeech::In, Any)
        && w.matches(m + 3, Any, PartOfSpeech::Date, Any)
    {
        let referenced = w
            .get(m + 3)
            .and_then(|t| token_date(t, anchor))
            .and_then(|nd| resolve_date(&nd, anchor));
        match referenced {
            Some(d) => (d, m + 3),
            None => return false,
        }
    } else {
        (anchor, m + 1)
    };

    let Some(unit) = w.get(m + 1) else { return false };
    let Some(dt) = offset_from(offset_anchor, num, unit) else {
        return false;
    };
    for k in 0..=end_tok {
        toks[i + k].sem = SemanticRole::Ignore;
    }
    toks[i + m].assign_date(abs_from(dt), SemanticRole::Date);
    true
}

/// `(a|number) (week|month|day) after (date)` — the symmetric form.
fn rule_offset_after_date(toks: &mut [Token], i: usize, anchor: NaiveDate) -> bool {
    let w = TokenWindow::new(&toks[i..]);
    let unit_ok = w.matches(1, WEEK_TXT, Any, Any)
        || w.matches(1, MONTH_TXT, Any, Any)
        || w.matches(1, DAY_TXT, Any, Any);
    if !(w.matches(0, Any, DT_OR_CD, Any)
        && unit_ok
        && w.matches(2, "after", PartOfSpeech::In, Any)
        && w.matches(3, Any, PartOfSpeech::Date, Any))
    {
        return false;
    }
    let num: i64 = if w.matches(0, Any, PartOfSpeech::Dt, Any) {
        1
    } else {
        match w.norm(0).and_then(|s| s.parse().ok()) {
            Some(n) => n,
            None => return false,
        }
    };
    let referenced = w
        .get(3)
        .and_then(|t| token_date(t, anchor))
        .and_then(|nd| resolve_date(&nd, anchor));
    let Some(referenced) = referenced else {
        return false;
    };
    let Some(unit) = w.get(1) else { return false };
    let Some(dt) = offset_from(referenced, num, unit) else {
        return false;
    };
    for k in 0..=3 {
        toks[i + k].sem = SemanticRole::Ignore;
    }
    toks[i + 1].assign_date(abs_from(dt), SemanticRole::Date);
    true
}

/// `in (number) (minutes|hours)` — both a date and a time, anchored to
/// the current moment.
fn rule_in_minutes(toks: &mut [Token], i: usize, anchor: NaiveDateTime) -> bool {
    let w = TokenWindow::new(&toks[i..]);
    if !(w.matches(0, "in", PartOfSpeech::In, Any)
        && w.matches(1, Any, PartOfSpeech::Cd, Any)
        && (w.matches(2, MINUTE_TXT, Any, Any) || w.matches(2, HOUR_TXT, Any, Any)))
    {
        return false;
    }
    let Some(mut val) = w.norm(1).and_then(|s| s.parse::<f64>().ok()) else {
        return false;
    };
    if w.matches(2, HOUR_TXT, Any, Any) {
        val *= 60.0;
    }
    let dt = anchor + Duration::minutes(val as i64);
    toks[i].assign_date(abs_from(dt.date()), SemanticRole::StartDate);
    toks[i + 1].assign_time(
        NormTime::Abs { hour: dt.hour(), minute: dt.minute(), second: 0 },
        SemanticRole::StartTime,
    );
    toks[i + 2].sem = SemanticRole::Ignore;
    true
}

/// `for (number) (minutes|hours)` — an event duration in minutes.
fn rule_duration(toks: &mut [Token], i: usize) -> bool {
    let w = TokenWindow::new(&toks[i..]);
    if !(w.matches(0, "for", PartOfSpeech::In, Any)
        && w.matches(1, Any, PartOfSpeech::Cd, Any)
        && (w.matches(2, MINUTE_TXT, Any, Any) || w.matches(2, HOUR_TXT, Any, Any)))
    {
        return false;
    }
    let Some(mut val) = w.norm(1).and_then(|s| s.parse::<f64>().ok()) else {
        return false;
    };
    if w.matches(2, HOUR_TXT, Any, Any) {
        val *= 60.0;
    }
    toks[i].sem = SemanticRole::Ignore;
    toks[i + 1].assign_duration(val as i64);
    toks[i + 2].sem = SemanticRole::Ignore;
    true
}

/// `(at|in) (location noun phrase)`
///
/// A location phrase optionally starts with a determiner or pronoun and
/// is a consecutive run of nouns, adjectives, cardinals, ordinals, and
/// commas — but it must contain at least one noun or adjective, or the
/// rule does not trigger. A trailing comma is dropped from the phrase.
fn rule_location(toks: &mut [Token], i: usize) -> bool {
    let w = TokenWindow::new(&toks[i..]);
    let at_or_in: &[&str] = &["at", "in"];
    if !w.matches(0, at_or_in, PartOfSpeech::In, Any) {
        return false;
    }
    let mut n = 1;
    if w.matches(1, Any, LOC_LEAD_POS, SemanticRole::Unknown) {
        n = 2;
    }
    if !w.matches(n, Any, LOC_POS, SemanticRole::Unknown) {
        return false;
    }
    while w.matches(n, Any, LOC_POS, SemanticRole::Unknown) {
        n += 1;
    }
    // n is one past the end of the phrase
    let na_count = (1..n).filter(|&k| w.matches(k, Any, NA_POS, Any)).count();
    if na_count == 0 {
        return false;
    }
    let trailing_comma = w.matches(n - 1, Any, PartOfSpeech::Comma, Any);
    toks[i].sem = SemanticRole::Ignore;
    for k in 1..n {
        toks[i + k].sem = SemanticRole::Location;
    }
    if trailing_comma {
        toks[i + n - 1].sem = SemanticRole::Ignore;
    }
    true
}

/// `at (number) (number)` read as "H MM" clock time ("at seven thirty").
fn rule_at_hour_minute(toks: &mut [Token], i: usize) -> bool {
    let w = TokenWindow::new(&toks[i..]);
    if !(w.matches(0, "at", PartOfSpeech::In, Any)
        && w.matches(1, Any, PartOfSpeech::Cd, Any)
        && w.matches(2, Any, PartOfSpeech::Cd, Any))
    {
        return false;
    }
    let combined = match (w.norm(1), w.norm(2)) {
        (Some(h), Some(m)) => format!("{}:{}", h, m),
        _ => return false,
    };
    let Some(st) = normalize_time(&combined) else {
        return false;
    };
    toks[i].sem = SemanticRole::Ignore;
    toks[i + 1].assign_time(st, SemanticRole::StartTime);
    toks[i + 2].sem = SemanticRole::Ignore;
    true
}

/// `at (time|number)`
fn rule_at_time(toks: &mut [Token], i: usize) -> bool {
    let w = TokenWindow::new(&toks[i..]);
    if !(w.matches(0, "at", PartOfSpeech::In, Any) && w.matches(1, Any, TIME_OR_CD, Any)) {
        return false;
    }
    let Some(st) = w.norm(1).and_then(normalize_time) else {
        return false;
    };
    toks[i].sem = SemanticRole::Ignore;
    toks[i + 1].assign_time(st, SemanticRole::StartTime);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::PartOfSpeech as Pos;
    use pretty_assertions::assert_eq;

    fn anchor() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 6, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn toks(words: &[(&str, Pos)]) -> Vec<Token> {
        words.iter().map(|(word, pos)| Token::new(word, *pos)).collect()
    }

    #[test]
    fn from_until_tags_both_endpoints() {
        let mut t = toks(&[
            ("from", Pos::In),
            ("5", Pos::Cd),
            ("-", Pos::Colon),
            ("6", Pos::Cd),
        ]);
        phrase_pass(&mut t, anchor());
        assert_eq!(t[0].sem, SemanticRole::Ignore);
        assert_eq!(t[1].sem, SemanticRole::StartTime);
        assert_eq!(t[1].normalized, "reltime:05:00:00");
        assert_eq!(t[2].sem, SemanticRole::Ignore);
        assert_eq!(t[3].sem, SemanticRole::EndTime);
        assert_eq!(t[3].normalized, "reltime:06:00:00");
    }

    #[test]
    fn until_words_are_interchangeable() {
        for until in ["to", "until", "til", "till", "thru", "through"] {
            let mut t = toks(&[("5", Pos::Cd), (until, Pos::In), ("7", Pos::Cd)]);
            phrase_pass(&mut t, anchor());
            assert_eq!(t[0].sem, SemanticRole::StartTime, "until word {}", until);
            assert_eq!(t[2].sem, SemanticRole::EndTime, "until word {}", until);
        }
    }

    #[test]
    fn at_location_runs_over_nouns() {
        let mut t = toks(&[
            ("at", Pos::In),
            ("JFK", Pos::Nnp),
            ("High", Pos::Nnp),
            ("School", Pos::Nnp),
        ]);
        phrase_pass(&mut t, anchor());
        assert_eq!(t[0].sem, SemanticRole::Ignore);
        for tok in &t[1..] {
            assert_eq!(tok.sem, SemanticRole::Location);
        }
    }

    #[test]
    fn location_needs_a_noun_or_adjective() {
        // "at 7 30" has only cardinals: not a location, read as a time
        let mut t = toks(&[("at", Pos::In), ("7", Pos::Cd), ("30", Pos::Cd)]);
        phrase_pass(&mut t, anchor());
        assert_eq!(t[1].sem, SemanticRole::StartTime);
        assert_eq!(t[1].normalized, "reltime:07:30:00");
        assert_eq!(t[2].sem, SemanticRole::Ignore);
    }

    #[test]
    fn location_drops_trailing_comma() {
        let mut t = toks(&[
            ("at", Pos::In),
            ("Cinemark", Pos::Nnp),
            (",", Pos::Comma),
            ("6/20", Pos::Cd),
        ]);
        // keep the date token out of the phrase
        t[3].assign_date(NormDate::MonthDay { month: 6, day: 20 }, SemanticRole::Date);
        phrase_pass(&mut t, anchor());
        assert_eq!(t[1].sem, SemanticRole::Location);
        assert_eq!(t[2].sem, SemanticRole::Ignore);
    }

    #[test]
    fn location_lead_determiner_is_included() {
        let mut t = toks(&[("at", Pos::In), ("your", Pos::PrpS), ("house", Pos::Nn)]);
        phrase_pass(&mut t, anchor());
        assert_eq!(t[1].sem, SemanticRole::Location);
        assert_eq!(t[2].sem, SemanticRole::Location);
    }

    #[test]
    fn on_date_marks_the_start() {
        let mut t = toks(&[("on", Pos::In), ("x", Pos::Nn)]);
        t[1].assign_date(NormDate::Weekday(3), SemanticRole::Date);
        phrase_pass(&mut t, anchor());
        assert_eq!(t[0].sem, SemanticRole::Ignore);
        assert_eq!(t[1].sem, SemanticRole::StartDate);
    }

    #[test]
    fn in_two_weeks_is_an_absolute_date() {
        let mut t = toks(&[("in", Pos::In), ("2", Pos::Cd), ("weeks", Pos::Nns)]);
        phrase_pass(&mut t, anchor());
        assert_eq!(t[0].sem, SemanticRole::Ignore);
        assert_eq!(t[1].sem, SemanticRole::Date);
        assert_eq!(t[1].normalized, "absdate:06/19/2018");
        assert_eq!(t[2].sem, SemanticRole::Ignore);
    }

    #[test]
    fn a_month_from_a_date_adds_calendar_months() {
        let mut t = toks(&[
            ("in", Pos::In),
            ("a", Pos::Dt),
            ("month", Pos::Nn),
            ("from", Pos::In),
            ("d", Pos::Nn),
        ]);
        t[4].assign_date(
            NormDate::Abs { month: 1, day: 31, year: 2019 },
            SemanticRole::Date,
        );
        phrase_pass(&mut t, anchor());
        assert_eq!(t[1].sem, SemanticRole::Date);
        // Jan 31 + 1 month clamps to Feb 28
        assert_eq!(t[1].normalized, "absdate:02/28/2019");
        assert_eq!(t[4].sem, SemanticRole::Ignore);
    }

    #[test]
    fn the_week_after_a_date() {
        let mut t = toks(&[
            ("the", Pos::Dt),
            ("week", Pos::Nn),
            ("after", Pos::In),
            ("d", Pos::Nn),
        ]);
        t[3].assign_date(
            NormDate::Abs { month: 6, day: 20, year: 2018 },
            SemanticRole::Date,
        );
        phrase_pass(&mut t, anchor());
        assert_eq!(t[1].sem, SemanticRole::Date);
        assert_eq!(t[1].normalized, "absdate:06/27/2018");
    }

    #[test]
    fn a_bare_count_of_days_offsets_from_today() {
        // "2 days" reads as an offset from the anchor even when more
        // context follows; the plain-count rule has priority
        let mut t = toks(&[("2", Pos::Cd), ("days", Pos::Nns)]);
        phrase_pass(&mut t, anchor());
        assert_eq!(t[0].sem, SemanticRole::Date);
        assert_eq!(t[0].normalized, "absdate:06/07/2018");
    }

    #[test]
    fn in_ninety_minutes_sets_date_and_time() {
        let mut t = toks(&[("in", Pos::In), ("90", Pos::Cd), ("minutes", Pos::Nns)]);
        phrase_pass(&mut t, anchor());
        assert_eq!(t[0].sem, SemanticRole::StartDate);
        assert_eq!(t[0].normalized, "absdate:06/05/2018");
        assert_eq!(t[1].sem, SemanticRole::StartTime);
        assert_eq!(t[1].normalized, "abstime:11:30:00");
    }

    #[test]
    fn for_two_hours_is_a_duration() {
        let mut t = toks(&[("for", Pos::In), ("2", Pos::Cd), ("hours", Pos::Nns)]);
        phrase_pass(&mut t, anchor());
        assert_eq!(t[1].sem, SemanticRole::Duration);
        assert_eq!(t[1].normalized, "120");
    }

    #[test]
    fn at_time_tags_the_start() {
        let mut t = toks(&[("at", Pos::In), ("10", Pos::Cd)]);
        phrase_pass(&mut t, anchor());
        assert_eq!(t[0].sem, SemanticRole::Ignore);
        assert_eq!(t[1].sem, SemanticRole::StartTime);
        assert_eq!(t[1].normalized, "reltime:10:00:00");
    }
}
