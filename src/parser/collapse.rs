//! Collapse/expand pass over the token sequence.
//!
//! First of the two pattern passes. Scans left to right; at each position
//! the rules below are tried in priority order against a window of
//! upcoming tokens, and the first rule whose preconditions hold consumes a
//! contiguous span and emits its replacement tokens. A position with no
//! match passes its head token through unchanged.
//!
//! The rules merge multi-token times and dates into single resolved
//! tokens ("next Tuesday", "8 in the evening", "May 5th, 2020"), split
//! hyphenated ranges ("11-1:30pm") into start/until/end triples, and fold
//! possessive markers back into the preceding proper noun.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::norm::{
    month_num, normalize_date, normalize_time, NormDate, MONTH_WORDS, TIME_CERTAIN_PAT,
    TIME_POSSIBLE_PAT, WEEKDAY_WORDS,
};
use crate::token::{Any, PartOfSpeech, SemanticRole, Token, TokenWindow};

/// Meridian markers as they appear in token text.
pub static MERIDIAN_TXT: &[&str] = &["a", "am", "a.m.", "a.m", "p", "pm", "p.m.", "p.m"];

static MERIDIAN_OR_OCLOCK: &[&str] = &[
    "a", "am", "a.m.", "a.m", "p", "pm", "p.m.", "p.m", "o'clock", "oclock",
];

static RE_RANGE_CERT_POSS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "^(?P<first>{})-(?P<second>{})$",
        &*TIME_CERTAIN_PAT, &*TIME_POSSIBLE_PAT
    ))
    .unwrap()
});
static RE_RANGE_POSS_CERT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "^(?P<first>{})-(?P<second>{})$",
        &*TIME_POSSIBLE_PAT, &*TIME_CERTAIN_PAT
    ))
    .unwrap()
});
static RE_RANGE_MIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<first>\d{2}\d{2})-(?P<second>\d{2}\d{2})$").unwrap());
static RE_RANGE_POSS_POSS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "^(?P<first>{})-(?P<second>{})$",
        &*TIME_POSSIBLE_PAT, &*TIME_POSSIBLE_PAT
    ))
    .unwrap()
});
static RE_TIME_CERTAIN_FULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^(?:{})$", &*TIME_CERTAIN_PAT)).unwrap());
static RE_TIME_POSSIBLE_FULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^(?:{})$", &*TIME_POSSIBLE_PAT)).unwrap());

// mm/dd with an optional 2- or 4-digit year
const DATESPEC: &str = r"\d{1,2}/\d{1,2}(?:/(?:\d{2}|\d{4}))?";
// yyyy/mm/dd
const DATESPEC_YFIRST: &str = r"\d{4}/\d{1,2}/\d{1,2}";

static RE_DATE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^({})-({})$", DATESPEC, DATESPEC)).unwrap());
static RE_DATE_RANGE_YFIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^({})-({})$", DATESPEC_YFIRST, DATESPEC_YFIRST)).unwrap()
});
static RE_DATE_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^(?:(?:{})|(?:{}))$", DATESPEC, DATESPEC_YFIRST)).unwrap());
// Dates written with hyphens are ambiguous with ranges, so only these
// full triples are accepted: dd-mm-yyyy, dd-mm-yy, yyyy-dd-mm.
static RE_DATE_HYPHEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{1,2}|\d{4})-\d{1,2}-(?:\d{2}|\d{4})$").unwrap());

static RE_YEAR4: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

const YEAR_MIN: i32 = 1901;
const YEAR_MAX: i32 = 2099;

static DAY_POS: &[PartOfSpeech] = &[PartOfSpeech::Cd, PartOfSpeech::Od];

/// Run the collapse/expand pass, producing a fresh token sequence.
pub fn collapse_pass(input: Vec<Token>, anchor: NaiveDate) -> Vec<Token> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        match collapse_at(&TokenWindow::new(&input[i..]), anchor) {
            Some((mut produced, consumed)) => {
                out.append(&mut produced);
                i += consumed;
            }
            None => {
                out.push(input[i].clone());
                i += 1;
            }
        }
    }
    out
}

/// Try each collapse rule at the head of the window. Returns the emitted
/// tokens and the number of input tokens consumed, or `None` if no rule
/// applies.
fn collapse_at(w: &TokenWindow, anchor: NaiveDate) -> Option<(Vec<Token>, usize)> {
    merge_possessive(w)
        .or_else(|| merge_time_of_day(w))
        .or_else(|| merge_next_weekday(w, anchor))
        .or_else(|| time_date_range(w, anchor))
        .or_else(|| spelled_month_day(w))
        .or_else(|| spelled_day_month(w))
        .or_else(|| the_ordinal(w))
}

/// "Sam" + "'s" becomes the single token "Sam's".
fn merge_possessive(w: &TokenWindow) -> Option<(Vec<Token>, usize)> {
    if !(w.matches(0, Any, PartOfSpeech::Nnp, Any) && w.matches(1, Any, PartOfSpeech::Pos, Any)) {
        return None;
    }
    let mut merged = w.get(0)?.clone();
    let marker = w.get(1)?;
    merged.original.push_str(&marker.original);
    merged.normalized.push_str(&marker.normalized);
    Some((vec![merged], 2))
}

/// "8 in the evening" / "8 at night" becomes a single time token with the
/// implied meridian appended.
fn merge_time_of_day(w: &TokenWindow) -> Option<(Vec<Token>, usize)> {
    if !w.matches(0, Any, PartOfSpeech::Cd, Any) {
        return None;
    }
    let daypart: &[&str] = &["morning", "afternoon", "evening"];
    let (suffix, consumed) = if w.matches(1, "in", PartOfSpeech::In, Any)
        && w.matches(2, "the", PartOfSpeech::Dt, Any)
        && w.matches(3, daypart, Any, Any)
    {
        let suffix = if w.matches(3, "morning", Any, Any) { "am" } else { "pm" };
        (suffix, 4)
    } else if w.matches(1, "at", PartOfSpeech::In, Any) && w.matches(2, "night", Any, Any) {
        ("pm", 3)
    } else {
        return None;
    };

    let mut tok = w.get(0)?.clone();
    let combined = format!("{}{}", tok.normalized, suffix);
    match normalize_time(&combined) {
        Some(norm) => tok.assign_time(norm, SemanticRole::Time),
        None => {
            // leave the raw concatenation; the resolver will skip it
            tok.normalized = combined;
            tok.pos = PartOfSpeech::Time;
            tok.sem = SemanticRole::Time;
        }
    }
    Some((vec![tok], consumed))
}

/// "next Tuesday" becomes a single resolved date token.
fn merge_next_weekday(w: &TokenWindow, anchor: NaiveDate) -> Option<(Vec<Token>, usize)> {
    if !(w.matches(0, "next", PartOfSpeech::Jj, Any) && w.matches(1, WEEKDAY_WORDS, Any, Any)) {
        return None;
    }
    let norm = normalize_date(w.norm(1)?, anchor)?;
    Some((vec![Token::from_date(norm, SemanticRole::Date)], 2))
}

fn until_marker() -> Token {
    let mut t = Token::new("until", PartOfSpeech::Colon);
    t.sem = SemanticRole::Ignore;
    t
}

/// The time/date-range recognizer.
///
/// Handles a single token of the form (time)-(time) or (date)-(date),
/// emitting a start/until/end triple; a single token that is
/// unambiguously a time or date by itself; and a bare possible-time
/// followed by a meridian or "o'clock" lookahead token, which is consumed
/// and folded in. Both halves of a range must normalize or the rule does
/// not fire.
fn time_date_range(w: &TokenWindow, anchor: NaiveDate) -> Option<(Vec<Token>, usize)> {
    let tok = w.get(0)?;
    let val = tok.normalized.as_str();
    let lookahead_meridian = w.matches(1, MERIDIAN_TXT, Any, Any);

    // time ranges; a trailing meridian lookahead applies to the second half
    let mut append_second = "";
    let mut consumed = 1;
    let mut caps = RE_RANGE_CERT_POSS
        .captures(val)
        .or_else(|| RE_RANGE_POSS_CERT.captures(val));
    if caps.is_some() && lookahead_meridian {
        append_second = w.norm(1)?;
        consumed = 2;
    }
    if caps.is_none() {
        caps = RE_RANGE_MIL.captures(val);
    }
    if caps.is_none() && lookahead_meridian {
        caps = RE_RANGE_POSS_POSS.captures(val);
        if caps.is_some() {
            append_second = w.norm(1)?;
            consumed = 2;
        }
    }
    if let Some(c) = caps {
        let st = normalize_time(c.name("first")?.as_str());
        let end = normalize_time(&format!("{}{}", c.name("second")?.as_str(), append_second));
        if let (Some(st), Some(end)) = (st, end) {
            return Some((
                vec![
                    Token::from_time(st, SemanticRole::StartTime),
                    until_marker(),
                    Token::from_time(end, SemanticRole::EndTime),
                ],
                consumed,
            ));
        }
    }

    // standalone time completed by a meridian or "o'clock" lookahead
    if w.matches(1, MERIDIAN_OR_OCLOCK, Any, Any) && RE_TIME_POSSIBLE_FULL.is_match(val) {
        if let Some(norm) = normalize_time(&format!("{}{}", val, w.norm(1)?)) {
            return Some((vec![Token::from_time(norm, SemanticRole::Time)], 2));
        }
    }

    // standalone unambiguous time
    if RE_TIME_CERTAIN_FULL.is_match(val) {
        if let Some(norm) = normalize_time(val) {
            return Some((vec![Token::from_time(norm, SemanticRole::Time)], 1));
        }
    }

    // date ranges
    for re in [&RE_DATE_RANGE, &RE_DATE_RANGE_YFIRST] {
        if let Some(c) = re.captures(val) {
            let st = normalize_date(&c[1], anchor);
            let end = normalize_date(&c[2], anchor);
            if let (Some(st), Some(end)) = (st, end) {
                return Some((
                    vec![
                        Token::from_date(st, SemanticRole::StartDate),
                        until_marker(),
                        Token::from_date(end, SemanticRole::EndDate),
                    ],
                    1,
                ));
            }
        }
    }

    // single date in slash form
    if RE_DATE_SINGLE.is_match(val) {
        if let Some(norm) = normalize_date(val, anchor) {
            return Some((vec![Token::from_date(norm, SemanticRole::Date)], 1));
        }
    }

    // conservative hyphen-separated date triples
    if RE_DATE_HYPHEN.is_match(val) {
        if let Some(norm) = normalize_date(val, anchor) {
            return Some((vec![Token::from_date(norm, SemanticRole::Date)], 1));
        }
    }

    // spelled weekdays and relative day words
    let day_words: &[&str] = &["today", "tomorrow", "yesterday"];
    if tok.matches(WEEKDAY_WORDS, Any, Any) || tok.matches(day_words, Any, Any) {
        if let Some(norm) = normalize_date(val, anchor) {
            return Some((vec![Token::from_date(norm, SemanticRole::Date)], 1));
        }
    }

    None
}

/// Combine a month number, a day token, and an optional year token into a
/// normalized date. An invalid year makes the whole combination fail so
/// the caller can retry without it.
fn spelled_date(month: u32, day_txt: &str, year_txt: Option<&str>) -> Option<NormDate> {
    let day: u32 = day_txt.parse().ok()?;
    if !(1..=31).contains(&day) {
        return None;
    }
    match year_txt {
        None => Some(NormDate::MonthDay { month, day }),
        Some(y) => {
            if !RE_YEAR4.is_match(y) {
                return None;
            }
            let year: i32 = y.parse().ok()?;
            if !(YEAR_MIN..=YEAR_MAX).contains(&year) {
                return None;
            }
            Some(NormDate::Abs { month, day, year })
        }
    }
}

/// `(month) [, | the] (day) [,] [(year)]` — "May 5th", "May the 5th",
/// "Jun 21 2019".
fn spelled_month_day(w: &TokenWindow) -> Option<(Vec<Token>, usize)> {
    let mut d = 1;
    if w.matches(d, ",", PartOfSpeech::Comma, Any) || w.matches(d, "the", PartOfSpeech::Dt, Any) {
        d += 1;
    }
    if !(w.matches(0, MONTH_WORDS, Any, Any) && w.matches(d, Any, DAY_POS, Any)) {
        return None;
    }
    let month = month_num(w.norm(0)?)?;

    let mut y = d + 1;
    if w.matches(y, ",", PartOfSpeech::Comma, Any) {
        y += 1;
    }
    let mut end_tok = d;
    let mut res = None;
    if w.matches(y, Any, PartOfSpeech::Cd, Any) {
        res = spelled_date(month, w.norm(d)?, w.norm(y));
        if res.is_some() {
            end_tok = y;
        }
    }
    if res.is_none() {
        res = spelled_date(month, w.norm(d)?, None);
    }
    let norm = res?;
    Some((vec![Token::from_date(norm, SemanticRole::Date)], end_tok + 1))
}

/// `[the] (day) [, | of] (month) [,] [(year)]` — "the 23rd of May",
/// "15th of may, 2020".
fn spelled_day_month(w: &TokenWindow) -> Option<(Vec<Token>, usize)> {
    let mut d = 0;
    if w.matches(d, "the", PartOfSpeech::Dt, Any) {
        d += 1;
    }
    let mut m = d + 1;
    if w.matches(m, ",", PartOfSpeech::Comma, Any) || w.matches(m, "of", PartOfSpeech::In, Any) {
        m += 1;
    }
    if !(w.matches(d, Any, DAY_POS, Any) && w.matches(m, MONTH_WORDS, Any, Any)) {
        return None;
    }
    let month = month_num(w.norm(m)?)?;

    let mut y = m + 1;
    if w.matches(y, ",", PartOfSpeech::Comma, Any) {
        y += 1;
    }
    let mut end_tok = m;
    let mut res = None;
    if w.matches(y, Any, PartOfSpeech::Cd, Any) {
        res = spelled_date(month, w.norm(d)?, w.norm(y));
        if res.is_some() {
            end_tok = y;
        }
    }
    if res.is_none() {
        res = spelled_date(month, w.norm(d)?, None);
    }
    let norm = res?;
    Some((vec![Token::from_date(norm, SemanticRole::Date)], end_tok + 1))
}

/// "the 21st" becomes the next occurrence of that day of the month.
fn the_ordinal(w: &TokenWindow) -> Option<(Vec<Token>, usize)> {
    if !(w.matches(0, "the", PartOfSpeech::Dt, Any) && w.matches(1, Any, PartOfSpeech::Od, Any)) {
        return None;
    }
    let n: u32 = w.norm(1)?.parse().ok()?;
    Some((
        vec![Token::from_date(NormDate::DayOfMonth(n), SemanticRole::Date)],
        2,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::PartOfSpeech as Pos;
    use pretty_assertions::assert_eq;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 6, 5).unwrap()
    }

    // tokens as they reach this pass: spelled numbers already in digit form
    fn toks(words: &[(&str, Pos)]) -> Vec<Token> {
        words
            .iter()
            .map(|(word, pos)| {
                let mut tok = Token::new(word, *pos);
                crate::numbers::rewrite_spelled_number(&mut tok);
                tok
            })
            .collect()
    }

    fn norms(out: &[Token]) -> Vec<String> {
        out.iter().map(|t| t.normalized.clone()).collect()
    }

    #[test]
    fn hyphenated_time_range_splits_into_a_triple() {
        let out = collapse_pass(toks(&[("11-1:30pm", Pos::Cd)]), anchor());
        assert_eq!(
            norms(&out),
            vec!["reltime:11:00:00", "until", "abstime:13:30:00"]
        );
        assert_eq!(out[0].sem, SemanticRole::StartTime);
        assert_eq!(out[1].sem, SemanticRole::Ignore);
        assert_eq!(out[2].sem, SemanticRole::EndTime);
    }

    #[test]
    fn meridian_lookahead_completes_a_range() {
        // "8-10 am" — the lookahead is consumed and applied to the end
        let out = collapse_pass(toks(&[("8-10", Pos::Cd), ("am", Pos::Nn)]), anchor());
        assert_eq!(
            norms(&out),
            vec!["reltime:08:00:00", "until", "abstime:10:00:00"]
        );
    }

    #[test]
    fn range_needs_both_halves_to_normalize() {
        // "25" is not a valid hour, so this is not a range
        let out = collapse_pass(toks(&[("25-11pm", Pos::Cd)]), anchor());
        assert_eq!(norms(&out), vec!["25-11pm"]);
    }

    #[test]
    fn standalone_time_with_lookahead() {
        let out = collapse_pass(toks(&[("7", Pos::Cd), ("am", Pos::Nn)]), anchor());
        assert_eq!(norms(&out), vec!["abstime:07:00:00"]);
        assert_eq!(out[0].sem, SemanticRole::Time);

        let out = collapse_pass(toks(&[("10", Pos::Cd), ("o'clock", Pos::Nn)]), anchor());
        assert_eq!(norms(&out), vec!["reltime:10:00:00"]);
    }

    #[test]
    fn bare_ambiguous_number_passes_through() {
        let out = collapse_pass(toks(&[("8", Pos::Cd)]), anchor());
        assert_eq!(norms(&out), vec!["8"]);
        assert_eq!(out[0].sem, SemanticRole::Unknown);
    }

    #[test]
    fn date_range_splits_into_a_triple() {
        let out = collapse_pass(toks(&[("8/9-8/18", Pos::Cd)]), anchor());
        assert_eq!(norms(&out), vec!["reldate:08/09", "until", "reldate:08/18"]);
        assert_eq!(out[0].sem, SemanticRole::StartDate);
        assert_eq!(out[2].sem, SemanticRole::EndDate);
    }

    #[test]
    fn hyphenated_dates_are_conservative() {
        // full triple: a date
        let out = collapse_pass(toks(&[("6-20-18", Pos::Cd)]), anchor());
        assert_eq!(norms(&out), vec!["absdate:06/20/2018"]);
        // a bare "6-20" could be a range, so it is left alone
        let out = collapse_pass(toks(&[("6-20", Pos::Cd)]), anchor());
        assert_eq!(norms(&out), vec!["6-20"]);
        // with a slash it is unambiguously month/day
        let out = collapse_pass(toks(&[("6/20", Pos::Cd)]), anchor());
        assert_eq!(norms(&out), vec!["reldate:06/20"]);
    }

    #[test]
    fn weekday_becomes_a_date_token() {
        let out = collapse_pass(toks(&[("Thursday", Pos::Nnp)]), anchor());
        assert_eq!(norms(&out), vec!["reldate:weekday:3"]);
        assert_eq!(out[0].sem, SemanticRole::Date);
    }

    #[test]
    fn next_weekday_merges() {
        let out = collapse_pass(toks(&[("next", Pos::Jj), ("Tuesday", Pos::Nnp)]), anchor());
        assert_eq!(norms(&out), vec!["reldate:weekday:1"]);
    }

    #[test]
    fn time_of_day_suffix_merges() {
        let out = collapse_pass(
            toks(&[("8", Pos::Cd), ("in", Pos::In), ("the", Pos::Dt), ("evening", Pos::Nn)]),
            anchor(),
        );
        assert_eq!(norms(&out), vec!["abstime:20:00:00"]);

        let out = collapse_pass(
            toks(&[("4", Pos::Cd), ("in", Pos::In), ("the", Pos::Dt), ("morning", Pos::Nn)]),
            anchor(),
        );
        assert_eq!(norms(&out), vec!["abstime:04:00:00"]);

        let out = collapse_pass(toks(&[("9", Pos::Cd), ("at", Pos::In), ("night", Pos::Nn)]), anchor());
        assert_eq!(norms(&out), vec!["abstime:21:00:00"]);
    }

    #[test]
    fn spelled_month_forms() {
        // month-first with year
        let out = collapse_pass(
            toks(&[("Jun", Pos::Nnp), ("21", Pos::Cd), ("2019", Pos::Cd)]),
            anchor(),
        );
        assert_eq!(norms(&out), vec!["absdate:06/21/2019"]);

        // month-first without year
        let out = collapse_pass(toks(&[("May", Pos::Nnp), ("5th", Pos::Od)]), anchor());
        assert_eq!(norms(&out), vec!["reldate:05/05"]);

        // day-first with "of" and a comma before the year
        let out = collapse_pass(
            toks(&[
                ("15th", Pos::Od),
                ("of", Pos::In),
                ("may", Pos::Nn),
                (",", Pos::Comma),
                ("2020", Pos::Cd),
            ]),
            anchor(),
        );
        assert_eq!(norms(&out), vec!["absdate:05/15/2020"]);

        // an out-of-range year is not consumed
        let out = collapse_pass(
            toks(&[("May", Pos::Nnp), ("5", Pos::Cd), ("2999", Pos::Cd)]),
            anchor(),
        );
        assert_eq!(norms(&out), vec!["reldate:05/05", "2999"]);
    }

    #[test]
    fn the_ordinal_is_a_monthday() {
        let out = collapse_pass(toks(&[("the", Pos::Dt), ("21st", Pos::Od)]), anchor());
        assert_eq!(norms(&out), vec!["reldate:monthday:21"]);
    }

    #[test]
    fn possessive_merges_into_noun() {
        let out = collapse_pass(toks(&[("Sam", Pos::Nnp), ("'s", Pos::Pos)]), anchor());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].original, "Sam's");
        assert_eq!(out[0].normalized, "sam's");
    }
}
