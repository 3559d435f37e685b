//! Natural-language event parsing.
//!
//! The pipeline: the tagger supplies (text, part-of-speech) pairs, the
//! spelled-number normalizer rewrites "twenty-second" into "22", the
//! collapse/expand pass merges multi-token dates and times and splits
//! hyphenated ranges, the phrase pass recognizes the larger syntactic
//! shapes, and the resolver turns the tagged tokens into concrete
//! calendar fields. Parsing is best-effort and conservative: anything
//! unrecognized ends up in the event title, and a parse never fails —
//! worst case, fields are absent from the result.

pub mod collapse;
pub mod norm;
pub mod phrase;
pub mod resolve;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;

use crate::numbers::rewrite_spelled_number;
use crate::tagger;
use crate::token::{Any, PartOfSpeech, SemanticRole, Token};

/// The structured fields recovered from one sentence. Every field is
/// independently optional: absent means no evidence was found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedEvent {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub title: Option<String>,
    pub location: Option<String>,
}

/// Parse a sentence describing an event.
///
/// `anchor` is the moment "today" is measured from; it is captured once
/// and held fixed for the whole parse, so relative references
/// ("tomorrow", "Thursday", "in 90 minutes") resolve consistently.
/// Parsing is a pure function of the input and the anchor.
pub fn parse(raw: &str, anchor: NaiveDateTime) -> ParsedEvent {
    let tokens: Vec<Token> = tagger::tag(raw)
        .into_iter()
        .map(|(word, pos)| {
            let mut tok = Token::new(&word, pos);
            rewrite_spelled_number(&mut tok);
            if tok.normalized == "@" {
                tok = Token::new("at", PartOfSpeech::In);
            }
            tok
        })
        .collect();
    debug!("after tagging: {:?}", tokens);

    let mut tokens = collapse::collapse_pass(tokens, anchor.date());
    debug!("after collapse/expand pass: {:?}", tokens);

    phrase::phrase_pass(&mut tokens, anchor);
    debug!("after phrase pass: {:?}", tokens);

    // the copula carries no information; everything else unclaimed is title
    for tok in &mut tokens {
        if tok.matches("is", Any, SemanticRole::Unknown) {
            tok.sem = SemanticRole::Ignore;
        }
    }
    for tok in &mut tokens {
        if tok.sem == SemanticRole::Unknown {
            tok.sem = SemanticRole::Title;
        }
    }

    let mut buckets: resolve::Buckets = Default::default();
    for tok in tokens {
        if tok.sem == SemanticRole::Ignore {
            continue;
        }
        buckets.entry(tok.sem).or_default().push(tok);
    }

    resolve::resolve(buckets, anchor)
}

/// [`parse`] anchored at the current local time.
pub fn parse_now(raw: &str) -> ParsedEvent {
    parse(raw, Local::now().naive_local())
}
