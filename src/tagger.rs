//! Tokenizer and part-of-speech tagger.
//!
//! Splits a raw sentence into (text, part-of-speech) pairs for the parser.
//! The tagging is deliberately shallow: a small closed-class lexicon plus
//! shape rules (digits are cardinals, `21st` is an ordinal, a capitalized
//! word is a proper noun). The pattern rules downstream mostly key on the
//! token text and only need the broad word classes to be right.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::token::PartOfSpeech;

/// Punctuation that opens a token and is split off the front.
const OPENERS: &[char] = &['"', '('];
/// Punctuation that closes a token and is split off the back.
const CLOSERS: &[char] = &[',', '.', '!', '?', ';', ')', '"'];

static RE_ORDINAL_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}(st|nd|rd|th)$").unwrap());

/// Split a raw string into tagged words.
pub fn tag(raw: &str) -> Vec<(String, PartOfSpeech)> {
    let mut words = Vec::new();
    for chunk in raw.split_whitespace() {
        split_chunk(chunk, &mut words);
    }
    words
        .into_iter()
        .map(|w| {
            let pos = classify(&w);
            (w, pos)
        })
        .collect()
}

fn split_chunk(chunk: &str, out: &mut Vec<String>) {
    if chunk.is_empty() {
        return;
    }
    let mut chars = chunk.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return,
    };
    if chars.next().is_none() {
        out.push(chunk.to_string());
        return;
    }

    if OPENERS.contains(&first) || first == '@' {
        out.push(first.to_string());
        split_chunk(&chunk[first.len_utf8()..], out);
        return;
    }

    if let Some(last) = chunk.chars().last() {
        if CLOSERS.contains(&last) {
            split_chunk(&chunk[..chunk.len() - last.len_utf8()], out);
            out.push(last.to_string());
            return;
        }
    }

    // possessive marker becomes its own token, as in "Lucky" + "'s"
    if chunk.len() > 2 && (chunk.ends_with("'s") || chunk.ends_with("'S")) {
        split_chunk(&chunk[..chunk.len() - 2], out);
        out.push(chunk[chunk.len() - 2..].to_string());
        return;
    }

    out.push(chunk.to_string());
}

fn classify(word: &str) -> PartOfSpeech {
    match word {
        "," => return PartOfSpeech::Comma,
        "." | "!" | "?" => return PartOfSpeech::Period,
        "-" | "--" | ":" | ";" => return PartOfSpeech::Colon,
        "'s" | "'S" => return PartOfSpeech::Pos,
        _ => {}
    }

    let mut chars = word.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return PartOfSpeech::Sym,
    };

    let lower = word.to_lowercase();
    if first.is_ascii_digit() {
        if RE_ORDINAL_DIGIT.is_match(&lower) {
            return PartOfSpeech::Od;
        }
        return PartOfSpeech::Cd;
    }
    if !first.is_alphanumeric() {
        return PartOfSpeech::Sym;
    }

    if let Some(pos) = lexicon(&lower) {
        return pos;
    }
    if first.is_uppercase() {
        return PartOfSpeech::Nnp;
    }
    PartOfSpeech::Nn
}

/// Closed-class words the pattern rules depend on being tagged correctly.
fn lexicon(w: &str) -> Option<PartOfSpeech> {
    let pos = match w {
        "the" | "a" | "an" | "this" | "that" | "these" | "those" => PartOfSpeech::Dt,
        "at" | "in" | "on" | "from" | "for" | "with" | "of" | "by" | "about" | "after"
        | "before" | "until" | "till" | "til" | "thru" | "through" => PartOfSpeech::In,
        "to" => PartOfSpeech::To,
        "and" | "or" | "but" => PartOfSpeech::Cc,
        "i" | "you" | "he" | "she" | "it" | "we" | "they" | "me" | "him" | "us" | "them" => {
            PartOfSpeech::Prp
        }
        "my" | "your" | "his" | "her" | "its" | "our" | "their" => PartOfSpeech::PrpS,
        "is" => PartOfSpeech::Vbz,
        "are" => PartOfSpeech::Vbp,
        "was" | "were" => PartOfSpeech::Vbd,
        "be" => PartOfSpeech::Vb,
        "will" | "would" | "can" | "could" | "shall" | "should" | "must" => PartOfSpeech::Md,
        "there" => PartOfSpeech::Ex,
        "next" | "last" => PartOfSpeech::Jj,
        "not" | "very" | "really" => PartOfSpeech::Rb,
        "when" | "where" | "why" | "how" => PartOfSpeech::Wrb,
        "who" | "what" => PartOfSpeech::Wp,
        "which" => PartOfSpeech::Wdt,
        _ => return None,
    };
    Some(pos)
}
