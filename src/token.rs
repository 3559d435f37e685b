//! Word token model for the annotation pipeline.
//!
//! Every stage of the parser operates on [`Token`]s: the tagger produces
//! them, the pattern passes rewrite them, and the resolver consumes them.

use std::fmt;

use crate::parser::norm::{NormDate, NormTime};

/// Part-of-speech tags.
///
/// The vocabulary is the Penn-treebank style set the pattern rules key on,
/// extended with `Od` (ordinal digit), punctuation tags, and the two tags
/// `Time` and `Date` that the matcher assigns once a token has been fully
/// normalized into one of the canonical time/date forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    /// Coordinating conjunction ("and")
    Cc,
    /// Cardinal digit
    Cd,
    /// Determiner ("the")
    Dt,
    /// Existential "there"
    Ex,
    /// Foreign word
    Fw,
    /// Preposition / subordinating conjunction ("at", "in", "on")
    In,
    /// Adjective
    Jj,
    /// Adjective, comparative
    Jjr,
    /// Adjective, superlative
    Jjs,
    /// Modal ("could", "will")
    Md,
    /// Noun, singular
    Nn,
    /// Noun, plural
    Nns,
    /// Proper noun, singular
    Nnp,
    /// Proper noun, plural
    Nnps,
    /// Ordinal digit ("21st")
    Od,
    /// Predeterminer
    Pdt,
    /// Possessive ending ("'s")
    Pos,
    /// Personal pronoun
    Prp,
    /// Possessive pronoun ("my", "our")
    PrpS,
    /// Adverb
    Rb,
    /// Particle
    Rp,
    /// The word "to"
    To,
    /// Interjection
    Uh,
    /// Verb, base form
    Vb,
    /// Verb, past tense
    Vbd,
    /// Verb, gerund
    Vbg,
    /// Verb, past participle
    Vbn,
    /// Verb, non-3rd person singular present
    Vbp,
    /// Verb, 3rd person singular present ("is")
    Vbz,
    /// Wh-determiner
    Wdt,
    /// Wh-pronoun
    Wp,
    /// Wh-adverb
    Wrb,
    /// A comma
    Comma,
    /// Dash or colon
    Colon,
    /// Sentence-final punctuation
    Period,
    /// Any other symbol
    Sym,
    /// A fully-normalized time token (synthesized by the matcher)
    Time,
    /// A fully-normalized date token (synthesized by the matcher)
    Date,
}

/// The semantic role a token plays in the event being described, distinct
/// from its grammatical part of speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticRole {
    Date,
    StartDate,
    EndDate,
    Time,
    StartTime,
    EndTime,
    Title,
    Location,
    Duration,
    /// Consumed by a rule; skipped at bucketing time.
    Ignore,
    /// Not yet classified. Becomes `Title` after the phrase pass.
    Unknown,
}

impl SemanticRole {
    pub fn is_time_family(self) -> bool {
        matches!(
            self,
            SemanticRole::Time | SemanticRole::StartTime | SemanticRole::EndTime
        )
    }

    pub fn is_date_family(self) -> bool {
        matches!(
            self,
            SemanticRole::Date | SemanticRole::StartDate | SemanticRole::EndDate
        )
    }
}

/// Filter over a token's normalized text: absent, exact, or any-of.
#[derive(Clone, Copy)]
pub enum ValFilter<'a> {
    Any,
    One(&'a str),
    In(&'a [&'a str]),
}

/// Filter over a token's part of speech.
#[derive(Clone, Copy)]
pub enum PosFilter<'a> {
    Any,
    One(PartOfSpeech),
    In(&'a [PartOfSpeech]),
}

/// Filter over a token's semantic role.
#[derive(Clone, Copy)]
pub enum SemFilter<'a> {
    Any,
    One(SemanticRole),
    In(&'a [SemanticRole]),
}

/// Wildcard filter, convertible into any of the three filter kinds.
#[derive(Clone, Copy)]
pub struct Any;

impl From<Any> for ValFilter<'_> {
    fn from(_: Any) -> Self {
        ValFilter::Any
    }
}

impl<'a> From<&'a str> for ValFilter<'a> {
    fn from(v: &'a str) -> Self {
        ValFilter::One(v)
    }
}

impl<'a> From<&'a [&'a str]> for ValFilter<'a> {
    fn from(v: &'a [&'a str]) -> Self {
        ValFilter::In(v)
    }
}

impl From<Any> for PosFilter<'_> {
    fn from(_: Any) -> Self {
        PosFilter::Any
    }
}

impl From<PartOfSpeech> for PosFilter<'_> {
    fn from(p: PartOfSpeech) -> Self {
        PosFilter::One(p)
    }
}

impl<'a> From<&'a [PartOfSpeech]> for PosFilter<'a> {
    fn from(p: &'a [PartOfSpeech]) -> Self {
        PosFilter::In(p)
    }
}

impl From<Any> for SemFilter<'_> {
    fn from(_: Any) -> Self {
        SemFilter::Any
    }
}

impl From<SemanticRole> for SemFilter<'_> {
    fn from(s: SemanticRole) -> Self {
        SemFilter::One(s)
    }
}

impl<'a> From<&'a [SemanticRole]> for SemFilter<'a> {
    fn from(s: &'a [SemanticRole]) -> Self {
        SemFilter::In(s)
    }
}

/// One token in the sentence being parsed.
#[derive(Clone)]
pub struct Token {
    /// The original form, exactly as input by the user.
    pub original: String,
    /// The processed form: lower case, possibly rewritten into one of the
    /// canonical time/date string forms to make it more parsable.
    pub normalized: String,
    pub pos: PartOfSpeech,
    pub sem: SemanticRole,
    time: Option<NormTime>,
    date: Option<NormDate>,
}

impl Token {
    pub fn new(original: &str, pos: PartOfSpeech) -> Self {
        Token {
            original: original.to_string(),
            normalized: original.to_lowercase(),
            pos,
            sem: SemanticRole::Unknown,
            time: None,
            date: None,
        }
    }

    /// Build a token that already carries a resolved time. The role is
    /// forced into the time family so the invariant between `sem` and the
    /// resolved value holds from construction.
    pub fn from_time(norm: NormTime, sem: SemanticRole) -> Self {
        let sem = if sem.is_time_family() { sem } else { SemanticRole::Time };
        let s = norm.to_string();
        Token {
            original: s.clone(),
            normalized: s,
            pos: PartOfSpeech::Time,
            sem,
            time: Some(norm),
            date: None,
        }
    }

    /// Build a token that already carries a resolved date.
    pub fn from_date(norm: NormDate, sem: SemanticRole) -> Self {
        let sem = if sem.is_date_family() { sem } else { SemanticRole::Date };
        let s = norm.to_string();
        Token {
            original: s.clone(),
            normalized: s,
            pos: PartOfSpeech::Date,
            sem,
            date: Some(norm),
            time: None,
        }
    }

    /// Rewrite this token into a resolved time, keeping `original` for
    /// display. Updates the normalized form, part of speech, and role
    /// together so they cannot drift apart.
    pub fn assign_time(&mut self, norm: NormTime, sem: SemanticRole) {
        self.normalized = norm.to_string();
        self.pos = PartOfSpeech::Time;
        self.sem = if sem.is_time_family() { sem } else { SemanticRole::Time };
        self.time = Some(norm);
        self.date = None;
    }

    /// Rewrite this token into a resolved date.
    pub fn assign_date(&mut self, norm: NormDate, sem: SemanticRole) {
        self.normalized = norm.to_string();
        self.pos = PartOfSpeech::Date;
        self.sem = if sem.is_date_family() { sem } else { SemanticRole::Date };
        self.date = Some(norm);
        self.time = None;
    }

    /// Rewrite this token into a duration of the given number of minutes.
    pub fn assign_duration(&mut self, minutes: i64) {
        self.normalized = minutes.to_string();
        self.pos = PartOfSpeech::Time;
        self.sem = SemanticRole::Duration;
        self.time = None;
        self.date = None;
    }

    pub fn time(&self) -> Option<NormTime> {
        self.time
    }

    pub fn date(&self) -> Option<NormDate> {
        self.date
    }

    /// The sole matching primitive every pattern rule is built from.
    ///
    /// Each filter is either [`Any`] (matches everything), a single value
    /// (must match exactly), or a slice of values (must match one of
    /// them). All supplied filters must pass.
    pub fn matches<'a>(
        &self,
        val: impl Into<ValFilter<'a>>,
        pos: impl Into<PosFilter<'a>>,
        sem: impl Into<SemFilter<'a>>,
    ) -> bool {
        let ok_val = match val.into() {
            ValFilter::Any => true,
            ValFilter::One(v) => self.normalized == v,
            ValFilter::In(vs) => vs.contains(&self.normalized.as_str()),
        };
        let ok_pos = match pos.into() {
            PosFilter::Any => true,
            PosFilter::One(p) => self.pos == p,
            PosFilter::In(ps) => ps.contains(&self.pos),
        };
        let ok_sem = match sem.into() {
            SemFilter::Any => true,
            SemFilter::One(s) => self.sem == s,
            SemFilter::In(ss) => ss.contains(&self.sem),
        };
        ok_val && ok_pos && ok_sem
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(t) = &self.time {
            return write!(f, "{}({:?})", t, self.sem);
        }
        if let Some(d) = &self.date {
            return write!(f, "{}({:?})", d, self.sem);
        }
        write!(f, "{}({:?},{:?})", self.normalized, self.sem, self.pos)
    }
}

/// A bounded lookahead view over the token sequence.
///
/// Pattern rules address positions relative to the head of the window;
/// positions past the end of the underlying slice are a distinguished
/// "no match" case rather than a sentinel token, so rule preconditions
/// fail safely at sequence boundaries without bounds checks.
pub struct TokenWindow<'a> {
    toks: &'a [Token],
}

impl<'a> TokenWindow<'a> {
    pub fn new(toks: &'a [Token]) -> Self {
        TokenWindow { toks }
    }

    pub fn get(&self, i: usize) -> Option<&'a Token> {
        self.toks.get(i)
    }

    /// The normalized text at position `i`, if in range.
    pub fn norm(&self, i: usize) -> Option<&'a str> {
        self.toks.get(i).map(|t| t.normalized.as_str())
    }

    /// [`Token::matches`] at position `i`; always false out of range.
    pub fn matches<'b>(
        &self,
        i: usize,
        val: impl Into<ValFilter<'b>>,
        pos: impl Into<PosFilter<'b>>,
        sem: impl Into<SemFilter<'b>>,
    ) -> bool {
        match self.toks.get(i) {
            Some(t) => t.matches(val, pos, sem),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::norm::NormTime;

    #[test]
    fn filters_must_all_pass() {
        let tok = Token::new("Thursday", PartOfSpeech::Nnp);
        assert!(tok.matches(Any, Any, Any));
        assert!(tok.matches("thursday", PartOfSpeech::Nnp, Any));
        assert!(tok.matches("thursday", Any, SemanticRole::Unknown));
        assert!(!tok.matches("thursday", PartOfSpeech::Nn, Any));
        assert!(!tok.matches("friday", PartOfSpeech::Nnp, Any));
    }

    #[test]
    fn set_filters_match_any_member() {
        let tok = Token::new("pm", PartOfSpeech::Nn);
        let meridians: &[&str] = &["a", "am", "p", "pm"];
        assert!(tok.matches(meridians, Any, Any));
        let poses: &[PartOfSpeech] = &[PartOfSpeech::Nn, PartOfSpeech::Cd];
        assert!(tok.matches(Any, poses, Any));
    }

    #[test]
    fn window_is_boundary_safe() {
        let toks = vec![Token::new("at", PartOfSpeech::In)];
        let w = TokenWindow::new(&toks);
        assert!(w.matches(0, "at", Any, Any));
        assert!(!w.matches(1, Any, Any, Any));
        assert!(w.get(7).is_none());
        assert_eq!(w.norm(7), None);
    }

    #[test]
    fn resolved_time_forces_role() {
        let norm: NormTime = "reltime:08:00:00".parse().unwrap();
        let tok = Token::from_time(norm, SemanticRole::Location);
        assert_eq!(tok.sem, SemanticRole::Time);
        assert_eq!(tok.normalized, "reltime:08:00:00");

        let mut tok = Token::new("8", PartOfSpeech::Cd);
        tok.assign_time(norm, SemanticRole::StartTime);
        assert_eq!(tok.sem, SemanticRole::StartTime);
        assert_eq!(tok.pos, PartOfSpeech::Time);
        assert_eq!(tok.time(), Some(norm));
    }
}
