//! Spelled-number normalization.
//!
//! Rewrites spelled-out cardinals ("seven") and ordinals ("twenty-second",
//! "22nd") into digit form so the downstream pattern rules only ever see
//! digits. Table-driven, exact lookup, no fuzzy matching.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::token::{PartOfSpeech, Token};

static CARDINALS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("one", "1"),
        ("two", "2"),
        ("three", "3"),
        ("four", "4"),
        ("five", "5"),
        ("six", "6"),
        ("seven", "7"),
        ("eight", "8"),
        ("nine", "9"),
        ("ten", "10"),
        ("eleven", "11"),
        ("twelve", "12"),
        ("thirteen", "13"),
        ("fourteen", "14"),
        ("fifteen", "15"),
        ("sixteen", "16"),
        ("seventeen", "17"),
        ("eighteen", "18"),
        ("nineteen", "19"),
        ("twenty", "20"),
        ("twentyone", "21"),
        ("twenty-one", "21"),
        ("twentytwo", "22"),
        ("twenty-two", "22"),
        ("twentythree", "23"),
        ("twenty-three", "23"),
        ("twentyfour", "24"),
        ("twenty-four", "24"),
        ("twentyfive", "25"),
        ("twenty-five", "25"),
        ("twentysix", "26"),
        ("twenty-six", "26"),
        ("twentyseven", "27"),
        ("twenty-seven", "27"),
        ("twentyeight", "28"),
        ("twenty-eight", "28"),
        ("twentynine", "29"),
        ("twenty-nine", "29"),
        ("thirty", "30"),
        ("thirtyone", "31"),
        ("thirty-one", "31"),
    ])
});

static ORDINALS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("first", "1"),
        ("1st", "1"),
        ("second", "2"),
        ("2nd", "2"),
        ("third", "3"),
        ("3rd", "3"),
        ("fourth", "4"),
        ("4th", "4"),
        ("fifth", "5"),
        ("5th", "5"),
        ("sixth", "6"),
        ("6th", "6"),
        ("seventh", "7"),
        ("7th", "7"),
        ("eighth", "8"),
        ("8th", "8"),
        ("ninth", "9"),
        ("9th", "9"),
        ("tenth", "10"),
        ("10th", "10"),
        ("eleventh", "11"),
        ("11th", "11"),
        ("twelfth", "12"),
        ("12th", "12"),
        ("thirteenth", "13"),
        ("13th", "13"),
        ("fourteenth", "14"),
        ("14th", "14"),
        ("fifteenth", "15"),
        ("15th", "15"),
        ("sixteenth", "16"),
        ("16th", "16"),
        ("seventeenth", "17"),
        ("17th", "17"),
        ("eighteenth", "18"),
        ("18th", "18"),
        ("nineteenth", "19"),
        ("19th", "19"),
        ("twentieth", "20"),
        ("20th", "20"),
        ("twentyfirst", "21"),
        ("twenty-first", "21"),
        ("21st", "21"),
        ("twentysecond", "22"),
        ("twenty-second", "22"),
        ("22nd", "22"),
        ("twentythird", "23"),
        ("twenty-third", "23"),
        ("23rd", "23"),
        ("twentyfourth", "24"),
        ("twenty-fourth", "24"),
        ("24th", "24"),
        ("twentyfifth", "25"),
        ("twenty-fifth", "25"),
        ("25th", "25"),
        ("twentysixth", "26"),
        ("twenty-sixth", "26"),
        ("26th", "26"),
        ("twentyseventh", "27"),
        ("twenty-seventh", "27"),
        ("27th", "27"),
        ("twentyeighth", "28"),
        ("twenty-eighth", "28"),
        ("28th", "28"),
        ("twentyninth", "29"),
        ("twenty-ninth", "29"),
        ("29th", "29"),
        ("thirtieth", "30"),
        ("30th", "30"),
        ("thirtyfirst", "31"),
        ("thirty-first", "31"),
        ("31st", "31"),
    ])
});

/// Rewrite a token that spells a number from 1 to 31.
///
/// On a table hit the normalized value becomes the digit string and the
/// part of speech is set to cardinal or ordinal; otherwise the token is
/// left unchanged.
pub fn rewrite_spelled_number(tok: &mut Token) {
    if let Some(digits) = CARDINALS.get(tok.normalized.as_str()) {
        tok.pos = PartOfSpeech::Cd;
        tok.normalized = (*digits).to_string();
    } else if let Some(digits) = ORDINALS.get(tok.normalized.as_str()) {
        tok.pos = PartOfSpeech::Od;
        tok.normalized = (*digits).to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::PartOfSpeech;

    #[test]
    fn cardinals_become_digits() {
        let mut tok = Token::new("ten", PartOfSpeech::Nn);
        rewrite_spelled_number(&mut tok);
        assert_eq!(tok.normalized, "10");
        assert_eq!(tok.pos, PartOfSpeech::Cd);
    }

    #[test]
    fn ordinals_become_digits() {
        for (word, digits) in [("twenty-second", "22"), ("22nd", "22"), ("first", "1")] {
            let mut tok = Token::new(word, PartOfSpeech::Nn);
            rewrite_spelled_number(&mut tok);
            assert_eq!(tok.normalized, digits, "{}", word);
            assert_eq!(tok.pos, PartOfSpeech::Od);
        }
    }

    #[test]
    fn other_words_are_untouched() {
        let mut tok = Token::new("lunch", PartOfSpeech::Nn);
        rewrite_spelled_number(&mut tok);
        assert_eq!(tok.normalized, "lunch");
        assert_eq!(tok.pos, PartOfSpeech::Nn);
    }
}
