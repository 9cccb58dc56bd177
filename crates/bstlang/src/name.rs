//! Parsing of personal names.
//!
//! A `NAMES`-type field value such as `"Brinch Hansen, Per and Knuth,
//! Donald E."` holds one or more personal names separated by the word
//! `and`. [NameList] performs the splitting; [Name] decomposes a single
//! name into its four canonical parts (First, von, Last, Jr) following
//! the BibTeX classification rules:
//!
//! - `First von Last` (no comma): the von part runs from the first
//!   lower-case token through the last lower-case token, with the final
//!   token always reserved for the last name.
//! - `von Last, First` (one comma): everything before the comma up to and
//!   including the last lower-case token is von; the rest is the last name.
//! - `von Last, Jr, First` (two commas): as above, with the middle
//!   segment taken verbatim as the Jr part.
//!
//! A token's case is decided by the first letter it contains, ignoring
//! any non-letter characters before it; a token with no letters counts
//! as upper case. Braces protect their contents: token separators and
//! the word `and` are only recognized at brace depth zero.

use crate::error::{BstError, Kind};
use crate::token::Locator;
use crate::Result;

/// One personal name, decomposed into its four parts.
///
/// Each part is the ordered list of tokens that make it up; tokens keep
/// their original spelling, braces included. The last part is never
/// empty for a successfully parsed name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Name {
    first: Vec<String>,
    von: Vec<String>,
    last: Vec<String>,
    jr: Vec<String>,
}

impl Name {
    /// Parse a single name.
    pub fn parse(text: &str, locator: &Locator) -> Result<Name> {
        let segments = split_segments(text, locator)?;
        let tokens: Vec<Vec<String>> = segments.iter().map(|s| tokenize(s)).collect();
        if tokens.iter().all(|t| t.is_empty()) {
            return Err(
                BstError::new(Kind::NoName, format!["no name found in `{}`", text.trim()])
                    .with_locator(locator),
            );
        }
        let name = match tokens.len() {
            1 => Self::from_undivided(&tokens[0]),
            2 => Self::from_divided(&tokens[0], &[], &tokens[1]),
            3 => Self::from_divided(&tokens[0], &tokens[1], &tokens[2]),
            // split_segments already rejected this.
            _ => {
                return Err(BstError::new(Kind::Internal, "name segment count out of range")
                    .with_locator(locator))
            }
        };
        match name {
            Some(name) => Ok(name),
            None => Err(BstError::new(
                Kind::NoName,
                format!["no last name found in `{}`", text.trim()],
            )
            .with_locator(locator)),
        }
    }

    // `First von Last`: first is everything before the first lower-case
    // token, von runs through the last lower-case token, and the final
    // token always belongs to the last name.
    fn from_undivided(tokens: &[String]) -> Option<Name> {
        if tokens.is_empty() {
            return None;
        }
        if tokens.len() == 1 {
            return Some(Name {
                first: Vec::new(),
                von: Vec::new(),
                last: tokens.to_vec(),
                jr: Vec::new(),
            });
        }
        let candidates = &tokens[..tokens.len() - 1];
        match candidates.iter().position(|t| is_von_token(t)) {
            None => Some(Name {
                first: candidates.to_vec(),
                von: Vec::new(),
                last: tokens[tokens.len() - 1..].to_vec(),
                jr: Vec::new(),
            }),
            Some(von_start) => {
                let von_end = last_von_index(candidates).unwrap() + 1;
                Some(Name {
                    first: tokens[..von_start].to_vec(),
                    von: tokens[von_start..von_end].to_vec(),
                    last: tokens[von_end..].to_vec(),
                    jr: Vec::new(),
                })
            }
        }
    }

    // `von Last, [Jr,] First`: the first segment is split so that the
    // last name starts after the last lower-case token, keeping at least
    // one token.
    fn from_divided(von_last: &[String], jr: &[String], first: &[String]) -> Option<Name> {
        if von_last.is_empty() {
            return None;
        }
        let von_end = match last_von_index(&von_last[..von_last.len() - 1]) {
            None => 0,
            Some(i) => i + 1,
        };
        Some(Name {
            first: first.to_vec(),
            von: von_last[..von_end].to_vec(),
            last: von_last[von_end..].to_vec(),
            jr: jr.to_vec(),
        })
    }

    /// Tokens of the First part, in input order.
    pub fn first(&self) -> &[String] {
        &self.first
    }

    /// Tokens of the von part, in input order.
    pub fn von(&self) -> &[String] {
        &self.von
    }

    /// Tokens of the Last part, in input order. Never empty.
    pub fn last(&self) -> &[String] {
        &self.last
    }

    /// Tokens of the Jr part, in input order.
    pub fn jr(&self) -> &[String] {
        &self.jr
    }

    /// The tokens of the part selected by a `format.name$` key letter.
    pub fn part(&self, key: char) -> &[String] {
        match key {
            'f' => self.first(),
            'v' => self.von(),
            'j' => self.jr(),
            _ => self.last(),
        }
    }
}

/// An ordered list of names split from a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NameList {
    names: Vec<Name>,
}

impl NameList {
    /// Split a field value on the word `and` at brace depth zero and
    /// parse each piece as a [Name].
    pub fn parse(text: &str, locator: &Locator) -> Result<NameList> {
        let mut names = Vec::new();
        for piece in split_on_and(text) {
            names.push(Name::parse(piece, locator)?);
        }
        Ok(NameList { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get name number `i`, counting from zero.
    pub fn get(&self, i: usize, locator: &Locator) -> Result<&Name> {
        match self.names.get(i) {
            Some(name) => Ok(name),
            None => Err(BstError::new(
                Kind::IllegalValue,
                format![
                    "requested name number {} but the list only has {} name(s)",
                    i + 1,
                    self.names.len()
                ],
            )
            .with_locator(locator)),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Name> {
        self.names.iter()
    }
}

// In names, ties behave like spaces: `La~Fontaine` is two tokens.
fn is_name_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '~'
}

// Split on commas at brace depth zero. More than two commas is a syntax
// error.
fn split_segments<'a>(text: &'a str, locator: &Locator) -> Result<Vec<&'a str>> {
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ',' if depth == 0 => {
                segments.push(&text[start..i]);
                start = i + 1;
            }
            _ => (),
        }
    }
    segments.push(&text[start..]);
    if segments.len() > 3 {
        return Err(BstError::new(
            Kind::Syntax,
            format![
                "too many commas ({}) in name `{}`",
                segments.len() - 1,
                text.trim()
            ],
        )
        .with_locator(locator));
    }
    Ok(segments)
}

// Split a segment into tokens on white space at brace depth zero.
fn tokenize(segment: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    for c in segment.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth -= 1;
                current.push(c);
            }
            c if is_name_whitespace(c) && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

// A von token starts with a lower-case letter; the deciding letter is
// the first letter in the token, wherever it sits.
fn is_von_token(token: &str) -> bool {
    for c in token.chars() {
        if c.is_alphabetic() {
            return c.is_lowercase();
        }
    }
    false
}

fn last_von_index(tokens: &[String]) -> Option<usize> {
    tokens.iter().rposition(|t| is_von_token(t))
}

// Split on the word `and` (case-insensitive) bounded by white space on
// both sides, at brace depth zero.
fn split_on_and(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            b'a' | b'A' if depth == 0 => {
                let preceded = i > 0 && (bytes[i - 1].is_ascii_whitespace() || bytes[i - 1] == b'~');
                let followed = i + 3 < bytes.len()
                    && bytes[i + 1].to_ascii_lowercase() == b'n'
                    && bytes[i + 2].to_ascii_lowercase() == b'd'
                    && (bytes[i + 3].is_ascii_whitespace() || bytes[i + 3] == b'~');
                if preceded && followed {
                    pieces.push(&text[start..i - 1]);
                    start = i + 4;
                    i += 4;
                    continue;
                }
            }
            _ => (),
        }
        i += 1;
    }
    pieces.push(&text[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Name {
        Name::parse(text, &Locator::none()).unwrap()
    }

    // Expected parts are written space-joined: first / von / last / jr.
    macro_rules! name_test {
        ($test_name: ident, $input: expr, $first: expr, $von: expr, $last: expr, $jr: expr,) => {
            #[test]
            fn $test_name() {
                let name = parse($input);
                assert_eq!(name.first().join(" "), $first, "first part");
                assert_eq!(name.von().join(" "), $von, "von part");
                assert_eq!(name.last().join(" "), $last, "last part");
                assert_eq!(name.jr().join(" "), $jr, "jr part");
            }
        };
    }

    name_test![single_token, "Knuth", "", "", "Knuth", "",];
    name_test![first_last, "Donald Knuth", "Donald", "", "Knuth", "",];

    // The upper-case `La` belongs to the last name; only lower-case
    // tokens extend the von part.
    name_test![
        von_stops_at_upper_case,
        "Jean de La Fontaine",
        "Jean",
        "de",
        "La Fontaine",
        "",
    ];

    name_test![
        comma_form_keeps_multi_token_last_name,
        "Brinch Hansen, Per",
        "Per",
        "",
        "Brinch Hansen",
        "",
    ];

    name_test![
        long_first_part_with_von,
        "Charles Louis Xavier Joseph de la Vallee Poussin",
        "Charles Louis Xavier Joseph",
        "de la",
        "Vallee Poussin",
        "",
    ];

    name_test![
        all_lower_case,
        "jean de la fontaine",
        "",
        "jean de la",
        "fontaine",
        "",
    ];

    // In the comma form the von part runs from the very first token
    // through the last lower-case one, upper-case tokens included.
    name_test![
        comma_form_von_swallows_leading_upper_case,
        "Jean de La Fontaine,",
        "",
        "Jean de",
        "La Fontaine",
        "",
    ];

    name_test![two_commas, "Ford, Jr., Henry", "Henry", "", "Ford", "Jr.",];
    name_test![
        von_within_comma_form,
        "van der Berg, Jan",
        "Jan",
        "van der",
        "Berg",
        "",
    ];

    name_test![
        braces_protect_spaces,
        "{Barnes and Noble} Staff",
        "{Barnes and Noble}",
        "",
        "Staff",
        "",
    ];

    name_test![
        tie_is_a_token_separator,
        "Per Brinch~Hansen",
        "Per Brinch",
        "",
        "Hansen",
        "",
    ];

    // A brace-opened token is classified by the first letter inside it.
    name_test![
        braced_lower_case_is_von,
        "Maria {de} La Cruz",
        "Maria",
        "{de}",
        "La Cruz",
        "",
    ];

    #[test]
    fn too_many_commas() {
        let err = Name::parse("a, b, c, d", &Locator::none()).unwrap_err();
        assert_eq!(err.kind(), Kind::Syntax);
    }

    #[test]
    fn empty_name() {
        let err = Name::parse("   ", &Locator::none()).unwrap_err();
        assert_eq!(err.kind(), Kind::NoName);
    }

    #[test]
    fn comma_form_with_no_last_name() {
        let err = Name::parse(", John", &Locator::none()).unwrap_err();
        assert_eq!(err.kind(), Kind::NoName);
    }

    #[test]
    fn list_of_three() {
        let list = NameList::parse("Alice and Bob and Carol", &Locator::none()).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(0, &Locator::none()).unwrap().last(), ["Alice"]);
        assert_eq!(list.get(2, &Locator::none()).unwrap().last(), ["Carol"]);
    }

    #[test]
    fn embedded_and_inside_braces_does_not_split() {
        let list = NameList::parse("Smith, {and} Jones", &Locator::none()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0, &Locator::none()).unwrap().first(), ["{and}", "Jones"]);
    }

    #[test]
    fn and_requires_whitespace_on_both_sides() {
        let list = NameList::parse("Sandy Beach and Rocky Shore", &Locator::none()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0, &Locator::none()).unwrap().last(), ["Beach"]);
    }

    #[test]
    fn and_is_case_insensitive() {
        let list = NameList::parse("Alice AND Bob And Carol", &Locator::none()).unwrap();
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn out_of_range_index() {
        let list = NameList::parse("Alice", &Locator::none()).unwrap();
        let err = list.get(1, &Locator::none()).unwrap_err();
        assert_eq!(err.kind(), Kind::IllegalValue);
    }
}
