//! String built-ins: concatenation, substrings, case conversion,
//! purification and width measurement.
//!
//! Several of these distinguish *text characters* from markup: braces
//! never count, and a brace group starting with a backslash (a "special
//! character" such as `{\ae}` or `{\'e}`) counts as a single text
//! character and is processed as a unit.

use bstlang::error::{BstError, Kind};
use bstlang::token::Token;
use bstlang::vm::{BuiltIn, Processor};
use bstlang::Result;

pub fn get_concat() -> BuiltIn {
    BuiltIn::new(concat_fn).with_doc("Pop two strings and push their concatenation")
}

pub fn get_add_period() -> BuiltIn {
    BuiltIn::new(add_period_fn)
        .with_doc("Pop a string and push it with a `.` appended, unless it already ends a sentence")
}

pub fn get_change_case() -> BuiltIn {
    BuiltIn::new(change_case_fn)
        .with_doc("Pop a specifier (t, l or u) and a string and push the case-converted string")
}

pub fn get_chr_to_int() -> BuiltIn {
    BuiltIn::new(chr_to_int_fn).with_doc("Pop a one-character string and push its character code")
}

pub fn get_int_to_chr() -> BuiltIn {
    BuiltIn::new(int_to_chr_fn).with_doc("Pop a character code and push the one-character string")
}

pub fn get_int_to_str() -> BuiltIn {
    BuiltIn::new(int_to_str_fn).with_doc("Pop an integer and push its decimal representation")
}

pub fn get_purify() -> BuiltIn {
    BuiltIn::new(purify_fn)
        .with_doc("Pop a string and push it with non-alphanumeric characters removed")
}

pub fn get_quote() -> BuiltIn {
    BuiltIn::new(quote_fn).with_doc("Push the double-quote string")
}

pub fn get_substring() -> BuiltIn {
    BuiltIn::new(substring_fn).with_doc(
        "Pop a length, a start position and a string and push the substring; \
         a negative start counts from the end",
    )
}

pub fn get_text_length() -> BuiltIn {
    BuiltIn::new(text_length_fn).with_doc("Pop a string and push its number of text characters")
}

pub fn get_text_prefix() -> BuiltIn {
    BuiltIn::new(text_prefix_fn)
        .with_doc("Pop a length and a string and push the prefix with that many text characters")
}

pub fn get_width() -> BuiltIn {
    BuiltIn::new(width_fn)
        .with_doc("Pop a string and push its width in thousandths of the design size")
}

fn concat_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let b = p.pop_string(t)?;
    let mut a = p.pop_string(t)?;
    a.push_str(&b);
    p.push(Token::new_string(a, t.locator().clone()));
    Ok(())
}

fn add_period_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let s = p.pop_string(t)?;
    let out = match s.chars().rev().find(|c| *c != '}') {
        None => s,
        Some('.') | Some('?') | Some('!') => s,
        Some(_) => {
            let mut s = s;
            s.push('.');
            s
        }
    };
    p.push(Token::new_string(out, t.locator().clone()));
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CaseMode {
    Title,
    Lower,
    Upper,
}

fn change_case_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let spec = p.pop_string(t)?;
    let s = p.pop_string(t)?;
    let mode = match spec.as_str() {
        "t" | "T" => Some(CaseMode::Title),
        "l" | "L" => Some(CaseMode::Lower),
        "u" | "U" => Some(CaseMode::Upper),
        _ => None,
    };
    let out = match mode {
        Some(mode) => apply_case(&s, mode),
        None => {
            p.warn(
                Some(t.locator()),
                &format!["`{spec}` is not a case-conversion specifier; string left alone"],
            );
            s
        }
    };
    p.push(Token::new_string(out, t.locator().clone()));
    Ok(())
}

// Index of the `}` matching the `{` at `start`, or the string's end if
// the group is unbalanced.
pub(crate) fn group_end(chars: &[char], start: usize) -> usize {
    let mut depth = 0i32;
    for (i, c) in chars.iter().enumerate().skip(start) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => (),
        }
    }
    chars.len()
}

// Whether the brace at `i` opens a special character.
fn opens_special(chars: &[char], i: usize, depth: i32) -> bool {
    depth == 0 && chars[i] == '{' && chars.get(i + 1) == Some(&'\\')
}

fn apply_case(s: &str, mode: CaseMode) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    let mut depth = 0i32;
    // Title conversion keeps the case of the first character and of
    // characters following a colon and white space.
    let mut keep = true;
    let mut colon = false;
    while i < chars.len() {
        let c = chars[i];
        if opens_special(&chars, i, depth) {
            let end = group_end(&chars, i);
            let inner: String = chars[i + 1..end.min(chars.len())].iter().collect();
            let converted = if mode == CaseMode::Title && keep {
                inner
            } else {
                convert_special(&inner, mode)
            };
            out.push('{');
            out.push_str(&converted);
            if end < chars.len() {
                out.push('}');
            }
            i = end + 1;
            keep = false;
            colon = false;
            continue;
        }
        if c == '{' {
            depth += 1;
            out.push(c);
            keep = false;
            colon = false;
            i += 1;
            continue;
        }
        if c == '}' {
            depth = (depth - 1).max(0);
            out.push(c);
            keep = false;
            colon = false;
            i += 1;
            continue;
        }
        if depth > 0 {
            // Braces protect their contents.
            out.push(c);
            i += 1;
            continue;
        }
        match mode {
            CaseMode::Lower => out.extend(c.to_lowercase()),
            CaseMode::Upper => out.extend(c.to_uppercase()),
            CaseMode::Title => {
                if keep {
                    out.push(c);
                } else {
                    out.extend(c.to_lowercase());
                }
            }
        }
        if c == ':' {
            colon = true;
            keep = false;
        } else if c.is_whitespace() {
            keep = colon;
        } else {
            colon = false;
            keep = false;
        }
        i += 1;
    }
    out
}

// Case conversion inside a special character. Title mode converts like
// lower mode here; the keep-position exception is handled by the caller.
fn convert_special(inner: &str, mode: CaseMode) -> String {
    let chars: Vec<char> = inner.chars().collect();
    let mut out = String::with_capacity(inner.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_ascii_alphabetic() {
                j += 1;
            }
            if j > i + 1 {
                let word: String = chars[i + 1..j].iter().collect();
                out.push_str(&convert_control_word(&word, mode));
                i = j;
            } else {
                out.push('\\');
                if let Some(symbol) = chars.get(i + 1) {
                    out.push(*symbol);
                    i += 2;
                } else {
                    i += 1;
                }
            }
        } else {
            match mode {
                CaseMode::Upper => out.extend(c.to_uppercase()),
                _ => out.extend(c.to_lowercase()),
            }
            i += 1;
        }
    }
    out
}

// The foreign-letter control words convert as units; all other control
// words are left alone.
fn convert_control_word(word: &str, mode: CaseMode) -> String {
    match mode {
        CaseMode::Upper => match word {
            "ae" => "\\AE".into(),
            "oe" => "\\OE".into(),
            "aa" => "\\AA".into(),
            "o" => "\\O".into(),
            "l" => "\\L".into(),
            "ss" => "\\SS".into(),
            // The dotless letters have no upper-case control word.
            "i" => "I".into(),
            "j" => "J".into(),
            _ => format!["\\{word}"],
        },
        _ => match word {
            "AE" => "\\ae".into(),
            "OE" => "\\oe".into(),
            "AA" => "\\aa".into(),
            "O" => "\\o".into(),
            "L" => "\\l".into(),
            "SS" => "\\ss".into(),
            _ => format!["\\{word}"],
        },
    }
}

fn chr_to_int_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let s = p.pop_string(t)?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            p.push(Token::new_integer(c as i64, t.locator().clone()));
            Ok(())
        }
        _ => Err(BstError::new(
            Kind::IllegalValue,
            format!["`chr.to.int$` needs a one-character string, found \"{s}\""],
        )
        .with_locator(t.locator())),
    }
}

fn int_to_chr_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let code = p.pop_integer(t)?;
    let c = u32::try_from(code).ok().and_then(char::from_u32);
    match c {
        Some(c) => {
            p.push(Token::new_string(c.to_string(), t.locator().clone()));
            Ok(())
        }
        None => Err(BstError::new(
            Kind::IllegalValue,
            format!["{code} is not a valid character code"],
        )
        .with_locator(t.locator())),
    }
}

fn int_to_str_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let i = p.pop_integer(t)?;
    p.push(Token::new_string(i.to_string(), t.locator().clone()));
    Ok(())
}

// Control words that contribute their letters to a purified string.
fn is_foreign(word: &str) -> bool {
    matches!(
        word,
        "ae" | "AE" | "oe" | "OE" | "aa" | "AA" | "o" | "O" | "l" | "L" | "ss" | "i" | "j"
    )
}

fn purify_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let s = p.pop_string(t)?;
    p.push(Token::new_string(purify(&s), t.locator().clone()));
    Ok(())
}

fn purify(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if opens_special(&chars, i, 0) {
            let end = group_end(&chars, i);
            let mut j = i + 1;
            while j < end.min(chars.len()) {
                let c2 = chars[j];
                if c2 == '\\' {
                    let mut k = j + 1;
                    while k < end && chars[k].is_ascii_alphabetic() {
                        k += 1;
                    }
                    if k > j + 1 {
                        let word: String = chars[j + 1..k].iter().collect();
                        if is_foreign(&word) {
                            out.push_str(&word);
                        }
                        j = k;
                    } else {
                        // Control symbol: dropped with its character.
                        j += 2;
                    }
                } else {
                    if c2.is_alphanumeric() {
                        out.push(c2);
                    }
                    j += 1;
                }
            }
            i = end + 1;
            continue;
        }
        match c {
            c if c.is_alphanumeric() => out.push(c),
            c if c.is_whitespace() => out.push(' '),
            '-' | '~' => out.push(' '),
            _ => (),
        }
        i += 1;
    }
    out
}

fn quote_fn(p: &mut Processor, t: &Token) -> Result<()> {
    p.push(Token::new_string("\"", t.locator().clone()));
    Ok(())
}

fn substring_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let len = p.pop_integer(t)?;
    let start = p.pop_integer(t)?;
    let s = p.pop_string(t)?;
    p.push(Token::new_string(substring(&s, start, len), t.locator().clone()));
    Ok(())
}

// Raw (not text-character) substring extraction. A positive start
// counts from the beginning; a negative start selects the substring
// ending at the |start|-th character from the end.
fn substring(s: &str, start: i64, len: i64) -> String {
    if len <= 0 || start == 0 {
        return String::new();
    }
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len() as i64;
    if start > 0 {
        let begin = start - 1;
        if begin >= n {
            return String::new();
        }
        let end = (begin + len).min(n);
        chars[begin as usize..end as usize].iter().collect()
    } else {
        let end = n + start + 1;
        if end <= 0 {
            return String::new();
        }
        let begin = (end - len).max(0);
        chars[begin as usize..end as usize].iter().collect()
    }
}

fn text_length_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let s = p.pop_string(t)?;
    p.push(Token::new_integer(text_length(&s), t.locator().clone()));
    Ok(())
}

pub(crate) fn text_length(s: &str) -> i64 {
    let chars: Vec<char> = s.chars().collect();
    let mut count = 0i64;
    let mut depth = 0i32;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if opens_special(&chars, i, depth) {
            count += 1;
            i = group_end(&chars, i) + 1;
            continue;
        }
        match c {
            '{' => depth += 1,
            '}' => depth = (depth - 1).max(0),
            _ => count += 1,
        }
        i += 1;
    }
    count
}

fn text_prefix_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let len = p.pop_integer(t)?;
    let s = p.pop_string(t)?;
    p.push(Token::new_string(text_prefix(&s, len), t.locator().clone()));
    Ok(())
}

fn text_prefix(s: &str, len: i64) -> String {
    if len <= 0 {
        return String::new();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::new();
    let mut count = 0i64;
    let mut depth = 0i32;
    let mut i = 0;
    while i < chars.len() && count < len {
        let c = chars[i];
        if opens_special(&chars, i, depth) {
            let end = group_end(&chars, i);
            if end < chars.len() {
                out.extend(&chars[i..=end]);
            } else {
                out.extend(&chars[i..]);
                out.push('}');
            }
            count += 1;
            i = end + 1;
            continue;
        }
        match c {
            '{' => {
                depth += 1;
                out.push(c);
            }
            '}' => {
                depth = (depth - 1).max(0);
                out.push(c);
            }
            _ => {
                out.push(c);
                count += 1;
            }
        }
        i += 1;
    }
    // Balance any braces the cut left open.
    for _ in 0..depth {
        out.push('}');
    }
    out
}

// cmr10 character widths in thousandths of the design size, for the
// printable ASCII range 32..=126.
#[rustfmt::skip]
const WIDTHS: [i64; 95] = [
    278, 278, 500, 833, 500, 833, 778, 278, 389, 389, 500, 778, 278, 333, 278, 500,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 278, 778, 472, 472,
    778, 750, 708, 722, 764, 681, 653, 785, 750, 361, 514, 778, 625, 917, 750, 778,
    681, 778, 736, 556, 722, 750, 750, 1028, 750, 750, 611, 278, 500, 278, 500, 278,
    278, 500, 556, 444, 556, 444, 306, 500, 556, 278, 306, 528, 278, 833, 556, 500,
    556, 528, 392, 394, 389, 556, 528, 722, 528, 528, 444, 500, 1000, 500, 500,
];

fn char_width(c: char) -> i64 {
    let code = c as usize;
    if (32..=126).contains(&code) {
        WIDTHS[code - 32]
    } else {
        0
    }
}

fn width_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let s = p.pop_string(t)?;
    p.push(Token::new_integer(string_width(&s), t.locator().clone()));
    Ok(())
}

fn string_width(s: &str) -> i64 {
    let chars: Vec<char> = s.chars().collect();
    let mut total = 0i64;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if opens_special(&chars, i, 0) {
            let end = group_end(&chars, i);
            let mut j = i + 1;
            while j < end.min(chars.len()) {
                let c2 = chars[j];
                if c2 == '\\' {
                    let mut k = j + 1;
                    while k < end && chars[k].is_ascii_alphabetic() {
                        k += 1;
                    }
                    if k > j + 1 {
                        let word: String = chars[j + 1..k].iter().collect();
                        total += control_word_width(&word);
                        j = k;
                    } else {
                        // Accent symbols have no width of their own.
                        j += 2;
                    }
                } else {
                    if c2 != '{' && c2 != '}' {
                        total += char_width(c2);
                    }
                    j += 1;
                }
            }
            i = end + 1;
            continue;
        }
        if c != '{' && c != '}' {
            total += char_width(c);
        }
        i += 1;
    }
    total
}

// The ligature-like foreign letters have their own cmr10 widths; any
// other control word contributes nothing beyond its argument.
fn control_word_width(word: &str) -> i64 {
    match word {
        "ss" => 500,
        "ae" => 722,
        "oe" => 778,
        "AE" => 903,
        "OE" => 1014,
        _ => 0,
    }
}
