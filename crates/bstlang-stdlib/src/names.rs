//! Name built-ins (`num.names$`, `format.name$`).
//!
//! `format.name$` renders one name from a name list under the control of
//! a format string. The format string is a sequence of brace groups,
//! each keyed by one of the part letters `f`, `v`, `l`, `j`: a doubled
//! letter inserts the part's tokens in full, a single letter abbreviates
//! each token to its first name-letter. Text before the letters is a
//! prefix and text after them a suffix, both emitted only when the part
//! is non-empty; a brace group immediately after the letters overrides
//! the default inter-token separator.
//!
//! Default separators follow the discretionary-tie convention: a tie is
//! used before the part's final token and after tokens shorter than
//! three text characters, a space otherwise. A suffix ending in a single
//! `~` becomes a tie only when the group's text is that short; `~~`
//! always yields one literal tie.

use crate::strings::{group_end, text_length};
use bstlang::error::{BstError, Kind};
use bstlang::name::Name;
use bstlang::name::NameList;
use bstlang::token::{Locator, Token};
use bstlang::vm::{BuiltIn, Processor};
use bstlang::Result;

pub fn get_num_names() -> BuiltIn {
    BuiltIn::new(num_names_fn).with_doc("Pop a names string and push the number of names in it")
}

pub fn get_format_name() -> BuiltIn {
    BuiltIn::new(format_name_fn).with_doc(
        "Pop a format string, a name number and a names string \
         and push the formatted name",
    )
}

fn num_names_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let names = p.pop_string(t)?;
    let list = NameList::parse(&names, t.locator())?;
    p.push(Token::new_integer(list.len() as i64, t.locator().clone()));
    Ok(())
}

fn format_name_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let format = p.pop_string(t)?;
    let index = p.pop_integer(t)?;
    let names = p.pop_string(t)?;
    let list = NameList::parse(&names, t.locator())?;
    if index < 1 {
        return Err(BstError::new(
            Kind::IllegalValue,
            format!["name numbers start at 1, got {index}"],
        )
        .with_locator(t.locator()));
    }
    let name = list.get((index - 1) as usize, t.locator())?;
    let out = format_name(name, &format, t.locator())?;
    p.push(Token::new_string(out, t.locator().clone()));
    Ok(())
}

/// Format one parsed name under a format string.
pub fn format_name(name: &Name, format: &str, locator: &Locator) -> Result<String> {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '{' {
            let end = group_end(&chars, i);
            let group = &chars[i + 1..end.min(chars.len())];
            out.push_str(&format_group(name, group, locator)?);
            i = end + 1;
        } else {
            // Text outside the groups is copied verbatim.
            out.push(chars[i]);
            i += 1;
        }
    }
    Ok(out)
}

fn format_group(name: &Name, group: &[char], locator: &Locator) -> Result<String> {
    // Split the group into prefix text, part letter(s), an optional
    // explicit separator, and suffix text.
    let mut pre = String::new();
    let mut key = None;
    let mut i = 0;
    let mut depth = 0i32;
    while i < group.len() {
        let c = group[i];
        match c {
            '{' => {
                depth += 1;
                pre.push(c);
            }
            '}' => {
                depth = (depth - 1).max(0);
                pre.push(c);
            }
            'f' | 'v' | 'l' | 'j' if depth == 0 => {
                key = Some(c);
                break;
            }
            c => pre.push(c),
        }
        i += 1;
    }
    let key = match key {
        Some(key) => key,
        None => {
            let text: String = group.iter().collect();
            return Err(BstError::new(
                Kind::IllegalValue,
                format!["name format group `{{{text}}}` has no part letter"],
            )
            .with_locator(locator));
        }
    };
    let full = group.get(i + 1) == Some(&key);
    i += if full { 2 } else { 1 };
    let mut explicit_sep = None;
    if group.get(i) == Some(&'{') {
        let end = group_end(group, i);
        explicit_sep = Some(group[i + 1..end.min(group.len())].iter().collect::<String>());
        i = end + 1;
    }
    let post: String = group.get(i..).unwrap_or(&[]).iter().collect();

    let tokens = name.part(key);
    if tokens.is_empty() {
        return Ok(String::new());
    }

    let rendered: Vec<String> = if full {
        tokens.to_vec()
    } else {
        tokens.iter().map(|t| abbreviate(t)).collect()
    };

    let mut body = String::new();
    let count = rendered.len();
    for (index, token_text) in rendered.iter().enumerate() {
        body.push_str(token_text);
        if index + 1 == count {
            break;
        }
        match &explicit_sep {
            Some(sep) => body.push_str(sep),
            None => {
                if !full {
                    body.push('.');
                }
                let tie = index + 2 == count || text_length(token_text) < 3;
                body.push(if tie { '~' } else { ' ' });
            }
        }
    }

    let mut text = format!["{pre}{body}{post}"];
    if text.ends_with('~') {
        if text.ends_with("~~") {
            // A double tie in the format means one literal tie.
            text.pop();
        } else if text_length(&text[..text.len() - 1]) >= 3 {
            // A single trailing tie is discretionary: only short groups
            // keep it.
            text.pop();
            text.push(' ');
        }
    }
    Ok(text)
}

// The abbreviation of one name token: the first name-letter of each
// hyphen-separated sub-token, joined with `.-`. A sub-token opening
// with a special character abbreviates to that whole group.
fn abbreviate(token: &str) -> String {
    split_hyphens(token)
        .iter()
        .map(|part| first_name_letter(part))
        .collect::<Vec<String>>()
        .join(".-")
}

fn split_hyphens(token: &str) -> Vec<String> {
    let chars: Vec<char> = token.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    for c in chars {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = (depth - 1).max(0);
                current.push(c);
            }
            '-' if depth == 0 => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn first_name_letter(part: &str) -> String {
    let chars: Vec<char> = part.chars().collect();
    let mut i = 0;
    let mut depth = 0i32;
    while i < chars.len() {
        let c = chars[i];
        if depth == 0 && c == '{' && chars.get(i + 1) == Some(&'\\') {
            let end = group_end(&chars, i);
            return if end < chars.len() {
                chars[i..=end].iter().collect()
            } else {
                chars[i..].iter().collect()
            };
        }
        match c {
            '{' => depth += 1,
            '}' => depth = (depth - 1).max(0),
            c if c.is_alphabetic() => return c.to_string(),
            _ => (),
        }
        i += 1;
    }
    String::new()
}
