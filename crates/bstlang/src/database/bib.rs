//! Reader for BibTeX bibliography (`.bib`) source files.
//!
//! The reader scans for `@` markers, treating everything between entries
//! as junk, and understands the four constructs of the format: regular
//! entries, `@string` abbreviation definitions, `@preamble`, and
//! `@comment`. Field values may be brace- or quote-delimited, bare
//! numbers, or abbreviation names, joined with `#`; the value stored on
//! the entry is the concatenation with runs of white space compressed to
//! single spaces.

use super::{Database, Entry};
use crate::diagnostic::Diagnostics;
use crate::error::{BstError, Kind};
use crate::token::Locator;
use crate::Result;
use std::collections::HashMap;

pub(super) fn read_source(
    resource: &str,
    source: &str,
    db: &mut Database,
    strings: &mut HashMap<String, String>,
    diagnostics: &mut dyn Diagnostics,
) -> Result<()> {
    Reader {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        resource,
        db,
        strings,
        diagnostics,
    }
    .run()
}

struct Reader<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    resource: &'a str,
    db: &'a mut Database,
    strings: &'a mut HashMap<String, String>,
    diagnostics: &'a mut dyn Diagnostics,
}

// Characters that may appear in entry types, field names and
// abbreviation names.
fn is_ident_char(c: char) -> bool {
    !c.is_whitespace()
        && !matches!(
            c,
            '"' | '#' | '%' | '\'' | '(' | ')' | ',' | '=' | '{' | '}' | '@'
        )
}

impl Reader<'_> {
    fn run(mut self) -> Result<()> {
        loop {
            while let Some(c) = self.peek() {
                if c == '@' {
                    break;
                }
                self.bump();
            }
            if self.peek().is_none() {
                return Ok(());
            }
            self.bump();
            self.skip_white();
            let kind = self.ident();
            if kind.is_empty() {
                return Err(self.error("expected an entry type after `@`"));
            }
            match kind.to_lowercase().as_str() {
                // Everything up to the next `@` is junk anyway.
                "comment" => continue,
                "preamble" => self.preamble()?,
                "string" => self.string()?,
                _ => self.entry(&kind)?,
            }
        }
    }

    fn preamble(&mut self) -> Result<()> {
        let close = self.open()?;
        self.skip_white();
        let value = self.value()?;
        self.skip_white();
        self.expect(close)?;
        self.db.append_preamble(&value);
        Ok(())
    }

    fn string(&mut self) -> Result<()> {
        let close = self.open()?;
        self.skip_white();
        let name = self.ident();
        if name.is_empty() {
            return Err(self.error("expected an abbreviation name in `@string`"));
        }
        self.skip_white();
        self.expect('=')?;
        self.skip_white();
        let value = self.value()?;
        self.skip_white();
        self.expect(close)?;
        self.strings.insert(name.to_lowercase(), value);
        Ok(())
    }

    fn entry(&mut self, entry_type: &str) -> Result<()> {
        let close = self.open()?;
        self.skip_white();
        let key = self.key(close);
        if key.is_empty() {
            return Err(self.error("missing citation key"));
        }
        let mut entry = Entry::new(entry_type, key, self.locator());
        loop {
            self.skip_white();
            match self.peek() {
                None => return Err(self.error("bibliography file ended inside an entry")),
                Some(c) if c == close => {
                    self.bump();
                    break;
                }
                Some(',') => {
                    self.bump();
                    self.skip_white();
                    if self.peek() == Some(close) {
                        self.bump();
                        break;
                    }
                    let name = self.ident();
                    if name.is_empty() {
                        return Err(self.error("expected a field name"));
                    }
                    self.skip_white();
                    self.expect('=')?;
                    self.skip_white();
                    let value = self.value()?;
                    entry.set_field(name, value);
                }
                Some(_) => return Err(self.error("expected `,` or the closing delimiter")),
            }
        }
        self.db.insert(entry, &mut *self.diagnostics);
        Ok(())
    }

    // A field value: one or more pieces joined with `#`.
    fn value(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            out.push_str(&self.piece()?);
            self.skip_white();
            if self.peek() == Some('#') {
                self.bump();
                self.skip_white();
            } else {
                break;
            }
        }
        Ok(compress_white(&out))
    }

    fn piece(&mut self) -> Result<String> {
        match self.peek() {
            Some('{') => self.braced(),
            Some('"') => self.quoted(),
            Some(c) if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(c) = self.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    digits.push(c);
                    self.bump();
                }
                Ok(digits)
            }
            Some(c) if is_ident_char(c) => {
                let name = self.ident().to_lowercase();
                match self.strings.get(&name) {
                    Some(value) => Ok(value.clone()),
                    None => {
                        let locator = self.locator();
                        self.diagnostics.warn(
                            Some(&locator),
                            &format!["undefined abbreviation `{name}`; using the empty string"],
                        );
                        Ok(String::new())
                    }
                }
            }
            _ => Err(self.error("expected a field value")),
        }
    }

    fn braced(&mut self) -> Result<String> {
        self.bump();
        let mut out = String::new();
        let mut depth = 1i32;
        loop {
            match self.bump() {
                None => return Err(self.error("bibliography file ended inside a braced value")),
                Some('{') => {
                    depth += 1;
                    out.push('{');
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push('}');
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn quoted(&mut self) -> Result<String> {
        self.bump();
        let mut out = String::new();
        let mut depth = 0i32;
        loop {
            match self.bump() {
                None => return Err(self.error("bibliography file ended inside a quoted value")),
                Some('{') => {
                    depth += 1;
                    out.push('{');
                }
                Some('}') => {
                    depth -= 1;
                    out.push('}');
                }
                Some('"') if depth == 0 => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn open(&mut self) -> Result<char> {
        self.skip_white();
        match self.bump() {
            Some('{') => Ok('}'),
            Some('(') => Ok(')'),
            _ => Err(self.error("expected `{` or `(`")),
        }
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !is_ident_char(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    // Citation keys may contain characters that identifiers may not.
    fn key(&mut self, close: char) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ',' || c == close {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    fn expect(&mut self, want: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            _ => Err(self.error(&format!["expected `{want}`"])),
        }
    }

    fn skip_white(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if let Some(c) = c {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
            }
        }
        c
    }

    fn locator(&self) -> Locator {
        Locator::new(self.resource, self.line)
    }

    fn error(&self, message: &str) -> Box<BstError> {
        BstError::new(Kind::Syntax, message).with_locator(&self.locator())
    }
}

fn compress_white(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_space = false;
    for c in value.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::WriterDiagnostics;

    fn read(source: &str) -> (Database, usize) {
        let mut db = Database::new();
        let mut strings = HashMap::new();
        let mut diagnostics = WriterDiagnostics::new(Vec::<u8>::new());
        read_source("test.bib", source, &mut db, &mut strings, &mut diagnostics).unwrap();
        (db, diagnostics.warning_count())
    }

    #[test]
    fn simple_entry() {
        let (db, warnings) = read(
            r#"@Article{knuth84,
                author = {Donald E. Knuth},
                title  = "Literate programming",
                year   = 1984,
            }"#,
        );
        assert_eq!(warnings, 0);
        let entry = db.get("knuth84").unwrap();
        assert_eq!(entry.entry_type(), "article");
        assert_eq!(entry.field("author"), Some("Donald E. Knuth"));
        assert_eq!(entry.field("title"), Some("Literate programming"));
        assert_eq!(entry.field("year"), Some("1984"));
        assert_eq!(entry.locator().line(), 1);
    }

    #[test]
    fn parenthesized_entry() {
        let (db, _) = read("@book(texbook, title = {The {\\TeX}book})");
        assert_eq!(db.get("texbook").unwrap().field("title"), Some("The {\\TeX}book"));
    }

    #[test]
    fn concatenation_and_abbreviations() {
        let (db, warnings) = read(
            r#"@string{jgg = "Journal of Gnats and Gnus"}
               @article{a, journal = jgg # ", Series~B", volume = 4}"#,
        );
        assert_eq!(warnings, 0);
        let entry = db.get("a").unwrap();
        assert_eq!(entry.field("journal"), Some("Journal of Gnats and Gnus, Series~B"));
    }

    #[test]
    fn undefined_abbreviation_warns() {
        let (db, warnings) = read("@article{a, journal = unknown}");
        assert_eq!(warnings, 1);
        assert_eq!(db.get("a").unwrap().field("journal"), Some(""));
    }

    #[test]
    fn value_white_space_is_compressed() {
        let (db, _) = read("@misc{m, note = {one\n      two\tthree}}");
        assert_eq!(db.get("m").unwrap().field("note"), Some("one two three"));
    }

    #[test]
    fn preamble_accumulates() {
        let (db, _) = read(
            r#"@preamble{"\newcommand{\noop}[1]{}"}
               @preamble{" and more"}"#,
        );
        assert_eq!(db.preamble(), "\\newcommand{\\noop}[1]{} and more");
    }

    #[test]
    fn comments_and_junk_are_skipped() {
        let (db, warnings) = read(
            r#"This line is junk between entries.
               @comment{ anything goes here }
               @misc{only, note = {kept}}"#,
        );
        assert_eq!(warnings, 0);
        assert_eq!(db.len(), 1);
        assert!(db.get("only").is_some());
    }

    #[test]
    fn truncated_entry_is_an_error() {
        let mut db = Database::new();
        let mut strings = HashMap::new();
        let mut diagnostics = WriterDiagnostics::new(Vec::<u8>::new());
        let err = read_source(
            "test.bib",
            "@article{a, title = {unclosed",
            &mut db,
            &mut strings,
            &mut diagnostics,
        )
        .unwrap_err();
        assert_eq!(err.kind(), Kind::Syntax);
        assert_eq!(err.locator().unwrap().resource(), "test.bib");
    }

    #[test]
    fn repeated_key_warns_once() {
        let (db, warnings) = read("@misc{k, note={a}} @misc{k, note={b}}");
        assert_eq!(db.len(), 1);
        assert_eq!(warnings, 1);
        assert_eq!(db.get("k").unwrap().field("note"), Some("a"));
    }
}
