//! The bibliography database: entries and their ordered collection.
//!
//! A [Database] owns the entries read from the configured bibliography
//! source files, in citation (insertion) order, together with a key
//! index for cross-reference resolution. `ITERATE` walks the entries in
//! exactly the order held here, `REVERSE` walks them back to front, and
//! `SORT` replaces the order with one ascending by sort key.
//!
//! The sort is stable: entries whose sort keys compare equal keep their
//! relative input order. Output produced by bibliography styles depends
//! on this tie-breaking, so it is a correctness requirement rather than
//! an implementation detail.

use crate::diagnostic::Diagnostics;
use crate::error::{BstError, Kind};
use crate::token::Locator;
use crate::vm::FileSystem;
use crate::Result;
use std::collections::HashMap;
use std::path::PathBuf;

mod bib;

/// Name of the entry-local string variable holding the sort key.
///
/// The variable is declared implicitly by every `ENTRY` declaration and
/// written by styles with `"..." 'sort.key$ :=` before `SORT`.
pub const SORT_KEY: &str = "sort.key$";

/// Name of the implicitly declared cross-reference field.
pub const CROSSREF: &str = "crossref";

/// One bibliographic record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    entry_type: String,
    key: String,
    fields: HashMap<String, String>,
    integers: HashMap<String, i64>,
    strings: HashMap<String, String>,
    locator: Locator,
}

impl Entry {
    pub fn new<T1: Into<String>, T2: Into<String>>(
        entry_type: T1,
        key: T2,
        locator: Locator,
    ) -> Entry {
        Entry {
            entry_type: entry_type.into().to_lowercase(),
            key: key.into(),
            fields: HashMap::new(),
            integers: HashMap::new(),
            strings: HashMap::new(),
            locator,
        }
    }

    /// The entry's type tag, e.g. `article`. Always lower case.
    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    /// The citation key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// The raw value of a field, or [None] if the entry does not have it.
    ///
    /// This does not follow cross-references; see [Database::resolve_field].
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.as_str())
    }

    pub fn set_field<T1: Into<String>, T2: Into<String>>(&mut self, name: T1, value: T2) {
        self.fields.insert(name.into().to_lowercase(), value.into());
    }

    /// Value of an entry-local integer variable. Unset variables read
    /// as zero, like BibTeX's entry integers.
    pub fn integer(&self, name: &str) -> i64 {
        self.integers.get(name).copied().unwrap_or(0)
    }

    pub fn set_integer<T: Into<String>>(&mut self, name: T, value: i64) {
        self.integers.insert(name.into(), value);
    }

    /// Value of an entry-local string variable. Unset variables read as
    /// the empty string.
    pub fn string(&self, name: &str) -> &str {
        self.strings.get(name).map(|v| v.as_str()).unwrap_or("")
    }

    pub fn set_string<T1: Into<String>, T2: Into<String>>(&mut self, name: T1, value: T2) {
        self.strings.insert(name.into(), value.into());
    }

    /// The sort key, if the program has computed one for this entry.
    pub fn sort_key(&self) -> Option<&str> {
        self.strings.get(SORT_KEY).map(|v| v.as_str())
    }
}

/// The ordered collection of entries plus the key index.
#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Database {
    sources: Vec<PathBuf>,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    preamble: String,
}

impl Database {
    pub fn new() -> Database {
        Default::default()
    }

    /// Declare a bibliography source file to be ingested by `READ`.
    pub fn add_source<P: Into<PathBuf>>(&mut self, path: P) {
        self.sources.push(path.into());
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Ingest every declared source file.
    ///
    /// `macros` holds the abbreviations declared with `MACRO` in the
    /// style program; `@string` definitions encountered while reading
    /// accumulate on top of them and are visible to later sources.
    /// A missing or unreadable source is a fatal error.
    pub fn read(
        &mut self,
        file_system: &dyn FileSystem,
        macros: &HashMap<String, String>,
        diagnostics: &mut dyn Diagnostics,
    ) -> Result<()> {
        let mut strings = macros.clone();
        for i in 0..self.sources.len() {
            let path = self.sources[i].clone();
            let source = file_system.read_to_string(&path).map_err(|err| {
                BstError::new(
                    Kind::Resource,
                    format![
                        "cannot read bibliography source `{}`: {err}",
                        path.display()
                    ],
                )
            })?;
            bib::read_source(
                &path.display().to_string(),
                &source,
                self,
                &mut strings,
                diagnostics,
            )?;
        }
        Ok(())
    }

    /// Add an entry, keeping keys unique.
    ///
    /// A repeated key is reported through `diagnostics` and the new
    /// entry is dropped; the first occurrence wins.
    pub fn insert(&mut self, entry: Entry, diagnostics: &mut dyn Diagnostics) {
        let key = entry.key().to_lowercase();
        if self.index.contains_key(&key) {
            diagnostics.warn(
                Some(entry.locator()),
                &format!["repeated entry `{}`; keeping the first one", entry.key()],
            );
            return;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(entry);
    }

    /// The entries in their current order. This is the live view walked
    /// by `ITERATE` and `REVERSE`; a preceding `SORT` is observed here.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut Entry> {
        self.entries.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by citation key, case-insensitively.
    ///
    /// Returns [None] when there is no such entry. Cross-reference
    /// lookups surface that as a missing value, never as a hard failure;
    /// silent lookup misses are part of the language's compatibility
    /// contract.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.index
            .get(&key.to_lowercase())
            .and_then(|i| self.entries.get(*i))
    }

    /// A field value with cross-reference fallback: if `entry` lacks the
    /// field and has a `crossref` field naming another entry, that
    /// entry's field is consulted.
    pub fn resolve_field<'a>(&'a self, entry: &'a Entry, name: &str) -> Option<&'a str> {
        match entry.field(name) {
            Some(value) => Some(value),
            None if name != CROSSREF => entry
                .field(CROSSREF)
                .and_then(|key| self.get(key))
                .and_then(|parent| parent.field(name)),
            None => None,
        }
    }

    /// Append to the accumulated `@preamble` text.
    pub fn append_preamble(&mut self, text: &str) {
        self.preamble.push_str(text);
    }

    /// The concatenation of all `@preamble` values read so far.
    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Reorder the entries ascending by sort key.
    ///
    /// Entries without a computed sort key sort as if their key were
    /// empty. The sort is stable.
    pub fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| a.sort_key().unwrap_or("").cmp(b.sort_key().unwrap_or("")));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key().to_lowercase(), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::WriterDiagnostics;

    fn entry(key: &str, sort_key: Option<&str>) -> Entry {
        let mut e = Entry::new("article", key, Locator::none());
        if let Some(k) = sort_key {
            e.set_string(SORT_KEY, k);
        }
        e
    }

    fn keys(db: &Database) -> Vec<&str> {
        db.entries().iter().map(|e| e.key()).collect()
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut db = Database::new();
        let mut diagnostics = WriterDiagnostics::new(Vec::<u8>::new());
        db.insert(entry("c", Some("knuth")), &mut diagnostics);
        db.insert(entry("a", Some("aho")), &mut diagnostics);
        db.insert(entry("b1", Some("lamport")), &mut diagnostics);
        db.insert(entry("b2", Some("lamport")), &mut diagnostics);
        db.insert(entry("b3", Some("lamport")), &mut diagnostics);
        db.sort();
        assert_eq!(keys(&db), vec!["a", "c", "b1", "b2", "b3"]);
    }

    #[test]
    fn missing_sort_key_sorts_first() {
        let mut db = Database::new();
        let mut diagnostics = WriterDiagnostics::new(Vec::<u8>::new());
        db.insert(entry("x", Some("zzz")), &mut diagnostics);
        db.insert(entry("y", None), &mut diagnostics);
        db.sort();
        assert_eq!(keys(&db), vec!["y", "x"]);
    }

    #[test]
    fn repeated_key_keeps_first() {
        let mut db = Database::new();
        let mut diagnostics = WriterDiagnostics::new(Vec::<u8>::new());
        let mut first = entry("knuth84", None);
        first.set_field("title", "The TeXbook");
        db.insert(first, &mut diagnostics);
        let mut second = entry("Knuth84", None);
        second.set_field("title", "Impostor");
        db.insert(second, &mut diagnostics);
        assert_eq!(db.len(), 1);
        assert_eq!(db.get("KNUTH84").unwrap().field("title"), Some("The TeXbook"));
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn crossref_fallback() {
        let mut db = Database::new();
        let mut diagnostics = WriterDiagnostics::new(Vec::<u8>::new());
        let mut book = entry("whole-book", None);
        book.set_field("publisher", "Addison-Wesley");
        db.insert(book, &mut diagnostics);
        let mut chapter = entry("chapter-one", None);
        chapter.set_field("crossref", "whole-book");
        db.insert(chapter, &mut diagnostics);

        let chapter = db.get("chapter-one").unwrap();
        assert_eq!(db.resolve_field(chapter, "publisher"), Some("Addison-Wesley"));
        // An unresolvable reference is "not found", not an error.
        assert_eq!(db.resolve_field(chapter, "editor"), None);
    }

    #[test]
    fn entry_defaults() {
        let e = entry("k", None);
        assert_eq!(e.integer("label.length"), 0);
        assert_eq!(e.string("label"), "");
        assert_eq!(e.field("title"), None);
        assert_eq!(e.sort_key(), None);
    }
}
