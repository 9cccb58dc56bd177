//! Utilities for writing unit tests.
//!
//! Programs reach the machine as constructed token trees, so tests need
//! compact ways to build tokens and to observe what a run produced. The
//! helpers here provide both: token constructors with dummy locators, a
//! [TestVm] that captures diagnostics and formatted output in memory,
//! and an in-memory [FileSystem] for exercising `READ`.

use bstlang::database::Database;
use bstlang::diagnostic::WriterDiagnostics;
use bstlang::token::{Locator, Token, TokenList};
use bstlang::vm::{BblWriter, FileSystem, Processor};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// An integer token with a dummy locator.
pub fn int(i: i64) -> Token {
    Token::new_integer(i, Locator::none())
}

/// A string token with a dummy locator.
pub fn string(s: &str) -> Token {
    Token::new_string(s, Locator::none())
}

/// A literal (function-name) token with a dummy locator.
pub fn lit(name: &str) -> Token {
    Token::new_literal(name, Locator::none())
}

/// A quoted literal token with a dummy locator.
pub fn quote(name: &str) -> Token {
    Token::new_quote_literal(name, Locator::none())
}

/// A block token with a dummy locator.
pub fn block(tokens: Vec<Token>) -> Token {
    Token::new_list(TokenList::from(tokens), Locator::none())
}

/// An in-memory [FileSystem] for `READ` tests.
#[derive(Default)]
pub struct MapFileSystem {
    files: HashMap<PathBuf, String>,
}

impl MapFileSystem {
    pub fn new() -> MapFileSystem {
        Default::default()
    }

    pub fn add<P: Into<PathBuf>, T: Into<String>>(mut self, path: P, contents: T) -> MapFileSystem {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl FileSystem for MapFileSystem {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        match self.files.get(path) {
            Some(contents) => Ok(contents.clone()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!["no such file: {}", path.display()],
            )),
        }
    }
}

/// A processor wired up for unit tests: the standard catalogue is
/// preloaded, and diagnostics and formatted output are captured in
/// memory for inspection.
pub struct TestVm {
    pub processor: Box<Processor>,
    diagnostics: Rc<RefCell<WriterDiagnostics<Vec<u8>>>>,
    output: Rc<RefCell<BblWriter<Vec<u8>>>>,
}

impl TestVm {
    pub fn new() -> TestVm {
        TestVm::with_database(Database::new())
    }

    pub fn with_database(db: Database) -> TestVm {
        let diagnostics = Rc::new(RefCell::new(WriterDiagnostics::new(Vec::new())));
        let output = Rc::new(RefCell::new(BblWriter::new(Vec::new())));
        let mut processor = Processor::new(db, crate::built_ins());
        processor.diagnostics = diagnostics.clone();
        processor.output = output.clone();
        TestVm {
            processor,
            diagnostics,
            output,
        }
    }

    /// Execute a sequence of tokens as if it were a function body.
    pub fn run(&mut self, tokens: Vec<Token>) -> bstlang::Result<()> {
        self.processor.execute_list(&tokens.into())
    }

    /// Execute tokens and pop the resulting integer.
    pub fn eval_integer(&mut self, tokens: Vec<Token>) -> i64 {
        self.run(tokens).unwrap();
        self.processor.pop_integer(&lit("test")).unwrap()
    }

    /// Execute tokens and pop the resulting string.
    pub fn eval_string(&mut self, tokens: Vec<Token>) -> String {
        self.run(tokens).unwrap();
        self.processor.pop_string(&lit("test")).unwrap()
    }

    /// Number of warnings reported so far.
    pub fn warning_count(&self) -> usize {
        self.diagnostics.borrow().warning_count()
    }

    /// Everything written to the diagnostics sink.
    pub fn diagnostic_text(&self) -> String {
        String::from_utf8(self.diagnostics.borrow().writer().clone()).unwrap()
    }

    /// Everything written to the formatted-output sink, including any
    /// partial final line.
    pub fn output_text(&self) -> String {
        let mut output = self.output.borrow_mut();
        output.finish().unwrap();
        String::from_utf8(output.writer().clone()).unwrap()
    }
}

impl Default for TestVm {
    fn default() -> Self {
        TestVm::new()
    }
}

impl std::ops::Deref for TestVm {
    type Target = Processor;

    fn deref(&self) -> &Processor {
        &self.processor
    }
}

impl std::ops::DerefMut for TestVm {
    fn deref_mut(&mut self) -> &mut Processor {
        &mut self.processor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_helpers() {
        let mut vm = TestVm::new();
        assert_eq!(vm.eval_integer(vec![int(1), int(2), lit("+")]), 3);
        assert_eq!(vm.eval_string(vec![string("a"), string("b"), lit("*")]), "ab");
    }

    #[test]
    fn map_file_system() {
        let fs = MapFileSystem::new().add("a.bib", "@misc{m,}");
        assert!(fs.read_to_string(Path::new("a.bib")).is_ok());
        assert!(fs.read_to_string(Path::new("b.bib")).is_err());
    }
}
