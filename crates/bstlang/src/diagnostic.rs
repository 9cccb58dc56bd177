//! Diagnostics sinks.
//!
//! The machine never prints directly: warnings from `warning$`, the
//! bibliography reader and the sort phase, as well as fatal errors
//! surfaced by a driver, all go through the [Diagnostics] trait. The
//! default implementation writes to standard error; tests and embedders
//! substitute their own sink.

use crate::error::BstError;
use crate::token::Locator;

/// A sink for diagnostic messages.
pub trait Diagnostics {
    /// Report a recoverable problem. Execution continues.
    fn warn(&mut self, locator: Option<&Locator>, message: &str);

    /// Report an error that ends the run. The caller is responsible for
    /// actually stopping; this only records the message.
    fn fatal(&mut self, error: &BstError);

    /// Write an informational line, e.g. from `top$` or `stack$`.
    fn log(&mut self, message: &str);
}

#[cfg(feature = "color")]
fn warning_tag() -> String {
    use colored::Colorize;
    "warning".yellow().bold().to_string()
}

#[cfg(not(feature = "color"))]
fn warning_tag() -> String {
    "warning".to_string()
}

/// A [Diagnostics] implementation that writes to any [std::io::Write],
/// counting warnings as it goes.
pub struct WriterDiagnostics<W> {
    writer: W,
    warnings: usize,
}

impl<W: std::io::Write> WriterDiagnostics<W> {
    pub fn new(writer: W) -> WriterDiagnostics<W> {
        WriterDiagnostics {
            writer,
            warnings: 0,
        }
    }

    /// Number of warnings reported so far.
    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: std::io::Write> Diagnostics for WriterDiagnostics<W> {
    fn warn(&mut self, locator: Option<&Locator>, message: &str) {
        self.warnings += 1;
        // Diagnostics are best effort: a failed write must not take the
        // run down with it.
        let _ = match locator {
            Some(locator) => writeln![self.writer, "{}: {message}\n  --> {locator}", warning_tag()],
            None => writeln![self.writer, "{}: {message}", warning_tag()],
        };
    }

    fn fatal(&mut self, error: &BstError) {
        let _ = writeln![self.writer, "{error}"];
    }

    fn log(&mut self, message: &str) {
        let _ = writeln![self.writer, "{message}"];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_warnings() {
        let mut diagnostics = WriterDiagnostics::new(Vec::<u8>::new());
        diagnostics.warn(None, "empty author field");
        diagnostics.warn(Some(&Locator::new("refs.bib", 7)), "repeated entry");
        assert_eq!(diagnostics.warning_count(), 2);
        let text = String::from_utf8(diagnostics.writer().clone()).unwrap();
        assert!(text.contains("empty author field"));
        assert!(text.contains("refs.bib:7"));
    }
}
