//! The formatted-output sink.
//!
//! `write$` and `newline$` feed an [OutputSink]; in a full system the
//! sink backs the `.bbl` file writer. The provided [BblWriter] follows
//! BibTeX's line discipline: lines that would exceed [MAX_PRINT_LINE]
//! characters break at the last white space before the limit and
//! continue on the next line with a two-space indent.

/// Column limit for [BblWriter], inherited from BibTeX.
pub const MAX_PRINT_LINE: usize = 79;

/// Where formatted output goes.
pub trait OutputSink {
    /// Append text to the current line.
    fn write(&mut self, text: &str) -> std::io::Result<()>;

    /// End the current line.
    fn newline(&mut self) -> std::io::Result<()>;
}

/// An [OutputSink] that wraps long lines, in the manner of BibTeX's
/// `.bbl` writer.
pub struct BblWriter<W> {
    writer: W,
    line: String,
}

impl<W: std::io::Write> BblWriter<W> {
    pub fn new(writer: W) -> BblWriter<W> {
        BblWriter {
            writer,
            line: String::new(),
        }
    }

    /// Flush any partial final line. Call once after the program has run.
    pub fn finish(&mut self) -> std::io::Result<()> {
        if !self.line.is_empty() {
            self.emit_rest()?;
        }
        self.writer.flush()
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    // Write the buffered line up to the break point and keep the rest,
    // indented, as the new buffer.
    fn break_line(&mut self) -> std::io::Result<()> {
        let chars: Vec<char> = self.line.chars().collect();
        let limit = MAX_PRINT_LINE.min(chars.len() - 1);
        // Spaces inside the continuation indent are not break points;
        // breaking there would make no progress.
        let first_text = chars.iter().position(|c| *c != ' ').unwrap_or(0);
        let break_at = chars[..=limit]
            .iter()
            .enumerate()
            .skip(first_text)
            .filter(|(_, c)| **c == ' ')
            .map(|(i, _)| i)
            .last()
            // No space to break at: break hard at the limit.
            .unwrap_or(MAX_PRINT_LINE);
        let head: String = chars[..break_at].iter().collect();
        let mut rest: String = String::from("  ");
        rest.extend(chars[break_at..].iter().skip_while(|c| **c == ' '));
        writeln![self.writer, "{}", head.trim_end()]?;
        self.line = rest;
        Ok(())
    }

    fn emit_rest(&mut self) -> std::io::Result<()> {
        writeln![self.writer, "{}", self.line]?;
        self.line.clear();
        Ok(())
    }
}

impl<W: std::io::Write> OutputSink for BblWriter<W> {
    fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.line.push_str(text);
        while self.line.chars().count() > MAX_PRINT_LINE {
            self.break_line()?;
        }
        Ok(())
    }

    fn newline(&mut self) -> std::io::Result<()> {
        self.emit_rest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(writer: &BblWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.writer().clone()).unwrap()
    }

    #[test]
    fn short_lines_pass_through() {
        let mut out = BblWriter::new(Vec::new());
        out.write("\\bibitem{knuth84}").unwrap();
        out.newline().unwrap();
        out.write("Donald E. Knuth.").unwrap();
        out.newline().unwrap();
        assert_eq!(written(&out), "\\bibitem{knuth84}\nDonald E. Knuth.\n");
    }

    #[test]
    fn long_lines_break_at_white_space() {
        let mut out = BblWriter::new(Vec::new());
        let words = "word ".repeat(20);
        out.write(&words).unwrap();
        out.newline().unwrap();
        let text = written(&out);
        for line in text.lines() {
            assert!(line.chars().count() <= MAX_PRINT_LINE, "line too long: {line:?}");
        }
        // Continuation lines carry the two-space indent.
        assert!(text.lines().nth(1).unwrap().starts_with("  word"));
    }

    #[test]
    fn unbreakable_text_breaks_hard() {
        let mut out = BblWriter::new(Vec::new());
        out.write(&"x".repeat(2 * MAX_PRINT_LINE)).unwrap();
        out.newline().unwrap();
        let text = written(&out);
        assert!(text.lines().count() >= 2);
    }

    #[test]
    fn finish_flushes_partial_line() {
        let mut out = BblWriter::new(Vec::new());
        out.write("trailing").unwrap();
        out.finish().unwrap();
        assert_eq!(written(&out), "trailing\n");
    }
}
