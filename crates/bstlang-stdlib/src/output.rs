//! Output built-ins (`write$`, `newline$`, `warning$`, `preamble$`).
//!
//! `write$` appends to the processor's formatted-output sink; in a full
//! system that sink is the `.bbl` writer. `warning$` goes to the
//! diagnostics sink instead and never touches the formatted output.

use bstlang::token::Token;
use bstlang::vm::{BuiltIn, Processor};
use bstlang::Result;

pub fn get_write() -> BuiltIn {
    BuiltIn::new(write_fn).with_doc("Pop a string and append it to the formatted output")
}

pub fn get_newline() -> BuiltIn {
    BuiltIn::new(newline_fn).with_doc("End the current formatted-output line")
}

pub fn get_warning() -> BuiltIn {
    BuiltIn::new(warning_fn).with_doc("Pop a string and report it as a warning")
}

pub fn get_preamble() -> BuiltIn {
    BuiltIn::new(preamble_fn).with_doc("Push the concatenation of the @preamble values")
}

fn write_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let text = p.pop_string(t)?;
    p.write_output(&text, t)
}

fn newline_fn(p: &mut Processor, t: &Token) -> Result<()> {
    p.output_newline(t)
}

fn warning_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let message = p.pop_string(t)?;
    p.warn(Some(t.locator()), &message);
    Ok(())
}

fn preamble_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let preamble = p.db().preamble().to_string();
    p.push(Token::new_string(preamble, t.locator().clone()));
    Ok(())
}
