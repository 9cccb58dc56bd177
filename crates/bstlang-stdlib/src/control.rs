//! Control-flow built-ins (`if$`, `while$`, `skip$`).

use bstlang::token::Token;
use bstlang::vm::{BuiltIn, Processor};
use bstlang::Result;

pub fn get_if() -> BuiltIn {
    BuiltIn::new(if_fn).with_doc(
        "Pop an else function, a then function and an integer; \
         run the then function if the integer is non-zero",
    )
}

pub fn get_while() -> BuiltIn {
    BuiltIn::new(while_fn).with_doc(
        "Pop a body function and a condition function; \
         run the body as long as the condition leaves a non-zero integer",
    )
}

pub fn get_skip() -> BuiltIn {
    BuiltIn::new(skip_fn).with_doc("Do nothing")
}

// The pop order is the reverse of the reading order: a program pushes
// the condition, then the then-function, then the else-function.
fn if_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let else_function = p.pop_function(t)?;
    let then_function = p.pop_function(t)?;
    let condition = p.pop_integer(t)?;
    if condition != 0 {
        p.execute_function_token(&then_function)
    } else {
        p.execute_function_token(&else_function)
    }
}

fn while_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let body = p.pop_function(t)?;
    let condition = p.pop_function(t)?;
    loop {
        p.execute_function_token(&condition)?;
        if p.pop_integer(t)? == 0 {
            return Ok(());
        }
        p.execute_function_token(&body)?;
    }
}

fn skip_fn(_: &mut Processor, _: &Token) -> Result<()> {
    Ok(())
}
