//! Stack-manipulation built-ins (`duplicate$`, `pop$`, `swap$`,
//! `top$`, `stack$`).
//!
//! `top$` and `stack$` exist for debugging styles; they print through
//! the processor's diagnostics sink.

use bstlang::token::Token;
use bstlang::vm::{BuiltIn, Processor};
use bstlang::Result;

pub fn get_duplicate() -> BuiltIn {
    BuiltIn::new(duplicate_fn).with_doc("Push a copy of the top of the stack")
}

pub fn get_pop() -> BuiltIn {
    BuiltIn::new(pop_fn).with_doc("Discard the top of the stack")
}

pub fn get_swap() -> BuiltIn {
    BuiltIn::new(swap_fn).with_doc("Exchange the top two stack values")
}

pub fn get_top() -> BuiltIn {
    BuiltIn::new(top_fn).with_doc("Pop the top of the stack and print it")
}

pub fn get_stack() -> BuiltIn {
    BuiltIn::new(stack_fn).with_doc("Pop and print the whole stack, top first")
}

fn duplicate_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let top = p.pop(t)?;
    p.push(top.clone());
    p.push(top);
    Ok(())
}

fn pop_fn(p: &mut Processor, t: &Token) -> Result<()> {
    p.pop(t)?;
    Ok(())
}

fn swap_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let first = p.pop(t)?;
    let second = p.pop(t)?;
    p.push(first);
    p.push(second);
    Ok(())
}

fn top_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let top = p.pop(t)?;
    p.log(&top.to_string());
    Ok(())
}

fn stack_fn(p: &mut Processor, _: &Token) -> Result<()> {
    for token in p.take_stack().into_iter().rev() {
        p.log(&token.to_string());
    }
    Ok(())
}
