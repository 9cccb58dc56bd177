//! Comparison and arithmetic built-ins (`>`, `<`, `=`, `+`, `-`).
//!
//! All of these pop their operands in stack order, so the operand pushed
//! first is the left-hand side: `#3 #2 -` leaves `1`.

use bstlang::error::{BstError, Kind};
use bstlang::token::{Token, Value};
use bstlang::vm::{BuiltIn, Processor};
use bstlang::Result;

pub fn get_gt() -> BuiltIn {
    BuiltIn::new(gt_fn).with_doc("Pop two integers and push 1 if the first pushed is greater")
}

pub fn get_lt() -> BuiltIn {
    BuiltIn::new(lt_fn).with_doc("Pop two integers and push 1 if the first pushed is smaller")
}

pub fn get_eq() -> BuiltIn {
    BuiltIn::new(eq_fn).with_doc("Pop two integers or two strings and push 1 if they are equal")
}

pub fn get_plus() -> BuiltIn {
    BuiltIn::new(plus_fn).with_doc("Pop two integers and push their sum")
}

pub fn get_minus() -> BuiltIn {
    BuiltIn::new(minus_fn).with_doc("Pop two integers and push their difference")
}

fn truth(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn gt_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let b = p.pop_integer(t)?;
    let a = p.pop_integer(t)?;
    p.push(Token::new_integer(truth(a > b), t.locator().clone()));
    Ok(())
}

fn lt_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let b = p.pop_integer(t)?;
    let a = p.pop_integer(t)?;
    p.push(Token::new_integer(truth(a < b), t.locator().clone()));
    Ok(())
}

// Equality works on two integers or on two strings; a missing value
// compares like the empty string.
fn eq_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let b = p.pop(t)?;
    let a = p.pop(t)?;
    let equal = match (a.value(), b.value()) {
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::String(_) | Value::Missing, Value::String(_) | Value::Missing) => {
            string_of(&a) == string_of(&b)
        }
        _ => {
            return Err(BstError::new(
                Kind::TypeMismatch,
                format![
                    "`=` needs two integers or two strings, found {} and {}",
                    a.description(),
                    b.description()
                ],
            )
            .with_locator(t.locator()))
        }
    };
    p.push(Token::new_integer(truth(equal), t.locator().clone()));
    Ok(())
}

fn string_of(token: &Token) -> &str {
    match token.value() {
        Value::String(s) => s,
        _ => "",
    }
}

fn plus_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let b = p.pop_integer(t)?;
    let a = p.pop_integer(t)?;
    p.push(Token::new_integer(a + b, t.locator().clone()));
    Ok(())
}

fn minus_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let b = p.pop_integer(t)?;
    let a = p.pop_integer(t)?;
    p.push(Token::new_integer(a - b, t.locator().clone()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use bstlang::error::Kind;

    #[test]
    fn comparisons() {
        let mut vm = TestVm::new();
        assert_eq!(vm.eval_integer(vec![int(3), int(2), lit(">")]), 1);
        assert_eq!(vm.eval_integer(vec![int(2), int(3), lit(">")]), 0);
        assert_eq!(vm.eval_integer(vec![int(2), int(3), lit("<")]), 1);
        assert_eq!(vm.eval_integer(vec![int(5), int(5), lit("=")]), 1);
        assert_eq!(vm.eval_integer(vec![string("a"), string("a"), lit("=")]), 1);
        assert_eq!(vm.eval_integer(vec![string("a"), string("b"), lit("=")]), 0);
    }

    #[test]
    fn arithmetic() {
        let mut vm = TestVm::new();
        assert_eq!(vm.eval_integer(vec![int(3), int(2), lit("-")]), 1);
        assert_eq!(vm.eval_integer(vec![int(3), int(2), lit("+")]), 5);
    }

    #[test]
    fn mixed_equality_is_a_type_error() {
        let mut vm = TestVm::new();
        let err = vm.run(vec![int(1), string("1"), lit("=")]).unwrap_err();
        assert_eq!(err.kind(), Kind::TypeMismatch);
    }

    #[test]
    fn arithmetic_rejects_strings() {
        let mut vm = TestVm::new();
        let err = vm.run(vec![string("x"), int(1), lit("+")]).unwrap_err();
        assert_eq!(err.kind(), Kind::TypeMismatch);
    }
}
