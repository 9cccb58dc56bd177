//! Assignment and the capacity constants (`:=`, `global.max$`,
//! `entry.max$`).

use bstlang::error::{BstError, Kind};
use bstlang::token::{Token, Value};
use bstlang::vm::{BuiltIn, Processor};
use bstlang::Result;

/// Capacity reported by `global.max$`.
///
/// BibTeX truncates global string registers at this many characters and
/// styles compare string lengths against it. This machine does not
/// truncate, but reports the conventional limit.
pub const GLOBAL_MAX: i64 = 20000;

/// Capacity reported by `entry.max$`, conventionally BibTeX's entry
/// string limit.
pub const ENTRY_MAX: i64 = 250;

pub fn get_assign() -> BuiltIn {
    BuiltIn::new(assign_fn)
        .with_doc("Pop a quoted variable name and a value and assign the value to the variable")
}

pub fn get_global_max() -> BuiltIn {
    BuiltIn::new(global_max_fn).with_doc("Push the global string capacity")
}

pub fn get_entry_max() -> BuiltIn {
    BuiltIn::new(entry_max_fn).with_doc("Push the entry string capacity")
}

fn assign_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let name_token = p.pop(t)?;
    let name = match name_token.value() {
        Value::QuoteLiteral(name) | Value::Literal(name) => name.clone(),
        _ => {
            return Err(BstError::new(
                Kind::TypeMismatch,
                format![
                    "`:=` needs a quoted variable name, found {}",
                    name_token.description()
                ],
            )
            .with_locator(t.locator()))
        }
    };
    let value = p.pop(t)?;
    p.assign(&name, value, t)
}

fn global_max_fn(p: &mut Processor, t: &Token) -> Result<()> {
    p.push(Token::new_integer(GLOBAL_MAX, t.locator().clone()));
    Ok(())
}

fn entry_max_fn(p: &mut Processor, t: &Token) -> Result<()> {
    p.push(Token::new_integer(ENTRY_MAX, t.locator().clone()));
    Ok(())
}
