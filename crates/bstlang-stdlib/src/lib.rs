//! # The Bstlang standard library
//!
//! This crate implements the standard BST built-in functions: the fixed
//! catalogue that bibliography styles program against, from arithmetic
//! and string surgery through `format.name$` to the output built-ins.
//! Each module contributes `get_*` constructors returning
//! [BuiltIn](bstlang::vm::BuiltIn) values; [built_ins] assembles the
//! whole catalogue for handing to
//! [Processor::new](bstlang::vm::Processor::new).

use bstlang::vm::BuiltIn;
use std::collections::HashMap;

pub mod arith;
pub mod control;
pub mod entries;
pub mod names;
pub mod output;
pub mod registers;
pub mod stack;
pub mod strings;
pub mod testing;

/// The complete standard built-in catalogue.
pub fn built_ins() -> HashMap<&'static str, BuiltIn> {
    HashMap::from([
        (">", arith::get_gt()),
        ("<", arith::get_lt()),
        ("=", arith::get_eq()),
        ("+", arith::get_plus()),
        ("-", arith::get_minus()),
        ("*", strings::get_concat()),
        (":=", registers::get_assign()),
        //
        ("add.period$", strings::get_add_period()),
        ("call.type$", entries::get_call_type()),
        ("change.case$", strings::get_change_case()),
        ("chr.to.int$", strings::get_chr_to_int()),
        ("cite$", entries::get_cite()),
        ("duplicate$", stack::get_duplicate()),
        ("empty$", entries::get_empty()),
        ("entry.max$", registers::get_entry_max()),
        ("format.name$", names::get_format_name()),
        ("global.max$", registers::get_global_max()),
        ("if$", control::get_if()),
        ("int.to.chr$", strings::get_int_to_chr()),
        ("int.to.str$", strings::get_int_to_str()),
        ("missing$", entries::get_missing()),
        ("newline$", output::get_newline()),
        ("num.names$", names::get_num_names()),
        ("pop$", stack::get_pop()),
        ("preamble$", output::get_preamble()),
        ("purify$", strings::get_purify()),
        ("quote$", strings::get_quote()),
        ("skip$", control::get_skip()),
        ("stack$", stack::get_stack()),
        ("substring$", strings::get_substring()),
        ("swap$", stack::get_swap()),
        ("text.length$", strings::get_text_length()),
        ("text.prefix$", strings::get_text_prefix()),
        ("top$", stack::get_top()),
        ("type$", entries::get_type()),
        ("warning$", output::get_warning()),
        ("while$", control::get_while()),
        ("width$", strings::get_width()),
        ("write$", output::get_write()),
    ])
}
