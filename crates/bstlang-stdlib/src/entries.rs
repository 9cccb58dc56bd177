//! Entry-access built-ins (`cite$`, `type$`, `missing$`, `empty$`,
//! `call.type$`).

use bstlang::token::{Token, Value};
use bstlang::vm::{BuiltIn, Processor};
use bstlang::Result;

pub fn get_cite() -> BuiltIn {
    BuiltIn::new(cite_fn).with_doc("Push the citation key of the current entry")
}

pub fn get_type() -> BuiltIn {
    BuiltIn::new(type_fn).with_doc("Push the type of the current entry, in lower case")
}

pub fn get_missing() -> BuiltIn {
    BuiltIn::new(missing_fn).with_doc("Pop a value and push 1 if it is a missing field")
}

pub fn get_empty() -> BuiltIn {
    BuiltIn::new(empty_fn)
        .with_doc("Pop a value and push 1 if it is a missing field or a white-space-only string")
}

pub fn get_call_type() -> BuiltIn {
    BuiltIn::new(call_type_fn).with_doc(
        "Invoke the function named by the current entry's type, \
         falling back to default.type",
    )
}

fn cite_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let key = p.current_entry(t)?.key().to_string();
    p.push(Token::new_string(key, t.locator().clone()));
    Ok(())
}

fn type_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let entry_type = p.current_entry(t)?.entry_type().to_string();
    p.push(Token::new_string(entry_type, t.locator().clone()));
    Ok(())
}

fn missing_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let top = p.pop(t)?;
    let missing = matches!(top.value(), Value::Missing);
    p.push(Token::new_integer(missing, t.locator().clone()));
    Ok(())
}

fn empty_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let top = p.pop(t)?;
    let empty = match top.value() {
        Value::Missing => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    };
    p.push(Token::new_integer(empty, t.locator().clone()));
    Ok(())
}

fn call_type_fn(p: &mut Processor, t: &Token) -> Result<()> {
    let entry_type = p.current_entry(t)?.entry_type().to_string();
    if p.function(&entry_type).is_some() {
        return p.invoke(&entry_type, t);
    }
    if p.function("default.type").is_some() {
        return p.invoke("default.type", t);
    }
    let key = p.current_entry(t)?.key().to_string();
    p.warn(
        Some(t.locator()),
        &format![
            "no style function for entry type `{entry_type}` (entry `{key}`) \
             and no default.type; skipping"
        ],
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::testing::*;
    use bstlang::command::{Command, Declaration};
    use bstlang::database::{Database, Entry};
    use bstlang::diagnostic::WriterDiagnostics;
    use bstlang::token::Locator;

    fn one_entry_vm(entry_type: &str) -> TestVm {
        let mut db = Database::new();
        let mut diagnostics = WriterDiagnostics::new(Vec::<u8>::new());
        let mut entry = Entry::new(entry_type, "key-1", Locator::none());
        entry.set_field("title", "A Title");
        entry.set_field("note", "   ");
        db.insert(entry, &mut diagnostics);
        TestVm::with_database(db)
    }

    #[test]
    fn cite_and_type() {
        let mut vm = one_entry_vm("Article");
        vm.declare(&Declaration::Function {
            name: lit("probe"),
            body: vec![lit("cite$"), lit("type$"), lit("*")].into(),
        })
        .unwrap();
        vm.run_command(&Command::Iterate(lit("probe"))).unwrap();
        assert_eq!(
            vm.processor.pop_string(&lit("test")).unwrap(),
            "key-1article"
        );
    }

    #[test]
    fn missing_and_empty() {
        let mut vm = one_entry_vm("book");
        vm.declare(&Declaration::Entry {
            fields: vec![lit("title"), lit("note"), lit("editor")],
            integers: vec![],
            strings: vec![],
        })
        .unwrap();
        vm.declare(&Declaration::Function {
            name: lit("probe"),
            body: vec![
                lit("editor"),
                lit("missing$"),
                lit("note"),
                lit("missing$"),
                lit("note"),
                lit("empty$"),
                lit("title"),
                lit("empty$"),
            ]
            .into(),
        })
        .unwrap();
        vm.run_command(&Command::Iterate(lit("probe"))).unwrap();
        let title_empty = vm.processor.pop_integer(&lit("t")).unwrap();
        let note_empty = vm.processor.pop_integer(&lit("t")).unwrap();
        let note_missing = vm.processor.pop_integer(&lit("t")).unwrap();
        let editor_missing = vm.processor.pop_integer(&lit("t")).unwrap();
        assert_eq!(editor_missing, 1);
        assert_eq!(note_missing, 0);
        assert_eq!(note_empty, 1);
        assert_eq!(title_empty, 0);
    }

    #[test]
    fn call_type_prefers_the_type_function() {
        let mut vm = one_entry_vm("article");
        vm.declare(&Declaration::Function {
            name: lit("article"),
            body: vec![string("by type")].into(),
        })
        .unwrap();
        vm.declare(&Declaration::Function {
            name: lit("default.type"),
            body: vec![string("by default")].into(),
        })
        .unwrap();
        vm.run_command(&Command::Iterate(lit("call.type$"))).unwrap();
        assert_eq!(vm.processor.pop_string(&lit("t")).unwrap(), "by type");
    }

    #[test]
    fn call_type_falls_back_to_default_type() {
        let mut vm = one_entry_vm("techreport");
        vm.declare(&Declaration::Function {
            name: lit("default.type"),
            body: vec![string("by default")].into(),
        })
        .unwrap();
        vm.run_command(&Command::Iterate(lit("call.type$"))).unwrap();
        assert_eq!(vm.processor.pop_string(&lit("t")).unwrap(), "by default");
    }

    #[test]
    fn call_type_without_handler_warns_and_continues() {
        let mut vm = one_entry_vm("phdthesis");
        vm.run_command(&Command::Iterate(lit("call.type$"))).unwrap();
        assert_eq!(vm.warning_count(), 1);
        assert!(vm.processor.stack().is_empty());
    }
}
