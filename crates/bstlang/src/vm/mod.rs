//! The Bstlang virtual machine.
//!
//! The [Processor] executes a compiled [Program](crate::command::Program)
//! against a [Database]. It owns the operand stack and the symbol table
//! mapping names to [functions](Function): built-ins, program-defined
//! functions, registers, fields and macros. Tokens never hold handles to
//! mutable cells; they carry only names, and all reads and writes go
//! through the table here.
//!
//! Execution is single threaded and strictly sequential: commands run in
//! program order, and a failing command aborts with a typed error while
//! leaving the side effects of everything already executed in place.
//! Whether the whole run stops is the caller's decision.

use crate::command::{Command, Declaration, Item, Program};
use crate::database::{Database, CROSSREF, SORT_KEY};
use crate::diagnostic::{Diagnostics, WriterDiagnostics};
use crate::error::{BstError, Kind};
use crate::token::{Locator, Token, TokenList, Value};
use crate::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

mod output;
pub use output::{BblWriter, OutputSink, MAX_PRINT_LINE};

/// File system operations the machine may need to perform.
///
/// Extracted to a trait so they can be mocked out in unit tests and in
/// environments without a real file system.
pub trait FileSystem {
    /// Read the entire contents of a file into a string.
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String>;
}

struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// The Rust type of built-in function implementations.
///
/// The token argument is the literal that invoked the built-in; its
/// locator is used in error messages.
pub type BuiltInFn = fn(&mut Processor, &Token) -> Result<()>;

/// A built-in function together with its documentation string.
#[derive(Clone, Copy)]
pub struct BuiltIn {
    f: BuiltInFn,
    doc: Option<&'static str>,
}

impl BuiltIn {
    pub fn new(f: BuiltInFn) -> BuiltIn {
        BuiltIn { f, doc: None }
    }

    /// Set the doc for this built-in.
    pub fn with_doc(mut self, doc: &'static str) -> BuiltIn {
        self.doc = Some(doc);
        self
    }

    pub fn doc(&self) -> Option<&'static str> {
        self.doc
    }
}

impl From<BuiltInFn> for BuiltIn {
    fn from(f: BuiltInFn) -> Self {
        BuiltIn::new(f)
    }
}

/// What a name in the symbol table resolves to.
#[derive(Clone)]
pub enum Function {
    /// A built-in, implemented in Rust.
    BuiltIn(BuiltIn),
    /// A program-defined function: a compiled token list.
    Defined(Rc<TokenList>),
    /// An abbreviation declared with `MACRO`; invoking it pushes its value.
    Macro(String),
    /// A field declared in `ENTRY`; invoking it pushes the current
    /// entry's value, or the missing value.
    Field,
    /// An entry-local integer variable.
    LocalInteger,
    /// An entry-local string variable.
    LocalString,
    /// A global integer register, with its current value.
    Integer(i64),
    /// A global string register, with its current value.
    String(String),
}

impl Function {
    fn description(&self) -> &'static str {
        match self {
            Function::BuiltIn(_) => "a built-in function",
            Function::Defined(_) => "a defined function",
            Function::Macro(_) => "a macro",
            Function::Field => "a field",
            Function::LocalInteger => "an entry integer variable",
            Function::LocalString => "an entry string variable",
            Function::Integer(_) => "an integer register",
            Function::String(_) => "a string register",
        }
    }
}

/// The virtual machine.
pub struct Processor {
    db: Database,
    stack: Vec<Token>,
    functions: HashMap<String, Function>,
    current_entry: Option<usize>,
    call_depth: usize,

    /// File system used by `READ`. Replaceable for tests and embedding.
    pub file_system: Box<dyn FileSystem>,

    /// Sink for warnings and informational output.
    ///
    /// Defaults to standard error.
    pub diagnostics: Rc<RefCell<dyn Diagnostics>>,

    /// Sink for formatted output written by `write$`.
    ///
    /// Defaults to a writer that discards everything; embedders point
    /// this at their `.bbl`-equivalent writer.
    pub output: Rc<RefCell<dyn OutputSink>>,

    /// Upper bound on nested function invocations.
    ///
    /// The language gives recursion no semantics of its own, so the only
    /// limit is a resource one; this makes the limit explicit instead of
    /// overflowing the host stack.
    pub max_call_depth: usize,
}

impl Processor {
    /// Create a new processor over a database, preloaded with the given
    /// built-in functions.
    pub fn new(db: Database, built_ins: HashMap<&str, BuiltIn>) -> Box<Processor> {
        let functions = built_ins
            .into_iter()
            .map(|(name, b)| (name.to_string(), Function::BuiltIn(b)))
            .collect();
        Box::new(Processor {
            db,
            stack: Vec::with_capacity(32),
            functions,
            current_entry: None,
            call_depth: 0,
            file_system: Box::new(RealFileSystem {}),
            diagnostics: Rc::new(RefCell::new(WriterDiagnostics::new(std::io::stderr()))),
            output: Rc::new(RefCell::new(BblWriter::new(std::io::sink()))),
            max_call_depth: 1024,
        })
    }

    /// Run a compiled program from start to finish.
    pub fn run(&mut self, program: &Program) -> Result<()> {
        for item in program.items() {
            match item {
                Item::Declaration(declaration) => self.declare(declaration)?,
                Item::Command(command) => self.run_command(command)?,
            }
        }
        Ok(())
    }

    /// Run a single command.
    pub fn run_command(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Execute(f) => {
                self.current_entry = None;
                let name = function_name(f)?.to_string();
                self.invoke(&name, f)
            }
            Command::Iterate(f) => self.iterate(f, false),
            Command::Reverse(f) => self.iterate(f, true),
            Command::Read(locator) => self.read(locator),
            Command::Sort(_) => {
                self.db.sort();
                Ok(())
            }
        }
    }

    fn iterate(&mut self, f: &Token, reverse: bool) -> Result<()> {
        let name = function_name(f)?.to_string();
        let count = self.db.len();
        let indices: Vec<usize> = if reverse {
            (0..count).rev().collect()
        } else {
            (0..count).collect()
        };
        for index in indices {
            self.current_entry = Some(index);
            let result = self.invoke(&name, f);
            if result.is_err() {
                // Entries already processed keep their side effects.
                self.current_entry = None;
                return result;
            }
        }
        self.current_entry = None;
        Ok(())
    }

    fn read(&mut self, locator: &Locator) -> Result<()> {
        let macros: HashMap<String, String> = self
            .functions
            .iter()
            .filter_map(|(name, f)| match f {
                Function::Macro(value) => Some((name.clone(), value.clone())),
                _ => None,
            })
            .collect();
        let diagnostics = self.diagnostics.clone();
        let mut diagnostics = diagnostics.borrow_mut();
        self.db
            .read(self.file_system.as_ref(), &macros, &mut *diagnostics)
            .map_err(|err| {
                if err.locator().is_none() {
                    err.with_locator(locator)
                } else {
                    err
                }
            })
    }

    /// Register a declaration in the symbol table.
    pub fn declare(&mut self, declaration: &Declaration) -> Result<()> {
        match declaration {
            Declaration::Entry {
                fields,
                integers,
                strings,
            } => {
                for name in fields {
                    self.define(name, Function::Field)?;
                }
                for name in integers {
                    self.define(name, Function::LocalInteger)?;
                }
                for name in strings {
                    self.define(name, Function::LocalString)?;
                }
                // Implicitly declared by every ENTRY.
                self.functions
                    .entry(CROSSREF.to_string())
                    .or_insert(Function::Field);
                self.functions
                    .entry(SORT_KEY.to_string())
                    .or_insert(Function::LocalString);
                Ok(())
            }
            Declaration::Integers(names) => {
                for name in names {
                    self.define(name, Function::Integer(0))?;
                }
                Ok(())
            }
            Declaration::Strings(names) => {
                for name in names {
                    self.define(name, Function::String(String::new()))?;
                }
                Ok(())
            }
            Declaration::Function { name, body } => {
                self.define(name, Function::Defined(Rc::new(body.clone())))
            }
            Declaration::Macro { name, value } => match value.value() {
                Value::String(text) => self.define(name, Function::Macro(text.clone())),
                _ => Err(BstError::new(
                    Kind::IllegalValue,
                    format!["MACRO needs a string value, found {}", value.description()],
                )
                .with_locator(value.locator())),
            },
        }
    }

    fn define(&mut self, name: &Token, function: Function) -> Result<()> {
        let name_str = function_name(name)?;
        if let Some(existing) = self.functions.get(name_str) {
            return Err(BstError::new(
                Kind::AlreadyDefined,
                format![
                    "`{name_str}` is already defined as {}",
                    existing.description()
                ],
            )
            .with_locator(name.locator()));
        }
        self.functions.insert(name_str.to_string(), function);
        Ok(())
    }

    /// Invoke the function with the given name. `caller` locates the
    /// invocation for diagnostics.
    pub fn invoke(&mut self, name: &str, caller: &Token) -> Result<()> {
        if self.call_depth >= self.max_call_depth {
            return Err(BstError::new(
                Kind::Internal,
                format!["function call depth exceeded {}", self.max_call_depth],
            )
            .with_locator(caller.locator()));
        }
        self.call_depth += 1;
        let result = self.invoke_inner(name, caller);
        self.call_depth -= 1;
        result
    }

    fn invoke_inner(&mut self, name: &str, caller: &Token) -> Result<()> {
        let function = match self.functions.get(name) {
            Some(function) => function.clone(),
            None => {
                return Err(BstError::new(
                    Kind::UndefinedFunction,
                    format!["undefined function `{name}`"],
                )
                .with_locator(caller.locator()))
            }
        };
        match function {
            Function::BuiltIn(b) => (b.f)(self, caller),
            Function::Defined(body) => self.execute_list(&body),
            Function::Macro(value) => {
                self.push(Token::new_string(value, caller.locator().clone()));
                Ok(())
            }
            Function::Integer(value) => {
                self.push(Token::new_integer(value, caller.locator().clone()));
                Ok(())
            }
            Function::String(value) => {
                self.push(Token::new_string(value, caller.locator().clone()));
                Ok(())
            }
            Function::Field => {
                let value = {
                    let entry = self.current_entry(caller)?;
                    self.db.resolve_field(entry, name).map(str::to_string)
                };
                match value {
                    Some(value) => self.push(Token::new_string(value, caller.locator().clone())),
                    None => self.push(Token::new_missing(caller.locator().clone())),
                }
                Ok(())
            }
            Function::LocalInteger => {
                let value = self.current_entry(caller)?.integer(name);
                self.push(Token::new_integer(value, caller.locator().clone()));
                Ok(())
            }
            Function::LocalString => {
                let value = self.current_entry(caller)?.string(name).to_string();
                self.push(Token::new_string(value, caller.locator().clone()));
                Ok(())
            }
        }
    }

    /// Execute a token list in order.
    pub fn execute_list(&mut self, list: &TokenList) -> Result<()> {
        for token in list {
            self.execute_token(token)?;
        }
        Ok(())
    }

    /// Execute a single token.
    pub fn execute_token(&mut self, token: &Token) -> Result<()> {
        match token.value() {
            // Value tokens push copies of themselves. Blocks and quoted
            // literals are values too: they only run when popped by a
            // built-in expecting a function.
            Value::Integer(_)
            | Value::String(_)
            | Value::Missing
            | Value::List(_)
            | Value::QuoteLiteral(_) => {
                self.push(token.clone());
                Ok(())
            }
            Value::Literal(name) | Value::FieldRefInteger(name) | Value::FieldRefString(name) => {
                let name = name.clone();
                self.invoke(&name, token)
            }
        }
    }

    /// Execute a function-valued token popped from the stack: a quoted
    /// function name or a block.
    pub fn execute_function_token(&mut self, token: &Token) -> Result<()> {
        match token.value() {
            Value::Literal(name) | Value::QuoteLiteral(name) => {
                let name = name.clone();
                self.invoke(&name, token)
            }
            Value::List(list) => {
                // The token is owned by the caller, not by the machine,
                // so the body can be executed by reference.
                self.execute_list(list)
            }
            _ => Err(BstError::new(
                Kind::TypeMismatch,
                format!["expected a function, found {}", token.description()],
            )
            .with_locator(token.locator())),
        }
    }

    /// Push a value onto the operand stack.
    pub fn push(&mut self, token: Token) {
        self.stack.push(token);
    }

    /// Pop the top of the operand stack.
    pub fn pop(&mut self, caller: &Token) -> Result<Token> {
        match self.stack.pop() {
            Some(token) => Ok(token),
            None => Err(BstError::new(
                Kind::StackUnderflow,
                format!["the stack is empty but `{caller}` needs an argument"],
            )
            .with_locator(caller.locator())),
        }
    }

    /// Pop an integer operand.
    pub fn pop_integer(&mut self, caller: &Token) -> Result<i64> {
        let token = self.pop(caller)?;
        match token.value() {
            Value::Integer(i) => Ok(*i),
            _ => Err(BstError::new(
                Kind::TypeMismatch,
                format!["`{caller}` needs an integer, found {}", token.description()],
            )
            .with_locator(caller.locator())),
        }
    }

    /// Pop a string operand. The missing value reads as the empty string.
    pub fn pop_string(&mut self, caller: &Token) -> Result<String> {
        let token = self.pop(caller)?;
        match token.into_value() {
            Value::String(s) => Ok(s),
            Value::Missing => Ok(String::new()),
            other => Err(BstError::new(
                Kind::TypeMismatch,
                format!["`{caller}` needs a string, found {}", other.description()],
            )
            .with_locator(caller.locator())),
        }
    }

    /// Pop a function-valued operand: a quoted function name or a block.
    pub fn pop_function(&mut self, caller: &Token) -> Result<Token> {
        let token = self.pop(caller)?;
        match token.value() {
            Value::Literal(_) | Value::QuoteLiteral(_) | Value::List(_) => Ok(token),
            _ => Err(BstError::new(
                Kind::TypeMismatch,
                format!["`{caller}` needs a function, found {}", token.description()],
            )
            .with_locator(caller.locator())),
        }
    }

    /// The operand stack, bottom first.
    pub fn stack(&self) -> &[Token] {
        &self.stack
    }

    /// Empty the operand stack, returning its contents bottom first.
    pub fn take_stack(&mut self) -> Vec<Token> {
        std::mem::take(&mut self.stack)
    }

    /// The entry currently bound by `ITERATE`/`REVERSE`.
    pub fn current_entry(&self, caller: &Token) -> Result<&crate::database::Entry> {
        match self.current_entry.and_then(|i| self.db.entry(i)) {
            Some(entry) => Ok(entry),
            None => Err(no_current_entry(caller)),
        }
    }

    /// Mutable access to the current entry, for entry-variable assignment.
    pub fn current_entry_mut(&mut self, caller: &Token) -> Result<&mut crate::database::Entry> {
        match self.current_entry {
            Some(i) => match self.db.entry_mut(i) {
                Some(entry) => Ok(entry),
                None => Err(no_current_entry(caller)),
            },
            None => Err(no_current_entry(caller)),
        }
    }

    /// Whether an entry is currently bound.
    pub fn has_current_entry(&self) -> bool {
        self.current_entry.is_some()
    }

    /// The symbol-table definition of a name, if any.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Assign `value` to the named register or entry variable.
    ///
    /// Used by the `:=` built-in. Fields and functions cannot be
    /// assigned to.
    pub fn assign(&mut self, name: &str, value: Token, caller: &Token) -> Result<()> {
        let target = match self.functions.get_mut(name) {
            Some(target) => target,
            None => {
                return Err(BstError::new(
                    Kind::UndefinedFunction,
                    format!["cannot assign to undefined variable `{name}`"],
                )
                .with_locator(caller.locator()))
            }
        };
        match target {
            Function::Integer(slot) => match value.value() {
                Value::Integer(i) => {
                    *slot = *i;
                    Ok(())
                }
                _ => Err(assign_type_error(name, "an integer", value.description(), caller)),
            },
            Function::String(slot) => match value.into_value() {
                Value::String(s) => {
                    *slot = s;
                    Ok(())
                }
                Value::Missing => {
                    *slot = String::new();
                    Ok(())
                }
                other => Err(assign_type_error(name, "a string", other.description(), caller)),
            },
            Function::LocalInteger => match value.value() {
                Value::Integer(i) => {
                    let i = *i;
                    self.current_entry_mut(caller)?.set_integer(name, i);
                    Ok(())
                }
                _ => Err(assign_type_error(name, "an integer", value.description(), caller)),
            },
            Function::LocalString => match value.into_value() {
                Value::String(s) => {
                    self.current_entry_mut(caller)?.set_string(name, s);
                    Ok(())
                }
                Value::Missing => {
                    self.current_entry_mut(caller)?.set_string(name, "");
                    Ok(())
                }
                other => Err(assign_type_error(name, "a string", other.description(), caller)),
            },
            other => Err(BstError::new(
                Kind::TypeMismatch,
                format!["cannot assign to `{name}`, which is {}", other.description()],
            )
            .with_locator(caller.locator())),
        }
    }

    /// Report a warning through the diagnostics sink.
    pub fn warn(&mut self, locator: Option<&Locator>, message: &str) {
        self.diagnostics.borrow_mut().warn(locator, message);
    }

    /// Write an informational line through the diagnostics sink.
    pub fn log(&mut self, message: &str) {
        self.diagnostics.borrow_mut().log(message);
    }

    /// Append text to the formatted-output sink.
    pub fn write_output(&mut self, text: &str, caller: &Token) -> Result<()> {
        self.output
            .borrow_mut()
            .write(text)
            .map_err(|err| output_error(err, caller))
    }

    /// End the current formatted-output line.
    pub fn output_newline(&mut self, caller: &Token) -> Result<()> {
        self.output
            .borrow_mut()
            .newline()
            .map_err(|err| output_error(err, caller))
    }

    /// The database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut Database {
        &mut self.db
    }
}

fn no_current_entry(caller: &Token) -> Box<BstError> {
    BstError::new(
        Kind::NoCurrentEntry,
        format!["`{caller}` needs a current entry, but none is bound"],
    )
    .with_locator(caller.locator())
}

fn assign_type_error(name: &str, want: &str, found: &str, caller: &Token) -> Box<BstError> {
    BstError::new(
        Kind::TypeMismatch,
        format!["`{name}` holds {want}, cannot assign {found}"],
    )
    .with_locator(caller.locator())
}

fn output_error(err: std::io::Error, caller: &Token) -> Box<BstError> {
    BstError::new(Kind::Resource, format!["cannot write output: {err}"])
        .with_locator(caller.locator())
}

// The name carried by a function-valued token.
fn function_name(token: &Token) -> Result<&str> {
    match token.value() {
        Value::Literal(name) | Value::QuoteLiteral(name) => Ok(name),
        _ => Err(BstError::new(
            Kind::IllegalValue,
            format!["expected a function name, found {}", token.description()],
        )
        .with_locator(token.locator())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Entry;

    fn lit(name: &str) -> Token {
        Token::new_literal(name, Locator::none())
    }

    // A test built-in that pushes the current entry's citation key.
    fn push_key(p: &mut Processor, t: &Token) -> Result<()> {
        let key = p.current_entry(t)?.key().to_string();
        p.push(Token::new_string(key, t.locator().clone()));
        Ok(())
    }

    fn processor_with_entries(keys: &[&str]) -> Box<Processor> {
        let mut db = Database::new();
        let mut diagnostics = WriterDiagnostics::new(Vec::<u8>::new());
        for key in keys {
            db.insert(Entry::new("misc", *key, Locator::none()), &mut diagnostics);
        }
        Processor::new(
            db,
            HashMap::from([("push.key", BuiltIn::new(push_key))]),
        )
    }

    fn popped_strings(p: &mut Processor) -> Vec<String> {
        p.take_stack()
            .into_iter()
            .map(|t| match t.into_value() {
                Value::String(s) => s,
                other => panic!["expected a string, got {other:?}"],
            })
            .collect()
    }

    #[test]
    fn iterate_walks_entries_in_order() {
        let mut p = processor_with_entries(&["a", "b", "c"]);
        p.run_command(&Command::Iterate(lit("push.key"))).unwrap();
        assert_eq!(popped_strings(&mut p), vec!["a", "b", "c"]);
        assert!(!p.has_current_entry());
    }

    #[test]
    fn reverse_walks_entries_back_to_front() {
        let mut p = processor_with_entries(&["a", "b", "c"]);
        p.run_command(&Command::Reverse(lit("push.key"))).unwrap();
        assert_eq!(popped_strings(&mut p), vec!["c", "b", "a"]);
    }

    #[test]
    fn iterate_observes_a_prior_sort() {
        let mut p = processor_with_entries(&["b", "a"]);
        for (i, key) in ["2", "1"].iter().enumerate() {
            p.db_mut()
                .entry_mut(i)
                .unwrap()
                .set_string(SORT_KEY, *key);
        }
        p.run_command(&Command::Sort(Locator::none())).unwrap();
        p.run_command(&Command::Iterate(lit("push.key"))).unwrap();
        assert_eq!(popped_strings(&mut p), vec!["a", "b"]);
    }

    #[test]
    fn execute_binds_no_entry() {
        let mut p = processor_with_entries(&["a"]);
        let err = p.run_command(&Command::Execute(lit("push.key"))).unwrap_err();
        assert_eq!(err.kind(), Kind::NoCurrentEntry);
    }

    #[test]
    fn undefined_function_is_an_error() {
        let mut p = processor_with_entries(&[]);
        let err = p.run_command(&Command::Execute(lit("frobnicate"))).unwrap_err();
        assert_eq!(err.kind(), Kind::UndefinedFunction);
        assert!(err.message().contains("frobnicate"));
    }

    #[test]
    fn pop_on_empty_stack_underflows() {
        let mut p = processor_with_entries(&[]);
        let err = p.pop(&lit("swap$")).unwrap_err();
        assert_eq!(err.kind(), Kind::StackUnderflow);
    }

    #[test]
    fn value_tokens_push_themselves() {
        let mut p = processor_with_entries(&[]);
        let block = Token::new_list(
            TokenList::from(vec![lit("never.run")]),
            Locator::none(),
        );
        p.execute_token(&Token::new_integer(5, Locator::none())).unwrap();
        p.execute_token(&Token::new_quote_literal("push.key", Locator::none()))
            .unwrap();
        // Blocks are values: the undefined name inside is never resolved.
        p.execute_token(&block).unwrap();
        assert_eq!(p.stack().len(), 3);
        assert!(matches!(p.stack()[1].value(), Value::QuoteLiteral(_)));
        assert!(matches!(p.stack()[2].value(), Value::List(_)));
    }

    #[test]
    fn declarations_register_and_reject_duplicates() {
        let mut p = processor_with_entries(&[]);
        p.declare(&Declaration::Integers(vec![lit("len")])).unwrap();
        p.declare(&Declaration::Strings(vec![lit("s")])).unwrap();
        let err = p
            .declare(&Declaration::Integers(vec![lit("len")]))
            .unwrap_err();
        assert_eq!(err.kind(), Kind::AlreadyDefined);

        // Registers read back what was assigned.
        p.assign("len", Token::new_integer(7, Locator::none()), &lit(":="))
            .unwrap();
        p.execute_token(&lit("len")).unwrap();
        assert_eq!(p.pop_integer(&lit("t")).unwrap(), 7);
    }

    #[test]
    fn assignment_is_type_checked() {
        let mut p = processor_with_entries(&[]);
        p.declare(&Declaration::Integers(vec![lit("len")])).unwrap();
        let err = p
            .assign(
                "len",
                Token::new_string("oops", Locator::none()),
                &lit(":="),
            )
            .unwrap_err();
        assert_eq!(err.kind(), Kind::TypeMismatch);

        let err = p
            .assign("ghost", Token::new_integer(0, Locator::none()), &lit(":="))
            .unwrap_err();
        assert_eq!(err.kind(), Kind::UndefinedFunction);
    }

    #[test]
    fn fields_resolve_against_the_current_entry() {
        let mut db = Database::new();
        let mut diagnostics = WriterDiagnostics::new(Vec::<u8>::new());
        let mut with_title = Entry::new("book", "with", Locator::none());
        with_title.set_field("title", "A Title");
        db.insert(with_title, &mut diagnostics);
        db.insert(Entry::new("book", "without", Locator::none()), &mut diagnostics);

        let mut p = Processor::new(
            db,
            HashMap::from([(
                "probe",
                BuiltIn::new(|p: &mut Processor, t: &Token| p.invoke("title", t)),
            )]),
        );
        p.declare(&Declaration::Entry {
            fields: vec![lit("title")],
            integers: vec![],
            strings: vec![],
        })
        .unwrap();
        p.run_command(&Command::Iterate(lit("probe"))).unwrap();
        let stack = p.take_stack();
        assert_eq!(
            *stack[0].value(),
            Value::String("A Title".to_string())
        );
        assert_eq!(*stack[1].value(), Value::Missing);
    }

    #[test]
    fn runaway_recursion_is_stopped() {
        let mut p = processor_with_entries(&[]);
        p.declare(&Declaration::Function {
            name: lit("loop.forever"),
            body: vec![lit("loop.forever")].into(),
        })
        .unwrap();
        let err = p
            .run_command(&Command::Execute(lit("loop.forever")))
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Internal);
    }

    #[test]
    fn macros_push_their_value() {
        let mut p = processor_with_entries(&[]);
        p.declare(&Declaration::Macro {
            name: lit("jan"),
            value: Token::new_string("January", Locator::none()),
        })
        .unwrap();
        p.execute_token(&lit("jan")).unwrap();
        assert_eq!(p.pop_string(&lit("t")).unwrap(), "January");
    }
}
