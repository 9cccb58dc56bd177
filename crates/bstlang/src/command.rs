//! The BST command set and the compiled program.
//!
//! A compiled program is a sequence of [declarations](Declaration)
//! (`ENTRY`, `INTEGERS`, `STRINGS`, `FUNCTION`, `MACRO`) interleaved
//! with the five [commands](Command) that drive the machine. The
//! `Display` implementations render the canonical source form, which is
//! relied on for debugging output and test fixtures.

use crate::error::{BstError, Kind};
use crate::token::{Locator, Token, TokenList, Value};
use crate::Result;

/// One of the five top-level commands.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Invoke a function once, with no current entry bound.
    Execute(Token),
    /// Invoke a function once per entry, in database order.
    Iterate(Token),
    /// Invoke a function once per entry, in reverse database order.
    Reverse(Token),
    /// Ingest the declared bibliography source files.
    Read(Locator),
    /// Reorder the entries by their sort keys.
    Sort(Locator),
}

impl Command {
    /// Checked constructor for `EXECUTE`: the argument must be present
    /// and must be a function name.
    pub fn execute(function: Option<Token>, locator: &Locator) -> Result<Command> {
        Ok(Command::Execute(require_function(
            function, "EXECUTE", locator,
        )?))
    }

    /// Checked constructor for `ITERATE`.
    pub fn iterate(function: Option<Token>, locator: &Locator) -> Result<Command> {
        Ok(Command::Iterate(require_function(
            function, "ITERATE", locator,
        )?))
    }

    /// Checked constructor for `REVERSE`.
    pub fn reverse(function: Option<Token>, locator: &Locator) -> Result<Command> {
        Ok(Command::Reverse(require_function(
            function, "REVERSE", locator,
        )?))
    }

    /// The source position of the command, taken from its argument where
    /// it has one.
    pub fn locator(&self) -> &Locator {
        match self {
            Command::Execute(t) | Command::Iterate(t) | Command::Reverse(t) => t.locator(),
            Command::Read(locator) | Command::Sort(locator) => locator,
        }
    }
}

fn require_function(function: Option<Token>, command: &str, locator: &Locator) -> Result<Token> {
    let token = match function {
        Some(token) => token,
        None => {
            return Err(
                BstError::new(Kind::IllegalValue, format!["{command} needs a function"])
                    .with_locator(locator),
            )
        }
    };
    match token.value() {
        Value::Literal(_) => Ok(token),
        _ => Err(BstError::new(
            Kind::IllegalValue,
            format![
                "{command} needs a function name, found {}",
                token.description()
            ],
        )
        .with_locator(token.locator())),
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Execute(t) => write![f, "EXECUTE {{ {t} }}"],
            Command::Iterate(t) => write![f, "ITERATE {{ {t} }}"],
            Command::Reverse(t) => write![f, "REVERSE {{ {t} }}"],
            Command::Read(_) => write![f, "READ"],
            Command::Sort(_) => write![f, "SORT"],
        }
    }
}

/// A declaration: sets up names in the processor's symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Declaration {
    /// `ENTRY {fields}{integer entry variables}{string entry variables}`.
    Entry {
        fields: Vec<Token>,
        integers: Vec<Token>,
        strings: Vec<Token>,
    },
    /// `INTEGERS { ... }`: global integer registers, initialized to zero.
    Integers(Vec<Token>),
    /// `STRINGS { ... }`: global string registers, initialized empty.
    Strings(Vec<Token>),
    /// `FUNCTION {name}{body}`.
    Function { name: Token, body: TokenList },
    /// `MACRO {name}{"value"}`: an abbreviation usable in field values.
    Macro { name: Token, value: Token },
}

fn write_name_block(f: &mut std::fmt::Formatter<'_>, tokens: &[Token]) -> std::fmt::Result {
    write![f, "{{"]?;
    for token in tokens {
        write![f, " {token}"]?;
    }
    write![f, " }}"]
}

impl std::fmt::Display for Declaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Declaration::Entry {
                fields,
                integers,
                strings,
            } => {
                write![f, "ENTRY "]?;
                write_name_block(f, fields)?;
                write![f, " "]?;
                write_name_block(f, integers)?;
                write![f, " "]?;
                write_name_block(f, strings)
            }
            Declaration::Integers(names) => {
                write![f, "INTEGERS "]?;
                write_name_block(f, names)
            }
            Declaration::Strings(names) => {
                write![f, "STRINGS "]?;
                write_name_block(f, names)
            }
            Declaration::Function { name, body } => write![f, "FUNCTION {{ {name} }} {body}"],
            Declaration::Macro { name, value } => write![f, "MACRO {{ {name} }} {{ {value} }}"],
        }
    }
}

/// One item of a compiled program.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Item {
    Declaration(Declaration),
    Command(Command),
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Item::Declaration(d) => d.fmt(f),
            Item::Command(c) => c.fmt(f),
        }
    }
}

/// A compiled BST program: declarations interleaved with commands, in
/// source order. The processor runs the items strictly in this order;
/// later items may depend on the side effects of earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    items: Vec<Item>,
}

impl Program {
    pub fn new() -> Program {
        Default::default()
    }

    pub fn push_declaration(&mut self, declaration: Declaration) -> &mut Program {
        self.items.push(Item::Declaration(declaration));
        self
    }

    pub fn push_command(&mut self, command: Command) -> &mut Program {
        self.items.push(Item::Command(command));
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for item in &self.items {
            writeln![f, "{item}"]?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(name: &str) -> Token {
        Token::new_literal(name, Locator::none())
    }

    #[test]
    fn command_display() {
        assert_eq!(Command::Iterate(lit("f")).to_string(), "ITERATE { f }");
        assert_eq!(
            Command::Reverse(lit("reverse.pass")).to_string(),
            "REVERSE { reverse.pass }"
        );
        assert_eq!(
            Command::Execute(lit("begin.bib")).to_string(),
            "EXECUTE { begin.bib }"
        );
        assert_eq!(Command::Read(Locator::none()).to_string(), "READ");
        assert_eq!(Command::Sort(Locator::none()).to_string(), "SORT");
    }

    #[test]
    fn declaration_display() {
        let d = Declaration::Integers(vec![lit("len"), lit("pos")]);
        assert_eq!(d.to_string(), "INTEGERS { len pos }");

        let d = Declaration::Function {
            name: lit("not"),
            body: vec![
                Token::new_list(
                    TokenList::from(vec![Token::new_integer(0, Locator::none())]),
                    Locator::none(),
                ),
                Token::new_list(
                    TokenList::from(vec![Token::new_integer(1, Locator::none())]),
                    Locator::none(),
                ),
                lit("if$"),
            ]
            .into(),
        };
        assert_eq!(d.to_string(), "FUNCTION { not } { { #0 } { #1 } if$ }");
    }

    #[test]
    fn missing_function_is_rejected() {
        let err = Command::iterate(None, &Locator::none()).unwrap_err();
        assert_eq!(err.kind(), Kind::IllegalValue);

        let err = Command::execute(
            Some(Token::new_integer(3, Locator::none())),
            &Locator::none(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), Kind::IllegalValue);
    }

    #[test]
    fn checked_constructors_accept_names() {
        let command = Command::iterate(Some(lit("call.type$")), &Locator::none()).unwrap();
        assert_eq!(command.to_string(), "ITERATE { call.type$ }");
    }
}
