//! # Bstlang: a BibTeX bibliography-style interpreter.
//!
//! This crate implements the virtual machine that executes compiled
//! bibliography-style (BST) programs against a bibliographic database.
//! A BST program is a small stack-based program: declarations set up
//! fields, registers and functions, and the five commands
//! (`EXECUTE`, `ITERATE`, `REVERSE`, `READ`, `SORT`) drive the machine
//! over the database to produce formatted reference-list output.
//!
//! The crate contains only the machine itself: the token model, the
//! personal-name parser, the command set, the entry database and the
//! [Processor](vm::Processor) that executes programs. The built-in
//! function catalogue (`if$`, `format.name$`, and friends) lives in the
//! `bstlang-stdlib` crate; the front end that compiles `.bst` source
//! text into token trees is a separate concern entirely.

pub mod command;
pub mod database;
pub mod diagnostic;
pub mod error;
pub mod name;
pub mod token;
pub mod vm;

/// Module that re-exports the types used by nearly every consumer of the crate.
///
/// This is useful for getting everything in scope in a Rust module:
/// ```
/// use bstlang::prelude::*;
/// ```
pub mod prelude {
    pub use super::command::{Command, Declaration, Item, Program};
    pub use super::database::{Database, Entry};
    pub use super::diagnostic::Diagnostics;
    pub use super::error::{BstError, Kind};
    pub use super::token::{Locator, Token, TokenList, Value};
    pub use super::vm::{BuiltIn, Processor};
}

/// Result type used throughout Bstlang.
///
/// The error is boxed to keep the `Err` variant a single pointer wide;
/// the hot execution loop returns this type from every step.
pub type Result<T> = std::result::Result<T, Box<error::BstError>>;
