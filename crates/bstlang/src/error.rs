//! Error handling.
//!
//! All failures in the machine are values of the single [BstError] type:
//! a [Kind] saying what went wrong, a human-readable message, and the
//! [Locator] of the offending input where one is known. Errors propagate
//! through `Result` returns; nothing in the crate panics on bad input.
//!
//! The kinds group into four [categories](Category). The distinction
//! matters for callers: a [Category::Internal] error signals a bug in the
//! machine itself, never a problem with the user's program or data.

use crate::token::Locator;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// Malformed input: a bad name string, too many commas, a syntax
    /// error in a bibliography file.
    Syntax,
    /// A personal name with no classifiable last-name token.
    NoName,
    /// A command was constructed or invoked with a value of the wrong
    /// shape, e.g. `ITERATE` without a function token.
    IllegalValue,
    /// A pop was attempted on an empty operand stack.
    StackUnderflow,
    /// An operand had the wrong type for the operation.
    TypeMismatch,
    /// A literal named a function that is not in the symbol table.
    UndefinedFunction,
    /// A declaration re-used a name that is already in the symbol table.
    AlreadyDefined,
    /// An entry-scoped reference was evaluated with no current entry bound.
    NoCurrentEntry,
    /// A required external resource (bibliography source file) is absent
    /// or unreadable.
    Resource,
    /// An internal invariant was violated. Seeing this kind is a bug in
    /// the machine, not an error in the input.
    Internal,
}

/// The coarse taxonomy of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    /// Raised while constructing tokens, names or commands.
    Syntax,
    /// Raised while the machine executes a command.
    Runtime,
    /// Raised while accessing external resources.
    Resource,
    /// Should never happen.
    Internal,
}

impl Kind {
    pub fn category(&self) -> Category {
        match self {
            Kind::Syntax | Kind::NoName | Kind::IllegalValue => Category::Syntax,
            Kind::StackUnderflow
            | Kind::TypeMismatch
            | Kind::UndefinedFunction
            | Kind::AlreadyDefined
            | Kind::NoCurrentEntry => Category::Runtime,
            Kind::Resource => Category::Resource,
            Kind::Internal => Category::Internal,
        }
    }
}

/// An error raised by the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BstError {
    kind: Kind,
    message: String,
    locator: Option<Locator>,
}

impl BstError {
    /// Create a new boxed error.
    ///
    /// The error is boxed immediately because every fallible function in
    /// the crate returns `Result<T, Box<BstError>>`.
    pub fn new<T: Into<String>>(kind: Kind, message: T) -> Box<BstError> {
        Box::new(BstError {
            kind,
            message: message.into(),
            locator: None,
        })
    }

    /// Attach the locator of the offending input.
    pub fn with_locator(mut self: Box<Self>, locator: &Locator) -> Box<BstError> {
        self.locator = Some(locator.clone());
        self
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }
}

#[cfg(feature = "color")]
fn severity(category: Category) -> String {
    use colored::Colorize;
    let tag = match category {
        Category::Internal => "internal error",
        _ => "error",
    };
    tag.red().bold().to_string()
}

#[cfg(not(feature = "color"))]
fn severity(category: Category) -> String {
    match category {
        Category::Internal => "internal error".to_string(),
        _ => "error".to_string(),
    }
}

impl std::fmt::Display for BstError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write![f, "{}: {}", severity(self.category()), self.message]?;
        if let Some(locator) = &self.locator {
            write![f, "\n  --> {locator}"]?;
        }
        Ok(())
    }
}

impl std::error::Error for BstError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(Kind::NoName.category(), Category::Syntax);
        assert_eq!(Kind::StackUnderflow.category(), Category::Runtime);
        assert_eq!(Kind::UndefinedFunction.category(), Category::Runtime);
        assert_eq!(Kind::Resource.category(), Category::Resource);
        assert_eq!(Kind::Internal.category(), Category::Internal);
    }

    #[test]
    fn locator_in_display() {
        let err = BstError::new(Kind::UndefinedFunction, "undefined function `frobnicate`")
            .with_locator(&Locator::new("plain.bst", 41));
        let rendered = err.to_string();
        assert!(rendered.contains("undefined function `frobnicate`"));
        assert!(rendered.contains("plain.bst:41"));
    }
}
