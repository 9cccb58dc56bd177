//! Source locators for diagnostics.
//!
//! Every token carries a [Locator] naming the resource (usually a file)
//! and line it came from, so that runtime errors can point back at the
//! offending input. Locators are deliberately small: the resource name is
//! reference counted and cloning a locator never copies string data,
//! which matters because tokens are copied onto the operand stack in the
//! interpreter's tight inner loop.

use std::rc::Rc;

/// The source position of a token: a resource name and a line number.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Locator {
    resource: Rc<str>,
    line: u32,
}

impl Locator {
    /// Create a new locator.
    pub fn new<T: AsRef<str>>(resource: T, line: u32) -> Locator {
        Locator {
            resource: resource.as_ref().into(),
            line,
        }
    }

    /// Create a locator pointing at the next line of the same resource.
    pub fn next_line(&self) -> Locator {
        Locator {
            resource: self.resource.clone(),
            line: self.line + 1,
        }
    }

    /// Name of the resource (file) this locator points into.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Line number within the resource, starting at 1.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// A locator for values that have no source position.
    ///
    /// Used for values synthesized by the machine itself and for tokens
    /// constructed programmatically in tests.
    pub fn none() -> Locator {
        Locator {
            resource: "".into(),
            line: 0,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.resource.is_empty() {
            write![f, "<unknown>"]
        } else {
            write![f, "{}:{}", self.resource, self.line]
        }
    }
}
