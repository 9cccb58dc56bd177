//! BST tokens: the values manipulated by the virtual machine.
//!
//! A compiled BST program is a tree of [Token]s. The same type doubles
//! as the operand-stack element of the [Processor](crate::vm::Processor):
//! executing a program pushes copies of value tokens onto the stack and
//! pops them back off in built-in functions. Tokens are immutable value
//! objects; all mutation in the language goes through the processor's
//! symbol table, never through a token.

mod locator;
pub use locator::Locator;

/// The value of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// An integer literal (written `#42` in BST source) or a computed integer.
    Integer(i64),

    /// A string literal (written `"text"`) or a computed string.
    String(String),

    /// A bare identifier.
    ///
    /// Executing a literal resolves the name in the symbol table and either
    /// invokes it (built-in or defined function) or pushes its value
    /// (register, macro, field).
    Literal(String),

    /// A quoted identifier, written `'name`.
    ///
    /// Executing a quoted literal pushes the name itself instead of
    /// invoking it. This is how functions are passed as values to
    /// `if$` and `while$`.
    QuoteLiteral(String),

    /// A reference to an integer-typed field or entry-local variable.
    FieldRefInteger(String),

    /// A reference to a string-typed field or entry-local variable.
    FieldRefString(String),

    /// A block, written `{ ... }`: the body of a function or of an
    /// `if$`/`while$` branch.
    ///
    /// Blocks are never executed when encountered in a token list; they
    /// are pushed onto the stack and only run when popped by a built-in
    /// that expects a function argument.
    List(TokenList),

    /// The value of a field reference whose field is absent from the
    /// current entry.
    ///
    /// This value only ever exists on the operand stack; it cannot be
    /// written in a program. `missing$` and `empty$` test for it, and
    /// string operations treat it as the empty string.
    Missing,
}

impl Value {
    /// A short description of the value's type, for error messages.
    pub fn description(&self) -> &'static str {
        match self {
            Value::Integer(_) => "an integer",
            Value::String(_) => "a string",
            Value::Literal(_) => "a function name",
            Value::QuoteLiteral(_) => "a quoted function name",
            Value::FieldRefInteger(_) => "an integer field reference",
            Value::FieldRefString(_) => "a string field reference",
            Value::List(_) => "a block",
            Value::Missing => "a missing field",
        }
    }
}

/// A token: a [Value] plus the [Locator] it came from.
#[derive(Debug, Clone, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    value: Value,
    locator: Locator,
}

// Two tokens are equal if their values are equal; where they came from
// does not matter.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

macro_rules! token_constructor {
    ($name: ident, $variant: ident, $type: ty) => {
        pub fn $name<T: Into<$type>>(v: T, locator: Locator) -> Token {
            Token {
                value: Value::$variant(v.into()),
                locator,
            }
        }
    };
}

impl Token {
    token_constructor!(new_integer, Integer, i64);
    token_constructor!(new_string, String, String);
    token_constructor!(new_literal, Literal, String);
    token_constructor!(new_quote_literal, QuoteLiteral, String);
    token_constructor!(new_field_ref_integer, FieldRefInteger, String);
    token_constructor!(new_field_ref_string, FieldRefString, String);

    pub fn new_list<T: Into<TokenList>>(list: T, locator: Locator) -> Token {
        Token {
            value: Value::List(list.into()),
            locator,
        }
    }

    pub fn new_missing(locator: Locator) -> Token {
        Token {
            value: Value::Missing,
            locator,
        }
    }

    pub fn new_from_value(value: Value, locator: Locator) -> Token {
        Token { value, locator }
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Consume the token and return its value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// A short description of the token's type, for error messages.
    pub fn description(&self) -> &'static str {
        self.value.description()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Value::Integer(i) => write![f, "#{i}"],
            Value::String(s) => write![f, "\"{s}\""],
            Value::Literal(name) => write![f, "{name}"],
            Value::QuoteLiteral(name) => write![f, "'{name}"],
            Value::FieldRefInteger(name) => write![f, "{name}"],
            Value::FieldRefString(name) => write![f, "{name}"],
            Value::List(list) => write![f, "{list}"],
            Value::Missing => write![f, "<missing>"],
        }
    }
}

/// An ordered sequence of tokens: the body of a function or block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenList(Vec<Token>);

impl TokenList {
    pub fn new() -> TokenList {
        TokenList(Vec::new())
    }

    pub fn push(&mut self, token: Token) {
        self.0.push(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.0.iter()
    }
}

impl From<Vec<Token>> for TokenList {
    fn from(tokens: Vec<Token>) -> Self {
        TokenList(tokens)
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::fmt::Display for TokenList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write![f, "{{"]?;
        for token in &self.0 {
            write![f, " {token}"]?;
        }
        write![f, " }}"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(value: Value) -> Token {
        Token {
            value,
            locator: Locator::none(),
        }
    }

    #[test]
    fn display() {
        assert_eq!(t(Value::Integer(42)).to_string(), "#42");
        assert_eq!(t(Value::String("and".into())).to_string(), "\"and\"");
        assert_eq!(t(Value::Literal("format.names".into())).to_string(), "format.names");
        assert_eq!(t(Value::QuoteLiteral("skip$".into())).to_string(), "'skip$");
    }

    #[test]
    fn display_list() {
        let list: TokenList = vec![
            Token::new_literal("author", Locator::none()),
            Token::new_integer(3, Locator::none()),
        ]
        .into();
        assert_eq!(t(Value::List(list)).to_string(), "{ author #3 }");
    }

    #[test]
    fn equality_ignores_locator() {
        let a = Token::new_integer(7, Locator::new("a.bst", 1));
        let b = Token::new_integer(7, Locator::new("b.bst", 99));
        assert_eq!(a, b);
    }
}
