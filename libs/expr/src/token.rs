//! Token types for the expression lexer
//!
//! Tokens represent the lexical elements of expressions.

/// Token types for the expression lexer
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum TokenType {
    // Literals
    StringLiteral,
    IntegerLiteral,
    FloatLiteral,

    // Identifiers
    Identifier,

    // Keywords
    True,
    False,
    Null,
    Is,
    Not,
    In,
    And,
    Or,
    Implies,
    As,
    TypeName, // int, uint, float, string, bool

    // Operators
    Dot,                // .
    OpenBracket,        // [
    CloseBracket,       // ]
    Bang,               // !
    Tilde,              // ~
    Plus,               // +
    Minus,              // -
    Power,              // **
    Star,               // *
    Slash,              // /
    FloorSlash,         // //
    Percent,            // %
    AmpAmp,             // &&
    PipePipe,           // ||
    Iff,                // <->
    ShiftLeft,          // <<
    ShiftRight,         // >>
    Amp,                // &
    Caret,              // ^
    Pipe,               // |
    LessThanOrEqual,    // <=
    LessThan,           // <
    GreaterThan,        // >
    GreaterThanOrEqual, // >=
    EqualEqual,         // ==
    NotEqual,           // !=
    Question,           // ?
    Colon,              // :
    Elvis,              // ?:
    Coalesce,           // ??

    // Delimiters
    OpenParen,  // (
    CloseParen, // )
    Comma,      // ,

    // End of input
    Eof,

    // Error
    Error, // For lexical errors
}

/// A token in an expression
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    /// Decoded text: identifier name, literal source or unescaped string.
    pub value: String,
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: String,
        position: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            token_type,
            value,
            position,
            line,
            column,
        }
    }

    pub fn eof(position: usize, line: usize, column: usize) -> Self {
        Self {
            token_type: TokenType::Eof,
            value: String::new(),
            position,
            line,
            column,
        }
    }

    pub fn error(message: String, position: usize, line: usize, column: usize) -> Self {
        Self {
            token_type: TokenType::Error,
            value: message,
            position,
            line,
            column,
        }
    }

    /// Text to show for this token in parse errors.
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Eof => "end of input".to_string(),
            TokenType::StringLiteral => format!("string {:?}", self.value),
            _ => format!("'{}'", self.value),
        }
    }
}
