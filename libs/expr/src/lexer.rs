//! Expression lexer - tokenizes input strings
//!
//! Converts expression source into a stream of tokens. Lexical problems do
//! not stop the lexer: each one becomes an error token, which
//! [`Lexer::tokenize`] turns into a [`Diagnostic`] before carrying on with
//! the rest of the input.

use phf::phf_map;

use crate::error::Diagnostic;
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "true" => TokenType::True,
    "false" => TokenType::False,
    "null" => TokenType::Null,
    "is" => TokenType::Is,
    "not" => TokenType::Not,
    "in" => TokenType::In,
    "and" => TokenType::And,
    "or" => TokenType::Or,
    "implies" => TokenType::Implies,
    "as" => TokenType::As,
    "int" => TokenType::TypeName,
    "uint" => TokenType::TypeName,
    "float" => TokenType::TypeName,
    "string" => TokenType::TypeName,
    "bool" => TokenType::TypeName,
};

/// Whether `name` is reserved and therefore cannot name a member or function.
/// Type names are contextual: `int(x)` and `a.string` remain usable.
pub fn is_keyword(name: &str) -> bool {
    matches!(KEYWORDS.get(name), Some(t) if *t != TokenType::TypeName)
}

/// The expression lexer
pub struct Lexer {
    position: usize,
    line: usize,
    column: usize,
    chars: Vec<char>,
    current_char: Option<char>,
    /// Type of the last token produced, used to tell `a.5` from `.5`.
    previous: Option<TokenType>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            position: 0,
            line: 1,
            column: 1,
            chars,
            current_char,
            previous: None,
        }
    }

    /// Tokenize the whole input. The token list always ends with `Eof`;
    /// error tokens are moved out into the diagnostics list.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        let mut diagnostics = Vec::new();
        loop {
            let token = self.next_token();
            match token.token_type {
                TokenType::Error => diagnostics.push(Diagnostic {
                    message: token.value,
                    line: token.line,
                    column: token.column,
                }),
                TokenType::Eof => {
                    tokens.push(token);
                    break;
                }
                _ => tokens.push(token),
            }
        }
        (tokens, diagnostics)
    }

    /// Advance to the next character
    fn advance(&mut self) {
        if let Some(c) = self.current_char {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += 1;
        self.current_char = self.chars.get(self.position).copied();
    }

    /// Peek `offset` characters past the current one
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(1)
    }

    /// Skip whitespace and `#` line comments
    fn skip_trivia(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                self.advance();
            } else if c == '#' {
                while let Some(c) = self.current_char {
                    self.advance();
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while let Some(c) = self.current_char {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.chars[start..self.position].iter().collect()
    }

    fn read_digits(&mut self, radix: u32) -> usize {
        let mut count = 0;
        while let Some(c) = self.current_char {
            if c.is_digit(radix) {
                self.advance();
                count += 1;
            } else {
                break;
            }
        }
        count
    }

    /// Read an integer or float literal. The token value is the literal's
    /// source text; the parser converts it.
    fn read_number(&mut self) -> Result<(String, TokenType), String> {
        let start = self.position;

        if self.current_char == Some('0') {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance(); // Skip '0'
                self.advance(); // Skip prefix letter
                if self.read_digits(radix) == 0 {
                    let text: String = self.chars[start..self.position].iter().collect();
                    return Err(format!("malformed integer literal '{}'", text));
                }
                let text = self.chars[start..self.position].iter().collect();
                return Ok((text, TokenType::IntegerLiteral));
            }
        }

        let mut is_float = false;
        self.read_digits(10);

        // Fraction, only when digits follow the dot
        if self.current_char == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance(); // Skip '.'
            self.read_digits(10);
        }

        // Exponent, only when it is well formed
        if matches!(self.current_char, Some('e' | 'E')) {
            let digits_at = match self.peek() {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_at(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digits_at {
                    self.advance();
                }
                self.read_digits(10);
            }
        }

        let text = self.chars[start..self.position].iter().collect();
        let token_type = if is_float {
            TokenType::FloatLiteral
        } else {
            TokenType::IntegerLiteral
        };
        Ok((text, token_type))
    }

    /// Read a single, double or triple quoted string literal, decoding escapes.
    fn read_string(&mut self) -> Result<String, String> {
        let Some(quote) = self.current_char else {
            return Err("unterminated string literal".into());
        };
        let triple = self.peek() == Some(quote) && self.peek_at(2) == Some(quote);
        let delimiter_len = if triple { 3 } else { 1 };
        for _ in 0..delimiter_len {
            self.advance();
        }

        let mut value = String::new();
        let mut problem: Option<String> = None;

        loop {
            let Some(c) = self.current_char else {
                return Err(problem.unwrap_or_else(|| "unterminated string literal".into()));
            };

            if c == quote {
                let closes = !triple
                    || (self.peek() == Some(quote) && self.peek_at(2) == Some(quote));
                if closes {
                    for _ in 0..delimiter_len {
                        self.advance();
                    }
                    break;
                }
                value.push(c);
                self.advance();
            } else if c == '\n' && !triple {
                return Err("unterminated string literal".into());
            } else if c == '\\' {
                self.advance(); // Skip backslash
                match self.read_escape() {
                    Ok(decoded) => value.push(decoded),
                    Err(message) => {
                        problem.get_or_insert(message);
                    }
                }
            } else {
                value.push(c);
                self.advance();
            }
        }

        match problem {
            Some(message) => Err(message),
            None => Ok(value),
        }
    }

    /// Decode one escape sequence; the backslash is already consumed.
    fn read_escape(&mut self) -> Result<char, String> {
        let Some(escaped) = self.current_char else {
            return Err("incomplete escape sequence".into());
        };
        self.advance();

        match escaped {
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            '0' => Ok('\0'),
            '\\' | '\'' | '"' => Ok(escaped),
            'x' => {
                let code = self.read_hex(2, 2)?;
                u8::try_from(code)
                    .map(char::from)
                    .map_err(|_| format!("invalid byte escape {:#x}", code))
            }
            'u' => {
                let code = if self.current_char == Some('{') {
                    self.advance(); // Skip '{'
                    let code = self.read_hex(1, 6)?;
                    if self.current_char != Some('}') {
                        return Err("unterminated unicode escape".into());
                    }
                    self.advance(); // Skip '}'
                    code
                } else {
                    self.read_hex(4, 4)?
                };
                char::from_u32(code).ok_or_else(|| format!("invalid unicode character {:#x}", code))
            }
            other => Err(format!("invalid escape sequence '\\{}'", other)),
        }
    }

    fn read_hex(&mut self, min: usize, max: usize) -> Result<u32, String> {
        let mut code = 0u32;
        let mut count = 0;
        while count < max {
            match self.current_char.and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    code = code * 16 + digit;
                    count += 1;
                    self.advance();
                }
                None => break,
            }
        }
        if count < min {
            return Err("invalid hexadecimal escape".into());
        }
        Ok(code)
    }

    /// Whether a `.` at this point starts a float such as `.5` rather than
    /// a member access such as `items.0`.
    fn dot_starts_number(&self) -> bool {
        let after_operand = matches!(
            self.previous,
            Some(
                TokenType::Identifier
                    | TokenType::TypeName
                    | TokenType::CloseParen
                    | TokenType::CloseBracket
                    | TokenType::StringLiteral
                    | TokenType::IntegerLiteral
                    | TokenType::FloatLiteral
                    | TokenType::True
                    | TokenType::False
                    | TokenType::Null
                    | TokenType::Star
            )
        );
        !after_operand && self.peek().is_some_and(|c| c.is_ascii_digit())
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        let token = self.scan();
        if token.token_type != TokenType::Error {
            self.previous = Some(token.token_type);
        }
        token
    }

    fn scan(&mut self) -> Token {
        self.skip_trivia();

        let position = self.position;
        let line = self.line;
        let column = self.column;

        let Some(c) = self.current_char else {
            return Token::eof(position, line, column);
        };

        // Operators, longest match first
        let operators: &[(&str, TokenType)] = &[
            ("<->", TokenType::Iff),
            ("**", TokenType::Power),
            ("//", TokenType::FloorSlash),
            ("&&", TokenType::AmpAmp),
            ("||", TokenType::PipePipe),
            ("<<", TokenType::ShiftLeft),
            (">>", TokenType::ShiftRight),
            ("<=", TokenType::LessThanOrEqual),
            (">=", TokenType::GreaterThanOrEqual),
            ("==", TokenType::EqualEqual),
            ("!=", TokenType::NotEqual),
            ("?:", TokenType::Elvis),
            ("??", TokenType::Coalesce),
        ];
        for (text, token_type) in operators {
            if self.starts_with(text) {
                for _ in 0..text.chars().count() {
                    self.advance();
                }
                return Token::new(*token_type, (*text).into(), position, line, column);
            }
        }

        let single = match c {
            '.' if self.dot_starts_number() => None,
            '.' => Some(TokenType::Dot),
            '[' => Some(TokenType::OpenBracket),
            ']' => Some(TokenType::CloseBracket),
            '(' => Some(TokenType::OpenParen),
            ')' => Some(TokenType::CloseParen),
            ',' => Some(TokenType::Comma),
            '!' => Some(TokenType::Bang),
            '~' => Some(TokenType::Tilde),
            '+' => Some(TokenType::Plus),
            '-' => Some(TokenType::Minus),
            '*' => Some(TokenType::Star),
            '/' => Some(TokenType::Slash),
            '%' => Some(TokenType::Percent),
            '&' => Some(TokenType::Amp),
            '^' => Some(TokenType::Caret),
            '|' => Some(TokenType::Pipe),
            '<' => Some(TokenType::LessThan),
            '>' => Some(TokenType::GreaterThan),
            '?' => Some(TokenType::Question),
            ':' => Some(TokenType::Colon),
            _ => None,
        };
        if let Some(token_type) = single {
            self.advance();
            return Token::new(token_type, c.to_string(), position, line, column);
        }

        if c == '\'' || c == '"' {
            return match self.read_string() {
                Ok(value) => Token::new(TokenType::StringLiteral, value, position, line, column),
                Err(message) => Token::error(message, position, line, column),
            };
        }

        if c.is_ascii_digit() || c == '.' {
            return match self.read_number() {
                Ok((value, token_type)) => Token::new(token_type, value, position, line, column),
                Err(message) => Token::error(message, position, line, column),
            };
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let ident = self.read_identifier();
            let token_type = KEYWORDS
                .get(ident.as_str())
                .copied()
                .unwrap_or(TokenType::Identifier);
            return Token::new(token_type, ident, position, line, column);
        }

        self.advance();
        Token::error(
            format!("unexpected character '{}'", c),
            position,
            line,
            column,
        )
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(offset, expected)| self.peek_at(offset) == Some(expected))
    }
}
