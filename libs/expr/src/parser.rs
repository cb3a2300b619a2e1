//! Expression parser - converts source text to a parse tree
//!
//! Recursive descent parser following the operator precedence of the
//! expression grammar. Precedence (lowest to highest):
//! 1. cast (`as`)
//! 2. coalesce (`??`)
//! 3. elvis (`?:`)
//! 4. ternary (`? :`)
//! 5. equality (`==`, `!=`)
//! 6. inequality (`<`, `<=`, `>`, `>=`)
//! 7. bitwise or (`|`, `^`)
//! 8. bitwise and (`&`)
//! 9. shift (`<<`, `>>`)
//! 10. implies (`<->`, `implies`)
//! 11. or (`||`, `or`)
//! 12. and (`&&`, `and`)
//! 13. additive (`+`, `-`)
//! 14. multiplicative (`*`, `/`, `//`, `%`)
//! 15. exponentiation (`**`, right associative)
//! 16. polarity (prefix `+`, `-`)
//! 17. bitwise not (prefix `~`)
//! 18. logical not (prefix `!`, `not`)
//! 19. membership (`in`, `not in`)
//! 20. type test (`is`, `is not`)
//! 21. indexer (`[i]`, `[a:b]`)
//! 22. invocation (`.`)
//!
//! A prefix operator may also open any operand position, so `a in -b` and
//! `!-x` parse even though the prefix levels sit above the operand's level.

use crate::ast::*;
use crate::convert::TypeTag;
use crate::error::{Diagnostic, Error, Result, SyntaxError};
use crate::lexer::Lexer;
use crate::stack;
use crate::token::{Token, TokenType};
use std::num::IntErrorKind;

/// Default nesting limit for parenthesised and prefix expressions.
pub const MAX_RECURSION_DEPTH: usize = 200;

type ParseResult<T> = std::result::Result<T, Diagnostic>;

/// Parse `source` with the default nesting limit.
pub fn parse(source: &str) -> Result<AstNode> {
    parse_with_depth(source, MAX_RECURSION_DEPTH)
}

/// Parse `source`, reporting every lexical diagnostic plus the first parse
/// error as one [`SyntaxError`].
pub fn parse_with_depth(source: &str, max_depth: usize) -> Result<AstNode> {
    let (tokens, mut diagnostics) = Lexer::new(source).tokenize();
    let mut parser = Parser::new(tokens, max_depth);
    let parsed = parser.parse();

    match parsed {
        Ok(ast) if diagnostics.is_empty() => Ok(ast),
        Ok(_) => Err(Error::Syntax(SyntaxError { diagnostics })),
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            diagnostics.sort_by_key(|d| (d.line, d.column));
            Err(Error::Syntax(SyntaxError { diagnostics }))
        }
    }
}

/// Parser over a token list that always ends with `Eof`
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
    recursion_depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, max_depth: usize) -> Self {
        let mut tokens = tokens;
        if tokens.last().map(|t| t.token_type) != Some(TokenType::Eof) {
            let (position, line, column) = tokens
                .last()
                .map(|t| (t.position + t.value.chars().count(), t.line, t.column + 1))
                .unwrap_or((0, 1, 1));
            tokens.push(Token::eof(position, line, column));
        }
        Self {
            tokens,
            index: 0,
            recursion_depth: 0,
            max_depth,
        }
    }

    fn current_token(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn peek_token_is(&self, token_type: TokenType) -> bool {
        self.tokens
            .get(self.index + 1)
            .is_some_and(|t| t.token_type == token_type)
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    fn current_token_is(&self, token_type: TokenType) -> bool {
        self.current_token().token_type == token_type
    }

    fn current_token_is_one_of(&self, types: &[TokenType]) -> bool {
        types.contains(&self.current_token().token_type)
    }

    fn error_here(&self, message: String) -> Diagnostic {
        let token = self.current_token();
        Diagnostic {
            message,
            line: token.line,
            column: token.column,
        }
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        self.error_here(format!(
            "expected {}, found {}",
            expected,
            self.current_token().describe()
        ))
    }

    /// Expect a specific token type and advance
    fn expect(&mut self, token_type: TokenType, text: &str) -> ParseResult<Token> {
        if self.current_token_is(token_type) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{}'", text)))
        }
    }

    /// Parse the entire expression (top-level entry point)
    pub fn parse(&mut self) -> ParseResult<AstNode> {
        let expr = self.parse_expression()?;

        if !self.current_token_is(TokenType::Eof) {
            return Err(self.error_here(format!(
                "unexpected {}",
                self.current_token().describe()
            )));
        }

        Ok(expr)
    }

    /// Check recursion depth and increment
    fn check_recursion_depth(&mut self) -> ParseResult<()> {
        self.recursion_depth += 1;
        if self.recursion_depth > self.max_depth {
            return Err(self.error_here(format!(
                "expression too deeply nested (max depth: {})",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn decrement_recursion_depth(&mut self) {
        self.recursion_depth -= 1;
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.check_recursion_depth()?;
        let parsed = stack::guard(|| parse(self))?;
        self.decrement_recursion_depth();
        Ok(parsed)
    }

    fn parse_expression(&mut self) -> ParseResult<AstNode> {
        self.nested(Self::parse_cast_expression)
    }

    /// Parse cast expression: expression 'as' type
    fn parse_cast_expression(&mut self) -> ParseResult<AstNode> {
        let mut expression = self.parse_coalesce_expression()?;

        while self.current_token_is(TokenType::As) {
            self.advance(); // Skip 'as'
            let type_name = self.parse_type_name()?;
            expression = AstNode::CastExpression {
                expression: Box::new(expression),
                type_name,
            };
        }

        Ok(expression)
    }

    fn parse_coalesce_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_elvis_expression()?;

        while self.current_token_is(TokenType::Coalesce) {
            self.advance(); // Skip '??'
            let right = self.parse_elvis_expression()?;
            left = AstNode::CoalesceExpression {
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_elvis_expression(&mut self) -> ParseResult<AstNode> {
        let mut condition = self.parse_ternary_expression()?;

        while self.current_token_is(TokenType::Elvis) {
            self.advance(); // Skip '?:'
            let alternative = self.parse_ternary_expression()?;
            condition = AstNode::ElvisExpression {
                condition: Box::new(condition),
                alternative: Box::new(alternative),
            };
        }

        Ok(condition)
    }

    /// Parse ternary expression: expression '?' expression ':' expression.
    /// The else branch nests to the right.
    fn parse_ternary_expression(&mut self) -> ParseResult<AstNode> {
        let condition = self.parse_equality_expression()?;

        if !self.current_token_is(TokenType::Question) {
            return Ok(condition);
        }
        self.advance(); // Skip '?'
        let then_branch = self.parse_expression()?;
        self.expect(TokenType::Colon, ":")?;
        let else_branch = self.nested(Self::parse_ternary_expression)?;

        Ok(AstNode::TernaryExpression {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_equality_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_inequality_expression()?;

        loop {
            let operator = match self.current_token().token_type {
                TokenType::EqualEqual => EqualityOperator::Equal,
                TokenType::NotEqual => EqualityOperator::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_inequality_expression()?;
            left = AstNode::EqualityExpression {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_inequality_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_bitwise_or_expression()?;

        loop {
            let operator = match self.current_token().token_type {
                TokenType::LessThan => InequalityOperator::LessThan,
                TokenType::LessThanOrEqual => InequalityOperator::LessThanOrEqual,
                TokenType::GreaterThan => InequalityOperator::GreaterThan,
                TokenType::GreaterThanOrEqual => InequalityOperator::GreaterThanOrEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_bitwise_or_expression()?;
            left = AstNode::InequalityExpression {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_bitwise_or_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_bitwise_and_expression()?;

        loop {
            let operator = match self.current_token().token_type {
                TokenType::Pipe => BitwiseOrOperator::Or,
                TokenType::Caret => BitwiseOrOperator::Xor,
                _ => break,
            };
            self.advance();
            let right = self.parse_bitwise_and_expression()?;
            left = AstNode::BitwiseOrExpression {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_bitwise_and_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_shift_expression()?;

        while self.current_token_is(TokenType::Amp) {
            self.advance(); // Skip '&'
            let right = self.parse_shift_expression()?;
            left = AstNode::BitwiseAndExpression {
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_shift_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_implies_expression()?;

        loop {
            let operator = match self.current_token().token_type {
                TokenType::ShiftLeft => ShiftOperator::Left,
                TokenType::ShiftRight => ShiftOperator::Right,
                _ => break,
            };
            self.advance();
            let right = self.parse_implies_expression()?;
            left = AstNode::ShiftExpression {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_implies_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_or_expression()?;

        while self.current_token_is_one_of(&[TokenType::Iff, TokenType::Implies]) {
            self.advance();
            let right = self.parse_or_expression()?;
            left = AstNode::ImpliesExpression {
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_or_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_and_expression()?;

        while self.current_token_is_one_of(&[TokenType::PipePipe, TokenType::Or]) {
            self.advance();
            let right = self.parse_and_expression()?;
            left = AstNode::OrExpression {
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_additive_expression()?;

        while self.current_token_is_one_of(&[TokenType::AmpAmp, TokenType::And]) {
            self.advance();
            let right = self.parse_additive_expression()?;
            left = AstNode::AndExpression {
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_multiplicative_expression()?;

        loop {
            let operator = match self.current_token().token_type {
                TokenType::Plus => AdditiveOperator::Plus,
                TokenType::Minus => AdditiveOperator::Minus,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expression()?;
            left = AstNode::AdditiveExpression {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_exponentiation_expression()?;

        loop {
            let operator = match self.current_token().token_type {
                TokenType::Star => MultiplicativeOperator::Multiply,
                TokenType::Slash => MultiplicativeOperator::Divide,
                TokenType::FloorSlash => MultiplicativeOperator::FloorDivide,
                TokenType::Percent => MultiplicativeOperator::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.parse_exponentiation_expression()?;
            left = AstNode::MultiplicativeExpression {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse exponentiation: expression '**' expression (right associative)
    fn parse_exponentiation_expression(&mut self) -> ParseResult<AstNode> {
        let base = self.parse_polarity_expression()?;

        if !self.current_token_is(TokenType::Power) {
            return Ok(base);
        }
        self.advance(); // Skip '**'
        let exponent = self.nested(Self::parse_exponentiation_expression)?;

        Ok(AstNode::ExponentiationExpression {
            base: Box::new(base),
            exponent: Box::new(exponent),
        })
    }

    /// Parse polarity expression: ('+' | '-') expression
    fn parse_polarity_expression(&mut self) -> ParseResult<AstNode> {
        let operator = match self.current_token().token_type {
            TokenType::Plus => PolarityOperator::Plus,
            TokenType::Minus => PolarityOperator::Minus,
            _ => return self.parse_bitwise_not_expression(),
        };
        self.advance();
        let expression = self.nested(Self::parse_polarity_expression)?;

        Ok(AstNode::PolarityExpression {
            operator,
            expression: Box::new(expression),
        })
    }

    fn parse_bitwise_not_expression(&mut self) -> ParseResult<AstNode> {
        if !self.current_token_is(TokenType::Tilde) {
            return self.parse_logical_not_expression();
        }
        self.advance(); // Skip '~'
        let expression = self.nested(Self::parse_bitwise_not_expression)?;

        Ok(AstNode::BitwiseNotExpression {
            expression: Box::new(expression),
        })
    }

    fn parse_logical_not_expression(&mut self) -> ParseResult<AstNode> {
        if !self.current_token_is_one_of(&[TokenType::Bang, TokenType::Not]) {
            return self.parse_membership_expression();
        }
        self.advance(); // Skip '!' or 'not'
        let expression = self.nested(Self::parse_logical_not_expression)?;

        Ok(AstNode::LogicalNotExpression {
            expression: Box::new(expression),
        })
    }

    /// Parse membership expression: expression 'not'? 'in' expression
    fn parse_membership_expression(&mut self) -> ParseResult<AstNode> {
        let mut left = self.parse_type_expression()?;

        loop {
            let negated = if self.current_token_is(TokenType::In) {
                false
            } else if self.current_token_is(TokenType::Not) && self.peek_token_is(TokenType::In) {
                self.advance(); // Skip 'not'
                true
            } else {
                break;
            };
            self.advance(); // Skip 'in'
            let right = self.parse_type_expression()?;
            left = AstNode::MembershipExpression {
                left: Box::new(left),
                negated,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse type expression: expression 'is' 'not'? type
    fn parse_type_expression(&mut self) -> ParseResult<AstNode> {
        let mut expression = self.parse_postfix_expression()?;

        while self.current_token_is(TokenType::Is) {
            self.advance(); // Skip 'is'
            let negated = if self.current_token_is(TokenType::Not) {
                self.advance();
                true
            } else {
                false
            };
            let type_name = self.parse_type_name()?;
            expression = AstNode::TypeExpression {
                expression: Box::new(expression),
                negated,
                type_name,
            };
        }

        Ok(expression)
    }

    fn parse_type_name(&mut self) -> ParseResult<TypeTag> {
        if !self.current_token_is(TokenType::TypeName) {
            return Err(self.unexpected("a type name (int, uint, float, string, bool)"));
        }
        let token = self.advance();
        TypeTag::parse(&token.value).ok_or_else(|| Diagnostic {
            message: format!("unknown type '{}'", token.value),
            line: token.line,
            column: token.column,
        })
    }

    /// Parse indexers and invocations following a term
    fn parse_postfix_expression(&mut self) -> ParseResult<AstNode> {
        let mut expression = self.parse_term()?;

        loop {
            if self.current_token_is(TokenType::Dot) {
                self.advance(); // Skip '.'
                let invocation = self.parse_invocation()?;
                expression = AstNode::InvocationExpression {
                    expression: Box::new(expression),
                    invocation: Box::new(invocation),
                };
            } else if self.current_token_is(TokenType::OpenBracket) {
                self.advance(); // Skip '['
                expression = self.parse_index(expression)?;
            } else {
                break;
            }
        }

        Ok(expression)
    }

    /// Parse the inside of `[...]`: an index or a slice
    fn parse_index(&mut self, expression: AstNode) -> ParseResult<AstNode> {
        let begin = if self.current_token_is(TokenType::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        if !self.current_token_is(TokenType::Colon) {
            self.expect(TokenType::CloseBracket, "]")?;
            let index = begin.ok_or_else(|| self.unexpected("an index expression"))?;
            return Ok(AstNode::IndexerExpression {
                expression: Box::new(expression),
                index,
            });
        }

        self.advance(); // Skip ':'
        let end = if self.current_token_is(TokenType::CloseBracket) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(TokenType::CloseBracket, "]")?;

        Ok(AstNode::SliceExpression {
            expression: Box::new(expression),
            begin,
            end,
        })
    }

    /// Parse term: literal, list, invocation or parenthesized expression
    fn parse_term(&mut self) -> ParseResult<AstNode> {
        match self.current_token().token_type {
            TokenType::OpenParen => {
                self.advance(); // Skip '('
                let expression = self.parse_expression()?;
                self.expect(TokenType::CloseParen, ")")?;
                Ok(AstNode::ParenthesizedTerm {
                    expression: Box::new(expression),
                })
            }
            TokenType::Identifier | TokenType::TypeName | TokenType::Star => {
                self.parse_invocation()
            }
            TokenType::Plus | TokenType::Minus => self.parse_polarity_expression(),
            TokenType::Tilde => self.parse_bitwise_not_expression(),
            TokenType::Bang | TokenType::Not => self.parse_logical_not_expression(),
            _ => self.parse_literal(),
        }
    }

    /// Parse invocation: identifier | '*' | identifier '(' parameters? ')'
    fn parse_invocation(&mut self) -> ParseResult<AstNode> {
        if self.current_token_is(TokenType::Star) {
            self.advance();
            return Ok(AstNode::WildcardInvocation);
        }

        if !self.current_token_is_one_of(&[TokenType::Identifier, TokenType::TypeName]) {
            return Err(self.unexpected("an identifier"));
        }
        let name = self.advance().value;

        if !self.current_token_is(TokenType::OpenParen) {
            return Ok(AstNode::MemberInvocation { identifier: name });
        }
        self.advance(); // Skip '('

        let mut parameters = Vec::new();
        if !self.current_token_is(TokenType::CloseParen) {
            loop {
                parameters.push(self.parse_expression()?);
                if self.current_token_is(TokenType::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::CloseParen, ")")?;

        Ok(AstNode::FunctionInvocation {
            function_name: name,
            parameters,
        })
    }

    /// Parse literal, including list literals of literals
    fn parse_literal(&mut self) -> ParseResult<AstNode> {
        let token = self.current_token().clone();
        let literal = match token.token_type {
            TokenType::Null => AstNode::NullLiteral,
            TokenType::True => AstNode::BooleanLiteral(true),
            TokenType::False => AstNode::BooleanLiteral(false),
            TokenType::StringLiteral => AstNode::StringLiteral(token.value.clone()),
            TokenType::IntegerLiteral => {
                AstNode::IntegerLiteral(self.integer_literal(&token, false)?)
            }
            TokenType::FloatLiteral => AstNode::FloatLiteral(self.float_literal(&token, false)?),
            TokenType::OpenBracket => return self.parse_list_literal(),
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(literal)
    }

    /// Parse list literal: '[' (literal (',' literal)*)? ']'. Numeric items
    /// may carry a sign.
    fn parse_list_literal(&mut self) -> ParseResult<AstNode> {
        self.advance(); // Skip '['
        self.nested(Self::parse_list_elements)
    }

    fn parse_list_elements(&mut self) -> ParseResult<AstNode> {
        let mut elements = Vec::new();
        if !self.current_token_is(TokenType::CloseBracket) {
            loop {
                elements.push(self.parse_list_element()?);
                if self.current_token_is(TokenType::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::CloseBracket, "]")?;

        Ok(AstNode::ListLiteral { elements })
    }

    fn parse_list_element(&mut self) -> ParseResult<AstNode> {
        let negative = match self.current_token().token_type {
            TokenType::Minus => true,
            TokenType::Plus => false,
            _ => return self.parse_literal(),
        };
        self.advance(); // Skip sign

        let token = self.current_token().clone();
        let literal = match token.token_type {
            TokenType::IntegerLiteral => {
                AstNode::IntegerLiteral(self.integer_literal(&token, negative)?)
            }
            TokenType::FloatLiteral => {
                AstNode::FloatLiteral(self.float_literal(&token, negative)?)
            }
            _ => return Err(self.unexpected("a number")),
        };
        self.advance();
        Ok(literal)
    }

    fn integer_literal(&self, token: &Token, negative: bool) -> ParseResult<i64> {
        let text = token.value.as_str();
        let (digits, radix) = match text.get(..2) {
            Some("0x" | "0X") => (&text[2..], 16),
            Some("0o" | "0O") => (&text[2..], 8),
            Some("0b" | "0B") => (&text[2..], 2),
            _ => (text, 10),
        };
        let signed = if negative {
            format!("-{}", digits)
        } else {
            digits.to_string()
        };

        i64::from_str_radix(&signed, radix).map_err(|err| {
            let message = match err.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    format!("integer literal '{}' is out of range for int", text)
                }
                _ => format!("malformed integer literal '{}'", text),
            };
            Diagnostic {
                message,
                line: token.line,
                column: token.column,
            }
        })
    }

    fn float_literal(&self, token: &Token, negative: bool) -> ParseResult<f64> {
        let value = token.value.parse::<f64>().map_err(|_| Diagnostic {
            message: format!("malformed float literal '{}'", token.value),
            line: token.line,
            column: token.column,
        })?;
        Ok(if negative { -value } else { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> AstNode {
        parse(input).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", input, e))
    }

    fn member(name: &str) -> Box<AstNode> {
        Box::new(AstNode::MemberInvocation {
            identifier: name.to_string(),
        })
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_ok("null"), AstNode::NullLiteral);
        assert_eq!(parse_ok("true"), AstNode::BooleanLiteral(true));
        assert_eq!(parse_ok("0x10"), AstNode::IntegerLiteral(16));
        assert_eq!(parse_ok("0o17"), AstNode::IntegerLiteral(15));
        assert_eq!(parse_ok("0b11"), AstNode::IntegerLiteral(3));
        assert_eq!(parse_ok("2.5"), AstNode::FloatLiteral(2.5));
        assert_eq!(parse_ok("'hi'"), AstNode::StringLiteral("hi".into()));
    }

    #[test]
    fn test_list_literal() {
        assert_eq!(
            parse_ok("[1, -2, 'x', [true]]"),
            AstNode::ListLiteral {
                elements: vec![
                    AstNode::IntegerLiteral(1),
                    AstNode::IntegerLiteral(-2),
                    AstNode::StringLiteral("x".into()),
                    AstNode::ListLiteral {
                        elements: vec![AstNode::BooleanLiteral(true)]
                    },
                ]
            }
        );
        assert_eq!(
            parse_ok("[]"),
            AstNode::ListLiteral { elements: vec![] }
        );
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let ast = parse_ok("1 + 2 * 3");
        let AstNode::AdditiveExpression { right, .. } = ast else {
            panic!("expected additive expression");
        };
        assert!(matches!(*right, AstNode::MultiplicativeExpression { .. }));
    }

    #[test]
    fn test_power_is_right_associative() {
        let ast = parse_ok("2 ** 3 ** 2");
        let AstNode::ExponentiationExpression { base, exponent } = ast else {
            panic!("expected exponentiation");
        };
        assert_eq!(*base, AstNode::IntegerLiteral(2));
        assert!(matches!(*exponent, AstNode::ExponentiationExpression { .. }));
    }

    #[test]
    fn test_not_binds_looser_than_in() {
        let ast = parse_ok("!a in b");
        let AstNode::LogicalNotExpression { expression } = ast else {
            panic!("expected logical not");
        };
        assert!(matches!(
            *expression,
            AstNode::MembershipExpression { negated: false, .. }
        ));
    }

    #[test]
    fn test_not_in_and_is_not() {
        assert!(matches!(
            parse_ok("a not in [1]"),
            AstNode::MembershipExpression { negated: true, .. }
        ));
        assert_eq!(
            parse_ok("a is not string"),
            AstNode::TypeExpression {
                expression: member("a"),
                negated: true,
                type_name: TypeTag::String,
            }
        );
    }

    #[test]
    fn test_cast_is_loosest() {
        let ast = parse_ok("a ?? b as int");
        let AstNode::CastExpression {
            expression,
            type_name,
        } = ast
        else {
            panic!("expected cast");
        };
        assert_eq!(type_name, TypeTag::Int);
        assert!(matches!(*expression, AstNode::CoalesceExpression { .. }));
    }

    #[test]
    fn test_ternary_and_elvis() {
        let ast = parse_ok("a ? b : c ? d : e");
        let AstNode::TernaryExpression { else_branch, .. } = ast else {
            panic!("expected ternary");
        };
        assert!(matches!(*else_branch, AstNode::TernaryExpression { .. }));

        assert_eq!(
            parse_ok("a ?: b"),
            AstNode::ElvisExpression {
                condition: member("a"),
                alternative: member("b"),
            }
        );
    }

    #[test]
    fn test_navigation() {
        let ast = parse_ok("a.b[0].c(1)");
        let AstNode::InvocationExpression {
            expression,
            invocation,
        } = ast
        else {
            panic!("expected invocation");
        };
        assert_eq!(
            *invocation,
            AstNode::FunctionInvocation {
                function_name: "c".into(),
                parameters: vec![AstNode::IntegerLiteral(1)],
            }
        );
        assert!(matches!(*expression, AstNode::IndexerExpression { .. }));
    }

    #[test]
    fn test_slices() {
        assert_eq!(
            parse_ok("a[:2]"),
            AstNode::SliceExpression {
                expression: member("a"),
                begin: None,
                end: Some(Box::new(AstNode::IntegerLiteral(2))),
            }
        );
        assert_eq!(
            parse_ok("a[1:]"),
            AstNode::SliceExpression {
                expression: member("a"),
                begin: Some(Box::new(AstNode::IntegerLiteral(1))),
                end: None,
            }
        );
    }

    #[test]
    fn test_type_name_as_function_name() {
        assert_eq!(
            parse_ok("string(1)"),
            AstNode::FunctionInvocation {
                function_name: "string".into(),
                parameters: vec![AstNode::IntegerLiteral(1)],
            }
        );
    }

    #[test]
    fn test_wildcard() {
        assert_eq!(parse_ok("*"), AstNode::WildcardInvocation);
        assert!(matches!(
            parse_ok("a.*"),
            AstNode::InvocationExpression { .. }
        ));
    }

    #[test]
    fn test_prefix_inside_operand() {
        assert!(matches!(
            parse_ok("a in -b"),
            AstNode::MembershipExpression { .. }
        ));
        assert!(matches!(
            parse_ok("!-x"),
            AstNode::LogicalNotExpression { .. }
        ));
    }

    #[test]
    fn test_errors() {
        let Err(Error::Syntax(err)) = parse("1 +") else {
            panic!("expected syntax error");
        };
        assert_eq!(err.diagnostics.len(), 1);
        assert_eq!(
            err.diagnostics[0].message,
            "expected an expression, found end of input"
        );

        let Err(Error::Syntax(err)) = parse("(1") else {
            panic!("expected syntax error");
        };
        assert_eq!(err.diagnostics[0].message, "expected ')', found end of input");

        assert!(parse("1 2").is_err());
        assert!(parse("9223372036854775808").is_err());
        assert!(parse("a is number").is_err());
    }

    #[test]
    fn test_lexer_and_parser_errors_are_aggregated() {
        let Err(Error::Syntax(err)) = parse("a @ + ") else {
            panic!("expected syntax error");
        };
        assert_eq!(err.diagnostics.len(), 2);
        assert_eq!(err.diagnostics[0].message, "unexpected character '@'");
    }

    #[test]
    fn test_recursion_limit() {
        let deep = format!("{}1{}", "(".repeat(30), ")".repeat(30));
        let Err(Error::Syntax(err)) = parse_with_depth(&deep, 20) else {
            panic!("expected syntax error");
        };
        assert_eq!(
            err.diagnostics[0].message,
            "expression too deeply nested (max depth: 20)"
        );
        assert!(parse_with_depth(&deep, 64).is_ok());
    }
}
