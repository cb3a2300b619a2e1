//! Unit tests for the expression lexer

use ferrum_expr::lexer::Lexer;
use ferrum_expr::token::{Token, TokenType};

/// Helper function to pull tokens one by one until end of input or an error
fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        match token.token_type {
            TokenType::Eof | TokenType::Error => {
                tokens.push(token);
                break;
            }
            _ => tokens.push(token),
        }
    }
    tokens
}

fn types(input: &str) -> Vec<TokenType> {
    tokenize(input).into_iter().map(|t| t.token_type).collect()
}

#[test]
fn test_literal_integers() {
    let tokens = tokenize("42");
    assert_eq!(tokens.len(), 2); // IntegerLiteral + EOF
    assert_eq!(tokens[0].token_type, TokenType::IntegerLiteral);
    assert_eq!(tokens[0].value, "42");

    let tokens = tokenize("-42");
    assert_eq!(tokens[0].token_type, TokenType::Minus);
    assert_eq!(tokens[1].token_type, TokenType::IntegerLiteral);
    assert_eq!(tokens[1].value, "42");

    for radix in ["0xff", "0XFF", "0o777", "0b1010"] {
        let tokens = tokenize(radix);
        assert_eq!(tokens[0].token_type, TokenType::IntegerLiteral, "{}", radix);
        assert_eq!(tokens[0].value, radix);
    }
}

#[test]
fn test_literal_floats() {
    for text in ["3.14", ".5", "1e10", "6.02E23", "1.5e-3"] {
        let tokens = tokenize(text);
        assert_eq!(tokens[0].token_type, TokenType::FloatLiteral, "{}", text);
        assert_eq!(tokens[0].value, text);
        assert_eq!(tokens[1].token_type, TokenType::Eof);
    }
}

#[test]
fn test_literal_keywords() {
    assert_eq!(
        types("true false null"),
        vec![
            TokenType::True,
            TokenType::False,
            TokenType::Null,
            TokenType::Eof
        ]
    );
}

#[test]
fn test_string_quoting_styles() {
    let tokens = tokenize(r#"'single' "double""#);
    assert_eq!(tokens[0].token_type, TokenType::StringLiteral);
    assert_eq!(tokens[0].value, "single");
    assert_eq!(tokens[1].value, "double");

    let tokens = tokenize("'''it's\n\"triple\"'''");
    assert_eq!(tokens[0].value, "it's\n\"triple\"");
}

#[test]
fn test_position_tracking() {
    let tokens = tokenize("a +\n  bc");
    assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
    assert_eq!((tokens[1].line, tokens[1].column), (1, 3));
    assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    assert_eq!(tokens[2].position, 6);
}

#[test]
fn test_navigation_tokens() {
    assert_eq!(
        types("user.tags[1:].len()"),
        vec![
            TokenType::Identifier,
            TokenType::Dot,
            TokenType::Identifier,
            TokenType::OpenBracket,
            TokenType::IntegerLiteral,
            TokenType::Colon,
            TokenType::CloseBracket,
            TokenType::Dot,
            TokenType::Identifier,
            TokenType::OpenParen,
            TokenType::CloseParen,
            TokenType::Eof,
        ]
    );
}

#[test]
fn test_word_operators() {
    assert_eq!(
        types("a and b or not c implies d"),
        vec![
            TokenType::Identifier,
            TokenType::And,
            TokenType::Identifier,
            TokenType::Or,
            TokenType::Not,
            TokenType::Identifier,
            TokenType::Implies,
            TokenType::Identifier,
            TokenType::Eof,
        ]
    );
    assert_eq!(
        types("x is not int"),
        vec![
            TokenType::Identifier,
            TokenType::Is,
            TokenType::Not,
            TokenType::TypeName,
            TokenType::Eof,
        ]
    );
}

#[test]
fn test_longest_operator_match() {
    assert_eq!(
        types("a<->b"),
        vec![
            TokenType::Identifier,
            TokenType::Iff,
            TokenType::Identifier,
            TokenType::Eof
        ]
    );
    assert_eq!(
        types("a<-b"),
        vec![
            TokenType::Identifier,
            TokenType::LessThan,
            TokenType::Minus,
            TokenType::Identifier,
            TokenType::Eof
        ]
    );
    assert_eq!(
        types("a???b"),
        vec![
            TokenType::Identifier,
            TokenType::Coalesce,
            TokenType::Question,
            TokenType::Identifier,
            TokenType::Eof
        ]
    );
}

#[test]
fn test_comment_runs_to_end_of_line() {
    assert_eq!(
        types("1 # one\n# whole line\n+ 2"),
        vec![
            TokenType::IntegerLiteral,
            TokenType::Plus,
            TokenType::IntegerLiteral,
            TokenType::Eof
        ]
    );
}

#[test]
fn test_next_token_reports_error_token() {
    let tokens = tokenize("a @ b");
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].token_type, TokenType::Error);
    assert_eq!(tokens[1].value, "unexpected character '@'");
}

#[test]
fn test_tokenize_collects_every_diagnostic() {
    let (tokens, diagnostics) = Lexer::new("'open\n1 @ 2").tokenize();
    assert!(!diagnostics.is_empty());
    assert_eq!(tokens.last().map(|t| t.token_type), Some(TokenType::Eof));
    assert!(diagnostics.iter().any(|d| d.message.contains('@')));
}

#[test]
fn test_empty_input() {
    assert_eq!(types(""), vec![TokenType::Eof]);
    assert_eq!(types("   \t\n  "), vec![TokenType::Eof]);
}
