/*
 * Copyright (c) 2025 Raphael Amorim
 *
 * This file is part of envdoc, which is licensed
 * under GNU General Public License v3.0.
 */

use envdoc::LexErrorKind;
use envdoc::lexer::{Lexer, QuoteStyle, TokenKind};

#[test]
fn test_lexer_entry_tokens() {
    let mut lexer = Lexer::new("KEY=value");

    let token1 = lexer.next_token().unwrap();
    assert_eq!(token1.kind, TokenKind::Key("KEY".to_string()));

    let token2 = lexer.next_token().unwrap();
    assert_eq!(token2.kind, TokenKind::Assignment);

    let token3 = lexer.next_token().unwrap();
    assert_eq!(
        token3.kind,
        TokenKind::Value {
            raw: "value".to_string(),
            quote: QuoteStyle::Unquoted,
        }
    );

    let token4 = lexer.next_token().unwrap();
    assert_eq!(token4.kind, TokenKind::EOF);
}

#[test]
fn test_lexer_eof_is_sticky() {
    let mut lexer = Lexer::new("");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EOF);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EOF);
}

#[test]
fn test_lexer_tokenize_ends_with_eof() {
    let tokens = Lexer::tokenize("# header\nA=1\n\nB='two'\n").unwrap();
    let kinds: Vec<TokenKind> = tokens.into_iter().map(|token| token.kind).collect();

    assert_eq!(
        kinds,
        vec![
            TokenKind::Comment("# header".to_string()),
            TokenKind::Key("A".to_string()),
            TokenKind::Assignment,
            TokenKind::Value {
                raw: "1".to_string(),
                quote: QuoteStyle::Unquoted,
            },
            TokenKind::BlankLine,
            TokenKind::Key("B".to_string()),
            TokenKind::Assignment,
            TokenKind::Value {
                raw: "two".to_string(),
                quote: QuoteStyle::Single,
            },
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_lexer_whitespace_only_lines() {
    let tokens = Lexer::tokenize("   \n\t\nX=1\n   ").unwrap();
    let blank_lines = tokens
        .iter()
        .filter(|token| token.kind == TokenKind::BlankLine)
        .count();
    assert_eq!(blank_lines, 3);
}

#[test]
fn test_lexer_keys_with_underscores_and_digits() {
    let tokens = Lexer::tokenize("_PRIVATE=1\nAPI_V2_URL=x").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Key("_PRIVATE".to_string()));
    assert_eq!(tokens[3].kind, TokenKind::Key("API_V2_URL".to_string()));
}

#[test]
fn test_lexer_equals_inside_value() {
    let tokens = Lexer::tokenize("DSN=postgres://u:p@h/db?sslmode=require").unwrap();
    assert_eq!(
        tokens[2].kind,
        TokenKind::Value {
            raw: "postgres://u:p@h/db?sslmode=require".to_string(),
            quote: QuoteStyle::Unquoted,
        }
    );
}

#[test]
fn test_lexer_errors() {
    let error = Lexer::tokenize("1X=bad").unwrap_err();
    assert_eq!(error.kind, LexErrorKind::InvalidKey("1X".to_string()));
    assert_eq!(error.line, 1);

    let error = Lexer::tokenize("A=1\nB=2\nX=\"unterminated").unwrap_err();
    assert_eq!(error.kind, LexErrorKind::UnterminatedQuote);
    assert_eq!(error.line, 3);

    let error = Lexer::tokenize("SPACED KEY=1").unwrap_err();
    assert_eq!(error.kind, LexErrorKind::InvalidKey("SPACED KEY".to_string()));
}

#[test]
fn test_lexer_escaped_quote_does_not_close_value() {
    let tokens = Lexer::tokenize(r#"MSG="say \"hi\"""#).unwrap();
    assert_eq!(
        tokens[2].kind,
        TokenKind::Value {
            raw: r#"say \"hi\""#.to_string(),
            quote: QuoteStyle::Double,
        }
    );
}
