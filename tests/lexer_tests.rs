//! Lexer tests

use pretty_assertions::assert_eq;
use tigris::diagnostics::LexErrorKind;
use tigris::lexer::{TokenKind, lex};

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).unwrap().into_iter().map(|t| t.kind).collect()
}

fn lex_error(source: &str) -> tigris::LexError {
    match lex(source) {
        Ok(tokens) => panic!("Expected lex error, got {:?}", tokens),
        Err(e) => e,
    }
}

#[test]
fn test_lex_empty() {
    let tokens = lex("").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
}

#[test]
fn test_lex_whitespace() {
    let tokens = lex("   \t\n  ").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
}

#[test]
fn test_lex_simple_var() {
    let tokens = lex("var x := 42").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Var);
    assert_eq!(tokens[1].kind, TokenKind::Ident);
    assert_eq!(tokens[1].text, "x");
    assert_eq!(tokens[2].kind, TokenKind::ColonEq);
    assert_eq!(tokens[3].kind, TokenKind::IntLit);
    assert_eq!(tokens[3].text, "42");
    assert_eq!(tokens[4].kind, TokenKind::Eof);
}

#[test]
fn test_lex_keywords() {
    let source = "nil array of type var function let in end if then else while do for to break new";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Nil,
            TokenKind::Array,
            TokenKind::Of,
            TokenKind::Type,
            TokenKind::Var,
            TokenKind::Function,
            TokenKind::Let,
            TokenKind::In,
            TokenKind::End,
            TokenKind::If,
            TokenKind::Then,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::Do,
            TokenKind::For,
            TokenKind::To,
            TokenKind::Break,
            TokenKind::New,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_keyword_prefix_is_identifier() {
    let tokens = lex("nilly ending to_do").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Ident);
    assert_eq!(tokens[0].text, "nilly");
    assert_eq!(tokens[1].kind, TokenKind::Ident);
    assert_eq!(tokens[2].kind, TokenKind::Ident);
    assert_eq!(tokens[2].text, "to_do");
}

#[test]
fn test_lex_operators() {
    assert_eq!(
        kinds("+ - * / = <> < <= > >= & | :="),
        vec![
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Eq,
            TokenKind::Ne,
            TokenKind::Lt,
            TokenKind::Le,
            TokenKind::Gt,
            TokenKind::Ge,
            TokenKind::Amp,
            TokenKind::Pipe,
            TokenKind::ColonEq,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_punctuation() {
    assert_eq!(
        kinds(". [ ] { } ( ) , ; :"),
        vec![
            TokenKind::Dot,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Comma,
            TokenKind::Semi,
            TokenKind::Colon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_negative_number_is_two_tokens() {
    assert_eq!(
        kinds("-42"),
        vec![TokenKind::Minus, TokenKind::IntLit, TokenKind::Eof]
    );
}

#[test]
fn test_lex_string_escapes() {
    let tokens = lex(r#""line\n\"quoted\"\t\\ \065\^J""#).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::StringLit);
    assert_eq!(tokens[0].text, "line\n\"quoted\"\t\\ A\n");
}

#[test]
fn test_lex_string_formatting_gap() {
    let tokens = lex("\"abc\\\n      \\def\"").unwrap();
    assert_eq!(tokens[0].text, "abcdef");
    assert_eq!(tokens[1].kind, TokenKind::Eof);
}

#[test]
fn test_lex_string_span_covers_quotes() {
    let tokens = lex(r#"x := "hi""#).unwrap();
    assert_eq!(tokens[2].span.start, 5);
    assert_eq!(tokens[2].span.end, 9);
}

#[test]
fn test_lex_comments() {
    assert_eq!(
        kinds("1 /* a comment */ + /* nested /* deeper */ still */ 2"),
        vec![
            TokenKind::IntLit,
            TokenKind::Plus,
            TokenKind::IntLit,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_lex_spans() {
    let tokens = lex("ab  cd").unwrap();
    assert_eq!((tokens[0].span.start, tokens[0].span.end), (0, 2));
    assert_eq!((tokens[1].span.start, tokens[1].span.end), (4, 6));
    assert_eq!(tokens[2].span.start, 6);
}

#[test]
fn test_lex_is_restartable() {
    let source = "let var a := 1 in a end";
    assert_eq!(lex(source).unwrap(), lex(source).unwrap());
}

// ==================== Errors ====================

#[test]
fn test_lex_error_invalid_character() {
    let err = lex_error("a # b");
    assert_eq!(err.kind, LexErrorKind::InvalidCharacter);
    assert_eq!((err.line, err.column), (1, 3));
}

#[test]
fn test_lex_error_unterminated_string() {
    let err = lex_error("x := \"abc");
    assert_eq!(err.kind, LexErrorKind::UnterminatedString);
}

#[test]
fn test_lex_error_unterminated_comment() {
    let err = lex_error("1 /* open /* nested */");
    assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
}

#[test]
fn test_lex_error_invalid_escape() {
    let err = lex_error(r#""bad \q escape""#);
    assert_eq!(err.kind, LexErrorKind::InvalidEscape);
}

#[test]
fn test_lex_error_integer_overflow() {
    let err = lex_error("99999999999999999999");
    assert_eq!(err.kind, LexErrorKind::IntegerOverflow);
}

#[test]
fn test_lex_integer_magnitude_of_i64_min() {
    let tokens = lex("9223372036854775808").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::IntLit);

    let err = lex_error("9223372036854775809");
    assert_eq!(err.kind, LexErrorKind::IntegerOverflow);
}

#[test]
fn test_lex_error_position_on_later_line() {
    let err = lex_error("1 +\n  2 ~");
    assert_eq!((err.line, err.column), (2, 5));
}

#[test]
fn test_token_kind_classes() {
    assert!(TokenKind::Function.is_keyword());
    assert!(!TokenKind::Ident.is_keyword());
    assert!(TokenKind::Nil.is_literal());
    assert!(TokenKind::IntLit.is_literal());
    assert!(TokenKind::Ne.is_operator());
    assert!(!TokenKind::ColonEq.is_operator());
}
