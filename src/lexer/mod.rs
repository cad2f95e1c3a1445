//! Lexer for the Tiger language
//!
//! Built on logos. String literals and nested comments are scanned by
//! callbacks because neither is a regular language.

mod tokens;

pub use tokens::{Token, TokenKind};

use crate::common::Span;
use crate::diagnostics::{LexError, LexErrorKind, SourceFile};
use logos::Logos;

/// Tokenize an anonymous source text
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    lex_file(&SourceFile::anonymous(source))
}

/// Tokenize a source file; the result always ends with [`TokenKind::Eof`]
pub fn lex_file(file: &SourceFile) -> Result<Vec<Token>, LexError> {
    let source: &str = &file.content;
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());
        let slice = lexer.slice();

        let kind = match result {
            Ok(kind) => kind,
            Err(kind) => {
                let message = match kind {
                    LexErrorKind::InvalidCharacter => {
                        format!("Invalid character `{}`", slice.escape_default())
                    }
                    LexErrorKind::UnterminatedString => "Unterminated string literal".to_string(),
                    LexErrorKind::UnterminatedComment => "Unterminated comment".to_string(),
                    LexErrorKind::InvalidEscape => "Invalid escape sequence in string".to_string(),
                    LexErrorKind::IntegerOverflow => {
                        format!("Integer literal `{}` out of range", slice)
                    }
                };
                return Err(LexError::new(kind, message, span, file));
            }
        };

        let text = match kind {
            TokenKind::Comment => continue,
            TokenKind::StringLit => match scan_string(&slice[1..]) {
                Ok((decoded, _)) => decoded,
                Err(kind) => {
                    return Err(LexError::new(kind, kind.to_string(), span, file));
                }
            },
            TokenKind::IntLit => {
                // Room for `i64::MIN`; the parser rejects it unless negated
                if !slice.parse::<u64>().is_ok_and(|n| n <= i64::MIN.unsigned_abs()) {
                    return Err(LexError::new(
                        LexErrorKind::IntegerOverflow,
                        format!("Integer literal `{}` out of range", slice),
                        span,
                        file,
                    ));
                }
                slice.to_string()
            }
            _ => slice.to_string(),
        };

        tokens.push(Token { kind, span, text });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::point(source.len()),
        text: String::new(),
    });

    tracing::trace!("lexed {} tokens from {}", tokens.len(), file.name);
    Ok(tokens)
}

/// Consume the rest of a string literal after its opening quote
fn lex_string(lex: &mut logos::Lexer<TokenKind>) -> Result<(), LexErrorKind> {
    match scan_string(lex.remainder()) {
        Ok((_, consumed)) => {
            lex.bump(consumed);
            Ok(())
        }
        Err(LexErrorKind::UnterminatedString) => {
            lex.bump(lex.remainder().len());
            Err(LexErrorKind::UnterminatedString)
        }
        Err(kind) => Err(kind),
    }
}

/// Consume a comment body after its opening `/*`, honoring nesting
fn skip_comment(lex: &mut logos::Lexer<TokenKind>) -> Result<(), LexErrorKind> {
    let bytes = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i..].starts_with(b"/*") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"*/") {
            depth -= 1;
            i += 2;
            if depth == 0 {
                lex.bump(i);
                return Ok(());
            }
        } else {
            i += 1;
        }
    }

    lex.bump(bytes.len());
    Err(LexErrorKind::UnterminatedComment)
}

/// Decode a string body up to and including the closing quote.
///
/// Returns the decoded text and the number of bytes consumed. Supported
/// escapes: `\n \t \" \\`, `\ddd` (decimal code, at most 255), `\^c`
/// (control character) and `\ ... \` (whitespace gap, ignored).
fn scan_string(rest: &str) -> Result<(String, usize), LexErrorKind> {
    let mut out = String::new();
    let mut chars = rest.char_indices();

    'scan: while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((out, i + 1)),
            '\\' => match chars.next() {
                None => break 'scan,
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, '"')) => out.push('"'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, '^')) => match chars.next() {
                    Some((_, ctl)) if ('@'..='_').contains(&ctl) => {
                        out.push(char::from(ctl as u8 - b'@'));
                    }
                    Some(_) => return Err(LexErrorKind::InvalidEscape),
                    None => break 'scan,
                },
                Some((_, d)) if d.is_ascii_digit() => {
                    let mut code = d as u32 - '0' as u32;
                    for _ in 0..2 {
                        match chars.next() {
                            Some((_, d)) if d.is_ascii_digit() => {
                                code = code * 10 + (d as u32 - '0' as u32);
                            }
                            Some(_) => return Err(LexErrorKind::InvalidEscape),
                            None => break 'scan,
                        }
                    }
                    match u8::try_from(code) {
                        Ok(byte) => out.push(char::from(byte)),
                        Err(_) => return Err(LexErrorKind::InvalidEscape),
                    }
                }
                Some((_, gap)) if gap.is_whitespace() => loop {
                    match chars.next() {
                        Some((_, '\\')) => break,
                        Some((_, w)) if w.is_whitespace() => continue,
                        Some(_) => return Err(LexErrorKind::InvalidEscape),
                        None => break 'scan,
                    }
                },
                Some(_) => return Err(LexErrorKind::InvalidEscape),
            },
            other => out.push(other),
        }
    }

    Err(LexErrorKind::UnterminatedString)
}
