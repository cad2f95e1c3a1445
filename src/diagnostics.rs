//! Diagnostic reporting with source locations
//!
//! This module provides rich error messages with source locations using miette.

use crate::common::{LineCol, LineIndex, Span};
use crate::interp::EvalError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

/// Name used for sources that did not come from a file
pub const ANONYMOUS_SOURCE: &str = "<input>";

/// Source file for error reporting
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.into()),
        }
    }

    pub fn anonymous(content: impl Into<String>) -> Self {
        Self::new(ANONYMOUS_SOURCE, content)
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.to_string())
    }

    /// Line and column of a byte offset in this file
    pub fn locate(&self, offset: usize) -> LineCol {
        LineIndex::new(&self.content).line_col(offset)
    }
}

/// Convert our Span to miette's SourceSpan
impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.start.into(), span.len())
    }
}

/// What went wrong while tokenizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    #[default]
    InvalidCharacter,
    UnterminatedString,
    UnterminatedComment,
    InvalidEscape,
    IntegerOverflow,
}

impl std::fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErrorKind::InvalidCharacter => write!(f, "invalid character"),
            LexErrorKind::UnterminatedString => write!(f, "unterminated string"),
            LexErrorKind::UnterminatedComment => write!(f, "unterminated comment"),
            LexErrorKind::InvalidEscape => write!(f, "invalid escape sequence"),
            LexErrorKind::IntegerOverflow => write!(f, "integer literal out of range"),
        }
    }
}

/// Malformed source text, reported by the lexer
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message} at line {line}, column {column}")]
#[diagnostic(code(lex::error))]
pub struct LexError {
    pub kind: LexErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[label("{kind}")]
    pub span: SourceSpan,
    #[source_code]
    pub src: NamedSource<String>,
}

impl LexError {
    pub fn new(kind: LexErrorKind, message: impl Into<String>, span: Span, source: &SourceFile) -> Self {
        let at = source.locate(span.start);
        LexError {
            kind,
            message: message.into(),
            line: at.line,
            column: at.column,
            span: span.into(),
            src: source.to_named_source(),
        }
    }
}

/// Grammar violation, reported by the parser
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message} at line {line}, column {column}")]
#[diagnostic(code(parse::error))]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[label("here")]
    pub span: SourceSpan,
    #[source_code]
    pub src: NamedSource<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span, source: &SourceFile) -> Self {
        let at = source.locate(span.start);
        ParseError {
            message: message.into(),
            line: at.line,
            column: at.column,
            span: span.into(),
            src: source.to_named_source(),
        }
    }
}

/// Any failure along the source → value pipeline
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Eval(#[from] EvalError),

    #[error("Failed to read `{path}`")]
    #[diagnostic(code(io::read))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(config::invalid))]
    Config(#[from] toml::de::Error),
}
