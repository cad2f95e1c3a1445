//! tigris: a front end and tree-walking evaluator for a Tiger dialect
//!
//! A small, statically scoped language with integers, strings, records,
//! arrays, functions, loops and `let` blocks.
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Tokens → Parser → AST → Evaluator (+ Environment) → Value
//! ```
//!
//! # Example
//!
//! ```
//! let value = tigris::interpret("let var x := 3 in x * 14 end").unwrap();
//! assert_eq!(value, tigris::Value::Int(42));
//! ```

pub mod ast;
pub mod common;
pub mod config;
pub mod diagnostics;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

// Re-export diagnostics for convenience
pub use diagnostics::{Error, LexError, ParseError, SourceFile};

// Re-exports for convenience
pub use ast::{Declaration, Expr, Program};
pub use config::Config;
pub use interp::{Environment, EvalError, Interpreter, Value};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse source code to an AST
pub fn parse(source: &str) -> Result<Program, Error> {
    parse_file(&SourceFile::anonymous(source))
}

/// Parse source code, labelling diagnostics with `name`
pub fn parse_named(source: &str, name: &str) -> Result<Program, Error> {
    parse_file(&SourceFile::new(name, source))
}

/// Parse a source file to an AST
pub fn parse_file(file: &SourceFile) -> Result<Program, Error> {
    let tokens = lexer::lex_file(file)?;
    let program = parser::parse_file(&tokens, file)?;
    let kind = match &program {
        Program::Expr(_) => "expression",
        Program::Declaration(_) => "declaration",
    };
    tracing::debug!(kind, "parsed {}", file.name);
    Ok(program)
}

/// Interpret source code in a fresh environment with the standard library
pub fn interpret(source: &str) -> Result<Value, Error> {
    let mut session = repl::Session::new(&Config::default(), interp::Console::stdio());
    session.eval(source, diagnostics::ANONYMOUS_SOURCE)
}
