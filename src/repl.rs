//! Interactive read-eval-print loop
//!
//! Every line is parsed as one program and evaluated against a single
//! [`Session`], so top-level declarations stay visible to later lines.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::config::Config;
use crate::diagnostics::{Error, SourceFile};
use crate::interp::{Console, Environment, Interpreter, Value, natives};

/// An interpreter plus the environment it keeps evaluating in
pub struct Session {
    interpreter: Interpreter,
    env: Environment,
}

impl Session {
    pub fn new(config: &Config, console: Console) -> Self {
        let mut env = Environment::new();
        if config.interpreter.stdlib {
            natives::install(&mut env, console);
        }
        Session {
            interpreter: Interpreter::with_config(&config.interpreter),
            env,
        }
    }

    /// Parse and evaluate `source`; `name` labels diagnostics
    pub fn eval(&mut self, source: &str, name: &str) -> Result<Value, Error> {
        let file = SourceFile::new(name, source);
        let program = crate::parse_file(&file)?;
        Ok(self.interpreter.evaluate(&program, &mut self.env)?)
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }
}

const HELP: &str = "\
Commands:
  :help, :h    Show this help
  :env         List visible bindings
  :quit, :q    Exit the REPL

Anything else is evaluated as a Tiger expression or declaration.";

/// Run the REPL on the terminal until `:quit` or end of input
pub fn run(config: &Config) -> Result<(), Error> {
    println!("tigris REPL v{}", crate::VERSION);
    println!("Type :help for help, :quit to exit");
    println!();

    let mut editor = DefaultEditor::new().map_err(readline_error)?;
    let mut session = Session::new(config, Console::stdio());

    loop {
        let line = match editor.readline("tig> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(readline_error(err)),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(trimmed);

        match trimmed {
            ":quit" | ":q" => break,
            ":help" | ":h" => println!("{}", HELP),
            ":env" => {
                for (name, binding) in session.environment().visible() {
                    println!("  {} = {:?}", name, binding);
                }
            }
            _ => match session.eval(trimmed, "<repl>") {
                Ok(Value::Unit) => {}
                Ok(value) => println!("{:?}", value),
                Err(Error::Eval(crate::interp::EvalError::Exit(code))) => {
                    tracing::debug!("program requested exit with code {}", code);
                    break;
                }
                Err(err) => eprintln!("{:?}", miette::Report::new(err)),
            },
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn readline_error(err: ReadlineError) -> Error {
    Error::Io {
        path: "<terminal>".to_string(),
        source: std::io::Error::other(err.to_string()),
    }
}
