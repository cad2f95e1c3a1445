//! Standard library of host functions

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::rc::Rc;

use crate::ast::{FunctionParameter, NativeFunctionDeclaration, TypeId};

use super::env::Environment;
use super::error::EvalError;
use super::value::Value;

/// Where the standard library reads and writes
#[derive(Clone)]
pub enum Console {
    /// Process stdin/stdout
    Stdio,
    /// In-memory buffers
    Captured(Rc<RefCell<Capture>>),
}

/// Buffers behind [`Console::Captured`]
#[derive(Debug, Default)]
pub struct Capture {
    pub output: String,
    pub input: VecDeque<char>,
}

impl Console {
    pub fn stdio() -> Self {
        Console::Stdio
    }

    /// Console reading from `input` and recording everything printed
    pub fn captured(input: &str) -> Self {
        Console::Captured(Rc::new(RefCell::new(Capture {
            output: String::new(),
            input: input.chars().collect(),
        })))
    }

    /// Text printed so far; always empty for stdio
    pub fn output(&self) -> String {
        match self {
            Console::Stdio => String::new(),
            Console::Captured(capture) => capture.borrow().output.clone(),
        }
    }

    fn write(&self, text: &str) -> Result<(), EvalError> {
        match self {
            Console::Stdio => std::io::stdout()
                .write_all(text.as_bytes())
                .map_err(|e| EvalError::native("print", e.to_string())),
            Console::Captured(capture) => {
                capture.borrow_mut().output.push_str(text);
                Ok(())
            }
        }
    }

    fn flush(&self) -> Result<(), EvalError> {
        match self {
            Console::Stdio => std::io::stdout()
                .flush()
                .map_err(|e| EvalError::native("flush", e.to_string())),
            Console::Captured(_) => Ok(()),
        }
    }

    /// Next input character, `None` at end of input
    fn read_char(&self) -> Result<Option<char>, EvalError> {
        match self {
            Console::Stdio => read_utf8_char(&mut std::io::stdin().lock()),
            Console::Captured(capture) => Ok(capture.borrow_mut().input.pop_front()),
        }
    }
}

/// Decode one UTF-8 scalar from `reader`, `None` at end of input
fn read_utf8_char(reader: &mut impl Read) -> Result<Option<char>, EvalError> {
    let io_error = |e: std::io::Error| EvalError::native("getchar", e.to_string());

    let mut buf = [0u8; 4];
    if reader.read(&mut buf[..1]).map_err(io_error)? == 0 {
        return Ok(None);
    }
    let width = match buf[0] {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    };
    reader.read_exact(&mut buf[1..width]).map_err(io_error)?;

    std::str::from_utf8(&buf[..width])
        .ok()
        .and_then(|s| s.chars().next())
        .map(Some)
        .ok_or_else(|| EvalError::native("getchar", "input is not valid UTF-8"))
}

impl Default for Console {
    fn default() -> Self {
        Console::stdio()
    }
}

fn int_arg(function: &str, args: &[Value], i: usize) -> Result<i64, EvalError> {
    match args.get(i) {
        Some(Value::Int(n)) => Ok(*n),
        Some(other) => Err(EvalError::type_mismatch(
            "int",
            other,
            format!("argument {} of `{}`", i + 1, function),
        )),
        None => Err(EvalError::native(function, format!("missing argument {}", i + 1))),
    }
}

fn str_arg<'a>(function: &str, args: &'a [Value], i: usize) -> Result<&'a str, EvalError> {
    match args.get(i) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(EvalError::type_mismatch(
            "string",
            other,
            format!("argument {} of `{}`", i + 1, function),
        )),
        None => Err(EvalError::native(function, format!("missing argument {}", i + 1))),
    }
}

fn params(pairs: &[(&str, &str)]) -> Vec<FunctionParameter> {
    pairs.iter()
        .map(|(name, ty)| FunctionParameter::new(*name, Some(TypeId::new(*ty))))
        .collect()
}

fn returns(ty: &str) -> Option<TypeId> {
    Some(TypeId::new(ty))
}

/// The Tiger standard library, bound to `console`
pub fn standard_library(console: Console) -> Vec<NativeFunctionDeclaration> {
    let out = console.clone();
    let print = NativeFunctionDeclaration::new("print", params(&[("s", "string")]), None, move |args| {
        out.write(str_arg("print", args, 0)?)?;
        Ok(Value::Unit)
    });

    let out = console.clone();
    let printi = NativeFunctionDeclaration::new("printi", params(&[("i", "int")]), None, move |args| {
        out.write(&int_arg("printi", args, 0)?.to_string())?;
        Ok(Value::Unit)
    });

    let out = console.clone();
    let flush = NativeFunctionDeclaration::new("flush", Vec::new(), None, move |_| {
        out.flush()?;
        Ok(Value::Unit)
    });

    let input = console;
    let getchar = NativeFunctionDeclaration::new("getchar", Vec::new(), returns("string"), move |_| {
        Ok(match input.read_char()? {
            Some(c) => Value::string(c.to_string()),
            None => Value::string(""),
        })
    });

    let ord = NativeFunctionDeclaration::new("ord", params(&[("s", "string")]), returns("int"), |args| {
        let s = str_arg("ord", args, 0)?;
        Ok(Value::Int(s.chars().next().map_or(-1, |c| c as i64)))
    });

    let chr = NativeFunctionDeclaration::new("chr", params(&[("i", "int")]), returns("string"), |args| {
        let code = int_arg("chr", args, 0)?;
        match u8::try_from(code) {
            Ok(byte) => Ok(Value::string(char::from(byte).to_string())),
            Err(_) => Err(EvalError::native("chr", format!("character code {} out of range", code))),
        }
    });

    let size = NativeFunctionDeclaration::new("size", params(&[("s", "string")]), returns("int"), |args| {
        Ok(Value::Int(str_arg("size", args, 0)?.chars().count() as i64))
    });

    let substring = NativeFunctionDeclaration::new(
        "substring",
        params(&[("s", "string"), ("first", "int"), ("n", "int")]),
        returns("string"),
        |args| {
            let s = str_arg("substring", args, 0)?;
            let first = int_arg("substring", args, 1)?;
            let n = int_arg("substring", args, 2)?;
            let len = s.chars().count() as i64;
            if first < 0 || n < 0 || first.saturating_add(n) > len {
                return Err(EvalError::native(
                    "substring",
                    format!("range {}..{} out of bounds for length {}", first, first.saturating_add(n), len),
                ));
            }
            let text: String = s.chars().skip(first as usize).take(n as usize).collect();
            Ok(Value::string(text))
        },
    );

    let concat = NativeFunctionDeclaration::new(
        "concat",
        params(&[("a", "string"), ("b", "string")]),
        returns("string"),
        |args| {
            let a = str_arg("concat", args, 0)?;
            let b = str_arg("concat", args, 1)?;
            Ok(Value::string(format!("{}{}", a, b)))
        },
    );

    let not = NativeFunctionDeclaration::new("not", params(&[("i", "int")]), returns("int"), |args| {
        Ok(Value::from_bool(int_arg("not", args, 0)? == 0))
    });

    let exit = NativeFunctionDeclaration::new("exit", params(&[("i", "int")]), None, |args| {
        Err(EvalError::Exit(int_arg("exit", args, 0)?))
    });

    vec![
        print, printi, flush, getchar, ord, chr, size, substring, concat, not, exit,
    ]
}

/// Bind the standard library into the innermost scope of `env`
pub fn install(env: &mut Environment, console: Console) {
    for native in standard_library(console) {
        env.define_native(native);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let library = standard_library(Console::captured(""));
        let native = library.iter().find(|n| n.name == name).unwrap();
        native.call(args)
    }

    #[test]
    fn test_read_utf8_char() {
        let mut input: &[u8] = "aé€🐯".as_bytes();
        let mut read = || read_utf8_char(&mut input);
        assert_eq!(read(), Ok(Some('a')));
        assert_eq!(read(), Ok(Some('é')));
        assert_eq!(read(), Ok(Some('€')));
        assert_eq!(read(), Ok(Some('🐯')));
        assert_eq!(read(), Ok(None));

        let mut invalid: &[u8] = &[0xFF];
        assert!(matches!(read_utf8_char(&mut invalid), Err(EvalError::Native { .. })));

        let mut truncated: &[u8] = &[0xE2, 0x82];
        assert!(read_utf8_char(&mut truncated).is_err());
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(call("size", &[Value::string("hello")]), Ok(Value::Int(5)));
        assert_eq!(call("ord", &[Value::string("A")]), Ok(Value::Int(65)));
        assert_eq!(call("ord", &[Value::string("")]), Ok(Value::Int(-1)));
        assert_eq!(call("chr", &[Value::Int(97)]), Ok(Value::string("a")));
        assert_eq!(
            call("substring", &[Value::string("hello"), Value::Int(1), Value::Int(3)]),
            Ok(Value::string("ell"))
        );
        assert_eq!(
            call("concat", &[Value::string("ab"), Value::string("cd")]),
            Ok(Value::string("abcd"))
        );
    }

    #[test]
    fn test_substring_out_of_range() {
        let err = call("substring", &[Value::string("abc"), Value::Int(2), Value::Int(5)]);
        assert!(matches!(err, Err(EvalError::Native { .. })));
    }

    #[test]
    fn test_chr_out_of_range() {
        assert!(matches!(call("chr", &[Value::Int(300)]), Err(EvalError::Native { .. })));
    }

    #[test]
    fn test_not_and_exit() {
        assert_eq!(call("not", &[Value::Int(0)]), Ok(Value::Int(1)));
        assert_eq!(call("not", &[Value::Int(7)]), Ok(Value::Int(0)));
        assert_eq!(call("exit", &[Value::Int(3)]), Err(EvalError::Exit(3)));
    }

    #[test]
    fn test_wrong_argument_type() {
        let err = call("size", &[Value::Int(1)]).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_captured_console() {
        let console = Console::captured("xy");
        let library = standard_library(console.clone());
        let find = |name: &str| library.iter().find(|n| n.name == name).unwrap();

        find("print").call(&[Value::string("n=")]).unwrap();
        find("printi").call(&[Value::Int(42)]).unwrap();
        assert_eq!(console.output(), "n=42");

        let getchar = find("getchar");
        assert_eq!(getchar.call(&[]), Ok(Value::string("x")));
        assert_eq!(getchar.call(&[]), Ok(Value::string("y")));
        assert_eq!(getchar.call(&[]), Ok(Value::string("")));
    }
}
