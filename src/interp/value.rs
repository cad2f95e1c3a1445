//! Runtime values for the interpreter

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use super::stack::ensure_sufficient_stack;

/// Nested records and arrays deeper than this render as `..`
const DISPLAY_DEPTH: usize = 8;

/// Runtime value
#[derive(Clone)]
pub enum Value {
    /// No value: result of assignments, loops, empty sequences
    Unit,
    /// `nil`, the empty record reference
    Nil,
    /// 64-bit signed integer
    Int(i64),
    /// Immutable string
    String(Rc<str>),
    /// Record instance (shared, mutable fields)
    Record(Rc<RefCell<Record>>),
    /// Array instance (shared, mutable elements)
    Array(Rc<RefCell<ArrayCell>>),
}

/// Heap cell behind [`Value::Record`]
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: String,
    pub fields: IndexMap<String, Value>,
}

/// Heap cell behind [`Value::Array`]
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayCell {
    pub element_type: String,
    pub elements: Vec<Value>,
}

impl Value {
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::String(Rc::from(text.as_ref()))
    }

    pub fn record(type_name: impl Into<String>, fields: IndexMap<String, Value>) -> Self {
        Value::Record(Rc::new(RefCell::new(Record {
            type_name: type_name.into(),
            fields,
        })))
    }

    pub fn array(element_type: impl Into<String>, elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(ArrayCell {
            element_type: element_type.into(),
            elements,
        })))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "no value",
            Value::Nil => "nil",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::Record(_) => "record",
            Value::Array(_) => "array",
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    /// Try to get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Truth value as an integer, the way comparisons produce it
    pub fn from_bool(b: bool) -> Self {
        Value::Int(b as i64)
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, quote: bool, depth: usize) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Nil => write!(f, "nil"),
            Value::Int(n) => write!(f, "{}", n),
            Value::String(s) if quote => write!(f, "{:?}", s),
            Value::String(s) => write!(f, "{}", s),
            Value::Record(record) => {
                let record = record.borrow();
                if depth >= DISPLAY_DEPTH {
                    return write!(f, "{}{{..}}", record.type_name);
                }
                write!(f, "{}{{", record.type_name)?;
                for (i, (name, value)) in record.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = ", name)?;
                    value.write(f, true, depth + 1)?;
                }
                write!(f, "}}")
            }
            Value::Array(array) => {
                let array = array.borrow();
                if depth >= DISPLAY_DEPTH {
                    return write!(f, "[..]");
                }
                write!(f, "[")?;
                for (i, value) in array.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    value.write(f, true, depth + 1)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, true, 0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, false, 0)
    }
}

/// Structural equality: records and arrays compare by contents
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_with(other, &mut FxHashSet::default())
    }
}

impl Value {
    /// A pair of cells already in `visited` is assumed equal, so comparing
    /// self-referential structures terminates
    fn eq_with(&self, other: &Self, visited: &mut FxHashSet<(usize, usize)>) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Nil, Value::Nil) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => {
                if Rc::ptr_eq(a, b) || !visited.insert((Rc::as_ptr(a) as usize, Rc::as_ptr(b) as usize)) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.type_name == b.type_name
                    && a.fields.len() == b.fields.len()
                    && a.fields.iter().all(|(name, value)| {
                        b.fields
                            .get(name)
                            .is_some_and(|other| ensure_sufficient_stack(|| value.eq_with(other, visited)))
                    })
            }
            (Value::Array(a), Value::Array(b)) => {
                if Rc::ptr_eq(a, b) || !visited.insert((Rc::as_ptr(a) as usize, Rc::as_ptr(b) as usize)) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.element_type == b.element_type
                    && a.elements.len() == b.elements.len()
                    && a.elements
                        .iter()
                        .zip(&b.elements)
                        .all(|(x, y)| ensure_sufficient_stack(|| x.eq_with(y, visited)))
            }
            _ => false,
        }
    }
}
