//! Abstract Syntax Tree for the Tiger language
//!
//! This module defines the AST types produced by the parser. Nodes carry no
//! source positions, so the derived `PartialEq` is purely structural: two
//! independently parsed trees of the same shape compare equal.

mod display;

use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::interp::{EvalError, Value};

/// A parsed source text: one expression or one declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Program {
    Expr(Expr),
    Declaration(Declaration),
}

impl Program {
    /// Number of expression nodes in the program
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut tally = |_: &Expr| count += 1;
        match self {
            Program::Expr(expr) => expr.walk(&mut tally),
            Program::Declaration(decl) => decl.walk(&mut tally),
        }
        count
    }
}

impl From<Expr> for Program {
    fn from(expr: Expr) -> Self {
        Program::Expr(expr)
    }
}

impl From<Declaration> for Program {
    fn from(decl: Declaration) -> Self {
        Program::Declaration(decl)
    }
}

// ==================== TYPES ====================

/// Reference to a type by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeId(pub String);

impl TypeId {
    pub fn new(name: impl Into<String>) -> Self {
        TypeId(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Right-hand side of a type declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Type {
    /// Alias of a named type: `type a = int`
    Id(TypeId),
    /// `array of tree`
    Array(TypeId),
    /// `{key: int, children: treelist}`; field order is not significant
    Record(IndexMap<String, TypeId>),
}

// ==================== EXPRESSIONS ====================

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// `nil`
    Nil,
    /// Integer literal; `-42` is a single literal
    Integer(i64),
    /// String literal (escapes already decoded)
    String(String),
    /// `int[10] of 0`
    ArrayCreation {
        element_type: TypeId,
        size: Box<Expr>,
        init: Box<Expr>,
    },
    /// `point{x = 1, y = 2}`; field order is not significant
    RecordCreation {
        type_id: TypeId,
        fields: IndexMap<String, Expr>,
    },
    /// `new point`
    ObjectCreation { type_id: TypeId },
    /// Variable, field or element reference
    LValue(LValue),
    /// `f(a, b)`
    FunctionCall { name: String, args: Vec<Expr> },
    /// `target := value`
    Assign { target: LValue, value: Box<Expr> },
    /// `if c then a else b`
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },
    /// `while c do body`
    While { condition: Box<Expr>, body: Box<Expr> },
    /// `for var := start to end do body`
    For {
        var: String,
        start: Box<Expr>,
        end: Box<Expr>,
        body: Box<Expr>,
    },
    /// `break`
    Break,
    /// `let decls in body end`
    Let {
        declarations: Vec<Declaration>,
        body: Vec<Expr>,
    },
    /// `(a; b; c)`
    Sequence(Vec<Expr>),
    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Integer(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String(value.into())
    }

    /// Plain variable reference
    pub fn var(name: impl Into<String>) -> Self {
        Expr::LValue(LValue::new(name))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::FunctionCall {
            name: name.into(),
            args,
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn assign(target: LValue, value: Expr) -> Self {
        Expr::Assign {
            target,
            value: Box::new(value),
        }
    }

    /// Visit this node and every expression below it, parents first
    pub fn walk(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Nil | Expr::Integer(_) | Expr::String(_) | Expr::Break => {}
            Expr::ObjectCreation { .. } => {}
            Expr::ArrayCreation { size, init, .. } => {
                size.walk(f);
                init.walk(f);
            }
            Expr::RecordCreation { fields, .. } => {
                for value in fields.values() {
                    value.walk(f);
                }
            }
            Expr::LValue(lvalue) => lvalue.walk(f),
            Expr::FunctionCall { args, .. } => {
                for arg in args {
                    arg.walk(f);
                }
            }
            Expr::Assign { target, value } => {
                target.walk(f);
                value.walk(f);
            }
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.walk(f);
                then_branch.walk(f);
                if let Some(else_branch) = else_branch {
                    else_branch.walk(f);
                }
            }
            Expr::While { condition, body } => {
                condition.walk(f);
                body.walk(f);
            }
            Expr::For {
                start, end, body, ..
            } => {
                start.walk(f);
                end.walk(f);
                body.walk(f);
            }
            Expr::Let { declarations, body } => {
                for decl in declarations {
                    decl.walk(f);
                }
                for expr in body {
                    expr.walk(f);
                }
            }
            Expr::Sequence(exprs) => {
                for expr in exprs {
                    expr.walk(f);
                }
            }
            Expr::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    // Comparison
    Equals,
    NotEquals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    // Logical (both operands always evaluated)
    And,
    Or,
}

impl BinaryOp {
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Subtract => "Subtract",
            BinaryOp::Multiply => "Multiply",
            BinaryOp::Divide => "Divide",
            BinaryOp::Equals => "Equals",
            BinaryOp::NotEquals => "NotEquals",
            BinaryOp::LessThan => "LessThan",
            BinaryOp::LessOrEqual => "LessOrEqual",
            BinaryOp::GreaterThan => "GreaterThan",
            BinaryOp::GreaterOrEqual => "GreaterOrEqual",
            BinaryOp::And => "And",
            BinaryOp::Or => "Or",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equals => "=",
            BinaryOp::NotEquals => "<>",
            BinaryOp::LessThan => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
        }
    }
}

// ==================== LVALUES ====================

/// A storage location: a name followed by field/index accessors in the order
/// they were written (`x[z].y` is index-then-field)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LValue {
    pub name: String,
    pub path: Vec<Accessor>,
}

/// One step of an lvalue chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Accessor {
    /// `.field`
    Field(String),
    /// `[index]`
    Index(Box<Expr>),
}

impl LValue {
    pub fn new(name: impl Into<String>) -> Self {
        LValue {
            name: name.into(),
            path: Vec::new(),
        }
    }

    /// Append a `.field` step
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.path.push(Accessor::Field(field.into()));
        self
    }

    /// Append an `[index]` step
    pub fn index(mut self, index: Expr) -> Self {
        self.path.push(Accessor::Index(Box::new(index)));
        self
    }

    fn walk(&self, f: &mut impl FnMut(&Expr)) {
        for step in &self.path {
            if let Accessor::Index(index) = step {
                index.walk(f);
            }
        }
    }
}

// ==================== DECLARATIONS ====================

/// Declaration inside a `let` (or at top level)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Declaration {
    Type(TypeDeclaration),
    Variable(VariableDeclaration),
    Function(Rc<FunctionDeclaration>),
    Native(Rc<NativeFunctionDeclaration>),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Type(decl) => &decl.name,
            Declaration::Variable(decl) => &decl.name,
            Declaration::Function(decl) => &decl.name,
            Declaration::Native(decl) => &decl.name,
        }
    }

    fn walk(&self, f: &mut impl FnMut(&Expr)) {
        match self {
            Declaration::Variable(decl) => decl.init.walk(f),
            Declaration::Function(decl) => decl.body.walk(f),
            Declaration::Type(_) | Declaration::Native(_) => {}
        }
    }
}

/// `type name = ty`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDeclaration {
    pub name: String,
    pub ty: Type,
}

/// `var name [: ty] := init`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDeclaration {
    pub name: String,
    pub ty: Option<TypeId>,
    pub init: Expr,
}

/// Function parameter; binding is positional
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionParameter {
    pub name: String,
    pub ty: Option<TypeId>,
}

impl FunctionParameter {
    pub fn new(name: impl Into<String>, ty: Option<TypeId>) -> Self {
        FunctionParameter {
            name: name.into(),
            ty,
        }
    }
}

/// `function name(params) [: ty] = body`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub params: Vec<FunctionParameter>,
    pub return_type: Option<TypeId>,
    pub body: Expr,
}

/// Host function callable from Tiger code
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

/// Function whose body is supplied by the host
#[derive(Clone, Serialize)]
pub struct NativeFunctionDeclaration {
    pub name: String,
    pub params: Vec<FunctionParameter>,
    pub return_type: Option<TypeId>,
    #[serde(skip)]
    pub function: NativeFn,
}

impl NativeFunctionDeclaration {
    pub fn new(
        name: impl Into<String>,
        params: Vec<FunctionParameter>,
        return_type: Option<TypeId>,
        function: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        NativeFunctionDeclaration {
            name: name.into(),
            params,
            return_type,
            function: Rc::new(function),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.function)(args)
    }
}

impl PartialEq for NativeFunctionDeclaration {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.params == other.params
            && self.return_type == other.return_type
            && Rc::ptr_eq(&self.function, &other.function)
    }
}

impl std::fmt::Debug for NativeFunctionDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunctionDeclaration")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}
