//! Stable textual rendering of AST nodes, used in diagnostics and tests

use std::fmt::{self, Display, Formatter};

use super::*;

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "]")
}

fn write_map<T: Display>(f: &mut Formatter<'_>, sep: &str, map: &IndexMap<String, T>) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}{}{}", key, sep, value)?;
    }
    write!(f, "}}")
}

fn write_optional<T: Display>(f: &mut Formatter<'_>, value: Option<&T>) -> fmt::Result {
    match value {
        Some(value) => write!(f, "{}", value),
        None => write!(f, "None"),
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Program::Expr(expr) => write!(f, "{}", expr),
            Program::Declaration(decl) => write!(f, "{}", decl),
        }
    }
}

impl Display for TypeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Type::Id(id) => write!(f, "TypeId({})", id),
            Type::Array(element) => write!(f, "ArrayType({})", element),
            Type::Record(fields) => {
                write!(f, "RecordType(")?;
                write_map(f, ": ", fields)?;
                write!(f, ")")
            }
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Nil => write!(f, "Nil"),
            Expr::Integer(n) => write!(f, "Integer({})", n),
            Expr::String(s) => write!(f, "String({:?})", s),
            Expr::ArrayCreation {
                element_type,
                size,
                init,
            } => write!(
                f,
                "ArrayCreation(type={}, size={}, init={})",
                element_type, size, init
            ),
            Expr::RecordCreation { type_id, fields } => {
                write!(f, "RecordCreation(type={}, fields=", type_id)?;
                write_map(f, "=", fields)?;
                write!(f, ")")
            }
            Expr::ObjectCreation { type_id } => write!(f, "ObjectCreation(type={})", type_id),
            Expr::LValue(lvalue) => write!(f, "{}", lvalue),
            Expr::FunctionCall { name, args } => {
                write!(f, "FunctionCall(name={}, args=", name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Assign { target, value } => {
                write!(f, "Assign(target={}, value={})", target, value)
            }
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "If(condition={}, then={}, else=", condition, then_branch)?;
                write_optional(f, else_branch.as_deref())?;
                write!(f, ")")
            }
            Expr::While { condition, body } => {
                write!(f, "While(condition={}, body={})", condition, body)
            }
            Expr::For {
                var,
                start,
                end,
                body,
            } => write!(
                f,
                "For(var={}, start={}, end={}, body={})",
                var, start, end, body
            ),
            Expr::Break => write!(f, "Break"),
            Expr::Let { declarations, body } => {
                write!(f, "Let(declarations=")?;
                write_list(f, declarations)?;
                write!(f, ", body=")?;
                write_list(f, body)?;
                write!(f, ")")
            }
            Expr::Sequence(exprs) => {
                write!(f, "Sequence(")?;
                write_list(f, exprs)?;
                write!(f, ")")
            }
            Expr::Binary { op, left, right } => {
                write!(f, "{}({}, {})", op.name(), left, right)
            }
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Display for LValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "LValue({}", self.name)?;
        for step in &self.path {
            write!(f, "{}", step)?;
        }
        write!(f, ")")
    }
}

impl Display for Accessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Field(field) => write!(f, ".{}", field),
            Accessor::Index(index) => write!(f, "[{}]", index),
        }
    }
}

impl Display for Declaration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Type(decl) => {
                write!(f, "TypeDeclaration(name={}, type={})", decl.name, decl.ty)
            }
            Declaration::Variable(decl) => {
                write!(f, "VariableDeclaration(name={}, type=", decl.name)?;
                write_optional(f, decl.ty.as_ref())?;
                write!(f, ", init={})", decl.init)
            }
            Declaration::Function(decl) => {
                write!(f, "FunctionDeclaration(name={}, params=", decl.name)?;
                write_list(f, &decl.params)?;
                write!(f, ", return_type=")?;
                write_optional(f, decl.return_type.as_ref())?;
                write!(f, ", body={})", decl.body)
            }
            Declaration::Native(decl) => {
                write!(f, "NativeFunctionDeclaration(name={}, params=", decl.name)?;
                write_list(f, &decl.params)?;
                write!(f, ", return_type=")?;
                write_optional(f, decl.return_type.as_ref())?;
                write!(f, ")")
            }
        }
    }
}

impl Display for FunctionParameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.ty {
            Some(ty) => write!(f, "{}: {}", self.name, ty),
            None => write!(f, "{}", self.name),
        }
    }
}
