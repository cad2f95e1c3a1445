//! Parser for the Tiger language
//!
//! A recursive descent parser that produces an AST from a token stream.
//! Binary operators are handled by precedence climbing, lowest to highest:
//! `|`, `&`, comparisons (non-associative), `+ -`, `* /`, unary minus.

use crate::ast::*;
use crate::common::Span;
use crate::diagnostics::{ParseError, SourceFile};
use crate::lexer::{Token, TokenKind};
use indexmap::IndexMap;

type Result<T> = std::result::Result<T, ParseError>;

/// Parse a token stream into a program
pub fn parse(tokens: &[Token], source: &str) -> Result<Program> {
    parse_file(tokens, &SourceFile::anonymous(source))
}

/// Parse a token stream lexed from `file`; positions in errors refer to it
pub fn parse_file(tokens: &[Token], file: &SourceFile) -> Result<Program> {
    let mut parser = Parser::new(tokens, file);
    parser.parse_program()
}

/// Parser state
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    file: &'a SourceFile,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], file: &'a SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            file,
        }
    }

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    fn peek(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek())
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let tok = self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn span(&self) -> Span {
        self.current()
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(self.file.content.len()))
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.span(), self.file)
    }

    fn found(&self) -> String {
        match self.current() {
            Some(tok) if tok.kind == TokenKind::Eof => "end of input".to_string(),
            Some(tok) if tok.kind == TokenKind::StringLit => format!("string {:?}", tok.text),
            Some(tok) if tok.kind.is_keyword() => format!("keyword `{}`", tok.text),
            Some(tok) if tok.kind.is_literal() => format!("literal `{}`", tok.text),
            Some(tok) if tok.kind.is_operator() => format!("operator `{}`", tok.text),
            Some(tok) => format!("`{}`", tok.text),
            None => "end of input".to_string(),
        }
    }

    /// Consume the current token if it is `kind`
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'a Token> {
        if self.at(kind) {
            self.advance()
                .ok_or_else(|| self.error(format!("Expected `{}`, found end of input", kind)))
        } else {
            Err(self.error(format!("Expected `{}`, found {}", kind, self.found())))
        }
    }

    // ==================== PROGRAM ====================

    fn parse_program(&mut self) -> Result<Program> {
        let program = if self.at_any(&[TokenKind::Type, TokenKind::Var, TokenKind::Function]) {
            Program::Declaration(self.parse_declaration()?)
        } else {
            Program::Expr(self.parse_expr()?)
        };

        if !self.at(TokenKind::Eof) {
            return Err(self.error(format!(
                "Unexpected {} after end of program",
                self.found()
            )));
        }

        Ok(program)
    }

    // ==================== DECLARATIONS ====================

    fn parse_declaration(&mut self) -> Result<Declaration> {
        match self.peek() {
            TokenKind::Type => self.parse_type_declaration(),
            TokenKind::Var => self.parse_variable_declaration(),
            TokenKind::Function => self.parse_function_declaration(),
            _ => Err(self.error(format!("Expected declaration, found {}", self.found()))),
        }
    }

    fn parse_type_declaration(&mut self) -> Result<Declaration> {
        self.expect(TokenKind::Type)?;
        let name = self.parse_ident()?;
        self.expect(TokenKind::Eq)?;
        let ty = self.parse_type()?;
        Ok(Declaration::Type(TypeDeclaration { name, ty }))
    }

    fn parse_type(&mut self) -> Result<Type> {
        match self.peek() {
            TokenKind::Ident => Ok(Type::Id(self.parse_type_id()?)),
            TokenKind::Array => {
                self.advance();
                self.expect(TokenKind::Of)?;
                Ok(Type::Array(self.parse_type_id()?))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = IndexMap::new();
                if !self.at(TokenKind::RBrace) {
                    loop {
                        let span = self.span();
                        let name = self.parse_ident()?;
                        self.expect(TokenKind::Colon)?;
                        let ty = self.parse_type_id()?;
                        if fields.insert(name.clone(), ty).is_some() {
                            return Err(ParseError::new(
                                format!("Duplicate field `{}` in record type", name),
                                span,
                                self.file,
                            ));
                        }
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBrace)?;
                Ok(Type::Record(fields))
            }
            _ => Err(self.error(format!("Expected type, found {}", self.found()))),
        }
    }

    fn parse_variable_declaration(&mut self) -> Result<Declaration> {
        self.expect(TokenKind::Var)?;
        let name = self.parse_ident()?;
        let ty = self.parse_type_annotation()?;
        self.expect(TokenKind::ColonEq)?;
        let init = self.parse_expr()?;
        Ok(Declaration::Variable(VariableDeclaration { name, ty, init }))
    }

    fn parse_function_declaration(&mut self) -> Result<Declaration> {
        self.expect(TokenKind::Function)?;
        let name = self.parse_ident()?;
        let params = self.parse_params()?;
        let return_type = self.parse_type_annotation()?;
        self.expect(TokenKind::Eq)?;
        let body = self.parse_expr()?;
        Ok(Declaration::Function(std::rc::Rc::new(FunctionDeclaration {
            name,
            params,
            return_type,
            body,
        })))
    }

    fn parse_params(&mut self) -> Result<Vec<FunctionParameter>> {
        self.expect(TokenKind::LParen)?;
        let mut params: Vec<FunctionParameter> = Vec::new();

        if !self.at(TokenKind::RParen) {
            loop {
                let span = self.span();
                let name = self.parse_ident()?;
                if params.iter().any(|p| p.name == name) {
                    return Err(ParseError::new(
                        format!("Duplicate parameter `{}`", name),
                        span,
                        self.file,
                    ));
                }
                let ty = self.parse_type_annotation()?;
                params.push(FunctionParameter { name, ty });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    /// Optional `: type-id`
    fn parse_type_annotation(&mut self) -> Result<Option<TypeId>> {
        if self.at(TokenKind::Colon) {
            self.advance();
            Ok(Some(self.parse_type_id()?))
        } else {
            Ok(None)
        }
    }

    // ==================== EXPRESSIONS ====================

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_with_precedence(0)
    }

    fn parse_expr_with_precedence(&mut self, min_prec: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        while let Some((op, prec, assoc)) = self.binary_op_info() {
            if prec < min_prec {
                break;
            }

            self.advance();
            let right = self.parse_expr_with_precedence(prec + 1)?;
            left = Expr::binary(op, left, right);

            if assoc == Assoc::None {
                if let Some((next, next_prec, _)) = self.binary_op_info() {
                    if next_prec == prec {
                        return Err(self.error(format!(
                            "Comparison operators are non-associative; parenthesize before `{}`",
                            next.symbol()
                        )));
                    }
                }
            }
        }

        Ok(left)
    }

    fn binary_op_info(&self) -> Option<(BinaryOp, u8, Assoc)> {
        let (op, prec, assoc) = match self.peek() {
            TokenKind::Pipe => (BinaryOp::Or, 1, Assoc::Left),
            TokenKind::Amp => (BinaryOp::And, 2, Assoc::Left),
            TokenKind::Eq => (BinaryOp::Equals, 3, Assoc::None),
            TokenKind::Ne => (BinaryOp::NotEquals, 3, Assoc::None),
            TokenKind::Lt => (BinaryOp::LessThan, 3, Assoc::None),
            TokenKind::Le => (BinaryOp::LessOrEqual, 3, Assoc::None),
            TokenKind::Gt => (BinaryOp::GreaterThan, 3, Assoc::None),
            TokenKind::Ge => (BinaryOp::GreaterOrEqual, 3, Assoc::None),
            TokenKind::Plus => (BinaryOp::Add, 4, Assoc::Left),
            TokenKind::Minus => (BinaryOp::Subtract, 4, Assoc::Left),
            TokenKind::Star => (BinaryOp::Multiply, 5, Assoc::Left),
            TokenKind::Slash => (BinaryOp::Divide, 5, Assoc::Left),
            _ => return None,
        };
        Some((op, prec, assoc))
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if !self.at(TokenKind::Minus) {
            return self.parse_primary();
        }
        self.advance();

        // `-42` is a literal; any other operand becomes `0 - operand`
        if self.at(TokenKind::IntLit) {
            let span = self.span();
            let magnitude = self.parse_int_magnitude()?;
            return match 0i64.checked_sub_unsigned(magnitude) {
                Some(value) => Ok(Expr::Integer(value)),
                None => Err(self.out_of_range(&format!("-{}", magnitude), span)),
            };
        }
        let operand = self.parse_unary()?;
        Ok(Expr::binary(BinaryOp::Subtract, Expr::Integer(0), operand))
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek() {
            TokenKind::IntLit => Ok(Expr::Integer(self.parse_int_literal()?)),
            TokenKind::StringLit => {
                let text = self.expect(TokenKind::StringLit)?.text.clone();
                Ok(Expr::String(text))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Nil)
            }

            TokenKind::LParen => self.parse_sequence(),

            TokenKind::Ident => {
                let name = self.parse_ident()?;
                self.parse_named_expr(name)
            }

            TokenKind::New => {
                self.advance();
                let type_id = self.parse_type_id()?;
                Ok(Expr::ObjectCreation { type_id })
            }

            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Let => self.parse_let(),

            TokenKind::Break => {
                self.advance();
                Ok(Expr::Break)
            }

            _ => Err(self.error(format!("Expected expression, found {}", self.found()))),
        }
    }

    fn parse_int_literal(&mut self) -> Result<i64> {
        let span = self.span();
        let magnitude = self.parse_int_magnitude()?;
        i64::try_from(magnitude).map_err(|_| self.out_of_range(&magnitude.to_string(), span))
    }

    fn parse_int_magnitude(&mut self) -> Result<u64> {
        let span = self.span();
        let text = &self.expect(TokenKind::IntLit)?.text;
        text.parse().map_err(|_| self.out_of_range(text, span))
    }

    fn out_of_range(&self, literal: &str, span: Span) -> ParseError {
        ParseError::new(format!("Integer literal `{}` out of range", literal), span, self.file)
    }

    /// `( )`, `(e)` or `(e1; e2; ...)`; always a sequence node
    fn parse_sequence(&mut self) -> Result<Expr> {
        self.expect(TokenKind::LParen)?;
        let exprs = self.parse_expr_list(TokenKind::RParen)?;
        self.expect(TokenKind::RParen)?;
        Ok(Expr::Sequence(exprs))
    }

    /// Semicolon-separated expressions up to (not including) `close`
    fn parse_expr_list(&mut self, close: TokenKind) -> Result<Vec<Expr>> {
        let mut exprs = Vec::new();
        if self.at(close) {
            return Ok(exprs);
        }
        exprs.push(self.parse_expr()?);
        while self.at(TokenKind::Semi) {
            self.advance();
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    /// Everything that starts with an identifier: calls, record and array
    /// creation, lvalues and assignments
    fn parse_named_expr(&mut self, name: String) -> Result<Expr> {
        let mut lvalue = match self.peek() {
            TokenKind::LParen => return self.parse_call(name),
            TokenKind::LBrace => return self.parse_record_creation(TypeId(name)),
            TokenKind::LBracket => {
                self.advance();
                let index = self.parse_expr()?;
                self.expect(TokenKind::RBracket)?;
                if self.at(TokenKind::Of) {
                    self.advance();
                    let init = self.parse_expr()?;
                    return Ok(Expr::ArrayCreation {
                        element_type: TypeId(name),
                        size: Box::new(index),
                        init: Box::new(init),
                    });
                }
                LValue::new(name).index(index)
            }
            _ => LValue::new(name),
        };

        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    lvalue = lvalue.field(self.parse_ident()?);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    lvalue = lvalue.index(index);
                }
                _ => break,
            }
        }

        if self.at(TokenKind::ColonEq) {
            self.advance();
            let value = self.parse_expr()?;
            return Ok(Expr::assign(lvalue, value));
        }

        Ok(Expr::LValue(lvalue))
    }

    fn parse_call(&mut self, name: String) -> Result<Expr> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Expr::FunctionCall { name, args })
    }

    fn parse_record_creation(&mut self, type_id: TypeId) -> Result<Expr> {
        self.expect(TokenKind::LBrace)?;
        let mut fields = IndexMap::new();

        if !self.at(TokenKind::RBrace) {
            loop {
                let span = self.span();
                let name = self.parse_ident()?;
                self.expect(TokenKind::Eq)?;
                let value = self.parse_expr()?;
                if fields.insert(name.clone(), value).is_some() {
                    return Err(ParseError::new(
                        format!("Field `{}` initialized twice", name),
                        span,
                        self.file,
                    ));
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::RBrace)?;
        Ok(Expr::RecordCreation { type_id, fields })
    }

    fn parse_if(&mut self) -> Result<Expr> {
        self.expect(TokenKind::If)?;
        let condition = Box::new(self.parse_expr()?);
        self.expect(TokenKind::Then)?;
        let then_branch = Box::new(self.parse_expr()?);
        let else_branch = if self.at(TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        Ok(Expr::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Expr> {
        self.expect(TokenKind::While)?;
        let condition = Box::new(self.parse_expr()?);
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_expr()?);
        Ok(Expr::While { condition, body })
    }

    fn parse_for(&mut self) -> Result<Expr> {
        self.expect(TokenKind::For)?;
        let var = self.parse_ident()?;
        self.expect(TokenKind::ColonEq)?;
        let start = Box::new(self.parse_expr()?);
        self.expect(TokenKind::To)?;
        let end = Box::new(self.parse_expr()?);
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_expr()?);
        Ok(Expr::For {
            var,
            start,
            end,
            body,
        })
    }

    fn parse_let(&mut self) -> Result<Expr> {
        self.expect(TokenKind::Let)?;
        let mut declarations = Vec::new();
        while !self.at(TokenKind::In) {
            declarations.push(self.parse_declaration()?);
        }
        self.expect(TokenKind::In)?;
        let body = self.parse_expr_list(TokenKind::End)?;
        self.expect(TokenKind::End)?;
        Ok(Expr::Let { declarations, body })
    }

    // ==================== HELPERS ====================

    fn parse_ident(&mut self) -> Result<String> {
        if self.at(TokenKind::Ident) {
            Ok(self.expect(TokenKind::Ident)?.text.clone())
        } else {
            Err(self.error(format!("Expected identifier, found {}", self.found())))
        }
    }

    fn parse_type_id(&mut self) -> Result<TypeId> {
        Ok(TypeId(self.parse_ident()?))
    }
}

/// Associativity for binary operators
#[derive(Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    /// Comparisons: `a < b < c` is rejected
    None,
}
