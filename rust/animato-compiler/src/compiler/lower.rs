//! Lowering to engine calls.
//!
//! After linearization a worklet body is straight-line code built from
//! assignments, conditionals, blocks and a small expression grammar. Each
//! statement lowers to exactly one side-effect-free engine expression:
//! assignments become `set`, conditionals become `cond`, blocks become
//! arrays that the engine evaluates in order, and operators become the
//! engine function the table in `ops` names. Anything outside that shape
//! is a hard error here rather than a silent miscompile.

use thiserror::Error;

use super::ast::*;
use super::ops;
use super::scope::ImportBindings;
use super::tokens::Span;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LowerError {
    #[error("operator `{op}` has no engine equivalent at line {line}, col {col}")]
    UnsupportedOperator { op: String, line: usize, col: usize },
    #[error("destructuring assignment is not supported in a worklet at line {line}, col {col}")]
    PatternTarget { line: usize, col: usize },
    #[error("assignment target must be a plain identifier at line {line}, col {col}")]
    InvalidAssignTarget { line: usize, col: usize },
    #[error("assignment is only allowed as a statement at line {line}, col {col}")]
    AssignmentInExpression { line: usize, col: usize },
    #[error("{what} is not supported in a worklet at line {line}, col {col}")]
    UnsupportedConstruct {
        what: String,
        line: usize,
        col: usize,
    },
}

impl LowerError {
    pub fn line_col(&self) -> (usize, usize) {
        match self {
            LowerError::UnsupportedOperator { line, col, .. }
            | LowerError::PatternTarget { line, col }
            | LowerError::InvalidAssignTarget { line, col }
            | LowerError::AssignmentInExpression { line, col }
            | LowerError::UnsupportedConstruct { line, col, .. } => (*line, *col),
        }
    }
}

pub struct Lowerer<'a> {
    imports: &'a ImportBindings,
}

impl<'a> Lowerer<'a> {
    pub fn new(imports: &'a ImportBindings) -> Self {
        Self { imports }
    }

    /// Lower a whole worklet body into the elements of its outermost block.
    pub fn lower_body(&self, stmts: Vec<Stmt>) -> Result<Vec<Expr>, LowerError> {
        stmts.into_iter().map(|stmt| self.lower_stmt(stmt)).collect()
    }

    /// One statement becomes one engine expression.
    pub fn lower_stmt(&self, stmt: Stmt) -> Result<Expr, LowerError> {
        match stmt {
            Stmt::Expr(es) => match es.expr {
                Expr::Assign {
                    op,
                    target,
                    value,
                    span,
                } => self.lower_assign(op, *target, *value, span),
                other => self.lower_expr(other),
            },
            Stmt::If(if_stmt) => self.lower_if(if_stmt),
            Stmt::Block(block) => self.lower_block(block),
            Stmt::Return(ret) => self.lower_expr(ret.argument),
            Stmt::Let(decl) => Err(LowerError::UnsupportedConstruct {
                what: format!("`{}` declaration", decl.kind.keyword()),
                line: decl.span.line,
                col: decl.span.col,
            }),
            Stmt::Import(import) => Err(LowerError::UnsupportedConstruct {
                what: "import".to_string(),
                line: import.span.line,
                col: import.span.col,
            }),
        }
    }

    pub fn lower_expr(&self, expr: Expr) -> Result<Expr, LowerError> {
        match expr {
            Expr::Assign { span, .. } => Err(LowerError::AssignmentInExpression {
                line: span.line,
                col: span.col,
            }),
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                let left = self.lower_expr(*left)?;
                let right = self.lower_expr(*right)?;
                self.binary_call(op, left, right, span)
            }
            Expr::Unary { op, operand, span } => self.lower_unary(op, *operand, span),
            Expr::Call { callee, args, span } => {
                let callee = Box::new(self.lower_expr(*callee)?);
                let args = args
                    .into_iter()
                    .map(|arg| self.lower_expr(arg))
                    .collect::<Result<_, _>>()?;
                Ok(Expr::Call { callee, args, span })
            }
            Expr::Array(elements, span) => {
                let elements = elements
                    .into_iter()
                    .map(|element| self.lower_expr(element))
                    .collect::<Result<_, _>>()?;
                Ok(Expr::Array(elements, span))
            }
            Expr::Arrow { span, .. } => Err(LowerError::UnsupportedConstruct {
                what: "a nested function".to_string(),
                line: span.line,
                col: span.col,
            }),
            other => Ok(other),
        }
    }

    fn lower_if(&self, if_stmt: IfStmt) -> Result<Expr, LowerError> {
        let span = if_stmt.span;
        let test = self.lower_expr(if_stmt.test)?;
        let consequent = self.lower_branch(*if_stmt.consequent)?;
        let mut args = vec![test, consequent];
        if let Some(alt) = if_stmt.alternate {
            args.push(self.lower_branch(*alt)?);
        }
        Ok(self.imports.call("cond", args, span))
    }

    /// A braced branch lowers to an array so the engine runs its statements
    /// in order; any other branch lowers to a single expression.
    fn lower_branch(&self, stmt: Stmt) -> Result<Expr, LowerError> {
        match stmt {
            Stmt::Block(block) => self.lower_block(block),
            other => self.lower_stmt(other),
        }
    }

    fn lower_block(&self, block: BlockStmt) -> Result<Expr, LowerError> {
        let span = block.span;
        let elements = self.lower_body(block.body)?;
        Ok(Expr::Array(elements, span))
    }

    fn lower_assign(
        &self,
        op: AssignOp,
        target: Expr,
        value: Expr,
        span: Span,
    ) -> Result<Expr, LowerError> {
        let target = match target {
            Expr::Ident(name, target_span) => Expr::Ident(name, target_span),
            Expr::Array(_, target_span) => {
                return Err(LowerError::PatternTarget {
                    line: target_span.line,
                    col: target_span.col,
                })
            }
            other => {
                let target_span = other.span();
                return Err(LowerError::InvalidAssignTarget {
                    line: target_span.line,
                    col: target_span.col,
                });
            }
        };
        let value = match op.binary() {
            // `x += e` writes back `add(x, e)`.
            Some(binary) => {
                let rhs = self.lower_expr(value)?;
                self.binary_call(binary, target.clone(), rhs, span)?
            }
            None => self.lower_expr(value)?,
        };
        Ok(self.imports.call("set", vec![target, value], span))
    }

    fn lower_unary(&self, op: UnaryOp, operand: Expr, span: Span) -> Result<Expr, LowerError> {
        let operand = self.lower_expr(operand)?;
        match ops::unary_fn(op) {
            Some(name) => Ok(self.imports.call(name, vec![operand], span)),
            // Negation stays literal; the engine evaluates it natively.
            None if op == UnaryOp::Neg => Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            }),
            None => Err(LowerError::UnsupportedOperator {
                op: op.to_string(),
                line: span.line,
                col: span.col,
            }),
        }
    }

    fn binary_call(
        &self,
        op: BinOp,
        left: Expr,
        right: Expr,
        span: Span,
    ) -> Result<Expr, LowerError> {
        match ops::binary_fn(op) {
            Some(name) => Ok(self.imports.call(name, vec![left, right], span)),
            None => Err(LowerError::UnsupportedOperator {
                op: op.to_string(),
                line: span.line,
                col: span.col,
            }),
        }
    }
}
