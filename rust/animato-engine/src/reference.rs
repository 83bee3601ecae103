//! Imperative reference evaluator for worklet bodies.
//!
//! Runs a worklet the way the source language would: statements execute in
//! order, `if` picks one branch, `return` ends the function. Differential
//! tests run this over the unexpanded source and [`crate::graph::Engine`]
//! over the compiled output; the two must agree on every input for the
//! expansion to be correct.

use std::collections::HashMap;

use animato_compiler::compiler::ast::{ArrowBody, BinOp, Expr, Program, Stmt, UnaryOp};

use crate::graph::EvalError;
use crate::value::{bool_num, numeric_binary, to_int32, truthy_num};

/// What executing a statement did to control flow.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Normal,
    Return(f64),
}

#[derive(Debug, Default)]
pub struct Interp {
    vars: HashMap<String, f64>,
}

impl Interp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_var(&mut self, name: &str, value: f64) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn var(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied()
    }

    pub fn run_arrow(&mut self, body: &ArrowBody) -> Result<f64, EvalError> {
        match body {
            ArrowBody::Expr(expr) => self.eval(expr),
            ArrowBody::Block(stmts) => self.run_body(stmts),
        }
    }

    /// Execute a worklet body. Falling off the end without a `return`
    /// yields NaN, the numeric reading of an undefined result.
    pub fn run_body(&mut self, body: &[Stmt]) -> Result<f64, EvalError> {
        match self.exec_stmts(body)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(f64::NAN),
        }
    }

    fn exec_stmts(&mut self, stmts: &[Stmt]) -> Result<Flow, EvalError> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Expr(s) => {
                self.eval(&s.expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(s) => Ok(Flow::Return(self.eval(&s.argument)?)),
            Stmt::If(s) => {
                if truthy_num(self.eval(&s.test)?) {
                    self.exec_stmt(&s.consequent)
                } else if let Some(alternate) = &s.alternate {
                    self.exec_stmt(alternate)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::Block(s) => self.exec_stmts(&s.body),
            Stmt::Let(_) => Err(EvalError::Unsupported("a `let` declaration")),
            Stmt::Import(_) => Err(EvalError::Unsupported("an import")),
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<f64, EvalError> {
        match expr {
            Expr::Number(n, _) => Ok(*n),
            Expr::Bool(b, _) => Ok(bool_num(*b)),
            Expr::Str(..) => Err(EvalError::Unsupported("a string literal")),
            Expr::Ident(name, _) => self
                .vars
                .get(name)
                .copied()
                .ok_or_else(|| EvalError::Undefined(name.clone())),
            Expr::Array(..) => Err(EvalError::Unsupported("an array literal")),
            Expr::Unary { op, operand, .. } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Not => bool_num(!truthy_num(value)),
                    UnaryOp::Neg => -value,
                    UnaryOp::Plus => value,
                    UnaryOp::BitNot => !to_int32(value) as f64,
                })
            }
            Expr::Binary {
                op, left, right, ..
            } => match op {
                BinOp::And => {
                    let lhs = self.eval(left)?;
                    if truthy_num(lhs) {
                        self.eval(right)
                    } else {
                        Ok(lhs)
                    }
                }
                BinOp::Or => {
                    let lhs = self.eval(left)?;
                    if truthy_num(lhs) {
                        Ok(lhs)
                    } else {
                        self.eval(right)
                    }
                }
                _ => {
                    let lhs = self.eval(left)?;
                    let rhs = self.eval(right)?;
                    Ok(numeric_binary(*op, lhs, rhs))
                }
            },
            Expr::Assign {
                op, target, value, ..
            } => {
                let Expr::Ident(name, _) = target.as_ref() else {
                    return Err(EvalError::Unsupported("a pattern assignment"));
                };
                let value = match op.binary() {
                    Some(binary) => {
                        let current = self
                            .vars
                            .get(name)
                            .copied()
                            .ok_or_else(|| EvalError::Undefined(name.clone()))?;
                        numeric_binary(binary, current, self.eval(value)?)
                    }
                    None => self.eval(value)?,
                };
                self.vars.insert(name.clone(), value);
                Ok(value)
            }
            Expr::Call { .. } => Err(EvalError::Unsupported("a host call")),
            Expr::Arrow { .. } => Err(EvalError::Unsupported("an arrow function")),
        }
    }
}

/// The first `define(() => ...)` worklet body in an unexpanded module: any
/// call whose single argument is an arrow counts, whatever local name the
/// macro was bound to.
pub fn first_worklet(program: &Program) -> Option<&ArrowBody> {
    fn scan_expr(expr: &Expr) -> Option<&ArrowBody> {
        match expr {
            Expr::Call { args, .. } => {
                if let [Expr::Arrow { body, .. }] = args.as_slice() {
                    return Some(body);
                }
                args.iter().find_map(scan_expr)
            }
            Expr::Assign { value, .. } => scan_expr(value),
            _ => None,
        }
    }
    program.body.iter().find_map(|stmt| match stmt {
        Stmt::Let(decl) => scan_expr(&decl.init),
        Stmt::Expr(stmt) => scan_expr(&stmt.expr),
        _ => None,
    })
}
