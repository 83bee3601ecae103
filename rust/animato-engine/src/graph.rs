//! Mock dataflow engine: a tree evaluator for expanded worklet modules.
//!
//! The engine reads the module's `animato/engine` import to learn which
//! local names are engine functions, binds `let` declarations in order,
//! and evaluates expression trees on demand. `cond`, `and` and `or` are
//! lazy; everything else evaluates its arguments first. It exists to pin
//! down what expanded output means so the compiler can be checked against
//! the imperative evaluator in [`crate::reference`].

use std::collections::HashMap;

use animato_compiler::compiler::ast::{BinOp, Expr, Program, Stmt, UnaryOp};
use animato_compiler::compiler::ops;
use thiserror::Error;

use crate::value::{bool_num, numeric_binary, Cell, Val};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("undefined name `{0}`")]
    Undefined(String),
    #[error("`{0}` is not an engine function")]
    NotCallable(String),
    #[error("unknown engine export `{0}`")]
    UnknownExport(String),
    #[error("`{name}` expects {expected} arguments, got {got}")]
    Arity {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("`set` needs a cell as its first argument")]
    SetTarget,
    #[error("{0} cannot be evaluated")]
    Unsupported(&'static str),
}

/// One engine function. Purely numeric ones carry the operator they apply.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Builtin {
    Value,
    Block,
    Cond,
    Set,
    Defined,
    Not,
    And,
    Or,
    Numeric(BinOp),
}

impl Builtin {
    fn from_name(name: &str) -> Option<Builtin> {
        Some(match name {
            "value" => Builtin::Value,
            "block" => Builtin::Block,
            "cond" => Builtin::Cond,
            "set" => Builtin::Set,
            "defined" => Builtin::Defined,
            "not" => Builtin::Not,
            "and" => Builtin::And,
            "or" => Builtin::Or,
            "add" => Builtin::Numeric(BinOp::Add),
            "sub" => Builtin::Numeric(BinOp::Sub),
            "multiply" => Builtin::Numeric(BinOp::Mul),
            "divide" => Builtin::Numeric(BinOp::Div),
            "pow" => Builtin::Numeric(BinOp::Pow),
            "modulo" => Builtin::Numeric(BinOp::Rem),
            "lessThan" => Builtin::Numeric(BinOp::Lt),
            "lessOrEq" => Builtin::Numeric(BinOp::LtEq),
            "greaterThan" => Builtin::Numeric(BinOp::Gt),
            "greaterOrEq" => Builtin::Numeric(BinOp::GtEq),
            "eq" => Builtin::Numeric(BinOp::StrictEq),
            "neq" => Builtin::Numeric(BinOp::StrictNe),
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Builtin::Value => "value",
            Builtin::Block => "block",
            Builtin::Cond => "cond",
            Builtin::Set => "set",
            Builtin::Defined => "defined",
            Builtin::Not => "not",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Numeric(op) => ops::binary_fn(op).unwrap_or("?"),
        }
    }
}

fn arity_error(builtin: Builtin, expected: &'static str, got: usize) -> EvalError {
    EvalError::Arity {
        name: builtin.name(),
        expected,
        got,
    }
}

#[derive(Debug, Default)]
pub struct Engine {
    vars: HashMap<String, Val>,
    builtins: HashMap<String, Builtin>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a named mutable cell, returning a handle for later inspection.
    pub fn define_cell(&mut self, name: &str, init: Option<f64>) -> Cell {
        let cell = match init {
            Some(n) => Cell::with(n),
            None => Cell::new(),
        };
        self.vars
            .insert(name.to_string(), Val::Cell(cell.clone()));
        cell
    }

    /// Seed a read-only numeric input.
    pub fn define_number(&mut self, name: &str, n: f64) {
        self.vars.insert(name.to_string(), Val::Num(n));
    }

    pub fn var(&self, name: &str) -> Option<&Val> {
        self.vars.get(name)
    }

    /// Run an expanded module top to bottom. Engine imports register
    /// builtins under their local alias, `let` bindings evaluate in order,
    /// and the value of the last statement comes back.
    pub fn run_program(&mut self, program: &Program) -> Result<Val, EvalError> {
        let mut last = Val::Undefined;
        for stmt in &program.body {
            match stmt {
                Stmt::Import(import) => {
                    if import.source != animato_compiler::ENGINE_MODULE {
                        continue;
                    }
                    for spec in &import.specifiers {
                        match Builtin::from_name(&spec.imported) {
                            Some(builtin) => {
                                self.builtins.insert(spec.local.clone(), builtin);
                            }
                            None => {
                                return Err(EvalError::UnknownExport(spec.imported.clone()))
                            }
                        }
                    }
                }
                Stmt::Let(decl) => {
                    let value = self.eval(&decl.init)?;
                    self.vars.insert(decl.name.clone(), value.clone());
                    last = value;
                }
                Stmt::Expr(stmt) => last = self.eval(&stmt.expr)?,
                Stmt::If(_) => return Err(EvalError::Unsupported("an `if` statement")),
                Stmt::Block(_) => return Err(EvalError::Unsupported("a block statement")),
                Stmt::Return(_) => {
                    return Err(EvalError::Unsupported("a module-level `return`"))
                }
            }
        }
        Ok(last)
    }

    pub fn eval(&self, expr: &Expr) -> Result<Val, EvalError> {
        match expr {
            Expr::Number(n, _) => Ok(Val::Num(*n)),
            Expr::Bool(b, _) => Ok(Val::Num(bool_num(*b))),
            Expr::Str(..) => Err(EvalError::Unsupported("a string literal")),
            Expr::Ident(name, _) => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::Undefined(name.clone())),
            Expr::Array(elements, _) => self.eval_seq(elements),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
                ..
            } => Ok(Val::Num(-self.eval(operand)?.as_f64())),
            Expr::Unary { .. } => Err(EvalError::Unsupported("a unary operator")),
            Expr::Binary {
                op, left, right, ..
            } => self.eval_binary(*op, left, right),
            Expr::Assign { .. } => Err(EvalError::Unsupported("an assignment")),
            Expr::Call { callee, args, .. } => self.eval_call(callee, args),
            Expr::Arrow { .. } => Err(EvalError::Unsupported("an arrow function")),
        }
    }

    /// Evaluate expressions in order, yielding the last. An empty sequence
    /// yields undefined.
    fn eval_seq(&self, elements: &[Expr]) -> Result<Val, EvalError> {
        let mut last = Val::Undefined;
        for element in elements {
            last = self.eval(element)?;
        }
        Ok(last)
    }

    fn eval_binary(&self, op: BinOp, left: &Expr, right: &Expr) -> Result<Val, EvalError> {
        match op {
            BinOp::And => {
                let lhs = self.eval(left)?;
                if lhs.is_truthy() {
                    self.eval(right)
                } else {
                    Ok(lhs)
                }
            }
            BinOp::Or => {
                let lhs = self.eval(left)?;
                if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.eval(right)
                }
            }
            _ => {
                let lhs = self.eval(left)?.as_f64();
                let rhs = self.eval(right)?.as_f64();
                Ok(Val::Num(numeric_binary(op, lhs, rhs)))
            }
        }
    }

    fn eval_call(&self, callee: &Expr, args: &[Expr]) -> Result<Val, EvalError> {
        let name = match callee {
            Expr::Ident(name, _) => name,
            _ => return Err(EvalError::Unsupported("a computed call")),
        };
        match self.builtins.get(name).copied() {
            Some(builtin) => self.eval_builtin(builtin, args),
            None => Err(EvalError::NotCallable(name.clone())),
        }
    }

    fn eval_builtin(&self, builtin: Builtin, args: &[Expr]) -> Result<Val, EvalError> {
        match builtin {
            Builtin::Value => match args {
                [] => Ok(Val::Cell(Cell::new())),
                [init] => Ok(Val::Cell(Cell::with(self.eval(init)?.as_f64()))),
                _ => Err(arity_error(builtin, "zero or one", args.len())),
            },
            Builtin::Block => match args {
                [Expr::Array(elements, _)] => self.eval_seq(elements),
                [single] => self.eval(single),
                _ => Err(arity_error(builtin, "one", args.len())),
            },
            Builtin::Cond => match args {
                [test, consequent] => {
                    if self.eval(test)?.is_truthy() {
                        self.eval(consequent)
                    } else {
                        Ok(Val::Undefined)
                    }
                }
                [test, consequent, alternate] => {
                    if self.eval(test)?.is_truthy() {
                        self.eval(consequent)
                    } else {
                        self.eval(alternate)
                    }
                }
                _ => Err(arity_error(builtin, "two or three", args.len())),
            },
            Builtin::Set => match args {
                [target, value] => {
                    let target = self.eval(target)?;
                    let Val::Cell(cell) = target else {
                        return Err(EvalError::SetTarget);
                    };
                    let value = self.eval(value)?;
                    match value.number() {
                        Some(n) => cell.set(n),
                        None => cell.clear(),
                    }
                    Ok(value)
                }
                _ => Err(arity_error(builtin, "two", args.len())),
            },
            Builtin::Defined => match args {
                [arg] => Ok(Val::Num(bool_num(self.eval(arg)?.is_defined()))),
                _ => Err(arity_error(builtin, "one", args.len())),
            },
            Builtin::Not => match args {
                [arg] => Ok(Val::Num(bool_num(!self.eval(arg)?.is_truthy()))),
                _ => Err(arity_error(builtin, "one", args.len())),
            },
            Builtin::And => self.eval_junction(args, false),
            Builtin::Or => self.eval_junction(args, true),
            Builtin::Numeric(op) => match args {
                [left, right] => {
                    let lhs = self.eval(left)?.as_f64();
                    let rhs = self.eval(right)?.as_f64();
                    Ok(Val::Num(numeric_binary(op, lhs, rhs)))
                }
                _ => Err(arity_error(builtin, "two", args.len())),
            },
        }
    }

    /// Short-circuit left to right, returning the deciding operand.
    /// `stop_on` is the operand truthiness that ends evaluation early.
    fn eval_junction(&self, args: &[Expr], stop_on: bool) -> Result<Val, EvalError> {
        let mut last = Val::Undefined;
        for arg in args {
            last = self.eval(arg)?;
            if last.is_truthy() == stop_on {
                break;
            }
        }
        Ok(last)
    }
}
