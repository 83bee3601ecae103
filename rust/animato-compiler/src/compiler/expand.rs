//! Worklet expansion.
//!
//! The driver for the whole pipeline. It finds `define` and `exec` call
//! sites by following the names a file binds from the macro module, runs
//! each `define` body through normalization, linearization and lowering,
//! declares one sentinel cell per call site, injects a single aliased
//! engine import, and removes the macro import. A file with no macro
//! import passes through untouched, which also makes expansion idempotent:
//! expanded output no longer imports the macro module.

use std::collections::HashMap;

use thiserror::Error;

use super::ast::*;
use super::linearize::linearize_scope;
use super::lower::{LowerError, Lowerer};
use super::scope::{ImportBindings, Scope};
use super::tokens::Span;

/// Module whose `define`/`exec` exports mark worklet call sites.
pub const MACRO_MODULE: &str = "animato/macro";
/// Module the injected engine import pulls node constructors from.
pub const ENGINE_MODULE: &str = "animato/engine";

#[derive(Debug, Clone)]
pub struct ExpandOptions {
    pub macro_module: String,
    pub engine_module: String,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            macro_module: MACRO_MODULE.to_string(),
            engine_module: ENGINE_MODULE.to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpandError {
    #[error("`{name}` expects a single arrow function argument at line {line}, col {col}")]
    BadMacroCall {
        name: String,
        line: usize,
        col: usize,
    },
    #[error(transparent)]
    Lower(#[from] LowerError),
}

impl ExpandError {
    pub fn line_col(&self) -> (usize, usize) {
        match self {
            ExpandError::BadMacroCall { line, col, .. } => (*line, *col),
            ExpandError::Lower(inner) => inner.line_col(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MacroKind {
    Define,
    Exec,
}

/// Expand every macro call site in `program`.
pub fn expand_program(program: Program, options: &ExpandOptions) -> Result<Program, ExpandError> {
    let macros = macro_bindings(&program, &options.macro_module);
    if macros.is_empty() {
        return Ok(program);
    }
    let mut scope = Scope::of_program(&program);
    let imports = ImportBindings::generate(&mut scope);
    let mut rewriter = Rewriter {
        macros: &macros,
        scope: &mut scope,
        imports: &imports,
        pending: Vec::new(),
        used_engine: false,
    };
    let mut body = Vec::with_capacity(program.body.len());
    for stmt in program.body {
        if let Stmt::Import(ref import) = stmt {
            if import.source == options.macro_module {
                continue;
            }
        }
        let stmt = rewriter.rewrite_stmt(stmt)?;
        // Sentinel declarations land right before the statement whose
        // call sites created them.
        body.extend(rewriter.pending.drain(..));
        body.push(stmt);
    }
    if rewriter.used_engine {
        body.insert(0, imports.to_decl(&options.engine_module));
    }
    Ok(Program { body })
}

/// Names the file binds from the macro module, by local name so aliased
/// imports are found too. Unknown exports are ignored.
fn macro_bindings(program: &Program, module: &str) -> HashMap<String, MacroKind> {
    let mut macros = HashMap::new();
    for stmt in &program.body {
        if let Stmt::Import(import) = stmt {
            if import.source != module {
                continue;
            }
            for spec in &import.specifiers {
                let kind = match spec.imported.as_str() {
                    "define" => MacroKind::Define,
                    "exec" => MacroKind::Exec,
                    _ => continue,
                };
                macros.insert(spec.local.clone(), kind);
            }
        }
    }
    macros
}

struct Rewriter<'a> {
    macros: &'a HashMap<String, MacroKind>,
    scope: &'a mut Scope,
    imports: &'a ImportBindings,
    pending: Vec<Stmt>,
    used_engine: bool,
}

impl Rewriter<'_> {
    fn rewrite_stmt(&mut self, stmt: Stmt) -> Result<Stmt, ExpandError> {
        Ok(match stmt {
            Stmt::Expr(es) => Stmt::Expr(ExprStmt {
                expr: self.rewrite_expr(es.expr)?,
                span: es.span,
            }),
            Stmt::If(if_stmt) => {
                let test = self.rewrite_expr(if_stmt.test)?;
                let consequent = Box::new(self.rewrite_stmt(*if_stmt.consequent)?);
                let alternate = match if_stmt.alternate {
                    Some(alt) => Some(Box::new(self.rewrite_stmt(*alt)?)),
                    None => None,
                };
                Stmt::If(IfStmt {
                    test,
                    consequent,
                    alternate,
                    span: if_stmt.span,
                })
            }
            Stmt::Block(block) => {
                let body = block
                    .body
                    .into_iter()
                    .map(|stmt| self.rewrite_stmt(stmt))
                    .collect::<Result<_, _>>()?;
                Stmt::Block(BlockStmt {
                    body,
                    span: block.span,
                })
            }
            Stmt::Return(ret) => Stmt::Return(ReturnStmt {
                argument: self.rewrite_expr(ret.argument)?,
                span: ret.span,
            }),
            Stmt::Let(decl) => {
                let LetStmt {
                    kind,
                    name,
                    init,
                    span,
                } = decl;
                Stmt::Let(LetStmt {
                    kind,
                    name,
                    init: self.rewrite_expr(init)?,
                    span,
                })
            }
            other => other,
        })
    }

    /// Children first, so a call site nested in another expression is
    /// already expanded by the time its parent is inspected.
    fn rewrite_expr(&mut self, expr: Expr) -> Result<Expr, ExpandError> {
        Ok(match expr {
            Expr::Call { callee, args, span } => {
                let callee = self.rewrite_expr(*callee)?;
                let args = args
                    .into_iter()
                    .map(|arg| self.rewrite_expr(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                if let Expr::Ident(name, _) = &callee {
                    if let Some(kind) = self.macros.get(name) {
                        return self.rewrite_macro_call(*kind, name.clone(), args, span);
                    }
                }
                Expr::Call {
                    callee: Box::new(callee),
                    args,
                    span,
                }
            }
            Expr::Unary { op, operand, span } => Expr::Unary {
                op,
                operand: Box::new(self.rewrite_expr(*operand)?),
                span,
            },
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => Expr::Binary {
                op,
                left: Box::new(self.rewrite_expr(*left)?),
                right: Box::new(self.rewrite_expr(*right)?),
                span,
            },
            Expr::Assign {
                op,
                target,
                value,
                span,
            } => Expr::Assign {
                op,
                target,
                value: Box::new(self.rewrite_expr(*value)?),
                span,
            },
            Expr::Array(elements, span) => Expr::Array(
                elements
                    .into_iter()
                    .map(|element| self.rewrite_expr(element))
                    .collect::<Result<_, _>>()?,
                span,
            ),
            Expr::Arrow { body, span } => {
                let body = match body {
                    ArrowBody::Expr(expr) => ArrowBody::Expr(Box::new(self.rewrite_expr(*expr)?)),
                    ArrowBody::Block(stmts) => ArrowBody::Block(
                        stmts
                            .into_iter()
                            .map(|stmt| self.rewrite_stmt(stmt))
                            .collect::<Result<_, _>>()?,
                    ),
                };
                Expr::Arrow { body, span }
            }
            other => other,
        })
    }

    fn rewrite_macro_call(
        &mut self,
        kind: MacroKind,
        name: String,
        mut args: Vec<Expr>,
        span: Span,
    ) -> Result<Expr, ExpandError> {
        match kind {
            // `exec` hands its worklet straight to the caller.
            MacroKind::Exec => {
                if args.len() != 1 {
                    return Err(ExpandError::BadMacroCall {
                        name,
                        line: span.line,
                        col: span.col,
                    });
                }
                Ok(args.remove(0))
            }
            MacroKind::Define => {
                let body = match (args.len(), args.pop()) {
                    (1, Some(Expr::Arrow { body, .. })) => body,
                    _ => {
                        return Err(ExpandError::BadMacroCall {
                            name,
                            line: span.line,
                            col: span.col,
                        })
                    }
                };
                self.used_engine = true;
                let elements = match body {
                    ArrowBody::Block(stmts) => self.compile_worklet(stmts)?,
                    ArrowBody::Expr(expr) => vec![Lowerer::new(self.imports).lower_expr(*expr)?],
                };
                Ok(self
                    .imports
                    .call("block", vec![Expr::Array(elements, span)], span))
            }
        }
    }

    /// Compile one worklet body into the elements of its engine block.
    fn compile_worklet(&mut self, stmts: Vec<Stmt>) -> Result<Vec<Expr>, ExpandError> {
        let sentinel = self.scope.fresh("earlyReturn");
        self.pending.push(sentinel_decl(&sentinel, self.imports));
        let (mut stmts, _) = linearize_scope(stmts, &sentinel, self.imports);
        // The block's value is whatever the sentinel holds at the end.
        stmts.push(Stmt::Return(ReturnStmt {
            argument: Expr::Ident(sentinel, Span::dummy()),
            span: Span::dummy(),
        }));
        Ok(Lowerer::new(self.imports).lower_body(stmts)?)
    }
}

/// `let sentinel = value();`
fn sentinel_decl(name: &str, imports: &ImportBindings) -> Stmt {
    let span = Span::dummy();
    Stmt::Let(LetStmt {
        kind: DeclKind::Let,
        name: name.to_string(),
        init: imports.call("value", Vec::new(), span),
        span,
    })
}
