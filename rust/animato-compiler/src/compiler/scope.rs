//! Generated-identifier hygiene.
//!
//! The macro driver introduces identifiers into user files (engine import
//! locals, sentinel slots). `Scope` registers every name already present in
//! the file and hands out fresh underscore-prefixed names that cannot
//! collide; `ImportBindings` maps each canonical engine export to its
//! generated local.

use std::collections::{HashMap, HashSet};

use super::ast::*;
use super::ops::ENGINE_EXPORTS;
use super::tokens::Span;

#[derive(Debug, Default)]
pub struct Scope {
    used: HashSet<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every identifier that occurs anywhere in the program,
    /// whether binding or use. Conservative on purpose: a generated name
    /// must not shadow or collide with anything visible in the file.
    pub fn of_program(program: &Program) -> Self {
        let mut scope = Self::new();
        for stmt in &program.body {
            scope.collect_stmt(stmt);
        }
        scope
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.used.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// A fresh identifier derived from `base`: the first of `_base`,
    /// `_base2`, `_base3`, ... not yet in use. The returned name is
    /// registered immediately.
    pub fn fresh(&mut self, base: &str) -> String {
        let mut candidate = format!("_{}", base);
        let mut n = 1;
        while self.used.contains(&candidate) {
            n += 1;
            candidate = format!("_{}{}", base, n);
        }
        self.used.insert(candidate.clone());
        candidate
    }

    fn collect_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(s) => self.collect_expr(&s.expr),
            Stmt::If(s) => {
                self.collect_expr(&s.test);
                self.collect_stmt(&s.consequent);
                if let Some(alt) = &s.alternate {
                    self.collect_stmt(alt);
                }
            }
            Stmt::Block(s) => {
                for inner in &s.body {
                    self.collect_stmt(inner);
                }
            }
            Stmt::Return(s) => self.collect_expr(&s.argument),
            Stmt::Let(s) => {
                self.insert(s.name.clone());
                self.collect_expr(&s.init);
            }
            Stmt::Import(s) => {
                for spec in &s.specifiers {
                    self.insert(spec.local.clone());
                }
            }
        }
    }

    fn collect_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(..) | Expr::Bool(..) | Expr::Str(..) => {}
            Expr::Ident(name, _) => self.insert(name.clone()),
            Expr::Array(elements, _) => {
                for e in elements {
                    self.collect_expr(e);
                }
            }
            Expr::Unary { operand, .. } => self.collect_expr(operand),
            Expr::Binary { left, right, .. } => {
                self.collect_expr(left);
                self.collect_expr(right);
            }
            Expr::Assign { target, value, .. } => {
                self.collect_expr(target);
                self.collect_expr(value);
            }
            Expr::Call { callee, args, .. } => {
                self.collect_expr(callee);
                for a in args {
                    self.collect_expr(a);
                }
            }
            Expr::Arrow { body, .. } => match body {
                ArrowBody::Expr(e) => self.collect_expr(e),
                ArrowBody::Block(stmts) => {
                    for s in stmts {
                        self.collect_stmt(s);
                    }
                }
            },
        }
    }
}

/// Canonical engine export name to generated local identifier, for one file.
#[derive(Debug, Clone)]
pub struct ImportBindings {
    locals: HashMap<&'static str, String>,
}

impl ImportBindings {
    /// Allocate a local for every engine export through `scope`.
    pub fn generate(scope: &mut Scope) -> Self {
        let mut locals = HashMap::new();
        for name in ENGINE_EXPORTS {
            locals.insert(*name, scope.fresh(name));
        }
        Self { locals }
    }

    /// The local bound for a canonical name. Falls back to the canonical
    /// name itself for anything outside the export set.
    pub fn local<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.locals
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(canonical)
    }

    pub fn ident(&self, canonical: &str) -> Expr {
        Expr::Ident(self.local(canonical).to_string(), Span::dummy())
    }

    pub fn call(&self, canonical: &str, args: Vec<Expr>, span: Span) -> Expr {
        Expr::Call {
            callee: Box::new(self.ident(canonical)),
            args,
            span,
        }
    }

    /// The injected import declaration, listing exports in canonical order.
    pub fn to_decl(&self, module: &str) -> Stmt {
        let specifiers = ENGINE_EXPORTS
            .iter()
            .map(|name| ImportSpecifier {
                imported: (*name).to_string(),
                local: self.local(name).to_string(),
            })
            .collect();
        Stmt::Import(ImportDecl {
            specifiers,
            source: module.to_string(),
            span: Span::dummy(),
        })
    }
}
