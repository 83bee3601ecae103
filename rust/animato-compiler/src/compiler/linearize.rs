//! Conditional linearization.
//!
//! Turns control flow that can leave the worklet early into straight-line
//! data flow. After return normalization, an `if` whose branches assigned
//! the sentinel may or may not have "returned" by the time control reaches
//! the statements after it. Each such `if` is rewritten, last to first, into
//!
//! ```text
//! {
//!     if (test) { ... }
//!     if (defined(sentinel)) return sentinel; else { ...trailing... }
//! }
//! ```
//!
//! so the trailing statements only run when no early return fired. An `if`
//! with nothing after it needs no guard. The containment flag propagates
//! through every level of nesting, so a return buried several blocks deep
//! still guards every continuation above it.

use std::collections::VecDeque;

use super::ast::*;
use super::normalize::{normalize_scope, sentinel_assign};
use super::scope::ImportBindings;
use super::tokens::Span;

/// Normalize and linearize one scope. Returns the rewritten statements and
/// whether the scope can set the sentinel.
pub fn linearize_scope(
    stmts: Vec<Stmt>,
    sentinel: &str,
    imports: &ImportBindings,
) -> (Vec<Stmt>, bool) {
    let (stmts, found_direct) = normalize_scope(stmts, sentinel);
    let (stmts, found_nested) = linearize_block(stmts, sentinel, imports);
    (stmts, found_direct || found_nested)
}

/// Fold the statement list of one already-normalized scope from the last
/// statement backwards. The accumulator holds the continuation of the
/// statement currently being inspected; a terminal statement captures that
/// continuation into a guard and takes its place.
fn linearize_block(
    stmts: Vec<Stmt>,
    sentinel: &str,
    imports: &ImportBindings,
) -> (Vec<Stmt>, bool) {
    let mut found = false;
    let mut acc: VecDeque<Stmt> = VecDeque::new();
    for stmt in stmts.into_iter().rev() {
        let (stmt, terminal) = match stmt {
            Stmt::If(if_stmt) => {
                let (if_stmt, terminal) = linearize_if(if_stmt, sentinel, imports);
                (Stmt::If(if_stmt), terminal)
            }
            Stmt::Block(block) => {
                let (body, terminal) = linearize_scope(block.body, sentinel, imports);
                (Stmt::Block(BlockStmt { body, span: block.span }), terminal)
            }
            other => (other, false),
        };
        if terminal {
            found = true;
            if !acc.is_empty() {
                let tail: Vec<Stmt> = acc.drain(..).collect();
                let span = stmt.span();
                acc.push_front(Stmt::Block(BlockStmt {
                    body: vec![stmt, guard_stmt(tail, sentinel, imports)],
                    span,
                }));
                continue;
            }
        }
        acc.push_front(stmt);
    }
    (acc.into(), found)
}

fn linearize_if(if_stmt: IfStmt, sentinel: &str, imports: &ImportBindings) -> (IfStmt, bool) {
    let IfStmt {
        test,
        consequent,
        alternate,
        span,
    } = if_stmt;
    let (consequent, found_consequent) = linearize_branch(*consequent, sentinel, imports);
    let (alternate, found_alternate) = match alternate {
        Some(alt) => {
            let (alt, found) = linearize_branch(*alt, sentinel, imports);
            (Some(Box::new(alt)), found)
        }
        None => (None, false),
    };
    (
        IfStmt {
            test,
            consequent: Box::new(consequent),
            alternate,
            span,
        },
        found_consequent || found_alternate,
    )
}

/// One branch of an `if`. A braced branch is a scope of its own, an
/// `else if` continues the chain, and a bare `return` branch is normalized
/// in place.
fn linearize_branch(stmt: Stmt, sentinel: &str, imports: &ImportBindings) -> (Stmt, bool) {
    match stmt {
        Stmt::Block(block) => {
            let (body, found) = linearize_scope(block.body, sentinel, imports);
            (Stmt::Block(BlockStmt { body, span: block.span }), found)
        }
        Stmt::If(nested) => {
            let (nested, found) = linearize_if(nested, sentinel, imports);
            (Stmt::If(nested), found)
        }
        Stmt::Return(ret) => (sentinel_assign(sentinel, ret), true),
        other => (other, false),
    }
}

/// `if (defined(sentinel)) return sentinel; else { ...tail... }`
fn guard_stmt(tail: Vec<Stmt>, sentinel: &str, imports: &ImportBindings) -> Stmt {
    let span = Span::dummy();
    let test = imports.call(
        "defined",
        vec![Expr::Ident(sentinel.to_string(), span)],
        span,
    );
    let consequent = Stmt::Return(ReturnStmt {
        argument: Expr::Ident(sentinel.to_string(), span),
        span,
    });
    let alternate = Stmt::Block(BlockStmt { body: tail, span });
    Stmt::If(IfStmt {
        test,
        consequent: Box::new(consequent),
        alternate: Some(Box::new(alternate)),
        span,
    })
}
