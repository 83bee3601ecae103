//! Return normalization.
//!
//! Rewrites every `return e` among the direct statements of one scope into
//! an assignment to the call site's sentinel slot, and deletes the
//! statements that follow it in the same block (they could never run).
//! This pass never descends into nested statements: the conditional
//! linearizer re-enters it for every block and `if` branch it visits, so
//! each scope is normalized exactly once, at the moment its containing
//! statement is rewritten.

use super::ast::*;

/// Rewrite the direct statements of one scope. Returns the new statement
/// list and whether a `return` was found.
pub fn normalize_scope(stmts: Vec<Stmt>, sentinel: &str) -> (Vec<Stmt>, bool) {
    let mut found = false;
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        match stmt {
            Stmt::Return(ret) => {
                found = true;
                out.push(sentinel_assign(sentinel, ret));
                // Everything after a return in the same block is dead.
                break;
            }
            other => out.push(other),
        }
    }
    (out, found)
}

/// `return e` rewritten as `sentinel = e`, keeping the return's span.
pub fn sentinel_assign(sentinel: &str, ret: ReturnStmt) -> Stmt {
    let span = ret.span;
    Stmt::Expr(ExprStmt {
        expr: Expr::Assign {
            op: AssignOp::Assign,
            target: Box::new(Expr::Ident(sentinel.to_string(), span)),
            value: Box::new(ret.argument),
            span,
        },
        span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::test_parse;

    fn normalize_source(source: &str) -> (Vec<Stmt>, bool) {
        normalize_scope(test_parse(source).body, "_ret")
    }

    fn assign_target(stmt: &Stmt) -> &str {
        match stmt {
            Stmt::Expr(es) => match &es.expr {
                Expr::Assign { target, .. } => match target.as_ref() {
                    Expr::Ident(name, _) => name,
                    other => panic!("non-ident target {:?}", other),
                },
                other => panic!("not an assignment {:?}", other),
            },
            other => panic!("not an expression statement {:?}", other),
        }
    }

    #[test]
    fn test_return_becomes_sentinel_assignment() {
        let (stmts, found) = normalize_source("x = 1; return 88;");
        assert!(found);
        assert_eq!(stmts.len(), 2);
        assert_eq!(assign_target(&stmts[1]), "_ret");
    }

    #[test]
    fn test_statements_after_return_are_deleted() {
        let (stmts, found) = normalize_source("return 1; x = 2; if (a) { b = 3; }");
        assert!(found);
        assert_eq!(stmts.len(), 1);
        assert_eq!(assign_target(&stmts[0]), "_ret");
    }

    #[test]
    fn test_does_not_descend_into_ifs() {
        let (stmts, found) = normalize_source("if (a) { return 1; }");
        assert!(!found);
        match &stmts[0] {
            Stmt::If(if_stmt) => match if_stmt.consequent.as_ref() {
                Stmt::Block(block) => {
                    assert!(matches!(block.body[0], Stmt::Return(_)));
                }
                other => panic!("expected block branch, got {:?}", other),
            },
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_does_not_descend_into_plain_blocks() {
        let (stmts, found) = normalize_source("{ return 1; } y = 3;");
        assert!(!found, "nested scopes are the linearizer's job");
        match &stmts[0] {
            Stmt::Block(block) => {
                assert!(matches!(block.body[0], Stmt::Return(_)));
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_no_return_reports_not_found() {
        let (stmts, found) = normalize_source("x = 1; y = 2;");
        assert!(!found);
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn test_return_argument_is_preserved() {
        let (stmts, _) = normalize_source("return a + b;");
        match &stmts[0] {
            Stmt::Expr(es) => match &es.expr {
                Expr::Assign { value, .. } => {
                    assert!(matches!(**value, Expr::Binary { op: BinOp::Add, .. }));
                }
                other => panic!("not an assignment {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }
}
