//! Source and JSON emission.
//!
//! `emit_program` renders a tree back to JavaScript-style source, one
//! top-level statement per line, so expansions can be diffed and
//! snapshotted as plain text. `emit_json` serializes the tree itself for
//! tooling that wants structure instead of text.

use super::ast::*;

const INDENT: &str = "    ";

// Prefix operators and call arguments mirror the parser's powers so that
// emitted text reparses to the same tree.
const ASSIGN_BP: u8 = 1;
const UNARY_BP: u8 = 23;
const CALL_BP: u8 = 28;

/// Render a whole program, one top-level statement per line.
pub fn emit_program(program: &Program) -> String {
    let mut out = String::new();
    for stmt in &program.body {
        emit_stmt_into(&mut out, stmt, 0);
        out.push('\n');
    }
    out
}

pub fn emit_stmt(stmt: &Stmt) -> String {
    let mut out = String::new();
    emit_stmt_into(&mut out, stmt, 0);
    out
}

pub fn emit_expr(expr: &Expr) -> String {
    let mut out = String::new();
    emit_expr_bp(&mut out, expr, 0);
    out
}

/// The tree as pretty-printed JSON.
pub fn emit_json(program: &Program) -> serde_json::Result<String> {
    serde_json::to_string_pretty(program)
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn emit_stmt_into(out: &mut String, stmt: &Stmt, depth: usize) {
    push_indent(out, depth);
    match stmt {
        Stmt::Expr(es) => {
            emit_expr_bp(out, &es.expr, 0);
            out.push(';');
        }
        Stmt::Return(ret) => {
            out.push_str("return ");
            emit_expr_bp(out, &ret.argument, 0);
            out.push(';');
        }
        Stmt::Let(decl) => {
            out.push_str(decl.kind.keyword());
            out.push(' ');
            out.push_str(&decl.name);
            out.push_str(" = ");
            emit_expr_bp(out, &decl.init, 0);
            out.push(';');
        }
        Stmt::Import(import) => emit_import_into(out, import),
        Stmt::Block(block) => emit_block_into(out, &block.body, depth),
        Stmt::If(if_stmt) => emit_if_into(out, if_stmt, depth),
    }
}

fn emit_import_into(out: &mut String, import: &ImportDecl) {
    out.push_str("import { ");
    for (i, spec) in import.specifiers.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&spec.imported);
        if spec.local != spec.imported {
            out.push_str(" as ");
            out.push_str(&spec.local);
        }
    }
    out.push_str(" } from '");
    out.push_str(&import.source);
    out.push_str("';");
}

fn emit_if_into(out: &mut String, if_stmt: &IfStmt, depth: usize) {
    out.push_str("if (");
    emit_expr_bp(out, &if_stmt.test, 0);
    out.push_str(") ");
    emit_branch_into(out, if_stmt.consequent.as_ref(), depth);
    if let Some(alt) = if_stmt.alternate.as_deref() {
        out.push_str(" else ");
        match alt {
            Stmt::If(chained) => emit_if_into(out, chained, depth),
            other => emit_branch_into(out, other, depth),
        }
    }
}

/// A braced branch opens a block; a bare branch stays on the same line.
fn emit_branch_into(out: &mut String, stmt: &Stmt, depth: usize) {
    match stmt {
        Stmt::Block(block) => emit_block_into(out, &block.body, depth),
        other => emit_stmt_into(out, other, 0),
    }
}

fn emit_block_into(out: &mut String, body: &[Stmt], depth: usize) {
    if body.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for stmt in body {
        emit_stmt_into(out, stmt, depth + 1);
        out.push('\n');
    }
    push_indent(out, depth);
    out.push('}');
}

/// Emits `expr`, parenthesizing when its own binding power is below what
/// the surrounding position requires.
fn emit_expr_bp(out: &mut String, expr: &Expr, min_bp: u8) {
    match expr {
        Expr::Number(n, _) => out.push_str(&format_number(*n)),
        Expr::Bool(b, _) => out.push_str(if *b { "true" } else { "false" }),
        Expr::Str(s, _) => emit_string_into(out, s),
        Expr::Ident(name, _) => out.push_str(name),
        Expr::Array(elements, _) => {
            out.push('[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                emit_expr_bp(out, element, 0);
            }
            out.push(']');
        }
        Expr::Unary { op, operand, .. } => {
            let wrap = UNARY_BP < min_bp;
            if wrap {
                out.push('(');
            }
            out.push_str(&op.to_string());
            emit_expr_bp(out, operand, UNARY_BP);
            if wrap {
                out.push(')');
            }
        }
        Expr::Binary {
            op, left, right, ..
        } => {
            let (l_bp, r_bp) = op.binding_power();
            let wrap = l_bp < min_bp;
            // A right-associative operator re-binds an equal-power left
            // child to the right, so that child needs parens.
            let left_min = if r_bp > l_bp { l_bp } else { l_bp + 1 };
            if wrap {
                out.push('(');
            }
            emit_expr_bp(out, left, left_min);
            out.push(' ');
            out.push_str(&op.to_string());
            out.push(' ');
            emit_expr_bp(out, right, r_bp);
            if wrap {
                out.push(')');
            }
        }
        Expr::Assign {
            op, target, value, ..
        } => {
            let wrap = ASSIGN_BP < min_bp;
            if wrap {
                out.push('(');
            }
            emit_expr_bp(out, target, CALL_BP);
            out.push(' ');
            out.push_str(&op.to_string());
            out.push(' ');
            emit_expr_bp(out, value, 0);
            if wrap {
                out.push(')');
            }
        }
        Expr::Call { callee, args, .. } => {
            emit_expr_bp(out, callee, CALL_BP);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                emit_expr_bp(out, arg, 0);
            }
            out.push(')');
        }
        Expr::Arrow { body, .. } => {
            let wrap = ASSIGN_BP < min_bp;
            if wrap {
                out.push('(');
            }
            out.push_str("() => ");
            match body {
                ArrowBody::Expr(expr) => emit_expr_bp(out, expr, ASSIGN_BP + 1),
                ArrowBody::Block(stmts) => emit_block_into(out, stmts, 0),
            }
            if wrap {
                out.push(')');
            }
        }
    }
}

/// Whole numbers print without a fractional part, the way JavaScript
/// prints them.
fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn emit_string_into(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('\'');
}
