//! Recursive descent parser with Pratt expression parsing for the worklet
//! subset of JavaScript.
//!
//! Statements: `import` (top level only), `let`/`const`/`var` declarations,
//! `if`/`else`, `return`, blocks, expression statements. Expressions: the
//! operator grammar (with JavaScript precedence, `**` and assignment
//! right-associative), calls, array literals, and zero-parameter arrows.

use crate::compiler::ast::*;
use crate::compiler::tokens::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token {found} at line {line}, col {col}; expected {expected}")]
    Unexpected {
        found: String,
        expected: String,
        line: usize,
        col: usize,
    },
    #[error("unsupported keyword '{word}' at line {line}, col {col}")]
    ReservedWord {
        word: String,
        line: usize,
        col: usize,
    },
    #[error("unexpected end of input")]
    UnexpectedEof,
}

impl ParseError {
    pub fn line_col(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::Unexpected { line, col, .. }
            | ParseError::ReservedWord { line, col, .. } => Some((*line, *col)),
            ParseError::UnexpectedEof => None,
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        // The token stream always ends with Eof, so last() is total.
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        let tok = self.current().clone();
        if std::mem::discriminant(&tok.kind) == std::mem::discriminant(kind) {
            self.advance();
            Ok(tok)
        } else {
            Err(self.unexpected(&format!("{}", kind)))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.current();
        ParseError::Unexpected {
            found: format!("{}", tok.kind),
            expected: expected.to_string(),
            line: tok.span.line,
            col: tok.span.col,
        }
    }

    fn reserved_word(&self) -> ParseError {
        let tok = self.current();
        ParseError::ReservedWord {
            word: format!("{}", tok.kind),
            line: tok.span.line,
            col: tok.span.col,
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        let tok = self.current().clone();
        if let TokenKind::Ident(name) = tok.kind {
            self.advance();
            Ok((name, tok.span))
        } else {
            Err(self.unexpected("an identifier"))
        }
    }

    fn expect_string(&mut self) -> Result<(String, Span), ParseError> {
        let tok = self.current().clone();
        if let TokenKind::StringLit(text) = tok.kind {
            self.advance();
            Ok((text, tok.span))
        } else {
            Err(self.unexpected("a string literal"))
        }
    }

    /// Statement separators are optional; eat one if present.
    fn eat_semi(&mut self) {
        if matches!(self.peek_kind(), TokenKind::Semi) {
            self.advance();
        }
    }

    // ── Top-level parsing ───────────────────────────────────────────

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        while !self.at_end() {
            let stmt = if matches!(self.peek_kind(), TokenKind::Import) {
                self.parse_import()?
            } else {
                self.parse_stmt()?
            };
            body.push(stmt);
        }
        Ok(Program { body })
    }

    fn parse_import(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::Import)?.span;
        self.expect(&TokenKind::LBrace)?;
        let mut specifiers = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace) {
            let (imported, _) = self.expect_ident()?;
            let local = if matches!(self.peek_kind(), TokenKind::As) {
                self.advance();
                self.expect_ident()?.0
            } else {
                imported.clone()
            };
            specifiers.push(ImportSpecifier { imported, local });
            if matches!(self.peek_kind(), TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        self.expect(&TokenKind::From)?;
        let (source, end) = self.expect_string()?;
        self.eat_semi();
        Ok(Stmt::Import(ImportDecl {
            specifiers,
            source,
            span: start.merge(end),
        }))
    }

    // ── Statements ──────────────────────────────────────────────────

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenKind::If => self.parse_if(),
            TokenKind::Return => self.parse_return(),
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Let | TokenKind::Const | TokenKind::Var => self.parse_let(),
            // Loops and function declarations have no worklet form.
            TokenKind::Reserved(_) => Err(self.reserved_word()),
            TokenKind::Import => Err(self.unexpected("statement")),
            _ => {
                let expr = self.parse_assign_expr()?;
                let span = expr.span();
                self.eat_semi();
                Ok(Stmt::Expr(ExprStmt { expr, span }))
            }
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::If)?.span;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_assign_expr()?;
        self.expect(&TokenKind::RParen)?;
        let consequent = Box::new(self.parse_stmt()?);
        let mut span = start.merge(consequent.span());
        let alternate = if matches!(self.peek_kind(), TokenKind::Else) {
            self.advance();
            let alt = Box::new(self.parse_stmt()?);
            span = span.merge(alt.span());
            Some(alt)
        } else {
            None
        };
        Ok(Stmt::If(IfStmt { test, consequent, alternate, span }))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::Return)?.span;
        let argument = self.parse_assign_expr()?;
        let span = start.merge(argument.span());
        self.eat_semi();
        Ok(Stmt::Return(ReturnStmt { argument, span }))
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(&TokenKind::LBrace)?.span;
        let mut body = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            body.push(self.parse_stmt()?);
        }
        let end = self.expect(&TokenKind::RBrace)?.span;
        Ok(Stmt::Block(BlockStmt { body, span: start.merge(end) }))
    }

    fn parse_let(&mut self) -> Result<Stmt, ParseError> {
        let kind_tok = self.advance();
        let kind = match kind_tok.kind {
            TokenKind::Const => DeclKind::Const,
            TokenKind::Var => DeclKind::Var,
            _ => DeclKind::Let,
        };
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::Assign)?;
        let init = self.parse_assign_expr()?;
        let span = kind_tok.span.merge(init.span());
        self.eat_semi();
        Ok(Stmt::Let(LetStmt { kind, name, init, span }))
    }

    // ── Expressions ─────────────────────────────────────────────────

    /// Assignment is the lowest-precedence, right-associative expression
    /// form. Targets are validated during lowering, not here, so that a
    /// misplaced or pattern-targeted assignment can surface a transform
    /// error rather than a parse error.
    fn parse_assign_expr(&mut self) -> Result<Expr, ParseError> {
        let target = self.parse_expr(0)?;
        let op = match self.peek_kind() {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusAssign => AssignOp::AddAssign,
            TokenKind::MinusAssign => AssignOp::SubAssign,
            TokenKind::StarAssign => AssignOp::MulAssign,
            TokenKind::SlashAssign => AssignOp::DivAssign,
            _ => return Ok(target),
        };
        self.advance();
        let value = self.parse_assign_expr()?;
        let span = target.span().merge(value.span());
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
            span,
        })
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::OrOr => BinOp::Or,
                TokenKind::AndAnd => BinOp::And,
                TokenKind::Pipe => BinOp::BitOr,
                TokenKind::Caret => BinOp::BitXor,
                TokenKind::Amp => BinOp::BitAnd,
                TokenKind::EqEqEq => BinOp::StrictEq,
                TokenKind::NotEqEq => BinOp::StrictNe,
                TokenKind::EqEq => BinOp::LooseEq,
                TokenKind::NotEq => BinOp::LooseNe,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::GtEq,
                TokenKind::Shl => BinOp::Shl,
                TokenKind::Shr => BinOp::Shr,
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                TokenKind::StarStar => BinOp::Pow,
                TokenKind::LParen => {
                    if min_bp > 27 {
                        break;
                    }
                    lhs = self.parse_call(lhs)?;
                    continue;
                }
                _ => break,
            };
            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(r_bp)?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen) {
            args.push(self.parse_assign_expr()?);
            if matches!(self.peek_kind(), TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        let end = self.expect(&TokenKind::RParen)?.span;
        let span = callee.span().merge(end);
        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
            span,
        })
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        match self.peek_kind().clone() {
            TokenKind::NumberLit(n) => {
                let span = self.advance().span;
                Ok(Expr::Number(n, span))
            }
            TokenKind::StringLit(ref text) => {
                let text = text.clone();
                let span = self.advance().span;
                Ok(Expr::Str(text, span))
            }
            TokenKind::True => {
                let span = self.advance().span;
                Ok(Expr::Bool(true, span))
            }
            TokenKind::False => {
                let span = self.advance().span;
                Ok(Expr::Bool(false, span))
            }
            TokenKind::Ident(ref name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok(Expr::Ident(name, span))
            }
            TokenKind::Minus => {
                let start = self.advance().span;
                // A negated number literal folds to a native negative value.
                if let TokenKind::NumberLit(n) = *self.peek_kind() {
                    let span = start.merge(self.advance().span);
                    return Ok(Expr::Number(-n, span));
                }
                self.parse_unary(UnaryOp::Neg, start)
            }
            TokenKind::Bang => {
                let start = self.advance().span;
                self.parse_unary(UnaryOp::Not, start)
            }
            TokenKind::Plus => {
                let start = self.advance().span;
                self.parse_unary(UnaryOp::Plus, start)
            }
            TokenKind::Tilde => {
                let start = self.advance().span;
                self.parse_unary(UnaryOp::BitNot, start)
            }
            TokenKind::LParen => {
                // `() =>` begins a zero-parameter arrow; anything else is a
                // grouped expression (which may legally contain an
                // assignment, rejected later in lowering).
                if matches!(self.kind_at(1), Some(TokenKind::RParen))
                    && matches!(self.kind_at(2), Some(TokenKind::Arrow))
                {
                    return self.parse_arrow();
                }
                self.advance();
                let expr = self.parse_assign_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_unary(&mut self, op: UnaryOp, start: Span) -> Result<Expr, ParseError> {
        let operand = self.parse_expr(23)?;
        let span = start.merge(operand.span());
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    fn parse_array(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(&TokenKind::LBracket)?.span;
        let mut elements = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBracket) {
            elements.push(self.parse_assign_expr()?);
            if matches!(self.peek_kind(), TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        let end = self.expect(&TokenKind::RBracket)?.span;
        Ok(Expr::Array(elements, start.merge(end)))
    }

    fn parse_arrow(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(&TokenKind::LParen)?.span;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::Arrow)?;
        if matches!(self.peek_kind(), TokenKind::LBrace) {
            let block = self.parse_block()?;
            let (body, end) = match block {
                Stmt::Block(b) => (b.body, b.span),
                other => (vec![other], start),
            };
            Ok(Expr::Arrow {
                body: ArrowBody::Block(body),
                span: start.merge(end),
            })
        } else {
            let expr = self.parse_assign_expr()?;
            let span = start.merge(expr.span());
            Ok(Expr::Arrow {
                body: ArrowBody::Expr(Box::new(expr)),
                span,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::Lexer;

    fn parse_ok(source: &str) -> Program {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse_program().unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse_program().unwrap_err()
    }

    fn only_expr(program: &Program) -> &Expr {
        match &program.body[0] {
            Stmt::Expr(s) => &s.expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_precedence_mul_over_add() {
        let program = parse_ok("a + b * c;");
        match only_expr(&program) {
            Expr::Binary { op: BinOp::Add, right, .. } => {
                assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_parse_pow_right_assoc() {
        let program = parse_ok("2 ** 3 ** 2;");
        match only_expr(&program) {
            Expr::Binary { op: BinOp::Pow, left, right, .. } => {
                assert!(matches!(**left, Expr::Number(n, _) if n == 2.0));
                assert!(matches!(**right, Expr::Binary { op: BinOp::Pow, .. }));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_parse_logical_precedence() {
        let program = parse_ok("a === 1 && b === 2 || c;");
        match only_expr(&program) {
            Expr::Binary { op: BinOp::Or, left, .. } => {
                assert!(matches!(**left, Expr::Binary { op: BinOp::And, .. }));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_parse_negative_literal_folds() {
        let program = parse_ok("x = -5;");
        match only_expr(&program) {
            Expr::Assign { value, .. } => {
                assert!(matches!(**value, Expr::Number(n, _) if n == -5.0));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_parse_negation_of_ident_stays_unary() {
        let program = parse_ok("x = -y;");
        match only_expr(&program) {
            Expr::Assign { value, .. } => {
                assert!(matches!(**value, Expr::Unary { op: UnaryOp::Neg, .. }));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_parse_else_if_chain() {
        let program = parse_ok("if (a) { x = 1; } else if (b) { x = 2; } else { x = 3; }");
        match &program.body[0] {
            Stmt::If(outer) => match outer.alternate.as_deref() {
                Some(Stmt::If(inner)) => {
                    assert!(inner.alternate.is_some());
                    assert!(matches!(*inner.consequent, Stmt::Block(_)));
                }
                other => panic!("expected chained if, got {:?}", other),
            },
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unbraced_if_branch() {
        let program = parse_ok("if (a) return 1;");
        match &program.body[0] {
            Stmt::If(stmt) => assert!(matches!(*stmt.consequent, Stmt::Return(_))),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_arrow_block_body() {
        let program = parse_ok("let f = () => { return 1; };");
        match &program.body[0] {
            Stmt::Let(decl) => match &decl.init {
                Expr::Arrow { body: ArrowBody::Block(stmts), .. } => {
                    assert_eq!(stmts.len(), 1);
                }
                other => panic!("expected arrow, got {:?}", other),
            },
            other => panic!("expected let, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_arrow_expr_body() {
        let program = parse_ok("let f = () => a + b;");
        match &program.body[0] {
            Stmt::Let(decl) => {
                assert!(matches!(
                    decl.init,
                    Expr::Arrow { body: ArrowBody::Expr(_), .. }
                ));
            }
            other => panic!("expected let, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_grouped_assignment() {
        let program = parse_ok("a === (b = c);");
        match only_expr(&program) {
            Expr::Binary { op: BinOp::StrictEq, right, .. } => {
                assert!(matches!(**right, Expr::Assign { .. }));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_parse_array_pattern_assignment() {
        let program = parse_ok("([a, b] = pair);");
        match only_expr(&program) {
            Expr::Assign { target, .. } => {
                assert!(matches!(**target, Expr::Array(_, _)));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_parse_import_with_alias() {
        let program = parse_ok("import { define as animate, exec } from 'animato/macro';");
        match &program.body[0] {
            Stmt::Import(decl) => {
                assert_eq!(decl.source, "animato/macro");
                assert_eq!(decl.specifiers[0].imported, "define");
                assert_eq!(decl.specifiers[0].local, "animate");
                assert_eq!(decl.specifiers[1].imported, "exec");
                assert_eq!(decl.specifiers[1].local, "exec");
            }
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_import_rejected_in_block() {
        let err = parse_err("{ import { a } from 'm'; }");
        assert!(matches!(err, ParseError::Unexpected { .. }));
    }

    #[test]
    fn test_parse_bare_return_rejected() {
        let err = parse_err("let f = () => { return; };");
        match err {
            ParseError::Unexpected { found, .. } => assert_eq!(found, ";"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parse_loops_rejected_by_name() {
        for (source, word) in [
            ("while (x) { x = x + 1; }", "while"),
            ("for (;;) {}", "for"),
            ("do { x = 1; } while (x);", "do"),
            ("function f() { return 1; }", "function"),
        ] {
            match parse_err(source) {
                ParseError::ReservedWord { word: got, .. } => assert_eq!(got, word),
                other => panic!("expected reserved-word error for {:?}, got {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_parse_loop_inside_worklet_body_rejected() {
        let err = parse_err("let r = define(() => { while (x) { x = 0; } });");
        assert!(matches!(err, ParseError::ReservedWord { .. }));
    }

    #[test]
    fn test_parse_compound_assignment_chain() {
        let program = parse_ok("x += y * 2;");
        match only_expr(&program) {
            Expr::Assign { op: AssignOp::AddAssign, value, .. } => {
                assert!(matches!(**value, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_parse_call_args() {
        let program = parse_ok("f(a, b + 1, [c]);");
        match only_expr(&program) {
            Expr::Call { args, .. } => assert_eq!(args.len(), 3),
            other => panic!("unexpected shape {:?}", other),
        }
    }
}
