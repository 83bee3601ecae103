//! AST for the worklet subset of JavaScript.
//!
//! A closed tagged union: the transform passes dispatch over these nodes
//! with `match`, build replacement subtrees as owned values, and hand them
//! back to the parent. No node is shared or mutated in place.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::EnumIter;

use super::tokens::Span;

/// A whole source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub body: Vec<Stmt>,
}

// ── Statements ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(ExprStmt),
    If(IfStmt),
    Block(BlockStmt),
    Return(ReturnStmt),
    Let(LetStmt),
    Import(ImportDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// `if (test) consequent` with an optional `else` alternate. Branches are
/// single statements; a braced branch is a `Stmt::Block`, and an `else if`
/// chain nests another `Stmt::If` in the alternate slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub test: Expr,
    pub consequent: Box<Stmt>,
    pub alternate: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStmt {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub argument: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetStmt {
    pub kind: DeclKind,
    pub name: String,
    pub init: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclKind {
    Let,
    Const,
    Var,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclKind::Let => "let",
            DeclKind::Const => "const",
            DeclKind::Var => "var",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: String,
    pub span: Span,
}

/// One `imported as local` pair; `local == imported` when no alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSpecifier {
    pub imported: String,
    pub local: String,
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Let(s) => s.span,
            Stmt::Import(s) => s.span,
        }
    }

    /// Wrap an expression as an expression statement with the same span.
    pub fn from_expr(expr: Expr) -> Stmt {
        let span = expr.span();
        Stmt::Expr(ExprStmt { expr, span })
    }
}

// ── Expressions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f64, Span),
    Bool(bool, Span),
    Str(String, Span),
    Ident(String, Span),
    Array(Vec<Expr>, Span),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    Arrow {
        body: ArrowBody,
        span: Span,
    },
}

/// Body of a zero-parameter arrow function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, span)
            | Expr::Bool(_, span)
            | Expr::Str(_, span)
            | Expr::Ident(_, span)
            | Expr::Array(_, span) => *span,
            Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Call { span, .. }
            | Expr::Arrow { span, .. } => *span,
        }
    }

    pub fn ident(name: impl Into<String>, span: Span) -> Expr {
        Expr::Ident(name.into(), span)
    }

    pub fn call(callee: Expr, args: Vec<Expr>, span: Span) -> Expr {
        Expr::Call { callee: Box::new(callee), args, span }
    }
}

// ── Operators ───────────────────────────────────────────────────────

/// Binary and logical operators the parser accepts. Only a subset maps to
/// engine functions (see `ops`); the rest surface as lowering errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Pow => "**",
            BinOp::StrictEq => "===",
            BinOp::StrictNe => "!==",
            BinOp::LooseEq => "==",
            BinOp::LooseNe => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        };
        write!(f, "{}", token)
    }
}

impl BinOp {
    /// Pratt binding powers shared by the parser and the source emitter.
    /// An operator is consumed when its left power reaches the ambient
    /// minimum; parsing then recurses with the right power. `**` is
    /// right-associative, so its left power sits above its right power.
    pub fn binding_power(self) -> (u8, u8) {
        match self {
            BinOp::Or => (3, 4),
            BinOp::And => (5, 6),
            BinOp::BitOr => (7, 8),
            BinOp::BitXor => (9, 10),
            BinOp::BitAnd => (11, 12),
            BinOp::StrictEq | BinOp::StrictNe | BinOp::LooseEq | BinOp::LooseNe => (13, 14),
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => (15, 16),
            BinOp::Shl | BinOp::Shr => (17, 18),
            BinOp::Add | BinOp::Sub => (19, 20),
            BinOp::Mul | BinOp::Div | BinOp::Rem => (21, 22),
            BinOp::Pow => (26, 25),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::BitNot => "~",
        };
        write!(f, "{}", token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl AssignOp {
    /// The binary operator a compound assignment expands through, if any.
    pub fn binary(self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinOp::Add),
            AssignOp::SubAssign => Some(BinOp::Sub),
            AssignOp::MulAssign => Some(BinOp::Mul),
            AssignOp::DivAssign => Some(BinOp::Div),
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
        };
        write!(f, "{}", token)
    }
}
