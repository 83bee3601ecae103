//! Cells and runtime values for the mock engine.

use animato_compiler::compiler::ast::BinOp;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A shared mutable engine cell. `value()` creates one unset; `set` writes
/// it. Clones alias the same storage.
#[derive(Debug, Clone, Default)]
pub struct Cell(Rc<RefCell<Option<f64>>>);

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(n: f64) -> Self {
        Cell(Rc::new(RefCell::new(Some(n))))
    }

    pub fn get(&self) -> Option<f64> {
        *self.0.borrow()
    }

    pub fn set(&self, n: f64) {
        *self.0.borrow_mut() = Some(n);
    }

    pub fn clear(&self) {
        *self.0.borrow_mut() = None;
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Runtime values. Everything is numeric; cells read through to their
/// current contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Undefined,
    Num(f64),
    Cell(Cell),
}

impl Val {
    /// The number this value currently reads as, if any.
    pub fn number(&self) -> Option<f64> {
        match self {
            Val::Undefined => None,
            Val::Num(n) => Some(*n),
            Val::Cell(cell) => cell.get(),
        }
    }

    /// Numeric coercion: undefined reads as NaN.
    pub fn as_f64(&self) -> f64 {
        self.number().unwrap_or(f64::NAN)
    }

    pub fn is_truthy(&self) -> bool {
        match self.number() {
            Some(n) => truthy_num(n),
            None => false,
        }
    }

    /// Defined means the value reads as a real number. Unset cells and NaN
    /// both count as undefined, matching the host engine's `defined`.
    pub fn is_defined(&self) -> bool {
        matches!(self.number(), Some(n) if !n.is_nan())
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Undefined => write!(f, "undefined"),
            Val::Num(n) => write!(f, "{}", n),
            Val::Cell(cell) => match cell.get() {
                Some(n) => write!(f, "cell({})", n),
                None => write!(f, "cell()"),
            },
        }
    }
}

/// Numeric truthiness: zero and NaN are falsy, everything else is truthy.
pub fn truthy_num(n: f64) -> bool {
    n != 0.0 && !n.is_nan()
}

/// 1 or 0, the numeric reading of a comparison result.
pub fn bool_num(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// ToInt32: truncate, wrap modulo 2^32, reinterpret as signed. Non-finite
/// inputs read as 0.
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let m = n.trunc() % 4_294_967_296.0;
    let m = if m < 0.0 { m + 4_294_967_296.0 } else { m };
    m as u32 as i32
}

/// Apply a binary operator to two numbers the way the source language
/// does. Comparisons yield 1 or 0. `&&` and `||` here are the eager
/// number-to-number readings; evaluators that need short-circuiting
/// handle those before the operands are computed.
pub fn numeric_binary(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Rem => a % b,
        BinOp::Pow => a.powf(b),
        BinOp::StrictEq | BinOp::LooseEq => bool_num(a == b),
        BinOp::StrictNe | BinOp::LooseNe => bool_num(a != b),
        BinOp::Lt => bool_num(a < b),
        BinOp::LtEq => bool_num(a <= b),
        BinOp::Gt => bool_num(a > b),
        BinOp::GtEq => bool_num(a >= b),
        BinOp::And => {
            if truthy_num(a) {
                b
            } else {
                a
            }
        }
        BinOp::Or => {
            if truthy_num(a) {
                a
            } else {
                b
            }
        }
        BinOp::BitAnd => (to_int32(a) & to_int32(b)) as f64,
        BinOp::BitOr => (to_int32(a) | to_int32(b)) as f64,
        BinOp::BitXor => (to_int32(a) ^ to_int32(b)) as f64,
        BinOp::Shl => (to_int32(a) << (to_int32(b) & 31)) as f64,
        BinOp::Shr => (to_int32(a) >> (to_int32(b) & 31)) as f64,
    }
}
