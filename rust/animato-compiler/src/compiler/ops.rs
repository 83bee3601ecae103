//! The operator table.
//!
//! Maps source operator tokens onto engine function names. Operators the
//! parser accepts but this table omits (loose equality, bitwise operators,
//! unary `+`/`~`) are rejected during lowering with an error naming the
//! token. Unary `-` is deliberately absent: numeric negation stays a native
//! negative value instead of becoming an operator call.

use super::ast::{BinOp, UnaryOp};

/// Every name a lowered tree can reference, in injection order. The macro
/// driver binds each of these to a generated local identifier before any
/// call site is processed.
pub const ENGINE_EXPORTS: &[&str] = &[
    "value",
    "block",
    "cond",
    "set",
    "defined",
    "not",
    "and",
    "or",
    "add",
    "sub",
    "multiply",
    "divide",
    "pow",
    "modulo",
    "lessThan",
    "lessOrEq",
    "greaterThan",
    "greaterOrEq",
    "eq",
    "neq",
];

/// Engine function for a binary or logical operator, if supported.
pub fn binary_fn(op: BinOp) -> Option<&'static str> {
    match op {
        BinOp::StrictEq => Some("eq"),
        BinOp::StrictNe => Some("neq"),
        BinOp::Add => Some("add"),
        BinOp::Sub => Some("sub"),
        BinOp::Mul => Some("multiply"),
        BinOp::Div => Some("divide"),
        BinOp::Rem => Some("modulo"),
        BinOp::Pow => Some("pow"),
        BinOp::Lt => Some("lessThan"),
        BinOp::LtEq => Some("lessOrEq"),
        BinOp::Gt => Some("greaterThan"),
        BinOp::GtEq => Some("greaterOrEq"),
        BinOp::And => Some("and"),
        BinOp::Or => Some("or"),
        BinOp::LooseEq
        | BinOp::LooseNe
        | BinOp::BitAnd
        | BinOp::BitOr
        | BinOp::BitXor
        | BinOp::Shl
        | BinOp::Shr => None,
    }
}

/// Engine function for a unary operator, if supported. `Neg` returns `None`
/// here but is passed through (not rejected) by the lowering pass.
pub fn unary_fn(op: UnaryOp) -> Option<&'static str> {
    match op {
        UnaryOp::Not => Some("not"),
        UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_binary_table_entries() {
        assert_eq!(binary_fn(BinOp::StrictEq), Some("eq"));
        assert_eq!(binary_fn(BinOp::StrictNe), Some("neq"));
        assert_eq!(binary_fn(BinOp::Add), Some("add"));
        assert_eq!(binary_fn(BinOp::Sub), Some("sub"));
        assert_eq!(binary_fn(BinOp::Mul), Some("multiply"));
        assert_eq!(binary_fn(BinOp::Div), Some("divide"));
        assert_eq!(binary_fn(BinOp::Rem), Some("modulo"));
        assert_eq!(binary_fn(BinOp::Pow), Some("pow"));
        assert_eq!(binary_fn(BinOp::Lt), Some("lessThan"));
        assert_eq!(binary_fn(BinOp::LtEq), Some("lessOrEq"));
        assert_eq!(binary_fn(BinOp::Gt), Some("greaterThan"));
        assert_eq!(binary_fn(BinOp::GtEq), Some("greaterOrEq"));
        assert_eq!(binary_fn(BinOp::And), Some("and"));
        assert_eq!(binary_fn(BinOp::Or), Some("or"));
    }

    #[test]
    fn test_loose_equality_is_not_supported() {
        assert_eq!(binary_fn(BinOp::LooseEq), None);
        assert_eq!(binary_fn(BinOp::LooseNe), None);
    }

    #[test]
    fn test_every_mapped_name_is_exported() {
        for op in BinOp::iter() {
            if let Some(name) = binary_fn(op) {
                assert!(
                    ENGINE_EXPORTS.contains(&name),
                    "binary op {} maps to unexported name {}",
                    op,
                    name
                );
            }
        }
        for op in UnaryOp::iter() {
            if let Some(name) = unary_fn(op) {
                assert!(ENGINE_EXPORTS.contains(&name));
            }
        }
    }

    #[test]
    fn test_exactly_fourteen_binary_ops_are_mapped() {
        let mapped = BinOp::iter().filter(|op| binary_fn(*op).is_some()).count();
        assert_eq!(mapped, 14);
    }

    #[test]
    fn test_unary_minus_is_a_pass_through_not_a_call() {
        assert_eq!(unary_fn(UnaryOp::Neg), None);
        assert_eq!(unary_fn(UnaryOp::Not), Some("not"));
    }

    #[test]
    fn test_exports_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for name in ENGINE_EXPORTS {
            assert!(seen.insert(*name), "duplicate export {}", name);
        }
        assert_eq!(ENGINE_EXPORTS.len(), 20);
    }
}
