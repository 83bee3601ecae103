//! The worklet-to-graph compiler.
//!
//! Source text moves through the stages in pipeline order:
//!
//! ```text
//!   source
//!     │
//!     ▼
//!   lexer.rs / parser.rs     tokens, then the tree in ast.rs
//!     │
//!     ▼
//!   expand.rs                finds define()/exec() call sites and
//!     │                      drives the three body passes:
//!     │                        normalize.rs   returns -> sentinel
//!     │                        linearize.rs   ifs -> guarded blocks
//!     │                        lower.rs       statements -> engine calls
//!     ▼
//!   emit.rs                  source or JSON back out
//! ```
//!
//! `scope.rs` owns name collection and fresh-name generation, and `ops.rs`
//! is the single table mapping operators to engine functions.

pub mod ast;
pub mod emit;
pub mod expand;
pub mod lexer;
pub mod linearize;
pub mod lower;
pub mod normalize;
pub mod ops;
pub mod parser;
pub mod scope;
pub mod tokens;

/// Lex and parse a source snippet, panicking on failure. Test helper for
/// the stage modules.
#[cfg(test)]
pub(crate) fn test_parse(source: &str) -> ast::Program {
    let tokens = lexer::Lexer::new(source)
        .tokenize()
        .unwrap_or_else(|err| panic!("lex failure in test fixture: {}", err));
    parser::Parser::new(tokens)
        .parse_program()
        .unwrap_or_else(|err| panic!("parse failure in test fixture: {}", err))
}
