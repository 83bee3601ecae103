//! Animato Compiler
//!
//! Expands imperative animation worklets into declarative engine node
//! graphs. A worklet is the body of a `define(() => { ... })` call: plain
//! statements, `if`/`else`, early `return`s and a small operator set. The
//! compiler rewrites each call site into a single side-effect-free
//! expression tree of engine calls, so a host can evaluate it every frame
//! without re-entering user code.
//!
//! ```
//! let source = "
//!     import { define } from 'animato/macro';
//!     let width = define(() => {
//!         if (pressed === 1) { return 200; }
//!         return 100;
//!     });
//! ";
//! let expanded = animato_compiler::compile(source).unwrap();
//! assert!(expanded.contains("_cond(_eq(pressed, 1)"));
//! ```

pub mod compiler;
pub mod diagnostics;

use compiler::ast::Program;
use compiler::emit;
use compiler::expand::expand_program;

use thiserror::Error;

pub use compiler::expand::{ExpandOptions, ENGINE_MODULE, MACRO_MODULE};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("lex error: {0}")]
    Lex(#[from] compiler::lexer::LexError),
    #[error("parse error: {0}")]
    Parse(#[from] compiler::parser::ParseError),
    #[error("expand error: {0}")]
    Expand(#[from] compiler::expand::ExpandError),
}

/// Parse worklet source into a tree without expanding anything.
pub fn parse_source(source: &str) -> Result<Program, CompileError> {
    // 1. Lex
    let tokens = compiler::lexer::Lexer::new(source).tokenize()?;

    // 2. Parse
    Ok(compiler::parser::Parser::new(tokens).parse_program()?)
}

/// Parse and expand every macro call site, returning the rewritten tree.
pub fn expand_source(source: &str) -> Result<Program, CompileError> {
    expand_source_with_options(source, &ExpandOptions::default())
}

/// Like [`expand_source`] with custom macro and engine module paths.
pub fn expand_source_with_options(
    source: &str,
    options: &ExpandOptions,
) -> Result<Program, CompileError> {
    let program = parse_source(source)?;

    // 3. Expand macro call sites
    Ok(expand_program(program, options)?)
}

/// Compile worklet source to expanded source text.
pub fn compile(source: &str) -> Result<String, CompileError> {
    compile_with_options(source, &ExpandOptions::default())
}

/// Like [`compile`] with custom macro and engine module paths.
pub fn compile_with_options(
    source: &str,
    options: &ExpandOptions,
) -> Result<String, CompileError> {
    let program = expand_source_with_options(source, options)?;

    // 4. Emit
    Ok(emit::emit_program(&program))
}

/// Format a compile error with rich diagnostics (colors, source snippet,
/// suggestions) for terminal display.
pub fn format_error(error: &CompileError, source: &str, filename: &str) -> String {
    diagnostics::format_compile_error(error, source, filename).render_ansi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_simple_worklet() {
        let source = "import { define } from 'animato/macro';\n\
                      let width = define(() => { return 100; });\n";
        let out = compile(source).unwrap();
        assert!(out.contains("from 'animato/engine';"));
        assert!(out.contains("let width = _block(["));
        assert!(!out.contains("animato/macro"));
    }

    #[test]
    fn test_compile_leaves_plain_files_alone() {
        let source = "let x = 1;\nf(x + 2);\n";
        assert_eq!(compile(source).unwrap(), source);
    }

    #[test]
    fn test_error_stages() {
        assert!(matches!(compile("let x = ;"), Err(CompileError::Parse(_))));
        assert!(matches!(compile("\u{0}"), Err(CompileError::Lex(_))));
        let source = "import { define } from 'animato/macro'; let x = define(() => a == b);";
        assert!(matches!(compile(source), Err(CompileError::Expand(_))));
    }

    #[test]
    fn test_format_error_renders_location() {
        let source = "import { define } from 'animato/macro';\nlet x = define(5);\n";
        let err = compile(source).unwrap_err();
        let rendered = format_error(&err, source, "worklet.js");
        assert!(rendered.contains("worklet.js:2"), "rendered: {}", rendered);
    }

    #[test]
    fn test_custom_module_paths() {
        let options = ExpandOptions {
            macro_module: "anim/macro".to_string(),
            engine_module: "anim/engine".to_string(),
        };
        let source = "import { define } from 'anim/macro'; let x = define(() => { return 1; });";
        let out = compile_with_options(source, &options).unwrap();
        assert!(out.contains("from 'anim/engine';"));
    }
}
