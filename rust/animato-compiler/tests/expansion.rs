//! End-to-end expansion tests: whole source files in, whole expanded
//! modules out. Structural properties (import injection, sentinel
//! placement, guard nesting) are pinned with exact output snapshots;
//! behavioral agreement with the imperative reference lives in
//! `semantics.rs`.

use animato_compiler::compiler::emit::emit_json;
use animato_compiler::compiler::expand::ExpandError;
use animato_compiler::compiler::lower::LowerError;
use animato_compiler::{compile, expand_source, CompileError};

fn compile_ok(source: &str) -> String {
    compile(source).unwrap_or_else(|err| panic!("compile failed: {err}"))
}

fn lower_error(source: &str) -> LowerError {
    match compile(source) {
        Err(CompileError::Expand(ExpandError::Lower(err))) => err,
        other => panic!("expected a lowering error, got {:?}", other),
    }
}

// ── 1. Whole-module snapshots ───────────────────────────────────────

#[test]
fn test_else_if_worklet_expands_exactly() {
    let source = "import { define } from 'animato/macro';\n\
                  let result = define(() => {\n\
                      if (offsetX === 30) {\n\
                          return 22;\n\
                      } else if (offsetY === 90) {\n\
                          offsetY = 55;\n\
                      }\n\
                      return 88;\n\
                  });\n";
    let expected = "import { value as _value, block as _block, cond as _cond, \
                    set as _set, defined as _defined, not as _not, and as _and, \
                    or as _or, add as _add, sub as _sub, multiply as _multiply, \
                    divide as _divide, pow as _pow, modulo as _modulo, \
                    lessThan as _lessThan, lessOrEq as _lessOrEq, \
                    greaterThan as _greaterThan, greaterOrEq as _greaterOrEq, \
                    eq as _eq, neq as _neq } from 'animato/engine';\n\
                    let _earlyReturn = _value();\n\
                    let result = _block([[_cond(_eq(offsetX, 30), \
                    [_set(_earlyReturn, 22)], _cond(_eq(offsetY, 90), \
                    [_set(offsetY, 55)])), _cond(_defined(_earlyReturn), \
                    _earlyReturn, [_set(_earlyReturn, 88)])], _earlyReturn]);\n";
    assert_eq!(compile_ok(source), expected);
}

#[test]
fn test_terminal_if_without_continuation_gets_no_guard() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => {\n\
                      if (a) {\n\
                          return 1;\n\
                      }\n\
                  });\n";
    let out = compile_ok(source);
    assert!(
        out.contains("let r = _block([_cond(a, [_set(_earlyReturn, 1)]), _earlyReturn]);"),
        "output was {}",
        out
    );
    assert!(!out.contains("_defined("), "output was {}", out);
}

#[test]
fn test_sibling_terminal_ifs_guard_back_to_front() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => {\n\
                      if (a === 1) { return 1; }\n\
                      if (b === 1) { return 2; }\n\
                      return 3;\n\
                  });\n";
    let out = compile_ok(source);
    // The second if and the final return both end up inside the first
    // guard's else branch, so a hit on the first if wins.
    let expected = "let r = _block([[_cond(_eq(a, 1), [_set(_earlyReturn, 1)]), \
                    _cond(_defined(_earlyReturn), _earlyReturn, \
                    [[_cond(_eq(b, 1), [_set(_earlyReturn, 2)]), \
                    _cond(_defined(_earlyReturn), _earlyReturn, \
                    [_set(_earlyReturn, 3)])]])], _earlyReturn]);";
    assert!(out.contains(expected), "output was {}", out);
}

#[test]
fn test_return_nested_two_ifs_deep_guards_every_level() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => {\n\
                      if (a === 1) {\n\
                          if (b === 1) {\n\
                              return 10;\n\
                          }\n\
                          b = 5;\n\
                      }\n\
                      return 20;\n\
                  });\n";
    let out = compile_ok(source);
    // Inner continuation `b = 5` gets its own guard.
    assert!(
        out.contains("_cond(_defined(_earlyReturn), _earlyReturn, [_set(b, 5)])"),
        "inner continuation unguarded: {}",
        out
    );
    // Outer continuation `return 20` gets one too.
    assert!(
        out.contains("_cond(_defined(_earlyReturn), _earlyReturn, [_set(_earlyReturn, 20)])"),
        "outer continuation unguarded: {}",
        out
    );
}

#[test]
fn test_dead_code_after_return_is_dropped() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => {\n\
                      return 1;\n\
                      unreached = 9;\n\
                  });\n";
    let out = compile_ok(source);
    assert!(!out.contains("unreached"), "output was {}", out);
    // Not just absent from the printed text: absent from the tree itself.
    let json = emit_json(&expand_source(source).unwrap()).unwrap();
    assert!(!json.contains("unreached"), "tree was {}", json);
}

// ── 2. Macro driver behavior ────────────────────────────────────────

#[test]
fn test_expansion_is_idempotent() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => {\n\
                      if (x > 0) { return x; }\n\
                      return -x;\n\
                  });\n";
    let once = compile_ok(source);
    let twice = compile_ok(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_exec_and_define_coexist() {
    let source = "import { define, exec } from 'animato/macro';\n\
                  let f = exec(() => a + 1);\n\
                  let r = define(() => a * 2);\n";
    let out = compile_ok(source);
    assert!(out.contains("let f = () => a + 1;"), "output was {}", out);
    assert!(
        out.contains("let r = _block([_multiply(a, 2)]);"),
        "output was {}",
        out
    );
    assert_eq!(out.matches("animato/engine").count(), 1);
    assert!(!out.contains("animato/macro"));
}

#[test]
fn test_exec_only_file_gets_no_engine_import() {
    let source = "import { exec } from 'animato/macro';\n\
                  let f = exec(() => a + 1);\n";
    let out = compile_ok(source);
    assert_eq!(out, "let f = () => a + 1;\n");
}

#[test]
fn test_two_call_sites_two_sentinels_one_import() {
    let source = "import { define } from 'animato/macro';\n\
                  let x = define(() => { return 1; });\n\
                  let y = define(() => { return 2; });\n";
    let out = compile_ok(source);
    assert!(out.contains("let _earlyReturn = _value();"));
    assert!(out.contains("let _earlyReturn2 = _value();"));
    assert_eq!(out.matches("animato/engine").count(), 1);
    let decl_x = out.find("let _earlyReturn =").unwrap();
    let site_x = out.find("let x =").unwrap();
    let decl_y = out.find("let _earlyReturn2 =").unwrap();
    let site_y = out.find("let y =").unwrap();
    assert!(decl_x < site_x && site_x < decl_y && decl_y < site_y);
}

#[test]
fn test_compound_assignment_expands_through_set() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => {\n\
                      x += 2;\n\
                      return x;\n\
                  });\n";
    let out = compile_ok(source);
    assert!(out.contains("_set(x, _add(x, 2))"), "output was {}", out);
}

#[test]
fn test_every_mapped_operator_round_trips() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => {\n\
                      if (!a && b === 1 || c !== 2) {\n\
                          return a + b - c * d / e % f ** 2;\n\
                      }\n\
                      return (a < b) + (a <= b) + (a > b) + (a >= b);\n\
                  });\n";
    let out = compile_ok(source);
    for name in [
        "_not(", "_and(", "_or(", "_eq(", "_neq(", "_add(", "_sub(", "_multiply(", "_divide(",
        "_modulo(", "_pow(", "_lessThan(", "_lessOrEq(", "_greaterThan(", "_greaterOrEq(",
    ] {
        assert!(out.contains(name), "missing {} in {}", name, out);
    }
}

// ── 3. Rejections ───────────────────────────────────────────────────

#[test]
fn test_unsupported_operator_names_the_token() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => { return a & b; });\n";
    let err = lower_error(source);
    assert!(
        matches!(&err, LowerError::UnsupportedOperator { op, .. } if op == "&"),
        "got {:?}",
        err
    );
    assert!(err.to_string().contains('&'));

    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => { return a == b; });\n";
    let err = lower_error(source);
    assert!(err.to_string().contains("=="), "got {}", err);
}

#[test]
fn test_destructuring_assignment_is_rejected() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => {\n\
                      [a, b] = pair;\n\
                      return a;\n\
                  });\n";
    assert!(matches!(
        lower_error(source),
        LowerError::PatternTarget { .. }
    ));
}

#[test]
fn test_assignment_in_expression_is_rejected() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => { return a === (b = c); });\n";
    assert!(matches!(
        lower_error(source),
        LowerError::AssignmentInExpression { .. }
    ));
}

#[test]
fn test_let_inside_worklet_is_rejected() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => {\n\
                      let t = 1;\n\
                      return t;\n\
                  });\n";
    assert!(matches!(
        lower_error(source),
        LowerError::UnsupportedConstruct { .. }
    ));
}

#[test]
fn test_loop_in_worklet_is_rejected_before_expansion() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => {\n\
                      while (x < 10) { x += 1; }\n\
                      return x;\n\
                  });\n";
    let err = compile(source).unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)), "got {:?}", err);
    assert!(err.to_string().contains("'while'"), "message was {}", err);
}

#[test]
fn test_unary_minus_survives_unchanged() {
    let source = "import { define } from 'animato/macro';\n\
                  let r = define(() => { return -x + -3; });\n";
    let out = compile_ok(source);
    assert!(out.contains("_add(-x, -3)"), "output was {}", out);
}
