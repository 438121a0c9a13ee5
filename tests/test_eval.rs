//! Tests for the evaluation engine.
//!
//! Scripts are parsed and run through the public entry points; the value
//! checked is the completion value of the script.

extern crate bindfn;

use bindfn::runner::ds::error::JErrorType;
use bindfn::runner::ds::value::{JsNumberType, JsValue};
use bindfn::runner::eval::evaluate_script;
use bindfn::runner::plugin::types::EvalContext;

fn eval(code: &str) -> JsValue {
    let mut ctx = EvalContext::new();
    evaluate_script(code, &mut ctx).unwrap()
}

fn eval_err(code: &str) -> JErrorType {
    let mut ctx = EvalContext::new();
    evaluate_script(code, &mut ctx).unwrap_err()
}

fn int(n: i64) -> JsValue {
    JsValue::Number(JsNumberType::Integer(n))
}

fn string(s: &str) -> JsValue {
    JsValue::new_string(s)
}

// ============================================================================
// Literals and operators
// ============================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(eval("1 + 2 * 3"), int(7));
    assert_eq!(eval("(1 + 2) * 3"), int(9));
    assert_eq!(eval("7 % 4"), int(3));
    assert_eq!(eval("2 ** 10"), int(1024));
    assert_eq!(eval("7 / 2"), JsValue::new_number(3.5));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(eval("1 / 0"), JsValue::Number(JsNumberType::PositiveInfinity));
    assert!(matches!(eval("0 / 0"), JsValue::Number(JsNumberType::NaN)));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("'a' + 1"), string("a1"));
    assert_eq!(eval("1 + 2 + 'x'"), string("3x"));
}

#[test]
fn test_comparison_and_equality() {
    assert_eq!(eval("1 < 2"), JsValue::Boolean(true));
    assert_eq!(eval("'b' > 'a'"), JsValue::Boolean(true));
    assert_eq!(eval("1 == '1'"), JsValue::Boolean(true));
    assert_eq!(eval("1 === '1'"), JsValue::Boolean(false));
    assert_eq!(eval("null == undefined"), JsValue::Boolean(true));
    assert_eq!(eval("null === undefined"), JsValue::Boolean(false));
}

#[test]
fn test_bitwise() {
    assert_eq!(eval("5 & 3"), int(1));
    assert_eq!(eval("5 | 3"), int(7));
    assert_eq!(eval("5 ^ 3"), int(6));
    assert_eq!(eval("1 << 4"), int(16));
    assert_eq!(eval("-16 >> 2"), int(-4));
    assert_eq!(eval("~5"), int(-6));
}

#[test]
fn test_logical_operators_return_operands() {
    assert_eq!(eval("0 || 'fallback'"), string("fallback"));
    assert_eq!(eval("'x' && 'y'"), string("y"));
    assert_eq!(eval("0 ?? 'unused'"), int(0));
    assert_eq!(eval("null ?? 'used'"), string("used"));
}

#[test]
fn test_conditional_and_sequence() {
    assert_eq!(eval("true ? 'yes' : 'no'"), string("yes"));
    assert_eq!(eval("(1, 2, 3)"), int(3));
}

#[test]
fn test_typeof() {
    assert_eq!(eval("typeof 1"), string("number"));
    assert_eq!(eval("typeof 'a'"), string("string"));
    assert_eq!(eval("typeof undefined"), string("undefined"));
    assert_eq!(eval("typeof null"), string("object"));
    assert_eq!(eval("typeof {}"), string("object"));
    assert_eq!(eval("typeof (x => x)"), string("function"));
    assert_eq!(eval("typeof notDeclared"), string("undefined"));
}

#[test]
fn test_template_literal() {
    assert_eq!(eval("var n = 3; `n is ${n}, doubled ${n * 2}`"), string("n is 3, doubled 6"));
}

// ============================================================================
// Variables and assignment
// ============================================================================

#[test]
fn test_declarations() {
    assert_eq!(eval("var a = 1; let b = 2; const c = 3; a + b + c"), int(6));
}

#[test]
fn test_compound_assignment() {
    assert_eq!(eval("var a = 10; a -= 3; a *= 2; a"), int(14));
    assert_eq!(eval("var s = null; s ??= 'set'; s"), string("set"));
    assert_eq!(eval("var t = 1; t ||= 2; t"), int(1));
    assert_eq!(eval("var u = 1; u &&= 2; u"), int(2));
}

#[test]
fn test_update_expressions() {
    assert_eq!(eval("var i = 1; i++"), int(1));
    assert_eq!(eval("var i = 1; ++i"), int(2));
    assert_eq!(eval("var i = 1; i--; i"), int(0));
}

#[test]
fn test_const_reassignment_is_type_error() {
    assert!(matches!(eval_err("const c = 1; c = 2;"), JErrorType::TypeError(_)));
}

#[test]
fn test_undeclared_read_is_reference_error() {
    let err = eval_err("nothing + 1");
    assert!(matches!(err, JErrorType::ReferenceError(_)));
    assert_eq!(err.message(), "nothing is not defined");
}

#[test]
fn test_block_scoping() {
    assert_eq!(eval("let x = 1; { let x = 2; } x"), int(1));
    assert_eq!(eval("var y = 1; { var y = 2; } y"), int(2));
}

// ============================================================================
// Objects and arrays
// ============================================================================

#[test]
fn test_object_literal_and_member_access() {
    assert_eq!(eval("var o = {a: {b: 'deep'}}; o.a.b"), string("deep"));
    assert_eq!(eval("var o = {'x-y': 1}; o['x-y']"), int(1));
    assert_eq!(eval("var k = 'dyn'; var o = {[k]: 5}; o.dyn"), int(5));
    assert_eq!(eval("var a = 1; var o = {a}; o.a"), int(1));
}

#[test]
fn test_object_spread() {
    assert_eq!(eval("var o = {a: 1, b: 2}; var p = {...o, b: 3}; p.a + p.b"), int(4));
}

#[test]
fn test_array_literal_and_spread() {
    assert_eq!(eval("var a = [1, 2]; var b = [0, ...a, 3]; b.length"), int(4));
    assert_eq!(eval("var a = [1, 2, 3]; a[1]"), int(2));
    assert_eq!(eval("Math.max(...[4, 9, 2])"), int(9));
}

#[test]
fn test_optional_chaining() {
    assert_eq!(eval("var o = {}; o.missing?.deep"), JsValue::Undefined);
    assert_eq!(eval("var o = null; o?.x"), JsValue::Undefined);
    assert_eq!(eval("var o = {f: null}; o.f?.()"), JsValue::Undefined);
}

#[test]
fn test_property_of_undefined_is_type_error() {
    let err = eval_err("var o = {}; o.missing.deep");
    assert!(matches!(err, JErrorType::TypeError(_)));
}

#[test]
fn test_delete_and_in() {
    assert_eq!(eval("var o = {a: 1}; delete o.a; 'a' in o"), JsValue::Boolean(false));
    assert_eq!(eval("'a' in {a: 1}"), JsValue::Boolean(true));
}

#[test]
fn test_string_length_and_index() {
    assert_eq!(eval("'hello'.length"), int(5));
    assert_eq!(eval("'hello'[1]"), string("e"));
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_if_else() {
    assert_eq!(eval("var r; if (1 > 2) { r = 'a'; } else { r = 'b'; } r"), string("b"));
}

#[test]
fn test_loops() {
    assert_eq!(eval("var s = 0; for (var i = 1; i <= 10; i++) { s += i; } s"), int(55));
    assert_eq!(eval("var n = 0; while (n < 5) { n++; } n"), int(5));
    assert_eq!(eval("var n = 0; do { n++; } while (n < 0); n"), int(1));
}

#[test]
fn test_break_and_continue() {
    assert_eq!(
        eval("var s = 0; for (var i = 0; i < 10; i++) { if (i === 5) break; if (i % 2) continue; s += i; } s"),
        int(6)
    );
}

#[test]
fn test_for_of_and_for_in() {
    assert_eq!(eval("var s = 0; for (const x of [1, 2, 3]) { s += x; } s"), int(6));
    assert_eq!(eval("var ks = ''; for (var k in {a: 1, b: 2}) { ks += k; } ks"), string("ab"));
    assert_eq!(eval("var cs = ''; for (const c of 'hey') { cs = c + cs; } cs"), string("yeh"));
}

#[test]
fn test_try_catch_finally() {
    assert_eq!(eval("var r; try { throw 'oops'; } catch (e) { r = e; } r"), string("oops"));
    assert_eq!(
        eval("var log = ''; try { log += 'a'; } finally { log += 'b'; } log"),
        string("ab")
    );
    assert_eq!(
        eval("var m; try { null.x; } catch (e) { m = e instanceof TypeError; } m"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_uncaught_throw() {
    let err = eval_err("throw new RangeError('too big')");
    assert_eq!(err.message(), "too big");
    assert_eq!(err.to_string(), "RangeError: too big");
}

#[test]
fn test_top_level_return_is_syntax_error() {
    assert!(matches!(eval_err("return 1"), JErrorType::SyntaxError(_)));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_function_declaration_is_hoisted() {
    assert_eq!(eval("var r = twice(4); function twice(x) { return x * 2; } r"), int(8));
}

#[test]
fn test_arrow_functions() {
    assert_eq!(eval("var add = (a, b) => a + b; add(2, 3)"), int(5));
    assert_eq!(eval("var f = x => { return x * x; }; f(7)"), int(49));
}

#[test]
fn test_closures_capture_environment() {
    assert_eq!(
        eval("function counter() { var n = 0; return () => ++n; } var c = counter(); c(); c(); c()"),
        int(3)
    );
}

#[test]
fn test_default_and_rest_parameters() {
    assert_eq!(eval("function f(a, b = 10) { return a + b; } f(1)"), int(11));
    assert_eq!(eval("function f(first, ...rest) { return rest.length; } f(1, 2, 3)"), int(2));
}

#[test]
fn test_recursion() {
    assert_eq!(eval("function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); } fact(10)"), int(3628800));
}

#[test]
fn test_this_in_method_call() {
    assert_eq!(eval("var o = {n: 2, get: function () { return this.n; }}; o.get()"), int(2));
}

#[test]
fn test_new_with_script_constructor() {
    assert_eq!(eval("function P(x) { this.x = x; } var p = new P(3); p.x"), int(3));
    assert_eq!(eval("function P() {} var p = new P(); p instanceof P"), JsValue::Boolean(true));
}

#[test]
fn test_calling_non_function_is_type_error() {
    let err = eval_err("var o = {}; o.nope()");
    assert!(matches!(err, JErrorType::TypeError(_)));
}

// ============================================================================
// Limits
// ============================================================================

#[test]
fn test_call_depth_limit() {
    let mut ctx = EvalContext::new().with_max_call_depth(16);
    let err = evaluate_script("function f() { return f(); } f()", &mut ctx).unwrap_err();
    assert!(matches!(err, JErrorType::RangeError(_)));
}

#[test]
fn test_deadline_stops_infinite_loop() {
    let mut ctx = EvalContext::new().with_timeout(std::time::Duration::from_millis(20));
    let err = evaluate_script("while (true) {}", &mut ctx).unwrap_err();
    assert!(matches!(err, JErrorType::Timeout(20)));
}

#[test]
fn test_timeout_cannot_be_caught() {
    let mut ctx = EvalContext::new().with_timeout(std::time::Duration::from_millis(20));
    let err = evaluate_script("try { while (true) {} } catch (e) { 'caught' }", &mut ctx).unwrap_err();
    assert!(matches!(err, JErrorType::Timeout(_)));
}
