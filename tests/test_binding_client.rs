//! Client-side compilation: memoization, scoping and failure isolation.

extern crate bindfn;

use std::cell::RefCell;
use std::rc::Rc;

use bindfn::binding::{
    BindingCompiler, BindingConfig, BindingError, CallArgs, ErrorSink, HostEnvironment, LogSink,
};
use bindfn::runner::ds::object::ObjectType;
use bindfn::runner::ds::value::JsValue;
use bindfn::runner::plugin::types::{BuiltInFn, EvalContext};
use serde_json::json;

fn compiler() -> BindingCompiler {
    BindingCompiler::with_config(HostEnvironment::Client, BindingConfig::default())
}

fn sinks() -> (ErrorSink, LogSink) {
    (Rc::new(RefCell::new(Vec::new())), Rc::new(RefCell::new(Vec::new())))
}

fn state(value: serde_json::Value) -> JsValue {
    JsValue::from_json(&value)
}

// ── Memoization ──────────────────────────────────────────────────────

#[test]
fn test_same_text_and_mode_share_one_callable() {
    let c = compiler();
    let first = c.compile_or_get("a + b", true, None, None);
    let second = c.compile_or_get("a + b", true, None, None);
    assert!(first.ptr_eq(&second));
    assert_eq!(c.cache_len(), 1);
}

#[test]
fn test_mode_is_part_of_the_key() {
    let c = compiler();
    let expression = c.compile_or_get("a + b", true, None, None);
    let statement = c.compile_or_get("a + b", false, None, None);
    assert!(!expression.ptr_eq(&statement));
    assert_eq!(c.cache_len(), 2);

    let args = CallArgs::new(state(json!({"a": 1, "b": 2})));
    assert_eq!(expression.call(&args), JsValue::new_integer(3));
    assert!(statement.call(&args).is_undefined());
}

#[test]
fn test_blank_text_is_not_cached() {
    let c = compiler();
    for text in &["", "   ", "\n\t"] {
        let f = c.compile_or_get(text, true, None, None);
        assert!(f.call(&CallArgs::new(state(json!({"a": 1})))).is_undefined());
    }
    assert_eq!(c.cache_len(), 0);
}

#[test]
fn test_reset_cache_forgets_callables() {
    let c = compiler();
    let before = c.compile_or_get("a", true, None, None);
    c.reset_cache();
    assert_eq!(c.cache_len(), 0);
    let after = c.compile_or_get("a", true, None, None);
    assert!(!before.ptr_eq(&after));
}

#[test]
fn test_cached_callable_keeps_its_first_sinks() {
    let c = compiler();
    let (first_errors, _) = sinks();
    let (second_errors, _) = sinks();
    c.compile_or_get("nope.x", true, Some(&first_errors), None);
    let f = c.compile_or_get("nope.x", true, Some(&second_errors), None);
    f.call(&CallArgs::new(state(json!({}))));
    assert_eq!(first_errors.borrow().len(), 1);
    assert!(second_errors.borrow().is_empty());
}

// ── Return heuristic ─────────────────────────────────────────────────

#[test]
fn test_bare_expression_returns_its_value() {
    let f = compiler().compile_or_get("a + b", true, None, None);
    assert_eq!(
        f.call(&CallArgs::new(state(json!({"a": 2, "b": 40})))),
        JsValue::new_integer(42)
    );
}

#[test]
fn test_text_with_semicolon_is_not_wrapped() {
    let f = compiler().compile_or_get("x; y", true, None, None);
    assert!(f.call(&CallArgs::new(state(json!({"x": 1, "y": 2})))).is_undefined());
}

#[test]
fn test_explicit_return_in_statement_block() {
    let f = compiler().compile_or_get("var total = a * 2; return total", false, None, None);
    assert_eq!(
        f.call(&CallArgs::new(state(json!({"a": 21})))),
        JsValue::new_integer(42)
    );
}

#[test]
fn test_capability_call_is_wrapped_even_as_statement() {
    let run = ObjectType::new_native_function(
        "run",
        Rc::new(BuiltInFn::Plugin(Box::new(|_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>| {
            Ok(args.into_iter().next().unwrap_or(JsValue::Undefined))
        }))),
    );
    let builder = ObjectType::new_ordinary_object();
    builder.borrow_mut().set_property("run", run);

    let f = compiler().compile_or_get("builder.run(x)", false, None, None);
    let mut args = CallArgs::new(state(json!({"x": "ran"})));
    args.builder = JsValue::Object(builder);
    assert_eq!(f.call(&args), JsValue::new_string("ran"));
}

// ── Scope guard ──────────────────────────────────────────────────────

#[test]
fn test_event_on_state_does_not_shadow_event_argument() {
    let f = compiler().compile_or_get("event", true, None, None);
    let args = CallArgs::new(state(json!({"event": "from state"})))
        .with_event(JsValue::new_string("from caller"));
    assert_eq!(f.call(&args), JsValue::new_string("from caller"));
}

#[test]
fn test_every_reserved_name_falls_through_to_parameters() {
    let c = compiler();
    let shadowing = state(json!({
        "state": 1, "event": 1, "block": 1, "builder": 1,
        "Device": 1, "update": 1, "Builder": 1
    }));
    let names = ["event", "block", "builder", "Device", "update", "Builder"];
    for name in names.iter() {
        let f = c.compile_or_get(&format!("typeof {}", name), true, None, None);
        assert_eq!(
            f.call(&CallArgs::new(shadowing.clone())),
            JsValue::new_string("undefined"),
            "{} should not resolve to the state property",
            name
        );
    }
    let f = c.compile_or_get("state.Device", true, None, None);
    assert_eq!(f.call(&CallArgs::new(shadowing)), JsValue::new_integer(1));
}

#[test]
fn test_assignment_through_guard_leaves_state_unchanged() {
    let (errors, _) = sinks();
    let s = state(json!({"a": 1}));
    let f = compiler().compile_or_get("a = 5", false, Some(&errors), None);
    f.call(&CallArgs::new(s.clone()));
    assert_eq!(s.get_path("a"), JsValue::new_integer(1));
    assert!(errors.borrow().is_empty());
}

#[test]
fn test_update_and_delete_through_guard_are_dropped() {
    let s = state(json!({"count": 1}));
    let c = compiler();
    c.compile_or_get("count++", false, None, None).call(&CallArgs::new(s.clone()));
    c.compile_or_get("delete count", false, None, None).call(&CallArgs::new(s.clone()));
    assert_eq!(s.get_path("count"), JsValue::new_integer(1));
}

#[test]
fn test_state_parameter_can_still_be_mutated_explicitly() {
    let s = state(json!({"open": false}));
    let f = compiler().compile_or_get("state.open = !state.open", false, None, None);
    f.call(&CallArgs::new(s.clone()));
    assert_eq!(s.get_path("open"), JsValue::Boolean(true));
}

#[test]
fn test_ctx_aliases_context() {
    let f = compiler().compile_or_get("ctx.locale", true, None, None);
    let args = CallArgs::new(state(json!({}))).with_context(state(json!({"locale": "de"})));
    assert_eq!(f.call(&args), JsValue::new_string("de"));
}

#[test]
fn test_positional_arguments() {
    let f = compiler().compile_or_get("context.n + state.n", true, None, None);
    let mut args = vec![JsValue::Undefined; 8];
    args[0] = state(json!({"n": 1}));
    args[7] = state(json!({"n": 2}));
    assert_eq!(f.call_positional(args), JsValue::new_integer(3));
}

// ── Isolation ────────────────────────────────────────────────────────

#[test]
fn test_undeclared_assignment_does_not_leak_between_calls() {
    let c = compiler();
    let (errors, _) = sinks();
    c.compile_or_get("leaked = 1", false, Some(&errors), None)
        .call(&CallArgs::new(state(json!({}))));
    let read = c.compile_or_get("typeof leaked", true, None, None);
    assert_eq!(read.call(&CallArgs::new(state(json!({})))), JsValue::new_string("undefined"));
}

#[test]
fn test_pure_expression_is_idempotent() {
    let f = compiler().compile_or_get("items.map(i => i * 2).join(',')", true, None, None);
    let args = CallArgs::new(state(json!({"items": [1, 2, 3]})));
    assert_eq!(f.call(&args), JsValue::new_string("2,4,6"));
    assert_eq!(f.call(&args), JsValue::new_string("2,4,6"));
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn test_syntax_error_yields_noop_and_is_recorded_once() {
    let c = compiler();
    let (errors, logs) = sinks();
    let f = c.compile_or_get("a +* b", true, Some(&errors), Some(&logs));
    assert!(f.call(&CallArgs::new(state(json!({"a": 1, "b": 2})))).is_undefined());
    assert_eq!(errors.borrow().len(), 1);
    assert!(matches!(errors.borrow()[0], BindingError::Synthesis { .. }));
    assert_eq!(logs.borrow().len(), 1);

    // A second request is served from the cache and does not compile again.
    c.compile_or_get("a +* b", true, Some(&errors), Some(&logs));
    assert_eq!(logs.borrow().len(), 1);
}

#[test]
fn test_runtime_error_yields_undefined_and_is_recorded() {
    let (errors, logs) = sinks();
    let f = compiler().compile_or_get("user.name.first", true, Some(&errors), Some(&logs));
    let result = f.call(&CallArgs::new(state(json!({"user": {}}))));
    assert!(result.is_undefined());
    let errors = errors.borrow();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], BindingError::Evaluation { .. }));
    assert_eq!(errors[0].source_text(), "user.name.first");
    assert!(logs.borrow().is_empty());
}

#[test]
fn test_thrown_value_is_recorded() {
    let (errors, _) = sinks();
    let f = compiler().compile_or_get("throw new Error('boom')", false, Some(&errors), None);
    assert!(f.call(&CallArgs::new(state(json!({})))).is_undefined());
    assert_eq!(errors.borrow()[0].message(), "boom");
}

#[test]
fn test_failure_does_not_affect_other_callables() {
    let c = compiler();
    let (errors, _) = sinks();
    let good = c.compile_or_get("a * 2", true, Some(&errors), None);
    let bad = c.compile_or_get("a.b.c", true, Some(&errors), None);
    let args = CallArgs::new(state(json!({"a": 4})));
    assert!(bad.call(&args).is_undefined());
    assert_eq!(good.call(&args), JsValue::new_integer(8));
    assert_eq!(errors.borrow().len(), 1);
}

#[test]
fn test_runaway_recursion_is_a_range_error() {
    let (errors, _) = sinks();
    let f = compiler().compile_or_get(
        "function f(n) { return f(n + 1); } return f(0)",
        false,
        Some(&errors),
        None,
    );
    assert!(f.call(&CallArgs::new(state(json!({})))).is_undefined());
    assert!(errors.borrow()[0].to_string().contains("RangeError"));
}

#[test]
fn test_oversized_allocations_are_reported_not_fatal() {
    let c = compiler();
    for code in &["new Array(4294967295).length", "'ab'.repeat(4611686018427387904)"] {
        let (errors, logs) = sinks();
        let f = c.compile_or_get(code, true, Some(&errors), Some(&logs));
        assert!(f.call(&CallArgs::new(state(json!({})))).is_undefined(), "{}", code);
        let errors = errors.borrow();
        assert_eq!(errors.len(), 1, "{}", code);
        assert!(matches!(&errors[0], BindingError::Evaluation { .. }), "{}", code);
        assert!(errors[0].to_string().contains("RangeError"), "{}", code);
    }
}
