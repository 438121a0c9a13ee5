//! Super-global scope: lazily resolved built-ins and host plugins, both when
//! scripts run directly and when bindings run through the compiler.

extern crate bindfn;

use std::cell::RefCell;
use std::rc::Rc;

use bindfn::binding::{BindingCompiler, BindingConfig, CallArgs, HostEnvironment};
use bindfn::runner::ds::error::JErrorType;
use bindfn::runner::ds::object::ObjectType;
use bindfn::runner::ds::value::{JsNumberType, JsValue};
use bindfn::runner::eval::evaluate_script;
use bindfn::runner::plugin::registry::BuiltInRegistry;
use bindfn::runner::plugin::resolver::PluginResolver;
use bindfn::runner::plugin::types::{BuiltInFn, BuiltInObject, EvalContext};

/// Helper to run code with the interpreter
fn run_interpreter(code: &str, ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
    evaluate_script(code, ctx)
}

fn int(n: i64) -> JsValue {
    JsValue::Number(JsNumberType::Integer(n))
}

// ── Built-in resolution ──────────────────────────────────────────────

#[test]
fn test_interpreter_math_abs() {
    let mut ctx = EvalContext::new();
    let result = run_interpreter("Math.abs(-42)", &mut ctx).unwrap();
    assert_eq!(result, int(42));
}

#[test]
fn test_interpreter_builtin_in_expression() {
    let mut ctx = EvalContext::new();
    let result = run_interpreter("var x = Math.max(1, 5) + Math.min(3, 2); x", &mut ctx).unwrap();
    assert_eq!(result, int(7));
}

#[test]
fn test_interpreter_constructors_as_functions() {
    let mut ctx = EvalContext::new();
    assert_eq!(run_interpreter("String(42)", &mut ctx).unwrap(), JsValue::new_string("42"));
    assert_eq!(run_interpreter("Number('3.5')", &mut ctx).unwrap(), JsValue::new_number(3.5));
    assert_eq!(run_interpreter("Boolean('')", &mut ctx).unwrap(), JsValue::Boolean(false));
}

#[test]
fn test_interpreter_resolution_is_cached_per_context() {
    let mut ctx = EvalContext::new();
    let result = run_interpreter("Math === Math", &mut ctx).unwrap();
    assert_eq!(result, JsValue::Boolean(true));
}

#[test]
fn test_interpreter_local_shadows_builtin() {
    let mut ctx = EvalContext::new();
    let result = run_interpreter("var Math = {abs: function () { return 'mine'; }}; Math.abs(-1)", &mut ctx)
        .unwrap();
    assert_eq!(result, JsValue::new_string("mine"));
}

#[test]
fn test_interpreter_shadowing_does_not_leak_to_new_context() {
    let mut ctx = EvalContext::new();
    run_interpreter("var Math = 1;", &mut ctx).unwrap();
    let mut fresh = EvalContext::new();
    assert_eq!(run_interpreter("Math.abs(-2)", &mut fresh).unwrap(), int(2));
}

#[test]
fn test_interpreter_console_log_returns_undefined() {
    let mut ctx = EvalContext::new();
    let result = run_interpreter("console.log('hello', {a: 1})", &mut ctx).unwrap();
    assert_eq!(result, JsValue::Undefined);
}

#[test]
fn test_interpreter_unknown_name() {
    let mut ctx = EvalContext::new();
    let err = run_interpreter("NotABuiltin", &mut ctx).unwrap_err();
    assert!(matches!(err, JErrorType::ReferenceError(_)));
}

// ── Custom plugins ───────────────────────────────────────────────────

/// Provides a `Units` object with a `px` method and counts materializations.
struct UnitsPlugin {
    resolved: Rc<RefCell<usize>>,
}

impl PluginResolver for UnitsPlugin {
    fn has_binding(&self, name: &str) -> bool {
        name == "Units"
    }

    fn resolve(&self, _name: &str, _ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
        *self.resolved.borrow_mut() += 1;
        let units = ObjectType::new_ordinary_object();
        units.borrow_mut().set_property(
            "px",
            ObjectType::new_native_function(
                "px",
                Rc::new(BuiltInFn::Plugin(Box::new(|_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>| {
                    let n = args.first().cloned().unwrap_or(JsValue::Undefined);
                    Ok(JsValue::new_string(format!("{}px", n)))
                }))),
            ),
        );
        Ok(JsValue::Object(units))
    }

    fn name(&self) -> &str {
        "units_plugin"
    }
}

#[test]
fn test_custom_plugin_method() {
    let resolved = Rc::new(RefCell::new(0));
    let mut ctx = EvalContext::new();
    ctx.add_resolver(Box::new(UnitsPlugin {
        resolved: resolved.clone(),
    }));
    let result = run_interpreter("Units.px(12)", &mut ctx).unwrap();
    assert_eq!(result, JsValue::new_string("12px"));
}

#[test]
fn test_custom_plugin_is_lazy_and_resolved_once() {
    let resolved = Rc::new(RefCell::new(0));
    let mut ctx = EvalContext::new();
    ctx.add_resolver(Box::new(UnitsPlugin {
        resolved: resolved.clone(),
    }));
    run_interpreter("Math.abs(-1)", &mut ctx).unwrap();
    assert_eq!(*resolved.borrow(), 0);
    run_interpreter("Units.px(1) + Units.px(2)", &mut ctx).unwrap();
    assert_eq!(*resolved.borrow(), 1);
}

#[test]
fn test_custom_plugin_with_core_builtins() {
    let mut ctx = EvalContext::new();
    ctx.add_resolver(Box::new(UnitsPlugin {
        resolved: Rc::new(RefCell::new(0)),
    }));
    let result = run_interpreter("Units.px(Math.round(2.6))", &mut ctx).unwrap();
    assert_eq!(result, JsValue::new_string("3px"));
}

#[test]
fn test_core_resolver_wins_over_later_plugins() {
    struct FakeMath;
    impl PluginResolver for FakeMath {
        fn has_binding(&self, name: &str) -> bool {
            name == "Math"
        }
        fn resolve(&self, _name: &str, _ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
            Ok(JsValue::new_string("fake"))
        }
        fn name(&self) -> &str {
            "fake_math"
        }
    }
    let mut ctx = EvalContext::new();
    ctx.add_resolver(Box::new(FakeMath));
    assert_eq!(run_interpreter("typeof Math", &mut ctx).unwrap(), JsValue::new_string("object"));
}

// ── Registries in bindings ───────────────────────────────────────────

fn currency(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let amount = args.first().cloned().unwrap_or(JsValue::Undefined);
    Ok(JsValue::new_string(format!("${}", amount)))
}

#[test]
fn test_registry_function_reachable_from_bindings() {
    let mut registry = BuiltInRegistry::with_core();
    registry.register_object(BuiltInObject::new("Format").add_method("currency", currency));
    let compiler = BindingCompiler::with_config(HostEnvironment::Client, BindingConfig::default())
        .with_registry(registry);

    let f = compiler.compile_or_get("Format.currency(total)", true, None, None);
    let state = JsValue::from_json(&serde_json::json!({"total": 30}));
    assert_eq!(f.call(&CallArgs::new(state)), JsValue::new_string("$30"));
}

#[test]
fn test_state_property_shadows_builtin_in_bindings() {
    let compiler = BindingCompiler::with_config(HostEnvironment::Client, BindingConfig::default());
    let f = compiler.compile_or_get("Math", true, None, None);
    let state = JsValue::from_json(&serde_json::json!({"Math": "state wins"}));
    assert_eq!(f.call(&CallArgs::new(state)), JsValue::new_string("state wins"));
}
