//! Tests for standard library built-in functions.
//!
//! These tests verify the functionality of built-in objects
//! like Math, String, Array, Object, Number and JSON.

extern crate bindfn;

use bindfn::runner::ds::error::JErrorType;
use bindfn::runner::ds::value::{JsNumberType, JsValue};
use bindfn::runner::eval::evaluate_script;
use bindfn::runner::plugin::registry::BuiltInRegistry;
use bindfn::runner::plugin::types::EvalContext;

fn eval(code: &str) -> JsValue {
    let mut ctx = EvalContext::new();
    evaluate_script(code, &mut ctx).unwrap()
}

fn eval_str(code: &str) -> String {
    eval(code).to_string()
}

// ============================================================================
// Registry
// ============================================================================

mod registry_tests {
    use super::*;

    fn call_math_method(registry: &BuiltInRegistry, method: &str, args: Vec<JsValue>) -> JsValue {
        let mut ctx = EvalContext::new();
        registry
            .get_method("Math", method)
            .unwrap_or_else(|| panic!("Math.{} should exist", method))
            .call(&mut ctx, JsValue::Undefined, args)
            .unwrap_or_else(|e| panic!("Math.{} should succeed: {}", method, e))
    }

    #[test]
    fn test_core_names_are_registered() {
        let registry = BuiltInRegistry::with_core();
        for name in &["Math", "JSON", "console", "Object", "Array", "String", "Number", "Boolean", "Error"] {
            assert!(registry.has_object(name), "{} should be registered", name);
        }
        for name in &["parseInt", "parseFloat", "isNaN", "undefined", "NaN", "Infinity"] {
            assert!(registry.has_name(name), "{} should be registered", name);
        }
    }

    #[test]
    fn test_math_abs_through_registry() {
        let registry = BuiltInRegistry::with_core();
        let result = call_math_method(&registry, "abs", vec![JsValue::Number(JsNumberType::Integer(-5))]);
        assert_eq!(result, JsValue::Number(JsNumberType::Integer(5)));
    }

    #[test]
    fn test_prototype_methods_are_registered() {
        let registry = BuiltInRegistry::with_core();
        assert!(registry.get_prototype_method("String", "toUpperCase").is_some());
        assert!(registry.get_prototype_method("Array", "map").is_some());
        assert!(registry.get_prototype_method("Number", "toFixed").is_some());
        assert!(registry.get_prototype_method("Array", "flatMap").is_none());
    }
}

// ============================================================================
// Math tests
// ============================================================================

mod math_tests {
    use super::*;

    #[test]
    fn test_math_rounding() {
        assert_eq!(eval("Math.floor(4.7)"), JsValue::new_integer(4));
        assert_eq!(eval("Math.ceil(4.2)"), JsValue::new_integer(5));
        assert_eq!(eval("Math.round(-2.5)"), JsValue::new_integer(-2));
        assert_eq!(eval("Math.trunc(-4.7)"), JsValue::new_integer(-4));
    }

    #[test]
    fn test_math_pow_sqrt() {
        assert_eq!(eval("Math.pow(2, 8)"), JsValue::new_integer(256));
        assert_eq!(eval("Math.sqrt(81)"), JsValue::new_integer(9));
    }

    #[test]
    fn test_math_constants() {
        assert_eq!(eval("Math.PI"), JsValue::new_number(std::f64::consts::PI));
    }

    #[test]
    fn test_math_max_with_nan() {
        assert!(matches!(eval("Math.max(1, NaN)"), JsValue::Number(JsNumberType::NaN)));
    }
}

// ============================================================================
// String tests
// ============================================================================

mod string_tests {
    use super::*;

    #[test]
    fn test_case_and_trim() {
        assert_eq!(eval_str("'  Hello '.trim().toUpperCase()"), "HELLO");
        assert_eq!(eval_str("'ABC'.toLowerCase()"), "abc");
    }

    #[test]
    fn test_search() {
        assert_eq!(eval("'binding'.includes('din')"), JsValue::Boolean(true));
        assert_eq!(eval("'binding'.startsWith('bind')"), JsValue::Boolean(true));
        assert_eq!(eval("'binding'.endsWith('ing')"), JsValue::Boolean(true));
        assert_eq!(eval("'binding'.indexOf('n')"), JsValue::new_integer(2));
        assert_eq!(eval("'binding'.indexOf('z')"), JsValue::new_integer(-1));
    }

    #[test]
    fn test_extraction() {
        assert_eq!(eval_str("'hello world'.slice(-5)"), "world");
        assert_eq!(eval_str("'hello'.substring(3, 1)"), "el");
        assert_eq!(eval_str("'hello'.charAt(1)"), "e");
    }

    #[test]
    fn test_split_and_join() {
        assert_eq!(eval_str("'a,b,c'.split(',').join('|')"), "a|b|c");
        assert_eq!(eval("'abc'.split('').length"), JsValue::new_integer(3));
    }

    #[test]
    fn test_replace() {
        assert_eq!(eval_str("'a-b-c'.replace('-', '+')"), "a+b-c");
        assert_eq!(eval_str("'a-b-c'.replaceAll('-', '+')"), "a+b+c");
        assert_eq!(eval_str("'a-b'.replace('-', m => '[' + m + ']')"), "a[-]b");
    }

    #[test]
    fn test_padding() {
        assert_eq!(eval_str("'7'.padStart(3, '0')"), "007");
        assert_eq!(eval_str("'7'.padEnd(3, '.')"), "7..");
    }
}

// ============================================================================
// Array tests
// ============================================================================

mod array_tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        assert_eq!(eval("var a = [1]; a.push(2, 3); a.length"), JsValue::new_integer(3));
        assert_eq!(eval("var a = [1, 2]; a.pop()"), JsValue::new_integer(2));
    }

    #[test]
    fn test_higher_order() {
        assert_eq!(eval_str("[1, 2, 3, 4].filter(x => x % 2 === 0).map(x => x * 10).join()"), "20,40");
        assert_eq!(eval("[1, 2, 3].reduce((acc, x) => acc + x, 0)"), JsValue::new_integer(6));
        assert_eq!(eval("[5, 12, 8].find(x => x > 6)"), JsValue::new_integer(12));
        assert_eq!(eval("[5, 12, 8].findIndex(x => x > 100)"), JsValue::new_integer(-1));
        assert_eq!(eval("[1, 2].some(x => x > 1)"), JsValue::Boolean(true));
        assert_eq!(eval("[1, 2].every(x => x > 1)"), JsValue::Boolean(false));
    }

    #[test]
    fn test_for_each_sees_index() {
        assert_eq!(eval("var s = 0; ['a', 'b', 'c'].forEach((x, i) => { s += i; }); s"), JsValue::new_integer(3));
    }

    #[test]
    fn test_searching() {
        assert_eq!(eval("[1, 2, 3].indexOf(3)"), JsValue::new_integer(2));
        assert_eq!(eval("[NaN].includes(NaN)"), JsValue::Boolean(true));
        assert_eq!(eval("[NaN].indexOf(NaN)"), JsValue::new_integer(-1));
    }

    #[test]
    fn test_slice_concat() {
        assert_eq!(eval_str("[1, 2, 3, 4].slice(1, -1).join()"), "2,3");
        assert_eq!(eval_str("[1].concat([2, 3], 4).join()"), "1,2,3,4");
    }

    #[test]
    fn test_sort() {
        assert_eq!(eval_str("[10, 9, 1].sort().join()"), "1,10,9");
        assert_eq!(eval_str("[10, 9, 1].sort((a, b) => a - b).join()"), "1,9,10");
    }

    #[test]
    fn test_statics() {
        assert_eq!(eval("Array.isArray([])"), JsValue::Boolean(true));
        assert_eq!(eval("Array.isArray({})"), JsValue::Boolean(false));
        assert_eq!(eval_str("Array.from('abc').join('-')"), "a-b-c");
    }

    #[test]
    fn test_callback_must_be_callable() {
        let mut ctx = EvalContext::new();
        let err = evaluate_script("[1].map(3)", &mut ctx).unwrap_err();
        assert!(matches!(err, JErrorType::TypeError(_)));
    }
}

// ============================================================================
// Object tests
// ============================================================================

mod object_tests {
    use super::*;

    #[test]
    fn test_keys_values_entries() {
        assert_eq!(eval_str("Object.keys({b: 1, a: 2}).join()"), "b,a");
        assert_eq!(eval_str("Object.values({b: 1, a: 2}).join()"), "1,2");
        assert_eq!(eval_str("Object.entries({a: 1}).map(e => e[0] + '=' + e[1]).join()"), "a=1");
    }

    #[test]
    fn test_assign() {
        assert_eq!(eval("var t = {a: 1}; Object.assign(t, {b: 2}, {a: 3}); t.a + t.b"), JsValue::new_integer(5));
    }

    #[test]
    fn test_has_own_property() {
        assert_eq!(eval("({a: 1}).hasOwnProperty('a')"), JsValue::Boolean(true));
        assert_eq!(eval("({a: 1}).hasOwnProperty('b')"), JsValue::Boolean(false));
    }

    #[test]
    fn test_keys_of_null_is_type_error() {
        let mut ctx = EvalContext::new();
        let err = evaluate_script("Object.keys(null)", &mut ctx).unwrap_err();
        assert!(matches!(err, JErrorType::TypeError(_)));
    }
}

// ============================================================================
// Number and global function tests
// ============================================================================

mod number_tests {
    use super::*;

    #[test]
    fn test_to_fixed() {
        assert_eq!(eval_str("(3.14159).toFixed(2)"), "3.14");
        assert_eq!(eval_str("(2).toFixed(1)"), "2.0");
    }

    #[test]
    fn test_to_string_radix() {
        assert_eq!(eval_str("(255).toString(16)"), "ff");
        assert_eq!(eval_str("(5).toString(2)"), "101");
    }

    #[test]
    fn test_parse_functions() {
        assert_eq!(eval("parseInt('42px')"), JsValue::new_integer(42));
        assert_eq!(eval("parseFloat('2.5rem')"), JsValue::new_number(2.5));
        assert_eq!(eval("isNaN(parseInt('px'))"), JsValue::Boolean(true));
    }

    #[test]
    fn test_number_statics() {
        assert_eq!(eval("Number.isInteger(5)"), JsValue::Boolean(true));
        assert_eq!(eval("Number.isInteger(5.5)"), JsValue::Boolean(false));
    }
}

// ============================================================================
// JSON tests
// ============================================================================

mod json_tests {
    use super::*;

    #[test]
    fn test_stringify_preserves_key_order() {
        assert_eq!(eval_str("JSON.stringify({z: 1, a: [true, null]})"), r#"{"z":1,"a":[true,null]}"#);
    }

    #[test]
    fn test_stringify_undefined() {
        assert_eq!(eval("JSON.stringify(undefined)"), JsValue::Undefined);
    }

    #[test]
    fn test_parse() {
        assert_eq!(eval("JSON.parse('{\"a\": {\"b\": [1, 2]}}').a.b[1]"), JsValue::new_integer(2));
    }

    #[test]
    fn test_parse_error_is_catchable_syntax_error() {
        assert_eq!(
            eval("var r; try { JSON.parse('{'); } catch (e) { r = e instanceof SyntaxError; } r"),
            JsValue::Boolean(true)
        );
    }
}

// ============================================================================
// Error constructor tests
// ============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_error_properties() {
        assert_eq!(eval_str("new TypeError('bad').message"), "bad");
        assert_eq!(eval_str("new TypeError('bad').name"), "TypeError");
        assert_eq!(eval_str("String(new Error('plain'))"), "Error: plain");
    }

    #[test]
    fn test_error_without_new() {
        assert_eq!(eval_str("Error('x').message"), "x");
    }
}
