//! Core built-ins registration.
//!
//! This module registers every built-in object with the BuiltInRegistry,
//! together with the global functions and constants that do not belong to
//! any object.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{to_boolean, to_f64, to_integer};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;
use super::array;
use super::console;
use super::error;
use super::json;
use super::math;
use super::number;
use super::object;
use super::string;

/// Register all core built-in objects with the registry.
pub fn register_core_builtins(registry: &mut BuiltInRegistry) {
    object::register(registry);
    array::register(registry);
    string::register(registry);
    number::register(registry);
    math::register(registry);
    json::register(registry);
    error::register(registry);
    console::register(registry);

    registry.register_object(BuiltInObject::new("Boolean").with_constructor(boolean_constructor));

    registry.register_function("parseInt", parse_int);
    registry.register_function("parseFloat", parse_float);
    registry.register_function("isNaN", is_nan);
    registry.register_function("isFinite", is_finite);

    registry.register_value("undefined", JsValue::Undefined);
    registry.register_value("NaN", JsValue::Number(JsNumberType::NaN));
    registry.register_value("Infinity", JsValue::Number(JsNumberType::PositiveInfinity));
}

/// Boolean(value)
fn boolean_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_boolean(&arg(&args, 0))))
}

/// parseInt(string, radix) - parses the longest valid prefix.
fn parse_int(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let input = arg(&args, 0).to_string();
    let mut s = input.trim_start();
    let negative = s.starts_with('-');
    if negative || s.starts_with('+') {
        s = &s[1..];
    }
    let mut radix = match arg(&args, 1) {
        JsValue::Undefined => 0,
        r => to_integer(&r),
    };
    if radix == 0 || radix == 16 {
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            s = hex;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return Ok(JsValue::Number(JsNumberType::NaN));
    }
    let mut value = 0f64;
    let mut any = false;
    for c in s.chars() {
        match c.to_digit(radix as u32) {
            Some(d) => {
                value = value * radix as f64 + d as f64;
                any = true;
            }
            None => break,
        }
    }
    if !any {
        return Ok(JsValue::Number(JsNumberType::NaN));
    }
    Ok(JsValue::new_number(if negative { -value } else { value }))
}

/// parseFloat(string) - parses the longest prefix that forms a decimal literal.
fn parse_float(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let input = arg(&args, 0).to_string();
    let s = input.trim_start();
    let unsigned = s.trim_start_matches(|c| c == '+' || c == '-');
    if unsigned.starts_with("Infinity") {
        let inf = if s.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
        return Ok(JsValue::new_number(inf));
    }
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes = s.as_bytes();
    while end < bytes.len() {
        let c = bytes[end];
        let ok = match c {
            b'0'..=b'9' => true,
            b'+' | b'-' => end == 0 || matches!(bytes[end - 1], b'e' | b'E'),
            b'.' if !seen_dot && !seen_exp => {
                seen_dot = true;
                true
            }
            b'e' | b'E' if !seen_exp && end > 0 => {
                seen_exp = true;
                true
            }
            _ => false,
        };
        if !ok {
            break;
        }
        end += 1;
    }
    // Back off a dangling exponent or sign, as in "1e" or "2e+".
    let mut candidate = &s[..end];
    while !candidate.is_empty() && candidate.parse::<f64>().is_err() {
        candidate = &candidate[..candidate.len() - 1];
    }
    Ok(JsValue::new_number(candidate.parse::<f64>().unwrap_or(f64::NAN)))
}

/// isNaN(value) - coerces its argument, unlike Number.isNaN.
fn is_nan(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_f64(&arg(&args, 0)).is_nan()))
}

/// isFinite(value)
fn is_finite(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_f64(&arg(&args, 0)).is_finite()))
}
