//! Number built-in.
//!
//! Provides the Number conversion function, its static predicates and the
//! methods of number values.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{to_f64, to_integer};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Number built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let number = BuiltInObject::new("Number")
        .with_constructor(number_constructor)
        .add_property("MAX_SAFE_INTEGER", JsValue::new_integer(9_007_199_254_740_991))
        .add_property("MIN_SAFE_INTEGER", JsValue::new_integer(-9_007_199_254_740_991))
        .add_property("EPSILON", JsValue::new_number(f64::EPSILON))
        .add_method("isInteger", number_is_integer)
        .add_method("isFinite", number_is_finite)
        .add_method("isNaN", number_is_nan)
        .add_prototype_method("toFixed", number_to_fixed)
        .add_prototype_method("toString", number_to_string);

    registry.register_object(number);
}

/// Number(value)
fn number_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(match args.first() {
        Some(v) => JsValue::new_number(to_f64(v)),
        None => JsValue::new_integer(0),
    })
}

/// Number.isInteger - no coercion, non-numbers are never integers.
fn number_is_integer(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(match arg(&args, 0) {
        JsValue::Number(n) => n.to_f64().is_finite() && n.to_f64().fract() == 0.0,
        _ => false,
    }))
}

/// Number.isFinite
fn number_is_finite(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(match arg(&args, 0) {
        JsValue::Number(n) => n.to_f64().is_finite(),
        _ => false,
    }))
}

/// Number.isNaN
fn number_is_nan(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(matches!(arg(&args, 0), JsValue::Number(JsNumberType::NaN))))
}

/// Number.prototype.toFixed(digits)
fn number_to_fixed(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let digits = to_integer(&arg(&args, 0));
    if !(0..=100).contains(&digits) {
        return Err(JErrorType::RangeError(
            "toFixed() digits argument must be between 0 and 100".to_string(),
        ));
    }
    let n = to_f64(&this);
    if !n.is_finite() {
        return Ok(JsValue::String(this.to_string()));
    }
    Ok(JsValue::String(format!("{:.*}", digits as usize, n)))
}

/// Number.prototype.toString(radix) - radixes other than 10 only format the integer part.
fn number_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let radix = match arg(&args, 0) {
        JsValue::Undefined => 10,
        r => to_integer(&r),
    };
    if !(2..=36).contains(&radix) {
        return Err(JErrorType::RangeError(
            "toString() radix must be between 2 and 36".to_string(),
        ));
    }
    let n = to_f64(&this);
    if radix == 10 || !n.is_finite() {
        return Ok(JsValue::String(JsValue::new_number(n).to_string()));
    }
    Ok(JsValue::String(integer_to_radix(n.trunc() as i64, radix as u32)))
}

fn integer_to_radix(n: i64, radix: u32) -> String {
    let mut magnitude = n.unsigned_abs();
    if magnitude == 0 {
        return "0".to_string();
    }
    let mut digits = vec![];
    while magnitude > 0 {
        let d = (magnitude % radix as u64) as u32;
        digits.push(std::char::from_digit(d, radix).unwrap_or('?'));
        magnitude /= radix as u64;
    }
    if n < 0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}
