//! Math built-in object.
//!
//! Provides mathematical constants and functions.

use uuid::Uuid;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_f64;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Math object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let math = BuiltInObject::new("Math")
        // Constants
        .add_property("E", JsValue::new_number(std::f64::consts::E))
        .add_property("LN10", JsValue::new_number(std::f64::consts::LN_10))
        .add_property("LN2", JsValue::new_number(std::f64::consts::LN_2))
        .add_property("PI", JsValue::new_number(std::f64::consts::PI))
        .add_property("SQRT2", JsValue::new_number(std::f64::consts::SQRT_2))
        // Methods
        .add_method("abs", math_abs)
        .add_method("floor", math_floor)
        .add_method("ceil", math_ceil)
        .add_method("round", math_round)
        .add_method("trunc", math_trunc)
        .add_method("sign", math_sign)
        .add_method("sqrt", math_sqrt)
        .add_method("log", math_log)
        .add_method("pow", math_pow)
        .add_method("min", math_min)
        .add_method("max", math_max)
        .add_method("random", math_random);

    registry.register_object(math);
}

fn unary(args: &[JsValue], f: fn(f64) -> f64) -> Result<JsValue, JErrorType> {
    Ok(JsValue::new_number(f(to_f64(&arg(args, 0)))))
}

/// Math.abs
fn math_abs(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    unary(&args, f64::abs)
}

/// Math.floor
fn math_floor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    unary(&args, f64::floor)
}

/// Math.ceil
fn math_ceil(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    unary(&args, f64::ceil)
}

/// Math.round - halves round towards +Infinity, unlike `f64::round`.
fn math_round(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    unary(&args, |f| (f + 0.5).floor())
}

/// Math.trunc
fn math_trunc(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    unary(&args, f64::trunc)
}

/// Math.sign
fn math_sign(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    unary(&args, |f| {
        if f.is_nan() || f == 0.0 {
            f
        } else {
            f.signum()
        }
    })
}

/// Math.sqrt
fn math_sqrt(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    unary(&args, f64::sqrt)
}

/// Math.log
fn math_log(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    unary(&args, f64::ln)
}

/// Math.pow
fn math_pow(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let base = to_f64(&arg(&args, 0));
    let exponent = to_f64(&arg(&args, 1));
    Ok(JsValue::new_number(base.powf(exponent)))
}

/// Math.min - `Infinity` without arguments, `NaN` if any argument is `NaN`.
fn math_min(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut result = f64::INFINITY;
    for a in &args {
        let n = to_f64(a);
        if n.is_nan() {
            return Ok(JsValue::new_number(f64::NAN));
        }
        result = result.min(n);
    }
    Ok(JsValue::new_number(result))
}

/// Math.max - `-Infinity` without arguments, `NaN` if any argument is `NaN`.
fn math_max(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut result = f64::NEG_INFINITY;
    for a in &args {
        let n = to_f64(a);
        if n.is_nan() {
            return Ok(JsValue::new_number(f64::NAN));
        }
        result = result.max(n);
    }
    Ok(JsValue::new_number(result))
}

/// Math.random - 53 random bits taken from a v4 UUID, scaled into [0, 1).
/// The low 62 bits of a v4 UUID carry no version or variant markers.
fn math_random(
    _ctx: &mut EvalContext,
    _this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let bits = Uuid::new_v4().as_u128() as u64 & ((1u64 << 53) - 1);
    Ok(JsValue::Number(JsNumberType::Float(
        bits as f64 / (1u64 << 53) as f64,
    )))
}
