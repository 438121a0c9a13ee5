use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::value::{JsNumberType, JsValue};

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

/// The result of the `typeof` operator.
pub fn get_type(a: &JsValue) -> &'static str {
    match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::Object(o) => match *o.borrow() {
            ObjectType::Function(_) => TYPE_STR_FUNCTION,
            _ => TYPE_STR_OBJECT,
        },
    }
}

pub fn to_boolean(value: &JsValue) -> bool {
    match value {
        JsValue::Undefined => false,
        JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => match n {
            JsNumberType::Integer(0) => false,
            JsNumberType::Float(f) if *f == 0.0 || f.is_nan() => false,
            JsNumberType::NaN => false,
            _ => true,
        },
        JsValue::String(s) => !s.is_empty(),
        JsValue::Object(_) => true,
    }
}

pub fn to_number(v: &JsValue) -> JsNumberType {
    match v {
        JsValue::Undefined => JsNumberType::NaN,
        JsValue::Null => JsNumberType::Integer(0),
        JsValue::Boolean(b) => JsNumberType::Integer(if *b { 1 } else { 0 }),
        JsValue::String(s) => string_to_number(s),
        JsValue::Number(n) => n.clone(),
        JsValue::Object(_) => {
            if v.is_array() {
                // [] -> 0, [5] -> 5, anything longer -> NaN, via its string form.
                string_to_number(&v.to_string())
            } else {
                JsNumberType::NaN
            }
        }
    }
}

pub fn to_f64(v: &JsValue) -> f64 {
    to_number(v).to_f64()
}

fn string_to_number(s: &str) -> JsNumberType {
    let s = s.trim();
    if s.is_empty() {
        return JsNumberType::Integer(0);
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16)
            .map(JsNumberType::Integer)
            .unwrap_or(JsNumberType::NaN);
    }
    match s {
        "Infinity" | "+Infinity" => return JsNumberType::PositiveInfinity,
        "-Infinity" => return JsNumberType::NegativeInfinity,
        _ => {}
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return JsNumberType::NaN;
    }
    if let Ok(i) = s.parse::<i64>() {
        return JsNumberType::Integer(i);
    }
    s.parse::<f64>()
        .map(JsNumberType::from_f64)
        .unwrap_or(JsNumberType::NaN)
}

pub fn to_int32(v: &JsValue) -> i32 {
    let f = to_f64(v);
    if !f.is_finite() {
        return 0;
    }
    (f.trunc() as i64 as u64 & 0xffff_ffff) as u32 as i32
}

pub fn to_uint32(v: &JsValue) -> u32 {
    to_int32(v) as u32
}

/// Converts a value used in `obj[key]` position to the property name it denotes.
pub fn to_property_key(v: &JsValue) -> String {
    v.to_string()
}

/// `ToIntegerOrInfinity`, clamped into `i64`.
pub fn to_integer(v: &JsValue) -> i64 {
    let f = to_f64(v);
    if f.is_nan() {
        0
    } else if f == f64::INFINITY {
        i64::MAX
    } else if f == f64::NEG_INFINITY {
        i64::MIN
    } else {
        f.trunc() as i64
    }
}

/// Requires a value that can hold properties, as member access on `undefined` does.
pub fn require_object_coercible(v: &JsValue, property: &str) -> Result<(), JErrorType> {
    if v.is_nullish() {
        Err(JErrorType::TypeError(format!(
            "Cannot read properties of {} (reading '{}')",
            v, property
        )))
    } else {
        Ok(())
    }
}
