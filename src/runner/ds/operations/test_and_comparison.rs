use std::cmp::Ordering;
use std::rc::Rc;

use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::value::{JsNumberType, JsValue};

/// `===`
pub fn strict_equality(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => x == y,
        (JsValue::Object(x), JsValue::Object(y)) => Rc::ptr_eq(x, y),
        _ => a == b,
    }
}

/// `==`
pub fn loose_equality(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Null) | (JsValue::Null, JsValue::Undefined) => true,
        (JsValue::Number(_), JsValue::String(_)) | (JsValue::String(_), JsValue::Number(_)) => {
            to_number(a) == to_number(b)
        }
        (JsValue::Boolean(_), _) => loose_equality(&JsValue::Number(to_number(a)), b),
        (_, JsValue::Boolean(_)) => loose_equality(a, &JsValue::Number(to_number(b))),
        (JsValue::Object(_), JsValue::String(_)) | (JsValue::Object(_), JsValue::Number(_)) => {
            loose_equality(&JsValue::String(a.to_string()), b)
        }
        (JsValue::String(_), JsValue::Object(_)) | (JsValue::Number(_), JsValue::Object(_)) => {
            loose_equality(a, &JsValue::String(b.to_string()))
        }
        _ => strict_equality(a, b),
    }
}

/// SameValueZero, used by `includes`: like `===` except NaN equals NaN.
pub fn same_value_zero(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(JsNumberType::NaN), JsValue::Number(JsNumberType::NaN)) => true,
        _ => strict_equality(a, b),
    }
}

/// Abstract relational comparison. `None` means the operands are unordered (NaN involved).
pub fn compare_values(a: &JsValue, b: &JsValue) -> Option<Ordering> {
    let pa = primitive_for_compare(a);
    let pb = primitive_for_compare(b);
    if let (JsValue::String(x), JsValue::String(y)) = (&pa, &pb) {
        return Some(x.cmp(y));
    }
    to_number(&pa).to_f64().partial_cmp(&to_number(&pb).to_f64())
}

fn primitive_for_compare(v: &JsValue) -> JsValue {
    match v {
        JsValue::Object(_) => JsValue::String(v.to_string()),
        _ => v.clone(),
    }
}
