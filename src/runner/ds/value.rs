use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::operations::type_conversion::{TYPE_STR_NULL, TYPE_STR_UNDEFINED};

pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    String(String),
    Number(JsNumberType),
    Object(JsObjectType),
}
impl Clone for JsValue {
    fn clone(&self) -> Self {
        match self {
            JsValue::Undefined => JsValue::Undefined,
            JsValue::String(d) => JsValue::String(d.to_string()),
            JsValue::Boolean(d) => JsValue::Boolean(*d),
            JsValue::Null => JsValue::Null,
            JsValue::Number(d) => JsValue::Number(d.clone()),
            JsValue::Object(o) => JsValue::Object(o.clone()),
        }
    }
}

/// Formats the value the way the JavaScript `String(value)` conversion does.
impl Display for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "{}", TYPE_STR_UNDEFINED),
            JsValue::Null => write!(f, "{}", TYPE_STR_NULL),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::String(s) => write!(f, "{}", s),
            JsValue::Number(n) => write!(f, "{}", n),
            JsValue::Object(o) => match o.try_borrow() {
                Ok(o) => write!(f, "{}", o.to_js_string()),
                Err(_) => write!(f, "[object Object]"),
            },
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "JsValue::Undefined"),
            JsValue::Null => write!(f, "JsValue::Null"),
            JsValue::Boolean(b) => write!(f, "JsValue::Boolean({})", b),
            JsValue::String(s) => write!(f, "JsValue::String({:?})", s),
            JsValue::Number(n) => write!(f, "JsValue::Number({:?})", n),
            JsValue::Object(_) => write!(f, "JsValue::Object({})", self.to_display_string()),
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl JsValue {
    pub fn new_string(s: impl Into<String>) -> Self {
        JsValue::String(s.into())
    }

    pub fn new_integer(i: i64) -> Self {
        JsValue::Number(JsNumberType::Integer(i))
    }

    pub fn new_number(f: f64) -> Self {
        JsValue::Number(JsNumberType::from_f64(f))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn is_callable(&self) -> bool {
        match self {
            JsValue::Object(o) => o.borrow().is_callable(),
            _ => false,
        }
    }

    pub fn is_array(&self) -> bool {
        match self {
            JsValue::Object(o) => matches!(*o.borrow(), ObjectType::Array(_)),
            _ => false,
        }
    }

    pub fn is_error_object(&self) -> bool {
        match self {
            JsValue::Object(o) => matches!(*o.borrow(), ObjectType::Error(_)),
            _ => false,
        }
    }

    pub fn as_object(&self) -> Option<&JsObjectType> {
        match self {
            JsValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Reads an own property of an object value. Primitives have none.
    pub fn get_own_property(&self, key: &str) -> Option<JsValue> {
        match self {
            JsValue::Object(o) => o.try_borrow().ok()?.get_own_property(key),
            _ => None,
        }
    }

    /// Follows a dotted path of own properties, e.g. `builderContent.id`.
    pub fn get_path(&self, path: &str) -> JsValue {
        let mut current = self.clone();
        for segment in path.split('.') {
            current = current.get_own_property(segment).unwrap_or(JsValue::Undefined);
        }
        current
    }

    /// Formats the value the way a console would show it: strings quoted,
    /// objects and arrays as JSON when possible.
    pub fn to_display_string(&self) -> String {
        match self {
            JsValue::String(s) => format!("{:?}", s),
            JsValue::Object(o) => {
                if o.try_borrow().map(|o| o.is_callable()).unwrap_or(false) {
                    return self.to_string();
                }
                match self.to_json_lossy() {
                    serde_json::Value::Null => self.to_string(),
                    json => json.to_string(),
                }
            }
            _ => self.to_string(),
        }
    }

    /// Builds a value tree from JSON, preserving key order.
    pub fn from_json(json: &serde_json::Value) -> JsValue {
        match json {
            serde_json::Value::Null => JsValue::Null,
            serde_json::Value::Bool(b) => JsValue::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => JsValue::new_integer(i),
                None => JsValue::new_number(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => JsValue::String(s.to_string()),
            serde_json::Value::Array(items) => {
                ObjectType::new_array(items.iter().map(JsValue::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let o = ObjectType::new_ordinary();
                if let JsValue::Object(obj) = &o {
                    let mut obj = obj.borrow_mut();
                    for (k, v) in map {
                        obj.set_property(k, JsValue::from_json(v));
                    }
                }
                o
            }
        }
    }

    /// Converts to JSON following `JSON.stringify` rules. `undefined` and functions
    /// yield `None` at the top level and are dropped inside objects.
    /// Fails on circular structures.
    pub fn to_json(&self) -> Result<Option<serde_json::Value>, String> {
        let mut seen = vec![];
        to_json_inner(self, &mut seen, false)
    }

    /// Like [`JsValue::to_json`] but never fails: cycles become `"[Circular]"`.
    pub fn to_json_lossy(&self) -> serde_json::Value {
        let mut seen = vec![];
        to_json_inner(self, &mut seen, true)
            .ok()
            .flatten()
            .unwrap_or(serde_json::Value::Null)
    }
}

fn to_json_inner(
    value: &JsValue,
    seen: &mut Vec<*const ()>,
    lossy: bool,
) -> Result<Option<serde_json::Value>, String> {
    Ok(Some(match value {
        JsValue::Undefined => return Ok(None),
        JsValue::Null => serde_json::Value::Null,
        JsValue::Boolean(b) => serde_json::Value::Bool(*b),
        JsValue::String(s) => serde_json::Value::String(s.to_string()),
        JsValue::Number(n) => match n {
            JsNumberType::Integer(i) => serde_json::Value::from(*i),
            JsNumberType::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            _ => serde_json::Value::Null,
        },
        JsValue::Object(o) => {
            let ptr = Rc::as_ptr(o) as *const ();
            if seen.contains(&ptr) {
                if lossy {
                    return Ok(Some(serde_json::Value::String("[Circular]".to_string())));
                }
                return Err("Converting circular structure to JSON".to_string());
            }
            let obj = match o.try_borrow() {
                Ok(obj) => obj,
                Err(_) => return Ok(Some(serde_json::Value::Null)),
            };
            if obj.is_callable() {
                return Ok(None);
            }
            seen.push(ptr);
            let json = match &*obj {
                ObjectType::Array(a) => {
                    let mut items = vec![];
                    for item in a.elements.iter() {
                        items.push(to_json_inner(item, seen, lossy)?.unwrap_or(serde_json::Value::Null));
                    }
                    serde_json::Value::Array(items)
                }
                _ => {
                    let mut map = serde_json::Map::new();
                    for (k, v) in obj.own_entries() {
                        if let Some(j) = to_json_inner(&v, seen, lossy)? {
                            map.insert(k, j);
                        }
                    }
                    serde_json::Value::Object(map)
                }
            };
            seen.pop();
            json
        }
    }))
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(s.to_string())
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(s)
    }
}

impl From<i64> for JsValue {
    fn from(i: i64) -> Self {
        JsValue::new_integer(i)
    }
}

impl From<f64> for JsValue {
    fn from(f: f64) -> Self {
        JsValue::new_number(f)
    }
}

#[derive(Debug)]
pub enum JsNumberType {
    Integer(i64),
    Float(f64),
    NaN,
    PositiveInfinity,
    NegativeInfinity,
}
impl JsNumberType {
    /// Normalizes an `f64`: integral values become `Integer`.
    pub fn from_f64(f: f64) -> Self {
        if f.is_nan() {
            JsNumberType::NaN
        } else if f == f64::INFINITY {
            JsNumberType::PositiveInfinity
        } else if f == f64::NEG_INFINITY {
            JsNumberType::NegativeInfinity
        } else if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 && !(f == 0.0 && f.is_sign_negative()) {
            JsNumberType::Integer(f as i64)
        } else {
            JsNumberType::Float(f)
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            JsNumberType::Integer(i) => *i as f64,
            JsNumberType::Float(f) => *f,
            JsNumberType::NaN => f64::NAN,
            JsNumberType::PositiveInfinity => f64::INFINITY,
            JsNumberType::NegativeInfinity => f64::NEG_INFINITY,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, JsNumberType::NaN)
    }
}
impl PartialEq for JsNumberType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsNumberType::Integer(a), JsNumberType::Integer(b)) => a == b,
            _ => self.to_f64() == other.to_f64(),
        }
    }
}
impl Display for JsNumberType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsNumberType::Integer(i) => write!(f, "{}", i),
            JsNumberType::Float(nf) => {
                if nf.abs() >= 1e21 || (nf.abs() < 1e-6 && *nf != 0.0) {
                    write!(f, "{:e}", nf)
                } else {
                    write!(f, "{}", nf)
                }
            }
            JsNumberType::NaN => write!(f, "NaN"),
            JsNumberType::PositiveInfinity => write!(f, "Infinity"),
            JsNumberType::NegativeInfinity => write!(f, "-Infinity"),
        }
    }
}
impl Clone for JsNumberType {
    fn clone(&self) -> Self {
        match self {
            JsNumberType::Integer(i) => JsNumberType::Integer(*i),
            JsNumberType::Float(nf) => JsNumberType::Float(*nf),
            JsNumberType::NaN => JsNumberType::NaN,
            JsNumberType::PositiveInfinity => JsNumberType::PositiveInfinity,
            JsNumberType::NegativeInfinity => JsNumberType::NegativeInfinity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_normalize_to_integers() {
        assert_eq!(JsNumberType::from_f64(3.0), JsNumberType::Integer(3));
        assert!(matches!(JsNumberType::from_f64(3.5), JsNumberType::Float(_)));
        assert!(JsNumberType::from_f64(f64::NAN).is_nan());
    }

    #[test]
    fn integer_and_float_compare_numerically() {
        assert_eq!(JsNumberType::Integer(2), JsNumberType::Float(2.0));
        assert_ne!(JsNumberType::NaN, JsNumberType::NaN);
    }

    #[test]
    fn json_round_trip_keeps_key_order() {
        let json = serde_json::json!({"b": 1, "a": [true, null, "x"], "c": 1.5});
        let v = JsValue::from_json(&json);
        assert_eq!(v.to_json().unwrap(), Some(json));
    }

    #[test]
    fn circular_structures_are_reported() {
        let v = ObjectType::new_ordinary();
        if let JsValue::Object(o) = &v {
            o.borrow_mut().set_property("self", v.clone());
        }
        assert!(v.to_json().is_err());
        assert_eq!(
            v.to_json_lossy(),
            serde_json::json!({"self": "[Circular]"})
        );
    }

    #[test]
    fn display_follows_js_string_conversion() {
        assert_eq!(JsValue::new_number(0.5).to_string(), "0.5");
        assert_eq!(JsValue::Undefined.to_string(), "undefined");
        assert_eq!(JsValue::new_number(f64::INFINITY).to_string(), "Infinity");
    }
}
