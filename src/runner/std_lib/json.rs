//! JSON built-in object.
//!
//! Provides JSON.parse and JSON.stringify on top of `serde_json`. Key order
//! is preserved in both directions.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_integer;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the JSON object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let json = BuiltInObject::new("JSON")
        .add_method("parse", json_parse)
        .add_method("stringify", json_stringify);

    registry.register_object(json);
}

/// JSON.parse - Parse JSON string to JavaScript value.
fn json_parse(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let text = arg(&args, 0).to_string();
    serde_json::from_str::<serde_json::Value>(&text)
        .map(|json| JsValue::from_json(&json))
        .map_err(|e| JErrorType::SyntaxError(format!("{} in JSON", e)))
}

/// JSON.stringify(value, replacer, space) - the replacer is ignored.
fn json_stringify(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let json = match arg(&args, 0).to_json().map_err(JErrorType::TypeError)? {
        Some(json) => json,
        None => return Ok(JsValue::Undefined),
    };
    let indent = match arg(&args, 2) {
        JsValue::Number(_) => " ".repeat(to_integer(&arg(&args, 2)).clamp(0, 10) as usize),
        JsValue::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    if indent.is_empty() {
        return Ok(JsValue::String(json.to_string()));
    }
    let mut out = vec![];
    let mut serializer =
        Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    json.serialize(&mut serializer)
        .map_err(|e| JErrorType::TypeError(e.to_string()))?;
    Ok(JsValue::String(String::from_utf8_lossy(&out).into_owned()))
}
