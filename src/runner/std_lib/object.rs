//! Object built-in.
//!
//! Provides the Object constructor, its static helpers and the methods every
//! object responds to.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::operations::type_conversion::to_property_key;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::expression::own_enumerable_entries;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Object built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let object = BuiltInObject::new("Object")
        .with_constructor(object_constructor)
        .add_method("keys", object_keys)
        .add_method("values", object_values)
        .add_method("entries", object_entries)
        .add_method("assign", object_assign)
        .add_method("fromEntries", object_from_entries)
        .add_prototype_method("hasOwnProperty", object_has_own_property)
        .add_prototype_method("toString", object_to_string);

    registry.register_object(object);
}

/// Object(value) - objects pass through, anything else yields a new empty object.
fn object_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(match arg(&args, 0) {
        v @ JsValue::Object(_) => v,
        _ => ObjectType::new_ordinary(),
    })
}

fn require_object_argument(value: &JsValue, method: &str) -> Result<(), JErrorType> {
    if value.is_nullish() {
        return Err(JErrorType::TypeError(format!(
            "Object.{} called on null or undefined",
            method
        )));
    }
    Ok(())
}

/// Object.keys
fn object_keys(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_argument(&target, "keys")?;
    Ok(ObjectType::new_array(
        own_enumerable_entries(&target)
            .into_iter()
            .map(|(k, _)| JsValue::String(k))
            .collect(),
    ))
}

/// Object.values
fn object_values(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_argument(&target, "values")?;
    Ok(ObjectType::new_array(
        own_enumerable_entries(&target)
            .into_iter()
            .map(|(_, v)| v)
            .collect(),
    ))
}

/// Object.entries
fn object_entries(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_argument(&target, "entries")?;
    Ok(ObjectType::new_array(
        own_enumerable_entries(&target)
            .into_iter()
            .map(|(k, v)| ObjectType::new_array(vec![JsValue::String(k), v]))
            .collect(),
    ))
}

/// Object.assign(target, ...sources)
fn object_assign(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    let target_obj = match &target {
        JsValue::Object(o) => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(
                "Cannot convert undefined or null to object".to_string(),
            ))
        }
    };
    for source in args.iter().skip(1) {
        for (k, v) in own_enumerable_entries(source) {
            target_obj.borrow_mut().set_property(&k, v);
        }
    }
    Ok(target)
}

/// Object.fromEntries(array of [key, value] pairs)
fn object_from_entries(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let result = ObjectType::new_ordinary_object();
    for (_, pair) in own_enumerable_entries(&arg(&args, 0)) {
        let key = pair.get_own_property("0").unwrap_or(JsValue::Undefined);
        let value = pair.get_own_property("1").unwrap_or(JsValue::Undefined);
        result.borrow_mut().set_property(&to_property_key(&key), value);
    }
    Ok(JsValue::Object(result))
}

/// Object.prototype.hasOwnProperty
fn object_has_own_property(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let key = to_property_key(&arg(&args, 0));
    Ok(JsValue::Boolean(this.get_own_property(&key).is_some()))
}

/// Object.prototype.toString
fn object_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this.to_string()))
}
