//! Error built-in objects.
//!
//! Provides the Error, TypeError, ReferenceError, SyntaxError and RangeError
//! constructors. Errors raised by the interpreter itself become objects of the
//! same shape when caught, see [`JErrorType::to_js_value`].

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

/// Register all error types with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    registry.register_object(BuiltInObject::new("Error").with_constructor(error_constructor));
    registry.register_object(
        BuiltInObject::new("TypeError").with_constructor(type_error_constructor),
    );
    registry.register_object(
        BuiltInObject::new("ReferenceError").with_constructor(reference_error_constructor),
    );
    registry.register_object(
        BuiltInObject::new("SyntaxError").with_constructor(syntax_error_constructor),
    );
    registry.register_object(
        BuiltInObject::new("RangeError").with_constructor(range_error_constructor),
    );
}

fn make_error(name: &str, args: &[JsValue]) -> JsValue {
    let message = match args.first() {
        None | Some(JsValue::Undefined) => String::new(),
        Some(m) => m.to_string(),
    };
    ObjectType::new_error(name, &message)
}

/// Error constructor
fn error_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(make_error("Error", &args))
}

/// TypeError constructor
fn type_error_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(make_error("TypeError", &args))
}

/// ReferenceError constructor
fn reference_error_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(make_error("ReferenceError", &args))
}

/// SyntaxError constructor
fn syntax_error_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(make_error("SyntaxError", &args))
}

/// RangeError constructor
fn range_error_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(make_error("RangeError", &args))
}
