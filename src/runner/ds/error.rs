use thiserror::Error;

use crate::runner::ds::object::ObjectType;
use crate::runner::ds::value::JsValue;

/// Every way evaluation of a script can fail.
///
/// The first four mirror the JavaScript error constructors and are catchable by
/// `try`/`catch` in evaluated code. `Thrown` carries whatever value a `throw`
/// statement produced. `Timeout` is raised by the interpreter itself when the
/// evaluation deadline passes and can never be caught by script code.
#[derive(Debug, Clone, Error)]
pub enum JErrorType {
    #[error("ReferenceError: {0}")]
    ReferenceError(String),
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("RangeError: {0}")]
    RangeError(String),
    #[error("SyntaxError: {0}")]
    SyntaxError(String),
    #[error("{}", thrown_to_string(.0))]
    Thrown(JsValue),
    #[error("Script execution timed out after {0}ms")]
    Timeout(u128),
}

impl JErrorType {
    pub fn new_copy(other: &Self) -> Self {
        other.clone()
    }

    /// The `name` the error would have as a script-visible error object.
    pub fn name(&self) -> &'static str {
        match self {
            JErrorType::ReferenceError(_) => "ReferenceError",
            JErrorType::TypeError(_) => "TypeError",
            JErrorType::RangeError(_) => "RangeError",
            JErrorType::SyntaxError(_) => "SyntaxError",
            JErrorType::Thrown(_) => "Error",
            JErrorType::Timeout(_) => "Error",
        }
    }

    /// The bare message, without the error name prefix.
    pub fn message(&self) -> String {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m) => m.to_string(),
            JErrorType::Thrown(v) => match v.get_own_property("message") {
                Some(m) if !m.is_undefined() => m.to_string(),
                _ => v.to_string(),
            },
            JErrorType::Timeout(ms) => format!("Script execution timed out after {}ms", ms),
        }
    }

    /// The value a `catch` clause binds for this error.
    pub fn to_js_value(&self) -> JsValue {
        match self {
            JErrorType::Thrown(v) => v.clone(),
            _ => ObjectType::new_error(self.name(), &self.message()),
        }
    }

    pub fn is_catchable(&self) -> bool {
        !matches!(self, JErrorType::Timeout(_))
    }
}

fn thrown_to_string(value: &JsValue) -> String {
    if value.is_error_object() {
        value.to_string()
    } else {
        format!("Uncaught {}", value.to_display_string())
    }
}
