//! Console built-in object.
//!
//! Provides console.log, console.error, console.warn, console.info and
//! console.debug. Output goes to `tracing` under the `bindfn::console` target
//! rather than to stdout, so evaluated code cannot interleave with a host's
//! own output.

use tracing::{debug, error, info, warn};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

/// Register the console object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let console = BuiltInObject::new("console")
        .add_method("log", console_log)
        .add_method("error", console_error)
        .add_method("warn", console_warn)
        .add_method("info", console_info)
        .add_method("debug", console_debug);

    registry.register_object(console);
}

/// Format all arguments for console output: strings as-is, everything else
/// the way a console shows it.
pub fn format_args(args: &[JsValue]) -> String {
    args.iter()
        .map(|a| match a {
            JsValue::String(s) => s.to_string(),
            _ => a.to_display_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// console.log
fn console_log(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    info!(target: "bindfn::console", "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.info
fn console_info(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    info!(target: "bindfn::console", "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.error
fn console_error(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    error!(target: "bindfn::console", "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.warn
fn console_warn(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    warn!(target: "bindfn::console", "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.debug
fn console_debug(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    debug!(target: "bindfn::console", "{}", format_args(&args));
    Ok(JsValue::Undefined)
}
