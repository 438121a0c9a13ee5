//! Name resolution past the global object.
//!
//! When a binding refers to a name that no scope declares, neither the
//! binding's own scopes nor the guarded state nor the invocation parameters,
//! the lookup ends in the [`SuperGlobalEnvironment`]. It asks its
//! [`PluginResolver`]s in the order they were added and keeps whatever the
//! first claimant materializes, so `Math` is built once per [`EvalContext`]
//! and only if some binding touches it.
//!
//! [`CorePluginResolver`] puts a [`BuiltInRegistry`] behind that interface.
//! Hosts that want extra globals (units, formatters, feature flags) add their
//! own resolver:
//!
//! ```
//! use bindfn::runner::ds::error::JErrorType;
//! use bindfn::runner::ds::value::JsValue;
//! use bindfn::runner::plugin::resolver::PluginResolver;
//! use bindfn::runner::plugin::types::EvalContext;
//!
//! struct Flags;
//!
//! impl PluginResolver for Flags {
//!     fn has_binding(&self, name: &str) -> bool {
//!         name == "FEATURE_CHECKOUT"
//!     }
//!
//!     fn resolve(&self, _name: &str, _ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
//!         Ok(JsValue::Boolean(true))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "flags"
//!     }
//! }
//!
//! let mut ctx = EvalContext::new();
//! ctx.add_resolver(Box::new(Flags));
//! assert_eq!(ctx.get_binding("FEATURE_CHECKOUT").unwrap(), JsValue::Boolean(true));
//! ```

pub mod core_resolver;
pub mod registry;
pub mod resolver;
pub mod super_global;
pub mod types;

pub use core_resolver::CorePluginResolver;
pub use registry::BuiltInRegistry;
pub use resolver::PluginResolver;
pub use super_global::SuperGlobalEnvironment;
pub use types::{BuiltInFn, BuiltInObject, EvalContext, NativeFn};
