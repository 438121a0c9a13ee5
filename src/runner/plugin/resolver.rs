//! The extension point of the super-global scope.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

/// Supplies globals on demand.
///
/// The first resolver (in registration order) whose `has_binding` says yes
/// owns the name.
pub trait PluginResolver {
    /// Whether `name` belongs to this resolver. Must not build the value.
    fn has_binding(&self, name: &str) -> bool;

    /// Builds the value for a name `has_binding` accepted. The result is
    /// cached per context, so this runs at most once per name.
    fn resolve(&self, name: &str, ctx: &mut EvalContext) -> Result<JsValue, JErrorType>;

    /// A method every value of `type_name` shares, such as `("Array", "map")`.
    fn resolve_prototype_method(&self, _type_name: &str, _method_name: &str) -> Option<JsValue> {
        None
    }

    /// Identifies the resolver.
    fn name(&self) -> &str;
}
