//! Core plugin resolver, wraps the `BuiltInRegistry` as a `PluginResolver`.
//!
//! This makes all built-in objects (Math, console, String, etc.) available
//! through the super-global scope's lazy resolution mechanism.

use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::types::EvalContext;

/// Wraps a shared `BuiltInRegistry` as a `PluginResolver`.
///
/// When the super-global scope queries for a name like `"Math"`, this
/// resolver materializes a fresh object whose properties are the registry's
/// methods and constants. Objects with a constructor (`Array`, `Error`...)
/// materialize as callable functions carrying their static methods.
pub struct CorePluginResolver {
    registry: Rc<BuiltInRegistry>,
}

impl CorePluginResolver {
    pub fn new(registry: Rc<BuiltInRegistry>) -> Self {
        CorePluginResolver { registry }
    }

    pub fn registry(&self) -> &BuiltInRegistry {
        &self.registry
    }
}

impl PluginResolver for CorePluginResolver {
    fn has_binding(&self, name: &str) -> bool {
        self.registry.has_name(name)
    }

    fn resolve(&self, name: &str, _ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
        if let Some(value) = self.registry.get_value(name) {
            return Ok(value.clone());
        }
        if let Some(f) = self.registry.get_function(name) {
            return Ok(ObjectType::new_native_function(name, f.clone()));
        }
        let builtin_obj = self
            .registry
            .get_object(name)
            .ok_or_else(|| JErrorType::ReferenceError(format!("{} is not defined", name)))?;

        let value = match &builtin_obj.constructor {
            Some(ctor) => ObjectType::new_native_function(name, ctor.clone()),
            None => ObjectType::new_ordinary(),
        };
        if let JsValue::Object(o) = &value {
            let mut o = o.borrow_mut();
            for (prop_name, prop_value) in &builtin_obj.properties {
                o.set_property(prop_name, prop_value.clone());
            }
            for (method_name, method) in &builtin_obj.methods {
                o.set_property(
                    method_name,
                    ObjectType::new_native_function(method_name.to_string(), method.clone()),
                );
            }
        }
        Ok(value)
    }

    fn resolve_prototype_method(&self, type_name: &str, method_name: &str) -> Option<JsValue> {
        self.registry
            .get_prototype_method(type_name, method_name)
            .map(|f| ObjectType::new_native_function(method_name.to_string(), f.clone()))
    }

    fn name(&self) -> &str {
        "core"
    }
}
