//! Built-in registry for managing built-in objects, global functions and constants.

use std::collections::HashMap;
use std::rc::Rc;

use super::types::{BuiltInFn, BuiltInObject, NativeFn};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::register_core_builtins;

/// Registry for built-ins.
///
/// The registry only describes built-ins. Script-visible objects are
/// materialized from it per evaluation context by the
/// [`CorePluginResolver`](super::core_resolver::CorePluginResolver), so a
/// single registry can be shared by any number of evaluations.
pub struct BuiltInRegistry {
    /// All registered built-in objects.
    objects: HashMap<String, BuiltInObject>,

    /// Global functions such as `parseInt`.
    functions: HashMap<String, Rc<BuiltInFn>>,

    /// Global constants such as `NaN`.
    values: HashMap<String, JsValue>,
}

impl BuiltInRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        BuiltInRegistry {
            objects: HashMap::new(),
            functions: HashMap::new(),
            values: HashMap::new(),
        }
    }

    /// Create a registry with the core built-ins (console, Object, Array, Math, JSON...).
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_builtins(&mut registry);
        registry
    }

    /// Register a built-in object (programmatic API).
    pub fn register_object(&mut self, obj: BuiltInObject) {
        self.objects.insert(obj.name.clone(), obj);
    }

    pub fn register_function(&mut self, name: impl Into<String>, func: NativeFn) {
        self.functions
            .insert(name.into(), Rc::new(BuiltInFn::Native(func)));
    }

    pub fn register_value(&mut self, name: impl Into<String>, value: JsValue) {
        self.values.insert(name.into(), value);
    }

    /// Get a registered object by name.
    pub fn get_object(&self, name: &str) -> Option<&BuiltInObject> {
        self.objects.get(name)
    }

    pub fn get_function(&self, name: &str) -> Option<&Rc<BuiltInFn>> {
        self.functions.get(name)
    }

    pub fn get_value(&self, name: &str) -> Option<&JsValue> {
        self.values.get(name)
    }

    /// Get a static method of a built-in object.
    pub fn get_method(&self, object: &str, method: &str) -> Option<&Rc<BuiltInFn>> {
        self.objects
            .get(object)
            .and_then(|obj| obj.methods.get(method))
    }

    /// Get a method shared by every value of a built-in type.
    pub fn get_prototype_method(&self, object: &str, method: &str) -> Option<&Rc<BuiltInFn>> {
        self.objects
            .get(object)
            .and_then(|obj| obj.prototype_methods.get(method))
    }

    /// Get a constructor function for an object.
    pub fn get_constructor(&self, object: &str) -> Option<&Rc<BuiltInFn>> {
        self.objects
            .get(object)
            .and_then(|obj| obj.constructor.as_ref())
    }

    /// Check if an object exists in the registry.
    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Check if any kind of global built-in is registered under `name`.
    pub fn has_name(&self, name: &str) -> bool {
        self.objects.contains_key(name)
            || self.functions.contains_key(name)
            || self.values.contains_key(name)
    }

    /// Check if a method exists on an object.
    pub fn has_method(&self, object: &str, method: &str) -> bool {
        self.objects
            .get(object)
            .map(|obj| obj.methods.contains_key(method))
            .unwrap_or(false)
    }

    /// Get list of all registered global names.
    pub fn global_names(&self) -> Vec<&String> {
        self.objects
            .keys()
            .chain(self.functions.keys())
            .chain(self.values.keys())
            .collect()
    }
}

impl Default for BuiltInRegistry {
    fn default() -> Self {
        Self::with_core()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_registry_has_expected_globals() {
        let registry = BuiltInRegistry::with_core();
        for name in &[
            "Math", "JSON", "console", "Object", "Array", "String", "Number", "Boolean",
            "Error", "TypeError", "parseInt", "parseFloat", "isNaN", "undefined", "NaN",
            "Infinity",
        ] {
            assert!(registry.has_name(name), "missing {}", name);
        }
        assert!(registry.has_method("Math", "floor"));
        assert!(registry.get_prototype_method("String", "toUpperCase").is_some());
        assert!(registry.get_prototype_method("Array", "map").is_some());
    }
}
