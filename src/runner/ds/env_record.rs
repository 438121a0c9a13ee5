use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;

pub trait EnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool;
    fn create_mutable_binding(&mut self, name: String, value: JsValue) -> Result<(), JErrorType>;
    fn create_immutable_binding(&mut self, name: String, value: JsValue) -> Result<(), JErrorType>;
    fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType>;
    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType>;
    fn delete_binding(&mut self, name: &str) -> bool;
    /// Names and values of every binding, in no particular order.
    fn get_all_bindings(&self) -> Vec<(String, JsValue)>;
}

pub enum EnvironmentRecordType {
    Declarative(DeclarativeEnvironmentRecord),
    Object(ObjectEnvironmentRecord),
}
impl EnvironmentRecordType {
    pub fn as_env_record(&self) -> &dyn EnvironmentRecord {
        match self {
            EnvironmentRecordType::Declarative(d) => d,
            EnvironmentRecordType::Object(d) => d,
        }
    }

    pub fn as_env_record_mut(&mut self) -> &mut dyn EnvironmentRecord {
        match self {
            EnvironmentRecordType::Declarative(d) => d,
            EnvironmentRecordType::Object(d) => d,
        }
    }
}

pub struct DeclarativeEnvironmentRecord {
    bindings: HashMap<String, JsValue>,
    immutable: HashSet<String>,
}
impl DeclarativeEnvironmentRecord {
    pub fn new() -> Self {
        DeclarativeEnvironmentRecord {
            bindings: HashMap::new(),
            immutable: HashSet::new(),
        }
    }
}
impl Default for DeclarativeEnvironmentRecord {
    fn default() -> Self {
        Self::new()
    }
}
impl EnvironmentRecord for DeclarativeEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    fn create_mutable_binding(&mut self, name: String, value: JsValue) -> Result<(), JErrorType> {
        if self.immutable.contains(&name) {
            return Err(JErrorType::SyntaxError(format!(
                "Identifier '{}' has already been declared",
                name
            )));
        }
        self.bindings.insert(name, value);
        Ok(())
    }

    fn create_immutable_binding(&mut self, name: String, value: JsValue) -> Result<(), JErrorType> {
        if self.immutable.contains(&name) {
            return Err(JErrorType::SyntaxError(format!(
                "Identifier '{}' has already been declared",
                name
            )));
        }
        self.immutable.insert(name.to_string());
        self.bindings.insert(name, value);
        Ok(())
    }

    fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        if self.immutable.contains(name) {
            return Err(JErrorType::TypeError(
                "Assignment to constant variable.".to_string(),
            ));
        }
        match self.bindings.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        self.bindings
            .get(name)
            .cloned()
            .ok_or_else(|| JErrorType::ReferenceError(format!("{} is not defined", name)))
    }

    fn delete_binding(&mut self, _name: &str) -> bool {
        // Declared bindings are never deletable.
        false
    }

    fn get_all_bindings(&self) -> Vec<(String, JsValue)> {
        self.bindings
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Restricts what an [`ObjectEnvironmentRecord`] exposes to identifier resolution.
pub trait BindingFilter {
    /// Names that must never resolve against the binding object, so lookups
    /// continue with the outer environment.
    fn hides(&self, name: &str) -> bool;

    /// When true every write through the environment is dropped without an error.
    fn is_read_only(&self) -> bool;
}

/// An environment whose bindings are the own properties of an object, the way
/// `with (obj) { ... }` and a script's global object behave.
pub struct ObjectEnvironmentRecord {
    binding_object: JsObjectType,
    filter: Option<Rc<dyn BindingFilter>>,
}
impl ObjectEnvironmentRecord {
    pub fn new(o: JsObjectType) -> Self {
        ObjectEnvironmentRecord {
            binding_object: o,
            filter: None,
        }
    }

    pub fn new_filtered(o: JsObjectType, filter: Rc<dyn BindingFilter>) -> Self {
        ObjectEnvironmentRecord {
            binding_object: o,
            filter: Some(filter),
        }
    }

    pub fn get_binding_object(&self) -> &JsObjectType {
        &self.binding_object
    }

    fn is_hidden(&self, name: &str) -> bool {
        self.filter.as_ref().map(|f| f.hides(name)).unwrap_or(false)
    }

    fn is_read_only(&self) -> bool {
        self.filter.as_ref().map(|f| f.is_read_only()).unwrap_or(false)
    }
}
impl EnvironmentRecord for ObjectEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        !self.is_hidden(name) && self.binding_object.borrow().has_own_property(name)
    }

    fn create_mutable_binding(&mut self, name: String, value: JsValue) -> Result<(), JErrorType> {
        if !self.is_read_only() {
            self.binding_object.borrow_mut().set_property(&name, value);
        }
        Ok(())
    }

    fn create_immutable_binding(&mut self, name: String, value: JsValue) -> Result<(), JErrorType> {
        self.create_mutable_binding(name, value)
    }

    fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        if !self.is_read_only() {
            self.binding_object.borrow_mut().set_property(name, value);
        }
        Ok(())
    }

    fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        if self.is_hidden(name) {
            return Ok(JsValue::Undefined);
        }
        Ok(self
            .binding_object
            .borrow()
            .get_own_property(name)
            .unwrap_or(JsValue::Undefined))
    }

    fn delete_binding(&mut self, name: &str) -> bool {
        if self.is_read_only() || self.is_hidden(name) {
            return false;
        }
        self.binding_object.borrow_mut().delete_property(name)
    }

    fn get_all_bindings(&self) -> Vec<(String, JsValue)> {
        self.binding_object
            .borrow()
            .own_entries()
            .into_iter()
            .filter(|(k, _)| !self.is_hidden(k))
            .collect()
    }
}
