use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::parser::ast::FunctionData;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::EnvRef;
use crate::runner::ds::limits::{invalid_array_length, to_array_length, MAX_ARRAY_LENGTH};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::BuiltInFn;

pub type JsObjectType = Rc<RefCell<ObjectType>>;

/// Property storage shared by every object kind. Insertion order is kept so that
/// enumeration (`Object.keys`, `for..in`, JSON) matches what scripts expect.
pub struct ObjectBase {
    properties: IndexMap<String, JsValue>,
    is_extensible: bool,
    /// The function that constructed this object through `new`, used by `instanceof`.
    constructor: Option<JsObjectType>,
}
impl ObjectBase {
    pub fn new() -> Self {
        ObjectBase {
            properties: IndexMap::new(),
            is_extensible: true,
            constructor: None,
        }
    }
}
impl Default for ObjectBase {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ArrayObject {
    pub elements: Vec<JsValue>,
    base: ObjectBase,
}

pub enum FunctionKind {
    /// A function defined in script code, closing over the environment it was created in.
    /// Arrow functions also capture the `this` of that environment.
    Script {
        data: Rc<FunctionData>,
        scope: EnvRef,
        this_value: Option<JsValue>,
    },
    Native(Rc<BuiltInFn>),
}

pub struct FunctionObject {
    pub name: String,
    pub kind: FunctionKind,
    base: ObjectBase,
}

pub struct ErrorObject {
    base: ObjectBase,
}

pub enum ObjectType {
    Ordinary(ObjectBase),
    Array(ArrayObject),
    Function(FunctionObject),
    Error(ErrorObject),
}
impl ObjectType {
    fn wrap(self) -> JsValue {
        JsValue::Object(Rc::new(RefCell::new(self)))
    }

    pub fn new_ordinary() -> JsValue {
        ObjectType::Ordinary(ObjectBase::new()).wrap()
    }

    pub fn new_ordinary_object() -> JsObjectType {
        Rc::new(RefCell::new(ObjectType::Ordinary(ObjectBase::new())))
    }

    pub fn new_array(elements: Vec<JsValue>) -> JsValue {
        ObjectType::Array(ArrayObject {
            elements,
            base: ObjectBase::new(),
        })
        .wrap()
    }

    pub fn new_error(name: &str, message: &str) -> JsValue {
        let mut base = ObjectBase::new();
        base.properties
            .insert("name".to_string(), JsValue::String(name.to_string()));
        base.properties
            .insert("message".to_string(), JsValue::String(message.to_string()));
        ObjectType::Error(ErrorObject { base }).wrap()
    }

    pub fn new_native_function(name: impl Into<String>, f: Rc<BuiltInFn>) -> JsValue {
        ObjectType::Function(FunctionObject {
            name: name.into(),
            kind: FunctionKind::Native(f),
            base: ObjectBase::new(),
        })
        .wrap()
    }

    pub fn new_script_function(
        data: Rc<FunctionData>,
        scope: EnvRef,
        this_value: Option<JsValue>,
    ) -> JsValue {
        let name = data
            .id
            .as_ref()
            .map(|id| id.name.to_string())
            .unwrap_or_default();
        ObjectType::Function(FunctionObject {
            name,
            kind: FunctionKind::Script {
                data,
                scope,
                this_value,
            },
            base: ObjectBase::new(),
        })
        .wrap()
    }

    fn base(&self) -> &ObjectBase {
        match self {
            ObjectType::Ordinary(b) => b,
            ObjectType::Array(a) => &a.base,
            ObjectType::Function(f) => &f.base,
            ObjectType::Error(e) => &e.base,
        }
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        match self {
            ObjectType::Ordinary(b) => b,
            ObjectType::Array(a) => &mut a.base,
            ObjectType::Function(f) => &mut f.base,
            ObjectType::Error(e) => &mut e.base,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, ObjectType::Function(_))
    }

    pub fn is_extensible(&self) -> bool {
        self.base().is_extensible
    }

    pub fn prevent_extensions(&mut self) {
        self.base_mut().is_extensible = false;
    }

    pub fn get_constructor(&self) -> Option<JsObjectType> {
        self.base().constructor.clone()
    }

    pub fn set_constructor(&mut self, constructor: JsObjectType) {
        self.base_mut().constructor = Some(constructor);
    }

    pub fn get_own_property(&self, key: &str) -> Option<JsValue> {
        match self {
            ObjectType::Array(a) => {
                if key == "length" {
                    return Some(JsValue::new_integer(a.elements.len() as i64));
                }
                if let Some(idx) = array_index(key) {
                    return a.elements.get(idx).cloned();
                }
            }
            ObjectType::Function(f) => {
                if key == "name" && !f.base.properties.contains_key("name") {
                    return Some(JsValue::String(f.name.to_string()));
                }
            }
            _ => {}
        }
        self.base().properties.get(key).cloned()
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.get_own_property(key).is_some()
    }

    /// Fails when writing `key` would make an array longer than it may be.
    pub fn check_array_write(&self, key: &str, value: &JsValue) -> Result<(), JErrorType> {
        if let ObjectType::Array(_) = self {
            if key == "length" {
                if let JsValue::Number(n) = value {
                    to_array_length(n.to_f64())?;
                }
            } else if let Some(idx) = array_index(key) {
                if idx >= MAX_ARRAY_LENGTH {
                    return Err(invalid_array_length());
                }
            }
        }
        Ok(())
    }

    /// Creates or overwrites a property. Returns `false` when the object refused the write.
    pub fn set_property(&mut self, key: &str, value: JsValue) -> bool {
        if let ObjectType::Array(a) = self {
            if key == "length" {
                let len = match &value {
                    JsValue::Number(n) => n.to_f64(),
                    _ => f64::NAN,
                };
                if len.is_nan() || len < 0.0 || len.fract() != 0.0 || len > MAX_ARRAY_LENGTH as f64 {
                    return false;
                }
                a.elements.resize(len as usize, JsValue::Undefined);
                return true;
            }
            if let Some(idx) = array_index(key) {
                if idx >= a.elements.len() {
                    if !a.base.is_extensible || idx >= MAX_ARRAY_LENGTH {
                        return false;
                    }
                    a.elements.resize(idx + 1, JsValue::Undefined);
                }
                a.elements[idx] = value;
                return true;
            }
        }
        let base = self.base_mut();
        if !base.is_extensible && !base.properties.contains_key(key) {
            return false;
        }
        base.properties.insert(key.to_string(), value);
        true
    }

    pub fn delete_property(&mut self, key: &str) -> bool {
        if let ObjectType::Array(a) = self {
            if let Some(idx) = array_index(key) {
                if idx < a.elements.len() {
                    a.elements[idx] = JsValue::Undefined;
                }
                return true;
            }
        }
        self.base_mut().properties.shift_remove(key);
        true
    }

    /// Own enumerable keys, array indices first.
    pub fn own_keys(&self) -> Vec<String> {
        let mut keys = vec![];
        if let ObjectType::Array(a) = self {
            keys.extend((0..a.elements.len()).map(|i| i.to_string()));
        }
        keys.extend(self.base().properties.keys().cloned());
        keys
    }

    pub fn own_entries(&self) -> Vec<(String, JsValue)> {
        self.own_keys()
            .into_iter()
            .filter_map(|k| self.get_own_property(&k).map(|v| (k, v)))
            .collect()
    }

    pub fn to_js_string(&self) -> String {
        match self {
            ObjectType::Ordinary(_) => "[object Object]".to_string(),
            ObjectType::Array(a) => a
                .elements
                .iter()
                .map(|e| match e {
                    JsValue::Undefined | JsValue::Null => String::new(),
                    _ => e.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            ObjectType::Function(f) => match f.kind {
                FunctionKind::Native(_) => format!("function {}() {{ [native code] }}", f.name),
                FunctionKind::Script { .. } => format!("function {}() {{ ... }}", f.name),
            },
            ObjectType::Error(e) => {
                let name = e
                    .base
                    .properties
                    .get("name")
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "Error".to_string());
                let message = e
                    .base
                    .properties
                    .get("message")
                    .map(|m| m.to_string())
                    .unwrap_or_default();
                if message.is_empty() {
                    name
                } else {
                    format!("{}: {}", name, message)
                }
            }
        }
    }
}

fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse::<usize>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_length_and_indices_are_virtual_properties() {
        let arr = ObjectType::new_array(vec![JsValue::new_integer(1), JsValue::new_integer(2)]);
        let obj = arr.as_object().unwrap();
        assert_eq!(obj.borrow().get_own_property("length"), Some(JsValue::new_integer(2)));
        assert!(obj.borrow_mut().set_property("3", JsValue::new_integer(4)));
        assert_eq!(obj.borrow().get_own_property("length"), Some(JsValue::new_integer(4)));
        assert_eq!(obj.borrow().get_own_property("2"), Some(JsValue::Undefined));
        assert_eq!(obj.borrow().get_own_property("01"), None);
    }

    #[test]
    fn non_extensible_objects_reject_new_keys_only() {
        let o = ObjectType::new_ordinary();
        let obj = o.as_object().unwrap();
        obj.borrow_mut().set_property("a", JsValue::new_integer(1));
        obj.borrow_mut().prevent_extensions();
        assert!(!obj.borrow_mut().set_property("b", JsValue::new_integer(2)));
        assert!(obj.borrow_mut().set_property("a", JsValue::new_integer(3)));
        assert_eq!(obj.borrow().own_keys(), vec!["a".to_string()]);
    }

    #[test]
    fn error_objects_format_with_name_and_message() {
        let e = ObjectType::new_error("TypeError", "boom");
        assert_eq!(e.to_string(), "TypeError: boom");
    }
}
