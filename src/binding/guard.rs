use std::rc::Rc;

use crate::runner::ds::env_record::{BindingFilter, ObjectEnvironmentRecord};
use crate::runner::ds::lex_env::{EnvRef, LexEnvironment};
use crate::runner::ds::value::JsValue;

/// Names a binding always resolves to the invocation's own parameters, even
/// when the state object has a property of the same name.
pub const RESERVED_NAMES: [&str; 7] = [
    "state", "event", "block", "builder", "Device", "update", "Builder",
];

/// Read-only, name-shadowing view of a state object.
///
/// Bare identifiers resolve against the state's own properties, except the
/// [`RESERVED_NAMES`], whose lookups continue outward. Every write through the
/// guarded scope is dropped silently.
pub struct ScopeGuard;

impl BindingFilter for ScopeGuard {
    fn hides(&self, name: &str) -> bool {
        RESERVED_NAMES.contains(&name)
    }

    fn is_read_only(&self) -> bool {
        true
    }
}

/// Pushes a guarded scope over `state` on top of `outer`. Non-object state
/// has nothing to guard, so `outer` is returned as is.
pub fn guard_state(state: &JsValue, outer: EnvRef) -> EnvRef {
    match state {
        JsValue::Object(o) => LexEnvironment::new_object(
            ObjectEnvironmentRecord::new_filtered(o.clone(), Rc::new(ScopeGuard)),
            Some(outer),
        ),
        _ => outer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::ObjectType;

    fn state() -> JsValue {
        JsValue::from_json(&serde_json::json!({"a": 1, "event": "from state"}))
    }

    #[test]
    fn reserved_names_are_not_answered_by_the_guard() {
        let outer = LexEnvironment::new_declarative(None);
        let env = guard_state(&state(), outer);
        let env = env.borrow();
        let record = env.inner.as_env_record();
        assert!(record.has_binding("a"));
        assert!(!record.has_binding("event"));
    }

    #[test]
    fn writes_are_dropped() {
        let state = state();
        let env = guard_state(&state, LexEnvironment::new_declarative(None));
        env.borrow_mut()
            .inner
            .as_env_record_mut()
            .set_mutable_binding("a", JsValue::new_integer(5))
            .unwrap();
        assert_eq!(state.get_own_property("a"), Some(JsValue::new_integer(1)));
    }

    #[test]
    fn primitive_state_adds_no_scope() {
        let outer = LexEnvironment::new_declarative(None);
        let env = guard_state(&JsValue::new_integer(3), outer.clone());
        assert!(Rc::ptr_eq(&env, &outer));
        let arr = ObjectType::new_array(vec![]);
        assert!(!Rc::ptr_eq(&guard_state(&arr, outer.clone()), &outer));
    }
}
