use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::env_record::{
    DeclarativeEnvironmentRecord, EnvironmentRecordType, ObjectEnvironmentRecord,
};

pub type EnvRef = Rc<RefCell<LexEnvironment>>;

pub struct LexEnvironment {
    pub inner: Box<EnvironmentRecordType>,
    pub outer: Option<EnvRef>,
}
impl LexEnvironment {
    pub fn new(record: EnvironmentRecordType, outer: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(LexEnvironment {
            inner: Box::new(record),
            outer,
        }))
    }

    pub fn new_declarative(outer: Option<EnvRef>) -> EnvRef {
        Self::new(
            EnvironmentRecordType::Declarative(DeclarativeEnvironmentRecord::new()),
            outer,
        )
    }

    pub fn new_object(record: ObjectEnvironmentRecord, outer: Option<EnvRef>) -> EnvRef {
        Self::new(EnvironmentRecordType::Object(record), outer)
    }
}

/// Walks the chain outward and returns the first environment that has `name`.
pub fn find_binding_environment(env: &EnvRef, name: &str) -> Option<EnvRef> {
    let mut current = Some(env.clone());
    while let Some(e) = current {
        if e.borrow().inner.as_env_record().has_binding(name) {
            return Some(e);
        }
        current = e.borrow().outer.clone();
    }
    None
}

/// The outermost environment of the chain.
pub fn outermost_environment(env: &EnvRef) -> EnvRef {
    let mut current = env.clone();
    loop {
        let next = current.borrow().outer.clone();
        match next {
            Some(n) => current = n,
            None => return current,
        }
    }
}
