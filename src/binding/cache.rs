use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use super::invocation::BindingFn;

/// The slot a (text, mode) pair occupies: `"a + b:true"`.
pub fn cache_key(text: &str, expression: bool) -> String {
    format!("{}:{}", text, expression)
}

/// Compiled bindings by [`cache_key`].
///
/// Entries are never evicted, so memory grows with the number of distinct
/// binding texts seen. Callers generating unique text per call grow it
/// without bound.
#[derive(Default)]
pub struct BindingCache {
    entries: RefCell<HashMap<String, BindingFn>>,
}

impl BindingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<BindingFn> {
        self.entries.borrow().get(key).cloned()
    }

    /// Returns the cached binding for `key`, compiling and inserting it on a miss.
    pub fn get_or_insert_with(&self, key: String, compile: impl FnOnce() -> BindingFn) -> BindingFn {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        debug!(key = %key, "binding cache miss");
        let compiled = compile();
        self.entries
            .borrow_mut()
            .entry(key)
            .or_insert(compiled)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drops every entry. Production code never needs this.
    pub fn reset(&self) {
        self.entries.borrow_mut().clear();
    }
}
