//! Super-global environment, the bottom of the scope chain.
//!
//! Names no environment record answers for end up here. The environment asks
//! its resolvers in order and keeps whatever the first one materializes, so a
//! built-in exists at most once per evaluation context. Contexts never share a
//! super-global, and a binding that replaces `Math.max` only affects itself.
//!
//! For a client binding the whole chain reads:
//!
//! ```text
//! body scope → guarded state → parameters → global object → super-global
//!                                                            ├─ core (Math, JSON, ...)
//!                                                            └─ host plugins
//! ```
//!
//! ```
//! use bindfn::runner::plugin::super_global::SuperGlobalEnvironment;
//! use bindfn::runner::plugin::resolver::PluginResolver;
//! use bindfn::runner::plugin::types::EvalContext;
//! use bindfn::runner::ds::value::JsValue;
//! use bindfn::runner::ds::error::JErrorType;
//!
//! struct Locale;
//!
//! impl PluginResolver for Locale {
//!     fn has_binding(&self, name: &str) -> bool {
//!         name == "LOCALE"
//!     }
//!
//!     fn resolve(&self, _name: &str, _ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
//!         Ok(JsValue::new_string("en-GB"))
//!     }
//!
//!     fn name(&self) -> &str { "locale" }
//! }
//!
//! let mut sg = SuperGlobalEnvironment::new();
//! sg.add_resolver(Box::new(Locale));
//! assert!(sg.has_name("LOCALE"));
//! assert!(!sg.has_name("Math"));
//! ```

use std::collections::HashMap;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::types::EvalContext;

/// Lazily resolved built-ins and plugin objects of one evaluation context.
///
/// A name is looked up in the cache first, then offered to the resolvers in
/// registration order; the first one whose `has_binding` claims it
/// materializes the value, which is cached along with the resolver's index.
/// Scripts cannot write here, they can only shadow.
pub struct SuperGlobalEnvironment {
    /// Registered plugin resolvers, queried in order.
    resolvers: Vec<Box<dyn PluginResolver>>,
    /// Cache of already-resolved bindings (name → value).
    cache: HashMap<String, JsValue>,
    /// Cache of which resolver index owns which name.
    resolver_map: HashMap<String, usize>,
    /// Cache of materialized prototype methods ((type, method) → function value).
    prototype_cache: HashMap<(String, String), JsValue>,
}

impl SuperGlobalEnvironment {
    pub fn new() -> Self {
        SuperGlobalEnvironment {
            resolvers: Vec::new(),
            cache: HashMap::new(),
            resolver_map: HashMap::new(),
            prototype_cache: HashMap::new(),
        }
    }

    /// Register a plugin resolver. Resolvers are queried in registration order.
    pub fn add_resolver(&mut self, resolver: Box<dyn PluginResolver>) {
        self.resolvers.push(resolver);
    }

    /// Find which resolver (if any) provides the given name.
    fn find_resolver_index(&self, name: &str) -> Option<usize> {
        if let Some(&idx) = self.resolver_map.get(name) {
            return Some(idx);
        }
        self.resolvers.iter().position(|r| r.has_binding(name))
    }

    /// Check if any resolver provides the given name.
    pub fn has_name(&self, name: &str) -> bool {
        self.cache.contains_key(name) || self.find_resolver_index(name).is_some()
    }

    /// Resolve a name, caching the result.
    /// `ctx` is needed because some resolvers may need it during materialization.
    pub fn resolve_binding(
        &mut self,
        name: &str,
        ctx: &mut EvalContext,
    ) -> Result<JsValue, JErrorType> {
        if let Some(val) = self.cache.get(name) {
            return Ok(val.clone());
        }

        if let Some(idx) = self.find_resolver_index(name) {
            let value = self.resolvers[idx].resolve(name, ctx)?;
            self.cache.insert(name.to_string(), value.clone());
            self.resolver_map.insert(name.to_string(), idx);
            Ok(value)
        } else {
            Err(JErrorType::ReferenceError(format!("{} is not defined", name)))
        }
    }

    /// Resolve a method shared by the values of a built-in type, caching the
    /// function value so repeated lookups yield the same object.
    pub fn resolve_prototype_method(&mut self, type_name: &str, method: &str) -> Option<JsValue> {
        let key = (type_name.to_string(), method.to_string());
        if let Some(val) = self.prototype_cache.get(&key) {
            return Some(val.clone());
        }
        let value = self
            .resolvers
            .iter()
            .find_map(|r| r.resolve_prototype_method(type_name, method))?;
        self.prototype_cache.insert(key, value.clone());
        Some(value)
    }

    /// Get a reference to the resolvers (for inspection/testing).
    pub fn resolvers(&self) -> &[Box<dyn PluginResolver>] {
        &self.resolvers
    }
}

impl Default for SuperGlobalEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
