//! Core types for the plugin architecture.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::runner::ds::env_record::ObjectEnvironmentRecord;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::{find_binding_environment, outermost_environment, EnvRef, LexEnvironment};
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::core_resolver::CorePluginResolver;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::super_global::SuperGlobalEnvironment;

/// Shared handle to the super-global environment of one evaluation.
pub type SharedSuperGlobal = Rc<RefCell<SuperGlobalEnvironment>>;

/// Default cap on nested function calls before a `RangeError` is raised.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// How many steps a built-in loop takes between deadline checks.
const DEADLINE_STRIDE: usize = 1024;

/// Execution context passed to native functions and threaded through the evaluator.
///
/// Holds the current lexical environment, the `this` binding, the super-global
/// scope with its resolvers, and the guards that bound an evaluation: an optional
/// deadline and a call depth limit.
pub struct EvalContext {
    /// Environment used for identifier resolution at the current point of evaluation.
    pub lex_env: EnvRef,
    /// Environment `var` declarations and function declarations land in.
    pub var_env: EnvRef,
    pub this_value: JsValue,
    pub super_global: SharedSuperGlobal,
    global_object: JsObjectType,
    deadline: Option<(Instant, Duration)>,
    call_depth: usize,
    max_call_depth: usize,
}

impl EvalContext {
    /// A context with the core built-ins and an empty global object.
    pub fn new() -> Self {
        Self::new_with_registry(Rc::new(BuiltInRegistry::with_core()))
    }

    pub fn new_with_registry(registry: Rc<BuiltInRegistry>) -> Self {
        Self::new_with_global_object(registry, ObjectType::new_ordinary_object())
    }

    /// A context whose global scope is backed by `global_object`: its own
    /// properties are global bindings and undeclared assignments land on it.
    pub fn new_with_global_object(registry: Rc<BuiltInRegistry>, global_object: JsObjectType) -> Self {
        let mut super_global = SuperGlobalEnvironment::new();
        super_global.add_resolver(Box::new(CorePluginResolver::new(registry)));
        let global_env = LexEnvironment::new_object(
            ObjectEnvironmentRecord::new(global_object.clone()),
            None,
        );
        EvalContext {
            lex_env: global_env.clone(),
            var_env: global_env,
            this_value: JsValue::Undefined,
            super_global: Rc::new(RefCell::new(super_global)),
            global_object,
            deadline: None,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Evaluation fails with [`JErrorType::Timeout`] once `timeout` has elapsed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some((Instant::now() + timeout, timeout));
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Register an additional resolver. It is consulted after the ones already present.
    pub fn add_resolver(&mut self, resolver: Box<dyn PluginResolver>) {
        self.super_global.borrow_mut().add_resolver(resolver);
    }

    pub fn global_object(&self) -> &JsObjectType {
        &self.global_object
    }

    pub fn check_deadline(&self) -> Result<(), JErrorType> {
        if let Some((deadline, timeout)) = self.deadline {
            if Instant::now() >= deadline {
                return Err(JErrorType::Timeout(timeout.as_millis()));
            }
        }
        Ok(())
    }

    /// [`check_deadline`](Self::check_deadline) for long-running built-ins:
    /// only every `DEADLINE_STRIDE`th `step` reads the clock.
    pub fn check_deadline_every(&self, step: usize) -> Result<(), JErrorType> {
        if step % DEADLINE_STRIDE == 0 {
            self.check_deadline()
        } else {
            Ok(())
        }
    }

    /// Accounts for one more active call. Pair every successful call with [`EvalContext::exit_call`].
    pub fn enter_call(&mut self) -> Result<(), JErrorType> {
        self.check_deadline()?;
        if self.call_depth >= self.max_call_depth {
            return Err(JErrorType::RangeError(
                "Maximum call stack size exceeded".to_string(),
            ));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// Is `name` resolvable at all, either lexically or through the super-global scope?
    pub fn has_binding(&self, name: &str) -> bool {
        find_binding_environment(&self.lex_env, name).is_some()
            || self.super_global.borrow().has_name(name)
    }

    pub fn get_binding(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        if let Some(env) = find_binding_environment(&self.lex_env, name) {
            let env = env.borrow();
            return env.inner.as_env_record().get_binding_value(name);
        }
        let super_global = self.super_global.clone();
        let value = super_global.borrow_mut().resolve_binding(name, self);
        value
    }

    /// Assigns to an existing binding, or creates a global one when the name is
    /// not declared anywhere.
    pub fn set_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        let env = find_binding_environment(&self.lex_env, name)
            .unwrap_or_else(|| outermost_environment(&self.lex_env));
        let mut env = env.borrow_mut();
        env.inner.as_env_record_mut().set_mutable_binding(name, value)
    }

    /// Looks up a method shared by all values of a built-in type, e.g.
    /// `("String", "toUpperCase")`.
    pub fn get_prototype_method(&mut self, type_name: &str, method: &str) -> Option<JsValue> {
        self.super_global
            .borrow_mut()
            .resolve_prototype_method(type_name, method)
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn = fn(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType>;

/// Built-in function - either compiled-in or plugin-provided.
pub enum BuiltInFn {
    /// Direct function pointer - zero overhead for compiled-in functions.
    Native(NativeFn),

    /// Plugin-provided function, typically a closure over host state.
    Plugin(Box<dyn Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType>>),
}

impl BuiltInFn {
    /// Execute this built-in function.
    pub fn call(
        &self,
        ctx: &mut EvalContext,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        match self {
            BuiltInFn::Native(f) => f(ctx, this, args),
            BuiltInFn::Plugin(f) => f(ctx, this, args),
        }
    }
}

/// Built-in object definition.
/// Represents a JavaScript built-in object like Array, Object, String, etc.
pub struct BuiltInObject {
    /// Name of the object (e.g., "Array", "Object", "Math").
    pub name: String,

    /// Static methods, reachable as properties of the object itself (`Object.keys`).
    pub methods: HashMap<String, Rc<BuiltInFn>>,

    /// Methods every value of this type responds to (`"abc".toUpperCase()`).
    pub prototype_methods: HashMap<String, Rc<BuiltInFn>>,

    /// Static properties.
    pub properties: HashMap<String, JsValue>,

    /// Constructor function, if this object is callable or constructable.
    pub constructor: Option<Rc<BuiltInFn>>,
}

impl BuiltInObject {
    /// Create a new built-in object with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            methods: HashMap::new(),
            prototype_methods: HashMap::new(),
            properties: HashMap::new(),
            constructor: None,
        }
    }

    /// Add a native method.
    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.insert(name.into(), Rc::new(BuiltInFn::Native(func)));
        self
    }

    /// Add a native method to the prototype shared by values of this type.
    pub fn add_prototype_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.prototype_methods
            .insert(name.into(), Rc::new(BuiltInFn::Native(func)));
        self
    }

    /// Add a property.
    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Set the constructor function.
    pub fn with_constructor(mut self, constructor: NativeFn) -> Self {
        self.constructor = Some(Rc::new(BuiltInFn::Native(constructor)));
        self
    }
}
