//! Turns data-binding source text into callables.
//!
//! A [`BindingCompiler`] is created once per host with the host kind fixed:
//!
//! - on a [`HostEnvironment::Client`] the text is parsed once, and the
//!   resulting [`BindingFn`] is memoized by text and mode;
//! - on a [`HostEnvironment::Server`] nothing is memoized, and every call runs
//!   the text in a fresh, time-limited [`Sandbox`](server::Sandbox).
//!
//! Compiled bindings never fail. Errors go to the sinks given at compile time
//! and the binding yields `undefined`.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use bindfn::binding::{BindingCompiler, CallArgs, HostEnvironment};
//! use bindfn::runner::ds::value::JsValue;
//!
//! let compiler = BindingCompiler::new(HostEnvironment::Client);
//! let errors = Rc::new(RefCell::new(Vec::new()));
//!
//! let total = compiler.compile_or_get("price * quantity", true, Some(&errors), None);
//! let state = JsValue::from_json(&serde_json::json!({"price": 3, "quantity": 4}));
//! assert_eq!(total.call(&CallArgs::new(state)), JsValue::new_integer(12));
//!
//! let broken = compiler.compile_or_get("missing.field", true, Some(&errors), None);
//! assert!(broken.call(&CallArgs::new(JsValue::Undefined)).is_undefined());
//! assert_eq!(errors.borrow().len(), 1);
//! ```

pub mod cache;
pub mod classify;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod guard;
pub mod invocation;
pub mod server;

use std::rc::Rc;

use tracing::debug;

use crate::runner::ds::object::ObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;

pub use self::cache::{cache_key, BindingCache};
pub use self::classify::should_wrap_in_return;
pub use self::client::ClientStrategy;
pub use self::config::BindingConfig;
pub use self::diagnostics::Diagnostics;
pub use self::error::BindingError;
pub use self::invocation::{Accumulators, BindingFn, CallArgs, ErrorSink, LogSink};
pub use self::server::{
    InterpreterSandbox, InterpreterSandboxProvider, Sandbox, SandboxOptions, SandboxProvider,
    ServerStrategy,
};

/// Where bindings run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEnvironment {
    Client,
    Server,
}

impl HostEnvironment {
    /// The name failure reports use for the host.
    pub fn name(&self) -> &'static str {
        match self {
            HostEnvironment::Client => "browser",
            HostEnvironment::Server => "server",
        }
    }
}

/// How a host turns binding text into a callable.
pub trait ExecutionStrategy {
    /// Whether bindings built by this strategy may be memoized.
    fn caches_bindings(&self) -> bool;

    /// Builds the callable for `text`. `wrap` asks for the text to be framed
    /// as `return (text);`. Failures go to `accumulators`, never to the caller.
    fn create_binding(&self, text: &str, wrap: bool, accumulators: Accumulators) -> BindingFn;
}

/// The capability handle server bindings get from `builder(...)` unless the
/// host supplies its own.
pub fn default_capability(host: HostEnvironment) -> JsValue {
    let handle = ObjectType::new_ordinary_object();
    {
        let mut handle = handle.borrow_mut();
        handle.set_property("isBrowser", JsValue::Boolean(host == HostEnvironment::Client));
        handle.set_property("isServer", JsValue::Boolean(host == HostEnvironment::Server));
        handle.set_property("isEditing", JsValue::Boolean(false));
    }
    JsValue::Object(handle)
}

pub struct BindingCompiler {
    host: HostEnvironment,
    config: BindingConfig,
    registry: Rc<BuiltInRegistry>,
    provider: Option<Rc<dyn SandboxProvider>>,
    capability: JsValue,
    strategy: Box<dyn ExecutionStrategy>,
    cache: BindingCache,
}

impl BindingCompiler {
    /// A compiler for `host` configured from the environment.
    pub fn new(host: HostEnvironment) -> Self {
        Self::with_config(host, BindingConfig::from_env())
    }

    pub fn with_config(host: HostEnvironment, config: BindingConfig) -> Self {
        let registry = Rc::new(BuiltInRegistry::with_core());
        let capability = default_capability(host);
        let strategy = build_strategy(host, &config, &registry, None, &capability);
        debug!(host = host.name(), "binding compiler created");
        BindingCompiler {
            host,
            config,
            registry,
            provider: None,
            capability,
            strategy,
            cache: BindingCache::new(),
        }
    }

    /// Replaces the sandbox server bindings run in.
    pub fn with_sandbox_provider(mut self, provider: Rc<dyn SandboxProvider>) -> Self {
        self.provider = Some(provider);
        self.rebuild_strategy()
    }

    /// Sets what `builder(...)` yields inside server bindings.
    pub fn with_capability(mut self, capability: JsValue) -> Self {
        self.capability = capability;
        self.rebuild_strategy()
    }

    /// Replaces the built-ins bindings can reach.
    pub fn with_registry(mut self, registry: BuiltInRegistry) -> Self {
        self.registry = Rc::new(registry);
        self.rebuild_strategy()
    }

    fn rebuild_strategy(mut self) -> Self {
        self.strategy = build_strategy(
            self.host,
            &self.config,
            &self.registry,
            self.provider.clone(),
            &self.capability,
        );
        self.cache.reset();
        self
    }

    pub fn host(&self) -> HostEnvironment {
        self.host
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Returns the callable for `text`, compiling it unless a client host has
    /// already compiled the same text in the same mode.
    ///
    /// `expression` marks the text as a value binding rather than a block of
    /// statements. Empty or blank text yields a callable that always returns
    /// `undefined`.
    pub fn compile_or_get(
        &self,
        text: &str,
        expression: bool,
        errors: Option<&ErrorSink>,
        logs: Option<&LogSink>,
    ) -> BindingFn {
        if text.trim().is_empty() {
            return BindingFn::noop();
        }
        let wrap = should_wrap_in_return(text, expression);
        let accumulators = Accumulators::new(errors, logs);
        if !self.strategy.caches_bindings() {
            return self.strategy.create_binding(text, wrap, accumulators);
        }
        self.cache.get_or_insert_with(cache_key(text, expression), || {
            self.strategy.create_binding(text, wrap, accumulators)
        })
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn reset_cache(&self) {
        self.cache.reset();
    }
}

fn build_strategy(
    host: HostEnvironment,
    config: &BindingConfig,
    registry: &Rc<BuiltInRegistry>,
    provider: Option<Rc<dyn SandboxProvider>>,
    capability: &JsValue,
) -> Box<dyn ExecutionStrategy> {
    let diagnostics = Diagnostics::new(host, config);
    match host {
        HostEnvironment::Client => Box::new(ClientStrategy::new(
            registry.clone(),
            diagnostics,
            config.max_call_depth,
        )),
        HostEnvironment::Server => {
            let provider = provider.unwrap_or_else(|| {
                Rc::new(InterpreterSandboxProvider::new(
                    registry.clone(),
                    config.max_call_depth,
                ))
            });
            Box::new(ServerStrategy::new(
                provider,
                diagnostics,
                config.timeout,
                capability.clone(),
            ))
        }
    }
}
