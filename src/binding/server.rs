//! Sandboxed evaluation for server hosts.
//!
//! Nothing is cached here: every call of a server binding builds a new
//! sandbox from the call's arguments and runs the text in it with a hard
//! wall-clock budget.

use std::rc::Rc;
use std::time::Duration;

use indexmap::IndexMap;
use tracing::debug;
use uuid::Uuid;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::evaluate_script;
use crate::runner::eval::expression::own_enumerable_entries;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInFn, EvalContext};

use super::classify::strip_leading_return;
use super::diagnostics::Diagnostics;
use super::error::BindingError;
use super::invocation::{Accumulators, BindingFn, CallArgs};
use super::ExecutionStrategy;

/// What a sandbox is created with.
#[derive(Debug, Clone)]
pub struct SandboxOptions {
    pub timeout: Duration,
    /// Global bindings of the sandbox, in insertion order.
    pub bindings: IndexMap<String, JsValue>,
}

/// An isolated, time-limited place to run source text.
pub trait Sandbox {
    /// Runs `source` as a script and yields its completion value. Running out
    /// of time is an error like any other.
    fn run(&mut self, source: &str) -> Result<JsValue, JErrorType>;
}

/// Creates sandboxes. Injected into the compiler so hosts and tests can
/// supply their own.
pub trait SandboxProvider {
    fn create(&self, options: SandboxOptions) -> Box<dyn Sandbox>;
}

/// Sandbox backed by the bundled interpreter. The sandbox bindings become
/// properties of a private global object; built-ins are materialized per run.
pub struct InterpreterSandbox {
    id: Uuid,
    options: SandboxOptions,
    registry: Rc<BuiltInRegistry>,
    max_call_depth: usize,
}

impl InterpreterSandbox {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Sandbox for InterpreterSandbox {
    fn run(&mut self, source: &str) -> Result<JsValue, JErrorType> {
        let global = ObjectType::new_ordinary_object();
        {
            let mut global = global.borrow_mut();
            for (name, value) in &self.options.bindings {
                global.set_property(name, value.clone());
            }
        }
        let mut ctx = EvalContext::new_with_global_object(self.registry.clone(), global)
            .with_max_call_depth(self.max_call_depth)
            .with_timeout(self.options.timeout);
        debug!(sandbox = %self.id, "running binding in sandbox");
        evaluate_script(source, &mut ctx)
    }
}

pub struct InterpreterSandboxProvider {
    registry: Rc<BuiltInRegistry>,
    max_call_depth: usize,
}

impl InterpreterSandboxProvider {
    pub fn new(registry: Rc<BuiltInRegistry>, max_call_depth: usize) -> Self {
        InterpreterSandboxProvider {
            registry,
            max_call_depth,
        }
    }
}

impl SandboxProvider for InterpreterSandboxProvider {
    fn create(&self, options: SandboxOptions) -> Box<dyn Sandbox> {
        let id = Uuid::new_v4();
        debug!(sandbox = %id, bindings = options.bindings.len(), "sandbox created");
        Box::new(InterpreterSandbox {
            id,
            options,
            registry: self.registry.clone(),
            max_call_depth: self.max_call_depth,
        })
    }
}

#[derive(Clone)]
pub struct ServerStrategy {
    provider: Rc<dyn SandboxProvider>,
    diagnostics: Diagnostics,
    timeout: Duration,
    capability: JsValue,
}

impl ServerStrategy {
    pub fn new(
        provider: Rc<dyn SandboxProvider>,
        diagnostics: Diagnostics,
        timeout: Duration,
        capability: JsValue,
    ) -> Self {
        ServerStrategy {
            provider,
            diagnostics,
            timeout,
            capability,
        }
    }

    /// The bindings a call runs with: the state's own properties, then
    /// `state`, `context`, the `builder` accessor and `event`.
    pub fn sandbox_bindings(&self, args: &CallArgs) -> IndexMap<String, JsValue> {
        let mut bindings: IndexMap<String, JsValue> =
            own_enumerable_entries(&args.state).into_iter().collect();
        bindings.insert("state".to_string(), args.state.clone());
        bindings.insert("context".to_string(), args.context.clone());
        bindings.insert("builder".to_string(), self.capability_accessor());
        bindings.insert("event".to_string(), args.event.clone());
        bindings
    }

    /// A function that yields the host's capability handle whatever it is given.
    fn capability_accessor(&self) -> JsValue {
        let capability = self.capability.clone();
        ObjectType::new_native_function(
            "builder",
            Rc::new(BuiltInFn::Plugin(Box::new(
                move |_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>| {
                    Ok(capability.clone())
                },
            ))),
        )
    }

    /// Evaluates `text` once. Failures are reported and yield `undefined`.
    pub fn evaluate(&self, text: &str, args: &CallArgs, accumulators: &Accumulators) -> JsValue {
        let bindings = self.sandbox_bindings(args);
        let mut sandbox = self.provider.create(SandboxOptions {
            timeout: self.timeout,
            bindings: bindings.clone(),
        });
        match sandbox.run(&strip_leading_return(text)) {
            Ok(value) => value,
            Err(e) => {
                let snapshot = bindings_snapshot(&bindings);
                self.diagnostics
                    .report(text, &e, &args.context, &args.block, Some(&snapshot));
                accumulators.record_error(BindingError::evaluation(text, e));
                JsValue::Undefined
            }
        }
    }
}

/// The bindings as one object value, for the failure report.
fn bindings_snapshot(bindings: &IndexMap<String, JsValue>) -> JsValue {
    let snapshot = ObjectType::new_ordinary_object();
    {
        let mut snapshot = snapshot.borrow_mut();
        for (name, value) in bindings {
            snapshot.set_property(name, value.clone());
        }
    }
    JsValue::Object(snapshot)
}

impl ExecutionStrategy for ServerStrategy {
    fn caches_bindings(&self) -> bool {
        false
    }

    /// `wrap` has no effect here; a leading `return` is stripped instead.
    fn create_binding(&self, text: &str, _wrap: bool, accumulators: Accumulators) -> BindingFn {
        let strategy = self.clone();
        let code = text.to_string();
        BindingFn::new(move |args| strategy.evaluate(&code, args, &accumulators))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::config::BindingConfig;
    use crate::binding::HostEnvironment;

    fn strategy() -> ServerStrategy {
        let registry = Rc::new(BuiltInRegistry::with_core());
        ServerStrategy::new(
            Rc::new(InterpreterSandboxProvider::new(registry, 64)),
            Diagnostics::new(HostEnvironment::Server, &BindingConfig::default()),
            Duration::from_millis(100),
            JsValue::from("capability"),
        )
    }

    #[test]
    fn bindings_follow_spread_order() {
        let state = JsValue::from_json(&serde_json::json!({"b": 1, "event": "old"}));
        let args = CallArgs::new(state).with_event(JsValue::from("click"));
        let bindings = strategy().sandbox_bindings(&args);
        let names: Vec<&str> = bindings.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["b", "event", "state", "context", "builder"]);
        assert_eq!(bindings["event"], JsValue::from("click"));
    }

    #[test]
    fn builder_accessor_ignores_its_argument() {
        let s = strategy();
        let args = CallArgs::new(JsValue::from_json(&serde_json::json!({})));
        let v = s.evaluate("builder(42)", &args, &Accumulators::default());
        assert_eq!(v, JsValue::from("capability"));
    }

    #[test]
    fn leading_return_is_stripped() {
        let s = strategy();
        let args = CallArgs::new(JsValue::from_json(&serde_json::json!({"a": 4})));
        assert_eq!(
            s.evaluate("return a * 2", &args, &Accumulators::default()),
            JsValue::new_integer(8)
        );
    }
}
