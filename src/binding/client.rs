//! Direct compilation for client hosts.
//!
//! The text is parsed once into a function body and every call runs that body
//! in a fresh evaluation context whose scope chain is
//!
//! ```text
//! body scope → guarded state → parameters (+ `ctx`) → global object → built-ins
//! ```

use std::rc::Rc;

use tracing::warn;

use crate::parser::ast::ProgramData;
use crate::parser::parse_function_body;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::LexEnvironment;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::run_function_body;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::EvalContext;

use super::diagnostics::Diagnostics;
use super::error::BindingError;
use super::guard::guard_state;
use super::invocation::{Accumulators, BindingFn, CallArgs, CONTEXT_ALIAS};
use super::ExecutionStrategy;

/// A parsed binding, shared by every call of the compiled binding.
pub type CompiledBody = Rc<ProgramData>;

#[derive(Clone)]
pub struct ClientStrategy {
    registry: Rc<BuiltInRegistry>,
    diagnostics: Diagnostics,
    max_call_depth: usize,
}

impl ClientStrategy {
    pub fn new(registry: Rc<BuiltInRegistry>, diagnostics: Diagnostics, max_call_depth: usize) -> Self {
        ClientStrategy {
            registry,
            diagnostics,
            max_call_depth,
        }
    }

    /// Parses the binding as a function body, as `return (text);` when `wrap` is set.
    pub fn compile(&self, text: &str, wrap: bool) -> Result<CompiledBody, BindingError> {
        let source = if wrap {
            format!("return ({});", text)
        } else {
            text.to_string()
        };
        parse_function_body(&source)
            .map(Rc::new)
            .map_err(|e| BindingError::synthesis(text, &e))
    }

    /// Runs a compiled body once with the given arguments.
    pub fn invoke(&self, body: &ProgramData, args: &CallArgs) -> Result<JsValue, JErrorType> {
        let mut ctx = EvalContext::new_with_registry(self.registry.clone())
            .with_max_call_depth(self.max_call_depth);
        let params = LexEnvironment::new_declarative(Some(ctx.lex_env.clone()));
        {
            let mut params = params.borrow_mut();
            let record = params.inner.as_env_record_mut();
            for (name, value) in args.named().iter() {
                record.create_mutable_binding(name.to_string(), value.clone())?;
            }
            record.create_mutable_binding(CONTEXT_ALIAS.to_string(), args.context.clone())?;
        }
        ctx.lex_env = guard_state(&args.state, params);
        run_function_body(&body.body, &mut ctx)
    }
}

impl ExecutionStrategy for ClientStrategy {
    fn caches_bindings(&self) -> bool {
        true
    }

    fn create_binding(&self, text: &str, wrap: bool, accumulators: Accumulators) -> BindingFn {
        let body = match self.compile(text, wrap) {
            Ok(body) => body,
            Err(e) => {
                warn!(code = %text, error = %e.message(), "function compile error");
                accumulators.record_log(&e.message());
                accumulators.record_error(e);
                return BindingFn::noop();
            }
        };
        let strategy = self.clone();
        let code = text.to_string();
        BindingFn::new(move |args| match strategy.invoke(&body, args) {
            Ok(value) => value,
            Err(e) => {
                strategy
                    .diagnostics
                    .report(&code, &e, &args.context, &args.block, None);
                accumulators.record_error(BindingError::evaluation(&code, e));
                JsValue::Undefined
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::config::BindingConfig;
    use crate::binding::HostEnvironment;

    fn strategy() -> ClientStrategy {
        ClientStrategy::new(
            Rc::new(BuiltInRegistry::with_core()),
            Diagnostics::new(HostEnvironment::Client, &BindingConfig::default()),
            64,
        )
    }

    fn state() -> JsValue {
        JsValue::from_json(&serde_json::json!({"a": 2, "b": 3, "event": "shadowed"}))
    }

    #[test]
    fn wrapped_expression_returns_its_value() {
        let s = strategy();
        let body = s.compile("a * b", true).unwrap();
        let v = s.invoke(&body, &CallArgs::new(state())).unwrap();
        assert_eq!(v, JsValue::new_integer(6));
    }

    #[test]
    fn ctx_aliases_context() {
        let s = strategy();
        let body = s.compile("ctx === context", true).unwrap();
        let args = CallArgs::new(state()).with_context(JsValue::from_json(&serde_json::json!({})));
        assert_eq!(s.invoke(&body, &args).unwrap(), JsValue::Boolean(true));
    }

    #[test]
    fn malformed_text_is_a_synthesis_error() {
        let err = strategy().compile("a +", true).unwrap_err();
        assert!(matches!(err, BindingError::Synthesis { .. }));
        assert_eq!(err.source_text(), "a +");
    }

    #[test]
    fn declarations_do_not_leak_into_state() {
        let s = strategy();
        let state = state();
        let body = s.compile("var c = a + 1; return c", false).unwrap();
        assert_eq!(s.invoke(&body, &CallArgs::new(state.clone())).unwrap(), JsValue::new_integer(3));
        assert_eq!(state.get_own_property("c"), None);
    }
}
