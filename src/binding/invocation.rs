use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::runner::ds::value::JsValue;

use super::error::BindingError;

/// Caller-owned accumulator of binding failures.
pub type ErrorSink = Rc<RefCell<Vec<BindingError>>>;

/// Caller-owned accumulator of de-duplicated compile error messages.
pub type LogSink = Rc<RefCell<Vec<String>>>;

/// Parameter names of a compiled binding, in positional order.
pub const PARAMETER_NAMES: [&str; 8] = [
    "state", "event", "block", "builder", "Device", "update", "Builder", "context",
];

/// Extra name bound to the `context` argument.
pub const CONTEXT_ALIAS: &str = "ctx";

/// The eight positional arguments of a compiled binding.
#[derive(Debug, Clone)]
pub struct CallArgs {
    pub state: JsValue,
    pub event: JsValue,
    pub block: JsValue,
    /// Capability handle of the host.
    pub builder: JsValue,
    pub device: JsValue,
    pub update: JsValue,
    /// Host capability type.
    pub builder_type: JsValue,
    pub context: JsValue,
}

impl CallArgs {
    pub fn new(state: JsValue) -> Self {
        CallArgs {
            state,
            event: JsValue::Undefined,
            block: JsValue::Undefined,
            builder: JsValue::Undefined,
            device: JsValue::Undefined,
            update: JsValue::Undefined,
            builder_type: JsValue::Undefined,
            context: JsValue::Undefined,
        }
    }

    /// Takes arguments in [`PARAMETER_NAMES`] order; missing ones are `undefined`
    /// and extra ones are ignored.
    pub fn from_positional(args: Vec<JsValue>) -> Self {
        let mut args = args.into_iter();
        let mut next = || args.next().unwrap_or(JsValue::Undefined);
        CallArgs {
            state: next(),
            event: next(),
            block: next(),
            builder: next(),
            device: next(),
            update: next(),
            builder_type: next(),
            context: next(),
        }
    }

    pub fn with_event(mut self, event: JsValue) -> Self {
        self.event = event;
        self
    }

    pub fn with_block(mut self, block: JsValue) -> Self {
        self.block = block;
        self
    }

    pub fn with_context(mut self, context: JsValue) -> Self {
        self.context = context;
        self
    }

    /// `(name, value)` for every parameter, in positional order.
    pub fn named(&self) -> [(&'static str, JsValue); 8] {
        [
            (PARAMETER_NAMES[0], self.state.clone()),
            (PARAMETER_NAMES[1], self.event.clone()),
            (PARAMETER_NAMES[2], self.block.clone()),
            (PARAMETER_NAMES[3], self.builder.clone()),
            (PARAMETER_NAMES[4], self.device.clone()),
            (PARAMETER_NAMES[5], self.update.clone()),
            (PARAMETER_NAMES[6], self.builder_type.clone()),
            (PARAMETER_NAMES[7], self.context.clone()),
        ]
    }
}

/// A compiled binding. Cloning is cheap and clones compare equal under
/// [`BindingFn::ptr_eq`]. Calling it never fails: failures are reported and
/// yield `undefined`.
#[derive(Clone)]
pub struct BindingFn(Rc<dyn Fn(&CallArgs) -> JsValue>);

impl BindingFn {
    pub fn new(f: impl Fn(&CallArgs) -> JsValue + 'static) -> Self {
        BindingFn(Rc::new(f))
    }

    /// A binding that does nothing and yields `undefined`.
    pub fn noop() -> Self {
        Self::new(|_| JsValue::Undefined)
    }

    pub fn constant(value: JsValue) -> Self {
        Self::new(move |_| value.clone())
    }

    pub fn call(&self, args: &CallArgs) -> JsValue {
        (self.0)(args)
    }

    pub fn call_positional(&self, args: Vec<JsValue>) -> JsValue {
        self.call(&CallArgs::from_positional(args))
    }

    /// Are both handles the same compiled binding?
    pub fn ptr_eq(&self, other: &BindingFn) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for BindingFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingFn({:p})", Rc::as_ptr(&self.0))
    }
}

/// The accumulators given with one compile request.
#[derive(Clone, Default)]
pub struct Accumulators {
    pub errors: Option<ErrorSink>,
    pub logs: Option<LogSink>,
}

impl Accumulators {
    pub fn new(errors: Option<&ErrorSink>, logs: Option<&LogSink>) -> Self {
        Accumulators {
            errors: errors.cloned(),
            logs: logs.cloned(),
        }
    }

    pub fn record_error(&self, error: BindingError) {
        if let Some(errors) = &self.errors {
            errors.borrow_mut().push(error);
        }
    }

    /// Appends `message` unless it is empty or already present.
    pub fn record_log(&self, message: &str) {
        if let Some(logs) = &self.logs {
            let mut logs = logs.borrow_mut();
            if !message.is_empty() && !logs.iter().any(|m| m == message) {
                logs.push(message.to_string());
            }
        }
    }
}
