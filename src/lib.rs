//! # bindfn - data-binding source text to callables
//!
//! Content trees carry small snippets of user-authored code: `state.price * 2`,
//! `state.open = !state.open`, `builder.run(...)`. This crate turns such a
//! snippet into a [`BindingFn`](binding::BindingFn) that can be called with the
//! state, event and context of a render.
//!
//! Two hosts are supported:
//!
//! - **Client**: the snippet is parsed once and memoized by text and mode.
//!   Every call runs in a fresh scope where the state's properties are visible
//!   as read-only variables and the binding's own parameters win over state
//!   properties of the same name.
//! - **Server**: every call runs the snippet in a new sandbox with a hard
//!   100 ms budget, the state spread into its globals.
//!
//! A failing snippet never takes the render down with it: errors are recorded
//! into caller-supplied sinks and the call yields `undefined`.
//!
//! ## Quick Start
//!
//! ```
//! use bindfn::binding::{BindingCompiler, CallArgs, HostEnvironment};
//! use bindfn::runner::ds::value::JsValue;
//!
//! let compiler = BindingCompiler::new(HostEnvironment::Client);
//! let label = compiler.compile_or_get("`${name} (${items.length})`", true, None, None);
//!
//! let state = JsValue::from_json(&serde_json::json!({"name": "Cart", "items": [1, 2]}));
//! assert_eq!(label.call(&CallArgs::new(state)), JsValue::new_string("Cart (2)"));
//! ```
//!
//! ## Running scripts directly
//!
//! The interpreter bindings run on is usable on its own:
//!
//! ```
//! use bindfn::runner::eval::evaluate_script;
//! use bindfn::runner::plugin::types::EvalContext;
//! use bindfn::runner::ds::value::JsValue;
//!
//! let mut ctx = EvalContext::new();
//! let v = evaluate_script("var xs = [1, 2, 3]; xs.map(x => x * x).join('-')", &mut ctx).unwrap();
//! assert_eq!(v, JsValue::new_string("1-4-9"));
//! ```
//!
//! ## Super-Global Scope
//!
//! Built-ins (`Math`, `JSON`, `console`, `Object`, `Array`, ...) are not
//! preloaded into the global scope. They live in a **super-global scope** that
//! sits behind the global one and resolves names lazily through plugin
//! resolvers (see [`runner::plugin`]). Evaluated code can shadow them but never
//! replace them.
//!
//! ## Architecture
//!
//! - **[`binding`]** - the compiler, its client and server strategies, the
//!   state guard and failure diagnostics
//! - **[`parser`]** - PEG parser and AST types
//! - **[`runner`]** - the tree-walking interpreter
//!   - **[`runner::plugin`]** - plugin system and super-global scope
//!   - **[`runner::ds`]** - data structures (values, objects, environments)
//!   - **[`runner::eval`]** - evaluation of statements and expressions
//!   - **[`runner::std_lib`]** - built-in objects

#[macro_use]
extern crate lazy_static;

pub mod binding;
pub mod parser;
pub mod runner;
