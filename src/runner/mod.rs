//! The JavaScript-subset interpreter bindings are evaluated with.
//!
//! - [`ds`]: values, objects and environment records
//! - [`eval`]: the tree-walking evaluator
//! - [`plugin`]: the super-global scope and its resolvers
//! - [`std_lib`]: the built-in objects and functions

pub mod ds;
pub mod eval;
pub mod plugin;
pub mod std_lib;
