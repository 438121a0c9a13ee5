mod api;
pub mod ast;
mod static_semantics;
#[cfg(test)]
mod unit_tests;

pub use api::{parse_function_body, parse_script, JsParser};
