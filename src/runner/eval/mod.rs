//! Evaluation module for executing JavaScript AST.
//!
//! This module contains the core evaluation logic for the JavaScript interpreter.
//! [`run_script`] and [`run_function_body`] are the entry points; everything
//! else is reachable from them.

pub mod types;
pub mod expression;
pub mod statement;
pub mod function;

pub use types::{Completion, CompletionType, Reference};

use crate::parser::ast::{FunctionBodyData, ProgramData};
use crate::parser::parse_script;
use crate::runner::ds::lex_env::LexEnvironment;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use self::function::instantiate_function_body;
use self::statement::execute_statements;
use self::types::ValueResult;

/// Runs a parsed script in the global scope of `ctx` and returns its
/// completion value, i.e. the value of the last expression statement executed.
///
/// `var` and function declarations land in the current variable environment
/// (the global object for a fresh context); `let` and `const` live in a script
/// scope that is discarded afterwards.
pub fn run_script(program: &ProgramData, ctx: &mut EvalContext) -> ValueResult {
    let script_scope = LexEnvironment::new_declarative(Some(ctx.lex_env.clone()));
    let saved_lex_env = std::mem::replace(&mut ctx.lex_env, script_scope);
    let result = instantiate_function_body(&program.body, ctx)
        .and_then(|_| execute_statements(&program.body.body, ctx));
    ctx.lex_env = saved_lex_env;
    Ok(result?.get_value())
}

/// Parses and runs `source` as a script.
pub fn evaluate_script(source: &str, ctx: &mut EvalContext) -> ValueResult {
    let program = parse_script(source)?;
    run_script(&program, ctx)
}

/// Runs a function body in a fresh scope on top of the current environment of
/// `ctx`, the way a call would after its parameters were bound. Yields the
/// returned value, or `undefined` when the body completes without `return`.
pub fn run_function_body(body: &FunctionBodyData, ctx: &mut EvalContext) -> ValueResult {
    let body_scope = LexEnvironment::new_declarative(Some(ctx.lex_env.clone()));
    let saved_lex_env = std::mem::replace(&mut ctx.lex_env, body_scope.clone());
    let saved_var_env = std::mem::replace(&mut ctx.var_env, body_scope);
    let result = instantiate_function_body(body, ctx).and_then(|_| execute_statements(&body.body, ctx));
    ctx.lex_env = saved_lex_env;
    ctx.var_env = saved_var_env;
    let completion = result?;
    Ok(if completion.completion_type == CompletionType::Return {
        completion.get_value()
    } else {
        JsValue::Undefined
    })
}
