//! Statement execution.
//!
//! This module provides statement execution logic for the interpreter.

use crate::parser::ast::{
    BlockStatementData, CatchClauseData, ExpressionType, ForIteratorBinding, StatementType,
    VariableDeclarationData, VariableDeclarationKind, VariableDeclarationOrExpression,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::{EnvRef, LexEnvironment};
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::expression::evaluate_expression;
use super::types::{Completion, CompletionType, EvalResult};

/// Execute a list of statements, stopping at the first abrupt completion.
/// The completion value is that of the last statement that produced one.
pub fn execute_statements(stmts: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let mut completion = Completion::normal();
    for stmt in stmts {
        let last_value = completion.value.take();
        completion = execute_statement(stmt, ctx)?.update_empty(last_value);
        if completion.is_abrupt() {
            break;
        }
    }
    Ok(completion)
}

/// Execute a statement and return its completion.
pub fn execute_statement(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    match stmt {
        StatementType::EmptyStatement { .. } | StatementType::FunctionDeclaration(_) => {
            Ok(Completion::normal())
        }

        StatementType::ExpressionStatement { expression, .. } => {
            let value = evaluate_expression(expression, ctx)?;
            Ok(Completion::normal_with_value(value))
        }

        StatementType::BlockStatement(block) => execute_block_statement(block, ctx),

        StatementType::VariableDeclaration(decl) => {
            execute_variable_declaration(decl, ctx)?;
            Ok(Completion::normal())
        }

        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            let test_value = evaluate_expression(test, ctx)?;
            let completion = if to_boolean(&test_value) {
                execute_statement(consequent, ctx)?
            } else if let Some(alt) = alternate {
                execute_statement(alt, ctx)?
            } else {
                Completion::normal()
            };
            Ok(completion.update_empty(Some(JsValue::Undefined)))
        }

        StatementType::WhileStatement { test, body, .. } => {
            let mut value = None;
            loop {
                ctx.check_deadline()?;
                if !to_boolean(&evaluate_expression(test, ctx)?) {
                    break;
                }
                if let LoopStep::Exit(c) = run_loop_body(body, ctx, &mut value)? {
                    return Ok(c);
                }
            }
            Ok(loop_completion(value))
        }

        StatementType::DoWhileStatement { body, test, .. } => {
            let mut value = None;
            loop {
                ctx.check_deadline()?;
                if let LoopStep::Exit(c) = run_loop_body(body, ctx, &mut value)? {
                    return Ok(c);
                }
                if !to_boolean(&evaluate_expression(test, ctx)?) {
                    break;
                }
            }
            Ok(loop_completion(value))
        }

        StatementType::ForStatement {
            init,
            test,
            update,
            body,
            ..
        } => execute_for_statement(init.as_ref(), test.as_ref(), update.as_ref(), body, ctx),

        StatementType::ForInStatement {
            left, right, body, ..
        } => {
            let object = evaluate_expression(right, ctx)?;
            let keys: Vec<JsValue> = match &object {
                JsValue::Object(o) => o.borrow().own_keys().into_iter().map(JsValue::String).collect(),
                JsValue::String(s) => (0..s.chars().count())
                    .map(|i| JsValue::String(i.to_string()))
                    .collect(),
                _ => vec![],
            };
            execute_for_each(left, keys.into_iter(), body, ctx)
        }

        StatementType::ForOfStatement {
            left, right, body, ..
        } => {
            let iterable = evaluate_expression(right, ctx)?;
            let items = iterate_values(&iterable, right)?;
            execute_for_each(left, items.into_iter(), body, ctx)
        }

        StatementType::BreakStatement { .. } => Ok(Completion::break_completion()),

        StatementType::ContinueStatement { .. } => Ok(Completion::continue_completion()),

        StatementType::ReturnStatement { argument, .. } => {
            let value = if let Some(arg) = argument {
                evaluate_expression(arg, ctx)?
            } else {
                JsValue::Undefined
            };
            Ok(Completion::return_value(value))
        }

        StatementType::ThrowStatement { argument, .. } => {
            let value = evaluate_expression(argument, ctx)?;
            Err(JErrorType::Thrown(value))
        }

        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => execute_try_statement(block, handler.as_ref(), finalizer.as_ref(), ctx),
    }
}

/// Values a `for..of` loop or a spread visits.
pub fn iterate_values(iterable: &JsValue, source: &ExpressionType) -> Result<Vec<JsValue>, JErrorType> {
    match iterable {
        JsValue::String(s) => Ok(s.chars().map(|c| JsValue::String(c.to_string())).collect()),
        JsValue::Object(o) => match &*o.borrow() {
            ObjectType::Array(a) => Ok(a.elements.clone()),
            _ => Err(not_iterable(source)),
        },
        _ => Err(not_iterable(source)),
    }
}

fn not_iterable(source: &ExpressionType) -> JErrorType {
    JErrorType::TypeError(format!(
        "{} is not iterable",
        super::expression::expression_to_string(source)
    ))
}

enum LoopStep {
    Next,
    Exit(Completion),
}

/// Runs one iteration of a loop body. Tracks the loop's completion value and
/// tells the caller whether to leave the loop, and with which completion.
fn run_loop_body(
    body: &StatementType,
    ctx: &mut EvalContext,
    value: &mut Option<JsValue>,
) -> Result<LoopStep, JErrorType> {
    let completion = execute_statement(body, ctx)?;
    if completion.value.is_some() {
        *value = completion.value.clone();
    }
    Ok(match completion.completion_type {
        CompletionType::Break => LoopStep::Exit(loop_completion(value.take())),
        CompletionType::Return => LoopStep::Exit(completion),
        CompletionType::Normal | CompletionType::Continue => LoopStep::Next,
    })
}

fn loop_completion(value: Option<JsValue>) -> Completion {
    Completion {
        completion_type: CompletionType::Normal,
        value: Some(value.unwrap_or(JsValue::Undefined)),
    }
}

/// Runs `f` with a fresh declarative environment on top of the current one,
/// restoring the previous environment afterwards even when `f` fails.
fn with_new_scope<T>(
    ctx: &mut EvalContext,
    outer: EnvRef,
    f: impl FnOnce(&mut EvalContext) -> Result<T, JErrorType>,
) -> Result<T, JErrorType> {
    let saved = std::mem::replace(&mut ctx.lex_env, LexEnvironment::new_declarative(Some(outer)));
    let result = f(ctx);
    ctx.lex_env = saved;
    result
}

/// Execute a block statement.
fn execute_block_statement(block: &BlockStatementData, ctx: &mut EvalContext) -> EvalResult {
    // let/const bindings of the block live in their own scope
    let outer = ctx.lex_env.clone();
    with_new_scope(ctx, outer, |ctx| execute_statements(&block.body, ctx))
}

fn declare_in_current_scope(
    ctx: &mut EvalContext,
    kind: VariableDeclarationKind,
    name: &str,
    value: JsValue,
) -> Result<(), JErrorType> {
    let env = ctx.lex_env.clone();
    let mut env = env.borrow_mut();
    let record = env.inner.as_env_record_mut();
    if kind == VariableDeclarationKind::Const {
        record.create_immutable_binding(name.to_string(), value)
    } else {
        record.create_mutable_binding(name.to_string(), value)
    }
}

fn execute_variable_declaration(
    decl: &VariableDeclarationData,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    for declarator in &decl.declarations {
        let name = &declarator.id.name;
        match decl.kind {
            VariableDeclarationKind::Var => {
                // The binding itself was created when the body was instantiated.
                if let Some(init) = &declarator.init {
                    let value = evaluate_expression(init, ctx)?;
                    ctx.set_binding(name, value)?;
                }
            }
            kind => {
                let value = match &declarator.init {
                    Some(init) => evaluate_expression(init, ctx)?,
                    None => JsValue::Undefined,
                };
                declare_in_current_scope(ctx, kind, name, value)?;
            }
        }
    }
    Ok(())
}

fn execute_for_statement(
    init: Option<&VariableDeclarationOrExpression>,
    test: Option<&ExpressionType>,
    update: Option<&ExpressionType>,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let outer = ctx.lex_env.clone();
    with_new_scope(ctx, outer.clone(), |ctx| {
        // Names declared with let/const get a fresh copy per iteration so that
        // closures created in the body see the value of their own iteration.
        let mut per_iteration = vec![];
        match init {
            Some(VariableDeclarationOrExpression::VariableDeclaration(decl)) => {
                execute_variable_declaration(decl, ctx)?;
                if decl.kind == VariableDeclarationKind::Let {
                    per_iteration = decl.declarations.iter().map(|d| d.id.name.to_string()).collect();
                }
            }
            Some(VariableDeclarationOrExpression::Expression(e)) => {
                evaluate_expression(e, ctx)?;
            }
            None => {}
        }
        let mut value = None;
        loop {
            ctx.check_deadline()?;
            if !per_iteration.is_empty() {
                copy_iteration_bindings(ctx, &outer, &per_iteration)?;
            }
            if let Some(test) = test {
                if !to_boolean(&evaluate_expression(test, ctx)?) {
                    break;
                }
            }
            if let LoopStep::Exit(c) = run_loop_body(body, ctx, &mut value)? {
                return Ok(c);
            }
            if let Some(update) = update {
                evaluate_expression(update, ctx)?;
            }
        }
        Ok(loop_completion(value))
    })
}

fn copy_iteration_bindings(
    ctx: &mut EvalContext,
    outer: &EnvRef,
    names: &[String],
) -> Result<(), JErrorType> {
    let next = LexEnvironment::new_declarative(Some(outer.clone()));
    {
        let current = ctx.lex_env.borrow();
        let mut next_env = next.borrow_mut();
        for name in names {
            let value = current.inner.as_env_record().get_binding_value(name)?;
            next_env
                .inner
                .as_env_record_mut()
                .create_mutable_binding(name.to_string(), value)?;
        }
    }
    ctx.lex_env = next;
    Ok(())
}

fn execute_for_each(
    left: &ForIteratorBinding,
    items: impl Iterator<Item = JsValue>,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut value = None;
    for item in items {
        ctx.check_deadline()?;
        let outer = ctx.lex_env.clone();
        let step = with_new_scope(ctx, outer, |ctx| {
            match left.kind {
                Some(kind @ VariableDeclarationKind::Let) | Some(kind @ VariableDeclarationKind::Const) => {
                    declare_in_current_scope(ctx, kind, &left.id.name, item)?
                }
                _ => ctx.set_binding(&left.id.name, item)?,
            }
            run_loop_body(body, ctx, &mut value)
        })?;
        if let LoopStep::Exit(c) = step {
            return Ok(c);
        }
    }
    Ok(loop_completion(value))
}

fn execute_try_statement(
    block: &BlockStatementData,
    handler: Option<&CatchClauseData>,
    finalizer: Option<&BlockStatementData>,
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut result = execute_block_statement(block, ctx);
    // A timeout is never handed to catch or finally blocks.
    if matches!(&result, Err(e) if !e.is_catchable()) {
        return result;
    }
    if let Some(handler) = handler {
        let thrown = match &result {
            Err(e) => Some(e.to_js_value()),
            Ok(_) => None,
        };
        if let Some(thrown) = thrown {
            let outer = ctx.lex_env.clone();
            result = with_new_scope(ctx, outer, |ctx| {
                if let Some(param) = &handler.param {
                    declare_in_current_scope(ctx, VariableDeclarationKind::Let, &param.name, thrown)?;
                }
                execute_block_statement(&handler.body, ctx)
            });
        }
    }
    if let Some(finalizer) = finalizer {
        if matches!(&result, Err(e) if !e.is_catchable()) {
            return result;
        }
        let completion = execute_block_statement(finalizer, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
    }
    result.map(|c| c.update_empty(Some(JsValue::Undefined)))
}
