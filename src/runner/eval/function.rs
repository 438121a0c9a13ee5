//! Function call execution.
//!
//! Calls, construction and the instantiation of function bodies (parameter
//! binding and hoisting of `var` and function declarations).

use std::rc::Rc;

use crate::parser::ast::{FunctionBodyData, FunctionBodyOrExpression, FunctionData, PatternType};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::{EnvRef, LexEnvironment};
use crate::runner::ds::object::{FunctionKind, ObjectType};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::{BuiltInFn, EvalContext};

use super::expression::evaluate_expression;
use super::statement::execute_statements;
use super::types::{CompletionType, ValueResult};

enum Callee {
    Native(Rc<BuiltInFn>),
    Script {
        data: Rc<FunctionData>,
        scope: EnvRef,
        this_value: Option<JsValue>,
    },
}

fn get_callee(func: &JsValue) -> Option<Callee> {
    let obj = func.as_object()?;
    let obj = obj.borrow();
    match &*obj {
        ObjectType::Function(f) => Some(match &f.kind {
            FunctionKind::Native(n) => Callee::Native(n.clone()),
            FunctionKind::Script {
                data,
                scope,
                this_value,
            } => Callee::Script {
                data: data.clone(),
                scope: scope.clone(),
                this_value: this_value.clone(),
            },
        }),
        _ => None,
    }
}

/// Creates the function object for a function expression, declaration or arrow
/// function, closing over the current lexical environment.
pub fn create_closure(data: &Rc<FunctionData>, ctx: &EvalContext) -> JsValue {
    let this_value = if data.is_arrow {
        Some(ctx.this_value.clone())
    } else {
        None
    };
    ObjectType::new_script_function(data.clone(), ctx.lex_env.clone(), this_value)
}

/// Call a function value with the given `this` and arguments.
pub fn call_function(
    ctx: &mut EvalContext,
    func: &JsValue,
    this_value: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    let callee = get_callee(func).ok_or_else(|| {
        JErrorType::TypeError(format!("{} is not a function", func.to_display_string()))
    })?;
    ctx.enter_call()?;
    let result = match callee {
        Callee::Native(f) => f.call(ctx, this_value, args),
        Callee::Script {
            data,
            scope,
            this_value: captured_this,
        } => {
            let this_value = captured_this.unwrap_or(this_value);
            call_script_function(ctx, &data, scope, this_value, args)
        }
    };
    ctx.exit_call();
    result
}

/// `new func(...args)`.
pub fn construct(ctx: &mut EvalContext, func: &JsValue, args: Vec<JsValue>) -> ValueResult {
    match get_callee(func) {
        Some(Callee::Native(_)) => call_function(ctx, func, JsValue::Undefined, args),
        Some(Callee::Script { data, .. }) if !data.is_arrow => {
            let obj = ObjectType::new_ordinary();
            if let (JsValue::Object(o), JsValue::Object(f)) = (&obj, func) {
                o.borrow_mut().set_constructor(f.clone());
            }
            let result = call_function(ctx, func, obj.clone(), args)?;
            Ok(if result.is_object() { result } else { obj })
        }
        _ => Err(JErrorType::TypeError(format!(
            "{} is not a constructor",
            func.to_display_string()
        ))),
    }
}

fn call_script_function(
    ctx: &mut EvalContext,
    data: &FunctionData,
    scope: EnvRef,
    this_value: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    let func_env = LexEnvironment::new_declarative(Some(scope));
    let saved_lex_env = std::mem::replace(&mut ctx.lex_env, func_env.clone());
    let saved_var_env = std::mem::replace(&mut ctx.var_env, func_env.clone());
    let saved_this = std::mem::replace(&mut ctx.this_value, this_value);

    let result = (|| {
        if !data.is_arrow {
            func_env.borrow_mut().inner.as_env_record_mut().create_mutable_binding(
                "arguments".to_string(),
                ObjectType::new_array(args.clone()),
            )?;
        }
        bind_parameters(ctx, &func_env, &data.params, args)?;
        match &data.body {
            FunctionBodyOrExpression::FunctionBody(body) => {
                instantiate_function_body(body, ctx)?;
                let completion = execute_statements(&body.body, ctx)?;
                Ok(if completion.completion_type == CompletionType::Return {
                    completion.get_value()
                } else {
                    JsValue::Undefined
                })
            }
            FunctionBodyOrExpression::Expression(e) => evaluate_expression(e, ctx),
        }
    })();

    ctx.lex_env = saved_lex_env;
    ctx.var_env = saved_var_env;
    ctx.this_value = saved_this;
    result
}

fn bind_parameters(
    ctx: &mut EvalContext,
    env: &EnvRef,
    params: &[PatternType],
    args: Vec<JsValue>,
) -> Result<(), JErrorType> {
    let mut args = args.into_iter();
    for param in params {
        let (name, value) = match param {
            PatternType::Identifier(id) => (&id.name, args.next().unwrap_or(JsValue::Undefined)),
            PatternType::AssignmentPattern { left, right, .. } => {
                let value = match args.next() {
                    Some(v) if !v.is_undefined() => v,
                    _ => evaluate_expression(right, ctx)?,
                };
                (&left.name, value)
            }
            PatternType::RestElement { argument, .. } => {
                (&argument.name, ObjectType::new_array(args.by_ref().collect()))
            }
        };
        env.borrow_mut()
            .inner
            .as_env_record_mut()
            .create_mutable_binding(name.to_string(), value)?;
    }
    Ok(())
}

/// Creates the `var` bindings and function objects of a body in the current
/// variable environment before any of its statements run.
pub fn instantiate_function_body(
    body: &FunctionBodyData,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    let var_env = ctx.var_env.clone();
    for name in &body.hoisted_var_names {
        let exists = var_env.borrow().inner.as_env_record().has_binding(name);
        if !exists {
            var_env
                .borrow_mut()
                .inner
                .as_env_record_mut()
                .create_mutable_binding(name.to_string(), JsValue::Undefined)?;
        }
    }
    for f in &body.hoisted_functions {
        if let Some(id) = &f.id {
            let closure = create_closure(f, ctx);
            var_env
                .borrow_mut()
                .inner
                .as_env_record_mut()
                .create_mutable_binding(id.name.to_string(), closure)?;
        }
    }
    Ok(())
}
