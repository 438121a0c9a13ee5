//! Expression evaluation.
//!
//! This module provides the core expression evaluation logic for the interpreter.
//! It handles all expression types defined in the AST.

use std::rc::Rc;

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, ExpressionOrSpreadElement, ExpressionType, LiteralData,
    LiteralType, LogicalOperator, MemberExpressionData, MemberProperty, NumberLiteralType,
    PropertyData, PropertyKey, UnaryOperator, UpdateOperator,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::LexEnvironment;
use crate::runner::ds::limits;
use crate::runner::ds::object::{FunctionKind, ObjectType};
use crate::runner::ds::operations::test_and_comparison::{
    compare_values, loose_equality, strict_equality,
};
use crate::runner::ds::operations::type_conversion::{
    get_type, require_object_coercible, to_boolean, to_f64, to_int32, to_property_key, to_uint32,
    TYPE_STR_UNDEFINED,
};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::function::{call_function, construct, create_closure};
use super::statement::iterate_values;
use super::types::{Reference, ValueResult};

const ERROR_CONSTRUCTOR_NAMES: [&str; 4] = ["TypeError", "RangeError", "ReferenceError", "SyntaxError"];

/// Evaluate an expression and return its value.
pub fn evaluate_expression(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match expr {
        ExpressionType::Literal(lit) => Ok(evaluate_literal(lit)),

        ExpressionType::Identifier(id) => ctx.get_binding(&id.name),

        ExpressionType::ThisExpression { .. } => Ok(ctx.this_value.clone()),

        ExpressionType::ArrayExpression { elements, .. } => {
            Ok(ObjectType::new_array(evaluate_arguments(elements, ctx)?))
        }

        ExpressionType::ObjectExpression { properties, .. } => {
            evaluate_object_expression(properties, ctx)
        }

        ExpressionType::FunctionExpression(data) => {
            // A named function expression can refer to itself by name.
            match &data.id {
                Some(id) => {
                    let outer = ctx.lex_env.clone();
                    let scope = LexEnvironment::new_declarative(Some(outer.clone()));
                    ctx.lex_env = scope.clone();
                    let closure = create_closure(data, ctx);
                    ctx.lex_env = outer;
                    scope
                        .borrow_mut()
                        .inner
                        .as_env_record_mut()
                        .create_mutable_binding(id.name.to_string(), closure.clone())?;
                    Ok(closure)
                }
                None => Ok(create_closure(data, ctx)),
            }
        }

        ExpressionType::ArrowFunctionExpression(data) => Ok(create_closure(data, ctx)),

        ExpressionType::UnaryExpression {
            operator, argument, ..
        } => evaluate_unary_expression(*operator, argument, ctx),

        ExpressionType::UpdateExpression {
            operator,
            argument,
            prefix,
            ..
        } => {
            let reference = evaluate_reference(argument, ctx)?;
            let old = to_f64(&get_value(&reference, ctx)?);
            let new = match operator {
                UpdateOperator::PlusPlus => old + 1.0,
                UpdateOperator::MinusMinus => old - 1.0,
            };
            put_value(&reference, JsValue::new_number(new), ctx)?;
            Ok(JsValue::new_number(if *prefix { new } else { old }))
        }

        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
            ..
        } => {
            let l = evaluate_expression(left, ctx)?;
            let r = evaluate_expression(right, ctx)?;
            apply_binary_operator(*operator, &l, &r, ctx)
        }

        ExpressionType::LogicalExpression {
            operator,
            left,
            right,
            ..
        } => {
            let l = evaluate_expression(left, ctx)?;
            if short_circuits(*operator, &l) {
                Ok(l)
            } else {
                evaluate_expression(right, ctx)
            }
        }

        ExpressionType::AssignmentExpression {
            operator,
            left,
            right,
            ..
        } => evaluate_assignment_expression(*operator, left, right, ctx),

        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            if to_boolean(&evaluate_expression(test, ctx)?) {
                evaluate_expression(consequent, ctx)
            } else {
                evaluate_expression(alternate, ctx)
            }
        }

        ExpressionType::MemberExpression(_) | ExpressionType::CallExpression { .. } => {
            Ok(evaluate_chain_part(expr, ctx)?.unwrap_or(JsValue::Undefined))
        }

        ExpressionType::ChainExpression { expression, .. } => {
            Ok(evaluate_chain_part(expression, ctx)?.unwrap_or(JsValue::Undefined))
        }

        ExpressionType::NewExpression {
            callee, arguments, ..
        } => {
            let func = evaluate_expression(callee, ctx)?;
            let args = evaluate_arguments(arguments, ctx)?;
            if !func.is_callable() {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a constructor",
                    expression_to_string(callee)
                )));
            }
            construct(ctx, &func, args)
        }

        ExpressionType::SequenceExpression { expressions, .. } => {
            let mut value = JsValue::Undefined;
            for e in expressions {
                value = evaluate_expression(e, ctx)?;
            }
            Ok(value)
        }

        ExpressionType::TemplateLiteral(t) => {
            let mut s = String::new();
            for (i, quasi) in t.quasis.iter().enumerate() {
                s.push_str(quasi);
                if let Some(e) = t.expressions.get(i) {
                    let part = evaluate_expression(e, ctx)?.to_string();
                    limits::check_string_length(&[s.as_str(), part.as_str()])?;
                    s.push_str(&part);
                }
            }
            Ok(JsValue::String(s))
        }
    }
}

fn evaluate_literal(lit: &LiteralData) -> JsValue {
    match &lit.value {
        LiteralType::StringLiteral(s) => JsValue::String(s.to_string()),
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(i)) => JsValue::new_integer(*i),
        LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)) => JsValue::new_number(*f),
    }
}

fn evaluate_object_expression(properties: &[PropertyData], ctx: &mut EvalContext) -> ValueResult {
    let obj = ObjectType::new_ordinary_object();
    for p in properties {
        match p {
            PropertyData::Property { key, value } => {
                let key = match key {
                    PropertyKey::Named(n) => n.to_string(),
                    PropertyKey::Computed(e) => to_property_key(&evaluate_expression(e, ctx)?),
                };
                let value = evaluate_expression(value, ctx)?;
                obj.borrow_mut().set_property(&key, value);
            }
            PropertyData::Spread(e) => {
                let source = evaluate_expression(e, ctx)?;
                for (k, v) in own_enumerable_entries(&source) {
                    obj.borrow_mut().set_property(&k, v);
                }
            }
        }
    }
    Ok(JsValue::Object(obj))
}

/// Own enumerable `[key, value]` pairs of a value, as object spread and
/// `Object.entries` see them. Primitives other than strings have none.
pub fn own_enumerable_entries(v: &JsValue) -> Vec<(String, JsValue)> {
    match v {
        JsValue::Object(o) => o.borrow().own_entries(),
        JsValue::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), JsValue::String(c.to_string())))
            .collect(),
        _ => vec![],
    }
}

/// Evaluates call arguments or array elements, expanding spread elements.
fn evaluate_arguments(
    args: &[ExpressionOrSpreadElement],
    ctx: &mut EvalContext,
) -> Result<Vec<JsValue>, JErrorType> {
    let mut values = vec![];
    for arg in args {
        match arg {
            ExpressionOrSpreadElement::Expression(e) => values.push(evaluate_expression(e, ctx)?),
            ExpressionOrSpreadElement::SpreadElement(e) => {
                let v = evaluate_expression(e, ctx)?;
                values.extend(iterate_values(&v, e)?);
            }
        }
    }
    Ok(values)
}

fn evaluate_unary_expression(
    operator: UnaryOperator,
    argument: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    match operator {
        UnaryOperator::TypeOf => {
            if let ExpressionType::Identifier(id) = argument {
                if !ctx.has_binding(&id.name) {
                    return Ok(JsValue::String(TYPE_STR_UNDEFINED.to_string()));
                }
            }
            let v = evaluate_expression(argument, ctx)?;
            Ok(JsValue::String(get_type(&v).to_string()))
        }
        UnaryOperator::Delete => match argument {
            ExpressionType::MemberExpression(m) => {
                let base = evaluate_expression(&m.object, ctx)?;
                let key = evaluate_property_key(&m.property, ctx)?;
                Ok(JsValue::Boolean(match &base {
                    JsValue::Object(o) => o.borrow_mut().delete_property(&key),
                    _ => true,
                }))
            }
            ExpressionType::Identifier(_) => Ok(JsValue::Boolean(false)),
            _ => {
                evaluate_expression(argument, ctx)?;
                Ok(JsValue::Boolean(true))
            }
        },
        UnaryOperator::Void => {
            evaluate_expression(argument, ctx)?;
            Ok(JsValue::Undefined)
        }
        UnaryOperator::LogicalNot => Ok(JsValue::Boolean(!to_boolean(
            &evaluate_expression(argument, ctx)?,
        ))),
        UnaryOperator::Minus => Ok(JsValue::new_number(-to_f64(&evaluate_expression(
            argument, ctx,
        )?))),
        UnaryOperator::Plus => Ok(JsValue::new_number(to_f64(&evaluate_expression(
            argument, ctx,
        )?))),
        UnaryOperator::BitwiseNot => Ok(JsValue::new_integer(
            !to_int32(&evaluate_expression(argument, ctx)?) as i64,
        )),
    }
}

fn short_circuits(operator: LogicalOperator, left: &JsValue) -> bool {
    match operator {
        LogicalOperator::And => !to_boolean(left),
        LogicalOperator::Or => to_boolean(left),
        LogicalOperator::NullishCoalescing => !left.is_nullish(),
    }
}

fn to_primitive(v: &JsValue) -> JsValue {
    match v {
        JsValue::Object(_) => JsValue::String(v.to_string()),
        _ => v.clone(),
    }
}

pub fn apply_binary_operator(
    operator: BinaryOperator,
    l: &JsValue,
    r: &JsValue,
    ctx: &mut EvalContext,
) -> ValueResult {
    let num = |f: fn(f64, f64) -> f64| JsValue::new_number(f(to_f64(l), to_f64(r)));
    let int32 = |f: fn(i32, i32) -> i32| JsValue::new_integer(f(to_int32(l), to_int32(r)) as i64);
    let ordering = || compare_values(l, r);
    Ok(match operator {
        BinaryOperator::Add => {
            let (lp, rp) = (to_primitive(l), to_primitive(r));
            if matches!(lp, JsValue::String(_)) || matches!(rp, JsValue::String(_)) {
                JsValue::String(limits::concat(&lp.to_string(), &rp.to_string())?)
            } else {
                JsValue::new_number(to_f64(&lp) + to_f64(&rp))
            }
        }
        BinaryOperator::Subtract => num(|a, b| a - b),
        BinaryOperator::Multiply => num(|a, b| a * b),
        BinaryOperator::Divide => num(|a, b| a / b),
        BinaryOperator::Modulo => num(|a, b| a % b),
        BinaryOperator::Exponent => num(f64::powf),
        BinaryOperator::BitwiseAnd => int32(|a, b| a & b),
        BinaryOperator::BitwiseOr => int32(|a, b| a | b),
        BinaryOperator::BitwiseXor => int32(|a, b| a ^ b),
        BinaryOperator::BitwiseLeftShift => int32(|a, b| a.wrapping_shl(b as u32 & 31)),
        BinaryOperator::BitwiseRightShift => int32(|a, b| a.wrapping_shr(b as u32 & 31)),
        BinaryOperator::BitwiseUnsignedRightShift => {
            JsValue::new_integer((to_uint32(l) >> (to_uint32(r) & 31)) as i64)
        }
        BinaryOperator::StrictlyEqual => JsValue::Boolean(strict_equality(l, r)),
        BinaryOperator::StrictlyUnequal => JsValue::Boolean(!strict_equality(l, r)),
        BinaryOperator::LooselyEqual => JsValue::Boolean(loose_equality(l, r)),
        BinaryOperator::LooselyUnequal => JsValue::Boolean(!loose_equality(l, r)),
        BinaryOperator::LessThan => JsValue::Boolean(ordering().map_or(false, |o| o.is_lt())),
        BinaryOperator::LessThanEqual => JsValue::Boolean(ordering().map_or(false, |o| o.is_le())),
        BinaryOperator::GreaterThan => JsValue::Boolean(ordering().map_or(false, |o| o.is_gt())),
        BinaryOperator::GreaterThanEqual => {
            JsValue::Boolean(ordering().map_or(false, |o| o.is_ge()))
        }
        BinaryOperator::In => {
            let key = to_property_key(l);
            match r {
                JsValue::Object(o) => {
                    let own = o.borrow().has_own_property(&key);
                    JsValue::Boolean(own || has_prototype_property(ctx, r, &key))
                }
                _ => {
                    return Err(JErrorType::TypeError(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        key, r
                    )))
                }
            }
        }
        BinaryOperator::InstanceOf => JsValue::Boolean(instance_of(l, r)?),
    })
}

fn instance_of(l: &JsValue, r: &JsValue) -> Result<bool, JErrorType> {
    let constructor = match r {
        JsValue::Object(o) if o.borrow().is_callable() => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(
                "Right-hand side of 'instanceof' is not callable".to_string(),
            ))
        }
    };
    let obj = match l {
        JsValue::Object(o) => o.clone(),
        _ => return Ok(false),
    };
    let native_name = match &*constructor.borrow() {
        ObjectType::Function(f) => match f.kind {
            FunctionKind::Native(_) => Some(f.name.to_string()),
            FunctionKind::Script { .. } => None,
        },
        _ => None,
    };
    Ok(match native_name.as_deref() {
        Some("Object") => true,
        Some("Array") => l.is_array(),
        Some("Function") => l.is_callable(),
        Some("Error") => l.is_error_object(),
        Some(n) if ERROR_CONSTRUCTOR_NAMES.contains(&n) => {
            l.is_error_object()
                && l.get_own_property("name").map(|v| v.to_string() == n).unwrap_or(false)
        }
        Some(_) => false,
        None => obj
            .borrow()
            .get_constructor()
            .map(|c| Rc::ptr_eq(&c, &constructor))
            .unwrap_or(false),
    })
}

fn evaluate_assignment_expression(
    operator: AssignmentOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    let reference = evaluate_reference(left, ctx)?;
    let logical = match operator {
        AssignmentOperator::LogicalAndEquals => Some(LogicalOperator::And),
        AssignmentOperator::LogicalOrEquals => Some(LogicalOperator::Or),
        AssignmentOperator::NullishEquals => Some(LogicalOperator::NullishCoalescing),
        _ => None,
    };
    let value = if operator == AssignmentOperator::Equals {
        evaluate_expression(right, ctx)?
    } else if let Some(logical) = logical {
        let current = get_value(&reference, ctx)?;
        if short_circuits(logical, &current) {
            return Ok(current);
        }
        evaluate_expression(right, ctx)?
    } else {
        let current = get_value(&reference, ctx)?;
        let r = evaluate_expression(right, ctx)?;
        let binary = match operator {
            AssignmentOperator::AddEquals => BinaryOperator::Add,
            AssignmentOperator::SubtractEquals => BinaryOperator::Subtract,
            AssignmentOperator::MultiplyEquals => BinaryOperator::Multiply,
            AssignmentOperator::DivideEquals => BinaryOperator::Divide,
            AssignmentOperator::ModuloEquals => BinaryOperator::Modulo,
            AssignmentOperator::ExponentEquals => BinaryOperator::Exponent,
            AssignmentOperator::BitwiseLeftShiftEquals => BinaryOperator::BitwiseLeftShift,
            AssignmentOperator::BitwiseRightShiftEquals => BinaryOperator::BitwiseRightShift,
            AssignmentOperator::BitwiseUnsignedRightShiftEquals => {
                BinaryOperator::BitwiseUnsignedRightShift
            }
            AssignmentOperator::BitwiseOrEquals => BinaryOperator::BitwiseOr,
            AssignmentOperator::BitwiseAndEquals => BinaryOperator::BitwiseAnd,
            _ => BinaryOperator::BitwiseXor,
        };
        apply_binary_operator(binary, &current, &r, ctx)?
    };
    put_value(&reference, value.clone(), ctx)?;
    Ok(value)
}

fn evaluate_reference(expr: &ExpressionType, ctx: &mut EvalContext) -> Result<Reference, JErrorType> {
    match expr {
        ExpressionType::Identifier(id) => Ok(Reference::Binding(id.name.to_string())),
        ExpressionType::MemberExpression(m) => {
            let base = evaluate_expression(&m.object, ctx)?;
            let key = evaluate_property_key(&m.property, ctx)?;
            Ok(Reference::Property { base, key })
        }
        _ => Err(JErrorType::SyntaxError(
            "Invalid left-hand side in assignment".to_string(),
        )),
    }
}

fn get_value(reference: &Reference, ctx: &mut EvalContext) -> ValueResult {
    match reference {
        Reference::Binding(name) => ctx.get_binding(name),
        Reference::Property { base, key } => get_property(ctx, base, key),
    }
}

fn put_value(reference: &Reference, value: JsValue, ctx: &mut EvalContext) -> Result<(), JErrorType> {
    match reference {
        Reference::Binding(name) => ctx.set_binding(name, value),
        Reference::Property { base, key } => put_property(base, key, value),
    }
}

fn evaluate_property_key(property: &MemberProperty, ctx: &mut EvalContext) -> Result<String, JErrorType> {
    Ok(match property {
        MemberProperty::Identifier(id) => id.name.to_string(),
        MemberProperty::Computed(e) => to_property_key(&evaluate_expression(e, ctx)?),
    })
}

fn prototype_type_name(v: &JsValue) -> Option<&'static str> {
    match v {
        JsValue::String(_) => Some("String"),
        JsValue::Number(_) => Some("Number"),
        JsValue::Boolean(_) => Some("Boolean"),
        JsValue::Object(o) => Some(match &*o.borrow() {
            ObjectType::Array(_) => "Array",
            ObjectType::Function(_) => "Function",
            _ => "Object",
        }),
        _ => None,
    }
}

fn has_prototype_property(ctx: &mut EvalContext, v: &JsValue, key: &str) -> bool {
    match prototype_type_name(v) {
        Some(type_name) => {
            ctx.get_prototype_method(type_name, key).is_some()
                || ctx.get_prototype_method("Object", key).is_some()
        }
        None => false,
    }
}

/// `base[key]`, falling back to the built-in methods of the value's type.
pub fn get_property(ctx: &mut EvalContext, base: &JsValue, key: &str) -> ValueResult {
    require_object_coercible(base, key)?;
    let own = match base {
        JsValue::String(s) => {
            if key == "length" {
                Some(JsValue::new_integer(s.encode_utf16().count() as i64))
            } else {
                key.parse::<usize>()
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| JsValue::String(c.to_string()))
            }
        }
        JsValue::Object(o) => o.borrow().get_own_property(key),
        _ => None,
    };
    if let Some(v) = own {
        return Ok(v);
    }
    if let Some(type_name) = prototype_type_name(base) {
        if let Some(m) = ctx.get_prototype_method(type_name, key) {
            return Ok(m);
        }
        if base.is_object() && type_name != "Object" {
            if let Some(m) = ctx.get_prototype_method("Object", key) {
                return Ok(m);
            }
        }
    }
    Ok(JsValue::Undefined)
}

/// `base[key] = value`. Writes to primitives are ignored.
pub fn put_property(base: &JsValue, key: &str, value: JsValue) -> Result<(), JErrorType> {
    match base {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot set properties of {} (setting '{}')",
            base, key
        ))),
        JsValue::Object(o) => {
            let mut o = o.borrow_mut();
            o.check_array_write(key, &value)?;
            o.set_property(key, value);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Evaluates a member access, returning the base it was read from with the
/// value. `None` means an optional link met a nullish value.
fn evaluate_member(
    m: &MemberExpressionData,
    ctx: &mut EvalContext,
) -> Result<Option<(JsValue, JsValue)>, JErrorType> {
    let base = match evaluate_chain_part(&m.object, ctx)? {
        Some(b) => b,
        None => return Ok(None),
    };
    if m.optional && base.is_nullish() {
        return Ok(None);
    }
    let key = evaluate_property_key(&m.property, ctx)?;
    let value = get_property(ctx, &base, &key)?;
    Ok(Some((base, value)))
}

/// Evaluates one link of a member/call chain. `None` means the chain
/// short-circuited on an optional link.
fn evaluate_chain_part(
    expr: &ExpressionType,
    ctx: &mut EvalContext,
) -> Result<Option<JsValue>, JErrorType> {
    match expr {
        ExpressionType::MemberExpression(m) => Ok(evaluate_member(m, ctx)?.map(|(_, v)| v)),
        ExpressionType::CallExpression {
            callee,
            arguments,
            optional,
            ..
        } => {
            let (this_value, func) = match &**callee {
                ExpressionType::MemberExpression(m) => match evaluate_member(m, ctx)? {
                    Some(pair) => pair,
                    None => return Ok(None),
                },
                other => match evaluate_chain_part(other, ctx)? {
                    Some(f) => (JsValue::Undefined, f),
                    None => return Ok(None),
                },
            };
            if *optional && func.is_nullish() {
                return Ok(None);
            }
            let args = evaluate_arguments(arguments, ctx)?;
            if !func.is_callable() {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a function",
                    expression_to_string(callee)
                )));
            }
            call_function(ctx, &func, this_value, args).map(Some)
        }
        _ => evaluate_expression(expr, ctx).map(Some),
    }
}

/// Short source-like rendering of an expression for error messages.
pub fn expression_to_string(expr: &ExpressionType) -> String {
    match expr {
        ExpressionType::Identifier(id) => id.name.to_string(),
        ExpressionType::ThisExpression { .. } => "this".to_string(),
        ExpressionType::Literal(lit) => evaluate_literal(lit).to_display_string(),
        ExpressionType::MemberExpression(m) => {
            let object = expression_to_string(&m.object);
            let dot = if m.optional { "?." } else { "." };
            match &m.property {
                MemberProperty::Identifier(id) => format!("{}{}{}", object, dot, id.name),
                MemberProperty::Computed(e) => {
                    let prefix = if m.optional { "?." } else { "" };
                    format!("{}{}[{}]", object, prefix, expression_to_string(e))
                }
            }
        }
        ExpressionType::CallExpression { callee, .. } => {
            format!("{}(...)", expression_to_string(callee))
        }
        ExpressionType::ChainExpression { expression, .. } => expression_to_string(expression),
        _ => "expression".to_string(),
    }
}
