//! Array built-in.
//!
//! Provides the Array constructor, `Array.isArray`/`Array.from`/`Array.of`
//! and the array prototype methods. Callback-taking methods call back into
//! the evaluator, so a callback that throws aborts the whole method.

use std::cmp::Ordering;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::limits::{check_char_count, invalid_array_length, to_array_length};
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::operations::test_and_comparison::{same_value_zero, strict_equality};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_f64, to_integer};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Array built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let array = BuiltInObject::new("Array")
        .with_constructor(array_constructor)
        .add_method("isArray", array_is_array)
        .add_method("from", array_from)
        .add_method("of", array_of)
        .add_prototype_method("push", array_push)
        .add_prototype_method("pop", array_pop)
        .add_prototype_method("shift", array_shift)
        .add_prototype_method("slice", array_slice)
        .add_prototype_method("concat", array_concat)
        .add_prototype_method("join", array_join)
        .add_prototype_method("reverse", array_reverse)
        .add_prototype_method("sort", array_sort)
        .add_prototype_method("indexOf", array_index_of)
        .add_prototype_method("includes", array_includes)
        .add_prototype_method("forEach", array_for_each)
        .add_prototype_method("map", array_map)
        .add_prototype_method("filter", array_filter)
        .add_prototype_method("find", array_find)
        .add_prototype_method("findIndex", array_find_index)
        .add_prototype_method("some", array_some)
        .add_prototype_method("every", array_every)
        .add_prototype_method("reduce", array_reduce)
        .add_prototype_method("toString", array_to_string);

    registry.register_object(array);
}

/// A snapshot of the elements of `this`. Callbacks run against the snapshot,
/// so they may freely mutate the array.
fn elements_of(this: &JsValue) -> Vec<JsValue> {
    match this {
        JsValue::Object(o) => match &*o.borrow() {
            ObjectType::Array(a) => a.elements.clone(),
            _ => vec![],
        },
        _ => vec![],
    }
}

fn with_elements_mut<R>(this: &JsValue, f: impl FnOnce(&mut Vec<JsValue>) -> R) -> Option<R> {
    match this {
        JsValue::Object(o) => match &mut *o.borrow_mut() {
            ObjectType::Array(a) => Some(f(&mut a.elements)),
            _ => None,
        },
        _ => None,
    }
}

fn callback_arg(args: &[JsValue], method: &str) -> Result<JsValue, JErrorType> {
    let callback = arg(args, 0);
    if !callback.is_callable() {
        return Err(JErrorType::TypeError(format!(
            "{} is not a function (Array.prototype.{})",
            callback.to_display_string(),
            method
        )));
    }
    Ok(callback)
}

/// Calls `callback(element, index, array)` for every element of the
/// snapshot, stopping as soon as `visit` returns `Some`.
fn visit_elements<R>(
    ctx: &mut EvalContext,
    this: &JsValue,
    callback: &JsValue,
    mut visit: impl FnMut(usize, &JsValue, JsValue) -> Option<R>,
) -> Result<Option<R>, JErrorType> {
    for (i, item) in elements_of(this).into_iter().enumerate() {
        ctx.check_deadline_every(i)?;
        let result = call_function(
            ctx,
            callback,
            JsValue::Undefined,
            vec![item.clone(), JsValue::new_integer(i as i64), this.clone()],
        )?;
        if let Some(r) = visit(i, &item, result) {
            return Ok(Some(r));
        }
    }
    Ok(None)
}

/// Resolves a relative index argument (negative counts from the end) into `0..=len`.
fn relative_index(value: &JsValue, len: usize, default: usize) -> usize {
    if value.is_undefined() {
        return default;
    }
    let i = to_integer(value);
    if i < 0 {
        (len as i64 + i).max(0) as usize
    } else {
        (i as usize).min(len)
    }
}

/// Builds `len` elements from `element(i)`. Memory is reserved as the array
/// grows, and the deadline is checked on the way.
fn build_elements(
    ctx: &EvalContext,
    len: usize,
    mut element: impl FnMut(usize) -> JsValue,
) -> Result<Vec<JsValue>, JErrorType> {
    let mut elements = Vec::new();
    for i in 0..len {
        if elements.len() == elements.capacity() {
            let chunk = elements.len().max(1024).min(len - i);
            elements
                .try_reserve(chunk)
                .map_err(|_| invalid_array_length())?;
        }
        ctx.check_deadline_every(i)?;
        elements.push(element(i));
    }
    Ok(elements)
}

/// Array(...) / new Array(...)
fn array_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if let [JsValue::Number(n)] = args.as_slice() {
        let len = to_array_length(n.to_f64())?;
        return Ok(ObjectType::new_array(build_elements(ctx, len, |_| JsValue::Undefined)?));
    }
    Ok(ObjectType::new_array(args))
}

/// Array.isArray
fn array_is_array(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(arg(&args, 0).is_array()))
}

/// Array.from(arrayLike, mapFn)
fn array_from(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let source = arg(&args, 0);
    let mut items = vec![];
    match &source {
        JsValue::String(s) => {
            for (step, c) in s.chars().enumerate() {
                ctx.check_deadline_every(step)?;
                items.push(JsValue::String(c.to_string()));
            }
        }
        JsValue::Object(_) if source.is_array() => items = elements_of(&source),
        JsValue::Object(_) => {
            let len = match source.get_own_property("length") {
                Some(l) => to_array_length(to_integer(&l).max(0) as f64)?,
                None => 0,
            };
            items = build_elements(ctx, len, |i| {
                source
                    .get_own_property(&i.to_string())
                    .unwrap_or(JsValue::Undefined)
            })?;
        }
        _ => {}
    }
    let map_fn = arg(&args, 1);
    if map_fn.is_undefined() {
        return Ok(ObjectType::new_array(items));
    }
    let mut mapped = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        mapped.push(call_function(
            ctx,
            &map_fn,
            JsValue::Undefined,
            vec![item, JsValue::new_integer(i as i64)],
        )?);
    }
    Ok(ObjectType::new_array(mapped))
}

/// Array.of
fn array_of(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(ObjectType::new_array(args))
}

/// Array.prototype.push
fn array_push(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let len = with_elements_mut(&this, |elements| {
        elements.extend(args);
        elements.len()
    })
    .unwrap_or(0);
    Ok(JsValue::new_integer(len as i64))
}

/// Array.prototype.pop
fn array_pop(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(with_elements_mut(&this, |elements| elements.pop())
        .flatten()
        .unwrap_or(JsValue::Undefined))
}

/// Array.prototype.shift
fn array_shift(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(with_elements_mut(&this, |elements| {
        if elements.is_empty() {
            None
        } else {
            Some(elements.remove(0))
        }
    })
    .flatten()
    .unwrap_or(JsValue::Undefined))
}

/// Array.prototype.slice(start, end)
fn array_slice(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let elements = elements_of(&this);
    let start = relative_index(&arg(&args, 0), elements.len(), 0);
    let end = relative_index(&arg(&args, 1), elements.len(), elements.len());
    let slice = if start < end {
        elements[start..end].to_vec()
    } else {
        vec![]
    };
    Ok(ObjectType::new_array(slice))
}

/// Array.prototype.concat - array arguments are flattened one level.
fn array_concat(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut result = elements_of(&this);
    for a in args {
        if a.is_array() {
            result.extend(elements_of(&a));
        } else {
            result.push(a);
        }
    }
    Ok(ObjectType::new_array(result))
}

/// Array.prototype.join
fn array_join(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let separator = match arg(&args, 0) {
        JsValue::Undefined => ",".to_string(),
        s => s.to_string(),
    };
    let separator_chars = separator.chars().count();
    let mut out = String::new();
    let mut chars = 0;
    for (i, e) in elements_of(&this).iter().enumerate() {
        ctx.check_deadline_every(i)?;
        if i > 0 {
            chars += separator_chars;
            check_char_count(chars)?;
            out.push_str(&separator);
        }
        let part = match e {
            JsValue::Undefined | JsValue::Null => continue,
            _ => e.to_string(),
        };
        chars += part.chars().count();
        check_char_count(chars)?;
        out.push_str(&part);
    }
    Ok(JsValue::String(out))
}

/// Array.prototype.toString
fn array_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this.to_string()))
}

/// Array.prototype.reverse - in place.
fn array_reverse(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    with_elements_mut(&this, |elements| elements.reverse());
    Ok(this)
}

/// Array.prototype.sort(compareFn) - in place and stable. Without a
/// comparator elements compare as strings; `undefined` always sorts last.
fn array_sort(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let comparator = arg(&args, 0);
    let mut items = elements_of(&this);
    let mut failure = None;
    items.sort_by(|a, b| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        match (a.is_undefined(), b.is_undefined()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }
        if comparator.is_undefined() {
            return a.to_string().cmp(&b.to_string());
        }
        match call_function(ctx, &comparator, JsValue::Undefined, vec![a.clone(), b.clone()]) {
            Ok(v) => to_f64(&v).partial_cmp(&0.0).unwrap_or(Ordering::Equal),
            Err(e) => {
                failure = Some(e);
                Ordering::Equal
            }
        }
    });
    if let Some(e) = failure {
        return Err(e);
    }
    with_elements_mut(&this, |elements| *elements = items);
    Ok(this)
}

/// Array.prototype.indexOf
fn array_index_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let needle = arg(&args, 0);
    let index = elements_of(&this)
        .iter()
        .position(|e| strict_equality(e, &needle))
        .map(|i| i as i64)
        .unwrap_or(-1);
    Ok(JsValue::new_integer(index))
}

/// Array.prototype.includes - finds `NaN`, unlike indexOf.
fn array_includes(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let needle = arg(&args, 0);
    Ok(JsValue::Boolean(
        elements_of(&this).iter().any(|e| same_value_zero(e, &needle)),
    ))
}

/// Array.prototype.forEach
fn array_for_each(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let callback = callback_arg(&args, "forEach")?;
    visit_elements(ctx, &this, &callback, |_, _, _| None::<()>)?;
    Ok(JsValue::Undefined)
}

/// Array.prototype.map
fn array_map(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let callback = callback_arg(&args, "map")?;
    let mut mapped = vec![];
    visit_elements(ctx, &this, &callback, |_, _, result| {
        mapped.push(result);
        None::<()>
    })?;
    Ok(ObjectType::new_array(mapped))
}

/// Array.prototype.filter
fn array_filter(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let callback = callback_arg(&args, "filter")?;
    let mut kept = vec![];
    visit_elements(ctx, &this, &callback, |_, item, result| {
        if to_boolean(&result) {
            kept.push(item.clone());
        }
        None::<()>
    })?;
    Ok(ObjectType::new_array(kept))
}

/// Array.prototype.find
fn array_find(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let callback = callback_arg(&args, "find")?;
    let found = visit_elements(ctx, &this, &callback, |_, item, result| {
        if to_boolean(&result) {
            Some(item.clone())
        } else {
            None
        }
    })?;
    Ok(found.unwrap_or(JsValue::Undefined))
}

/// Array.prototype.findIndex
fn array_find_index(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let callback = callback_arg(&args, "findIndex")?;
    let found = visit_elements(ctx, &this, &callback, |i, _, result| {
        if to_boolean(&result) {
            Some(i as i64)
        } else {
            None
        }
    })?;
    Ok(JsValue::new_integer(found.unwrap_or(-1)))
}

/// Array.prototype.some
fn array_some(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let callback = callback_arg(&args, "some")?;
    let found = visit_elements(ctx, &this, &callback, |_, _, result| {
        if to_boolean(&result) {
            Some(())
        } else {
            None
        }
    })?;
    Ok(JsValue::Boolean(found.is_some()))
}

/// Array.prototype.every
fn array_every(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let callback = callback_arg(&args, "every")?;
    let failed = visit_elements(ctx, &this, &callback, |_, _, result| {
        if to_boolean(&result) {
            None
        } else {
            Some(())
        }
    })?;
    Ok(JsValue::Boolean(failed.is_none()))
}

/// Array.prototype.reduce(callback, initialValue)
fn array_reduce(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let callback = callback_arg(&args, "reduce")?;
    let mut items = elements_of(&this).into_iter().enumerate();
    let mut accumulator = if args.len() >= 2 {
        args[1].clone()
    } else {
        match items.next() {
            Some((_, first)) => first,
            None => {
                return Err(JErrorType::TypeError(
                    "Reduce of empty array with no initial value".to_string(),
                ))
            }
        }
    };
    for (i, item) in items {
        ctx.check_deadline_every(i)?;
        accumulator = call_function(
            ctx,
            &callback,
            JsValue::Undefined,
            vec![accumulator, item, JsValue::new_integer(i as i64), this.clone()],
        )?;
    }
    Ok(accumulator)
}
