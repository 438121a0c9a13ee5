//! String built-in.
//!
//! Provides the String conversion function and the methods of string values.
//! Positions count characters; patterns are plain strings (there are no
//! regular expressions).

use std::convert::TryFrom;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::limits::{check_char_count, concat, invalid_string_length};
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::operations::type_conversion::{to_integer, to_property_key};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the String built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let string = BuiltInObject::new("String")
        .with_constructor(string_constructor)
        .add_prototype_method("toUpperCase", string_to_upper_case)
        .add_prototype_method("toLowerCase", string_to_lower_case)
        .add_prototype_method("trim", string_trim)
        .add_prototype_method("trimStart", string_trim_start)
        .add_prototype_method("trimEnd", string_trim_end)
        .add_prototype_method("includes", string_includes)
        .add_prototype_method("startsWith", string_starts_with)
        .add_prototype_method("endsWith", string_ends_with)
        .add_prototype_method("indexOf", string_index_of)
        .add_prototype_method("charAt", string_char_at)
        .add_prototype_method("slice", string_slice)
        .add_prototype_method("substring", string_substring)
        .add_prototype_method("split", string_split)
        .add_prototype_method("replace", string_replace)
        .add_prototype_method("replaceAll", string_replace_all)
        .add_prototype_method("repeat", string_repeat)
        .add_prototype_method("padStart", string_pad_start)
        .add_prototype_method("padEnd", string_pad_end)
        .add_prototype_method("concat", string_concat)
        .add_prototype_method("toString", string_to_string);

    registry.register_object(string);
}

fn chars_of(this: &JsValue) -> Vec<char> {
    this.to_string().chars().collect()
}

/// Clamps an index argument into `0..=len`, counting negative values from the end.
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

/// Clamps an index argument into `0..=len`, negative values becoming 0.
fn clamped_index(value: &JsValue, len: usize, default: usize) -> usize {
    if value.is_undefined() {
        return default;
    }
    to_integer(value).max(0).min(len as i64) as usize
}

/// String(value)
fn string_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(match args.first() {
        Some(v) => v.to_string(),
        None => String::new(),
    }))
}

/// String.prototype.toUpperCase
fn string_to_upper_case(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this.to_string().to_uppercase()))
}

/// String.prototype.toLowerCase
fn string_to_lower_case(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this.to_string().to_lowercase()))
}

/// String.prototype.trim
fn string_trim(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this.to_string().trim().to_string()))
}

/// String.prototype.trimStart
fn string_trim_start(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this.to_string().trim_start().to_string()))
}

/// String.prototype.trimEnd
fn string_trim_end(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this.to_string().trim_end().to_string()))
}

/// String.prototype.includes
fn string_includes(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let needle = arg(&args, 0).to_string();
    Ok(JsValue::Boolean(this.to_string().contains(&needle)))
}

/// String.prototype.startsWith
fn string_starts_with(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let needle = arg(&args, 0).to_string();
    Ok(JsValue::Boolean(this.to_string().starts_with(&needle)))
}

/// String.prototype.endsWith
fn string_ends_with(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let needle = arg(&args, 0).to_string();
    Ok(JsValue::Boolean(this.to_string().ends_with(&needle)))
}

/// String.prototype.indexOf - the character position of the first match, or -1.
fn string_index_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let haystack = this.to_string();
    let needle = arg(&args, 0).to_string();
    let index = haystack
        .find(&needle)
        .map(|byte_index| haystack[..byte_index].chars().count() as i64)
        .unwrap_or(-1);
    Ok(JsValue::new_integer(index))
}

/// String.prototype.charAt
fn string_char_at(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let index = to_integer(&arg(&args, 0));
    let c = if index < 0 {
        None
    } else {
        this.to_string().chars().nth(index as usize)
    };
    Ok(JsValue::String(c.map(String::from).unwrap_or_default()))
}

/// String.prototype.slice(start, end)
fn string_slice(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = chars_of(&this);
    let start = relative_index(&arg(&args, 0), chars.len(), 0);
    let end = relative_index(&arg(&args, 1), chars.len(), chars.len());
    Ok(JsValue::String(if start < end {
        chars[start..end].iter().collect()
    } else {
        String::new()
    }))
}

/// String.prototype.substring(start, end) - swaps the bounds when reversed.
fn string_substring(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = chars_of(&this);
    let a = clamped_index(&arg(&args, 0), chars.len(), 0);
    let b = clamped_index(&arg(&args, 1), chars.len(), chars.len());
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    Ok(JsValue::String(chars[start..end].iter().collect()))
}

/// String.prototype.split(separator, limit)
fn string_split(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s = this.to_string();
    let limit = match arg(&args, 1) {
        JsValue::Undefined => usize::MAX,
        l => to_integer(&l).max(0) as usize,
    };
    let parts: Vec<JsValue> = match arg(&args, 0) {
        JsValue::Undefined => vec![JsValue::String(s)],
        sep => {
            let sep = sep.to_string();
            if sep.is_empty() {
                s.chars().map(|c| JsValue::String(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(JsValue::from).collect()
            }
        }
    };
    Ok(ObjectType::new_array(parts.into_iter().take(limit).collect()))
}

/// Computes the replacement for one match: a function replacement is called
/// with `(match, position, string)`.
fn replacement_for(
    ctx: &mut EvalContext,
    replacement: &JsValue,
    matched: &str,
    position: usize,
    whole: &str,
) -> Result<String, JErrorType> {
    if replacement.is_callable() {
        let result = call_function(
            ctx,
            replacement,
            JsValue::Undefined,
            vec![
                JsValue::from(matched),
                JsValue::new_integer(position as i64),
                JsValue::from(whole),
            ],
        )?;
        Ok(result.to_string())
    } else {
        Ok(replacement.to_string())
    }
}

fn replace_matches(
    ctx: &mut EvalContext,
    this: &JsValue,
    args: &[JsValue],
    all: bool,
) -> Result<JsValue, JErrorType> {
    let s = this.to_string();
    let pattern = to_property_key(&arg(args, 0));
    let replacement = arg(args, 1);
    let mut out = String::new();
    let mut rest_start = 0;
    for (byte_index, matched) in s.match_indices(pattern.as_str()) {
        out.push_str(&s[rest_start..byte_index]);
        let position = s[..byte_index].chars().count();
        out.push_str(&replacement_for(ctx, &replacement, matched, position, &s)?);
        rest_start = byte_index + matched.len();
        if !all {
            break;
        }
    }
    out.push_str(&s[rest_start..]);
    Ok(JsValue::String(out))
}

/// String.prototype.replace - only the first occurrence.
fn string_replace(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    replace_matches(ctx, &this, &args, false)
}

/// String.prototype.replaceAll
fn string_replace_all(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    replace_matches(ctx, &this, &args, true)
}

/// String.prototype.repeat
fn string_repeat(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let count = to_integer(&arg(&args, 0));
    if count < 0 || count == i64::MAX {
        return Err(JErrorType::RangeError(format!("Invalid count value: {}", arg(&args, 0))));
    }
    let unit = this.to_string();
    let total = (unit.chars().count() as u64)
        .checked_mul(count as u64)
        .ok_or_else(invalid_string_length)?;
    check_char_count(usize::try_from(total).map_err(|_| invalid_string_length())?)?;
    if total == 0 {
        return Ok(JsValue::String(String::new()));
    }
    let mut out = String::new();
    for step in 0..count as usize {
        ctx.check_deadline_every(step)?;
        out.push_str(&unit);
    }
    Ok(JsValue::String(out))
}

/// The string and the padding that brings it to the requested length.
fn padding(ctx: &EvalContext, this: &JsValue, args: &[JsValue]) -> Result<(String, String), JErrorType> {
    let s = this.to_string();
    let target = to_integer(&arg(args, 0)).max(0) as usize;
    let filler = match arg(args, 1) {
        JsValue::Undefined => " ".to_string(),
        f => f.to_string(),
    };
    let len = s.chars().count();
    if target <= len || filler.is_empty() {
        return Ok((s, String::new()));
    }
    check_char_count(target)?;
    let mut pad = String::new();
    for (step, c) in filler.chars().cycle().take(target - len).enumerate() {
        ctx.check_deadline_every(step)?;
        pad.push(c);
    }
    Ok((s, pad))
}

/// String.prototype.padStart
fn string_pad_start(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (s, pad) = padding(ctx, &this, &args)?;
    Ok(JsValue::String(pad + &s))
}

/// String.prototype.padEnd
fn string_pad_end(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (s, pad) = padding(ctx, &this, &args)?;
    Ok(JsValue::String(s + &pad))
}

/// String.prototype.concat
fn string_concat(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut s = this.to_string();
    for a in &args {
        s = concat(&s, &a.to_string())?;
    }
    Ok(JsValue::String(s))
}

/// String.prototype.toString
fn string_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: crate::runner::plugin::types::NativeFn, this: &str, args: Vec<JsValue>) -> String {
        let mut ctx = EvalContext::new();
        f(&mut ctx, JsValue::from(this), args).unwrap().to_string()
    }

    #[test]
    fn slice_counts_from_the_end() {
        assert_eq!(call(string_slice, "builder", vec![JsValue::new_integer(-3)]), "der");
        assert_eq!(
            call(string_substring, "builder", vec![JsValue::new_integer(4), JsValue::new_integer(1)]),
            "uil"
        );
    }

    #[test]
    fn replace_first_and_all() {
        let args = || vec![JsValue::from("a"), JsValue::from("o")];
        assert_eq!(call(string_replace, "banana", args()), "bonana");
        assert_eq!(call(string_replace_all, "banana", args()), "bonono");
    }

    #[test]
    fn pad_start_cycles_the_filler() {
        assert_eq!(
            call(string_pad_start, "7", vec![JsValue::new_integer(3), JsValue::from("0")]),
            "007"
        );
    }

    #[test]
    fn repeat_rejects_oversized_results() {
        let mut ctx = EvalContext::new();
        let huge = JsValue::new_number(4611686018427387904.0);
        let err = string_repeat(&mut ctx, JsValue::from("ab"), vec![huge]).unwrap_err();
        assert_eq!(err.to_string(), "RangeError: Invalid string length");
        assert_eq!(call(string_repeat, "ab", vec![JsValue::new_integer(3)]), "ababab");
        assert_eq!(call(string_repeat, "", vec![JsValue::new_number(1e18)]), "");
    }

    #[test]
    fn padding_past_the_string_limit_is_a_range_error() {
        let mut ctx = EvalContext::new();
        let err = string_pad_end(&mut ctx, JsValue::from("x"), vec![JsValue::new_number(1e12)]).unwrap_err();
        assert_eq!(err.to_string(), "RangeError: Invalid string length");
    }

    #[test]
    fn padding_stops_at_the_deadline() {
        let mut ctx = EvalContext::new().with_timeout(std::time::Duration::from_millis(0));
        let err = string_pad_start(&mut ctx, JsValue::from("x"), vec![JsValue::new_integer(5000)]).unwrap_err();
        assert!(!err.is_catchable());
    }
}
