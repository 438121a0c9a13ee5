//! Size limits on strings and arrays.
//!
//! Both are stored contiguously, so every operation that can build one of
//! arbitrary size checks the result against these limits first. Going over a
//! limit is a catchable `RangeError`, never an allocation.

use crate::runner::ds::error::JErrorType;

/// The longest string the engine builds, in characters. Same as V8.
pub const MAX_STRING_LENGTH: usize = (1 << 29) - 24;

/// The largest array the engine allocates. JavaScript allows `2^32 - 1`
/// elements, but arrays here are dense.
pub const MAX_ARRAY_LENGTH: usize = 1 << 25;

pub fn invalid_string_length() -> JErrorType {
    JErrorType::RangeError("Invalid string length".to_string())
}

pub fn invalid_array_length() -> JErrorType {
    JErrorType::RangeError("Invalid array length".to_string())
}

/// Fails when a string of `chars` characters would be too long.
pub fn check_char_count(chars: usize) -> Result<(), JErrorType> {
    if chars > MAX_STRING_LENGTH {
        Err(invalid_string_length())
    } else {
        Ok(())
    }
}

/// Fails when `parts` together hold more than [`MAX_STRING_LENGTH`] characters.
/// Characters are only counted when the byte length is already over.
pub fn check_string_length(parts: &[&str]) -> Result<(), JErrorType> {
    let bytes: usize = parts.iter().map(|p| p.len()).sum();
    if bytes <= MAX_STRING_LENGTH {
        return Ok(());
    }
    check_char_count(parts.iter().map(|p| p.chars().count()).sum())
}

/// `a + b` for strings.
pub fn concat(a: &str, b: &str) -> Result<String, JErrorType> {
    check_string_length(&[a, b])?;
    let mut s = String::with_capacity(a.len() + b.len());
    s.push_str(a);
    s.push_str(b);
    Ok(s)
}

/// Converts a requested array length. Negative, fractional and non-finite
/// lengths, and lengths above `2^32 - 1` or [`MAX_ARRAY_LENGTH`], are rejected.
pub fn to_array_length(len: f64) -> Result<usize, JErrorType> {
    if !(0.0..=u32::MAX as f64).contains(&len) || len.fract() != 0.0 {
        return Err(invalid_array_length());
    }
    let len = len as usize;
    if len > MAX_ARRAY_LENGTH {
        return Err(invalid_array_length());
    }
    Ok(len)
}
