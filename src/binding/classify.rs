//! Text heuristics deciding how binding source is framed.
//!
//! These look at the raw text only. A `;` inside a string literal counts as a
//! statement separator, and existing content relies on exactly that.

/// Bindings starting with this are wrapped in `return (...)` whatever their shape.
pub const CAPABILITY_CALL_PREFIX: &str = "builder.run";

/// Should the text be run as `return (text);`?
pub fn should_wrap_in_return(text: &str, expression: bool) -> bool {
    let trimmed = text.trim();
    let has_control_flow =
        text.contains(';') || text.contains(" return ") || trimmed.starts_with("return ");
    (expression && !has_control_flow) || trimmed.starts_with(CAPABILITY_CALL_PREFIX)
}

/// Removes the first `return ` found at the very start of the text or right
/// after a `;`, keeping the `;`. Scripts evaluate to their last expression,
/// where a top-level `return` would be a syntax error.
pub fn strip_leading_return(text: &str) -> String {
    const RETURN: &str = "return ";
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(RETURN) {
        let at = search_from + offset;
        if at == 0 || text[..at].ends_with(';') {
            return format!("{}{}", &text[..at], &text[at + RETURN.len()..]);
        }
        search_from = at + RETURN.len();
    }
    text.to_string()
}
