use std::env;
use std::time::Duration;

use crate::runner::plugin::types::DEFAULT_MAX_CALL_DEPTH;

/// Wall-clock budget of one sandboxed evaluation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

pub const DEFAULT_EDITOR_URL: &str = "https://www.builder.io/content";

/// Environment variable that turns on detailed failure reports.
pub const DEBUG_ENV_VAR: &str = "DEBUG";

/// Settings of a [`BindingCompiler`](super::BindingCompiler).
#[derive(Debug, Clone, PartialEq)]
pub struct BindingConfig {
    /// Adds block, content, sandbox and trace details to failure reports.
    pub debug: bool,
    /// Budget of a server-side evaluation.
    pub timeout: Duration,
    /// Base of the deep link that failure reports point operators to.
    pub editor_url: String,
    pub max_call_depth: usize,
}

impl BindingConfig {
    /// Defaults, with `debug` taken from the `DEBUG` environment variable.
    pub fn from_env() -> Self {
        BindingConfig {
            debug: env::var(DEBUG_ENV_VAR)
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            ..Self::default()
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_editor_url(mut self, editor_url: impl Into<String>) -> Self {
        self.editor_url = editor_url.into();
        self
    }
}

impl Default for BindingConfig {
    fn default() -> Self {
        BindingConfig {
            debug: false,
            timeout: DEFAULT_TIMEOUT,
            editor_url: DEFAULT_EDITOR_URL.to_string(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}
