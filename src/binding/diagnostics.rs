//! Failure reports for operators.
//!
//! A report names the failing code, the error, and where in the content
//! editor the binding lives. Reports only ever go to the log; nothing here can
//! fail or interrupt the caller.

use tracing::error;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

use super::config::BindingConfig;
use super::HostEnvironment;

const DEBUG_HINT: &str = "For a more detailed error message, restart your server with DEBUG=true \
set in your environment variables. If you run your development server through npm, yarn or a \
similar tool, add DEBUG=true to the script so that the server can see the variable.\n";

/// Turns caught binding failures into operator-facing reports.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    host: HostEnvironment,
    debug: bool,
    editor_url: String,
}

impl Diagnostics {
    pub fn new(host: HostEnvironment, config: &BindingConfig) -> Self {
        Diagnostics {
            host,
            debug: config.debug,
            editor_url: config.editor_url.to_string(),
        }
    }

    /// Logs the raw error on the `bindfn::raw` target and the composed report
    /// on the default one.
    pub fn report(
        &self,
        code: &str,
        error: &JErrorType,
        context: &JsValue,
        block: &JsValue,
        sandbox: Option<&JsValue>,
    ) {
        error!(target: "bindfn::raw", error = ?error, "data binding failed");
        let message = self.compose_report(code, error, context, block, sandbox);
        match self.host {
            HostEnvironment::Server => error!("\n{}", message),
            HostEnvironment::Client => error!("{}", message),
        }
    }

    /// The text of the report for one failure.
    pub fn compose_report(
        &self,
        code: &str,
        error: &JErrorType,
        context: &JsValue,
        block: &JsValue,
        sandbox: Option<&JsValue>,
    ) -> String {
        let content_id = context.get_path("builderContent.id");
        let block_id = block.get_path("id");
        let mut message = format!(
            "Failed to execute the following data binding code on the {}:\n\n  {}\n\n\
             The error was\n\n  {}\n\n\
             You can inspect the code above by visiting {}/{}/edit?activeDesignerTab=3&selectedBlock={} \
             and opening the JSON view of the selected block from the Layers tab, or with \
             Cmd/Ctrl+E once the block is selected. The binding itself is also listed in the Data tab.\n",
            self.host.name(),
            code,
            error,
            self.editor_url,
            content_id,
            block_id,
        );
        if self.host == HostEnvironment::Server {
            message.push('\n');
            message.push_str(&self.debug_info(error, context, block, sandbox));
        }
        message
    }

    fn debug_info(
        &self,
        error: &JErrorType,
        context: &JsValue,
        block: &JsValue,
        sandbox: Option<&JsValue>,
    ) -> String {
        if !self.debug {
            return DEBUG_HINT.to_string();
        }
        let mut info = format!(
            "***BEGIN DEBUG INFO***\n\n\
             Block type: {}\n\
             Block ID: {}\n\
             Content item ID: {}\n\
             Content item name: {}\n",
            block.get_path("component.name"),
            block.get_path("id"),
            context.get_path("builderContent.id"),
            context.get_path("builderContent.name"),
        );
        if let Some(sandbox) = sandbox {
            let snapshot = serde_json::to_string_pretty(&sandbox.to_json_lossy())
                .unwrap_or_else(|_| "{}".to_string());
            info.push_str(&format!("\nServer VM sandbox:\n\n{}\n", snapshot));
        }
        info.push_str(&format!(
            "\nError stack trace:\n\n{:?}\n\n***END DEBUG INFO***\n",
            error
        ));
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> JsValue {
        JsValue::from_json(&serde_json::json!({"builderContent": {"id": "c1", "name": "Home"}}))
    }

    fn block() -> JsValue {
        JsValue::from_json(&serde_json::json!({"id": "b7", "component": {"name": "Text"}}))
    }

    fn error() -> JErrorType {
        JErrorType::ReferenceError("foo is not defined".to_string())
    }

    #[test]
    fn client_report_links_to_the_block() {
        let diagnostics = Diagnostics::new(HostEnvironment::Client, &BindingConfig::default());
        let report = diagnostics.compose_report("foo + 1", &error(), &context(), &block(), None);
        assert!(report.contains("on the browser"));
        assert!(report.contains("  foo + 1\n"));
        assert!(report.contains("ReferenceError: foo is not defined"));
        assert!(report.contains(
            "https://www.builder.io/content/c1/edit?activeDesignerTab=3&selectedBlock=b7"
        ));
        assert!(!report.contains("DEBUG"));
    }

    #[test]
    fn server_report_without_debug_explains_how_to_enable_it() {
        let diagnostics = Diagnostics::new(HostEnvironment::Server, &BindingConfig::default());
        let report = diagnostics.compose_report("x", &error(), &context(), &block(), None);
        assert!(report.contains("DEBUG=true"));
        assert!(!report.contains("BEGIN DEBUG INFO"));
    }

    #[test]
    fn server_debug_report_includes_sandbox_and_block_details() {
        let config = BindingConfig::default().with_debug(true);
        let diagnostics = Diagnostics::new(HostEnvironment::Server, &config);
        let sandbox = JsValue::from_json(&serde_json::json!({"a": 1}));
        let report =
            diagnostics.compose_report("x", &error(), &context(), &block(), Some(&sandbox));
        assert!(report.contains("Block type: Text"));
        assert!(report.contains("Content item name: Home"));
        assert!(report.contains("\"a\": 1"));
        assert!(report.contains("***END DEBUG INFO***"));
    }

    #[test]
    fn missing_fields_print_as_undefined() {
        let diagnostics = Diagnostics::new(HostEnvironment::Client, &BindingConfig::default());
        let report = diagnostics.compose_report(
            "x",
            &error(),
            &JsValue::Undefined,
            &JsValue::Null,
            None,
        );
        assert!(report.contains("/undefined/edit?activeDesignerTab=3&selectedBlock=undefined"));
    }
}
