//! CLI wrapper around the binding compiler.
//!
//! Usage:
//!   bindfn [options] <file.js>     # Compile a file and call it once
//!   bindfn [options] -e "code"     # Compile code and call it once
//!   bindfn [options]               # Start REPL (each line against the same state)

use std::cell::RefCell;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;
use std::rc::Rc;

use bindfn::binding::{BindingCompiler, BindingError, CallArgs, HostEnvironment};
use bindfn::runner::ds::value::JsValue;
use tracing_subscriber::EnvFilter;

struct Options {
    host: HostEnvironment,
    expression: bool,
    state: JsValue,
    event: JsValue,
    context: JsValue,
    code: Option<String>,
    file: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            print_usage();
            process::exit(1);
        }
    };

    let source = match (&options.code, &options.file) {
        (Some(code), _) => Some(code.to_string()),
        (None, Some(file)) => match fs::read_to_string(file) {
            Ok(content) => Some(content),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", file, e);
                process::exit(1);
            }
        },
        (None, None) => None,
    };

    let compiler = BindingCompiler::new(options.host);
    match source {
        Some(source) => {
            if !run_once(&compiler, &options, &source) {
                process::exit(1);
            }
        }
        None => run_repl(&compiler, &options),
    }
}

fn print_usage() {
    eprintln!("bindfn - data binding evaluator");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  bindfn [options] <file.js>    Compile a file and call it once");
    eprintln!("  bindfn [options] -e \"code\"    Compile code and call it once");
    eprintln!("  bindfn [options]              Start REPL (interactive mode)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --server            Evaluate in a sandbox, as a server host does");
    eprintln!("  --statement         Treat the code as statements, not an expression");
    eprintln!("  --state JSON        The state object (default {{}})");
    eprintln!("  --event JSON        The event argument");
    eprintln!("  --context JSON      The context argument");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        host: HostEnvironment::Client,
        expression: true,
        state: JsValue::from_json(&serde_json::json!({})),
        event: JsValue::Undefined,
        context: JsValue::Undefined,
        code: None,
        file: None,
    };
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "--server" => options.host = HostEnvironment::Server,
            "--statement" => options.expression = false,
            "--state" => options.state = json_arg(arg, args.next())?,
            "--event" => options.event = json_arg(arg, args.next())?,
            "--context" => options.context = json_arg(arg, args.next())?,
            "-e" | "--eval" => {
                let code = args.next().ok_or_else(|| format!("{} needs a value", arg))?;
                options.code = Some(code.to_string());
            }
            other if other.starts_with('-') => return Err(format!("Unknown option '{}'", other)),
            file => {
                if options.file.is_some() {
                    return Err("Only one file can be given".to_string());
                }
                options.file = Some(file.to_string());
            }
        }
    }
    Ok(options)
}

fn json_arg(flag: &str, value: Option<&String>) -> Result<JsValue, String> {
    let value = value.ok_or_else(|| format!("{} needs a value", flag))?;
    serde_json::from_str::<serde_json::Value>(value)
        .map(|json| JsValue::from_json(&json))
        .map_err(|e| format!("{} is not valid JSON: {}", flag, e))
}

/// Compiles and calls `source` once, printing the result. Returns false when
/// errors were recorded.
fn run_once(compiler: &BindingCompiler, options: &Options, source: &str) -> bool {
    let errors: Rc<RefCell<Vec<BindingError>>> = Rc::new(RefCell::new(Vec::new()));
    let binding = compiler.compile_or_get(source, options.expression, Some(&errors), None);
    let args = CallArgs::new(options.state.clone())
        .with_event(options.event.clone())
        .with_context(options.context.clone());
    let result = binding.call(&args);
    println!("{}", format_result(&result));

    let errors = errors.borrow();
    for error in errors.iter() {
        eprintln!("{}", error);
    }
    errors.is_empty()
}

fn format_result(value: &JsValue) -> String {
    match value.to_json() {
        Ok(Some(json)) => json.to_string(),
        Ok(None) => "undefined".to_string(),
        Err(_) => value.to_display_string(),
    }
}

fn run_repl(compiler: &BindingCompiler, options: &Options) {
    println!("bindfn v{}", env!("CARGO_PKG_VERSION"));
    println!("Type a binding and press Enter. Type .exit to quit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut input = String::new();
        match stdin.read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }

        let input = input.trim();
        if input == ".exit" || input == ".quit" {
            break;
        }
        if input.is_empty() {
            continue;
        }
        run_once(compiler, options, input);
    }
}
