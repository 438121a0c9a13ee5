/// Benchmark runner for binding compilation and evaluation.
///
/// Compares the memoized client path against the per-call sandbox of the
/// server path for typical binding shapes.

extern crate bindfn;

use std::time::{Duration, Instant};

use bindfn::binding::{BindingCompiler, BindingConfig, CallArgs, HostEnvironment};
use bindfn::runner::ds::value::JsValue;

fn state() -> JsValue {
    JsValue::from_json(&serde_json::json!({
        "price": 12.5,
        "quantity": 4,
        "user": {"first": "Ada", "last": "Lovelace", "tags": ["admin", "beta"]},
        "items": [
            {"id": 1, "active": true, "score": 10},
            {"id": 2, "active": false, "score": 7},
            {"id": 3, "active": true, "score": 3},
            {"id": 4, "active": true, "score": 8}
        ]
    }))
}

/// Compile (or fetch) and call the binding `iterations` times.
fn run_benchmark(compiler: &BindingCompiler, code: &str, expression: bool, iterations: u32) -> Duration {
    let args = CallArgs::new(state());
    let start = Instant::now();
    for _ in 0..iterations {
        let binding = compiler.compile_or_get(code, expression, None, None);
        let _ = binding.call(&args);
    }
    start.elapsed()
}

/// Same as [`run_benchmark`] but defeats the memo cache, so every iteration
/// parses the text again.
fn run_benchmark_uncached(compiler: &BindingCompiler, code: &str, expression: bool, iterations: u32) -> Duration {
    let args = CallArgs::new(state());
    let start = Instant::now();
    for _ in 0..iterations {
        compiler.reset_cache();
        let binding = compiler.compile_or_get(code, expression, None, None);
        let _ = binding.call(&args);
    }
    start.elapsed()
}

// ============================================================================
// Benchmark definitions
// ============================================================================

const BENCH_ARITHMETIC: &str = "price * quantity";

const BENCH_TEMPLATE: &str = "`${user.first} ${user.last} (${user.tags.join(', ')})`";

const BENCH_PIPELINE: &str =
    "items.filter(i => i.active).map(i => i.score).reduce((a, b) => a + b, 0)";

const BENCH_CONDITIONAL: &str = "quantity > 3 ? 'bulk' : price > 10 ? 'premium' : 'standard'";

// Server sandboxes only strip a `return` that starts the text or follows a `;`.
const BENCH_STATEMENTS: &str =
    "var total = 0; items.forEach(i => { if (i.active) total += i.score * price; });return total";

const BENCH_LOOP: &str = "var sum = 0; for (var i = 0; i < 1000; i = i + 1) { sum = sum + i; };return sum";

fn main() {
    println!("=======================================================");
    println!("  bindfn - Binding Benchmarks");
    println!("  Client (memoized) vs Client (uncached) vs Server");
    println!("=======================================================\n");

    let config = BindingConfig::default();
    let client = BindingCompiler::with_config(HostEnvironment::Client, config.clone());
    let uncached = BindingCompiler::with_config(HostEnvironment::Client, config.clone());
    let server = BindingCompiler::with_config(HostEnvironment::Server, config);

    let benchmarks: Vec<(&str, &str, bool, u32)> = vec![
        ("Arithmetic", BENCH_ARITHMETIC, true, 5000),
        ("Template literal", BENCH_TEMPLATE, true, 2000),
        ("Filter/map/reduce", BENCH_PIPELINE, true, 2000),
        ("Nested conditional", BENCH_CONDITIONAL, true, 5000),
        ("Statement block", BENCH_STATEMENTS, false, 2000),
        ("Loop (1K)", BENCH_LOOP, false, 100),
    ];

    println!(
        "{:<22} {:>14} {:>14} {:>14}",
        "Benchmark", "Client", "Uncached", "Server"
    );
    println!("{}", "-".repeat(68));

    for (name, code, expression, iterations) in &benchmarks {
        let client_dur = run_benchmark(&client, code, *expression, *iterations);
        let uncached_dur = run_benchmark_uncached(&uncached, code, *expression, *iterations);
        let server_dur = run_benchmark(&server, code, *expression, *iterations);
        println!(
            "{:<22} {:>12.2?} {:>12.2?} {:>12.2?}",
            name, client_dur, uncached_dur, server_dur
        );
    }

    // Verify correctness
    println!("\n=======================================================");
    println!("  Correctness Verification");
    println!("=======================================================\n");

    let verifications: Vec<(&str, &str, bool, &str)> = vec![
        ("Arithmetic", BENCH_ARITHMETIC, true, "50"),
        ("Template literal", BENCH_TEMPLATE, true, "Ada Lovelace (admin, beta)"),
        ("Filter/map/reduce", BENCH_PIPELINE, true, "21"),
        ("Nested conditional", BENCH_CONDITIONAL, true, "bulk"),
        ("Statement block", BENCH_STATEMENTS, false, "262.5"),
        ("Loop (1K)", BENCH_LOOP, false, "499500"),
    ];

    println!("{:<22} {:>28} {:>8} {:>8}", "Test", "Expected", "Client", "Server");
    println!("{}", "-".repeat(70));

    let args = CallArgs::new(state());
    for (name, code, expression, expected) in verifications {
        let client_val = client.compile_or_get(code, expression, None, None).call(&args);
        let server_val = server.compile_or_get(code, expression, None, None).call(&args);
        let c_status = if client_val.to_string() == expected { "✓" } else { "✗" };
        let s_status = if server_val.to_string() == expected { "✓" } else { "✗" };
        println!("{:<22} {:>28} {:>8} {:>8}", name, expected, c_status, s_status);
    }
}
