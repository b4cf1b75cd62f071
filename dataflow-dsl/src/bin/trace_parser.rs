/// DSL Tracer - Shows the flow through Lexer → Parser → AST → Printer
///
/// Usage: cargo run --bin trace_parser [--task] <definition>
///
/// Set RUST_LOG=dataflow_dsl=trace to see parser events.

use dataflow_dsl::visitor::max_fan_out;
use dataflow_dsl::{parse_stream, parse_task, tokenize, ParseError};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let is_task = args.iter().any(|a| a == "--task");
    let definition = args
        .iter()
        .filter(|a| a.as_str() != "--task")
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    if definition.trim().is_empty() {
        eprintln!("Usage: cargo run --bin trace_parser [--task] <definition>");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  cargo run --bin trace_parser 'http --port=8080 | log'");
        eprintln!("  cargo run --bin trace_parser --task '<a || b> && c'");
        std::process::exit(1);
    }

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ {} DEFINITION TRACER", if is_task { "TASK" } else { "STREAM" });
    println!("╚═══════════════════════════════════════════════════════════════\n");

    println!("📝 INPUT:");
    println!("{}", definition);
    println!();

    println!("🔍 TOKENS:");
    println!("─────────────────────────────────────────────────────────────");
    match tokenize(&definition) {
        Ok(tokens) => {
            for token in &tokens {
                println!("  {:>4}..{:<4} {:?}", token.span.start, token.span.end, token.kind);
            }
        }
        Err(e) => report(&e),
    }
    println!();

    let outcome = if is_task {
        parse_task(&definition).map(|task| {
            print_ast(&task);
            println!("Max fan-out: {}", max_fan_out(&task));
            println!();
            let graph = task.to_graph();
            println!("🕸  GRAPH: {} nodes, {} links", graph.nodes.len(), graph.links.len());
            println!("─────────────────────────────────────────────────────────────");
            println!("{}", graph.to_dsl());
            println!();
            task.to_dsl()
        })
    } else {
        parse_stream(&definition).map(|stream| {
            print_ast(&stream);
            stream.to_dsl()
        })
    };

    match outcome {
        Ok(canonical) => {
            println!("🔄 ROUND-TRIP:");
            println!("─────────────────────────────────────────────────────────────");
            println!("{}", canonical);
            println!();
            println!("✅ Parse succeeded!");
        }
        Err(e) => report(&e),
    }
}

fn print_ast<T: serde::Serialize>(ast: &T) {
    println!("🌳 AST:");
    println!("─────────────────────────────────────────────────────────────");
    match serde_json::to_string_pretty(ast) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("(could not serialize AST: {})", e),
    }
    println!();
}

fn report(error: &ParseError) {
    println!("❌ Parse error:");
    println!("{}", error);
    if let Some(checkpoint) = error.checkpoint {
        println!("   last good offset: {}", checkpoint);
    }
}
