//! Scenario Runner
//!
//! Command-line tool for running the drag-and-drop scenarios.
//!
//! Usage:
//!   dnd-scenarios              # Run all scenarios
//!   dnd-scenarios --filter foo # Run scenarios matching "foo"
//!   dnd-scenarios --list       # List all scenarios
//!   dnd-scenarios --json       # Print results as JSON

use anyhow::Result;
use dnd_test_suite::{runner::TestRunner, tests};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let json = args.iter().any(|a| a == "--json");

    // Keep stdout clean for JSON output
    let default_filter = if json { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if args.iter().any(|a| a == "--list") {
        println!("Available scenario suites:");
        for suite in tests::all_suites() {
            println!("\n  {}:", suite.name);
            for case in &suite.cases {
                println!("    - {}", case.name);
            }
        }
        return Ok(());
    }

    let filter = args
        .iter()
        .position(|a| a == "--filter")
        .and_then(|i| args.get(i + 1))
        .cloned();

    if !json {
        println!("╔══════════════════════════════════════════╗");
        println!("║         DRAG-AND-DROP SCENARIOS          ║");
        println!("╚══════════════════════════════════════════╝\n");
    }

    let mut runner = TestRunner::new();
    for suite in tests::all_suites() {
        runner.add_suite(suite);
    }

    if let Some(ref pattern) = filter {
        if !json {
            println!("Running scenarios matching: {}\n", pattern);
        }
        runner.filter(pattern);
    }

    let result = runner.run();

    if json {
        println!("{}", serde_json::to_string_pretty(&result.to_json())?);
    } else {
        result.print_summary();
    }

    if result.all_passed() {
        if !json {
            println!("\nAll scenarios passed!");
        }
        Ok(())
    } else {
        std::process::exit(1);
    }
}
