//! Test runner for executing scenario suites
//!
//! Manages scenario execution, result collection, and reporting.

use crate::harness::{Board, TestHarness, TestResult};
use anyhow::Result;
use std::collections::HashMap;
use std::time::{Duration, Instant};

type ScenarioFn = Box<dyn FnOnce(&mut Board) -> Result<()>>;

/// A single scenario
pub struct TestCase {
    /// Scenario name
    pub name: String,
    /// Suite the scenario belongs to
    pub category: String,
    /// Scenario body
    pub test_fn: ScenarioFn,
}

impl TestCase {
    pub fn new<F>(name: &str, category: &str, test_fn: F) -> Self
    where
        F: FnOnce(&mut Board) -> Result<()> + 'static,
    {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            test_fn: Box::new(test_fn),
        }
    }
}

/// Result of running a scenario
pub struct TestRun {
    pub name: String,
    pub category: String,
    pub result: TestResult,
    pub duration: Duration,
}

impl TestRun {
    pub fn is_passed(&self) -> bool {
        self.result.is_passed()
    }
}

/// Named group of scenarios
pub struct TestSuite {
    pub name: String,
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cases: Vec::new(),
        }
    }

    pub fn add<F>(&mut self, name: &str, test_fn: F) -> &mut Self
    where
        F: FnOnce(&mut Board) -> Result<()> + 'static,
    {
        self.cases.push(TestCase::new(name, &self.name, test_fn));
        self
    }
}

/// Test runner for executing suites
#[derive(Default)]
pub struct TestRunner {
    harness: TestHarness,
    suites: Vec<TestSuite>,
    /// Filter pattern (None = run all)
    filter: Option<String>,
}

impl TestRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_suite(&mut self, suite: TestSuite) -> &mut Self {
        self.suites.push(suite);
        self
    }

    /// Only run scenarios whose name or suite contains `pattern`
    pub fn filter(&mut self, pattern: &str) -> &mut Self {
        self.filter = Some(pattern.to_string());
        self
    }

    /// Run all scenarios
    pub fn run(&mut self) -> RunResult {
        let start = Instant::now();
        let mut results = Vec::new();

        for suite in self.suites.drain(..) {
            tracing::info!("Running suite: {}", suite.name);

            for case in suite.cases {
                if let Some(ref pattern) = self.filter {
                    if !case.name.contains(pattern) && !case.category.contains(pattern) {
                        continue;
                    }
                }

                let test_start = Instant::now();
                let full_name = format!("{}::{}", case.category, case.name);
                tracing::debug!("Running scenario: {}", full_name);

                let result = self.harness.run_test(&full_name, case.test_fn);
                let duration = test_start.elapsed();

                match result.reason() {
                    None => tracing::info!("  ✓ {} ({:?})", case.name, duration),
                    Some(reason) => tracing::error!("  ✗ {} ({:?}): {}", case.name, duration, reason),
                }

                results.push(TestRun {
                    name: case.name,
                    category: case.category,
                    result,
                    duration,
                });
            }
        }

        RunResult::new(results, start.elapsed())
    }

    pub fn harness(&self) -> &TestHarness {
        &self.harness
    }
}

/// Results from running scenarios
pub struct RunResult {
    pub results: Vec<TestRun>,
    pub duration: Duration,
}

impl RunResult {
    pub fn new(results: Vec<TestRun>, duration: Duration) -> Self {
        Self { results, duration }
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.is_passed()).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.is_passed())
    }

    /// Get results by suite
    pub fn by_category(&self) -> HashMap<String, Vec<&TestRun>> {
        let mut map: HashMap<String, Vec<&TestRun>> = HashMap::new();
        for result in &self.results {
            map.entry(result.category.clone()).or_default().push(result);
        }
        map
    }

    /// Machine-readable summary
    pub fn to_json(&self) -> serde_json::Value {
        let results: Vec<_> = self
            .results
            .iter()
            .map(|run| {
                serde_json::json!({
                    "suite": run.category,
                    "name": run.name,
                    "passed": run.is_passed(),
                    "reason": run.result.reason(),
                    "duration_us": run.duration.as_micros() as u64,
                })
            })
            .collect();

        serde_json::json!({
            "passed": self.passed(),
            "failed": self.failed(),
            "total": self.total(),
            "results": results,
        })
    }

    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════╗");
        println!("║         SCENARIO RESULTS SUMMARY         ║");
        println!("╠══════════════════════════════════════════╣");
        println!("║  Passed:  {:>5}                          ║", self.passed());
        println!("║  Failed:  {:>5}                          ║", self.failed());
        println!("║  Total:   {:>5}                          ║", self.total());
        println!("║  Time:    {:>8.2?}                      ║", self.duration);
        println!("╚══════════════════════════════════════════╝");

        if self.failed() > 0 {
            println!("\nFailed scenarios:");
            for result in &self.results {
                if let Some(reason) = result.result.reason() {
                    println!("  ✗ {}::{}: {}", result.category, result.name, reason);
                }
            }
        }
    }
}
