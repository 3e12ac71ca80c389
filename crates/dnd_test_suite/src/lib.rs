//! Drag-and-drop Scenario Suite
//!
//! End-to-end scenarios for container coordination, driven through the
//! headless gesture engine. Each scenario gets a fresh [`Board`]: its own
//! context, visual tree and engine factory.
//!
//! # Scenario Categories
//!
//! - **registry**: Shared engines per type, replace-by-id, remove-by-identity
//! - **reconcile**: Which container reports a drop, and what it reports
//! - **lifecycle**: Mount, re-render and unmount bookkeeping
//! - **scroll**: Boundary auto-scroll while dragging

pub mod harness;
pub mod runner;
pub mod tests;

pub use harness::{Board, MountedList, TestHarness, TestResult};
pub use runner::TestRunner;
