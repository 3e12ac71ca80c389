//! Scenario suites organized by area


use crate::runner::TestSuite;

/// Create all scenario suites
pub fn all_suites() -> Vec<TestSuite> {
    vec![
        registry::suite(),
        reconcile::suite(),
        lifecycle::suite(),
        scroll::suite(),
    ]
}
