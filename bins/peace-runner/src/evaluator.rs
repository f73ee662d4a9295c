/// Outcome Evaluator - Verdict Assignment
///
/// **Core Responsibility:**
/// Turn one raw execution output into exactly one Outcome and a TestRecord.
///
/// **Critical Properties:**
/// - Knows nothing about processes or the toolchain
/// - Pure function: (exit signal, captured output) → Outcome
///
/// **Classification Rules (in order):**
/// 1. Exit succeeded → Pass, whatever the output says
/// 2. Output contains `panic:` in any letter case → Panic
/// 3. Otherwise → Fail
///
/// A panic marker anywhere counts, including one raised by test scaffolding
/// rather than the test under run.

use crate::engine::ExecutionOutput;
use peace_common::types::{Outcome, TestRecord};

pub const PANIC_MARKER: &str = "panic:";

fn contains_panic_marker(text: &str) -> bool {
    text.to_ascii_lowercase().contains(PANIC_MARKER)
}

pub fn classify(output: &ExecutionOutput) -> Outcome {
    if output.success {
        Outcome::Pass
    } else if contains_panic_marker(&output.stdout) || contains_panic_marker(&output.stderr) {
        Outcome::Panic
    } else {
        Outcome::Fail
    }
}

/// Classify one output and build its record; captured output is kept only
/// for tests that did not pass
pub fn evaluate_test(name: String, output: &ExecutionOutput) -> TestRecord {
    let outcome = classify(output);
    let captured = match outcome {
        Outcome::Pass => None,
        Outcome::Fail | Outcome::Panic => Some(output.combined()),
    };

    TestRecord {
        name,
        outcome,
        duration_ms: output.execution_time_ms,
        output: captured,
    }
}
