use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A discovered test entry point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestIdentifier {
    /// Free function test, selected with `-run <name>`
    Plain { name: String },
    /// Suite method bound to a pointer receiver, selected with `-check.f <Receiver>.<Method>`
    Method { receiver: String, method: String },
}

impl TestIdentifier {
    pub fn plain(name: impl Into<String>) -> Self {
        TestIdentifier::Plain { name: name.into() }
    }

    pub fn method(receiver: impl Into<String>, method: impl Into<String>) -> Self {
        TestIdentifier::Method {
            receiver: receiver.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for TestIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestIdentifier::Plain { name } => write!(f, "{}", name),
            TestIdentifier::Method { receiver, method } => write!(f, "{}.{}", receiver, method),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Panic,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => write!(f, "pass"),
            Outcome::Fail => write!(f, "fail"),
            Outcome::Panic => write!(f, "panic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    /// Captured output, kept only for tests that did not pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl fmt::Display for TestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.outcome, self.name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub panicked: usize,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// Per-package result list, in execution order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageReport {
    pub package: String,
    pub started_at: DateTime<Utc>,
    pub tests: Vec<TestRecord>,
}

impl PackageReport {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            started_at: Utc::now(),
            tests: Vec::new(),
        }
    }

    pub fn push(&mut self, record: TestRecord) {
        self.tests.push(record);
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total: self.tests.len(),
            ..Default::default()
        };
        for test in &self.tests {
            match test.outcome {
                Outcome::Pass => summary.passed += 1,
                Outcome::Fail => summary.failed += 1,
                Outcome::Panic => summary.panicked += 1,
            }
            summary.duration_ms += test.duration_ms;
        }
        summary
    }
}

impl fmt::Display for PackageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: [{}]", self.package, self.tests.len())?;
        for test in &self.tests {
            writeln!(f, "{}", test)?;
        }
        Ok(())
    }
}
