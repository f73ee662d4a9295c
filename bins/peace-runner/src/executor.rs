/// Package Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Drive one package through the whole pipeline and return its report.
///
/// **Architecture:**
/// 1. Discover identifiers in the package's test files (discovery.rs, extractor.rs)
/// 2. Build one isolated request per identifier (invocation.rs)
/// 3. Run each request through the ExecutionEngine, strictly in order (engine.rs)
/// 4. Classify each output and append its record (evaluator.rs)
///
/// This module is the glue layer - it knows nothing about:
/// - How identifiers are recognised (extractor's job)
/// - How a child runs (engine's job)
/// - How verdicts are assigned (evaluator's job)
///
/// Discovery I/O errors abort the run before anything executes. Execution
/// failures never do; they become Fail or Panic records.

use crate::config::RunnerConfig;
use crate::discovery;
use crate::engine::ExecutionEngine;
use crate::evaluator;
use crate::extractor::IdentifierExtractor;
use crate::invocation::{build_request, EnvSnapshot, ExecutionRequest};
use anyhow::Result;
use peace_common::types::{Outcome, PackageReport};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Build tags, passed through as one unsplit token
    pub tags: String,
    /// Emit progress lines
    pub logging: bool,
}

pub struct PackageRunner<X, E> {
    config: RunnerConfig,
    extractor: X,
    engine: E,
    env: Arc<EnvSnapshot>,
}

impl<X: IdentifierExtractor, E: ExecutionEngine> PackageRunner<X, E> {
    pub fn new(config: RunnerConfig, extractor: X, engine: E, env: EnvSnapshot) -> Self {
        Self {
            config,
            extractor,
            engine,
            env: Arc::new(env),
        }
    }

    /// Discover and build every request for `package` without running any
    pub async fn plan(&self, package: &str, options: &RunOptions) -> Result<Vec<ExecutionRequest>> {
        let dir = self.config.package_dir(package)?;
        let files = discovery::discover(
            &dir,
            &self.config.test_file_marker,
            &self.extractor,
            options.logging,
        )
        .await?;

        for file in &files {
            debug!(file = %file.name, tests = file.identifiers.len(), "Extracted identifiers");
        }

        let requests: Vec<ExecutionRequest> = files
            .iter()
            .flat_map(|file| file.identifiers.iter())
            .map(|id| build_request(&self.config.toolchain, package, &options.tags, id, &self.env))
            .collect();

        debug!(
            package = %package,
            files = files.len(),
            requests = requests.len(),
            "Discovery complete"
        );
        Ok(requests)
    }

    /// Full pipeline: plan, then execute and classify every request
    #[instrument(skip_all, fields(package = %package))]
    pub async fn run(&self, package: &str, options: &RunOptions) -> Result<PackageReport> {
        if options.logging {
            info!("Package: {}", package);
        }

        let requests = self.plan(package, options).await?;
        Ok(self.execute_all(package, requests, options.logging).await)
    }

    /// Execute requests one at a time, in the given order
    pub async fn execute_all(
        &self,
        package: &str,
        requests: Vec<ExecutionRequest>,
        logging: bool,
    ) -> PackageReport {
        let mut report = PackageReport::new(package);
        let total = requests.len();

        for (index, request) in requests.into_iter().enumerate() {
            if logging {
                info!("Executing [{}/{}]: `{}`", index + 1, total, request.command_line());
            }

            let output = self.engine.execute(&request).await;
            let record = evaluator::evaluate_test(request.name(), &output);

            if logging && record.outcome != Outcome::Pass {
                info!("{}", output.combined());
            }
            debug!(
                test = %record.name,
                outcome = %record.outcome,
                exit_code = ?output.exit_code,
                timed_out = output.timed_out,
                execution_ms = record.duration_ms,
                "Test classified"
            );

            report.push(record);
        }

        report
    }
}
