/// Invocation Builder - One Isolated Request Per Identifier
///
/// Pure data assembly: never fails, and identical inputs always yield an
/// identical request. Argument shape comes from `peace_common::args`.

use peace_common::args;
use peace_common::types::TestIdentifier;
use std::ffi::OsString;
use std::sync::Arc;

/// Immutable environment handed to every child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: Vec<(OsString, OsString)>,
}

impl EnvSnapshot {
    /// Snapshot of the current process environment
    pub fn capture() -> Self {
        Self::from_vars(std::env::vars_os())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn vars(&self) -> &[(OsString, OsString)] {
        &self.vars
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub identifier: TestIdentifier,
    pub program: String,
    pub args: Vec<String>,
    pub env: Arc<EnvSnapshot>,
}

impl ExecutionRequest {
    /// Display name recorded in the report
    pub fn name(&self) -> String {
        self.identifier.to_string()
    }

    /// `go test -run TestX pkg` style line for progress logs
    pub fn command_line(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

pub fn build_request(
    program: &str,
    package: &str,
    tags: &str,
    identifier: &TestIdentifier,
    env: &Arc<EnvSnapshot>,
) -> ExecutionRequest {
    ExecutionRequest {
        identifier: identifier.clone(),
        program: program.to_string(),
        args: args::test_args(package, tags, identifier),
        env: Arc::clone(env),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Arc<EnvSnapshot> {
        Arc::new(EnvSnapshot::from_vars([("GOPATH", "/go"), ("HOME", "/root")]))
    }

    #[test]
    fn test_plain_request() {
        let id = TestIdentifier::plain("TestAlpha");
        let request = build_request("go", "acme/widgets", "", &id, &env());

        assert_eq!(request.program, "go");
        assert_eq!(request.args, vec!["test", "acme/widgets", "-run", "TestAlpha"]);
        assert_eq!(request.name(), "TestAlpha");
        assert_eq!(request.command_line(), "go test acme/widgets -run TestAlpha");
    }

    #[test]
    fn test_method_request_targets_suite_filter() {
        let id = TestIdentifier::method("Suite", "TestBeta");
        let request = build_request("go", "acme/widgets", "integration", &id, &env());

        assert_eq!(
            request.args,
            vec!["test", "-tags integration", "acme/widgets", "-check.f", "Suite.TestBeta"]
        );
        assert_eq!(request.name(), "Suite.TestBeta");
    }

    #[test]
    fn test_requests_share_one_snapshot() {
        let env = env();
        let a = build_request("go", "p", "", &TestIdentifier::plain("TestA"), &env);
        let b = build_request("go", "p", "", &TestIdentifier::plain("TestB"), &env);

        assert!(Arc::ptr_eq(&a.env, &b.env));
        assert_eq!(a.env.vars().len(), 2);
    }

    #[test]
    fn test_build_is_deterministic() {
        let env = env();
        let id = TestIdentifier::method("S", "TestZ");
        assert_eq!(
            build_request("go", "p", "t", &id, &env),
            build_request("go", "p", "t", &id, &env)
        );
    }
}
