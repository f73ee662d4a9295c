use crate::types::TestIdentifier;

/// Toolchain argument semantics - defines only semantics, not process logic
/// Keeps the runner and the dry-run listing from drifting apart,
/// and guarantees that one identifier always maps to the same filter

pub const TEST_VERB: &str = "test";
pub const TAGS_FLAG: &str = "-tags";
pub const RUN_FLAG: &str = "-run";
pub const CHECK_FILTER_FLAG: &str = "-check.f";

/// Build tags token: `-tags <value>` as ONE argv element. The tags string is
/// neither split nor rewritten, so multi-tag values must already be joined
/// by the caller (e.g. `a,b`).
pub fn tags_arg(tags: &str) -> Option<String> {
    if tags.is_empty() {
        None
    } else {
        Some(format!("{} {}", TAGS_FLAG, tags))
    }
}

/// Filter flag and value selecting exactly one identifier
pub fn filter_args(id: &TestIdentifier) -> [String; 2] {
    match id {
        TestIdentifier::Plain { name } => [RUN_FLAG.to_string(), name.clone()],
        TestIdentifier::Method { .. } => [CHECK_FILTER_FLAG.to_string(), id.to_string()],
    }
}

/// Full argument list: `test ["-tags <value>"] <package> <flag> <value>`
pub fn test_args(package: &str, tags: &str, id: &TestIdentifier) -> Vec<String> {
    let mut args = vec![TEST_VERB.to_string()];
    args.extend(tags_arg(tags));
    args.push(package.to_string());
    args.extend(filter_args(id));
    args
}
