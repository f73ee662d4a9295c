/// Identifier Extractor - Test Entry Point Recognition
///
/// **Core Responsibility:**
/// Turn the raw text of one test source file into the ordered list of
/// test identifiers it declares.
///
/// **Recognition Rules:**
/// - Plain test: `func TestXxx(` at any position, one `Plain` per match
/// - Suite method: `func (s *Receiver) TestXxx(`, one `Method` per match
/// - All plain matches come first, then all method matches, each in text order
///
/// Pattern matching only; nothing here builds a syntax tree. Any other
/// recognizer (e.g. a real parser) can stand in through `IdentifierExtractor`.

use anyhow::{Context, Result};
use peace_common::types::TestIdentifier;
use regex::Regex;

// Separators are the ASCII whitespace class `[\t\n\f\r ]`, not Unicode `\s`
pub const PLAIN_TEST_PATTERN: &str = r"func[\t\n\f\r ](Test[A-Za-z0-9_]+)";
pub const METHOD_TEST_PATTERN: &str =
    r"func[\t\n\f\r ]\((?:.*\*([A-Za-z0-9_]+))\)[\t\n\f\r ](Test[A-Za-z0-9_]+)";

pub trait IdentifierExtractor {
    fn extract(&self, source: &str) -> Vec<TestIdentifier>;
}

pub struct PatternExtractor {
    plain: Regex,
    method: Regex,
}

impl PatternExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            plain: Regex::new(PLAIN_TEST_PATTERN).context("Invalid plain test pattern")?,
            method: Regex::new(METHOD_TEST_PATTERN).context("Invalid method test pattern")?,
        })
    }
}

impl IdentifierExtractor for PatternExtractor {
    fn extract(&self, source: &str) -> Vec<TestIdentifier> {
        let plain = self
            .plain
            .captures_iter(source)
            .map(|caps| TestIdentifier::plain(&caps[1]));

        let methods = self
            .method
            .captures_iter(source)
            .map(|caps| TestIdentifier::method(&caps[1], &caps[2]));

        plain.chain(methods).collect()
    }
}
