//! Turns a local descriptor into the query sent to the remote catalog search.

use itertools::Itertools;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::Result;

/// Featured-artist credit, from the keyword up to the next hyphen or parenthesis.
pub const DEFAULT_FEATURED_PATTERN: &str = r"(?i)\b(?:ft|feat|featuring)\b\.?[^-()]*";

/// `&` surrounded by non-word characters, or a standalone `x`.
pub const DEFAULT_CONNECTOR_PATTERN: &str = r"(?i)\B&\B|\bx\b";

static RE_EMPTY_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\)").expect("valid empty parens regex"));
static RE_TRAILING_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(([^()]+)\)\s*$").expect("valid trailing qualifier regex")
});
static DEFAULT_RULES: LazyLock<NormalizerRules> = LazyLock::new(NormalizerRules::default);

/// Configurable normalization rules. The featured-credit and connector patterns
/// differ between catalogs, so both are supplied by the caller.
#[derive(Debug, Clone)]
pub struct NormalizerRules {
    featured: Regex,
    connectors: Regex,
}

impl NormalizerRules {
    pub fn new(featured_pattern: &str, connector_pattern: &str) -> Result<Self> {
        Ok(Self {
            featured: Regex::new(featured_pattern)?,
            connectors: Regex::new(connector_pattern)?,
        })
    }

    /// Applies the rules once, in order:
    ///
    /// 1. drop featured-artist credits
    /// 2. drop parentheses left empty by step 1
    /// 3. rewrite a trailing `(Qualifier)` as `- Qualifier`
    /// 4. drop multi-artist connectors
    ///
    /// Whitespace is collapsed and trimmed. Not idempotent: apply exactly once.
    pub fn normalize(&self, descriptor: &str) -> String {
        let query = self.featured.replace_all(descriptor, "");
        let query = RE_EMPTY_PARENS.replace_all(&query, "");
        let query = RE_TRAILING_QUALIFIER.replace(&query, " - $1");
        let query = self.connectors.replace_all(&query, "");
        query.split_whitespace().join(" ")
    }
}

impl Default for NormalizerRules {
    fn default() -> Self {
        Self {
            featured: Regex::new(DEFAULT_FEATURED_PATTERN).expect("valid featured regex"),
            connectors: Regex::new(DEFAULT_CONNECTOR_PATTERN).expect("valid connector regex"),
        }
    }
}

/// Normalizes with the default rules.
pub fn normalize(descriptor: &str) -> String {
    DEFAULT_RULES.normalize(descriptor)
}
