//! Decides whether a remote candidate and a local descriptor name the same track.
//!
//! The test is a short chain of normalized Damerau-Levenshtein comparisons. Each pass
//! strips one more kind of catalog annotation from the candidate, and the first pass
//! scoring above the threshold accepts.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::normalize::DEFAULT_FEATURED_PATTERN;

pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Trailing `- <word> mix` or `(<word> mix)`.
pub const DEFAULT_MIX_SUFFIX_PATTERN: &str = r"(?i)\s*(?:-\s*\w+\s+mix|\(\w+\s+mix\))\s*$";

static RE_EMPTY_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\)").expect("valid empty parens regex"));

/// The pass that accepted a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPass {
    Literal,
    WithoutMixSuffix,
    WithoutFeatured,
}

#[derive(Debug, Clone)]
pub struct MatchPolicy {
    threshold: f64,
    case_insensitive: bool,
    mix_suffix: Regex,
    featured: Regex,
}

impl MatchPolicy {
    pub fn new(
        threshold: f64,
        case_insensitive: bool,
        mix_suffix_pattern: &str,
        featured_pattern: &str,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::NotConfigured(format!(
                "match threshold must be within [0, 1], got {threshold}"
            )));
        }
        Ok(Self {
            threshold,
            case_insensitive,
            mix_suffix: Regex::new(mix_suffix_pattern)?,
            featured: Regex::new(featured_pattern)?,
        })
    }

    /// Same rules, different threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::NotConfigured(format!(
                "match threshold must be within [0, 1], got {threshold}"
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Normalized edit-distance similarity in `[0, 1]`; identical strings score 1.
    pub fn similarity(candidate: &str, target: &str) -> f64 {
        strsim::normalized_damerau_levenshtein(candidate, target)
    }

    pub fn is_match(&self, candidate: &str, target: &str) -> bool {
        self.evaluate(candidate, target).is_some()
    }

    /// Runs the passes in order and returns the first one that clears the threshold.
    pub fn evaluate(&self, candidate: &str, target: &str) -> Option<MatchPass> {
        let (candidate, target) = if self.case_insensitive {
            (candidate.to_lowercase(), target.to_lowercase())
        } else {
            (candidate.to_string(), target.to_string())
        };

        if self.accepts(&candidate, &target) {
            return Some(MatchPass::Literal);
        }

        let candidate = self.mix_suffix.replace(&candidate, "").trim().to_string();
        if self.accepts(&candidate, &target) {
            return Some(MatchPass::WithoutMixSuffix);
        }

        let candidate = self.featured.replace(&candidate, "");
        let candidate = RE_EMPTY_PARENS.replace(candidate.trim(), "");
        if self.accepts(candidate.trim(), &target) {
            return Some(MatchPass::WithoutFeatured);
        }

        None
    }

    fn accepts(&self, candidate: &str, target: &str) -> bool {
        Self::similarity(candidate, target) > self.threshold
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            case_insensitive: true,
            mix_suffix: Regex::new(DEFAULT_MIX_SUFFIX_PATTERN).expect("valid mix suffix regex"),
            featured: Regex::new(DEFAULT_FEATURED_PATTERN).expect("valid featured regex"),
        }
    }
}
