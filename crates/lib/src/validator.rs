//! # Safety Validator
//!
//! A keyword denylist that separates read-only queries from mutating ones.
//!
//! This is not a SQL parser. It does not check syntax, it does not check that
//! referenced tables or columns exist, and it cannot see through keywords that
//! are split or hidden by comments. A forbidden keyword inside a string literal
//! or comment is still rejected, because the text is scanned as a whole.

use crate::errors::{GenerationError, PolicyViolation};
use regex::Regex;

/// Statement keywords that are never allowed, in reporting order.
pub const FORBIDDEN_KEYWORDS: [&str; 8] = [
    "INSERT", "UPDATE", "DELETE", "MERGE", "DROP", "ALTER", "TRUNCATE", "CREATE",
];

/// Builds a case-insensitive pattern for `keyword` bounded by non-word ASCII
/// characters or the ends of the text.
fn keyword_pattern(keyword: &str) -> String {
    format!(r"(?i)(?:^|[^A-Za-z0-9_]){keyword}(?:[^A-Za-z0-9_]|$)")
}

/// Rejects generated SQL that contains a forbidden statement keyword or lacks a SELECT.
#[derive(Debug, Clone)]
pub struct SafetyValidator {
    forbidden: Vec<(&'static str, Regex)>,
    select: Regex,
}

impl SafetyValidator {
    pub fn new() -> Result<Self, GenerationError> {
        let forbidden = FORBIDDEN_KEYWORDS
            .iter()
            .map(|kw| Regex::new(&keyword_pattern(kw)).map(|re| (*kw, re)))
            .collect::<Result<Vec<_>, _>>()?;
        let select = Regex::new(&keyword_pattern("SELECT"))?;
        Ok(Self { forbidden, select })
    }

    /// Checks the candidate SQL.
    ///
    /// The whole text is scanned, not just the leading statement. The first
    /// forbidden keyword in [`FORBIDDEN_KEYWORDS`] order is reported.
    pub fn validate(&self, sql: &str) -> Result<(), PolicyViolation> {
        if let Some((keyword, _)) = self.forbidden.iter().find(|(_, re)| re.is_match(sql)) {
            return Err(PolicyViolation::ForbiddenKeyword(keyword));
        }
        if !self.select.is_match(sql) {
            return Err(PolicyViolation::MissingSelect);
        }
        Ok(())
    }
}
