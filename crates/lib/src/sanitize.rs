//! # Output Sanitizer
//!
//! Backends sometimes wrap their answer in a Markdown code fence despite being
//! told not to. [`sanitize`] strips that wrapping. It never fails and is
//! idempotent: stripping is repeated until nothing changes.

/// Strips optional code-fence wrapping and surrounding whitespace.
pub fn sanitize(raw: &str) -> String {
    let mut current = raw.trim();
    loop {
        let next = strip_fences_once(current);
        if next == current {
            return current.to_string();
        }
        current = next;
    }
}

fn strip_fences_once(text: &str) -> &str {
    let text = strip_leading_fence(text.trim());
    let text = text.trim_end();
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn strip_leading_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // A language tag is only recognised when it is alone on the fence line.
    if let Some((tag, body)) = rest.split_once('\n') {
        if is_fence_tag(tag) {
            return body;
        }
    }

    // Single-line form: "```sql SELECT 1```".
    if let Some(tag) = rest.get(..3) {
        if tag.eq_ignore_ascii_case("sql") {
            let after = &rest[3..];
            if after.is_empty() || after.starts_with(char::is_whitespace) {
                return after;
            }
        }
    }

    rest
}

/// Statement words that can open a query on a line of their own. A fence
/// line holding one of these is SQL, not a language tag.
const SQL_LEADING_KEYWORDS: [&str; 16] = [
    "SELECT", "WITH", "FROM", "WHERE", "VALUES", "TABLE", "EXPLAIN", "SHOW", "DESCRIBE",
    "INSERT", "UPDATE", "DELETE", "MERGE", "DROP", "ALTER", "CREATE",
];

/// A tag is empty or a single identifier-like token (`tsql`, `sql92`,
/// `c++`) that is not itself a SQL keyword.
fn is_fence_tag(tag: &str) -> bool {
    let tag = tag.trim();
    if tag.is_empty() {
        return true;
    }
    let identifier_like = tag.starts_with(|c: char| c.is_ascii_alphabetic())
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'));
    identifier_like
        && !SQL_LEADING_KEYWORDS
            .iter()
            .any(|k| k.eq_ignore_ascii_case(tag))
}
