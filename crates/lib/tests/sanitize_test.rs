//! # Output Sanitizer Tests

use goldsql::sanitize;

#[test]
fn test_sanitize_strips_sql_fence() {
    assert_eq!(
        sanitize("```sql\nSELECT AVG(x) FROM users\n```"),
        "SELECT AVG(x) FROM users"
    );
}

#[test]
fn test_sanitize_strips_dialect_tags() {
    assert_eq!(sanitize("```postgresql\nSELECT 1\n```"), "SELECT 1");
    assert_eq!(sanitize("```BigQuery\nSELECT 1\n```"), "SELECT 1");
}

#[test]
fn test_sanitize_strips_unlisted_language_tags() {
    for tag in ["tsql", "hql", "sql92", "plsql", "pl-sql"] {
        let raw = format!("```{tag}\nSELECT 1\n```");
        assert_eq!(sanitize(&raw), "SELECT 1", "tag '{tag}' was not stripped");
    }
}

#[test]
fn test_sanitize_keeps_keyword_on_fence_line() {
    assert_eq!(sanitize("```SELECT\n1\n```"), "SELECT\n1");
    assert_eq!(sanitize("```select\n1```"), "select\n1");
}

#[test]
fn test_sanitize_same_line_sql_tag() {
    assert_eq!(sanitize("```sql SELECT 1```"), "SELECT 1");
}

#[test]
fn test_sanitize_plain_text_is_only_trimmed() {
    assert_eq!(sanitize("  SELECT 1\n\n"), "SELECT 1");
    assert_eq!(sanitize(""), "");
}

#[test]
fn test_sanitize_leading_fence_only() {
    assert_eq!(sanitize("```sql\nSELECT 1"), "SELECT 1");
}

#[test]
fn test_sanitize_trailing_fence_only() {
    assert_eq!(sanitize("SELECT 1\n```"), "SELECT 1");
}

#[test]
fn test_sanitize_is_idempotent() {
    let inputs = [
        "```sql\nSELECT 1\n```",
        "``````sql\nSELECT 1\n``````",
        "```\n```sql\nSELECT 1\n```\n```",
        "  SELECT name FROM users WHERE note = '```'  ",
        "```",
        "``` ```",
        "```sql",
        "plain text",
        "",
    ];

    for input in inputs {
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
    }
}
