//! SQL query validation and identifier sanitization.
//!
//! The validator is a lexical screen, not a parser: comments are stripped,
//! then the remaining text is scanned for a fixed denylist of write/DDL
//! keywords on word boundaries. It exists as a fast reject ahead of the
//! authoritative guard, the read-only transaction every statement runs in
//! (see [`crate::db::DatabasePool::execute_readonly`]).

use crate::error::{DbError, DbResult};
use tracing::{debug, warn};

/// Keywords that indicate write, DDL, privilege, or procedural operations.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
    "EXECUTE", "CALL", "COPY",
];

/// Remove SQL comments from a query.
///
/// Strips `--` line comments and non-greedy `/* ... */` block comments
/// (which may span newlines), so keywords hidden in comments can neither
/// evade nor falsely trigger detection.
pub fn strip_comments(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '-' && chars.peek() == Some(&'-') {
            chars.next();
            // Skip to end of line; the newline itself is kept.
            while let Some(&next) = chars.peek() {
                if next == '\n' {
                    break;
                }
                chars.next();
            }
        } else if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            // Skip to the first closing */; an unterminated comment
            // swallows the rest of the input.
            let mut prev = '\0';
            for next in chars.by_ref() {
                if prev == '*' && next == '/' {
                    break;
                }
                prev = next;
            }
        } else {
            out.push(c);
        }
    }

    out
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Check whether `text` contains `keyword` as a whole word,
/// case-insensitively. Substrings inside longer identifiers
/// (e.g. a column named `inserted_at`) do not match.
fn contains_keyword(text: &str, keyword: &str) -> bool {
    let haystack = text.to_ascii_uppercase();
    let bytes = haystack.as_bytes();
    let mut start = 0;

    while let Some(pos) = haystack[start..].find(keyword) {
        let begin = start + pos;
        let end = begin + keyword.len();
        let bounded_left = begin == 0 || !is_word_byte(bytes[begin - 1]);
        let bounded_right = end >= bytes.len() || !is_word_byte(bytes[end]);
        if bounded_left && bounded_right {
            return true;
        }
        start = begin + 1;
    }

    false
}

/// Validate that a query is safe for read-only execution.
///
/// Rejects empty input and any statement containing a denylisted keyword
/// outside of comments, naming the offending keyword in the error.
pub fn validate_query(query: &str) -> DbResult<()> {
    if query.trim().is_empty() {
        return Err(DbError::validation("query cannot be empty"));
    }

    let cleaned = strip_comments(query);

    for keyword in FORBIDDEN_KEYWORDS {
        if contains_keyword(&cleaned, keyword) {
            warn!(keyword, "Query validation failed: forbidden keyword detected");
            return Err(DbError::validation(format!(
                "query contains forbidden keyword: {keyword}. \
                 Only SELECT queries and read-only operations are allowed"
            )));
        }
    }

    debug!("Query validation passed");
    Ok(())
}

/// Sanitize a table or schema identifier for direct interpolation into
/// generated SQL text.
///
/// Catalog queries interpolate these names into SQL literals, so only
/// `[A-Za-z0-9_.]` is accepted; anything else, including quoting
/// characters, is rejected.
pub fn sanitize_identifier(identifier: &str) -> DbResult<&str> {
    if identifier.is_empty() {
        return Err(DbError::validation("identifier cannot be empty"));
    }

    if identifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        Ok(identifier)
    } else {
        Err(DbError::validation(format!(
            "invalid identifier '{identifier}'. \
             Only alphanumeric characters, underscores, and dots are allowed"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // strip_comments
    // =========================================================================

    #[test]
    fn test_strip_line_comment() {
        let cleaned = strip_comments("SELECT 1 -- trailing note\nFROM t");
        assert_eq!(cleaned, "SELECT 1 \nFROM t");
    }

    #[test]
    fn test_strip_block_comment() {
        let cleaned = strip_comments("SELECT /* hidden */ 1");
        assert_eq!(cleaned, "SELECT  1");
    }

    #[test]
    fn test_strip_block_comment_spanning_newlines() {
        let cleaned = strip_comments("SELECT 1 /* first\nsecond\nthird */ FROM t");
        assert_eq!(cleaned, "SELECT 1  FROM t");
    }

    #[test]
    fn test_strip_block_comment_non_greedy() {
        // Only up to the first closing marker is removed.
        let cleaned = strip_comments("SELECT /* a */ 1 /* b */ , 2");
        assert_eq!(cleaned, "SELECT  1  , 2");
    }

    #[test]
    fn test_strip_unterminated_block_comment() {
        let cleaned = strip_comments("SELECT 1 /* never closed");
        assert_eq!(cleaned, "SELECT 1 ");
    }

    // =========================================================================
    // validate_query
    // =========================================================================

    #[test]
    fn test_validate_allows_select() {
        assert!(validate_query("SELECT * FROM users").is_ok());
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(validate_query("").is_err());
        assert!(validate_query("   \n\t ").is_err());
    }

    #[test]
    fn test_validate_rejects_each_forbidden_keyword() {
        for keyword in FORBIDDEN_KEYWORDS {
            let query = format!("{keyword} something");
            let err = validate_query(&query).unwrap_err();
            assert!(
                err.to_string().contains(keyword),
                "error for {keyword} should name the keyword: {err}"
            );
        }
    }

    #[test]
    fn test_validate_case_insensitive() {
        assert!(validate_query("delete from users").is_err());
        assert!(validate_query("DeLeTe FROM users").is_err());
    }

    #[test]
    fn test_validate_keyword_in_comment_allowed() {
        assert!(validate_query("SELECT 1 -- DELETE FROM users").is_ok());
        assert!(validate_query("SELECT 1 /* DROP TABLE users */").is_ok());
        assert!(validate_query("SELECT 1 /* INSERT\nINTO t */ FROM x").is_ok());
    }

    #[test]
    fn test_validate_keyword_outside_comment_still_rejected() {
        assert!(validate_query("/* harmless */ DELETE FROM users").is_err());
    }

    #[test]
    fn test_validate_substring_identifier_allowed() {
        // Keywords embedded in longer identifiers must not false-positive.
        assert!(validate_query("SELECT inserted_at FROM audit").is_ok());
        assert!(validate_query("SELECT updated_by, created_on FROM t").is_ok());
        assert!(validate_query("SELECT * FROM deleted_records").is_ok());
    }

    #[test]
    fn test_validate_keyword_with_punctuation_boundary_rejected() {
        assert!(validate_query("SELECT 1;DROP TABLE users").is_err());
        assert!(validate_query("SELECT 1; DELETE FROM t;").is_err());
    }

    #[test]
    fn test_validate_with_clause_allowed() {
        let query = "WITH recent AS (SELECT * FROM events WHERE ts > now() - interval '1 day') \
                     SELECT count(*) FROM recent";
        assert!(validate_query(query).is_ok());
    }

    // =========================================================================
    // sanitize_identifier
    // =========================================================================

    #[test]
    fn test_sanitize_accepts_simple_names() {
        assert_eq!(sanitize_identifier("users").unwrap(), "users");
        assert_eq!(sanitize_identifier("my_table_2").unwrap(), "my_table_2");
        assert_eq!(sanitize_identifier("public.users").unwrap(), "public.users");
    }

    #[test]
    fn test_sanitize_rejects_empty() {
        assert!(sanitize_identifier("").is_err());
    }

    #[test]
    fn test_sanitize_rejects_quoting_characters() {
        assert!(sanitize_identifier("users'; DROP TABLE users; --").is_err());
        assert!(sanitize_identifier("users\"").is_err());
        assert!(sanitize_identifier("users`").is_err());
    }

    #[test]
    fn test_sanitize_rejects_whitespace_and_symbols() {
        assert!(sanitize_identifier("my table").is_err());
        assert!(sanitize_identifier("users;").is_err());
        assert!(sanitize_identifier("tbl-name").is_err());
        assert!(sanitize_identifier("schéma").is_err());
    }
}
