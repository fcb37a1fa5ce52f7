use std::borrow::Cow;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClickhouseError {
    /// Raised at statement generation time, never when the table is declared.
    #[error("No engine for table '{table}'")]
    MissingEngine { table: String },
    #[error("Clickhouse - Invalid expression: '{expression}' - {reason}")]
    InvalidExpression { expression: String, reason: String },
    #[error("Clickhouse - Failed to render query: {0}")]
    QueryRender(#[from] handlebars::RenderError),
}

/// Checks if a string is a valid bare ClickHouse identifier.
///
/// Bare identifiers must:
/// - Be non-empty
/// - Contain only ASCII alphanumeric characters and underscores
/// - Not start with a digit
pub fn is_valid_clickhouse_identifier(name: &str) -> bool {
    match name.chars().next() {
        Some(first) => {
            !first.is_ascii_digit() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Renders an identifier the way ClickHouse expects it in DDL.
///
/// Bare identifiers are emitted as-is; anything else is wrapped in backticks
/// with backticks and backslashes escaped.
pub fn quote_identifier(name: &str) -> Cow<'_, str> {
    if is_valid_clickhouse_identifier(name) {
        Cow::Borrowed(name)
    } else {
        let escaped = name.replace('\\', "\\\\").replace('`', "\\`");
        Cow::Owned(format!("`{escaped}`"))
    }
}

/// Renders a single-quoted ClickHouse string literal.
///
/// Backslashes are escaped before quotes, so a value ending in `\` cannot
/// swallow the closing quote.
pub fn quote_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(is_valid_clickhouse_identifier("date"));
        assert!(is_valid_clickhouse_identifier("_x1"));
        assert!(is_valid_clickhouse_identifier("test_table"));
        assert!(!is_valid_clickhouse_identifier(""));
        assert!(!is_valid_clickhouse_identifier("1abc"));
        assert!(!is_valid_clickhouse_identifier("my-table"));
        assert!(!is_valid_clickhouse_identifier("with space"));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("x"), "x");
        assert_eq!(quote_identifier("my table"), "`my table`");
        assert_eq!(quote_identifier("a`b"), "`a\\`b`");
        assert_eq!(quote_identifier("9lives"), "`9lives`");
    }

    #[test]
    fn test_quote_string() {
        assert_eq!(quote_string("plain"), "'plain'");
        assert_eq!(quote_string("it's"), r"'it\'s'");
        assert_eq!(quote_string(r"C:\dir\"), r"'C:\\dir\\'");
        assert_eq!(quote_string(r"\'"), r"'\\\''");
    }

    #[test]
    fn test_missing_engine_message() {
        let err = ClickhouseError::MissingEngine {
            table: "t1".to_string(),
        };
        assert_eq!(err.to_string(), "No engine for table 't1'");
    }
}
