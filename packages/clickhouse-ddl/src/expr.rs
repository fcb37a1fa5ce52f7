//! Expression rendering for DDL fragments.
//!
//! Every structural argument of an engine (date column, ordering key terms,
//! sampling expression, ...) is an [`Expr`]. Plain strings are promoted to
//! column references through `From<&str>`, so callers can mix identifiers and
//! built expressions freely. Free-form SQL goes through [`Expr::parse`], which
//! delegates to `sqlparser` with the ClickHouse dialect.

use std::fmt;

use itertools::Itertools;
use sqlparser::ast;
use sqlparser::dialect::ClickHouseDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;

use crate::errors::{quote_identifier, quote_string, ClickhouseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    UInt(u64),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{i}"),
            Literal::UInt(u) => write!(f, "{u}"),
            Literal::String(s) => write!(f, "{}", quote_string(s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Column(String),
    Literal(Literal),
    Function { name: String, args: Vec<Expr> },
    Tuple(Vec<Expr>),
    /// An expression parsed by sqlparser, rendered through its `Display`.
    Sql(ast::Expr),
}

impl Expr {
    /// Parses a single ClickHouse expression.
    ///
    /// A lone identifier comes back as [`Expr::Column`] so that `"date"` and
    /// `col("date")` are indistinguishable downstream.
    pub fn parse(sql: &str) -> Result<Self, ClickhouseError> {
        let invalid = |reason: String| ClickhouseError::InvalidExpression {
            expression: sql.to_string(),
            reason,
        };

        if sql.trim().is_empty() {
            return Err(invalid("expression is empty".to_string()));
        }

        let dialect = ClickHouseDialect {};
        let mut parser = Parser::new(&dialect)
            .try_with_sql(sql)
            .map_err(|e| invalid(e.to_string()))?;
        let parsed = parser.parse_expr().map_err(|e| invalid(e.to_string()))?;

        let next = parser.peek_token();
        if next.token != Token::EOF {
            return Err(invalid(format!("unexpected trailing token {}", next.token)));
        }

        Ok(Expr::from(parsed))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{}", quote_identifier(name)),
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Function { name, args } => write!(f, "{}({})", name, args.iter().join(", ")),
            Expr::Tuple(items) if items.is_empty() => write!(f, "tuple()"),
            Expr::Tuple(items) => write!(f, "({})", items.iter().join(", ")),
            Expr::Sql(expr) => write!(f, "{expr}"),
        }
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::Column(name.to_string())
    }
}

impl From<String> for Expr {
    fn from(name: String) -> Self {
        Expr::Column(name)
    }
}

impl From<&String> for Expr {
    fn from(name: &String) -> Self {
        Expr::Column(name.clone())
    }
}

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        Expr::Literal(literal)
    }
}

impl From<ast::Expr> for Expr {
    fn from(expr: ast::Expr) -> Self {
        match expr {
            ast::Expr::Identifier(ident) => Expr::Column(ident.value),
            other => Expr::Sql(other),
        }
    }
}

pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

pub fn func<I, E>(name: impl Into<String>, args: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    Expr::Function {
        name: name.into(),
        args: args.into_iter().map(Into::into).collect(),
    }
}

pub fn tuple<I, E>(items: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    Expr::Tuple(items.into_iter().map(Into::into).collect())
}

pub fn lit_int(value: i64) -> Expr {
    Expr::Literal(Literal::Int(value))
}

pub fn lit_str(value: impl Into<String>) -> Expr {
    Expr::Literal(Literal::String(value.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_rendering() {
        assert_eq!(col("date").to_string(), "date");
        assert_eq!(col("event date").to_string(), "`event date`");
    }

    #[test]
    fn test_string_promotes_to_column() {
        assert_eq!(Expr::from("x"), col("x"));
        assert_eq!(Expr::from("x".to_string()).to_string(), col("x").to_string());
    }

    #[test]
    fn test_function_rendering() {
        assert_eq!(func("intHash32", ["x"]).to_string(), "intHash32(x)");
        assert_eq!(
            func("cityHash64", [col("a"), func("toDate", ["b"])]).to_string(),
            "cityHash64(a, toDate(b))"
        );
        assert_eq!(func("now", Vec::<Expr>::new()).to_string(), "now()");
    }

    #[test]
    fn test_tuple_rendering() {
        assert_eq!(tuple(["date", "x"]).to_string(), "(date, x)");
        assert_eq!(tuple(Vec::<Expr>::new()).to_string(), "tuple()");
    }

    #[test]
    fn test_literal_rendering() {
        assert_eq!(lit_int(-3).to_string(), "-3");
        assert_eq!(Expr::from(Literal::UInt(8192)).to_string(), "8192");
        assert_eq!(lit_str("it's").to_string(), "'it\\'s'");
    }

    #[test]
    fn test_parse_identifier_is_column() {
        let parsed = Expr::parse("date").unwrap();
        assert!(matches!(parsed, Expr::Column(_)));
        assert_eq!(parsed, col("date"));
    }

    #[test]
    fn test_parse_function_matches_builder() {
        let parsed = Expr::parse("intHash32(x)").unwrap();
        assert_eq!(parsed.to_string(), func("intHash32", ["x"]).to_string());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Expr::parse(""),
            Err(ClickhouseError::InvalidExpression { .. })
        ));
        assert!(matches!(
            Expr::parse("intHash32(x"),
            Err(ClickhouseError::InvalidExpression { .. })
        ));
        assert!(matches!(
            Expr::parse("a b c"),
            Err(ClickhouseError::InvalidExpression { .. })
        ));
    }
}
