//! # ClickHouse Type Parser
//!
//! Parses ClickHouse column type strings such as `Array(Nullable(String))` or
//! `DateTime64(3, 'UTC')` into [`ClickHouseColumnType`]. Types are lexed with
//! `logos` and parsed by recursive descent; every parameterized type takes an
//! exact argument list, so extra or missing arguments are errors.

use std::fmt;

use logos::Logos;
use thiserror::Error;

use crate::model::{ClickHouseColumnType, ClickHouseFloat, ClickHouseInt};

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum TypeParseError {
    #[error("Unexpected character at position {position}")]
    LexerError { position: usize },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Invalid parameter in {type_name}: {message}")]
    InvalidParameter { type_name: String, message: String },

    #[error("Unsupported type: {type_name}")]
    UnsupportedType { type_name: String },
}

/// Unescapes the body of a single-quoted literal.
fn string_literal(lex: &mut logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    let content = &slice[1..slice.len() - 1];
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('\\') => result.push('\\'),
                Some('\'') => result.push('\''),
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => break,
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Token {
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"'([^'\\]|\\.)*'", string_literal)]
    StringLiteral(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    NumberLiteral(u64),

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token(",")]
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Identifier(s) => write!(f, "identifier '{s}'"),
            Token::StringLiteral(s) => write!(f, "string '{s}'"),
            Token::NumberLiteral(n) => write!(f, "number {n}"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, TypeParseError> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push(token),
            Err(_) => {
                return Err(TypeParseError::LexerError {
                    position: lexer.span().start,
                })
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    current_pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current_pos: 0,
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.current_pos)
    }

    fn found(&self) -> String {
        self.current_token()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "end of input".to_string())
    }

    fn unexpected(&self, expected: &str) -> TypeParseError {
        TypeParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.found(),
        }
    }

    fn consume(&mut self, expected: &Token) -> Result<(), TypeParseError> {
        if self.current_token() == Some(expected) {
            self.current_pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn consume_if(&mut self, expected: &Token) -> bool {
        let matched = self.current_token() == Some(expected);
        if matched {
            self.current_pos += 1;
        }
        matched
    }

    fn parse(&mut self) -> Result<ClickHouseColumnType, TypeParseError> {
        let column_type = self.parse_type()?;
        match self.current_token() {
            None => Ok(column_type),
            Some(_) => Err(self.unexpected("end of input")),
        }
    }

    fn parse_type(&mut self) -> Result<ClickHouseColumnType, TypeParseError> {
        let name = match self.current_token() {
            Some(Token::Identifier(name)) => name.clone(),
            _ => return Err(self.unexpected("type name")),
        };
        self.current_pos += 1;

        let column_type = match name.as_str() {
            "String" => ClickHouseColumnType::String,
            "Bool" | "Boolean" => ClickHouseColumnType::Boolean,
            "Int8" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::Int8),
            "Int16" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::Int16),
            "Int32" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::Int32),
            "Int64" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::Int64),
            "Int128" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::Int128),
            "Int256" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::Int256),
            "UInt8" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::UInt8),
            "UInt16" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::UInt16),
            "UInt32" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::UInt32),
            "UInt64" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::UInt64),
            "UInt128" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::UInt128),
            "UInt256" => ClickHouseColumnType::ClickhouseInt(ClickHouseInt::UInt256),
            "Float32" => ClickHouseColumnType::ClickhouseFloat(ClickHouseFloat::Float32),
            "Float64" => ClickHouseColumnType::ClickhouseFloat(ClickHouseFloat::Float64),
            "Date" => ClickHouseColumnType::Date,
            "Date32" => ClickHouseColumnType::Date32,
            "UUID" => ClickHouseColumnType::Uuid,
            "IPv4" => ClickHouseColumnType::IpV4,
            "IPv6" => ClickHouseColumnType::IpV6,
            "Decimal" => self.parse_decimal()?,
            "FixedString" => {
                self.consume(&Token::LeftParen)?;
                let length = self.parse_number("FixedString", "length")?;
                self.consume(&Token::RightParen)?;
                let length = u32::try_from(length).map_err(|_| TypeParseError::InvalidParameter {
                    type_name: "FixedString".to_string(),
                    message: format!("length {length} is out of range"),
                })?;
                ClickHouseColumnType::FixedString(length)
            }
            "DateTime" => self.parse_datetime()?,
            "DateTime64" => self.parse_datetime64()?,
            "Array" => ClickHouseColumnType::Array(Box::new(self.parse_wrapped()?)),
            "Nullable" => ClickHouseColumnType::Nullable(Box::new(self.parse_wrapped()?)),
            "LowCardinality" => {
                ClickHouseColumnType::LowCardinality(Box::new(self.parse_wrapped()?))
            }
            "Map" => {
                self.consume(&Token::LeftParen)?;
                let key = self.parse_type()?;
                self.consume(&Token::Comma)?;
                let value = self.parse_type()?;
                self.consume(&Token::RightParen)?;
                ClickHouseColumnType::Map(Box::new(key), Box::new(value))
            }
            _ => return Err(TypeParseError::UnsupportedType { type_name: name }),
        };

        Ok(column_type)
    }

    fn parse_wrapped(&mut self) -> Result<ClickHouseColumnType, TypeParseError> {
        self.consume(&Token::LeftParen)?;
        let inner = self.parse_type()?;
        self.consume(&Token::RightParen)?;
        Ok(inner)
    }

    fn parse_number(&mut self, type_name: &str, what: &str) -> Result<u64, TypeParseError> {
        match self.current_token() {
            Some(Token::NumberLiteral(n)) => {
                let n = *n;
                self.current_pos += 1;
                Ok(n)
            }
            _ => Err(self.unexpected(&format!("number literal for {type_name} {what}"))),
        }
    }

    fn parse_u8(&mut self, type_name: &str, what: &str) -> Result<u8, TypeParseError> {
        let n = self.parse_number(type_name, what)?;
        u8::try_from(n).map_err(|_| TypeParseError::InvalidParameter {
            type_name: type_name.to_string(),
            message: format!("{what} {n} is out of range"),
        })
    }

    fn parse_timezone(&mut self) -> Result<String, TypeParseError> {
        match self.current_token() {
            Some(Token::StringLiteral(tz)) => {
                let tz = tz.clone();
                self.current_pos += 1;
                Ok(tz)
            }
            _ => Err(self.unexpected("string literal for timezone")),
        }
    }

    /// `Decimal(P)` or `Decimal(P, S)`; a missing scale is 0.
    fn parse_decimal(&mut self) -> Result<ClickHouseColumnType, TypeParseError> {
        self.consume(&Token::LeftParen)?;
        let precision = self.parse_u8("Decimal", "precision")?;
        let scale = if self.consume_if(&Token::Comma) {
            self.parse_u8("Decimal", "scale")?
        } else {
            0
        };
        self.consume(&Token::RightParen)?;

        if scale > precision {
            return Err(TypeParseError::InvalidParameter {
                type_name: "Decimal".to_string(),
                message: format!("scale {scale} exceeds precision {precision}"),
            });
        }

        Ok(ClickHouseColumnType::Decimal { precision, scale })
    }

    fn parse_datetime(&mut self) -> Result<ClickHouseColumnType, TypeParseError> {
        let timezone = if self.consume_if(&Token::LeftParen) {
            let tz = self.parse_timezone()?;
            self.consume(&Token::RightParen)?;
            Some(tz)
        } else {
            None
        };
        Ok(ClickHouseColumnType::DateTime { timezone })
    }

    fn parse_datetime64(&mut self) -> Result<ClickHouseColumnType, TypeParseError> {
        self.consume(&Token::LeftParen)?;
        let precision = self.parse_u8("DateTime64", "precision")?;
        let timezone = if self.consume_if(&Token::Comma) {
            Some(self.parse_timezone()?)
        } else {
            None
        };
        self.consume(&Token::RightParen)?;
        Ok(ClickHouseColumnType::DateTime64 {
            precision,
            timezone,
        })
    }
}

pub fn parse_clickhouse_type(input: &str) -> Result<ClickHouseColumnType, TypeParseError> {
    let tokens = tokenize(input)?;
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_display() {
        for type_str in [
            "String",
            "Int32",
            "UInt64",
            "Float64",
            "Date",
            "DateTime",
            "DateTime('Europe/Paris')",
            "DateTime64(3)",
            "DateTime64(3, 'UTC')",
            "Decimal(10, 2)",
            "FixedString(16)",
            "UUID",
            "Array(Nullable(String))",
            "LowCardinality(String)",
            "Map(String, Array(Int64))",
        ] {
            let parsed = parse_clickhouse_type(type_str)
                .unwrap_or_else(|e| panic!("failed to parse {type_str}: {e}"));
            assert_eq!(parsed.to_string(), type_str);
        }
    }

    #[test]
    fn test_aliases_and_defaults() {
        assert_eq!(
            parse_clickhouse_type("Boolean").unwrap(),
            ClickHouseColumnType::Boolean
        );
        assert_eq!(
            parse_clickhouse_type("Decimal(9)").unwrap(),
            ClickHouseColumnType::Decimal {
                precision: 9,
                scale: 0
            }
        );
        assert_eq!(
            parse_clickhouse_type(" Map( String ,UInt8 ) ").unwrap().to_string(),
            "Map(String, UInt8)"
        );
    }

    #[test]
    fn test_datetime64_keeps_timezone() {
        assert_eq!(
            parse_clickhouse_type("DateTime64(3, 'UTC')").unwrap(),
            ClickHouseColumnType::DateTime64 {
                precision: 3,
                timezone: Some("UTC".to_string())
            }
        );
    }

    #[test]
    fn test_escaped_quote_in_timezone() {
        let parsed = parse_clickhouse_type(r"DateTime('it\'s, odd')").unwrap();
        assert_eq!(
            parsed,
            ClickHouseColumnType::DateTime {
                timezone: Some("it's, odd".to_string())
            }
        );
        assert_eq!(parsed.to_string(), r"DateTime('it\'s, odd')");
    }

    #[test]
    fn test_extra_arguments_are_rejected() {
        assert!(matches!(
            parse_clickhouse_type("Decimal(10, 2, 99)"),
            Err(TypeParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_clickhouse_type("Map(String, Int8, Int8)"),
            Err(TypeParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_clickhouse_type("Array(String, String)"),
            Err(TypeParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_malformed_types() {
        assert!(matches!(
            parse_clickhouse_type("Varchar"),
            Err(TypeParseError::UnsupportedType { .. })
        ));
        assert!(parse_clickhouse_type("Array(Varchar)").is_err());
        assert!(parse_clickhouse_type("Map(String)").is_err());
        assert!(parse_clickhouse_type("Nullable(String").is_err());
        assert!(parse_clickhouse_type("String String").is_err());
        assert!(parse_clickhouse_type("").is_err());
        assert!(matches!(
            parse_clickhouse_type("DateTime('UTC"),
            Err(TypeParseError::LexerError { .. })
        ));
        assert!(matches!(
            parse_clickhouse_type("Decimal(2, 5)"),
            Err(TypeParseError::InvalidParameter { .. })
        ));
        assert!(matches!(
            parse_clickhouse_type("DateTime64(300)"),
            Err(TypeParseError::InvalidParameter { .. })
        ));
    }
}
