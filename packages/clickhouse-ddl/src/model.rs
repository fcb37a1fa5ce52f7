use std::fmt;

use crate::engines::Engine;
use crate::errors::quote_string;
use crate::expr::Expr;
use crate::type_parser::{parse_clickhouse_type, TypeParseError};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ClickHouseColumnType {
    String,
    Boolean,
    ClickhouseInt(ClickHouseInt),
    ClickhouseFloat(ClickHouseFloat),
    Decimal { precision: u8, scale: u8 },
    FixedString(u32),
    Date,
    Date32,
    DateTime {
        timezone: Option<String>,
    },
    DateTime64 {
        precision: u8,
        timezone: Option<String>,
    },
    Uuid,
    IpV4,
    IpV6,
    Array(Box<ClickHouseColumnType>),
    Nullable(Box<ClickHouseColumnType>),
    LowCardinality(Box<ClickHouseColumnType>),
    Map(Box<ClickHouseColumnType>, Box<ClickHouseColumnType>),
}

impl fmt::Display for ClickHouseColumnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClickHouseColumnType::String => write!(f, "String"),
            ClickHouseColumnType::Boolean => write!(f, "Bool"),
            ClickHouseColumnType::ClickhouseInt(int) => write!(f, "{int}"),
            ClickHouseColumnType::ClickhouseFloat(float) => write!(f, "{float}"),
            ClickHouseColumnType::Decimal { precision, scale } => {
                write!(f, "Decimal({precision}, {scale})")
            }
            ClickHouseColumnType::FixedString(n) => write!(f, "FixedString({n})"),
            ClickHouseColumnType::Date => write!(f, "Date"),
            ClickHouseColumnType::Date32 => write!(f, "Date32"),
            ClickHouseColumnType::DateTime { timezone: None } => write!(f, "DateTime"),
            ClickHouseColumnType::DateTime { timezone: Some(tz) } => {
                write!(f, "DateTime({})", quote_string(tz))
            }
            ClickHouseColumnType::DateTime64 {
                precision,
                timezone: None,
            } => write!(f, "DateTime64({precision})"),
            ClickHouseColumnType::DateTime64 {
                precision,
                timezone: Some(tz),
            } => write!(f, "DateTime64({precision}, {})", quote_string(tz)),
            ClickHouseColumnType::Uuid => write!(f, "UUID"),
            ClickHouseColumnType::IpV4 => write!(f, "IPv4"),
            ClickHouseColumnType::IpV6 => write!(f, "IPv6"),
            ClickHouseColumnType::Array(inner) => write!(f, "Array({inner})"),
            ClickHouseColumnType::Nullable(inner) => write!(f, "Nullable({inner})"),
            ClickHouseColumnType::LowCardinality(inner) => write!(f, "LowCardinality({inner})"),
            ClickHouseColumnType::Map(key, value) => write!(f, "Map({key}, {value})"),
        }
    }
}

impl ClickHouseColumnType {
    pub fn parse(type_str: &str) -> Result<Self, TypeParseError> {
        parse_clickhouse_type(type_str)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ClickHouseInt {
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    UInt256,
}

impl fmt::Display for ClickHouseInt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ClickHouseFloat {
    Float32,
    Float64,
}

impl fmt::Display for ClickHouseFloat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickHouseColumn {
    pub name: String,
    pub column_type: ClickHouseColumnType,
    /// Metadata only: MergeTree-family engines carry their key in the engine clause.
    pub primary_key: bool,
    pub default: Option<Expr>,
    pub comment: Option<String>,
}

impl ClickHouseColumn {
    pub fn new(name: impl Into<String>, column_type: ClickHouseColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            default: None,
            comment: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn default_expr(mut self, default: impl Into<Expr>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

impl From<&ClickHouseColumn> for Expr {
    fn from(column: &ClickHouseColumn) -> Self {
        Expr::Column(column.name.clone())
    }
}

/// Extra table-level arguments. The engine is one kind among several.
#[derive(Debug, Clone, PartialEq)]
pub enum TableOption {
    Engine(Engine),
    Comment(String),
    /// Free-form metadata carried with the table, never rendered.
    Info { key: String, value: String },
}

impl From<Engine> for TableOption {
    fn from(engine: Engine) -> Self {
        TableOption::Engine(engine)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickHouseTable {
    pub name: String,
    pub database: Option<String>,
    pub columns: Vec<ClickHouseColumn>,
    options: Vec<TableOption>,
}

impl ClickHouseTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database: None,
            columns: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            table: Self::new(name),
        }
    }

    pub fn options(&self) -> &[TableOption] {
        &self.options
    }

    /// Adds an option to the table.
    ///
    /// A table holds at most one engine: attaching an engine drops any engine
    /// attached earlier. Nothing is validated here; a table without an engine
    /// only fails once DDL is requested for it.
    pub fn attach(&mut self, option: impl Into<TableOption>) {
        let option = option.into();
        if let TableOption::Engine(engine) = &option {
            if let Some(previous) = self.engine() {
                tracing::warn!(
                    "Engine {} replaces {} on table {}",
                    engine.name(),
                    previous.name(),
                    self.name
                );
            }
            self.options
                .retain(|existing| !matches!(existing, TableOption::Engine(_)));
        }
        self.options.push(option);
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.options.iter().find_map(|option| match option {
            TableOption::Engine(engine) => Some(engine),
            _ => None,
        })
    }

    pub fn comment(&self) -> Option<&str> {
        self.options.iter().find_map(|option| match option {
            TableOption::Comment(comment) => Some(comment.as_str()),
            _ => None,
        })
    }
}

pub struct TableBuilder {
    table: ClickHouseTable,
}

impl TableBuilder {
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.table.database = Some(database.into());
        self
    }

    pub fn column(mut self, column: ClickHouseColumn) -> Self {
        self.table.columns.push(column);
        self
    }

    pub fn option(mut self, option: impl Into<TableOption>) -> Self {
        self.table.attach(option);
        self
    }

    pub fn build(self) -> ClickHouseTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::MergeTreeParams;

    #[test]
    fn test_engine_is_found_among_other_options() {
        let table = ClickHouseTable::builder("t1")
            .option(TableOption::Comment("events".to_string()))
            .option(MergeTreeParams::new("date", ["date"]).into_engine())
            .option(TableOption::Info {
                key: "owner".to_string(),
                value: "analytics".to_string(),
            })
            .build();

        assert_eq!(table.options().len(), 3);
        assert_eq!(table.engine().map(|e| e.name()), Some("MergeTree"));
        assert_eq!(table.comment(), Some("events"));
    }

    #[test]
    fn test_attaching_engine_replaces_previous() {
        let mut table = ClickHouseTable::new("t1");
        assert!(table.engine().is_none());

        table.attach(MergeTreeParams::new("date", ["date"]).into_engine());
        table.attach(Engine::ReplacingMergeTree {
            params: MergeTreeParams::new("date", ["date"]),
            version_column: None,
        });

        let engines = table
            .options()
            .iter()
            .filter(|o| matches!(o, TableOption::Engine(_)))
            .count();
        assert_eq!(engines, 1);
        assert_eq!(table.engine().map(|e| e.name()), Some("ReplacingMergeTree"));
    }

    #[test]
    fn test_column_reference_from_column() {
        let date = ClickHouseColumn::new("date", ClickHouseColumnType::Date).primary_key();
        assert_eq!(Expr::from(&date), Expr::from("date"));
    }

    #[test]
    fn test_builder_keeps_column_order() {
        let table = ClickHouseTable::builder("t1")
            .database("analytics")
            .column(ClickHouseColumn::new("date", ClickHouseColumnType::Date).primary_key())
            .column(ClickHouseColumn::new(
                "x",
                ClickHouseColumnType::ClickhouseInt(ClickHouseInt::Int32),
            ))
            .build();
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["date", "x"]);
        assert!(table.columns[0].primary_key);
        assert_eq!(table.database.as_deref(), Some("analytics"));
        assert!(table.options().is_empty());
    }

    #[test]
    fn test_parse_reports_reason() {
        assert_eq!(
            ClickHouseColumnType::parse("Decimal(10, 2, 99)")
                .unwrap_err()
                .to_string(),
            "Unexpected token: expected ), found ,"
        );
        assert!(matches!(
            ClickHouseColumnType::parse("Varchar"),
            Err(TypeParseError::UnsupportedType { .. })
        ));
    }
}
