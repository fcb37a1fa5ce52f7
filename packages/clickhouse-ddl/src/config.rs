//! # Table definitions
//! Declarative table definitions loaded from TOML.
//!
//! A definition either names its table directly (`name = "t1"`) or names a
//! model (`model = "TestTable"`), in which case the table name is the model
//! name in snake_case. Both forms produce the same [`ClickHouseTable`].
//!
//! ```toml
//! [[tables]]
//! model = "TestTable"
//! columns = [
//!   { name = "date", type = "Date", primary_key = true },
//!   { name = "x", type = "Int32" },
//! ]
//!
//! [tables.engine]
//! date_column = "date"
//! key = ["date", "intHash32(x)"]
//! sampling = "intHash32(x)"
//! ```
//!
//! Expression-valued fields are parsed with [`Expr::parse`]. A definition
//! without an engine loads fine and only fails once DDL is generated for it.

use std::path::{Path, PathBuf};

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

use crate::engines::{Engine, MergeTreeParams, DEFAULT_INDEX_GRANULARITY};
use crate::errors::ClickhouseError;
use crate::expr::Expr;
use crate::model::{ClickHouseColumn, ClickHouseColumnType, ClickHouseTable, TableOption};
use crate::type_parser::TypeParseError;

fn default_index_granularity() -> u64 {
    DEFAULT_INDEX_GRANULARITY
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DefinitionError {
    #[error("Failed to read table definitions from {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse table definitions: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Table definition needs either `name` or `model`")]
    MissingName,
    #[error("Invalid column type '{type_name}' for column '{column}': {source}")]
    InvalidColumnType {
        column: String,
        type_name: String,
        source: TypeParseError,
    },
    #[error("{engine} on table '{table}' requires `{field}`")]
    MissingEngineParameter {
        table: String,
        engine: &'static str,
        field: &'static str,
    },
    #[error(transparent)]
    Expression(#[from] ClickhouseError),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TableDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub engine: Option<EngineDefinition>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineKind {
    #[default]
    MergeTree,
    AggregatingMergeTree,
    CollapsingMergeTree,
    SummingMergeTree,
    ReplacingMergeTree,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EngineDefinition {
    #[serde(default)]
    pub kind: EngineKind,
    pub date_column: String,
    #[serde(default)]
    pub key: Vec<String>,
    #[serde(default)]
    pub sampling: Option<String>,
    #[serde(default = "default_index_granularity")]
    pub index_granularity: u64,
    /// CollapsingMergeTree only
    #[serde(default)]
    pub sign_column: Option<String>,
    /// SummingMergeTree only
    #[serde(default)]
    pub summing_columns: Vec<String>,
    /// ReplacingMergeTree only
    #[serde(default)]
    pub version_column: Option<String>,
}

impl SchemaDefinition {
    pub fn from_toml_str(content: &str) -> Result<Self, DefinitionError> {
        let schema: SchemaDefinition = toml::from_str(content)?;
        tracing::debug!("Loaded {} table definitions", schema.tables.len());
        Ok(schema)
    }

    pub fn from_path(path: &Path) -> Result<Self, DefinitionError> {
        let content = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn into_tables(self) -> Result<Vec<ClickHouseTable>, DefinitionError> {
        self.tables
            .into_iter()
            .map(TableDefinition::into_table)
            .collect()
    }
}

impl TableDefinition {
    pub fn table_name(&self) -> Result<String, DefinitionError> {
        match (&self.name, &self.model) {
            (Some(name), _) => Ok(name.clone()),
            (None, Some(model)) => Ok(model.to_case(Case::Snake)),
            (None, None) => Err(DefinitionError::MissingName),
        }
    }

    pub fn into_table(self) -> Result<ClickHouseTable, DefinitionError> {
        let name = self.table_name()?;
        let mut builder = ClickHouseTable::builder(name.clone());

        if let Some(database) = self.database {
            builder = builder.database(database);
        }
        for column in self.columns {
            builder = builder.column(column.into_column()?);
        }
        if let Some(comment) = self.comment {
            builder = builder.option(TableOption::Comment(comment));
        }
        if let Some(engine) = self.engine {
            builder = builder.option(engine.into_engine(&name)?);
        } else {
            tracing::debug!("Table definition {} has no engine", name);
        }

        Ok(builder.build())
    }
}

impl ColumnDefinition {
    pub fn into_column(self) -> Result<ClickHouseColumn, DefinitionError> {
        let column_type = ClickHouseColumnType::parse(&self.column_type).map_err(|source| {
            DefinitionError::InvalidColumnType {
                column: self.name.clone(),
                type_name: self.column_type.clone(),
                source,
            }
        })?;

        let mut column = ClickHouseColumn::new(self.name, column_type);
        column.primary_key = self.primary_key;
        column.comment = self.comment;
        if let Some(default) = self.default {
            column.default = Some(Expr::parse(&default)?);
        }
        Ok(column)
    }
}

impl EngineDefinition {
    pub fn into_engine(self, table: &str) -> Result<Engine, DefinitionError> {
        let key = parse_all(&self.key)?;
        let mut params = MergeTreeParams::new(Expr::parse(&self.date_column)?, key)
            .with_index_granularity(self.index_granularity);
        if let Some(sampling) = &self.sampling {
            params = params.with_sampling(Expr::parse(sampling)?);
        }

        let engine = match self.kind {
            EngineKind::MergeTree => Engine::MergeTree(params),
            EngineKind::AggregatingMergeTree => Engine::AggregatingMergeTree(params),
            EngineKind::CollapsingMergeTree => {
                let sign = self.sign_column.as_deref().ok_or_else(|| {
                    DefinitionError::MissingEngineParameter {
                        table: table.to_string(),
                        engine: "CollapsingMergeTree",
                        field: "sign_column",
                    }
                })?;
                Engine::CollapsingMergeTree {
                    params,
                    sign_column: Expr::parse(sign)?,
                }
            }
            EngineKind::SummingMergeTree => Engine::SummingMergeTree {
                params,
                summing_columns: parse_all(&self.summing_columns)?,
            },
            EngineKind::ReplacingMergeTree => Engine::ReplacingMergeTree {
                params,
                version_column: self.version_column.as_deref().map(Expr::parse).transpose()?,
            },
        };

        Ok(engine)
    }
}

fn parse_all(exprs: &[String]) -> Result<Vec<Expr>, ClickhouseError> {
    exprs.iter().map(|e| Expr::parse(e)).collect()
}
