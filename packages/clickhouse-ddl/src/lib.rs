//! # ClickHouse DDL
//!
//! Generates `CREATE TABLE` statements for ClickHouse tables that use the
//! legacy MergeTree-family engine syntax:
//!
//! ```text
//! CREATE TABLE t1 (date Date, x Int32, y String) ENGINE = MergeTree(date, (date, x), 8192)
//! ```
//!
//! Tables are built either in code with [`ClickHouseTable::builder`] or from
//! TOML definitions with [`config::SchemaDefinition`]. The engine is one of the
//! table's options and is only required once DDL is generated.
//!
//! ```
//! use clickhouse_ddl::{create_table_query, ClickHouseColumn, ClickHouseColumnType, ClickHouseTable, MergeTreeParams};
//!
//! let table = ClickHouseTable::builder("t1")
//!     .column(ClickHouseColumn::new("date", ClickHouseColumnType::Date))
//!     .option(MergeTreeParams::new("date", ["date"]).with_index_granularity(4096).into_engine())
//!     .build();
//!
//! assert_eq!(
//!     create_table_query(&table).unwrap(),
//!     "CREATE TABLE t1 (date Date) ENGINE = MergeTree(date, (date), 4096)"
//! );
//! ```

pub mod config;
pub mod engines;
pub mod errors;
pub mod expr;
pub mod model;
pub mod queries;
pub mod type_parser;

pub use engines::{ArgShape, Engine, MergeTreeParams, DEFAULT_INDEX_GRANULARITY};
pub use errors::ClickhouseError;
pub use expr::{col, func, lit_int, lit_str, tuple, Expr, Literal};
pub use model::{
    ClickHouseColumn, ClickHouseColumnType, ClickHouseFloat, ClickHouseInt, ClickHouseTable,
    TableBuilder, TableOption,
};
pub use queries::{compile_engine_clause, create_table_query, drop_table_query};
pub use type_parser::{parse_clickhouse_type, TypeParseError};
