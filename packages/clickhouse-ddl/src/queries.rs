use handlebars::{no_escape, Handlebars};
use serde_json::{json, Value};

use crate::errors::{quote_identifier, quote_string, ClickhouseError};
use crate::model::{ClickHouseColumn, ClickHouseTable};

static CREATE_TABLE_TEMPLATE: &str = "CREATE TABLE {{table_name}} ({{#each fields}}{{field_name}} {{field_type}}{{#if field_default}} DEFAULT {{field_default}}{{/if}}{{#if field_comment}} COMMENT {{field_comment}}{{/if}}{{#unless @last}}, {{/unless}}{{/each}}) {{engine}}{{#if table_comment}} COMMENT {{table_comment}}{{/if}}";

static DROP_TABLE_TEMPLATE: &str = "DROP TABLE {{table_name}}";

/// Renders the `ENGINE = ...` clause for a table.
///
/// Fails with [`ClickhouseError::MissingEngine`] when no engine has been
/// attached to the table by the time DDL is requested.
pub fn compile_engine_clause(table: &ClickHouseTable) -> Result<String, ClickhouseError> {
    let engine = table
        .engine()
        .ok_or_else(|| ClickhouseError::MissingEngine {
            table: table.name.clone(),
        })?;

    let clause = format!("ENGINE = {engine}");
    tracing::debug!("Compiled engine clause for table {}: {}", table.name, clause);
    Ok(clause)
}

pub fn create_table_query(table: &ClickHouseTable) -> Result<String, ClickhouseError> {
    // Compiled first so a missing engine never yields partial output
    let engine = compile_engine_clause(table)?;

    let mut reg = Handlebars::new();
    reg.register_escape_fn(no_escape);

    let context = json!({
        "table_name": qualified_table_name(table),
        "fields": builds_field_context(&table.columns),
        "engine": engine,
        "table_comment": table.comment().map(quote_string),
    });

    Ok(reg.render_template(CREATE_TABLE_TEMPLATE, &context)?)
}

pub fn drop_table_query(table: &ClickHouseTable) -> Result<String, ClickhouseError> {
    let mut reg = Handlebars::new();
    reg.register_escape_fn(no_escape);

    let context = json!({
        "table_name": qualified_table_name(table),
    });

    Ok(reg.render_template(DROP_TABLE_TEMPLATE, &context)?)
}

fn qualified_table_name(table: &ClickHouseTable) -> String {
    match &table.database {
        Some(db) => format!("{}.{}", quote_identifier(db), quote_identifier(&table.name)),
        None => quote_identifier(&table.name).into_owned(),
    }
}

fn builds_field_context(columns: &[ClickHouseColumn]) -> Vec<Value> {
    columns
        .iter()
        .map(|column| {
            json!({
                "field_name": quote_identifier(&column.name),
                "field_type": column.column_type.to_string(),
                "field_default": column.default.as_ref().map(|d| d.to_string()),
                "field_comment": column.comment.as_deref().map(quote_string),
            })
        })
        .collect()
}
