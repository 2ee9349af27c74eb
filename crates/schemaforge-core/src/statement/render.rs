//! CREATE TABLE synthesis from the table model.

use super::CreateStatement;
use crate::types::{DatabaseKind, TableModel};

/// Render `table` as a CREATE TABLE statement plus its unique indexes.
///
/// References are taken from the model's foreign-key edges, so the result
/// never needs to be re-analyzed. Nullable columns carry an explicit `NULL`
/// except on DB2, which rejects the keyword in column definitions.
pub fn render_create(table: &TableModel, kind: DatabaseKind) -> CreateStatement {
    let explicit_null = kind != DatabaseKind::Db2;
    let mut definitions: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let nullability = if column.required || column.primary_key {
                " NOT NULL"
            } else if explicit_null {
                " NULL"
            } else {
                ""
            };
            format!("{} {}{nullability}", column.name, column.type_name)
        })
        .collect();

    if !table.primary_key.is_empty() {
        definitions.push(format!("PRIMARY KEY({})", table.primary_key.join(", ")));
    }

    for edge in &table.foreign_keys {
        definitions.push(format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            edge.source_column, edge.target_table, edge.target_column
        ));
    }

    let text = format!("CREATE TABLE {} ({})", table.name, definitions.join(", "));

    let index_statements = table
        .indexes
        .iter()
        .map(|index| {
            let unique = if index.unique { "UNIQUE " } else { "" };
            format!(
                "CREATE {unique}INDEX {} ON {}({})",
                index.name,
                table.name,
                index.columns.join(", ")
            )
        })
        .collect();

    CreateStatement::from_parts(
        table.name.clone(),
        text,
        table.referenced_tables(),
        index_statements,
    )
}
