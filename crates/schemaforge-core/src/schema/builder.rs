use super::tracker::{SchemaTracker, TableClaim};
use super::type_names::TypeNameMap;
use crate::error::DdlError;
use crate::statement::{render_create, CreateStatement};
use crate::types::{
    issue_codes, ColumnDescriptor, ColumnModel, DatabaseKind, ForeignKeyEdge, IndexModel, Issue,
    JdbcType, RepositoryDescriptor, SchemaModel, TableDescriptor, TableModel,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Result of modeling one repository.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaBuild {
    /// Cumulative model: the tables passed in plus the ones modeled here.
    pub model: SchemaModel,
    /// Tables modeled by this build, in modeling order.
    pub modeled: Vec<String>,
    pub issues: Vec<Issue>,
}

impl SchemaBuild {
    pub fn modeled_tables(&self) -> impl Iterator<Item = &TableModel> {
        self.modeled.iter().filter_map(|name| self.model.get(name))
    }

    /// CREATE statements for the tables modeled by this build, unordered.
    pub fn create_statements(&self, kind: DatabaseKind) -> Vec<CreateStatement> {
        self.modeled_tables()
            .map(|table| render_create(table, kind))
            .collect()
    }
}

/// Tables claimed by one build. Dropping the set releases every claim, so a
/// build that fails part-way leaves nothing registered; [`ClaimSet::keep`]
/// hands the claims over to the tracker for good.
struct ClaimSet<'a> {
    tracker: &'a SchemaTracker,
    owner: &'a str,
    claimed: Vec<String>,
}

impl<'a> ClaimSet<'a> {
    fn new(tracker: &'a SchemaTracker, owner: &'a str) -> Self {
        Self {
            tracker,
            owner,
            claimed: Vec::new(),
        }
    }

    fn push(&mut self, table: &str) {
        self.claimed.push(table.to_string());
    }

    fn keep(mut self) {
        self.claimed.clear();
    }
}

impl Drop for ClaimSet<'_> {
    fn drop(&mut self) {
        for table in self.claimed.drain(..) {
            debug!(table = %table, owner = self.owner, "releasing claim of failed build");
            self.tracker.release(&table, self.owner);
        }
    }
}

/// Turns repository descriptors into table models.
pub struct SchemaModelBuilder<'a> {
    tracker: &'a SchemaTracker,
    type_names: &'a TypeNameMap,
}

impl<'a> SchemaModelBuilder<'a> {
    pub fn new(tracker: &'a SchemaTracker, type_names: &'a TypeNameMap) -> Self {
        Self {
            tracker,
            type_names,
        }
    }

    /// Model every table of `repository` on top of `existing`.
    ///
    /// Primary tables across all item descriptors are modeled first, then the
    /// remaining tables, so a table that is primary for one item and auxiliary
    /// for another takes its primary shape. Inherited tables are skipped, as
    /// are tables another repository already claimed in the tracker.
    pub fn build(
        &self,
        repository: &RepositoryDescriptor,
        existing: SchemaModel,
    ) -> Result<SchemaBuild, DdlError> {
        let mut build = SchemaBuild {
            model: existing,
            modeled: Vec::new(),
            issues: Vec::new(),
        };
        let mut claims = ClaimSet::new(self.tracker, &repository.name);

        for primary_pass in [true, false] {
            let tables = repository
                .items
                .iter()
                .flat_map(|item| item.tables.iter())
                .filter(|table| table.primary == primary_pass);

            for table in tables {
                if table.inherited {
                    debug!(table = %table.name, "skipping inherited table");
                    continue;
                }
                self.model_table(repository, table, &mut build, &mut claims)?;
            }
        }
        claims.keep();

        info!(
            repository = %repository.name,
            modeled = build.modeled.len(),
            issues = build.issues.len(),
            "schema model built"
        );
        Ok(build)
    }

    fn model_table(
        &self,
        repository: &RepositoryDescriptor,
        descriptor: &TableDescriptor,
        build: &mut SchemaBuild,
        claims: &mut ClaimSet<'_>,
    ) -> Result<(), DdlError> {
        let name = descriptor.name.trim();
        if name.is_empty() {
            return Err(DdlError::ModelBuild {
                table: String::new(),
                message: format!("repository {} declares a table without a name", repository.name),
            });
        }

        if build
            .modeled
            .iter()
            .any(|modeled| modeled.eq_ignore_ascii_case(name))
        {
            debug!(table = name, "table already modeled by this build");
            return Ok(());
        }

        if build.model.get(name).is_some_and(|table| table.existing) {
            debug!(table = name, "table already exists in the database");
            build.issues.push(
                Issue::info(
                    issue_codes::TABLE_EXISTS,
                    format!("Table {name} already exists; it will not be modeled"),
                )
                .with_table(name),
            );
            return Ok(());
        }

        match self.tracker.claim(name, &repository.name) {
            TableClaim::Claimed => claims.push(name),
            TableClaim::AlreadyModeled { owners } => {
                debug!(table = name, owners = ?owners, "table modeled by another repository");
                build.issues.push(
                    Issue::info(
                        issue_codes::SHARED_TABLE,
                        format!(
                            "Table {name} is already modeled by {}",
                            owners.first().map(String::as_str).unwrap_or("another repository")
                        ),
                    )
                    .with_table(name),
                );
                return Ok(());
            }
        }

        let (table, issues) = self.table_model(repository, descriptor, &build.model)?;
        build.issues.extend(issues);
        build.modeled.push(table.name.clone());
        build.model.insert(table);
        Ok(())
    }

    fn table_model(
        &self,
        repository: &RepositoryDescriptor,
        descriptor: &TableDescriptor,
        model: &SchemaModel,
    ) -> Result<(TableModel, Vec<Issue>), DdlError> {
        let name = descriptor.name.trim();
        let fail = |message: String| DdlError::ModelBuild {
            table: name.to_string(),
            message,
        };

        let mut table = TableModel::new(name);
        table.owner = Some(repository.name.clone());
        let mut issues = Vec::new();

        for column in &descriptor.columns {
            let column_name = column.name.trim();
            if column_name.is_empty() {
                return Err(fail("column without a name".to_string()));
            }
            if table.column(column_name).is_some() {
                return Err(fail(format!("column {column_name} is declared twice")));
            }

            let jdbc_type = self.type_names.classify(&column.raw_type().base);
            if jdbc_type == JdbcType::Unknown {
                issues.push(
                    Issue::info(
                        issue_codes::UNKNOWN_COLUMN_TYPE,
                        format!(
                            "Column {name}.{column_name} has unrecognized type {}",
                            column.sql_type
                        ),
                    )
                    .with_table(name),
                );
            }

            table.columns.push(ColumnModel {
                name: column_name.to_string(),
                type_name: column.sql_type.trim().to_string(),
                jdbc_type,
                required: column.required,
                primary_key: descriptor.is_key_column(column_name),
            });
        }

        let key_columns = descriptor
            .primary_key
            .iter()
            .chain(descriptor.multi_column_name.iter());
        for key in key_columns {
            let Some(column) = table.column(key) else {
                return Err(fail(format!("key column {key} is not a column of the table")));
            };
            let column_name = column.name.clone();
            if !table
                .primary_key
                .iter()
                .any(|known| known.eq_ignore_ascii_case(&column_name))
            {
                table.primary_key.push(column_name);
            }
        }

        for column in descriptor.columns.iter().filter(|column| column.unique) {
            let column_name = column.name.trim();
            let sole_key = table.primary_key.len() == 1
                && table.primary_key[0].eq_ignore_ascii_case(column_name);
            if !sole_key {
                table.indexes.push(IndexModel::unique_for(name, column_name));
            }
        }

        if repository.versioned {
            debug!(table = name, "versioned repository; no foreign keys");
        } else {
            for column in &descriptor.columns {
                if let Some(edge) = self.foreign_key(name, column, model, &mut issues)? {
                    table.foreign_keys.push(edge);
                }
            }
        }

        Ok((table, issues))
    }

    fn foreign_key(
        &self,
        table: &str,
        column: &ColumnDescriptor,
        model: &SchemaModel,
        issues: &mut Vec<Issue>,
    ) -> Result<Option<ForeignKeyEdge>, DdlError> {
        let Some(target) = column.reference_target() else {
            return Ok(None);
        };
        let target = target.map_err(|message| DdlError::ModelBuild {
            table: table.to_string(),
            message,
        })?;
        let column_name = column.name.trim();

        let target_table = if target.table.eq_ignore_ascii_case(table) {
            if target.column.eq_ignore_ascii_case(column_name) {
                debug!(table, column = column_name, "dropping self reference on the same column");
                return Ok(None);
            }
            table.to_string()
        } else if let Some(known) = model.get(&target.table) {
            known.name.clone()
        } else {
            warn!(
                table,
                column = column_name,
                target = %target.table,
                "reference to a table that is not in the schema model"
            );
            issues.push(
                Issue::warning(
                    issue_codes::DANGLING_REFERENCE,
                    format!(
                        "Column {table}.{column_name} references unknown table {}; no foreign key created",
                        target.table
                    ),
                )
                .with_table(table),
            );
            return Ok(None);
        };

        Ok(Some(ForeignKeyEdge {
            source_table: table.to_string(),
            source_column: column_name.to_string(),
            target_table,
            target_column: target.column,
        }))
    }
}
