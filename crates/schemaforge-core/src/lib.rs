pub mod error;
pub mod executor;
pub mod ordering;
pub mod schema;
pub mod statement;
pub mod transaction;
pub mod types;

// Re-export main types and functions
pub use error::{DdlError, DdlOperation, DriverError};
pub use executor::{
    Connection, CreateReport, DataSource, DdlExecutor, DropReport, ExecutorConfig,
    LoadedScripts, ScriptFailure, ScriptMappingConfig, ScriptReport, ScriptSet,
    TransactionManager, VendorScripts,
};
pub use ordering::{order_statements, OrderedStatements};
pub use schema::{
    SchemaBuild, SchemaModelBuilder, SchemaTracker, TableClaim, TypeNameMap, TypeNameOverrides,
};
pub use statement::{
    extract_index_statement, extract_references, extract_table_name, remove_index_statements,
    render_create, split_script, strip_foreign_key_clauses, strip_references_clauses,
    strip_trailing_semicolon, CreateStatement, DEFAULT_BEGIN_DELIMITER,
};
pub use transaction::{AutoCommitScope, NoTransactionManager};

// Re-export types explicitly
pub use types::{
    issue_codes, ColumnDescriptor, ColumnModel, DatabaseKind, ForeignKeyEdge, IndexModel,
    ItemDescriptor, Issue, IssueCount, JdbcType, RepositoryDescriptor, SchemaModel, Severity,
    TableDescriptor, TableModel,
};

// Test utilities (must be at end of file)
#[cfg(test)]
pub mod test_utils;
