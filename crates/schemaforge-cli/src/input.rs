//! Input handling: descriptor documents and raw DDL scripts.

use crate::cli::InputKind;
use anyhow::{Context, Result};
use schemaforge_core::{
    extract_index_statement, issue_codes, remove_index_statements, split_script, CreateStatement,
    DatabaseKind, DdlError, Issue, RepositoryDescriptor,
};
use serde::Deserialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One input document.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub path: Option<PathBuf>,
    pub content: String,
}

/// Everything the inputs contribute to a plan.
#[derive(Debug, Default)]
pub struct Inputs {
    pub repositories: Vec<RepositoryDescriptor>,
    /// Statements taken verbatim from DDL scripts.
    pub statements: Vec<CreateStatement>,
    pub issues: Vec<Issue>,
}

/// A descriptor file holds one repository or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptorDocument {
    Many(Vec<RepositoryDescriptor>),
    One(RepositoryDescriptor),
}

/// Read input from files or stdin.
///
/// If no files are provided, reads from stdin.
pub fn read_input(files: &[PathBuf]) -> Result<Vec<Source>> {
    if files.is_empty() {
        read_from_stdin()
    } else {
        read_from_files(files)
    }
}

fn read_from_stdin() -> Result<Vec<Source>> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read from stdin")?;

    Ok(vec![Source {
        name: "<stdin>".to_string(),
        path: None,
        content,
    }])
}

fn read_from_files(files: &[PathBuf]) -> Result<Vec<Source>> {
    files
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;

            Ok(Source {
                name: path.display().to_string(),
                path: Some(path.clone()),
                content,
            })
        })
        .collect()
}

/// Sort every source into descriptors or DDL and parse it.
///
/// DDL scripts are split with the tokenizer for `database`.
pub fn load_inputs(sources: &[Source], kind: InputKind, database: DatabaseKind) -> Result<Inputs> {
    let mut inputs = Inputs::default();
    for source in sources {
        if is_descriptor(source, kind) {
            let repositories = parse_descriptors(&source.content)
                .with_context(|| format!("Failed to parse descriptor document: {}", source.name))?;
            debug!(source = %source.name, count = repositories.len(), "loaded repositories");
            inputs.repositories.extend(repositories);
        } else {
            let path = source
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from(&source.name));
            let (statements, issues) = parse_ddl(&source.content, database, &path)?;
            debug!(source = %source.name, count = statements.len(), "loaded CREATE statements");
            inputs.statements.extend(statements);
            inputs.issues.extend(issues);
        }
    }
    Ok(inputs)
}

fn is_descriptor(source: &Source, kind: InputKind) -> bool {
    match kind {
        InputKind::Descriptor => true,
        InputKind::Ddl => false,
        InputKind::Auto => match &source.path {
            Some(path) => path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json")),
            None => source.content.trim_start().starts_with(['{', '[']),
        },
    }
}

fn parse_descriptors(content: &str) -> serde_json::Result<Vec<RepositoryDescriptor>> {
    Ok(match serde_json::from_str(content)? {
        DescriptorDocument::Many(repositories) => repositories,
        DescriptorDocument::One(repository) => vec![repository],
    })
}

/// Split a DDL script into CREATE TABLE statements.
///
/// Index statements attach to the CREATE TABLE statement before them.
/// Statements that create no table are skipped with a warning issue.
pub fn parse_ddl(
    content: &str,
    database: DatabaseKind,
    path: &Path,
) -> Result<(Vec<CreateStatement>, Vec<Issue>)> {
    let mut statements: Vec<CreateStatement> = Vec::new();
    let mut issues = Vec::new();

    for text in split_script(content, database, path)? {
        let is_index_only = extract_index_statement(&text).is_some()
            && remove_index_statements(&text).trim().is_empty();
        if is_index_only {
            match statements.last_mut() {
                Some(statement) => statement.push_index_statement(text),
                None => {
                    warn!(path = %path.display(), "index statement before any CREATE TABLE");
                    issues.push(Issue::warning(
                        issue_codes::MISSING_TABLE_NAME,
                        format!("{}: index statement precedes every CREATE TABLE; skipped", path.display()),
                    ));
                }
            }
            continue;
        }

        match CreateStatement::parse(&text) {
            Ok(statement) => statements.push(statement),
            Err(DdlError::UnnamedStatement(preview)) => {
                issues.push(Issue::warning(
                    issue_codes::MISSING_TABLE_NAME,
                    format!("{}: skipped statement without a table: {preview}", path.display()),
                ));
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok((statements, issues))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source(name: &str, content: &str) -> Source {
        Source {
            name: name.to_string(),
            path: Some(PathBuf::from(name)),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_read_single_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "CREATE TABLE users (id INT)").unwrap();

        let sources = read_from_files(&[file.path().to_path_buf()]).unwrap();
        assert_eq!(sources.len(), 1);
        assert!(sources[0].content.contains("CREATE TABLE users"));
        assert_eq!(sources[0].path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_from_files(&[PathBuf::from("/nonexistent/file.sql")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_auto_detection() {
        assert!(is_descriptor(&source("repo.JSON", ""), InputKind::Auto));
        assert!(!is_descriptor(&source("schema.sql", "{"), InputKind::Auto));
        assert!(is_descriptor(&source("schema.sql", ""), InputKind::Descriptor));

        let stdin = Source {
            name: "<stdin>".to_string(),
            path: None,
            content: "  [{\"name\": \"profile\"}]".to_string(),
        };
        assert!(is_descriptor(&stdin, InputKind::Auto));
        assert!(!is_descriptor(&stdin, InputKind::Ddl));
    }

    #[test]
    fn test_descriptor_documents() {
        let one = parse_descriptors(r#"{"name": "profile"}"#).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].name, "profile");

        let many = parse_descriptors(r#"[{"name": "a"}, {"name": "b", "versioned": true}]"#)
            .unwrap();
        assert_eq!(many.len(), 2);
        assert!(many[1].versioned);

        assert!(parse_descriptors("{\"items\": []}").is_err());
    }

    #[test]
    fn test_parse_ddl_attaches_indexes_and_skips_other_statements() {
        let sql = "\
            CREATE INDEX early ON nowhere(id);\n\
            CREATE TABLE customers (id INT);\n\
            CREATE TABLE orders (id INT, customer_id INT references customers(id));\n\
            CREATE INDEX idx_orders_customer ON orders(customer_id);\n\
            INSERT INTO customers VALUES (1);\n";

        let (statements, issues) =
            parse_ddl(sql, DatabaseKind::Default, Path::new("shop.sql")).unwrap();

        let names: Vec<_> = statements.iter().map(CreateStatement::table_name).collect();
        assert_eq!(names, vec!["customers", "orders"]);
        assert_eq!(statements[1].references(), ["customers"]);
        assert_eq!(
            statements[1].index_statements(),
            ["CREATE INDEX idx_orders_customer ON orders(customer_id)"]
        );

        assert_eq!(issues.len(), 2);
        assert!(issues
            .iter()
            .all(|issue| issue.code == issue_codes::MISSING_TABLE_NAME));
    }

    #[test]
    fn test_load_inputs_mixes_kinds() {
        let sources = vec![
            source("profile.json", r#"{"name": "profile"}"#),
            source("extra.sql", "CREATE TABLE audit_log (id INT)"),
        ];
        let inputs = load_inputs(&sources, InputKind::Auto, DatabaseKind::Default).unwrap();
        assert_eq!(inputs.repositories.len(), 1);
        assert_eq!(inputs.statements.len(), 1);
        assert!(inputs.issues.is_empty());
    }

    #[test]
    fn test_bad_descriptor_names_the_source() {
        let sources = vec![source("broken.json", "{not json")];
        let err = load_inputs(&sources, InputKind::Auto, DatabaseKind::Default).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
