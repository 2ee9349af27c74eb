//! SQLite integration tests for the schemaforge CLI.
//!
//! Each test applies a plan to a temporary SQLite file and inspects the
//! result with rusqlite.

use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use crate::{json_report, run_cli, run_cli_success};

const SHOP: &str = r#"{
  "name": "shop",
  "items": [
    {
      "name": "order",
      "tables": [
        {
          "name": "customers",
          "primary": true,
          "primaryKey": ["id"],
          "columns": [
            {"name": "id", "type": "INTEGER", "required": true},
            {"name": "email", "type": "VARCHAR(254)", "unique": true}
          ]
        },
        {
          "name": "orders",
          "primaryKey": ["id"],
          "columns": [
            {"name": "id", "type": "INTEGER", "required": true},
            {"name": "customer_id", "type": "INTEGER", "references": "customers(id)"}
          ]
        }
      ]
    }
  ]
}"#;

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

fn table_names(path: &Path) -> Vec<String> {
    let conn = Connection::open(path).expect("open sqlite db");
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .expect("prepare");
    stmt.query_map([], |row| row.get(0))
        .expect("query tables")
        .collect::<Result<_, _>>()
        .expect("read table names")
}

#[test]
fn test_sqlite_apply_creates_tables() {
    let dir = tempdir().expect("create temp dir");
    let db_path = dir.path().join("shop.db");
    let descriptor = dir.path().join("shop.json");
    fs::write(&descriptor, SHOP).expect("write descriptor");

    let output = run_cli_success(&[
        "--url",
        &sqlite_url(&db_path),
        "--apply",
        "-f",
        "json",
        descriptor.to_str().unwrap(),
    ]);

    let json = json_report(&output);
    assert_eq!(json["plan"]["database"], "sqlite");
    assert_eq!(json["applied"]["mode"], "generated");
    assert_eq!(
        json["applied"]["created"],
        serde_json::json!(["customers", "orders"])
    );
    assert_eq!(table_names(&db_path), vec!["customers", "orders"]);
}

#[test]
fn test_sqlite_second_apply_skips_existing_tables() {
    let dir = tempdir().expect("create temp dir");
    let db_path = dir.path().join("shop.db");
    let descriptor = dir.path().join("shop.json");
    fs::write(&descriptor, SHOP).expect("write descriptor");
    let url = sqlite_url(&db_path);
    let args = ["--url", &url, "--apply", "-f", "json", descriptor.to_str().unwrap()];

    run_cli_success(&args);
    let output = run_cli_success(&args);

    let json = json_report(&output);
    assert_eq!(
        json["applied"]["skipped"],
        serde_json::json!(["customers", "orders"])
    );
    assert_eq!(json["applied"]["created"], serde_json::json!([]));
}

#[test]
fn test_sqlite_include_existing_leaves_tables_out_of_the_plan() {
    let dir = tempdir().expect("create temp dir");
    let db_path = dir.path().join("shop.db");
    let descriptor = dir.path().join("shop.json");
    fs::write(&descriptor, SHOP).expect("write descriptor");

    Connection::open(&db_path)
        .expect("open sqlite db")
        .execute_batch("CREATE TABLE customers (id INTEGER PRIMARY KEY);")
        .expect("create existing table");

    let output = run_cli_success(&[
        "--url",
        &sqlite_url(&db_path),
        "--include-existing",
        "-f",
        "json",
        descriptor.to_str().unwrap(),
    ]);

    let json = json_report(&output);
    let statements = json["plan"]["statements"].as_array().expect("statements");
    assert_eq!(statements.len(), 1);
    let issues = json["plan"]["issues"].as_array().expect("issues");
    assert!(issues.iter().any(|issue| issue["code"] == "TABLE_EXISTS"));
    // Planning alone never touches the database.
    assert_eq!(table_names(&db_path), vec!["customers"]);
}

#[test]
fn test_sqlite_vendor_scripts_replace_generated_statements() {
    let dir = tempdir().expect("create temp dir");
    let db_path = dir.path().join("shop.db");
    let descriptor = dir.path().join("shop.json");
    fs::write(&descriptor, SHOP).expect("write descriptor");
    fs::write(
        dir.path().join("create.sql"),
        "CREATE TABLE vendor_customers (id INTEGER);\nCREATE TABLE vendor_orders (id INTEGER);\n",
    )
    .expect("write create script");
    fs::write(
        dir.path().join("drop.sql"),
        "DROP TABLE vendor_orders;\nDROP TABLE vendor_customers;\n",
    )
    .expect("write drop script");
    let config = dir.path().join("schemaforge.toml");
    fs::write(
        &config,
        "[scripts.create]\nsqlite = \"create.sql\"\n\n[scripts.drop]\nsqlite = \"drop.sql\"\n",
    )
    .expect("write config");

    let output = run_cli_success(&[
        "-c",
        config.to_str().unwrap(),
        "--url",
        &sqlite_url(&db_path),
        "--apply",
        "-f",
        "json",
        descriptor.to_str().unwrap(),
    ]);

    let json = json_report(&output);
    assert_eq!(json["applied"]["mode"], "scripts");
    assert_eq!(json["applied"]["created"], 2);
    assert_eq!(
        table_names(&db_path),
        vec!["vendor_customers", "vendor_orders"]
    );
}

#[test]
fn test_sqlite_failed_statement_exits_with_failure() {
    let dir = tempdir().expect("create temp dir");
    let db_path = dir.path().join("broken.db");
    let script = dir.path().join("broken.sql");
    fs::write(&script, "CREATE TABLE broken (id INTEGER,);\n").expect("write sql file");

    let output = run_cli(&[
        "--url",
        &sqlite_url(&db_path),
        "--apply",
        script.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CREATE TABLE for table broken failed"), "{stderr}");
}
