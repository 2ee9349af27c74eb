use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::tempdir;

const COMMERCE: &str = r#"{
  "name": "commerce",
  "items": [
    {
      "name": "order",
      "tables": [
        {
          "name": "orders",
          "primary": true,
          "primaryKey": ["id"],
          "columns": [
            {"name": "id", "type": "INTEGER", "required": true},
            {"name": "note", "type": "VARCHAR(200)"}
          ]
        },
        {
          "name": "order_line",
          "primaryKey": ["id", "seq"],
          "columns": [
            {"name": "id", "type": "INTEGER", "required": true, "references": "orders(id)"},
            {"name": "seq", "type": "INTEGER", "required": true}
          ]
        }
      ]
    }
  ]
}"#;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schemaforge"))
        .args(args)
        .output()
        .expect("run CLI")
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write input");
    path.to_str().expect("utf-8 path").to_string()
}

#[test]
fn descriptor_plan_as_text() {
    let dir = tempdir().expect("temp dir");
    let descriptor = write(dir.path(), "commerce.json", COMMERCE);

    let output = run(&[&descriptor]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Schemaforge Plan"));
    assert!(stdout.contains("1. orders"));
    assert!(stdout.contains("2. order_line → orders"));
    assert!(stdout.contains("order_line, orders"));
}

#[test]
fn ddl_scripts_are_reordered() {
    let dir = tempdir().expect("temp dir");
    let script = write(
        dir.path(),
        "shop.sql",
        "CREATE TABLE ORDERS (id INT, cust INT references CUSTOMERS(id));\n\
         CREATE INDEX idx_orders_cust ON ORDERS(cust);\n\
         CREATE TABLE CUSTOMERS (id INT);\n",
    );

    let output = run(&["-f", "sql", &script]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "CREATE TABLE CUSTOMERS (id INT);\n\n\
         CREATE TABLE ORDERS (id INT, cust INT references CUSTOMERS(id));\n\
         CREATE INDEX idx_orders_cust ON ORDERS(cust);\n\n"
    );
}

#[test]
fn json_output_to_file() {
    let dir = tempdir().expect("temp dir");
    let descriptor = write(dir.path(), "commerce.json", COMMERCE);
    let output_path = dir.path().join("plan.json");

    let status = Command::new(env!("CARGO_BIN_EXE_schemaforge"))
        .args([
            "-f",
            "json",
            "-d",
            "oracle",
            "-o",
            output_path.to_str().expect("output path"),
            &descriptor,
        ])
        .status()
        .expect("run CLI");
    assert!(status.success());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output_path).expect("output exists"))
            .expect("valid JSON");
    assert_eq!(json["plan"]["database"], "oracle");
    assert_eq!(
        json["plan"]["dropOrder"],
        serde_json::json!(["order_line", "orders"])
    );
    assert!(json.get("applied").is_none());
}

#[test]
fn descriptor_from_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_schemaforge"))
        .args(["-f", "json", "--compact"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn CLI");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(COMMERCE.as_bytes())
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for CLI");

    assert!(output.status.success(), "{output:?}");
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["plan"]["statements"].as_array().map(Vec::len), Some(2));
}

#[test]
fn cycles_exit_with_failure() {
    let dir = tempdir().expect("temp dir");
    let script = write(
        dir.path(),
        "cycle.sql",
        "CREATE TABLE a (id INT, b_id INT references b(id));\n\
         CREATE TABLE b (id INT, a_id INT references a(id));\n",
    );

    let output = run(&[&script]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("schemaforge: error:"), "{stderr}");
    assert!(stderr.contains("unresolved tables: a, b"), "{stderr}");
}

#[test]
fn invalid_config_is_a_config_error() {
    let dir = tempdir().expect("temp dir");
    let descriptor = write(dir.path(), "commerce.json", COMMERCE);
    let config = write(dir.path(), "schemaforge.toml", "[executor\n");

    let output = run(&["-c", &config, &descriptor]);
    assert_eq!(output.status.code(), Some(66));
    assert!(String::from_utf8_lossy(&output.stderr).contains("schemaforge.toml"));
}

#[test]
fn create_scripts_without_drop_scripts_are_rejected() {
    let dir = tempdir().expect("temp dir");
    let descriptor = write(dir.path(), "commerce.json", COMMERCE);
    let config = write(
        dir.path(),
        "schemaforge.toml",
        "[scripts.create]\noracle = \"{home}/create.sql\"\n",
    );

    let output = run(&["-c", &config, "-p", "home=/opt/app", &descriptor]);
    assert_eq!(output.status.code(), Some(66));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no drop scripts"));
}

#[test]
fn vendor_scripts_are_listed_in_the_plan() {
    let dir = tempdir().expect("temp dir");
    let descriptor = write(dir.path(), "commerce.json", COMMERCE);
    let config = write(
        dir.path(),
        "schemaforge.toml",
        "[scripts.create]\ndefault = \"{flavor}/create.sql\"\n\n\
         [scripts.drop]\ndefault = \"{flavor}/drop.sql\"\n",
    );

    let output = run(&["-c", &config, "-p", "flavor=ansi", "-f", "sql", &descriptor]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("-- vendor scripts for default replace the statements below"));
    assert!(stdout.contains("ansi/create.sql"));
    assert!(stdout.contains("CREATE TABLE orders"));
}

#[test]
fn print_schema_describes_descriptors() {
    let output = run(&["--print-schema"]);
    assert!(output.status.success());

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(schema["title"], "RepositoryDescriptor");
    assert!(schema["properties"].get("items").is_some());
}
