//! Integration tests for the sql-synth binary.

use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

const SCHEMA: &str = r#"
CREATE TABLE `users` (
  `id` int NOT NULL AUTO_INCREMENT,
  `name` varchar(12) NOT NULL,
  PRIMARY KEY (`id`)
);

CREATE TABLE `orders` (
  `id` int NOT NULL AUTO_INCREMENT,
  `user_name` varchar(12) NOT NULL,
  `placed_at` datetime NOT NULL,
  PRIMARY KEY (`id`),
  CONSTRAINT `fk_user` FOREIGN KEY (`user_name`) REFERENCES `users` (`name`)
);
"#;

const CYCLIC_SCHEMA: &str = r#"
CREATE TABLE a (x VARCHAR(5), FOREIGN KEY (x) REFERENCES b (y));
CREATE TABLE b (y VARCHAR(5), FOREIGN KEY (y) REFERENCES a (x));
"#;

fn create_temp_sql(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn sql_synth_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sql-synth"))
}

#[test]
fn test_generate_to_stdout() {
    let file = create_temp_sql(SCHEMA);

    let output = sql_synth_bin()
        .arg("generate")
        .arg(file.path())
        .args(["-n", "3", "--seed", "42"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let statements: Vec<&str> = stdout.split("\n\n").map(str::trim).collect();

    assert_eq!(statements.len(), 4);
    assert_eq!(statements[0], "SET foreign_key_checks = 0;");
    assert!(statements[1].starts_with("INSERT INTO `users`(`name`) VALUES ('"));
    assert!(statements[2].starts_with("INSERT INTO `orders`(`user_name`, `placed_at`) VALUES ('"));
    assert_eq!(statements[3], "SET foreign_key_checks = 1;");
    assert_eq!(statements[1].matches("),(").count(), 2);
}

#[test]
fn test_generate_seed_is_reproducible() {
    let file = create_temp_sql(SCHEMA);

    let run = || {
        sql_synth_bin()
            .arg("generate")
            .arg(file.path())
            .args(["--seed", "7"])
            .output()
            .expect("Failed to execute command")
            .stdout
    };

    assert_eq!(run(), run());
}

#[test]
fn test_generate_to_file_with_dialect() {
    let file = create_temp_sql(SCHEMA);
    let dir = TempDir::new().unwrap();
    let out_path = dir.path().join("seed.sql");

    let output = sql_synth_bin()
        .arg("generate")
        .arg(file.path())
        .arg("-o")
        .arg(&out_path)
        .args(["-d", "postgres", "-n", "2"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let content = std::fs::read_to_string(&out_path).unwrap();
    assert!(content.starts_with("SET session_replication_role = replica;"));
    assert!(content.contains("INSERT INTO \"users\"(\"name\") VALUES"));
    assert!(content.trim_end().ends_with("SET session_replication_role = DEFAULT;"));
}

#[test]
fn test_generate_dry_run_json() {
    let file = create_temp_sql(SCHEMA);

    let output = sql_synth_bin()
        .arg("generate")
        .arg(file.path())
        .args(["-n", "5", "--seed", "1", "--dry-run", "--json"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("Failed to parse JSON ({}): {}", e, stdout));

    assert_eq!(json["tables"], 2);
    assert_eq!(json["columns"], 5);
    assert_eq!(json["derived_columns"], 1);
    assert_eq!(json["auto_generated_columns"], 2);
    assert_eq!(json["rows_per_table"], 5);
    assert_eq!(json["statements"], 4);
    assert_eq!(json["seed"], 1);
}

#[test]
fn test_generate_with_config() {
    let file = create_temp_sql(SCHEMA);
    let config = create_temp_sql(
        r#"
rows: 2
seed: 3
tables:
  orders:
    skip: true
columns:
  users.name:
    strategy: constant
    value: alice
"#,
    );

    let output = sql_synth_bin()
        .arg("generate")
        .arg(file.path())
        .arg("--config")
        .arg(config.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("INSERT INTO `users`(`name`) VALUES ('alice'),('alice');"));
    assert!(!stdout.contains("INSERT INTO `orders`"));
}

#[test]
fn test_generate_cli_rows_override_config() {
    let file = create_temp_sql(SCHEMA);
    let config = create_temp_sql("rows: 2\n");

    let output = sql_synth_bin()
        .arg("generate")
        .arg(file.path())
        .arg("--config")
        .arg(config.path())
        .args(["-n", "4", "--skip", "orders"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let insert = stdout
        .lines()
        .find(|l| l.starts_with("INSERT INTO `users`"))
        .unwrap();
    assert_eq!(insert.matches("),(").count(), 3);
}

#[test]
fn test_generate_cycle_fails() {
    let file = create_temp_sql(CYCLIC_SCHEMA);

    let output = sql_synth_bin()
        .arg("generate")
        .arg(file.path())
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cyclic reference"));
}

#[test]
fn test_generate_invalid_config_fails() {
    let file = create_temp_sql(SCHEMA);
    let config = create_temp_sql(
        "columns:\n  users.name:\n    strategy: fake\n    generator: spaceship\n",
    );

    let output = sql_synth_bin()
        .arg("generate")
        .arg(file.path())
        .arg("--config")
        .arg(config.path())
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown fake generator"));
}

#[test]
fn test_generate_missing_file() {
    let output = sql_synth_bin()
        .arg("generate")
        .arg("/nonexistent/schema.sql")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("input file does not exist"));
}

#[test]
fn test_order_lists_sources() {
    let file = create_temp_sql(SCHEMA);

    let output = sql_synth_bin()
        .arg("order")
        .arg(file.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Resolution order (5 columns):"));
    assert!(stdout.contains("users.id (auto-generated)"));
    assert!(stdout.contains("orders.user_name <- users.name"));

    let name_pos = stdout.find("users.name [").unwrap();
    let derived_pos = stdout.find("orders.user_name <-").unwrap();
    assert!(name_pos < derived_pos);
}

#[test]
fn test_order_check() {
    let ok = create_temp_sql(SCHEMA);
    let output = sql_synth_bin()
        .arg("order")
        .arg(ok.path())
        .arg("--check")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Check PASSED"));

    let cyclic = create_temp_sql(CYCLIC_SCHEMA);
    let output = sql_synth_bin()
        .arg("order")
        .arg(cyclic.path())
        .arg("--check")
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("a.x -> b.y -> a.x"));
    assert!(stderr.contains("Check FAILED"));
}

#[test]
fn test_completions() {
    let output = sql_synth_bin()
        .args(["completions", "bash"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("sql-synth"));
}
