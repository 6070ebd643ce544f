//! Tests for the `sqlentity` inspection binary.

use assert_cmd::Command;
use sqlentity::{record, Connection, ConnectionConfig, Entity};
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

fn sample_database() -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let conn = Connection::new(&ConnectionConfig::new(file.path().to_string_lossy())).unwrap();
    conn.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &[])
        .unwrap();
    conn.execute("CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT)", &[])
        .unwrap();
    conn.commit().unwrap();

    let users = Entity::new("users", &conn).unwrap();
    users.insert(&record! { "id" => 1, "name" => "a".to_string() }).unwrap();
    users.insert(&record! { "id" => 2, "name" => "b".to_string() }).unwrap();
    drop(users);
    conn.close().unwrap();
    file
}

fn stdout_of(args: &[&str]) -> String {
    let output = Command::cargo_bin("sqlentity").unwrap().args(args).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_lists_tables() {
    let db = sample_database();
    let path = db.path().to_string_lossy().to_string();

    assert_eq!(stdout_of(&[&path]), "posts\nusers\n");
}

#[test]
fn test_prints_table() {
    let db = sample_database();
    let path = db.path().to_string_lossy().to_string();

    let stdout = stdout_of(&[&path, "users"]);
    assert_eq!(stdout, "users(id, name)\n2 row(s)\n('id', 'name')\n(1, 'a')\n(2, 'b')\n");
}

#[test]
fn test_reads_config_file() {
    let db = sample_database();
    let mut config = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(config, "database = {:?}", db.path().to_string_lossy()).unwrap();
    writeln!(config, "read_only = true").unwrap();

    let config_path = config.path().to_string_lossy().to_string();
    let stdout = stdout_of(&[&config_path, "posts"]);
    assert!(stdout.starts_with("posts(id, title)\n0 row(s)\n"));
}

#[test]
fn test_missing_table_fails() {
    let db = sample_database();
    let path = db.path().to_string_lossy().to_string();

    Command::cargo_bin("sqlentity")
        .unwrap()
        .args([path.as_str(), "ghosts"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_missing_database_is_not_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.db");

    Command::cargo_bin("sqlentity")
        .unwrap()
        .arg(&path)
        .assert()
        .failure()
        .code(1);
    assert!(!path.exists());
}

#[test]
fn test_usage_without_arguments() {
    Command::cargo_bin("sqlentity").unwrap().assert().failure().code(2);
}
