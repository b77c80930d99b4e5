/*
 * Copyright (c) 2025 Raphael Amorim
 *
 * This file is part of envdoc, which is licensed
 * under GNU General Public License v3.0.
 */

use envdoc::{Error, LoadOptions, LoadReport, MemoryEnv, load, load_into, parse};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};

fn write_env(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_single_file() {
    let dir = tempdir().unwrap();
    let path = write_env(&dir, ".env", "# app\nNAME=demo\n");

    let document = parse(&LoadOptions::new().file(&path)).unwrap();
    assert_eq!(document.get("NAME"), Some("demo"));
    // The single-file path keeps comments
    assert_eq!(document.nodes().len(), 2);
}

#[test]
fn test_merge_precedence() {
    let dir = tempdir().unwrap();
    let a = write_env(&dir, "a.env", "X=1\nONLY_A=a\n");
    let b = write_env(&dir, "b.env", "X=2\n");

    let document = parse(&LoadOptions::new().files([&a, &b])).unwrap();
    assert_eq!(document.get("X"), Some("2"));
    assert_eq!(document.get("ONLY_A"), Some("a"));

    let document = parse(&LoadOptions::new().files([&b, &a])).unwrap();
    assert_eq!(document.get("X"), Some("1"));
}

#[test]
fn test_merge_expands_from_earlier_sources() {
    let dir = tempdir().unwrap();
    let base = write_env(&dir, "base.env", "HOST=db.local\nPORT=5432\n");
    let app = write_env(&dir, "app.env", "PORT=6543\nURL=postgres://$HOST:${PORT}/app\n");

    let document = parse(&LoadOptions::new().file(&base).file(&app)).unwrap();
    assert_eq!(document.get("PORT"), Some("6543"));
    assert_eq!(document.get("URL"), Some("postgres://db.local:6543/app"));
}

#[test]
fn test_content_is_applied_after_files() {
    let dir = tempdir().unwrap();
    let path = write_env(&dir, ".env", "MODE=file\nBASE=/opt\n");

    let options = LoadOptions::new()
        .file(&path)
        .content("MODE=content\nBIN=$BASE/bin");
    let document = parse(&options).unwrap();

    assert_eq!(document.get("MODE"), Some("content"));
    assert_eq!(document.get("BIN"), Some("/opt/bin"));
    let names: Vec<&str> = document.vars().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["MODE", "BASE", "BIN"]);
}

#[test]
fn test_merge_stops_at_failing_source() {
    let dir = tempdir().unwrap();
    let good = write_env(&dir, "good.env", "A=1\n");
    let bad = write_env(&dir, "bad.env", "B=2\n1C=3\n");

    let error = parse(&LoadOptions::new().files([&good, &bad])).unwrap_err();
    match error {
        Error::Lexical { path, line, .. } => {
            assert_eq!(path, Some(bad));
            assert_eq!(line, 2);
        }
        other => panic!("Expected lexical error, got {other:?}"),
    }
}

#[test]
fn test_missing_file_in_merge_is_io_error() {
    let dir = tempdir().unwrap();
    let good = write_env(&dir, "good.env", "A=1\n");
    let missing = dir.path().join("missing.env");

    let error = parse(&LoadOptions::new().files([&good, &missing])).unwrap_err();
    assert!(matches!(error, Error::Io { ref path, .. } if *path == missing));
}

#[test]
fn test_load_into_memory_env_report() {
    let dir = tempdir().unwrap();
    let a = write_env(&dir, "a.env", "KEEP=file\nADD=1\n");
    let b = write_env(&dir, "b.env", "ADD=2\n");

    let mut env: MemoryEnv = [("KEEP", "existing")].into_iter().collect();
    let report = load_into(&LoadOptions::new().files([&a, &b]), &mut env).unwrap();

    assert_eq!(
        report,
        LoadReport {
            applied: 1,
            skipped_existing: 1,
            sources: 2,
        }
    );
    assert_eq!(env.vars().get("KEEP").map(String::as_str), Some("existing"));
    assert_eq!(env.vars().get("ADD").map(String::as_str), Some("2"));
}

#[test]
#[serial]
fn test_load_keeps_existing_process_variables() {
    temp_env::with_vars(
        vec![
            ("HOME", Some("/home/tester")),
            ("ENVDOC_TEST_FRESH", None::<&str>),
        ],
        || {
            let options = LoadOptions::new().content("HOME=/other\nENVDOC_TEST_FRESH=yes\n");
            let report = load(&options).unwrap();

            assert_eq!(std::env::var("HOME").unwrap(), "/home/tester");
            assert_eq!(std::env::var("ENVDOC_TEST_FRESH").unwrap(), "yes");
            assert_eq!(report.skipped_existing, 1);
        },
    );
}

#[test]
#[serial]
fn test_load_with_override_replaces_process_variables() {
    temp_env::with_var("HOME", Some("/home/tester"), || {
        let options = LoadOptions::new()
            .content("HOME=/other\n")
            .override_environment(true);
        load(&options).unwrap();

        assert_eq!(std::env::var("HOME").unwrap(), "/other");
    });
}

#[test]
#[serial]
fn test_load_does_not_apply_anything_on_error() {
    temp_env::with_var_unset("ENVDOC_TEST_PARTIAL", || {
        let options = LoadOptions::new().content("ENVDOC_TEST_PARTIAL=1\nX=\"open\n");
        assert!(load(&options).is_err());
        assert!(std::env::var_os("ENVDOC_TEST_PARTIAL").is_none());
    });
}
