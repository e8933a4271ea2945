//! Test harness for the manifest parser against fixture files.
//!
//! Reads every .json file under tests/fixtures/good/ (expected to parse)
//! and tests/fixtures/bad/ (expected to fail in strict mode). Good
//! fixtures are additionally checked for canonical round-trip stability
//! and strict/permissive mode equivalence.

use std::fs;
use std::path::Path;

use libjsonish::{parse, parse_permissive, parse_with_filename, to_canonical_string};

/// Root fixture directory.
fn fixture_root() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get all .json files under a fixture subdirectory, sorted.
fn get_fixture_files(subdir: &str) -> Vec<String> {
    let pattern = fixture_root()
        .join(subdir)
        .join("*.json")
        .to_string_lossy()
        .to_string();
    let mut files: Vec<String> = glob::glob(&pattern)
        .expect("bad glob pattern")
        .flatten()
        .map(|p| p.to_string_lossy().to_string())
        .collect();
    files.sort();
    files
}

/// Run a single good fixture: strict parse succeeds, permissive agrees,
/// and canonicalization is idempotent.
fn run_good_test(path: &str) -> Result<(), String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;

    let filename = Path::new(path)
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string();

    let strict = parse(&content).map_err(|e| format!("{}: Unexpected parse error: {}", filename, e))?;

    let lenient = parse_permissive(&content);
    if lenient.has_errors() {
        return Err(format!(
            "{}: Permissive parse recorded an error on valid input: {:?}",
            filename, lenient.error
        ));
    }
    if lenient.document != strict {
        return Err(format!(
            "{}: Strict and permissive trees differ",
            filename
        ));
    }

    let first = to_canonical_string(&strict);
    let reparsed =
        parse(&first).map_err(|e| format!("{}: Canonical output failed to re-parse: {}", filename, e))?;
    if reparsed != strict {
        return Err(format!("{}: Re-parsing canonical output changed the tree", filename));
    }
    let second = to_canonical_string(&reparsed);
    if first != second {
        return Err(format!(
            "{}: Canonicalization not idempotent\n    first:  {:?}\n    second: {:?}",
            filename, first, second
        ));
    }

    println!("  {} => ok", filename);
    Ok(())
}

/// Run a single bad fixture: strict parse fails, permissive records the
/// error without raising.
fn run_bad_test(path: &str) -> Result<(), String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;

    let filename = Path::new(path)
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string();

    match parse_with_filename(&content, Some(&filename)) {
        Ok(value) => {
            return Err(format!(
                "{}: Expected parse error, but got success: {:?}",
                filename, value
            ));
        }
        Err(e) => {
            let message = e.to_string();
            if !message.contains(&format!("of <{}>", filename)) {
                return Err(format!(
                    "{}: Error message missing filename: {}",
                    filename, message
                ));
            }
            println!("  {} => error (as expected): {}", filename, message);
        }
    }

    let lenient = parse_permissive(&content);
    if !lenient.has_errors() {
        return Err(format!(
            "{}: Permissive parse did not record an error",
            filename
        ));
    }
    Ok(())
}

#[test]
fn test_all_good_fixtures() {
    let files = get_fixture_files("good");
    assert!(!files.is_empty(), "No good fixture files found!");

    println!("\nRunning {} good fixture files:", files.len());

    let mut passed = 0;
    let mut failed = 0;
    let mut errors: Vec<String> = Vec::new();

    for file in &files {
        match run_good_test(file) {
            Ok(()) => passed += 1,
            Err(e) => {
                failed += 1;
                errors.push(e);
            }
        }
    }

    println!("\nResults: {} passed, {} failed", passed, failed);

    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }

    assert!(failed == 0, "{} good fixture tests failed", failed);
}

#[test]
fn test_all_bad_fixtures() {
    let files = get_fixture_files("bad");
    assert!(!files.is_empty(), "No bad fixture files found!");

    println!("\nRunning {} bad fixture files:", files.len());

    let mut passed = 0;
    let mut failed = 0;
    let mut errors: Vec<String> = Vec::new();

    for file in &files {
        match run_bad_test(file) {
            Ok(()) => passed += 1,
            Err(e) => {
                failed += 1;
                errors.push(e);
            }
        }
    }

    println!("\nResults: {} passed, {} failed", passed, failed);

    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }

    assert!(failed == 0, "{} bad fixture tests failed", failed);
}
