use std::{fs, path::PathBuf};

use tempfile::tempdir;

use kstructural_cli::{Args, Command, run};

const SUFFIXES: [&str; 3] = ["sd", "sdi", "xml"];

/// Collects all document files directly inside a directory
fn collect_documents(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|s| s.to_str())
                        .is_some_and(|suffix| SUFFIXES.contains(&suffix))
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn demos_path() -> PathBuf {
    // Demos are at workspace root, relative to workspace not the crate
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args(command: Command) -> Args {
    Args {
        command,
        config: None,
        base_directory: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let valid_demos = collect_documents(demos_path());
    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let input = demo_path.to_string_lossy().to_string();

        if let Err(e) = run(&args(Command::Check {
            input: input.clone(),
        })) {
            failed_demos.push((demo_path.clone(), "check", e));
            continue;
        }

        for format in SUFFIXES {
            let temp_dir = tempdir().expect("Failed to create temp directory");
            let result = run(&args(Command::Convert {
                input: input.clone(),
                output: temp_dir.path().to_string_lossy().to_string(),
                format: Some(format.to_string()),
                keep_imports: format != "xml",
            }));
            if let Err(e) = result {
                failed_demos.push((demo_path.clone(), format, e));
                continue;
            }

            // Converted output must check cleanly too
            let converted = temp_dir
                .path()
                .join(demo_path.file_name().unwrap())
                .with_extension(format);
            if let Err(e) = run(&args(Command::Check {
                input: converted.to_string_lossy().to_string(),
            })) {
                failed_demos.push((converted, format, e));
            }
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, step, err) in &failed_demos {
            eprintln!("  - {} ({step}): {}", path.display(), err);
        }
        panic!("{} valid demo step(s) failed unexpectedly", failed_demos.len());
    }

    println!("✅ All {} valid demos passed", valid_demos.len());
}

#[test]
fn e2e_smoke_test_error_demos() {
    let error_demos = collect_documents(demos_path().join("errors"));
    assert!(
        !error_demos.is_empty(),
        "No error demos found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let result = run(&args(Command::Check {
            input: demo_path.to_string_lossy().to_string(),
        }));
        if result.is_ok() {
            unexpectedly_succeeded.push(demo_path.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }

    println!(
        "✅ All {} error demos failed as expected",
        error_demos.len()
    );
}
