//! End-to-end generation against a repository checkout on disk

use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};
use workflow_policy::config::DiscoveryConfig;
use workflow_policy::error::{AppError, MergeError, PolicyError};
use workflow_policy::generator::open_override;
use workflow_policy::output::PolicyWriter;
use workflow_policy::policy::PolicyDocument;
use workflow_policy::workflow::DirSource;
use workflow_policy::{Generator, Result};

fn repository(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (path, contents) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

fn generator(root: &Path) -> Generator<DirSource> {
    Generator::new(DirSource::new(root), DiscoveryConfig::default()).with_header("workflow-policy")
}

fn run(root: &Path, dest: &Path, merge_with: Option<&str>) -> Result<()> {
    let writer = PolicyWriter::create(dest.to_str().unwrap())?;
    let mut override_bytes = merge_with.map(str::as_bytes);
    generator(root).run(
        override_bytes.as_mut().map(|r| r as &mut dyn std::io::Read),
        writer,
    )
}

/// Files in `dir` other than the repository's own inputs
fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != ".github" && name != "policy.base.yml")
        .collect();
    names.sort();
    names
}

#[test]
fn test_generate_policy_file() {
    let repo = repository(&[
        (
            ".github/workflows/test.yml",
            "on:\n  pull_request:\n    paths: [\"src/**\"]\n",
        ),
        (".github/workflows/build.yaml", "on: [pull_request]\n"),
        (".github/workflows/release.yml", "on: push\n"),
        (".github/workflows/broken.yml", "on: [unclosed\n"),
        (".github/workflows/notes.txt", "not a workflow"),
    ]);
    let dest = repo.path().join(".policy.yml");

    run(repo.path(), &dest, None).unwrap();

    let written = fs::read_to_string(&dest).unwrap();
    assert!(written.starts_with("# This file is generated by workflow-policy.\n"));

    let doc = PolicyDocument::from_yaml(&written).unwrap();
    let names: Vec<_> = doc.approval_rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            ".github/workflows/build.yaml built or skipped",
            ".github/workflows/test.yml built or skipped",
            "default to approval",
        ]
    );
    assert_eq!(output_files(repo.path()), vec![".policy.yml"]);
}

#[test]
fn test_regenerating_is_byte_identical() {
    let repo = repository(&[(".github/workflows/ci.yml", "on: pull_request\n")]);
    let dest = repo.path().join(".policy.yml");

    run(repo.path(), &dest, None).unwrap();
    let first = fs::read(&dest).unwrap();
    run(repo.path(), &dest, None).unwrap();
    let second = fs::read(&dest).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_merge_with_user_policy() {
    let repo = repository(&[(".github/workflows/ci.yml", "on: pull_request\n")]);
    let dest = repo.path().join(".policy.yml");
    let user = "approval_rules:\n  - name: custom\n    requires:\n      count: 1\n";

    run(repo.path(), &dest, Some(user)).unwrap();

    let doc = PolicyDocument::from_yaml(&fs::read_to_string(&dest).unwrap()).unwrap();
    assert_eq!(doc.approval_rules.len(), 3);
    assert_eq!(doc.approval_rules[2].name, "custom");
}

#[test]
fn test_invalid_override_leaves_no_output() {
    let repo = repository(&[(".github/workflows/ci.yml", "on: pull_request\n")]);
    let dest = repo.path().join(".policy.yml");

    let err = run(repo.path(), &dest, Some("invalid yaml")).unwrap_err();
    assert!(matches!(
        err,
        AppError::Policy(PolicyError::InvalidOverride(_))
    ));
    assert!(output_files(repo.path()).is_empty());
}

#[test]
fn test_failed_merge_keeps_previous_output() {
    let repo = repository(&[(".github/workflows/ci.yml", "on: pull_request\n")]);
    let dest = repo.path().join(".policy.yml");
    fs::write(&dest, "previous").unwrap();

    let duplicate = "approval_rules:\n  - name: default to approval\n";
    let err = run(repo.path(), &dest, Some(duplicate)).unwrap_err();
    assert!(matches!(
        err,
        AppError::Merge(MergeError::DuplicateRuleNames { .. })
    ));

    assert_eq!(fs::read_to_string(&dest).unwrap(), "previous");
    assert_eq!(output_files(repo.path()), vec![".policy.yml"]);
}

#[test]
fn test_missing_workflow_directory() {
    let repo = tempdir().unwrap();
    let dest = repo.path().join(".policy.yml");

    let err = run(repo.path(), &dest, None).unwrap_err();
    assert!(matches!(err, AppError::Discovery(_)));
    assert!(output_files(repo.path()).is_empty());
}

#[test]
fn test_merge_with_override_file() {
    let repo = repository(&[
        (".github/workflows/ci.yml", "on: pull_request\n"),
        ("policy.base.yml", "approval_rules:\n  - name: custom\n"),
    ]);
    let dest = repo.path().join(".policy.yml");
    let base = repo.path().join("policy.base.yml");

    let mut merge_source = Some(open_override(base.to_str().unwrap()).unwrap());
    let writer = PolicyWriter::create(dest.to_str().unwrap()).unwrap();
    generator(repo.path())
        .run(merge_source.as_deref_mut(), writer)
        .unwrap();

    let doc = PolicyDocument::from_yaml(&fs::read_to_string(&dest).unwrap()).unwrap();
    assert_eq!(doc.approval_rules.len(), 3);
    assert_eq!(doc.approval_rules[2].name, "custom");
}

#[test]
fn test_empty_override_file_leaves_no_output() {
    let repo = repository(&[(".github/workflows/ci.yml", "on: pull_request\n")]);
    let dest = repo.path().join(".policy.yml");

    let err = run(repo.path(), &dest, Some("# nothing here\n")).unwrap_err();
    assert!(matches!(
        err,
        AppError::Policy(PolicyError::InvalidOverride(_))
    ));
    assert!(output_files(repo.path()).is_empty());
}
