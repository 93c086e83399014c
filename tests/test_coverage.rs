use std::path::Path;

use gomutate::coverage::Coverage;

const PROFILE: &str = "\
mode: set
example.com/demo/pkg/add.go:3.24,5.2 1 1
example.com/demo/pkg/add.go:7.24,9.2 1 0
example.com/demo/pkg/sub.go:3.24,5.2 1 2
";

// --- Parsing ---

#[test]
fn parse_skips_mode_header() {
    let cov = Coverage::parse("mode: atomic\n");
    assert!(cov.is_empty());
}

#[test]
fn parse_keeps_executed_blocks() {
    let cov = Coverage::parse(PROFILE);
    assert!(cov.is_covered(Path::new("/home/u/demo/pkg/add.go"), 4));
}

#[test]
fn parse_discards_zero_count_blocks() {
    let cov = Coverage::parse(PROFILE);
    // Lines 7-9 only appear in the block with count 0.
    assert!(!cov.is_covered(Path::new("/home/u/demo/pkg/add.go"), 8));
}

#[test]
fn parse_skips_malformed_lines() {
    let data = "\
mode: set
garbage without colon
pkg/a.go:nonsense 1 1
pkg/a.go:1.1 1 1
pkg/b.go:1.1,5.1 1 1
";
    let cov = Coverage::parse(data);
    assert!(cov.is_covered(Path::new("/x/pkg/b.go"), 3));
    assert!(!cov.is_covered(Path::new("/x/pkg/a.go"), 1));
}

#[test]
fn parse_empty_profile_covers_nothing() {
    let cov = Coverage::parse("");
    assert!(cov.is_empty());
    assert!(!cov.is_covered(Path::new("/x/a.go"), 1));
}

// --- Block boundaries ---

#[test]
fn coverage_is_inclusive_of_block_edges() {
    let cov = Coverage::parse("pkg/a.go:10.1,20.5 3 1\n");
    let file = Path::new("/src/pkg/a.go");
    assert!(cov.is_covered(file, 10));
    assert!(cov.is_covered(file, 15));
    assert!(cov.is_covered(file, 20));
    assert!(!cov.is_covered(file, 9));
    assert!(!cov.is_covered(file, 21));
}

// --- Path matching ---

#[test]
fn module_qualified_key_matches_absolute_path() {
    let cov = Coverage::parse("example.com/demo/pkg/add.go:1.1,5.1 1 1\n");
    // Rightmost two segments agree: pkg/add.go.
    assert!(cov.is_covered(Path::new("/home/u/src/demo/pkg/add.go"), 2));
}

#[test]
fn bare_filename_key_matches_any_directory() {
    let cov = Coverage::parse("add.go:1.1,5.1 1 1\n");
    assert!(cov.is_covered(Path::new("/deep/nested/dir/add.go"), 2));
}

#[test]
fn relative_path_matches_key_suffix() {
    let cov = Coverage::parse("example.com/demo/pkg/add.go:1.1,5.1 1 1\n");
    assert!(cov.is_covered(Path::new("pkg/add.go"), 2));
}

#[test]
fn different_filename_never_matches() {
    let cov = Coverage::parse("pkg/add.go:1.1,5.1 1 1\n");
    assert!(!cov.is_covered(Path::new("/x/pkg/sub.go"), 2));
}

#[test]
fn same_filename_different_parent_does_not_match() {
    let cov = Coverage::parse("internal/util/add.go:1.1,5.1 1 1\n");
    assert!(!cov.is_covered(Path::new("/src/other/pkg/add.go"), 2));
}

#[test]
fn suffix_match_is_symmetric_across_key_spellings() {
    // Keys that agree on their rightmost two segments answer alike.
    let by_module = Coverage::parse("example.com/demo/pkg/add.go:1.1,5.1 1 1\n");
    let by_relative = Coverage::parse("pkg/add.go:1.1,5.1 1 1\n");
    let file = Path::new("/abs/checkout/pkg/add.go");
    assert!(by_module.is_covered(file, 3));
    assert!(by_relative.is_covered(file, 3));
}

// --- Loading ---

#[test]
fn load_reads_profile_from_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("coverage.out");
    std::fs::write(&path, PROFILE).unwrap();
    let cov = Coverage::load(&path).expect("load should succeed");
    assert!(cov.is_covered(Path::new("/u/demo/pkg/sub.go"), 4));
}

#[test]
fn load_missing_profile_is_error() {
    assert!(Coverage::load(Path::new("/nonexistent/coverage.out")).is_err());
}
