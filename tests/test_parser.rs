use std::path::PathBuf;

use gomutate::mutants::Mutation;
use gomutate::operators::{self, Operator};
use gomutate::parser::{discover, SourceFile};

fn source_of(text: &str) -> SourceFile {
    SourceFile {
        path: PathBuf::from("/src/example.go"),
        text: text.to_string(),
    }
}

fn discover_all(text: &str) -> Vec<Mutation> {
    discover(&source_of(text), operators::ALL).expect("discover should succeed")
}

fn by_operator<'a>(mutations: &'a [Mutation], name: &str) -> Vec<&'a Mutation> {
    mutations.iter().filter(|m| m.operator == name).collect()
}

// A file exercising every shape the catalog recognizes.
const SHAPES: &str = r#"package main

func Add(a, b int) int {
	return a + b
}

func Max(a, b int) int {
	if a > b {
		return a
	}
	return b
}

func Busy(done bool, n int) int {
	total := 0
	for i := 0; i < n; i++ {
		if done && n > 0 {
			break
		}
		total = total + i
	}
	return total
}

func Flag(ready bool) bool {
	if ready {
		return true
	}
	if !ready {
		return false
	}
	return ready
}
"#;

// --- Discovery ---

#[test]
fn arithmetic_found_in_add() {
    let mutations = discover_all("package main\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n");
    let arith = by_operator(&mutations, "Arithmetic");
    assert_eq!(arith.len(), 1);
    assert_eq!(arith[0].original, "+");
    assert_eq!(arith[0].replacement, "-");
}

#[test]
fn arithmetic_position_is_operator_token() {
    let mutations = discover_all("package main\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n");
    let arith = by_operator(&mutations, "Arithmetic");
    assert_eq!(arith[0].line, 4);
    assert_eq!(arith[0].column, 11);
}

#[test]
fn comparison_and_boundary_both_target_less_than() {
    let mutations = discover_all("package main\n\nfunc f(a, b int) bool {\n\tv := a < b\n\treturn v\n}\n");
    let cmp = by_operator(&mutations, "Comparison");
    let bound = by_operator(&mutations, "Boundary");
    assert_eq!(cmp.len(), 1);
    assert_eq!(cmp[0].replacement, ">=");
    assert_eq!(bound.len(), 1);
    assert_eq!(bound[0].replacement, "<=");
}

#[test]
fn equality_gets_no_boundary_mutation() {
    let mutations = discover_all("package main\n\nfunc f(a, b int) bool {\n\treturn a == b\n}\n");
    assert_eq!(by_operator(&mutations, "Comparison").len(), 1);
    assert!(by_operator(&mutations, "Boundary").is_empty());
}

#[test]
fn logical_found_in_connective() {
    let mutations =
        discover_all("package main\n\nfunc f(a, b bool) bool {\n\tv := a && b\n\treturn v\n}\n");
    let logical = by_operator(&mutations, "Logical");
    assert_eq!(logical.len(), 1);
    assert_eq!(logical[0].original, "&&");
    assert_eq!(logical[0].replacement, "||");
}

#[test]
fn incdec_found_on_increment() {
    let mutations =
        discover_all("package main\n\nfunc bump(i int) int {\n\ti++\n\treturn i\n}\n");
    let incdec = by_operator(&mutations, "IncDec");
    assert_eq!(incdec.len(), 1);
    assert_eq!(incdec[0].original, "++");
    assert_eq!(incdec[0].replacement, "--");
    assert_eq!(incdec[0].line, 4);
    assert_eq!(incdec[0].column, 3);
}

#[test]
fn incdec_found_on_decrement() {
    let mutations =
        discover_all("package main\n\nfunc drop(i int) int {\n\ti--\n\treturn i\n}\n");
    let incdec = by_operator(&mutations, "IncDec");
    assert_eq!(incdec.len(), 1);
    assert_eq!(incdec[0].replacement, "++");
}

// --- NegateCond ---

#[test]
fn negate_cond_wraps_plain_condition() {
    let text = "package main\n\nfunc f(ready bool) int {\n\tif ready {\n\t\treturn 1\n\t}\n\treturn 0\n}\n";
    let mutations = discover_all(text);
    let negate = by_operator(&mutations, "NegateCond");
    assert_eq!(negate.len(), 1);
    assert_eq!(negate[0].original, "ready");
    assert_eq!(negate[0].replacement, "!(ready)");

    let mut mutated = text.to_string();
    negate[0].apply(&mut mutated);
    assert!(mutated.contains("if !(ready) {"));
}

#[test]
fn negate_cond_strips_existing_negation() {
    let text = "package main\n\nfunc f(done bool) int {\n\tif !done {\n\t\treturn 1\n\t}\n\treturn 0\n}\n";
    let mutations = discover_all(text);
    let negate = by_operator(&mutations, "NegateCond");
    assert_eq!(negate.len(), 1);
    assert_eq!(negate[0].original, "!done");
    assert_eq!(negate[0].replacement, "done");
}

#[test]
fn negate_cond_skips_comparison_conditions() {
    let text = "package main\n\nfunc f(a, b int) int {\n\tif a < b {\n\t\treturn 1\n\t}\n\treturn 0\n}\n";
    let mutations = discover_all(text);
    assert!(by_operator(&mutations, "NegateCond").is_empty());
    // The comparison itself is still mutated.
    assert_eq!(by_operator(&mutations, "Comparison").len(), 1);
}

#[test]
fn negate_cond_skips_logical_conditions() {
    let text = "package main\n\nfunc f(a, b bool) int {\n\tif a || b {\n\t\treturn 1\n\t}\n\treturn 0\n}\n";
    let mutations = discover_all(text);
    assert!(by_operator(&mutations, "NegateCond").is_empty());
}

#[test]
fn negate_cond_keeps_call_conditions_in_scope() {
    let text = "package main\n\nfunc ok() bool { return true }\n\nfunc f() int {\n\tif ok() {\n\t\treturn 1\n\t}\n\treturn 0\n}\n";
    let mutations = discover_all(text);
    let negate = by_operator(&mutations, "NegateCond");
    assert_eq!(negate.len(), 1);
    assert_eq!(negate[0].replacement, "!(ok())");
}

// --- Catalog behavior over the shapes file ---

#[test]
fn shapes_file_counts_per_operator() {
    let mutations = discover_all(SHAPES);
    assert_eq!(by_operator(&mutations, "Arithmetic").len(), 2); // a + b, total + i
    assert_eq!(by_operator(&mutations, "Comparison").len(), 3); // a > b, i < n, n > 0
    assert_eq!(by_operator(&mutations, "Boundary").len(), 3);
    assert_eq!(by_operator(&mutations, "Logical").len(), 1); // done && n > 0
    assert_eq!(by_operator(&mutations, "IncDec").len(), 1); // i++
    assert_eq!(by_operator(&mutations, "NegateCond").len(), 2); // if ready, if !ready
}

#[test]
fn discovery_is_deterministic() {
    let first = discover_all(SHAPES);
    let second = discover_all(SHAPES);
    assert_eq!(format!("{:?}", first), format!("{:?}", second));
}

#[test]
fn operator_subset_limits_discovery() {
    let source = source_of(SHAPES);
    let mutations =
        discover(&source, &[Operator::IncDec]).expect("discover should succeed");
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].operator, "IncDec");
}

// --- Apply / revert ---

#[test]
fn every_mutation_reverts_to_identical_bytes() {
    let mutations = discover_all(SHAPES);
    assert!(!mutations.is_empty());
    for mutation in &mutations {
        let mut text = SHAPES.to_string();
        mutation.apply(&mut text);
        assert_ne!(text, SHAPES, "{} should change the text", mutation.operator);
        mutation.revert(&mut text);
        assert_eq!(text, SHAPES, "{} revert must restore bytes", mutation.operator);
    }
}

#[test]
fn mutated_text_still_parses() {
    let dir = tempfile::TempDir::new().unwrap();
    let variant = dir.path().join("variant.go");
    let mutations = discover_all(SHAPES);
    for mutation in &mutations {
        let mut text = SHAPES.to_string();
        mutation.apply(&mut text);
        // Loading runs the syntax-error check a fresh parse would hit.
        std::fs::write(&variant, &text).unwrap();
        SourceFile::load(&variant)
            .unwrap_or_else(|e| panic!("{} variant failed to parse: {}", mutation.operator, e));
    }
}

// --- SourceFile loading ---

#[test]
fn load_rejects_files_with_syntax_errors() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("broken.go");
    std::fs::write(&path, "package main\n\nfunc {{{\n").unwrap();
    assert!(SourceFile::load(&path).is_err());
}

#[test]
fn load_reads_valid_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("ok.go");
    std::fs::write(&path, "package main\n\nfunc f() int {\n\treturn 1 + 2\n}\n").unwrap();
    let source = SourceFile::load(&path).expect("load should succeed");
    assert_eq!(source.path, path);
    assert!(source.text.contains("1 + 2"));
}

#[test]
fn load_missing_file_is_error() {
    assert!(SourceFile::load(std::path::Path::new("/nonexistent/x.go")).is_err());
}
