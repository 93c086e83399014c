use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tree_sitter::{Node, Parser};

use crate::mutants::Mutation;
use crate::operators::{self, Operator};

/// A parsed Go source file. The text buffer is the single source of
/// truth: mutations splice it in place and serialization is the buffer
/// itself, so everything outside the mutated span round-trips byte for
/// byte, comments included.
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    pub fn load(path: &Path) -> Result<SourceFile> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        // Files the grammar cannot fully parse are rejected here:
        // mutating them would produce variants that never compile.
        let tree = parse_tree(&text)?;
        if tree.root_node().has_error() {
            anyhow::bail!("{}: syntax errors", path.display());
        }
        Ok(SourceFile {
            path: path.to_path_buf(),
            text,
        })
    }
}

fn parse_tree(text: &str) -> Result<tree_sitter::Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .context("failed to load Go grammar")?;
    parser.parse(text, None).context("Go parser returned no tree")
}

/// Walk the syntax tree and ask every enabled operator at every node.
/// The walk is pre-order and operators run in the order given, so the
/// result is deterministic for a given source text.
pub fn discover(file: &SourceFile, ops: &[Operator]) -> Result<Vec<Mutation>> {
    let tree = parse_tree(&file.text)?;
    let mut mutations = Vec::new();
    walk(tree.root_node(), &file.text, ops, &mut mutations);
    Ok(mutations)
}

fn walk(node: Node, source: &str, ops: &[Operator], out: &mut Vec<Mutation>) {
    for op in ops {
        op.check(node, source, out);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, ops, out);
    }
}

impl Operator {
    /// Push the mutations this operator proposes for `node`, if any.
    /// Nothing is edited here: a mutation carries the span and both
    /// snippets needed to apply and revert later.
    pub fn check(self, node: Node, source: &str, out: &mut Vec<Mutation>) {
        match self {
            Operator::Arithmetic => {
                binary_op(node, source, self.name(), operators::arithmetic_swap, out)
            }
            Operator::Comparison => {
                binary_op(node, source, self.name(), operators::comparison_swap, out)
            }
            Operator::Boundary => {
                binary_op(node, source, self.name(), operators::boundary_swap, out)
            }
            Operator::Logical => {
                binary_op(node, source, self.name(), operators::logical_swap, out)
            }
            Operator::IncDec => inc_dec(node, source, self.name(), out),
            Operator::NegateCond => negate_cond(node, source, self.name(), out),
        }
    }
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

fn binary_op(
    node: Node,
    source: &str,
    name: &'static str,
    swap: fn(&str) -> Option<&'static str>,
    out: &mut Vec<Mutation>,
) {
    if node.kind() != "binary_expression" {
        return;
    }
    let Some(op_node) = node.child_by_field_name("operator") else {
        return;
    };
    let op_text = node_text(op_node, source);
    let Some(replacement) = swap(op_text) else {
        return;
    };
    out.push(Mutation {
        operator: name,
        line: op_node.start_position().row + 1,
        column: op_node.start_position().column + 1,
        start_byte: op_node.start_byte(),
        end_byte: op_node.end_byte(),
        original: op_text.to_string(),
        replacement: replacement.to_string(),
    });
}

fn inc_dec(node: Node, source: &str, name: &'static str, out: &mut Vec<Mutation>) {
    if node.kind() != "inc_statement" && node.kind() != "dec_statement" {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let tok = node_text(child, source);
        let Some(replacement) = operators::incdec_swap(tok) else {
            continue;
        };
        out.push(Mutation {
            operator: name,
            line: child.start_position().row + 1,
            column: child.start_position().column + 1,
            start_byte: child.start_byte(),
            end_byte: child.end_byte(),
            original: tok.to_string(),
            replacement: replacement.to_string(),
        });
        return;
    }
}

fn negate_cond(node: Node, source: &str, name: &'static str, out: &mut Vec<Mutation>) {
    if node.kind() != "if_statement" {
        return;
    }
    let Some(cond) = node.child_by_field_name("condition") else {
        return;
    };
    // Conditions the comparison or logical operators already target get
    // no second mutation here.
    if cond.kind() == "binary_expression" {
        if let Some(op_node) = cond.child_by_field_name("operator") {
            if operators::negation_redundant(node_text(op_node, source)) {
                return;
            }
        }
    }
    let cond_text = node_text(cond, source);
    let replacement = match existing_negation(cond, source) {
        Some(operand) => operand.to_string(),
        None => format!("!({})", cond_text),
    };
    out.push(Mutation {
        operator: name,
        line: node.start_position().row + 1,
        column: node.start_position().column + 1,
        start_byte: cond.start_byte(),
        end_byte: cond.end_byte(),
        original: cond_text.to_string(),
        replacement,
    });
}

/// If `cond` is `!x`, return the text of `x` so the mutation strips the
/// negation instead of stacking another one.
fn existing_negation<'a>(cond: Node, source: &'a str) -> Option<&'a str> {
    if cond.kind() != "unary_expression" {
        return None;
    }
    let op = cond.child_by_field_name("operator")?;
    if node_text(op, source) != "!" {
        return None;
    }
    cond.child_by_field_name("operand")
        .map(|operand| node_text(operand, source))
}
