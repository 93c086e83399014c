/// Mutation operator definitions for Go.
/// Each table maps an operator token to its mutated form; the catalog
/// itself is the `Operator` enum, constructed explicitly at startup.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Arithmetic,
    Comparison,
    Boundary,
    Logical,
    IncDec,
    NegateCond,
}

/// The full catalog, in the order operators are asked per node.
pub const ALL: &[Operator] = &[
    Operator::Arithmetic,
    Operator::Comparison,
    Operator::Boundary,
    Operator::Logical,
    Operator::IncDec,
    Operator::NegateCond,
];

impl Operator {
    pub fn name(self) -> &'static str {
        match self {
            Operator::Arithmetic => "Arithmetic",
            Operator::Comparison => "Comparison",
            Operator::Boundary => "Boundary",
            Operator::Logical => "Logical",
            Operator::IncDec => "IncDec",
            Operator::NegateCond => "NegateCond",
        }
    }

    pub fn from_name(name: &str) -> Option<Operator> {
        ALL.iter().copied().find(|op| op.name() == name)
    }
}

/// Swap within arithmetic pairs: + ↔ -, * ↔ /.
pub fn arithmetic_swap(op: &str) -> Option<&'static str> {
    match op {
        "+" => Some("-"),
        "-" => Some("+"),
        "*" => Some("/"),
        "/" => Some("*"),
        _ => None,
    }
}

/// Swap a comparison for its logical negation.
pub fn comparison_swap(op: &str) -> Option<&'static str> {
    match op {
        "==" => Some("!="),
        "!=" => Some("=="),
        "<" => Some(">="),
        ">=" => Some("<"),
        ">" => Some("<="),
        "<=" => Some(">"),
        _ => None,
    }
}

/// Relax or tighten a boundary check: < ↔ <=, > ↔ >=.
pub fn boundary_swap(op: &str) -> Option<&'static str> {
    match op {
        "<" => Some("<="),
        "<=" => Some("<"),
        ">" => Some(">="),
        ">=" => Some(">"),
        _ => None,
    }
}

/// && ↔ ||.
pub fn logical_swap(op: &str) -> Option<&'static str> {
    match op {
        "&&" => Some("||"),
        "||" => Some("&&"),
        _ => None,
    }
}

/// ++ ↔ --.
pub fn incdec_swap(op: &str) -> Option<&'static str> {
    match op {
        "++" => Some("--"),
        "--" => Some("++"),
        _ => None,
    }
}

/// True when an `if` condition built from this operator is already
/// targeted by the comparison or logical tables, so negating the whole
/// condition would duplicate their coverage.
pub fn negation_redundant(op: &str) -> bool {
    comparison_swap(op).is_some() || logical_swap(op).is_some()
}
