use std::fmt;
use std::path::PathBuf;

/// A single reversible edit, produced by the catalog and consumed
/// exactly once by a worker. `start_byte..end_byte` addresses the
/// original text; `original` is the exact slice at that span so the
/// edit can be undone byte for byte.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub operator: &'static str,
    pub line: usize,
    pub column: usize,
    pub start_byte: usize,
    pub end_byte: usize,
    pub original: String,
    pub replacement: String,
}

impl Mutation {
    /// Splice the replacement over the recorded span.
    pub fn apply(&self, text: &mut String) {
        text.replace_range(self.start_byte..self.end_byte, &self.replacement);
    }

    /// Undo `apply`. Valid only while this mutation is the one applied
    /// to `text`; the buffer comes back byte-identical.
    pub fn revert(&self, text: &mut String) {
        let end = self.start_byte + self.replacement.len();
        text.replace_range(self.start_byte..end, &self.original);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Killed,
    KilledTimeout,
    Survived,
    Uncovered,
}

impl fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MutationStatus::Killed => "killed",
            MutationStatus::KilledTimeout => "killed (timeout)",
            MutationStatus::Survived => "survived",
            MutationStatus::Uncovered => "survived (uncovered)",
        };
        f.write_str(s)
    }
}

/// One classified mutation, as emitted to the aggregator.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub operator: &'static str,
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub status: MutationStatus,
    pub build_failure: bool,
    pub original: String,
    pub replacement: String,
}

impl MutationOutcome {
    pub fn report_line(&self) -> String {
        format!(
            "{}-{}:{}:{}: {}",
            self.operator,
            self.file.display(),
            self.line,
            self.column,
            self.status,
        )
    }
}

/// Aggregated counters for a whole run.
#[derive(Debug, Default, Clone)]
pub struct Report {
    pub total: usize,
    pub killed: usize,
    pub timeouts: usize,
    pub survived: usize,
    pub uncovered: usize,
    pub build_failures: usize,
    pub survivors: Vec<MutationOutcome>,
}

impl Report {
    pub fn record(&mut self, outcome: &MutationOutcome) {
        self.total += 1;
        match outcome.status {
            MutationStatus::Killed => self.killed += 1,
            MutationStatus::KilledTimeout => self.timeouts += 1,
            MutationStatus::Survived => {
                self.survived += 1;
                self.survivors.push(outcome.clone());
            }
            MutationStatus::Uncovered => self.uncovered += 1,
        }
        if outcome.build_failure {
            self.build_failures += 1;
        }
    }

    /// Killed fraction of all attempted mutations, as a percentage.
    /// Timeouts count as kills.
    pub fn score(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.killed + self.timeouts) as f64 / self.total as f64 * 100.0
    }
}
