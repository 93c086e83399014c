use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};

use crate::coverage::Coverage;
use crate::driver::{self, DriverError, TestEvent};
use crate::mutants::{Mutation, MutationOutcome, MutationStatus, Report};
use crate::operators::{self, Operator};
use crate::output;
use crate::overlay;
use crate::parser::{self, SourceFile};

pub struct Config {
    /// Parallel test workers. 0 means one per hardware thread.
    pub workers: usize,
    /// Per-mutation test deadline. Zero falls back to ten seconds.
    pub timeout: Duration,
    /// Seed for `shuffle`. Only meaningful when shuffling.
    pub seed: u64,
    /// Process files in a seeded random order instead of caller order.
    pub shuffle: bool,
    pub verbose: bool,
    /// Root under which each worker creates its private workspace.
    pub mutation_dir: PathBuf,
    /// Pre-existing line-coverage profile to filter mutations by.
    pub coverage_profile: PathBuf,
    /// Enabled operators. Empty means the full catalog.
    pub operators: Vec<Operator>,
    /// Toolchain binary; overridable so tests can inject stand-ins.
    pub go_cmd: String,
    /// Set from outside to stop the run; in-flight mutations are still
    /// reverted, unstarted ones are discarded.
    pub cancel: Arc<AtomicBool>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            workers: 0,
            timeout: Duration::from_secs(10),
            seed: 0,
            shuffle: false,
            verbose: false,
            mutation_dir: std::env::temp_dir().join("gomutate"),
            coverage_profile: PathBuf::new(),
            operators: Vec::new(),
            go_cmd: "go".to_string(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// One parsed file plus every covered mutation discovered in it. The
/// whole batch moves into a single worker, so exactly one thread ever
/// edits a given buffer and intra-file mutations run in discovery
/// order.
struct FileTask {
    source: SourceFile,
    mutations: Vec<Mutation>,
}

/// Run the whole pipeline: parse, discover, filter by coverage, fan the
/// surviving mutations out to workers and aggregate the results.
/// One line per mutation is streamed to `sink`; the report is returned
/// once the results channel drains.
pub fn run<W: Write + Send>(files: &[PathBuf], config: &Config, sink: &mut W) -> Result<Report> {
    if files.is_empty() {
        bail!("no files to mutate");
    }
    let workers = if config.workers == 0 {
        num_cpus::get()
    } else {
        config.workers
    };
    let timeout = if config.timeout.is_zero() {
        Duration::from_secs(10)
    } else {
        config.timeout
    };
    let enabled: Vec<Operator> = if config.operators.is_empty() {
        operators::ALL.to_vec()
    } else {
        config.operators.clone()
    };

    let coverage = Coverage::load(&config.coverage_profile)?;

    let mut order: Vec<&PathBuf> = files.iter().collect();
    if config.shuffle {
        fastrand::Rng::with_seed(config.seed).shuffle(&mut order);
    }

    std::fs::create_dir_all(&config.mutation_dir)
        .with_context(|| format!("failed to create {}", config.mutation_dir.display()))?;
    // Overlay mappings must be absolute, so resolve the root once here
    // rather than in every worker.
    let workspace_root = std::fs::canonicalize(&config.mutation_dir)
        .with_context(|| format!("failed to resolve {}", config.mutation_dir.display()))?;

    let (task_tx, task_rx) = bounded::<FileTask>(workers * 2);
    let (result_tx, result_rx) = bounded::<MutationOutcome>(workers * 2);

    let report = std::thread::scope(|s| {
        let aggregator = s.spawn(move || {
            let mut report = Report::default();
            for outcome in result_rx {
                report.record(&outcome);
                let _ = writeln!(sink, "{}", outcome.report_line());
            }
            report
        });

        for id in 0..workers {
            let tasks = task_rx.clone();
            let results = result_tx.clone();
            let root = workspace_root.clone();
            s.spawn(move || worker_loop(id, tasks, results, config, root, timeout));
        }
        drop(task_rx);

        produce(&order, &enabled, &coverage, config, &task_tx, &result_tx);

        drop(task_tx);
        drop(result_tx);
        aggregator.join().expect("aggregator panicked")
    });

    Ok(report)
}

/// Parse each file, ask the catalog, and split candidates on coverage:
/// uncovered ones short-circuit straight to the aggregator, covered
/// ones travel to the pool. Files that fail to parse are skipped.
fn produce(
    order: &[&PathBuf],
    enabled: &[Operator],
    coverage: &Coverage,
    config: &Config,
    tasks: &Sender<FileTask>,
    results: &Sender<MutationOutcome>,
) {
    for path in order {
        if config.cancel.load(Ordering::Relaxed) {
            break;
        }
        if config.verbose {
            output::print_notice(&format!("processing {}", path.display()));
        }
        let source = match SourceFile::load(path) {
            Ok(source) => source,
            Err(e) => {
                if config.verbose {
                    output::print_notice(&format!("skipping: {}", e));
                }
                continue;
            }
        };
        let discovered = match parser::discover(&source, enabled) {
            Ok(mutations) => mutations,
            Err(e) => {
                if config.verbose {
                    output::print_notice(&format!("skipping {}: {}", path.display(), e));
                }
                continue;
            }
        };
        let mut covered = Vec::new();
        for mutation in discovered {
            if coverage.is_covered(&source.path, mutation.line) {
                covered.push(mutation);
            } else {
                // Provably unkillable: no worker, no subprocess.
                let _ = results.send(MutationOutcome {
                    operator: mutation.operator,
                    file: source.path.clone(),
                    line: mutation.line,
                    column: mutation.column,
                    status: MutationStatus::Uncovered,
                    build_failure: false,
                    original: mutation.original,
                    replacement: mutation.replacement,
                });
            }
        }
        if !covered.is_empty() {
            let _ = tasks.send(FileTask {
                source,
                mutations: covered,
            });
        }
    }
}

fn worker_loop(
    id: usize,
    tasks: Receiver<FileTask>,
    results: Sender<MutationOutcome>,
    config: &Config,
    workspace_root: PathBuf,
    timeout: Duration,
) {
    let workspace = workspace_root.join(format!("worker-{}", id));
    if let Err(e) = std::fs::create_dir_all(&workspace) {
        output::print_error(&format!(
            "worker {}: failed to create workspace: {}",
            id, e
        ));
        return;
    }
    let overlay_path = workspace.join("overlay.json");

    'tasks: for mut task in tasks {
        if config.cancel.load(Ordering::Relaxed) {
            break;
        }
        let variant_path = workspace.join(task.source.path.file_name().unwrap_or_default());
        let pkg_dir = task
            .source
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mutations = std::mem::take(&mut task.mutations);

        for mutation in &mutations {
            if config.cancel.load(Ordering::Relaxed) {
                break 'tasks;
            }
            mutation.apply(&mut task.source.text);
            let classified = run_one(
                &task.source,
                &variant_path,
                &overlay_path,
                &pkg_dir,
                config,
                timeout,
            );
            // Revert before anything else so the buffer is pristine on
            // every path out of this iteration.
            mutation.revert(&mut task.source.text);

            match classified {
                Ok(Some((status, build_failure))) => {
                    let _ = results.send(MutationOutcome {
                        operator: mutation.operator,
                        file: task.source.path.clone(),
                        line: mutation.line,
                        column: mutation.column,
                        status,
                        build_failure,
                        original: mutation.original.clone(),
                        replacement: mutation.replacement.clone(),
                    });
                }
                // Cancelled mid-run; drop the rest of the batch.
                Ok(None) => break 'tasks,
                Err(e) => {
                    // Workspace I/O trouble: skip this mutation only.
                    if config.verbose {
                        output::print_notice(&format!("worker {}: {}", id, e));
                    }
                }
            }
        }
    }

    let _ = std::fs::remove_dir_all(&workspace);
}

/// Serialize the mutated buffer, point the overlay at it, drive the
/// test subprocess and classify what came back.
fn run_one(
    source: &SourceFile,
    variant: &Path,
    overlay_path: &Path,
    pkg_dir: &Path,
    config: &Config,
    timeout: Duration,
) -> Result<Option<(MutationStatus, bool)>> {
    overlay::write_variant(variant, &source.text)?;
    let mut mapping = HashMap::new();
    mapping.insert(source.path.clone(), variant.to_path_buf());
    overlay::write_overlay(overlay_path, &mapping)?;

    let outcome = driver::run(&config.go_cmd, pkg_dir, overlay_path, timeout, &config.cancel);
    Ok(classify(outcome))
}

/// A failing test kills; a timeout kills; a run that
/// never produced events means the mutation broke the build, which is
/// credited as a kill with the build-failure flag. "skip" events count
/// as neither pass nor fail. `None` means the run was cancelled and no
/// result should be emitted.
fn classify(outcome: Result<Vec<TestEvent>, DriverError>) -> Option<(MutationStatus, bool)> {
    match outcome {
        Ok(events) => {
            if events.iter().any(|e| e.action == "fail") {
                Some((MutationStatus::Killed, false))
            } else {
                Some((MutationStatus::Survived, false))
            }
        }
        Err(DriverError::Timeout) => Some((MutationStatus::KilledTimeout, false)),
        Err(DriverError::Cancelled) => None,
        Err(DriverError::NoOutput(_)) | Err(DriverError::Parse(_)) => {
            Some((MutationStatus::Killed, true))
        }
    }
}
