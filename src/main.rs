use gomutate::engine::{self, Config};
use gomutate::operators::{self, Operator};
use gomutate::output;

use std::path::{Path, PathBuf};
use std::process;
use std::process::Command as GoCommand;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gomutate", version, about = "Mutation testing for Go modules")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run mutation testing on the given Go files or ./... patterns
    Run {
        /// Go source files, or package patterns containing `...`
        files: Vec<String>,
        /// Existing coverage profile (default: generate one with
        /// `go test -coverprofile` at the module root)
        #[arg(long)]
        coverage: Option<PathBuf>,
        /// Directory for worker workspaces (default: a fresh temp dir)
        #[arg(long)]
        mutation_dir: Option<PathBuf>,
        /// Parallel test workers (default: one per hardware thread)
        #[arg(short, long, default_value_t = 0)]
        workers: usize,
        /// Per-mutation test timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,
        /// Process files in random order
        #[arg(long)]
        shuffle: bool,
        /// Seed for --shuffle (default: random)
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Comma-separated operator names to enable (default: all)
        #[arg(long, value_delimiter = ',')]
        operators: Vec<String>,
        /// Verbose progress output
        #[arg(short, long)]
        verbose: bool,
        /// Go toolchain binary
        #[arg(long, default_value = "go")]
        go: String,
    },
    /// List available mutation operators
    Operators,
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Run {
            files,
            coverage,
            mutation_dir,
            workers,
            timeout,
            shuffle,
            seed,
            operators,
            verbose,
            go,
        } => cmd_run(RunArgs {
            files,
            coverage,
            mutation_dir,
            workers,
            timeout,
            shuffle,
            seed,
            operators,
            verbose,
            go,
        }),
        Commands::Operators => cmd_operators(),
    };

    process::exit(exit_code);
}

struct RunArgs {
    files: Vec<String>,
    coverage: Option<PathBuf>,
    mutation_dir: Option<PathBuf>,
    workers: usize,
    timeout: u64,
    shuffle: bool,
    seed: u64,
    operators: Vec<String>,
    verbose: bool,
    go: String,
}

fn cmd_run(args: RunArgs) -> i32 {
    if args.files.is_empty() {
        output::print_error("no files or patterns given");
        return 2;
    }

    let enabled = match resolve_operators(&args.operators) {
        Ok(ops) => ops,
        Err(e) => {
            output::print_error(&e.to_string());
            return 2;
        }
    };

    let files = match expand_patterns(&args.files, &args.go) {
        Ok(files) => files,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            return 2;
        }
    };
    if files.is_empty() {
        output::print_error("no Go files found to mutate");
        return 2;
    }

    // Own the temp dir guard for the run's duration when no explicit
    // mutation dir was given.
    let (mutation_dir, _tmp_guard) = match args.mutation_dir {
        Some(dir) => (dir, None),
        None => match tempfile::Builder::new().prefix("gomutate-").tempdir() {
            Ok(tmp) => (tmp.path().to_path_buf(), Some(tmp)),
            Err(e) => {
                output::print_error(&format!("failed to create temp directory: {}", e));
                return 2;
            }
        },
    };

    let coverage_profile = match args.coverage {
        Some(path) => path,
        None => {
            let profile = mutation_dir.join("coverage.out");
            let module_root = find_module_root(&files[0]);
            println!("Generating coverage profile in {}...", module_root.display());
            if let Err(e) = generate_coverage(&args.go, &module_root, &profile) {
                output::print_error(&format!("{:#}", e));
                return 2;
            }
            profile
        }
    };

    let seed = if args.seed == 0 {
        fastrand::u64(1..)
    } else {
        args.seed
    };
    if args.shuffle {
        println!("Seed: {}", seed);
    }

    let config = Config {
        workers: args.workers,
        timeout: Duration::from_secs(args.timeout),
        seed,
        shuffle: args.shuffle,
        verbose: args.verbose,
        mutation_dir,
        coverage_profile,
        operators: enabled,
        go_cmd: args.go,
        ..Config::default()
    };

    let mut stdout = std::io::stdout();
    match engine::run(&files, &config, &mut stdout) {
        Ok(report) => {
            output::print_report(&report);
            if report.survived + report.uncovered > 0 {
                1
            } else {
                0
            }
        }
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            2
        }
    }
}

fn cmd_operators() -> i32 {
    for op in operators::ALL {
        println!("{}", op.name());
    }
    0
}

fn resolve_operators(names: &[String]) -> Result<Vec<Operator>> {
    names
        .iter()
        .map(|name| {
            Operator::from_name(name).with_context(|| {
                let known: Vec<&str> = operators::ALL.iter().map(|op| op.name()).collect();
                format!("unknown operator {} (known: {})", name, known.join(", "))
            })
        })
        .collect()
}

/// Expand `...` package patterns into absolute Go file paths via
/// `go list`; plain arguments pass through absolutized. A pattern the
/// toolchain cannot expand falls back to being treated as a file path.
fn expand_patterns(args: &[String], go: &str) -> Result<Vec<PathBuf>> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let mut files = Vec::new();
    for arg in args {
        if !arg.contains("...") {
            files.push(absolutize(&cwd, Path::new(arg)));
            continue;
        }
        let names = go_list(go, arg, "{{range .GoFiles}}{{.}} {{end}}");
        let dirs = go_list(go, arg, "{{.Dir}}");
        match (names, dirs) {
            (Ok(names), Ok(dirs)) => {
                for (dir, list) in dirs.lines().zip(names.lines()) {
                    for file in list.split_whitespace() {
                        files.push(Path::new(dir).join(file));
                    }
                }
            }
            _ => files.push(absolutize(&cwd, Path::new(arg))),
        }
    }
    Ok(files)
}

fn go_list(go: &str, pattern: &str, format: &str) -> Result<String> {
    let out = GoCommand::new(go)
        .args(["list", "-f", format, pattern])
        .output()
        .with_context(|| format!("failed to run {} list", go))?;
    if !out.status.success() {
        bail!(
            "{} list {} failed: {}",
            go,
            pattern,
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Walk up from `start` looking for the directory that holds go.mod.
fn find_module_root(start: &Path) -> PathBuf {
    let origin = if start.is_file() {
        start.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        start.to_path_buf()
    };
    let mut dir = origin.clone();
    loop {
        if dir.join("go.mod").exists() {
            return dir;
        }
        if !dir.pop() {
            break;
        }
    }
    origin
}

fn generate_coverage(go: &str, module_root: &Path, profile: &Path) -> Result<()> {
    let out = GoCommand::new(go)
        .arg("test")
        .arg(format!("-coverprofile={}", profile.display()))
        .arg("./...")
        .current_dir(module_root)
        .output()
        .with_context(|| format!("failed to run {} test", go))?;
    if !out.status.success() {
        bail!(
            "coverage generation failed:\n{}{}",
            String::from_utf8_lossy(&out.stdout),
            String::from_utf8_lossy(&out.stderr)
        );
    }
    Ok(())
}
