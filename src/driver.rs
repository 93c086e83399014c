use std::fmt;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;

/// One record of the `go test -json` event stream. Every field is
/// optional on the wire; absent fields decode to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TestEvent {
    pub time: String,
    pub action: String,
    pub package: String,
    pub test: String,
    pub elapsed: f64,
    pub output: String,
}

/// Why a run produced no event list. Mapping these onto mutation
/// statuses is the worker's job; the driver only reports what happened.
#[derive(Debug)]
pub enum DriverError {
    /// The deadline expired and the process group was killed.
    Timeout,
    /// The run was cancelled from outside; the process group was killed.
    Cancelled,
    /// The subprocess could not be launched, or exited without any
    /// decodable output on stdout. Carries whatever stderr said.
    NoOutput(String),
    /// Output was produced but not one event decoded from it.
    Parse(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Timeout => write!(f, "test run timed out"),
            DriverError::Cancelled => write!(f, "test run cancelled"),
            DriverError::NoOutput(stderr) => write!(f, "test run produced no output: {}", stderr),
            DriverError::Parse(err) => write!(f, "undecodable test output: {}", err),
        }
    }
}

/// Compile and test one package against an overlay, within `timeout`.
///
/// `go_cmd` is the toolchain binary, normally just "go"; tests inject
/// stand-in scripts here. `-count=1` defeats the result cache so the
/// variant actually recompiles and re-runs. The child gets its own
/// process group so a kill reaps compilers and test binaries too.
pub fn run(
    go_cmd: &str,
    pkg_dir: &Path,
    overlay: &Path,
    timeout: Duration,
    cancel: &AtomicBool,
) -> Result<Vec<TestEvent>, DriverError> {
    let mut cmd = Command::new(go_cmd);
    cmd.args(["test", "-count=1", "-json", "-overlay"])
        .arg(overlay)
        .arg(".")
        .current_dir(pkg_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| DriverError::NoOutput(format!("failed to run {}: {}", go_cmd, e)))?;

    // Drain both pipes off-thread so a chatty build cannot fill a pipe
    // and deadlock against our wait loop.
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_reader = thread::spawn(move || read_all(stdout));
    let err_reader = thread::spawn(move || read_all(stderr));

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {
                if cancel.load(Ordering::Relaxed) {
                    kill_group(&mut child);
                    let _ = out_reader.join();
                    let _ = err_reader.join();
                    return Err(DriverError::Cancelled);
                }
                if Instant::now() >= deadline {
                    kill_group(&mut child);
                    let _ = out_reader.join();
                    let _ = err_reader.join();
                    return Err(DriverError::Timeout);
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                kill_group(&mut child);
                let _ = out_reader.join();
                let _ = err_reader.join();
                return Err(DriverError::NoOutput(format!("wait failed: {}", e)));
            }
        }
    }

    let stdout = out_reader.join().unwrap_or_default();
    let stderr = err_reader.join().unwrap_or_default();
    parse_events(&stdout, &stderr)
}

fn read_all<R: Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

/// Kill the whole process group, then reap the direct child.
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        let pgid = child.id() as i32;
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.kill();
    }
    let _ = child.wait();
}

/// Decode the newline-delimited event stream greedily. Once one event
/// has decoded, trailing garbage is tolerated and the decoded prefix is
/// the truth; with zero events the whole run counts as unusable.
fn parse_events(stdout: &[u8], stderr: &[u8]) -> Result<Vec<TestEvent>, DriverError> {
    let text = String::from_utf8_lossy(stdout);
    let mut events = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<TestEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                if events.is_empty() {
                    return Err(DriverError::Parse(e.to_string()));
                }
                break;
            }
        }
    }
    if events.is_empty() {
        return Err(DriverError::NoOutput(
            String::from_utf8_lossy(stderr).into_owned(),
        ));
    }
    Ok(events)
}
