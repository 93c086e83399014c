use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

/// The build-redirection document understood by `go build -overlay`: a
/// single `Replace` map from original source paths to variant paths.
#[derive(Debug, Serialize)]
struct Descriptor<'a> {
    #[serde(rename = "Replace")]
    replace: &'a HashMap<PathBuf, PathBuf>,
}

/// Write the (possibly mutated) source text to `dest`, flushed before
/// returning so the compiler sees complete bytes.
pub fn write_variant(dest: &Path, text: &str) -> Result<()> {
    let mut f = File::create(dest)
        .with_context(|| format!("failed to create variant {}", dest.display()))?;
    f.write_all(text.as_bytes())
        .and_then(|_| f.flush())
        .with_context(|| format!("failed to write variant {}", dest.display()))?;
    Ok(())
}

/// Write the overlay descriptor, truncating any previous one at `dest`.
/// The Go toolchain resolves overlay entries literally, so both sides
/// of every mapping must be absolute.
pub fn write_overlay(dest: &Path, mapping: &HashMap<PathBuf, PathBuf>) -> Result<()> {
    for (original, variant) in mapping {
        if !original.is_absolute() || !variant.is_absolute() {
            bail!(
                "overlay paths must be absolute: {} => {}",
                original.display(),
                variant.display()
            );
        }
    }
    let data = serde_json::to_vec(&Descriptor { replace: mapping })
        .context("failed to encode overlay descriptor")?;
    let mut f = File::create(dest)
        .with_context(|| format!("failed to create overlay {}", dest.display()))?;
    f.write_all(&data)
        .and_then(|_| f.flush())
        .with_context(|| format!("failed to write overlay {}", dest.display()))?;
    Ok(())
}
