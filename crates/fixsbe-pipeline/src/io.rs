//! Proof-bundle and commitment file I/O.
//!
//! JSON and CBOR read/write with extension-based auto-detection:
//! unknown/missing extensions are rejected for reads and default to JSON
//! for writes.

use crate::bundle::{Commitment, ProofBundle};
use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;

/// Read a bundle from **JSON**.
pub fn read_bundle_json<P: AsRef<Path>>(path: P) -> Result<ProofBundle> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = BufReader::new(f);
    serde_json::from_reader(rdr).with_context(|| "deserialize JSON bundle")
}

/// Write a bundle to **JSON** (pretty).
pub fn write_bundle_json<P: AsRef<Path>>(path: P, bundle: &ProofBundle) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, bundle).with_context(|| "serialize JSON bundle")?;
    w.flush().with_context(|| "flush JSON writer")?;
    Ok(())
}

/// Read a bundle from **CBOR**.
pub fn read_bundle_cbor<P: AsRef<Path>>(path: P) -> Result<ProofBundle> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = BufReader::new(f);
    ciborium::de::from_reader(&mut rdr).with_context(|| "deserialize CBOR bundle")
}

/// Write a bundle to **CBOR**.
pub fn write_bundle_cbor<P: AsRef<Path>>(path: P, bundle: &ProofBundle) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    ciborium::ser::into_writer(bundle, &mut w).with_context(|| "serialize CBOR bundle")?;
    w.flush().with_context(|| "flush CBOR writer")?;
    Ok(())
}

/// Auto-detect read by extension: `.json` / `.cbor` (case-insensitive).
pub fn read_bundle_auto<P: AsRef<Path>>(path: P) -> Result<ProofBundle> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("json") => read_bundle_json(path),
        Some("cbor") => read_bundle_cbor(path),
        Some(other) => Err(anyhow!(
            "unsupported bundle extension: {other} (supported: .json, .cbor)"
        )),
        None => Err(anyhow!("path has no extension (expected .json or .cbor)")),
    }
}

/// Auto-detect write by extension (defaults to **JSON**).
pub fn write_bundle_auto<P: AsRef<Path>>(path: P, bundle: &ProofBundle) -> Result<()> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("cbor") => write_bundle_cbor(path, bundle),
        _ => write_bundle_json(path, bundle),
    }
}

/// Read a commitment from **JSON**.
pub fn read_commitment_json<P: AsRef<Path>>(path: P) -> Result<Commitment> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = BufReader::new(f);
    serde_json::from_reader(rdr).with_context(|| "deserialize JSON commitment")
}

/// Write a commitment to **JSON** (pretty).
pub fn write_commitment_json<P: AsRef<Path>>(path: P, commitment: &Commitment) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, commitment)
        .with_context(|| "serialize JSON commitment")?;
    w.flush().with_context(|| "flush JSON writer")?;
    Ok(())
}

/// Read a commitment from **CBOR**.
pub fn read_commitment_cbor<P: AsRef<Path>>(path: P) -> Result<Commitment> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = BufReader::new(f);
    ciborium::de::from_reader(&mut rdr).with_context(|| "deserialize CBOR commitment")
}

/// Write a commitment to **CBOR**.
pub fn write_commitment_cbor<P: AsRef<Path>>(path: P, commitment: &Commitment) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    ciborium::ser::into_writer(commitment, &mut w)
        .with_context(|| "serialize CBOR commitment")?;
    w.flush().with_context(|| "flush CBOR writer")?;
    Ok(())
}

/// Auto-detect read by extension: `.json` / `.cbor` (case-insensitive).
pub fn read_commitment_auto<P: AsRef<Path>>(path: P) -> Result<Commitment> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("json") => read_commitment_json(path),
        Some("cbor") => read_commitment_cbor(path),
        Some(other) => Err(anyhow!(
            "unsupported commitment extension: {other} (supported: .json, .cbor)"
        )),
        None => Err(anyhow!("path has no extension (expected .json or .cbor)")),
    }
}

/// Auto-detect write by extension (defaults to **JSON**).
pub fn write_commitment_auto<P: AsRef<Path>>(path: P, commitment: &Commitment) -> Result<()> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("cbor") => write_commitment_cbor(path, commitment),
        _ => write_commitment_json(path, commitment),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

fn ext_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
}
