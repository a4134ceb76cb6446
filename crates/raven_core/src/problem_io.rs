//! Writing generated problems to disk and reading them back.
//!
//! A path ending in `.json` gets pretty-printed JSON, which is convenient for
//! inspecting a puzzle by hand. Anything else, conventionally `.ravenprob`,
//! gets a bincode payload behind an 8-byte `RAVENPRB` tag, a little-endian
//! `u32` format version and a `u64` payload length. Loading re-validates every
//! element, so a tampered file fails instead of yielding an invalid problem.
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use raven_core::{generate_problem, load_problem, save_problem, GeneratorConfig};
//!
//! let problem = generate_problem(&GeneratorConfig::default())?;
//! save_problem(&problem, "out/problem_0.ravenprob")?;
//! assert_eq!(load_problem("out/problem_0.ravenprob")?, problem);
//! # Ok(())
//! # }
//! ```

use crate::problem::Problem;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Leading tag of a binary problem file.
const MAGIC: &[u8; 8] = b"RAVENPRB";

/// Highest binary version this build reads and the one it writes.
const VERSION: u32 = 1;

/// Payloads above this size are treated as corrupt headers.
const MAX_PAYLOAD: u64 = 64 * 1024 * 1024;

/// Failures while reading or writing a problem file.
#[derive(Debug, Error)]
pub enum ProblemIoError {
    #[error("problem file i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("binary problem payload: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("json problem payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not a problem file: {0}")]
    InvalidFormat(String),
    #[error("problem file version {0} is newer than this build")]
    UnsupportedVersion(u32),
}

/// Result type for problem I/O operations.
pub type ProblemIoResult<T> = Result<T, ProblemIoError>;

fn is_json(path: &Path) -> bool {
    path.to_string_lossy().to_lowercase().ends_with(".json")
}

/// Save a problem, choosing the format by extension (`.json` or binary).
pub fn save_problem<P: AsRef<Path>>(problem: &Problem, path: P) -> ProblemIoResult<()> {
    let path = path.as_ref();
    if is_json(path) {
        save_problem_json(problem, path)
    } else {
        save_problem_binary(problem, path)
    }
}

/// Load a problem, choosing the format by extension (`.json` or binary).
pub fn load_problem<P: AsRef<Path>>(path: P) -> ProblemIoResult<Problem> {
    let path = path.as_ref();
    if is_json(path) {
        load_problem_json(path)
    } else {
        load_problem_binary(path)
    }
}

pub fn save_problem_binary<P: AsRef<Path>>(problem: &Problem, path: P) -> ProblemIoResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;

    let data = bincode::serialize(problem)?;
    writer.write_all(&(data.len() as u64).to_le_bytes())?;
    writer.write_all(&data)?;
    writer.flush()?;
    Ok(())
}

pub fn load_problem_binary<P: AsRef<Path>>(path: P) -> ProblemIoResult<Problem> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(ProblemIoError::InvalidFormat(
            "invalid magic bytes - not a problem file".to_string(),
        ));
    }

    let mut version_bytes = [0u8; 4];
    reader.read_exact(&mut version_bytes)?;
    let version = u32::from_le_bytes(version_bytes);
    if version > VERSION {
        return Err(ProblemIoError::UnsupportedVersion(version));
    }

    let mut size_bytes = [0u8; 8];
    reader.read_exact(&mut size_bytes)?;
    let size = u64::from_le_bytes(size_bytes);
    if size > MAX_PAYLOAD {
        return Err(ProblemIoError::InvalidFormat(format!(
            "payload of {} bytes exceeds the {} byte limit",
            size, MAX_PAYLOAD
        )));
    }
    let mut data = vec![0u8; size as usize];
    reader.read_exact(&mut data)?;

    Ok(bincode::deserialize(&data)?)
}

pub fn save_problem_json<P: AsRef<Path>>(problem: &Problem, path: P) -> ProblemIoResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, problem)?;
    Ok(())
}

pub fn load_problem_json<P: AsRef<Path>>(path: P) -> ProblemIoResult<Problem> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
