//! Tetrahedralizer tables and process runner
//!
//! The tool writes two whitespace-separated tables per input surface:
//!
//! ```text
//! <stem>.1.node   header, then `id x y z [attributes] [marker]`
//! <stem>.1.ele    header, then `id n0 .. n9 [region]`
//! ```
//!
//! Both end with a trailer line. The first and last line are dropped; blank
//! lines and `#` comments in between are skipped.

use crate::cancel::CancelToken;
use crate::config::TetgenConfig;
use crate::error::{Result, TetDeckError};
use crate::mesh::geometry::round_to;
use crate::mesh::types::{Point, TET10_NODES};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Node row as written by the tool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawNode {
    pub local_id: usize,
    pub position: Point,
}

/// Element row as written by the tool, nodes in the tool's ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawElement {
    pub local_id: usize,
    pub nodes: [usize; TET10_NODES],
}

/// Both tables of one object
#[derive(Debug, Clone, Default)]
pub struct RawTetMesh {
    pub nodes: Vec<RawNode>,
    pub elements: Vec<RawElement>,
}

/// Paths of the tables produced for one input surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TetgenOutput {
    pub nodes: PathBuf,
    pub elements: PathBuf,
}

impl TetgenOutput {
    /// Tables the tool writes next to `input`: `<stem>.1.node` / `<stem>.1.ele`
    pub fn for_input(input: &Path) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = input.parent().unwrap_or_else(|| Path::new(""));
        Self {
            nodes: dir.join(format!("{}.1.node", stem)),
            elements: dir.join(format!("{}.1.ele", stem)),
        }
    }
}

/// Split a table into its data rows, returning 1-based line numbers
fn data_rows<'a>(text: &'a str, source_name: &str) -> Result<Vec<(usize, Vec<&'a str>)>> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return Err(TetDeckError::parse(
            source_name,
            lines.len(),
            "table must have a header and a trailer line",
        ));
    }

    Ok(lines[1..lines.len() - 1]
        .iter()
        .copied()
        .enumerate()
        .map(|(k, line)| (k + 2, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| (line_no, line.split_whitespace().collect()))
        .collect())
}

fn parse_real(field: &str, source_name: &str, line: usize) -> Result<f64> {
    let value: f64 = field.parse().map_err(|_| {
        TetDeckError::parse(source_name, line, format!("'{}' is not a number", field))
    })?;
    if !value.is_finite() {
        return Err(TetDeckError::parse(
            source_name,
            line,
            format!("'{}' is not a finite number", field),
        ));
    }
    Ok(value)
}

/// Largest node or element id accepted from a table
const MAX_INDEX: f64 = u32::MAX as f64;

fn parse_index(field: &str, source_name: &str, line: usize) -> Result<usize> {
    let value = parse_real(field, source_name, line)?.round();
    if value < 0.0 {
        return Err(TetDeckError::parse(
            source_name,
            line,
            format!("index {} is negative", field),
        ));
    }
    if value > MAX_INDEX {
        return Err(TetDeckError::parse(
            source_name,
            line,
            format!("index {} is out of range", field),
        ));
    }
    Ok(value as usize)
}

fn require_fields(fields: &[&str], min: usize, source_name: &str, line: usize) -> Result<()> {
    if fields.len() < min {
        return Err(TetDeckError::parse(
            source_name,
            line,
            format!("expected at least {} fields, found {}", min, fields.len()),
        ));
    }
    Ok(())
}

/// Parse a node table, rounding coordinates to `precision` decimals
pub fn parse_node_table(text: &str, source_name: &str, precision: u32) -> Result<Vec<RawNode>> {
    data_rows(text, source_name)?
        .into_iter()
        .map(|(line, fields)| {
            require_fields(&fields, 4, source_name, line)?;
            let local_id = parse_index(fields[0], source_name, line)?;
            let coord = |i: usize| -> Result<f64> {
                Ok(round_to(parse_real(fields[i], source_name, line)?, precision))
            };
            Ok(RawNode {
                local_id,
                position: Point::new(coord(1)?, coord(2)?, coord(3)?),
            })
        })
        .collect()
}

/// Parse a 10-node element table
pub fn parse_element_table(text: &str, source_name: &str) -> Result<Vec<RawElement>> {
    data_rows(text, source_name)?
        .into_iter()
        .map(|(line, fields)| {
            require_fields(&fields, TET10_NODES + 1, source_name, line)?;
            let local_id = parse_index(fields[0], source_name, line)?;
            let mut nodes = [0usize; TET10_NODES];
            for (slot, field) in fields[1..=TET10_NODES].iter().enumerate() {
                nodes[slot] = parse_index(field, source_name, line)?;
            }
            Ok(RawElement { local_id, nodes })
        })
        .collect()
}

/// Read a table, keeping its path in the error message
fn read_table_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        TetDeckError::IoError(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

/// Read and parse both tables from disk
pub fn read_tables(nodes_path: &Path, elements_path: &Path, precision: u32) -> Result<RawTetMesh> {
    let node_text = read_table_text(nodes_path)?;
    let element_text = read_table_text(elements_path)?;

    let nodes = parse_node_table(&node_text, &nodes_path.display().to_string(), precision)?;
    let elements = parse_element_table(&element_text, &elements_path.display().to_string())?;

    log::debug!(
        "Read {} nodes from {:?} and {} elements from {:?}",
        nodes.len(),
        nodes_path,
        elements.len(),
        elements_path
    );

    Ok(RawTetMesh { nodes, elements })
}

/// Runs the external tetrahedralizer with a bounded wait
#[derive(Debug, Clone)]
pub struct TetgenRunner {
    executable: PathBuf,
    flags: Vec<String>,
    timeout: Duration,
    poll_interval: Duration,
}

impl TetgenRunner {
    pub fn new(executable: impl Into<PathBuf>, flags: Vec<String>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            flags,
            timeout,
            poll_interval: Duration::from_millis(20),
        }
    }

    pub fn from_config(config: &TetgenConfig) -> Self {
        Self::new(
            config.executable.clone(),
            config.flags.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Tetrahedralize `input` and return the paths of the produced tables
    ///
    /// The tool's console output goes to `<stem>.log` next to the input.
    pub fn run(&self, object: &str, input: &Path, cancel: &CancelToken) -> Result<TetgenOutput> {
        let failure = |reason: String| TetDeckError::TetrahedralizationFailure {
            object: object.to_string(),
            reason,
        };

        let output = TetgenOutput::for_input(input);
        // Stale tables from an earlier run must not pass for fresh output
        for stale in [&output.nodes, &output.elements] {
            if stale.exists() {
                std::fs::remove_file(stale)?;
            }
        }

        let log_path = input.with_extension("log");
        let log_file = File::create(&log_path)?;
        let log_err = log_file.try_clone()?;

        log::info!(
            "Running {} {} {}",
            self.executable.display(),
            self.flags.join(" "),
            input.display()
        );

        let mut child = Command::new(&self.executable)
            .args(&self.flags)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_err))
            .spawn()
            .map_err(|e| {
                failure(format!(
                    "failed to start '{}': {}",
                    self.executable.display(),
                    e
                ))
            })?;

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(TetDeckError::Cancelled(format!(
                    "while tetrahedralizing '{}'",
                    object
                )));
            }
            if start.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(failure(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f64()
                )));
            }
            std::thread::sleep(self.poll_interval);
        };

        log::debug!(
            "Tetrahedralizer finished in {:.2}s with {}",
            start.elapsed().as_secs_f64(),
            status
        );

        if !status.success() {
            return Err(failure(format!(
                "exited with {}{}",
                status,
                log_tail(&log_path)
            )));
        }

        for produced in [&output.nodes, &output.elements] {
            if !produced.exists() {
                return Err(failure(format!(
                    "expected output file {} was not produced",
                    produced.display()
                )));
            }
        }

        Ok(output)
    }
}

/// Last few lines of the tool's console log, for error messages
fn log_tail(path: &Path) -> String {
    const TAIL_LINES: usize = 5;

    let Ok(text) = std::fs::read_to_string(path) else {
        return String::new();
    };
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return String::new();
    }
    let tail = &lines[lines.len().saturating_sub(TAIL_LINES)..];
    format!(" (log: {})", tail.join(" | "))
}
