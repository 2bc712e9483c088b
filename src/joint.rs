//! Transverse joint opening extraction from contact printout logs
//!
//! The solver's text log prints one `CONTACT OUTPUT` block per joint: a
//! header line carrying the joint label, five preamble lines, then one row
//! per contact node (`node  CL|OP  opening ...`) terminated by a blank line.
//! Dynamic runs repeat the whole block group once per `INCREMENT ... SUMMARY`
//! section. Openings are logged in meters; reductions convert to mm.

use crate::error::{PostError, PostResult};
use log::debug;
use serde::{Deserialize, Serialize};

/// Clamp threshold for dynamic envelopes, mm. Anything at or below is
/// numerical noise from nominally closed joints.
pub const NOISE_OPENING_MM: f64 = 5e-6;

/// One contact node record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointRow {
    pub node: i64,
    pub open: bool,
    /// Opening in meters as logged.
    pub opening: f64,
}

/// All frames of one joint, identified by its header label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointSeries {
    pub label: String,
    pub frames: Vec<Vec<JointRow>>,
}

impl JointSeries {
    pub fn node_ids(&self) -> Vec<i64> {
        self.frames
            .first()
            .map(|rows| rows.iter().map(|r| r.node).collect())
            .unwrap_or_default()
    }
}

fn parse_row(line: &str) -> PostResult<JointRow> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(PostError::JointRecordParse(format!(
            "short contact row: {line:?}"
        )));
    }
    let node: i64 = fields[0]
        .parse()
        .map_err(|_| PostError::JointRecordParse(format!("bad node id in row: {line:?}")))?;
    let open = match fields[1] {
        "CL" => false,
        "OP" => true,
        other => {
            return Err(PostError::JointRecordParse(format!(
                "unknown contact status {other:?}"
            )))
        }
    };
    let opening: f64 = fields[2]
        .parse()
        .map_err(|_| PostError::JointRecordParse(format!("bad opening in row: {line:?}")))?;
    Ok(JointRow {
        node,
        open,
        opening,
    })
}

/// Parse one `CONTACT OUTPUT` block starting at `lines[start]` (the header).
/// Returns the label, the rows and the index of the line after the blank
/// terminator.
fn parse_block(lines: &[&str], start: usize) -> PostResult<(String, Vec<JointRow>, usize)> {
    let label = lines[start].trim().to_string();
    let mut i = start + 1 + 5;
    if i > lines.len() {
        return Err(PostError::JointRecordParse(format!(
            "truncated preamble after {label:?}"
        )));
    }
    let mut rows = Vec::new();
    loop {
        match lines.get(i) {
            None => {
                return Err(PostError::JointRecordParse(format!(
                    "missing blank terminator after {label:?}"
                )))
            }
            Some(line) if line.trim().is_empty() => break,
            Some(line) => {
                rows.push(parse_row(line)?);
                i += 1;
            }
        }
    }
    if rows.is_empty() {
        return Err(PostError::JointRecordParse(format!(
            "empty contact block {label:?}"
        )));
    }
    Ok((label, rows, i + 1))
}

fn is_increment_header(line: &str) -> bool {
    line.contains("INCREMENT") && line.contains("SUMMARY")
}

/// Extract every joint from a static log: one frame per joint.
pub fn extract_static(log: &str) -> PostResult<Vec<JointSeries>> {
    let lines: Vec<&str> = log.lines().collect();
    let mut series = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].contains("CONTACT OUTPUT") {
            let (label, rows, next) = parse_block(&lines, i)?;
            series.push(JointSeries {
                label,
                frames: vec![rows],
            });
            i = next;
        } else {
            i += 1;
        }
    }
    debug!("parsed {} static joint blocks", series.len());
    Ok(series)
}

/// Extract every joint from a dynamic log. The first block group (before any
/// increment header) establishes the joint order; every increment must then
/// repeat the same joints with the same node counts.
pub fn extract_dynamic(log: &str) -> PostResult<Vec<JointSeries>> {
    let lines: Vec<&str> = log.lines().collect();
    let mut series: Vec<JointSeries> = Vec::new();
    let mut joint_idx = 0;
    let mut in_increment = false;
    let mut i = 0;
    while i < lines.len() {
        if is_increment_header(lines[i]) {
            if in_increment && joint_idx != series.len() {
                return Err(PostError::JointRecordParse(format!(
                    "increment carried {} of {} joints",
                    joint_idx,
                    series.len()
                )));
            }
            in_increment = true;
            joint_idx = 0;
            i += 1;
        } else if lines[i].contains("CONTACT OUTPUT") {
            let (label, rows, next) = parse_block(&lines, i)?;
            if !in_increment {
                series.push(JointSeries {
                    label,
                    frames: vec![rows],
                });
            } else {
                let slot = series.get_mut(joint_idx).ok_or_else(|| {
                    PostError::JointRecordParse(format!(
                        "increment has more joints than the base frame ({label:?})"
                    ))
                })?;
                if rows.len() != slot.frames[0].len() {
                    return Err(PostError::JointRecordParse(format!(
                        "joint {:?} node count changed from {} to {}",
                        slot.label,
                        slot.frames[0].len(),
                        rows.len()
                    )));
                }
                slot.frames.push(rows);
                joint_idx += 1;
            }
            i = next;
        } else {
            i += 1;
        }
    }
    if in_increment && joint_idx != series.len() {
        return Err(PostError::JointRecordParse(format!(
            "final increment carried {} of {} joints",
            joint_idx,
            series.len()
        )));
    }
    let counts: Vec<usize> = series.iter().map(|s| s.frames.len()).collect();
    if let (Some(&first), true) = (counts.first(), counts.len() > 1) {
        if counts.iter().any(|&c| c != first) {
            return Err(PostError::JointRecordParse(format!(
                "uneven frame counts across joints: {counts:?}"
            )));
        }
    }
    debug!(
        "parsed {} dynamic joints, {} frames each",
        series.len(),
        counts.first().copied().unwrap_or(0)
    );
    Ok(series)
}

/// Static reduction: opening in mm, zero wherever the contact flag says
/// closed (the logged residual is penetration noise).
pub fn reduce_static(series: &JointSeries) -> Vec<(i64, f64)> {
    series
        .frames
        .first()
        .map(|rows| {
            rows.iter()
                .map(|r| (r.node, if r.open { r.opening * 1000.0 } else { 0.0 }))
                .collect()
        })
        .unwrap_or_default()
}

/// Dynamic reduction: per-node maximum opening over all frames in mm, with
/// sub-noise values clamped to zero.
pub fn reduce_envelope(series: &JointSeries) -> Vec<(i64, f64)> {
    let Some(first) = series.frames.first() else {
        return Vec::new();
    };
    first
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let peak = series
                .frames
                .iter()
                .map(|f| f[i].opening)
                .fold(f64::NEG_INFINITY, f64::max)
                * 1000.0;
            (row.node, if peak <= NOISE_OPENING_MM { 0.0 } else { peak })
        })
        .collect()
}
