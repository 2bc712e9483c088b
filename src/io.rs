//! Text-format readers for meshes, selection lists and exported result tables
//!
//! The upstream exports are plain text: `.inp` mesh decks, flat node-ID
//! lists, and CSV tables with one row per node. Dynamic exports stack all
//! frames into one CSV with a repeated header-like sentinel row between
//! frames; [`StressHistory::parse`] validates that structure instead of
//! relying on row counting.

use crate::error::{PostError, PostResult};
use crate::frame::LocalFrame;
use crate::geometry::Boundary;
use crate::model::NodeSet;
use log::debug;

/// Selection names found in a mesh deck.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshSets {
    pub node_sets: Vec<String>,
    pub element_sets: Vec<String>,
    pub surfaces: Vec<String>,
}

fn keyword_name(line: &str) -> PostResult<String> {
    let (_, rest) = line
        .split_once('=')
        .ok_or_else(|| PostError::Parse(format!("keyword line without a name: {line:?}")))?;
    Ok(rest
        .split(',')
        .next()
        .unwrap_or(rest)
        .trim()
        .to_string())
}

/// Read node coordinates from the `*NODE` block of a mesh deck. `dims` is 2
/// or 3; 2-D meshes get z = 0. Rows are `id, x, y[, z]` with comma or
/// whitespace separators; the block ends at the next `*` keyword.
pub fn parse_nodes(text: &str, dims: usize) -> PostResult<NodeSet> {
    if dims != 2 && dims != 3 {
        return Err(PostError::Parse(format!("unsupported dimension {dims}")));
    }
    let mut lines = text.lines();
    for line in lines.by_ref() {
        if line.to_uppercase().contains("*NODE") {
            break;
        }
    }
    let mut rows: Vec<(i64, [f64; 3])> = Vec::new();
    for line in lines {
        if line.contains('*') {
            break;
        }
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < dims + 1 {
            return Err(PostError::Parse(format!("short node row: {line:?}")));
        }
        let id: i64 = fields[0]
            .parse()
            .map_err(|_| PostError::Parse(format!("bad node id: {line:?}")))?;
        let mut coords = [0.0; 3];
        for (k, c) in coords.iter_mut().enumerate().take(dims) {
            *c = fields[k + 1]
                .parse()
                .map_err(|_| PostError::Parse(format!("bad coordinate: {line:?}")))?;
        }
        rows.push((id, coords));
    }
    if rows.is_empty() {
        return Err(PostError::Parse("no *NODE block found".into()));
    }
    debug!("parsed {} mesh nodes ({dims}D)", rows.len());
    Ok(NodeSet::from_rows(&rows))
}

/// Collect selection names from a mesh deck. Element sets starting with `_`
/// are surface-definition internals and are skipped.
pub fn parse_set_names(text: &str) -> PostResult<MeshSets> {
    let mut sets = MeshSets::default();
    for line in text.lines() {
        let upper = line.to_uppercase();
        if upper.starts_with("*NSET") {
            sets.node_sets.push(keyword_name(line)?);
        } else if upper.starts_with("*ELSET") {
            let name = keyword_name(line)?;
            if !name.starts_with('_') {
                sets.element_sets.push(name);
            }
        } else if upper.starts_with("*SURFACE") {
            sets.surfaces.push(keyword_name(line)?);
        }
    }
    Ok(sets)
}

/// Analysis step names from a step deck.
pub fn parse_step_names(text: &str) -> PostResult<Vec<String>> {
    text.lines()
        .filter(|line| line.to_uppercase().starts_with("*STEP"))
        .map(keyword_name)
        .collect()
}

/// A flat whitespace-separated node ID file (boundary outlines, hole
/// outlines, exclusion zones). IDs may be written as floats.
pub fn parse_node_ids(text: &str) -> PostResult<Vec<i64>> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .map_err(|_| PostError::Parse(format!("bad node id {tok:?}")))
                .map(|v| v as i64)
        })
        .collect()
}

/// A parsed CSV result table: header names plus string rows. Values stay
/// textual until a column is extracted, because the dynamic exports mix
/// numeric rows with sentinel rows.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn parse(text: &str) -> PostResult<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| PostError::Parse("empty table".into()))?;
        let columns: Vec<String> = header.split(',').map(|c| c.trim().to_string()).collect();
        let mut rows = Vec::new();
        for line in lines {
            let row: Vec<String> = line.split(',').map(|c| c.trim().to_string()).collect();
            if row.len() != columns.len() {
                return Err(PostError::Parse(format!(
                    "row has {} fields, header has {}: {line:?}",
                    row.len(),
                    columns.len()
                )));
            }
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> PostResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PostError::Parse(format!("no column {name:?} in table")))
    }

    /// Extract a column as floats.
    pub fn numeric_column(&self, name: &str) -> PostResult<Vec<f64>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .map(|row| {
                row[idx]
                    .parse::<f64>()
                    .map_err(|_| PostError::Parse(format!("non-numeric cell {:?}", row[idx])))
            })
            .collect()
    }

    /// Drop rows repeating an earlier value of the key column, keeping the
    /// first occurrence.
    pub fn dedup_by(&mut self, key: &str) -> PostResult<()> {
        let idx = self.column_index(key)?;
        let mut seen: Vec<String> = Vec::new();
        self.rows.retain(|row| {
            if seen.contains(&row[idx]) {
                false
            } else {
                seen.push(row[idx].clone());
                true
            }
        });
        Ok(())
    }

    /// Sort rows ascending by a numeric column.
    pub fn sort_by_numeric(&mut self, name: &str) -> PostResult<()> {
        let idx = self.column_index(name)?;
        let keys: PostResult<Vec<f64>> = self
            .rows
            .iter()
            .map(|row| {
                row[idx]
                    .parse::<f64>()
                    .map_err(|_| PostError::Parse(format!("non-numeric cell {:?}", row[idx])))
            })
            .collect();
        let keys = keys?;
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
        self.rows = order.into_iter().map(|i| self.rows[i].clone()).collect();
        Ok(())
    }
}

/// A dynamic result export: all frames stacked in one CSV, separated by a
/// sentinel row that repeats the literal column name in the `X` column.
#[derive(Debug, Clone)]
pub struct StressHistory {
    columns: Vec<String>,
    frames: Vec<Vec<Vec<String>>>,
}

impl StressHistory {
    /// Split the stacked table into frames at each sentinel row and validate
    /// that every frame carries the same node count.
    pub fn parse(text: &str) -> PostResult<Self> {
        let table = Table::parse(text)?;
        let x_idx = table.column_index("X")?;
        let mut frames: Vec<Vec<Vec<String>>> = Vec::new();
        let mut current: Vec<Vec<String>> = Vec::new();
        for row in table.rows {
            if row[x_idx] == "X" {
                if current.is_empty() {
                    return Err(PostError::Parse(
                        "sentinel row with no preceding data rows".into(),
                    ));
                }
                frames.push(std::mem::take(&mut current));
            } else {
                current.push(row);
            }
        }
        if !current.is_empty() {
            frames.push(current);
        }
        if frames.is_empty() {
            return Err(PostError::Parse("history table has no data rows".into()));
        }
        let node_count = frames[0].len();
        for (i, frame) in frames.iter().enumerate() {
            if frame.len() != node_count {
                return Err(PostError::Parse(format!(
                    "frame {i} has {} rows, expected {node_count}",
                    frame.len()
                )));
            }
        }
        debug!(
            "stress history: {} frames of {} nodes",
            frames.len(),
            node_count
        );
        Ok(Self {
            columns: table.columns,
            frames,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn node_count(&self) -> usize {
        self.frames.first().map_or(0, Vec::len)
    }

    /// One frame as a standalone table.
    pub fn frame(&self, idx: usize) -> PostResult<Table> {
        let rows = self
            .frames
            .get(idx)
            .ok_or_else(|| PostError::Parse(format!("no frame {idx}")))?;
        Ok(Table::from_parts(self.columns.clone(), rows.clone()))
    }
}

/// Resolve a boundary node-ID list against the mesh and project it into a
/// section frame.
pub fn boundary_from_ids(
    nodes: &NodeSet,
    ids: &[i64],
    frame: &LocalFrame,
) -> PostResult<Boundary> {
    let coords = nodes.resolve(ids)?;
    Boundary::new(frame.project(&coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    const MESH: &str = "\
*Heading
*NODE
 1, 0.0, 0.0
 2, 1.0, 0.0
 3, 1.0, 2.0
*ELEMENT, type=CPS4
 1, 1, 2, 3
*NSET, nset=BASE
 1, 2
*ELSET, elset=_SURF_S1, internal
 1
*ELSET, elset=DAM
 1
*SURFACE, name=UPSTREAM
 _SURF_S1, S1
";

    #[test]
    fn test_parse_nodes_2d() {
        let nodes = parse_nodes(MESH, 2).unwrap();
        assert_eq!(nodes.len(), 3);
        let c = nodes.require(3).unwrap();
        assert_relative_eq!(c.y, 2.0);
        assert_relative_eq!(c.z, 0.0);
    }

    #[test]
    fn test_parse_nodes_missing_block() {
        assert!(matches!(
            parse_nodes("*Heading\nnothing here\n", 2),
            Err(PostError::Parse(_))
        ));
    }

    #[test]
    fn test_set_names_skip_surface_internals() {
        let sets = parse_set_names(MESH).unwrap();
        assert_eq!(sets.node_sets, vec!["BASE"]);
        assert_eq!(sets.element_sets, vec!["DAM"]);
        assert_eq!(sets.surfaces, vec!["UPSTREAM"]);
    }

    #[test]
    fn test_step_names() {
        let text = "*Step, name=GRAVITY\n*Static\n*End Step\n*STEP, name=QUAKE\n";
        assert_eq!(parse_step_names(text).unwrap(), vec!["GRAVITY", "QUAKE"]);
    }

    #[test]
    fn test_node_id_file_accepts_floats() {
        assert_eq!(parse_node_ids(" 1 2.0\n3 ").unwrap(), vec![1, 2, 3]);
        assert!(parse_node_ids("1 abc").is_err());
    }

    #[test]
    fn test_table_dedup_and_sort() {
        let mut table = Table::parse(
            "node,X,S22\n3,2.0,-1.5\n1,0.0,-2.0\n3,9.0,-9.9\n2,1.0,-1.0\n",
        )
        .unwrap();
        table.dedup_by("node").unwrap();
        table.sort_by_numeric("X").unwrap();
        assert_eq!(table.len(), 3);
        let x = table.numeric_column("X").unwrap();
        assert_eq!(x, vec![0.0, 1.0, 2.0]);
        let s = table.numeric_column("S22").unwrap();
        assert_relative_eq!(s[2], -1.5);
    }

    #[test]
    fn test_table_ragged_row_rejected() {
        assert!(matches!(
            Table::parse("a,b\n1,2\n3\n"),
            Err(PostError::Parse(_))
        ));
    }

    #[test]
    fn test_history_sentinel_splitting() {
        let text = "node,X,S12\n1,0.0,1.0\n2,1.0,2.0\nnode,X,S12\n1,0.0,3.0\n2,1.0,4.0\n";
        let history = StressHistory::parse(text).unwrap();
        assert_eq!(history.frame_count(), 2);
        assert_eq!(history.node_count(), 2);
        let s12 = history.frame(1).unwrap().numeric_column("S12").unwrap();
        assert_eq!(s12, vec![3.0, 4.0]);
    }

    #[test]
    fn test_history_uneven_frames_rejected() {
        let text = "node,X,S12\n1,0.0,1.0\n2,1.0,2.0\nnode,X,S12\n1,0.0,3.0\n";
        assert!(matches!(
            StressHistory::parse(text),
            Err(PostError::Parse(_))
        ));
    }

    #[test]
    fn test_boundary_from_ids() {
        let nodes = NodeSet::from_rows(&[
            (1, [0.0, 0.0, 0.0]),
            (2, [4.0, 0.0, 0.0]),
            (3, [4.0, 3.0, 0.0]),
            (4, [0.0, 3.0, 0.0]),
        ]);
        let frame = LocalFrame::from_points(
            Vector3::zeros(),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        let boundary = boundary_from_ids(&nodes, &[1, 2, 3, 4], &frame).unwrap();
        assert!(boundary.contains(2.0, 1.5));
        assert!(boundary_from_ids(&nodes, &[1, 2, 99], &frame).is_err());
    }
}
