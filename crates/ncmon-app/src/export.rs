//! Coding-gain export file
//!
//! A plain text file of labelled blocks, one per native-peer count:
//!
//! ```text
//! Values for 3 native nodes:
//!
//! transm: 1,1,2,3
//!
//! cod_gain: 2.000000,1.500000
//!
//! cod_gain_avg: 1.750000
//! cod_gain_ideal: 1.500000
//!
//! ```
//!
//! Writing a block for a count that is already present replaces the old
//! block; blocks for other counts are kept in place.
//!
//! Clock-sync runs save their final [`SyncReport`] as a JSON document instead.

use std::path::Path;

use serde::Serialize;

use ncmon_core::prelude::*;

use crate::report::SyncReport;

const HEADER_PREFIX: &str = "Values for ";
const HEADER_SUFFIX: &str = " native nodes:";
const UNDEFINED: &str = "undefined";

/// One saved run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportBlock {
    pub native_count: usize,
    pub transmissions: Vec<i64>,
    pub coding_gain: Vec<f64>,
    pub average_gain: f64,
    pub ideal_gain: Option<f64>,
}

fn header(native_count: usize) -> String {
    format!("{}{}{}", HEADER_PREFIX, native_count, HEADER_SUFFIX)
}

fn parse_header(line: &str) -> Option<usize> {
    line.trim()
        .strip_prefix(HEADER_PREFIX)?
        .strip_suffix(HEADER_SUFFIX)?
        .trim()
        .parse()
        .ok()
}

/// Render a block in the file format, including its trailing blank line.
pub fn format_block(block: &ExportBlock) -> String {
    let transm = block
        .transmissions
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let gain = block
        .coding_gain
        .iter()
        .map(|v| format!("{:.6}", v))
        .collect::<Vec<_>>()
        .join(",");
    let ideal = match block.ideal_gain {
        Some(v) => format!("{:.6}", v),
        None => UNDEFINED.to_string(),
    };

    format!(
        "{}\n\ntransm: {}\n\ncod_gain: {}\n\ncod_gain_avg: {:.6}\ncod_gain_ideal: {}\n\n",
        header(block.native_count),
        transm,
        gain,
        block.average_gain,
        ideal
    )
}

/// Drop the block for `native_count` from `content`, if present.
///
/// A block runs from its header to the next header or the end of the file.
fn remove_block(content: &str, native_count: usize) -> String {
    let mut out = String::with_capacity(content.len());
    let mut skipping = false;
    for line in content.split_inclusive('\n') {
        if line.trim_start().starts_with(HEADER_PREFIX) {
            skipping = parse_header(line) == Some(native_count);
        }
        if !skipping {
            out.push_str(line);
        }
    }
    out
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::export(path, e.to_string()))?;
    }
    Ok(())
}

/// Write `block` to `path`, replacing any block with the same native count.
pub fn write_block(path: &Path, block: &ExportBlock) -> Result<()> {
    create_parent_dir(path)?;

    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(Error::export(path, e.to_string())),
    };

    let mut content = remove_block(&existing, block.native_count);
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&format_block(block));

    std::fs::write(path, content).map_err(|e| Error::export(path, e.to_string()))?;
    info!(
        "Saved coding values for {} native nodes to {}",
        block.native_count,
        path.display()
    );
    Ok(())
}

fn parse_list<T: std::str::FromStr>(values: &str) -> Option<Vec<T>> {
    values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse().ok())
        .collect()
}

/// Parse every block in `content`. Lines that do not parse are skipped.
pub fn parse_blocks(content: &str) -> Vec<ExportBlock> {
    let mut blocks: Vec<ExportBlock> = Vec::new();

    for line in content.lines() {
        if let Some(native_count) = parse_header(line) {
            blocks.push(ExportBlock {
                native_count,
                transmissions: Vec::new(),
                coding_gain: Vec::new(),
                average_gain: 0.0,
                ideal_gain: None,
            });
            continue;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (Some(block), Some((key, values))) = (blocks.last_mut(), line.split_once(':')) else {
            debug!("Skipping export line outside a block: {:?}", line);
            continue;
        };

        let values = values.trim();
        let parsed = match key.trim() {
            "transm" => parse_list(values).map(|v| block.transmissions = v),
            "cod_gain" => parse_list(values).map(|v| block.coding_gain = v),
            "cod_gain_avg" => values.parse().ok().map(|v| block.average_gain = v),
            "cod_gain_ideal" if values == UNDEFINED => {
                block.ideal_gain = None;
                Some(())
            }
            "cod_gain_ideal" => values.parse().ok().map(|v| block.ideal_gain = Some(v)),
            _ => None,
        };
        if parsed.is_none() {
            debug!("Skipping unparsable export line: {:?}", line);
        }
    }

    blocks
}

/// Overwrite `path` with `report` as pretty-printed JSON.
pub fn write_sync_report(path: &Path, report: &SyncReport) -> Result<()> {
    create_parent_dir(path)?;

    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    std::fs::write(path, json).map_err(|e| Error::export(path, e.to_string()))?;
    info!(
        "Saved sync statistics for {} ({} cycles) to {}",
        report.observer,
        report.cycles,
        path.display()
    );
    Ok(())
}

/// Read all blocks from `path`.
pub fn read_blocks(path: &Path) -> Result<Vec<ExportBlock>> {
    let content =
        std::fs::read_to_string(path).map_err(|e| Error::export(path, e.to_string()))?;
    Ok(parse_blocks(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn block(native_count: usize, transmissions: Vec<i64>) -> ExportBlock {
        ExportBlock {
            native_count,
            transmissions,
            coding_gain: vec![2.0, 1.5],
            average_gain: 1.75,
            ideal_gain: Some(1.5),
        }
    }

    #[test]
    fn test_format_block_layout() {
        let text = format_block(&block(3, vec![1, 1, 2]));
        assert_eq!(
            text,
            "Values for 3 native nodes:\n\ntransm: 1,1,2\n\ncod_gain: 2.000000,1.500000\n\ncod_gain_avg: 1.750000\ncod_gain_ideal: 1.500000\n\n"
        );
    }

    #[test]
    fn test_undefined_ideal_is_written_and_read_back() {
        let mut b = block(1, vec![1]);
        b.ideal_gain = None;
        let text = format_block(&b);
        assert!(text.contains("cod_gain_ideal: undefined"));
        assert_eq!(parse_blocks(&text)[0].ideal_gain, None);
    }

    #[test]
    fn test_write_twice_same_key_keeps_one_block_with_second_values() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("export/coding_plot/relay_values.txt");

        write_block(&path, &block(3, vec![1, 2])).unwrap();
        write_block(&path, &block(3, vec![7, 8, 9])).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("Values for 3 native nodes:").count(), 1);

        let blocks = read_blocks(&path).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].transmissions, vec![7, 8, 9]);
    }

    #[test]
    fn test_other_keys_are_preserved() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("values.txt");

        write_block(&path, &block(2, vec![1])).unwrap();
        write_block(&path, &block(3, vec![2])).unwrap();
        write_block(&path, &block(4, vec![3])).unwrap();
        write_block(&path, &block(3, vec![5])).unwrap();

        let blocks = read_blocks(&path).unwrap();
        let counts: Vec<usize> = blocks.iter().map(|b| b.native_count).collect();
        assert_eq!(counts, vec![2, 4, 3]);
        assert_eq!(blocks[2].transmissions, vec![5]);
    }

    #[test]
    fn test_header_match_is_exact() {
        let content = format!(
            "{}{}",
            format_block(&block(1, vec![1])),
            format_block(&block(11, vec![11]))
        );
        let kept = remove_block(&content, 1);
        assert!(!kept.contains("Values for 1 native nodes:"));
        assert!(kept.contains("Values for 11 native nodes:"));
    }

    #[test]
    fn test_indented_header_is_replaced() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("values.txt");
        std::fs::write(&path, "  Values for 3 native nodes:\n\ntransm: 1\n\n").unwrap();

        write_block(&path, &block(3, vec![4, 5])).unwrap();

        let blocks = read_blocks(&path).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].transmissions, vec![4, 5]);
    }

    #[test]
    fn test_parse_skips_garbage_lines() {
        let content = "stray line\nValues for 2 native nodes:\n\ntransm: 1,x,3\ncod_gain: 1.0, 2.0\nnonsense\ncod_gain_avg: 1.5\n";
        let blocks = parse_blocks(content);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].transmissions.is_empty());
        assert_eq!(blocks[0].coding_gain, vec![1.0, 2.0]);
        assert_eq!(blocks[0].average_gain, 1.5);
    }

    #[test]
    fn test_empty_series_round_trip() {
        let b = ExportBlock {
            native_count: 2,
            transmissions: Vec::new(),
            coding_gain: Vec::new(),
            average_gain: 0.0,
            ideal_gain: Some(2.0),
        };
        let parsed = parse_blocks(&format_block(&b));
        assert_eq!(parsed, vec![b]);
    }

    #[test]
    fn test_sync_report_is_saved_as_json() {
        use crate::config::SyncSettings;
        use crate::{NodeState, Role};

        let mut observer = NodeState::new("obsv", Role::Observer, 100);
        for line in [
            "RISING 100", "RISING 130", "FALLING",
            "RISING 200", "RISING 210", "FALLING",
            "RISING 300",
        ] {
            observer.apply(line);
        }
        let mut peer = NodeState::new("peer1", Role::SyncPeer, 100);
        peer.apply("avg_send_offset = 4");
        let report = SyncReport::build(&observer, &[&peer], &SyncSettings::default());

        let temp = tempdir().unwrap();
        let path = temp.path().join("export/sync_plot/sync_report.json");
        write_sync_report(&path, &report).unwrap();
        // a second run overwrites rather than appends
        write_sync_report(&path, &report).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["observer"], "obsv");
        assert_eq!(saved["cycles"], report.cycles);
        assert_eq!(saved["peers"][0]["label"], "peer1");
        assert_eq!(saved["peers"][0]["send_offsets"][0], 4);
    }

    #[test]
    fn test_read_missing_file_is_export_error() {
        let temp = tempdir().unwrap();
        let err = read_blocks(&temp.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
    }
}
