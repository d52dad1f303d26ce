//! Reading extracted turnstile exports.
//!
//! An export is a JSON Lines file, one row per line. Each row names the sheet
//! it was extracted from (`entrada` or `saida`) alongside the `NOME`, `DATA`
//! and `HORA` cells. A sheet counts as present as soon as one line names it,
//! even if every row on it turns out to be unusable.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use punch_core::{DeviceBatch, DeviceId, Direction, RawRow, SourceLabel};

#[derive(Debug, Deserialize)]
struct ExportLine {
    #[serde(alias = "SHEET", alias = "planilha")]
    sheet: String,
    #[serde(flatten)]
    row: RawRow,
}

/// Maps a sheet name to its direction the way the exports name them
/// ("Entrada", "SAIDA CATRACA 01", ...).
fn sheet_direction(sheet: &str) -> Option<Direction> {
    let lower = sheet.to_lowercase();
    if lower.contains("entrada") {
        Some(Direction::Entry)
    } else if lower.contains("saida") || lower.contains("saída") {
        Some(Direction::Exit)
    } else {
        lower.parse().ok()
    }
}

/// Parses an export read from `reader` into a device batch.
pub fn parse_export<R: BufRead>(reader: R, device: DeviceId, label: SourceLabel) -> Result<DeviceBatch> {
    let mut batch = DeviceBatch::new(device, label);
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed: ExportLine = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        let direction = sheet_direction(&parsed.sheet)
            .ok_or_else(|| anyhow!("unknown sheet {:?} on line {}", parsed.sheet, idx + 1))?;
        let stream = match direction {
            Direction::Entry => &mut batch.entries,
            Direction::Exit => &mut batch.exits,
        };
        let rows = stream.get_or_insert_with(Vec::new);
        // a line with only `sheet` declares the stream, it is not a row
        if parsed.row != RawRow::default() {
            rows.push(parsed.row);
        }
    }
    Ok(batch)
}

/// Reads an export file, labelling the batch with the file name.
pub fn read_export(path: &Path, device: DeviceId) -> Result<DeviceBatch> {
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let label = SourceLabel::new(name).context("export file name is empty")?;
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_export(BufReader::new(file), device, label)
        .with_context(|| format!("failed to read export {}", path.display()))
}
