//! Design-matrix CSV reading and writing
//!
//! The on-disk schema mirrors the logical one: four metadata columns
//! (REAL, SENSNAME, SENSCASE, SENSTYPE) followed by one column per
//! parameter. Config loading rejects names containing CSV
//! metacharacters, so no quoting is needed here.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use color_eyre::eyre::eyre;
use sensdesign_core::model::{DesignMatrix, DesignRow, SensType};
use sensdesign_core::summary::SensitivitySummary;

const META_COLUMNS: [&str; 4] = ["REAL", "SENSNAME", "SENSCASE", "SENSTYPE"];

/// Write the matrix as CSV, atomically (write-then-rename).
///
/// A crash mid-write leaves the previous file intact rather than a
/// truncated matrix.
pub fn write_matrix(path: &Path, matrix: &DesignMatrix) -> color_eyre::Result<()> {
    let mut out = String::new();
    out.push_str(&META_COLUMNS.join(","));
    for name in &matrix.parameters {
        out.push(',');
        out.push_str(name);
    }
    out.push('\n');

    for row in &matrix.rows {
        out.push_str(&format!(
            "{},{},{},{}",
            row.real, row.sensname, row.senscase, row.senstype
        ));
        for name in &matrix.parameters {
            let value = row.values.get(name).copied().ok_or_else(|| {
                eyre!("row {} is missing a value for parameter {name:?}", row.real)
            })?;
            out.push(',');
            out.push_str(&value.to_string());
        }
        out.push('\n');
    }

    atomic_write(path, &out).map_err(|e| eyre!("failed to write {}: {e}", path.display()))
}

/// Read a matrix previously written by [`write_matrix`].
pub fn read_matrix(path: &Path) -> color_eyre::Result<DesignMatrix> {
    let text = fs::read_to_string(path)
        .map_err(|e| eyre!("failed to read {}: {e}", path.display()))?;
    let mut lines = text.lines();

    let header = lines.next().ok_or_else(|| eyre!("empty matrix file"))?;
    let columns: Vec<&str> = header.split(',').collect();
    if columns.len() < META_COLUMNS.len() || columns[..4] != META_COLUMNS {
        return Err(eyre!(
            "unexpected header {header:?}, expected {} followed by parameter names",
            META_COLUMNS.join(",")
        ));
    }
    let parameters: Vec<String> = columns[4..].iter().map(|s| s.to_string()).collect();

    let mut rows = Vec::new();
    for (lineno, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != columns.len() {
            return Err(eyre!(
                "line {}: expected {} fields, got {}",
                lineno + 2,
                columns.len(),
                fields.len()
            ));
        }
        let real: usize = fields[0]
            .parse()
            .map_err(|e| eyre!("line {}: bad realization index: {e}", lineno + 2))?;
        let senstype: SensType = fields[3]
            .parse()
            .map_err(|e| eyre!("line {}: {e}", lineno + 2))?;
        let mut values = BTreeMap::new();
        for (name, field) in parameters.iter().zip(&fields[4..]) {
            let value: f64 = field
                .parse()
                .map_err(|e| eyre!("line {}: bad value for {name:?}: {e}", lineno + 2))?;
            values.insert(name.clone(), value);
        }
        rows.push(DesignRow {
            real,
            sensname: fields[1].to_string(),
            senscase: fields[2].to_string(),
            senstype,
            values,
        });
    }

    Ok(DesignMatrix { parameters, rows })
}

/// Print a summary table to stdout.
pub fn print_summary(summaries: &[SensitivitySummary]) {
    println!(
        "{:<7} {:<20} {:<8} {:<12} {:>10} {:>8} {:<12} {:>10} {:>8}",
        "sensno",
        "sensname",
        "senstype",
        "casename1",
        "startreal1",
        "endreal1",
        "casename2",
        "startreal2",
        "endreal2"
    );
    for s in summaries {
        println!(
            "{:<7} {:<20} {:<8} {:<12} {:>10} {:>8} {:<12} {:>10} {:>8}",
            s.sensno,
            s.sensname,
            s.senstype.to_string(),
            s.casename1,
            s.startreal1,
            s.endreal1,
            s.casename2.as_deref().unwrap_or("-"),
            s.startreal2.map_or("-".to_string(), |v| v.to_string()),
            s.endreal2.map_or("-".to_string(), |v| v.to_string()),
        );
    }
}

/// Write content to a file atomically using the write-then-rename pattern.
fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let temp_path = path.with_extension("csv.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
