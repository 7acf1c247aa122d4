//! Design-matrix summarization
//!
//! The structural inverse of assembly: walk an assembled (or re-read)
//! matrix and reconstruct, per SENSNAME, the contiguous realization range
//! of each case and the scalar-vs-Monte-Carlo classification that
//! downstream tornado statistics key off.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, Result};
use crate::model::design::{DesignMatrix, DesignRow, SENSCASE_REF, SENSCASE_SKIP};

/// Sensitivity classification in a summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryType {
    /// One row per case, or rows differing only in the seed column
    Scalar,
    /// Rows carry sampled parameter values
    Mc,
    /// The single reference realization
    Ref,
}

impl fmt::Display for SummaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryType::Scalar => write!(f, "scalar"),
            SummaryType::Mc => write!(f, "mc"),
            SummaryType::Ref => write!(f, "ref"),
        }
    }
}

/// Summary of one sensitivity: its classification and the inclusive
/// realization range of each case (at most two).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivitySummary {
    /// 1-based position among summarized sensitivities
    pub sensno: usize,
    pub sensname: String,
    pub senstype: SummaryType,
    pub casename1: String,
    pub startreal1: usize,
    pub endreal1: usize,
    pub casename2: Option<String>,
    pub startreal2: Option<usize>,
    pub endreal2: Option<usize>,
}

/// Summarize an assembled matrix into per-sensitivity realization ranges.
///
/// Rows must group each SENSNAME into one contiguous run; cases with the
/// "skip" sentinel are dropped, and a sensitivity whose cases are all
/// skipped is omitted entirely (consuming no `sensno`). `seed_param`
/// names the column ignored by the scalar-vs-Monte-Carlo comparison.
pub fn summarize(
    matrix: &DesignMatrix,
    seed_param: Option<&str>,
) -> Result<Vec<SensitivitySummary>> {
    let mut summaries = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    let mut i = 0;
    while i < matrix.rows.len() {
        let sensname = matrix.rows[i].sensname.clone();
        if seen.contains(&sensname) {
            return Err(DesignError::Config {
                message: format!(
                    "sensitivity {sensname:?} appears in non-contiguous row blocks"
                ),
            });
        }
        seen.push(sensname.clone());

        let start = i;
        while i < matrix.rows.len() && matrix.rows[i].sensname == sensname {
            i += 1;
        }
        let block: Vec<&DesignRow> = matrix.rows[start..i].iter().collect();

        let cases = case_ranges(&block, &sensname)?;
        if cases.is_empty() {
            continue;
        }
        if cases.len() > 2 {
            return Err(DesignError::Config {
                message: format!(
                    "sensitivity {sensname:?} has {} cases, summaries support at most 2",
                    cases.len()
                ),
            });
        }

        let senstype = classify(&cases, seed_param);
        let second = cases.get(1);
        summaries.push(SensitivitySummary {
            sensno: summaries.len() + 1,
            sensname,
            senstype,
            casename1: cases[0].name.clone(),
            startreal1: cases[0].rows[0].real,
            endreal1: cases[0].rows[cases[0].rows.len() - 1].real,
            casename2: second.map(|c| c.name.clone()),
            startreal2: second.map(|c| c.rows[0].real),
            endreal2: second.map(|c| c.rows[c.rows.len() - 1].real),
        });
    }

    Ok(summaries)
}

struct CaseRun<'a> {
    name: String,
    rows: Vec<&'a DesignRow>,
}

/// Split a sensitivity block into consecutive SENSCASE runs, dropping
/// "skip" cases. A case name reappearing after a different case means the
/// block was reordered and the range bookkeeping would be wrong.
fn case_ranges<'a>(block: &[&'a DesignRow], sensname: &str) -> Result<Vec<CaseRun<'a>>> {
    let mut cases: Vec<CaseRun<'a>> = Vec::new();
    for row in block {
        match cases.last_mut() {
            Some(case) if case.name == row.senscase => case.rows.push(row),
            _ => {
                if cases.iter().any(|c| c.name == row.senscase) {
                    return Err(DesignError::Config {
                        message: format!(
                            "case {:?} of sensitivity {sensname:?} appears in \
                             non-contiguous row blocks",
                            row.senscase
                        ),
                    });
                }
                cases.push(CaseRun {
                    name: row.senscase.clone(),
                    rows: vec![row],
                });
            }
        }
    }
    cases.retain(|c| c.name != SENSCASE_SKIP);
    Ok(cases)
}

/// Scalar when every case is a single row or varies only in the seed
/// column; the lone reference realization keeps its own tag.
fn classify(cases: &[CaseRun<'_>], seed_param: Option<&str>) -> SummaryType {
    if cases.len() == 1 && cases[0].name == SENSCASE_REF && cases[0].rows.len() == 1 {
        return SummaryType::Ref;
    }
    let scalar = cases.iter().all(|case| {
        case.rows
            .iter()
            .skip(1)
            .all(|row| values_equal_except(row, case.rows[0], seed_param))
    });
    if scalar {
        SummaryType::Scalar
    } else {
        SummaryType::Mc
    }
}

fn values_equal_except(a: &DesignRow, b: &DesignRow, ignore: Option<&str>) -> bool {
    let filtered = |row: &DesignRow| {
        row.values
            .iter()
            .filter(|(name, _)| Some(name.as_str()) != ignore)
            .map(|(name, value)| (name.clone(), *value))
            .collect::<Vec<_>>()
    };
    filtered(a) == filtered(b)
}
