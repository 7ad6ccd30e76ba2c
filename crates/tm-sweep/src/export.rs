//! CSV and JSON export of sweep outcomes.

use crate::error::SweepRunResult;
use crate::sweep::{SweepOutcome, SweepRow};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const CSV_HEADER: &str = "condition,shaft_speed,corrected_speed,branch,converged,used_backoff,\
target_feasible,pressure_ratio,exit_pressure,corrected_flow,mass_flow,efficiency,\
exit_enthalpy,power,torque";

fn cell(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn csv_line(row: &SweepRow) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        row.condition,
        row.shaft_speed,
        row.corrected_speed,
        row.branch.map(|b| b.to_string()).unwrap_or_default(),
        row.converged,
        row.used_backoff,
        row.target_feasible,
        row.pressure_ratio,
        row.exit_pressure,
        cell(row.corrected_flow),
        cell(row.mass_flow),
        cell(row.efficiency),
        cell(row.exit_enthalpy),
        cell(row.power),
        cell(row.torque),
    )
}

impl SweepOutcome {
    /// Header plus one line per row; missing values are empty cells.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for row in self.rows() {
            // Writing to a String cannot fail
            let _ = writeln!(out, "{}", csv_line(row));
        }
        out
    }

    pub fn to_json(&self) -> SweepRunResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write to `path` as JSON when the extension is `json`, CSV otherwise.
    pub fn write_to(&self, path: impl AsRef<Path>) -> SweepRunResult<()> {
        let path = path.as_ref();
        let text = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.to_json()?,
            _ => self.to_csv(),
        };
        fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::BranchPolicy;

    fn row(converged: bool) -> SweepRow {
        SweepRow {
            condition: 3,
            shaft_speed: 2000.0,
            corrected_speed: 2000.0,
            branch: None,
            converged,
            used_backoff: false,
            target_feasible: converged,
            pressure_ratio: 2.5,
            exit_pressure: 253_312.5,
            corrected_flow: converged.then_some(7.5),
            mass_flow: converged.then_some(7.5),
            efficiency: converged.then_some(0.8),
            exit_enthalpy: converged.then_some(1.0e5),
            power: converged.then_some(7.5e5),
            torque: converged.then_some(375.0),
        }
    }

    #[test]
    fn csv_has_header_and_empty_cells() {
        let outcome = SweepOutcome::SingleBranch {
            policy: BranchPolicy::Low,
            rows: vec![row(true), row(false)],
        };
        let csv = outcome.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].split(',').count(), 15);
        assert!(lines[1].starts_with("3,2000,2000,,true,false,true,2.5,253312.5,7.5,"));
        assert!(lines[2].ends_with(",,,,,,"));
    }

    #[test]
    fn json_is_tagged_by_mode() {
        let outcome = SweepOutcome::SingleBranch {
            policy: BranchPolicy::High,
            rows: vec![row(true)],
        };
        let value: serde_json::Value = serde_json::from_str(&outcome.to_json().unwrap()).unwrap();
        assert_eq!(value["mode"], "single_branch");
        assert_eq!(value["policy"], "high");
        assert_eq!(value["rows"][0]["mass_flow"], 7.5);
    }
}
