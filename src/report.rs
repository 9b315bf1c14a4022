// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Rendering of summary tables for the command line.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::aggregate::{ConvergenceReport, ObservationResult, SummaryTable};
use crate::error::{Error, Result};

/// Output format of the `run` and `demo` subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::Config(format!(
                "unknown output format '{}', expected 'table' or 'json'",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize)]
struct Document<'a> {
    scenario: &'a str,
    reducer: String,
    records: Vec<ObservationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    convergence: Option<&'a ConvergenceReport>,
}

/// Render a table in the requested format.
pub fn render(
    name: &str,
    table: &SummaryTable,
    convergence: Option<&ConvergenceReport>,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_text(name, table, convergence)),
        OutputFormat::Json => render_json(name, table, convergence),
    }
}

/// Aligned plain-text table, one row per initial state.
pub fn render_text(name: &str, table: &SummaryTable, convergence: Option<&ConvergenceReport>) -> String {
    let cells: Vec<Vec<String>> = table
        .values()
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| format!("{:.6}", v)).collect())
        .collect();

    let label_width = table
        .state_labels()
        .iter()
        .map(String::len)
        .chain(std::iter::once("state".len()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = table
        .measure_labels()
        .iter()
        .enumerate()
        .map(|(j, m)| cells.iter().map(|r| r[j].len()).chain([m.len()]).max().unwrap_or(0))
        .collect();

    let mut out = format!("{} ({} over {} points)\n", name, table.reducer(), table.times().len());

    let mut header = format!("{:<w$}", "state", w = label_width);
    for (m, w) in table.measure_labels().iter().zip(&widths) {
        header.push_str(&format!("  {:>w$}", m, w = w));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    let rule = label_width + widths.iter().map(|w| w + 2).sum::<usize>();
    out.push_str(&"-".repeat(rule));
    out.push('\n');

    for (label, row) in table.state_labels().iter().zip(&cells) {
        let mut line = format!("{:<w$}", label, w = label_width);
        for (cell, w) in row.iter().zip(&widths) {
            line.push_str(&format!("  {:>w$}", cell, w = w));
        }
        out.push_str(&line);
        out.push('\n');
    }

    if let Some(report) = convergence.filter(|r| !r.applicable) {
        out.push_str(&format!(
            "\nconvergence check not applicable to {} propagation\n",
            report.method
        ));
    } else if let Some(report) = convergence {
        let status = if report.converged { "converged" } else { "NOT converged" };
        out.push_str(&format!(
            "\nstep {:.3e} -> {:.3e}: max change {:.3e} (bound {:.3e}), {}",
            report.coarse_max_step, report.fine_max_step, report.max_change, report.bound, status
        ));
        if let (false, Some((s, m))) = (report.converged, &report.worst) {
            out.push_str(&format!(" at ({}, {})", s, m));
        }
        out.push('\n');
    }
    out
}

/// Pretty JSON document with every observation record.
pub fn render_json(
    name: &str,
    table: &SummaryTable,
    convergence: Option<&ConvergenceReport>,
) -> Result<String> {
    let doc = Document {
        scenario: name,
        reducer: table.reducer().to_string(),
        records: table.to_records(),
        convergence,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}
