//! Rendering of scores and encoded rows for stdout.
//!
//! Text output is one `probability<TAB>domain` line per prediction, with a
//! `# path` header before each file's block. JSON output is a single document
//! per command.

use std::io::Write;

use clap::ValueEnum;
use dgabot_core::Prediction;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// Predictions for one input file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    pub predictions: Vec<Prediction>,
}

#[derive(Serialize)]
struct EncodedRow<'a> {
    domain: &'a str,
    encoded: &'a [i64],
}

pub fn write_predictions(
    out: &mut impl Write,
    predictions: &[Prediction],
    format: Format,
) -> anyhow::Result<()> {
    match format {
        Format::Text => write_prediction_lines(out, predictions)?,
        Format::Json => {
            serde_json::to_writer_pretty(&mut *out, predictions)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn write_reports(out: &mut impl Write, reports: &[FileReport], format: Format) -> anyhow::Result<()> {
    match format {
        Format::Text => {
            for report in reports {
                writeln!(out, "# {}", report.path)?;
                write_prediction_lines(out, &report.predictions)?;
            }
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut *out, reports)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn write_encoded(
    out: &mut impl Write,
    domains: &[String],
    rows: &[Vec<i64>],
    format: Format,
) -> anyhow::Result<()> {
    match format {
        Format::Text => {
            for (domain, row) in domains.iter().zip(rows) {
                let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                writeln!(out, "{domain}\t{}", values.join(","))?;
            }
        }
        Format::Json => {
            let encoded: Vec<EncodedRow<'_>> = domains
                .iter()
                .zip(rows)
                .map(|(domain, row)| EncodedRow { domain, encoded: row })
                .collect();
            serde_json::to_writer_pretty(&mut *out, &encoded)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_prediction_lines(out: &mut impl Write, predictions: &[Prediction]) -> std::io::Result<()> {
    for p in predictions {
        writeln!(out, "{:.6}\t{}", p.probability, p.domain)?;
    }
    Ok(())
}
