//! Evaluation report formatting

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::batch::{BatchSummary, EvaluationRun, SampleReport};

/// One line per evaluated sample
pub fn write_sample_line<W: Write>(out: &mut W, report: &SampleReport) -> io::Result<()> {
    writeln!(
        out,
        "Image: {}, Label: {}, Prediction: {}, CER: {:?}, Precision: {:?}, Recall: {:?}, F1: {:?}",
        report.image_path.display(),
        report.label,
        report.prediction,
        report.cer,
        report.scores.precision,
        report.scores.recall,
        report.scores.f1
    )
}

/// Summary lines printed after the last sample
pub fn write_summary<W: Write>(out: &mut W, summary: &BatchSummary) -> io::Result<()> {
    writeln!(out, "Average CER: {:?}", summary.cer_mean)?;
    writeln!(out, "Accuracy = {:?}", summary.accuracy)?;
    writeln!(out, "Average Precision: {:?}", summary.precision_mean)?;
    writeln!(out, "Average Recall: {:?}", summary.recall_mean)?;
    writeln!(out, "Average F1 Score: {:?}", summary.f1_mean)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    dataset: &'a Path,
    model: &'a Path,
    #[serde(flatten)]
    run: &'a EvaluationRun,
}

/// Write the full run as pretty JSON
pub fn write_json(path: &Path, dataset: &Path, model: &Path, run: &EvaluationRun) -> Result<()> {
    let report = JsonReport { dataset, model, run };
    let content = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write JSON report to {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::MatchMode;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sample_report() -> SampleReport {
        SampleReport::score(
            PathBuf::from("Datasets/rx/1.png"),
            "ASPIRIN".to_string(),
            "ASPRIN".to_string(),
            MatchMode::Containment,
        )
    }

    #[test]
    fn test_sample_line_format() {
        let mut out = Vec::new();
        write_sample_line(&mut out, &sample_report()).unwrap();
        let line = String::from_utf8(out).unwrap();

        assert!(line.starts_with(
            "Image: Datasets/rx/1.png, Label: ASPIRIN, Prediction: ASPRIN, CER: 0.14285714285714285, Precision: 1.0, Recall: 0.8571428571428571, F1: "
        ));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_summary_lines() {
        let summary = BatchSummary {
            sample_count: 2,
            cer_mean: 0.25,
            accuracy: 0.75,
            precision_mean: 1.0,
            recall_mean: 0.5,
            f1_mean: 0.5,
        };
        let mut out = Vec::new();
        write_summary(&mut out, &summary).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Average CER: 0.25",
                "Accuracy = 0.75",
                "Average Precision: 1.0",
                "Average Recall: 0.5",
                "Average F1 Score: 0.5",
            ]
        );
    }

    #[test]
    fn test_whole_numbers_keep_decimal_point() {
        let summary = BatchSummary {
            sample_count: 0,
            cer_mean: 0.0,
            accuracy: 1.0,
            precision_mean: 0.0,
            recall_mean: 0.0,
            f1_mean: 0.0,
        };
        let mut out = Vec::new();
        write_summary(&mut out, &summary).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Average CER: 0.0\n"));
        assert!(text.contains("Accuracy = 1.0\n"));
        assert!(text.ends_with("Average F1 Score: 0.0\n"));
    }

    #[test]
    fn test_json_report() {
        let dir = TempDir::new().unwrap();
        let reports = vec![sample_report()];
        let run = EvaluationRun {
            summary: BatchSummary::from_reports(&reports),
            samples: reports,
        };
        let path = dir.path().join("report.json");

        write_json(&path, Path::new("val.csv"), Path::new("model.onnx"), &run).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["dataset"], "val.csv");
        assert_eq!(value["samples"][0]["prediction"], "ASPRIN");
        assert_eq!(value["samples"][0]["precision"], 1.0);
        assert_eq!(value["summary"]["sample_count"], 1);
    }
}
