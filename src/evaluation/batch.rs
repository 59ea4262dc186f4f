//! Batch evaluation of a predictor over a labeled dataset

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::align::align;
use super::classify::classify;
use super::dataset::Sample;
use super::error::EvalError;
use super::metrics::{cer, ClassificationScores};
use super::report;
use super::MatchMode;
use crate::vision::{load_image, Predictor};

/// Metrics for a single dataset row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleReport {
    pub image_path: PathBuf,
    pub label: String,
    pub prediction: String,
    pub cer: f64,
    #[serde(flatten)]
    pub scores: ClassificationScores,
}

impl SampleReport {
    /// Score `prediction` against `label`
    pub fn score(image_path: PathBuf, label: String, prediction: String, mode: MatchMode) -> Self {
        let cer = cer(&prediction, &label);
        let labels = classify(&align(&prediction, &label), &label, mode);
        let scores = ClassificationScores::from_labels(&labels);

        Self {
            image_path,
            label,
            prediction,
            cer,
            scores,
        }
    }
}

/// Averages over a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub sample_count: usize,
    pub cer_mean: f64,
    pub accuracy: f64,
    pub precision_mean: f64,
    pub recall_mean: f64,
    pub f1_mean: f64,
}

impl BatchSummary {
    /// Arithmetic means of every metric. An empty slice yields zero means.
    pub fn from_reports(reports: &[SampleReport]) -> Self {
        let cer_mean = mean(reports.iter().map(|r| r.cer));

        Self {
            sample_count: reports.len(),
            cer_mean,
            accuracy: 1.0 - cer_mean,
            precision_mean: mean(reports.iter().map(|r| r.scores.precision)),
            recall_mean: mean(reports.iter().map(|r| r.scores.recall)),
            f1_mean: mean(reports.iter().map(|r| r.scores.f1)),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Per-sample reports and their summary
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRun {
    pub samples: Vec<SampleReport>,
    pub summary: BatchSummary,
}

/// Runs a predictor over a dataset, sequentially and in order.
///
/// The predictor is borrowed, so one loaded model serves every sample.
pub struct BatchEvaluator<'a, P: Predictor + ?Sized> {
    predictor: &'a mut P,
    match_mode: MatchMode,
}

impl<'a, P: Predictor + ?Sized> BatchEvaluator<'a, P> {
    pub fn new(predictor: &'a mut P, match_mode: MatchMode) -> Self {
        Self {
            predictor,
            match_mode,
        }
    }

    /// Evaluate every sample, writing one report line per sample to `out`.
    ///
    /// The first image that cannot be loaded or predicted aborts the run.
    pub fn run<W: Write>(&mut self, samples: &[Sample], out: &mut W) -> Result<EvaluationRun, EvalError> {
        let start = Instant::now();
        let mut reports = Vec::with_capacity(samples.len());

        if samples.is_empty() {
            warn!("Dataset is empty, all averages are reported as 0");
        }

        for (index, sample) in samples.iter().enumerate() {
            let image = load_image(&sample.image_path).map_err(|source| EvalError::ImageLoad {
                path: sample.image_path.clone(),
                source,
            })?;

            let prediction = self
                .predictor
                .predict(&image)
                .map_err(|source| EvalError::Prediction {
                    path: sample.image_path.clone(),
                    source,
                })?;

            let report = SampleReport::score(
                sample.image_path.clone(),
                sample.label.clone(),
                prediction,
                self.match_mode,
            );
            debug!(
                "[{}/{}] {:?}: cer={:.4} f1={:.4}",
                index + 1,
                samples.len(),
                report.image_path,
                report.cer,
                report.scores.f1
            );

            report::write_sample_line(out, &report).map_err(|source| EvalError::Io {
                context: "writing sample report",
                source,
            })?;
            reports.push(report);
        }

        let summary = BatchSummary::from_reports(&reports);
        info!(
            "Evaluated {} samples in {:?}",
            summary.sample_count,
            start.elapsed()
        );

        Ok(EvaluationRun {
            samples: reports,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::ModelError;
    use image::{DynamicImage, RgbImage};
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Returns canned predictions in order
    struct ScriptedPredictor {
        outputs: VecDeque<String>,
        calls: usize,
    }

    impl ScriptedPredictor {
        fn new(outputs: &[&str]) -> Self {
            Self {
                outputs: outputs.iter().map(|s| s.to_string()).collect(),
                calls: 0,
            }
        }
    }

    impl Predictor for ScriptedPredictor {
        fn predict(&mut self, _image: &DynamicImage) -> Result<String, ModelError> {
            self.calls += 1;
            self.outputs
                .pop_front()
                .ok_or_else(|| ModelError::runtime("scripted predictor", "no output left"))
        }
    }

    struct FailingPredictor;

    impl Predictor for FailingPredictor {
        fn predict(&mut self, _image: &DynamicImage) -> Result<String, ModelError> {
            Err(ModelError::runtime("forward pass", "session crashed"))
        }
    }

    fn write_image(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        RgbImage::new(8, 4).save(&path).unwrap();
        path
    }

    fn sample(path: PathBuf, label: &str) -> Sample {
        Sample {
            image_path: path,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_run_scores_each_sample() {
        let dir = TempDir::new().unwrap();
        let samples = vec![
            sample(write_image(&dir, "a.png"), "ASPIRIN"),
            sample(write_image(&dir, "b.png"), "Brufen"),
        ];
        let mut predictor = ScriptedPredictor::new(&["ASPRIN", "Brufen"]);
        let mut out = Vec::new();

        let run = BatchEvaluator::new(&mut predictor, MatchMode::Containment)
            .run(&samples, &mut out)
            .unwrap();

        assert_eq!(predictor.calls, 2);
        assert_eq!(run.samples.len(), 2);

        let first = &run.samples[0];
        assert_eq!(first.prediction, "ASPRIN");
        assert!((first.cer - 1.0 / 7.0).abs() < 1e-9);
        assert!((first.scores.precision - 1.0).abs() < 1e-9);
        assert!((first.scores.recall - 6.0 / 7.0).abs() < 1e-9);
        assert!((first.scores.f1 - 12.0 / 13.0).abs() < 1e-9);

        let second = &run.samples[1];
        assert_eq!(second.cer, 0.0);
        assert_eq!(second.scores.f1, 1.0);

        let summary = run.summary;
        assert_eq!(summary.sample_count, 2);
        assert!((summary.cer_mean - 1.0 / 14.0).abs() < 1e-9);
        assert!((summary.recall_mean - (6.0 / 7.0 + 1.0) / 2.0).abs() < 1e-9);
        assert_eq!(summary.accuracy, 1.0 - summary.cer_mean);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().next().unwrap().contains("Label: ASPIRIN, Prediction: ASPRIN"));
    }

    #[test]
    fn test_empty_dataset_yields_zero_means() {
        let mut predictor = ScriptedPredictor::new(&[]);
        let mut out = Vec::new();

        let run = BatchEvaluator::new(&mut predictor, MatchMode::Containment)
            .run(&[], &mut out)
            .unwrap();

        assert!(run.samples.is_empty());
        assert_eq!(run.summary.sample_count, 0);
        assert_eq!(run.summary.cer_mean, 0.0);
        assert_eq!(run.summary.f1_mean, 0.0);
        assert_eq!(run.summary.accuracy, 1.0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_image_aborts_with_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.png");
        let samples = vec![
            sample(write_image(&dir, "a.png"), "Keto"),
            sample(missing.clone(), "Zyrtec"),
        ];
        let mut predictor = ScriptedPredictor::new(&["Keto", "Zyrtec"]);
        let mut out = Vec::new();

        let err = BatchEvaluator::new(&mut predictor, MatchMode::Containment)
            .run(&samples, &mut out)
            .unwrap_err();

        match &err {
            EvalError::ImageLoad { path, .. } => assert_eq!(path, &missing),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("missing.png"));
        // The first sample was still processed
        assert_eq!(predictor.calls, 1);
    }

    #[test]
    fn test_undecodable_image_aborts() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("bogus.png");
        std::fs::write(&bogus, b"not a png").unwrap();
        let mut predictor = ScriptedPredictor::new(&["x"]);

        let err = BatchEvaluator::new(&mut predictor, MatchMode::Containment)
            .run(&[sample(bogus, "x")], &mut Vec::new())
            .unwrap_err();

        assert!(matches!(err, EvalError::ImageLoad { .. }));
        assert_eq!(predictor.calls, 0);
    }

    #[test]
    fn test_predictor_failure_names_path() {
        let dir = TempDir::new().unwrap();
        let path = write_image(&dir, "rx.png");

        let err = BatchEvaluator::new(&mut FailingPredictor, MatchMode::Containment)
            .run(&[sample(path, "Keto")], &mut Vec::new())
            .unwrap_err();

        assert!(matches!(err, EvalError::Prediction { .. }));
        assert!(err.to_string().contains("rx.png"));
    }

    #[test]
    fn test_positional_mode_is_stricter() {
        let dir = TempDir::new().unwrap();
        let samples = vec![sample(write_image(&dir, "a.png"), "ASPIRIN")];

        let mut predictor = ScriptedPredictor::new(&["NIRIPSA"]);
        let loose = BatchEvaluator::new(&mut predictor, MatchMode::Containment)
            .run(&samples, &mut Vec::new())
            .unwrap();

        let mut predictor = ScriptedPredictor::new(&["NIRIPSA"]);
        let strict = BatchEvaluator::new(&mut predictor, MatchMode::Positional)
            .run(&samples, &mut Vec::new())
            .unwrap();

        assert_eq!(loose.summary.f1_mean, 1.0);
        assert!(strict.summary.f1_mean < loose.summary.f1_mean);
        assert_eq!(loose.summary.cer_mean, strict.summary.cer_mean);
    }

    #[test]
    fn test_accuracy_is_exact_complement() {
        let reports: Vec<SampleReport> = [("Keto", "Ket"), ("Amoxil", "Amoxl"), ("Co", "Xo")]
            .iter()
            .map(|(label, pred)| {
                SampleReport::score(
                    PathBuf::from("x.png"),
                    label.to_string(),
                    pred.to_string(),
                    MatchMode::Containment,
                )
            })
            .collect();

        let summary = BatchSummary::from_reports(&reports);
        assert_eq!(summary.accuracy, 1.0 - summary.cer_mean);
    }
}
