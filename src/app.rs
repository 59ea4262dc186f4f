//! Command handlers
//!
//! Each subcommand gets the resolved configuration and owns whatever it
//! needs (model, backend client, upload folder) for the length of the run.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::backend::{BackendClient, PrescriptionPayload};
use crate::config::AppConfig;
use crate::evaluation::{self, report, BatchEvaluator, DatasetOptions, MatchMode};
use crate::storage::UploadStore;
use crate::vision::{load_image, ImageToWordModel, Predictor};

/// Options for `predict`
#[derive(Debug, Clone)]
pub struct PredictOptions {
    pub image: PathBuf,
    pub save: bool,
    pub pharmacist_id: Option<i64>,
}

/// Options for `evaluate`
#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    pub dataset: PathBuf,
    pub has_header: bool,
    pub image_root: Option<PathBuf>,
    pub match_mode: MatchMode,
    pub json: Option<PathBuf>,
}

/// Application coordinator
pub struct PrescriptionApp {
    config: AppConfig,
}

impl PrescriptionApp {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Recognize one prescription image and optionally save it to the backend
    pub fn predict(&self, options: &PredictOptions) -> Result<()> {
        if options.save && options.pharmacist_id.is_none() {
            anyhow::bail!("Pharmacist ID is required to save prescriptions (--pharmacist-id)");
        }

        let uploads = self.open_uploads()?;
        if let Err(e) = self.clean_uploads(&uploads) {
            warn!("Upload cleanup failed: {:#}", e);
        }

        let image = load_image(&options.image)
            .with_context(|| format!("Failed to load image {:?}", options.image))?;
        let mut model = ImageToWordModel::load(&self.config.model)?;
        let prediction = model.predict(&image)?;

        println!("Prediction: {}", prediction);

        if let Some(pharmacist_id) = options.pharmacist_id.filter(|_| options.save) {
            // Save failures leave the prediction usable
            match self.save_prediction(&uploads, &options.image, &prediction, pharmacist_id) {
                Ok(()) => println!("Prescription and predicted text saved successfully!"),
                Err(e) => {
                    error!("Saving prescription failed: {:#}", e);
                    eprintln!("Failed to save prescription: {:#}", e);
                }
            }
        }

        Ok(())
    }

    fn save_prediction(
        &self,
        uploads: &UploadStore,
        image: &Path,
        prediction: &str,
        pharmacist_id: i64,
    ) -> Result<()> {
        let image_name = uploads.stash(image)?;
        let client = BackendClient::new(&self.config.backend)?;
        client.add_prescription(&PrescriptionPayload {
            image_name,
            predicted_text: prediction.to_string(),
            pharmacist_id,
        })?;
        Ok(())
    }

    /// Evaluate the model against a labeled dataset and print the report
    pub fn evaluate(&self, options: &EvaluateOptions) -> Result<()> {
        let samples = evaluation::load_dataset(
            &options.dataset,
            &DatasetOptions {
                has_header: options.has_header,
                image_root: options.image_root.clone(),
            },
        )?;

        let mut model = ImageToWordModel::load(&self.config.model)?;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let run = BatchEvaluator::new(&mut model, options.match_mode).run(&samples, &mut out)?;
        report::write_summary(&mut out, &run.summary)?;
        out.flush()?;

        if let Some(json_path) = &options.json {
            report::write_json(json_path, &options.dataset, &self.config.model.path, &run)?;
            info!("JSON report written to {:?}", json_path);
        }

        Ok(())
    }

    /// Print prescriptions saved by a pharmacist
    pub fn history(&self, pharmacist_id: i64) -> Result<()> {
        let client = BackendClient::new(&self.config.backend)?;
        let records = client.get_prescriptions(pharmacist_id)?;

        if records.is_empty() {
            println!("No prescriptions found for this pharmacist.");
            return Ok(());
        }

        for record in records {
            println!(
                "[{}] pharmacist {} {} {} {}",
                record.id,
                record.pharmacist_id,
                record.created_at,
                record.image_name,
                record.predicted_text.as_deref().unwrap_or("")
            );
        }
        Ok(())
    }

    /// Run the upload folder cleanup once
    pub fn cleanup(&self) -> Result<usize> {
        let uploads = self.open_uploads()?;
        self.clean_uploads(&uploads)
    }

    fn open_uploads(&self) -> Result<UploadStore> {
        UploadStore::open(&self.config.uploads.dir)
    }

    fn clean_uploads(&self, uploads: &UploadStore) -> Result<usize> {
        uploads.clean_old_files(Duration::from_secs(self.config.uploads.max_age_secs))
    }
}
