//! Prescription backend client
//!
//! Saves recognized prescriptions to the pharmacy backend and lists the ones
//! already saved for a pharmacist.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::config::BackendSettings;

/// Backend call failures
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to start HTTP runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("backend rejected the request ({status}): {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Body of `AddPrescription`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrescriptionPayload {
    pub image_name: String,
    pub predicted_text: String,
    pub pharmacist_id: i64,
}

/// A saved prescription as returned by `GetPrescriptions`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRecord {
    pub id: i64,
    pub image_name: String,
    #[serde(default)]
    pub predicted_text: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub pharmacist_id: i64,
}

/// `GetPrescriptions` answers with either a list or an empty-result message
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PrescriptionListing {
    Records(Vec<PrescriptionRecord>),
    Empty {
        #[allow(dead_code)]
        message: String,
        prescriptions: Vec<PrescriptionRecord>,
    },
}

/// Blocking client for the handler controller
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
    runtime: Runtime,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, BackendError> {
        let runtime = Runtime::new().map_err(BackendError::Runtime)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|source| BackendError::Request {
                url: settings.base_url.clone(),
                source,
            })?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
            runtime,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Save a recognized prescription. Only HTTP 200 counts as success.
    pub fn add_prescription(&self, payload: &PrescriptionPayload) -> Result<(), BackendError> {
        let url = self.endpoint("AddPrescription");
        info!("Saving prescription {} to {}", payload.image_name, url);

        self.runtime.block_on(async {
            let response = self
                .client
                .post(&url)
                .json(payload)
                .send()
                .await
                .map_err(|source| BackendError::Request {
                    url: url.clone(),
                    source,
                })?;

            let status = response.status();
            if status != reqwest::StatusCode::OK {
                let body = response.text().await.unwrap_or_default();
                return Err(BackendError::Rejected { status, body });
            }

            debug!("Backend accepted prescription ({})", status);
            Ok(())
        })
    }

    /// List prescriptions saved by a pharmacist
    pub fn get_prescriptions(&self, pharmacist_id: i64) -> Result<Vec<PrescriptionRecord>, BackendError> {
        let url = self.endpoint(&format!("GetPrescriptions/{}", pharmacist_id));

        let body = self.runtime.block_on(async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|source| BackendError::Request {
                    url: url.clone(),
                    source,
                })?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|source| BackendError::Request {
                    url: url.clone(),
                    source,
                })?;
            if !status.is_success() {
                return Err(BackendError::Rejected { status, body });
            }
            Ok(body)
        })?;

        parse_listing(&body).map_err(|message| BackendError::Decode { url, message })
    }
}

fn parse_listing(body: &str) -> Result<Vec<PrescriptionRecord>, String> {
    match serde_json::from_str::<PrescriptionListing>(body) {
        Ok(PrescriptionListing::Records(records)) => Ok(records),
        Ok(PrescriptionListing::Empty { prescriptions, .. }) => Ok(prescriptions),
        Err(e) => Err(e.to_string()),
    }
}
