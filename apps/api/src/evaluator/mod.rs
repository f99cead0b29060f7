/// Client for the external evaluation service.
///
/// The service accepts a job as `POST {base}` with `{ mvpLink, jobId, personas }`
/// and reports progress on `GET {base}/status/{jobId}`. Every call is a single
/// attempt: failures are surfaced to the caller, never retried.
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::persona::Persona;

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Failed to reach evaluation service: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Evaluation service rejected {operation} (status {status}): {message}")]
    Rejected {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("Evaluation service returned an invalid status payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest<'a> {
    mvp_link: &'a str,
    job_id: Uuid,
    personas: &'a [Persona],
}

#[derive(Clone)]
pub struct EvaluatorClient {
    client: Client,
    base_url: String,
}

impl EvaluatorClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, EvaluatorError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn status_url(&self, job_id: Uuid) -> String {
        format!("{}/status/{}", self.base_url, job_id)
    }

    /// Hands a job and its personas to the evaluation service.
    pub async fn start(
        &self,
        mvp_link: &str,
        job_id: Uuid,
        personas: &[Persona],
    ) -> Result<(), EvaluatorError> {
        let body = StartRequest {
            mvp_link,
            job_id,
            personas,
        };

        let response = self.client.post(self.base_url.as_str()).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Evaluation service returned {status} starting job {job_id}: {message}");
            return Err(EvaluatorError::Rejected {
                operation: "job start",
                status: status.as_u16(),
                message,
            });
        }

        debug!("Evaluation service accepted job {job_id}");
        Ok(())
    }

    /// Fetches the raw status payload for a job. The payload must be a JSON object.
    pub async fn status(&self, job_id: Uuid) -> Result<Value, EvaluatorError> {
        let response = self.client.get(self.status_url(job_id)).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EvaluatorError::Rejected {
                operation: "status query",
                status: status.as_u16(),
                message,
            });
        }

        let payload: Value = response.json().await?;
        if !payload.is_object() {
            return Err(EvaluatorError::InvalidPayload(
                "expected a JSON object".to_string(),
            ));
        }

        debug!("Evaluation service status for job {job_id}: {payload}");
        Ok(payload)
    }
}
