use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{PatientLookup, VisitStore};
use crate::models::patient::{PatientId, PatientSummary, SearchCriteria};
use crate::models::settings::EngineSettings;
use crate::models::visit::{NewVisit, Visit, VisitId};

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

pub struct HttpPatientLookup {
    client: Client,
    base_url: String,
}

impl HttpPatientLookup {
    pub fn new(settings: &EngineSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.search_timeout())?,
            base_url: trim_base(&settings.patient_api_url),
        })
    }
}

#[async_trait]
impl PatientLookup for HttpPatientLookup {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<PatientSummary>> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&criteria.query_pairs())
            .send()
            .await
            .context("Network error during patient search")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Patient search failed with HTTP status {}", status));
        }

        let records: Vec<Value> = response
            .json()
            .await
            .context("Patient search response is not a JSON array")?;

        let mut patients = Vec::with_capacity(records.len());
        for record in records {
            match PatientSummary::from_record(record) {
                Ok(summary) => patients.push(summary),
                Err(err) => log::warn!("Skipping unreadable patient record: {}", err),
            }
        }
        Ok(patients)
    }
}

pub struct HttpVisitStore {
    client: Client,
    base_url: String,
}

impl HttpVisitStore {
    pub fn new(settings: &EngineSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.visit_timeout())?,
            base_url: trim_base(&settings.visit_api_url),
        })
    }
}

#[async_trait]
impl VisitStore for HttpVisitStore {
    async fn create(&self, visit: &NewVisit) -> Result<Visit> {
        let response = self
            .client
            .post(format!("{}/create", self.base_url))
            .json(visit)
            .send()
            .await
            .context("Network error during visit creation")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Visit creation failed with HTTP status {}", status));
        }

        let body: CreateResponse = response
            .json()
            .await
            .context("Visit creation response is not a visit record")?;

        body.into_record().into_visit(Some(visit))
    }

    async fn list_for_patient(&self, patient_id: PatientId) -> Result<Vec<Visit>> {
        let response = self
            .client
            .get(format!("{}/patient/{}", self.base_url, patient_id))
            .send()
            .await
            .context("Network error while listing visits")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Visit listing failed with HTTP status {}", status));
        }

        let records: Vec<VisitRecord> = response
            .json()
            .await
            .context("Visit listing response is not a JSON array")?;

        let mut visits = Vec::with_capacity(records.len());
        for record in records {
            match record.into_visit(None) {
                Ok(visit) => visits.push(visit),
                Err(err) => log::warn!("Skipping unreadable visit record: {}", err),
            }
        }
        Ok(visits)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateResponse {
    Wrapped { visit: VisitRecord },
    Bare(VisitRecord),
}

impl CreateResponse {
    fn into_record(self) -> VisitRecord {
        match self {
            CreateResponse::Wrapped { visit } => visit,
            CreateResponse::Bare(visit) => visit,
        }
    }
}

/// Visit as the backend returns it. Only `id` is mandatory; creation
/// responses fall back to the request for anything left out.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisitRecord {
    id: VisitId,
    #[serde(default, alias = "patient_id")]
    patient_id: Option<PatientId>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    value: Option<f64>,
}

impl VisitRecord {
    fn into_visit(self, request: Option<&NewVisit>) -> Result<Visit> {
        let patient_id = self
            .patient_id
            .or_else(|| request.map(|r| r.patient_id))
            .ok_or_else(|| anyhow!("Visit {} has no patient id", self.id))?;

        let date = match self.date.as_deref() {
            Some(raw) => parse_visit_date(raw)?,
            None => request
                .map(|r| r.date)
                .ok_or_else(|| anyhow!("Visit {} has no date", self.id))?,
        };

        Ok(Visit {
            id: self.id,
            patient_id,
            date,
            reason: self
                .reason
                .or_else(|| request.map(|r| r.reason.clone()))
                .unwrap_or_default(),
            category: self
                .category
                .and_then(|c| c.parse().ok())
                .or_else(|| request.and_then(|r| r.category)),
            value: self.value.or_else(|| request.and_then(|r| r.value)),
        })
    }
}

/// Accepts `YYYY-MM-DD` and full timestamps such as `2025-04-01T00:00:00.000Z`.
fn parse_visit_date(raw: &str) -> Result<NaiveDate> {
    let day_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
        .with_context(|| format!("Invalid visit date `{}`", raw))
}
