use std::collections::HashSet;
use std::env;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mongodb::bson::{doc, oid::ObjectId, DateTime};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{DATABASE, ITINERARY_COLLECTION};
use crate::models::activity::ActivityCategory;

const DEFAULT_TIMEOUT_SECS: u64 = 20;
const MAX_HINT_CHARS: usize = 100;

/// Compact per-slot view sent to the hosted model
#[derive(Debug, Serialize, Clone)]
pub struct SlotSummary {
    pub id: String,
    pub name: String,
    pub category: ActivityCategory,
    pub day: u32,
    pub position: u32,
    pub coordinates: (f64, f64),
}

#[derive(Debug, Serialize)]
pub struct EnrichmentRequest {
    pub model: String,
    pub persona: String,
    pub slots: Vec<SlotSummary>,
}

#[derive(Debug, Deserialize)]
pub struct EnrichmentResponse {
    #[serde(default)]
    pub reorder: Vec<ReorderInstruction>,
    #[serde(default)]
    pub hints: Vec<SlotHint>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReorderInstruction {
    pub id: String,
    #[serde(rename = "newPosition")]
    pub new_position: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlotHint {
    pub id: String,
    pub text: String,
}

/// Validated, ready-to-apply subset of a model response
#[derive(Debug, Default)]
pub struct EnrichmentPlan {
    pub reorder: Vec<ReorderInstruction>,
    pub hints: Vec<SlotHint>,
}

#[derive(Debug)]
pub enum EnrichmentError {
    EnvironmentError(String),
    HttpError(reqwest::Error),
    ResponseError(String),
}

impl fmt::Display for EnrichmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrichmentError::EnvironmentError(msg) => write!(f, "Environment error: {}", msg),
            EnrichmentError::HttpError(err) => write!(f, "HTTP error: {}", err),
            EnrichmentError::ResponseError(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl Error for EnrichmentError {}

impl From<reqwest::Error> for EnrichmentError {
    fn from(err: reqwest::Error) -> Self {
        EnrichmentError::HttpError(err)
    }
}

/// Best-effort narrative pass over an already-committed itinerary. Runs
/// detached from the generation path; the committed rows stay authoritative
/// no matter what happens here.
#[derive(Clone)]
pub struct EnrichmentService {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl EnrichmentService {
    pub fn new() -> Result<Self, EnrichmentError> {
        let api_url = env::var("ENRICHMENT_API_URL")
            .map_err(|_| EnrichmentError::EnvironmentError("ENRICHMENT_API_URL not set".to_string()))?;

        let api_key = env::var("ENRICHMENT_API_KEY")
            .map_err(|_| EnrichmentError::EnvironmentError("ENRICHMENT_API_KEY not set".to_string()))?;

        let model = env::var("ENRICHMENT_MODEL").unwrap_or_else(|_| "narrative-v2".to_string());

        let timeout_secs = env::var("ENRICHMENT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }

    /// Fire-and-forget entry point. One attempt; every failure is caught
    /// and logged here and never reaches the caller.
    pub async fn enrich(
        &self,
        db: Arc<mongodb::Client>,
        trip_id: ObjectId,
        slots: Vec<SlotSummary>,
        persona_text: String,
    ) {
        if slots.is_empty() {
            return;
        }

        let known_ids: HashSet<String> = slots.iter().map(|s| s.id.clone()).collect();

        match self.request_plan(&slots, persona_text).await {
            Ok(body) => match Self::parse_response(&body, &known_ids) {
                Ok(plan) => {
                    log::info!(
                        "Enrichment for trip {}: {} reorders, {} hints",
                        trip_id,
                        plan.reorder.len(),
                        plan.hints.len()
                    );
                    self.apply_plan(db, trip_id, plan).await;
                }
                Err(e) => {
                    log::warn!("Discarding enrichment response for trip {}: {}", trip_id, e);
                }
            },
            Err(e) => {
                log::warn!("Enrichment call failed for trip {}: {}", trip_id, e);
            }
        }
    }

    async fn request_plan(
        &self,
        slots: &[SlotSummary],
        persona_text: String,
    ) -> Result<String, EnrichmentError> {
        let request = EnrichmentRequest {
            model: self.model.clone(),
            persona: persona_text,
            slots: slots.to_vec(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(EnrichmentError::ResponseError(format!(
                "status {}: {}",
                status, body
            )));
        }

        Ok(body)
    }

    /// Strict validation of the model output: non-JSON or schema-invalid
    /// bodies are rejected whole; instructions for unknown slot ids are
    /// dropped; hints are truncated to the storage limit.
    pub fn parse_response(
        body: &str,
        known_ids: &HashSet<String>,
    ) -> Result<EnrichmentPlan, EnrichmentError> {
        let response: EnrichmentResponse = serde_json::from_str(body)
            .map_err(|e| EnrichmentError::ResponseError(format!("invalid body: {}", e)))?;

        let reorder = response
            .reorder
            .into_iter()
            .filter(|r| known_ids.contains(&r.id) && r.new_position >= 1)
            .collect();

        let hints = response
            .hints
            .into_iter()
            .filter(|h| known_ids.contains(&h.id) && !h.text.trim().is_empty())
            .map(|mut h| {
                if h.text.chars().count() > MAX_HINT_CHARS {
                    h.text = h.text.chars().take(MAX_HINT_CHARS).collect();
                }
                h
            })
            .collect();

        Ok(EnrichmentPlan { reorder, hints })
    }

    /// Each update is independently best-effort; a failed write is logged
    /// and the rest still apply
    async fn apply_plan(&self, db: Arc<mongodb::Client>, trip_id: ObjectId, plan: EnrichmentPlan) {
        let collection: mongodb::Collection<mongodb::bson::Document> =
            db.database(DATABASE).collection(ITINERARY_COLLECTION);

        for instruction in &plan.reorder {
            let Ok(entry_id) = ObjectId::parse_str(&instruction.id) else {
                continue;
            };
            let update = doc! {
                "$set": {
                    "position": instruction.new_position as i64,
                    "updated_at": DateTime::now(),
                }
            };
            if let Err(e) = collection
                .update_one(doc! { "_id": entry_id, "trip_id": trip_id }, update)
                .await
            {
                log::warn!("Failed to reorder slot {}: {}", instruction.id, e);
            }
        }

        for hint in &plan.hints {
            let Ok(entry_id) = ObjectId::parse_str(&hint.id) else {
                continue;
            };
            let update = doc! {
                "$set": {
                    "narrative_hint": &hint.text,
                    "updated_at": DateTime::now(),
                }
            };
            if let Err(e) = collection
                .update_one(doc! { "_id": entry_id, "trip_id": trip_id }, update)
                .await
            {
                log::warn!("Failed to attach hint to slot {}: {}", hint.id, e);
            }
        }
    }
}
