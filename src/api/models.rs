//! Model discovery
//!
//! Queries the native listing endpoint first, then the OpenAI-compatible one,
//! and normalizes the heterogeneous response shapes into a flat list of model
//! identifiers. Discovery never fails: every error path degrades to the
//! hardcoded fallback list.

use serde_json::Value;
use tracing::debug;

use crate::api::ApiFlavor;
use crate::core::constants::{DISCOVERY_TIMEOUT, FALLBACK_MODELS};
use crate::utils::url::construct_api_url;

/// Fetch the list of available model identifiers from the server.
///
/// Infallible by design: network errors, timeouts, non-success statuses,
/// unparseable bodies, and empty listings all resolve to [`fallback_models`].
pub async fn discover_models(client: &reqwest::Client, base_url: &str) -> Vec<String> {
    match fetch_model_listing(client, base_url).await {
        Ok(listing) => {
            let models = extract_model_ids(&listing);
            if models.is_empty() {
                debug!("model listing contained no identifiers, using fallback list");
                fallback_models()
            } else {
                models
            }
        }
        Err(err) => {
            debug!(error = %err, "model discovery failed, using fallback list");
            fallback_models()
        }
    }
}

pub fn fallback_models() -> Vec<String> {
    FALLBACK_MODELS.iter().map(|model| model.to_string()).collect()
}

async fn fetch_model_listing(client: &reqwest::Client, base_url: &str) -> Result<Value, String> {
    match fetch_listing_endpoint(client, base_url, ApiFlavor::Native).await {
        Ok(listing) => Ok(listing),
        Err(err) => {
            debug!(error = %err, "native listing endpoint failed, trying OpenAI-compatible endpoint");
            fetch_listing_endpoint(client, base_url, ApiFlavor::OpenAiCompat).await
        }
    }
}

async fn fetch_listing_endpoint(
    client: &reqwest::Client,
    base_url: &str,
    flavor: ApiFlavor,
) -> Result<Value, String> {
    let url = construct_api_url(base_url, flavor.models_endpoint());
    let response = client
        .get(url)
        .header("Content-Type", "application/json")
        .timeout(DISCOVERY_TIMEOUT)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }

    response.json::<Value>().await.map_err(|e| e.to_string())
}

/// Normalize a listing body into model identifiers.
///
/// Recognized shapes, first match wins:
/// - `{ "models": [...] }` (native), identifiers under `name`/`id`/`model`
/// - `{ "data": [...] }` (OpenAI-compatible), identifiers under `id`/`model`/`name`
/// - a bare array of objects, identifiers under `id`/`model`/`name`
pub fn extract_model_ids(listing: &Value) -> Vec<String> {
    if let Some(entries) = listing.get("models").and_then(Value::as_array) {
        return collect_ids(entries, &["name", "id", "model"]);
    }
    if let Some(entries) = listing.get("data").and_then(Value::as_array) {
        return collect_ids(entries, &["id", "model", "name"]);
    }
    if let Some(entries) = listing.as_array() {
        return collect_ids(entries, &["id", "model", "name"]);
    }
    Vec::new()
}

fn collect_ids(entries: &[Value], keys: &[&str]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| {
            keys.iter()
                .find_map(|key| entry.get(*key).and_then(Value::as_str))
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
        .collect()
}
