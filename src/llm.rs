//! HTTP plumbing shared by the demo agents: per-run key resolution and
//! chat completions.

use serde_json::{json, Value};

use weft_core::{Result, WeftError};
use weft_graph::GraphState;

use crate::settings::ModelSettings;

/// Credentials and model choice resolved for one graph run.
#[derive(Clone)]
pub(crate) struct RequestKeys {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub tavily_api_key: Option<String>,
}

/// Per-request overrides from the `api_config` state key win over process
/// defaults.
pub(crate) fn resolve_keys(defaults: &ModelSettings, state: &GraphState) -> RequestKeys {
    let overrides = state.get("api_config");
    let pick = |key: &str| {
        overrides
            .and_then(|c| c.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    RequestKeys {
        api_key: pick("openai_api_key").or_else(|| defaults.api_key.clone()),
        base_url: pick("openai_base_url").unwrap_or_else(|| defaults.base_url.clone()),
        model: pick("openai_model").unwrap_or_else(|| defaults.model.clone()),
        tavily_api_key: pick("tavily_api_key").or_else(|| defaults.tavily_api_key.clone()),
    }
}

pub(crate) async fn run_completion(
    client: &reqwest::Client,
    keys: &RequestKeys,
    api_key: &str,
    prompt: &str,
) -> Result<String> {
    let response = client
        .post(format!("{}/chat/completions", keys.base_url))
        .bearer_auth(api_key)
        .json(&json!({
            "model": keys.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.3,
        }))
        .send()
        .await
        .map_err(|e| WeftError::Strategy(format!("completion request failed: {e}")))?
        .error_for_status()
        .map_err(|e| WeftError::Strategy(format!("completion API error: {e}")))?;

    let body: Value = response
        .json()
        .await
        .map_err(|e| WeftError::Strategy(format!("completion response malformed: {e}")))?;
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| WeftError::Strategy("completion response had no content".into()))
}

/// Node update from a JSON literal.
pub(crate) fn update(pairs: Value) -> GraphState {
    pairs.as_object().cloned().unwrap_or_default()
}
