//! Two-node web search agent: `search` gathers results, `summarize`
//! condenses them. Credentials come from per-request state when the
//! caller supplied them, otherwise from process defaults.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use weft_core::{Result, WeftError};
use weft_graph::{CompiledGraph, GraphState, StateGraph, END};

use crate::llm::{resolve_keys, run_completion, update};
use crate::settings::ModelSettings;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

async fn run_search(client: &reqwest::Client, api_key: &str, query: &str) -> Result<Vec<Value>> {
    let response = client
        .post(TAVILY_SEARCH_URL)
        .json(&json!({
            "api_key": api_key,
            "query": query,
            "max_results": 5,
        }))
        .send()
        .await
        .map_err(|e| WeftError::Strategy(format!("search request failed: {e}")))?
        .error_for_status()
        .map_err(|e| WeftError::Strategy(format!("search API error: {e}")))?;

    let body: Value = response
        .json()
        .await
        .map_err(|e| WeftError::Strategy(format!("search response malformed: {e}")))?;
    let results = body
        .get("results")
        .and_then(|r| r.as_array())
        .cloned()
        .unwrap_or_default();
    Ok(results
        .into_iter()
        .map(|r| {
            json!({
                "title": r.get("title").cloned().unwrap_or(Value::Null),
                "url": r.get("url").cloned().unwrap_or(Value::Null),
                "content": r.get("content").cloned().unwrap_or(Value::Null),
            })
        })
        .collect())
}

/// Build the compiled search graph. Search failures degrade to an empty
/// result set so the task still completes; summarization failures fail
/// the run.
pub fn build_search_graph(settings: &ModelSettings) -> Result<Arc<dyn CompiledGraph>> {
    let client = reqwest::Client::new();

    let search_defaults = settings.clone();
    let search_client = client.clone();
    let search = move |state: GraphState| {
        let defaults = search_defaults.clone();
        let client = search_client.clone();
        async move {
            let query = state
                .get("query")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let keys = resolve_keys(&defaults, &state);
            let outcome = match &keys.tavily_api_key {
                Some(key) => run_search(&client, key, &query).await,
                None => Err(WeftError::Strategy("no search API key configured".into())),
            };
            Ok(match outcome {
                Ok(results) => {
                    debug!(count = results.len(), "search complete");
                    update(json!({
                        "search_results": results,
                        "messages": [{"content": format!("searched the web for: {query}")}],
                    }))
                }
                Err(e) => {
                    warn!(error = %e, "search failed, continuing without results");
                    update(json!({
                        "search_results": [],
                        "messages": [{"content": format!("search unavailable: {e}")}],
                    }))
                }
            })
        }
    };

    let summarize_defaults = settings.clone();
    let summarize_client = client;
    let summarize = move |state: GraphState| {
        let defaults = summarize_defaults.clone();
        let client = summarize_client.clone();
        async move {
            let query = state
                .get("query")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let results = state
                .get("search_results")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            if results.is_empty() {
                let text = format!("No search results were available for: {query}");
                return Ok(update(json!({"messages": [{"content": text}]})));
            }

            let keys = resolve_keys(&defaults, &state);
            let text = match &keys.api_key {
                Some(key) => {
                    let prompt = format!(
                        "Summarize these search results for the question {query:?}:\n{}",
                        serde_json::to_string_pretty(&results)
                            .unwrap_or_else(|_| "[]".to_string())
                    );
                    run_completion(&client, &keys, key, &prompt).await?
                }
                // Without a model key, fall back to listing what was found.
                None => results
                    .iter()
                    .filter_map(|r| r.get("title").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("; "),
            };
            Ok(update(json!({"messages": [{"content": text}]})))
        }
    };

    let graph = StateGraph::new()
        .add_node("search", search)
        .add_node("summarize", summarize)
        .set_entry("search")
        .add_edge("search", "summarize")
        .add_edge("summarize", END)
        .compile()?;
    Ok(Arc::new(graph))
}
