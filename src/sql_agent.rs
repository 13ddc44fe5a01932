//! One-node SQL assistant demo: translates a natural-language question
//! into a SQL statement with the configured model. It only writes the
//! statement; nothing here connects to or executes against a database.

use std::sync::Arc;

use serde_json::json;

use weft_core::Result;
use weft_graph::{CompiledGraph, GraphState, StateGraph, END};

use crate::llm::{resolve_keys, run_completion, update};
use crate::settings::ModelSettings;

pub fn build_sql_graph(settings: &ModelSettings) -> Result<Arc<dyn CompiledGraph>> {
    let client = reqwest::Client::new();

    let defaults = settings.clone();
    let generate = move |state: GraphState| {
        let defaults = defaults.clone();
        let client = client.clone();
        async move {
            let question = state
                .get("question")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let keys = resolve_keys(&defaults, &state);
            let text = match &keys.api_key {
                Some(key) => {
                    let prompt = format!(
                        "Translate this question into a single SQL statement. \
                         Reply with the SQL only, no explanation.\n\n{question}"
                    );
                    run_completion(&client, &keys, key, &prompt).await?
                }
                None => format!("-- no model API key configured; cannot translate: {question}"),
            };
            Ok(update(json!({"messages": [{"content": text}]})))
        }
    };

    let graph = StateGraph::new()
        .add_node("generate", generate)
        .set_entry("generate")
        .add_edge("generate", END)
        .compile()?;
    Ok(Arc::new(graph))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_model_key_yields_a_comment_not_an_error() {
        let graph = build_sql_graph(&ModelSettings {
            api_key: None,
            ..ModelSettings::default()
        })
        .unwrap();
        let input = update(json!({"question": "how many users signed up today"}));
        let state = graph.invoke(input, Default::default()).await.unwrap();

        let messages = state.get("messages").and_then(|v| v.as_array()).unwrap();
        let content = messages
            .last()
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap();
        assert!(content.starts_with("--"));
        assert!(content.contains("how many users signed up today"));
    }
}
