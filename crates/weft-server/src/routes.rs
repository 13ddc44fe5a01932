use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::warn;

use weft_core::{EventSink, RequestContext, Task, TaskEvent, TaskStore, WeftError};

use crate::rpc::{
    RpcRequest, RpcResponse, SendParams, TaskIdParams, INTERNAL_ERROR, INVALID_PARAMS,
    METHOD_NOT_FOUND, PARSE_ERROR, TASK_NOT_FOUND,
};
use crate::state::AppState;

// GET /.well-known/agent.json — discovery document, no auth
pub async fn agent_card(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.descriptor.agent_card())
}

/// Copy HTTP headers into call metadata (lowercased names). Credential
/// extraction happens downstream, per request, never via process state.
fn call_metadata(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}

// POST / — JSON-RPC 2.0 dispatch
pub async fn rpc(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let request: RpcRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            return Json(RpcResponse::err(Value::Null, PARSE_ERROR, e.to_string()))
                .into_response()
        }
    };
    let metadata = call_metadata(&headers);

    match request.method.as_str() {
        "message/send" => message_send(state, request.id, request.params, metadata)
            .await
            .into_response(),
        "message/stream" => message_stream(state, request.id, request.params, metadata).await,
        "tasks/get" => tasks_get(state, request.id, request.params)
            .await
            .into_response(),
        "tasks/cancel" => tasks_cancel(state, request.id, request.params)
            .await
            .into_response(),
        other => Json(RpcResponse::err(
            request.id,
            METHOD_NOT_FOUND,
            format!("unknown method: {other}"),
        ))
        .into_response(),
    }
}

/// Keep the store in step with published events, so task status stays
/// queryable while and after the task runs.
async fn record_event(store: &Arc<dyn TaskStore>, event: &TaskEvent) {
    let task = match event {
        TaskEvent::StatusUpdate(update) if !update.is_final => {
            Task::working(&update.task_id, &update.context_id)
        }
        TaskEvent::Task(task) => task.clone(),
        _ => return,
    };
    if let Err(e) = store.put(task).await {
        warn!(error = %e, "failed to record task");
    }
}

async fn message_send(
    state: Arc<AppState>,
    id: Value,
    params: Value,
    metadata: HashMap<String, String>,
) -> Json<RpcResponse> {
    let params: SendParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => return Json(RpcResponse::err(id, INVALID_PARAMS, e.to_string())),
    };
    let ctx = params.message.into_context(metadata);

    let (sink, mut events) = EventSink::channel(32);
    let executor = state.executor.clone();
    let exec_ctx = ctx.clone();
    tokio::spawn(async move {
        // A closed sink means the caller went away; nothing left to do.
        let _ = executor.execute(&exec_ctx, &sink).await;
    });

    let mut terminal = None;
    while let Some(event) = events.recv().await {
        record_event(&state.store, &event).await;
        if let TaskEvent::Task(task) = event {
            terminal = Some(task);
        }
    }

    match terminal {
        Some(task) => match serde_json::to_value(&task) {
            Ok(value) => Json(RpcResponse::ok(id, value)),
            Err(e) => Json(RpcResponse::err(id, INTERNAL_ERROR, e.to_string())),
        },
        None => Json(RpcResponse::err(
            id,
            INTERNAL_ERROR,
            "task produced no terminal event",
        )),
    }
}

async fn message_stream(
    state: Arc<AppState>,
    id: Value,
    params: Value,
    metadata: HashMap<String, String>,
) -> Response {
    let params: SendParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => return Json(RpcResponse::err(id, INVALID_PARAMS, e.to_string())).into_response(),
    };
    let ctx = params.message.into_context(metadata);

    let (sink, events) = EventSink::channel(32);
    let executor = state.executor.clone();
    let exec_ctx = ctx.clone();
    tokio::spawn(async move {
        let _ = executor.execute_streaming(&exec_ctx, &sink).await;
    });

    let store = state.store.clone();
    let stream = futures::stream::unfold(
        (events, store, id),
        |(mut events, store, id)| async move {
            let event = events.recv().await?;
            record_event(&store, &event).await;
            let envelope = RpcResponse::ok(
                id.clone(),
                serde_json::to_value(&event).unwrap_or(Value::Null),
            );
            let sse = match SseEvent::default().json_data(&envelope) {
                Ok(sse) => sse,
                Err(e) => {
                    warn!(error = %e, "failed to encode stream event");
                    SseEvent::default().data("{}")
                }
            };
            Some((Ok::<_, Infallible>(sse), (events, store, id)))
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

async fn tasks_get(state: Arc<AppState>, id: Value, params: Value) -> Json<RpcResponse> {
    let params: TaskIdParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => return Json(RpcResponse::err(id, INVALID_PARAMS, e.to_string())),
    };
    match state.store.get(&params.id).await {
        Ok(Some(task)) => match serde_json::to_value(&task) {
            Ok(value) => Json(RpcResponse::ok(id, value)),
            Err(e) => Json(RpcResponse::err(id, INTERNAL_ERROR, e.to_string())),
        },
        Ok(None) => Json(RpcResponse::err(
            id,
            TASK_NOT_FOUND,
            WeftError::TaskNotFound(params.id).to_string(),
        )),
        Err(e) => Json(RpcResponse::err(id, INTERNAL_ERROR, e.to_string())),
    }
}

async fn tasks_cancel(state: Arc<AppState>, id: Value, params: Value) -> Json<RpcResponse> {
    let params: TaskIdParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => return Json(RpcResponse::err(id, INVALID_PARAMS, e.to_string())),
    };

    // Prefer the stored record's context, then the caller's. Cancellation
    // itself never checks what state the task was in.
    let context_id = match state.store.get(&params.id).await {
        Ok(Some(task)) => Some(task.context_id),
        _ => params.context_id,
    };
    let ctx = RequestContext::new(Some(params.id), context_id, None, HashMap::new());

    let (sink, mut events) = EventSink::channel(4);
    if let Err(e) = state.executor.cancel(&ctx, &sink).await {
        return Json(RpcResponse::err(id, INTERNAL_ERROR, e.to_string()));
    }
    drop(sink);

    let mut canceled = None;
    while let Some(event) = events.recv().await {
        record_event(&state.store, &event).await;
        if let TaskEvent::Task(task) = event {
            canceled = Some(task);
        }
    }

    match canceled {
        Some(task) => match serde_json::to_value(&task) {
            Ok(value) => Json(RpcResponse::ok(id, value)),
            Err(e) => Json(RpcResponse::err(id, INTERNAL_ERROR, e.to_string())),
        },
        None => Json(RpcResponse::err(
            id,
            INTERNAL_ERROR,
            "cancellation produced no event",
        )),
    }
}
