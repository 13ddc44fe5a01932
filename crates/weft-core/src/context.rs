use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;

/// Recognized credential headers. Anything else in the call metadata is
/// ignored; absent headers stay absent, never defaulted to "".
pub const HEADER_OPENAI_API_KEY: &str = "x-openai-api-key";
pub const HEADER_OPENAI_BASE_URL: &str = "x-openai-base-url";
pub const HEADER_OPENAI_MODEL: &str = "x-openai-model";
pub const HEADER_TAVILY_API_KEY: &str = "x-tavily-api-key";

/// Per-request credential overrides, threaded explicitly through every call.
/// These never live in process-wide state: concurrent requests from
/// different callers must not observe each other's keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tavily_api_key: Option<String>,
}

impl ApiCredentials {
    /// Pick the recognized headers out of call metadata.
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Self {
        Self {
            openai_api_key: metadata.get(HEADER_OPENAI_API_KEY).cloned(),
            openai_base_url: metadata.get(HEADER_OPENAI_BASE_URL).cloned(),
            openai_model: metadata.get(HEADER_OPENAI_MODEL).cloned(),
            tavily_api_key: metadata.get(HEADER_TAVILY_API_KEY).cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.openai_api_key.is_none()
            && self.openai_base_url.is_none()
            && self.openai_model.is_none()
            && self.tavily_api_key.is_none()
    }
}

/// Immutable snapshot of one inbound call. Built once by the transport
/// layer, read-only afterwards.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub task_id: String,
    pub context_id: String,
    pub message: Option<Message>,
    /// Header-like key/value pairs from the transport (lowercased names).
    pub call_metadata: HashMap<String, String>,
}

impl RequestContext {
    /// Build a context, generating identifiers the transport did not supply.
    pub fn new(
        task_id: Option<String>,
        context_id: Option<String>,
        message: Option<Message>,
        call_metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            task_id: task_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            context_id: context_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            message,
            call_metadata,
        }
    }

    /// Input text for the strategy: the first text part of the message,
    /// or "" when there is no message or no text part.
    pub fn input_text(&self) -> &str {
        self.message.as_ref().map(|m| m.first_text()).unwrap_or("")
    }

    /// Credential overrides from the recognized headers, or `None` when the
    /// request carried none (so downstream code can skip injection entirely).
    pub fn credentials(&self) -> Option<ApiCredentials> {
        let creds = ApiCredentials::from_metadata(&self.call_metadata);
        if creds.is_empty() {
            None
        } else {
            Some(creds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_ids_when_absent() {
        let ctx = RequestContext::new(None, None, None, HashMap::new());
        assert!(!ctx.task_id.is_empty());
        assert!(!ctx.context_id.is_empty());
        assert_ne!(ctx.task_id, ctx.context_id);
    }

    #[test]
    fn keeps_transport_supplied_ids() {
        let ctx = RequestContext::new(
            Some("t1".into()),
            Some("c1".into()),
            None,
            HashMap::new(),
        );
        assert_eq!(ctx.task_id, "t1");
        assert_eq!(ctx.context_id, "c1");
    }

    #[test]
    fn input_text_empty_without_message() {
        let ctx = RequestContext::new(None, None, None, HashMap::new());
        assert_eq!(ctx.input_text(), "");
    }

    #[test]
    fn credentials_only_from_recognized_headers() {
        let mut metadata = HashMap::new();
        metadata.insert(HEADER_OPENAI_API_KEY.to_string(), "sk-abc".to_string());
        metadata.insert("x-unrelated".to_string(), "ignored".to_string());

        let ctx = RequestContext::new(None, None, None, metadata);
        let creds = ctx.credentials().unwrap();
        assert_eq!(creds.openai_api_key.as_deref(), Some("sk-abc"));
        assert_eq!(creds.openai_base_url, None);
        assert_eq!(creds.openai_model, None);
        assert_eq!(creds.tavily_api_key, None);
    }

    #[test]
    fn no_recognized_headers_means_no_credentials() {
        let mut metadata = HashMap::new();
        metadata.insert("authorization".to_string(), "Bearer tok".to_string());
        let ctx = RequestContext::new(None, None, None, metadata);
        assert!(ctx.credentials().is_none());
    }

    #[test]
    fn absent_headers_never_serialize_as_empty_strings() {
        let mut metadata = HashMap::new();
        metadata.insert(HEADER_TAVILY_API_KEY.to_string(), "tv-1".to_string());
        let creds = ApiCredentials::from_metadata(&metadata);

        let json = serde_json::to_value(&creds).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["tavily_api_key"], "tv-1");
    }
}
