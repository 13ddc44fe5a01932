use std::path::Path;

use serde::{Deserialize, Serialize};

use weft_core::{AgentDescriptor, Result, WeftError};

/// Process-wide model defaults for the demo agents. Read once at startup;
/// per-request header overrides take precedence at call time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub tavily_api_key: Option<String>,
}

fn default_model() -> String {
    "gpt-4.1".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key: None,
            tavily_api_key: None,
        }
    }
}

impl ModelSettings {
    /// Fill absent keys from the environment. Called once at startup, so
    /// credentials still never live in mutable per-request globals.
    fn with_env_fallback(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if self.tavily_api_key.is_none() {
            self.tavily_api_key = std::env::var("TAVILY_API_KEY").ok();
        }
        self
    }
}

/// Top-level `weft.toml` configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeftSettings {
    pub agent: AgentDescriptor,
    #[serde(default)]
    pub model: ModelSettings,
}

impl WeftSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WeftError::Config(format!("cannot read {}: {e}", path.display())))?;
        let settings: Self =
            toml::from_str(&content).map_err(|e| WeftError::Config(e.to_string()))?;
        Ok(settings.finish())
    }

    /// Load the config file if present, otherwise fall back to defaults
    /// with the given agent name.
    pub fn load_or_default(path: &Path, agent_name: &str) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self {
                agent: AgentDescriptor::new(agent_name),
                model: ModelSettings::default(),
            }
            .finish())
        }
    }

    fn finish(mut self) -> Self {
        self.model = self.model.with_env_fallback();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let settings: WeftSettings = toml::from_str(
            r#"
[agent]
name = "Search Agent"
"#,
        )
        .unwrap();
        assert_eq!(settings.agent.name, "Search Agent");
        assert_eq!(settings.agent.port, 8000);
        assert_eq!(settings.model.model, "gpt-4.1");
        assert!(settings.agent.capabilities.streaming);
    }

    #[test]
    fn full_config_parses() {
        let settings: WeftSettings = toml::from_str(
            r#"
[agent]
name = "Search Agent"
description = "web search over A2A"
version = "2.0.0"
port = 8002

[[agent.skills]]
id = "web-search"
name = "Web search"
description = "real-time web search"
examples = ["latest AI news"]

[model]
model = "gpt-4o-mini"
base_url = "https://llm.internal/v1"
"#,
        )
        .unwrap();
        assert_eq!(settings.agent.port, 8002);
        assert_eq!(settings.agent.skills.len(), 1);
        assert_eq!(settings.agent.skills[0].id, "web-search");
        assert_eq!(settings.model.base_url, "https://llm.internal/v1");
    }
}
