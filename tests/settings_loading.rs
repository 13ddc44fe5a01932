use std::io::Write;

use weft::settings::WeftSettings;

#[test]
fn load_full_settings_from_file() {
    let toml_content = r#"
[agent]
name = "Search Agent"
description = "Searches the web and summarizes results"
version = "2.1.0"
host = "127.0.0.1"
port = 8002

[[agent.skills]]
id = "web-search"
name = "Web search"
description = "real-time web search"
examples = ["latest AI news", "rust 2024 edition changes"]

[model]
model = "gpt-4o-mini"
base_url = "https://llm.internal/v1"
api_key = "sk-test-key"
tavily_api_key = "tvly-test-key"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let settings = WeftSettings::load(tmp.path()).expect("load settings");

    assert_eq!(settings.agent.name, "Search Agent");
    assert_eq!(settings.agent.version, "2.1.0");
    assert_eq!(settings.agent.host, "127.0.0.1");
    assert_eq!(settings.agent.port, 8002);
    assert_eq!(settings.agent.skills.len(), 1);
    assert_eq!(settings.agent.skills[0].examples.len(), 2);

    assert_eq!(settings.model.model, "gpt-4o-mini");
    assert_eq!(settings.model.base_url, "https://llm.internal/v1");
    assert_eq!(settings.model.api_key, Some("sk-test-key".to_string()));
    assert_eq!(
        settings.model.tavily_api_key,
        Some("tvly-test-key".to_string())
    );
}

#[test]
fn minimal_settings_use_defaults() {
    let toml_content = r#"
[agent]
name = "Echo Agent"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let settings = WeftSettings::load(tmp.path()).expect("load settings");

    assert_eq!(settings.agent.name, "Echo Agent");
    assert_eq!(settings.agent.version, "1.0.0");
    assert_eq!(settings.agent.host, "0.0.0.0");
    assert_eq!(settings.agent.port, 8000);
    assert!(settings.agent.skills.is_empty());
    assert!(settings.agent.capabilities.streaming);
    assert_eq!(settings.model.model, "gpt-4.1");
}

#[test]
fn missing_file_is_a_config_error() {
    let err = WeftSettings::load(std::path::Path::new("/nonexistent/weft.toml")).unwrap_err();
    assert!(matches!(err, weft_core::WeftError::Config(_)));
}

#[test]
fn load_or_default_falls_back_to_the_given_name() {
    let settings =
        WeftSettings::load_or_default(std::path::Path::new("/nonexistent/weft.toml"), "Demo Agent")
            .expect("defaults");
    assert_eq!(settings.agent.name, "Demo Agent");
    assert_eq!(settings.agent.port, 8000);
}
